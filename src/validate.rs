use anyhow::{bail, Result};
use chrono::NaiveDate;

use crate::model::TaskEdit;

pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// True when `s` is exactly `YYYY-MM-DD` and names a real calendar day.
pub fn is_valid_date_string(s: &str) -> bool {
    parse_date(s).is_some()
}

/// Parse a strictly formatted ISO calendar date.
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let bytes = s.as_bytes();
    if bytes.len() != 10 {
        return None;
    }
    let shape_ok = bytes.iter().enumerate().all(|(i, b)| match i {
        4 | 7 => *b == b'-',
        _ => b.is_ascii_digit(),
    });
    if !shape_ok {
        return None;
    }
    NaiveDate::parse_from_str(s, DATE_FORMAT).ok()
}

pub fn validate_date(date: &str) -> Result<()> {
    if !is_valid_date_string(date) {
        bail!("invalid due date '{date}': expected a real date as YYYY-MM-DD");
    }
    Ok(())
}

/// Validate a task label: must contain something other than whitespace.
pub fn validate_label(label: &str) -> Result<()> {
    if label.trim().is_empty() {
        bail!("task label must not be empty");
    }
    Ok(())
}

pub fn validate_new_task(label: &str, date: &str) -> Result<()> {
    validate_label(label)?;
    validate_date(date)
}

pub fn validate_edit(edit: &TaskEdit) -> Result<()> {
    if let Some(label) = &edit.label {
        validate_label(label)?;
    }
    if let Some(date) = &edit.date {
        validate_date(date)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_dates() {
        assert!(is_valid_date_string("2024-02-29"));
        assert!(is_valid_date_string("2023-12-31"));
        assert!(is_valid_date_string("0001-01-01"));
    }

    #[test]
    fn invalid_dates() {
        assert!(!is_valid_date_string("2024-02-30"));
        assert!(!is_valid_date_string("2023-02-29"));
        assert!(!is_valid_date_string("2024-2-9"));
        assert!(!is_valid_date_string("2024-13-01"));
        assert!(!is_valid_date_string("2024/01/01"));
        assert!(!is_valid_date_string("+2024-01-1"));
        assert!(!is_valid_date_string(" 2024-01-01"));
        assert!(!is_valid_date_string(""));
        assert!(!is_valid_date_string("tomorrow"));
    }

    #[test]
    fn labels() {
        assert!(validate_label("Buy milk").is_ok());
        assert!(validate_label("").is_err());
        assert!(validate_label("   ").is_err());
    }

    #[test]
    fn edits_validate_only_present_fields() {
        assert!(validate_edit(&TaskEdit::default()).is_ok());
        assert!(validate_edit(&TaskEdit {
            label: None,
            date: Some("2024-02-30".into()),
        })
        .is_err());
        assert!(validate_edit(&TaskEdit {
            label: Some(" ".into()),
            date: None,
        })
        .is_err());
        assert!(validate_edit(&TaskEdit {
            label: Some("ok".into()),
            date: Some("2024-03-01".into()),
        })
        .is_ok());
    }
}

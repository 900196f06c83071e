use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub label: String,
    /// Due date, `YYYY-MM-DD`.
    pub date: String,
    pub completed: bool,
}

/// Pre-migration record shape, read once from the legacy key. Missing
/// fields come through empty rather than failing the migration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LegacyTask {
    pub label: String,
    pub date: String,
}

/// Fields an edit may change. `None` leaves the field alone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskEdit {
    pub label: Option<String>,
    pub date: Option<String>,
}

impl TaskEdit {
    pub fn is_empty(&self) -> bool {
        self.label.is_none() && self.date.is_none()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortOrder {
    #[default]
    DueAsc,
    DueDesc,
    CreatedAsc,
    CreatedDesc,
    NameAsc,
    NameDesc,
}

impl SortOrder {
    pub const ALL: [SortOrder; 6] = [
        Self::DueAsc,
        Self::DueDesc,
        Self::CreatedAsc,
        Self::CreatedDesc,
        Self::NameAsc,
        Self::NameDesc,
    ];

    pub fn parse(s: &str) -> anyhow::Result<Self> {
        Self::ALL
            .into_iter()
            .find(|order| order.as_str() == s)
            .ok_or_else(|| {
                anyhow::anyhow!(
                    "invalid sort order '{s}': must be one of dueAsc, dueDesc, createdAsc, createdDesc, nameAsc, nameDesc"
                )
            })
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::DueAsc => "dueAsc",
            Self::DueDesc => "dueDesc",
            Self::CreatedAsc => "createdAsc",
            Self::CreatedDesc => "createdDesc",
            Self::NameAsc => "nameAsc",
            Self::NameDesc => "nameDesc",
        }
    }

    /// Human-readable name for status bars.
    pub fn describe(self) -> &'static str {
        match self {
            Self::DueAsc => "due date ↑",
            Self::DueDesc => "due date ↓",
            Self::CreatedAsc => "created ↑",
            Self::CreatedDesc => "created ↓",
            Self::NameAsc => "name ↑",
            Self::NameDesc => "name ↓",
        }
    }

    /// The order after this one when cycling through all of them.
    pub fn next(self) -> Self {
        let idx = Self::ALL.iter().position(|o| *o == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Display-only restriction on which tasks are shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Filter {
    #[default]
    All,
    Active,
    Completed,
}

impl Filter {
    pub fn parse(s: &str) -> anyhow::Result<Self> {
        match s {
            "all" => Ok(Self::All),
            "active" => Ok(Self::Active),
            "completed" => Ok(Self::Completed),
            _ => anyhow::bail!("invalid filter '{s}': must be all, active, or completed"),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Active => "active",
            Self::Completed => "completed",
        }
    }

    pub fn matches(self, task: &Task) -> bool {
        match self {
            Self::All => true,
            Self::Active => !task.completed,
            Self::Completed => task.completed,
        }
    }

    pub fn next(self) -> Self {
        match self {
            Self::All => Self::Active,
            Self::Active => Self::Completed,
            Self::Completed => Self::All,
        }
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sort_order_wire_names() {
        for order in SortOrder::ALL {
            let json = serde_json::to_string(&order).unwrap();
            assert_eq!(json, format!("\"{}\"", order.as_str()));
            assert_eq!(SortOrder::parse(order.as_str()).unwrap(), order);
        }
        assert!(SortOrder::parse("due").is_err());
    }

    #[test]
    fn sort_order_cycles_back_to_start() {
        let mut order = SortOrder::DueAsc;
        for _ in 0..SortOrder::ALL.len() {
            order = order.next();
        }
        assert_eq!(order, SortOrder::DueAsc);
        assert_eq!(SortOrder::NameDesc.next(), SortOrder::DueAsc);
    }

    #[test]
    fn task_json_field_names() {
        let task = Task {
            id: "abc".into(),
            label: "Write report".into(),
            date: "2024-05-01".into(),
            completed: false,
        };
        let value = serde_json::to_value(&task).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "id": "abc",
                "label": "Write report",
                "date": "2024-05-01",
                "completed": false
            })
        );
    }

    #[test]
    fn filter_matches() {
        let open = Task {
            id: "1".into(),
            label: "a".into(),
            date: "2024-01-01".into(),
            completed: false,
        };
        let done = Task {
            completed: true,
            ..open.clone()
        };
        assert!(Filter::All.matches(&open) && Filter::All.matches(&done));
        assert!(Filter::Active.matches(&open) && !Filter::Active.matches(&done));
        assert!(!Filter::Completed.matches(&open) && Filter::Completed.matches(&done));
        assert!(Filter::parse("finished").is_err());
    }
}

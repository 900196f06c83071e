use std::cmp::Ordering;

use crate::model::{SortOrder, Task};

fn fold(label: &str) -> String {
    label.to_lowercase()
}

fn by_label(a: &Task, b: &Task) -> Ordering {
    fold(&a.label).cmp(&fold(&b.label))
}

/// Return `tasks` in display order. The input is left untouched.
///
/// Dates compare as strings, which is only sound because stored dates are
/// validated to the fixed-width `YYYY-MM-DD` shape. Ties that survive every
/// key keep their stored order.
pub fn sort_tasks(tasks: &[Task], order: SortOrder) -> Vec<Task> {
    let mut sorted = tasks.to_vec();
    match order {
        SortOrder::DueAsc => {
            sorted.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| by_label(a, b)))
        }
        SortOrder::DueDesc => {
            sorted.sort_by(|a, b| b.date.cmp(&a.date).then_with(|| by_label(a, b)))
        }
        SortOrder::CreatedAsc => {}
        SortOrder::CreatedDesc => sorted.reverse(),
        SortOrder::NameAsc => sorted.sort_by(by_label),
        SortOrder::NameDesc => sorted.sort_by(|a, b| by_label(b, a)),
    }
    sorted
}

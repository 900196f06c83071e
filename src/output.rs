use serde::Serialize;

use crate::model::{Filter, SortOrder, Task};

#[derive(Serialize)]
pub struct TaskListing<'a> {
    #[serde(rename = "sortOrder")]
    pub sort_order: SortOrder,
    pub filter: Filter,
    pub todos: &'a [Task],
}

/// The one-line label a list view shows for a task.
pub fn task_line(task: &Task) -> String {
    let check = if task.completed { "✓ " } else { "" };
    format!("{check}{} (Due: {})", task.label, task.date)
}

/// Hover text for a task.
pub fn task_tooltip(task: &Task) -> String {
    format!("{}\nDue: {}", task.label, task.date)
}

pub fn format_task_list(tasks: &[Task]) -> String {
    let mut out = String::new();
    for task in tasks {
        out.push_str(&format!("{}  {}\n", task_line(task), task.id));
    }
    out
}

pub fn format_task_detail(task: &Task) -> String {
    let mut out = String::new();
    out.push_str(&format!("Id:        {}\n", task.id));
    out.push_str(&format!("Label:     {}\n", task.label));
    out.push_str(&format!("Due:       {}\n", task.date));
    out.push_str(&format!(
        "Completed: {}\n",
        if task.completed { "yes" } else { "no" }
    ));
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_task(label: &str, date: &str, completed: bool) -> Task {
        Task {
            id: format!("id-{label}"),
            label: label.to_string(),
            date: date.to_string(),
            completed,
        }
    }

    #[test]
    fn line_marks_completed() {
        assert_eq!(
            task_line(&make_task("Buy milk", "2024-05-01", false)),
            "Buy milk (Due: 2024-05-01)"
        );
        assert_eq!(
            task_line(&make_task("Buy milk", "2024-05-01", true)),
            "✓ Buy milk (Due: 2024-05-01)"
        );
    }

    #[test]
    fn tooltip_has_two_lines() {
        assert_eq!(
            task_tooltip(&make_task("Call bank", "2024-06-02", false)),
            "Call bank\nDue: 2024-06-02"
        );
    }

    #[test]
    fn flat_list() {
        let tasks = vec![
            make_task("a", "2024-01-01", false),
            make_task("b", "2024-01-02", true),
        ];
        let out = format_task_list(&tasks);
        assert_eq!(
            out,
            "a (Due: 2024-01-01)  id-a\n✓ b (Due: 2024-01-02)  id-b\n"
        );
        assert_eq!(format_task_list(&[]), "");
    }

    #[test]
    fn listing_json_shape() {
        let tasks = vec![make_task("a", "2024-01-01", false)];
        let listing = TaskListing {
            sort_order: SortOrder::DueAsc,
            filter: Filter::All,
            todos: &tasks,
        };
        let value = serde_json::to_value(&listing).unwrap();
        assert_eq!(value["sortOrder"], "dueAsc");
        assert_eq!(value["filter"], "all");
        assert_eq!(value["todos"][0]["label"], "a");
    }
}

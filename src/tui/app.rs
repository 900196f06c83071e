use ratatui::widgets::ListState;

use crate::model::{Filter, SortOrder, Task, TaskEdit};
use crate::protocol::{Command, Event};
use crate::reminder::{Notifier, Severity};
use crate::validate::{validate_edit, validate_new_task};

const MAX_NOTICES: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Normal,
    Help,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    Label,
    Date,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormKind {
    Add,
    /// Editing the task with this id.
    Edit(String),
}

pub struct TaskForm {
    pub kind: FormKind,
    pub label: String,
    pub date: String,
    pub focused: FormField,
    pub error: Option<String>,
}

impl TaskForm {
    pub fn add() -> Self {
        Self {
            kind: FormKind::Add,
            label: String::new(),
            date: String::new(),
            focused: FormField::Label,
            error: None,
        }
    }

    pub fn edit(task: &Task) -> Self {
        Self {
            kind: FormKind::Edit(task.id.clone()),
            label: task.label.clone(),
            date: task.date.clone(),
            focused: FormField::Label,
            error: None,
        }
    }

    pub fn title(&self) -> &'static str {
        match self.kind {
            FormKind::Add => " Add Todo ",
            FormKind::Edit(_) => " Edit Todo ",
        }
    }

    pub fn focused_buf_mut(&mut self) -> &mut String {
        match self.focused {
            FormField::Label => &mut self.label,
            FormField::Date => &mut self.date,
        }
    }

    pub fn next_field(&mut self) {
        self.focused = match self.focused {
            FormField::Label => FormField::Date,
            FormField::Date => FormField::Label,
        };
    }

    /// Validate the form and build the command it stands for. On failure the
    /// error is kept on the form and `None` is returned.
    pub fn to_command(&mut self) -> Option<Command> {
        let label = self.label.trim().to_string();
        let date = self.date.trim().to_string();
        let checked = match &self.kind {
            FormKind::Add => validate_new_task(&label, &date),
            FormKind::Edit(_) => validate_edit(&TaskEdit {
                label: Some(label.clone()),
                date: Some(date.clone()),
            }),
        };
        if let Err(e) = checked {
            self.error = Some(e.to_string());
            return None;
        }
        self.error = None;
        Some(match &self.kind {
            FormKind::Add => Command::AddTodo { label, date },
            FormKind::Edit(id) => Command::EditTodo {
                id: id.clone(),
                label: Some(label),
                date: Some(date),
            },
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub severity: Severity,
    pub text: String,
}

pub struct App {
    /// Every task, in the current sort order.
    pub todos: Vec<Task>,
    /// The subset of `todos` the filter lets through.
    pub rows: Vec<Task>,
    pub sort_order: SortOrder,
    pub filter: Filter,
    pub today: String,
    pub cursor: usize,
    pub list_state: ListState,
    pub mode: Mode,
    pub form: Option<TaskForm>,
    pub notices: Vec<Notice>,
}

impl App {
    pub fn new(filter: Filter, today: String) -> Self {
        Self {
            todos: Vec::new(),
            rows: Vec::new(),
            sort_order: SortOrder::default(),
            filter,
            today,
            cursor: 0,
            list_state: ListState::default(),
            mode: Mode::Normal,
            form: None,
            notices: Vec::new(),
        }
    }

    /// Fold an outbound protocol event into the view.
    pub fn apply(&mut self, event: Event) {
        match event {
            Event::SetTodos { todos, sort_order } => {
                self.todos = todos;
                self.sort_order = sort_order;
                self.rebuild_rows();
            }
            Event::Notify { severity, text } => self.show(severity, &text),
        }
    }

    fn rebuild_rows(&mut self) {
        let selected = self.selected().map(|t| t.id.clone());
        self.rows = self
            .todos
            .iter()
            .filter(|t| self.filter.matches(t))
            .cloned()
            .collect();
        // Keep the cursor on the same task when it is still visible.
        if let Some(id) = selected {
            if let Some(pos) = self.rows.iter().position(|t| t.id == id) {
                self.cursor = pos;
            }
        }
        self.clamp_cursor();
    }

    pub fn clamp_cursor(&mut self) {
        if self.rows.is_empty() {
            self.cursor = 0;
            self.list_state.select(None);
        } else {
            if self.cursor >= self.rows.len() {
                self.cursor = self.rows.len() - 1;
            }
            self.list_state.select(Some(self.cursor));
        }
    }

    pub fn move_up(&mut self) {
        if self.cursor > 0 {
            self.cursor -= 1;
            self.list_state.select(Some(self.cursor));
        }
    }

    pub fn move_down(&mut self) {
        if !self.rows.is_empty() && self.cursor < self.rows.len() - 1 {
            self.cursor += 1;
            self.list_state.select(Some(self.cursor));
        }
    }

    pub fn selected(&self) -> Option<&Task> {
        self.rows.get(self.cursor)
    }

    pub fn selected_id(&self) -> Option<String> {
        self.selected().map(|t| t.id.clone())
    }

    pub fn cycle_filter(&mut self) {
        self.filter = self.filter.next();
        self.rebuild_rows();
    }

    pub fn open_add_form(&mut self) {
        self.form = Some(TaskForm::add());
    }

    pub fn open_edit_form(&mut self) {
        if let Some(task) = self.selected() {
            self.form = Some(TaskForm::edit(task));
        }
    }

    pub fn close_form(&mut self) {
        self.form = None;
    }

    pub fn toggle_help(&mut self) {
        self.mode = match self.mode {
            Mode::Help => Mode::Normal,
            Mode::Normal => Mode::Help,
        };
    }

    pub fn clear_notices(&mut self) {
        self.notices.clear();
    }

    pub fn completed_count(&self) -> usize {
        self.todos.iter().filter(|t| t.completed).count()
    }
}

impl Notifier for App {
    fn show(&mut self, severity: Severity, text: &str) {
        self.notices.push(Notice {
            severity,
            text: text.to_string(),
        });
        if self.notices.len() > MAX_NOTICES {
            let excess = self.notices.len() - MAX_NOTICES;
            self.notices.drain(..excess);
        }
    }
}

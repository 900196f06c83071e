//! Message protocol between the storage manager and presentation surfaces.
//!
//! Messages are JSON objects tagged by a `command` field. A surface sends a
//! [`Command`]; [`dispatch`] applies it and answers with a [`Reply`].

use anyhow::{Context, Result};
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::model::{SortOrder, Task, TaskEdit};
use crate::ops::TodoStorage;
use crate::reminder::Severity;
use crate::store::KvStore;
use crate::validate::{validate_edit, validate_new_task};

/// Inbound messages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "camelCase")]
pub enum Command {
    GetTodos,
    AddTodo {
        label: String,
        date: String,
    },
    ToggleTodo {
        id: String,
    },
    DeleteTodo {
        id: String,
    },
    EditTodo {
        id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        label: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        date: Option<String>,
    },
    ClearCompleted,
    SetSort {
        order: SortOrder,
    },
}

/// Outbound messages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "camelCase")]
pub enum Event {
    SetTodos {
        todos: Vec<Task>,
        #[serde(rename = "sortOrder")]
        sort_order: SortOrder,
    },
    Notify {
        severity: Severity,
        text: String,
    },
}

impl Event {
    pub fn error(text: impl Into<String>) -> Self {
        Self::Notify {
            severity: Severity::Error,
            text: text.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    /// The persisted list or sort order changed; other views should refresh.
    pub changed: bool,
    pub event: Event,
}

pub fn parse_command(line: &str) -> Result<Command> {
    serde_json::from_str(line).context("invalid message")
}

pub fn encode_event(event: &Event) -> Result<String> {
    Ok(serde_json::to_string(event)?)
}

fn snapshot<S: KvStore>(storage: &TodoStorage<S>) -> Result<Event> {
    Ok(Event::SetTodos {
        todos: storage.get_all_sorted()?,
        sort_order: storage.get_sort_order()?,
    })
}

fn rejected(e: anyhow::Error) -> Reply {
    warn!("rejected command: {e}");
    Reply {
        changed: false,
        event: Event::error(e.to_string()),
    }
}

/// Apply one command. Validation failures come back as a `notify` error
/// with nothing written; store faults are returned as errors.
pub fn dispatch<S: KvStore>(storage: &TodoStorage<S>, command: Command) -> Result<Reply> {
    debug!("dispatch {command:?}");
    let changed = match command {
        Command::GetTodos => false,
        Command::AddTodo { label, date } => {
            let label = label.trim();
            let date = date.trim();
            if let Err(e) = validate_new_task(label, date) {
                return Ok(rejected(e));
            }
            storage.add(label, date)?;
            true
        }
        Command::ToggleTodo { id } => storage.toggle(&id)?,
        Command::DeleteTodo { id } => storage.remove(&id)?,
        Command::EditTodo { id, label, date } => {
            let edit = TaskEdit {
                label: label.map(|l| l.trim().to_string()),
                date: date.map(|d| d.trim().to_string()),
            };
            if let Err(e) = validate_edit(&edit) {
                return Ok(rejected(e));
            }
            !edit.is_empty() && storage.edit(&id, &edit)?
        }
        Command::ClearCompleted => storage.clear_completed()? > 0,
        Command::SetSort { order } => {
            storage.set_sort_order(order)?;
            true
        }
    };
    Ok(Reply {
        changed,
        event: snapshot(storage)?,
    })
}

use anyhow::Result;
use log::info;

use crate::model::{Filter, LegacyTask, SortOrder, Task, TaskEdit};
use crate::sort::sort_tasks;
use crate::store::{KvStore, KEY_LEGACY_TASKS, KEY_SORT_ORDER, KEY_TASKS};

/// Random v4 UUID. Uniqueness is probabilistic; collisions are not checked.
pub fn generate_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Owns the persisted task list and sort preference.
///
/// Call [`TodoStorage::initialize`] once before anything else. Every
/// mutation reads the whole list, transforms it, and writes it back inside
/// one store transaction. Inputs are expected to be validated by the
/// caller; see [`crate::validate`].
pub struct TodoStorage<S: KvStore> {
    store: S,
}

impl<S: KvStore> TodoStorage<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Migrate legacy records and seed the sort preference. Idempotent.
    pub fn initialize(&self) -> Result<()> {
        self.store.atomically(|| {
            if self.store.get_value(KEY_TASKS)?.is_none() {
                let legacy: Vec<LegacyTask> = self.store.get_or(KEY_LEGACY_TASKS, Vec::new())?;
                let migrated: Vec<Task> = legacy
                    .into_iter()
                    .map(|t| Task {
                        id: generate_id(),
                        label: t.label,
                        date: t.date,
                        completed: false,
                    })
                    .collect();
                info!("migrated {} legacy task(s)", migrated.len());
                self.store.update(KEY_TASKS, &migrated)?;
            }
            if self.store.get_value(KEY_SORT_ORDER)?.is_none() {
                self.store.update(KEY_SORT_ORDER, &SortOrder::default())?;
            }
            Ok(())
        })
    }

    /// Stored list in creation order.
    pub fn get_all(&self) -> Result<Vec<Task>> {
        self.store.get_or(KEY_TASKS, Vec::new())
    }

    fn set_all(&self, tasks: &[Task]) -> Result<()> {
        self.store.update(KEY_TASKS, &tasks)
    }

    /// Read the list, let `f` transform it, and write it back if `f` says so.
    fn mutate<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Vec<Task>) -> (T, bool),
    {
        self.store.atomically(|| {
            let mut tasks = self.get_all()?;
            let (result, changed) = f(&mut tasks);
            if changed {
                self.set_all(&tasks)?;
            }
            Ok(result)
        })
    }

    pub fn add(&self, label: &str, date: &str) -> Result<Task> {
        let task = Task {
            id: generate_id(),
            label: label.to_string(),
            date: date.to_string(),
            completed: false,
        };
        self.mutate(|tasks| {
            tasks.push(task.clone());
            ((), true)
        })?;
        Ok(task)
    }

    /// Flip the completion flag. Returns false (and writes nothing) if no
    /// task has this id.
    pub fn toggle(&self, id: &str) -> Result<bool> {
        self.mutate(|tasks| match tasks.iter_mut().find(|t| t.id == id) {
            Some(task) => {
                task.completed = !task.completed;
                (true, true)
            }
            None => (false, false),
        })
    }

    pub fn remove(&self, id: &str) -> Result<bool> {
        self.mutate(|tasks| {
            let before = tasks.len();
            tasks.retain(|t| t.id != id);
            let removed = tasks.len() != before;
            (removed, removed)
        })
    }

    pub fn edit(&self, id: &str, edit: &TaskEdit) -> Result<bool> {
        self.mutate(|tasks| match tasks.iter_mut().find(|t| t.id == id) {
            Some(task) => {
                if let Some(label) = &edit.label {
                    task.label = label.clone();
                }
                if let Some(date) = &edit.date {
                    task.date = date.clone();
                }
                (true, true)
            }
            None => (false, false),
        })
    }

    /// Drop every completed task, keeping the others in stored order.
    /// Returns how many were removed.
    pub fn clear_completed(&self) -> Result<usize> {
        self.mutate(|tasks| {
            let before = tasks.len();
            tasks.retain(|t| !t.completed);
            let removed = before - tasks.len();
            (removed, removed > 0)
        })
    }

    pub fn get_sort_order(&self) -> Result<SortOrder> {
        self.store.get_or(KEY_SORT_ORDER, SortOrder::default())
    }

    pub fn set_sort_order(&self, order: SortOrder) -> Result<()> {
        self.store.update(KEY_SORT_ORDER, &order)
    }

    /// The list in the current sort order. Stored order is not changed.
    pub fn get_all_sorted(&self) -> Result<Vec<Task>> {
        let order = self.get_sort_order()?;
        Ok(sort_tasks(&self.get_all()?, order))
    }

    pub fn get_filtered(&self, filter: Filter) -> Result<Vec<Task>> {
        let mut tasks = self.get_all_sorted()?;
        tasks.retain(|t| filter.matches(t));
        Ok(tasks)
    }
}

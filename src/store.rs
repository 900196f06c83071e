//! Key-value persistence for the todo list.
//!
//! Values are JSON documents addressed by a string key. The SQLite-backed
//! store keeps them in the `kv` table; every read-modify-write the storage
//! manager performs runs inside [`KvStore::atomically`].

use anyhow::{Context, Result};
use rusqlite::{Connection, OptionalExtension};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::db;

pub const KEY_TASKS: &str = "todoTasksV2";
pub const KEY_LEGACY_TASKS: &str = "todoTasks";
pub const KEY_SORT_ORDER: &str = "todoSortOrder";
pub const KEY_REMINDER_LEDGER: &str = "todoLastReminderById";

pub trait KvStore {
    /// Raw value stored under `key`, or `None` if the key was never written.
    fn get_value(&self, key: &str) -> Result<Option<Value>>;

    /// Replace the value stored under `key`.
    fn update_value(&self, key: &str, value: Value) -> Result<()>;

    /// Run `f` as one all-or-nothing unit against this store.
    fn atomically<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce() -> Result<T>,
    {
        f()
    }

    fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.get_value(key)? {
            Some(value) => {
                let parsed = serde_json::from_value(value)
                    .with_context(|| format!("stored value for '{key}' is malformed"))?;
                Ok(Some(parsed))
            }
            None => Ok(None),
        }
    }

    fn get_or<T: DeserializeOwned>(&self, key: &str, default: T) -> Result<T> {
        Ok(self.get(key)?.unwrap_or(default))
    }

    fn update<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        let value = serde_json::to_value(value)
            .with_context(|| format!("failed to serialize value for '{key}'"))?;
        self.update_value(key, value)
    }
}

pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open (creating if needed) the database at `path`.
    pub fn open(path: &str) -> Result<Self> {
        let conn = db::open(path)?;
        db::init(&conn)?;
        Ok(Self { conn })
    }

    pub fn open_memory() -> Result<Self> {
        Ok(Self {
            conn: db::open_memory()?,
        })
    }

    pub fn conn(&self) -> &Connection {
        &self.conn
    }
}

impl KvStore for SqliteStore {
    fn get_value(&self, key: &str) -> Result<Option<Value>> {
        let raw: Option<String> = self
            .conn
            .query_row("SELECT value FROM kv WHERE key = ?1", [key], |row| row.get(0))
            .optional()?;
        match raw {
            Some(text) => {
                let value = serde_json::from_str(&text)
                    .with_context(|| format!("stored value for '{key}' is not valid JSON"))?;
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    fn update_value(&self, key: &str, value: Value) -> Result<()> {
        let text = serde_json::to_string(&value)?;
        self.conn.execute(
            "INSERT INTO kv (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET
                 value = excluded.value,
                 updated_at = strftime('%Y-%m-%dT%H:%M:%SZ', 'now')",
            rusqlite::params![key, text],
        )?;
        Ok(())
    }

    fn atomically<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce() -> Result<T>,
    {
        // Nested calls join the outer transaction.
        if !self.conn.is_autocommit() {
            return f();
        }

        self.conn.execute_batch("BEGIN IMMEDIATE")?;
        match f() {
            Ok(value) => match self.conn.execute_batch("COMMIT") {
                Ok(()) => Ok(value),
                Err(e) => {
                    // A failed COMMIT leaves the transaction open.
                    let _ = self.conn.execute_batch("ROLLBACK");
                    Err(e).context("failed to commit")
                }
            },
            Err(e) => {
                let _ = self.conn.execute_batch("ROLLBACK");
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::bail;
    use serde_json::json;

    #[test]
    fn missing_key_is_none() {
        let store = SqliteStore::open_memory().unwrap();
        assert!(store.get_value("nope").unwrap().is_none());
        let fallback: Vec<String> = store.get_or("nope", Vec::new()).unwrap();
        assert!(fallback.is_empty());
    }

    #[test]
    fn update_then_get() {
        let store = SqliteStore::open_memory().unwrap();
        store.update_value("k", json!({"a": 1})).unwrap();
        assert_eq!(store.get_value("k").unwrap(), Some(json!({"a": 1})));

        store.update_value("k", json!([1, 2, 3])).unwrap();
        let list: Vec<i64> = store.get("k").unwrap().unwrap();
        assert_eq!(list, vec![1, 2, 3]);
    }

    #[test]
    fn malformed_value_names_the_key() {
        let store = SqliteStore::open_memory().unwrap();
        store.update_value("todoSortOrder", json!(42)).unwrap();
        let err = store.get::<String>("todoSortOrder").unwrap_err();
        assert!(err.to_string().contains("todoSortOrder"), "{err}");
    }

    #[test]
    fn atomically_commits_on_success() {
        let store = SqliteStore::open_memory().unwrap();
        store
            .atomically(|| {
                store.update_value("a", json!(1))?;
                store.update_value("b", json!(2))
            })
            .unwrap();
        assert_eq!(store.get_value("a").unwrap(), Some(json!(1)));
        assert_eq!(store.get_value("b").unwrap(), Some(json!(2)));
        assert!(store.conn().is_autocommit());
    }

    #[test]
    fn atomically_rolls_back_on_error() {
        let store = SqliteStore::open_memory().unwrap();
        store.update_value("a", json!("before")).unwrap();
        let result: Result<()> = store.atomically(|| {
            store.update_value("a", json!("after"))?;
            bail!("boom")
        });
        assert!(result.is_err());
        assert_eq!(store.get_value("a").unwrap(), Some(json!("before")));
        assert!(store.conn().is_autocommit());
    }

    #[test]
    fn failed_commit_does_not_wedge_later_units() {
        let store = SqliteStore::open_memory().unwrap();
        // A deferred foreign key is only checked at COMMIT.
        store
            .conn()
            .execute_batch(
                "PRAGMA foreign_keys = ON;
                 CREATE TABLE parent (id INTEGER PRIMARY KEY);
                 CREATE TABLE child (
                     parent_id INTEGER REFERENCES parent(id) DEFERRABLE INITIALLY DEFERRED
                 );",
            )
            .unwrap();

        let result: Result<()> = store.atomically(|| {
            store.update_value("a", json!("lost"))?;
            store
                .conn()
                .execute("INSERT INTO child (parent_id) VALUES (42)", [])?;
            Ok(())
        });
        assert!(result.is_err());
        assert!(store.conn().is_autocommit());
        assert!(store.get_value("a").unwrap().is_none());

        store
            .atomically(|| store.update_value("b", json!("kept")))
            .unwrap();
        assert!(store.conn().is_autocommit());
        assert_eq!(store.get_value("b").unwrap(), Some(json!("kept")));
    }

    #[test]
    fn nested_atomically_joins_outer() {
        let store = SqliteStore::open_memory().unwrap();
        let result: Result<()> = store.atomically(|| {
            store.atomically(|| store.update_value("inner", json!(true)))?;
            bail!("outer fails")
        });
        assert!(result.is_err());
        assert!(store.get_value("inner").unwrap().is_none());
    }
}

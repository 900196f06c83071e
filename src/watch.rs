//! Notice when another process changes the todo database.
//!
//! File events only say that something under the database's name was
//! touched, and the panel's own writes touch it too. SQLite's
//! `data_version` moves only for commits made by *other* connections, so a
//! wake counts as a change only if that counter moved as well.

use std::path::Path;
use std::sync::mpsc::{self, Receiver};

use anyhow::{Context, Result};
use log::debug;
use notify::{EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use rusqlite::Connection;

/// True for the database file itself and its `-wal` / `-shm` / `-journal`
/// companions.
fn is_db_file(path: &Path, db_filename: &str) -> bool {
    path.file_name()
        .map(|f| f.to_string_lossy().starts_with(db_filename))
        .unwrap_or(false)
}

/// Whether a file event can signal a database write. Reads (access events)
/// happen on every query and never do.
fn is_write_to_db(event: &notify::Event, db_filename: &str) -> bool {
    !matches!(event.kind, EventKind::Access(_))
        && event.paths.iter().any(|p| is_db_file(p, db_filename))
}

fn data_version(conn: &Connection) -> Result<i64> {
    conn.query_row("PRAGMA data_version", [], |row| row.get(0))
        .context("failed to read data_version")
}

pub struct DbWatcher {
    // Dropping the watcher stops the events.
    _watcher: RecommendedWatcher,
    rx: Receiver<()>,
    seen_version: i64,
}

impl DbWatcher {
    /// Watch the directory holding `db_path`. `conn` is the connection the
    /// caller writes through; its own commits are not reported.
    pub fn new(db_path: &str, conn: &Connection) -> Result<Self> {
        let (tx, rx) = mpsc::channel();
        let db_filename = Path::new(db_path)
            .file_name()
            .map(|f| f.to_string_lossy().into_owned())
            .unwrap_or_default();

        let mut watcher =
            notify::recommended_watcher(move |res: notify::Result<notify::Event>| {
                if let Ok(event) = res {
                    if is_write_to_db(&event, &db_filename) {
                        let _ = tx.send(());
                    }
                }
            })
            .context("failed to create file watcher")?;

        // SQLite keeps -wal and -shm next to the database, so watch the
        // directory rather than the file.
        let dir = match Path::new(db_path).parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        watcher
            .watch(dir, RecursiveMode::NonRecursive)
            .with_context(|| format!("failed to watch {}", dir.display()))?;

        Ok(Self {
            _watcher: watcher,
            rx,
            seen_version: data_version(conn)?,
        })
    }

    /// True if another connection committed since the last call that
    /// returned true. Never blocks.
    pub fn changed_elsewhere(&mut self, conn: &Connection) -> Result<bool> {
        let mut woke = false;
        while self.rx.try_recv().is_ok() {
            woke = true;
        }
        if !woke {
            return Ok(false);
        }
        self.version_moved(conn)
    }

    fn version_moved(&mut self, conn: &Connection) -> Result<bool> {
        let version = data_version(conn)?;
        if version == self.seen_version {
            debug!("ignoring wake from our own write");
            return Ok(false);
        }
        self.seen_version = version;
        Ok(true)
    }
}

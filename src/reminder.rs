//! Daily due/overdue reminders.
//!
//! The scheduler is a polling timer owned by the host event loop: the loop
//! asks [`ReminderScheduler::poll`] whether a tick is due and, if so, calls
//! [`tick`]. A task is reminded about at most once per calendar day; the
//! last reminder date per task id lives in the persisted ledger.

use std::collections::{BTreeMap, HashSet};
use std::time::{Duration, Instant};

use anyhow::Result;
use chrono::{Local, NaiveDate};
use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};

use crate::ops::TodoStorage;
use crate::store::{KvStore, KEY_REMINDER_LEDGER};
use crate::validate::{parse_date, DATE_FORMAT};

pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(60);

/// Task id → `YYYY-MM-DD` of the last reminder shown for it.
pub type Ledger = BTreeMap<String, String>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

/// Somewhere user-facing messages can be shown.
pub trait Notifier {
    fn show(&mut self, severity: Severity, text: &str);

    fn show_info(&mut self, text: &str) {
        self.show(Severity::Info, text);
    }

    fn show_warning(&mut self, text: &str) {
        self.show(Severity::Warning, text);
    }

    fn show_error(&mut self, text: &str) {
        self.show(Severity::Error, text);
    }
}

/// Sends notifications to the log.
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn show(&mut self, severity: Severity, text: &str) {
        match severity {
            Severity::Info => info!("{text}"),
            Severity::Warning => warn!("{text}"),
            Severity::Error => error!("{text}"),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ReminderOptions {
    /// Drop ledger entries whose task no longer exists.
    pub prune_orphans: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    pub overdue: usize,
    pub due_today: usize,
    pub pruned: usize,
}

impl TickReport {
    pub fn notified(&self) -> usize {
        self.overdue + self.due_today
    }
}

pub fn today_local() -> NaiveDate {
    Local::now().date_naive()
}

/// One pass over the task list. Errors from the store propagate.
///
/// Deciding what to remind about and recording it in the ledger is one
/// atomic unit, so two hosts sharing a database never both remind about
/// the same task on the same day. Notifications are shown only after the
/// ledger write has committed.
pub fn run_tick<S: KvStore>(
    storage: &TodoStorage<S>,
    today: NaiveDate,
    options: ReminderOptions,
    notifier: &mut dyn Notifier,
) -> Result<TickReport> {
    let store = storage.store();
    let (report, pending) = store.atomically(|| {
        let tasks = storage.get_all()?;
        let mut ledger: Ledger = store.get_or(KEY_REMINDER_LEDGER, Ledger::new())?;
        let today_str = today.format(DATE_FORMAT).to_string();
        let mut report = TickReport::default();
        let mut pending = Vec::new();

        for task in tasks.iter().filter(|t| !t.completed) {
            let Some(due) = parse_date(&task.date) else {
                debug!("skipping task {} with unparseable date '{}'", task.id, task.date);
                continue;
            };
            if due > today {
                continue;
            }
            if ledger.get(&task.id).map(String::as_str) == Some(today_str.as_str()) {
                continue;
            }

            if due < today {
                pending.push((
                    Severity::Warning,
                    format!("Overdue: {} (Due: {})", task.label, task.date),
                ));
                report.overdue += 1;
            } else {
                pending.push((Severity::Info, format!("Due today: {}", task.label)));
                report.due_today += 1;
            }
            ledger.insert(task.id.clone(), today_str.clone());
        }

        if options.prune_orphans {
            let live: HashSet<&str> = tasks.iter().map(|t| t.id.as_str()).collect();
            let before = ledger.len();
            ledger.retain(|id, _| live.contains(id.as_str()));
            report.pruned = before - ledger.len();
        }

        if !pending.is_empty() || report.pruned > 0 {
            store.update(KEY_REMINDER_LEDGER, &ledger)?;
        }
        Ok((report, pending))
    })?;

    for (severity, text) in &pending {
        notifier.show(*severity, text);
    }
    Ok(report)
}

/// Like [`run_tick`] but never fails: errors are logged and the next tick
/// starts over from the persisted state. Returns the number of
/// notifications shown.
pub fn tick<S: KvStore>(
    storage: &TodoStorage<S>,
    today: NaiveDate,
    options: ReminderOptions,
    notifier: &mut dyn Notifier,
) -> usize {
    match run_tick(storage, today, options, notifier) {
        Ok(report) => {
            if report.notified() > 0 || report.pruned > 0 {
                info!(
                    "reminder tick: {} overdue, {} due today, {} pruned",
                    report.overdue, report.due_today, report.pruned
                );
            }
            report.notified()
        }
        Err(e) => {
            warn!("reminder tick failed: {e:#}");
            0
        }
    }
}

/// Cooperative polling timer. The first poll is due immediately.
#[derive(Debug)]
pub struct ReminderScheduler {
    interval: Duration,
    next_due: Option<Instant>,
}

impl ReminderScheduler {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            next_due: None,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// True if a tick should run now; schedules the following one.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.next_due {
            Some(due) if now < due => false,
            _ => {
                self.next_due = Some(now + self.interval);
                true
            }
        }
    }

    /// How long the host may wait before the next poll is due.
    pub fn time_until_due(&self, now: Instant) -> Duration {
        match self.next_due {
            Some(due) => due.saturating_duration_since(now),
            None => Duration::ZERO,
        }
    }
}

use chrono::NaiveDate;
use serde_json::json;

use tickie::model::{Filter, SortOrder, TaskEdit};
use tickie::ops::TodoStorage;
use tickie::protocol::{self, Command, Event};
use tickie::reminder::{self, Notifier, ReminderOptions, Severity, TickReport};
use tickie::store::{KvStore, SqliteStore, KEY_LEGACY_TASKS, KEY_REMINDER_LEDGER};

#[derive(Default)]
struct Recorder(Vec<(Severity, String)>);

impl Notifier for Recorder {
    fn show(&mut self, severity: Severity, text: &str) {
        self.0.push((severity, text.to_string()));
    }
}

fn open(path: &str) -> TodoStorage<SqliteStore> {
    let storage = TodoStorage::new(SqliteStore::open(path).unwrap());
    storage.initialize().unwrap();
    storage
}

fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[test]
fn todo_lifecycle_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tickie.db");
    let path = path.to_str().unwrap();

    // First session: add three todos, finish one, pick a sort order.
    let (renew_id, groceries_id) = {
        let storage = open(path);
        let renew = storage.add("Renew passport", "2024-06-30").unwrap();
        let groceries = storage.add("groceries", "2024-06-02").unwrap();
        storage.add("Call plumber", "2024-06-10").unwrap();
        assert!(storage.toggle(&groceries.id).unwrap());
        storage.set_sort_order(SortOrder::NameAsc).unwrap();
        (renew.id, groceries.id)
    };

    // Second session sees the same state.
    let storage = open(path);
    let labels: Vec<String> = storage
        .get_all_sorted()
        .unwrap()
        .into_iter()
        .map(|t| t.label)
        .collect();
    assert_eq!(labels, ["Call plumber", "groceries", "Renew passport"]);
    assert_eq!(storage.get_sort_order().unwrap(), SortOrder::NameAsc);

    let active = storage.get_filtered(Filter::Active).unwrap();
    assert_eq!(active.len(), 2);
    assert!(active.iter().all(|t| t.id != groceries_id));

    let edit = TaskEdit {
        label: None,
        date: Some("2024-07-15".into()),
    };
    assert!(storage.edit(&renew_id, &edit).unwrap());
    assert_eq!(storage.clear_completed().unwrap(), 1);

    let storage = open(path);
    let all = storage.get_all().unwrap();
    assert_eq!(all.len(), 2);
    let renew = all.iter().find(|t| t.id == renew_id).unwrap();
    assert_eq!(renew.label, "Renew passport");
    assert_eq!(renew.date, "2024-07-15");
}

#[test]
fn legacy_list_is_migrated_once() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tickie.db");
    let path = path.to_str().unwrap();

    {
        let store = SqliteStore::open(path).unwrap();
        store
            .update_value(
                KEY_LEGACY_TASKS,
                json!([
                    {"label": "Old chore", "date": "2023-12-01"},
                    {"label": "Older chore", "date": "not a date"}
                ]),
            )
            .unwrap();
    }

    let storage = open(path);
    let migrated = storage.get_all().unwrap();
    assert_eq!(migrated.len(), 2);
    assert!(migrated.iter().all(|t| !t.completed && !t.id.is_empty()));
    assert_eq!(migrated[1].date, "not a date");

    // Deleting everything must not bring the legacy records back.
    for task in &migrated {
        assert!(storage.remove(&task.id).unwrap());
    }
    let storage = open(path);
    assert!(storage.get_all().unwrap().is_empty());
}

#[test]
fn surfaces_and_reminders_share_one_store() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tickie.db");
    let storage = open(path.to_str().unwrap());

    let reply = protocol::dispatch(
        &storage,
        Command::AddTodo {
            label: "  Submit report ".into(),
            date: "2024-05-20".into(),
        },
    )
    .unwrap();
    assert!(reply.changed);
    let Event::SetTodos { todos, .. } = &reply.event else {
        panic!("expected setTodos, got {:?}", reply.event);
    };
    assert_eq!(todos[0].label, "Submit report");

    let rejected = protocol::dispatch(
        &storage,
        Command::AddTodo {
            label: "Water lawn".into(),
            date: "2024-5-21".into(),
        },
    )
    .unwrap();
    assert!(!rejected.changed);
    assert!(matches!(
        rejected.event,
        Event::Notify {
            severity: Severity::Error,
            ..
        }
    ));
    assert_eq!(storage.get_all().unwrap().len(), 1);

    // Due today on the 20th: one reminder, then silence for the rest of the day.
    let mut recorder = Recorder::default();
    let options = ReminderOptions::default();
    reminder::run_tick(&storage, day(2024, 5, 20), options, &mut recorder).unwrap();
    reminder::run_tick(&storage, day(2024, 5, 20), options, &mut recorder).unwrap();
    assert_eq!(
        recorder.0,
        vec![(Severity::Info, "Due today: Submit report".to_string())]
    );

    // Next day it is overdue.
    let report = reminder::run_tick(&storage, day(2024, 5, 21), options, &mut recorder).unwrap();
    assert_eq!(report.overdue, 1);
    assert_eq!(
        recorder.0[1],
        (
            Severity::Warning,
            "Overdue: Submit report (Due: 2024-05-20)".to_string()
        )
    );

    let ledger = storage.store().get_value(KEY_REMINDER_LEDGER).unwrap().unwrap();
    assert_eq!(ledger[&todos[0].id], "2024-05-21");
}

/// Notifier for one host that runs a second host's tick the first time it
/// is asked to show something.
struct ChainedHost<'a> {
    other: &'a TodoStorage<SqliteStore>,
    today: NaiveDate,
    shown: usize,
    other_report: Option<TickReport>,
}

impl Notifier for ChainedHost<'_> {
    fn show(&mut self, _severity: Severity, _text: &str) {
        self.shown += 1;
        if self.other_report.is_none() {
            let mut recorder = Recorder::default();
            let report = reminder::run_tick(
                self.other,
                self.today,
                ReminderOptions::default(),
                &mut recorder,
            )
            .unwrap();
            assert_eq!(report.notified(), recorder.0.len());
            self.other_report = Some(report);
        }
    }
}

#[test]
fn two_hosts_remind_once_per_day() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tickie.db");
    let path = path.to_str().unwrap();

    let host_a = open(path);
    let host_b = open(path);
    host_a.add("Renew insurance", "2024-05-01").unwrap();

    let today = day(2024, 5, 3);
    let mut chained = ChainedHost {
        other: &host_b,
        today,
        shown: 0,
        other_report: None,
    };
    let report = reminder::run_tick(&host_a, today, ReminderOptions::default(), &mut chained).unwrap();

    assert_eq!(report.overdue, 1);
    assert_eq!(chained.shown, 1);
    // The second host ran while the first was notifying and found the
    // reminder already recorded.
    assert_eq!(chained.other_report, Some(TickReport::default()));

    let ledger = host_b.store().get_value(KEY_REMINDER_LEDGER).unwrap().unwrap();
    assert_eq!(ledger.as_object().unwrap().len(), 1);
}

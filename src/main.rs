mod cli;

use std::fs::OpenOptions;
use std::io::{self, BufRead, IsTerminal, Write};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};
use clap::Parser;
use log::info;

use cli::{Cli, Command};
use tickie::config::Config;
use tickie::model::{Filter, SortOrder, TaskEdit};
use tickie::ops::TodoStorage;
use tickie::output::{self, TaskListing};
use tickie::reminder::{self, LogNotifier, ReminderScheduler};
use tickie::store::SqliteStore;
use tickie::{paths, serve, tui, validate};

/// Longest the reminder daemon sleeps before checking for Ctrl-C.
const DAEMON_NAP: Duration = Duration::from_millis(500);

fn resolve_db_path(cli_db: Option<String>) -> String {
    cli_db.unwrap_or_else(paths::db_path)
}

fn ensure_parent_dir(path: &str) -> Result<()> {
    if let Some(parent) = Path::new(path).parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create directory {}", parent.display()))?;
        }
    }
    Ok(())
}

fn open_storage(db_path: &str) -> Result<TodoStorage<SqliteStore>> {
    let storage = TodoStorage::new(SqliteStore::open(db_path)?);
    storage.initialize()?;
    Ok(storage)
}

/// Long-running interactive commands log to a file so output doesn't
/// garble the terminal; everything else logs to stderr.
fn setup_logging(command: &Command) -> Result<()> {
    let default_level = match command {
        Command::Remind { .. } | Command::Watch { .. } => "info",
        _ => "warn",
    };
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level));
    if matches!(command, Command::Watch { .. }) {
        let log_path = paths::log_path();
        ensure_parent_dir(&log_path)?;
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_path)
            .with_context(|| format!("failed to open log file {log_path}"))?;
        builder.target(env_logger::Target::Pipe(Box::new(file)));
    }
    builder.format_timestamp_secs().init();
    Ok(())
}

/// Ask for a value on the terminal. `None` means the user cancelled by
/// entering nothing.
fn prompt(question: &str) -> Result<Option<String>> {
    eprint!("{question}: ");
    io::stderr().flush()?;
    let mut answer = String::new();
    io::stdin()
        .lock()
        .read_line(&mut answer)
        .context("failed to read answer")?;
    let answer = answer.trim();
    Ok((!answer.is_empty()).then(|| answer.to_string()))
}

/// Use the argument if given, otherwise prompt when attached to a terminal.
fn arg_or_prompt(arg: Option<String>, question: &str, what: &str) -> Result<Option<String>> {
    match arg {
        Some(value) => Ok(Some(value.trim().to_string())),
        None if io::stdin().is_terminal() => prompt(question),
        None => bail!("{what} is required"),
    }
}

fn report_miss(found: bool, id: &str) {
    if !found {
        eprintln!("No todo with id '{id}'");
    }
}

fn main() {
    if let Err(e) = run() {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(&cli.command)?;
    let db_path = resolve_db_path(cli.db);
    ensure_parent_dir(&db_path)?;

    match cli.command {
        Command::Add { label, date, json } => {
            let Some(label) = arg_or_prompt(label, "Enter task name", "task label")? else {
                eprintln!("Cancelled");
                return Ok(());
            };
            validate::validate_label(&label)?;
            let Some(date) =
                arg_or_prompt(date, "Enter due date (e.g., YYYY-MM-DD)", "due date")?
            else {
                eprintln!("Cancelled");
                return Ok(());
            };
            validate::validate_date(&date)?;

            let storage = open_storage(&db_path)?;
            let task = storage.add(&label, &date)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&task)?);
            }
            eprintln!("Task added: {} (Due: {})", task.label, task.date);
        }

        Command::List { filter, json } => {
            let config = Config::load()?;
            let filter = match filter {
                Some(f) => Filter::parse(&f)?,
                None => config.display.filter.unwrap_or_default(),
            };
            let storage = open_storage(&db_path)?;
            let sort_order = storage.get_sort_order()?;
            let todos = storage.get_filtered(filter)?;
            if json {
                let listing = TaskListing {
                    sort_order,
                    filter,
                    todos: &todos,
                };
                println!("{}", serde_json::to_string_pretty(&listing)?);
            } else if todos.is_empty() {
                eprintln!("No todos");
            } else {
                print!("{}", output::format_task_list(&todos));
            }
        }

        Command::Show { id, json } => {
            let storage = open_storage(&db_path)?;
            let todos = storage.get_all()?;
            let Some(task) = todos.iter().find(|t| t.id == id) else {
                bail!("todo '{id}' not found");
            };
            if json {
                println!("{}", serde_json::to_string_pretty(task)?);
            } else {
                print!("{}", output::format_task_detail(task));
            }
        }

        Command::Toggle { id } => {
            let storage = open_storage(&db_path)?;
            let found = storage.toggle(&id)?;
            report_miss(found, &id);
            if found {
                eprintln!("Toggled '{id}'");
            }
        }

        Command::Rm { id } => {
            let storage = open_storage(&db_path)?;
            let found = storage.remove(&id)?;
            report_miss(found, &id);
            if found {
                eprintln!("Removed '{id}'");
            }
        }

        Command::Edit { id, label, date } => {
            let edit = TaskEdit {
                label: label.map(|l| l.trim().to_string()),
                date: date.map(|d| d.trim().to_string()),
            };
            if edit.is_empty() {
                bail!("nothing to edit: pass --label and/or --date");
            }
            validate::validate_edit(&edit)?;
            let storage = open_storage(&db_path)?;
            let found = storage.edit(&id, &edit)?;
            report_miss(found, &id);
            if found {
                eprintln!("Updated '{id}'");
            }
        }

        Command::ClearCompleted => {
            let storage = open_storage(&db_path)?;
            let removed = storage.clear_completed()?;
            eprintln!("Cleared {removed} completed todo(s)");
        }

        Command::Sort { order } => {
            let storage = open_storage(&db_path)?;
            match order {
                None => println!("{}", storage.get_sort_order()?),
                Some(order) => {
                    let order = SortOrder::parse(&order)?;
                    storage.set_sort_order(order)?;
                    eprintln!("Sort order set to {} ({})", order, order.describe());
                }
            }
        }

        Command::Remind { once } => {
            let config = Config::load()?;
            let storage = open_storage(&db_path)?;
            let options = config.reminders.options();
            let mut notifier = LogNotifier;

            if once {
                let report =
                    reminder::run_tick(&storage, reminder::today_local(), options, &mut notifier)?;
                eprintln!(
                    "{} overdue, {} due today",
                    report.overdue, report.due_today
                );
                return Ok(());
            }
            if !config.reminders.enabled() {
                bail!("reminders are disabled in {}", paths::config_path());
            }

            let running = Arc::new(AtomicBool::new(true));
            let r = running.clone();
            ctrlc::set_handler(move || {
                r.store(false, Ordering::SeqCst);
            })
            .context("failed to set signal handler")?;

            let mut scheduler = ReminderScheduler::new(config.reminders.interval());
            info!(
                "reminders started (every {}s)",
                scheduler.interval().as_secs()
            );
            while running.load(Ordering::SeqCst) {
                if scheduler.poll(Instant::now()) {
                    reminder::tick(&storage, reminder::today_local(), options, &mut notifier);
                }
                std::thread::sleep(scheduler.time_until_due(Instant::now()).min(DAEMON_NAP));
            }
            info!("reminders stopped");
        }

        Command::Watch { poll_interval } => {
            let config = Config::load()?;
            let storage = open_storage(&db_path)?;
            tui::run(&db_path, &storage, &config, poll_interval)?;
        }

        Command::Serve => {
            let config = Config::load()?;
            let storage = open_storage(&db_path)?;
            let reminders = config.reminders.enabled().then(|| serve::Reminders {
                interval: config.reminders.interval(),
                options: config.reminders.options(),
                today: reminder::today_local,
            });
            let stdin = io::BufReader::new(io::stdin());
            serve::run(&storage, stdin, &mut io::stdout().lock(), reminders)?;
        }
    }

    Ok(())
}

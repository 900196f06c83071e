mod app;
mod event;
mod panel;

use std::io;
use std::time::{Duration, Instant};

use anyhow::Result;
use crossterm::event::{self as ct_event, Event, KeyEventKind};
use crossterm::execute;
use crossterm::terminal::{self, EnterAlternateScreen, LeaveAlternateScreen};
use log::{error, info};
use ratatui::prelude::*;

use crate::config::Config;
use crate::ops::TodoStorage;
use crate::protocol::{self, Command};
use crate::reminder::{self, ReminderScheduler};
use crate::store::SqliteStore;
use crate::validate::DATE_FORMAT;
use crate::watch::DbWatcher;
use app::App;
use event::KeyAction;

pub fn run(
    db_path: &str,
    storage: &TodoStorage<SqliteStore>,
    config: &Config,
    poll_interval: u64,
) -> Result<()> {
    let filter = config.display.filter.unwrap_or_default();
    let mut app = App::new(filter, today_string());
    send(&mut app, storage, Command::GetTodos);

    terminal::enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_loop(&mut terminal, &mut app, db_path, storage, config, poll_interval);

    terminal::disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;

    result
}

fn today_string() -> String {
    reminder::today_local().format(DATE_FORMAT).to_string()
}

/// Dispatch a command and fold the reply into the view. Store faults are
/// shown in the notice area rather than ending the session.
fn send(app: &mut App, storage: &TodoStorage<SqliteStore>, command: Command) {
    match protocol::dispatch(storage, command) {
        Ok(reply) => app.apply(reply.event),
        Err(e) => {
            error!("command failed: {e:#}");
            app.apply(protocol::Event::error(format!("{e:#}")));
        }
    }
}

fn run_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    db_path: &str,
    storage: &TodoStorage<SqliteStore>,
    config: &Config,
    poll_interval: u64,
) -> Result<()> {
    let poll_duration = Duration::from_millis(poll_interval);
    let reminder_options = config.reminders.options();
    let mut scheduler = config
        .reminders
        .enabled()
        .then(|| ReminderScheduler::new(config.reminders.interval()));
    info!(
        "panel started (reminders={})",
        scheduler
            .as_ref()
            .map(|s| format!("every {}s", s.interval().as_secs()))
            .unwrap_or_else(|| "off".into())
    );

    let conn = storage.store().conn();
    let mut watcher = DbWatcher::new(db_path, conn)?;

    loop {
        if let Some(scheduler) = scheduler.as_mut() {
            if scheduler.poll(Instant::now()) {
                app.today = today_string();
                reminder::tick(storage, reminder::today_local(), reminder_options, app);
            }
        }

        terminal.draw(|frame| panel::render(frame, app))?;

        let wait = match &scheduler {
            Some(s) => poll_duration.min(s.time_until_due(Instant::now())),
            None => poll_duration,
        };
        if ct_event::poll(wait)? {
            if let Event::Key(key) = ct_event::read()? {
                if key.kind == KeyEventKind::Press {
                    match event::handle_key(app, key) {
                        KeyAction::Quit => {
                            info!("panel closed");
                            return Ok(());
                        }
                        KeyAction::Send(command) => send(app, storage, command),
                        KeyAction::Continue => {}
                    }
                }
            }
        }

        match watcher.changed_elsewhere(conn) {
            Ok(true) => send(app, storage, Command::GetTodos),
            Ok(false) => {}
            Err(e) => error!("change check failed: {e:#}"),
        }
    }
}

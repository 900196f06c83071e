//! JSON-lines host for the message protocol.
//!
//! Each input line is one inbound [`Command`](crate::protocol::Command);
//! each reply, and each reminder, is written as one outbound event line.
//! A helper thread only reads lines and forwards them over a channel, so
//! dispatch and reminder ticks all happen on the calling thread.

use std::io::{BufRead, ErrorKind, Write};
use std::string::FromUtf8Error;
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use chrono::NaiveDate;
use log::{error, info, warn};

use crate::ops::TodoStorage;
use crate::protocol::{self, Event};
use crate::reminder::{self, Notifier, ReminderOptions, ReminderScheduler, Severity};
use crate::store::KvStore;

pub struct Reminders {
    pub interval: Duration,
    pub options: ReminderOptions,
    pub today: fn() -> NaiveDate,
}

/// Buffers notifications so they can be written as events afterwards.
#[derive(Default)]
struct Collected(Vec<Event>);

impl Notifier for Collected {
    fn show(&mut self, severity: Severity, text: &str) {
        self.0.push(Event::Notify {
            severity,
            text: text.to_string(),
        });
    }
}

fn write_event<W: Write>(output: &mut W, event: &Event) -> Result<()> {
    let line = protocol::encode_event(event)?;
    writeln!(output, "{line}").context("failed to write event")?;
    output.flush().context("failed to flush output")?;
    Ok(())
}

fn handle_line<S: KvStore>(storage: &TodoStorage<S>, line: &str) -> Event {
    let command = match protocol::parse_command(line) {
        Ok(c) => c,
        Err(e) => {
            warn!("{e:#}: {line}");
            return Event::error(format!("{e:#}"));
        }
    };
    match protocol::dispatch(storage, command) {
        Ok(reply) => reply.event,
        Err(e) => {
            error!("command failed: {e:#}");
            Event::error(format!("{e:#}"))
        }
    }
}

/// Forward each input line, decoded, until end of file or a read error.
/// A line that is not UTF-8 is forwarded as an error so it can be answered.
fn read_lines<R: BufRead>(mut input: R, tx: Sender<Result<String, FromUtf8Error>>) {
    let mut buf = Vec::new();
    loop {
        buf.clear();
        match input.read_until(b'\n', &mut buf) {
            Ok(0) => break,
            Ok(_) => {
                if buf.ends_with(b"\n") {
                    buf.pop();
                }
                if tx.send(String::from_utf8(std::mem::take(&mut buf))).is_err() {
                    break;
                }
            }
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => {
                warn!("stopped reading input: {e}");
                break;
            }
        }
    }
}

/// Serve until `input` reaches end of file.
pub fn run<S, R, W>(
    storage: &TodoStorage<S>,
    input: R,
    output: &mut W,
    reminders: Option<Reminders>,
) -> Result<()>
where
    S: KvStore,
    R: BufRead + Send + 'static,
    W: Write,
{
    let (tx, rx) = mpsc::channel::<Result<String, FromUtf8Error>>();
    let reader = thread::spawn(move || read_lines(input, tx));

    let mut scheduler = reminders
        .as_ref()
        .map(|r| ReminderScheduler::new(r.interval));
    info!("serving (reminders={})", scheduler.is_some());

    loop {
        if let (Some(scheduler), Some(r)) = (scheduler.as_mut(), reminders.as_ref()) {
            if scheduler.poll(Instant::now()) {
                let mut collected = Collected::default();
                reminder::tick(storage, (r.today)(), r.options, &mut collected);
                for event in &collected.0 {
                    write_event(output, event)?;
                }
            }
        }

        let next = match &scheduler {
            Some(s) => match rx.recv_timeout(s.time_until_due(Instant::now())) {
                Ok(line) => Some(line),
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => None,
            },
            None => rx.recv().ok(),
        };
        let Some(line) = next else {
            break;
        };

        let line = match line {
            Ok(line) => line,
            Err(e) => {
                warn!("rejecting line that is not UTF-8: {e}");
                write_event(output, &Event::error(format!("invalid message: {e}")))?;
                continue;
            }
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        write_event(output, &handle_line(storage, line))?;
    }

    let _ = reader.join();
    info!("input closed, stopping");
    Ok(())
}

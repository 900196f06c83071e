use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use super::app::{App, Mode};
use crate::protocol::Command;

/// Result of handling a key press.
#[derive(Debug, PartialEq, Eq)]
pub enum KeyAction {
    Quit,
    /// Forward this command to the storage manager.
    Send(Command),
    Continue,
}

/// Handle a key press. Returns an action indicating what the event loop should do.
pub fn handle_key(app: &mut App, key: KeyEvent) -> KeyAction {
    if app.form.is_some() {
        return handle_form(app, key);
    }

    if app.mode == Mode::Help {
        if matches!(
            key.code,
            KeyCode::Char('?') | KeyCode::Esc | KeyCode::Char('q')
        ) {
            app.mode = Mode::Normal;
        }
        return KeyAction::Continue;
    }

    app.clear_notices();
    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => KeyAction::Quit,
        KeyCode::Char('j') | KeyCode::Down => {
            app.move_down();
            KeyAction::Continue
        }
        KeyCode::Char('k') | KeyCode::Up => {
            app.move_up();
            KeyAction::Continue
        }
        KeyCode::Char(' ') | KeyCode::Char('x') => match app.selected_id() {
            Some(id) => KeyAction::Send(Command::ToggleTodo { id }),
            None => KeyAction::Continue,
        },
        KeyCode::Char('d') | KeyCode::Delete => match app.selected_id() {
            Some(id) => KeyAction::Send(Command::DeleteTodo { id }),
            None => KeyAction::Continue,
        },
        KeyCode::Char('a') => {
            app.open_add_form();
            KeyAction::Continue
        }
        KeyCode::Char('e') | KeyCode::Enter => {
            app.open_edit_form();
            KeyAction::Continue
        }
        KeyCode::Char('C') => KeyAction::Send(Command::ClearCompleted),
        KeyCode::Char('s') => KeyAction::Send(Command::SetSort {
            order: app.sort_order.next(),
        }),
        KeyCode::Char('f') => {
            app.cycle_filter();
            KeyAction::Continue
        }
        KeyCode::Char('r') => KeyAction::Send(Command::GetTodos),
        KeyCode::Char('?') => {
            app.toggle_help();
            KeyAction::Continue
        }
        _ => KeyAction::Continue,
    }
}

fn handle_form(app: &mut App, key: KeyEvent) -> KeyAction {
    let Some(form) = app.form.as_mut() else {
        return KeyAction::Continue;
    };
    match key.code {
        KeyCode::Esc => {
            app.close_form();
            KeyAction::Continue
        }
        KeyCode::Tab | KeyCode::BackTab => {
            form.next_field();
            KeyAction::Continue
        }
        KeyCode::Enter => match form.to_command() {
            Some(command) => {
                app.close_form();
                KeyAction::Send(command)
            }
            None => KeyAction::Continue,
        },
        KeyCode::Backspace => {
            form.focused_buf_mut().pop();
            form.error = None;
            KeyAction::Continue
        }
        KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            form.focused_buf_mut().clear();
            form.error = None;
            KeyAction::Continue
        }
        KeyCode::Char(c) => {
            form.focused_buf_mut().push(c);
            form.error = None;
            KeyAction::Continue
        }
        _ => KeyAction::Continue,
    }
}

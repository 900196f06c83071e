use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, Paragraph};

use super::app::{App, FormField, Mode, TaskForm};
use crate::model::Task;
use crate::output;
use crate::reminder::Severity;

pub fn render(frame: &mut Frame, app: &mut App) {
    let area = frame.area();
    let notice_rows = app.notices.len() as u16;
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(0),
            Constraint::Length(2),
            Constraint::Length(notice_rows),
            Constraint::Length(1),
        ])
        .split(area);

    render_header(frame, app, chunks[0]);
    render_list(frame, app, chunks[1]);
    if let Some(task) = app.selected() {
        frame.render_widget(
            Paragraph::new(output::task_tooltip(task)).style(Style::default().fg(Color::Gray)),
            chunks[2],
        );
    }
    render_notices(frame, app, chunks[3]);
    frame.render_widget(
        Paragraph::new("a: add  e: edit  space: toggle  d: delete  C: clear done  s: sort  f: filter  ?: help")
            .style(Style::default().fg(Color::DarkGray)),
        chunks[4],
    );

    if app.mode == Mode::Help {
        render_help(frame);
    }
    if let Some(form) = &app.form {
        render_form(frame, form);
    }
}

fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let line = Line::from(vec![
        Span::styled("Todos", Style::default().bold()),
        Span::raw(format!(
            "  sort: {}  filter: {}  ({} shown, {} done)",
            app.sort_order.describe(),
            app.filter,
            app.rows.len(),
            app.completed_count()
        )),
    ]);
    frame.render_widget(Paragraph::new(line), area);
}

/// Style for a task's due date relative to today.
fn due_style(task: &Task, today: &str) -> Style {
    if task.completed {
        Style::default().dim()
    } else if task.date.as_str() < today {
        Style::default().fg(Color::Red)
    } else if task.date == today {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default()
    }
}

fn render_list(frame: &mut Frame, app: &mut App, area: Rect) {
    let block = Block::default().borders(Borders::ALL).title(" TodoTickie ");

    if app.rows.is_empty() {
        frame.render_widget(
            Paragraph::new("No todos")
                .style(Style::default().italic().fg(Color::DarkGray))
                .block(block),
            area,
        );
        return;
    }

    let items: Vec<ListItem> = app
        .rows
        .iter()
        .map(|task| {
            let check = if task.completed { "[x] " } else { "[ ] " };
            let label_style = if task.completed {
                Style::default().dim().crossed_out()
            } else {
                Style::default().bold()
            };
            ListItem::new(Line::from(vec![
                Span::raw(check),
                Span::styled(task.label.clone(), label_style),
                Span::styled(
                    format!("  (Due: {})", task.date),
                    due_style(task, &app.today),
                ),
            ]))
        })
        .collect();

    let list = List::new(items)
        .block(block)
        .highlight_style(Style::default().bg(Color::DarkGray));
    frame.render_stateful_widget(list, area, &mut app.list_state);
}

fn render_notices(frame: &mut Frame, app: &App, area: Rect) {
    let lines: Vec<Line> = app
        .notices
        .iter()
        .map(|n| {
            let style = match n.severity {
                Severity::Info => Style::default().fg(Color::Cyan),
                Severity::Warning => Style::default().fg(Color::Yellow),
                Severity::Error => Style::default().fg(Color::Red),
            };
            Line::styled(n.text.clone(), style)
        })
        .collect();
    frame.render_widget(Paragraph::new(lines), area);
}

/// Center a rectangle within an area.
fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let x = area.x + area.width.saturating_sub(width) / 2;
    let y = area.y + area.height.saturating_sub(height) / 2;
    Rect::new(x, y, width.min(area.width), height.min(area.height))
}

fn render_field(
    frame: &mut Frame,
    label: &str,
    value: &str,
    focused: bool,
    chunks: &[Rect],
    idx: &mut usize,
) {
    let label_style = if focused {
        Style::default().fg(Color::Cyan).bold()
    } else {
        Style::default()
    };
    frame.render_widget(Paragraph::new(label).style(label_style), chunks[*idx]);
    *idx += 1;

    let cursor = if focused { "_" } else { "" };
    frame.render_widget(
        Paragraph::new(format!("  {value}{cursor}")).style(Style::default().fg(Color::White)),
        chunks[*idx],
    );
    *idx += 1;
}

fn render_form(frame: &mut Frame, form: &TaskForm) {
    let term = frame.area();
    let width = 60.min(term.width.saturating_sub(4));
    let content_rows: u16 = 5 + u16::from(form.error.is_some()); // 2*(label+input) + hint
    let height = (content_rows + 2).min(term.height.saturating_sub(2));
    let area = centered_rect(width, height, term);

    frame.render_widget(Clear, area);

    let block = Block::default()
        .borders(Borders::ALL)
        .title(form.title())
        .border_style(Style::default().fg(Color::Cyan));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let mut constraints = vec![Constraint::Length(1); 4];
    if form.error.is_some() {
        constraints.push(Constraint::Length(1));
    }
    constraints.push(Constraint::Length(1)); // hint
    constraints.push(Constraint::Min(0));

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(inner);

    let mut idx = 0;
    render_field(
        frame,
        "Task:",
        &form.label,
        form.focused == FormField::Label,
        &chunks,
        &mut idx,
    );
    render_field(
        frame,
        "Due date (YYYY-MM-DD):",
        &form.date,
        form.focused == FormField::Date,
        &chunks,
        &mut idx,
    );

    if let Some(err) = &form.error {
        frame.render_widget(
            Paragraph::new(err.as_str()).style(Style::default().fg(Color::Red)),
            chunks[idx],
        );
        idx += 1;
    }

    frame.render_widget(
        Paragraph::new("Enter: save  Tab: next field  Esc: cancel  C-u: clear")
            .style(Style::default().fg(Color::DarkGray)),
        chunks[idx],
    );
}

fn render_help(frame: &mut Frame) {
    let term = frame.area();
    let width = 44.min(term.width.saturating_sub(4));
    let height = 15.min(term.height.saturating_sub(2));
    let area = centered_rect(width, height, term);

    frame.render_widget(Clear, area);

    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Help ")
        .border_style(Style::default().fg(Color::Cyan));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let bindings = [
        ("j/Down  ", "Move down"),
        ("k/Up    ", "Move up"),
        ("a       ", "Add todo"),
        ("e/Enter ", "Edit selected todo"),
        ("Space/x ", "Toggle completed"),
        ("d/Del   ", "Delete todo"),
        ("C       ", "Clear completed"),
        ("s       ", "Next sort order"),
        ("f       ", "Next filter"),
        ("r       ", "Reload"),
        ("?       ", "Toggle help"),
        ("q/Esc   ", "Quit"),
    ];
    let help_text: Vec<Line> = bindings
        .iter()
        .map(|(key, what)| {
            Line::from(vec![
                Span::styled(*key, Style::default().fg(Color::Cyan)),
                Span::raw(*what),
            ])
        })
        .collect();

    frame.render_widget(Paragraph::new(help_text), inner);
}

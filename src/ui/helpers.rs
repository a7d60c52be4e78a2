use anyhow::Error;
use ratatui::layout::{Constraint, Flex, Layout, Rect};
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};

use crate::export::SalesTable;

/// Widest a table column may grow before its text is clipped.
const MAX_COLUMN_WIDTH: usize = 24;

/// Form panel placed in the middle of `area`, sized as a percentage of it.
pub(crate) fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let [column] = Layout::horizontal([Constraint::Percentage(percent_x)])
        .flex(Flex::Center)
        .areas(area);
    let [panel] = Layout::vertical([Constraint::Percentage(percent_y)])
        .flex(Flex::Center)
        .areas(column);
    panel
}

/// Footer text for a failed action: the outermost message, followed by the
/// root cause when the error was wrapped with context.
pub(crate) fn surface_error(err: &Error) -> String {
    match err.chain().last() {
        Some(root) if err.chain().count() > 1 => format!("{err}: {root}"),
        _ => err.to_string(),
    }
}

/// Render one `Label: value` form line, highlighting the focused field and
/// showing `placeholder` in grey while the value is empty.
pub(crate) fn field_line(
    label: &str,
    value: &str,
    is_active: bool,
    placeholder: &str,
) -> Line<'static> {
    let display = if value.is_empty() {
        placeholder.to_string()
    } else {
        value.to_string()
    };

    let style = if is_active {
        Style::default().fg(Color::Yellow)
    } else if value.is_empty() {
        Style::default().fg(Color::DarkGray)
    } else {
        Style::default()
    };

    Line::from(vec![
        Span::raw(format!("{label}: ")),
        Span::styled(display, style),
    ])
}

/// Size each column to its widest header or cell among `visible` rows,
/// clipped to `MAX_COLUMN_WIDTH`.
pub(crate) fn column_widths(table: &SalesTable, skip: usize, visible: usize) -> Vec<Constraint> {
    table
        .columns()
        .iter()
        .enumerate()
        .map(|(col, name)| {
            let widest_cell = table
                .rows()
                .iter()
                .skip(skip)
                .take(visible)
                .map(|row| row[col].to_string().chars().count())
                .max()
                .unwrap_or(0);
            let width = name.chars().count().max(widest_cell).min(MAX_COLUMN_WIDTH);
            Constraint::Length(width as u16)
        })
        .collect()
}

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use crossterm::event::KeyCode;
use open::that as open_path;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::prelude::*;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Row, Table, Tabs, Wrap};
use ratatui::Frame;
use tracing::error;

use crate::config::Config;
use crate::db::Database;
use crate::export::write_xlsx;
use crate::models::SaleOutcome;

use super::charts::{line_series, render_bar_chart, render_line_chart};
use super::forms::{BookField, BookForm, SaleField, SaleForm};
use super::helpers::{centered_rect, column_widths, surface_error};
use super::screens::SalesScreen;

/// Height of the page selector at the top.
const MENU_HEIGHT: u16 = 3;
/// Footer space reserved for status messages and instructions.
const FOOTER_HEIGHT: u16 = 3;
/// Rows moved by PageUp/PageDown on the sales table.
const PAGE_STEP: isize = 10;
/// Page titles, in menu order.
const MENU_TITLES: [&str; 3] = ["Add Book", "Record Sale", "Sales & Charts"];

/// The three pages of the dashboard. Each carries its own state and is
/// rebuilt from the database whenever the user switches to it.
enum Screen {
    AddBook(BookForm),
    RecordSale(SaleForm),
    Sales(SalesScreen),
}

impl Screen {
    fn menu_index(&self) -> usize {
        match self {
            Screen::AddBook(_) => 0,
            Screen::RecordSale(_) => 1,
            Screen::Sales(_) => 2,
        }
    }
}

/// Holds the footer message text plus its severity.
struct StatusMessage {
    text: String,
    kind: StatusKind,
}

/// Severity levels shown in the footer.
enum StatusKind {
    Info,
    Error,
}

impl StatusKind {
    fn style(&self) -> Style {
        match self {
            StatusKind::Info => Style::default().fg(Color::Green),
            StatusKind::Error => Style::default().fg(Color::Red),
        }
    }
}

/// Central application state shared across the TUI. Only the database
/// location is kept; every action opens and closes its own connection.
pub struct App {
    db: Database,
    config: Config,
    screen: Screen,
    status: Option<StatusMessage>,
    last_export: Option<PathBuf>,
}

impl App {
    pub fn new(db: Database, config: Config) -> Self {
        Self {
            db,
            config,
            screen: Screen::AddBook(BookForm::new(today())),
            status: None,
            last_export: None,
        }
    }

    /// Route one key press. Returns `true` when the user asked to quit.
    pub fn handle_key(&mut self, code: KeyCode) -> Result<bool> {
        match code {
            KeyCode::F(1) => {
                self.open_add_book();
                return Ok(false);
            }
            KeyCode::F(2) => {
                self.open_record_sale()?;
                return Ok(false);
            }
            KeyCode::F(3) => {
                self.open_sales()?;
                return Ok(false);
            }
            _ => {}
        }

        match self.screen {
            Screen::AddBook(_) => self.handle_add_book(code),
            Screen::RecordSale(_) => self.handle_record_sale(code),
            Screen::Sales(_) => Ok(self.handle_sales(code)),
        }
    }

    fn handle_add_book(&mut self, code: KeyCode) -> Result<bool> {
        let Screen::AddBook(form) = &mut self.screen else {
            return Ok(false);
        };

        match code {
            KeyCode::Esc => {
                *form = BookForm::new(today());
                self.set_status("Form cleared.", StatusKind::Info);
            }
            KeyCode::Tab | KeyCode::Down => form.next_field(),
            KeyCode::BackTab | KeyCode::Up => form.previous_field(),
            KeyCode::Backspace => form.backspace(),
            KeyCode::Enter => {
                if let Err(err) = self.save_new_book() {
                    let message = surface_error(&err);
                    if let Screen::AddBook(form) = &mut self.screen {
                        form.error = Some(message.clone());
                    }
                    self.set_status(message, StatusKind::Error);
                }
            }
            KeyCode::Char(ch) => {
                if form.push_char(ch) {
                    form.error = None;
                }
            }
            _ => {}
        }
        Ok(false)
    }

    fn handle_record_sale(&mut self, code: KeyCode) -> Result<bool> {
        let Screen::RecordSale(form) = &mut self.screen else {
            return Ok(false);
        };

        match code {
            KeyCode::Esc => {
                let titles = std::mem::take(&mut form.titles);
                *form = SaleForm::new(titles, today());
                self.set_status("Form cleared.", StatusKind::Info);
            }
            KeyCode::Tab | KeyCode::Down => form.next_field(),
            KeyCode::BackTab | KeyCode::Up => form.previous_field(),
            KeyCode::Left if form.active == SaleField::Title => form.cycle_title(-1),
            KeyCode::Right if form.active == SaleField::Title => form.cycle_title(1),
            KeyCode::Backspace => form.backspace(),
            KeyCode::Enter => {
                if let Err(err) = self.save_sale() {
                    let message = surface_error(&err);
                    if let Screen::RecordSale(form) = &mut self.screen {
                        form.error = Some(message.clone());
                    }
                    self.set_status(message, StatusKind::Error);
                }
            }
            KeyCode::Char(ch) => {
                if form.push_char(ch) {
                    form.error = None;
                }
            }
            _ => {}
        }
        Ok(false)
    }

    fn handle_sales(&mut self, code: KeyCode) -> bool {
        let Screen::Sales(sales) = &mut self.screen else {
            return false;
        };

        match code {
            KeyCode::Char('q') | KeyCode::Esc => return true,
            KeyCode::Up => sales.scroll_by(-1),
            KeyCode::Down => sales.scroll_by(1),
            KeyCode::PageUp => sales.scroll_by(-PAGE_STEP),
            KeyCode::PageDown => sales.scroll_by(PAGE_STEP),
            KeyCode::Home => sales.scroll_home(),
            KeyCode::End => sales.scroll_end(),
            KeyCode::Char('r') | KeyCode::Char('R') => {
                if let Err(err) = self.open_sales() {
                    self.report_failure(&err);
                }
            }
            _ => {}
        }
        false
    }

    /// Export the rows currently on the sales page.
    pub(crate) fn handle_ctrl_x(&mut self) -> Result<()> {
        let Screen::Sales(sales) = &self.screen else {
            self.set_status("Open Sales & Charts (F3) to export.", StatusKind::Error);
            return Ok(());
        };

        let path = self.config.export_path.clone();
        let rows = sales.row_count();
        match write_xlsx(&sales.table, &path).context("export failed") {
            Ok(()) => {
                self.set_status(
                    format!("Exported {rows} rows to {}. Ctrl+O opens it.", path.display()),
                    StatusKind::Info,
                );
                self.last_export = Some(path);
            }
            Err(err) => self.report_failure(&err),
        }
        Ok(())
    }

    /// Open the last export with the system's spreadsheet application.
    pub(crate) fn handle_ctrl_o(&mut self) -> Result<()> {
        let Some(path) = self.last_export.clone() else {
            self.set_status("Nothing exported yet (Ctrl+X).", StatusKind::Error);
            return Ok(());
        };
        match open_path(&path) {
            Ok(()) => self.set_status(format!("Opened {}.", path.display()), StatusKind::Info),
            Err(err) => self.set_status(format!("Failed to open export: {err}"), StatusKind::Error),
        }
        Ok(())
    }

    pub(crate) fn draw(&self, frame: &mut Frame) {
        let area = frame.area();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(MENU_HEIGHT),
                Constraint::Min(0),
                Constraint::Length(FOOTER_HEIGHT),
            ])
            .split(area);

        self.draw_menu(frame, chunks[0]);
        match &self.screen {
            Screen::AddBook(form) => self.draw_book_form(frame, chunks[1], form),
            Screen::RecordSale(form) => self.draw_sale_form(frame, chunks[1], form),
            Screen::Sales(sales) => self.draw_sales(frame, chunks[1], sales),
        }
        self.draw_footer(frame, chunks[2]);
    }

    fn draw_menu(&self, frame: &mut Frame, area: Rect) {
        let titles: Vec<String> = MENU_TITLES
            .iter()
            .enumerate()
            .map(|(idx, title)| format!("F{} {title}", idx + 1))
            .collect();
        let tabs = Tabs::new(titles)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title("Book Sales Dashboard"),
            )
            .select(self.screen.menu_index())
            .highlight_style(
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            );
        frame.render_widget(tabs, area);
    }

    fn draw_book_form(&self, frame: &mut Frame, area: Rect, form: &BookForm) {
        let popup_area = centered_rect(70, 60, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default().title("Add Book").borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        let mut lines: Vec<Line> = BookField::ORDER
            .iter()
            .map(|field| form.build_line(*field))
            .collect();
        lines.push(Line::from(""));
        lines.push(form_hint(form.error.as_deref()));

        let paragraph = Paragraph::new(lines).wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);

        frame.set_cursor_position((
            inner.x + form.cursor_offset() as u16,
            inner.y + form.active_row() as u16,
        ));
    }

    fn draw_sale_form(&self, frame: &mut Frame, area: Rect, form: &SaleForm) {
        let popup_area = centered_rect(70, 60, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default().title("Record Sale").borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        let mut lines: Vec<Line> = SaleField::ORDER
            .iter()
            .map(|field| form.build_line(*field))
            .collect();
        lines.push(Line::from(""));
        lines.push(form_hint(form.error.as_deref()));

        let paragraph = Paragraph::new(lines).wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);

        if let Some(offset) = form.cursor_offset() {
            frame.set_cursor_position((
                inner.x + offset as u16,
                inner.y + form.active_row() as u16,
            ));
        }
    }

    fn draw_sales(&self, frame: &mut Frame, area: Rect, sales: &SalesScreen) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
            .split(area);

        self.draw_sales_table(frame, chunks[0], sales);

        match &sales.view {
            Ok(view) => {
                let charts = Layout::default()
                    .direction(Direction::Horizontal)
                    .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
                    .split(chunks[1]);
                let series = line_series(view);
                render_line_chart(frame, charts[0], &series);
                render_bar_chart(frame, charts[1], view);
            }
            Err(insufficient) => {
                let message = Paragraph::new(insufficient.to_string())
                    .alignment(Alignment::Center)
                    .block(Block::default().borders(Borders::ALL).title("Charts"));
                frame.render_widget(message, chunks[1]);
            }
        }
    }

    fn draw_sales_table(&self, frame: &mut Frame, area: Rect, sales: &SalesScreen) {
        let title = format!(
            "Sales ({} rows, {} not charted)",
            sales.row_count(),
            sales.skipped()
        );
        let block = Block::default().borders(Borders::ALL).title(title);

        if sales.table.is_empty() {
            let message = Paragraph::new("No books yet. Press F1 to add one.")
                .alignment(Alignment::Center)
                .block(block);
            frame.render_widget(message, area);
            return;
        }

        // Two rows go to the border, one to the header.
        let visible = area.height.saturating_sub(3) as usize;
        let header = Row::new(sales.table.columns().to_vec())
            .style(Style::default().add_modifier(Modifier::BOLD));
        let rows = sales
            .table
            .rows()
            .iter()
            .skip(sales.scroll)
            .take(visible)
            .map(|row| Row::new(row.iter().map(|cell| cell.to_string())));
        let widths = column_widths(&sales.table, sales.scroll, visible);

        let table = Table::new(rows, widths)
            .header(header)
            .column_spacing(2)
            .block(block);
        frame.render_widget(table, area);
    }

    fn draw_footer(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default().borders(Borders::TOP);
        frame.render_widget(block.clone(), area);
        let inner = block.inner(area);

        let status_line = if let Some(status) = &self.status {
            Line::from(vec![Span::styled(status.text.clone(), status.kind.style())])
        } else {
            Line::from("")
        };

        let paragraph =
            Paragraph::new(vec![status_line, self.footer_instructions()]).wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);
    }

    fn footer_instructions(&self) -> Line<'static> {
        let key_style = Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD);
        match &self.screen {
            Screen::AddBook(_) => Line::from(vec![
                Span::styled("[Tab/↑↓]", key_style),
                Span::raw(" Field   "),
                Span::styled("[Enter]", key_style),
                Span::raw(" Save   "),
                Span::styled("[Esc]", key_style),
                Span::raw(" Clear   "),
                Span::styled("[F1-F3]", key_style),
                Span::raw(" Pages   "),
                Span::styled("[Ctrl+Q]", key_style),
                Span::raw(" Quit"),
            ]),
            Screen::RecordSale(_) => Line::from(vec![
                Span::styled("[←→]", key_style),
                Span::raw(" Book   "),
                Span::styled("[Tab/↑↓]", key_style),
                Span::raw(" Field   "),
                Span::styled("[Enter]", key_style),
                Span::raw(" Record   "),
                Span::styled("[Esc]", key_style),
                Span::raw(" Clear   "),
                Span::styled("[F1-F3]", key_style),
                Span::raw(" Pages   "),
                Span::styled("[Ctrl+Q]", key_style),
                Span::raw(" Quit"),
            ]),
            Screen::Sales(_) => Line::from(vec![
                Span::styled("[↑↓/PgUp/PgDn]", key_style),
                Span::raw(" Scroll   "),
                Span::styled("[R]", key_style),
                Span::raw(" Reload   "),
                Span::styled("[Ctrl+X]", key_style),
                Span::raw(" Export   "),
                Span::styled("[Ctrl+O]", key_style),
                Span::raw(" Open export   "),
                Span::styled("[F1-F3]", key_style),
                Span::raw(" Pages   "),
                Span::styled("[Q]", key_style),
                Span::raw(" Quit"),
            ]),
        }
    }

    fn set_status<S: Into<String>>(&mut self, text: S, kind: StatusKind) {
        self.status = Some(StatusMessage {
            text: text.into(),
            kind,
        });
    }

    fn clear_status(&mut self) {
        self.status = None;
    }

    /// Log a failed action and show its root cause in the footer.
    fn report_failure(&mut self, err: &anyhow::Error) {
        error!(error = %format!("{err:#}"), "action failed");
        self.set_status(surface_error(err), StatusKind::Error);
    }

    fn save_new_book(&mut self) -> Result<()> {
        let Screen::AddBook(form) = &mut self.screen else {
            return Ok(());
        };
        let book = form.parse_inputs()?;
        self.db.add_book(&book).context("failed to add book")?;
        form.reset_keeping_date();
        self.set_status(format!("Book \"{}\" added.", book.title), StatusKind::Info);
        Ok(())
    }

    fn save_sale(&mut self) -> Result<()> {
        let Screen::RecordSale(form) = &mut self.screen else {
            return Ok(());
        };
        let sale = form.parse_inputs()?;
        let outcome = self.db.record_sale(&sale).context("failed to record sale")?;

        match outcome {
            SaleOutcome::Recorded { rows } => {
                let titles = std::mem::take(&mut form.titles);
                let selected = form.selected_title;
                *form = SaleForm::new(titles, today());
                form.selected_title = selected;
                let message = if rows == 1 {
                    format!(
                        "Sale of \"{}\" recorded at \"{}\".",
                        sale.title, sale.sale_location
                    )
                } else {
                    format!(
                        "Sale recorded on {rows} books titled \"{}\".",
                        sale.title
                    )
                };
                self.set_status(message, StatusKind::Info);
            }
            SaleOutcome::NotFound => {
                form.error = Some("No matching book; nothing recorded.".to_string());
                self.set_status(
                    format!("No book titled \"{}\" was found.", sale.title),
                    StatusKind::Error,
                );
            }
        }
        Ok(())
    }

    fn open_add_book(&mut self) {
        self.clear_status();
        self.screen = Screen::AddBook(BookForm::new(today()));
    }

    fn open_record_sale(&mut self) -> Result<()> {
        self.clear_status();
        let titles = self.db.list_titles().context("failed to load titles")?;
        if titles.is_empty() {
            self.set_status("No books registered yet. Press F1 to add one.", StatusKind::Error);
        }
        self.screen = Screen::RecordSale(SaleForm::new(titles, today()));
        Ok(())
    }

    fn open_sales(&mut self) -> Result<()> {
        self.clear_status();
        let sales = SalesScreen::load(&self.db, self.config.page_size)?;
        self.screen = Screen::Sales(sales);
        Ok(())
    }
}

/// Error text when the form has one, otherwise the key reminder.
fn form_hint(error: Option<&str>) -> Line<'static> {
    match error {
        Some(error) => Line::from(Span::styled(
            error.to_string(),
            Style::default().fg(Color::Red),
        )),
        None => Line::from(Span::styled(
            "Enter to save • Tab to switch fields • Esc to clear",
            Style::default().fg(Color::Gray),
        )),
    }
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

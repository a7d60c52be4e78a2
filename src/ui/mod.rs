//! Ratatui front-end: a three-page dashboard (add a book, record a sale,
//! browse sales with charts) driven by crossterm key events.

mod app;
mod charts;
mod forms;
mod helpers;
mod screens;
mod terminal;

pub use app::App;
pub use terminal::run_app;

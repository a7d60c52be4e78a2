//! Core library surface for the Book Sales Dashboard TUI application.
//!
//! The persistence layer (`db`), the chart builder (`view`), and the
//! spreadsheet export (`export`) are usable without the terminal front-end,
//! which is how the integration tests drive them.
pub mod config;
pub mod db;
pub mod error;
pub mod export;
pub mod logging;
pub mod models;
pub mod ui;
pub mod view;

pub use config::Config;
pub use db::Database;
pub use error::{ExportError, StoreError, ValidationError};
pub use export::{to_xlsx_bytes, write_xlsx, Cell, SalesTable};
pub use models::{Book, NewBook, SaleEntry, SaleOutcome};
pub use view::{build_sales_view, InsufficientData, SalesView};

/// The interactive application entry point and state container.
pub use ui::{run_app, App};

//! Domain models that mirror the `books` table and get passed between the
//! repository, the chart builder, and the TUI. They stay plain data holders;
//! validation lives next to the queries that enforce it.

use chrono::NaiveDate;

/// Storage format for every date column. Dates are kept as ISO text so the
/// lexical order used by SQLite matches chronological order.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// One row of the `books` table: a registered book and, once recorded, its
/// latest sale.
#[derive(Debug, Clone, PartialEq)]
pub struct Book {
    /// Primary key assigned by SQLite.
    pub id: i64,
    pub title: String,
    pub author: String,
    pub unit_price: f64,
    /// Raw ISO date text as stored. The column is nullable in the schema.
    pub registered_date: Option<String>,
    pub stock_count: Option<i64>,
    /// Raw sale date text. Kept unparsed because the chart builder decides
    /// what counts as a usable date.
    pub sale_date: Option<String>,
    pub quantity_sold: Option<i64>,
    pub amount_received: Option<f64>,
    pub sale_location: Option<String>,
}

impl Book {
    /// `true` once any sale column has been filled in.
    pub fn has_sale(&self) -> bool {
        self.sale_date.is_some()
            || self.quantity_sold.is_some()
            || self.amount_received.is_some()
            || self.sale_location.is_some()
    }
}

/// Input for registering a book.
#[derive(Debug, Clone, PartialEq)]
pub struct NewBook {
    pub title: String,
    pub author: String,
    pub unit_price: f64,
    pub registered_date: NaiveDate,
    pub stock_count: i64,
}

/// Input for recording a sale against every book with a given title.
#[derive(Debug, Clone, PartialEq)]
pub struct SaleEntry {
    pub title: String,
    pub sale_date: NaiveDate,
    pub quantity_sold: i64,
    pub amount_received: f64,
    pub sale_location: String,
}

/// Result of `record_sale`. A title with no matching rows is not an error but
/// callers have to branch on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaleOutcome {
    /// The sale fields were written to `rows` records sharing the title.
    Recorded { rows: usize },
    /// No record carries the requested title; nothing changed.
    NotFound,
}

impl SaleOutcome {
    pub fn is_recorded(&self) -> bool {
        matches!(self, SaleOutcome::Recorded { .. })
    }
}

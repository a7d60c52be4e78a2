//! Tabular form of the sales page and its spreadsheet export. The same
//! `SalesTable` feeds the on-screen table and the `.xlsx` download, so what
//! the user sees is what ends up in the file.

use std::fmt;
use std::fs;
use std::path::Path;

use rust_xlsxwriter::{Format, Workbook};
use tracing::info;

use crate::error::ExportError;
use crate::models::Book;

/// File name offered for the export.
pub const EXPORT_FILE_NAME: &str = "vendas_livros.xlsx";
/// Name of the single worksheet in the export.
pub const EXPORT_SHEET_NAME: &str = "Vendas";
/// MIME type of the exported workbook.
pub const EXPORT_MIME_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// Column headers for a table built from `books` rows, in schema order.
pub const BOOK_COLUMNS: [&str; 10] = [
    "id",
    "title",
    "author",
    "unit_price",
    "registered_date",
    "stock_count",
    "sale_date",
    "quantity_sold",
    "amount_received",
    "sale_location",
];

/// A single typed value. `Empty` stands in for SQL NULL.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Integer(i64),
    Number(f64),
    Text(String),
}

impl From<Option<i64>> for Cell {
    fn from(value: Option<i64>) -> Self {
        value.map_or(Cell::Empty, Cell::Integer)
    }
}

impl From<Option<f64>> for Cell {
    fn from(value: Option<f64>) -> Self {
        value.map_or(Cell::Empty, Cell::Number)
    }
}

impl From<Option<String>> for Cell {
    fn from(value: Option<String>) -> Self {
        value.map_or(Cell::Empty, Cell::Text)
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Empty => Ok(()),
            Cell::Integer(value) => write!(f, "{value}"),
            Cell::Number(value) => write!(f, "{value:.2}"),
            Cell::Text(value) => f.write_str(value),
        }
    }
}

/// Ordered column names plus rows of cells. Every row has exactly one cell
/// per column.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SalesTable {
    columns: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl SalesTable {
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    /// Build the table shown on the sales page: one row per book, every
    /// column of the schema.
    pub fn from_books(books: &[Book]) -> Self {
        let mut table = Self::new(BOOK_COLUMNS);
        for book in books {
            table.push_row(vec![
                Cell::Integer(book.id),
                Cell::Text(book.title.clone()),
                Cell::Text(book.author.clone()),
                Cell::Number(book.unit_price),
                book.registered_date.clone().into(),
                book.stock_count.into(),
                book.sale_date.clone().into(),
                book.quantity_sold.into(),
                book.amount_received.into(),
                book.sale_location.clone().into(),
            ]);
        }
        table
    }

    /// Append a row, padding with `Empty` or truncating so it matches the
    /// column count.
    pub fn push_row(&mut self, mut row: Vec<Cell>) {
        row.resize(self.columns.len(), Cell::Empty);
        self.rows.push(row);
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Encode `table` as a one-sheet workbook: bold header row, then the data
/// rows in order, no index column. NULL cells stay blank.
pub fn to_xlsx_bytes(table: &SalesTable) -> Result<Vec<u8>, ExportError> {
    let mut workbook = Workbook::new();
    let header = Format::new().set_bold();

    let sheet = workbook.add_worksheet();
    sheet.set_name(EXPORT_SHEET_NAME)?;

    for (col, name) in table.columns().iter().enumerate() {
        sheet.write_string_with_format(0, column_index(col)?, name, &header)?;
    }

    for (idx, row) in table.rows().iter().enumerate() {
        let row_num = row_index(idx + 1)?;
        for (col, cell) in row.iter().enumerate() {
            let col_num = column_index(col)?;
            match cell {
                Cell::Empty => {}
                Cell::Integer(value) => {
                    // XLSX stores every number as f64; integers past 2^53 lose precision.
                    sheet.write_number(row_num, col_num, *value as f64)?;
                }
                Cell::Number(value) => {
                    sheet.write_number(row_num, col_num, *value)?;
                }
                Cell::Text(value) => {
                    sheet.write_string(row_num, col_num, value)?;
                }
            }
        }
    }

    Ok(workbook.save_to_buffer()?)
}

/// Encode `table` and write it to `path`, replacing any previous export.
pub fn write_xlsx(table: &SalesTable, path: &Path) -> Result<(), ExportError> {
    let bytes = to_xlsx_bytes(table)?;
    fs::write(path, &bytes).map_err(|source| ExportError::Write {
        path: path.to_path_buf(),
        source,
    })?;
    info!(
        path = %path.display(),
        rows = table.rows().len(),
        bytes = bytes.len(),
        "exported sales table"
    );
    Ok(())
}

fn row_index(idx: usize) -> Result<u32, ExportError> {
    u32::try_from(idx).map_err(|_| ExportError::TooLarge)
}

fn column_index(idx: usize) -> Result<u16, ExportError> {
    u16::try_from(idx).map_err(|_| ExportError::TooLarge)
}

//! Typed failures for the persistence and export layers. The TUI converts
//! these into `anyhow::Error` and only keeps the last cause for the footer, so
//! each message here is written to stand on its own.

use std::path::PathBuf;

use thiserror::Error;

/// A constraint on a repository input was violated. Nothing is written when
/// one of these is returned.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("Book title is required.")]
    EmptyTitle,
    #[error("Author is required.")]
    EmptyAuthor,
    #[error("Price must be zero or more (got {0}).")]
    InvalidPrice(f64),
    #[error("Number of copies must be at least 1 (got {0}).")]
    InvalidStock(i64),
    #[error("Quantity sold must be at least 1 (got {0}).")]
    InvalidQuantity(i64),
    #[error("Amount received must be zero or more (got {0}).")]
    InvalidAmount(f64),
}

/// Failure surfaced by any repository or schema operation.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The SQLite engine refused the request: unreachable file, lock timeout,
    /// or a rejected write.
    #[error("{context}")]
    Storage {
        context: &'static str,
        #[source]
        source: rusqlite::Error,
    },

    #[error("failed to create data directory {}", path.display())]
    DataDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl StoreError {
    /// `true` when the caller passed bad input rather than hitting the store.
    pub fn is_validation(&self) -> bool {
        matches!(self, StoreError::Validation(_))
    }
}

/// Attach a short description to a rusqlite failure, mirroring the
/// `.context(...)` strings used everywhere else in the crate.
pub(crate) trait StorageContext<T> {
    fn storage(self, context: &'static str) -> Result<T, StoreError>;
}

impl<T> StorageContext<T> for Result<T, rusqlite::Error> {
    fn storage(self, context: &'static str) -> Result<T, StoreError> {
        self.map_err(|source| StoreError::Storage { context, source })
    }
}

/// Failure while building the spreadsheet export.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("failed to build spreadsheet")]
    Workbook(#[from] rust_xlsxwriter::XlsxError),

    #[error("table is too large for a single worksheet")]
    TooLarge,

    #[error("failed to write export to {}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

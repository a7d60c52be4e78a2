use std::env;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use directories::BaseDirs;

use crate::export::EXPORT_FILE_NAME;

/// Folder name used beneath the user's home directory for application data.
const DATA_DIR_NAME: &str = ".book-sales-dashboard";
/// SQLite file name stored inside the application data directory.
const DB_FILE_NAME: &str = "books.sqlite";
/// Log file written next to the database; stdout belongs to the TUI.
const LOG_FILE_NAME: &str = "book-sales.log";
/// Rows loaded into the sales page when nothing else is configured.
pub const DEFAULT_PAGE_SIZE: usize = 100;

/// Overrides the data directory (useful for demos and throwaway databases).
pub const DATA_DIR_ENV: &str = "BOOK_SALES_DATA_DIR";
/// Overrides how many records the sales page loads.
pub const PAGE_SIZE_ENV: &str = "BOOK_SALES_PAGE_SIZE";

/// Resolved locations and limits for one run of the dashboard.
#[derive(Debug, Clone)]
pub struct Config {
    pub data_dir: PathBuf,
    pub db_path: PathBuf,
    pub log_path: PathBuf,
    pub export_path: PathBuf,
    pub page_size: usize,
}

impl Config {
    /// Build the configuration from the home directory plus any environment
    /// overrides.
    pub fn from_env() -> Result<Self> {
        let data_dir = match env::var_os(DATA_DIR_ENV) {
            Some(dir) if !dir.is_empty() => PathBuf::from(dir),
            _ => default_data_dir()?,
        };

        let page_size = match env::var(PAGE_SIZE_ENV) {
            Ok(raw) => parse_page_size(&raw)
                .with_context(|| format!("invalid {PAGE_SIZE_ENV} value '{raw}'"))?,
            Err(_) => DEFAULT_PAGE_SIZE,
        };

        Ok(Self::with_data_dir(data_dir, page_size))
    }

    /// Derive every file path from a single data directory.
    pub fn with_data_dir(data_dir: impl AsRef<Path>, page_size: usize) -> Self {
        let data_dir = data_dir.as_ref().to_path_buf();
        Self {
            db_path: data_dir.join(DB_FILE_NAME),
            log_path: data_dir.join(LOG_FILE_NAME),
            export_path: data_dir.join(EXPORT_FILE_NAME),
            data_dir,
            page_size,
        }
    }
}

/// Resolve `~/.book-sales-dashboard`.
fn default_data_dir() -> Result<PathBuf> {
    let base_dirs = BaseDirs::new().ok_or_else(|| anyhow!("could not locate home directory"))?;
    Ok(base_dirs.home_dir().join(DATA_DIR_NAME))
}

fn parse_page_size(raw: &str) -> Result<usize> {
    let size = raw
        .trim()
        .parse::<usize>()
        .context("page size must be a whole number")?;
    if size == 0 {
        return Err(anyhow!("page size must be at least 1"));
    }
    Ok(size)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_hang_off_the_data_dir() {
        let config = Config::with_data_dir("/tmp/sales", 25);
        assert_eq!(config.db_path, PathBuf::from("/tmp/sales/books.sqlite"));
        assert_eq!(config.log_path, PathBuf::from("/tmp/sales/book-sales.log"));
        assert_eq!(
            config.export_path,
            PathBuf::from("/tmp/sales/vendas_livros.xlsx")
        );
        assert_eq!(config.page_size, 25);
    }

    #[test]
    fn page_size_must_be_positive_integer() {
        assert_eq!(parse_page_size(" 40 ").unwrap(), 40);
        assert!(parse_page_size("0").is_err());
        assert!(parse_page_size("-3").is_err());
        assert!(parse_page_size("lots").is_err());
    }
}

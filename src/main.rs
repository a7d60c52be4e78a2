//! Binary entry point: resolve the configuration, start file logging, make
//! sure the SQLite schema exists, then drive the Ratatui event loop until the
//! user exits.
use anyhow::Context;
use book_sales_dashboard::{logging, run_app, App, Config, Database};
use tracing::info;

/// Returning a `Result` bubbles up fatal initialization problems (for example
/// an unwritable data directory) to the terminal instead of crashing silently.
fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;
    logging::init(&config.log_path)?;
    info!(data_dir = %config.data_dir.display(), "starting book sales dashboard");

    let db = Database::new(&config.db_path);
    db.ensure_schema().context("failed to prepare database")?;

    let mut app = App::new(db, config);
    let result = run_app(&mut app);
    info!("dashboard closed");
    result
}

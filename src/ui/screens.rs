use anyhow::{Context, Result};

use crate::db::Database;
use crate::export::SalesTable;
use crate::view::{build_sales_view, InsufficientData, SalesView};

/// State behind the "Sales & Charts" page: one page of records shown as a
/// table plus the chart view built from the same rows.
pub(crate) struct SalesScreen {
    pub(crate) table: SalesTable,
    pub(crate) view: Result<SalesView, InsufficientData>,
    pub(crate) scroll: usize,
}

impl SalesScreen {
    /// Load the most recent `page_size` records and derive both projections.
    pub(crate) fn load(db: &Database, page_size: usize) -> Result<Self> {
        let books = db
            .list_recent(page_size)
            .context("failed to load sales page")?;
        Ok(Self {
            table: SalesTable::from_books(&books),
            view: build_sales_view(&books),
            scroll: 0,
        })
    }

    pub(crate) fn row_count(&self) -> usize {
        self.table.rows().len()
    }

    /// Number of rows left out of the charts.
    pub(crate) fn skipped(&self) -> usize {
        match &self.view {
            Ok(view) => view.excluded().len(),
            Err(insufficient) => insufficient.excluded,
        }
    }

    pub(crate) fn scroll_by(&mut self, offset: isize) {
        let max = self.row_count().saturating_sub(1) as isize;
        self.scroll = (self.scroll as isize + offset).clamp(0, max.max(0)) as usize;
    }

    pub(crate) fn scroll_home(&mut self) {
        self.scroll = 0;
    }

    pub(crate) fn scroll_end(&mut self) {
        self.scroll = self.row_count().saturating_sub(1);
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::models::{NewBook, SaleEntry};

    fn seeded() -> (tempfile::TempDir, Database) {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::new(dir.path().join("books.sqlite"));
        db.ensure_schema().unwrap();
        for title in ["A", "B", "C"] {
            db.add_book(&NewBook {
                title: title.to_string(),
                author: "Writer".to_string(),
                unit_price: 12.0,
                registered_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                stock_count: 2,
            })
            .unwrap();
        }
        (dir, db)
    }

    #[test]
    fn unsold_catalogue_has_table_but_no_charts() {
        let (_dir, db) = seeded();
        let screen = SalesScreen::load(&db, 10).unwrap();
        assert_eq!(screen.row_count(), 3);
        assert!(screen.view.is_err());
        assert_eq!(screen.skipped(), 3);
    }

    #[test]
    fn sold_books_reach_the_charts() {
        let (_dir, db) = seeded();
        db.record_sale(&SaleEntry {
            title: "B".to_string(),
            sale_date: NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
            quantity_sold: 1,
            amount_received: 12.0,
            sale_location: "Fair".to_string(),
        })
        .unwrap();

        let screen = SalesScreen::load(&db, 2).unwrap();
        assert_eq!(screen.row_count(), 2);
        let view = screen.view.as_ref().unwrap();
        assert_eq!(view.points()[0].title, "B");
        assert_eq!(screen.skipped(), 1);
    }

    #[test]
    fn scrolling_stays_inside_the_table() {
        let (_dir, db) = seeded();
        let mut screen = SalesScreen::load(&db, 10).unwrap();
        screen.scroll_by(-4);
        assert_eq!(screen.scroll, 0);
        screen.scroll_by(10);
        assert_eq!(screen.scroll, 2);
        screen.scroll_home();
        assert_eq!(screen.scroll, 0);
        screen.scroll_end();
        assert_eq!(screen.scroll, 2);
    }
}

use rusqlite::{params, Row};
use tracing::debug;

use crate::error::{StorageContext, StoreError, ValidationError};
use crate::models::{Book, NewBook, SaleEntry, SaleOutcome, DATE_FORMAT};

use super::connection::Database;

/// Column list shared by every query that hydrates a `Book`; `book_from_row`
/// reads by the same positions.
const BOOK_COLUMNS: &str = "id, title, author, unit_price, registered_date, stock_count,
     sale_date, quantity_sold, amount_received, sale_location";

impl Database {
    /// Register a new book with every sale column left NULL and return its id.
    ///
    /// Title and author are stored exactly as given so `record_sale` matches
    /// the same text; blank-only values are rejected.
    pub fn add_book(&self, book: &NewBook) -> Result<i64, StoreError> {
        let title = book.title.as_str();
        let author = book.author.as_str();
        if title.trim().is_empty() {
            return Err(ValidationError::EmptyTitle.into());
        }
        if author.trim().is_empty() {
            return Err(ValidationError::EmptyAuthor.into());
        }
        if !book.unit_price.is_finite() || book.unit_price < 0.0 {
            return Err(ValidationError::InvalidPrice(book.unit_price).into());
        }
        if book.stock_count < 1 {
            return Err(ValidationError::InvalidStock(book.stock_count).into());
        }

        let conn = self.connect()?;
        conn.execute(
            "INSERT INTO books (title, author, unit_price, registered_date, stock_count)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                title,
                author,
                book.unit_price,
                book.registered_date.format(DATE_FORMAT).to_string(),
                book.stock_count,
            ],
        )
        .storage("failed to insert book")?;

        let id = conn.last_insert_rowid();
        debug!(id, title, "book added");
        Ok(id)
    }

    /// Write the sale columns of every book whose title equals `sale.title`.
    ///
    /// Titles are not unique, so duplicates are all updated together. The
    /// four columns are set by a single statement inside a transaction, so a
    /// half-recorded sale is never visible.
    pub fn record_sale(&self, sale: &SaleEntry) -> Result<SaleOutcome, StoreError> {
        if sale.quantity_sold < 1 {
            return Err(ValidationError::InvalidQuantity(sale.quantity_sold).into());
        }
        if !sale.amount_received.is_finite() || sale.amount_received < 0.0 {
            return Err(ValidationError::InvalidAmount(sale.amount_received).into());
        }

        let mut conn = self.connect()?;
        let tx = conn
            .transaction()
            .storage("failed to start sale transaction")?;
        let updated = tx
            .execute(
                "UPDATE books
                 SET sale_date = ?1, quantity_sold = ?2, amount_received = ?3, sale_location = ?4
                 WHERE title = ?5",
                params![
                    sale.sale_date.format(DATE_FORMAT).to_string(),
                    sale.quantity_sold,
                    sale.amount_received,
                    sale.sale_location,
                    sale.title,
                ],
            )
            .storage("failed to record sale")?;
        tx.commit().storage("failed to commit sale")?;

        if updated == 0 {
            debug!(title = %sale.title, "sale matched no books");
            Ok(SaleOutcome::NotFound)
        } else {
            debug!(title = %sale.title, rows = updated, "sale recorded");
            Ok(SaleOutcome::Recorded { rows: updated })
        }
    }

    /// Every title in insertion order, duplicates included. Feeds the title
    /// picker on the sale form.
    pub fn list_titles(&self) -> Result<Vec<String>, StoreError> {
        let conn = self.connect()?;
        let mut stmt = conn
            .prepare("SELECT title FROM books ORDER BY id")
            .storage("failed to prepare title query")?;

        let titles = stmt
            .query_map([], |row| row.get(0))
            .storage("failed to load titles")?
            .collect::<Result<Vec<String>, _>>()
            .storage("failed to collect titles")?;

        Ok(titles)
    }

    /// Up to `limit` books, most recent sale first. Books without a sale date
    /// come after every dated one, and equal dates fall back to id order so
    /// the page is stable across calls.
    pub fn list_recent(&self, limit: usize) -> Result<Vec<Book>, StoreError> {
        if limit == 0 {
            return Ok(Vec::new());
        }
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);

        let conn = self.connect()?;
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {BOOK_COLUMNS}
                 FROM books
                 ORDER BY sale_date IS NULL, sale_date DESC, id
                 LIMIT ?1"
            ))
            .storage("failed to prepare recent sales query")?;

        let books = stmt
            .query_map([limit], book_from_row)
            .storage("failed to load recent sales")?
            .collect::<Result<Vec<_>, _>>()
            .storage("failed to collect recent sales")?;

        debug!(limit, rows = books.len(), "loaded recent sales page");
        Ok(books)
    }

    /// The whole table in id order.
    pub fn list_books(&self) -> Result<Vec<Book>, StoreError> {
        let conn = self.connect()?;
        let mut stmt = conn
            .prepare(&format!("SELECT {BOOK_COLUMNS} FROM books ORDER BY id"))
            .storage("failed to prepare book query")?;

        let books = stmt
            .query_map([], book_from_row)
            .storage("failed to load books")?
            .collect::<Result<Vec<_>, _>>()
            .storage("failed to collect books")?;

        Ok(books)
    }
}

fn book_from_row(row: &Row<'_>) -> rusqlite::Result<Book> {
    Ok(Book {
        id: row.get(0)?,
        title: row.get(1)?,
        author: row.get(2)?,
        unit_price: row.get(3)?,
        registered_date: row.get(4)?,
        stock_count: row.get(5)?,
        sale_date: row.get(6)?,
        quantity_sold: row.get(7)?,
        amount_received: row.get(8)?,
        sale_location: row.get(9)?,
    })
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use tempfile::TempDir;

    use super::*;

    fn setup() -> (TempDir, Database) {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::new(dir.path().join("books.sqlite"));
        db.ensure_schema().unwrap();
        (dir, db)
    }

    fn date(raw: &str) -> NaiveDate {
        NaiveDate::parse_from_str(raw, DATE_FORMAT).unwrap()
    }

    fn new_book(title: &str) -> NewBook {
        NewBook {
            title: title.to_string(),
            author: "Someone".to_string(),
            unit_price: 10.0,
            registered_date: date("2024-01-01"),
            stock_count: 3,
        }
    }

    fn sale(title: &str, day: &str, quantity: i64) -> SaleEntry {
        SaleEntry {
            title: title.to_string(),
            sale_date: date(day),
            quantity_sold: quantity,
            amount_received: quantity as f64 * 10.0,
            sale_location: "Fair".to_string(),
        }
    }

    #[test]
    fn add_book_creates_one_unsold_record() {
        let (_dir, db) = setup();
        db.add_book(&new_book("Existing")).unwrap();

        let id = db
            .add_book(&NewBook {
                title: "Dune".to_string(),
                author: "Herbert".to_string(),
                unit_price: 49.90,
                registered_date: date("2024-01-10"),
                stock_count: 5,
            })
            .unwrap();

        assert!(db.list_titles().unwrap().contains(&"Dune".to_string()));

        let books = db.list_books().unwrap();
        assert_eq!(books.len(), 2);
        let dune: Vec<&Book> = books.iter().filter(|b| b.title == "Dune").collect();
        assert_eq!(dune.len(), 1);
        let dune = dune[0];
        assert_eq!(dune.id, id);
        assert_eq!(dune.author, "Herbert");
        assert_eq!(dune.unit_price, 49.90);
        assert_eq!(dune.registered_date.as_deref(), Some("2024-01-10"));
        assert_eq!(dune.stock_count, Some(5));
        assert!(!dune.has_sale());
    }

    #[test]
    fn padded_title_is_stored_as_given_and_sells() {
        let (_dir, db) = setup();
        let mut book = new_book(" Dune ");
        book.author = " Writer ".to_string();
        db.add_book(&book).unwrap();

        let books = db.list_books().unwrap();
        assert_eq!(books[0].title, " Dune ");
        assert_eq!(books[0].author, " Writer ");

        let outcome = db.record_sale(&sale(" Dune ", "2024-02-01", 1)).unwrap();
        assert_eq!(outcome, SaleOutcome::Recorded { rows: 1 });
        assert_eq!(db.list_books().unwrap()[0].quantity_sold, Some(1));
    }

    #[test]
    fn add_book_rejects_invalid_input_without_writing() {
        let (_dir, db) = setup();

        let mut blank = new_book("   ");
        assert!(matches!(
            db.add_book(&blank),
            Err(StoreError::Validation(ValidationError::EmptyTitle))
        ));

        blank.title = "Titled".to_string();
        blank.author = String::new();
        assert!(matches!(
            db.add_book(&blank),
            Err(StoreError::Validation(ValidationError::EmptyAuthor))
        ));

        let mut cheap = new_book("Cheap");
        cheap.unit_price = -0.01;
        assert!(matches!(
            db.add_book(&cheap),
            Err(StoreError::Validation(ValidationError::InvalidPrice(_)))
        ));
        cheap.unit_price = f64::NAN;
        assert!(db.add_book(&cheap).unwrap_err().is_validation());

        let mut no_copies = new_book("Empty shelf");
        no_copies.stock_count = 0;
        assert!(matches!(
            db.add_book(&no_copies),
            Err(StoreError::Validation(ValidationError::InvalidStock(0)))
        ));

        assert!(db.list_books().unwrap().is_empty());
    }

    #[test]
    fn free_books_are_accepted() {
        let (_dir, db) = setup();
        let mut free = new_book("Pamphlet");
        free.unit_price = 0.0;
        free.stock_count = 1;
        db.add_book(&free).unwrap();
        assert_eq!(db.list_titles().unwrap(), ["Pamphlet"]);
    }

    #[test]
    fn record_sale_sets_every_sale_field() {
        let (_dir, db) = setup();
        db.add_book(&new_book("Solo")).unwrap();
        db.add_book(&new_book("Other")).unwrap();

        let outcome = db
            .record_sale(&SaleEntry {
                title: "Solo".to_string(),
                sale_date: date("2024-03-05"),
                quantity_sold: 4,
                amount_received: 38.5,
                sale_location: "Online".to_string(),
            })
            .unwrap();
        assert_eq!(outcome, SaleOutcome::Recorded { rows: 1 });

        let books = db.list_books().unwrap();
        let solo = &books[0];
        assert_eq!(solo.sale_date.as_deref(), Some("2024-03-05"));
        assert_eq!(solo.quantity_sold, Some(4));
        assert_eq!(solo.amount_received, Some(38.5));
        assert_eq!(solo.sale_location.as_deref(), Some("Online"));
        assert!(!books[1].has_sale());
    }

    #[test]
    fn record_sale_on_unknown_title_changes_nothing() {
        let (_dir, db) = setup();
        db.add_book(&new_book("Known")).unwrap();
        db.record_sale(&sale("Known", "2024-02-02", 1)).unwrap();
        let before = db.list_books().unwrap();

        let outcome = db.record_sale(&sale("Unknown", "2024-05-05", 9)).unwrap();

        assert_eq!(outcome, SaleOutcome::NotFound);
        assert!(!outcome.is_recorded());
        assert_eq!(db.list_books().unwrap(), before);
    }

    #[test]
    fn record_sale_rejects_invalid_input_without_writing() {
        let (_dir, db) = setup();
        db.add_book(&new_book("Guarded")).unwrap();

        assert!(matches!(
            db.record_sale(&sale("Guarded", "2024-02-02", 0)),
            Err(StoreError::Validation(ValidationError::InvalidQuantity(0)))
        ));

        let mut refund = sale("Guarded", "2024-02-02", 1);
        refund.amount_received = -5.0;
        assert!(matches!(
            db.record_sale(&refund),
            Err(StoreError::Validation(ValidationError::InvalidAmount(_)))
        ));

        assert!(!db.list_books().unwrap()[0].has_sale());
    }

    #[test]
    fn record_sale_updates_every_duplicate_title() {
        let (_dir, db) = setup();
        db.add_book(&new_book("Twin")).unwrap();
        db.add_book(&new_book("Twin")).unwrap();
        db.add_book(&new_book("Single")).unwrap();

        let outcome = db.record_sale(&sale("Twin", "2024-04-01", 2)).unwrap();
        assert_eq!(outcome, SaleOutcome::Recorded { rows: 2 });

        let sold: Vec<bool> = db.list_books().unwrap().iter().map(Book::has_sale).collect();
        assert_eq!(sold, [true, true, false]);
    }

    #[test]
    fn list_titles_keeps_duplicates_in_insert_order() {
        let (_dir, db) = setup();
        for title in ["B", "A", "B"] {
            db.add_book(&new_book(title)).unwrap();
        }
        assert_eq!(db.list_titles().unwrap(), ["B", "A", "B"]);
    }

    #[test]
    fn list_recent_orders_by_date_with_unsold_last() {
        let (_dir, db) = setup();
        for title in ["unsold-1", "old", "new", "unsold-2", "also-new"] {
            db.add_book(&new_book(title)).unwrap();
        }
        db.record_sale(&sale("old", "2024-01-15", 1)).unwrap();
        db.record_sale(&sale("new", "2024-03-01", 1)).unwrap();
        db.record_sale(&sale("also-new", "2024-03-01", 2)).unwrap();

        let titles: Vec<String> = db
            .list_recent(10)
            .unwrap()
            .into_iter()
            .map(|b| b.title)
            .collect();
        assert_eq!(titles, ["new", "also-new", "old", "unsold-1", "unsold-2"]);

        // Repeated reads return the same page.
        let again: Vec<String> = db
            .list_recent(10)
            .unwrap()
            .into_iter()
            .map(|b| b.title)
            .collect();
        assert_eq!(titles, again);
    }

    #[test]
    fn list_recent_respects_limit() {
        let (_dir, db) = setup();
        for idx in 0..5 {
            db.add_book(&new_book(&format!("Book {idx}"))).unwrap();
        }
        assert_eq!(db.list_recent(3).unwrap().len(), 3);
        assert!(db.list_recent(0).unwrap().is_empty());
        assert_eq!(db.list_recent(usize::MAX).unwrap().len(), 5);
    }

    #[test]
    fn missing_schema_surfaces_storage_error() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::new(dir.path().join("books.sqlite"));

        let err = db.list_titles().unwrap_err();
        assert!(matches!(err, StoreError::Storage { .. }));
        assert!(!err.is_validation());
    }
}

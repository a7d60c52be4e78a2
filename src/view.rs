//! Shapes repository rows into the two chart projections shown on the sales
//! page: amount and quantity over time as lines, and quantity per sale date
//! as horizontal bars.

use chrono::{NaiveDate, NaiveDateTime};
use thiserror::Error;
use tracing::{debug, warn};

use crate::models::{Book, DATE_FORMAT};

/// Date shapes accepted for `sale_date`, tried in order.
const DATE_FORMATS: &[&str] = &[DATE_FORMAT, "%Y/%m/%d"];
const DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

/// One sale that made it into the charts.
#[derive(Debug, Clone, PartialEq)]
pub struct SalePoint {
    pub book_id: i64,
    pub title: String,
    pub sale_date: NaiveDate,
    pub quantity_sold: i64,
    pub amount_received: f64,
}

/// Why a row was left out of the charts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExclusionReason {
    /// No sale recorded yet.
    NoSaleDate,
    /// The stored text could not be read as a date.
    MalformedDate(String),
    /// A date is present but quantity or amount is missing.
    IncompleteSale,
}

/// A row skipped while building the view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Exclusion {
    pub book_id: i64,
    pub reason: ExclusionReason,
}

/// Returned instead of a view when no row has a usable sale.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Not enough sales data to draw charts ({excluded} records skipped).")]
pub struct InsufficientData {
    pub excluded: usize,
}

/// Chart-ready sales, sorted ascending by date.
#[derive(Debug, Clone, PartialEq)]
pub struct SalesView {
    points: Vec<SalePoint>,
    excluded: Vec<Exclusion>,
}

impl SalesView {
    pub fn points(&self) -> &[SalePoint] {
        &self.points
    }

    pub fn excluded(&self) -> &[Exclusion] {
        &self.excluded
    }

    /// Series A, first line: amount received per sale date.
    pub fn amount_series(&self) -> Vec<(NaiveDate, f64)> {
        self.points
            .iter()
            .map(|p| (p.sale_date, p.amount_received))
            .collect()
    }

    /// Series A, second line: quantity sold per sale date.
    pub fn quantity_series(&self) -> Vec<(NaiveDate, i64)> {
        self.points
            .iter()
            .map(|p| (p.sale_date, p.quantity_sold))
            .collect()
    }

    /// Series B: quantity paired with its date, for horizontal bars.
    pub fn quantity_bars(&self) -> Vec<(i64, NaiveDate)> {
        self.points
            .iter()
            .map(|p| (p.quantity_sold, p.sale_date))
            .collect()
    }

    /// First and last sale dates; both exist because a view is never empty.
    pub fn date_range(&self) -> (NaiveDate, NaiveDate) {
        let first = self.points[0].sale_date;
        let last = self.points[self.points.len() - 1].sale_date;
        (first, last)
    }
}

/// Filter, sort, and project `books` for the charts.
///
/// Rows whose sale date is missing or unreadable are dropped and recorded on
/// the view; they never fail the build. The sort is stable so sales on the
/// same day keep their input order.
pub fn build_sales_view(books: &[Book]) -> Result<SalesView, InsufficientData> {
    let mut points = Vec::with_capacity(books.len());
    let mut excluded = Vec::new();

    for book in books {
        match sale_point(book) {
            Ok(point) => points.push(point),
            Err(reason) => {
                match &reason {
                    ExclusionReason::NoSaleDate => {
                        debug!(book_id = book.id, "skipping book without sale")
                    }
                    ExclusionReason::MalformedDate(raw) => warn!(
                        book_id = book.id,
                        sale_date = %raw,
                        "unparseable sale date excluded from charts"
                    ),
                    ExclusionReason::IncompleteSale => warn!(
                        book_id = book.id,
                        "sale without quantity or amount excluded from charts"
                    ),
                }
                excluded.push(Exclusion {
                    book_id: book.id,
                    reason,
                });
            }
        }
    }

    if points.is_empty() {
        return Err(InsufficientData {
            excluded: excluded.len(),
        });
    }

    points.sort_by_key(|point| point.sale_date);
    Ok(SalesView { points, excluded })
}

fn sale_point(book: &Book) -> Result<SalePoint, ExclusionReason> {
    let raw = book
        .sale_date
        .as_deref()
        .map(str::trim)
        .filter(|raw| !raw.is_empty())
        .ok_or(ExclusionReason::NoSaleDate)?;
    let sale_date =
        parse_sale_date(raw).ok_or_else(|| ExclusionReason::MalformedDate(raw.to_string()))?;

    match (book.quantity_sold, book.amount_received) {
        (Some(quantity_sold), Some(amount_received)) => Ok(SalePoint {
            book_id: book.id,
            title: book.title.clone(),
            sale_date,
            quantity_sold,
            amount_received,
        }),
        _ => Err(ExclusionReason::IncompleteSale),
    }
}

/// Read a stored sale date, accepting plain dates and timestamps.
pub fn parse_sale_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(raw, format).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
                .map(|stamp| stamp.date())
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn book(id: i64, sale_date: Option<&str>, quantity: i64) -> Book {
        let sold = sale_date.is_some();
        Book {
            id,
            title: format!("Book {id}"),
            author: "Author".to_string(),
            unit_price: 20.0,
            registered_date: Some("2024-01-01".to_string()),
            stock_count: Some(10),
            sale_date: sale_date.map(str::to_string),
            quantity_sold: sold.then_some(quantity),
            amount_received: sold.then_some(quantity as f64 * 20.0),
            sale_location: sold.then(|| "Store".to_string()),
        }
    }

    fn day(raw: &str) -> NaiveDate {
        NaiveDate::parse_from_str(raw, DATE_FORMAT).unwrap()
    }

    #[test]
    fn malformed_date_is_the_only_row_dropped() {
        let books = vec![
            book(1, Some("2024-03-01"), 3),
            book(2, Some("not a date"), 7),
            book(3, Some("2024-01-15"), 1),
            book(4, Some("2024-02-10"), 2),
        ];

        let view = build_sales_view(&books).unwrap();

        let ids: Vec<i64> = view.points().iter().map(|p| p.book_id).collect();
        assert_eq!(ids, [3, 4, 1]);
        assert_eq!(
            view.excluded(),
            [Exclusion {
                book_id: 2,
                reason: ExclusionReason::MalformedDate("not a date".to_string()),
            }]
        );
    }

    #[test]
    fn same_day_sales_keep_input_order() {
        let books = vec![
            book(9, Some("2024-05-05"), 1),
            book(2, Some("2024-05-05"), 2),
            book(5, Some("2024-05-01"), 3),
            book(1, Some("2024-05-05"), 4),
        ];

        let view = build_sales_view(&books).unwrap();
        let ids: Vec<i64> = view.points().iter().map(|p| p.book_id).collect();
        assert_eq!(ids, [5, 9, 2, 1]);
    }

    #[test]
    fn projections_share_the_sorted_rows() {
        let books = vec![book(1, Some("2024-02-01"), 2), book(2, Some("2024-01-01"), 5)];
        let view = build_sales_view(&books).unwrap();

        assert_eq!(
            view.amount_series(),
            [(day("2024-01-01"), 100.0), (day("2024-02-01"), 40.0)]
        );
        assert_eq!(
            view.quantity_series(),
            [(day("2024-01-01"), 5), (day("2024-02-01"), 2)]
        );
        assert_eq!(
            view.quantity_bars(),
            [(5, day("2024-01-01")), (2, day("2024-02-01"))]
        );
        assert_eq!(view.date_range(), (day("2024-01-01"), day("2024-02-01")));
    }

    #[test]
    fn unsold_and_incomplete_rows_are_excluded() {
        let mut partial = book(3, Some("2024-01-03"), 1);
        partial.amount_received = None;
        let books = vec![book(1, None, 0), book(2, Some("2024-01-02"), 1), partial];

        let view = build_sales_view(&books).unwrap();

        assert_eq!(view.points().len(), 1);
        let reasons: Vec<&ExclusionReason> = view.excluded().iter().map(|e| &e.reason).collect();
        assert_eq!(
            reasons,
            [&ExclusionReason::NoSaleDate, &ExclusionReason::IncompleteSale]
        );
    }

    #[test]
    fn nothing_usable_signals_insufficient_data() {
        assert_eq!(
            build_sales_view(&[]).unwrap_err(),
            InsufficientData { excluded: 0 }
        );

        let books = vec![book(1, None, 0), book(2, Some("31/12/2024"), 1)];
        assert_eq!(
            build_sales_view(&books).unwrap_err(),
            InsufficientData { excluded: 2 }
        );
    }

    #[test]
    fn timestamps_and_slashes_are_coerced() {
        assert_eq!(parse_sale_date("2024-02-01"), Some(day("2024-02-01")));
        assert_eq!(parse_sale_date(" 2024/02/01 "), Some(day("2024-02-01")));
        assert_eq!(
            parse_sale_date("2024-02-01 13:45:00"),
            Some(day("2024-02-01"))
        );
        assert_eq!(
            parse_sale_date("2024-02-01T08:00:00"),
            Some(day("2024-02-01"))
        );
        assert_eq!(parse_sale_date("2024-13-01"), None);
        assert_eq!(parse_sale_date(""), None);
    }
}

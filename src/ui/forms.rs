use anyhow::{anyhow, Result};
use chrono::NaiveDate;
use ratatui::text::Line;

use crate::models::{NewBook, SaleEntry, DATE_FORMAT};

use super::helpers::field_line;

/// Placeholder shown for empty mandatory fields.
const REQUIRED: &str = "<required>";

/// Internal representation of the "add book" form fields.
#[derive(Clone)]
pub(crate) struct BookForm {
    pub(crate) title: String,
    pub(crate) author: String,
    pub(crate) price: String,
    pub(crate) registered: String,
    pub(crate) copies: String,
    pub(crate) active: BookField,
    pub(crate) error: Option<String>,
}

/// Fields available within the book form, in focus order.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub(crate) enum BookField {
    Title,
    Author,
    Price,
    Registered,
    Copies,
}

impl BookField {
    pub(crate) const ORDER: [BookField; 5] = [
        BookField::Title,
        BookField::Author,
        BookField::Price,
        BookField::Registered,
        BookField::Copies,
    ];

    pub(crate) fn label(self) -> &'static str {
        match self {
            BookField::Title => "Title",
            BookField::Author => "Author",
            BookField::Price => "Price",
            BookField::Registered => "Registered (YYYY-MM-DD)",
            BookField::Copies => "Copies",
        }
    }
}

impl BookForm {
    /// Fresh form with the registration date set to `today` and one copy.
    pub(crate) fn new(today: NaiveDate) -> Self {
        Self {
            title: String::new(),
            author: String::new(),
            price: "0.00".to_string(),
            registered: today.format(DATE_FORMAT).to_string(),
            copies: "1".to_string(),
            active: BookField::Title,
            error: None,
        }
    }

    pub(crate) fn next_field(&mut self) {
        self.active = cycle(&BookField::ORDER, self.active, 1);
    }

    pub(crate) fn previous_field(&mut self) {
        self.active = cycle(&BookField::ORDER, self.active, -1);
    }

    /// Append a character to the active field, validating allowed input.
    pub(crate) fn push_char(&mut self, ch: char) -> bool {
        let (value, accepted) = match self.active {
            BookField::Title => (&mut self.title, !ch.is_control()),
            BookField::Author => (&mut self.author, !ch.is_control()),
            BookField::Price => (&mut self.price, is_decimal_char(ch)),
            BookField::Registered => (&mut self.registered, is_date_char(ch)),
            BookField::Copies => (&mut self.copies, ch.is_ascii_digit()),
        };
        if accepted {
            value.push(ch);
        }
        accepted
    }

    /// Remove the last character from the active field.
    pub(crate) fn backspace(&mut self) {
        self.value_mut(self.active).pop();
    }

    /// Validate the inputs and return typed values ready for persistence.
    pub(crate) fn parse_inputs(&self) -> Result<NewBook> {
        let title = self.title.trim();
        if title.is_empty() {
            return Err(anyhow!("Book title is required."));
        }
        let author = self.author.trim();
        if author.is_empty() {
            return Err(anyhow!("Author is required."));
        }
        let unit_price =
            parse_decimal(&self.price).ok_or_else(|| anyhow!("Price must be a number."))?;
        let registered_date = parse_date(&self.registered)
            .ok_or_else(|| anyhow!("Registered date must use YYYY-MM-DD."))?;
        let stock_count = parse_whole(&self.copies)
            .ok_or_else(|| anyhow!("Copies must be a whole number."))?;

        Ok(NewBook {
            title: title.to_string(),
            author: author.to_string(),
            unit_price,
            registered_date,
            stock_count,
        })
    }

    /// Render the line for `field`.
    pub(crate) fn build_line(&self, field: BookField) -> Line<'static> {
        field_line(
            field.label(),
            self.value(field),
            self.active == field,
            REQUIRED,
        )
    }

    /// Column where the cursor sits for the active field.
    pub(crate) fn cursor_offset(&self) -> usize {
        self.active.label().len() + 2 + self.value(self.active).chars().count()
    }

    /// Row of the active field inside the form.
    pub(crate) fn active_row(&self) -> usize {
        position(&BookField::ORDER, self.active)
    }

    /// Clear everything but the registration date so several books from the
    /// same batch can be typed in a row.
    pub(crate) fn reset_keeping_date(&mut self) {
        let registered = std::mem::take(&mut self.registered);
        self.title.clear();
        self.author.clear();
        self.price = "0.00".to_string();
        self.copies = "1".to_string();
        self.registered = registered;
        self.active = BookField::Title;
        self.error = None;
    }

    fn value(&self, field: BookField) -> &str {
        match field {
            BookField::Title => &self.title,
            BookField::Author => &self.author,
            BookField::Price => &self.price,
            BookField::Registered => &self.registered,
            BookField::Copies => &self.copies,
        }
    }

    fn value_mut(&mut self, field: BookField) -> &mut String {
        match field {
            BookField::Title => &mut self.title,
            BookField::Author => &mut self.author,
            BookField::Price => &mut self.price,
            BookField::Registered => &mut self.registered,
            BookField::Copies => &mut self.copies,
        }
    }
}

/// Form state for recording a sale. The title is picked from the titles
/// currently stored rather than typed.
#[derive(Clone)]
pub(crate) struct SaleForm {
    pub(crate) titles: Vec<String>,
    pub(crate) selected_title: usize,
    pub(crate) sale_date: String,
    pub(crate) quantity: String,
    pub(crate) amount: String,
    pub(crate) location: String,
    pub(crate) active: SaleField,
    pub(crate) error: Option<String>,
}

/// Fields within the sale form, in focus order.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub(crate) enum SaleField {
    Title,
    Date,
    Quantity,
    Amount,
    Location,
}

impl SaleField {
    pub(crate) const ORDER: [SaleField; 5] = [
        SaleField::Title,
        SaleField::Date,
        SaleField::Quantity,
        SaleField::Amount,
        SaleField::Location,
    ];

    pub(crate) fn label(self) -> &'static str {
        match self {
            SaleField::Title => "Book",
            SaleField::Date => "Sale date (YYYY-MM-DD)",
            SaleField::Quantity => "Quantity sold",
            SaleField::Amount => "Amount received",
            SaleField::Location => "Location",
        }
    }
}

impl SaleForm {
    pub(crate) fn new(titles: Vec<String>, today: NaiveDate) -> Self {
        Self {
            titles,
            selected_title: 0,
            sale_date: today.format(DATE_FORMAT).to_string(),
            quantity: "1".to_string(),
            amount: "0.00".to_string(),
            location: String::new(),
            active: SaleField::Title,
            error: None,
        }
    }

    pub(crate) fn next_field(&mut self) {
        self.active = cycle(&SaleField::ORDER, self.active, 1);
    }

    pub(crate) fn previous_field(&mut self) {
        self.active = cycle(&SaleField::ORDER, self.active, -1);
    }

    /// Step through the title list, wrapping at both ends.
    pub(crate) fn cycle_title(&mut self, offset: isize) {
        let len = self.titles.len();
        if len == 0 {
            return;
        }
        let next = (self.selected_title as isize + offset).rem_euclid(len as isize);
        self.selected_title = next as usize;
    }

    pub(crate) fn current_title(&self) -> Option<&str> {
        self.titles.get(self.selected_title).map(String::as_str)
    }

    pub(crate) fn push_char(&mut self, ch: char) -> bool {
        let (value, accepted) = match self.active {
            SaleField::Title => return false,
            SaleField::Date => (&mut self.sale_date, is_date_char(ch)),
            SaleField::Quantity => (&mut self.quantity, ch.is_ascii_digit()),
            SaleField::Amount => (&mut self.amount, is_decimal_char(ch)),
            SaleField::Location => (&mut self.location, !ch.is_control()),
        };
        if accepted {
            value.push(ch);
        }
        accepted
    }

    pub(crate) fn backspace(&mut self) {
        match self.active {
            SaleField::Title => {}
            SaleField::Date => {
                self.sale_date.pop();
            }
            SaleField::Quantity => {
                self.quantity.pop();
            }
            SaleField::Amount => {
                self.amount.pop();
            }
            SaleField::Location => {
                self.location.pop();
            }
        }
    }

    pub(crate) fn parse_inputs(&self) -> Result<SaleEntry> {
        let title = self
            .current_title()
            .ok_or_else(|| anyhow!("Register a book before recording a sale."))?;
        let sale_date = parse_date(&self.sale_date)
            .ok_or_else(|| anyhow!("Sale date must use YYYY-MM-DD."))?;
        let quantity_sold = parse_whole(&self.quantity)
            .ok_or_else(|| anyhow!("Quantity must be a whole number."))?;
        let amount_received = parse_decimal(&self.amount)
            .ok_or_else(|| anyhow!("Amount received must be a number."))?;

        Ok(SaleEntry {
            title: title.to_string(),
            sale_date,
            quantity_sold,
            amount_received,
            sale_location: self.location.trim().to_string(),
        })
    }

    pub(crate) fn build_line(&self, field: SaleField) -> Line<'static> {
        if field == SaleField::Title {
            let display = match self.current_title() {
                Some(title) => format!(
                    "< {title} > ({}/{})",
                    self.selected_title + 1,
                    self.titles.len()
                ),
                None => String::new(),
            };
            return field_line(
                field.label(),
                &display,
                self.active == field,
                "<no books registered>",
            );
        }

        let value: &str = match field {
            SaleField::Title => "",
            SaleField::Date => &self.sale_date,
            SaleField::Quantity => &self.quantity,
            SaleField::Amount => &self.amount,
            SaleField::Location => &self.location,
        };
        let placeholder = if field == SaleField::Location {
            ""
        } else {
            REQUIRED
        };
        field_line(field.label(), value, self.active == field, placeholder)
    }

    /// Cursor column for the active field; `None` on the title picker.
    pub(crate) fn cursor_offset(&self) -> Option<usize> {
        let len = match self.active {
            SaleField::Title => return None,
            SaleField::Date => self.sale_date.chars().count(),
            SaleField::Quantity => self.quantity.chars().count(),
            SaleField::Amount => self.amount.chars().count(),
            SaleField::Location => self.location.chars().count(),
        };
        Some(self.active.label().len() + 2 + len)
    }

    pub(crate) fn active_row(&self) -> usize {
        position(&SaleField::ORDER, self.active)
    }
}

fn position<T: PartialEq + Copy>(order: &[T], current: T) -> usize {
    order.iter().position(|f| *f == current).unwrap_or(0)
}

fn cycle<T: PartialEq + Copy>(order: &[T], current: T, offset: isize) -> T {
    let len = order.len() as isize;
    let next = (position(order, current) as isize + offset).rem_euclid(len);
    order[next as usize]
}

fn is_decimal_char(ch: char) -> bool {
    ch.is_ascii_digit() || ch == '.' || ch == ','
}

fn is_date_char(ch: char) -> bool {
    ch.is_ascii_digit() || ch == '-'
}

/// Parse a money amount, accepting a comma as the decimal separator.
// Parse failures carry no source so the footer shows the form's own message.
fn parse_decimal(raw: &str) -> Option<f64> {
    raw.trim().replace(',', ".").parse::<f64>().ok()
}

fn parse_whole(raw: &str) -> Option<i64> {
    raw.trim().parse::<i64>().ok()
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT).ok()
}

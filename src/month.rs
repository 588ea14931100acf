//! Calendar month helpers shared by budgets, reports and the dashboard.
//!
//! A month is represented by the [Date] of its first day, which is also how
//! months are stored in the database.

use time::{Date, Month, format_description::BorrowedFormatItem, macros::format_description};

use crate::Error;

const DATE_FORMAT: &[BorrowedFormatItem] = format_description!("[year]-[month]-[day]");

/// Parse a month in the `YYYY-MM` format used by `<input type="month">`.
///
/// # Errors
/// Returns [Error::InvalidMonth] if `raw_month` is not a valid `YYYY-MM` string.
pub fn parse_month(raw_month: &str) -> Result<Date, Error> {
    let raw_month = raw_month.trim();

    if raw_month.len() != 7 {
        return Err(Error::InvalidMonth(raw_month.to_owned()));
    }

    // A day is appended so the year-month pair can be parsed as a date.
    Date::parse(&format!("{raw_month}-01"), DATE_FORMAT)
        .map_err(|_| Error::InvalidMonth(raw_month.to_owned()))
}

/// Parse a date in the `YYYY-MM-DD` format used by `<input type="date">`.
///
/// # Errors
/// Returns [Error::InvalidDate] if `raw_date` is not a valid `YYYY-MM-DD` string.
pub fn parse_date(raw_date: &str) -> Result<Date, Error> {
    Date::parse(raw_date.trim(), DATE_FORMAT)
        .map_err(|_| Error::InvalidDate(raw_date.to_owned()))
}

/// The first day of the month containing `date`.
pub fn first_of_month(date: Date) -> Date {
    date.replace_day(1).unwrap_or(date)
}

/// The first day of the month after the month containing `date`.
pub fn first_of_next_month(date: Date) -> Date {
    let first = first_of_month(date);
    let (year, month) = match first.month() {
        Month::December => (first.year() + 1, Month::January),
        month => (first.year(), month.next()),
    };

    Date::from_calendar_date(year, month, 1).unwrap_or(first)
}

/// Format a month as `YYYY-MM`, the value expected by `<input type="month">`.
pub fn format_month_value(month: Date) -> String {
    format!("{:04}-{:02}", month.year(), u8::from(month.month()))
}

/// Format a month for display, e.g. "March 2025".
pub fn format_month_label(month: Date) -> String {
    format!("{} {}", month.month(), month.year())
}

//! Parsing for the dollar amounts entered in forms.

use crate::Error;

/// The largest amount that can be stored, 99,999,999.99.
pub const MAX_AMOUNT: f64 = 99_999_999.99;

/// Parse a non-negative dollar amount with at most two decimal places.
///
/// # Errors
/// Returns [Error::InvalidAmount] with a message for the form field if
/// `raw_amount` is not a number, is negative, has more than two decimal places
/// or is larger than [MAX_AMOUNT].
pub fn parse_amount(raw_amount: &str) -> Result<f64, Error> {
    let raw_amount = raw_amount.trim();

    let (whole, fraction) = raw_amount.split_once('.').unwrap_or((raw_amount, ""));

    let is_number = !whole.is_empty()
        && whole.chars().all(|c| c.is_ascii_digit())
        && fraction.chars().all(|c| c.is_ascii_digit());

    if !is_number {
        return Err(Error::InvalidAmount(
            "Enter a positive number, e.g. 12.34.".to_owned(),
        ));
    }

    if fraction.len() > 2 {
        return Err(Error::InvalidAmount(
            "Amounts can have at most two decimal places.".to_owned(),
        ));
    }

    let amount: f64 = raw_amount
        .parse()
        .map_err(|_| Error::InvalidAmount("Enter a positive number, e.g. 12.34.".to_owned()))?;

    if amount > MAX_AMOUNT {
        return Err(Error::InvalidAmount(format!(
            "Amounts must be at most {MAX_AMOUNT:.2}."
        )));
    }

    Ok(amount)
}

/// Parse an amount that must be greater than zero.
///
/// # Errors
/// Returns the errors of [parse_amount], or [Error::InvalidAmount] if the amount is zero.
pub fn parse_positive_amount(raw_amount: &str) -> Result<f64, Error> {
    let amount = parse_amount(raw_amount)?;

    if amount <= 0.0 {
        return Err(Error::InvalidAmount(
            "The amount must be greater than zero.".to_owned(),
        ));
    }

    Ok(amount)
}

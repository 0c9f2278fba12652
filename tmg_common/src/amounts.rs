//! Helpers for the integer peso amounts the clearing network works with.
//!
//! Amounts travel on the wire as strings of digits (`"10000"`). Operators type them with all sorts of decoration
//! (`$10.000`, `10,000 CLP`), so input is reduced to its digits before use.
use thiserror::Error;

pub const CLP_CURRENCY_CODE: &str = "CLP";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AmountError {
    #[error("The amount '{0}' does not contain any digits")]
    NoDigits(String),
    #[error("The amount '{0}' is too large")]
    Overflow(String),
}

/// Strips everything that is not an ASCII digit from `raw` and parses the remainder.
pub fn digits_only(raw: &str) -> Result<u64, AmountError> {
    let digits = raw.chars().filter(|c| c.is_ascii_digit()).collect::<String>();
    if digits.is_empty() {
        return Err(AmountError::NoDigits(raw.to_string()));
    }
    digits.parse::<u64>().map_err(|_| AmountError::Overflow(raw.to_string()))
}

/// Formats an amount with `.` as the thousands separator, e.g. `1234567` -> `1.234.567`.
pub fn format_amount(amount: u64) -> String {
    let digits = amount.to_string();
    let mut result = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            result.push('.');
        }
        result.push(c);
    }
    result
}

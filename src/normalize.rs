//! Cell normalizers.
//!
//! Every normalizer has two faces: a `parse_*` function that reports exactly why a
//! cell could not be converted, and a `clean_*` wrapper that the cleaning stage uses,
//! which folds any failure into `None`. Nothing here panics on bad input.

use crate::cell::RawCell;
use lazy_static::lazy_static;
use regex::Regex;
use thiserror::Error;

lazy_static! {
    /// Currency symbol, thousands separators, decimal points and spaces.
    static ref PRICE_NOISE: Regex = Regex::new(r"[₹,. ]").unwrap();
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    #[error("cell is empty")]
    Missing,
    #[error("nothing left after stripping formatting")]
    Empty,
    #[error("not a number: {0:?}")]
    NotANumber(String),
    #[error("negative value")]
    Negative,
    #[error("value is not finite")]
    NonFinite,
}

/// Converts a price cell into a whole currency amount.
///
/// Text is collapsed to its digits before conversion, so a decimal point is dropped
/// rather than parsed: `"₹1,23,456.00"` becomes `12345600`. Numeric cells are
/// truncated toward zero.
pub fn parse_price(cell: &RawCell) -> Result<u64, ParseError> {
    match cell {
        RawCell::Missing => Err(ParseError::Missing),
        RawCell::Number(n) => {
            if !n.is_finite() {
                return Err(ParseError::NonFinite);
            }
            let whole = n.trunc();
            if whole < 0.0 {
                Err(ParseError::Negative)
            } else if whole >= u64::MAX as f64 {
                Err(ParseError::NotANumber(n.to_string()))
            } else {
                Ok(whole as u64)
            }
        }
        RawCell::Text(text) => {
            let stripped = PRICE_NOISE.replace_all(text, "");
            let digits = stripped.trim();
            if digits.is_empty() {
                return Err(ParseError::Empty);
            }

            let not_a_number = || ParseError::NotANumber(text.clone());
            if let Some(rest) = digits.strip_prefix('-') {
                if !is_digit_run(rest) {
                    return Err(not_a_number());
                }
                return match rest.parse::<u64>() {
                    Ok(0) => Ok(0),
                    Ok(_) => Err(ParseError::Negative),
                    Err(_) => Err(not_a_number()),
                };
            }

            let unsigned = digits.strip_prefix('+').unwrap_or(digits);
            if !is_digit_run(unsigned) {
                return Err(not_a_number());
            }
            unsigned.parse::<u64>().map_err(|_| not_a_number())
        }
    }
}

/// Converts a mileage or fuel-capacity cell into a real number.
///
/// Sheets exported from web tables often carry line breaks inside numeric cells
/// (`"45\n"`); those are removed before parsing.
pub fn parse_measurement(cell: &RawCell) -> Result<f64, ParseError> {
    let value = match cell {
        RawCell::Missing => return Err(ParseError::Missing),
        RawCell::Number(n) => *n,
        RawCell::Text(text) => {
            let flattened = text.replace('\n', "");
            let trimmed = flattened.trim();
            if trimmed.is_empty() {
                return Err(ParseError::Empty);
            }
            trimmed
                .parse::<f64>()
                .map_err(|_| ParseError::NotANumber(text.clone()))?
        }
    };

    if !value.is_finite() {
        Err(ParseError::NonFinite)
    } else if value < 0.0 {
        Err(ParseError::Negative)
    } else if value == 0.0 {
        // `-0` passes the sign check; store it as +0 so it ranks level with `0`
        Ok(0.0)
    } else {
        Ok(value)
    }
}

/// Price normalizer used by the cleaning stage
///
/// # Arguments
/// * `cell` - One of the four price cells of a raw row
///
/// # Returns
/// * `Option<u64>` - The whole amount, or `None` when `parse_price` rejects the cell
///
/// # Examples
/// ```
/// use wheeldash::cell::RawCell;
/// use wheeldash::normalize::clean_price;
///
/// assert_eq!(clean_price(&RawCell::Text("₹ 1,05,000".to_string())), Some(105000));
/// assert_eq!(clean_price(&RawCell::Text("N/A".to_string())), None);
/// ```
pub fn clean_price(cell: &RawCell) -> Option<u64> {
    parse_price(cell).ok()
}

/// Measurement normalizer used by the cleaning stage
///
/// # Arguments
/// * `cell` - The mileage or fuel-capacity cell of a raw row
///
/// # Returns
/// * `Option<f64>` - A finite, non-negative value, or `None` when
///   `parse_measurement` rejects the cell
pub fn clean_measurement(cell: &RawCell) -> Option<f64> {
    parse_measurement(cell).ok()
}

fn is_digit_run(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> RawCell {
        RawCell::Text(s.to_string())
    }

    #[test]
    fn rupee_amount_collapses_to_its_digits() {
        assert_eq!(parse_price(&text("₹1,23,456.00")), Ok(12345600));
        assert_eq!(parse_price(&text("₹ 72,000")), Ok(72000));
        assert_eq!(parse_price(&text("85.5")), Ok(855));
    }

    #[test]
    fn price_digits_are_concatenated_in_order() {
        for input in ["₹9,8.7", "9.8,7", "98,7", "₹ 9 8 7"] {
            assert_eq!(parse_price(&text(input)), Ok(987), "input {input:?}");
        }
    }

    #[test]
    fn price_tolerates_surrounding_whitespace() {
        assert_eq!(parse_price(&text("\t65000\n")), Ok(65000));
    }

    #[test]
    fn non_numeric_prices_are_rejected() {
        assert_eq!(
            parse_price(&text("N/A")),
            Err(ParseError::NotANumber("N/A".to_string()))
        );
        assert!(matches!(
            parse_price(&text("Rs 50000")),
            Err(ParseError::NotANumber(_))
        ));
        assert!(matches!(
            parse_price(&text("1\n2")),
            Err(ParseError::NotANumber(_))
        ));
        assert_eq!(parse_price(&text("₹,.")), Err(ParseError::Empty));
        assert_eq!(parse_price(&RawCell::Missing), Err(ParseError::Missing));
        assert_eq!(clean_price(&text("N/A")), None);
    }

    #[test]
    fn negative_prices_are_rejected() {
        assert_eq!(parse_price(&text("-5,000")), Err(ParseError::Negative));
        assert_eq!(parse_price(&RawCell::Number(-1.0)), Err(ParseError::Negative));
        assert_eq!(parse_price(&text("-0")), Ok(0));
    }

    #[test]
    fn numeric_prices_truncate() {
        assert_eq!(parse_price(&RawCell::Number(50000.0)), Ok(50000));
        assert_eq!(parse_price(&RawCell::Number(50000.9)), Ok(50000));
        assert_eq!(
            parse_price(&RawCell::Number(f64::NAN)),
            Err(ParseError::NonFinite)
        );
    }

    #[test]
    fn measurements_strip_line_breaks() {
        assert_eq!(parse_measurement(&text("45\n")), Ok(45.0));
        assert_eq!(parse_measurement(&text(" 4\n5.5 ")), Ok(45.5));
        assert_eq!(parse_measurement(&RawCell::Number(12.5)), Ok(12.5));
    }

    #[test]
    fn bad_measurements_are_rejected() {
        assert!(matches!(
            parse_measurement(&text("45 kmpl")),
            Err(ParseError::NotANumber(_))
        ));
        assert_eq!(parse_measurement(&text("\n")), Err(ParseError::Empty));
        assert_eq!(parse_measurement(&text("NaN")), Err(ParseError::NonFinite));
        assert_eq!(parse_measurement(&text("-3")), Err(ParseError::Negative));
        assert_eq!(clean_measurement(&RawCell::Missing), None);
    }

    #[test]
    fn negative_zero_measurement_becomes_positive_zero() {
        for cell in [text("-0"), text("-0.0"), RawCell::Number(-0.0)] {
            let value = parse_measurement(&cell).unwrap();
            assert_eq!(value, 0.0);
            assert!(value.is_sign_positive(), "cell {cell:?}");
        }
    }
}

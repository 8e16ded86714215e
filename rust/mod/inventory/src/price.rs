//! Fixed-point price handling.
//!
//! Prices travel as decimal strings (`"12.50"`) or JSON numbers and are
//! stored as integer hundredths.

use rust_decimal::Decimal;
use serde::Serializer;
use serde_json::Value;

pub const MAX_DIGITS: u32 = 10;
pub const DECIMAL_PLACES: u32 = 2;

pub const INVALID: &str = "A valid number is required.";

/// Parse a price from its wire form and check its precision.
///
/// Errors are the user-facing field messages. Literals that fit the decimal
/// grammar but not the 96-bit mantissa fail the digit count rather than
/// being rounded.
pub fn parse(value: &Value) -> Result<Decimal, String> {
    let raw = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        _ => return Err(INVALID.to_string()),
    };
    if !is_decimal_literal(&raw) {
        return Err(INVALID.to_string());
    }
    let parsed = if raw.contains(['e', 'E']) {
        Decimal::from_scientific(&raw)
    } else {
        Decimal::from_str_exact(&raw)
    }
    .map_err(|_| too_many_digits())?;
    check_precision(parsed)?;
    Ok(if parsed.is_zero() { Decimal::ZERO } else { parsed })
}

/// `[+-]digits[.digits][e[+-]digits]`, with digits on at least one side of
/// the point.
fn is_decimal_literal(raw: &str) -> bool {
    let all_digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
    let unsigned = raw.strip_prefix(['+', '-']).unwrap_or(raw);
    let (number, exponent) = match unsigned.split_once(['e', 'E']) {
        Some((number, exponent)) => (number, Some(exponent)),
        None => (unsigned, None),
    };
    let (whole, fraction) = number.split_once('.').unwrap_or((number, ""));
    if (whole.is_empty() && fraction.is_empty()) || !all_digits(whole) || !all_digits(fraction) {
        return false;
    }
    match exponent {
        None => true,
        Some(e) => {
            let e = e.strip_prefix(['+', '-']).unwrap_or(e);
            !e.is_empty() && all_digits(e)
        }
    }
}

fn too_many_digits() -> String {
    format!(
        "Ensure that there are no more than {} digits in total.",
        MAX_DIGITS
    )
}

/// Check total digits, decimal places and whole digits. Trailing zeros
/// count: `1.500` has three decimal places.
pub fn check_precision(value: Decimal) -> Result<(), String> {
    let scale = value.scale();
    let len = value.mantissa().unsigned_abs().to_string().len() as u32;

    let (digits, decimals) = if scale == 0 {
        (len, 0)
    } else if scale > len {
        (scale, scale)
    } else {
        (len, scale)
    };

    if digits > MAX_DIGITS {
        return Err(too_many_digits());
    }
    if decimals > DECIMAL_PLACES {
        return Err(format!(
            "Ensure that there are no more than {} decimal places.",
            DECIMAL_PLACES
        ));
    }
    if digits - decimals > MAX_DIGITS - DECIMAL_PLACES {
        return Err(format!(
            "Ensure that there are no more than {} digits before the decimal point.",
            MAX_DIGITS - DECIMAL_PLACES
        ));
    }
    Ok(())
}

/// Price in hundredths. Saturates for values that never passed `parse`.
pub fn to_cents(value: Decimal) -> i64 {
    let mut scaled = value;
    scaled.rescale(DECIMAL_PLACES);
    i64::try_from(scaled.mantissa()).unwrap_or(if scaled.is_sign_negative() {
        i64::MIN
    } else {
        i64::MAX
    })
}

pub fn from_cents(cents: i64) -> Decimal {
    Decimal::new(cents, DECIMAL_PLACES)
}

/// Serialize as a string with exactly two decimal places.
pub fn serialize<S: Serializer>(value: &Decimal, serializer: S) -> Result<S::Ok, S::Error> {
    let mut scaled = *value;
    scaled.rescale(DECIMAL_PLACES);
    serializer.serialize_str(&scaled.to_string())
}

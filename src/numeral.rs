//! Decoding of numeric literal lexemes.
//!
//! A lexeme is base-12 when it carries the `.b12` suffix or when any of its
//! digits is `t` (ten) or `e` (eleven). Everything else is plain decimal.

use thiserror::Error;

pub const BASE12_SUFFIX: &str = ".b12";

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum NumeralError {
    #[error("integer literal `{0}` does not fit in 64 bits")]
    OutOfRange(Box<str>),
    #[error("malformed numeric literal `{0}`")]
    Malformed(Box<str>),
}

pub fn is_base12(lexeme: &str) -> bool {
    lexeme.ends_with(BASE12_SUFFIX) || lexeme.contains(['t', 'e'])
}

/// Decodes an integer literal lexeme.
pub fn decode_int(lexeme: &str) -> Result<i64, NumeralError> {
    if is_base12(lexeme) {
        let digits = lexeme.strip_suffix(BASE12_SUFFIX).unwrap_or(lexeme);
        decode_base12(digits).ok_or_else(|| classify(lexeme, digits, 12))
    } else {
        lexeme
            .parse::<i64>()
            .map_err(|_| classify(lexeme, lexeme, 10))
    }
}

/// Decodes a float literal lexeme, truncating toward zero.
pub fn decode_float(lexeme: &str) -> Result<i64, NumeralError> {
    let value: f64 = lexeme
        .parse()
        .map_err(|_| NumeralError::Malformed(lexeme.into()))?;
    let truncated = value.trunc();
    // `i64::MAX as f64` rounds up to 2^63, which is already out of range.
    #[allow(clippy::cast_precision_loss)]
    let in_range = truncated >= i64::MIN as f64 && truncated < i64::MAX as f64;
    if !in_range {
        return Err(NumeralError::OutOfRange(lexeme.into()));
    }
    #[allow(clippy::cast_possible_truncation)]
    Ok(truncated as i64)
}

fn decode_base12(digits: &str) -> Option<i64> {
    if digits.is_empty() {
        return None;
    }
    digits.chars().try_fold(0i64, |value, c| {
        let digit = base12_digit(c)?;
        value.checked_mul(12)?.checked_add(digit)
    })
}

fn base12_digit(c: char) -> Option<i64> {
    match c {
        't' => Some(10),
        'e' => Some(11),
        // to_digit(10) always fits.
        c => c.to_digit(10).map(i64::from),
    }
}

fn classify(lexeme: &str, digits: &str, radix: u32) -> NumeralError {
    let well_formed = !digits.is_empty()
        && digits.chars().all(|c| match radix {
            12 => base12_digit(c).is_some(),
            _ => c.is_ascii_digit(),
        });
    if well_formed {
        NumeralError::OutOfRange(lexeme.into())
    } else {
        NumeralError::Malformed(lexeme.into())
    }
}

//! Parsing of number tokens and annotator-resolved values into numbers.

use serde::Serialize;

use crate::annotation::Decimal;

pub const MONTHS: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

const THOUSANDS_SEPARATORS: [char; 4] = [',', '\u{a0}', '\u{2009}', '\u{202f}'];

/// A parsed number, remembering whether the parse was integral.
///
/// Integers are 128-bit, so digit strings well past `i64` (39 digits) keep
/// their integer form.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Number {
    Integer(i128),
    Float(f64),
}

impl Number {
    #[allow(clippy::cast_precision_loss)]
    pub fn as_f64(self) -> f64 {
        match self {
            Self::Integer(i) => i as f64,
            Self::Float(f) => f,
        }
    }
}

impl std::fmt::Display for Number {
    #[allow(clippy::float_cmp)]
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Integer(i) => write!(f, "{i}"),
            // Positional notation, never exponent; whole floats keep ".0"
            Self::Float(x) if x.fract() == 0.0 => write!(f, "{x}.0"),
            Self::Float(x) => write!(f, "{x}"),
        }
    }
}

impl From<&Decimal> for Number {
    fn from(value: &Decimal) -> Self {
        value
            .to_i128()
            .map_or_else(|| Self::Float(value.to_f64()), Self::Integer)
    }
}

/// Parses a raw token: month names map to 1..=12, otherwise thousands
/// separators are stripped and the text is read as an integer, then as a float.
///
/// Returns `None` when nothing parses or the result is not finite.
pub fn num(text: &str) -> Option<Number> {
    if let Some(month) = MONTHS.iter().position(|m| *m == text) {
        return i128::try_from(month + 1).ok().map(Number::Integer);
    }

    let stripped: String = text
        .trim()
        .chars()
        .filter(|c| !THOUSANDS_SEPARATORS.contains(c))
        .collect();

    if let Ok(i) = stripped.parse::<i128>() {
        return Some(Number::Integer(i));
    }

    stripped
        .parse::<f64>()
        .ok()
        .filter(|f| f.is_finite())
        .map(Number::Float)
}

pub fn is_num(text: &str) -> bool {
    num(text).is_some()
}

/// [`num`] re-serialized: `"2,000,000.53"` becomes `"2000000.53"`, `"3"` stays `"3"`.
pub fn strnum(text: &str) -> Option<String> {
    num(text).map(|n| n.to_string())
}

/// Canonical text of an annotator-resolved value.
pub fn strnum_value(value: &Decimal) -> String {
    Number::from(value).to_string()
}

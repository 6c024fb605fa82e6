//! Numeric fields that tolerate malformed input

use serde::{Deserialize, Serialize};

/// An integer field as uploaded.
///
/// `raw` is the exact source text. `value` is the leading base-10 integer of
/// that text: leading whitespace and one sign are accepted, parsing stops at
/// the first non-digit (`"6.0"` is 6, `"12a"` is 12), and magnitudes beyond
/// `i64` saturate. Text without a leading integer (empty, "ten", ".5") leaves
/// it `None`. Malformed values are data to report, never faults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NumericField {
    raw: String,
    value: Option<i64>,
}

impl NumericField {
    /// Parses raw text into a numeric field
    pub fn parse(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let value = leading_integer(&raw);
        Self { raw, value }
    }

    /// Returns the source text
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Returns the parsed value, if the source text began with an integer
    pub fn value(&self) -> Option<i64> {
        self.value
    }

    /// Returns true if the value parsed and lies in `[min, max]`
    pub fn within(&self, min: i64, max: i64) -> bool {
        matches!(self.value, Some(v) if v >= min && v <= max)
    }
}

fn leading_integer(text: &str) -> Option<i64> {
    let text = text.trim_start();
    let (negative, rest) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text.strip_prefix('+').unwrap_or(text)),
    };

    let end = rest
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(rest.len());
    if end == 0 {
        return None;
    }

    let magnitude = rest[..end].bytes().fold(0i64, |acc, digit| {
        acc.saturating_mul(10).saturating_add(i64::from(digit - b'0'))
    });
    Some(if negative { -magnitude } else { magnitude })
}

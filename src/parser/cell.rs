use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

// " (...)": the parenthetical and any spaces immediately before it.
static PAREN_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r" *\([^)]*\)").unwrap());

/// A single normalized table cell.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Number(f64),
    Text(String),
    Null,
}

impl CellValue {
    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }

    /// String form used when a cell value becomes part of a record key.
    /// Whole numbers render without a decimal point so composed keys read
    /// like "Fund X 2023", and a null key renders as "null".
    pub fn key_string(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Number(n) => {
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    write!(f, "{}", *n as i64)
                } else {
                    write!(f, "{}", n)
                }
            }
            CellValue::Text(s) => f.write_str(s),
            CellValue::Null => f.write_str("null"),
        }
    }
}

impl From<CellValue> for Value {
    fn from(cell: CellValue) -> Value {
        match cell {
            CellValue::Number(n) => {
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    Value::from(n as i64)
                } else {
                    Value::from(n)
                }
            }
            CellValue::Text(s) => Value::String(s),
            CellValue::Null => Value::Null,
        }
    }
}

/// Normalize raw cell text into a scalar value.
///
/// Order matters: trim, drop parenthetical annotations, drop percent signs
/// and thousands separators, then map the "--" placeholder to null. Whatever
/// remains is a number only if it parses fully as a finite numeric literal;
/// an empty string stays an empty string, never zero.
pub fn normalize(raw: &str) -> CellValue {
    let cleaned = cleaned_text(raw);

    if cleaned == "null" {
        return CellValue::Null;
    }

    let candidate = cleaned.trim();
    if !candidate.is_empty() {
        if let Ok(n) = candidate.parse::<f64>() {
            if n.is_finite() {
                return CellValue::Number(n);
            }
        }
    }

    CellValue::Text(cleaned)
}

/// The string-cleanup stage of normalization, before any numeric or null
/// coercion. A cell is "empty" when this comes out as the empty string.
pub fn cleaned_text(raw: &str) -> String {
    let trimmed = raw.trim();
    let stripped = PAREN_RE.replace_all(trimmed, "");
    stripped.replace(['%', ','], "").replace("--", "null")
}

/// Parse a numeric fragment the same way a cell would, without the text
/// fallback. Used by fixers that split composite values apart.
pub fn parse_number(raw: &str) -> Option<f64> {
    let candidate = raw.trim();
    if candidate.is_empty() {
        return None;
    }
    candidate.parse::<f64>().ok().filter(|n| n.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thousands_separator() {
        assert_eq!(normalize("1,234"), CellValue::Number(1234.0));
    }

    #[test]
    fn percent_sign() {
        assert_eq!(normalize("12%"), CellValue::Number(12.0));
    }

    #[test]
    fn parenthetical_stripped() {
        assert_eq!(normalize("Foo (bar)"), CellValue::Text("Foo".into()));
    }

    #[test]
    fn placeholder_dash_is_null() {
        assert_eq!(normalize("--"), CellValue::Null);
    }

    #[test]
    fn empty_is_not_zero() {
        assert_eq!(normalize(""), CellValue::Text("".into()));
        assert_eq!(normalize("   "), CellValue::Text("".into()));
    }

    #[test]
    fn zero_is_numeric() {
        assert_eq!(normalize("0"), CellValue::Number(0.0));
    }

    #[test]
    fn negative_percentage() {
        assert_eq!(normalize("-3.25%"), CellValue::Number(-3.25));
    }

    #[test]
    fn text_passes_through() {
        assert_eq!(normalize("  Equity  "), CellValue::Text("Equity".into()));
    }

    #[test]
    fn nan_literal_stays_text() {
        assert_eq!(normalize("NaN"), CellValue::Text("NaN".into()));
    }

    #[test]
    fn parenthetical_only_cell_cleans_to_empty() {
        assert_eq!(cleaned_text("(net)"), "");
        assert_eq!(cleaned_text("  "), "");
        assert_eq!(cleaned_text("--"), "null");
    }

    #[test]
    fn key_string_for_whole_number() {
        assert_eq!(CellValue::Number(2023.0).key_string(), "2023");
        assert_eq!(CellValue::Number(2.5).key_string(), "2.5");
        assert_eq!(CellValue::Null.key_string(), "null");
    }

    #[test]
    fn json_whole_numbers_are_integers() {
        assert_eq!(Value::from(CellValue::Number(60.0)), serde_json::json!(60));
        assert_eq!(Value::from(CellValue::Number(0.5)), serde_json::json!(0.5));
    }
}

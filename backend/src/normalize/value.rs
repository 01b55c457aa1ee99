//! Value coercion helpers.
//!
//! Cells are `serde_json::Value`s: `String` as read from the file, `Number`
//! and `Bool` once coerced, `Null` for missing values.

use serde_json::{Number, Value};

use super::date::parse_date_strict;

/// Literals read as missing values by dataframe-style transforms.
const MISSING_MARKERS: &[&str] = &[
    "", "#N/A", "#N/A N/A", "#NA", "<NA>", "N/A", "NA", "NULL", "NaN", "-NaN", "nan", "-nan",
    "null", "None", "n/a",
];

/// Upper-cased literals accepted as `true`.
const TRUE_LITERALS: &[&str] = &["TRUE", "VERDADERO", "1", "SI"];

/// Upper-cased literals accepted as `false`.
const FALSE_LITERALS: &[&str] = &["FALSE", "FALSO", "0", "NO"];

/// Literals rejected by letters-only columns.
const BOOLEAN_LITERALS: &[&str] = &["True", "False", "TRUE", "FALSE"];

/// Date layouts a plain-text value must not match.
const DATE_LIKE_FORMATS: &[&str] = &["%d/%m/%Y", "%Y-%m-%d"];

/// Textual view of a cell, `None` for null.
pub fn cell_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(if *b { "True" } else { "False" }.to_string()),
        _ => None,
    }
}

/// Whether a raw cell is a missing-value marker.
pub fn is_missing_marker(raw: &str) -> bool {
    MISSING_MARKERS.contains(&raw)
}

/// Replace every `,` with `.`. No numeric validation.
pub fn normalize_decimal(s: &str) -> String {
    s.replace(',', ".")
}

/// Parse a finite float after trimming and comma normalization.
pub fn parse_float(s: &str) -> Option<f64> {
    let trimmed = s.trim();
    if is_missing_marker(trimmed) {
        return None;
    }
    normalize_decimal(trimmed)
        .parse::<f64>()
        .ok()
        .filter(|n| n.is_finite())
}

/// Coerce a cell to a float, `None` on any failure or missing marker.
pub fn to_float_or_null(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => parse_float(s),
        _ => None,
    }
}

/// Coerce a cell to an integer. Values with a fractional part are rejected.
pub fn to_integer_or_null(value: &Value) -> Option<i64> {
    if let Value::Number(n) = value {
        if let Some(i) = n.as_i64() {
            return Some(i);
        }
    }
    to_float_or_null(value)
        .filter(|f| f.fract() == 0.0 && f.abs() < i64::MAX as f64)
        .map(|f| f as i64)
}

/// Coerce a cell to a boolean using the Spanish/English literal tables.
pub fn to_bool_or_null(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::String(s) => {
            let upper = s.trim().to_uppercase();
            if TRUE_LITERALS.contains(&upper.as_str()) {
                Some(true)
            } else if FALSE_LITERALS.contains(&upper.as_str()) {
                Some(false)
            } else {
                None
            }
        }
        Value::Number(n) => match n.as_f64() {
            Some(f) if f == 1.0 => Some(true),
            Some(f) if f == 0.0 => Some(false),
            _ => None,
        },
        _ => None,
    }
}

/// Round a numeric string to `decimals` places.
///
/// Integral results are rendered without a decimal part, other results
/// with trailing zeros stripped. Non-numeric input is returned unchanged.
///
/// ```ignore
/// assert_eq!(round_trim("3,456", 2), "3.46");
/// assert_eq!(round_trim("7.00", 2), "7");
/// assert_eq!(round_trim("1.10", 2), "1.1");
/// ```
pub fn round_trim(s: &str, decimals: usize) -> String {
    let Some(num) = parse_float(s) else {
        return s.to_string();
    };

    let fixed = format!("{:.*}", decimals, num);
    let rendered = if fixed.contains('.') {
        fixed.trim_end_matches('0').trim_end_matches('.').to_string()
    } else {
        fixed
    };

    if rendered == "-0" {
        "0".to_string()
    } else {
        rendered
    }
}

/// Whether a string is a float literal.
pub fn looks_numeric(s: &str) -> bool {
    s.trim().parse::<f64>().is_ok()
}

/// Whether a string looks like an email address.
pub fn looks_like_email(s: &str) -> bool {
    s.contains('@') && s.contains('.')
}

/// Whether a string parses as a date in one of the known layouts.
pub fn looks_like_date(s: &str) -> bool {
    DATE_LIKE_FORMATS
        .iter()
        .any(|fmt| parse_date_strict(s, fmt).is_some())
}

/// True only for strings that are not a date, an email or a number.
pub fn is_plain_text(value: &Value) -> bool {
    match value {
        Value::String(s) => !looks_like_date(s) && !looks_like_email(s) && !looks_numeric(s),
        _ => false,
    }
}

/// Keep non-empty strings, null everything else.
pub fn text_only(value: &Value) -> Value {
    match value {
        Value::String(s) if !s.is_empty() => value.clone(),
        _ => Value::Null,
    }
}

/// Keep strings without digits that are not boolean literals.
pub fn letters_only(value: &Value) -> Value {
    let Some(text) = cell_text(value) else {
        return Value::Null;
    };
    let rejected = text.is_empty()
        || text.chars().any(|c| c.is_ascii_digit())
        || BOOLEAN_LITERALS.contains(&text.as_str());
    if rejected {
        Value::Null
    } else {
        Value::String(text)
    }
}

/// Float cell, or null when the float is not representable.
pub fn float_cell(f: f64) -> Value {
    Number::from_f64(f).map(Value::Number).unwrap_or(Value::Null)
}

/// Whether a `"null"` literal (any case, surrounding blanks ignored).
pub fn is_null_literal(s: &str) -> bool {
    s.trim().eq_ignore_ascii_case("null")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_normalize_decimal_idempotent() {
        let once = normalize_decimal("1,5;2,75");
        assert_eq!(once, "1.5;2.75");
        assert_eq!(normalize_decimal(&once), once);
        assert_eq!(normalize_decimal("abc"), "abc");
    }

    #[test]
    fn test_to_float_or_null() {
        assert_eq!(to_float_or_null(&json!(" 7,5 ")), Some(7.5));
        assert_eq!(to_float_or_null(&json!("8")), Some(8.0));
        assert_eq!(to_float_or_null(&json!("NaN")), None);
        assert_eq!(to_float_or_null(&json!("ocho")), None);
        assert_eq!(to_float_or_null(&Value::Null), None);
        assert_eq!(to_float_or_null(&json!(2.5)), Some(2.5));
    }

    #[test]
    fn test_to_integer_or_null() {
        assert_eq!(to_integer_or_null(&json!("14")), Some(14));
        assert_eq!(to_integer_or_null(&json!("14.0")), Some(14));
        assert_eq!(to_integer_or_null(&json!("14.5")), None);
        assert_eq!(to_integer_or_null(&json!("semana")), None);
    }

    #[test]
    fn test_to_bool_or_null() {
        assert_eq!(to_bool_or_null(&json!("verdadero")), Some(true));
        assert_eq!(to_bool_or_null(&json!(" Si ")), Some(true));
        assert_eq!(to_bool_or_null(&json!("1")), Some(true));
        assert_eq!(to_bool_or_null(&json!("FALSO")), Some(false));
        assert_eq!(to_bool_or_null(&json!("no")), Some(false));
        assert_eq!(to_bool_or_null(&json!("quizas")), None);
        assert_eq!(to_bool_or_null(&Value::Null), None);
    }

    #[test]
    fn test_round_trim() {
        assert_eq!(round_trim("3,456", 2), "3.46");
        assert_eq!(round_trim("7.00", 2), "7");
        assert_eq!(round_trim("1.10", 2), "1.1");
        assert_eq!(round_trim("0.5", 2), "0.5");
        assert_eq!(round_trim("-0.001", 2), "0");
        assert_eq!(round_trim("n/d", 2), "n/d");
        assert_eq!(round_trim("", 2), "");
    }

    #[test]
    fn test_is_plain_text() {
        assert!(is_plain_text(&json!("CS Fraude")));
        assert!(!is_plain_text(&json!("01/04/2025")));
        assert!(!is_plain_text(&json!("2025-04-01")));
        assert!(!is_plain_text(&json!("ana@example.com")));
        assert!(!is_plain_text(&json!("42")));
        assert!(!is_plain_text(&Value::Null));
    }

    #[test]
    fn test_letters_only() {
        assert_eq!(letters_only(&json!("Soporte")), json!("Soporte"));
        assert_eq!(letters_only(&json!("Equipo 2")), Value::Null);
        assert_eq!(letters_only(&json!("TRUE")), Value::Null);
        assert_eq!(letters_only(&json!(true)), Value::Null);
        assert_eq!(letters_only(&Value::Null), Value::Null);
    }

    #[test]
    fn test_missing_markers() {
        assert!(is_missing_marker(""));
        assert!(is_missing_marker("N/A"));
        assert!(!is_missing_marker("n.a."));
        assert!(is_null_literal(" Null "));
        assert!(!is_null_literal("nulo"));
    }
}

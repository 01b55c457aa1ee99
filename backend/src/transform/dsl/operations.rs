//! Column rules.
//!
//! A [`ColumnRule`] turns one cell into another. Most rules are total and
//! coerce anything they cannot handle to null; the parsing rules (dates,
//! clock times, time ranges) report a [`RuleError`] instead so the step that
//! runs them can decide what to do with the cell.

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::normalize::date::{normalize_time_range, reformat_time, DateRecipe};
use crate::normalize::value::{
    cell_text, float_cell, is_null_literal, is_plain_text, letters_only, normalize_decimal,
    round_trim, text_only, to_bool_or_null, to_float_or_null, to_integer_or_null,
};

/// Failure of a single rule on a single cell.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuleError {
    #[error("unrecognized date '{0}'")]
    Date(String),

    #[error("'{0}' is not an HH:MM:SS time")]
    Time(String),

    #[error("'{0}' is not an HH:MM - HH:MM range")]
    TimeRange(String),
}

/// All available column rules
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ColumnRule {
    /// Keep the value as is
    PassThrough,

    /// Replace every `,` with `.`
    DecimalNormalize,

    /// Rewrite to `YYYY-MM-DD` using a date recipe
    Date { recipe: &'static DateRecipe },

    /// `HH:MM:SS` → `HH:MM`
    TimeOfDay,

    /// Keep non-empty strings only
    TextOnly,

    /// Keep strings that are neither a date, an email nor a number
    PlainText,

    /// Keep strings without digits or boolean literals
    LettersOnly,

    /// Coerce to float
    NumericOnly,

    /// Coerce to integer (fractional values become null)
    IntegerOnly,

    /// Coerce to boolean using the Spanish/English literal tables
    BooleanOnly,

    /// Always null; the column itself is kept
    BlankOut,

    /// Exact-match lookup, unmapped values pass through
    Lookup {
        #[serde(skip)]
        table: &'static [(&'static str, &'static str)],
    },

    /// Validate an `HH:MM - HH:MM` range, `24:00` read as `00:00`
    TimeRange,

    /// Round numeric strings and strip trailing zeros
    RoundTrim { decimals: usize },

    /// `"null"` in any case becomes an empty string
    NullLiteral,

    /// Replace one character with another
    ReplaceChar { from: char, to: char },
}

impl ColumnRule {
    /// Apply this rule to a cell
    pub fn apply(&self, value: &Value) -> Result<Value, RuleError> {
        let out = match self {
            ColumnRule::PassThrough => value.clone(),
            ColumnRule::DecimalNormalize => map_string(value, normalize_decimal),
            ColumnRule::Date { recipe } => {
                return parse_text(value, |text| recipe.parse(text), RuleError::Date)
            }
            ColumnRule::TimeOfDay => return parse_text(value, reformat_time, RuleError::Time),
            ColumnRule::TextOnly => text_only(value),
            ColumnRule::PlainText => {
                if is_plain_text(value) {
                    value.clone()
                } else {
                    Value::Null
                }
            }
            ColumnRule::LettersOnly => letters_only(value),
            ColumnRule::NumericOnly => to_float_or_null(value).map(float_cell).unwrap_or(Value::Null),
            ColumnRule::IntegerOnly => to_integer_or_null(value)
                .map(|n| Value::Number(n.into()))
                .unwrap_or(Value::Null),
            ColumnRule::BooleanOnly => to_bool_or_null(value).map(Value::Bool).unwrap_or(Value::Null),
            ColumnRule::BlankOut => Value::Null,
            ColumnRule::Lookup { table } => match value {
                Value::String(s) => table
                    .iter()
                    .find(|(from, _)| *from == s.as_str())
                    .map(|(_, to)| Value::String(to.to_string()))
                    .unwrap_or_else(|| value.clone()),
                _ => value.clone(),
            },
            ColumnRule::TimeRange => {
                return parse_text(value, normalize_time_range, RuleError::TimeRange)
            }
            ColumnRule::RoundTrim { decimals } => map_string(value, |s| round_trim(s, *decimals)),
            ColumnRule::NullLiteral => match value {
                Value::String(s) if is_null_literal(s) => Value::String(String::new()),
                _ => value.clone(),
            },
            ColumnRule::ReplaceChar { from, to } => {
                map_string(value, |s| s.replace(*from, &to.to_string()))
            }
        };
        Ok(out)
    }

    /// Short label used in logs and listings
    pub fn label(&self) -> &'static str {
        match self {
            ColumnRule::PassThrough => "pass-through",
            ColumnRule::DecimalNormalize => "decimal-normalize",
            ColumnRule::Date { .. } => "date-reformat",
            ColumnRule::TimeOfDay => "time-reformat",
            ColumnRule::TextOnly => "text-only",
            ColumnRule::PlainText => "plain-text",
            ColumnRule::LettersOnly => "letters-only",
            ColumnRule::NumericOnly => "numeric-only",
            ColumnRule::IntegerOnly => "integer-only",
            ColumnRule::BooleanOnly => "boolean-only",
            ColumnRule::BlankOut => "blank-out",
            ColumnRule::Lookup { .. } => "lookup",
            ColumnRule::TimeRange => "time-range",
            ColumnRule::RoundTrim { .. } => "round-trim",
            ColumnRule::NullLiteral => "null-literal",
            ColumnRule::ReplaceChar { .. } => "replace-char",
        }
    }
}

fn map_string(value: &Value, f: impl Fn(&str) -> String) -> Value {
    match value {
        Value::String(s) => Value::String(f(s)),
        _ => value.clone(),
    }
}

/// Run a parser on a cell's text. Null and blank cells are returned as is.
fn parse_text(
    value: &Value,
    parse: impl Fn(&str) -> Option<String>,
    error: fn(String) -> RuleError,
) -> Result<Value, RuleError> {
    match cell_text(value) {
        Some(text) if !text.trim().is_empty() => {
            parse(&text).map(Value::String).ok_or_else(|| error(text))
        }
        _ => Ok(value.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::date::{CenturyPolicy, DateStrategy};
    use serde_json::json;

    const SLASH_DMY: DateRecipe = DateRecipe {
        strategies: &[DateStrategy::Formats { formats: &["%d/%m/%Y"] }],
        century: CenturyPolicy::AlwaysTwentyFirst,
        strip_quotes: false,
        lowercase: false,
    };

    #[test]
    fn test_decimal_normalize() {
        let rule = ColumnRule::DecimalNormalize;
        assert_eq!(rule.apply(&json!("12,5")).unwrap(), json!("12.5"));
        assert_eq!(rule.apply(&Value::Null).unwrap(), Value::Null);
    }

    #[test]
    fn test_date() {
        let rule = ColumnRule::Date { recipe: &SLASH_DMY };
        assert_eq!(rule.apply(&json!("01/04/2025")).unwrap(), json!("2025-04-01"));
        assert_eq!(rule.apply(&Value::Null).unwrap(), Value::Null);
        assert_eq!(rule.apply(&json!("  ")).unwrap(), json!("  "));
        assert_eq!(
            rule.apply(&json!("ayer")),
            Err(RuleError::Date("ayer".to_string()))
        );
    }

    #[test]
    fn test_time_of_day() {
        let rule = ColumnRule::TimeOfDay;
        assert_eq!(rule.apply(&json!("08:30:15")).unwrap(), json!("08:30"));
        assert!(rule.apply(&json!("8h30")).is_err());
    }

    #[test]
    fn test_time_range_midnight() {
        let rule = ColumnRule::TimeRange;
        assert_eq!(rule.apply(&json!("24:00 - 08:00")).unwrap(), json!("00:00 - 08:00"));
        assert_eq!(rule.apply(&json!("00:00 - 08:00")).unwrap(), json!("00:00 - 08:00"));
        assert!(rule.apply(&json!("08:00-16:00")).is_err());
    }

    #[test]
    fn test_lookup_passes_unmapped() {
        const TABLE: &[(&str, &str)] = &[("CS Fraude", "CS_Fraude")];
        let rule = ColumnRule::Lookup { table: TABLE };
        assert_eq!(rule.apply(&json!("CS Fraude")).unwrap(), json!("CS_Fraude"));
        assert_eq!(rule.apply(&json!("Otro LOB")).unwrap(), json!("Otro LOB"));
    }

    #[test]
    fn test_coercions() {
        assert_eq!(ColumnRule::NumericOnly.apply(&json!("7,5")).unwrap(), json!(7.5));
        assert_eq!(ColumnRule::NumericOnly.apply(&json!("x")).unwrap(), Value::Null);
        assert_eq!(ColumnRule::IntegerOnly.apply(&json!("14")).unwrap(), json!(14));
        assert_eq!(ColumnRule::BooleanOnly.apply(&json!("SI")).unwrap(), json!(true));
        assert_eq!(ColumnRule::BlankOut.apply(&json!("08:00")).unwrap(), Value::Null);
        assert_eq!(ColumnRule::PlainText.apply(&json!("42")).unwrap(), Value::Null);
    }

    #[test]
    fn test_null_literal() {
        let rule = ColumnRule::NullLiteral;
        for raw in ["null", "NULL", "Null"] {
            assert_eq!(rule.apply(&json!(raw)).unwrap(), json!(""));
        }
        assert_eq!(rule.apply(&json!("nullable")).unwrap(), json!("nullable"));
    }

    #[test]
    fn test_replace_char() {
        let rule = ColumnRule::ReplaceChar { from: ',', to: ' ' };
        assert_eq!(rule.apply(&json!("tarde, avisa")).unwrap(), json!("tarde  avisa"));
    }

    #[test]
    fn test_serialize_tagged() {
        let json = serde_json::to_value(ColumnRule::RoundTrim { decimals: 2 }).unwrap();
        assert_eq!(json["type"], "round_trim");
        assert_eq!(json["decimals"], 2);
    }
}

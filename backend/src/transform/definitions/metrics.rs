//! Metrics feed (new scheme): fixed 40-column rows, `null` literals cleared.
//!
//! Cells are kept as read; empty cells stay empty strings.

use crate::normalize::date::{CenturyPolicy, DateRecipe, DateStrategy};
use crate::transform::dsl::{ColumnPolicy, ColumnRule, HeaderMode, OnError, Schema, Step, Target};

pub const NAME: &str = "metrics_new_scheme";

pub const COLUMNS: usize = 40;

const DATE_COLUMN: usize = 0;
const BLANKED_COLUMN: usize = 19;
const ROUNDED_COLUMN: usize = 34;

static DATE: DateRecipe = DateRecipe {
    strategies: &[DateStrategy::DayMonthYear],
    century: CenturyPolicy::Pivot50,
    strip_quotes: false,
    lowercase: false,
};

pub fn schema() -> Schema {
    Schema {
        name: NAME,
        aliases: &["limpieza_datos_metrics_New_Escheme", "metrics"],
        description: "Metrics feed: 40 columns, day-month-year dates in column 0, null literals cleared, column 19 blanked, column 34 rounded to 2 decimals",
        header: HeaderMode::FirstRow,
        columns: ColumnPolicy::PadOrTruncate(COLUMNS),
        empty_as_null: false,
        steps: vec![
            Step::apply(DATE_COLUMN, ColumnRule::Date { recipe: &DATE }, OnError::KeepOriginal),
            Step::Apply {
                target: Target::All,
                rule: ColumnRule::NullLiteral,
                on_error: OnError::KeepOriginal,
            },
            Step::apply(BLANKED_COLUMN, ColumnRule::BlankOut, OnError::KeepOriginal),
            Step::apply(
                ROUNDED_COLUMN,
                ColumnRule::RoundTrim { decimals: 2 },
                OnError::KeepOriginal,
            ),
        ],
        write_bom: false,
        preview_column: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::definitions::run_str;
    use serde_json::{json, Value};

    fn line(width: usize, cells: &[(usize, &str)]) -> String {
        (0..width)
            .map(|i| {
                cells
                    .iter()
                    .find(|(index, _)| *index == i)
                    .map(|(_, v)| v.to_string())
                    .unwrap_or_else(|| format!("v{}", i))
            })
            .collect::<Vec<_>>()
            .join(",")
    }

    fn header(width: usize) -> String {
        (0..width).map(|i| format!("h{}", i)).collect::<Vec<_>>().join(",")
    }

    #[test]
    fn test_null_literals_cleared() {
        let csv = format!(
            "{}\n{}\n",
            header(COLUMNS),
            line(COLUMNS, &[(3, "null"), (4, "NULL"), (5, "Null"), (6, " null ")])
        );
        let result = run_str(&schema(), &csv).unwrap();
        let row = &result.rows[0];

        for column in 3..=6 {
            assert_eq!(row[column], json!(""));
        }
        assert_eq!(row[7], json!("v7"));
    }

    #[test]
    fn test_column_19_always_blank() {
        let csv = format!("{}\n{}\n", header(COLUMNS), line(COLUMNS, &[(19, "dato")]));
        let result = run_str(&schema(), &csv).unwrap();
        assert_eq!(result.rows[0][BLANKED_COLUMN], Value::Null);
    }

    #[test]
    fn test_column_34_rounded() {
        let csv = format!(
            "{}\n{}\n{}\n{}\n",
            header(COLUMNS),
            line(COLUMNS, &[(34, "\"3,456\"")]),
            line(COLUMNS, &[(34, "7.00")]),
            line(COLUMNS, &[(34, "n/d")]),
        );
        let result = run_str(&schema(), &csv).unwrap();

        assert_eq!(result.rows[0][ROUNDED_COLUMN], json!("3.46"));
        assert_eq!(result.rows[1][ROUNDED_COLUMN], json!("7"));
        assert_eq!(result.rows[2][ROUNDED_COLUMN], json!("n/d"));
    }

    #[test]
    fn test_dates() {
        let csv = format!(
            "{}\n{}\n{}\n{}\n{}\n",
            header(COLUMNS),
            line(COLUMNS, &[(0, "1-4-2025")]),
            line(COLUMNS, &[(0, "01/abr/87")]),
            line(COLUMNS, &[(0, "2025-04-01")]),
            line(COLUMNS, &[(0, "31-02-2025")]),
        );
        let result = run_str(&schema(), &csv).unwrap();

        assert_eq!(result.rows[0][0], json!("2025-04-01"));
        assert_eq!(result.rows[1][0], json!("1987-04-01"));
        assert_eq!(result.rows[2][0], json!("2025-04-01"));
        assert_eq!(result.rows[3][0], json!("31-02-2025"));
    }

    #[test]
    fn test_rows_padded_and_truncated() {
        let csv = format!(
            "{}\n{}\n{}\n",
            header(45),
            line(10, &[(0, "01-04-2025")]),
            line(45, &[(0, "01-04-2025")]),
        );
        let result = run_str(&schema(), &csv).unwrap();

        assert_eq!(result.header.len(), COLUMNS);
        assert_eq!(result.rows[0].len(), COLUMNS);
        assert_eq!(result.rows[0][10], json!(""));
        assert_eq!(result.rows[1].len(), COLUMNS);
    }
}

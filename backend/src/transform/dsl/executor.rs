//! Schema Executor
//!
//! Shapes raw CSV records into a table according to a schema's header mode
//! and column policy, then runs the schema's steps column by column.

use serde_json::Value;

use super::operations::ColumnRule;
use super::schema::{ColumnPolicy, HeaderMode, OnError, Schema, Step, Target};
use crate::api::logs::{log_info_indent, log_warning, log_warning_indent};
use crate::error::{TransformError, TransformResult};
use crate::normalize::value::{cell_text, is_missing_marker};

/// Row errors printed individually before only the count is reported.
const MAX_LOGGED_ERRORS: usize = 5;

/// Values shown by the preview log.
const PREVIEW_VALUES: usize = 2;

/// Header plus data rows of one file, before any step runs.
#[derive(Debug, Clone)]
pub struct Table {
    pub header: Vec<String>,
    pub rows: Vec<Vec<Value>>,
    /// 1-based record number of each data row in the input.
    pub records: Vec<usize>,
    /// Rows removed before shaping by header-row filters.
    pub dropped: usize,
}

/// Result of executing a schema on a table
#[derive(Debug)]
pub struct Execution {
    /// Output header
    pub header: Vec<String>,
    /// Output rows
    pub rows: Vec<Vec<Value>>,
    /// Cells that could not be normalized and rows that were dropped
    pub errors: Vec<RowError>,
    /// Rows removed by filtering steps
    pub dropped: usize,
}

/// A problem with one cell or row
#[derive(Debug, Clone, PartialEq)]
pub struct RowError {
    /// 1-based record number in the input file
    pub row: usize,
    pub column: String,
    pub message: String,
}

impl Execution {
    /// Check if every cell was handled
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    /// Get summary statistics
    pub fn summary(&self) -> String {
        format!(
            "{} rows written, {} row errors, {} rows dropped",
            self.rows.len(),
            self.errors.len(),
            self.dropped
        )
    }
}

/// Turn raw records into a table, enforcing the schema's column policy.
///
/// Fails with [`TransformError::FileSkipped`] when the file is narrower than
/// the policy's minimum; the width is that of the first record.
///
/// [`Step::DropRowsMatching`] filters run here on the full records, before
/// extra columns are cut. Rows shorter than the header are padded.
pub fn load_table(schema: &Schema, records: Vec<Vec<String>>, file: &str) -> TransformResult<Table> {
    let width = records.first().map(Vec::len).unwrap_or(0);
    if let Some(minimum) = schema.columns.minimum() {
        if width < minimum {
            return Err(TransformError::FileSkipped {
                file: file.to_string(),
                expected: format!("at least {}", minimum),
                found: width,
            });
        }
    }

    let mut records = records.into_iter();
    let (mut header, first_record) = match schema.header {
        HeaderMode::FirstRow => (records.next().unwrap_or_default(), 2),
        HeaderMode::Absent { titles } => (titles.iter().map(|t| t.to_string()).collect(), 1),
    };

    let header_like: Vec<&'static str> = schema
        .steps
        .iter()
        .filter_map(|step| match step {
            Step::DropRowsMatching { values } => Some(values.iter().copied()),
            _ => None,
        })
        .flatten()
        .collect();

    let mut dropped = 0;
    let mut numbers = Vec::new();
    let mut rows: Vec<Vec<Value>> = Vec::new();
    for (i, record) in records.enumerate() {
        if !header_like.is_empty() && record.iter().any(|cell| header_like.contains(&cell.trim())) {
            dropped += 1;
            continue;
        }
        numbers.push(i + first_record);
        rows.push(
            record
                .into_iter()
                .map(|raw| to_cell(raw, schema.empty_as_null))
                .collect(),
        );
    }
    if dropped > 0 {
        log_info_indent(format!("Removed {} header-like row(s)", dropped), 1);
    }

    let pad = if schema.empty_as_null {
        Value::Null
    } else {
        Value::String(String::new())
    };

    match schema.columns {
        ColumnPolicy::Truncate(n) => {
            header.truncate(n);
            for row in &mut rows {
                row.resize(n, Value::Null);
            }
        }
        ColumnPolicy::PadOrTruncate(n) => {
            if header.len() > n {
                log_warning(format!(
                    "{}: header has {} columns, keeping the first {}",
                    file,
                    header.len(),
                    n
                ));
                header.truncate(n);
            }
            for row in &mut rows {
                row.resize(n, pad.clone());
            }
        }
        ColumnPolicy::Sparse | ColumnPolicy::AtLeast(_) => {
            for row in rows.iter_mut().filter(|row| row.len() < header.len()) {
                row.resize(header.len(), Value::Null);
            }
        }
    }

    Ok(Table {
        header,
        rows,
        records: numbers,
        dropped,
    })
}

fn to_cell(raw: String, empty_as_null: bool) -> Value {
    if empty_as_null && is_missing_marker(&raw) {
        Value::Null
    } else {
        Value::String(raw)
    }
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

/// Execute a schema's steps on a table
pub fn execute(schema: &Schema, table: Table) -> Execution {
    let Table {
        mut header,
        rows,
        records,
        mut dropped,
    } = table;

    // (input record number, cells)
    let mut rows: Vec<(usize, Vec<Value>)> = records.into_iter().zip(rows).collect();
    let mut errors = Vec::new();

    for step in &schema.steps {
        let width = rows
            .iter()
            .map(|(_, row)| row.len())
            .max()
            .unwrap_or(0)
            .max(header.len());

        match step {
            Step::Apply {
                target,
                rule,
                on_error,
            } => {
                let columns: Vec<usize> = match target {
                    Target::Index(column) if *column < width => vec![*column],
                    Target::Index(_) => Vec::new(),
                    Target::All => (0..width).collect(),
                };
                for column in columns {
                    let label = column_label(&header, column);
                    let preview = schema.preview_column == Some(column);
                    if preview {
                        log_info_indent(format!("{} before: {:?}", label, sample(&rows, column)), 1);
                    }
                    apply_rule(&mut rows, column, &label, rule, *on_error, &mut errors);
                    if preview {
                        log_info_indent(format!("{} after: {:?}", label, sample(&rows, column)), 1);
                    }
                }
            }

            Step::Rename { names } => {
                for (slot, name) in header.iter_mut().zip(names.iter()) {
                    *slot = name.to_string();
                }
            }

            Step::DropRowsWhereNull { column } => {
                if *column >= width {
                    continue;
                }
                let label = column_label(&header, *column);
                let before = rows.len();
                rows.retain(|(record, row)| {
                    let keep = row.get(*column).is_some_and(|v| !is_blank(v));
                    if !keep {
                        errors.push(RowError {
                            row: *record,
                            column: label.clone(),
                            message: "required value is empty, row dropped".to_string(),
                        });
                    }
                    keep
                });
                dropped += before - rows.len();
            }

            Step::DropRowsMatching { values } => {
                let before = rows.len();
                rows.retain(|(_, row)| {
                    !row.iter().any(|cell| {
                        cell_text(cell).is_some_and(|text| values.contains(&text.trim()))
                    })
                });
                let removed = before - rows.len();
                if removed > 0 {
                    log_info_indent(format!("Removed {} header-like row(s)", removed), 1);
                }
                dropped += removed;
            }

            Step::FillNullFrom { target, source } => {
                for (_, row) in &mut rows {
                    let fill = match (row.get(*target), row.get(*source)) {
                        (Some(Value::Null), Some(value)) if !value.is_null() => value.clone(),
                        _ => continue,
                    };
                    row[*target] = fill;
                }
            }

            Step::DropColumn { column } => {
                if *column < header.len() {
                    header.remove(*column);
                }
                for (_, row) in &mut rows {
                    if *column < row.len() {
                        row.remove(*column);
                    }
                }
            }
        }
    }

    report_errors(&errors);

    Execution {
        header,
        rows: rows.into_iter().map(|(_, row)| row).collect(),
        errors,
        dropped,
    }
}

fn apply_rule(
    rows: &mut [(usize, Vec<Value>)],
    column: usize,
    label: &str,
    rule: &ColumnRule,
    on_error: OnError,
    errors: &mut Vec<RowError>,
) {
    let snapshot: Option<Vec<Option<Value>>> = (on_error == OnError::RevertColumn)
        .then(|| rows.iter().map(|(_, row)| row.get(column).cloned()).collect());

    let mut reverted = false;
    for (record, row) in rows.iter_mut() {
        let Some(cell) = row.get_mut(column) else {
            continue;
        };
        match rule.apply(cell) {
            Ok(value) => *cell = value,
            Err(e) => {
                errors.push(RowError {
                    row: *record,
                    column: label.to_string(),
                    message: e.to_string(),
                });
                match on_error {
                    OnError::KeepOriginal => {}
                    OnError::SetNull => *cell = Value::Null,
                    OnError::RevertColumn => {
                        reverted = true;
                        break;
                    }
                }
            }
        }
    }

    if let (true, Some(snapshot)) = (reverted, snapshot) {
        for ((_, row), original) in rows.iter_mut().zip(snapshot) {
            if let (Some(cell), Some(original)) = (row.get_mut(column), original) {
                *cell = original;
            }
        }
        log_warning(format!(
            "Column '{}' could not be converted ({}), left unchanged",
            label,
            rule.label()
        ));
    }
}

fn column_label(header: &[String], column: usize) -> String {
    header
        .get(column)
        .cloned()
        .unwrap_or_else(|| format!("column {}", column))
}

fn sample(rows: &[(usize, Vec<Value>)], column: usize) -> Vec<String> {
    rows.iter()
        .filter_map(|(_, row)| row.get(column).and_then(cell_text))
        .take(PREVIEW_VALUES)
        .collect()
}

fn report_errors(errors: &[RowError]) {
    if errors.is_empty() {
        return;
    }
    log_warning(format!("{} cell(s) or row(s) could not be processed", errors.len()));
    for error in errors.iter().take(MAX_LOGGED_ERRORS) {
        log_warning_indent(
            format!("row {}, {}: {}", error.row, error.column, error.message),
            1,
        );
    }
    if errors.len() > MAX_LOGGED_ERRORS {
        log_warning_indent(format!("... and {} more", errors.len() - MAX_LOGGED_ERRORS), 1);
    }
}

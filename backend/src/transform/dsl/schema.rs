//! Transform schema definition
//!
//! A schema describes one upstream CSV shape: how the header is found,
//! how many columns a file must have, and the ordered steps applied to it.
//! Columns are addressed by position; renames only change the output header.

use serde::Serialize;

use super::operations::ColumnRule;

/// A complete, immutable transform definition
#[derive(Debug, Clone, Serialize)]
pub struct Schema {
    /// Canonical transform name
    pub name: &'static str,

    /// Alternative names accepted by the registry
    pub aliases: &'static [&'static str],

    /// Human-readable description
    pub description: &'static str,

    /// Where the header comes from
    pub header: HeaderMode,

    /// Column count requirement and row shaping
    pub columns: ColumnPolicy,

    /// Read empty cells and missing-value markers as null
    pub empty_as_null: bool,

    /// Ordered processing steps
    pub steps: Vec<Step>,

    /// Prefix the output with a UTF-8 BOM
    pub write_bom: bool,

    /// Column whose first values are logged before and after its rule
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preview_column: Option<usize>,
}

/// Where a file's header comes from
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HeaderMode {
    /// The first record is the header
    FirstRow,
    /// Every record is data; the header is this fixed list
    Absent { titles: &'static [&'static str] },
}

/// Column count requirement of a transform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "columns", rename_all = "snake_case")]
pub enum ColumnPolicy {
    /// Any width; rules only touch columns that exist
    Sparse,
    /// Skip files narrower than `n`, keep extra columns
    AtLeast(usize),
    /// Skip files narrower than `n`, cut extra columns, pad short rows with null
    Truncate(usize),
    /// Never skip; pad short rows with empty strings, cut long ones
    PadOrTruncate(usize),
}

impl ColumnPolicy {
    /// Minimum width a file must have, if any
    pub fn minimum(&self) -> Option<usize> {
        match self {
            ColumnPolicy::AtLeast(n) | ColumnPolicy::Truncate(n) => Some(*n),
            ColumnPolicy::Sparse | ColumnPolicy::PadOrTruncate(_) => None,
        }
    }

    /// Fixed output width, if any
    pub fn target(&self) -> Option<usize> {
        match self {
            ColumnPolicy::Truncate(n) | ColumnPolicy::PadOrTruncate(n) => Some(*n),
            ColumnPolicy::Sparse | ColumnPolicy::AtLeast(_) => None,
        }
    }
}

/// Columns a rule applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Target {
    Index(usize),
    All,
}

/// What happens to a cell whose rule fails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OnError {
    /// Keep the cell as it was
    KeepOriginal,
    /// Replace the cell with null
    SetNull,
    /// Restore the whole column when any cell fails
    RevertColumn,
}

/// One processing step
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum Step {
    /// Run a rule over one column or all columns
    Apply {
        target: Target,
        rule: ColumnRule,
        on_error: OnError,
    },

    /// Rename the leading columns, in order
    Rename { names: &'static [&'static str] },

    /// Drop rows whose cell in `column` is null or blank
    DropRowsWhereNull { column: usize },

    /// Drop rows where any trimmed cell equals one of `values`
    DropRowsMatching { values: &'static [&'static str] },

    /// Copy `source` into `target` where `target` is null and `source` is not
    FillNullFrom { target: usize, source: usize },

    /// Remove a column from the header and every row
    DropColumn { column: usize },
}

impl Step {
    /// Shorthand for a rule on one column
    pub fn apply(column: usize, rule: ColumnRule, on_error: OnError) -> Self {
        Step::Apply {
            target: Target::Index(column),
            rule,
            on_error,
        }
    }

    /// Shorthand for a total rule on several columns
    pub fn apply_each(columns: &[usize], rule: ColumnRule) -> Vec<Self> {
        columns
            .iter()
            .map(|&column| Step::apply(column, rule.clone(), OnError::KeepOriginal))
            .collect()
    }
}

impl Schema {
    /// Every name this schema answers to, canonical first
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        std::iter::once(self.name).chain(self.aliases.iter().copied())
    }

    /// Pretty JSON rendering of the schema
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Schema {
        Schema {
            name: "sample",
            aliases: &["legacy_sample"],
            description: "Sample schema",
            header: HeaderMode::FirstRow,
            columns: ColumnPolicy::Truncate(3),
            empty_as_null: true,
            steps: vec![
                Step::apply(0, ColumnRule::DecimalNormalize, OnError::KeepOriginal),
                Step::Rename { names: &["a", "b", "c"] },
            ],
            write_bom: false,
            preview_column: None,
        }
    }

    #[test]
    fn test_policy_bounds() {
        assert_eq!(ColumnPolicy::Sparse.minimum(), None);
        assert_eq!(ColumnPolicy::AtLeast(11).minimum(), Some(11));
        assert_eq!(ColumnPolicy::AtLeast(11).target(), None);
        assert_eq!(ColumnPolicy::Truncate(9).target(), Some(9));
        assert_eq!(ColumnPolicy::PadOrTruncate(40).minimum(), None);
    }

    #[test]
    fn test_names() {
        let schema = sample();
        let names: Vec<_> = schema.names().collect();
        assert_eq!(names, vec!["sample", "legacy_sample"]);
    }

    #[test]
    fn test_to_json() {
        let json = sample().to_json().unwrap();
        assert!(json.contains("\"decimal_normalize\""));
        assert!(json.contains("\"rename\""));
    }

    #[test]
    fn test_apply_each() {
        let steps = Step::apply_each(&[5, 6], ColumnRule::BlankOut);
        assert_eq!(steps.len(), 2);
        assert!(matches!(
            steps[1],
            Step::Apply { target: Target::Index(6), on_error: OnError::KeepOriginal, .. }
        ));
    }
}

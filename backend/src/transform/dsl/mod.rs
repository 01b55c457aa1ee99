//! Declarative cleaning rules.
//!
//! - `operations`: column rules applied to single cells
//! - `schema`: transform definitions (header mode, column policy, steps)
//! - `executor`: shapes a file into a table and runs a schema on it
//!
//! ```text
//! CSV records → executor::load_table → executor::execute → cleaned rows
//! ```

pub mod executor;
pub mod operations;
pub mod schema;

pub use executor::{execute, load_table, Execution, RowError, Table};
pub use operations::{ColumnRule, RuleError};
pub use schema::{ColumnPolicy, HeaderMode, OnError, Schema, Step, Target};

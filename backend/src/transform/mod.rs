//! Cleaning transforms.
//!
//! - `dsl`: column rules, schemas and the executor
//! - `definitions`: the built-in schemas
//! - `pipeline`: the `Transform` capability and folder processing

pub mod definitions;
pub mod dsl;
pub mod pipeline;

pub use dsl::*;
pub use pipeline::{
    csv_files, output_name, FileSummary, FolderConfig, ProcessingResult, SchemaTransform,
    Transform, OUTPUT_PREFIX,
};

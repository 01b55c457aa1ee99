//! # Limpieza - batch cleaning of workforce CSV exports
//!
//! Limpieza normalizes heterogeneous CSV exports (RQ, Conexiones, Metrics,
//! Programadas, Topes) into clean, consistently typed CSV files.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │  CSV files  │────▶│   Parser    │────▶│  Transform  │────▶│ procesado_* │
//! │ (ISO/UTF8)  │     │ (auto-enc)  │     │  (schemas)  │     │  (+ .zip)   │
//! └─────────────┘     └─────────────┘     └─────────────┘     └─────────────┘
//!                                               ▲
//!                          Registry ── Dispatcher
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::path::PathBuf;
//! use std::sync::Arc;
//! use limpieza::{Dispatcher, TransformRegistry};
//!
//! let registry = Arc::new(TransformRegistry::with_builtin());
//! let dispatcher = Dispatcher::new(registry, "salida");
//! let outputs = dispatcher.run("topes", &[PathBuf::from("topes.csv")])?;
//! println!("{} file(s) cleaned", outputs.len());
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Hierarchical error types
//! - [`config`] - Server configuration from the environment
//! - [`parser`] - CSV reading with encoding detection, CSV writing
//! - [`normalize`] - Date, time and value normalization
//! - [`transform`] - Rules, schemas, executor and built-in transforms
//! - [`registry`] - Transforms by name
//! - [`dispatch`] - Batch runs with per-file isolation
//! - [`archive`] - ZIP packaging of results
//! - [`api`] - HTTP API server and log streaming

// Core modules
pub mod config;
pub mod error;

// Parsing
pub mod parser;

// Normalization
pub mod normalize;

// Transformation
pub mod transform;

// Lookup and batch runs
pub mod dispatch;
pub mod registry;

// Packaging
pub mod archive;

// HTTP API
pub mod api;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{
    ArchiveError, CsvError, DispatchError, DispatchResult, ServerError, TransformError,
    TransformResult,
};

// =============================================================================
// Re-exports - CSV Parsing
// =============================================================================

pub use parser::{
    decode_content, detect_encoding, parse_bytes, read_csv_file, render_cell, write_csv_file,
    RawTable,
};

// =============================================================================
// Re-exports - Normalization
// =============================================================================

pub use normalize::{normalize_clock, normalize_date, normalize_time_range, reformat_time};

// =============================================================================
// Re-exports - DSL
// =============================================================================

pub use transform::dsl::{
    execute, load_table, ColumnPolicy, ColumnRule, Execution, HeaderMode, OnError, RowError,
    Schema, Step, Target,
};

// =============================================================================
// Re-exports - Transforms
// =============================================================================

pub use transform::pipeline::{
    FileSummary, FolderConfig, ProcessingResult, SchemaTransform, Transform,
};

// =============================================================================
// Re-exports - Registry and dispatcher
// =============================================================================

pub use dispatch::{BatchReport, Dispatcher, FileOutcome};
pub use registry::{TransformInfo, TransformRegistry};

// =============================================================================
// Re-exports - Archive
// =============================================================================

pub use archive::{archive_name, zip_outputs};

// =============================================================================
// Re-exports - API
// =============================================================================

pub use api::types::{error_response, FailedFile, ProcessedFile, TransformListResponse, UploadResponse};
pub use config::ServerConfig;

// Server
pub mod server {
    pub use crate::api::server::start_server;
}

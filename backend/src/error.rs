//! Error types for the cleaning pipeline.
//!
//! This module defines a hierarchy of error types:
//!
//! - [`CsvError`] - reading, decoding and writing CSV files
//! - [`TransformError`] - file-level failures of a single transform
//! - [`DispatchError`] - invocation-level and per-file dispatcher failures
//! - [`ArchiveError`] - ZIP packaging of outputs
//! - [`ServerError`] - HTTP surface and configuration
//!
//! Row-level problems are not errors at this level: they are collected as
//! [`crate::transform::dsl::RowError`] records and logged.
//!
//! Error conversion is automatic via `From` implementations,
//! allowing `?` to work across error boundaries.

use std::path::PathBuf;
use thiserror::Error;

// =============================================================================
// CSV Errors
// =============================================================================

/// Errors while reading or writing CSV files.
#[derive(Debug, Error)]
pub enum CsvError {
    /// Failed to read or write the file.
    #[error("Failed to access file: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed CSV content.
    #[error("Invalid CSV format: {0}")]
    Csv(#[from] csv::Error),

    /// Empty file (no header, no rows).
    #[error("CSV file is empty")]
    EmptyFile,
}

// =============================================================================
// Transform Errors
// =============================================================================

/// File-level errors of a transform.
#[derive(Debug, Error)]
pub enum TransformError {
    /// The file does not have the column count the transform requires.
    #[error("File '{file}' skipped: expected {expected} columns, found {found}")]
    FileSkipped {
        file: String,
        expected: String,
        found: usize,
    },

    /// CSV error while reading the input or writing the output.
    #[error("CSV error: {0}")]
    Csv(#[from] CsvError),

    /// Filesystem error outside CSV handling (directory listing, ...).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

// =============================================================================
// Dispatch Errors
// =============================================================================

/// Errors raised by the transform dispatcher.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// No transform registered under the requested name.
    #[error("Unknown transform: {0}")]
    UnknownTransform(String),

    /// The transform ran but its conventional output file is absent.
    #[error("Transform did not produce the expected file: {}", .0.display())]
    MissingOutput(PathBuf),

    /// The transform produced a zero-byte output file.
    #[error("Output file is empty: {}", .0.display())]
    EmptyOutput(PathBuf),

    /// The transform itself failed on a file.
    #[error("Transform error: {0}")]
    Transform(#[from] TransformError),

    /// Filesystem error while staging or moving outputs.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

// =============================================================================
// Archive Errors
// =============================================================================

/// Errors while packaging outputs into a ZIP archive.
#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("Archive IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// Nothing to archive.
    #[error("No files to archive")]
    Empty,
}

// =============================================================================
// Server Errors
// =============================================================================

/// HTTP server and configuration errors.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Dispatcher error.
    #[error("Processing error: {0}")]
    Dispatch(#[from] DispatchError),

    /// Archive error.
    #[error("Archive error: {0}")]
    Archive(#[from] ArchiveError),

    /// Invalid configuration value.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Invalid request.
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Requested file does not exist.
    #[error("File not found: {0}")]
    NotFound(String),

    /// Server internal error.
    #[error("Internal server error: {0}")]
    Internal(String),

    /// IO error.
    #[error("Server IO error: {0}")]
    Io(#[from] std::io::Error),
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for CSV operations.
pub type CsvResult<T> = Result<T, CsvError>;

/// Result type for transform operations.
pub type TransformResult<T> = Result<T, TransformError>;

/// Result type for dispatcher operations.
pub type DispatchResult<T> = Result<T, DispatchError>;

/// Result type for archive operations.
pub type ArchiveResult<T> = Result<T, ArchiveError>;

/// Result type for server operations.
pub type ServerResult<T> = Result<T, ServerError>;

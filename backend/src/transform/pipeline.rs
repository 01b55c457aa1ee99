//! Transform capability and folder processing.
//!
//! Every transform cleans one file at a time through [`Transform::clean_file`];
//! [`Transform::process`] runs it over all `*.csv` files of an input folder,
//! writing `limpio_<name>` next to each other in the output folder and
//! carrying on after failed files.
//!
//! # Example
//!
//! ```rust,ignore
//! use limpieza::transform::definitions::topes;
//! use limpieza::transform::pipeline::{FolderConfig, SchemaTransform, Transform};
//!
//! let transform = SchemaTransform::new(topes::schema());
//! let results = transform.process(&FolderConfig::new("entrada", "salida"))?;
//! println!("{} file(s) handled", results.len());
//! ```

use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

use super::dsl::{execute, load_table, Schema};
use crate::api::logs::{log_error, log_info, log_success, log_success_indent, log_warning};
use crate::error::{TransformError, TransformResult};
use crate::parser::{read_csv_file, write_csv_file};

/// Prefix of the file a transform writes for each input.
pub const OUTPUT_PREFIX: &str = "limpio_";

/// Input and output folders of one transform run.
#[derive(Debug, Clone)]
pub struct FolderConfig {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
}

impl FolderConfig {
    pub fn new(input_dir: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            input_dir: input_dir.into(),
            output_dir: output_dir.into(),
        }
    }
}

/// Statistics of one cleaned file.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileSummary {
    pub rows_written: usize,
    pub row_errors: usize,
    pub rows_dropped: usize,
    /// Detected input encoding
    pub encoding: String,
}

/// Outcome of one input file.
#[derive(Debug)]
pub enum ProcessingResult {
    Written {
        input: PathBuf,
        output: PathBuf,
        summary: FileSummary,
    },
    Failed {
        input: PathBuf,
        reason: String,
    },
}

impl ProcessingResult {
    pub fn input(&self) -> &Path {
        match self {
            ProcessingResult::Written { input, .. } | ProcessingResult::Failed { input, .. } => input,
        }
    }

    /// Path of the written file, if any
    pub fn output(&self) -> Option<&Path> {
        match self {
            ProcessingResult::Written { output, .. } => Some(output),
            ProcessingResult::Failed { .. } => None,
        }
    }
}

/// Conventional output file name for an input file name.
pub fn output_name(file_name: &str) -> String {
    format!("{}{}", OUTPUT_PREFIX, file_name)
}

/// `*.csv` files of a folder (extension case-insensitive), sorted by name.
pub fn csv_files(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| {
            path.is_file()
                && path
                    .extension()
                    .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"))
        })
        .collect();
    files.sort();
    Ok(files)
}

pub(crate) fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// A named cleaning transform.
pub trait Transform: Send + Sync {
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    /// Declarative definition, for transforms that have one
    fn schema(&self) -> Option<&Schema> {
        None
    }

    /// Clean one file into `output`.
    ///
    /// Nothing is left at `output` when this fails.
    fn clean_file(&self, input: &Path, output: &Path) -> TransformResult<FileSummary>;

    /// Clean every CSV file of `folders.input_dir`.
    ///
    /// Only listing the input folder or creating the output folder can fail
    /// the whole run; per-file failures are logged and reported.
    fn process(&self, folders: &FolderConfig) -> TransformResult<Vec<ProcessingResult>> {
        log_info(format!("🚀 {}: processing {}", self.name(), folders.input_dir.display()));
        let inputs = csv_files(&folders.input_dir)?;
        fs::create_dir_all(&folders.output_dir)?;

        let mut results = Vec::with_capacity(inputs.len());
        for input in inputs {
            let output = folders.output_dir.join(output_name(&file_label(&input)));
            match self.clean_file(&input, &output) {
                Ok(summary) => results.push(ProcessingResult::Written {
                    input,
                    output,
                    summary,
                }),
                Err(e) => {
                    report_failure(&input, &e);
                    results.push(ProcessingResult::Failed {
                        input,
                        reason: e.to_string(),
                    });
                }
            }
        }

        let written = results.iter().filter(|r| r.output().is_some()).count();
        log_success(format!("{}: {} of {} file(s) cleaned", self.name(), written, results.len()));
        Ok(results)
    }
}

/// Log a file-level failure; schema mismatches are warnings.
pub(crate) fn report_failure(input: &Path, error: &TransformError) {
    match error {
        TransformError::FileSkipped { .. } => log_warning(error.to_string()),
        _ => log_error(format!("Error processing {}: {}", file_label(input), error)),
    }
}

/// A transform driven by a declarative [`Schema`].
#[derive(Debug, Clone)]
pub struct SchemaTransform {
    schema: Schema,
}

impl SchemaTransform {
    pub fn new(schema: Schema) -> Self {
        Self { schema }
    }
}

impl Transform for SchemaTransform {
    fn name(&self) -> &str {
        self.schema.name
    }

    fn description(&self) -> &str {
        self.schema.description
    }

    fn schema(&self) -> Option<&Schema> {
        Some(&self.schema)
    }

    fn clean_file(&self, input: &Path, output: &Path) -> TransformResult<FileSummary> {
        let file = file_label(input);
        log_info(format!("📄 Processing {}", file));

        let raw = read_csv_file(input)?;
        let table = load_table(&self.schema, raw.records, &file)?;
        let execution = execute(&self.schema, table);

        if let Err(e) = write_csv_file(output, &execution.header, &execution.rows, self.schema.write_bom) {
            let _ = fs::remove_file(output);
            return Err(e.into());
        }

        log_success_indent(format!("{} → {} ({})", file, file_label(output), execution.summary()), 1);
        Ok(FileSummary {
            rows_written: execution.rows.len(),
            row_errors: execution.errors.len(),
            rows_dropped: execution.dropped,
            encoding: raw.encoding,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::definitions::{conexiones, metrics, topes};
    use tempfile::tempdir;

    const TOPES_ROW: &str = "Soporte,ana@example.com,Ventas,14,01/04/2025,08:00,16:00,24:00 - 08:00,\"7,5\"";

    #[test]
    fn test_output_name() {
        assert_eq!(output_name("topes.csv"), "limpio_topes.csv");
    }

    #[test]
    fn test_csv_files_filter() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("b.csv"), "x").unwrap();
        fs::write(dir.path().join("a.CSV"), "x").unwrap();
        fs::write(dir.path().join("notas.txt"), "x").unwrap();
        fs::create_dir(dir.path().join("sub.csv")).unwrap();

        let files = csv_files(dir.path()).unwrap();
        let names: Vec<_> = files.iter().map(|p| file_label(p)).collect();
        assert_eq!(names, vec!["a.CSV", "b.csv"]);
    }

    #[test]
    fn test_topes_end_to_end() {
        let input = tempdir().unwrap();
        let output = tempdir().unwrap();
        fs::write(input.path().join("topes.csv"), format!("{}\n", TOPES_ROW)).unwrap();

        let transform = SchemaTransform::new(topes::schema());
        let results = transform
            .process(&FolderConfig::new(input.path(), output.path()))
            .unwrap();

        assert_eq!(results.len(), 1);
        let written = fs::read_to_string(output.path().join("limpio_topes.csv")).unwrap();
        assert_eq!(
            written,
            "SM,agent_email,LOB,Week,fecha,Inicio_Turno,Salida_Turno,Horario_Rooster,Total_horas\n\
             Soporte,ana@example.com,Ventas,14,2025-04-01,,,00:00 - 08:00,7.5\n"
        );
    }

    #[test]
    fn test_skipped_file_produces_no_output() {
        let input = tempdir().unwrap();
        let output = tempdir().unwrap();
        fs::write(input.path().join("corto.csv"), "a,b,c,14,01/04/2025,x,y,08:00 - 16:00\n").unwrap();
        fs::write(input.path().join("largo.csv"), format!("{},extra\n", TOPES_ROW)).unwrap();

        let transform = SchemaTransform::new(topes::schema());
        let results = transform
            .process(&FolderConfig::new(input.path(), output.path()))
            .unwrap();

        assert!(matches!(&results[0], ProcessingResult::Failed { reason, .. } if reason.contains("corto.csv")));
        assert!(results[1].output().is_some());
        assert_eq!(fs::read_dir(output.path()).unwrap().count(), 1);

        let written = fs::read_to_string(output.path().join("limpio_largo.csv")).unwrap();
        assert!(written.lines().all(|l| l.split(',').count() == 9));
    }

    #[test]
    fn test_header_only_file_still_written() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("vacio.csv");
        let output = dir.path().join("limpio_vacio.csv");
        fs::write(&input, (0..11).map(|i| format!("h{}", i)).collect::<Vec<_>>().join(",")).unwrap();

        let summary = SchemaTransform::new(conexiones::schema())
            .clean_file(&input, &output)
            .unwrap();

        assert_eq!(summary.rows_written, 0);
        let written = fs::read_to_string(&output).unwrap();
        assert!(written.starts_with('\u{feff}'));
        assert!(written.contains("status_start_time"));
    }

    #[test]
    fn test_metrics_cells_rendered() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("metrics.csv");
        let output = dir.path().join("limpio_metrics.csv");
        let header: Vec<String> = (0..40).map(|i| format!("h{}", i)).collect();
        let mut row: Vec<String> = (0..40).map(|i| format!("v{}", i)).collect();
        row[0] = "01-04-2025".to_string();
        row[2] = "NULL".to_string();
        fs::write(&input, format!("{}\n{}\n", header.join(","), row.join(","))).unwrap();

        SchemaTransform::new(metrics::schema())
            .clean_file(&input, &output)
            .unwrap();

        let written = fs::read_to_string(&output).unwrap();
        let cells: Vec<&str> = written.lines().nth(1).unwrap().split(',').collect();
        assert_eq!(cells.len(), 40);
        assert_eq!(cells[0], "2025-04-01");
        assert_eq!(cells[2], "");
        assert_eq!(cells[19], "");
        assert_eq!(cells[20], "v20");
    }

    #[test]
    fn test_missing_input_folder_fails() {
        let dir = tempdir().unwrap();
        let transform = SchemaTransform::new(topes::schema());
        let result = transform.process(&FolderConfig::new(dir.path().join("nada"), dir.path()));
        assert!(matches!(result, Err(TransformError::Io(_))));
    }
}

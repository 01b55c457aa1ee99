//! Batch dispatcher.
//!
//! Resolves a transform by name and runs it over a list of input files.
//! Each file is cleaned to `limpio_<name>` in the output folder, checked,
//! then moved to `procesado_(<timestamp>)_<sanitized name>`. A failed file
//! is logged and reported without stopping the batch. If the batch itself
//! does not complete, every output it produced is deleted.

use chrono::Local;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::api::logs::{log_error, log_info, log_success, log_warning};
use crate::error::{DispatchError, DispatchResult, TransformError};
use crate::registry::TransformRegistry;
use crate::transform::pipeline::{file_label, output_name, report_failure, FileSummary, Transform};

/// Timestamp embedded in final output names.
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Prefix of final output names.
pub const PROCESSED_PREFIX: &str = "procesado_";

/// Outcome of one input file of a batch
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum FileOutcome {
    Processed {
        input: PathBuf,
        output: PathBuf,
        summary: FileSummary,
    },
    Failed {
        input: PathBuf,
        reason: String,
    },
}

/// Per-file report of a batch
#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub transform: String,
    pub outcomes: Vec<FileOutcome>,
}

impl BatchReport {
    /// Paths of the produced files, in input order
    pub fn outputs(&self) -> Vec<PathBuf> {
        self.outcomes
            .iter()
            .filter_map(|o| match o {
                FileOutcome::Processed { output, .. } => Some(output.clone()),
                FileOutcome::Failed { .. } => None,
            })
            .collect()
    }

    /// Inputs that failed, with the reason
    pub fn failures(&self) -> Vec<(&Path, &str)> {
        self.outcomes
            .iter()
            .filter_map(|o| match o {
                FileOutcome::Failed { input, reason } => Some((input.as_path(), reason.as_str())),
                FileOutcome::Processed { .. } => None,
            })
            .collect()
    }

    pub fn processed_count(&self) -> usize {
        self.outcomes.len() - self.failures().len()
    }
}

/// Deletes tracked outputs on drop unless committed.
#[derive(Default)]
struct OutputGuard {
    paths: Vec<PathBuf>,
    committed: bool,
}

impl OutputGuard {
    fn track(&mut self, path: PathBuf) {
        self.paths.push(path);
    }

    fn commit(mut self) {
        self.committed = true;
    }
}

impl Drop for OutputGuard {
    fn drop(&mut self) {
        if self.committed || self.paths.is_empty() {
            return;
        }
        log_warning(format!("Batch aborted, removing {} output file(s)", self.paths.len()));
        for path in &self.paths {
            let _ = fs::remove_file(path);
        }
    }
}

/// Runs registered transforms over batches of files
#[derive(Debug, Clone)]
pub struct Dispatcher {
    registry: Arc<TransformRegistry>,
    output_dir: PathBuf,
}

impl Dispatcher {
    pub fn new(registry: Arc<TransformRegistry>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            registry,
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn registry(&self) -> &TransformRegistry {
        &self.registry
    }

    /// Run `transform_name` over `inputs`, returning the produced files.
    ///
    /// Failed files are logged and left out of the result.
    pub fn run(&self, transform_name: &str, inputs: &[PathBuf]) -> DispatchResult<Vec<PathBuf>> {
        self.run_detailed(transform_name, inputs)
            .map(|report| report.outputs())
    }

    /// Run `transform_name` over `inputs` with one outcome per input.
    pub fn run_detailed(&self, transform_name: &str, inputs: &[PathBuf]) -> DispatchResult<BatchReport> {
        let transform = self
            .registry
            .get(transform_name)
            .ok_or_else(|| DispatchError::UnknownTransform(transform_name.to_string()))?;

        log_info(format!(
            "⚙️  Running '{}' on {} file(s)",
            transform.name(),
            inputs.len()
        ));
        fs::create_dir_all(&self.output_dir)?;

        let stamp = Local::now().format(TIMESTAMP_FORMAT).to_string();
        let mut guard = OutputGuard::default();
        let mut outcomes = Vec::with_capacity(inputs.len());

        for input in inputs {
            match self.process_file(transform.as_ref(), input, &stamp) {
                Ok((output, summary)) => {
                    guard.track(output.clone());
                    outcomes.push(FileOutcome::Processed {
                        input: input.clone(),
                        output,
                        summary,
                    });
                }
                Err(e) => {
                    match &e {
                        DispatchError::Transform(inner) => report_failure(input, inner),
                        other => log_error(format!("Error processing {}: {}", file_label(input), other)),
                    }
                    outcomes.push(FileOutcome::Failed {
                        input: input.clone(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        guard.commit();
        let report = BatchReport {
            transform: transform.name().to_string(),
            outcomes,
        };
        log_success(format!(
            "{} of {} file(s) processed with '{}'",
            report.processed_count(),
            inputs.len(),
            report.transform
        ));
        Ok(report)
    }

    fn process_file(
        &self,
        transform: &dyn Transform,
        input: &Path,
        stamp: &str,
    ) -> DispatchResult<(PathBuf, FileSummary)> {
        if !input.is_file() {
            return Err(TransformError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("{} is not a file", input.display()),
            ))
            .into());
        }

        let file_name = file_label(input);
        let staged = self.output_dir.join(output_name(&file_name));
        let summary = transform.clean_file(input, &staged)?;

        let Ok(metadata) = fs::metadata(&staged) else {
            return Err(DispatchError::MissingOutput(staged));
        };
        if metadata.len() == 0 {
            let _ = fs::remove_file(&staged);
            return Err(DispatchError::EmptyOutput(staged));
        }

        let target = unique_path(self.output_dir.join(processed_name(stamp, &file_name)));
        if let Err(e) = fs::rename(&staged, &target) {
            let _ = fs::remove_file(&staged);
            return Err(e.into());
        }
        Ok((target, summary))
    }
}

/// Final name of a processed file.
pub fn processed_name(stamp: &str, file_name: &str) -> String {
    format!("{}({})_{}", PROCESSED_PREFIX, stamp, sanitize_filename(file_name))
}

/// Make a file name safe for any filesystem.
///
/// Spanish accents are folded to ASCII, whitespace becomes `_`, anything but
/// ASCII alphanumerics, `.`, `-` and `_` is dropped, and leading or trailing
/// dots and underscores are trimmed.
pub fn sanitize_filename(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .filter_map(|c| match c {
            'á' | 'à' | 'ä' | 'â' => Some('a'),
            'é' | 'è' | 'ë' | 'ê' => Some('e'),
            'í' | 'ì' | 'ï' | 'î' => Some('i'),
            'ó' | 'ò' | 'ö' | 'ô' => Some('o'),
            'ú' | 'ù' | 'ü' | 'û' => Some('u'),
            'ñ' => Some('n'),
            'Á' | 'À' | 'Ä' | 'Â' => Some('A'),
            'É' | 'È' | 'Ë' | 'Ê' => Some('E'),
            'Í' | 'Ì' | 'Ï' | 'Î' => Some('I'),
            'Ó' | 'Ò' | 'Ö' | 'Ô' => Some('O'),
            'Ú' | 'Ù' | 'Ü' | 'Û' => Some('U'),
            'Ñ' => Some('N'),
            c if c.is_whitespace() => Some('_'),
            c if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') => Some(c),
            _ => None,
        })
        .collect();

    let trimmed = cleaned.trim_matches(|c| c == '.' || c == '_');
    if trimmed.is_empty() {
        "archivo".to_string()
    } else {
        trimmed.to_string()
    }
}

/// `path`, or `stem_N.ext` with the first free `N`.
fn unique_path(path: PathBuf) -> PathBuf {
    if !path.exists() {
        return path;
    }
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let extension = path
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();
    let parent = path.parent().map(Path::to_path_buf).unwrap_or_default();

    (1..)
        .map(|n| parent.join(format!("{}_{}{}", stem, n, extension)))
        .find(|candidate| !candidate.exists())
        .unwrap_or(path)
}

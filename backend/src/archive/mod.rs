//! ZIP packaging of cleaned files.

use chrono::Local;
use std::collections::HashSet;
use std::fs::{self, File};
use std::io::{self, BufWriter};
use std::path::{Path, PathBuf};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::api::logs::{log_info, log_success};
use crate::error::{ArchiveError, ArchiveResult};

/// Archive name for a batch finished now: `resultados_<YYYYmmdd_HHMMSS>.zip`
pub fn archive_name() -> String {
    format!("resultados_{}.zip", Local::now().format("%Y%m%d_%H%M%S"))
}

/// Write every file of `paths` into a new ZIP at `dest`, each stored under
/// its base name. Repeated base names get a `_N` suffix.
///
/// A partially written archive is removed on failure.
pub fn zip_outputs(paths: &[PathBuf], dest: &Path) -> ArchiveResult<PathBuf> {
    if paths.is_empty() {
        return Err(ArchiveError::Empty);
    }
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent)?;
    }

    log_info(format!("📦 Packaging {} file(s) into {}", paths.len(), dest.display()));
    match write_archive(paths, dest) {
        Ok(()) => {
            log_success(format!("Archive ready: {}", dest.display()));
            Ok(dest.to_path_buf())
        }
        Err(e) => {
            let _ = fs::remove_file(dest);
            Err(e)
        }
    }
}

fn write_archive(paths: &[PathBuf], dest: &Path) -> ArchiveResult<()> {
    let mut zip = ZipWriter::new(BufWriter::new(File::create(dest)?));
    let options: FileOptions<'_, ()> =
        FileOptions::default().compression_method(CompressionMethod::Deflated);

    let mut used = HashSet::new();
    for path in paths {
        let name = entry_name(path, &mut used);
        zip.start_file(name, options)?;
        let mut source = File::open(path)?;
        io::copy(&mut source, &mut zip)?;
    }

    zip.finish()?;
    Ok(())
}

fn entry_name(path: &Path, used: &mut HashSet<String>) -> String {
    let base = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "archivo.csv".to_string());
    if used.insert(base.clone()) {
        return base;
    }

    let (stem, ext) = match base.rsplit_once('.') {
        Some((stem, ext)) => (stem.to_string(), format!(".{}", ext)),
        None => (base.clone(), String::new()),
    };
    let mut n = 1;
    loop {
        let candidate = format!("{}_{}{}", stem, n, ext);
        if used.insert(candidate.clone()) {
            return candidate;
        }
        n += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;
    use tempfile::tempdir;
    use zip::ZipArchive;

    fn entries(archive: &Path) -> Vec<(String, String)> {
        let mut zip = ZipArchive::new(File::open(archive).unwrap()).unwrap();
        (0..zip.len())
            .map(|i| {
                let mut file = zip.by_index(i).unwrap();
                let mut content = String::new();
                file.read_to_string(&mut content).unwrap();
                (file.name().to_string(), content)
            })
            .collect()
    }

    #[test]
    fn test_zip_outputs_base_names() {
        let dir = tempdir().unwrap();
        let nested = dir.path().join("salida");
        fs::create_dir(&nested).unwrap();
        let a = nested.join("procesado_(20250401_083000)_rq.csv");
        let b = dir.path().join("topes.csv");
        fs::write(&a, "a,b\n1,2\n").unwrap();
        fs::write(&b, "SM,LOB\n").unwrap();

        let dest = dir.path().join("zips").join("resultados.zip");
        let written = zip_outputs(&[a, b], &dest).unwrap();

        assert_eq!(written, dest);
        assert_eq!(
            entries(&dest),
            vec![
                ("procesado_(20250401_083000)_rq.csv".to_string(), "a,b\n1,2\n".to_string()),
                ("topes.csv".to_string(), "SM,LOB\n".to_string()),
            ]
        );
    }

    #[test]
    fn test_duplicate_base_names() {
        let first = tempdir().unwrap();
        let second = tempdir().unwrap();
        let a = first.path().join("rq.csv");
        let b = second.path().join("rq.csv");
        fs::write(&a, "1\n").unwrap();
        fs::write(&b, "2\n").unwrap();

        let dest = first.path().join("out.zip");
        zip_outputs(&[a, b], &dest).unwrap();

        let names: Vec<String> = entries(&dest).into_iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["rq.csv", "rq_1.csv"]);
    }

    #[test]
    fn test_empty_and_missing_inputs() {
        let dir = tempdir().unwrap();
        let dest = dir.path().join("out.zip");

        assert!(matches!(zip_outputs(&[], &dest), Err(ArchiveError::Empty)));

        let result = zip_outputs(&[dir.path().join("no_existe.csv")], &dest);
        assert!(matches!(result, Err(ArchiveError::Io(_))));
        assert!(!dest.exists());
    }

    #[test]
    fn test_archive_name() {
        let name = archive_name();
        assert!(name.starts_with("resultados_"));
        assert!(name.ends_with(".zip"));
        assert_eq!(name.len(), "resultados_20250401_083000.zip".len());
    }
}

//! Server configuration from the environment.
//!
//! | Variable                 | Default | Meaning                              |
//! |--------------------------|---------|--------------------------------------|
//! | `LIMPIEZA_PORT`          | 3000    | HTTP port                            |
//! | `LIMPIEZA_MAX_UPLOAD_MB` | 160     | Request body limit, in megabytes     |
//! | `LIMPIEZA_WORK_DIR`      | unset   | Parent of the upload/download areas  |
//!
//! Without `LIMPIEZA_WORK_DIR` the areas live in a temporary directory that
//! is removed when the [`WorkArea`] is dropped.

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use crate::error::{ServerError, ServerResult};

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_MAX_UPLOAD_MB: usize = 160;

pub const PORT_VAR: &str = "LIMPIEZA_PORT";
pub const MAX_UPLOAD_VAR: &str = "LIMPIEZA_MAX_UPLOAD_MB";
pub const WORK_DIR_VAR: &str = "LIMPIEZA_WORK_DIR";

/// HTTP server settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub port: u16,
    pub max_upload_mb: usize,
    pub work_dir: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            max_upload_mb: DEFAULT_MAX_UPLOAD_MB,
            work_dir: None,
        }
    }
}

impl ServerConfig {
    /// Read the configuration from process environment variables.
    pub fn from_env() -> ServerResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read the configuration through `lookup`; blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> ServerResult<Self> {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let port = match get(PORT_VAR) {
            Some(raw) => raw
                .parse::<u16>()
                .ok()
                .filter(|p| *p != 0)
                .ok_or_else(|| ServerError::Config(format!("{} must be a port number, got '{}'", PORT_VAR, raw)))?,
            None => DEFAULT_PORT,
        };

        let max_upload_mb = match get(MAX_UPLOAD_VAR) {
            Some(raw) => raw
                .parse::<usize>()
                .ok()
                .filter(|mb| *mb > 0)
                .ok_or_else(|| {
                    ServerError::Config(format!("{} must be a positive integer, got '{}'", MAX_UPLOAD_VAR, raw))
                })?,
            None => DEFAULT_MAX_UPLOAD_MB,
        };

        Ok(Self {
            port,
            max_upload_mb,
            work_dir: get(WORK_DIR_VAR).map(PathBuf::from),
        })
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Body limit in bytes
    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_mb.saturating_mul(1024 * 1024)
    }

    /// Create the upload and download folders.
    pub fn work_area(&self) -> ServerResult<WorkArea> {
        match &self.work_dir {
            Some(dir) => WorkArea::create(dir, None),
            None => {
                let temp = tempfile::Builder::new().prefix("limpieza_").tempdir()?;
                let root = temp.path().to_path_buf();
                WorkArea::create(&root, Some(temp))
            }
        }
    }
}

/// Upload and download folders of a running server
#[derive(Debug)]
pub struct WorkArea {
    pub upload_dir: PathBuf,
    pub download_dir: PathBuf,
    temp: Option<TempDir>,
}

impl WorkArea {
    fn create(root: &Path, temp: Option<TempDir>) -> ServerResult<Self> {
        let upload_dir = root.join("uploads");
        let download_dir = root.join("downloads");
        fs::create_dir_all(&upload_dir)?;
        fs::create_dir_all(&download_dir)?;
        Ok(Self {
            upload_dir,
            download_dir,
            temp,
        })
    }

    /// Whether the area is removed on drop
    pub fn is_temporary(&self) -> bool {
        self.temp.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ServerConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, ServerConfig::default());
        assert_eq!(config.max_upload_bytes(), 160 * 1024 * 1024);
    }

    #[test]
    fn test_values_read() {
        let config = ServerConfig::from_lookup(lookup(&[
            (PORT_VAR, " 8080 "),
            (MAX_UPLOAD_VAR, "20"),
            (WORK_DIR_VAR, "/srv/limpieza"),
        ]))
        .unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.max_upload_mb, 20);
        assert_eq!(config.work_dir, Some(PathBuf::from("/srv/limpieza")));
    }

    #[test]
    fn test_blank_is_unset() {
        let config = ServerConfig::from_lookup(lookup(&[(PORT_VAR, ""), (WORK_DIR_VAR, "  ")])).unwrap();
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.work_dir, None);
    }

    #[test]
    fn test_invalid_values() {
        let cases = [
            (PORT_VAR, "http"),
            (PORT_VAR, "0"),
            (PORT_VAR, "70000"),
            (MAX_UPLOAD_VAR, "-1"),
            (MAX_UPLOAD_VAR, "0"),
        ];
        for (key, value) in cases {
            let err = ServerConfig::from_lookup(lookup(&[(key, value)])).unwrap_err();
            assert!(matches!(err, ServerError::Config(ref msg) if msg.contains(key)));
        }
    }

    #[test]
    fn test_work_area_in_configured_dir() {
        let dir = tempfile::tempdir().unwrap();
        let config = ServerConfig {
            work_dir: Some(dir.path().join("trabajo")),
            ..ServerConfig::default()
        };
        let area = config.work_area().unwrap();
        assert!(area.upload_dir.is_dir());
        assert!(area.download_dir.is_dir());
        assert!(!area.is_temporary());
    }

    #[test]
    fn test_temporary_work_area_removed() {
        let area = ServerConfig::default().work_area().unwrap();
        let upload = area.upload_dir.clone();
        assert!(area.is_temporary());
        assert!(upload.is_dir());
        drop(area);
        assert!(!upload.exists());
    }
}

//! Configuration loader and validator for the classdeskd sidecar.
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML parse error: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("invalid configuration: {0}")]
    Invalid(&'static str),
}

/// Root configuration struct mirroring the YAML schema exactly.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Config {
    pub backend: Backend,
    pub export: Export,
}

/// School REST backend settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Backend {
    pub base_url: String,
    pub timeout_seconds: u64,
}

/// Spreadsheet export settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Export {
    pub dir: String,
}

impl Config {
    /// Ensure required directories exist (creates `export.dir` if missing).
    pub fn ensure_dirs(&self) -> Result<(), std::io::Error> {
        if self.export.dir.trim().is_empty() {
            return Ok(());
        }
        fs::create_dir_all(&self.export.dir)
    }
}

/// Load configuration from a YAML file and validate it.
/// - If `path` is None, uses `config.yaml` in the current working directory.
pub fn load(path: Option<&Path>) -> Result<Config, ConfigError> {
    let path = path.unwrap_or_else(|| Path::new("config.yaml"));
    let content = fs::read_to_string(path)?;
    let cfg: Config = serde_yaml::from_str(&content)?;
    validate(&cfg)?;
    Ok(cfg)
}

/// Validate a configuration instance.
fn validate(cfg: &Config) -> Result<(), ConfigError> {
    if cfg.backend.base_url.trim().is_empty() {
        return Err(ConfigError::Invalid("backend.base_url must be non-empty"));
    }
    if !cfg.backend.base_url.starts_with("http://") && !cfg.backend.base_url.starts_with("https://")
    {
        return Err(ConfigError::Invalid("backend.base_url must be an http(s) URL"));
    }
    if cfg.backend.timeout_seconds == 0 {
        return Err(ConfigError::Invalid("backend.timeout_seconds must be > 0"));
    }
    if cfg.export.dir.trim().is_empty() {
        return Err(ConfigError::Invalid("export.dir must be non-empty"));
    }
    Ok(())
}

/// Example YAML document, kept in sync with the schema above.
pub fn example() -> &'static str {
    r#"backend:
  base_url: "http://localhost:4000/api/"
  timeout_seconds: 30

export:
  dir: "./exports"
"#
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn parse_example_ok() {
        let cfg: Config = serde_yaml::from_str(example()).unwrap();
        validate(&cfg).unwrap();
    }

    #[test]
    fn invalid_base_url() {
        let mut cfg: Config = serde_yaml::from_str(example()).unwrap();
        cfg.backend.base_url = "".into();
        let err = validate(&cfg).unwrap_err();
        match err {
            ConfigError::Invalid(msg) => assert!(msg.contains("base_url")),
            _ => panic!("wrong error"),
        }

        let mut cfg: Config = serde_yaml::from_str(example()).unwrap();
        cfg.backend.base_url = "ftp://somewhere".into();
        assert!(matches!(validate(&cfg), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn invalid_timeout() {
        let mut cfg: Config = serde_yaml::from_str(example()).unwrap();
        cfg.backend.timeout_seconds = 0;
        let err = validate(&cfg).unwrap_err();
        match err {
            ConfigError::Invalid(msg) => assert!(msg.contains("timeout_seconds")),
            _ => panic!("wrong error"),
        }
    }

    #[test]
    fn invalid_export_dir() {
        let mut cfg: Config = serde_yaml::from_str(example()).unwrap();
        cfg.export.dir = "  ".into();
        assert!(matches!(validate(&cfg), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn ensure_dirs_creates_export_dir() {
        let td = tempdir().unwrap();
        let export_path = td.path().join("exports");
        let mut cfg: Config = serde_yaml::from_str(example()).unwrap();
        cfg.export.dir = export_path.to_string_lossy().to_string();
        cfg.ensure_dirs().unwrap();
        assert!(export_path.exists());
    }

    #[test]
    fn load_from_file_ok() {
        let td = tempdir().unwrap();
        let p = td.path().join("config.yaml");
        fs::write(&p, example()).unwrap();
        let cfg = load(Some(&p)).unwrap();
        assert_eq!(cfg.backend.timeout_seconds, 30);
    }
}

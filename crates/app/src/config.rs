use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Settings for one reconciliation run, read from a TOML file. Every
/// section is optional and command-line flags take precedence.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct RunConfig {
    pub input: InputConfig,
    pub output: OutputConfig,
    pub logging: LoggingConfig,
    pub diagnostics: DiagnosticsConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct InputConfig {
    pub billing_csv: Option<PathBuf>,
    pub eft_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct OutputConfig {
    pub eft_file: Option<PathBuf>,
    pub report_file: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    /// When set, a timestamped debug log is also written here.
    pub log_dir: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".to_string(), log_dir: None }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct DiagnosticsConfig {
    pub alignment: bool,
}

impl Default for DiagnosticsConfig {
    fn default() -> Self {
        Self { alignment: true }
    }
}

impl RunConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: RunConfig = toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::debug!(path = %path.display(), "config loaded");
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let config: RunConfig = toml::from_str("").unwrap();
        assert_eq!(config, RunConfig::default());
        assert_eq!(config.logging.level, "info");
        assert!(config.diagnostics.alignment);
    }

    #[test]
    fn full_file() {
        let config: RunConfig = toml::from_str(
            r#"
            [input]
            billing_csv = "billrun.csv"
            eft_file = "previous.eft"

            [output]
            eft_file = "new.eft"
            report_file = "reconciliation.xlsx"

            [logging]
            level = "debug"
            log_dir = "logs"

            [diagnostics]
            alignment = false
            "#,
        )
        .unwrap();
        assert_eq!(config.input.billing_csv, Some(PathBuf::from("billrun.csv")));
        assert_eq!(config.output.report_file, Some(PathBuf::from("reconciliation.xlsx")));
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.log_dir, Some(PathBuf::from("logs")));
        assert!(!config.diagnostics.alignment);
    }

    #[test]
    fn partial_section_keeps_other_defaults() {
        let config: RunConfig = toml::from_str("[logging]\nlog_dir = \"logs\"\n").unwrap();
        assert_eq!(config.logging.level, "info");
        assert!(config.output.eft_file.is_none());
    }

    #[test]
    fn load_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.toml");
        std::fs::write(&path, "[input\n").unwrap();
        let err = RunConfig::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert!(err.to_string().contains("run.toml"));

        let err = RunConfig::load(&dir.path().join("missing.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}

//! TOML configuration file.

use super::ConfigError;
use crate::driver::ConnectParams;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Full configuration file format.
///
/// Every field is optional; a binary only reads the sections it needs.
///
/// ```toml
/// [sampler]
/// interval_seconds = 5
/// port = 9110
/// timeout_seconds = 30
///
/// [database]
/// host = "db.internal"
/// port = 5432
/// user = "monitor"
/// database = "app"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    /// `[sampler]`
    pub sampler: SamplerSection,
    /// `[database]`
    pub database: DatabaseSection,
    /// `[query]`
    pub query: QuerySection,
    /// `[files]`
    pub files: FilesSection,
}

/// Polling and exposition settings.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SamplerSection {
    /// Seconds to wait after each poll cycle.
    pub interval_seconds: Option<u64>,
    /// Port of the metrics endpoint.
    pub port: Option<u16>,
    /// Seconds one poll cycle may take.
    pub timeout_seconds: Option<u64>,
}

/// Database connection settings.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DatabaseSection {
    /// Server host name or address.
    pub host: Option<String>,
    /// Server port.
    pub port: Option<u16>,
    /// User to authenticate as.
    pub user: Option<String>,
    /// Password for `user`.
    pub password: Option<String>,
    /// Database to select.
    pub database: Option<String>,
}

/// Timed query settings.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct QuerySection {
    /// Label used in the metric name, e.g. `MySQL`.
    pub name: Option<String>,
    /// Statement to time.
    pub query: Option<String>,
}

/// File-count settings.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FilesSection {
    /// Directory to watch.
    pub dir: Option<PathBuf>,
    /// File extension, with or without the leading dot.
    pub ext: Option<String>,
}

impl FileConfig {
    /// Loads configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::FileReadError(e.to_string()))?;
        toml::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// Loads `path` if given, otherwise returns an empty configuration.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => {
                tracing::info!("Loading configuration from: {}", path.display());
                Self::from_file(path)
            }
            None => Ok(Self::default()),
        }
    }
}

impl DatabaseSection {
    /// Fills every unset field from `fallback`.
    pub fn or(self, fallback: DatabaseSection) -> Self {
        Self {
            host: self.host.or(fallback.host),
            port: self.port.or(fallback.port),
            user: self.user.or(fallback.user),
            password: self.password.or(fallback.password),
            database: self.database.or(fallback.database),
        }
    }

    /// Builds connection parameters, defaulting to `localhost:<default_port>`.
    pub fn into_params(self, default_port: u16) -> ConnectParams {
        ConnectParams {
            host: self.host.unwrap_or_else(|| "localhost".to_string()),
            port: self.port.unwrap_or(default_port),
            user: self.user,
            password: self.password,
            database: self.database,
        }
    }
}

impl QuerySection {
    /// Fills every unset field from `fallback`.
    pub fn or(self, fallback: QuerySection) -> Self {
        Self {
            name: self.name.or(fallback.name),
            query: self.query.or(fallback.query),
        }
    }
}

impl FilesSection {
    /// Fills every unset field from `fallback`.
    pub fn or(self, fallback: FilesSection) -> Self {
        Self {
            dir: self.dir.or(fallback.dir),
            ext: self.ext.or(fallback.ext),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_file() {
        let config: FileConfig = toml::from_str(
            r#"
            [sampler]
            interval_seconds = 15
            port = 9200
            timeout_seconds = 8

            [database]
            host = "db.internal"
            user = "monitor"

            [files]
            dir = "/var/spool"
            ext = "csv"
            "#,
        )
        .unwrap();

        assert_eq!(config.sampler.interval_seconds, Some(15));
        assert_eq!(config.sampler.port, Some(9200));
        assert_eq!(config.sampler.timeout_seconds, Some(8));
        assert_eq!(config.database.host.as_deref(), Some("db.internal"));
        assert_eq!(config.files.ext.as_deref(), Some("csv"));
        assert_eq!(config.query, QuerySection::default());
    }

    #[test]
    fn test_unknown_field_rejected() {
        let result: Result<FileConfig, _> = toml::from_str("[sampler]\nintervall = 3\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_load_without_path_is_empty() {
        assert_eq!(FileConfig::load(None).unwrap(), FileConfig::default());
    }

    #[test]
    fn test_from_file_errors() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            FileConfig::from_file(dir.path().join("missing.toml")),
            Err(ConfigError::FileReadError(_))
        ));

        let bad = dir.path().join("bad.toml");
        std::fs::write(&bad, "[sampler\n").unwrap();
        assert!(matches!(
            FileConfig::from_file(&bad),
            Err(ConfigError::ParseError(_))
        ));
    }

    #[test]
    fn test_database_precedence_and_defaults() {
        let cli = DatabaseSection {
            host: Some("cli-host".into()),
            ..Default::default()
        };
        let file = DatabaseSection {
            host: Some("file-host".into()),
            user: Some("monitor".into()),
            ..Default::default()
        };

        let params = cli.or(file).into_params(5432);
        assert_eq!(params.host, "cli-host");
        assert_eq!(params.user.as_deref(), Some("monitor"));
        assert_eq!(params.port, 5432);
    }
}

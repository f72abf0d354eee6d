//! Sampler configuration and per-exporter settings.

use super::{ConfigError, FilesSection, QuerySection, SamplerSection};
use crate::scheduler::DEFAULT_CYCLE_TIMEOUT;
use std::path::PathBuf;
use std::time::Duration;

/// Defaults that differ between exporters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VariantDefaults {
    /// Polling interval in seconds.
    pub interval_seconds: u64,
    /// Metrics endpoint port.
    pub port: u16,
}

/// Defaults for the idle-connection exporter.
pub const DB_ACTIVITY: VariantDefaults = VariantDefaults {
    interval_seconds: 5,
    port: 9110,
};

/// Defaults for the query-duration exporter.
pub const DB_QUERY: VariantDefaults = VariantDefaults {
    interval_seconds: 10,
    port: 9105,
};

/// Defaults for the file-count exporter.
pub const COUNT_FILES: VariantDefaults = VariantDefaults {
    interval_seconds: 5,
    port: 9104,
};

/// Flags shared by every exporter binary.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct CommonArgs {
    /// Path to a TOML configuration file
    #[arg(short, long, env = "EXPORTER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Port to serve /metrics on
    #[arg(long, env = "EXPORTER_PORT")]
    pub port: Option<u16>,

    /// Seconds one poll cycle may take before it is abandoned [default: 30]
    #[arg(long, env = "EXPORTER_TIMEOUT_SECONDS")]
    pub timeout: Option<u64>,
}

/// Process-wide polling settings, fixed at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SamplerConfig {
    /// Time to sleep after each poll cycle.
    pub interval: Duration,
    /// Port of the metrics endpoint.
    pub exposition_port: u16,
    /// Longest a single poll cycle may run.
    pub cycle_timeout: Duration,
}

impl SamplerConfig {
    /// Merges flag values over the file section over `defaults`.
    ///
    /// `interval_seconds` comes from the binary's own flag, since each
    /// exporter reads it from a different environment variable.
    pub fn resolve(
        interval_seconds: Option<u64>,
        common: &CommonArgs,
        file: &SamplerSection,
        defaults: VariantDefaults,
    ) -> Result<Self, ConfigError> {
        let interval_seconds = interval_seconds
            .or(file.interval_seconds)
            .unwrap_or(defaults.interval_seconds);
        let cycle_timeout = common
            .timeout
            .or(file.timeout_seconds)
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_CYCLE_TIMEOUT);
        let config = Self {
            interval: Duration::from_secs(interval_seconds),
            exposition_port: common.port.or(file.port).unwrap_or(defaults.port),
            cycle_timeout,
        };
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.interval.is_zero() {
            return Err(ConfigError::InvalidInterval);
        }
        if self.cycle_timeout.is_zero() {
            return Err(ConfigError::InvalidTimeout);
        }
        Ok(())
    }
}

/// Directory and extension watched by the file-count exporter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileCountConfig {
    /// Directory whose direct children are counted.
    pub dir: PathBuf,
    /// Extension without the leading dot.
    pub ext: String,
}

impl FileCountConfig {
    /// Both settings are required. A leading `.` on the extension is dropped.
    pub fn resolve(section: FilesSection) -> Result<Self, ConfigError> {
        let dir = section
            .dir
            .filter(|d| !d.as_os_str().is_empty())
            .ok_or(ConfigError::Missing("dir"))?;
        let ext = section
            .ext
            .map(|e| e.trim_start_matches('.').to_string())
            .filter(|e| !e.is_empty())
            .ok_or(ConfigError::Missing("ext"))?;
        Ok(Self { dir, ext })
    }
}

/// Query timed by the query-duration exporter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryConfig {
    /// Label used in the metric name.
    pub name: String,
    /// Statement to time.
    pub query: String,
}

impl QueryConfig {
    /// Query label used when none is configured.
    pub const DEFAULT_NAME: &'static str = "MySQL";
    /// Statement timed when none is configured.
    pub const DEFAULT_QUERY: &'static str = "SELECT * FROM employees";

    /// Fills unset fields with the defaults.
    pub fn resolve(section: QuerySection) -> Self {
        Self {
            name: section
                .name
                .unwrap_or_else(|| Self::DEFAULT_NAME.to_string()),
            query: section
                .query
                .unwrap_or_else(|| Self::DEFAULT_QUERY.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_per_variant() {
        let section = SamplerSection::default();
        let common = CommonArgs::default();

        let activity = SamplerConfig::resolve(None, &common, &section, DB_ACTIVITY).unwrap();
        assert_eq!(activity.interval, Duration::from_secs(5));
        assert_eq!(activity.exposition_port, 9110);
        assert_eq!(activity.cycle_timeout, Duration::from_secs(30));

        let query = SamplerConfig::resolve(None, &common, &section, DB_QUERY).unwrap();
        assert_eq!(query.interval, Duration::from_secs(10));
        assert_eq!(query.exposition_port, 9105);

        let files = SamplerConfig::resolve(None, &common, &section, COUNT_FILES).unwrap();
        assert_eq!(files.exposition_port, 9104);
    }

    #[test]
    fn test_flags_override_file() {
        let section = SamplerSection {
            interval_seconds: Some(30),
            port: Some(9200),
            timeout_seconds: Some(20),
        };
        let common = CommonArgs {
            timeout: Some(4),
            ..Default::default()
        };

        let config = SamplerConfig::resolve(Some(2), &common, &section, DB_ACTIVITY).unwrap();
        assert_eq!(config.interval, Duration::from_secs(2));
        assert_eq!(config.exposition_port, 9200);
        assert_eq!(config.cycle_timeout, Duration::from_secs(4));
    }

    #[test]
    fn test_zero_interval_invalid() {
        let result = SamplerConfig::resolve(
            Some(0),
            &CommonArgs::default(),
            &SamplerSection::default(),
            DB_QUERY,
        );
        assert_eq!(result, Err(ConfigError::InvalidInterval));
    }

    #[test]
    fn test_zero_timeout_invalid() {
        let section = SamplerSection {
            timeout_seconds: Some(0),
            ..Default::default()
        };
        let result = SamplerConfig::resolve(None, &CommonArgs::default(), &section, COUNT_FILES);
        assert_eq!(result, Err(ConfigError::InvalidTimeout));
    }

    #[test]
    fn test_file_count_requires_dir_and_ext() {
        assert_eq!(
            FileCountConfig::resolve(FilesSection {
                dir: None,
                ext: Some("log".into()),
            }),
            Err(ConfigError::Missing("dir"))
        );
        assert_eq!(
            FileCountConfig::resolve(FilesSection {
                dir: Some("/tmp".into()),
                ext: Some(".".into()),
            }),
            Err(ConfigError::Missing("ext"))
        );
    }

    #[test]
    fn test_extension_dot_stripped() {
        let config = FileCountConfig::resolve(FilesSection {
            dir: Some("/var/log".into()),
            ext: Some(".log".into()),
        })
        .unwrap();
        assert_eq!(config.ext, "log");
    }

    #[test]
    fn test_query_defaults() {
        let config = QueryConfig::resolve(QuerySection::default());
        assert_eq!(config.name, "MySQL");
        assert_eq!(config.query, "SELECT * FROM employees");
    }
}

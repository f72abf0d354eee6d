//! Metric identifiers.
//!
//! Some exporters build their metric name from configuration (a directory
//! path, a query label). Names are derived once at startup and checked
//! against the Prometheus identifier grammar `[a-zA-Z_:][a-zA-Z0-9_:]*`.

use super::MetricsError;
use std::fmt;

/// A validated Prometheus metric name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MetricName(String);

impl MetricName {
    /// Validates `name` as-is.
    pub fn new(name: impl Into<String>) -> Result<Self, MetricsError> {
        let name = name.into();
        if is_valid(&name) {
            Ok(Self(name))
        } else {
            Err(MetricsError::InvalidName(name))
        }
    }

    /// Replaces every character not allowed in a metric name with `_`,
    /// then validates the result.
    pub fn sanitized(raw: &str) -> Result<Self, MetricsError> {
        let cleaned: String = raw
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '_' || c == ':' { c } else { '_' })
            .collect();
        Self::new(cleaned)
    }

    /// Name of the file-count gauge for `ext` files in `dir`.
    pub fn file_count(dir: &str, ext: &str) -> Result<Self, MetricsError> {
        Self::sanitized(&format!(
            "cust_{}_files_in_{}_total",
            ext,
            dir.replace('/', "_")
        ))
    }

    /// Name of the query-duration gauge for the query labelled `name`.
    pub fn query_duration(name: &str) -> Result<Self, MetricsError> {
        Self::sanitized(&format!("cust_{}_query_duration", name).to_lowercase())
    }

    /// The name as exported.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MetricName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for MetricName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

fn is_valid(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' || c == ':' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == ':')
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_valid_names() {
        assert!(MetricName::new("db_idle_connections").is_ok());
        assert!(MetricName::new("_private:rule").is_ok());
    }

    #[test]
    fn test_invalid_names() {
        assert!(matches!(
            MetricName::new("9lives"),
            Err(MetricsError::InvalidName(_))
        ));
        assert!(MetricName::new("").is_err());
        assert!(MetricName::new("has-dash").is_err());
    }

    #[test]
    fn test_file_count_name() {
        let name = MetricName::file_count("/var/log/app", "log").unwrap();
        assert_eq!(name.as_str(), "cust_log_files_in__var_log_app_total");
    }

    #[test]
    fn test_file_count_name_replaces_dots_and_dashes() {
        let name = MetricName::file_count("./my-dir", "tar.gz").unwrap();
        assert_eq!(name.as_str(), "cust_tar_gz_files_in___my_dir_total");
    }

    #[test]
    fn test_query_duration_name_is_lowercase() {
        let name = MetricName::query_duration("MySQL").unwrap();
        assert_eq!(name.as_str(), "cust_mysql_query_duration");
    }

    proptest! {
        #[test]
        fn sanitized_names_are_always_valid(dir in ".{0,40}", ext in "[a-z]{1,5}") {
            let name = MetricName::file_count(&dir, &ext).unwrap();
            prop_assert!(is_valid(name.as_str()));
        }
    }
}

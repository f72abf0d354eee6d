//! Prometheus metrics for the exporters.
//!
//! Sampled values are recorded into a [`MetricsRegistry`] and served as
//! Prometheus text by a [`MetricsServer`].
//!
//! # Metrics Exposed
//!
//! ## db-activity-exporter
//! - `db_idle_connections{db_name,db_host,db_port}` - Number of idle db connections
//! - `db_host_status{db_host_status="up"|"down"}` - Status of db host
//!
//! ## db-query-exporter
//! - `cust_<name>_query_duration{query}` - Query duration in seconds
//!
//! ## count-files-exporter
//! - `cust_<ext>_files_in_<dir>_total` - Number of matching files in the directory
//!
//! # Example
//!
//! ```no_run
//! use resource_exporters::metrics::{GaugeSpec, HealthState, MetricName, MetricsRegistry};
//!
//! let registry = MetricsRegistry::new();
//! let spec = GaugeSpec::new(
//!     MetricName::new("db_idle_connections").expect("valid name"),
//!     "Number of idle db connections",
//! )
//! .with_label("db_name", "app");
//!
//! registry.record(&spec, 3.0).expect("record");
//!
//! let health = registry
//!     .health_indicator(&MetricName::new("db_host_status").expect("valid name"), "Status of db host")
//!     .expect("register");
//! health.set(HealthState::Up);
//! ```

mod name;
mod registry;
mod server;

pub use name::MetricName;
pub use registry::{GaugeSpec, HealthIndicator, HealthState, MetricsRegistry};
pub use server::{MetricsServer, MetricsServerConfig, ServerError, ServerHandle};

use thiserror::Error;

/// Errors that can occur during metrics operations.
#[derive(Debug, Error)]
pub enum MetricsError {
    /// Registration or encoding failed inside the Prometheus client.
    #[error("prometheus error: {0}")]
    Prometheus(#[from] prometheus::Error),

    /// The name is not a legal Prometheus identifier.
    #[error("invalid metric name {0:?}")]
    InvalidName(String),

    /// The gauge exists with a different label set.
    #[error("metric {name} is registered with labels {expected:?}")]
    LabelMismatch {
        /// Metric name.
        name: String,
        /// Label names it was first registered with.
        expected: Vec<String>,
    },

    /// The name is taken by an instrument of another kind.
    #[error("metric {0} is already registered as a different kind")]
    KindMismatch(String),
}

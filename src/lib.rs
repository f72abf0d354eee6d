//! Resource Exporters Library
//!
//! Polling Prometheus exporters that sample an external resource at a fixed
//! interval and publish the result on a `/metrics` endpoint: idle
//! connections of a PostgreSQL server, the latency of a MySQL query, and
//! the number of files with a given extension in a directory.
//!
//! # Architecture
//!
//! Every exporter is the same loop around a different probe:
//!
//! ```text
//! scheduler → lifecycle (ensure connected) → probe → metrics registry
//!     ↑                                                     ↓
//!   sleep                                         /metrics (HTTP scrape)
//! ```
//!
//! # Design Principles
//!
//! - **Never crash on a bad sample**: every probe failure is handled inside
//!   the poll cycle
//! - **Health follows the connection**: a discarded handle always reads `down`
//! - **Stale over empty**: failed cycles leave the last recorded value in place
//! - **Injectable drivers**: the connection lifecycle runs against any [`Driver`]
//!
//! # Example
//!
//! ```no_run
//! use resource_exporters::{
//!     lifecycle::{ConnectionManager, Detached},
//!     metrics::MetricsRegistry,
//!     probe::FileCountProbe,
//!     scheduler::Sampler,
//! };
//! use std::{sync::Arc, time::Duration};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let registry = Arc::new(MetricsRegistry::new());
//! let probe = FileCountProbe::new("/var/spool/outgoing", "csv")?;
//! let mut sampler = Sampler::new(
//!     ConnectionManager::new(Detached),
//!     probe,
//!     Arc::clone(&registry),
//!     Duration::from_secs(5),
//! )?;
//!
//! sampler.run_cycle().await;
//! println!("{}", registry.encode()?);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]
#![deny(unsafe_code)]

pub mod config;
pub mod driver;
pub mod exporter;
pub mod lifecycle;
pub mod logging;
pub mod metrics;
pub mod probe;
pub mod scheduler;
pub mod shutdown;

// Re-export commonly used types at crate root
pub use config::{ConfigError, SamplerConfig};
pub use driver::{ConnectParams, Driver, DriverError};
pub use lifecycle::{ConnectionManager, ConnectionState, Connector};
pub use metrics::{GaugeSpec, HealthState, MetricName, MetricsRegistry};
pub use probe::{FailureKind, Probe, ProbeFailure};
pub use scheduler::{CycleReport, Sampler};
pub use shutdown::Shutdown;

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

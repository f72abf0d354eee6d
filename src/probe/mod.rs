//! Resource probes.
//!
//! A probe performs one sample of an external resource and returns either a
//! numeric observation or a [`ProbeFailure`]. Probes that work on a
//! long-lived connection receive it from the
//! [`ConnectionManager`](crate::lifecycle::ConnectionManager); probes that
//! manage their own resource use the unit handle.

mod failure;
mod file_count;
mod idle_connections;
mod query_duration;

pub use failure::{FailureKind, ProbeFailure};
pub use file_count::{list_matching, FileCountProbe};
pub use idle_connections::{IdleConnectionsProbe, IDLE_CONNECTIONS_QUERY};
pub use query_duration::QueryDurationProbe;

use crate::metrics::GaugeSpec;
use async_trait::async_trait;

/// Result of one sample: an observation or a typed failure.
pub type SampleOutcome = Result<f64, ProbeFailure>;

/// A single sampling capability over a connection handle `H`.
#[async_trait]
pub trait Probe<H: Send>: Send {
    /// The gauge this probe's observations are recorded into.
    fn gauge(&self) -> &GaugeSpec;

    /// Takes one sample using `handle`.
    async fn sample(&mut self, handle: &mut H) -> SampleOutcome;
}

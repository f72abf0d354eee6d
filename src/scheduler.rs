//! Polling scheduler.
//!
//! One [`Sampler`] drives one exporter: connect if needed, sample, record,
//! then sleep for the configured interval. Cycles never overlap and the
//! sleep starts only after the cycle returns, so the effective period is
//! probe time plus interval.
//!
//! Each cycle is bounded by a timeout. A cycle that does not finish in time
//! is abandoned and reported as a connectivity failure, which keeps an
//! unresponsive resource from holding off shutdown.

use crate::lifecycle::{ConnectionManager, Connector};
use crate::metrics::{MetricsError, MetricsRegistry};
use crate::probe::{FailureKind, Probe, ProbeFailure};
use crate::shutdown::Shutdown;
use std::sync::Arc;
use std::time::Duration;

/// Upper bound on one poll cycle unless configured otherwise.
pub const DEFAULT_CYCLE_TIMEOUT: Duration = Duration::from_secs(30);

/// What a single poll cycle did.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CycleReport {
    /// The probe returned this value and it was recorded.
    Observed(f64),
    /// The cycle failed; nothing was recorded.
    Failed(FailureKind),
}

/// Runs the sample → record cycle for one probe.
pub struct Sampler<C: Connector, P: Probe<C::Handle>> {
    connections: ConnectionManager<C>,
    probe: P,
    registry: Arc<MetricsRegistry>,
    interval: Duration,
    cycle_timeout: Duration,
}

impl<C: Connector, P: Probe<C::Handle>> Sampler<C, P> {
    /// Creates a sampler and registers the probe's gauge.
    ///
    /// Registering up front surfaces naming or label errors at startup
    /// instead of on the first poll.
    pub fn new(
        connections: ConnectionManager<C>,
        probe: P,
        registry: Arc<MetricsRegistry>,
        interval: Duration,
    ) -> Result<Self, MetricsError> {
        registry.register_gauge(probe.gauge())?;
        Ok(Self {
            connections,
            probe,
            registry,
            interval,
            cycle_timeout: DEFAULT_CYCLE_TIMEOUT,
        })
    }

    /// Sets how long one cycle may take before it is abandoned.
    pub fn with_cycle_timeout(mut self, timeout: Duration) -> Self {
        self.cycle_timeout = timeout;
        self
    }

    /// The connection manager this sampler polls through.
    pub fn connections(&self) -> &ConnectionManager<C> {
        &self.connections
    }

    /// Runs one poll cycle. Failures are handled here and never escape.
    pub async fn run_cycle(&mut self) -> CycleReport {
        let limit = self.cycle_timeout;
        let attempt = async {
            let handle = self.connections.ensure_connected().await?;
            self.probe.sample(handle).await
        };
        let outcome = match tokio::time::timeout(limit, attempt).await {
            Ok(outcome) => outcome,
            Err(_) => Err(ProbeFailure::Connectivity(format!(
                "no response within {:?}",
                limit
            ))),
        };

        let failure = match outcome {
            Ok(value) => match self.registry.record(self.probe.gauge(), value) {
                Ok(()) => {
                    tracing::debug!(
                        metric = %self.probe.gauge().name(),
                        value,
                        "Recorded sample"
                    );
                    return CycleReport::Observed(value);
                }
                Err(e) => ProbeFailure::Unexpected(e.to_string()),
            },
            Err(failure) => failure,
        };

        self.handle_failure(&failure).await;
        CycleReport::Failed(failure.kind())
    }

    async fn handle_failure(&mut self, failure: &ProbeFailure) {
        let metric = self.probe.gauge().name();
        let kind = failure.kind();
        match failure {
            ProbeFailure::Connectivity(_) => {
                tracing::error!(metric = %metric, %kind, "Error connecting: {}", failure)
            }
            ProbeFailure::StaleHandle(_) => {
                tracing::debug!(metric = %metric, %kind, "Connection is closed: {}", failure)
            }
            ProbeFailure::Query(_) => {
                tracing::warn!(metric = %metric, %kind, "Sampling failed: {}", failure)
            }
            ProbeFailure::Unexpected(_) => {
                tracing::error!(metric = %metric, %kind, "Unexpected sampling error: {}", failure)
            }
        }

        if failure.invalidates_handle() {
            let closing = self.connections.invalidate();
            if tokio::time::timeout(self.cycle_timeout, closing).await.is_err() {
                tracing::warn!(metric = %metric, "Closing the discarded connection timed out");
            }
        }
    }

    /// Polls until `shutdown` fires.
    ///
    /// Shutdown is only observed between cycles; a cycle already running
    /// completes first, within the cycle timeout.
    pub async fn run_forever(&mut self, shutdown: &mut Shutdown) {
        tracing::info!(
            metric = %self.probe.gauge().name(),
            interval = ?self.interval,
            timeout = ?self.cycle_timeout,
            "Starting poll loop"
        );

        loop {
            self.run_cycle().await;

            tokio::select! {
                _ = tokio::time::sleep(self.interval) => {}
                _ = shutdown.triggered() => {
                    tracing::info!("Shutdown requested, stopping poll loop");
                    return;
                }
            }
        }
    }
}

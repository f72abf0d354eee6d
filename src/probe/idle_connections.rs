//! Idle-connection count probe.

use super::{Probe, ProbeFailure, SampleOutcome};
use crate::driver::{ConnectParams, Driver};
use crate::metrics::{GaugeSpec, MetricName, MetricsError};
use async_trait::async_trait;
use std::sync::Arc;

/// Status query counting idle server connections.
pub const IDLE_CONNECTIONS_QUERY: &str =
    "SELECT count(*) FROM pg_stat_activity WHERE state = 'idle';";

/// Reports how many connections to the database server are idle.
///
/// Runs [`IDLE_CONNECTIONS_QUERY`] on the long-lived handle owned by the
/// connection manager.
pub struct IdleConnectionsProbe<D: Driver> {
    driver: Arc<D>,
    gauge: GaugeSpec,
}

impl<D: Driver> IdleConnectionsProbe<D> {
    /// Creates a probe whose gauge is labelled with the target database.
    pub fn new(driver: Arc<D>, params: &ConnectParams) -> Result<Self, MetricsError> {
        let gauge = GaugeSpec::new(
            MetricName::new("db_idle_connections")?,
            "Number of idle db connections",
        )
        .with_label("db_name", params.database.clone().unwrap_or_default())
        .with_label("db_host", params.host.clone())
        .with_label("db_port", params.port.to_string());

        Ok(Self { driver, gauge })
    }
}

#[async_trait]
impl<D: Driver> Probe<D::Handle> for IdleConnectionsProbe<D> {
    fn gauge(&self) -> &GaugeSpec {
        &self.gauge
    }

    async fn sample(&mut self, handle: &mut D::Handle) -> SampleOutcome {
        let rows = self
            .driver
            .execute(handle, IDLE_CONNECTIONS_QUERY)
            .await?;

        let idle = rows.scalar.ok_or_else(|| {
            ProbeFailure::Unexpected(format!(
                "status query returned no count ({} rows)",
                rows.len
            ))
        })?;

        tracing::info!(idle_connections = idle, "Idle connections: {}", idle);
        Ok(idle)
    }
}

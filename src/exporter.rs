//! Startup sequence shared by the exporter binaries.

use crate::config::SamplerConfig;
use crate::lifecycle::Connector;
use crate::metrics::{MetricsError, MetricsRegistry, MetricsServer, MetricsServerConfig, ServerError};
use crate::probe::Probe;
use crate::scheduler::Sampler;
use crate::shutdown::Shutdown;
use std::sync::Arc;
use thiserror::Error;

/// Errors that stop an exporter. Poll-cycle failures never end up here.
#[derive(Debug, Error)]
pub enum ExporterError {
    /// Invalid configuration.
    #[error(transparent)]
    Config(#[from] crate::config::ConfigError),

    /// A metric could not be registered.
    #[error(transparent)]
    Metrics(#[from] MetricsError),

    /// The metrics endpoint failed to bind or stopped serving.
    #[error(transparent)]
    Server(#[from] ServerError),

    /// The termination handler could not be installed.
    #[error("failed to install signal handler: {0}")]
    Signal(#[from] ctrlc::Error),
}

/// Serves `registry` and polls with `sampler` until a termination signal.
///
/// The metrics endpoint is bound before the first poll cycle. If the
/// endpoint stops serving, the exporter stops with its error.
pub async fn run<C, P>(
    config: &SamplerConfig,
    registry: Arc<MetricsRegistry>,
    sampler: Sampler<C, P>,
) -> Result<(), ExporterError>
where
    C: Connector,
    P: Probe<C::Handle>,
{
    let mut sampler = sampler.with_cycle_timeout(config.cycle_timeout);
    let server = MetricsServer::new(
        MetricsServerConfig::with_port(config.exposition_port),
        registry,
    )
    .start()
    .await?;
    let mut shutdown = Shutdown::install()?;

    tokio::select! {
        _ = sampler.run_forever(&mut shutdown) => {
            tracing::info!("Exporter stopped");
            Ok(())
        }
        result = server.wait() => {
            result?;
            tracing::warn!("Metrics server stopped");
            Ok(())
        }
    }
}

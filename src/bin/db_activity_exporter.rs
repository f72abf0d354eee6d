//! PostgreSQL idle-connection exporter
//!
//! Polls `pg_stat_activity` for the number of idle connections and reports
//! whether the database host is reachable.

use clap::Parser;
use resource_exporters::{
    config::{CommonArgs, DatabaseSection, FileConfig, SamplerConfig, DB_ACTIVITY},
    driver::PostgresDriver,
    exporter,
    lifecycle::{ConnectionManager, DriverConnector},
    metrics::{MetricName, MetricsRegistry},
    probe::IdleConnectionsProbe,
    scheduler::Sampler,
};
use std::sync::Arc;
use tracing::info;

/// Export the idle connection count of a PostgreSQL server
#[derive(Parser, Debug)]
#[command(name = "db-activity-exporter", version, about, long_about = None)]
struct Cli {
    #[command(flatten)]
    common: CommonArgs,

    /// Seconds to wait between polls [default: 5]
    #[arg(long, env = "POLLING_INTERVAL_SECONDS")]
    interval: Option<u64>,

    /// Database host [default: localhost]
    #[arg(long, env = "POSTGRES_HOST")]
    db_host: Option<String>,

    /// Database port [default: 5432]
    #[arg(long, env = "POSTGRES_PORT")]
    db_port: Option<u16>,

    /// Database user
    #[arg(long, env = "POSTGRES_USER")]
    db_user: Option<String>,

    /// Database password
    #[arg(long, env = "POSTGRES_PASSWORD", hide_env_values = true)]
    db_password: Option<String>,

    /// Database name
    #[arg(long, env = "POSTGRES_DATABASE")]
    db_name: Option<String>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    resource_exporters::logging::init();
    info!("db-activity-exporter v{}", resource_exporters::VERSION);

    let cli = Cli::parse();
    let file = FileConfig::load(cli.common.config.as_deref())?;
    let config = SamplerConfig::resolve(cli.interval, &cli.common, &file.sampler, DB_ACTIVITY)?;
    let params = DatabaseSection {
        host: cli.db_host,
        port: cli.db_port,
        user: cli.db_user,
        password: cli.db_password,
        database: cli.db_name,
    }
    .or(file.database)
    .into_params(5432);

    info!(
        "Database: {}, polling every {:?}, metrics on port {}",
        params.address(),
        config.interval,
        config.exposition_port
    );

    let registry = Arc::new(MetricsRegistry::new());
    let health = registry.health_indicator(&MetricName::new("db_host_status")?, "Status of db host")?;

    let driver = Arc::new(PostgresDriver);
    let probe = IdleConnectionsProbe::new(Arc::clone(&driver), &params)?;
    let connections = ConnectionManager::new(DriverConnector::new(driver, params)).with_health(health);
    let sampler = Sampler::new(connections, probe, Arc::clone(&registry), config.interval)?;

    exporter::run(&config, registry, sampler).await?;
    Ok(())
}

//! MySQL query duration exporter
//!
//! Connects, runs a fixed query and disconnects on every poll, and exports
//! how long that took.

use clap::Parser;
use resource_exporters::{
    config::{
        CommonArgs, DatabaseSection, FileConfig, QueryConfig, QuerySection, SamplerConfig,
        DB_QUERY,
    },
    driver::MySqlDriver,
    exporter,
    lifecycle::{ConnectionManager, Detached},
    metrics::MetricsRegistry,
    probe::QueryDurationProbe,
    scheduler::Sampler,
};
use std::sync::Arc;
use tracing::info;

/// Export the execution time of a MySQL query
#[derive(Parser, Debug)]
#[command(name = "db-query-exporter", version, about, long_about = None)]
struct Cli {
    #[command(flatten)]
    common: CommonArgs,

    /// Seconds to wait between polls [default: 10]
    #[arg(long, env = "DURATION")]
    interval: Option<u64>,

    /// Database host [default: localhost]
    #[arg(long, env = "MYSQL_HOST")]
    db_host: Option<String>,

    /// Database port [default: 3306]
    #[arg(long, env = "MYSQL_PORT")]
    db_port: Option<u16>,

    /// Database user
    #[arg(long, env = "MYSQL_USER")]
    db_user: Option<String>,

    /// Database password
    #[arg(long, env = "MYSQL_PASSWORD", hide_env_values = true)]
    db_password: Option<String>,

    /// Database name
    #[arg(long, env = "MYSQL_DATABASE")]
    db_name: Option<String>,

    /// Name used in the metric name [default: MySQL]
    #[arg(long, env = "QUERY_NAME")]
    query_name: Option<String>,

    /// Query to time [default: SELECT * FROM employees]
    #[arg(long, env = "QUERY")]
    query: Option<String>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    resource_exporters::logging::init();
    info!("db-query-exporter v{}", resource_exporters::VERSION);

    let cli = Cli::parse();
    let file = FileConfig::load(cli.common.config.as_deref())?;
    let config = SamplerConfig::resolve(cli.interval, &cli.common, &file.sampler, DB_QUERY)?;
    let params = DatabaseSection {
        host: cli.db_host,
        port: cli.db_port,
        user: cli.db_user,
        password: cli.db_password,
        database: cli.db_name,
    }
    .or(file.database)
    .into_params(3306);
    let query = QueryConfig::resolve(
        QuerySection {
            name: cli.query_name,
            query: cli.query,
        }
        .or(file.query),
    );

    info!(
        "Database: {}, timing {:?} every {:?}, metrics on port {}",
        params.address(),
        query.query,
        config.interval,
        config.exposition_port
    );

    let registry = Arc::new(MetricsRegistry::new());
    let probe = QueryDurationProbe::new(Arc::new(MySqlDriver), params, &query.name, query.query)?;
    let sampler = Sampler::new(
        ConnectionManager::new(Detached),
        probe,
        Arc::clone(&registry),
        config.interval,
    )?;

    exporter::run(&config, registry, sampler).await?;
    Ok(())
}

//! Directory file-count exporter
//!
//! Counts the files with a given extension in a directory.

use clap::Parser;
use resource_exporters::{
    config::{CommonArgs, FileConfig, FileCountConfig, FilesSection, SamplerConfig, COUNT_FILES},
    exporter,
    lifecycle::{ConnectionManager, Detached},
    metrics::MetricsRegistry,
    probe::FileCountProbe,
    scheduler::Sampler,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

/// Export the number of files with an extension in a directory
#[derive(Parser, Debug)]
#[command(name = "count-files-exporter", version, about, long_about = None)]
struct Cli {
    #[command(flatten)]
    common: CommonArgs,

    /// Directory to watch
    #[arg(short, long)]
    dir: Option<PathBuf>,

    /// Extension to watch
    #[arg(short, long)]
    ext: Option<String>,

    /// Seconds to wait between polls [default: 5]
    #[arg(long, env = "DURATION")]
    interval: Option<u64>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    resource_exporters::logging::init();
    info!("count-files-exporter v{}", resource_exporters::VERSION);

    let cli = Cli::parse();
    let file = FileConfig::load(cli.common.config.as_deref())?;
    let config = SamplerConfig::resolve(cli.interval, &cli.common, &file.sampler, COUNT_FILES)?;
    let target = FileCountConfig::resolve(
        FilesSection {
            dir: cli.dir,
            ext: cli.ext,
        }
        .or(file.files),
    )?;

    info!(
        "Watching *.{} in {}, polling every {:?}, metrics on port {}",
        target.ext,
        target.dir.display(),
        config.interval,
        config.exposition_port
    );

    let registry = Arc::new(MetricsRegistry::new());
    let probe = FileCountProbe::new(target.dir, target.ext)?;
    let sampler = Sampler::new(
        ConnectionManager::new(Detached),
        probe,
        Arc::clone(&registry),
        config.interval,
    )?;

    exporter::run(&config, registry, sampler).await?;
    Ok(())
}

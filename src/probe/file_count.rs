//! Directory file-count probe.

use super::{Probe, ProbeFailure, SampleOutcome};
use crate::metrics::{GaugeSpec, MetricName, MetricsError};
use async_trait::async_trait;
use std::io;
use std::path::{Path, PathBuf};

/// Lists the entries of `dir` named `*.<ext>`.
///
/// Matches like the shell glob `dir/*.ext`: only direct children, and
/// entries whose name starts with a dot are skipped. Names need not be
/// valid UTF-8. The result is sorted.
pub async fn list_matching(dir: &Path, ext: &str) -> io::Result<Vec<PathBuf>> {
    let suffix = format!(".{}", ext);
    let mut entries = tokio::fs::read_dir(dir).await?;
    let mut matches = Vec::new();

    while let Some(entry) = entries.next_entry().await? {
        let file_name = entry.file_name();
        let name = file_name.as_encoded_bytes();
        if !name.starts_with(b".") && name.ends_with(suffix.as_bytes()) {
            matches.push(entry.path());
        }
    }

    matches.sort();
    Ok(matches)
}

/// Counts files with a given extension in a directory.
///
/// The filesystem needs no connection, so this probe runs on the unit
/// handle.
pub struct FileCountProbe {
    dir: PathBuf,
    ext: String,
    gauge: GaugeSpec,
}

impl FileCountProbe {
    /// Creates a probe for `*.<ext>` entries in `dir`.
    ///
    /// `ext` is given without the leading dot.
    pub fn new(dir: impl Into<PathBuf>, ext: impl Into<String>) -> Result<Self, MetricsError> {
        let dir = dir.into();
        let ext = ext.into();
        let display = dir.to_string_lossy();
        let gauge = GaugeSpec::new(
            MetricName::file_count(&display, &ext)?,
            format!("Number of *{} files in {}", ext, display),
        );

        Ok(Self { dir, ext, gauge })
    }
}

#[async_trait]
impl Probe<()> for FileCountProbe {
    fn gauge(&self) -> &GaugeSpec {
        &self.gauge
    }

    async fn sample(&mut self, _handle: &mut ()) -> SampleOutcome {
        let files = list_matching(&self.dir, &self.ext).await.map_err(|e| {
            ProbeFailure::Query(format!("cannot list {}: {}", self.dir.display(), e))
        })?;

        tracing::info!(
            "Found {} files with extension {} in {}",
            files.len(),
            self.ext,
            self.dir.display()
        );
        Ok(files.len() as f64)
    }
}

//! Directory poller configuration.

use std::path::PathBuf;

/// Where descriptor files are read from and how often.
#[derive(Debug, Clone)]
pub struct PollerConfig {
    /// Directory holding one `<category>.json` file per category.
    pub directory: PathBuf,
    /// Sleep between two scans of the directory.
    pub interval: std::time::Duration,
    /// Uniform step of every decoded time series.
    pub series_step: time::Duration,
}

//! DirectoryPoller processor.
//!
//! The DirectoryPoller is responsible for:
//! - Seeding a scheduled count of zero for every `<category>.json` file at
//!   start-up
//! - Re-reading every watched file on a fixed interval
//! - Handing the entries appended since the last poll to the
//!   `ActivationScheduler`
//!
//! Files are append-only JSON arrays. Only growth is detected: entries that
//! are rewritten in place, and arrays that shrink, are never rescheduled.

use crate::config::PollerConfig;
use crate::entities::{Category, RawDescriptor};
use crate::processors::scheduler::ActivationScheduler;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::ReadDirStream;
use tracing::{debug, error, info, warn};

const DESCRIPTOR_EXTENSION: &str = "json";

/// Fatal start-up error.
#[derive(Debug, Error)]
pub enum InitError {
    #[error("failed to enumerate {}: {source}", path.display())]
    Enumerate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Per-file error during a poll. The file is skipped until the next poll.
#[derive(Debug, Error)]
pub enum PollError {
    #[error("failed to read {}: {source}", path.display())]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed JSON in {}: {source}", path.display())]
    MalformedJson {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("{} does not hold a JSON array", path.display())]
    UnexpectedShape { path: PathBuf },
}

/// What one poll did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PollReport {
    /// Watched files found.
    pub files: usize,
    /// Descriptors handed to the scheduler successfully.
    pub scheduled: usize,
    /// Descriptors that failed to decode. Their count still advanced.
    pub failed: usize,
    /// Files skipped on a read, parse or shape error.
    pub skipped_files: usize,
}

/// Watches a directory of growing descriptor files.
pub struct DirectoryPoller {
    directory: PathBuf,
    interval: std::time::Duration,
    scheduler: ActivationScheduler,
    /// Entries already handed to the scheduler, per category. Only the poll
    /// loop writes this.
    scheduled_counts: HashMap<Category, usize>,
}

impl DirectoryPoller {
    /// Enumerate the watched directory and seed a zero count per category.
    pub async fn initialize(
        config: &PollerConfig,
        scheduler: ActivationScheduler,
    ) -> Result<Self, InitError> {
        let files = descriptor_files(&config.directory)
            .await
            .map_err(|source| InitError::Enumerate {
                path: config.directory.clone(),
                source,
            })?;

        let scheduled_counts: HashMap<Category, usize> = files
            .iter()
            .filter_map(|path| category_of(path))
            .map(|category| (category, 0))
            .collect();

        info!(
            directory = %config.directory.display(),
            categories = scheduled_counts.len(),
            "DirectoryPoller initialized"
        );

        Ok(Self {
            directory: config.directory.clone(),
            interval: config.interval,
            scheduler,
            scheduled_counts,
        })
    }

    /// Entries of `category` handed to the scheduler so far.
    pub fn scheduled_count(&self, category: &Category) -> Option<usize> {
        self.scheduled_counts.get(category).copied()
    }

    pub fn scheduler(&self) -> &ActivationScheduler {
        &self.scheduler
    }

    /// Run the poller until shutdown is signaled.
    ///
    /// The first poll happens immediately, then once per interval.
    pub async fn run(mut self, mut shutdown_rx: watch::Receiver<bool>) {
        info!(
            interval_secs = self.interval.as_secs(),
            "DirectoryPoller started"
        );

        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;

                changed = shutdown_rx.changed() => {
                    if changed.is_err() || *shutdown_rx.borrow() {
                        info!("DirectoryPoller received shutdown signal");
                        break;
                    }
                }

                _ = ticker.tick() => {
                    let report = self.poll_once().await;
                    if report.scheduled > 0 || report.failed > 0 {
                        info!(
                            scheduled = report.scheduled,
                            failed = report.failed,
                            skipped_files = report.skipped_files,
                            "Poll complete"
                        );
                    }
                }
            }
        }

        info!("DirectoryPoller shutdown complete");
    }

    /// Scan every watched file once.
    pub async fn poll_once(&mut self) -> PollReport {
        let mut report = PollReport::default();

        let files = match descriptor_files(&self.directory).await {
            Ok(files) => files,
            Err(e) => {
                error!(
                    directory = %self.directory.display(),
                    error = %e,
                    "Failed to enumerate watched directory"
                );
                return report;
            }
        };
        report.files = files.len();

        for path in files {
            let Some(category) = category_of(&path) else {
                continue;
            };
            if let Err(e) = self.poll_file(&path, category, &mut report).await {
                warn!(error = %e, "Skipping descriptor file");
                report.skipped_files += 1;
            }
        }

        report
    }

    async fn poll_file(
        &mut self,
        path: &Path,
        category: Category,
        report: &mut PollReport,
    ) -> Result<(), PollError> {
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| PollError::FileRead {
                path: path.to_path_buf(),
                source,
            })?;
        let value: serde_json::Value =
            serde_json::from_str(&content).map_err(|source| PollError::MalformedJson {
                path: path.to_path_buf(),
                source,
            })?;
        let serde_json::Value::Array(entries) = value else {
            return Err(PollError::UnexpectedShape {
                path: path.to_path_buf(),
            });
        };

        let seen = self.scheduled_counts.get(&category).copied().unwrap_or(0);
        let total = entries.len();
        if total <= seen {
            return Ok(());
        }

        debug!(%category, seen, total, "New descriptors found");
        for entry in entries.into_iter().skip(seen) {
            match self
                .scheduler
                .schedule(category.clone(), RawDescriptor::new(entry))
                .await
            {
                Ok(_) => report.scheduled += 1,
                Err(e) => {
                    warn!(%category, error = %e, "Failed to decode descriptor");
                    report.failed += 1;
                }
            }
        }
        self.scheduled_counts.insert(category, total);

        Ok(())
    }
}

/// `*.json` files in `directory` (symlinks followed), sorted by path.
///
/// Only opening the directory can fail. An entry that vanishes or cannot be
/// inspected between listing and `stat` is skipped for this pass.
async fn descriptor_files(directory: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut entries = ReadDirStream::new(tokio::fs::read_dir(directory).await?);
    let mut files = Vec::new();

    while let Some(entry) = entries.next().await {
        let path = match entry {
            Ok(entry) => entry.path(),
            Err(e) => {
                warn!(directory = %directory.display(), error = %e, "Skipping unreadable entry");
                continue;
            }
        };
        if path.extension().and_then(|ext| ext.to_str()) != Some(DESCRIPTOR_EXTENSION) {
            continue;
        }
        match tokio::fs::metadata(&path).await {
            Ok(metadata) if metadata.is_file() => files.push(path),
            Ok(_) => {}
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Skipping descriptor file");
            }
        }
    }

    files.sort();
    Ok(files)
}

fn category_of(path: &Path) -> Option<Category> {
    path.file_stem()
        .and_then(|stem| stem.to_str())
        .map(Category::from_name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::Payload;
    use crate::processors::decoder::Decoder;
    use crate::processors::pricing::UnconfiguredPricingEngine;
    use crate::store::{EventStore, ListEvents};
    use drsig_sdk::objects::EventListing;
    use kanau::processor::Processor;
    use serde_json::{Value, json};
    use std::sync::Arc;
    use tempfile::TempDir;
    use time::Duration;

    fn shed_entry(start: &str, end: &str, power: i64) -> Value {
        json!({
            "notification-date": "2024-01-01T00:00:00",
            "data": { "start-date": start, "end-date": end, "power": power }
        })
    }

    fn track_entry() -> Value {
        json!({
            "notification-date": "2024-01-01T00:00:00",
            "data": {
                "start-date": "2024-01-01T00:00:00",
                "end-date": "2024-01-01T02:00:00",
                "profile": [1.0, 2.0]
            }
        })
    }

    fn write(dir: &TempDir, name: &str, value: &Value) {
        std::fs::write(dir.path().join(name), value.to_string()).unwrap();
    }

    async fn poller(dir: &TempDir) -> (DirectoryPoller, EventStore) {
        let store = EventStore::new();
        let decoder = Decoder::new(Duration::hours(1), Arc::new(UnconfiguredPricingEngine));
        let scheduler = ActivationScheduler::new(Arc::new(decoder), store.clone());
        let config = PollerConfig {
            directory: dir.path().to_path_buf(),
            interval: std::time::Duration::from_secs(10),
            series_step: Duration::hours(1),
        };
        let poller = DirectoryPoller::initialize(&config, scheduler).await.unwrap();
        (poller, store)
    }

    #[tokio::test]
    async fn test_initialize_seeds_zero_counts() {
        let dir = TempDir::new().unwrap();
        write(&dir, "dr_shed.json", &json!([]));
        write(&dir, "dr_other.json", &json!([]));
        std::fs::write(dir.path().join("notes.txt"), "not watched").unwrap();

        let (poller, _) = poller(&dir).await;
        assert_eq!(poller.scheduled_count(&Category::Shed), Some(0));
        assert_eq!(
            poller.scheduled_count(&Category::Unknown("dr_other".into())),
            Some(0)
        );
        assert_eq!(poller.scheduled_count(&Category::Limit), None);
    }

    #[tokio::test]
    async fn test_initialize_fails_on_missing_directory() {
        let dir = TempDir::new().unwrap();
        let config = PollerConfig {
            directory: dir.path().join("missing"),
            interval: std::time::Duration::from_secs(10),
            series_step: Duration::hours(1),
        };
        let decoder = Decoder::new(Duration::hours(1), Arc::new(UnconfiguredPricingEngine));
        let scheduler = ActivationScheduler::new(Arc::new(decoder), EventStore::new());

        let result = DirectoryPoller::initialize(&config, scheduler).await;
        assert!(matches!(result, Err(InitError::Enumerate { .. })));
    }

    #[tokio::test]
    async fn test_shed_file_yields_constant_power_series() {
        let dir = TempDir::new().unwrap();
        write(
            &dir,
            "dr_shed.json",
            &json!([shed_entry("2024-01-01T01:00:00", "2024-01-01T03:00:00", 5)]),
        );
        let (mut poller, store) = poller(&dir).await;

        let report = poller.poll_once().await;
        assert_eq!(report.scheduled, 1);
        assert_eq!(poller.scheduled_count(&Category::Shed), Some(1));

        let records = store.snapshot().await;
        assert_eq!(records.len(), 1);
        let Some(Payload::Series(series)) = &records[0].payload else {
            panic!("expected a series payload");
        };
        assert_eq!(series.len(), 2);
        assert!(series.points().iter().all(|(_, value)| *value == 5.0));
    }

    #[tokio::test]
    async fn test_repoll_without_growth_is_idempotent() {
        let dir = TempDir::new().unwrap();
        write(
            &dir,
            "dr_shed.json",
            &json!([shed_entry("2024-01-01T01:00:00", "2024-01-01T03:00:00", 5)]),
        );
        let (mut poller, store) = poller(&dir).await;

        poller.poll_once().await;
        let report = poller.poll_once().await;
        assert_eq!(report.scheduled, 0);
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_growth_schedules_only_the_tail() {
        let dir = TempDir::new().unwrap();
        let first = shed_entry("2024-01-01T01:00:00", "2024-01-01T03:00:00", 1);
        write(&dir, "dr_shed.json", &json!([first.clone()]));
        let (mut poller, store) = poller(&dir).await;
        poller.poll_once().await;

        write(
            &dir,
            "dr_shed.json",
            &json!([
                first,
                shed_entry("2024-01-01T04:00:00", "2024-01-01T05:00:00", 2),
                shed_entry("2024-01-01T06:00:00", "2024-01-01T07:00:00", 3),
            ]),
        );
        let report = poller.poll_once().await;
        assert_eq!(report.scheduled, 2);
        assert_eq!(poller.scheduled_count(&Category::Shed), Some(3));

        let powers: Vec<f64> = store
            .snapshot()
            .await
            .iter()
            .filter_map(|record| match &record.payload {
                Some(Payload::Series(series)) => series.points().first().map(|(_, v)| *v),
                _ => None,
            })
            .collect();
        assert_eq!(powers, vec![1.0, 2.0, 3.0]);
    }

    #[tokio::test]
    async fn test_malformed_file_does_not_block_others() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("dr_limit.json"), "[{\"broken\": ").unwrap();
        write(
            &dir,
            "dr_shed.json",
            &json!([shed_entry("2024-01-01T01:00:00", "2024-01-01T03:00:00", 5)]),
        );
        let (mut poller, store) = poller(&dir).await;

        let report = poller.poll_once().await;
        assert_eq!(report.skipped_files, 1);
        assert_eq!(report.scheduled, 1);
        assert_eq!(poller.scheduled_count(&Category::Limit), Some(0));
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_non_array_file_leaves_count_untouched() {
        let dir = TempDir::new().unwrap();
        write(&dir, "dr_shed.json", &json!({"not": "a list"}));
        let (mut poller, _) = poller(&dir).await;

        let report = poller.poll_once().await;
        assert_eq!(report.skipped_files, 1);
        assert_eq!(poller.scheduled_count(&Category::Shed), Some(0));
    }

    #[tokio::test]
    async fn test_decode_failure_still_advances_count() {
        let dir = TempDir::new().unwrap();
        write(
            &dir,
            "dr_shed.json",
            &json!([
                { "notification-date": "garbage", "data": {} },
                shed_entry("2024-01-01T01:00:00", "2024-01-01T03:00:00", 5),
            ]),
        );
        let (mut poller, store) = poller(&dir).await;

        let report = poller.poll_once().await;
        assert_eq!(report.failed, 1);
        assert_eq!(report.scheduled, 1);
        assert_eq!(poller.scheduled_count(&Category::Shed), Some(2));

        let report = poller.poll_once().await;
        assert_eq!(report.failed, 0);
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_category_added_after_start_begins_at_zero() {
        let dir = TempDir::new().unwrap();
        let (mut poller, store) = poller(&dir).await;
        assert_eq!(poller.scheduled_count(&Category::Track), None);

        write(&dir, "dr_track.json", &json!([track_entry()]));
        poller.poll_once().await;
        assert_eq!(poller.scheduled_count(&Category::Track), Some(1));
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_unfiltered_listing_covers_every_category() {
        let dir = TempDir::new().unwrap();
        write(
            &dir,
            "dr_shed.json",
            &json!([shed_entry("2024-01-01T01:00:00", "2024-01-01T03:00:00", 5)]),
        );
        write(&dir, "dr_track.json", &json!([track_entry()]));
        let (mut poller, store) = poller(&dir).await;
        poller.poll_once().await;

        let EventListing::Tagged(entries) = store.process(ListEvents::default()).await.unwrap()
        else {
            panic!("expected tagged listing");
        };
        assert_eq!(entries.len(), 2);
        assert!(entries.iter().any(|e| e.category == Category::Shed));
        assert!(entries.iter().any(|e| e.category == Category::Track));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_symlinked_descriptor_file_is_watched() {
        let dir = TempDir::new().unwrap();
        let target = TempDir::new().unwrap();
        let source = target.path().join("shed.json");
        std::fs::write(
            &source,
            json!([shed_entry("2024-01-01T01:00:00", "2024-01-01T03:00:00", 5)]).to_string(),
        )
        .unwrap();
        std::os::unix::fs::symlink(&source, dir.path().join("dr_shed.json")).unwrap();

        let (mut poller, store) = poller(&dir).await;
        assert_eq!(poller.scheduled_count(&Category::Shed), Some(0));

        let report = poller.poll_once().await;
        assert_eq!(report.scheduled, 1);
        assert_eq!(store.len().await, 1);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_dangling_entry_does_not_abort_the_poll() {
        let dir = TempDir::new().unwrap();
        write(
            &dir,
            "dr_shed.json",
            &json!([shed_entry("2024-01-01T01:00:00", "2024-01-01T03:00:00", 5)]),
        );
        std::os::unix::fs::symlink(dir.path().join("gone.json"), dir.path().join("dr_limit.json"))
            .unwrap();

        let (mut poller, store) = poller(&dir).await;
        assert_eq!(poller.scheduled_count(&Category::Limit), None);

        let report = poller.poll_once().await;
        assert_eq!(report.files, 1);
        assert_eq!(report.scheduled, 1);
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_run_stops_on_shutdown() {
        let dir = TempDir::new().unwrap();
        let (poller, _) = poller(&dir).await;
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let handle = tokio::spawn(poller.run(shutdown_rx));
        shutdown_tx.send(true).unwrap();
        handle.await.unwrap();
    }
}

//! Pipeline execution implementation.

use super::progress::ProgressTracker;
use crate::core::cancel::CancellationToken;
use crate::core::cluster::{Cluster, ClusterOutcome, SeedClusterer, Threshold};
use crate::core::hasher::{HashAlgorithm, HashAlgorithmKind, HasherConfig, ImageHashValue};
use crate::core::scanner::{ImageWalker, ScanConfig, ScanOrder};
use crate::error::{ClusterError, HashError};
use crate::events::{null_sender, ClusterEvent, Event, EventSender, RunSummary};
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Files hashed per parallel batch, per rayon thread
const FILES_PER_THREAD: usize = 4;

/// How a run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    /// Every image was hashed and clustered
    Finished,
    /// Stopped early; `clusters` is not a complete partition
    Cancelled,
}

/// Result of pipeline execution
#[derive(Debug)]
pub struct RunResult {
    /// Reported clusters, in seed discovery order
    pub clusters: Vec<Cluster>,
    pub status: RunStatus,
    pub summary: RunSummary,
    /// Images that could not be hashed
    pub skipped: Vec<PathBuf>,
    /// One message per skipped image
    pub errors: Vec<String>,
}

impl RunResult {
    pub fn is_cancelled(&self) -> bool {
        self.status == RunStatus::Cancelled
    }
}

/// Configuration for the pipeline
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Root folder to enumerate
    pub folder: PathBuf,
    /// Hash algorithm to use
    pub algorithm: HashAlgorithmKind,
    /// Maximum distance from a seed (0-64)
    pub threshold: u32,
    /// Do not report clusters of one image
    pub skip_single: bool,
    /// Hash on the rayon pool instead of the calling thread
    pub parallel_hashing: bool,
    /// Enumerator configuration
    pub scan_config: ScanConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            folder: PathBuf::new(),
            algorithm: HashAlgorithmKind::default(),
            threshold: Threshold::default().value(),
            skip_single: false,
            parallel_hashing: true,
            scan_config: ScanConfig::default(),
        }
    }
}

/// Builder for pipeline configuration
#[derive(Debug, Clone, Default)]
pub struct PipelineBuilder {
    config: PipelineConfig,
}

impl PipelineBuilder {
    /// Create a new pipeline builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the folder to cluster
    pub fn folder(mut self, folder: impl Into<PathBuf>) -> Self {
        self.config.folder = folder.into();
        self
    }

    /// Set the hash algorithm
    pub fn algorithm(mut self, algorithm: HashAlgorithmKind) -> Self {
        self.config.algorithm = algorithm;
        self
    }

    /// Set the similarity threshold (validated by `build`)
    pub fn threshold(mut self, threshold: u32) -> Self {
        self.config.threshold = threshold;
        self
    }

    pub fn skip_single(mut self, skip: bool) -> Self {
        self.config.skip_single = skip;
        self
    }

    /// Hash files on the rayon pool (default) or sequentially
    pub fn parallel_hashing(mut self, parallel: bool) -> Self {
        self.config.parallel_hashing = parallel;
        self
    }

    /// Set scanner configuration
    pub fn scan_config(mut self, config: ScanConfig) -> Self {
        self.config.scan_config = config;
        self
    }

    /// Set the enumeration order
    pub fn order(mut self, order: ScanOrder) -> Self {
        self.config.scan_config.order = order;
        self
    }

    /// Include hidden files
    pub fn include_hidden(mut self, include: bool) -> Self {
        self.config.scan_config.include_hidden = include;
        self
    }

    /// Validate the configuration and build the pipeline.
    ///
    /// Fails on an out-of-range threshold or a missing folder.
    pub fn build(self) -> Result<Pipeline, ClusterError> {
        let threshold = Threshold::new(self.config.threshold)?;
        ImageWalker::check_root(&self.config.folder)?;
        let hasher = HasherConfig::new().algorithm(self.config.algorithm).build()?;

        Ok(Pipeline {
            config: self.config,
            threshold,
            hasher,
        })
    }
}

/// One clustering run: enumerate, hash, cluster
pub struct Pipeline {
    config: PipelineConfig,
    threshold: Threshold,
    hasher: Box<dyn HashAlgorithm>,
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("config", &self.config)
            .field("threshold", &self.threshold)
            .finish_non_exhaustive()
    }
}

struct HashingOutput {
    total: usize,
    hashes: Vec<(PathBuf, ImageHashValue)>,
    skipped: Vec<PathBuf>,
    errors: Vec<String>,
}

impl Pipeline {
    /// Create a new pipeline builder
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::new()
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run to completion without events
    pub fn run(&self) -> Result<RunResult, ClusterError> {
        self.run_with_events(&null_sender(), &CancellationToken::new())
    }

    /// Run with event reporting and cooperative cancellation.
    ///
    /// Per-file failures are logged and skipped. The last event sent is
    /// `Finished` or `Cancelled`, never both. Returns `Err` without a
    /// terminal event only if the folder disappeared before the walk.
    pub fn run_with_events(
        &self,
        events: &EventSender,
        cancel: &CancellationToken,
    ) -> Result<RunResult, ClusterError> {
        let start_time = Instant::now();
        let mut progress = ProgressTracker::new(events.clone());

        info!(
            folder = %self.config.folder.display(),
            algorithm = %self.config.algorithm,
            threshold = %self.threshold,
            skip_single = self.config.skip_single,
            "Starting clustering run"
        );

        // The folder may have gone away since `build`
        ImageWalker::check_root(&self.config.folder)?;

        let hashed = match self.hash_all(&mut progress, cancel) {
            Some(output) => output,
            None => return Ok(self.cancelled(events, Vec::new(), RunSummary::default())),
        };

        let mut summary = RunSummary {
            total_images: hashed.total,
            hashed_images: hashed.hashes.len(),
            skipped_images: hashed.skipped.len(),
            ..RunSummary::default()
        };

        if hashed.total == 0 {
            progress.no_images();
            summary.duration_ms = start_time.elapsed().as_millis() as u64;
            info!("No images found");
            events.send(Event::Cluster(ClusterEvent::Finished(summary.clone())));
            return Ok(RunResult {
                clusters: Vec::new(),
                status: RunStatus::Finished,
                summary,
                skipped: hashed.skipped,
                errors: hashed.errors,
            });
        }

        let clusterer = SeedClusterer::new(self.threshold).skip_single(self.config.skip_single);
        let outcome = clusterer.cluster_with_progress(&hashed.hashes, cancel, |step| {
            if step.reported {
                events.send(Event::Cluster(ClusterEvent::ClusterFound(step.cluster.clone())));
            }
            progress.cluster_completed(step.consumed, step.total, step.cluster.len());
        });

        summary.clusters_reported = outcome.clusters().len();
        summary.duration_ms = start_time.elapsed().as_millis() as u64;

        match outcome {
            ClusterOutcome::Cancelled(clusters) => Ok(self.cancelled(events, clusters, summary)),
            ClusterOutcome::Completed(clusters) => {
                if hashed.hashes.is_empty() {
                    // Every file failed to hash; close the clustering phase anyway
                    progress.cluster_completed(0, 0, 0);
                }
                info!(
                    clusters = clusters.len(),
                    hashed = summary.hashed_images,
                    skipped = summary.skipped_images,
                    duration_ms = summary.duration_ms,
                    "Clustering finished"
                );
                events.send(Event::Cluster(ClusterEvent::Finished(summary.clone())));
                Ok(RunResult {
                    clusters,
                    status: RunStatus::Finished,
                    summary,
                    skipped: hashed.skipped,
                    errors: hashed.errors,
                })
            }
        }
    }

    /// Hash every enumerated image, in enumeration order.
    ///
    /// Returns `None` when cancelled.
    fn hash_all(
        &self,
        progress: &mut ProgressTracker,
        cancel: &CancellationToken,
    ) -> Option<HashingOutput> {
        let walker = ImageWalker::new(self.config.scan_config.clone());
        let total = walker.count(&self.config.folder);
        debug!(total, "Enumerated images");

        let batch_size = if self.config.parallel_hashing {
            rayon::current_num_threads() * FILES_PER_THREAD
        } else {
            1
        };

        let mut output = HashingOutput {
            total,
            hashes: Vec::with_capacity(total),
            skipped: Vec::new(),
            errors: Vec::new(),
        };
        let mut paths = walker.walk(&self.config.folder);
        let mut done = 0;

        loop {
            if cancel.is_cancelled() {
                return None;
            }

            let batch: Vec<PathBuf> = paths.by_ref().take(batch_size).collect();
            if batch.is_empty() {
                break;
            }

            let results: Vec<Result<ImageHashValue, HashError>> = if self.config.parallel_hashing {
                batch.par_iter().map(|path| self.hash_one(path)).collect()
            } else {
                batch.iter().map(|path| self.hash_one(path)).collect()
            };

            for (path, result) in batch.into_iter().zip(results) {
                done += 1;
                // Files created after the counting walk can push `done` past it
                output.total = output.total.max(done);
                progress.file_hashed(done, output.total, &path);

                match result {
                    Ok(hash) => output.hashes.push((path, hash)),
                    Err(e) => {
                        warn!(path = %path.display(), error = %e, "Skipping unreadable image");
                        output.errors.push(e.to_string());
                        output.skipped.push(path);
                    }
                }
            }
        }

        Some(output)
    }

    fn hash_one(&self, path: &Path) -> Result<ImageHashValue, HashError> {
        debug!(path = %path.display(), "Hashing");
        self.hasher.hash_file(path)
    }

    fn cancelled(&self, events: &EventSender, clusters: Vec<Cluster>, summary: RunSummary) -> RunResult {
        info!(clusters = clusters.len(), "Clustering cancelled");
        events.send(Event::Cluster(ClusterEvent::Cancelled));
        RunResult {
            clusters,
            status: RunStatus::Cancelled,
            summary,
            skipped: Vec::new(),
            errors: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventChannel;
    use image::{Rgb, RgbImage};
    use tempfile::TempDir;

    fn write_gradient(dir: &Path, name: &str, reversed: bool) -> PathBuf {
        let image = RgbImage::from_fn(32, 32, |x, _| {
            let v = (if reversed { 248 - x * 8 } else { x * 8 }) as u8;
            Rgb([v, v, v])
        });
        let path = dir.join(name);
        image.save(&path).unwrap();
        path
    }

    fn progress_percents(events: &[Event]) -> Vec<u8> {
        events
            .iter()
            .filter_map(|e| match e {
                Event::Cluster(ClusterEvent::Progress(p)) => Some(p.percent),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn builder_rejects_out_of_range_threshold() {
        let dir = TempDir::new().unwrap();
        let err = Pipeline::builder()
            .folder(dir.path())
            .threshold(65)
            .build()
            .unwrap_err();

        assert!(matches!(err, ClusterError::InvalidThreshold { value: 65 }));
    }

    #[test]
    fn builder_rejects_missing_folder() {
        let err = Pipeline::builder()
            .folder("/definitely/not/here")
            .build()
            .unwrap_err();

        assert!(matches!(err, ClusterError::Scan(_)));
    }

    #[test]
    fn builder_defaults() {
        let dir = TempDir::new().unwrap();
        let pipeline = Pipeline::builder().folder(dir.path()).build().unwrap();

        assert_eq!(pipeline.config().threshold, 5);
        assert_eq!(pipeline.config().algorithm, HashAlgorithmKind::Average);
        assert!(pipeline.config().parallel_hashing);
        assert!(!pipeline.config().skip_single);
    }

    #[test]
    fn empty_folder_finishes_with_no_images_message() {
        let dir = TempDir::new().unwrap();
        let (sender, receiver) = EventChannel::new();
        let pipeline = Pipeline::builder().folder(dir.path()).build().unwrap();

        let result = pipeline
            .run_with_events(&sender, &CancellationToken::new())
            .unwrap();
        let events = receiver.drain();

        assert_eq!(result.status, RunStatus::Finished);
        assert!(result.clusters.is_empty());
        assert_eq!(events.len(), 2);
        match &events[0] {
            Event::Cluster(ClusterEvent::Progress(p)) => {
                assert_eq!(p.percent, 0);
                assert_eq!(p.message, "No images found");
            }
            other => panic!("unexpected first event {other:?}"),
        }
        assert!(matches!(events[1], Event::Cluster(ClusterEvent::Finished(_))));
    }

    #[test]
    fn identical_images_share_a_cluster() {
        let dir = TempDir::new().unwrap();
        write_gradient(dir.path(), "a.png", false);
        write_gradient(dir.path(), "b.png", false);
        write_gradient(dir.path(), "c.png", true);

        for parallel in [true, false] {
            let result = Pipeline::builder()
                .folder(dir.path())
                .threshold(0)
                .parallel_hashing(parallel)
                .build()
                .unwrap()
                .run()
                .unwrap();

            assert_eq!(result.clusters.len(), 2);
            assert_eq!(
                result.clusters[0].images(),
                &[dir.path().join("a.png"), dir.path().join("b.png")]
            );
            assert_eq!(result.clusters[1].images(), &[dir.path().join("c.png")]);
        }
    }

    #[test]
    fn unreadable_files_are_skipped_not_fatal() {
        let dir = TempDir::new().unwrap();
        write_gradient(dir.path(), "good.png", false);
        std::fs::write(dir.path().join("broken.jpg"), b"not an image").unwrap();
        std::fs::File::create(dir.path().join("empty.gif")).unwrap();

        let result = Pipeline::builder().folder(dir.path()).build().unwrap().run().unwrap();

        assert_eq!(result.summary.total_images, 3);
        assert_eq!(result.summary.hashed_images, 1);
        assert_eq!(result.summary.skipped_images, 2);
        assert_eq!(result.errors.len(), 2);
        assert_eq!(result.clusters.len(), 1);
        assert!(!result.clusters[0].contains(&dir.path().join("broken.jpg")));
    }

    #[test]
    fn progress_is_monotonic_and_reaches_one_hundred() {
        let dir = TempDir::new().unwrap();
        for i in 0..6 {
            write_gradient(dir.path(), &format!("{i}.png"), i % 2 == 0);
        }
        let (sender, receiver) = EventChannel::new();

        Pipeline::builder()
            .folder(dir.path())
            .skip_single(true)
            .build()
            .unwrap()
            .run_with_events(&sender, &CancellationToken::new())
            .unwrap();

        let percents = progress_percents(&receiver.drain());
        assert!(percents.windows(2).all(|w| w[0] <= w[1]), "{percents:?}");
        assert_eq!(percents.last(), Some(&100));
    }

    #[test]
    fn cancelled_run_never_finishes() {
        let dir = TempDir::new().unwrap();
        write_gradient(dir.path(), "a.png", false);
        let (sender, receiver) = EventChannel::new();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let result = Pipeline::builder()
            .folder(dir.path())
            .build()
            .unwrap()
            .run_with_events(&sender, &cancel)
            .unwrap();

        assert!(result.is_cancelled());
        let events = receiver.drain();
        assert!(matches!(events.last(), Some(Event::Cluster(ClusterEvent::Cancelled))));
        assert!(!events
            .iter()
            .any(|e| matches!(e, Event::Cluster(ClusterEvent::Finished(_)))));
    }
}

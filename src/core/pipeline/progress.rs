//! Progress accounting for a clustering run.

use crate::events::{ClusterEvent, Event, EventSender, ProgressUpdate, RunPhase};
use std::path::Path;

/// Percentage at which hashing ends and clustering begins
pub const HASHING_SHARE: u8 = 50;

/// Map `done` of `total` hashed files into 0..=50
pub fn hashing_percent(done: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    let done = done.min(total);
    (done * HASHING_SHARE as usize / total) as u8
}

/// Map `consumed` of `total` clustered images into 50..=100
pub fn clustering_percent(consumed: usize, total: usize) -> u8 {
    if total == 0 {
        return 100;
    }
    let consumed = consumed.min(total);
    HASHING_SHARE + (consumed * (100 - HASHING_SHARE as usize) / total) as u8
}

/// Sends progress events that never go backwards and never exceed 100.
pub struct ProgressTracker {
    events: EventSender,
    last: u8,
}

impl ProgressTracker {
    pub fn new(events: EventSender) -> Self {
        Self { events, last: 0 }
    }

    /// The last percentage sent
    pub fn percent(&self) -> u8 {
        self.last
    }

    /// Send a progress update, raising `percent` to the last value if needed
    pub fn report(&mut self, percent: u8, message: impl Into<String>, phase: RunPhase) {
        let percent = percent.min(100).max(self.last);
        self.last = percent;
        self.events.send(Event::Cluster(ClusterEvent::Progress(ProgressUpdate {
            percent,
            message: message.into(),
            phase,
        })));
    }

    pub fn no_images(&mut self) {
        self.report(0, "No images found", RunPhase::Hashing);
    }

    /// One file visited by the hasher, whether or not it hashed
    pub fn file_hashed(&mut self, done: usize, total: usize, path: &Path) {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        self.report(
            hashing_percent(done, total),
            format!("Processing: {name}"),
            RunPhase::Hashing,
        );
    }

    /// One cluster completed, reported or not
    pub fn cluster_completed(&mut self, consumed: usize, total: usize, cluster_len: usize) {
        self.report(
            clustering_percent(consumed, total),
            format!("Clustering: {cluster_len} images found"),
            RunPhase::Clustering,
        );
    }
}

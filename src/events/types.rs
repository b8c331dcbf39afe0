//! Event type definitions for progress reporting.

use crate::core::cluster::Cluster;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// All events emitted by background work
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    /// Similarity clustering run events
    Cluster(ClusterEvent),
    /// Batch auto-labelling events
    AutoLabel(AutoLabelEvent),
}

/// Events of one clustering run.
///
/// `Finished`, `Cancelled` and `Failed` are terminal and mutually exclusive:
/// a run emits exactly one of them, as its last event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ClusterEvent {
    /// Percentage and status line. Hashing covers 0-50, clustering 50-100.
    Progress(ProgressUpdate),
    /// A completed cluster, in seed discovery order
    ClusterFound(Cluster),
    /// The run completed normally
    Finished(RunSummary),
    /// The run stopped because cancellation was requested
    Cancelled,
    /// The run could not continue
    Failed { message: String },
}

/// Progress information for a clustering run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressUpdate {
    /// Overall completion, 0-100
    pub percent: u8,
    /// Human-readable status line
    pub message: String,
    /// Phase that produced this update
    pub phase: RunPhase,
}

/// Phases of a clustering run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunPhase {
    Hashing,
    Clustering,
}

impl std::fmt::Display for RunPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunPhase::Hashing => write!(f, "Hashing"),
            RunPhase::Clustering => write!(f, "Clustering"),
        }
    }
}

/// Summary of a finished run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Image files found by the enumerator
    pub total_images: usize,
    /// Images that produced a hash
    pub hashed_images: usize,
    /// Images skipped because they could not be read or decoded
    pub skipped_images: usize,
    /// Clusters delivered through `ClusterFound`
    pub clusters_reported: usize,
    /// Duration in milliseconds
    pub duration_ms: u64,
}

/// Events of a batch auto-labelling run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum AutoLabelEvent {
    /// About to process image `current` of `total` (1-based)
    Progress {
        current: usize,
        total: usize,
        path: PathBuf,
    },
    /// All images were visited
    Finished {
        labeled: usize,
        skipped: usize,
        failed: usize,
    },
    /// Stopped early on request
    Cancelled,
}

//! # Core Module
//!
//! The GUI-agnostic clustering engine and its neighbours.
//!
//! ## Modules
//! - `scanner` - Enumerates image files below a folder
//! - `hasher` - Computes perceptual hashes
//! - `cluster` - Groups hashes around seeds
//! - `pipeline` - Runs enumerate, hash and cluster with progress
//! - `runner` - Owns the worker thread a run executes on
//! - `review` - Size-ordered clusters and duplicate deletion
//! - `labels` - YOLO label files
//! - `autolabel` - Batch labelling through an object detector

pub mod autolabel;
pub mod cancel;
pub mod cluster;
pub mod hasher;
pub mod labels;
pub mod pipeline;
pub mod review;
pub mod runner;
pub mod scanner;

// Re-export commonly used types
pub use cancel::CancellationToken;
pub use cluster::{Cluster, Threshold, ThresholdPreset};
pub use hasher::{HashAlgorithmKind, PerceptualHash};
pub use labels::{LabelLayout, YoloLabel};
pub use runner::ClusterRunner;

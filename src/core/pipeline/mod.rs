//! # Pipeline Module
//!
//! Runs one clustering pass over a folder.
//!
//! ## Pipeline Stages
//! 1. **Enumerate** - Count, then lazily walk, the image files below the folder
//! 2. **Hash** - Compute one perceptual hash per file (progress 0-50%)
//! 3. **Cluster** - Seed-anchored grouping of the hashes (progress 50-100%)
//!
//! ## Parallelism
//! Hashing runs on the rayon pool in small batches; results are put back
//! in enumeration order before clustering, since order decides which
//! image seeds each cluster.

mod executor;
mod progress;

pub use crate::core::cancel::CancellationToken;
pub use executor::{Pipeline, PipelineBuilder, PipelineConfig, RunResult, RunStatus};
pub use progress::{clustering_percent, hashing_percent, ProgressTracker, HASHING_SHARE};

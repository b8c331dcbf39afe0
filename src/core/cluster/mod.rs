//! # Cluster Module
//!
//! Groups hashed images into clusters of visually similar images.
//!
//! ## How It Works
//! Clusters grow around a *seed*: the first unassigned image in
//! enumeration order. Every later unassigned image within `threshold`
//! Hamming distance of the seed joins it. Members are never compared with
//! each other, so this is deliberately not transitive single-link
//! clustering. See [`SeedClusterer`].
//!
//! ## Threshold Presets
//! | Preset | Distance |
//! |--------|----------|
//! | Strict | 2        |
//! | Normal | 5        |
//! | Loose  | 10       |

mod seed;
mod threshold;

pub use seed::{ClusterOutcome, ClusterStep, SeedClusterer};
pub use threshold::{Threshold, ThresholdPreset, MAX_THRESHOLD};

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// An ordered group of similar images.
///
/// Element 0 is the seed and the representative: the image to keep when
/// the rest are discarded as duplicates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cluster {
    images: Vec<PathBuf>,
}

impl Cluster {
    /// Create a cluster from images in discovery order
    pub fn new(images: Vec<PathBuf>) -> Self {
        Self { images }
    }

    /// Start a cluster with its seed
    pub fn seeded(seed: PathBuf) -> Self {
        Self { images: vec![seed] }
    }

    pub(crate) fn push(&mut self, image: PathBuf) {
        self.images.push(image);
    }

    /// The image to keep, if any remain
    pub fn representative(&self) -> Option<&Path> {
        self.images.first().map(PathBuf::as_path)
    }

    /// Everything after the representative
    pub fn duplicates(&self) -> &[PathBuf] {
        self.images.get(1..).unwrap_or(&[])
    }

    /// All images, representative first
    pub fn images(&self) -> &[PathBuf] {
        &self.images
    }

    /// Number of images in the cluster
    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    /// Number of duplicates (excluding the representative)
    pub fn duplicate_count(&self) -> usize {
        self.images.len().saturating_sub(1)
    }

    pub fn contains(&self, image: &Path) -> bool {
        self.images.iter().any(|p| p == image)
    }

    /// Remove one image, keeping the order of the rest
    pub(crate) fn remove(&mut self, image: &Path) -> bool {
        match self.images.iter().position(|p| p == image) {
            Some(index) => {
                self.images.remove(index);
                true
            }
            None => false,
        }
    }

    /// Keep only the images for which `keep` returns true
    pub(crate) fn retain(&mut self, mut keep: impl FnMut(&Path) -> bool) {
        self.images.retain(|p| keep(p));
    }
}

/// Stable sort by descending size, the order clusters are shown in.
///
/// Equal-sized clusters keep their discovery order.
pub fn sort_by_size_desc(clusters: &mut [Cluster]) {
    clusters.sort_by(|a, b| b.len().cmp(&a.len()));
}

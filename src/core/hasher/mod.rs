//! # Hasher Module
//!
//! Turns decoded images into 64-bit perceptual hashes.
//!
//! | selector  | algorithm                                  |
//! |-----------|--------------------------------------------|
//! | `average` | mean brightness per cell (default)         |
//! | `phash`   | DCT low-frequency block against its mean   |
//! | `dhash`   | horizontal brightness gradient             |
//!
//! Two hashes are compared by Hamming distance, 0 to 64.
//!
//! ```rust,ignore
//! use image_cluster::core::hasher::{HasherConfig, HashAlgorithmKind};
//!
//! let hasher = HasherConfig::new()
//!     .algorithm(HashAlgorithmKind::Difference)
//!     .build()?;
//! let hash = hasher.hash_file(&path)?;
//! ```

mod grid;
mod traits;

pub use grid::GridHasher;
pub use traits::{HashAlgorithm, HashAlgorithmKind, ImageHashValue, PerceptualHash};

use crate::error::HashError;

/// Default edge length of the hash grid (8x8 = 64 bits)
pub const DEFAULT_HASH_SIZE: u32 = 8;

/// Configuration builder for hashers
#[derive(Debug, Clone)]
pub struct HasherConfig {
    /// Hash grid edge length
    hash_size: u32,
    /// Algorithm to use
    algorithm: HashAlgorithmKind,
}

impl HasherConfig {
    /// Create a new hasher configuration with defaults
    pub fn new() -> Self {
        Self {
            hash_size: DEFAULT_HASH_SIZE,
            algorithm: HashAlgorithmKind::Average,
        }
    }

    /// Set the hash grid edge length.
    ///
    /// The clustering threshold range of 0-64 assumes the default of 8.
    pub fn hash_size(mut self, size: u32) -> Self {
        self.hash_size = size;
        self
    }

    /// Set the hash algorithm
    pub fn algorithm(mut self, algorithm: HashAlgorithmKind) -> Self {
        self.algorithm = algorithm;
        self
    }

    /// Build the hasher
    pub fn build(self) -> Result<Box<dyn HashAlgorithm>, HashError> {
        if self.hash_size == 0 {
            return Err(HashError::InvalidHashSize {
                size: self.hash_size,
            });
        }

        Ok(Box::new(GridHasher::new(self.algorithm, self.hash_size)))
    }
}

impl Default for HasherConfig {
    fn default() -> Self {
        Self::new()
    }
}

//! Trait definitions for perceptual hashing.

use crate::error::HashError;
use image::{DynamicImage, ImageReader};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::str::FromStr;

/// A computed perceptual hash that can be compared
pub trait PerceptualHash: Clone + Send + Sync {
    /// Compute the Hamming distance to another hash
    ///
    /// Returns the number of bits that differ between the two hashes.
    /// Lower distance = more similar images.
    fn distance(&self, other: &Self) -> u32;

    /// Get the raw hash bytes
    fn as_bytes(&self) -> &[u8];

    /// Get the hash as a hexadecimal string
    fn to_hex(&self) -> String {
        self.as_bytes().iter().map(|b| format!("{:02x}", b)).collect()
    }

    /// Get the total number of bits in this hash
    fn bit_count(&self) -> u32 {
        (self.as_bytes().len() * 8) as u32
    }
}

/// The three interchangeable hash algorithms.
///
/// Hashes from different algorithms are not comparable; a run uses one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HashAlgorithmKind {
    /// Average Hash (aHash) - pixels compared to the mean brightness
    #[default]
    Average,
    /// Perceptual Hash (pHash) - DCT coefficients compared to their mean
    #[serde(rename = "phash", alias = "perceptual")]
    Perceptual,
    /// Difference Hash (dHash) - brightness gradient between neighbours
    #[serde(rename = "dhash", alias = "difference")]
    Difference,
}

impl HashAlgorithmKind {
    /// All selectable algorithms, in menu order
    pub const ALL: [HashAlgorithmKind; 3] = [
        HashAlgorithmKind::Average,
        HashAlgorithmKind::Perceptual,
        HashAlgorithmKind::Difference,
    ];

    /// Canonical selector name
    pub fn as_str(&self) -> &'static str {
        match self {
            HashAlgorithmKind::Average => "average",
            HashAlgorithmKind::Perceptual => "phash",
            HashAlgorithmKind::Difference => "dhash",
        }
    }
}

impl FromStr for HashAlgorithmKind {
    type Err = HashError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "average" | "average_hash" | "ahash" => Ok(HashAlgorithmKind::Average),
            "phash" | "perceptual" => Ok(HashAlgorithmKind::Perceptual),
            "dhash" | "difference" => Ok(HashAlgorithmKind::Difference),
            _ => Err(HashError::UnknownAlgorithm {
                name: s.to_string(),
            }),
        }
    }
}

impl std::fmt::Display for HashAlgorithmKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HashAlgorithmKind::Average => write!(f, "aHash"),
            HashAlgorithmKind::Perceptual => write!(f, "pHash"),
            HashAlgorithmKind::Difference => write!(f, "dHash"),
        }
    }
}

/// Trait for hash algorithm implementations
pub trait HashAlgorithm: Send + Sync {
    /// Compute a hash from an already-decoded image
    fn hash_image(&self, image: &DynamicImage) -> Result<ImageHashValue, HashError>;

    /// Open, decode and hash one file.
    ///
    /// The decoded image is dropped before returning; only the hash
    /// survives.
    fn hash_file(&self, path: &Path) -> Result<ImageHashValue, HashError> {
        let metadata = fs::metadata(path).map_err(|e| HashError::IoError {
            path: path.to_path_buf(),
            source: e,
        })?;
        if metadata.len() == 0 {
            return Err(HashError::EmptyImage {
                path: path.to_path_buf(),
            });
        }

        let io_error = |source| HashError::IoError {
            path: path.to_path_buf(),
            source,
        };
        // Format comes from the leading bytes, not the extension
        let image = ImageReader::open(path)
            .and_then(|reader| reader.with_guessed_format())
            .map_err(io_error)?
            .decode()
            .map_err(|e| HashError::DecodeError {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;

        self.hash_image(&image).map_err(|e| match e {
            HashError::EmptyImage { .. } => HashError::EmptyImage {
                path: path.to_path_buf(),
            },
            other => other,
        })
    }

    /// Get the algorithm kind
    fn kind(&self) -> HashAlgorithmKind;
}

/// Concrete hash value type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageHashValue {
    /// The raw hash bytes
    bytes: Vec<u8>,
    /// The algorithm that produced this hash
    algorithm: HashAlgorithmKind,
}

impl ImageHashValue {
    /// Create a new hash value
    pub fn new(bytes: Vec<u8>, algorithm: HashAlgorithmKind) -> Self {
        Self { bytes, algorithm }
    }

    /// Create a 64-bit hash from an integer, most significant byte first
    pub fn from_u64(bits: u64, algorithm: HashAlgorithmKind) -> Self {
        Self::new(bits.to_be_bytes().to_vec(), algorithm)
    }

    /// Get the algorithm that produced this hash
    pub fn algorithm(&self) -> HashAlgorithmKind {
        self.algorithm
    }
}

impl PerceptualHash for ImageHashValue {
    fn distance(&self, other: &Self) -> u32 {
        debug_assert_eq!(
            self.algorithm, other.algorithm,
            "hashes from different algorithms are not comparable"
        );
        self.bytes
            .iter()
            .zip(other.bytes.iter())
            .map(|(a, b)| (a ^ b).count_ones())
            .sum()
    }

    fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

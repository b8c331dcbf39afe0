//! Grid hashers backed by `image_hasher`.
//!
//! Every algorithm shrinks the image to a `size`x`size` grayscale grid and
//! emits one bit per cell:
//! - aHash: cell brighter than the grid mean
//! - dHash: cell brighter than its right-hand neighbour
//! - pHash: DCT coefficient above the mean of the low-frequency block

use super::traits::{HashAlgorithm, HashAlgorithmKind, ImageHashValue};
use crate::error::HashError;
use image::{DynamicImage, GenericImageView};
use image_hasher::{HashAlg, Hasher, HasherConfig as BackendConfig};
use std::path::PathBuf;

/// A configured `image_hasher` tagged with the algorithm it computes
pub struct GridHasher {
    kind: HashAlgorithmKind,
    backend: Hasher,
}

impl GridHasher {
    pub fn new(kind: HashAlgorithmKind, size: u32) -> Self {
        let config = BackendConfig::new().hash_size(size, size);
        let config = match kind {
            HashAlgorithmKind::Average => config.hash_alg(HashAlg::Mean),
            HashAlgorithmKind::Difference => config.hash_alg(HashAlg::Gradient),
            HashAlgorithmKind::Perceptual => config.hash_alg(HashAlg::Mean).preproc_dct(),
        };

        Self {
            kind,
            backend: config.to_hasher(),
        }
    }
}

impl HashAlgorithm for GridHasher {
    fn hash_image(&self, image: &DynamicImage) -> Result<ImageHashValue, HashError> {
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return Err(HashError::EmptyImage {
                path: PathBuf::new(),
            });
        }

        let hash = self.backend.hash_image(image);
        Ok(ImageHashValue::new(hash.as_bytes().to_vec(), self.kind))
    }

    fn kind(&self) -> HashAlgorithmKind {
        self.kind
    }
}

#[cfg(test)]
mod tests {
    use super::super::traits::PerceptualHash;
    use super::*;
    use image::{ImageBuffer, Rgb};

    fn solid(v: u8) -> DynamicImage {
        DynamicImage::ImageRgb8(ImageBuffer::from_pixel(100, 100, Rgb([v, v, v])))
    }

    fn ramp(rising: bool) -> DynamicImage {
        DynamicImage::ImageRgb8(ImageBuffer::from_fn(100, 100, |x, _| {
            let step = if rising { x } else { 99 - x };
            let v = (step * 255 / 99) as u8;
            Rgb([v, v, v])
        }))
    }

    #[test]
    fn same_image_hashes_to_distance_zero() {
        for kind in HashAlgorithmKind::ALL {
            let hasher = GridHasher::new(kind, 8);
            let a = hasher.hash_image(&ramp(true)).unwrap();
            let b = hasher.hash_image(&ramp(true)).unwrap();
            assert_eq!(a.distance(&b), 0, "{kind}");
        }
    }

    #[test]
    fn mirrored_ramps_differ_under_every_algorithm() {
        for kind in HashAlgorithmKind::ALL {
            let hasher = GridHasher::new(kind, 8);
            let a = hasher.hash_image(&ramp(true)).unwrap();
            let b = hasher.hash_image(&ramp(false)).unwrap();
            assert!(a.distance(&b) > 0, "{kind}");
        }
    }

    #[test]
    fn mean_hash_of_mirrored_ramps_is_mostly_inverted() {
        let hasher = GridHasher::new(HashAlgorithmKind::Average, 8);
        let a = hasher.hash_image(&ramp(true)).unwrap();
        let b = hasher.hash_image(&ramp(false)).unwrap();
        assert!(a.distance(&b) > 32);
    }

    #[test]
    fn size_eight_gives_64_bits_tagged_with_kind() {
        for kind in HashAlgorithmKind::ALL {
            let hash = GridHasher::new(kind, 8).hash_image(&solid(128)).unwrap();
            assert_eq!(hash.bit_count(), 64);
            assert_eq!(hash.algorithm(), kind);
        }
    }

    #[test]
    fn zero_sized_image_is_rejected() {
        let hasher = GridHasher::new(HashAlgorithmKind::Difference, 8);
        let empty = DynamicImage::new_rgb8(0, 0);
        assert!(matches!(
            hasher.hash_image(&empty),
            Err(HashError::EmptyImage { .. })
        ));
    }
}

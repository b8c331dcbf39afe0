//! # Scanner Module
//!
//! Enumerates image files below a folder, lazily.
//!
//! ## Recognised Formats
//! Matched by extension, case-insensitive:
//! - PNG (.png)
//! - JPEG (.jpg, .jpeg)
//! - BMP (.bmp)
//! - GIF (.gif)
//!
//! ## Example
//! ```rust,ignore
//! use image_cluster::core::scanner::{ImageWalker, ScanConfig};
//!
//! let walker = ImageWalker::new(ScanConfig::default());
//! for path in walker.walk("/data/images".as_ref()) {
//!     println!("{}", path.display());
//! }
//! ```

mod filter;
mod walker;

pub use filter::ImageFilter;
pub use walker::{ImagePaths, ImageWalker, ScanConfig, ScanOrder};

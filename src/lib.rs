//! # Image Cluster
//!
//! Groups visually similar images by perceptual hash and keeps their YOLO
//! label files in step when duplicates are deleted.
//!
//! ## How Clustering Works
//! - **Hash** every image once (aHash, pHash or dHash, 64 bits)
//! - **Seed** a cluster with the first unassigned image
//! - **Join** every later image within the threshold of that seed
//!
//! ## Architecture
//! The library is split into a core engine (GUI-agnostic) and presentation layers:
//! - `core` - Enumeration, hashing, clustering, labels and deletion
//! - `events` - One-way event stream from worker to caller
//! - `error` - Typed errors
//! - `config` - Persisted user settings

pub mod config;
pub mod core;
pub mod error;
pub mod events;

// Re-export commonly used types at the crate root
pub use error::{ClusterError, Result};

/// Initialize tracing for the application.
///
/// `RUST_LOG` takes precedence; otherwise `verbose` selects `debug` over
/// `warn`. Does nothing if a subscriber is already installed.
pub fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

//! # image-cluster CLI
//!
//! Command-line interface for image similarity clustering.
//!
//! ## Usage
//! ```bash
//! image-cluster cluster ~/dataset/images --threshold 5
//! image-cluster cluster ~/dataset/images --verbose --output json
//! ```

mod cli;

use image_cluster::Result;
use std::process::ExitCode;

fn main() -> Result<ExitCode> {
    cli::run()
}

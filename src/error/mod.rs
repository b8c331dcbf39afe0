//! # Error Module
//!
//! Typed errors for the image clustering engine and its neighbours.
//!
//! ## Design Principles
//! - **Never panic** on user data - return errors instead
//! - **Include context** - paths and what went wrong
//! - **Per-file failures are recoverable** - callers log and skip them
//! - **Invalid run parameters fail fast** - before any worker thread exists

use std::path::PathBuf;
use thiserror::Error;

/// Top-level application error
#[derive(Error, Debug)]
pub enum ClusterError {
    #[error("Scanning error: {0}")]
    Scan(#[from] ScanError),

    #[error("Hashing error: {0}")]
    Hash(#[from] HashError),

    #[error("Label error: {0}")]
    Label(#[from] LabelError),

    #[error("Delete error: {0}")]
    Delete(#[from] DeleteError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Detection error: {0}")]
    Detect(#[from] DetectError),

    #[error("Invalid threshold: {value} (must be 0-64)")]
    InvalidThreshold { value: u32 },

    #[error("Failed to start clustering worker: {0}")]
    Worker(#[source] std::io::Error),
}

/// Errors that occur while enumerating image files
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Directory not found: {path}")]
    DirectoryNotFound { path: PathBuf },

    #[error("Not a directory: {path}")]
    NotADirectory { path: PathBuf },

    #[error("Permission denied accessing: {path}")]
    PermissionDenied { path: PathBuf },

    #[error("Failed to read directory {path}: {reason}")]
    ReadDirectory { path: PathBuf, reason: String },
}

/// Errors from building a hasher or hashing a single image.
///
/// `UnknownAlgorithm` and `InvalidHashSize` reject a run before it starts.
/// The per-file variants are recoverable: the image is left out of the run.
#[derive(Error, Debug)]
pub enum HashError {
    #[error("Unknown hash algorithm: {name} (expected average, phash or dhash)")]
    UnknownAlgorithm { name: String },

    #[error("Invalid hash size: {size}")]
    InvalidHashSize { size: u32 },

    #[error("Failed to decode image {path}: {reason}")]
    DecodeError { path: PathBuf, reason: String },

    #[error("Image is empty or corrupted: {path}")]
    EmptyImage { path: PathBuf },

    #[error("Failed to open image file {path}: {source}")]
    IoError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors from the YOLO label store
#[derive(Error, Debug)]
pub enum LabelError {
    #[error("Failed to read labels from {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write labels to {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid label line {line:?}: {reason}")]
    InvalidLine { line: String, reason: String },

    #[error("Image path has no file name: {path}")]
    NoFileName { path: PathBuf },
}

/// Errors from deleting images and their labels
#[derive(Error, Debug)]
pub enum DeleteError {
    #[error("No cluster at index {index}")]
    NoSuchCluster { index: usize },

    #[error("Failed to delete image {path}: {reason}")]
    Image { path: PathBuf, reason: String },

    #[error("Deleted image {path} but failed to delete its label {label}: {reason}")]
    Label {
        path: PathBuf,
        label: PathBuf,
        reason: String,
    },
}

/// Errors from loading or saving user settings
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("No configuration directory available on this platform")]
    NoConfigDir,

    #[error("Failed to access settings file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Settings file {path} is malformed: {source}. Delete it to restore defaults.")]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Errors from running an object detector on one image
#[derive(Error, Debug)]
pub enum DetectError {
    #[error("Failed to decode image {path}: {reason}")]
    Decode { path: PathBuf, reason: String },

    #[error("Detector failed: {reason}")]
    Inference { reason: String },

    #[error("Failed to save detections: {0}")]
    Save(#[from] LabelError),
}

/// Convenience Result type alias
pub type Result<T> = std::result::Result<T, ClusterError>;

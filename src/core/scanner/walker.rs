//! Directory walking implementation using walkdir.

use super::filter::{is_hidden, ImageFilter};
use crate::error::ScanError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::warn;
use walkdir::WalkDir;

/// Order in which files are yielded.
///
/// Clustering tie-breaks depend on this order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanOrder {
    /// Entries sorted by file name within each directory; same output on every platform
    #[default]
    Sorted,
    /// Whatever order the filesystem returns
    Traversal,
}

/// Configuration for the directory walker
#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// Whether to follow symbolic links
    pub follow_symlinks: bool,
    /// Whether to include hidden files and descend into hidden directories
    pub include_hidden: bool,
    /// Entry ordering
    pub order: ScanOrder,
    /// Custom extensions to include (None = png, jpg, jpeg, bmp, gif)
    pub extensions: Option<Vec<String>>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            follow_symlinks: false,
            include_hidden: true,
            order: ScanOrder::default(),
            extensions: None,
        }
    }
}

/// Enumerates image files using the walkdir crate
#[derive(Debug, Clone)]
pub struct ImageWalker {
    config: ScanConfig,
    filter: ImageFilter,
}

impl ImageWalker {
    /// Create a new walker with the given configuration
    pub fn new(config: ScanConfig) -> Self {
        let mut filter = ImageFilter::new().with_hidden(config.include_hidden);

        if let Some(ref extensions) = config.extensions {
            filter = filter.with_extensions(extensions.clone());
        }

        Self { config, filter }
    }

    /// Check that `root` is an existing directory.
    pub fn check_root(root: &Path) -> Result<(), ScanError> {
        if !root.exists() {
            return Err(ScanError::DirectoryNotFound {
                path: root.to_path_buf(),
            });
        }
        if !root.is_dir() {
            return Err(ScanError::NotADirectory {
                path: root.to_path_buf(),
            });
        }
        Ok(())
    }

    /// Start a fresh, lazy walk below `root`.
    ///
    /// The returned iterator cannot be resumed once dropped; call `walk`
    /// again to restart. Unreadable subtrees are logged and skipped.
    pub fn walk(&self, root: &Path) -> ImagePaths {
        let mut walker = WalkDir::new(root).follow_links(self.config.follow_symlinks);

        if self.config.order == ScanOrder::Sorted {
            walker = walker.sort_by_file_name();
        }

        ImagePaths {
            entries: walker.into_iter(),
            filter: self.filter.clone(),
        }
    }

    /// Count the images below `root` with a full walk
    pub fn count(&self, root: &Path) -> usize {
        self.walk(root).count()
    }
}

/// Lazy sequence of image paths produced by [`ImageWalker::walk`]
pub struct ImagePaths {
    entries: walkdir::IntoIter,
    filter: ImageFilter,
}

impl Iterator for ImagePaths {
    type Item = PathBuf;

    fn next(&mut self) -> Option<PathBuf> {
        loop {
            let entry = match self.entries.next()? {
                Ok(entry) => entry,
                Err(e) => {
                    let error = classify_walk_error(&e);
                    warn!(%error, "Skipping unreadable entry");
                    continue;
                }
            };

            if entry.file_type().is_dir() {
                if entry.depth() > 0 && !self.filter.includes_hidden() && is_hidden(entry.path()) {
                    self.entries.skip_current_dir();
                }
                continue;
            }

            if self.filter.should_include(entry.path()) {
                return Some(entry.into_path());
            }
        }
    }
}

fn classify_walk_error(e: &walkdir::Error) -> ScanError {
    let path = e.path().map(Path::to_path_buf).unwrap_or_default();

    if e.io_error().map(|io| io.kind()) == Some(std::io::ErrorKind::PermissionDenied) {
        ScanError::PermissionDenied { path }
    } else {
        ScanError::ReadDirectory {
            path,
            reason: e.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::{self, File};
    use tempfile::TempDir;

    fn touch(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        File::create(&path).unwrap();
        path
    }

    fn names(paths: &[PathBuf]) -> Vec<String> {
        paths
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn walk_empty_directory_yields_nothing() {
        let temp_dir = TempDir::new().unwrap();
        let walker = ImageWalker::new(ScanConfig::default());

        assert_eq!(walker.walk(temp_dir.path()).count(), 0);
    }

    #[test]
    fn walk_filters_by_extension() {
        let temp_dir = TempDir::new().unwrap();
        touch(temp_dir.path(), "photo.jpg");
        touch(temp_dir.path(), "notes.txt");
        touch(temp_dir.path(), "labels.TXT");
        touch(temp_dir.path(), "frame.GIF");

        let walker = ImageWalker::new(ScanConfig::default());
        let found: Vec<_> = walker.walk(temp_dir.path()).collect();

        assert_eq!(names(&found), vec!["frame.GIF", "photo.jpg"]);
    }

    #[test]
    fn walk_recurses_into_subdirectories() {
        let temp_dir = TempDir::new().unwrap();
        let nested = temp_dir.path().join("a").join("b");
        fs::create_dir_all(&nested).unwrap();
        touch(temp_dir.path(), "root.png");
        touch(&nested, "deep.bmp");

        let walker = ImageWalker::new(ScanConfig::default());
        assert_eq!(walker.count(temp_dir.path()), 2);
    }

    #[test]
    fn sorted_order_is_by_file_name() {
        let temp_dir = TempDir::new().unwrap();
        for name in ["c.png", "a.png", "b.png"] {
            touch(temp_dir.path(), name);
        }

        let walker = ImageWalker::new(ScanConfig::default());
        let found: Vec<_> = walker.walk(temp_dir.path()).collect();

        assert_eq!(names(&found), vec!["a.png", "b.png", "c.png"]);
    }

    #[test]
    fn walk_is_restartable() {
        let temp_dir = TempDir::new().unwrap();
        touch(temp_dir.path(), "a.png");
        touch(temp_dir.path(), "b.png");

        let walker = ImageWalker::new(ScanConfig::default());
        let first: Vec<_> = walker.walk(temp_dir.path()).collect();
        let second: Vec<_> = walker.walk(temp_dir.path()).collect();

        assert_eq!(first, second);
    }

    #[test]
    fn hidden_directories_are_skipped_when_hidden_excluded() {
        let temp_dir = TempDir::new().unwrap();
        let hidden = temp_dir.path().join(".cache");
        fs::create_dir(&hidden).unwrap();
        touch(&hidden, "thumb.png");
        touch(temp_dir.path(), "visible.png");

        let config = ScanConfig {
            include_hidden: false,
            ..Default::default()
        };
        let found: Vec<_> = ImageWalker::new(config).walk(temp_dir.path()).collect();
        assert_eq!(names(&found), vec!["visible.png"]);

        let all = ImageWalker::new(ScanConfig::default()).count(temp_dir.path());
        assert_eq!(all, 2);
    }

    #[test]
    fn check_root_rejects_missing_and_file_paths() {
        let temp_dir = TempDir::new().unwrap();
        let file = touch(temp_dir.path(), "a.png");

        assert!(ImageWalker::check_root(temp_dir.path()).is_ok());
        assert!(matches!(
            ImageWalker::check_root(Path::new("/nonexistent/path/12345")),
            Err(ScanError::DirectoryNotFound { .. })
        ));
        assert!(matches!(
            ImageWalker::check_root(&file),
            Err(ScanError::NotADirectory { .. })
        ));
    }
}

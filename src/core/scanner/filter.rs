//! File filtering logic for the scanner.

use std::collections::HashSet;
use std::path::Path;

/// Default extension allow-list
pub const DEFAULT_EXTENSIONS: [&str; 5] = ["png", "jpg", "jpeg", "bmp", "gif"];

/// Decides whether a file is an image the enumerator should yield
#[derive(Debug, Clone)]
pub struct ImageFilter {
    /// Lower-case file extensions to include
    extensions: HashSet<String>,
    /// Whether to include dot-files
    include_hidden: bool,
}

impl ImageFilter {
    /// Create a new filter with the default allow-list.
    ///
    /// Hidden files are included.
    pub fn new() -> Self {
        Self {
            extensions: DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
            include_hidden: true,
        }
    }

    /// Include hidden files (starting with .)
    pub fn with_hidden(mut self, include: bool) -> Self {
        self.include_hidden = include;
        self
    }

    /// Override the list of extensions to accept
    pub fn with_extensions(mut self, extensions: Vec<String>) -> Self {
        self.extensions = extensions
            .into_iter()
            .map(|e| e.trim_start_matches('.').to_lowercase())
            .collect();
        self
    }

    /// Whether hidden files pass the filter
    pub fn includes_hidden(&self) -> bool {
        self.include_hidden
    }

    /// Check if a file should be included
    pub fn should_include(&self, path: &Path) -> bool {
        if !self.include_hidden && is_hidden(path) {
            return false;
        }

        path.extension()
            .and_then(|e| e.to_str())
            .map(|ext| self.extensions.contains(&ext.to_lowercase()))
            .unwrap_or(false)
    }
}

impl Default for ImageFilter {
    fn default() -> Self {
        Self::new()
    }
}

pub(super) fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(|name| name.starts_with('.'))
        .unwrap_or(false)
}

//! # Labels Module
//!
//! Reads and writes YOLO annotation files.
//!
//! Each image has at most one plain-text label file, one box per line:
//! ```text
//! <class_id> <x_center> <y_center> <width> <height>
//! ```
//! A missing file means the image has no annotations. Where the file lives
//! is decided by [`LabelLayout`].

mod classes;
mod format;

pub use classes::ClassNames;
pub use format::{ClassTag, YoloLabel};

use crate::error::LabelError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Where an image's label file lives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LabelLayout {
    /// `photos/cat.png` -> `photos/cat.txt`
    #[default]
    Sibling,
    /// `dataset/images/cat.png` -> `dataset/labels/cat.txt`
    LabelsDir,
}

impl LabelLayout {
    /// Label file path for `image`
    pub fn label_path(&self, image: &Path) -> Result<PathBuf, LabelError> {
        let stem = image.file_stem().ok_or_else(|| LabelError::NoFileName {
            path: image.to_path_buf(),
        })?;
        let mut file_name = stem.to_os_string();
        file_name.push(".txt");

        let image_dir = image.parent().unwrap_or(Path::new(""));
        match self {
            LabelLayout::Sibling => Ok(image_dir.join(file_name)),
            LabelLayout::LabelsDir => {
                let dataset_dir = image_dir.parent().unwrap_or(Path::new(""));
                Ok(dataset_dir.join("labels").join(file_name))
            }
        }
    }
}

/// Read a label file. A missing file reads as no labels.
///
/// Malformed lines are skipped.
pub fn read_labels(path: &Path) -> Result<Vec<YoloLabel>, LabelError> {
    match fs::read_to_string(path) {
        Ok(contents) => Ok(parse_labels(&contents)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(Vec::new()),
        Err(e) => Err(LabelError::Read {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}

/// Parse label file contents, skipping blank and malformed lines
pub fn parse_labels(contents: &str) -> Vec<YoloLabel> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter_map(|line| match line.parse::<YoloLabel>() {
            Ok(label) => Some(label),
            Err(e) => {
                debug!(error = %e, "Skipping label line");
                None
            }
        })
        .collect()
}

/// Save labels. An empty list removes the file instead.
pub fn write_labels(path: &Path, labels: &[YoloLabel]) -> Result<(), LabelError> {
    if labels.is_empty() {
        remove_labels(path)?;
        return Ok(());
    }
    write_label_file(path, labels)
}

/// Write `labels` verbatim, leaving an empty file for an empty list
pub(crate) fn write_label_file(path: &Path, labels: &[YoloLabel]) -> Result<(), LabelError> {
    let write_error = |source| LabelError::Write {
        path: path.to_path_buf(),
        source,
    };

    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir).map_err(write_error)?;
    }

    let contents: String = labels.iter().map(|label| format!("{label}\n")).collect();
    fs::write(path, contents).map_err(write_error)
}

/// Delete a label file. Returns whether one existed.
pub fn remove_labels(path: &Path) -> Result<bool, LabelError> {
    match fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
        Err(e) => Err(LabelError::Write {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}

/// Label access for images under one layout
#[derive(Debug, Clone, Copy, Default)]
pub struct LabelStore {
    layout: LabelLayout,
}

impl LabelStore {
    pub fn new(layout: LabelLayout) -> Self {
        Self { layout }
    }

    pub fn layout(&self) -> LabelLayout {
        self.layout
    }

    pub fn path_for(&self, image: &Path) -> Result<PathBuf, LabelError> {
        self.layout.label_path(image)
    }

    /// Whether `image` already has a label file (possibly empty)
    pub fn has_labels(&self, image: &Path) -> bool {
        self.path_for(image).is_ok_and(|path| path.is_file())
    }

    pub fn load(&self, image: &Path) -> Result<Vec<YoloLabel>, LabelError> {
        read_labels(&self.path_for(image)?)
    }

    pub fn save(&self, image: &Path, labels: &[YoloLabel]) -> Result<(), LabelError> {
        write_labels(&self.path_for(image)?, labels)
    }

    pub fn remove(&self, image: &Path) -> Result<bool, LabelError> {
        remove_labels(&self.path_for(image)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn label(class: u32) -> YoloLabel {
        YoloLabel::new(ClassTag::Id(class), 0.5, 0.5, 0.2, 0.2)
    }

    #[test]
    fn sibling_layout_replaces_extension() {
        let path = LabelLayout::Sibling
            .label_path(Path::new("/data/photos/cat.v2.png"))
            .unwrap();
        assert_eq!(path, PathBuf::from("/data/photos/cat.v2.txt"));
    }

    #[test]
    fn labels_dir_layout_uses_sibling_labels_folder() {
        let path = LabelLayout::LabelsDir
            .label_path(Path::new("/data/images/cat.jpg"))
            .unwrap();
        assert_eq!(path, PathBuf::from("/data/labels/cat.txt"));
    }

    #[test]
    fn missing_file_reads_as_empty() {
        let dir = TempDir::new().unwrap();
        assert!(read_labels(&dir.path().join("none.txt")).unwrap().is_empty());
    }

    #[test]
    fn malformed_lines_are_skipped() {
        let parsed = parse_labels("0 0.5 0.5 0.1 0.1\n\n1 0.5 0.5\nx 1 1 1 1\n2::0.75 0.1 0.1 0.1 0.1\n");

        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0].class, ClassTag::Id(0));
        assert!(parsed[1].class.is_predicted());
    }

    #[test]
    fn write_then_read() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("cat.txt");

        write_labels(&path, &[label(0), label(3)]).unwrap();

        assert_eq!(read_labels(&path).unwrap(), vec![label(0), label(3)]);
    }

    #[test]
    fn writing_no_labels_deletes_the_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("cat.txt");
        write_labels(&path, &[label(1)]).unwrap();

        write_labels(&path, &[]).unwrap();

        assert!(!path.exists());
        // and again, with nothing to delete
        write_labels(&path, &[]).unwrap();
    }

    #[test]
    fn store_creates_labels_directory() {
        let dir = TempDir::new().unwrap();
        let images = dir.path().join("images");
        fs::create_dir(&images).unwrap();
        let image = images.join("dog.png");
        let store = LabelStore::new(LabelLayout::LabelsDir);

        assert!(!store.has_labels(&image));
        store.save(&image, &[label(2)]).unwrap();

        assert!(dir.path().join("labels").join("dog.txt").is_file());
        assert!(store.has_labels(&image));
        assert_eq!(store.load(&image).unwrap(), vec![label(2)]);
        assert!(store.remove(&image).unwrap());
        assert!(!store.remove(&image).unwrap());
    }
}

//! Detector class names.

use crate::error::LabelError;
use std::fs;
use std::path::Path;

/// Class names indexed by class id, one per line in the source file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassNames {
    names: Vec<String>,
}

impl ClassNames {
    pub fn new(names: Vec<String>) -> Self {
        Self { names }
    }

    /// Load a class list; blank lines are ignored
    pub fn load(path: &Path) -> Result<Self, LabelError> {
        let contents = fs::read_to_string(path).map_err(|e| LabelError::Read {
            path: path.to_path_buf(),
            source: e,
        })?;
        Ok(Self::parse(&contents))
    }

    pub fn parse(contents: &str) -> Self {
        Self::new(
            contents
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(String::from)
                .collect(),
        )
    }

    pub fn name(&self, class_id: u32) -> Option<&str> {
        self.names.get(class_id as usize).map(String::as_str)
    }

    /// Name for display, falling back to the numeric id
    pub fn display_name(&self, class_id: u32) -> String {
        self.name(class_id)
            .map(String::from)
            .unwrap_or_else(|| class_id.to_string())
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

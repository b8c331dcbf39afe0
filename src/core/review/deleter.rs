//! Deleting images together with their label files.

use super::ClusterSet;
use crate::core::cluster::Cluster;
use crate::core::labels::{LabelLayout, LabelStore};
use crate::error::DeleteError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// How files are removed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeleteMode {
    /// Unlink immediately
    #[default]
    Permanent,
    /// Move to the platform trash / recycle bin
    Trash,
}

/// An image that could not be fully deleted
#[derive(Debug)]
pub struct DeleteFailure {
    pub path: PathBuf,
    pub error: DeleteError,
}

/// Outcome of one delete operation
#[derive(Debug, Default)]
pub struct DeleteReport {
    /// Images removed from disk
    pub deleted: Vec<PathBuf>,
    /// Label files removed alongside them
    pub labels_removed: usize,
    pub failures: Vec<DeleteFailure>,
}

impl DeleteReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    fn record(&mut self, image: &Path, result: Result<bool, DeleteError>) -> bool {
        match result {
            Ok(label_removed) => {
                self.deleted.push(image.to_path_buf());
                if label_removed {
                    self.labels_removed += 1;
                }
                true
            }
            Err(error) => {
                warn!(path = %image.display(), %error, "Delete failed");
                // A label failure still means the image itself is gone
                let image_gone = matches!(error, DeleteError::Label { .. });
                if image_gone {
                    self.deleted.push(image.to_path_buf());
                }
                self.failures.push(DeleteFailure {
                    path: image.to_path_buf(),
                    error,
                });
                image_gone
            }
        }
    }
}

/// Removes images and keeps their label files in sync
#[derive(Debug, Clone, Copy, Default)]
pub struct Deleter {
    labels: LabelStore,
    mode: DeleteMode,
}

impl Deleter {
    pub fn new(layout: LabelLayout, mode: DeleteMode) -> Self {
        Self {
            labels: LabelStore::new(layout),
            mode,
        }
    }

    pub fn mode(&self) -> DeleteMode {
        self.mode
    }

    /// Delete one image, then its label file if it has one.
    ///
    /// Returns whether a label file was removed. When the image cannot be
    /// deleted its label is left alone.
    pub fn delete_image(&self, image: &Path) -> Result<bool, DeleteError> {
        self.remove_file(image).map_err(|reason| DeleteError::Image {
            path: image.to_path_buf(),
            reason,
        })?;

        let label = match self.labels.path_for(image) {
            Ok(label) => label,
            Err(_) => return Ok(false),
        };
        if !label.is_file() {
            return Ok(false);
        }

        self.remove_file(&label).map_err(|reason| DeleteError::Label {
            path: image.to_path_buf(),
            label: label.clone(),
            reason,
        })?;
        debug!(image = %image.display(), label = %label.display(), "Deleted image and label");
        Ok(true)
    }

    /// Delete the chosen images of cluster `index`.
    ///
    /// Paths that are not in the cluster are ignored. Deleted images leave
    /// the cluster; a cluster left empty is removed from the set.
    pub fn delete_selected(
        &self,
        set: &mut ClusterSet,
        index: usize,
        images: &[PathBuf],
    ) -> Result<DeleteReport, DeleteError> {
        let cluster = set
            .get_mut(index)
            .ok_or(DeleteError::NoSuchCluster { index })?;

        let mut report = DeleteReport::default();
        for image in images {
            if !cluster.contains(image) {
                debug!(path = %image.display(), "Not in cluster, skipping");
                continue;
            }
            if report.record(image, self.delete_image(image)) {
                cluster.remove(image);
            }
        }

        if cluster.is_empty() {
            set.remove(index);
        }

        info!(deleted = report.deleted.len(), failed = report.failures.len(), "Deleted selected images");
        Ok(report)
    }

    /// Delete every image of cluster `index` except its representative
    pub fn delete_cluster_duplicates(
        &self,
        set: &mut ClusterSet,
        index: usize,
    ) -> Result<DeleteReport, DeleteError> {
        let cluster = set
            .get_mut(index)
            .ok_or(DeleteError::NoSuchCluster { index })?;

        let mut report = DeleteReport::default();
        self.delete_duplicates_of(cluster, &mut report);

        info!(deleted = report.deleted.len(), failed = report.failures.len(), "Deleted cluster duplicates");
        Ok(report)
    }

    /// Keep one image per cluster, delete the rest
    pub fn delete_all_duplicates(&self, set: &mut ClusterSet) -> DeleteReport {
        let mut report = DeleteReport::default();
        for cluster in set.iter_mut() {
            self.delete_duplicates_of(cluster, &mut report);
        }

        info!(
            deleted = report.deleted.len(),
            labels = report.labels_removed,
            failed = report.failures.len(),
            "Deleted all duplicates"
        );
        report
    }

    fn delete_duplicates_of(&self, cluster: &mut Cluster, report: &mut DeleteReport) {
        let duplicates = cluster.duplicates().to_vec();
        let mut removed = Vec::new();

        for image in duplicates {
            if report.record(&image, self.delete_image(&image)) {
                removed.push(image);
            }
        }

        cluster.retain(|p| !removed.iter().any(|r| r == p));
    }

    fn remove_file(&self, path: &Path) -> Result<(), String> {
        match self.mode {
            DeleteMode::Permanent => fs::remove_file(path).map_err(|e| e.to_string()),
            DeleteMode::Trash => trash::delete(path).map_err(|e| e.to_string()),
        }
    }
}

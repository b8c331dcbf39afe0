//! # Review Module
//!
//! What the user works with once clusters arrive: a size-ordered list of
//! clusters and the operations that delete duplicates from disk.
//!
//! Every deletion removes the image first and its label file second, so an
//! image that could not be deleted never loses its annotations.

mod deleter;

pub use deleter::{DeleteFailure, DeleteMode, DeleteReport, Deleter};

use crate::core::cluster::{sort_by_size_desc, Cluster};
use crate::events::ClusterEvent;

/// Clusters in display order: largest first, ties in arrival order.
///
/// The order is recomputed when a cluster is added. Deleting images does
/// not reorder, so indices stay valid while the user works through them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClusterSet {
    clusters: Vec<Cluster>,
}

impl ClusterSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_clusters(clusters: Vec<Cluster>) -> Self {
        let mut set = Self { clusters };
        sort_by_size_desc(&mut set.clusters);
        set
    }

    /// Add a cluster and restore size order
    pub fn push(&mut self, cluster: Cluster) {
        self.clusters.push(cluster);
        sort_by_size_desc(&mut self.clusters);
    }

    /// Collect a `ClusterFound` event. Returns whether the event was one.
    pub fn apply(&mut self, event: &ClusterEvent) -> bool {
        match event {
            ClusterEvent::ClusterFound(cluster) => {
                self.push(cluster.clone());
                true
            }
            _ => false,
        }
    }

    pub fn get(&self, index: usize) -> Option<&Cluster> {
        self.clusters.get(index)
    }

    pub(crate) fn get_mut(&mut self, index: usize) -> Option<&mut Cluster> {
        self.clusters.get_mut(index)
    }

    pub(crate) fn remove(&mut self, index: usize) -> Cluster {
        self.clusters.remove(index)
    }

    pub(crate) fn iter_mut(&mut self) -> std::slice::IterMut<'_, Cluster> {
        self.clusters.iter_mut()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Cluster> {
        self.clusters.iter()
    }

    pub fn len(&self) -> usize {
        self.clusters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clusters.is_empty()
    }

    /// Images across all clusters
    pub fn total_images(&self) -> usize {
        self.clusters.iter().map(Cluster::len).sum()
    }

    /// Images that `delete_all_duplicates` would remove
    pub fn duplicate_count(&self) -> usize {
        self.clusters.iter().map(Cluster::duplicate_count).sum()
    }

    pub fn clear(&mut self) {
        self.clusters.clear();
    }

    pub fn into_clusters(self) -> Vec<Cluster> {
        self.clusters
    }
}

impl<'a> IntoIterator for &'a ClusterSet {
    type Item = &'a Cluster;
    type IntoIter = std::slice::Iter<'a, Cluster>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::RunSummary;
    use std::path::PathBuf;

    fn cluster(names: &[&str]) -> Cluster {
        Cluster::new(names.iter().map(PathBuf::from).collect())
    }

    #[test]
    fn push_keeps_largest_first() {
        let mut set = ClusterSet::new();
        set.push(cluster(&["/a"]));
        set.push(cluster(&["/b", "/c"]));
        set.push(cluster(&["/d", "/e"]));

        let sizes: Vec<_> = set.iter().map(Cluster::len).collect();
        assert_eq!(sizes, vec![2, 2, 1]);
        assert_eq!(set.get(0), Some(&cluster(&["/b", "/c"])));
        assert_eq!(set.total_images(), 5);
        assert_eq!(set.duplicate_count(), 2);
    }

    #[test]
    fn apply_collects_only_found_clusters() {
        let mut set = ClusterSet::new();

        assert!(set.apply(&ClusterEvent::ClusterFound(cluster(&["/x", "/y"]))));
        assert!(!set.apply(&ClusterEvent::Finished(RunSummary::default())));
        assert!(!set.apply(&ClusterEvent::Cancelled));

        assert_eq!(set.len(), 1);
    }

    #[test]
    fn from_clusters_sorts() {
        let set = ClusterSet::from_clusters(vec![cluster(&["/1"]), cluster(&["/2", "/3", "/4"])]);
        assert_eq!(set.get(0).map(Cluster::len), Some(3));
    }
}

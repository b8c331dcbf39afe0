//! Greedy, seed-anchored similarity clustering.
//!
//! ```text
//! for each unassigned image i, in enumeration order:
//!     start a cluster seeded by i
//!     for each unassigned image j after i:
//!         if distance(hash[i], hash[j]) <= threshold: add j
//! ```
//!
//! Joining is decided against the seed only. With seed A, an image C that
//! is close to member B but farther than `threshold` from A stays out.
//! The pass is O(n²) in hash comparisons with no bucketing, which bounds
//! it to folder-sized inputs.

use super::{Cluster, Threshold};
use crate::core::cancel::CancellationToken;
use crate::core::hasher::PerceptualHash;
use std::path::PathBuf;

/// One completed cluster, handed to the progress callback
#[derive(Debug)]
pub struct ClusterStep<'a> {
    /// The cluster just completed
    pub cluster: &'a Cluster,
    /// False when the cluster is a singleton suppressed by `skip_single`
    pub reported: bool,
    /// Images assigned to any cluster so far, suppressed ones included
    pub consumed: usize,
    /// Images being clustered
    pub total: usize,
}

/// Result of a clustering pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClusterOutcome {
    /// Every image was assigned
    Completed(Vec<Cluster>),
    /// Stopped early; the clusters found so far are not a full partition
    Cancelled(Vec<Cluster>),
}

impl ClusterOutcome {
    pub fn clusters(&self) -> &[Cluster] {
        match self {
            ClusterOutcome::Completed(c) | ClusterOutcome::Cancelled(c) => c,
        }
    }

    pub fn into_clusters(self) -> Vec<Cluster> {
        match self {
            ClusterOutcome::Completed(c) | ClusterOutcome::Cancelled(c) => c,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, ClusterOutcome::Cancelled(_))
    }
}

/// Partitions hashed images into clusters around seeds
#[derive(Debug, Clone, Copy)]
pub struct SeedClusterer {
    threshold: Threshold,
    skip_single: bool,
}

impl SeedClusterer {
    /// Create a clusterer that reports every cluster, singletons included
    pub fn new(threshold: Threshold) -> Self {
        Self {
            threshold,
            skip_single: false,
        }
    }

    /// Suppress clusters of one image
    pub fn skip_single(mut self, skip: bool) -> Self {
        self.skip_single = skip;
        self
    }

    pub fn threshold(&self) -> Threshold {
        self.threshold
    }

    /// Cluster without progress reporting or cancellation
    pub fn cluster<H: PerceptualHash>(&self, items: &[(PathBuf, H)]) -> Vec<Cluster> {
        self.cluster_with_progress(items, &CancellationToken::new(), |_| {})
            .into_clusters()
    }

    /// Cluster `items` (in enumeration order), calling `on_step` after each
    /// cluster is completed.
    ///
    /// Cancellation is checked before each new seed.
    pub fn cluster_with_progress<H, F>(
        &self,
        items: &[(PathBuf, H)],
        cancel: &CancellationToken,
        mut on_step: F,
    ) -> ClusterOutcome
    where
        H: PerceptualHash,
        F: FnMut(ClusterStep<'_>),
    {
        let total = items.len();
        let mut used = vec![false; total];
        let mut reported = Vec::new();
        let mut consumed = 0;

        for i in 0..total {
            if used[i] {
                continue;
            }
            if cancel.is_cancelled() {
                return ClusterOutcome::Cancelled(reported);
            }

            let (seed_path, seed_hash) = &items[i];
            let mut cluster = Cluster::seeded(seed_path.clone());
            used[i] = true;

            for j in (i + 1)..total {
                if used[j] {
                    continue;
                }
                let (path, hash) = &items[j];
                if self.threshold.admits(seed_hash.distance(hash)) {
                    cluster.push(path.clone());
                    used[j] = true;
                }
            }

            consumed += cluster.len();
            let report = !(self.skip_single && cluster.len() == 1);

            on_step(ClusterStep {
                cluster: &cluster,
                reported: report,
                consumed,
                total,
            });

            if report {
                reported.push(cluster);
            }
        }

        ClusterOutcome::Completed(reported)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::hasher::{HashAlgorithmKind, ImageHashValue};
    use std::collections::HashSet;
    use std::sync::Arc;

    /// A hash whose distances come from a fixed table
    #[derive(Clone)]
    struct TableHash {
        id: usize,
        table: Arc<Vec<Vec<u32>>>,
    }

    impl PerceptualHash for TableHash {
        fn distance(&self, other: &Self) -> u32 {
            self.table[self.id][other.id]
        }

        fn as_bytes(&self) -> &[u8] {
            &[]
        }
    }

    /// Five images: 1↔2 = 3, 1↔3 = 10, 2↔3 = 4, 4↔5 = 0, everything else 64
    fn five_image_table() -> Vec<(PathBuf, TableHash)> {
        let mut table = vec![vec![64u32; 5]; 5];
        for (a, b, d) in [(0, 1, 3), (0, 2, 10), (1, 2, 4), (3, 4, 0)] {
            table[a][b] = d;
            table[b][a] = d;
        }
        for (i, row) in table.iter_mut().enumerate() {
            row[i] = 0;
        }
        let table = Arc::new(table);

        (0..5)
            .map(|id| {
                (
                    PathBuf::from(format!("/img/{}.png", id + 1)),
                    TableHash {
                        id,
                        table: Arc::clone(&table),
                    },
                )
            })
            .collect()
    }

    fn bits(items: &[(&str, u64)]) -> Vec<(PathBuf, ImageHashValue)> {
        items
            .iter()
            .map(|(name, b)| {
                (
                    PathBuf::from(*name),
                    ImageHashValue::from_u64(*b, HashAlgorithmKind::Average),
                )
            })
            .collect()
    }

    fn names(clusters: &[Cluster]) -> Vec<Vec<String>> {
        clusters
            .iter()
            .map(|c| {
                c.images()
                    .iter()
                    .map(|p| p.file_stem().unwrap().to_string_lossy().into_owned())
                    .collect()
            })
            .collect()
    }

    fn threshold(value: u32) -> Threshold {
        Threshold::new(value).unwrap()
    }

    /// Deterministic pseudo-random 64-bit hashes
    fn pseudo_random(n: usize) -> Vec<(PathBuf, ImageHashValue)> {
        let mut state: u64 = 0x2545_F491_4F6C_DD1D;
        (0..n)
            .map(|i| {
                state ^= state << 13;
                state ^= state >> 7;
                state ^= state << 17;
                // Few distinct high bits so that some hashes land close together
                let value = state & 0x0000_0000_0000_0FFF;
                (
                    PathBuf::from(format!("/img/{i}.png")),
                    ImageHashValue::from_u64(value, HashAlgorithmKind::Average),
                )
            })
            .collect()
    }

    #[test]
    fn five_image_scenario_at_threshold_five() {
        let clusters = SeedClusterer::new(threshold(5)).cluster(&five_image_table());
        assert_eq!(names(&clusters), vec![vec!["1", "2"], vec!["3"], vec!["4", "5"]]);
    }

    #[test]
    fn five_image_scenario_skips_singletons() {
        let clusters = SeedClusterer::new(threshold(5))
            .skip_single(true)
            .cluster(&five_image_table());
        assert_eq!(names(&clusters), vec![vec!["1", "2"], vec!["4", "5"]]);
    }

    #[test]
    fn five_image_scenario_at_threshold_ten() {
        let clusters = SeedClusterer::new(threshold(10)).cluster(&five_image_table());
        assert_eq!(names(&clusters), vec![vec!["1", "2", "3"], vec!["4", "5"]]);
    }

    #[test]
    fn members_are_compared_with_the_seed_only() {
        // d(a,b) = 3, d(b,c) = 4, d(a,c) = 7
        let items = bits(&[("/a", 0), ("/b", 0b111), ("/c", 0b111_1111)]);

        let clusters = SeedClusterer::new(threshold(5)).cluster(&items);

        assert_eq!(names(&clusters), vec![vec!["a", "b"], vec!["c"]]);
    }

    #[test]
    fn members_far_from_each_other_share_a_close_seed() {
        // d(s,x) = 3, d(s,y) = 3, d(x,y) = 6
        let items = bits(&[("/s", 0), ("/x", 0b000_111), ("/y", 0b111_000)]);

        let clusters = SeedClusterer::new(threshold(3)).cluster(&items);

        assert_eq!(names(&clusters), vec![vec!["s", "x", "y"]]);
    }

    #[test]
    fn members_keep_enumeration_order() {
        let items = bits(&[("/a", 0), ("/far", u64::MAX), ("/b", 1), ("/c", 0)]);

        let clusters = SeedClusterer::new(threshold(1)).cluster(&items);

        assert_eq!(names(&clusters), vec![vec!["a", "b", "c"], vec!["far"]]);
    }

    #[test]
    fn zero_threshold_groups_identical_hashes_only() {
        let items = bits(&[("/a", 5), ("/b", 4), ("/c", 5)]);

        let clusters = SeedClusterer::new(threshold(0)).cluster(&items);

        assert_eq!(names(&clusters), vec![vec!["a", "c"], vec!["b"]]);
    }

    #[test]
    fn max_threshold_puts_everything_in_one_cluster() {
        let items = pseudo_random(20);
        let clusters = SeedClusterer::new(threshold(64)).cluster(&items);
        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0].len(), 20);
    }

    #[test]
    fn empty_input_yields_no_clusters() {
        let items: Vec<(PathBuf, ImageHashValue)> = Vec::new();
        let outcome =
            SeedClusterer::new(threshold(5)).cluster_with_progress(&items, &CancellationToken::new(), |_| {
                panic!("no steps expected")
            });
        assert_eq!(outcome, ClusterOutcome::Completed(Vec::new()));
    }

    #[test]
    fn clusters_partition_the_input() {
        let items = pseudo_random(200);
        let clusters = SeedClusterer::new(threshold(3)).cluster(&items);

        let mut seen = HashSet::new();
        for path in clusters.iter().flat_map(|c| c.images()) {
            assert!(seen.insert(path.clone()), "{} appears twice", path.display());
        }
        let all: HashSet<_> = items.iter().map(|(p, _)| p.clone()).collect();
        assert_eq!(seen, all);
    }

    #[test]
    fn skip_single_never_reports_singletons() {
        let items = pseudo_random(200);
        let clusters = SeedClusterer::new(threshold(2)).skip_single(true).cluster(&items);

        assert!(clusters.iter().all(|c| c.len() > 1));
    }

    #[test]
    fn suppressed_singletons_still_count_as_consumed() {
        let items = five_image_table();
        let mut steps = Vec::new();

        SeedClusterer::new(threshold(5))
            .skip_single(true)
            .cluster_with_progress(&items, &CancellationToken::new(), |step| {
                steps.push((step.reported, step.consumed, step.total));
            });

        assert_eq!(steps, vec![(true, 2, 5), (false, 3, 5), (true, 5, 5)]);
    }

    #[test]
    fn first_image_cluster_grows_with_threshold() {
        let items = pseudo_random(60);
        let mut previous = 0;

        for t in 0..=64 {
            let clusters = SeedClusterer::new(threshold(t)).cluster(&items);
            let size = clusters
                .iter()
                .find(|c| c.contains(&items[0].0))
                .map(Cluster::len)
                .unwrap();
            assert!(size >= previous, "threshold {t}: {size} < {previous}");
            previous = size;
        }
    }

    #[test]
    fn identical_input_gives_identical_output() {
        let items = pseudo_random(120);
        let clusterer = SeedClusterer::new(threshold(4));

        assert_eq!(clusterer.cluster(&items), clusterer.cluster(&items));
    }

    #[test]
    fn cancelled_before_start_reports_nothing() {
        let items = pseudo_random(10);
        let cancel = CancellationToken::new();
        cancel.cancel();

        let mut steps = 0;
        let outcome = SeedClusterer::new(threshold(5)).cluster_with_progress(&items, &cancel, |_| steps += 1);

        assert!(outcome.is_cancelled());
        assert!(outcome.clusters().is_empty());
        assert_eq!(steps, 0);
    }

    #[test]
    fn cancellation_is_observed_before_the_next_seed() {
        let items = five_image_table();
        let cancel = CancellationToken::new();

        let outcome = SeedClusterer::new(threshold(5)).cluster_with_progress(&items, &cancel, |_| cancel.cancel());

        assert!(outcome.is_cancelled());
        assert_eq!(names(outcome.clusters()), vec![vec!["1", "2"]]);
    }
}

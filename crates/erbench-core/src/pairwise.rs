//! # Pairwise Module
//!
//! Pair-level co-membership scores.
//!
//! A link is an unordered pair `(i, j)`, `i < j`, of records sharing a
//! cluster. Links are enumerated by brute force inside each cluster of size
//! at least 2; clusters are small relative to the universe.

use crate::partition::ResolvedPartition;
use crate::report::{ratio, Scores};
use crate::RecordId;
use std::collections::BTreeSet;

/// All links of one partition, ordered.
pub type LinkSet = BTreeSet<(RecordId, RecordId)>;

/// Enumerate the links of a resolved partition.
#[must_use]
pub fn links(partition: &ResolvedPartition) -> LinkSet {
    let mut links = LinkSet::new();
    for cluster in partition.clusters.iter().filter(|c| c.len() > 1) {
        // BTreeSet iteration is ascending, so `a < b` for every emitted pair.
        let members: Vec<RecordId> = cluster.iter().copied().collect();
        for (i, &a) in members.iter().enumerate() {
            for &b in &members[i + 1..] {
                links.insert((a, b));
            }
        }
    }
    links
}

/// Pairwise precision, recall and F1.
///
/// - precision = shared links / candidate links
/// - recall = shared links / ground-truth links
///
/// An empty link set on either side yields 0 for the score that divides by it.
#[must_use]
pub fn pairwise_scores(ground_truth: &LinkSet, candidate: &LinkSet) -> Scores {
    let shared = candidate.intersection(ground_truth).count();
    Scores::new(
        ratio(shared, candidate.len()),
        ratio(shared, ground_truth.len()),
    )
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Partition;

    fn link_set(clusters: Vec<Vec<u64>>) -> LinkSet {
        links(&Partition::from_ids(clusters).resolve(None))
    }

    #[test]
    fn links_are_ordered_pairs_within_clusters() {
        let set = link_set(vec![vec![3, 1, 2], vec![7], vec![5, 4]]);
        let pairs: Vec<(u64, u64)> = set.iter().map(|(a, b)| (a.0, b.0)).collect();
        assert_eq!(pairs, vec![(1, 2), (1, 3), (2, 3), (4, 5)]);
    }

    #[test]
    fn cluster_of_n_has_n_choose_2_links() {
        assert_eq!(link_set(vec![(1..=6).collect()]).len(), 15);
    }

    #[test]
    fn concrete_scenario() {
        let truth = link_set(vec![vec![1, 2, 3], vec![4, 5]]);
        let candidate = link_set(vec![vec![1, 2], vec![3], vec![4, 5]]);

        let scores = pairwise_scores(&truth, &candidate);
        assert_eq!(scores.precision, 1.0);
        assert!((scores.recall - 2.0 / 4.0).abs() < 1e-12);
    }

    #[test]
    fn merged_clusters_lose_precision_only() {
        let truth = link_set(vec![vec![1, 2], vec![3, 4]]);
        let candidate = link_set(vec![vec![1, 2, 3, 4]]);

        let scores = pairwise_scores(&truth, &candidate);
        assert!((scores.precision - 2.0 / 6.0).abs() < 1e-12);
        assert_eq!(scores.recall, 1.0);
    }

    #[test]
    fn empty_link_sets_score_zero() {
        let empty = LinkSet::new();
        let some = link_set(vec![vec![1, 2]]);

        assert_eq!(pairwise_scores(&empty, &empty), Scores::default());

        let scores = pairwise_scores(&some, &empty);
        assert_eq!(scores.precision, 0.0);
        assert_eq!(scores.recall, 0.0);
        assert_eq!(scores.f1, 0.0);
    }
}

//! # Closest Cluster Module
//!
//! Cluster-level best-match overlap.
//!
//! Every candidate cluster is matched to the ground-truth cluster it overlaps
//! most (by Jaccard similarity), and vice versa:
//!
//! - precision = mean over candidate clusters of their best Jaccard
//! - recall = mean over ground-truth clusters of their best Jaccard
//!
//! Unlike the pairwise score this is asymmetric and sensitive to
//! fragmentation: splitting one true cluster into two candidate fragments
//! caps each fragment's best match below 1.

use crate::report::Scores;
use crate::RecordId;
use std::collections::BTreeSet;

/// `|a ∩ b| / |a ∪ b|`; two empty sets have similarity 0.
#[must_use]
pub fn jaccard(a: &BTreeSet<RecordId>, b: &BTreeSet<RecordId>) -> f64 {
    let shared = a.intersection(b).count();
    let union = a.len() + b.len() - shared;
    if union == 0 {
        0.0
    } else {
        shared as f64 / union as f64
    }
}

/// Best Jaccard of `cluster` against any of `others`; 0 when `others` is empty.
#[must_use]
pub fn best_match(cluster: &BTreeSet<RecordId>, others: &[BTreeSet<RecordId>]) -> f64 {
    others
        .iter()
        .map(|other| jaccard(cluster, other))
        .fold(0.0, f64::max)
}

/// Mean best match of each cluster in `from` against `to`; 0 for no clusters.
#[must_use]
pub fn mean_best_match(from: &[BTreeSet<RecordId>], to: &[BTreeSet<RecordId>]) -> f64 {
    if from.is_empty() {
        return 0.0;
    }
    let total: f64 = from.iter().map(|cluster| best_match(cluster, to)).sum();
    total / from.len() as f64
}

/// Closest-cluster precision, recall and F1.
#[must_use]
pub fn closest_cluster_scores(
    ground_truth: &[BTreeSet<RecordId>],
    candidate: &[BTreeSet<RecordId>],
) -> Scores {
    Scores::new(
        mean_best_match(candidate, ground_truth),
        mean_best_match(ground_truth, candidate),
    )
}

// =============================================================================
// TESTS
// =============================================================================

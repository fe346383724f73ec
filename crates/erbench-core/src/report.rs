//! # Report Module
//!
//! The immutable output of an evaluation.
//!
//! Serialized shape (consumed by the reporting layer):
//!
//! ```text
//! {
//!   "pairwise": {"precision": .., "recall": .., "f1": ..},
//!   "v_measure": ..,
//!   "vi": ..,
//!   "mutual_information": ..,
//!   "closest_cluster_f1": {"precision": .., "recall": .., "f1": ..},
//!   "diagnostics": {..}
//! }
//! ```

use serde::{Deserialize, Serialize};

// =============================================================================
// SCORES
// =============================================================================

/// Precision, recall and their harmonic mean.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Scores {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
}

impl Scores {
    /// Build scores, deriving F1. F1 is 0 when precision + recall is 0.
    #[must_use]
    pub fn new(precision: f64, recall: f64) -> Self {
        Self {
            precision,
            recall,
            f1: harmonic_mean(precision, recall),
        }
    }
}

/// `2ab / (a + b)`, or 0 when `a + b` is 0.
#[must_use]
pub fn harmonic_mean(a: f64, b: f64) -> f64 {
    let sum = a + b;
    if sum > 0.0 { 2.0 * a * b / sum } else { 0.0 }
}

/// `numerator / denominator`, or 0 for an empty denominator.
#[must_use]
pub fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

// =============================================================================
// DIAGNOSTICS
// =============================================================================

/// What resolution changed in one partition.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolutionStats {
    /// Memberships dropped because a later cluster claimed the same ID.
    pub duplicate_memberships: usize,
    /// ID occurrences dropped because they lie outside the universe.
    pub out_of_universe: usize,
    /// Clusters dropped because they were (or became) empty.
    pub empty_clusters: usize,
}

impl ResolutionStats {
    /// True when the partition needed no resolution.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        *self == Self::default()
    }
}

/// Evaluation context attached to every report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostics {
    /// Number of IDs scored over.
    pub universe_size: usize,
    /// Clusters in the ground truth after resolution.
    pub ground_truth_clusters: usize,
    /// Clusters in the candidate after resolution.
    pub candidate_clusters: usize,
    pub ground_truth: ResolutionStats,
    pub candidate: ResolutionStats,
}

// =============================================================================
// METRICS REPORT
// =============================================================================

/// Agreement metrics between a ground-truth and a candidate partition.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricsReport {
    /// Pair-level co-membership scores.
    pub pairwise: Scores,
    /// Harmonic mean of homogeneity and completeness, in `[0, 1]`.
    pub v_measure: f64,
    /// Variation of Information in nats; 0 for identical partitions.
    pub vi: f64,
    /// Mutual information between the two label assignments, in nats.
    pub mutual_information: f64,
    /// Cluster-level best-match Jaccard scores.
    pub closest_cluster_f1: Scores,
    pub diagnostics: Diagnostics,
}

impl MetricsReport {
    /// Format as a plain-text table.
    #[must_use]
    pub fn to_text(&self) -> String {
        let mut output = String::new();

        output.push_str("┌─────────────────────────────────────────────┐\n");
        output.push_str("│ PAIRWISE                                    │\n");
        push_scores(&mut output, &self.pairwise);
        output.push_str("├─────────────────────────────────────────────┤\n");
        output.push_str("│ INFORMATION                                 │\n");
        output.push_str(&format!("│   v_measure            {:>8.4}\n", self.v_measure));
        output.push_str(&format!("│   vi (nats)            {:>8.4}\n", self.vi));
        output.push_str(&format!(
            "│   mutual_information   {:>8.4}\n",
            self.mutual_information
        ));
        output.push_str("├─────────────────────────────────────────────┤\n");
        output.push_str("│ CLOSEST CLUSTER                             │\n");
        push_scores(&mut output, &self.closest_cluster_f1);
        output.push_str("├─────────────────────────────────────────────┤\n");
        output.push_str("│ INPUT                                       │\n");

        let d = &self.diagnostics;
        output.push_str(&format!("│   universe             {:>8}\n", d.universe_size));
        output.push_str(&format!(
            "│   clusters (gt/cand)   {:>8}\n",
            format!("{}/{}", d.ground_truth_clusters, d.candidate_clusters)
        ));
        for (label, stats) in [("ground truth", &d.ground_truth), ("candidate", &d.candidate)] {
            if !stats.is_clean() {
                output.push_str(&format!(
                    "│   {} resolved: {} duplicate, {} outside universe, {} empty\n",
                    label, stats.duplicate_memberships, stats.out_of_universe, stats.empty_clusters
                ));
            }
        }

        output.push_str("└─────────────────────────────────────────────┘\n");

        output
    }
}

fn push_scores(output: &mut String, scores: &Scores) {
    output.push_str(&format!("│   precision            {:>8.4}\n", scores.precision));
    output.push_str(&format!("│   recall               {:>8.4}\n", scores.recall));
    output.push_str(&format!("│   f1                   {:>8.4}\n", scores.f1));
}

// =============================================================================
// TESTS
// =============================================================================

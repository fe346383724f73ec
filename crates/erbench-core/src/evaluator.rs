//! # Evaluator Module
//!
//! The single entry point of the core: two partitions in, one report out.
//!
//! Steps:
//! 1. Fix the universe (explicit, or the union of both partitions).
//! 2. Resolve both partitions (see [`crate::partition`]).
//! 3. Pairwise scores from link sets.
//! 4. Information scores from label assignments.
//! 5. Closest-cluster scores from the resolved clusters.
//!
//! The evaluator holds only configuration, so one instance can be shared
//! across threads and called concurrently.

use crate::closest::closest_cluster_scores;
use crate::information::information_scores;
use crate::labels::{LabelAssignment, UnassignedPolicy};
use crate::pairwise::{links, pairwise_scores};
use crate::partition::Partition;
use crate::report::{Diagnostics, MetricsReport};
use crate::Universe;
use serde::{Deserialize, Serialize};

/// Evaluator settings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluatorConfig {
    /// How records outside every cluster enter the information scores.
    #[serde(default)]
    pub unassigned: UnassignedPolicy,
}

/// Stateless partition evaluator.
#[derive(Debug, Clone, Copy, Default)]
pub struct Evaluator {
    config: EvaluatorConfig,
}

impl Evaluator {
    /// Evaluator with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Evaluator with explicit settings.
    #[must_use]
    pub fn with_config(config: EvaluatorConfig) -> Self {
        Self { config }
    }

    /// Current settings.
    #[must_use]
    pub fn config(&self) -> EvaluatorConfig {
        self.config
    }

    /// Compare `candidate` against `ground_truth`.
    ///
    /// When `universe` is `None` it is the union of IDs in both partitions.
    /// Pass an explicit universe to count records that neither partition
    /// mentions (for example records a clusterer silently dropped).
    ///
    /// Never fails: malformed partitions are resolved and the resolution is
    /// recorded in [`MetricsReport::diagnostics`].
    #[must_use]
    pub fn evaluate(
        &self,
        ground_truth: &Partition,
        candidate: &Partition,
        universe: Option<&Universe>,
    ) -> MetricsReport {
        let derived;
        let universe = match universe {
            Some(universe) => universe,
            None => {
                derived = Universe::derived_from(&[ground_truth, candidate]);
                &derived
            }
        };

        let truth = ground_truth.resolve(Some(universe));
        let cand = candidate.resolve(Some(universe));

        let pairwise = pairwise_scores(&links(&truth), &links(&cand));

        let truth_blocks = LabelAssignment::build(&truth, universe).blocks(self.config.unassigned);
        let cand_blocks = LabelAssignment::build(&cand, universe).blocks(self.config.unassigned);
        let information = information_scores(&truth_blocks, &cand_blocks);

        let closest_cluster_f1 = closest_cluster_scores(&truth.clusters, &cand.clusters);

        MetricsReport {
            pairwise,
            v_measure: information.v_measure,
            vi: information.variation_of_information,
            mutual_information: information.mutual_information,
            closest_cluster_f1,
            diagnostics: Diagnostics {
                universe_size: universe.len(),
                ground_truth_clusters: truth.clusters.len(),
                candidate_clusters: cand.clusters.len(),
                ground_truth: truth.stats,
                candidate: cand.stats,
            },
        }
    }
}

/// Compare `candidate` against `ground_truth` with default settings.
#[must_use]
pub fn evaluate(
    ground_truth: &Partition,
    candidate: &Partition,
    universe: Option<&Universe>,
) -> MetricsReport {
    Evaluator::new().evaluate(ground_truth, candidate, universe)
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::Scores;

    const EPS: f64 = 1e-9;

    fn p(clusters: Vec<Vec<u64>>) -> Partition {
        Partition::from_ids(clusters)
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < EPS
    }

    #[test]
    fn concrete_scenario() {
        let truth = p(vec![vec![1, 2, 3], vec![4, 5]]);
        let candidate = p(vec![vec![1, 2], vec![3], vec![4, 5]]);
        let universe = Universe::from_ids(1..=5);

        let report = evaluate(&truth, &candidate, Some(&universe));

        // Candidate links {1,2},{4,5} are both true; truth has 4 links.
        assert_eq!(report.pairwise.precision, 1.0);
        assert!(close(report.pairwise.recall, 0.5));
        assert!(close(report.pairwise.f1, 2.0 / 3.0));

        assert!(close(report.closest_cluster_f1.precision, 2.0 / 3.0));
        assert!(close(report.closest_cluster_f1.recall, 5.0 / 6.0));

        assert!(report.v_measure > 0.0 && report.v_measure < 1.0);
        assert!(report.vi > 0.0);
        assert_eq!(report.diagnostics.universe_size, 5);
        assert_eq!(report.diagnostics.candidate_clusters, 3);
    }

    #[test]
    fn identity_is_perfect() {
        let partition = p(vec![vec![1, 2, 3], vec![4, 5], vec![6, 7, 8, 9]]);
        let universe = Universe::from_ids(1..=12);

        let report = evaluate(&partition, &partition, Some(&universe));

        assert_eq!(report.pairwise, Scores::new(1.0, 1.0));
        assert_eq!(report.closest_cluster_f1, Scores::new(1.0, 1.0));
        assert!(close(report.v_measure, 1.0));
        assert!(close(report.vi, 0.0));
    }

    #[test]
    fn empty_partitions_return_sentinels() {
        let universe = Universe::from_ids(1..=3);
        let report = evaluate(&p(vec![]), &p(vec![]), Some(&universe));

        assert_eq!(report.pairwise, Scores::default());
        assert_eq!(report.closest_cluster_f1, Scores::default());
        assert_eq!(report.vi, 0.0);
    }

    #[test]
    fn empty_universe_is_all_zero() {
        let report = evaluate(&p(vec![]), &p(vec![]), None);

        assert_eq!(report.pairwise, Scores::default());
        assert_eq!(report.v_measure, 0.0);
        assert_eq!(report.vi, 0.0);
        assert_eq!(report.mutual_information, 0.0);
        assert_eq!(report.closest_cluster_f1, Scores::default());
        assert_eq!(report.diagnostics.universe_size, 0);
    }

    #[test]
    fn empty_truth_against_candidate() {
        let universe = Universe::from_ids(1..=3);
        let report = evaluate(&p(vec![]), &p(vec![vec![1, 2]]), Some(&universe));

        assert_eq!(report.pairwise, Scores::default());
        assert_eq!(report.closest_cluster_f1, Scores::default());
        assert!(report.vi > 0.0);
        assert!((0.0..=1.0).contains(&report.v_measure));
    }

    #[test]
    fn repeated_calls_are_bit_identical() {
        let truth = p(vec![vec![1, 2, 3], vec![4, 5], vec![7, 8]]);
        let candidate = p(vec![vec![1, 2], vec![3, 4, 5], vec![8, 9]]);
        let universe = Universe::from_ids(1..=10);

        let first = evaluate(&truth, &candidate, Some(&universe));
        let second = evaluate(&truth, &candidate, Some(&universe));

        assert_eq!(first.v_measure.to_bits(), second.v_measure.to_bits());
        assert_eq!(first.vi.to_bits(), second.vi.to_bits());
        assert_eq!(first, second);
    }

    #[test]
    fn duplicate_ids_resolve_last_wins_everywhere() {
        let truth = p(vec![vec![1, 2], vec![3, 4]]);
        // 2 is claimed twice; the later cluster keeps it.
        let candidate = p(vec![vec![1, 2], vec![2, 3, 4]]);
        let resolved = p(vec![vec![1], vec![2, 3, 4]]);

        let with_duplicates = evaluate(&truth, &candidate, None);
        let clean = evaluate(&truth, &resolved, None);

        assert_eq!(with_duplicates.pairwise, clean.pairwise);
        assert_eq!(with_duplicates.closest_cluster_f1, clean.closest_cluster_f1);
        assert_eq!(with_duplicates.v_measure, clean.v_measure);
        assert_eq!(with_duplicates.diagnostics.candidate.duplicate_memberships, 1);
        assert!(candidate.validate(None).is_err());
    }

    #[test]
    fn ids_outside_explicit_universe_are_ignored() {
        let truth = p(vec![vec![1, 2]]);
        let candidate = p(vec![vec![1, 2, 99]]);
        let universe = Universe::from_ids([1, 2, 3]);

        let report = evaluate(&truth, &candidate, Some(&universe));

        assert_eq!(report.pairwise, Scores::new(1.0, 1.0));
        assert_eq!(report.diagnostics.candidate.out_of_universe, 1);
    }

    #[test]
    fn explicit_universe_counts_dropped_records() {
        let truth = p(vec![vec![1, 2]]);
        let candidate = p(vec![vec![1, 2]]);

        let derived = evaluate(&truth, &candidate, None);
        let wide = evaluate(&truth, &candidate, Some(&Universe::from_ids(1..=6)));

        assert_eq!(derived.diagnostics.universe_size, 2);
        assert_eq!(wide.diagnostics.universe_size, 6);
        assert!(close(wide.v_measure, 1.0));
    }

    #[test]
    fn unassigned_policy_changes_information_scores_only() {
        let truth = p(vec![vec![1, 2], vec![3, 4]]);
        let candidate = p(vec![vec![1, 2]]);
        let universe = Universe::from_ids(1..=4);

        let singletons = evaluate(&truth, &candidate, Some(&universe));
        let shared = Evaluator::with_config(EvaluatorConfig {
            unassigned: UnassignedPolicy::SharedLabel,
        })
        .evaluate(&truth, &candidate, Some(&universe));

        assert_eq!(singletons.pairwise, shared.pairwise);
        assert_eq!(singletons.closest_cluster_f1, shared.closest_cluster_f1);
        // Sharing one label makes {3,4} look like a recovered cluster.
        assert!(close(shared.v_measure, 1.0));
        assert!(singletons.v_measure < 1.0);
    }
}

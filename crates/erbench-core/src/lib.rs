//! # ERBench Core
//!
//! The deterministic Partition Evaluator.
//!
//! Given a ground-truth partition of record IDs and a candidate partition
//! produced by some clustering method, the evaluator computes:
//!
//! - pairwise co-membership precision/recall/F1
//! - V-measure, Variation of Information and mutual information
//! - closest-cluster (best-match Jaccard) precision/recall/F1
//!
//! ## Constraints
//!
//! - No I/O, no async, no shared state: every call is independent
//! - `BTreeMap`/`BTreeSet` only, so identical inputs give bit-identical reports
//! - Evaluation never fails: malformed partitions are resolved
//!   (last cluster wins) and the resolution is recorded in [`Diagnostics`]
//!
//! ## Example
//!
//! ```
//! use erbench_core::{evaluate, Partition};
//!
//! let truth = Partition::from_ids(vec![vec![1, 2, 3], vec![4, 5]]);
//! let candidate = Partition::from_ids(vec![vec![1, 2], vec![3], vec![4, 5]]);
//!
//! let report = evaluate(&truth, &candidate, None);
//! assert_eq!(report.pairwise.precision, 1.0);
//! assert_eq!(report.pairwise.recall, 0.5);
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

pub mod closest;
pub mod error;
pub mod evaluator;
pub mod information;
pub mod labels;
pub mod pairwise;
pub mod partition;
pub mod report;

pub use error::PartitionError;
pub use evaluator::{evaluate, Evaluator, EvaluatorConfig};
pub use labels::{Label, LabelAssignment, UnassignedPolicy};
pub use partition::{Partition, ResolvedPartition};
pub use report::{Diagnostics, MetricsReport, ResolutionStats, Scores};

// =============================================================================
// RECORD ID
// =============================================================================

/// Opaque identifier of a record.
///
/// Serialized as a bare JSON integer.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct RecordId(pub u64);

impl From<u64> for RecordId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// =============================================================================
// UNIVERSE
// =============================================================================

/// The set of record IDs a comparison is scored over.
///
/// IDs in the universe that no cluster claims are treated as unassigned.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Universe(BTreeSet<RecordId>);

impl Universe {
    /// Create an empty universe.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Union of every ID appearing in any of the given partitions.
    #[must_use]
    pub fn derived_from(partitions: &[&Partition]) -> Self {
        partitions
            .iter()
            .flat_map(|p| p.clusters().iter().flatten().copied())
            .collect()
    }

    /// Build a universe from raw integer IDs.
    pub fn from_ids(ids: impl IntoIterator<Item = u64>) -> Self {
        ids.into_iter().map(RecordId).collect()
    }

    /// Check membership.
    #[must_use]
    pub fn contains(&self, id: RecordId) -> bool {
        self.0.contains(&id)
    }

    /// Number of IDs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True when no IDs are under consideration.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate IDs in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = RecordId> + '_ {
        self.0.iter().copied()
    }
}

impl FromIterator<RecordId> for Universe {
    fn from_iter<I: IntoIterator<Item = RecordId>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

// =============================================================================
// TESTS
// =============================================================================

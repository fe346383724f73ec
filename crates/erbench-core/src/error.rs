//! # Error Module
//!
//! Strict-mode validation errors.
//!
//! Evaluation itself never fails. These errors exist for callers that want
//! to reject malformed partitions instead of accepting the deterministic
//! resolution applied by the evaluator.

use crate::RecordId;
use thiserror::Error;

/// A partition broke the "each ID in at most one non-empty cluster" contract.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PartitionError {
    /// The same ID was claimed by two clusters.
    #[error("record {id} appears in cluster {first_cluster} and cluster {second_cluster}")]
    DuplicateId {
        id: RecordId,
        first_cluster: usize,
        second_cluster: usize,
    },

    /// A cluster had no members.
    #[error("cluster {index} is empty")]
    EmptyCluster { index: usize },

    /// An ID outside the declared universe was assigned to a cluster.
    #[error("record {id} in cluster {cluster} is not part of the universe")]
    OutOfUniverse { id: RecordId, cluster: usize },
}

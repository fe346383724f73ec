//! # Labels Module
//!
//! Label assignment: the ID -> cluster index mapping consumed by the
//! information-theoretic metrics.
//!
//! Clusters are numbered in encounter order. Label numbers are internal;
//! every metric built on them is invariant under relabeling.

use crate::partition::ResolvedPartition;
use crate::{RecordId, Universe};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The label of one record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Label {
    /// Member of the cluster at this index.
    Cluster(usize),
    /// Reserved "no cluster" label.
    Unassigned,
}

/// How unassigned records are grouped when counting blocks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnassignedPolicy {
    /// Each unassigned record is its own singleton block.
    #[default]
    Singletons,
    /// All unassigned records share one block.
    SharedLabel,
}

/// Label of every record in the universe, ascending by ID.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelAssignment {
    labels: BTreeMap<RecordId, Label>,
}

impl LabelAssignment {
    /// Stamp every member of every cluster with the cluster's index.
    ///
    /// Universe IDs that no cluster claims get [`Label::Unassigned`].
    /// Cluster members outside the universe are ignored.
    #[must_use]
    pub fn build(partition: &ResolvedPartition, universe: &Universe) -> Self {
        let mut labels: BTreeMap<RecordId, Label> =
            universe.iter().map(|id| (id, Label::Unassigned)).collect();

        for (index, cluster) in partition.clusters.iter().enumerate() {
            for id in cluster {
                if let Some(label) = labels.get_mut(id) {
                    *label = Label::Cluster(index);
                }
            }
        }

        Self { labels }
    }

    /// Label of one record, if it is in the universe.
    #[must_use]
    pub fn get(&self, id: RecordId) -> Option<Label> {
        self.labels.get(&id).copied()
    }

    /// Number of labelled records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// True when the universe was empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Block numbers, one per record in ascending ID order.
    ///
    /// Two records share a block exactly when they share a cluster, or when
    /// both are unassigned under [`UnassignedPolicy::SharedLabel`].
    #[must_use]
    pub fn blocks(&self, policy: UnassignedPolicy) -> Vec<usize> {
        let clusters = self
            .labels
            .values()
            .filter_map(|label| match label {
                Label::Cluster(index) => Some(*index),
                Label::Unassigned => None,
            })
            .max()
            .map_or(0, |max| max + 1);

        let mut next_singleton = clusters + 1;
        self.labels
            .values()
            .map(|label| match (label, policy) {
                (Label::Cluster(index), _) => *index,
                (Label::Unassigned, UnassignedPolicy::SharedLabel) => clusters,
                (Label::Unassigned, UnassignedPolicy::Singletons) => {
                    next_singleton += 1;
                    next_singleton - 1
                }
            })
            .collect()
    }
}

// =============================================================================
// TESTS
// =============================================================================

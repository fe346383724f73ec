//! # Partition Module
//!
//! Cluster partitions as produced upstream, and their resolved form.
//!
//! A [`Partition`] is kept exactly as it was received: producers (model-backed
//! clusterers in particular) do not reliably uphold the "each ID in at most
//! one cluster" contract. Before scoring, the evaluator turns it into a
//! [`ResolvedPartition`] by applying these rules in order:
//!
//! 1. IDs outside an explicit universe are dropped.
//! 2. Repeats of an ID inside one cluster collapse to a single member.
//! 3. An ID claimed by several clusters belongs to the last of them.
//! 4. Clusters left empty are dropped.
//!
//! Every metric is computed from the same resolved partition, so the report
//! is always internally consistent. Callers that prefer rejection use
//! [`Partition::validate`].

use crate::error::PartitionError;
use crate::report::ResolutionStats;
use crate::{RecordId, Universe};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

// =============================================================================
// PARTITION
// =============================================================================

/// An ordered sequence of clusters of record IDs.
///
/// Serialized as a JSON array of arrays: `[[1, 2, 3], [4, 5]]`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Partition {
    clusters: Vec<Vec<RecordId>>,
}

impl Partition {
    /// Create a partition from clusters, in encounter order.
    #[must_use]
    pub fn new(clusters: Vec<Vec<RecordId>>) -> Self {
        Self { clusters }
    }

    /// Create a partition from raw integer IDs.
    #[must_use]
    pub fn from_ids(clusters: Vec<Vec<u64>>) -> Self {
        Self::new(
            clusters
                .into_iter()
                .map(|c| c.into_iter().map(RecordId).collect())
                .collect(),
        )
    }

    /// The clusters as received.
    #[must_use]
    pub fn clusters(&self) -> &[Vec<RecordId>] {
        &self.clusters
    }

    /// Number of clusters as received.
    #[must_use]
    pub fn len(&self) -> usize {
        self.clusters.len()
    }

    /// True when there are no clusters.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.clusters.is_empty()
    }

    /// Strictly check the partition contract.
    ///
    /// Reports the first violation found, scanning clusters in order:
    /// an empty cluster, an ID outside `universe` (when given), or an ID
    /// already claimed by an earlier cluster. Repeats of an ID inside a
    /// single cluster are not a violation.
    pub fn validate(&self, universe: Option<&Universe>) -> Result<(), PartitionError> {
        let mut owner: BTreeMap<RecordId, usize> = BTreeMap::new();

        for (index, cluster) in self.clusters.iter().enumerate() {
            if cluster.is_empty() {
                return Err(PartitionError::EmptyCluster { index });
            }
            for &id in cluster {
                if let Some(universe) = universe {
                    if !universe.contains(id) {
                        return Err(PartitionError::OutOfUniverse { id, cluster: index });
                    }
                }
                match owner.get(&id) {
                    Some(&first) if first != index => {
                        return Err(PartitionError::DuplicateId {
                            id,
                            first_cluster: first,
                            second_cluster: index,
                        });
                    }
                    Some(_) => {}
                    None => {
                        owner.insert(id, index);
                    }
                }
            }
        }

        Ok(())
    }

    /// Apply the deterministic resolution rules described in the module docs.
    #[must_use]
    pub fn resolve(&self, universe: Option<&Universe>) -> ResolvedPartition {
        let mut stats = ResolutionStats::default();
        // Last writer wins: later clusters overwrite the owner of an ID.
        let mut owner: BTreeMap<RecordId, usize> = BTreeMap::new();

        for (index, cluster) in self.clusters.iter().enumerate() {
            for &id in cluster {
                if universe.is_some_and(|u| !u.contains(id)) {
                    stats.out_of_universe += 1;
                    continue;
                }
                if let Some(previous) = owner.insert(id, index) {
                    if previous != index {
                        stats.duplicate_memberships += 1;
                    }
                }
            }
        }

        let mut members: Vec<BTreeSet<RecordId>> = vec![BTreeSet::new(); self.clusters.len()];
        for (id, index) in owner {
            members[index].insert(id);
        }

        let clusters: Vec<BTreeSet<RecordId>> = members
            .into_iter()
            .filter(|cluster| {
                if cluster.is_empty() {
                    stats.empty_clusters += 1;
                    false
                } else {
                    true
                }
            })
            .collect();

        ResolvedPartition { clusters, stats }
    }

    /// Build a partition from matched record pairs.
    ///
    /// Clusters are the connected components of the match graph. Members are
    /// sorted ascending, clusters are ordered by their smallest member, and
    /// singleton components are omitted.
    #[must_use]
    pub fn from_matched_pairs(pairs: impl IntoIterator<Item = (RecordId, RecordId)>) -> Self {
        let pairs: Vec<(RecordId, RecordId)> = pairs.into_iter().collect();
        let ids: Vec<RecordId> = pairs
            .iter()
            .flat_map(|&(a, b)| [a, b])
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let index: BTreeMap<RecordId, usize> =
            ids.iter().enumerate().map(|(i, &id)| (id, i)).collect();

        let mut components = DisjointSet::new(ids.len());
        for (a, b) in &pairs {
            if let (Some(&ia), Some(&ib)) = (index.get(a), index.get(b)) {
                components.union(ia, ib);
            }
        }

        // `ids` is ascending, so every member list comes out sorted.
        let mut groups: BTreeMap<usize, Vec<RecordId>> = BTreeMap::new();
        for (i, &id) in ids.iter().enumerate() {
            groups.entry(components.find(i)).or_default().push(id);
        }

        let mut clusters: Vec<Vec<RecordId>> =
            groups.into_values().filter(|c| c.len() > 1).collect();
        clusters.sort_by_key(|c| c.first().copied());

        Self::new(clusters)
    }
}

// =============================================================================
// RESOLVED PARTITION
// =============================================================================

/// A partition after resolution: disjoint, non-empty clusters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedPartition {
    /// Disjoint, non-empty clusters in input order.
    pub clusters: Vec<BTreeSet<RecordId>>,
    /// What resolution had to change.
    pub stats: ResolutionStats,
}

impl ResolvedPartition {
    /// Every ID assigned to some cluster, ascending.
    pub fn assigned_ids(&self) -> BTreeSet<RecordId> {
        self.clusters.iter().flatten().copied().collect()
    }
}

// =============================================================================
// DISJOINT SET
// =============================================================================

/// Union-find over dense indices. The smaller root always wins a union,
/// which keeps component roots independent of pair order.
struct DisjointSet {
    parent: Vec<usize>,
}

impl DisjointSet {
    fn new(size: usize) -> Self {
        Self {
            parent: (0..size).collect(),
        }
    }

    fn find(&mut self, mut x: usize) -> usize {
        while self.parent[x] != x {
            self.parent[x] = self.parent[self.parent[x]];
            x = self.parent[x];
        }
        x
    }

    fn union(&mut self, a: usize, b: usize) {
        let ra = self.find(a);
        let rb = self.find(b);
        if ra < rb {
            self.parent[rb] = ra;
        } else if rb < ra {
            self.parent[ra] = rb;
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(cluster: &BTreeSet<RecordId>) -> Vec<u64> {
        cluster.iter().map(|id| id.0).collect()
    }

    #[test]
    fn deserializes_from_nested_arrays() {
        let partition: Partition = serde_json::from_str("[[1,2,3],[4,5]]").unwrap_or_default();
        assert_eq!(partition, Partition::from_ids(vec![vec![1, 2, 3], vec![4, 5]]));
    }

    #[test]
    fn validate_accepts_well_formed() {
        let p = Partition::from_ids(vec![vec![1, 2], vec![3, 4]]);
        assert_eq!(p.validate(None), Ok(()));
    }

    #[test]
    fn validate_rejects_duplicate_across_clusters() {
        let p = Partition::from_ids(vec![vec![1, 2], vec![3], vec![2, 4]]);
        assert_eq!(
            p.validate(None),
            Err(PartitionError::DuplicateId {
                id: RecordId(2),
                first_cluster: 0,
                second_cluster: 2,
            })
        );
    }

    #[test]
    fn validate_rejects_empty_cluster() {
        let p = Partition::from_ids(vec![vec![1, 2], vec![]]);
        assert_eq!(
            p.validate(None),
            Err(PartitionError::EmptyCluster { index: 1 })
        );
    }

    #[test]
    fn validate_rejects_out_of_universe() {
        let p = Partition::from_ids(vec![vec![1, 9]]);
        let universe = Universe::from_ids([1, 2, 3]);
        assert_eq!(
            p.validate(Some(&universe)),
            Err(PartitionError::OutOfUniverse {
                id: RecordId(9),
                cluster: 0,
            })
        );
    }

    #[test]
    fn validate_tolerates_repeat_within_cluster() {
        let p = Partition::from_ids(vec![vec![1, 1, 2]]);
        assert_eq!(p.validate(None), Ok(()));
    }

    #[test]
    fn resolve_last_cluster_wins() {
        let p = Partition::from_ids(vec![vec![1, 2, 3], vec![3, 4]]);
        let resolved = p.resolve(None);

        assert_eq!(resolved.clusters.len(), 2);
        assert_eq!(ids(&resolved.clusters[0]), vec![1, 2]);
        assert_eq!(ids(&resolved.clusters[1]), vec![3, 4]);
        assert_eq!(resolved.stats.duplicate_memberships, 1);
    }

    #[test]
    fn resolve_drops_emptied_and_empty_clusters() {
        let p = Partition::from_ids(vec![vec![1], vec![], vec![1, 2]]);
        let resolved = p.resolve(None);

        assert_eq!(resolved.clusters.len(), 1);
        assert_eq!(ids(&resolved.clusters[0]), vec![1, 2]);
        assert_eq!(resolved.stats.empty_clusters, 2);
        assert_eq!(resolved.stats.duplicate_memberships, 1);
    }

    #[test]
    fn resolve_drops_out_of_universe() {
        let p = Partition::from_ids(vec![vec![1, 2, 99], vec![98]]);
        let universe = Universe::from_ids([1, 2, 3]);
        let resolved = p.resolve(Some(&universe));

        assert_eq!(resolved.clusters.len(), 1);
        assert_eq!(ids(&resolved.clusters[0]), vec![1, 2]);
        assert_eq!(resolved.stats.out_of_universe, 2);
        assert_eq!(resolved.stats.empty_clusters, 1);
    }

    #[test]
    fn resolve_collapses_repeats() {
        let p = Partition::from_ids(vec![vec![5, 5, 6]]);
        let resolved = p.resolve(None);

        assert_eq!(ids(&resolved.clusters[0]), vec![5, 6]);
        assert_eq!(resolved.stats, ResolutionStats::default());
    }

    #[test]
    fn matched_pairs_form_components() {
        let pairs = [(5, 6), (1, 2), (2, 3), (9, 9)]
            .into_iter()
            .map(|(a, b)| (RecordId(a), RecordId(b)));
        let partition = Partition::from_matched_pairs(pairs);

        assert_eq!(
            partition,
            Partition::from_ids(vec![vec![1, 2, 3], vec![5, 6]])
        );
    }

    #[test]
    fn matched_pairs_independent_of_order() {
        let forward = [(1, 2), (3, 4), (2, 3)];
        let backward = [(3, 2), (4, 3), (2, 1)];

        let a = Partition::from_matched_pairs(
            forward.into_iter().map(|(x, y)| (RecordId(x), RecordId(y))),
        );
        let b = Partition::from_matched_pairs(
            backward.into_iter().map(|(x, y)| (RecordId(x), RecordId(y))),
        );
        assert_eq!(a, b);
        assert_eq!(a, Partition::from_ids(vec![vec![1, 2, 3, 4]]));
    }
}

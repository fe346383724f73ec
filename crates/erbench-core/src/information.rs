//! # Information Module
//!
//! Entropy-based agreement between two label assignments.
//!
//! With `n` records, contingency counts `n_ij`, ground-truth block sizes
//! `a_i` and candidate block sizes `b_j` (all logarithms natural, results in
//! nats):
//!
//! ```text
//! H(C)   = -sum_i (a_i/n) ln(a_i/n)
//! H(K)   = -sum_j (b_j/n) ln(b_j/n)
//! I(C;K) =  sum_ij (n_ij/n) ln(n n_ij / (a_i b_j))
//!
//! homogeneity   h = I / H(C)          (1 when H(C) = 0)
//! completeness  c = I / H(K)          (1 when H(K) = 0)
//! v_measure       = 2hc / (h + c)     (0 when h + c = 0)
//! VI              = H(C) + H(K) - 2I  (Variation of Information)
//! ```
//!
//! `h = I / H(C)` is the same quantity as `1 - H(C|K) / H(C)`.
//! An empty universe scores 0 everywhere.

use crate::report::harmonic_mean;
use std::collections::BTreeMap;

/// Information-theoretic scores of one comparison.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct InformationScores {
    pub entropy_truth: f64,
    pub entropy_candidate: f64,
    pub mutual_information: f64,
    pub homogeneity: f64,
    pub completeness: f64,
    pub v_measure: f64,
    pub variation_of_information: f64,
}

/// Joint and marginal block counts over the same records.
#[derive(Debug, Clone, Default)]
pub struct Contingency {
    n: usize,
    joint: BTreeMap<(usize, usize), usize>,
    truth: BTreeMap<usize, usize>,
    candidate: BTreeMap<usize, usize>,
}

impl Contingency {
    /// Count co-occurrences of blocks, record by record.
    ///
    /// Both slices must list the same records in the same order.
    #[must_use]
    pub fn build(truth: &[usize], candidate: &[usize]) -> Self {
        debug_assert_eq!(truth.len(), candidate.len());

        let mut table = Self::default();
        for (&t, &c) in truth.iter().zip(candidate) {
            table.n += 1;
            *table.joint.entry((t, c)).or_default() += 1;
            *table.truth.entry(t).or_default() += 1;
            *table.candidate.entry(c).or_default() += 1;
        }
        table
    }

    /// Number of records counted.
    #[must_use]
    pub fn total(&self) -> usize {
        self.n
    }

    /// Entropy of the ground-truth marginal.
    #[must_use]
    pub fn entropy_truth(&self) -> f64 {
        entropy(self.truth.values().copied(), self.n)
    }

    /// Entropy of the candidate marginal.
    #[must_use]
    pub fn entropy_candidate(&self) -> f64 {
        entropy(self.candidate.values().copied(), self.n)
    }

    /// Mutual information, clamped at 0.
    #[must_use]
    pub fn mutual_information(&self) -> f64 {
        if self.n == 0 {
            return 0.0;
        }
        let n = self.n as f64;
        let ln_n = n.ln();

        let mut mi = 0.0;
        for (&(t, c), &count) in &self.joint {
            let a = self.truth.get(&t).copied().unwrap_or(count) as f64;
            let b = self.candidate.get(&c).copied().unwrap_or(count) as f64;
            let count = count as f64;
            mi += (count / n) * (count.ln() + ln_n - a.ln() - b.ln());
        }
        mi.max(0.0)
    }

    /// All scores derived from this table.
    #[must_use]
    pub fn scores(&self) -> InformationScores {
        if self.n == 0 {
            return InformationScores::default();
        }

        let entropy_truth = self.entropy_truth();
        let entropy_candidate = self.entropy_candidate();
        let mutual_information = self.mutual_information();

        let homogeneity = normalized(mutual_information, entropy_truth);
        let completeness = normalized(mutual_information, entropy_candidate);

        InformationScores {
            entropy_truth,
            entropy_candidate,
            mutual_information,
            homogeneity,
            completeness,
            v_measure: harmonic_mean(homogeneity, completeness),
            variation_of_information: (entropy_truth + entropy_candidate
                - 2.0 * mutual_information)
                .max(0.0),
        }
    }
}

/// Scores for two block assignments over the same records.
#[must_use]
pub fn information_scores(truth: &[usize], candidate: &[usize]) -> InformationScores {
    Contingency::build(truth, candidate).scores()
}

/// Shannon entropy (nats) of a distribution given as counts summing to `n`.
fn entropy(counts: impl Iterator<Item = usize>, n: usize) -> f64 {
    if n == 0 {
        return 0.0;
    }
    let n = n as f64;
    let h: f64 = counts
        .filter(|&c| c > 0)
        .map(|c| {
            let p = c as f64 / n;
            -p * p.ln()
        })
        .sum();
    h.max(0.0)
}

/// `mi / h` clamped to `[0, 1]`; a zero-entropy side is perfectly explained.
fn normalized(mi: f64, h: f64) -> f64 {
    if h > 0.0 { (mi / h).clamp(0.0, 1.0) } else { 1.0 }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    #[test]
    fn identical_assignments() {
        let blocks = [0, 0, 0, 1, 1, 2];
        let s = information_scores(&blocks, &blocks);

        assert!((s.v_measure - 1.0).abs() < EPS);
        assert!(s.variation_of_information.abs() < EPS);
        assert!((s.mutual_information - s.entropy_truth).abs() < EPS);
    }

    #[test]
    fn relabeling_does_not_matter() {
        let a = [0, 0, 1, 1, 2];
        let b = [7, 7, 3, 3, 9];
        let s = information_scores(&a, &b);

        assert!((s.v_measure - 1.0).abs() < EPS);
        assert!(s.variation_of_information.abs() < EPS);
    }

    #[test]
    fn independent_assignments_share_no_information() {
        // Each truth block is split evenly across both candidate blocks.
        let truth = [0, 0, 1, 1];
        let candidate = [0, 1, 0, 1];
        let s = information_scores(&truth, &candidate);

        assert!(s.mutual_information.abs() < EPS);
        assert!(s.v_measure.abs() < EPS);
        assert!((s.variation_of_information - 2.0 * 2f64.ln()).abs() < EPS);
    }

    #[test]
    fn one_giant_cluster_scores_low() {
        let truth = [0, 0, 1, 1, 2, 2, 3, 3];
        let candidate = [0; 8];
        let s = information_scores(&truth, &candidate);

        assert!(s.homogeneity.abs() < EPS);
        assert_eq!(s.completeness, 1.0);
        assert!(s.v_measure.abs() < EPS);
    }

    #[test]
    fn known_v_measure() {
        // truth {0,1,2},{3,4}; candidate {0,1},{2},{3,4}
        let truth = [0, 0, 0, 1, 1];
        let candidate = [0, 0, 1, 2, 2];
        let s = information_scores(&truth, &candidate);

        let ln = |x: f64| x.ln();
        let h_c = -(0.6 * ln(0.6) + 0.4 * ln(0.4));
        let h_k = -(0.4 * ln(0.4) + 0.2 * ln(0.2) + 0.4 * ln(0.4));
        // Candidate refines truth, so I = H(C).
        assert!((s.mutual_information - h_c).abs() < EPS);
        assert!((s.homogeneity - 1.0).abs() < EPS);
        assert!((s.completeness - h_c / h_k).abs() < EPS);
        assert!((s.variation_of_information - (h_k - h_c)).abs() < EPS);
    }

    #[test]
    fn empty_input_is_all_zero() {
        let s = information_scores(&[], &[]);
        assert_eq!(s, InformationScores::default());
    }

    #[test]
    fn symmetric_under_swap() {
        let a = [0, 0, 1, 1, 1, 2];
        let b = [0, 1, 1, 2, 2, 2];
        let ab = information_scores(&a, &b);
        let ba = information_scores(&b, &a);

        assert!((ab.v_measure - ba.v_measure).abs() < EPS);
        assert!((ab.variation_of_information - ba.variation_of_information).abs() < EPS);
        assert!((ab.homogeneity - ba.completeness).abs() < EPS);
    }
}

use ahash::AHashMap;

use crate::pair::RecordPair;

/// Multiset Jaccard index over the accessions of both working windows.
#[must_use]
pub fn calc_jaccard_pair(pair: &RecordPair) -> f64 {
    let (a_window, b_window) = pair.window_accessions();
    let a_counts = accession_counts(a_window);
    let b_counts = accession_counts(b_window);

    let mut intersection = 0_usize;
    let mut union = 0_usize;
    for (accession, &count_a) in &a_counts {
        let count_b = b_counts.get(accession).copied().unwrap_or(0);
        intersection += count_a.min(count_b);
        union += count_a.max(count_b);
    }
    for (accession, &count_b) in &b_counts {
        if !a_counts.contains_key(accession) {
            union += count_b;
        }
    }

    if union == 0 {
        return 0.0;
    }
    intersection as f64 / union as f64
}

fn accession_counts<'a>(window: &[&'a str]) -> AHashMap<&'a str, usize> {
    let mut counts = AHashMap::new();
    for accession in window {
        *counts.entry(*accession).or_insert(0) += 1;
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{pair_of, OTHER};

    #[test]
    fn identical_records_score_one() {
        let arena = pair_of(
            &[(OTHER, &["PF1", "PF2"]), (OTHER, &["PF3"])],
            &[(OTHER, &["PF1", "PF2"]), (OTHER, &["PF3"])],
        );
        assert!((calc_jaccard_pair(&arena.pair()) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn disjoint_records_score_zero() {
        let arena = pair_of(&[(OTHER, &["PF1"])], &[(OTHER, &["PF2"])]);
        assert_eq!(calc_jaccard_pair(&arena.pair()), 0.0);
    }

    #[test]
    fn multiset_counts_matter() {
        let arena = pair_of(
            &[(OTHER, &["PF1", "PF1", "PF2"])],
            &[(OTHER, &["PF1", "PF2"])],
        );
        // intersection min(2,1)+min(1,1) = 2; union max(2,1)+max(1,1) = 3.
        assert!((calc_jaccard_pair(&arena.pair()) - 2.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn symmetric_in_a_and_b() {
        let lhs = pair_of(
            &[(OTHER, &["PF1", "PF2"])],
            &[(OTHER, &["PF2", "PF3", "PF4"])],
        );
        let rhs = pair_of(
            &[(OTHER, &["PF2", "PF3", "PF4"])],
            &[(OTHER, &["PF1", "PF2"])],
        );
        assert!((calc_jaccard_pair(&lhs.pair()) - calc_jaccard_pair(&rhs.pair())).abs() < 1e-9);
    }

    #[test]
    fn respects_window_bounds() {
        let arena = pair_of(
            &[(OTHER, &["PF1"]), (OTHER, &["PF2"])],
            &[(OTHER, &["PF1"]), (OTHER, &["PF9"])],
        );
        let mut pair = arena.pair();
        pair.comparable_region.domain_a_stop = 1;
        pair.comparable_region.domain_b_stop = 1;
        assert!((calc_jaccard_pair(&pair) - 1.0).abs() < 1e-9);
    }
}

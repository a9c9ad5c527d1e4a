use crate::constants::{
    EXPAND_GAP_SCORE, EXPAND_MATCH_SCORE, EXPAND_MAX_MATCH_PERC, EXPAND_MISMATCH_SCORE,
    MIN_EXPAND_LEN,
};
use crate::pair::RecordPair;

/// Grow the comparable region outward on both ends with affine scoring.
///
/// Each direction walks A's domains away from the window one position at a
/// time, pairing them greedily against B's domains beyond the window (B
/// steps in its oriented coordinate system, so a reversed B extends
/// correctly). A found partner scores a match plus a gap penalty per
/// skipped B position; a missing partner scores a mismatch. The walk halts
/// when the running score drops below zero or the mismatch fraction exceeds
/// the cap, and the best-scoring prefix is kept, provided it advances at
/// least `MIN_EXPAND_LEN` positions.
pub fn extend(pair: &mut RecordPair) {
    let region = &pair.comparable_region;
    let a = &pair.a_domains;
    let b = pair.b_oriented();

    let (right_a, right_b) = walk_extension(
        &a.accessions()[region.domain_a_stop..],
        &b.accessions()[region.domain_b_stop..],
    );

    let a_head: Vec<&str> = a.accessions()[..region.domain_a_start].iter().rev().copied().collect();
    let b_head: Vec<&str> = b.accessions()[..region.domain_b_start].iter().rev().copied().collect();
    let (left_a, left_b) = walk_extension(&a_head, &b_head);

    let domain_a_start = region.domain_a_start - left_a;
    let domain_a_stop  = region.domain_a_stop + right_a;
    let domain_b_start = region.domain_b_start - left_b;
    let domain_b_stop  = region.domain_b_stop + right_b;

    let (a_start, a_stop) = a.cds_window(domain_a_start, domain_a_stop);
    let (b_start, b_stop) = b.cds_window(domain_b_start, domain_b_stop);

    let region = &mut pair.comparable_region;
    region.domain_a_start = domain_a_start;
    region.domain_a_stop  = domain_a_stop;
    region.domain_b_start = domain_b_start;
    region.domain_b_stop  = domain_b_stop;
    region.a_start = a_start;
    region.a_stop  = a_stop;
    region.b_start = b_start;
    region.b_stop  = b_stop;
}

/// One directional walk. Both slices run outward from the window edge.
/// Returns the accepted (A delta, B delta).
fn walk_extension(a_outward: &[&str], b_outward: &[&str]) -> (usize, usize) {
    let mut score: i64 = 0;
    let mut mismatches = 0_usize;
    let mut b_cursor = 0_usize;
    let mut best: (i64, usize, usize) = (0, 0, 0);

    for (step, accession) in a_outward.iter().enumerate() {
        match b_outward[b_cursor..].iter().position(|candidate| candidate == accession) {
            Some(offset) => {
                score += EXPAND_MATCH_SCORE + offset as i64 * EXPAND_GAP_SCORE;
                b_cursor += offset + 1;
            }
            None => {
                score += EXPAND_MISMATCH_SCORE;
                mismatches += 1;
            }
        }

        let steps = step + 1;
        if mismatches as f64 / steps as f64 > EXPAND_MAX_MATCH_PERC {
            break;
        }
        if score < 0 {
            break;
        }
        if score >= best.0 {
            best = (score, steps, b_cursor);
        }
    }

    if best.1 >= MIN_EXPAND_LEN {
        (best.1, best.2)
    } else {
        (0, 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lcs::seed_pair;
    use crate::testutil::{pair_of, CdsSpec, OTHER};
    use crate::workflow::apply_seed;

    fn chain<'s>(accessions: &'s [&'s str]) -> Vec<CdsSpec<'s>> {
        accessions.iter().map(|acc| (OTHER, std::slice::from_ref(acc))).collect()
    }

    #[test]
    fn walk_accepts_clean_run() {
        let tail = ["PF1", "PF2", "PF3", "PF4", "PF5"];
        assert_eq!(walk_extension(&tail, &tail), (5, 5));
    }

    #[test]
    fn walk_rejects_short_run() {
        let tail = ["PF1", "PF2", "PF3"];
        assert_eq!(walk_extension(&tail, &tail), (0, 0));
    }

    #[test]
    fn walk_halts_on_mismatch() {
        let a_tail = ["PF1", "PF2", "PF3", "PF4", "PF5"];
        let b_tail = ["PF9", "PF9", "PF9", "PF9", "PF9"];
        assert_eq!(walk_extension(&a_tail, &b_tail), (0, 0));
    }

    #[test]
    fn walk_pays_gap_penalties() {
        let a_tail = ["PF1", "PF2", "PF3", "PF4", "PF5"];
        let b_tail = ["PF1", "PF8", "PF2", "PF3", "PF4", "PF5"];
        // one skipped B position: still five matches, six B steps.
        assert_eq!(walk_extension(&a_tail, &b_tail), (5, 6));
    }

    #[test]
    fn walk_empty_b_side() {
        let a_tail = ["PF1", "PF2", "PF3", "PF4", "PF5"];
        assert_eq!(walk_extension(&a_tail, &[]), (0, 0));
    }

    #[test]
    fn extend_grows_both_windows() {
        // seed on the shared [S1 S2 S3] block, then a clean five-domain
        // continuation to the right on both sides.
        let shared = ["S1", "S2", "S3", "E1", "E2", "E3", "E4", "E5"];
        let a_list = chain(&shared);
        let b_list = chain(&shared);
        let arena = pair_of(&a_list, &b_list);
        let mut pair = arena.pair();

        let seed = seed_pair(&pair).unwrap();
        apply_seed(&mut pair.comparable_region, seed);
        // the full match seeds everything; restrict to the first three to
        // exercise the walk.
        pair.comparable_region.domain_a_stop = 3;
        pair.comparable_region.domain_b_stop = 3;
        pair.comparable_region.a_stop = 3;
        pair.comparable_region.b_stop = 3;

        extend(&mut pair);
        let region = &pair.comparable_region;
        assert_eq!((region.domain_a_start, region.domain_a_stop), (0, 8));
        assert_eq!((region.domain_b_start, region.domain_b_stop), (0, 8));
        assert_eq!((region.a_start, region.a_stop), (0, 8));
        assert_eq!((region.b_start, region.b_stop), (0, 8));
    }

    #[test]
    fn extend_leaves_short_continuations_alone() {
        let a_list = chain(&["S1", "S2", "S3", "E1", "E2"]);
        let b_list = chain(&["S1", "S2", "S3", "E1", "E2"]);
        let arena = pair_of(&a_list, &b_list);
        let mut pair = arena.pair();

        let seed = seed_pair(&pair).unwrap();
        apply_seed(&mut pair.comparable_region, seed);
        pair.comparable_region.domain_a_stop = 3;
        pair.comparable_region.domain_b_stop = 3;
        pair.comparable_region.a_stop = 3;
        pair.comparable_region.b_stop = 3;

        extend(&mut pair);
        // two matching domains remain on the right: below MIN_EXPAND_LEN.
        assert_eq!(pair.comparable_region.domain_a_stop, 3);
        assert_eq!(pair.comparable_region.a_stop, 3);
    }
}

use ahash::AHashMap;

use bgc::Hsp;

use crate::constants::is_anchor;
use crate::pair::RecordPair;

use super::DistanceError;

/// Domain sequence similarity, returned as a distance in [0, 1].
///
/// Unshared domains count 1.0 each. Shared accessions contribute the summed
/// alignment distances of their best-matched instance pairs, plus 1.0 per
/// surplus instance on the more populous side. Anchor domains accumulate in
/// a separate bucket that is boosted before normalisation; the denominator
/// is the boosted total of domain slots.
///
/// # Errors
/// - if two alignments of the same accession differ in length, which breaks
///   the shared-MSA contract of the annotation stage.
pub fn calc_dss_pair(pair: &RecordPair, anchor_boost: f64) -> Result<f64, DistanceError> {
    let (a_hsps, b_hsps) = pair.window_hsps();
    let a_instances = instances_by_accession(a_hsps);
    let b_instances = instances_by_accession(b_hsps);

    let mut anchor_distance = 0.0;
    let mut non_anchor_distance = 0.0;
    let mut anchor_slots = 0_usize;
    let mut non_anchor_slots = 0_usize;

    let mut accessions: Vec<&str> = a_instances.keys().chain(b_instances.keys()).copied().collect();
    accessions.sort_unstable();
    accessions.dedup();

    for accession in accessions {
        let empty: Vec<&Hsp> = Vec::new();
        let on_a = a_instances.get(accession).unwrap_or(&empty);
        let on_b = b_instances.get(accession).unwrap_or(&empty);

        let (distance, slots) = if on_a.is_empty() || on_b.is_empty() {
            let count = on_a.len().max(on_b.len());
            (count as f64, count)
        } else {
            (shared_accession_distance(on_a, on_b)?, on_a.len().max(on_b.len()))
        };

        if is_anchor(accession) {
            anchor_distance += distance;
            anchor_slots += slots;
        } else {
            non_anchor_distance += distance;
            non_anchor_slots += slots;
        }
    }

    let denominator = anchor_boost * anchor_slots as f64 + non_anchor_slots as f64;
    if denominator == 0.0 {
        return Ok(0.0);
    }
    Ok((anchor_boost * anchor_distance + non_anchor_distance) / denominator)
}

/// Distance contributed by one accession present on both sides: the best
/// greedy matching of instance pairs, plus one per unmatched surplus
/// instance.
fn shared_accession_distance(on_a: &[&Hsp], on_b: &[&Hsp]) -> Result<f64, DistanceError> {
    let mut candidates: Vec<(f64, usize, usize)> = Vec::with_capacity(on_a.len() * on_b.len());
    for (i, hsp_a) in on_a.iter().enumerate() {
        for (j, hsp_b) in on_b.iter().enumerate() {
            candidates.push((instance_distance(hsp_a, hsp_b)?, i, j));
        }
    }
    candidates.sort_by(|lhs, rhs| {
        lhs.0.total_cmp(&rhs.0).then_with(|| (lhs.1, lhs.2).cmp(&(rhs.1, rhs.2)))
    });

    let wanted = on_a.len().min(on_b.len());
    let mut used_a = vec![false; on_a.len()];
    let mut used_b = vec![false; on_b.len()];
    let mut matched = 0_usize;
    let mut total = 0.0;
    for (distance, i, j) in candidates {
        if matched == wanted {
            break;
        }
        if used_a[i] || used_b[j] {
            continue;
        }
        used_a[i] = true;
        used_b[j] = true;
        matched += 1;
        total += distance;
    }

    total += (on_a.len().max(on_b.len()) - wanted) as f64;
    Ok(total)
}

/// Distance between two instances of the same domain model. Instances
/// without an alignment on either side count as fully distant.
fn instance_distance(hsp_a: &Hsp, hsp_b: &Hsp) -> Result<f64, DistanceError> {
    match (&hsp_a.alignment, &hsp_b.alignment) {
        (Some(align_a), Some(align_b)) => {
            aligned_string_dist(&align_a.align_string, &align_b.align_string)
        }
        _ => Ok(1.0),
    }
}

/// Simple distance between two equal-length aligned strings: positions
/// where both are gaps are ignored; equal non-gap positions are matches;
/// similarity is matches over non-gap length.
pub fn aligned_string_dist(string_a: &str, string_b: &str) -> Result<f64, DistanceError> {
    if string_a.len() != string_b.len() {
        return Err(DistanceError::AlignmentLengthMismatch {
            len_a: string_a.len(),
            len_b: string_b.len(),
        });
    }

    let mut gaps = 0_usize;
    let mut matches = 0_usize;
    for (char_a, char_b) in string_a.chars().zip(string_b.chars()) {
        if char_a == char_b {
            if char_a == '-' {
                gaps += 1;
            } else {
                matches += 1;
            }
        }
    }

    let non_gap = string_a.len() - gaps;
    if non_gap == 0 {
        return Ok(1.0);
    }
    Ok(1.0 - matches as f64 / non_gap as f64)
}

fn instances_by_accession<'h>(hsps: &[&'h Hsp]) -> AHashMap<&'h str, Vec<&'h Hsp>> {
    let mut instances: AHashMap<&str, Vec<&Hsp>> = AHashMap::new();
    for hsp in hsps {
        instances.entry(hsp.accession.as_str()).or_default().push(hsp);
    }
    instances
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{aligned_pair_of, pair_of, OTHER};

    #[test]
    fn aligned_string_dist_basics() {
        assert_eq!(aligned_string_dist("AAAA", "AAAA").unwrap(), 0.0);
        assert!((aligned_string_dist("AABB", "AACC").unwrap() - 0.5).abs() < 1e-9);
        // shared gap positions are excluded from the denominator.
        assert_eq!(aligned_string_dist("AA--", "AA--").unwrap(), 0.0);
        // all-gap overlap counts as fully distant.
        assert_eq!(aligned_string_dist("--", "--").unwrap(), 1.0);
        assert!(aligned_string_dist("AAA", "AA").is_err());
    }

    #[test]
    fn identical_alignments_score_zero() {
        let arena = aligned_pair_of(
            &[(OTHER, &[("PF1", "MAGICSEQ"), ("PF2", "AND--SEQ")])],
            &[(OTHER, &[("PF1", "MAGICSEQ"), ("PF2", "AND--SEQ")])],
        );
        let distance = calc_dss_pair(&arena.pair(), 1.0).unwrap();
        assert_eq!(distance, 0.0);
    }

    #[test]
    fn unshared_domains_count_fully() {
        let arena = pair_of(&[(OTHER, &["PF1"])], &[(OTHER, &["PF2"])]);
        let distance = calc_dss_pair(&arena.pair(), 1.0).unwrap();
        assert_eq!(distance, 1.0);
    }

    #[test]
    fn shared_alignment_distance_averages_in() {
        // PF1 shared at distance 0.5; PF2 unshared on A.
        let arena = aligned_pair_of(
            &[(OTHER, &[("PF1", "AABB"), ("PF2", "CCCC")])],
            &[(OTHER, &[("PF1", "AACC")])],
        );
        let distance = calc_dss_pair(&arena.pair(), 1.0).unwrap();
        assert!((distance - (0.5 + 1.0) / 2.0).abs() < 1e-9);
    }

    #[test]
    fn surplus_instances_penalized() {
        // two PF1 on A, one on B: best match distance 0, surplus adds 1.0
        // over two slots.
        let arena = aligned_pair_of(
            &[(OTHER, &[("PF1", "AAAA"), ("PF1", "BBBB")])],
            &[(OTHER, &[("PF1", "AAAA")])],
        );
        let distance = calc_dss_pair(&arena.pair(), 1.0).unwrap();
        assert!((distance - 0.5).abs() < 1e-9);
    }

    #[test]
    fn missing_alignments_are_fully_distant() {
        let arena = pair_of(&[(OTHER, &["PF1"])], &[(OTHER, &["PF1"])]);
        let distance = calc_dss_pair(&arena.pair(), 1.0).unwrap();
        assert_eq!(distance, 1.0);
    }

    #[test]
    fn anchor_boost_weighs_anchor_bucket() {
        // anchor PF02801 unshared; PF1 shared and identical.
        let arena = aligned_pair_of(
            &[(OTHER, &[("PF02801", "KSKS"), ("PF1", "AAAA")])],
            &[(OTHER, &[("PF1", "AAAA")])],
        );
        let boost = 4.0;
        let distance = calc_dss_pair(&arena.pair(), boost).unwrap();
        let expected = (boost * 1.0 + 0.0) / (boost * 1.0 + 1.0);
        assert!((distance - expected).abs() < 1e-9);

        // with boost 1.0 the anchor is an ordinary unshared domain.
        let unboosted = calc_dss_pair(&arena.pair(), 1.0).unwrap();
        assert!((unboosted - 0.5).abs() < 1e-9);
    }

    #[test]
    fn symmetric_in_a_and_b() {
        let lhs = aligned_pair_of(
            &[(OTHER, &[("PF1", "AABB"), ("PF2", "CCCC")])],
            &[(OTHER, &[("PF1", "AACC"), ("PF3", "DDDD")])],
        );
        let rhs = aligned_pair_of(
            &[(OTHER, &[("PF1", "AACC"), ("PF3", "DDDD")])],
            &[(OTHER, &[("PF1", "AABB"), ("PF2", "CCCC")])],
        );
        let lhs_distance = calc_dss_pair(&lhs.pair(), 2.0).unwrap();
        let rhs_distance = calc_dss_pair(&rhs.pair(), 2.0).unwrap();
        assert!((lhs_distance - rhs_distance).abs() < 1e-9);
    }
}

use ahash::AHashSet;

use crate::pair::RecordPair;

/// Adjacency index: the fraction of shared unordered pairs of accessions
/// found at consecutive positions of each window's flattened domain list.
#[must_use]
pub fn calc_ai_pair(pair: &RecordPair) -> f64 {
    let (a_window, b_window) = pair.window_accessions();
    let a_pairs = adjacency_pairs(a_window);
    let b_pairs = adjacency_pairs(b_window);

    let intersection = a_pairs.intersection(&b_pairs).count();
    let union = a_pairs.union(&b_pairs).count();
    if union == 0 {
        return 0.0;
    }
    intersection as f64 / union as f64
}

fn adjacency_pairs<'a>(window: &[&'a str]) -> AHashSet<(&'a str, &'a str)> {
    window
        .windows(2)
        .map(|adjacent| {
            if adjacent[0] <= adjacent[1] {
                (adjacent[0], adjacent[1])
            } else {
                (adjacent[1], adjacent[0])
            }
        })
        .collect()
}

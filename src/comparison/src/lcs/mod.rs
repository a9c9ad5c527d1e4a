use ahash::AHashMap;

use bgc::DomainSeq;

use crate::pair::RecordPair;
use crate::region::window_hits_protocore;

mod error;
pub use error::LcsError;

/// A maximal run of equal domains between two sequences.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchBlock {
    pub a_start: usize,
    pub b_start: usize,
    pub len    : usize,
}

/// The chosen seed for a pair's comparable region, on both coordinate axes.
/// B-side coordinates are in the reversed coordinate system when `reverse`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LcsSeed {
    pub domain_a_start: usize,
    pub domain_a_stop : usize,
    pub domain_b_start: usize,
    pub domain_b_stop : usize,
    pub a_cds_start   : usize,
    pub a_cds_stop    : usize,
    pub b_cds_start   : usize,
    pub b_cds_stop    : usize,
    pub reverse       : bool,
}

/// Longest matching run between `a[alo..ahi]` and `b[blo..bhi]`.
///
/// Ties resolve to the earliest A index, then the earliest B index.
fn find_longest_match(
    a: &[&str],
    b2j: &AHashMap<&str, Vec<usize>>,
    alo: usize,
    ahi: usize,
    blo: usize,
    bhi: usize,
) -> MatchBlock {
    let mut best = MatchBlock { a_start: alo, b_start: blo, len: 0 };
    let mut j2len: AHashMap<usize, usize> = AHashMap::new();

    for (i, accession) in a.iter().enumerate().take(ahi).skip(alo) {
        let mut new_j2len: AHashMap<usize, usize> = AHashMap::new();
        if let Some(positions) = b2j.get(accession) {
            for &j in positions {
                if j < blo {
                    continue;
                }
                if j >= bhi {
                    break;
                }
                let run = if j == 0 { 1 } else { j2len.get(&(j - 1)).copied().unwrap_or(0) + 1 };
                new_j2len.insert(j, run);
                if run > best.len {
                    best = MatchBlock { a_start: i + 1 - run, b_start: j + 1 - run, len: run };
                }
            }
        }
        j2len = new_j2len;
    }
    best
}

/// Every maximal matching run between `a` and `b`, sorted by position, with
/// adjacent runs merged. Zero-length sentinels are not produced.
#[must_use]
pub fn matching_blocks(a: &[&str], b: &[&str]) -> Vec<MatchBlock> {
    let mut b2j: AHashMap<&str, Vec<usize>> = AHashMap::new();
    for (j, accession) in b.iter().enumerate() {
        b2j.entry(accession).or_default().push(j);
    }

    let mut queue = vec![(0, a.len(), 0, b.len())];
    let mut blocks = Vec::new();
    while let Some((alo, ahi, blo, bhi)) = queue.pop() {
        let block = find_longest_match(a, &b2j, alo, ahi, blo, bhi);
        if block.len == 0 {
            continue;
        }
        if alo < block.a_start && blo < block.b_start {
            queue.push((alo, block.a_start, blo, block.b_start));
        }
        if block.a_start + block.len < ahi && block.b_start + block.len < bhi {
            queue.push((block.a_start + block.len, ahi, block.b_start + block.len, bhi));
        }
        blocks.push(block);
    }
    blocks.sort_by_key(|block| (block.a_start, block.b_start));

    let mut merged: Vec<MatchBlock> = Vec::with_capacity(blocks.len());
    for block in blocks {
        match merged.last_mut() {
            Some(last)
                if last.a_start + last.len == block.a_start
                    && last.b_start + last.len == block.b_start =>
            {
                last.len += block.len;
            }
            _ => merged.push(block),
        }
    }
    merged
}

/// Pick the comparable-region seed for a pair.
///
/// Matching runs are gathered in both orientations and filtered by the
/// pair's core predicate (biosynthetic CDS on either side; protocore
/// intersection for protocluster pairs). Among the qualifying runs (or all
/// runs when none qualifies) the longest wins; length ties are resolved by
/// centrality on the shorter record, and remaining ties by insertion order,
/// forward before reverse.
///
/// # Errors
/// - `LcsError::NoCommonDomains` when no orientation yields a match. The
///   upstream Jaccard gate makes this a contract violation.
pub fn seed_pair(pair: &RecordPair) -> Result<LcsSeed, LcsError> {
    let a = &pair.a_domains;
    let b_fwd = &pair.b_domains;
    let b_rev = &pair.b_domains_rev;

    let mut candidates: Vec<(MatchBlock, bool)> = matching_blocks(a.accessions(), b_fwd.accessions())
        .into_iter()
        .map(|block| (block, false))
        .collect();
    candidates.extend(
        matching_blocks(a.accessions(), b_rev.accessions())
            .into_iter()
            .map(|block| (block, true)),
    );

    if candidates.is_empty() {
        return Err(LcsError::NoCommonDomains);
    }

    let qualified: Vec<bool> = candidates
        .iter()
        .map(|&(block, reverse)| block_hits_core(pair, block, reverse))
        .collect();
    let any_qualified = qualified.iter().any(|&hit| hit);

    let pool: Vec<usize> = (0..candidates.len())
        .filter(|&i| !any_qualified || qualified[i])
        .collect();
    let max_len = pool.iter().map(|&i| candidates[i].0.len).max().unwrap_or(0);
    let finalists: Vec<usize> = pool.into_iter().filter(|&i| candidates[i].0.len == max_len).collect();

    let chosen = if finalists.len() == 1 {
        finalists[0]
    } else {
        most_central(pair, &candidates, &finalists)
    };

    let (block, reverse) = candidates[chosen];
    Ok(finalize(pair, block, reverse))
}

/// Does the block's window, on either side, satisfy the pair's core
/// predicate?
fn block_hits_core(pair: &RecordPair, block: MatchBlock, reverse: bool) -> bool {
    let a = &pair.a_domains;
    let b = if reverse { &pair.b_domains_rev } else { &pair.b_domains };

    let (a_cds_start, a_cds_stop) = a.cds_window(block.a_start, block.a_start + block.len);
    let (b_cds_start, b_cds_stop) = b.cds_window(block.b_start, block.b_start + block.len);

    if pair.is_proto_cluster_pair() {
        window_hits_protocore(a, a_cds_start, a_cds_stop, pair.a)
            || window_hits_protocore(b, b_cds_start, b_cds_stop, pair.b)
    } else {
        a.window_has_biosynthetic(a_cds_start, a_cds_stop)
            || b.window_has_biosynthetic(b_cds_start, b_cds_stop)
    }
}

/// Index of the finalist whose midpoint lies closest to the middle of the
/// shorter record (A on equal lengths). Strict comparison keeps the first
/// finalist on ties, preserving insertion order.
fn most_central(pair: &RecordPair, candidates: &[(MatchBlock, bool)], finalists: &[usize]) -> usize {
    let a = &pair.a_domains;
    let use_a = a.cds_len() <= pair.b_domains.cds_len();
    let midpoint = if use_a {
        a.cds_len() as f64 / 2.0
    } else {
        pair.b_domains.cds_len() as f64 / 2.0
    };

    let mut best = finalists[0];
    let mut best_distance = f64::INFINITY;
    for &i in finalists {
        let (block, reverse) = candidates[i];
        let side: &DomainSeq = if use_a {
            a
        } else if reverse {
            &pair.b_domains_rev
        } else {
            &pair.b_domains
        };
        let (domain_start, domain_stop) = if use_a {
            (block.a_start, block.a_start + block.len)
        } else {
            (block.b_start, block.b_start + block.len)
        };
        let (cds_start, cds_stop) = side.cds_window(domain_start, domain_stop);
        let center = (cds_start + cds_stop) as f64 / 2.0;
        let distance = (midpoint - center).abs();
        if distance < best_distance {
            best_distance = distance;
            best = i;
        }
    }
    best
}

/// Project the chosen block onto the CDS axis of both sides.
fn finalize(pair: &RecordPair, block: MatchBlock, reverse: bool) -> LcsSeed {
    let a = &pair.a_domains;
    let b = if reverse { &pair.b_domains_rev } else { &pair.b_domains };

    let (a_cds_start, mut a_cds_stop) = a.cds_window(block.a_start, block.a_start + block.len);
    let (b_cds_start, mut b_cds_stop) = b.cds_window(block.b_start, block.b_start + block.len);
    if a_cds_stop == a_cds_start {
        a_cds_stop += 1;
    }
    if b_cds_stop == b_cds_start {
        b_cds_stop += 1;
    }

    LcsSeed {
        domain_a_start: block.a_start,
        domain_a_stop : block.a_start + block.len,
        domain_b_start: block.b_start,
        domain_b_stop : block.b_start + block.len,
        a_cds_start,
        a_cds_stop,
        b_cds_start,
        b_cds_stop,
        reverse,
    }
}

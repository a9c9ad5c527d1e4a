use ahash::AHashSet;

/// What a bin knows about one record while enumerating pairs.
#[derive(Debug, Clone)]
pub(crate) struct PairItem {
    pub idx     : usize,
    pub db_id   : i64,
    pub gbk_idx : usize,
    pub sort_key: String,
}

/// One enumerated pair: dataset indices and persistent ids of both sides,
/// in scoring orientation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PairIds {
    pub idx_a: usize,
    pub id_a : i64,
    pub idx_b: usize,
    pub id_b : i64,
}

/// Lazy, finite, non-restartable pair enumeration. Same-GBK pairs are
/// suppressed at this level (except for stored-edge replay, whose input
/// already went through it); legacy sorting reorders each pair by GBK file
/// stem.
#[derive(Debug)]
pub struct PairStream {
    kind          : StreamKind,
    legacy_sorting: bool,
}

#[derive(Debug)]
enum StreamKind {
    /// Upper-triangle walk over one item list.
    AllVsAll { items: Vec<PairItem>, i: usize, j: usize },
    /// Each query against every reference and every later query.
    QueryToRef { queries: Vec<PairItem>, refs: Vec<PairItem>, qi: usize, pj: usize },
    /// Cartesian product of two disjoint item lists.
    Product { left: Vec<PairItem>, right: Vec<PairItem>, li: usize, rj: usize },
    /// Stored-edge replay, in edge order.
    Replay { pairs: std::vec::IntoIter<(PairItem, PairItem)> },
}

impl PairStream {
    pub(crate) fn all_vs_all(items: Vec<PairItem>, legacy_sorting: bool) -> Self {
        Self { kind: StreamKind::AllVsAll { items, i: 0, j: 1 }, legacy_sorting }
    }

    pub(crate) fn query_to_ref(queries: Vec<PairItem>, refs: Vec<PairItem>, legacy_sorting: bool) -> Self {
        Self { kind: StreamKind::QueryToRef { queries, refs, qi: 0, pj: 0 }, legacy_sorting }
    }

    pub(crate) fn product(left: Vec<PairItem>, right: Vec<PairItem>, legacy_sorting: bool) -> Self {
        Self { kind: StreamKind::Product { left, right, li: 0, rj: 0 }, legacy_sorting }
    }

    pub(crate) fn replay(pairs: Vec<(PairItem, PairItem)>, legacy_sorting: bool) -> Self {
        Self { kind: StreamKind::Replay { pairs: pairs.into_iter() }, legacy_sorting }
    }

    fn next_candidate(&mut self) -> Option<(PairItem, PairItem)> {
        match &mut self.kind {
            StreamKind::AllVsAll { items, i, j } => loop {
                if *i + 1 >= items.len() {
                    return None;
                }
                if *j >= items.len() {
                    *i += 1;
                    *j = *i + 1;
                    continue;
                }
                let pair = (items[*i].clone(), items[*j].clone());
                *j += 1;
                return Some(pair);
            },
            StreamKind::QueryToRef { queries, refs, qi, pj } => loop {
                if *qi >= queries.len() {
                    return None;
                }
                let partner_count = refs.len() + (queries.len() - *qi - 1);
                if *pj >= partner_count {
                    *qi += 1;
                    *pj = 0;
                    continue;
                }
                let partner = if *pj < refs.len() {
                    refs[*pj].clone()
                } else {
                    queries[*qi + 1 + (*pj - refs.len())].clone()
                };
                let pair = (queries[*qi].clone(), partner);
                *pj += 1;
                return Some(pair);
            },
            StreamKind::Product { left, right, li, rj } => loop {
                if *li >= left.len() {
                    return None;
                }
                if *rj >= right.len() {
                    *li += 1;
                    *rj = 0;
                    continue;
                }
                let pair = (left[*li].clone(), right[*rj].clone());
                *rj += 1;
                return Some(pair);
            },
            StreamKind::Replay { pairs } => pairs.next(),
        }
    }

    fn suppress_same_gbk(&self) -> bool {
        !matches!(self.kind, StreamKind::Replay { .. })
    }
}

impl Iterator for PairStream {
    type Item = PairIds;

    fn next(&mut self) -> Option<PairIds> {
        loop {
            let (mut side_a, mut side_b) = self.next_candidate()?;
            if self.suppress_same_gbk() && side_a.gbk_idx == side_b.gbk_idx {
                continue;
            }
            if self.legacy_sorting && side_b.sort_key < side_a.sort_key {
                std::mem::swap(&mut side_a, &mut side_b);
            }
            return Some(PairIds {
                idx_a: side_a.idx,
                id_a : side_a.db_id,
                idx_b: side_b.idx,
                id_b : side_b.db_id,
            });
        }
    }
}

/// Filters a pair stream down to pairs absent from the store, in either
/// orientation.
#[derive(Debug)]
pub struct MissingPairs {
    inner   : PairStream,
    existing: AHashSet<(i64, i64)>,
}

impl MissingPairs {
    pub(crate) fn new(inner: PairStream, existing: AHashSet<(i64, i64)>) -> Self {
        Self { inner, existing }
    }
}

impl Iterator for MissingPairs {
    type Item = PairIds;

    fn next(&mut self) -> Option<PairIds> {
        loop {
            let pair = self.inner.next()?;
            if self.existing.contains(&(pair.id_a, pair.id_b))
                || self.existing.contains(&(pair.id_b, pair.id_a))
            {
                continue;
            }
            return Some(pair);
        }
    }
}

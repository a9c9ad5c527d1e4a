use bgc::DomainSeq;

use crate::pair::RecordPair;

/// The window of a pair currently under comparison, on both the domain axis
/// and the domain-bearing CDS axis.
///
/// `lcs_*` fields freeze the seeded block; the unprefixed fields track the
/// working (possibly extended) window. Start is inclusive, stop exclusive.
/// When `reverse` is set, every B-side coordinate is expressed in B's
/// reversed coordinate system.
/// # Fields
/// - `lcs_domain_{a,b}_{start,stop}`: seeded block, domain axis.
/// - `lcs_{a,b}_{start,stop}`       : seeded block, CDS axis.
/// - `domain_{a,b}_{start,stop}`    : working window, domain axis.
/// - `{a,b}_{start,stop}`           : working window, CDS axis.
/// - `reverse`                      : whether B is traversed back-to-front.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComparableRegion {
    pub lcs_domain_a_start: usize,
    pub lcs_domain_a_stop : usize,
    pub lcs_domain_b_start: usize,
    pub lcs_domain_b_stop : usize,
    pub lcs_a_start       : usize,
    pub lcs_a_stop        : usize,
    pub lcs_b_start       : usize,
    pub lcs_b_stop        : usize,
    pub domain_a_start    : usize,
    pub domain_a_stop     : usize,
    pub domain_b_start    : usize,
    pub domain_b_stop     : usize,
    pub a_start           : usize,
    pub a_stop            : usize,
    pub b_start           : usize,
    pub b_stop            : usize,
    pub reverse           : bool,
}

impl ComparableRegion {
    /// A window covering the full range of both records, forward.
    #[must_use]
    pub fn new_full(a: &DomainSeq, b: &DomainSeq) -> Self {
        Self {
            lcs_domain_a_start: 0,
            lcs_domain_a_stop : a.len(),
            lcs_domain_b_start: 0,
            lcs_domain_b_stop : b.len(),
            lcs_a_start       : 0,
            lcs_a_stop        : a.cds_len(),
            lcs_b_start       : 0,
            lcs_b_stop        : b.cds_len(),
            domain_a_start    : 0,
            domain_a_stop     : a.len(),
            domain_b_start    : 0,
            domain_b_stop     : b.len(),
            a_start           : 0,
            a_stop            : a.cds_len(),
            b_start           : 0,
            b_stop            : b.cds_len(),
            reverse           : false,
        }
    }

    /// Restore the full forward ranges of both records.
    pub fn reset(&mut self, a: &DomainSeq, b: &DomainSeq) {
        *self = Self::new_full(a, b);
    }

    /// True iff the working CDS window is at least `min_len` long on both
    /// sides and, when required, contains a core gene: a biosynthetic CDS
    /// on either side, or for protocluster pairs an intersection with the
    /// protocore index set on either side.
    #[must_use]
    pub fn check(&self, pair: &RecordPair, min_len: usize, require_biosynthetic: bool) -> bool {
        if self.a_stop.saturating_sub(self.a_start) < min_len
            || self.b_stop.saturating_sub(self.b_start) < min_len
        {
            return false;
        }
        if !require_biosynthetic {
            return true;
        }

        let b_oriented = pair.b_oriented();
        if pair.is_proto_cluster_pair() {
            window_hits_protocore(&pair.a_domains, self.a_start, self.a_stop, pair.a)
                || window_hits_protocore(b_oriented, self.b_start, self.b_stop, pair.b)
        } else {
            pair.a_domains.window_has_biosynthetic(self.a_start, self.a_stop)
                || b_oriented.window_has_biosynthetic(self.b_start, self.b_stop)
        }
    }

    /// Translate the CDS-axis coordinates from the domain-bearing axis to
    /// the record's full CDS list, so that boundary CDS without domains end
    /// up inside the final window. Domain-axis coordinates are unchanged.
    ///
    /// Must be applied once, immediately before emission.
    pub fn inflate(&mut self, a: &DomainSeq, b_oriented: &DomainSeq) {
        self.a_start     = inflate_start(a, self.a_start);
        self.a_stop      = inflate_stop(a, self.a_stop);
        self.lcs_a_start = inflate_start(a, self.lcs_a_start);
        self.lcs_a_stop  = inflate_stop(a, self.lcs_a_stop);

        self.b_start     = inflate_start(b_oriented, self.b_start);
        self.b_stop      = inflate_stop(b_oriented, self.b_stop);
        self.lcs_b_start = inflate_start(b_oriented, self.lcs_b_start);
        self.lcs_b_stop  = inflate_stop(b_oriented, self.lcs_b_stop);
    }
}

pub(crate) fn window_hits_protocore(
    seq: &DomainSeq,
    cds_start: usize,
    cds_stop: usize,
    view: bgc::RecordView,
) -> bool {
    let Some(core_idx) = view.record.proto_core_cds_idx() else {
        return false;
    };
    (cds_start..cds_stop.min(seq.cds_len()))
        .any(|i| core_idx.contains(&seq.forward_full_cds_index(i)))
}

fn inflate_start(seq: &DomainSeq, cds_start: usize) -> usize {
    if cds_start == 0 {
        0
    } else {
        seq.full_cds_index(cds_start.min(seq.cds_len() - 1))
    }
}

fn inflate_stop(seq: &DomainSeq, cds_stop: usize) -> usize {
    if cds_stop >= seq.cds_len() {
        seq.full_cds_len()
    } else if cds_stop == 0 {
        0
    } else {
        seq.full_cds_index(cds_stop - 1) + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{pair_of, protocluster_pair, record_with, BIO, OTHER};

    #[test]
    fn full_window_covers_everything() {
        let arena = record_with(&[(OTHER, &["PF1", "PF2"]), (OTHER, &[]), (BIO, &["PF3"])]);
        let view = arena.dataset.view(0);
        let domains = view.domains();
        let region = ComparableRegion::new_full(&domains, &domains);

        assert_eq!(region.domain_a_stop, 3);
        assert_eq!(region.a_stop, 2); // only domain-bearing CDS
        assert!(!region.reverse);
    }

    #[test]
    fn check_min_len_and_biosynthetic() {
        let arena = pair_of(
            &[(OTHER, &["PF1"]), (BIO, &["PF2"]), (OTHER, &["PF3"])],
            &[(OTHER, &["PF1"]), (OTHER, &["PF2"]), (OTHER, &["PF3"])],
        );
        let mut pair = arena.pair();

        assert!(pair.check(3, false));
        assert!(!pair.check(4, false));
        // the biosynthetic CDS sits on side A only; either side qualifies.
        assert!(pair.check(0, true));

        // shrink A's window past its biosynthetic CDS: B has none either.
        pair.comparable_region.a_start = 2;
        assert!(!pair.check(0, true));
    }

    #[test]
    fn check_protocore_for_protocluster_pairs() {
        // protocore on CDS index 1 of side A.
        let arena = protocluster_pair(
            &[(OTHER, &["PF1"]), (BIO, &["PF2"]), (OTHER, &["PF3"])],
            &[1],
            &[(OTHER, &["PF1"]), (OTHER, &["PF2"]), (OTHER, &["PF3"])],
            &[],
        );
        let mut pair = arena.pair();
        assert!(pair.check(0, true));

        // exclude the protocore from the A window; no core remains.
        pair.comparable_region.a_start = 2;
        assert!(!pair.check(0, true));
    }

    #[test]
    fn inflate_pulls_in_boundary_cds() {
        // layout: domainless, domains, domains, domainless
        let arena = record_with(&[
            (OTHER, &[]),
            (OTHER, &["PF1"]),
            (OTHER, &["PF2"]),
            (OTHER, &[]),
        ]);
        let view = arena.dataset.view(0);
        let domains = view.domains();
        let mut region = ComparableRegion::new_full(&domains, &domains);

        region.inflate(&domains, &domains);
        assert_eq!((region.a_start, region.a_stop), (0, 4));
        assert_eq!((region.lcs_a_start, region.lcs_a_stop), (0, 4));
    }

    #[test]
    fn inflate_maps_interior_bounds() {
        // layout: domains, domainless, domains, domains
        let arena = record_with(&[
            (OTHER, &["PF1"]),
            (OTHER, &[]),
            (OTHER, &["PF2"]),
            (OTHER, &["PF3"]),
        ]);
        let view = arena.dataset.view(0);
        let domains = view.domains();
        let mut region = ComparableRegion::new_full(&domains, &domains);

        // window over domain-bearing CDS 1..3 (the last two genes)
        region.a_start = 1;
        region.a_stop = 3;
        region.lcs_a_start = 1;
        region.lcs_a_stop = 2;
        region.inflate(&domains, &domains);

        assert_eq!((region.a_start, region.a_stop), (2, 4));
        assert_eq!((region.lcs_a_start, region.lcs_a_stop), (2, 3));
        // invariant: window encloses the seeded block after inflation.
        assert!(region.a_start <= region.lcs_a_start);
        assert!(region.lcs_a_stop <= region.a_stop);
    }
}

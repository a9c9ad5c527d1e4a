use bgc::{DomainSeq, RecordView};

use crate::region::ComparableRegion;

/// An unordered pair of records undergoing comparison, together with its
/// working state: the flattened domain sequences of both sides (B in both
/// orientations) and the comparable region window.
///
/// A pair is ephemeral to a worker task; only the scored tuple survives it.
#[derive(Debug)]
pub struct RecordPair<'a> {
    pub a                : RecordView<'a>,
    pub b                : RecordView<'a>,
    pub a_domains        : DomainSeq<'a>,
    pub b_domains        : DomainSeq<'a>,
    pub b_domains_rev    : DomainSeq<'a>,
    pub comparable_region: ComparableRegion,
}

impl<'a> RecordPair<'a> {
    #[must_use]
    pub fn new(a: RecordView<'a>, b: RecordView<'a>) -> Self {
        let a_domains = a.domains();
        let b_domains = b.domains();
        let b_domains_rev = b_domains.reversed();
        let comparable_region = ComparableRegion::new_full(&a_domains, &b_domains);
        Self { a, b, a_domains, b_domains, b_domains_rev, comparable_region }
    }

    /// B's domain sequence in the orientation selected by the current
    /// comparable region.
    #[must_use]
    pub fn b_oriented(&self) -> &DomainSeq<'a> {
        if self.comparable_region.reverse {
            &self.b_domains_rev
        } else {
            &self.b_domains
        }
    }

    /// Protocluster pairs swap the biosynthetic-CDS predicate for the
    /// protocore-intersection predicate in region checks and LCS seeding.
    #[must_use]
    pub fn is_proto_cluster_pair(&self) -> bool {
        self.a.record.is_proto_cluster() && self.b.record.is_proto_cluster()
    }

    /// Apply `check` to the current window (see [`ComparableRegion::check`]).
    #[must_use]
    pub fn check(&self, min_len: usize, require_biosynthetic: bool) -> bool {
        self.comparable_region.check(self, min_len, require_biosynthetic)
    }

    /// Restore the window to the full ranges of both records.
    pub fn reset(&mut self) {
        self.comparable_region.reset(&self.a_domains, &self.b_domains);
    }

    /// Both sides' accessions within the working window, B oriented per the
    /// window's reverse flag.
    #[must_use]
    pub fn window_accessions(&self) -> (&[&'a str], &[&'a str]) {
        let region = &self.comparable_region;
        let b = self.b_oriented();
        (
            &self.a_domains.accessions()[region.domain_a_start..region.domain_a_stop],
            &b.accessions()[region.domain_b_start..region.domain_b_stop],
        )
    }

    /// Both sides' HSPs within the working window, B oriented per the
    /// window's reverse flag.
    #[must_use]
    pub fn window_hsps(&self) -> (&[&'a bgc::Hsp], &[&'a bgc::Hsp]) {
        let region = &self.comparable_region;
        let b = self.b_oriented();
        (
            &self.a_domains.hsps()[region.domain_a_start..region.domain_a_stop],
            &b.hsps()[region.domain_b_start..region.domain_b_stop],
        )
    }
}

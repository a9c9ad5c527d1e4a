use crate::cds::Cds;
use crate::hsp::Hsp;

/// Flattened domain sequence of a record, with the projection maps between
/// domain index space and CDS index space.
///
/// Domain index space addresses the concatenation of every HSP of every CDS,
/// in traversal order. CDS index space addresses only CDS carrying at least
/// one domain; `full_cds_idx` maps it back onto the record's complete CDS
/// list (which is what `inflate` needs).
///
/// A reversed sequence expresses every index in the reversed coordinate
/// system, including `full_cds_idx`, so consumers never need to know which
/// orientation they hold.
/// # Fields
/// - `accessions`   : one accession per domain.
/// - `hsps`         : the backing HSPs, parallel to `accessions`.
/// - `domain_to_cds`: domain index → CDS index (domain-bearing axis).
/// - `cds`          : the domain-bearing CDS, in traversal order.
/// - `full_cds_idx` : domain-bearing CDS index → forward index in the full
///                    CDS list (traversal order, values always forward).
/// - `full_cds_len` : total CDS count of the record.
/// - `is_reversed`  : orientation of this sequence.
#[derive(Debug)]
pub struct DomainSeq<'a> {
    accessions   : Vec<&'a str>,
    hsps         : Vec<&'a Hsp>,
    domain_to_cds: Vec<usize>,
    cds          : Vec<&'a Cds>,
    full_cds_idx : Vec<usize>,
    full_cds_len : usize,
    is_reversed  : bool,
}

impl<'a> DomainSeq<'a> {
    /// Flatten `cds_list` in genomic order.
    #[must_use]
    pub fn forward(cds_list: &'a [Cds]) -> Self {
        let mut seq = Self {
            accessions   : Vec::new(),
            hsps         : Vec::new(),
            domain_to_cds: Vec::new(),
            cds          : Vec::new(),
            full_cds_idx : Vec::new(),
            full_cds_len : cds_list.len(),
            is_reversed  : false,
        };
        for (full_idx, cds) in cds_list.iter().enumerate() {
            if !cds.has_domains() {
                continue;
            }
            let cds_idx = seq.cds.len();
            seq.cds.push(cds);
            seq.full_cds_idx.push(full_idx);
            for hsp in &cds.hsps {
                seq.accessions.push(hsp.accession.as_str());
                seq.hsps.push(hsp);
                seq.domain_to_cds.push(cds_idx);
            }
        }
        seq
    }

    /// The same sequence traversed back-to-front, with every index map
    /// re-expressed in the reversed coordinate system.
    #[must_use]
    pub fn reversed(&self) -> Self {
        let n_domains = self.accessions.len();
        let n_cds = self.cds.len();

        let accessions: Vec<&str>  = self.accessions.iter().rev().copied().collect();
        let hsps: Vec<&Hsp>        = self.hsps.iter().rev().copied().collect();
        let cds: Vec<&Cds>         = self.cds.iter().rev().copied().collect();
        let domain_to_cds = (0..n_domains)
            .map(|i| n_cds - 1 - self.domain_to_cds[n_domains - 1 - i])
            .collect();
        let full_cds_idx = self.full_cds_idx.iter().rev().copied().collect();

        Self {
            accessions,
            hsps,
            domain_to_cds,
            cds,
            full_cds_idx,
            full_cds_len: self.full_cds_len,
            is_reversed : !self.is_reversed,
        }
    }

    /// Number of domains.
    #[must_use]
    pub fn len(&self) -> usize {
        self.accessions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.accessions.is_empty()
    }

    /// Number of domain-bearing CDS.
    #[must_use]
    pub fn cds_len(&self) -> usize {
        self.cds.len()
    }

    /// Total CDS count of the record, including domainless CDS.
    #[must_use]
    pub fn full_cds_len(&self) -> usize {
        self.full_cds_len
    }

    #[must_use]
    pub fn accessions(&self) -> &[&'a str] {
        &self.accessions
    }

    #[must_use]
    pub fn hsps(&self) -> &[&'a Hsp] {
        &self.hsps
    }

    /// CDS index (domain-bearing axis) of the given domain.
    #[must_use]
    pub fn cds_of_domain(&self, domain_idx: usize) -> usize {
        self.domain_to_cds[domain_idx]
    }

    /// The domain-bearing CDS at `cds_idx`.
    #[must_use]
    pub fn cds_at(&self, cds_idx: usize) -> &'a Cds {
        self.cds[cds_idx]
    }

    /// Index of the domain-bearing CDS `cds_idx` within the record's full
    /// CDS list, expressed in this sequence's orientation.
    #[must_use]
    pub fn full_cds_index(&self, cds_idx: usize) -> usize {
        if self.is_reversed {
            self.full_cds_len - 1 - self.full_cds_idx[cds_idx]
        } else {
            self.full_cds_idx[cds_idx]
        }
    }

    /// Index of the domain-bearing CDS `cds_idx` within the record's full
    /// CDS list, always in forward (genomic) orientation. Protocore index
    /// sets are keyed on this axis.
    #[must_use]
    pub fn forward_full_cds_index(&self, cds_idx: usize) -> usize {
        self.full_cds_idx[cds_idx]
    }

    /// Project a half-open domain window onto the domain-bearing CDS axis.
    /// An empty domain window projects to an empty CDS window at its start.
    #[must_use]
    pub fn cds_window(&self, domain_start: usize, domain_stop: usize) -> (usize, usize) {
        if domain_stop <= domain_start {
            let start = self.domain_to_cds.get(domain_start).copied().unwrap_or(self.cds.len());
            return (start, start);
        }
        let start = self.domain_to_cds[domain_start];
        let stop  = self.domain_to_cds[domain_stop - 1] + 1;
        (start, stop)
    }

    /// True if any CDS in the half-open window `[cds_start, cds_stop)` of
    /// the domain-bearing axis is annotated as a core biosynthetic gene.
    #[must_use]
    pub fn window_has_biosynthetic(&self, cds_start: usize, cds_stop: usize) -> bool {
        self.cds[cds_start..cds_stop.min(self.cds.len())]
            .iter()
            .any(|cds| cds.is_biosynthetic())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cds::{GeneKind, Strand};

    fn mock_cds(kind: GeneKind, accessions: &[&str]) -> Cds {
        let mut cds = Cds::new(0, 100, Strand::Forward, kind);
        for acc in accessions {
            cds.hsps.push(Hsp::new(*acc, 100.0, 0, 50));
        }
        cds
    }

    fn mock_cds_list() -> Vec<Cds> {
        vec![
            mock_cds(GeneKind::Other, &["PF00001", "PF00002"]),
            mock_cds(GeneKind::Other, &[]),
            mock_cds(GeneKind::Biosynthetic, &["PF00003"]),
            mock_cds(GeneKind::Other, &["PF00004"]),
        ]
    }

    #[test]
    fn forward_flattening() {
        let cds_list = mock_cds_list();
        let seq = DomainSeq::forward(&cds_list);

        assert_eq!(seq.accessions(), &["PF00001", "PF00002", "PF00003", "PF00004"]);
        assert_eq!(seq.cds_len(), 3);
        assert_eq!(seq.full_cds_len(), 4);
        // Domainless CDS at index 1 is skipped by the domain-bearing axis.
        assert_eq!(seq.full_cds_index(0), 0);
        assert_eq!(seq.full_cds_index(1), 2);
        assert_eq!(seq.full_cds_index(2), 3);
    }

    #[test]
    fn domain_to_cds_is_monotone() {
        let cds_list = mock_cds_list();
        let seq = DomainSeq::forward(&cds_list);
        let map: Vec<usize> = (0..seq.len()).map(|i| seq.cds_of_domain(i)).collect();
        assert!(map.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(map, vec![0, 0, 1, 2]);
    }

    #[test]
    fn reversed_maps_are_consistent() {
        let cds_list = mock_cds_list();
        let fwd = DomainSeq::forward(&cds_list);
        let rev = fwd.reversed();

        assert_eq!(rev.accessions(), &["PF00004", "PF00003", "PF00002", "PF00001"]);
        // reversed domain i corresponds to forward domain n-1-i, and its CDS
        // index mirrors likewise.
        for i in 0..fwd.len() {
            let fwd_cds = fwd.cds_of_domain(fwd.len() - 1 - i);
            assert_eq!(rev.cds_of_domain(i), fwd.cds_len() - 1 - fwd_cds);
        }
        // full-CDS indices are flipped into the reversed full list.
        assert_eq!(rev.full_cds_index(0), 0);  // forward CDS 3 is first when reversed
        assert_eq!(rev.full_cds_index(1), 1);  // forward CDS 2
        assert_eq!(rev.full_cds_index(2), 3);  // forward CDS 0
    }

    #[test]
    fn cds_window_projection() {
        let cds_list = mock_cds_list();
        let seq = DomainSeq::forward(&cds_list);

        assert_eq!(seq.cds_window(0, 2), (0, 1)); // both domains on the first CDS
        assert_eq!(seq.cds_window(0, 4), (0, 3));
        assert_eq!(seq.cds_window(2, 3), (1, 2));
        assert_eq!(seq.cds_window(2, 2), (1, 1)); // empty window
    }

    #[test]
    fn biosynthetic_window_check() {
        let cds_list = mock_cds_list();
        let seq = DomainSeq::forward(&cds_list);
        assert!(!seq.window_has_biosynthetic(0, 1));
        assert!(seq.window_has_biosynthetic(0, 2));
        assert!(seq.window_has_biosynthetic(1, 3));
        assert!(!seq.window_has_biosynthetic(2, 3));
    }
}

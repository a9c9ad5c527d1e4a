use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use crate::hsp::Hsp;
use crate::ModelError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strand {
    Forward,
    Reverse,
}

impl TryFrom<i64> for Strand {
    type Error = ModelError;
    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            1  => Ok(Self::Forward),
            -1 => Ok(Self::Reverse),
            other => Err(ModelError::InvalidStrand(other)),
        }
    }
}

impl From<Strand> for i64 {
    fn from(strand: Strand) -> i64 {
        match strand {
            Strand::Forward => 1,
            Strand::Reverse => -1,
        }
    }
}

/// Functional annotation of a gene, as assigned by the upstream annotation
/// pipeline. Only `Biosynthetic` ("core" genes) participates in comparable
/// region checks; the other kinds are carried for completeness.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeneKind {
    Biosynthetic,
    BiosyntheticAdditional,
    Transport,
    Regulatory,
    Other,
}

impl FromStr for GeneKind {
    type Err = std::convert::Infallible;
    /// Unrecognized labels map to `Other`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "biosynthetic"            => Self::Biosynthetic,
            "biosynthetic-additional" => Self::BiosyntheticAdditional,
            "transport"               => Self::Transport,
            "regulatory"              => Self::Regulatory,
            _                         => Self::Other,
        })
    }
}

impl Display for GeneKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), fmt::Error> {
        let label = match self {
            Self::Biosynthetic           => "biosynthetic",
            Self::BiosyntheticAdditional => "biosynthetic-additional",
            Self::Transport              => "transport",
            Self::Regulatory             => "regulatory",
            Self::Other                  => "other",
        };
        write!(f, "{label}")
    }
}

/// A coding sequence and its protein-domain annotations.
/// # Fields
/// - `nt_start`/`nt_stop`: nucleotide coordinates within the parent GBK.
/// - `strand`            : coding strand.
/// - `gene_kind`         : functional annotation label.
/// - `hsps`              : ordered domain hits found within this CDS.
#[derive(Debug)]
pub struct Cds {
    pub nt_start : usize,
    pub nt_stop  : usize,
    pub strand   : Strand,
    pub gene_kind: GeneKind,
    pub hsps     : Vec<Hsp>,
}

impl Cds {
    #[must_use]
    pub fn new(nt_start: usize, nt_stop: usize, strand: Strand, gene_kind: GeneKind) -> Self {
        Self { nt_start, nt_stop, strand, gene_kind, hsps: Vec::new() }
    }

    #[must_use]
    pub fn is_biosynthetic(&self) -> bool {
        self.gene_kind == GeneKind::Biosynthetic
    }

    #[must_use]
    pub fn has_domains(&self) -> bool {
        !self.hsps.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strand_conversion() {
        assert_eq!(Strand::try_from(1).unwrap(), Strand::Forward);
        assert_eq!(Strand::try_from(-1).unwrap(), Strand::Reverse);
        assert!(Strand::try_from(0).is_err());
        assert_eq!(i64::from(Strand::Reverse), -1);
    }

    #[test]
    fn gene_kind_fallback() {
        let kind: GeneKind = "resistance".parse().unwrap();
        assert_eq!(kind, GeneKind::Other);

        let kind: GeneKind = "biosynthetic".parse().unwrap();
        assert_eq!(kind, GeneKind::Biosynthetic);
        assert!(Cds::new(0, 10, Strand::Forward, kind).is_biosynthetic());
    }
}

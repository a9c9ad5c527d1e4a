/// A single profile-HMM hit (high-scoring pair) of a domain model against a
/// CDS translation.
/// # Fields
/// - `accession`: domain model accession (e.g. "PF02801").
/// - `bit_score`: hit bit-score reported by the search.
/// - `env_start`/`env_stop`: envelope coordinates on the protein.
/// - `alignment`: the aligned string for this hit, when the run performed
///   alignment. Required for domain sequence similarity scoring.
#[derive(Debug)]
pub struct Hsp {
    pub accession: String,
    pub bit_score: f64,
    pub env_start: usize,
    pub env_stop : usize,
    pub alignment: Option<HspAlignment>,
}

impl Hsp {
    #[must_use]
    pub fn new(accession: impl Into<String>, bit_score: f64, env_start: usize, env_stop: usize) -> Self {
        Self { accession: accession.into(), bit_score, env_start, env_stop, alignment: None }
    }

    #[must_use]
    pub fn with_alignment(mut self, align_string: impl Into<String>) -> Self {
        self.alignment = Some(HspAlignment::new(align_string));
        self
    }
}

/// Fixed-length aligned string of an HSP within its domain-model MSA.
#[derive(Debug)]
pub struct HspAlignment {
    pub align_string: String,
}

impl HspAlignment {
    #[must_use]
    pub fn new(align_string: impl Into<String>) -> Self {
        Self { align_string: align_string.into() }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.align_string.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.align_string.is_empty()
    }
}

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DistanceError {
    #[error("HSP alignment length mismatch ({len_a} vs {len_b}). Alignments of the same domain model must share one MSA length")]
    AlignmentLengthMismatch { len_a: usize, len_b: usize },
}

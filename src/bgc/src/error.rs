use thiserror::Error;

#[derive(Error, Debug)]
pub enum ModelError {
    #[error("Unknown source type '{0}'. Expected one of 'query', 'reference'")]
    UnknownSourceType(String),

    #[error("Invalid strand value '{0}'. Expected 1 or -1")]
    InvalidStrand(i64),

    #[error("Record references out-of-bounds GBK index '{0}'")]
    InvalidGbkIndex(usize),

    #[error("Record CDS range {start}..{stop} exceeds the {len} CDS of its parent GBK")]
    InvalidCdsRange { start: usize, stop: usize, len: usize },
}

use thiserror::Error;

#[derive(Error, Debug)]
pub enum BinningError {
    #[error("Record at dataset index {record_idx} added to bin '{label}' has no persistent id")]
    RecordMissingId { label: String, record_idx: usize },

    #[error("Classification mode {0} does not produce class bins")]
    UnsupportedClassifyMode(String),

    #[error(transparent)]
    Store(#[from] edge_store::StoreError),
}

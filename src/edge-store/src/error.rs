use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Failed to open the edge store at '{path}'")]
    Open { path: String, #[source] source: rusqlite::Error },

    #[error("Failed to apply the edge store schema")]
    Schema(#[source] rusqlite::Error),

    #[error(transparent)]
    Sql(#[from] rusqlite::Error),
}

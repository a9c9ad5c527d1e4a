use thiserror::Error;

use crate::binning::BinningError;
use crate::distances::DistanceError;
use crate::lcs::LcsError;

#[derive(Error, Debug)]
pub enum WorkflowError {
    #[error("A worker task terminated without reporting a result")]
    WorkerLost,

    #[error("Record in scored pair has no persistent id")]
    MissingRecordId,

    #[error("Failed to build the worker thread pool")]
    BuildThreadPool(#[source] rayon::ThreadPoolBuildError),

    #[error(transparent)]
    Lcs(#[from] LcsError),

    #[error(transparent)]
    Distance(#[from] DistanceError),

    #[error(transparent)]
    Binning(#[from] BinningError),

    #[error(transparent)]
    Store(#[from] edge_store::StoreError),
}

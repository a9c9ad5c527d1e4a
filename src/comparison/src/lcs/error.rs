use thiserror::Error;

#[derive(Error, Debug)]
pub enum LcsError {
    #[error(
        "No common domains found between records that passed the Jaccard prefilter. \
         This is a contract violation from the annotation stage."
    )]
    NoCommonDomains,
}

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ParserError {
    #[error("The provided output directory '{0}' does not exist or is not a directory")]
    InvalidOutputDir(String),
}

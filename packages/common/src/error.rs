use thiserror::Error;

/// Errors reading an article source from disk
#[derive(Error, Debug)]
pub enum CommonError {
    #[error("Unknown source format: {0}")]
    UnknownFormat(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SautiiError {
    #[error("issue not found")]
    NotFound,
    #[error("invalid request: {0}")]
    Invalid(String),
    #[error("store failure: {0}")]
    Store(String),
    #[error("internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, SautiiError>;

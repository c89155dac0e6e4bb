use std::time::Duration;

use thiserror::Error;

/// Failure of the backing key/value store.
///
/// Always distinguishable from "key absent": a store that answers with
/// nothing returns `Ok(None)`, never an error.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("store operation timed out after {0:?}")]
    Timeout(Duration),

    #[error("unexpected store response: {0}")]
    Protocol(String),
}

/// Errors from turning an uploaded archive into project files.
#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("archive too large: {size} bytes exceeds the {limit} byte limit")]
    TooLarge { size: u64, limit: u64 },

    #[error("archive does not contain any readable code files")]
    NoReadableFiles,

    #[error("error reading archive: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed archive: {0}")]
    Malformed(String),
}

/// Errors from the upstream analysis model.
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("analysis timed out after {0:?}")]
    Timeout(Duration),

    #[error("analysis transport error: {0}")]
    Transport(String),

    #[error("analysis service returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("analysis service did not return a result")]
    EmptyResponse,
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("storage failure: {0}")]
    StorageFailure(#[source] StoreError),

    #[error("context not found or expired: {0}")]
    ContextNotFound(String),

    #[error(transparent)]
    Extract(#[from] ExtractError),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("malformed analysis result: {0}")]
    MalformedAnalysisResult(String),

    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error("{0}")]
    Internal(String),
}

impl Error {
    /// HTTP-equivalent status code for surfacing this error to a client.
    pub fn status(&self) -> u16 {
        match self {
            Self::ContextNotFound(_) => 404,
            Self::Extract(_) | Self::InvalidInput(_) => 400,
            Self::StorageFailure(_) => 503,
            Self::Gateway(_) => 502,
            Self::MalformedAnalysisResult(_) | Self::Internal(_) => 500,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

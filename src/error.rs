// src/error.rs
use thiserror::Error;

/// Errors surfaced by the cluster's request paths.
///
/// A cache miss is not an error (it is an `Option::None` on the engine), and
/// an origin NOT_FOUND is a status relayed to the client. Nothing here is
/// fatal to the process: every variant degrades a single request only.
#[derive(Debug, Error)]
pub enum Error {
    #[error("no healthy proxy available")]
    NoHealthyProxy,

    #[error("transport failure: {0}")]
    Transport(#[from] std::io::Error),

    #[error("malformed response: {0}")]
    MalformedResponse(String),

    #[error("unsupported method: {0}")]
    WrongMethod(String),

    #[error("bad request: {0}")]
    BadRequest(String),
}

pub type Result<T> = std::result::Result<T, Error>;

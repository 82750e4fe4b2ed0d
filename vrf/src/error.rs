use crate::RequestId;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum VrfError {
    #[error("randomness request rejected: {0}")]
    RequestFailed(String),

    #[error("request {0} is not pending")]
    UnknownRequest(RequestId),

    #[error("oracle not available: {0}")]
    Unavailable(String),

    #[error("{0}")]
    Other(String),
}

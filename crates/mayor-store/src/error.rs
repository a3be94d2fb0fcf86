use mayor_core::{MayorError, PolicyId};
use mayor_policy::{LifecycleError, ParseError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("store unavailable")]
    StoreUnavailable,

    #[error("record not found: {0}")]
    RecordNotFound(PolicyId),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("conflict: {0}")]
    Conflict(String),

    /// Another `list()` on the same repository has not finished.
    #[error("a listing is already in progress")]
    ListInFlight,

    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),

    #[error("store error: {0}")]
    Store(String),
}

impl From<MayorError> for RepoError {
    fn from(e: MayorError) -> Self {
        match e {
            MayorError::StoreUnavailable => RepoError::StoreUnavailable,
            MayorError::Store(msg) => RepoError::Store(msg),
            other => RepoError::Store(other.to_string()),
        }
    }
}

impl From<RepoError> for MayorError {
    fn from(e: RepoError) -> Self {
        match e {
            RepoError::StoreUnavailable => MayorError::StoreUnavailable,
            other => MayorError::Repository(other.to_string()),
        }
    }
}

pub type RepoResult<T> = Result<T, RepoError>;

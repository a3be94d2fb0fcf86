use thiserror::Error;

/// Failure modes shared by every collaborator boundary.
///
/// Crate-specific errors (codec, lifecycle, repository) convert into this
/// type when they cross into code that only cares about the broad category.
#[derive(Debug, Error)]
pub enum MayorError {
    #[error("store error: {0}")]
    Store(String),

    #[error("store unavailable")]
    StoreUnavailable,

    #[error("cipher error: {0}")]
    Cipher(String),

    #[error("lifecycle error: {0}")]
    Lifecycle(String),

    #[error("repository error: {0}")]
    Repository(String),

    #[error("signer error: {0}")]
    Signer(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("internal error: {0}")]
    Internal(String),
}

pub type MayorResult<T> = Result<T, MayorError>;

/// Outcome of asking a `SignatureAuthority` to sign a challenge.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SignatureError {
    #[error("signing rejected")]
    Rejected,

    #[error("signer fault: {0}")]
    Fault(String),
}

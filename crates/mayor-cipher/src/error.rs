use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CipherError {
    /// Decrypt attempted without a proof, or with an expired one.
    #[error("unauthorized")]
    Unauthorized,

    /// The signer explicitly refused the reveal challenge.
    #[error("decryption denied")]
    DecryptionDenied,

    /// Any other reveal fault (signer unreachable, malformed signature).
    /// Retriable: the session stays challenged.
    #[error("decryption failed: {0}")]
    DecryptionFailed(String),

    #[error("scheme mismatch: expected {expected}, found {found}")]
    SchemeMismatch { expected: String, found: String },

    #[error("malformed ciphertext: {0}")]
    MalformedCiphertext(String),

    #[error("arithmetic overflow")]
    Overflow,

    #[error("invalid operation: {0}")]
    InvalidOperation(String),

    #[error("invalid session state: {0}")]
    InvalidState(String),

    #[error("key material error: {0}")]
    KeyMaterial(String),
}

impl CipherError {
    /// Whether retrying the same reveal step may succeed.
    pub fn is_retriable(&self) -> bool {
        matches!(self, CipherError::DecryptionFailed(_))
    }
}

impl From<CipherError> for mayor_core::MayorError {
    fn from(e: CipherError) -> Self {
        mayor_core::MayorError::Cipher(e.to_string())
    }
}

pub type CipherResult<T> = Result<T, CipherError>;

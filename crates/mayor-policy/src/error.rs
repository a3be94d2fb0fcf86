use mayor_cipher::CipherError;
use std::fmt;
use thiserror::Error;

use crate::lifecycle::Transition;
use crate::record::PolicyStatus;

/// Why a lifecycle transition was refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LifecycleError {
    /// The actor is not the record's owner. Checked before the state graph.
    #[error("unauthorized: {actor} is not the owner of this policy")]
    Unauthorized { actor: String },

    /// The state graph forbids this transition from the current status.
    #[error("invalid transition: {transition} from {from}")]
    InvalidTransition {
        from: PolicyStatus,
        transition: Transition,
    },

    #[error("codec error: {0}")]
    Codec(#[from] CipherError),
}

impl From<LifecycleError> for mayor_core::MayorError {
    fn from(e: LifecycleError) -> Self {
        mayor_core::MayorError::Lifecycle(e.to_string())
    }
}

pub type LifecycleResult<T> = Result<T, LifecycleError>;

/// A stored record (or index) that failed strict schema validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    pub key: Option<String>,
    pub message: String,
}

impl ParseError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            key: None,
            message: message.into(),
        }
    }

    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "parse error: {}", self.message)?;
        if let Some(ref key) = self.key {
            write!(f, " (key: {})", key)?;
        }
        Ok(())
    }
}

impl std::error::Error for ParseError {}

impl From<ParseError> for mayor_core::MayorError {
    fn from(e: ParseError) -> Self {
        mayor_core::MayorError::Serialization(e.to_string())
    }
}

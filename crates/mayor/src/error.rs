use thiserror::Error;

/// Error type for the mayor binary, aggregating errors from every crate.
#[derive(Debug, Error)]
pub enum RootError {
    #[error("repository error: {0}")]
    Repository(#[from] mayor_store::RepoError),

    #[error("cipher error: {0}")]
    Cipher(#[from] mayor_cipher::CipherError),

    #[error("{0}")]
    Core(#[from] mayor_core::MayorError),

    /// An operation needed the caller's identity and no wallet is loaded.
    #[error("no wallet connected")]
    NotConnected,

    /// `reveal` was called before any policy was opened.
    #[error("no policy is being viewed")]
    NothingInView,

    #[error("configuration error: {0}")]
    Config(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for RootError {
    fn from(e: serde_json::Error) -> Self {
        RootError::Serialization(e.to_string())
    }
}

impl From<toml::de::Error> for RootError {
    fn from(e: toml::de::Error) -> Self {
        RootError::Config(format!("TOML parse error: {}", e))
    }
}

pub type RootResult<T> = Result<T, RootError>;

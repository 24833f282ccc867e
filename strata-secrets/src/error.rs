use thiserror::Error;

#[non_exhaustive]
#[derive(Debug, Error)]
pub enum SecretsError {
    #[error("io error at {path}: {source}")]
    Io {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to decrypt vault; treating it as empty")]
    DecryptionFailed,

    #[error("failed to encrypt vault")]
    EncryptionFailed,

    #[error("vault contents were not valid JSON: {0}")]
    MalformedVault(String),

    #[error("{0}")]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

use thiserror::Error;

/// Raised when page content cannot be turned into PDF bytes.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("content is neither an existing path nor base64-encoded PDF data")]
    Unrecognized,

    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Failures reported by a document-parsing backend.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("invalid pdf: {0}")]
    Invalid(String),

    #[error("document is encrypted")]
    Encrypted,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read rule config {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse rule config {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },
}

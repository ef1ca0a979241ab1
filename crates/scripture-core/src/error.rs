use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid search type: {0} (expected exact, fuzzy, semantic, topic or all)")]
    InvalidSearchType(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Operation failed: {0}")]
    Operation(String),

    /// A store, scorer or embedding provider failed; propagated as-is.
    #[error(transparent)]
    Collaborator(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

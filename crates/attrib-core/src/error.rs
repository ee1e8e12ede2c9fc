//! Error types for attrib-core.

use std::path::PathBuf;

use crate::codec::SchemaError;
use crate::rewrite::ParseError;

/// Result type alias using [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in attrib-core operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A commit identifier did not resolve in the repository.
    #[error("commit not found: {0}")]
    CommitNotFound(String),

    /// A stored or supplied attribution record is invalid.
    #[error("invalid attribution record: {0}")]
    Schema(#[from] SchemaError),

    /// The rewrite feed contained a malformed line.
    #[error("invalid rewrite mapping at {0}")]
    Parse(#[from] ParseError),

    /// The notes ref kept moving under us.
    #[error("notes for {commit} were updated concurrently {attempts} times - giving up")]
    WriteConflict {
        /// Commit whose note could not be written.
        commit: String,
        /// Number of update attempts made.
        attempts: u32,
    },

    /// Configuration value rejected by validation.
    #[error("invalid config in {file}: {message}")]
    InvalidConfig { file: PathBuf, message: String },

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parsing error.
    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Git operation error.
    #[error("git error: {0}")]
    Git(attrib_git::Error),
}

impl From<attrib_git::Error> for Error {
    fn from(err: attrib_git::Error) -> Self {
        match err {
            attrib_git::Error::CommitNotFound(spec) => Self::CommitNotFound(spec),
            other => Self::Git(other),
        }
    }
}

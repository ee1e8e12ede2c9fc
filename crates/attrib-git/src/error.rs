//! Error types for attrib-git.

/// Result type alias using [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during git operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Not inside a git repository.
    #[error("not a git repository")]
    NotARepository,

    /// A revision did not resolve to a commit.
    #[error("commit not found: {0}")]
    CommitNotFound(String),

    /// The notes ref moved between reading its tip and updating it.
    #[error("notes ref {0} was updated concurrently")]
    RefConflict(String),

    /// A notes ref name outside `refs/notes/`.
    #[error("invalid notes ref: {0}")]
    InvalidNotesRef(String),

    /// Underlying git2 error.
    #[error("git error: {0}")]
    Git2(#[from] git2::Error),
}

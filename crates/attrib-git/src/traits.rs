//! Trait abstractions for the git collaborators.
//!
//! `attrib-core` only sees these traits, so the engine can be driven by an
//! in-memory repository in tests and by [`crate::Repository`] in production.

use git2::Oid;

use crate::Result;

/// Commit lookups the engine needs from the repository.
#[allow(clippy::missing_errors_doc)]
pub trait CommitLookup {
    /// Resolve a revision (full or abbreviated SHA, ref name, `HEAD~2`, ...)
    /// to a commit id.
    ///
    /// Fails with [`crate::Error::CommitNotFound`] when it does not name a commit.
    fn resolve_commit(&self, spec: &str) -> Result<Oid>;

    /// Hex SHA-256 of the commit's diff against its first parent.
    fn diff_fingerprint(&self, commit: Oid) -> Result<String>;
}

/// Change applied to one commit's note.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoteUpdate<'a> {
    /// Add or replace the note with these bytes.
    Put(&'a [u8]),
    /// Remove the note if present.
    Remove,
}

/// A notes ref seen as a versioned blob store.
///
/// Every read is pinned to a tip commit, and every update names the tip it
/// was computed from. An update whose expected tip is stale fails with
/// [`crate::Error::RefConflict`] and leaves the ref untouched.
#[allow(clippy::missing_errors_doc)]
pub trait NotesOps {
    /// Current tip of the notes ref, `None` if the ref does not exist yet.
    fn notes_tip(&self, notes_ref: &str) -> Result<Option<Oid>>;

    /// Read the note attached to `commit` as of `tip`.
    fn read_note_at(&self, tip: Option<Oid>, commit: Oid) -> Result<Option<Vec<u8>>>;

    /// Apply `update` on top of `expected_tip` and move the ref, atomically.
    fn update_note(
        &self,
        notes_ref: &str,
        expected_tip: Option<Oid>,
        commit: Oid,
        update: NoteUpdate<'_>,
    ) -> Result<()>;
}

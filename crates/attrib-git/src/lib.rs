//! # attrib-git
//!
//! Git collaborator for attrib, built on git2-rs.
//! Resolves commits, fingerprints their diffs, and treats a notes ref as a
//! content-addressed blob store updated with compare-and-swap.

mod error;
mod notes;
mod repository;
mod traits;

pub use error::{Error, Result};
pub use git2::Oid;
pub use repository::Repository;
pub use traits::{CommitLookup, NoteUpdate, NotesOps};

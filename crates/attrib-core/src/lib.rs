//! # attrib-core
//!
//! Attribution records for commits and the engine that carries them across
//! history rewrites. Records live in a git notes ref; amends, rebases and
//! squashes are replayed from the post-rewrite feed and merged onto the new
//! commits.

pub mod codec;
pub mod config;
pub mod error;
pub mod merge;
pub mod propagate;
pub mod record;
pub mod rewrite;
pub mod store;

#[cfg(test)]
mod test_mocks;

pub use codec::{SCHEMA_VERSION, SchemaError};
pub use config::Config;
pub use error::{Error, Result};
pub use merge::{MergeMode, MergeOptions, merge};
pub use propagate::{BatchOutcome, CopyOutcome, GroupOutcome, GroupResult, Propagator};
pub use record::{AttributionEntry, AttributionRecord, EntryKey};
pub use rewrite::{
    ParseError, ParseMode, ParseWarning, RewriteGroup, RewriteKind, RewriteMapping,
    parse_rewrite_feed, parse_rewrite_lines,
};
pub use store::{DEFAULT_NOTES_REF, NotesStore};

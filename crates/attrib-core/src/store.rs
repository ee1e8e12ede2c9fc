//! Attribution store on top of a git notes ref.
//!
//! Every write reads the notes tip, builds the change on top of it and moves
//! the ref only if nobody else moved it first. Lost races are retried a
//! bounded number of times.

use attrib_git::{NoteUpdate, NotesOps, Oid};
use tracing::{debug, warn};

use crate::codec;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::record::AttributionRecord;

/// Notes ref used when none is configured.
pub const DEFAULT_NOTES_REF: &str = "refs/notes/attrib";

/// Retries after a lost race, on top of the first attempt.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Reads and writes attribution records for commits.
pub struct NotesStore<'a, N: NotesOps> {
    notes: &'a N,
    notes_ref: String,
    max_retries: u32,
}

impl<'a, N: NotesOps> NotesStore<'a, N> {
    /// Create a store on the given notes ref.
    #[must_use]
    pub fn new(notes: &'a N, notes_ref: impl Into<String>) -> Self {
        Self {
            notes,
            notes_ref: notes_ref.into(),
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }

    /// Create a store using the configured ref and retry bound.
    #[must_use]
    pub fn from_config(notes: &'a N, config: &Config) -> Self {
        Self::new(notes, config.notes_ref()).with_max_retries(config.notes.max_retries)
    }

    /// Set how many times a lost race is retried.
    #[must_use]
    pub const fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// The notes ref this store writes to.
    #[must_use]
    pub fn notes_ref(&self) -> &str {
        &self.notes_ref
    }

    /// Read the record attached to a commit.
    ///
    /// A note that does not decode is logged and read as no attribution.
    ///
    /// # Errors
    /// Returns error if the notes ref cannot be read.
    pub fn read(&self, commit: Oid) -> Result<Option<AttributionRecord>> {
        let tip = self.notes.notes_tip(&self.notes_ref)?;
        self.read_at(tip, commit)
    }

    /// Check if a note is attached to a commit, decodable or not.
    ///
    /// # Errors
    /// Returns error if the notes ref cannot be read.
    pub fn exists(&self, commit: Oid) -> Result<bool> {
        Ok(self.read_blob(commit)?.is_some())
    }

    /// Attach `record` to a commit, replacing any previous note.
    ///
    /// # Errors
    /// Returns `Schema` for an unencodable record and `WriteConflict` when
    /// every attempt lost a race.
    pub fn write(&self, commit: Oid, record: &AttributionRecord) -> Result<()> {
        let bytes = codec::encode(record)?;
        self.update(commit, NoteUpdate::Put(&bytes))
    }

    /// Remove a commit's note. Removing a missing note succeeds.
    ///
    /// # Errors
    /// Returns `WriteConflict` when every attempt lost a race.
    pub fn delete(&self, commit: Oid) -> Result<()> {
        self.update(commit, NoteUpdate::Remove)
    }

    /// Replace a commit's record with one planned from its current record.
    ///
    /// `plan` receives the record stored at the notes tip being replaced and
    /// returns the record to store, or `None` to leave the note alone. After a
    /// lost race it runs again against the new tip, so changes made to the
    /// same note by another writer are seen by the plan.
    ///
    /// Returns the written record, or `None` if the note was left unchanged.
    ///
    /// # Errors
    /// Returns `Schema` for an unencodable record and `WriteConflict` when
    /// every attempt lost a race.
    pub fn modify<F>(&self, commit: Oid, mut plan: F) -> Result<Option<AttributionRecord>>
    where
        F: FnMut(Option<&AttributionRecord>) -> Option<AttributionRecord>,
    {
        self.retry(commit, |tip| {
            let existing = self.read_at(tip, commit)?;
            let Some(planned) = plan(existing.as_ref()) else {
                return Ok(None);
            };
            if existing.as_ref() == Some(&planned) {
                return Ok(None);
            }

            let bytes = codec::encode(&planned)?;
            self.notes
                .update_note(&self.notes_ref, tip, commit, NoteUpdate::Put(&bytes))?;
            Ok(Some(planned))
        })
    }

    fn read_blob(&self, commit: Oid) -> Result<Option<Vec<u8>>> {
        let tip = self.notes.notes_tip(&self.notes_ref)?;
        Ok(self.notes.read_note_at(tip, commit)?)
    }

    fn read_at(&self, tip: Option<Oid>, commit: Oid) -> Result<Option<AttributionRecord>> {
        let Some(bytes) = self.notes.read_note_at(tip, commit)? else {
            return Ok(None);
        };

        match codec::decode(&bytes) {
            Ok(record) => Ok(Some(record)),
            Err(e) => {
                warn!(%commit, error = %e, "ignoring undecodable attribution note");
                Ok(None)
            }
        }
    }

    fn update(&self, commit: Oid, update: NoteUpdate<'_>) -> Result<()> {
        self.retry(commit, |tip| {
            Ok(self
                .notes
                .update_note(&self.notes_ref, tip, commit, update)?)
        })
    }

    /// Run `attempt` against the current tip until it does not lose a race.
    fn retry<T>(
        &self,
        commit: Oid,
        mut attempt: impl FnMut(Option<Oid>) -> Result<T>,
    ) -> Result<T> {
        let attempts = self.max_retries.saturating_add(1);

        for n in 1..=attempts {
            let tip = self.notes.notes_tip(&self.notes_ref)?;
            match attempt(tip) {
                Ok(value) => {
                    debug!(%commit, attempt = n, notes_ref = %self.notes_ref, "attribution note settled");
                    return Ok(value);
                }
                Err(Error::Git(attrib_git::Error::RefConflict(_))) => {
                    debug!(%commit, attempt = n, "notes ref moved, retrying");
                }
                Err(e) => return Err(e),
            }
        }

        Err(Error::WriteConflict {
            commit: commit.to_string(),
            attempts,
        })
    }
}

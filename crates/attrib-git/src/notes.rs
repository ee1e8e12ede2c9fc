//! Notes ref storage with compare-and-swap updates.
//!
//! A notes ref points at a commit whose tree maps a commit's hex id to the
//! blob holding its note. Updates never go through `git notes`: a new notes
//! commit is built on top of the tip the caller read, and the ref is moved
//! only if it still points at that tip.

use git2::{ErrorCode, ObjectType, Oid, Tree, TreeBuilder};

use crate::Repository;
use crate::error::{Error, Result};
use crate::traits::{NoteUpdate, NotesOps};

const BLOB_MODE: i32 = 0o100_644;
const TREE_MODE: i32 = 0o040_000;

impl Repository {
    /// Current tip of a notes ref, `None` if it does not exist yet.
    ///
    /// # Errors
    /// Returns error if the ref name is invalid or cannot be read.
    pub fn notes_tip(&self, notes_ref: &str) -> Result<Option<Oid>> {
        validate_notes_ref(notes_ref)?;

        match self.inner.find_reference(notes_ref) {
            Ok(reference) => reference
                .resolve()?
                .target()
                .map(Some)
                .ok_or_else(|| Error::InvalidNotesRef(notes_ref.into())),
            Err(e) if e.code() == ErrorCode::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Read the note for `commit` from the notes tree at `tip`.
    ///
    /// Both the flat layout and the two-character fan-out layout are read.
    ///
    /// # Errors
    /// Returns error if the tip commit or note blob cannot be loaded.
    pub fn read_note_at(&self, tip: Option<Oid>, commit: Oid) -> Result<Option<Vec<u8>>> {
        let Some(tip) = tip else {
            return Ok(None);
        };

        let tree = self.inner.find_commit(tip)?.tree()?;
        let Some(blob_id) = find_note_blob(&self.inner, &tree, &commit.to_string())? else {
            return Ok(None);
        };

        let blob = self.inner.find_blob(blob_id)?;
        Ok(Some(blob.content().to_vec()))
    }

    /// Apply a note change on top of `expected_tip` and move the ref.
    ///
    /// Removing a note that does not exist leaves the ref untouched.
    ///
    /// # Errors
    /// Returns `RefConflict` if the ref no longer points at `expected_tip`.
    pub fn update_note(
        &self,
        notes_ref: &str,
        expected_tip: Option<Oid>,
        commit: Oid,
        update: NoteUpdate<'_>,
    ) -> Result<()> {
        validate_notes_ref(notes_ref)?;

        let parent = expected_tip
            .map(|oid| self.inner.find_commit(oid))
            .transpose()?;
        let base_tree = parent.as_ref().map(git2::Commit::tree).transpose()?;
        let hex = commit.to_string();

        let mut builder = self.inner.treebuilder(base_tree.as_ref())?;
        // Writes use the flat layout; a fan-out copy must not resurface after removal.
        let removed_fanout = self.remove_fanout_entry(&mut builder, base_tree.as_ref(), &hex)?;

        let message = match update {
            NoteUpdate::Put(bytes) => {
                let blob = self.inner.blob(bytes)?;
                builder.insert(hex.as_str(), blob, BLOB_MODE)?;
                format!("Notes added by 'attrib' for {hex}")
            }
            NoteUpdate::Remove => {
                let had_flat = builder.get(hex.as_str())?.is_some();
                if had_flat {
                    builder.remove(hex.as_str())?;
                }
                if !had_flat && !removed_fanout {
                    return Ok(());
                }
                format!("Notes removed by 'attrib' for {hex}")
            }
        };

        let tree = self.inner.find_tree(builder.write()?)?;
        let sig = self.signature()?;
        let parents: Vec<&git2::Commit<'_>> = parent.iter().collect();
        let new_tip = self
            .inner
            .commit(None, &sig, &sig, &message, &tree, &parents)?;

        self.swap_notes_ref(notes_ref, expected_tip, new_tip)
    }

    /// Remove the note for `hex` from any fan-out level below `base`,
    /// rewriting the affected subtrees into `builder`.
    fn remove_fanout_entry(
        &self,
        builder: &mut TreeBuilder<'_>,
        base: Option<&Tree<'_>>,
        hex: &str,
    ) -> Result<bool> {
        let Some(base) = base else {
            return Ok(false);
        };
        if hex.len() <= 2 {
            return Ok(false);
        }
        let (dir, rest) = hex.split_at(2);
        let Some(entry) = base.get_name(dir) else {
            return Ok(false);
        };
        if entry.kind() != Some(ObjectType::Tree) {
            return Ok(false);
        }

        let subtree = self.inner.find_tree(entry.id())?;
        let mut sub = self.inner.treebuilder(Some(&subtree))?;

        let removed_here = subtree
            .get_name(rest)
            .is_some_and(|e| e.kind() == Some(ObjectType::Blob));
        if removed_here {
            sub.remove(rest)?;
        }
        let removed_below = self.remove_fanout_entry(&mut sub, Some(&subtree), rest)?;
        if !removed_here && !removed_below {
            return Ok(false);
        }

        if sub.is_empty() {
            builder.remove(dir)?;
        } else {
            let id = sub.write()?;
            builder.insert(dir, id, TREE_MODE)?;
        }
        Ok(true)
    }

    fn swap_notes_ref(&self, notes_ref: &str, expected: Option<Oid>, new_tip: Oid) -> Result<()> {
        let log_message = "attrib: update attribution notes";
        let result = match expected {
            Some(current) => {
                self.inner
                    .reference_matching(notes_ref, new_tip, true, current, log_message)
            }
            None => self.inner.reference(notes_ref, new_tip, false, log_message),
        };

        match result {
            Ok(_) => Ok(()),
            Err(e) if is_conflict(&e) => Err(Error::RefConflict(notes_ref.into())),
            Err(e) => Err(e.into()),
        }
    }
}

impl NotesOps for Repository {
    fn notes_tip(&self, notes_ref: &str) -> Result<Option<Oid>> {
        Self::notes_tip(self, notes_ref)
    }

    fn read_note_at(&self, tip: Option<Oid>, commit: Oid) -> Result<Option<Vec<u8>>> {
        Self::read_note_at(self, tip, commit)
    }

    fn update_note(
        &self,
        notes_ref: &str,
        expected_tip: Option<Oid>,
        commit: Oid,
        update: NoteUpdate<'_>,
    ) -> Result<()> {
        Self::update_note(self, notes_ref, expected_tip, commit, update)
    }
}

fn validate_notes_ref(notes_ref: &str) -> Result<()> {
    if notes_ref.starts_with("refs/notes/") && git2::Reference::is_valid_name(notes_ref) {
        Ok(())
    } else {
        Err(Error::InvalidNotesRef(notes_ref.into()))
    }
}

/// Look up the note blob for `hex`, descending through two-character
/// fan-out directories at any depth.
fn find_note_blob(repo: &git2::Repository, tree: &Tree<'_>, hex: &str) -> Result<Option<Oid>> {
    if let Some(entry) = tree.get_name(hex)
        && entry.kind() == Some(ObjectType::Blob)
    {
        return Ok(Some(entry.id()));
    }
    if hex.len() <= 2 {
        return Ok(None);
    }

    let (dir, rest) = hex.split_at(2);
    let Some(entry) = tree.get_name(dir) else {
        return Ok(None);
    };
    if entry.kind() != Some(ObjectType::Tree) {
        return Ok(None);
    }
    let subtree = repo.find_tree(entry.id())?;
    find_note_blob(repo, &subtree, rest)
}

fn is_conflict(e: &git2::Error) -> bool {
    matches!(
        e.code(),
        ErrorCode::Modified | ErrorCode::Exists | ErrorCode::Locked | ErrorCode::NotFound
    )
}

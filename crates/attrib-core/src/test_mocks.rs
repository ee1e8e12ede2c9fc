//! In-memory repository for testing the store and orchestrator.
//!
//! Implements the attrib-git traits without touching disk. Every successful
//! note update appends a snapshot, so reads pinned to an old tip behave like
//! they do on a real notes ref.

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet, VecDeque};

use attrib_git::{CommitLookup, Error as GitError, NoteUpdate, NotesOps, Oid, Result as GitResult};

/// Deterministic commit id for tests.
pub fn oid(n: u8) -> Oid {
    Oid::from_bytes(&[n; 20]).unwrap()
}

fn tip_for(version: usize) -> Oid {
    let mut bytes = [0xee; 20];
    bytes[..8].copy_from_slice(&(version as u64).to_be_bytes());
    Oid::from_bytes(&bytes).unwrap()
}

/// Mock implementation of `NotesOps` and `CommitLookup`.
pub struct MockRepo {
    commits: RefCell<HashSet<Oid>>,
    snapshots: RefCell<Vec<HashMap<Oid, Vec<u8>>>>,
    conflicts: Cell<u32>,
    interleaved: RefCell<VecDeque<(Oid, Vec<u8>)>>,
    update_attempts: Cell<usize>,
    writes: Cell<usize>,
    fingerprint_fails: Cell<bool>,
}

impl Default for MockRepo {
    fn default() -> Self {
        Self::new()
    }
}

impl MockRepo {
    pub fn new() -> Self {
        Self {
            commits: RefCell::new(HashSet::new()),
            snapshots: RefCell::new(Vec::new()),
            conflicts: Cell::new(0),
            interleaved: RefCell::new(VecDeque::new()),
            update_attempts: Cell::new(0),
            writes: Cell::new(0),
            fingerprint_fails: Cell::new(false),
        }
    }

    /// Register commits that resolve.
    pub fn with_commits(self, ids: &[Oid]) -> Self {
        self.commits.borrow_mut().extend(ids.iter().copied());
        self
    }

    /// Store raw note bytes, bypassing the codec.
    pub fn with_raw_note(self, commit: Oid, bytes: &[u8]) -> Self {
        let mut next = self.current();
        next.insert(commit, bytes.to_vec());
        self.snapshots.borrow_mut().push(next);
        self
    }

    /// Make the next `count` updates lose a race against another writer.
    pub fn with_conflicts(self, count: u32) -> Self {
        self.conflicts.set(count);
        self
    }

    pub fn with_failing_fingerprint(self) -> Self {
        self.fingerprint_fails.set(true);
        self
    }

    /// Queue more lost races after construction.
    pub fn inject_conflicts(&self, count: u32) {
        self.conflicts.set(count);
    }

    /// Make the next update lose a race against a writer that stores
    /// `bytes` on `commit`.
    pub fn inject_write(&self, commit: Oid, bytes: &[u8]) {
        self.interleaved
            .borrow_mut()
            .push_back((commit, bytes.to_vec()));
    }

    /// Number of `update_note` calls, including lost races.
    pub fn update_attempts(&self) -> usize {
        self.update_attempts.get()
    }

    /// Number of updates that moved the ref.
    pub fn writes(&self) -> usize {
        self.writes.get()
    }

    /// Raw bytes of a commit's note at the current tip.
    pub fn raw_note(&self, commit: Oid) -> Option<Vec<u8>> {
        self.current().get(&commit).cloned()
    }

    fn current(&self) -> HashMap<Oid, Vec<u8>> {
        self.snapshots.borrow().last().cloned().unwrap_or_default()
    }

    fn current_tip(&self) -> Option<Oid> {
        let len = self.snapshots.borrow().len();
        len.checked_sub(1).map(tip_for)
    }
}

impl NotesOps for MockRepo {
    fn notes_tip(&self, _notes_ref: &str) -> GitResult<Option<Oid>> {
        Ok(self.current_tip())
    }

    fn read_note_at(&self, tip: Option<Oid>, commit: Oid) -> GitResult<Option<Vec<u8>>> {
        let Some(tip) = tip else {
            return Ok(None);
        };
        let snapshots = self.snapshots.borrow();
        let snapshot = (0..snapshots.len())
            .find(|&v| tip_for(v) == tip)
            .map(|v| &snapshots[v]);
        Ok(snapshot.and_then(|s| s.get(&commit).cloned()))
    }

    fn update_note(
        &self,
        notes_ref: &str,
        expected_tip: Option<Oid>,
        commit: Oid,
        update: NoteUpdate<'_>,
    ) -> GitResult<()> {
        self.update_attempts.set(self.update_attempts.get() + 1);

        let interleaved = self.interleaved.borrow_mut().pop_front();
        if let Some((other, bytes)) = interleaved {
            let mut next = self.current();
            next.insert(other, bytes);
            self.snapshots.borrow_mut().push(next);
        } else if self.conflicts.get() > 0 {
            // Another writer sneaks in an unrelated change first.
            self.conflicts.set(self.conflicts.get() - 1);
            let next = self.current();
            self.snapshots.borrow_mut().push(next);
        }

        if expected_tip != self.current_tip() {
            return Err(GitError::RefConflict(notes_ref.to_string()));
        }

        let mut next = self.current();
        match update {
            NoteUpdate::Put(bytes) => {
                next.insert(commit, bytes.to_vec());
            }
            NoteUpdate::Remove => {
                if next.remove(&commit).is_none() {
                    return Ok(());
                }
            }
        }
        self.snapshots.borrow_mut().push(next);
        self.writes.set(self.writes.get() + 1);
        Ok(())
    }
}

impl CommitLookup for MockRepo {
    fn resolve_commit(&self, spec: &str) -> GitResult<Oid> {
        Oid::from_str(spec)
            .ok()
            .filter(|id| spec.len() == 40 && self.commits.borrow().contains(id))
            .ok_or_else(|| GitError::CommitNotFound(spec.to_string()))
    }

    fn diff_fingerprint(&self, commit: Oid) -> GitResult<String> {
        if self.fingerprint_fails.get() {
            return Err(GitError::NotARepository);
        }
        Ok(format!("fp-{commit}"))
    }
}

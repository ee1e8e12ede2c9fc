//! Propagation engine for copying and syncing attribution.
//!
//! This module drives the merge and the store for the two entry points:
//! a manual copy between two commits, and the batch of groups produced by a
//! history rewrite. It is the only place that writes records.

use attrib_git::{CommitLookup, NotesOps, Oid};
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::merge::{MergeMode, MergeOptions, merge};
use crate::record::AttributionRecord;
use crate::rewrite::RewriteGroup;
use crate::store::NotesStore;

/// Result of a manual copy.
#[derive(Debug, Clone, PartialEq)]
pub enum CopyOutcome {
    /// The source carries no attribution; nothing to copy.
    NoOp,
    /// Dry run: what would be written to the target.
    Preview(AttributionRecord),
    /// The record now stored on the target.
    Applied(AttributionRecord),
}

/// What happened to one rewrite group.
#[derive(Debug)]
pub enum GroupResult {
    /// None of the old commits carried attribution.
    NoAttribution,
    /// The new commit already carries the merged record.
    Unchanged,
    /// The merged record was written.
    Written {
        /// Number of old commits that contributed.
        sources: usize,
    },
    /// The group could not be propagated.
    Failed(Error),
}

impl GroupResult {
    /// Check if the group failed.
    #[must_use]
    pub const fn is_failure(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

/// Outcome of one group in a batch.
#[derive(Debug)]
pub struct GroupOutcome {
    /// The rewritten commit.
    pub new_id: Oid,
    /// The commits it replaced.
    pub old_ids: Vec<Oid>,
    /// What happened.
    pub result: GroupResult,
}

/// Aggregate outcome of a rewrite batch.
#[derive(Debug, Default)]
pub struct BatchOutcome {
    /// Per-group outcomes, in input order.
    pub groups: Vec<GroupOutcome>,
}

impl BatchOutcome {
    /// Number of groups that did not fail.
    #[must_use]
    pub fn succeeded(&self) -> usize {
        self.groups.len() - self.failed()
    }

    /// Number of groups that failed.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.groups.iter().filter(|g| g.result.is_failure()).count()
    }

    /// Number of groups whose record was written.
    #[must_use]
    pub fn written(&self) -> usize {
        self.groups
            .iter()
            .filter(|g| matches!(g.result, GroupResult::Written { .. }))
            .count()
    }

    /// Check if every group succeeded.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.failed() == 0
    }
}

/// Copies and syncs attribution between commits.
pub struct Propagator<'a, R: NotesOps + CommitLookup> {
    repo: &'a R,
    store: NotesStore<'a, R>,
}

impl<'a, R: NotesOps + CommitLookup> Propagator<'a, R> {
    /// Create a propagator over a repository and its store.
    #[must_use]
    pub const fn new(repo: &'a R, store: NotesStore<'a, R>) -> Self {
        Self { repo, store }
    }

    /// The store records are read from and written to.
    #[must_use]
    pub const fn store(&self) -> &NotesStore<'a, R> {
        &self.store
    }

    /// Copy the source commit's attribution onto the target, replacing the
    /// target's own.
    ///
    /// # Errors
    /// Returns `CommitNotFound` if either revision does not resolve, or the
    /// store error if the write fails.
    pub fn copy_notes(&self, source: &str, target: &str, dry_run: bool) -> Result<CopyOutcome> {
        let source_id = self.repo.resolve_commit(source)?;
        let target_id = self.repo.resolve_commit(target)?;

        let Some(source_record) = self.store.read(source_id)?.filter(|r| !r.is_empty()) else {
            info!(%source_id, "source commit has no attribution");
            return Ok(CopyOutcome::NoOp);
        };

        let existing = self.store.read(target_id)?;
        let options =
            MergeOptions::new(MergeMode::Overwrite).with_fingerprint(self.fingerprint(target_id));
        let Some(planned) = merge(
            existing.as_ref(),
            std::slice::from_ref(&source_record),
            &options,
        ) else {
            return Ok(CopyOutcome::NoOp);
        };

        if dry_run {
            return Ok(CopyOutcome::Preview(planned));
        }

        self.store.write(target_id, &planned)?;
        info!(%source_id, %target_id, "copied attribution");
        Ok(CopyOutcome::Applied(planned))
    }

    /// Propagate attribution across every group of a rewrite.
    ///
    /// A failing group is recorded and the remaining groups still run.
    pub fn sync_rewrite(&self, groups: &[RewriteGroup]) -> BatchOutcome {
        let mut outcome = BatchOutcome::default();

        for group in groups {
            let result = self.sync_group(group).unwrap_or_else(|e| {
                warn!(new_id = %group.new_id, error = %e, "failed to propagate attribution");
                GroupResult::Failed(e)
            });

            outcome.groups.push(GroupOutcome {
                new_id: group.new_id,
                old_ids: group.old_ids.clone(),
                result,
            });
        }

        outcome
    }

    fn sync_group(&self, group: &RewriteGroup) -> Result<GroupResult> {
        let new_id = self.repo.resolve_commit(&group.new_id.to_string())?;

        let mut sources = Vec::with_capacity(group.old_ids.len());
        for old_id in &group.old_ids {
            if let Some(record) = self.store.read(*old_id)?
                && !record.is_empty()
            {
                sources.push(record);
            }
        }
        if sources.is_empty() {
            return Ok(GroupResult::NoAttribution);
        }

        let options =
            MergeOptions::new(MergeMode::Augment).with_fingerprint(self.fingerprint(new_id));

        // Merged against whatever the target holds at the tip being replaced.
        let written = self
            .store
            .modify(new_id, |existing| merge(existing, &sources, &options))?;

        if written.is_none() {
            return Ok(GroupResult::Unchanged);
        }
        debug!(%new_id, sources = sources.len(), "propagated attribution");
        Ok(GroupResult::Written {
            sources: sources.len(),
        })
    }

    fn fingerprint(&self, commit: Oid) -> Option<String> {
        match self.repo.diff_fingerprint(commit) {
            Ok(fingerprint) => Some(fingerprint),
            Err(e) => {
                warn!(%commit, error = %e, "could not fingerprint commit");
                None
            }
        }
    }
}

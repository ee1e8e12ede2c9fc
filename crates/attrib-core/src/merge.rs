//! Merging attribution records across a rewrite.
//!
//! The merge is pure: it takes the target's current record and the records of
//! the commits it replaced, and returns what the target should carry. It never
//! lets portions sum past 1, and in [`MergeMode::Augment`] applying the same
//! sources twice gives the same result as applying them once.

use std::collections::HashMap;

use crate::codec::SCHEMA_VERSION;
use crate::record::{AttributionEntry, AttributionRecord, EntryKey, PORTION_TOLERANCE};

/// What happens to attribution already stored on the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeMode {
    /// Replace the target's record with the merged sources (manual copy).
    Overwrite,
    /// Fold the target's record in (automatic propagation).
    Augment,
}

/// Parameters for a single merge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeOptions {
    /// Treatment of the target's existing record.
    pub mode: MergeMode,
    /// Fingerprint of the target commit, stamped on the result.
    pub fingerprint: Option<String>,
}

impl MergeOptions {
    /// Options for the given mode with no fingerprint.
    #[must_use]
    pub const fn new(mode: MergeMode) -> Self {
        Self {
            mode,
            fingerprint: None,
        }
    }

    /// Stamp results with this fingerprint.
    #[must_use]
    pub fn with_fingerprint(mut self, fingerprint: Option<String>) -> Self {
        self.fingerprint = fingerprint;
        self
    }
}

/// Merge `sources` into the target's `existing` record.
///
/// 1. No source with entries: `existing` is returned unchanged.
/// 2. Each contributing source is weighted `1 / N` where `N` counts the sources
///    that carry entries, so a squash averages its commits instead of adding them.
/// 3. Entries with the same `(contributor, tool)` are summed, each key capped at 1.
///    If the sources still sum past 1 they are scaled down proportionally.
/// 4. In `Augment` mode the target's entries follow. Keys the sources also carry
///    take the source portion; the rest are kept, scaled into whatever budget the
///    sources left.
///
/// Returns `None` when nothing remains to attribute.
#[must_use]
pub fn merge(
    existing: Option<&AttributionRecord>,
    sources: &[AttributionRecord],
    options: &MergeOptions,
) -> Option<AttributionRecord> {
    let contributing: Vec<&AttributionRecord> =
        sources.iter().filter(|record| !record.is_empty()).collect();
    if contributing.is_empty() {
        return existing.cloned();
    }

    #[allow(clippy::cast_precision_loss)]
    let weight = 1.0 / contributing.len() as f64;

    let mut incoming = Tally::default();
    for record in &contributing {
        for entry in &record.entries {
            incoming.add(entry, entry.portion * weight);
        }
    }
    conserve(&mut incoming.entries, 1.0);

    if options.mode == MergeMode::Augment
        && let Some(existing) = existing
    {
        let mut kept = Tally::default();
        for entry in &existing.entries {
            if !incoming.fold_extra(entry) {
                kept.add(entry, entry.portion);
            }
        }

        let budget = (1.0 - total(&incoming.entries)).max(0.0);
        conserve(&mut kept.entries, budget);
        incoming.entries.extend(kept.entries);
    }

    if incoming.entries.is_empty() {
        return None;
    }

    Some(AttributionRecord {
        schema_version: SCHEMA_VERSION.to_string(),
        content_fingerprint: options.fingerprint.clone(),
        entries: incoming.entries,
    })
}

/// Entries deduplicated by key, in first-seen order.
#[derive(Default)]
struct Tally {
    entries: Vec<AttributionEntry>,
    index: HashMap<EntryKey, usize>,
}

impl Tally {
    /// Add `portion` for the entry's key. The first entry seen for a key keeps
    /// its position and timestamp; later `extra` keys fill in missing ones.
    fn add(&mut self, entry: &AttributionEntry, portion: f64) {
        let portion = sanitize(portion);
        let key = entry.key();

        if let Some(&slot) = self.index.get(&key) {
            let current = &mut self.entries[slot];
            current.portion = (current.portion + portion).min(1.0);
            union_extra(current, entry);
        } else {
            let mut fresh = entry.clone();
            fresh.portion = portion;
            self.index.insert(key, self.entries.len());
            self.entries.push(fresh);
        }
    }

    /// Merge `entry`'s annotations into the tallied entry with the same key.
    ///
    /// Returns `false` if the key is not tallied.
    fn fold_extra(&mut self, entry: &AttributionEntry) -> bool {
        match self.index.get(&entry.key()) {
            Some(&slot) => {
                union_extra(&mut self.entries[slot], entry);
                true
            }
            None => false,
        }
    }
}

fn union_extra(into: &mut AttributionEntry, from: &AttributionEntry) {
    for (key, value) in &from.extra {
        into.extra
            .entry(key.clone())
            .or_insert_with(|| value.clone());
    }
}

/// Clamp a portion into `[0, 1]`, treating non-finite values as 0.
fn sanitize(portion: f64) -> f64 {
    if portion.is_finite() {
        portion.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

fn total(entries: &[AttributionEntry]) -> f64 {
    entries.iter().map(|e| e.portion).sum()
}

/// Scale entries down proportionally so they sum to at most `budget`.
fn conserve(entries: &mut [AttributionEntry], budget: f64) {
    let sum = total(entries);
    if sum <= budget + PORTION_TOLERANCE || sum <= 0.0 {
        return;
    }

    let factor = budget / sum;
    for entry in entries.iter_mut() {
        entry.portion *= factor;
    }
}

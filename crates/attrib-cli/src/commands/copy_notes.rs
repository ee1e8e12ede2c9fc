//! `attrib copy-notes` command - Copy attribution from one commit to another.

use anyhow::Result;
use attrib_core::{CopyOutcome, NotesStore, Propagator};

use super::utils::open_repo_and_config;
use crate::output;

/// Run the copy-notes command.
pub fn run(source: &str, target: &str, dry_run: bool) -> Result<()> {
    let (repo, config) = open_repo_and_config()?;
    let store = NotesStore::from_config(&repo, &config);
    let propagator = Propagator::new(&repo, store);

    match propagator.copy_notes(source, target, dry_run)? {
        CopyOutcome::NoOp => {
            output::info(&format!("{source} has no attribution - nothing to copy"));
        }
        CopyOutcome::Preview(record) => {
            output::info(&format!("Would copy attribution from {source} to {target}:"));
            output::record(&record);
        }
        CopyOutcome::Applied(record) => {
            output::success(&format!("Copied attribution from {source} to {target}"));
            output::record(&record);
        }
    }

    Ok(())
}

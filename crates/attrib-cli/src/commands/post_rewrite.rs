//! `attrib post-rewrite` command - Propagate attribution after amend or rebase.
//!
//! Meant to be called from the `post-rewrite` hook, which passes the operation
//! as its argument and the rewritten pairs on stdin.

use std::io::{self, Read};

use anyhow::{Context, Result, bail};
use attrib_core::{
    GroupOutcome, GroupResult, NotesStore, ParseMode, Propagator, RewriteKind, parse_rewrite_feed,
};

use super::utils::open_repo_and_config;
use crate::output;

/// Run the post-rewrite command.
pub fn run(kind: Option<&str>, strict: bool) -> Result<()> {
    let mut feed = String::new();
    io::stdin()
        .read_to_string(&mut feed)
        .context("Failed to read rewrite mapping from stdin")?;

    let (repo, config) = open_repo_and_config()?;
    let mode = if strict {
        ParseMode::Strict
    } else {
        config.rewrite_parse_mode()
    };

    let mapping = parse_rewrite_feed(&feed, mode)?.with_kind(RewriteKind::from_hook_arg(kind));
    for warning in &mapping.warnings {
        output::warn(&warning.to_string());
    }

    if mapping.is_empty() {
        output::info("No rewritten commits to process");
        return Ok(());
    }

    let store = NotesStore::from_config(&repo, &config);
    let propagator = Propagator::new(&repo, store);
    let outcome = propagator.sync_rewrite(&mapping.groups);

    for group in &outcome.groups {
        report(group);
    }

    if !outcome.is_success() {
        bail!(
            "{} of {} rewritten commits could not be updated",
            outcome.failed(),
            outcome.groups.len()
        );
    }

    output::success(&format!(
        "Propagated attribution after {} ({} updated, {} unchanged)",
        mapping.kind,
        outcome.written(),
        outcome.succeeded() - outcome.written()
    ));
    Ok(())
}

fn report(group: &GroupOutcome) {
    let new_id = output::short_id(&group.new_id.to_string());
    match &group.result {
        GroupResult::Written { sources } if *sources > 1 => {
            output::detail(&format!("  {new_id} merged attribution from {sources} commits"));
        }
        GroupResult::Written { .. } => {
            output::detail(&format!("  {new_id} updated"));
        }
        GroupResult::Unchanged | GroupResult::NoAttribution => {}
        GroupResult::Failed(e) => {
            output::warn(&format!("{new_id}: {e}"));
        }
    }
}

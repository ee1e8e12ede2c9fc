//! `attrib show` command - Display the attribution attached to a commit.

use anyhow::{Context, Result};
use attrib_core::{NotesStore, codec};
use colored::Colorize;

use super::utils::open_repo_and_config;
use crate::output;

/// Run the show command.
pub fn run(commit: &str, json: bool) -> Result<()> {
    let (repo, config) = open_repo_and_config()?;
    let id = repo.resolve_commit(commit)?;
    let store = NotesStore::from_config(&repo, &config);

    let Some(record) = store.read(id)? else {
        if json {
            output::essential("null");
        } else if store.exists(id)? {
            output::warn(&format!(
                "{} has a note on {} that is not a valid attribution record",
                output::short_id(&id.to_string()),
                store.notes_ref()
            ));
        } else {
            output::info(&format!(
                "{} has no attribution",
                output::short_id(&id.to_string())
            ));
        }
        return Ok(());
    };

    if json {
        let bytes = codec::encode(&record)?;
        output::essential(&String::from_utf8(bytes).context("Encoded record is not UTF-8")?);
        return Ok(());
    }

    println!();
    println!(
        "  {} {}",
        "Attribution for".bold(),
        output::short_id(&id.to_string())
    );
    output::hr();
    output::record(&record);
    output::hr();
    output::detail(&format!(
        "  {} total, schema {}",
        output::percent(record.total_portion()).trim(),
        record.schema_version
    ));
    if let Some(fingerprint) = &record.content_fingerprint {
        output::detail(&format!("  fingerprint {}", fingerprint.dimmed()));
    }

    Ok(())
}

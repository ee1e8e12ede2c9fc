//! CLI command definitions and handlers.

use clap::{Parser, Subcommand};
use clap_complete::Shell;

pub mod completions;
pub mod copy_notes;
pub mod post_rewrite;
pub mod show;
pub mod utils;

/// attrib - keeps AI attribution attached to commits across amends, rebases and squashes.
#[derive(Parser)]
#[command(name = "attrib", version, about, long_about = None)]
pub struct Cli {
    /// Suppress informational output.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Copy attribution from one commit to another, replacing the target's.
    #[command(name = "copy-notes")]
    CopyNotes {
        /// Commit to copy attribution from.
        source: String,

        /// Commit to copy attribution to.
        target: String,

        /// Show what would be written without writing it.
        #[arg(long)]
        dry_run: bool,
    },

    /// Propagate attribution after a rewrite. Reads `<old> <new>` lines on stdin.
    ///
    /// Install as `.git/hooks/post-rewrite`: `exec attrib post-rewrite "$@"`.
    #[command(name = "post-rewrite")]
    PostRewrite {
        /// Operation that rewrote history, as passed to the hook (amend or rebase).
        kind: Option<String>,

        /// Fail on the first malformed line instead of skipping it.
        #[arg(long)]
        strict: bool,
    },

    /// Show the attribution attached to a commit.
    Show {
        /// Commit to inspect.
        #[arg(default_value = "HEAD")]
        commit: String,

        /// Print the stored record as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Generate shell completions.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
}

//! attrib CLI - keeps AI attribution attached to commits across history rewrites.

use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

mod commands;
mod output;

use commands::{Cli, Commands};

/// Environment variable holding the log filter, e.g. `ATTRIB_LOG=attrib_core=debug`.
const LOG_ENV: &str = "ATTRIB_LOG";

fn main() {
    let cli = Cli::parse();

    output::set_quiet(cli.quiet);
    init_logging();

    let result = match cli.command {
        Commands::CopyNotes {
            source,
            target,
            dry_run,
        } => commands::copy_notes::run(&source, &target, dry_run),
        Commands::PostRewrite { kind, strict } => {
            commands::post_rewrite::run(kind.as_deref(), strict)
        }
        Commands::Show { commit, json } => commands::show::run(&commit, json),
        Commands::Completions { shell } => commands::completions::run(shell),
    };

    if let Err(e) = result {
        output::error(&format!("{e:#}"));
        std::process::exit(1);
    }
}

/// Logs go to stderr so they never mix with command output.
fn init_logging() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .with(filter)
        .init();
}

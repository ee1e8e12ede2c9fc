//! Terminal output formatting utilities.

use std::sync::atomic::{AtomicBool, Ordering};

use attrib_core::{AttributionEntry, AttributionRecord};
use colored::Colorize;

static QUIET_MODE: AtomicBool = AtomicBool::new(false);

/// Set quiet mode globally. Call once at startup.
pub fn set_quiet(quiet: bool) {
    QUIET_MODE.store(quiet, Ordering::Relaxed);
}

fn is_quiet() -> bool {
    QUIET_MODE.load(Ordering::Relaxed)
}

/// Print a success message (suppressed in quiet mode).
pub fn success(msg: &str) {
    if !is_quiet() {
        println!("{} {}", "✓".green(), msg);
    }
}

/// Print an error message (always prints to stderr).
pub fn error(msg: &str) {
    eprintln!("{} {}", "✗".red(), msg);
}

/// Print a warning message (always prints to stderr).
pub fn warn(msg: &str) {
    eprintln!("{} {}", "!".yellow(), msg);
}

/// Print an info message (suppressed in quiet mode).
pub fn info(msg: &str) {
    if !is_quiet() {
        println!("{} {}", "→".blue(), msg);
    }
}

/// Print a detail line without prefix (suppressed in quiet mode).
///
/// Use for indented detail lines that accompany info or warn messages.
pub fn detail(msg: &str) {
    if !is_quiet() {
        println!("{msg}");
    }
}

/// Print essential machine-readable output (always prints).
///
/// Use for results that should be available for piping, like JSON records.
pub fn essential(msg: &str) {
    println!("{msg}");
}

/// Abbreviate a commit id for display.
#[must_use]
pub fn short_id(id: &str) -> String {
    id.chars().take(7).collect::<String>().yellow().to_string()
}

/// Format a portion as a percentage.
#[must_use]
pub fn percent(portion: f64) -> String {
    format!("{:5.1}%", portion * 100.0)
}

/// One display line for an attribution entry.
#[must_use]
pub fn entry_line(entry: &AttributionEntry) -> String {
    let tool = entry
        .tool
        .as_deref()
        .map(|t| format!(" via {}", t.cyan()))
        .unwrap_or_default();
    format!(
        "  {} {}{}",
        percent(entry.portion).bold(),
        entry.contributor,
        tool
    )
}

/// Print every entry of a record (suppressed in quiet mode).
pub fn record(record: &AttributionRecord) {
    for entry in &record.entries {
        detail(&entry_line(entry));
    }
}

/// Print a horizontal line (suppressed in quiet mode).
pub fn hr() {
    if !is_quiet() {
        println!("{}", "─".repeat(50).dimmed());
    }
}

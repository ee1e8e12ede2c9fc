//! Parser for rewrite events.
//!
//! Git feeds the `post-rewrite` hook one `<old-sha> <new-sha> [<extra>]` line
//! per rewritten commit. Lines are grouped by new commit so that squashes
//! arrive as a single group with several old commits.

use std::collections::HashMap;
use std::fmt;

use attrib_git::Oid;
use tracing::warn;

const COMMIT_ID_LEN: usize = 40;

/// How malformed lines are treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParseMode {
    /// The first malformed line fails the whole batch.
    #[default]
    Strict,
    /// Malformed lines are skipped and reported as warnings.
    Lenient,
}

/// The git operation that produced the rewrite, from the hook's argument.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum RewriteKind {
    Amend,
    Rebase,
    #[default]
    Unknown,
    Other(String),
}

impl RewriteKind {
    /// Interpret the `post-rewrite` hook argument.
    #[must_use]
    pub fn from_hook_arg(arg: Option<&str>) -> Self {
        match arg {
            Some("amend") => Self::Amend,
            Some("rebase") => Self::Rebase,
            Some(other) => Self::Other(other.to_string()),
            None => Self::Unknown,
        }
    }
}

impl fmt::Display for RewriteKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Amend => write!(f, "amend"),
            Self::Rebase => write!(f, "rebase"),
            Self::Unknown => write!(f, "rewrite"),
            Self::Other(kind) => write!(f, "{kind}"),
        }
    }
}

/// A malformed line in the rewrite feed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("line {line}: {reason}")]
pub struct ParseError {
    /// 1-based line number.
    pub line: usize,
    /// What was wrong with it.
    pub reason: String,
}

/// Old commits that were rewritten into one new commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewriteGroup {
    /// The commit that now carries the change.
    pub new_id: Oid,
    /// The commits it replaced, in first-seen order.
    pub old_ids: Vec<Oid>,
}

impl RewriteGroup {
    /// A 1:1 rewrite.
    #[must_use]
    pub fn single(old_id: Oid, new_id: Oid) -> Self {
        Self {
            new_id,
            old_ids: vec![old_id],
        }
    }

    /// Check if several old commits were squashed into this one.
    #[must_use]
    pub fn is_squash(&self) -> bool {
        self.old_ids.len() > 1
    }
}

/// Something the parser dropped without failing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseWarning {
    /// A malformed line skipped in lenient mode.
    Skipped(ParseError),
    /// An old commit that was split into several new ones. Its attribution
    /// follows only the first new commit.
    Split {
        old_id: Oid,
        kept: Oid,
        dropped: Oid,
    },
}

impl fmt::Display for ParseWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Skipped(err) => write!(f, "skipped {err}"),
            Self::Split {
                old_id,
                kept,
                dropped,
            } => write!(
                f,
                "{} was split; attribution follows {} and not {}",
                short(*old_id),
                short(*kept),
                short(*dropped)
            ),
        }
    }
}

/// Parsed rewrite event.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RewriteMapping {
    /// Operation named by the hook, for reporting.
    pub kind: RewriteKind,
    /// Groups in first-seen order of their new commit.
    pub groups: Vec<RewriteGroup>,
    /// Lines skipped and splits resolved while parsing.
    pub warnings: Vec<ParseWarning>,
}

impl RewriteMapping {
    /// Check if no group was produced.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Tag the mapping with the operation that produced it.
    #[must_use]
    pub fn with_kind(mut self, kind: RewriteKind) -> Self {
        self.kind = kind;
        self
    }
}

/// Parse a whole rewrite feed.
///
/// # Errors
/// In strict mode, returns the first malformed line.
pub fn parse_rewrite_feed(input: &str, mode: ParseMode) -> Result<RewriteMapping, ParseError> {
    parse_rewrite_lines(input.lines(), mode)
}

/// Parse rewrite lines into groups keyed by new commit.
///
/// # Errors
/// In strict mode, returns the first malformed line.
pub fn parse_rewrite_lines<I, S>(lines: I, mode: ParseMode) -> Result<RewriteMapping, ParseError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut mapping = RewriteMapping::default();
    let mut group_index: HashMap<Oid, usize> = HashMap::new();
    let mut placed: HashMap<Oid, Oid> = HashMap::new();

    for (index, line) in lines.into_iter().enumerate() {
        let line = line.as_ref();
        if line.trim().is_empty() {
            continue;
        }

        let (old_id, new_id) = match parse_line(index + 1, line) {
            Ok(pair) => pair,
            Err(err) => match mode {
                ParseMode::Strict => return Err(err),
                ParseMode::Lenient => {
                    warn!(line = err.line, reason = %err.reason, "skipping malformed rewrite line");
                    mapping.warnings.push(ParseWarning::Skipped(err));
                    continue;
                }
            },
        };

        if let Some(&kept) = placed.get(&old_id) {
            if kept != new_id {
                let warning = ParseWarning::Split {
                    old_id,
                    kept,
                    dropped: new_id,
                };
                warn!("{warning}");
                mapping.warnings.push(warning);
            }
            continue;
        }
        placed.insert(old_id, new_id);

        let slot = *group_index.entry(new_id).or_insert_with(|| {
            mapping.groups.push(RewriteGroup {
                new_id,
                old_ids: Vec::new(),
            });
            mapping.groups.len() - 1
        });
        mapping.groups[slot].old_ids.push(old_id);
    }

    Ok(mapping)
}

fn parse_line(line_no: usize, line: &str) -> Result<(Oid, Oid), ParseError> {
    let fail = |reason: String| ParseError {
        line: line_no,
        reason,
    };

    let tokens: Vec<&str> = line.split_whitespace().collect();
    let (old, new) = match tokens.as_slice() {
        [old, new] | [old, new, _] => (*old, *new),
        _ => {
            return Err(fail(format!(
                "expected `<old> <new> [extra]`, found {} field(s)",
                tokens.len()
            )));
        }
    };

    let old_id = parse_commit_id(old).map_err(&fail)?;
    let new_id = parse_commit_id(new).map_err(&fail)?;
    Ok((old_id, new_id))
}

fn parse_commit_id(token: &str) -> Result<Oid, String> {
    if token.len() != COMMIT_ID_LEN || !token.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(format!("'{token}' is not a commit id"));
    }
    Oid::from_str(token).map_err(|e| format!("'{token}' is not a commit id: {e}"))
}

fn short(oid: Oid) -> String {
    oid.to_string()[..8].to_string()
}

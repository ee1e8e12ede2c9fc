//! Configuration management for attrib.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::rewrite::ParseMode;
use crate::store::{DEFAULT_MAX_RETRIES, DEFAULT_NOTES_REF};

/// Environment variable that overrides the configured notes ref.
pub const NOTES_REF_ENV: &str = "ATTRIB_NOTES_REF";

/// attrib configuration loaded from .git/attrib/config.toml.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Notes storage settings.
    #[serde(default)]
    pub notes: NotesConfig,

    /// Rewrite hook settings.
    #[serde(default)]
    pub rewrite: RewriteConfig,
}

impl Config {
    const DIR: &'static str = "attrib";
    const FILE: &'static str = "config.toml";

    /// Location of the config file inside a repository's git dir.
    #[must_use]
    pub fn path_in(git_dir: impl AsRef<Path>) -> PathBuf {
        git_dir.as_ref().join(Self::DIR).join(Self::FILE)
    }

    /// Load the config of the repository whose git dir is given.
    ///
    /// # Errors
    /// Returns error if the file exists but can't be read, parsed or validated.
    pub fn load_for_repo(git_dir: impl AsRef<Path>) -> Result<Self> {
        Self::load(Self::path_in(git_dir))
    }

    /// Load config from a TOML file.
    ///
    /// # Errors
    /// Returns error if file can't be read, parsed or validated.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        config.validate().map_err(|message| Error::InvalidConfig {
            file: path.to_path_buf(),
            message,
        })?;
        Ok(config)
    }

    /// Save config to a TOML file, creating its directory.
    ///
    /// # Errors
    /// Returns error if serialization or write fails.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| std::io::Error::other(e.to_string()))?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Notes ref to use, honoring `ATTRIB_NOTES_REF`.
    #[must_use]
    pub fn notes_ref(&self) -> String {
        self.notes_ref_with(std::env::var(NOTES_REF_ENV).ok().as_deref())
    }

    /// Notes ref to use given an override value.
    #[must_use]
    pub fn notes_ref_with(&self, env_override: Option<&str>) -> String {
        match env_override.map(str::trim) {
            Some(value) if !value.is_empty() => value.to_string(),
            _ => self.notes.notes_ref.clone(),
        }
    }

    /// Parse mode for the rewrite hook.
    #[must_use]
    pub const fn rewrite_parse_mode(&self) -> ParseMode {
        if self.rewrite.strict {
            ParseMode::Strict
        } else {
            ParseMode::Lenient
        }
    }

    fn validate(&self) -> std::result::Result<(), String> {
        if !self.notes.notes_ref.starts_with("refs/notes/") {
            return Err(format!(
                "notes.ref must start with refs/notes/, got '{}'",
                self.notes.notes_ref
            ));
        }
        if self.notes.max_retries == 0 {
            return Err("notes.max_retries must be at least 1".into());
        }
        Ok(())
    }
}

/// Where and how attribution notes are written.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotesConfig {
    /// Notes ref holding attribution records.
    #[serde(rename = "ref", default = "default_notes_ref")]
    pub notes_ref: String,

    /// Retries after losing a race on the notes ref.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

impl Default for NotesConfig {
    fn default() -> Self {
        Self {
            notes_ref: default_notes_ref(),
            max_retries: default_max_retries(),
        }
    }
}

fn default_notes_ref() -> String {
    DEFAULT_NOTES_REF.into()
}

const fn default_max_retries() -> u32 {
    DEFAULT_MAX_RETRIES
}

/// Rewrite hook settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RewriteConfig {
    /// Fail the whole hook run on a malformed line instead of skipping it.
    #[serde(default)]
    pub strict: bool,
}

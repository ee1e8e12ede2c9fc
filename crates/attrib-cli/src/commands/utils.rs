use anyhow::{Context, Result};
use attrib_core::Config;
use attrib_git::Repository;

/// Helper to open the current repository and its attrib config.
pub fn open_repo_and_config() -> Result<(Repository, Config)> {
    let repo = Repository::open_current().context("Not inside a git repository")?;
    let config = Config::load_for_repo(repo.git_dir())
        .with_context(|| format!("Failed to load {}", Config::path_in(repo.git_dir()).display()))?;
    Ok((repo, config))
}

//! Repository wrapper providing the commit lookups attrib needs.

use std::path::Path;

use git2::{DiffFormat, Oid, Signature};
use sha2::{Digest, Sha256};

use crate::error::{Error, Result};
use crate::traits::CommitLookup;

/// High-level wrapper around a git repository.
pub struct Repository {
    pub(crate) inner: git2::Repository,
}

impl Repository {
    /// Open a repository at the given path.
    ///
    /// # Errors
    /// Returns error if no repository found at path or any parent.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let inner = git2::Repository::discover(path).map_err(|e| match e.code() {
            git2::ErrorCode::NotFound => Error::NotARepository,
            _ => Error::Git2(e),
        })?;
        Ok(Self { inner })
    }

    /// Open the repository containing the current directory.
    ///
    /// # Errors
    /// Returns error if not inside a git repository.
    pub fn open_current() -> Result<Self> {
        Self::open(".")
    }

    /// Get the path to the .git directory.
    #[must_use]
    pub fn git_dir(&self) -> &Path {
        self.inner.path()
    }

    // === Commit lookups ===

    /// Resolve a revision to the id of the commit it names.
    ///
    /// # Errors
    /// Returns `CommitNotFound` if the revision is unknown or not a commit.
    pub fn resolve_commit(&self, spec: &str) -> Result<Oid> {
        self.inner
            .revparse_single(spec)
            .and_then(|object| object.peel_to_commit())
            .map(|commit| commit.id())
            .map_err(|_| Error::CommitNotFound(spec.into()))
    }

    /// Fingerprint a commit by hashing its patch against the first parent.
    ///
    /// Root commits are diffed against the empty tree.
    ///
    /// # Errors
    /// Returns error if the commit is unknown or the diff fails.
    pub fn diff_fingerprint(&self, commit: Oid) -> Result<String> {
        let commit = self
            .inner
            .find_commit(commit)
            .map_err(|_| Error::CommitNotFound(commit.to_string()))?;
        let tree = commit.tree()?;
        let parent_tree = match commit.parents().next() {
            Some(parent) => Some(parent.tree()?),
            None => None,
        };

        let diff = self
            .inner
            .diff_tree_to_tree(parent_tree.as_ref(), Some(&tree), None)?;

        let mut hasher = Sha256::new();
        diff.print(DiffFormat::Patch, |_delta, _hunk, line| {
            hasher.update([line.origin() as u8]);
            hasher.update(line.content());
            true
        })?;

        Ok(hex_encode(&hasher.finalize()))
    }

    // === Signature ===

    /// Signature used for notes commits.
    ///
    /// Falls back to a fixed identity when `user.name`/`user.email` are unset,
    /// so hooks keep working in unconfigured clones.
    ///
    /// # Errors
    /// Returns error if no signature can be built.
    pub fn signature(&self) -> Result<Signature<'static>> {
        match self.inner.signature() {
            Ok(sig) => Ok(sig.to_owned()),
            Err(_) => Ok(Signature::now("attrib", "attrib@localhost")?),
        }
    }

    // === Low-level access ===

    /// Get a reference to the underlying git2 repository.
    ///
    /// Use sparingly - prefer high-level methods.
    #[must_use]
    pub fn inner(&self) -> &git2::Repository {
        &self.inner
    }
}

impl CommitLookup for Repository {
    fn resolve_commit(&self, spec: &str) -> Result<Oid> {
        Self::resolve_commit(self, spec)
    }

    fn diff_fingerprint(&self, commit: Oid) -> Result<String> {
        Self::diff_fingerprint(self, commit)
    }
}

impl std::fmt::Debug for Repository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Repository")
            .field("path", &self.git_dir())
            .finish()
    }
}

fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}


#[cfg(test)]
mod tests {
    use super::test_support::{commit_file, init_test_repo};
    use super::*;

    #[test]
    fn test_resolve_commit_by_sha_and_head() {
        let (temp, repo) = init_test_repo();
        let oid = commit_file(&temp, &repo, "a.txt", "one\n");

        assert_eq!(repo.resolve_commit("HEAD").unwrap(), oid);
        assert_eq!(repo.resolve_commit(&oid.to_string()).unwrap(), oid);
        assert_eq!(repo.resolve_commit(&oid.to_string()[..10]).unwrap(), oid);
    }

    #[test]
    fn test_resolve_unknown_commit() {
        let (temp, repo) = init_test_repo();
        commit_file(&temp, &repo, "a.txt", "one\n");

        let err = repo
            .resolve_commit("0123456789abcdef0123456789abcdef01234567")
            .unwrap_err();
        assert!(matches!(err, Error::CommitNotFound(_)));
        assert!(matches!(
            repo.resolve_commit("no-such-branch").unwrap_err(),
            Error::CommitNotFound(_)
        ));
    }

    #[test]
    fn test_diff_fingerprint_is_stable_and_content_sensitive() {
        let (temp, repo) = init_test_repo();
        let first = commit_file(&temp, &repo, "a.txt", "one\n");
        let second = commit_file(&temp, &repo, "a.txt", "one\ntwo\n");

        let fp = repo.diff_fingerprint(second).unwrap();
        assert_eq!(fp.len(), 64);
        assert_eq!(fp, repo.diff_fingerprint(second).unwrap());
        assert_ne!(fp, repo.diff_fingerprint(first).unwrap());
    }

    #[test]
    fn test_open_outside_repository() {
        let temp = tempfile::TempDir::new().unwrap();
        // Discovery may find an enclosing repository on the host, so only a
        // missing path is guaranteed to fail.
        assert!(Repository::open(temp.path().join("missing")).is_err());
    }

    #[test]
    fn test_hex_encode() {
        assert_eq!(hex_encode(&[0x00, 0xab, 0x10]), "00ab10");
    }
}

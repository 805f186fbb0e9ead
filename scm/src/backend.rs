use crate::types::RepositoryRef;
use async_trait::async_trait;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("Not a git repository: {path}")]
    NotARepository { path: String },

    #[error("Git error: {0}")]
    Git(#[from] git2::Error),

    #[error("Command `{command}` failed: {stderr}")]
    CommandFailed { command: String, stderr: String },

    #[error("Failed to launch git executable '{exe}': {source}")]
    Spawn {
        exe: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Revision not found: {rev}")]
    RevisionNotFound { rev: String },

    #[error("Invalid UTF-8 in git output: {0}")]
    InvalidUtf8(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Background git task failed: {0}")]
    Join(String),
}

impl BackendError {
    /// True when the failure means "there is no repository here yet"
    pub fn is_missing_repository(&self) -> bool {
        matches!(self, BackendError::NotARepository { .. })
    }
}

pub type BackendResult<T> = Result<T, BackendError>;

/// Where and how git operations run against a working copy.
///
/// Sync and enumeration only talk to this trait, so the same pipeline can
/// drive a spawned git executable, an in-process libgit2 handle, or a remote
/// agent.
#[async_trait]
pub trait GitBackend: Send + Sync {
    /// Incrementally update `working_dir` from `remote`.
    ///
    /// Must fail with [`BackendError::NotARepository`] when `working_dir`
    /// holds no repository yet.
    async fn fetch(&self, remote: &RepositoryRef, working_dir: &Path) -> BackendResult<()>;

    /// Full clone of `remote` into `working_dir`
    async fn clone_into(&self, remote: &RepositoryRef, working_dir: &Path) -> BackendResult<()>;

    /// Commit ids reachable from one branch
    async fn rev_list_branch(&self, working_dir: &Path, branch: &str)
        -> BackendResult<Vec<String>>;

    /// Commit ids reachable from every local and remote-tracking branch
    async fn rev_list_all(&self, working_dir: &Path) -> BackendResult<Vec<String>>;

    /// Raw `show` output of one commit, header lines included
    async fn show_revision(&self, working_dir: &Path, commit: &str) -> BackendResult<Vec<String>>;

    /// Tag names matching a glob pattern
    async fn tag_names(&self, working_dir: &Path, pattern: &str) -> BackendResult<Vec<String>>;

    fn backend_name(&self) -> &'static str;
}

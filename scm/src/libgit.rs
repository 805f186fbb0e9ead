//! In-process git backend
//!
//! This module runs every git operation through libgit2 (git2-rs). The
//! blocking calls are moved onto tokio's blocking pool so the async
//! [`GitBackend`] surface stays cooperative.

use crate::backend::{BackendError, BackendResult, GitBackend};
use crate::types::RepositoryRef;
use async_trait::async_trait;
use git2::build::RepoBuilder;
use git2::{AutotagOption, BranchType, ErrorCode, FetchOptions, Oid, Repository, Revwalk, Sort};
use std::path::Path;
use tracing::debug;

/// [`GitBackend`] backed by libgit2
#[derive(Debug, Clone, Default)]
pub struct LibGitBackend;

impl LibGitBackend {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl GitBackend for LibGitBackend {
    async fn fetch(&self, remote: &RepositoryRef, working_dir: &Path) -> BackendResult<()> {
        let remote = remote.clone();
        let path = working_dir.to_path_buf();
        blocking(move || fetch_remote(&path, &remote)).await
    }

    async fn clone_into(&self, remote: &RepositoryRef, working_dir: &Path) -> BackendResult<()> {
        let remote = remote.clone();
        let path = working_dir.to_path_buf();
        blocking(move || clone_remote(&path, &remote)).await
    }

    async fn rev_list_branch(
        &self,
        working_dir: &Path,
        branch: &str,
    ) -> BackendResult<Vec<String>> {
        let path = working_dir.to_path_buf();
        let branch = branch.to_string();
        blocking(move || rev_list_branch(&path, &branch)).await
    }

    async fn rev_list_all(&self, working_dir: &Path) -> BackendResult<Vec<String>> {
        let path = working_dir.to_path_buf();
        blocking(move || rev_list_all_branches(&path)).await
    }

    async fn show_revision(&self, working_dir: &Path, commit: &str) -> BackendResult<Vec<String>> {
        let path = working_dir.to_path_buf();
        let commit = commit.to_string();
        blocking(move || show_revision(&path, &commit)).await
    }

    async fn tag_names(&self, working_dir: &Path, pattern: &str) -> BackendResult<Vec<String>> {
        let path = working_dir.to_path_buf();
        let pattern = pattern.to_string();
        blocking(move || tag_names(&path, &pattern)).await
    }

    fn backend_name(&self) -> &'static str {
        "libgit2"
    }
}

async fn blocking<T, F>(op: F) -> BackendResult<T>
where
    F: FnOnce() -> BackendResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(op)
        .await
        .map_err(|e| BackendError::Join(e.to_string()))?
}

/// Open the repository rooted exactly at `path` (no parent discovery)
fn open_existing(path: &Path) -> BackendResult<Repository> {
    match Repository::open(path) {
        Ok(repo) => Ok(repo),
        Err(e) if e.code() == ErrorCode::NotFound => Err(BackendError::NotARepository {
            path: path.display().to_string(),
        }),
        Err(e) => Err(e.into()),
    }
}

fn fetch_options<'cb>() -> FetchOptions<'cb> {
    let mut options = FetchOptions::new();
    options.download_tags(AutotagOption::All);
    options
}

/// Fetch `remote` into the repository at `path`
pub fn fetch_remote(path: impl AsRef<Path>, remote: &RepositoryRef) -> BackendResult<()> {
    let repo = open_existing(path.as_ref())?;

    let mut git_remote = match repo.find_remote(&remote.name) {
        Ok(existing) if existing.url() == Some(remote.url.as_str()) => existing,
        Ok(_) => {
            repo.remote_set_url(&remote.name, &remote.url)?;
            repo.find_remote(&remote.name)?
        }
        Err(_) => repo.remote(&remote.name, &remote.url)?,
    };

    let refspec = remote.fetch_refspec();
    debug!(remote = %remote.name, refspec = %refspec, "libgit2 fetch");
    git_remote.fetch(&[refspec.as_str()], Some(&mut fetch_options()), None)?;
    Ok(())
}

/// Clone `remote` into `path`, naming the remote after the reference
pub fn clone_remote(path: impl AsRef<Path>, remote: &RepositoryRef) -> BackendResult<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let remote_name = remote.name.clone();
    let mut builder = RepoBuilder::new();
    builder.fetch_options(fetch_options());
    builder.remote_create(move |repo, _name, url| repo.remote(&remote_name, url));

    debug!(remote = %remote.name, path = %path.display(), "libgit2 clone");
    builder.clone(&remote.url, path)?;
    Ok(())
}

/// Commit ids reachable from `branch`, newest first
pub fn rev_list_branch(path: impl AsRef<Path>, branch: &str) -> BackendResult<Vec<String>> {
    let repo = open_existing(path.as_ref())?;
    let tip = resolve_branch(&repo, branch)?;

    let mut revwalk = repo.revwalk()?;
    revwalk.set_sorting(Sort::TOPOLOGICAL | Sort::TIME)?;
    revwalk.push(tip)?;
    collect_ids(revwalk)
}

/// Commit ids reachable from any local or remote-tracking branch
pub fn rev_list_all_branches(path: impl AsRef<Path>) -> BackendResult<Vec<String>> {
    let repo = open_existing(path.as_ref())?;

    let mut revwalk = repo.revwalk()?;
    revwalk.set_sorting(Sort::TOPOLOGICAL | Sort::TIME)?;

    for entry in repo.branches(None)? {
        let (branch, _branch_type) = entry?;
        // Symbolic refs such as origin/HEAD peel to a commit already pushed
        if let Ok(commit) = branch.get().peel_to_commit() {
            revwalk.push(commit.id())?;
        }
    }

    collect_ids(revwalk)
}

/// Prefer the freshly fetched remote-tracking branch, then anything revparse accepts
fn resolve_branch(repo: &Repository, branch: &str) -> BackendResult<Oid> {
    for entry in repo.branches(Some(BranchType::Remote))? {
        let (candidate, _branch_type) = entry?;
        let Some(full_name) = candidate.name()? else {
            continue;
        };
        // "origin/feature/x" tracks branch "feature/x"
        if full_name.split_once('/').map(|(_, short)| short) == Some(branch) {
            return Ok(candidate.get().peel_to_commit()?.id());
        }
    }

    match repo.revparse_single(branch) {
        Ok(object) => Ok(object.peel_to_commit()?.id()),
        Err(e) if e.code() == ErrorCode::NotFound => Err(BackendError::RevisionNotFound {
            rev: branch.to_string(),
        }),
        Err(e) => Err(e.into()),
    }
}

fn collect_ids(revwalk: Revwalk<'_>) -> BackendResult<Vec<String>> {
    revwalk
        .map(|oid| oid.map(|oid| oid.to_string()).map_err(BackendError::from))
        .collect()
}

/// Raw form of one commit: id line, header lines, blank line, indented message
pub fn show_revision(path: impl AsRef<Path>, commit_id: &str) -> BackendResult<Vec<String>> {
    let repo = open_existing(path.as_ref())?;
    let oid = Oid::from_str(commit_id)?;
    let commit = repo.find_commit(oid)?;

    let header = commit
        .raw_header()
        .ok_or_else(|| BackendError::InvalidUtf8(format!("header of commit {}", oid)))?;

    let mut lines = vec![format!("commit {}", oid)];
    lines.extend(header.lines().map(str::to_string));
    lines.push(String::new());
    if let Some(message) = commit.message() {
        lines.extend(message.lines().map(|line| format!("    {}", line)));
    }

    Ok(lines)
}

/// Tag names matching `pattern`
pub fn tag_names(path: impl AsRef<Path>, pattern: &str) -> BackendResult<Vec<String>> {
    let repo = open_existing(path.as_ref())?;
    let names = repo.tag_names(Some(pattern))?;
    Ok(names.iter().flatten().map(str::to_string).collect())
}

//! Revision and tag enumeration over a synced working copy

use crate::backend::{BackendError, GitBackend};
use std::collections::HashSet;
use std::path::Path;
use thiserror::Error;
use tracing::debug;

/// Length of a full SHA-1 commit id in hex
pub const COMMIT_ID_LEN: usize = 40;

/// Pattern that matches every tag
pub const ANY_TAG: &str = "*";

#[derive(Error, Debug)]
pub enum RepositoryStateError {
    #[error("No usable working copy at {path}")]
    MissingWorkingCopy { path: String },

    #[error("Branch '{branch}' not found in {path}")]
    UnknownBranch { branch: String, path: String },

    #[error("Failed to list {what} in {path}: {source}")]
    Backend {
        what: &'static str,
        path: String,
        #[source]
        source: BackendError,
    },
}

pub type RepositoryStateResult<T> = Result<T, RepositoryStateError>;

fn state_error(what: &'static str, path: &Path, source: BackendError) -> RepositoryStateError {
    match source {
        BackendError::NotARepository { .. } => RepositoryStateError::MissingWorkingCopy {
            path: path.display().to_string(),
        },
        BackendError::RevisionNotFound { rev } => RepositoryStateError::UnknownBranch {
            branch: rev,
            path: path.display().to_string(),
        },
        source => RepositoryStateError::Backend {
            what,
            path: path.display().to_string(),
            source,
        },
    }
}

/// Commit ids reachable from `branch_filter`, or from every branch when the
/// filter is absent or blank.
///
/// Ids are unique and in the backend's topological order.
pub async fn list_revisions(
    backend: &dyn GitBackend,
    working_dir: &Path,
    branch_filter: Option<&str>,
) -> RepositoryStateResult<Vec<String>> {
    let branch = branch_filter.map(str::trim).filter(|b| !b.is_empty());

    let ids = match branch {
        Some(branch) => backend.rev_list_branch(working_dir, branch).await,
        None => backend.rev_list_all(working_dir).await,
    }
    .map_err(|e| state_error("revisions", working_dir, e))?;

    let mut seen = HashSet::with_capacity(ids.len());
    let unique: Vec<String> = ids
        .into_iter()
        .filter(|id| is_commit_id(id))
        .filter(|id| seen.insert(id.clone()))
        .collect();

    debug!(
        path = %working_dir.display(),
        branch = branch.unwrap_or("<all>"),
        count = unique.len(),
        "listed revisions"
    );
    Ok(unique)
}

/// Every tag name in the working copy
pub async fn list_tags(
    backend: &dyn GitBackend,
    working_dir: &Path,
) -> RepositoryStateResult<Vec<String>> {
    let tags = backend
        .tag_names(working_dir, ANY_TAG)
        .await
        .map_err(|e| state_error("tags", working_dir, e))?;

    debug!(path = %working_dir.display(), count = tags.len(), "listed tags");
    Ok(tags)
}

/// Full-length hex commit id
pub fn is_commit_id(candidate: &str) -> bool {
    candidate.len() == COMMIT_ID_LEN && candidate.bytes().all(|b| b.is_ascii_hexdigit())
}

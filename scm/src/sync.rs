//! Working-copy synchronization
//!
//! Brings a remote's working copy up to date: fetch when a repository is
//! already there, clone on first use. Working copies are guarded by
//! [`WorkingCopyLocks`] so only one task touches a directory at a time.

use crate::backend::{BackendError, GitBackend};
use crate::types::WorkingCopyHandle;
use serde::Serialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use thiserror::Error;
use tokio::sync::OwnedMutexGuard;
use tracing::{debug, info};

/// What a successful sync had to do
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SyncOutcome {
    /// An existing working copy was updated
    Fetched,
    /// No working copy existed; a fresh clone was made
    Cloned,
}

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Fetch of remote '{remote}' failed: {source}")]
    Fetch {
        remote: String,
        #[source]
        source: BackendError,
    },

    #[error("Clone of remote '{remote}' into {path} failed: {source}")]
    Clone {
        remote: String,
        path: String,
        #[source]
        source: BackendError,
    },
}

pub type SyncResult<T> = Result<T, SyncError>;

/// Fetch into the working copy, falling back to a clone when none exists yet.
///
/// Calling this repeatedly converges: once a clone exists, later calls only
/// fetch.
pub async fn sync(backend: &dyn GitBackend, handle: &WorkingCopyHandle) -> SyncResult<SyncOutcome> {
    let remote = handle.remote();
    let path = handle.path();

    match backend.fetch(remote, path).await {
        Ok(()) => {
            debug!(remote = %remote.name, path = %path.display(), "fetched working copy");
            Ok(SyncOutcome::Fetched)
        }
        Err(e) if e.is_missing_repository() => {
            info!(
                remote = %remote.name,
                path = %path.display(),
                backend = backend.backend_name(),
                "no working copy yet, cloning"
            );
            backend
                .clone_into(remote, path)
                .await
                .map_err(|source| SyncError::Clone {
                    remote: remote.name.clone(),
                    path: path.display().to_string(),
                    source,
                })?;
            Ok(SyncOutcome::Cloned)
        }
        Err(source) => Err(SyncError::Fetch {
            remote: remote.name.clone(),
            source,
        }),
    }
}

/// Per-directory mutual exclusion for working copies
#[derive(Debug, Default)]
pub struct WorkingCopyLocks {
    locks: Mutex<HashMap<PathBuf, Arc<tokio::sync::Mutex<()>>>>,
}

impl WorkingCopyLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive use of `path`; released when the guard drops
    pub async fn acquire(&self, path: &Path) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
            locks.entry(path.to_path_buf()).or_default().clone()
        };
        lock.lock_owned().await
    }

    /// Number of distinct working copies seen so far
    pub fn tracked(&self) -> usize {
        self.locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

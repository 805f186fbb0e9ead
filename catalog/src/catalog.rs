//! Catalog results: ordered options, error state and per-remote failures

use scm::{RepositoryStateError, SyncError};
use serde::Serialize;
use std::collections::HashMap;
use std::time::Duration;
use thiserror::Error;

pub const NO_CONTEXT_MESSAGE: &str = "No job owns this parameter.";
pub const NO_WORKSPACE_MESSAGE: &str =
    "No workspace yet!. Perform at least one build to create workspace.";
pub const NO_GIT_MESSAGE: &str = "No Git configured in this job.";

/// One selectable option
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CatalogEntry {
    /// Value handed to the build (commit id or tag name)
    pub key: String,
    pub label: String,
}

impl CatalogEntry {
    pub fn new(key: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
        }
    }
}

/// Whether a catalog could be built at all
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ErrorState {
    pub message: Option<String>,
    pub has_error: bool,
}

impl ErrorState {
    pub fn raised(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            has_error: true,
        }
    }

    pub fn clear() -> Self {
        Self::default()
    }
}

/// Why a single remote contributed nothing
#[derive(Error, Debug)]
pub enum RemoteTaskError {
    #[error(transparent)]
    Sync(#[from] SyncError),

    #[error(transparent)]
    RepositoryState(#[from] RepositoryStateError),

    #[error("Remote '{remote}' did not finish within {timeout:?}")]
    TimedOut { remote: String, timeout: Duration },

    #[error("Remote '{remote}' uses the same working copy as an earlier remote")]
    DuplicateRemote { remote: String },

    #[error("Task for remote '{remote}' aborted: {reason}")]
    Aborted { remote: String, reason: String },
}

#[derive(Debug)]
pub struct RemoteFailure {
    pub remote: String,
    pub error: RemoteTaskError,
}

/// Ordered option map built for one mode.
///
/// Inserting an existing key replaces its label but keeps its position.
#[derive(Debug, Default)]
pub struct Catalog {
    entries: Vec<CatalogEntry>,
    index: HashMap<String, usize>,
    error: ErrorState,
    failures: Vec<RemoteFailure>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Single pseudo-entry catalog whose key and label are the message
    pub fn from_error(message: impl Into<String>) -> Self {
        let message = message.into();
        let mut catalog = Self::new();
        catalog.insert(message.clone(), message.clone());
        catalog.error = ErrorState::raised(message);
        catalog
    }

    pub fn insert(&mut self, key: impl Into<String>, label: impl Into<String>) {
        let entry = CatalogEntry::new(key, label);
        match self.index.get(&entry.key) {
            Some(&position) => self.entries[position] = entry,
            None => {
                self.index.insert(entry.key.clone(), self.entries.len());
                self.entries.push(entry);
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.index
            .get(key)
            .map(|&position| self.entries[position].label.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|entry| entry.key.as_str())
    }

    pub fn error(&self) -> &ErrorState {
        &self.error
    }

    pub fn has_error(&self) -> bool {
        self.error.has_error
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error.message.as_deref()
    }

    pub fn failures(&self) -> &[RemoteFailure] {
        &self.failures
    }

    pub fn record_failure(&mut self, remote: impl Into<String>, error: RemoteTaskError) {
        self.failures.push(RemoteFailure {
            remote: remote.into(),
            error,
        });
    }

    pub fn into_pairs(self) -> Vec<(String, String)> {
        self.entries
            .into_iter()
            .map(|entry| (entry.key, entry.label))
            .collect()
    }
}

impl Extend<CatalogEntry> for Catalog {
    fn extend<I: IntoIterator<Item = CatalogEntry>>(&mut self, iter: I) {
        for entry in iter {
            self.insert(entry.key, entry.label);
        }
    }
}

//! Catalog builder
//!
//! Turns a job's git remotes into one option catalog:
//! 1. Owning job given? Otherwise an error catalog
//! 2. Workspace present? Otherwise an error catalog
//! 3. Git configured? Otherwise an error catalog
//! 4. Per remote, concurrently: sync → enumerate → describe (revisions only);
//!    remotes that map onto an already claimed working copy are skipped
//! 5. Merge results in remote order once every remote is done

use crate::catalog::{
    Catalog, CatalogEntry, ErrorState, RemoteTaskError, NO_CONTEXT_MESSAGE, NO_GIT_MESSAGE,
    NO_WORKSPACE_MESSAGE,
};
use crate::config::CatalogConfig;
use crate::context::{JobContext, ScmConfig};
use crate::mode::Mode;
use crate::parameter::ParameterDefinition;
use futures::future::join_all;
use scm::{
    describe, list_revisions, list_tags, sync, GitBackend, WorkingCopyHandle, WorkingCopyLocks,
};
use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

#[derive(Error, Debug)]
pub enum BuilderError {
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },
}

/// Builds revision and tag catalogs for one parameter definition
pub struct CatalogBuilder {
    parameter: ParameterDefinition,
    backend: Arc<dyn GitBackend>,
    config: CatalogConfig,
    locks: Arc<WorkingCopyLocks>,
    last_error: Mutex<ErrorState>,
}

impl CatalogBuilder {
    pub fn new(
        parameter: ParameterDefinition,
        backend: Arc<dyn GitBackend>,
        config: CatalogConfig,
    ) -> Result<Self, BuilderError> {
        config
            .validate()
            .map_err(|message| BuilderError::InvalidConfig { message })?;

        Ok(Self {
            parameter,
            backend,
            config,
            locks: Arc::new(WorkingCopyLocks::new()),
            last_error: Mutex::new(ErrorState::clear()),
        })
    }

    /// Share working-copy locks with other builders touching the same workspaces
    pub fn with_locks(mut self, locks: Arc<WorkingCopyLocks>) -> Self {
        self.locks = locks;
        self
    }

    pub fn parameter(&self) -> &ParameterDefinition {
        &self.parameter
    }

    pub fn config(&self) -> &CatalogConfig {
        &self.config
    }

    /// Commit ids labelled with author and date
    pub async fn revision_map(&self, context: Option<&dyn JobContext>) -> Catalog {
        self.build(context, Mode::Revision).await
    }

    /// Tag names labelled with themselves
    pub async fn tag_map(&self, context: Option<&dyn JobContext>) -> Catalog {
        self.build(context, Mode::Tag).await
    }

    /// Catalog for the mode the parameter is configured with
    pub async fn build_configured(&self, context: Option<&dyn JobContext>) -> Catalog {
        self.build(context, self.parameter.mode).await
    }

    /// Message of the most recently finished build, if it failed
    pub fn error_message(&self) -> Option<String> {
        self.last_error
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .message
            .clone()
    }

    pub async fn build(&self, context: Option<&dyn JobContext>, mode: Mode) -> Catalog {
        let catalog = self.assemble(context, mode).await;
        *self.last_error.lock().unwrap_or_else(PoisonError::into_inner) = catalog.error().clone();
        catalog
    }

    async fn assemble(&self, context: Option<&dyn JobContext>, mode: Mode) -> Catalog {
        let Some(context) = context else {
            warn!(parameter = %self.parameter.name, "catalog requested without an owning job");
            return Catalog::from_error(NO_CONTEXT_MESSAGE);
        };

        let Some(workspace) = context.workspace() else {
            debug!(job = context.name(), "job has no workspace yet");
            return Catalog::from_error(NO_WORKSPACE_MESSAGE);
        };

        let remotes = match context.scm() {
            ScmConfig::Git { remotes } => remotes,
            ScmConfig::Other { kind } => {
                debug!(job = context.name(), kind = %kind, "job does not use git");
                return Catalog::from_error(NO_GIT_MESSAGE);
            }
        };

        info!(
            job = context.name(),
            parameter = %self.parameter.name,
            parameter_id = %self.parameter.id(),
            mode = %mode,
            remotes = remotes.len(),
            backend = self.backend.backend_name(),
            "building catalog"
        );

        let checkout_root = self.config.checkout_root(workspace);
        let permits = Arc::new(Semaphore::new(self.config.max_parallel_remotes));
        let branch = self.parameter.branch_filter().map(str::to_string);

        let mut claimed = HashSet::new();
        let tasks: Vec<_> = remotes
            .iter()
            .map(|remote| {
                let handle = WorkingCopyHandle::for_remote(&checkout_root, remote.clone());
                if !claimed.insert(handle.path().to_path_buf()) {
                    return None;
                }
                let job = RemoteJob {
                    backend: Arc::clone(&self.backend),
                    locks: Arc::clone(&self.locks),
                    permits: Arc::clone(&permits),
                    handle,
                    mode,
                    branch: branch.clone(),
                    timeout: self.config.task_timeout,
                };
                Some(tokio::spawn(job.run()))
            })
            .collect();

        let results = join_all(tasks.into_iter().map(|task| async move {
            match task {
                Some(task) => Some(task.await),
                None => None,
            }
        }))
        .await;

        let mut catalog = Catalog::new();
        for (remote, result) in remotes.iter().zip(results) {
            let outcome = match result {
                Some(Ok(outcome)) => outcome,
                Some(Err(join_error)) => Err(RemoteTaskError::Aborted {
                    remote: remote.name.clone(),
                    reason: join_error.to_string(),
                }),
                None => Err(RemoteTaskError::DuplicateRemote {
                    remote: remote.name.clone(),
                }),
            };

            match outcome {
                Ok(entries) => {
                    debug!(remote = %remote.name, entries = entries.len(), "merging remote");
                    catalog.extend(entries);
                }
                Err(error) => {
                    warn!(remote = %remote.name, error = %error, "remote contributed no entries");
                    catalog.record_failure(remote.name.clone(), error);
                }
            }
        }

        catalog
    }
}

/// Everything one remote's task owns
struct RemoteJob {
    backend: Arc<dyn GitBackend>,
    locks: Arc<WorkingCopyLocks>,
    permits: Arc<Semaphore>,
    handle: WorkingCopyHandle,
    mode: Mode,
    branch: Option<String>,
    timeout: Duration,
}

impl RemoteJob {
    async fn run(self) -> Result<Vec<CatalogEntry>, RemoteTaskError> {
        let remote = self.handle.remote().name.clone();
        let timeout = self.timeout;

        // Waiting for a slot is not charged to the remote's timeout
        let _permit = Arc::clone(&self.permits)
            .acquire_owned()
            .await
            .map_err(|e| RemoteTaskError::Aborted {
                remote: remote.clone(),
                reason: e.to_string(),
            })?;

        // The spawned work owns the working-copy guard: a timeout abandons the
        // wait, and the directory stays locked until the backend returns.
        let work = tokio::spawn(self.collect());
        match tokio::time::timeout(timeout, work).await {
            Ok(Ok(result)) => result,
            Ok(Err(join_error)) => Err(RemoteTaskError::Aborted {
                remote,
                reason: join_error.to_string(),
            }),
            Err(_) => Err(RemoteTaskError::TimedOut { remote, timeout }),
        }
    }

    async fn collect(self) -> Result<Vec<CatalogEntry>, RemoteTaskError> {
        let _guard = self.locks.acquire(self.handle.path()).await;

        let backend = self.backend.as_ref();
        let path = self.handle.path();

        let outcome = sync(backend, &self.handle).await?;
        debug!(remote = %self.handle.remote().name, ?outcome, "working copy synced");

        match self.mode {
            Mode::Revision => {
                let ids = list_revisions(backend, path, self.branch.as_deref()).await?;
                let mut entries = Vec::with_capacity(ids.len());
                for id in ids {
                    let record = describe(backend, path, &id).await;
                    entries.push(CatalogEntry::new(id, record.label()));
                }
                Ok(entries)
            }
            Mode::Tag => {
                let tags = list_tags(backend, path).await?;
                Ok(tags
                    .into_iter()
                    .map(|tag| CatalogEntry::new(tag.clone(), tag))
                    .collect())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Job;
    use scm::RepositoryRef;

    fn builder() -> CatalogBuilder {
        CatalogBuilder::new(
            ParameterDefinition::new("REVISION", Mode::Revision),
            Arc::new(scm::LibGitBackend::new()),
            CatalogConfig::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_invalid_config_rejected() {
        let result = CatalogBuilder::new(
            ParameterDefinition::new("REVISION", Mode::Revision),
            Arc::new(scm::LibGitBackend::new()),
            CatalogConfig::default().with_task_timeout(Duration::ZERO),
        );
        assert!(matches!(result, Err(BuilderError::InvalidConfig { .. })));
    }

    #[tokio::test]
    async fn test_missing_context() {
        let builder = builder();
        let catalog = builder.revision_map(None).await;

        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.get(NO_CONTEXT_MESSAGE), Some(NO_CONTEXT_MESSAGE));
        assert_eq!(builder.error_message().as_deref(), Some(NO_CONTEXT_MESSAGE));
    }

    #[tokio::test]
    async fn test_non_git_job() {
        let job = Job::new(
            "svn-job",
            ScmConfig::Other {
                kind: "svn".to_string(),
            },
        )
        .with_workspace("/var/ws/svn-job");

        let builder = builder();
        let catalog = builder.tag_map(Some(&job)).await;
        assert!(catalog.has_error());
        assert_eq!(catalog.keys().collect::<Vec<_>>(), vec![NO_GIT_MESSAGE]);
    }

    #[tokio::test]
    async fn test_workspace_checked_before_scm_kind() {
        let job = Job::new(
            "fresh",
            ScmConfig::Git {
                remotes: vec![RepositoryRef::new("origin", "https://example.com/app.git")],
            },
        );

        let catalog = builder().revision_map(Some(&job)).await;
        assert_eq!(catalog.error_message(), Some(NO_WORKSPACE_MESSAGE));
    }

    #[tokio::test]
    async fn test_git_job_without_remotes_is_empty_success() {
        let job = Job::new("empty", ScmConfig::Git { remotes: vec![] }).with_workspace("/tmp");

        let builder = builder();
        let catalog = builder.revision_map(Some(&job)).await;
        assert!(catalog.is_empty());
        assert!(!catalog.has_error());
        assert_eq!(builder.error_message(), None);
    }
}

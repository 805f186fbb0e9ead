//! The job a catalog is built for
//!
//! Callers hand the owning job to the builder explicitly; nothing here looks
//! jobs up by itself.

use scm::RepositoryRef;
use std::path::{Path, PathBuf};

/// Source control configured on a job
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScmConfig {
    Git { remotes: Vec<RepositoryRef> },
    /// Any other kind of source control, which catalogs cannot read
    Other { kind: String },
}

impl ScmConfig {
    /// Build from a kind name; only `git` (any case) keeps the remotes
    pub fn from_kind(kind: &str, remotes: Vec<RepositoryRef>) -> Self {
        if kind.trim().eq_ignore_ascii_case("git") {
            ScmConfig::Git { remotes }
        } else {
            ScmConfig::Other {
                kind: kind.to_string(),
            }
        }
    }

    pub fn remotes(&self) -> &[RepositoryRef] {
        match self {
            ScmConfig::Git { remotes } => remotes,
            ScmConfig::Other { .. } => &[],
        }
    }
}

/// What the catalog builder needs to know about the owning job
pub trait JobContext: Send + Sync {
    fn name(&self) -> &str;

    /// Workspace of some completed build; `None` until a build has produced one
    fn workspace(&self) -> Option<&Path>;

    fn scm(&self) -> &ScmConfig;
}

/// Plain-data [`JobContext`]
#[derive(Debug, Clone)]
pub struct Job {
    pub name: String,
    pub workspace: Option<PathBuf>,
    pub scm: ScmConfig,
}

impl Job {
    pub fn new(name: impl Into<String>, scm: ScmConfig) -> Self {
        Self {
            name: name.into(),
            workspace: None,
            scm,
        }
    }

    pub fn with_workspace(mut self, workspace: impl Into<PathBuf>) -> Self {
        self.workspace = Some(workspace.into());
        self
    }
}

impl JobContext for Job {
    fn name(&self) -> &str {
        &self.name
    }

    fn workspace(&self) -> Option<&Path> {
        self.workspace.as_deref()
    }

    fn scm(&self) -> &ScmConfig {
        &self.scm
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scm_kind() {
        let remotes = vec![RepositoryRef::new("origin", "https://example.com/app.git")];

        let git = ScmConfig::from_kind("Git", remotes.clone());
        assert_eq!(git.remotes(), remotes.as_slice());

        let svn = ScmConfig::from_kind("svn", remotes);
        assert_eq!(
            svn,
            ScmConfig::Other {
                kind: "svn".to_string()
            }
        );
        assert!(svn.remotes().is_empty());
    }

    #[test]
    fn test_job_context() {
        let job = Job::new("app", ScmConfig::Git { remotes: vec![] });
        assert_eq!(job.name(), "app");
        assert!(job.workspace().is_none());

        let job = job.with_workspace("/var/ws/app");
        assert_eq!(job.workspace(), Some(Path::new("/var/ws/app")));
    }
}

//! Job files
//!
//! A job file is a TOML document describing one git parameter and the job
//! that owns it:
//!
//! ```toml
//! [parameter]
//! name = "REVISION"
//! type = "PT_REVISION"
//! branch = "main"
//!
//! [job]
//! name = "app"
//! workspace = "/var/ws/app"
//!
//! [job.scm]
//! kind = "git"
//!
//! [[job.scm.remotes]]
//! name = "origin"
//! url = "https://example.com/app.git"
//!
//! [[tools.git]]
//! name = "Default"
//! exe = "/usr/bin/git"
//!
//! [catalog]
//! timeout_seconds = 60
//! backend = "process"
//! ```
//!
//! Relative workspace paths are resolved against the job file's directory.

use catalog::{
    BuilderError, CatalogBuilder, CatalogConfig, Job, Mode, ModeParseError, ParameterDefinition,
    ScmConfig,
};
use scm::{
    GitBackend, GitInstallation, GitToolLocator, LibGitBackend, ProcessBackend, RepositoryRef,
};
use serde::Deserialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum JobFileError {
    #[error("Failed to read job file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse job file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("Job file {path} configures remote '{name}' more than once")]
    DuplicateRemote { path: String, name: String },

    #[error("Invalid parameter type: {0}")]
    Mode(#[from] ModeParseError),

    #[error(transparent)]
    Builder(#[from] BuilderError),
}

/// Which [`GitBackend`] the job file asks for
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// The git executable resolved from `[[tools.git]]`
    #[default]
    Process,
    Libgit2,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ParameterSection {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub branch: Option<String>,
    pub default_value: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScmSection {
    #[serde(default = "default_scm_kind")]
    pub kind: String,
    #[serde(default)]
    pub remotes: Vec<RepositoryRef>,
}

impl Default for ScmSection {
    fn default() -> Self {
        Self {
            kind: default_scm_kind(),
            remotes: Vec::new(),
        }
    }
}

fn default_scm_kind() -> String {
    "git".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct JobSection {
    #[serde(default = "default_job_name")]
    pub name: String,
    pub workspace: Option<PathBuf>,
    #[serde(default)]
    pub scm: ScmSection,
}

fn default_job_name() -> String {
    "job".to_string()
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ToolsSection {
    #[serde(default)]
    pub git: Vec<GitInstallation>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CatalogSection {
    pub timeout_seconds: Option<u64>,
    pub checkout_dir: Option<String>,
    pub max_parallel_remotes: Option<usize>,
    #[serde(default)]
    pub backend: BackendKind,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JobFile {
    pub parameter: ParameterSection,
    pub job: JobSection,
    #[serde(default)]
    pub tools: ToolsSection,
    #[serde(default)]
    pub catalog: CatalogSection,
    /// Directory relative workspace paths are resolved against
    #[serde(skip)]
    base_dir: Option<PathBuf>,
}

impl JobFile {
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, JobFileError> {
        let path = path.as_ref();
        let text = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| JobFileError::Read {
                path: path.display().to_string(),
                source,
            })?;

        let mut file = Self::parse(&text, &path.display().to_string())?;
        file.base_dir = path.parent().map(Path::to_path_buf);
        debug!(path = %path.display(), job = %file.job.name, "loaded job file");
        Ok(file)
    }

    /// Parse job file text; `origin` only appears in error messages
    pub fn parse(text: &str, origin: &str) -> Result<Self, JobFileError> {
        let file: Self = toml::from_str(text).map_err(|source| JobFileError::Parse {
            path: origin.to_string(),
            source,
        })?;

        let mut names = HashSet::new();
        for remote in &file.job.scm.remotes {
            if !names.insert(remote.name.clone()) {
                return Err(JobFileError::DuplicateRemote {
                    path: origin.to_string(),
                    name: remote.name.clone(),
                });
            }
        }

        Ok(file)
    }

    pub fn parameter_definition(&self) -> Result<ParameterDefinition, JobFileError> {
        let section = &self.parameter;
        let mut parameter = ParameterDefinition::new(&section.name, Mode::Revision)
            .with_description(&section.description);

        if let Some(kind) = &section.kind {
            parameter.set_mode_str(kind)?;
        }
        if let Some(branch) = &section.branch {
            parameter = parameter.with_branch(branch);
        }
        if let Some(value) = &section.default_value {
            parameter = parameter.with_default_value(value);
        }

        Ok(parameter)
    }

    /// Configured workspace, if one is set and has been created by a build
    pub fn workspace(&self) -> Option<PathBuf> {
        let configured = self.job.workspace.as_ref()?;
        let resolved = match &self.base_dir {
            Some(base) if configured.is_relative() => base.join(configured),
            _ => configured.clone(),
        };

        if resolved.is_dir() {
            Some(resolved)
        } else {
            debug!(workspace = %resolved.display(), "workspace does not exist yet");
            None
        }
    }

    pub fn job(&self) -> Job {
        let scm = ScmConfig::from_kind(&self.job.scm.kind, self.job.scm.remotes.clone());
        let job = Job::new(&self.job.name, scm);
        match self.workspace() {
            Some(workspace) => job.with_workspace(workspace),
            None => job,
        }
    }

    pub fn git_locator(&self) -> GitToolLocator {
        GitToolLocator::new(self.tools.git.clone())
    }

    pub fn catalog_config(&self) -> CatalogConfig {
        let section = &self.catalog;
        let mut config = CatalogConfig::default();

        if let Some(seconds) = section.timeout_seconds {
            config = config.with_task_timeout(Duration::from_secs(seconds));
        }
        if let Some(dir) = &section.checkout_dir {
            config = config.with_checkout_dir(dir);
        }
        if let Some(max) = section.max_parallel_remotes {
            config = config.with_max_parallel_remotes(max);
        }

        config
    }

    pub fn backend(&self) -> Arc<dyn GitBackend> {
        match self.catalog.backend {
            BackendKind::Process => Arc::new(ProcessBackend::from_locator(&self.git_locator())),
            BackendKind::Libgit2 => Arc::new(LibGitBackend::new()),
        }
    }

    pub fn builder(&self) -> Result<CatalogBuilder, JobFileError> {
        let builder = CatalogBuilder::new(
            self.parameter_definition()?,
            self.backend(),
            self.catalog_config(),
        )?;
        Ok(builder)
    }
}

//! Git backend that drives the git executable
//!
//! Each operation spawns the located git binary with `tokio::process`. A
//! command whose future is dropped (for example by a timeout) kills its child.

use crate::backend::{BackendError, BackendResult, GitBackend};
use crate::tool::GitToolLocator;
use crate::types::RepositoryRef;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

/// [`GitBackend`] running a git executable as a child process
#[derive(Debug, Clone)]
pub struct ProcessBackend {
    exe: PathBuf,
}

impl ProcessBackend {
    pub fn new(exe: impl Into<PathBuf>) -> Self {
        Self { exe: exe.into() }
    }

    pub fn from_locator(locator: &GitToolLocator) -> Self {
        Self::new(locator.resolve())
    }

    pub fn exe(&self) -> &Path {
        &self.exe
    }

    /// Check that the executable can be launched at all
    pub async fn is_available(&self) -> bool {
        Command::new(&self.exe)
            .arg("--version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .is_ok_and(|status| status.success())
    }

    async fn run(&self, dir: &Path, args: &[&str]) -> BackendResult<String> {
        let command = format!("{} {}", self.exe.display(), args.join(" "));
        debug!(command = %command, dir = %dir.display(), "running git");

        let output = Command::new(&self.exe)
            .args(args)
            .current_dir(dir)
            .env("GIT_TERMINAL_PROMPT", "0")
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|source| BackendError::Spawn {
                exe: self.exe.display().to_string(),
                source,
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            if stderr.contains("not a git repository") {
                return Err(BackendError::NotARepository {
                    path: dir.display().to_string(),
                });
            }
            return Err(BackendError::CommandFailed { command, stderr });
        }

        String::from_utf8(output.stdout).map_err(|e| BackendError::InvalidUtf8(e.to_string()))
    }

    /// Run inside an existing working copy.
    ///
    /// Refuses directories without their own `.git` so git never walks up
    /// into an enclosing repository.
    async fn run_in_repo(&self, working_dir: &Path, args: &[&str]) -> BackendResult<String> {
        if !working_dir.join(".git").exists() {
            return Err(BackendError::NotARepository {
                path: working_dir.display().to_string(),
            });
        }
        self.run(working_dir, args).await
    }

    async fn remote_tracking_ref(
        &self,
        working_dir: &Path,
        branch: &str,
    ) -> BackendResult<Option<String>> {
        let refs = self
            .run_in_repo(
                working_dir,
                &["for-each-ref", "--format=%(refname)", "refs/remotes"],
            )
            .await?;

        Ok(non_empty_lines(&refs).into_iter().find(|refname| {
            refname
                .strip_prefix("refs/remotes/")
                .and_then(|rest| rest.split_once('/'))
                .map(|(_, short)| short)
                == Some(branch)
        }))
    }
}

fn non_empty_lines(output: &str) -> Vec<String> {
    output
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

#[async_trait]
impl GitBackend for ProcessBackend {
    async fn fetch(&self, remote: &RepositoryRef, working_dir: &Path) -> BackendResult<()> {
        let refspec = remote.fetch_refspec();
        self.run_in_repo(working_dir, &["fetch", "--tags", &remote.url, &refspec])
            .await?;
        Ok(())
    }

    async fn clone_into(&self, remote: &RepositoryRef, working_dir: &Path) -> BackendResult<()> {
        let parent = match working_dir.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        tokio::fs::create_dir_all(&parent).await?;

        // Clone runs from the parent, so only the last component names the target
        let target = working_dir
            .file_name()
            .map(|name| name.to_string_lossy())
            .ok_or_else(|| BackendError::NotARepository {
                path: working_dir.display().to_string(),
            })?;
        self.run(
            &parent,
            &["clone", "--origin", &remote.name, &remote.url, &target],
        )
        .await?;
        Ok(())
    }

    async fn rev_list_branch(
        &self,
        working_dir: &Path,
        branch: &str,
    ) -> BackendResult<Vec<String>> {
        let rev = self
            .remote_tracking_ref(working_dir, branch)
            .await?
            .unwrap_or_else(|| branch.to_string());

        match self
            .run_in_repo(working_dir, &["rev-list", "--topo-order", &rev, "--"])
            .await
        {
            Ok(output) => Ok(non_empty_lines(&output)),
            Err(BackendError::CommandFailed { stderr, .. })
                if stderr.contains("unknown revision") || stderr.contains("bad revision") =>
            {
                Err(BackendError::RevisionNotFound { rev })
            }
            Err(e) => Err(e),
        }
    }

    async fn rev_list_all(&self, working_dir: &Path) -> BackendResult<Vec<String>> {
        let output = self
            .run_in_repo(
                working_dir,
                &["rev-list", "--topo-order", "--branches", "--remotes"],
            )
            .await?;
        Ok(non_empty_lines(&output))
    }

    async fn show_revision(&self, working_dir: &Path, commit: &str) -> BackendResult<Vec<String>> {
        let output = self
            .run_in_repo(working_dir, &["show", "-s", "--format=raw", commit])
            .await?;
        Ok(output.lines().map(str::to_string).collect())
    }

    async fn tag_names(&self, working_dir: &Path, pattern: &str) -> BackendResult<Vec<String>> {
        let output = self
            .run_in_repo(working_dir, &["tag", "-l", pattern])
            .await?;
        Ok(non_empty_lines(&output))
    }

    fn backend_name(&self) -> &'static str {
        "process"
    }
}

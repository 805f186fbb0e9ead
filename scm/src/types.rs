//! Repository references and working-copy handles
//!
//! These are the values the rest of the pipeline passes around: a remote as
//! read from job configuration, and the local directory that mirrors it.

use serde::{Deserialize, Serialize};
use std::fmt::Write;
use std::path::{Path, PathBuf};

/// A named remote location read from job configuration.
///
/// # Examples
///
/// ```
/// use scm::RepositoryRef;
///
/// let origin = RepositoryRef::new("origin", "https://example.com/app.git");
/// assert_eq!(origin.fetch_refspec(), "+refs/heads/*:refs/remotes/origin/*");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryRef {
    /// Remote name, used for remote-tracking refs
    pub name: String,

    /// Clone/fetch URL (anything the backend understands, including local paths)
    pub url: String,

    /// Explicit fetch refspec; defaults to all heads into remote-tracking refs
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refspec: Option<String>,
}

impl RepositoryRef {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            refspec: None,
        }
    }

    pub fn with_refspec(mut self, refspec: impl Into<String>) -> Self {
        self.refspec = Some(refspec.into());
        self
    }

    /// Refspec used for incremental fetches
    pub fn fetch_refspec(&self) -> String {
        match self.refspec.as_deref() {
            Some(spec) if !spec.trim().is_empty() => spec.trim().to_string(),
            _ => format!("+refs/heads/*:refs/remotes/{}/*", self.name),
        }
    }
}

/// Local directory mirroring one remote.
///
/// Every remote gets its own directory below a shared checkout root, so
/// remotes can be synced independently.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkingCopyHandle {
    path: PathBuf,
    remote: RepositoryRef,
}

impl WorkingCopyHandle {
    pub fn new(path: impl Into<PathBuf>, remote: RepositoryRef) -> Self {
        Self {
            path: path.into(),
            remote,
        }
    }

    /// Derive the working copy location for `remote` below `checkout_root`
    pub fn for_remote(checkout_root: &Path, remote: RepositoryRef) -> Self {
        let path = checkout_root.join(directory_name(&remote.name));
        Self { path, remote }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn remote(&self) -> &RepositoryRef {
        &self.remote
    }

    /// Whether something that looks like a git repository exists here
    pub fn exists(&self) -> bool {
        self.path.join(".git").exists()
    }
}

/// Map a remote name onto a single path component.
///
/// Bytes outside `[A-Za-z0-9_.-]`, a leading `.` and `%` itself are written
/// as `%XX`, so two different names never share a directory. The empty name
/// maps to a lone `%`.
fn directory_name(remote_name: &str) -> String {
    if remote_name.is_empty() {
        return "%".to_string();
    }

    let mut name = String::with_capacity(remote_name.len());
    for (position, byte) in remote_name.bytes().enumerate() {
        let keep = byte.is_ascii_alphanumeric()
            || matches!(byte, b'-' | b'_')
            || (byte == b'.' && position > 0);
        if keep {
            name.push(char::from(byte));
        } else {
            let _ = write!(name, "%{:02X}", byte);
        }
    }
    name
}

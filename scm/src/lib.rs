//! Git plumbing for revision catalogs
//!
//! Keeps a per-remote working copy current and reads revisions, tags and
//! commit metadata out of it.
//!
//! # Syncing and listing
//!
//! ```no_run
//! use scm::*;
//! use std::path::Path;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let backend = LibGitBackend::new();
//! let origin = RepositoryRef::new("origin", "https://example.com/app.git");
//! let handle = WorkingCopyHandle::for_remote(Path::new("/var/ws/.revpick"), origin);
//!
//! sync(&backend, &handle).await?;
//! for id in list_revisions(&backend, handle.path(), Some("main")).await? {
//!     let record = describe(&backend, handle.path(), &id).await;
//!     println!("{}", record.label());
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Backends
//!
//! [`LibGitBackend`] works in-process through libgit2; [`ProcessBackend`]
//! spawns the git executable found by [`GitToolLocator`]. Both implement
//! [`GitBackend`], which is the only thing sync and enumeration depend on.

pub mod backend;
pub mod enumerate;
pub mod libgit;
pub mod metadata;
pub mod process;
pub mod sync;
pub mod tool;
pub mod types;

pub use backend::{BackendError, BackendResult, GitBackend};
pub use enumerate::{list_revisions, list_tags, RepositoryStateError, RepositoryStateResult};
pub use libgit::LibGitBackend;
pub use metadata::{describe, parse_author_line, AuthorStamp, RevisionRecord};
pub use process::ProcessBackend;
pub use sync::{sync, SyncError, SyncOutcome, SyncResult, WorkingCopyLocks};
pub use tool::{GitInstallation, GitToolLocator};
pub use types::{RepositoryRef, WorkingCopyHandle};

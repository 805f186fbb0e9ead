//! Commit metadata and option labels
//!
//! A label reads `"<id> <author identity> <yyyy-mm-dd HH:MM>"`. Anything that
//! cannot be parsed out of the author line is left empty rather than failing,
//! so one odd commit never hides its siblings.

use crate::backend::GitBackend;
use chrono::DateTime;
use serde::Serialize;
use std::path::Path;
use tracing::warn;

/// Display pattern for commit timestamps (UTC, 24-hour clock)
pub const DATE_FORMAT: &str = "%Y-%m-%d %H:%M";

/// One enumerated commit, recomputed on every enumeration
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RevisionRecord {
    pub id: String,
    /// Raw `author ...` header line, if the commit had one
    pub author_line: Option<String>,
    pub epoch_seconds: Option<i64>,
}

impl RevisionRecord {
    pub fn new(id: impl Into<String>, author_line: Option<String>) -> Self {
        let epoch_seconds = author_line
            .as_deref()
            .and_then(|line| parse_author_line(line).epoch_seconds);
        Self {
            id: id.into(),
            author_line,
            epoch_seconds,
        }
    }

    /// `Name <email>` part of the author line, empty when unparseable
    pub fn identity(&self) -> String {
        self.author_line
            .as_deref()
            .map(|line| parse_author_line(line).identity)
            .unwrap_or_default()
    }

    /// Commit time as `yyyy-mm-dd HH:MM`, empty when unknown
    pub fn formatted_date(&self) -> String {
        self.epoch_seconds.and_then(format_epoch).unwrap_or_default()
    }

    pub fn label(&self) -> String {
        format!("{} {} {}", self.id, self.identity(), self.formatted_date())
    }
}

/// Fields recovered from an `author Name <email> <epoch> <tz>` line
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthorStamp {
    pub identity: String,
    pub epoch_seconds: Option<i64>,
}

/// Split an author (or committer) header line into identity and timestamp.
///
/// Never fails: without a closing `>` both fields are empty, and a
/// non-numeric timestamp only drops the date.
pub fn parse_author_line(line: &str) -> AuthorStamp {
    let Some((who, when)) = line.split_once('>') else {
        return AuthorStamp::default();
    };

    let who = who.strip_prefix("author ").unwrap_or(who);
    let who = who.strip_prefix("committer ").unwrap_or(who);
    let identity = format!("{}>", who);

    // "<epoch> +hhmm" or "<epoch> -hhmm"
    let when = when.trim();
    let seconds = if when.contains('+') {
        when.split('+').next()
    } else {
        when.split('-').next()
    };
    let epoch_seconds = seconds.and_then(|s| s.trim().parse::<i64>().ok());

    AuthorStamp {
        identity,
        epoch_seconds,
    }
}

/// Format seconds since the epoch with [`DATE_FORMAT`]
pub fn format_epoch(seconds: i64) -> Option<String> {
    DateTime::from_timestamp(seconds, 0).map(|instant| instant.format(DATE_FORMAT).to_string())
}

/// Look up one commit's author line.
///
/// Read failures are logged and degrade to a record without author data.
pub async fn describe(backend: &dyn GitBackend, working_dir: &Path, commit_id: &str) -> RevisionRecord {
    let author_line = match backend.show_revision(working_dir, commit_id).await {
        Ok(lines) => lines.into_iter().find(|line| line.starts_with("author")),
        Err(e) => {
            warn!(commit = commit_id, error = %e, "could not read commit metadata");
            None
        }
    };

    RevisionRecord::new(commit_id, author_line)
}

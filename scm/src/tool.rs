//! Git executable discovery

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A configured git installation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitInstallation {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exe: Option<PathBuf>,
}

impl GitInstallation {
    pub fn new(name: impl Into<String>, exe: Option<PathBuf>) -> Self {
        Self {
            name: name.into(),
            exe,
        }
    }
}

/// Resolves which git executable to run.
///
/// The first installation that names an executable wins; with none, the
/// platform default name is looked up on `PATH`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitToolLocator {
    #[serde(default)]
    pub installations: Vec<GitInstallation>,
}

impl GitToolLocator {
    pub fn new(installations: Vec<GitInstallation>) -> Self {
        Self { installations }
    }

    /// Executable name used when nothing is configured
    pub fn default_exe() -> &'static str {
        if cfg!(windows) {
            "git.exe"
        } else {
            "git"
        }
    }

    pub fn resolve(&self) -> PathBuf {
        self.installations
            .iter()
            .find_map(|installation| installation.exe.clone())
            .unwrap_or_else(|| PathBuf::from(Self::default_exe()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_when_unconfigured() {
        let locator = GitToolLocator::default();
        assert_eq!(locator.resolve(), PathBuf::from(GitToolLocator::default_exe()));
    }

    #[test]
    fn test_first_installation_with_exe_wins() {
        let locator = GitToolLocator::new(vec![
            GitInstallation::new("Bundled", None),
            GitInstallation::new("System", Some(PathBuf::from("/usr/bin/git"))),
            GitInstallation::new("Custom", Some(PathBuf::from("/opt/git/bin/git"))),
        ]);
        assert_eq!(locator.resolve(), PathBuf::from("/usr/bin/git"));
    }

    #[test]
    fn test_installations_without_exe_fall_back() {
        let locator = GitToolLocator::new(vec![GitInstallation::new("Default", None)]);
        assert_eq!(locator.resolve(), PathBuf::from(GitToolLocator::default_exe()));
    }
}

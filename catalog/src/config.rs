use serde::{Deserialize, Serialize};
use std::path::{Component, Path};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// Upper bound for one remote's sync + enumerate + describe run
    pub task_timeout: Duration,
    /// Directory below the job workspace holding one working copy per remote
    pub checkout_dir: String,
    /// How many remotes may be processed at the same time
    pub max_parallel_remotes: usize,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            task_timeout: Duration::from_secs(120),
            checkout_dir: ".revpick".to_string(),
            max_parallel_remotes: 4,
        }
    }
}

impl CatalogConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_task_timeout(mut self, timeout: Duration) -> Self {
        self.task_timeout = timeout;
        self
    }

    pub fn with_checkout_dir(mut self, dir: impl Into<String>) -> Self {
        self.checkout_dir = dir.into();
        self
    }

    pub fn with_max_parallel_remotes(mut self, max: usize) -> Self {
        self.max_parallel_remotes = max;
        self
    }

    /// Root of all working copies for a job workspace
    pub fn checkout_root(&self, workspace: &Path) -> std::path::PathBuf {
        workspace.join(&self.checkout_dir)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.task_timeout.is_zero() {
            return Err("Task timeout must be greater than 0".to_string());
        }

        if self.checkout_dir.trim().is_empty() {
            return Err("Checkout directory cannot be empty".to_string());
        }

        let dir = Path::new(&self.checkout_dir);
        if dir.is_absolute() {
            return Err("Checkout directory must be relative to the workspace".to_string());
        }

        if dir.components().any(|c| matches!(c, Component::ParentDir)) {
            return Err("Checkout directory must stay inside the workspace".to_string());
        }

        if self.max_parallel_remotes == 0 {
            return Err("Parallel remotes must be greater than 0".to_string());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = CatalogConfig::default();
        assert_eq!(config.task_timeout, Duration::from_secs(120));
        assert_eq!(config.checkout_dir, ".revpick");
        assert_eq!(config.max_parallel_remotes, 4);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_builder() {
        let config = CatalogConfig::new()
            .with_task_timeout(Duration::from_secs(30))
            .with_checkout_dir("git-params")
            .with_max_parallel_remotes(1);

        assert_eq!(config.task_timeout, Duration::from_secs(30));
        assert_eq!(
            config.checkout_root(Path::new("/var/ws")),
            Path::new("/var/ws/git-params")
        );
        assert_eq!(config.max_parallel_remotes, 1);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let mut config = CatalogConfig::default();

        config.task_timeout = Duration::from_secs(0);
        assert!(config.validate().is_err());

        config.task_timeout = Duration::from_secs(120);
        config.checkout_dir = "".to_string();
        assert!(config.validate().is_err());

        config.checkout_dir = "/absolute".to_string();
        assert!(config.validate().is_err());

        config.checkout_dir = "../outside".to_string();
        assert!(config.validate().is_err());

        config.checkout_dir = ".revpick".to_string();
        config.max_parallel_remotes = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_serialization() {
        let config = CatalogConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let deserialized: CatalogConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config.task_timeout, deserialized.task_timeout);
        assert_eq!(config.checkout_dir, deserialized.checkout_dir);
    }
}

//! The git parameter as configured on a job

use crate::mode::{Mode, ModeParseError};
use uuid::Uuid;

/// A job parameter whose choices come from the job's git remotes.
///
/// Two definitions are equal only when they are the same definition: the
/// identity is a random id assigned at construction, not the field values.
#[derive(Debug, Clone)]
pub struct ParameterDefinition {
    id: Uuid,
    pub name: String,
    pub description: String,
    pub mode: Mode,
    pub branch: Option<String>,
    default_value: Option<String>,
}

impl ParameterDefinition {
    pub fn new(name: impl Into<String>, mode: Mode) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            description: String::new(),
            mode,
            branch: None,
            default_value: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_branch(mut self, branch: impl Into<String>) -> Self {
        self.branch = Some(branch.into());
        self
    }

    pub fn with_default_value(mut self, value: impl Into<String>) -> Self {
        self.default_value = Some(value.into());
        self
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Change the mode from its configuration spelling.
    ///
    /// An unknown spelling leaves the current mode untouched.
    pub fn set_mode_str(&mut self, value: &str) -> Result<(), ModeParseError> {
        self.mode = value.parse()?;
        Ok(())
    }

    /// Branch to restrict revisions to, if one is set
    pub fn branch_filter(&self) -> Option<&str> {
        self.branch
            .as_deref()
            .map(str::trim)
            .filter(|branch| !branch.is_empty())
    }

    /// Value used when a build is started without a choice; blank counts as unset
    pub fn default_value(&self) -> Option<&str> {
        self.default_value
            .as_deref()
            .filter(|value| !value.trim().is_empty())
    }
}

impl PartialEq for ParameterDefinition {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ParameterDefinition {}

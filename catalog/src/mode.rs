use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// What a catalog lists
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Mode {
    /// Commit ids with author and date labels
    #[serde(rename = "PT_REVISION", alias = "revision")]
    Revision,
    /// Tag names
    #[serde(rename = "PT_TAG", alias = "tag")]
    Tag,
}

impl Mode {
    /// Configuration spelling of the mode
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Revision => "PT_REVISION",
            Mode::Tag => "PT_TAG",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown parameter type '{value}', expected PT_REVISION or PT_TAG")]
pub struct ModeParseError {
    pub value: String,
}

impl FromStr for Mode {
    type Err = ModeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = s.trim();
        if value.eq_ignore_ascii_case("PT_REVISION") || value.eq_ignore_ascii_case("revision") {
            Ok(Mode::Revision)
        } else if value.eq_ignore_ascii_case("PT_TAG") || value.eq_ignore_ascii_case("tag") {
            Ok(Mode::Tag)
        } else {
            Err(ModeParseError {
                value: s.to_string(),
            })
        }
    }
}

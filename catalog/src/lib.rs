pub mod builder;
pub mod catalog;
pub mod config;
pub mod context;
pub mod mode;
pub mod parameter;

pub use builder::{BuilderError, CatalogBuilder};
pub use catalog::{
    Catalog, CatalogEntry, ErrorState, RemoteFailure, RemoteTaskError, NO_CONTEXT_MESSAGE,
    NO_GIT_MESSAGE, NO_WORKSPACE_MESSAGE,
};
pub use config::CatalogConfig;
pub use context::{Job, JobContext, ScmConfig};
pub use mode::{Mode, ModeParseError};
pub use parameter::ParameterDefinition;

pub mod prelude {
    pub use crate::builder::*;
    pub use crate::catalog::*;
    pub use crate::config::*;
    pub use crate::context::*;
    pub use crate::mode::*;
    pub use crate::parameter::*;
}

pub mod job;
pub mod output;

pub use job::{BackendKind, JobFile, JobFileError};
pub use output::{render_failures, render_json, render_text, OutputFormat};

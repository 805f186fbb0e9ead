//! Rendering catalogs for the terminal

use catalog::{Catalog, Mode, ParameterDefinition};
use clap::ValueEnum;
use serde_json::{json, Value};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// One `key<TAB>label` line per entry
pub fn render_text(catalog: &Catalog) -> String {
    catalog
        .entries()
        .iter()
        .map(|entry| format!("{}\t{}\n", entry.key, entry.label))
        .collect()
}

/// Per-remote failures, one line each, for stderr
pub fn render_failures(catalog: &Catalog) -> String {
    catalog
        .failures()
        .iter()
        .map(|failure| format!("warning: remote '{}': {}\n", failure.remote, failure.error))
        .collect()
}

pub fn render_json(parameter: &ParameterDefinition, mode: Mode, catalog: &Catalog) -> Value {
    let failures: Vec<Value> = catalog
        .failures()
        .iter()
        .map(|failure| {
            json!({
                "remote": failure.remote,
                "error": failure.error.to_string(),
            })
        })
        .collect();

    json!({
        "parameter": parameter.name,
        "mode": mode,
        "entries": catalog.entries(),
        "error": catalog.error(),
        "failures": failures,
    })
}

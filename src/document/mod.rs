//! Document adapter: templates in, graph out, and back again
//!
//! Ingestion turns one or more templates (one per group) into nodes, edges,
//! and export registrations. Generation rebuilds a group's template from
//! whatever the graph holds at that moment, rewriting references that now
//! cross a group boundary into imports.

mod generate;
mod ingest;
mod template;

use crate::graph::GraphError;
use thiserror::Error;

pub use generate::generate;
pub use ingest::{ingest, ingest_document};
pub use template::{
    parse_template, read_template, render_template, write_template, DependsOn, Format, Output,
    OutputExport, Resource, Template, FORMAT_VERSION,
};

/// Errors that can occur while reading, ingesting, or writing documents
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Graph error: {0}")]
    Graph(#[from] GraphError),

    #[error("Unsupported document format: {0}")]
    UnsupportedFormat(String),

    #[error("Invalid template: {0}")]
    InvalidTemplate(String),
}

/// Result type for document operations
pub type DocumentResult<T> = Result<T, DocumentError>;

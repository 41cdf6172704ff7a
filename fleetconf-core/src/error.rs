//! Error types for fleetconf-core.

use std::path::PathBuf;

use thiserror::Error;

/// A document (workflow, dependabot file or patch spec) could not be decoded.
#[derive(Debug, Error)]
pub enum DocumentError {
    /// Not valid YAML, or valid YAML of the wrong shape for the typed model.
    #[error("failed to parse {name}: {source}")]
    Yaml {
        name: String,
        #[source]
        source: serde_yaml::Error,
    },

    /// JSON conversion failed (patched documents, schema checks).
    #[error("failed to convert {name}: {source}")]
    Json {
        name: String,
        #[source]
        source: serde_json::Error,
    },

    /// Structural schema violations, one message per violation.
    #[error("{name} does not match the {kind} schema:\n  - {}", .violations.join("\n  - "))]
    Schema {
        name: String,
        kind: &'static str,
        violations: Vec<String>,
    },

    /// The embedded schema itself failed to compile.
    #[error("schema compilation failed: {0}")]
    SchemaCompile(String),
}

/// Errors from discovering local templates under `.fleetconf/`.
#[derive(Debug, Error)]
pub enum StoreError {
    /// `<root>/.fleetconf/` does not exist.
    #[error("template directory not found at {path}")]
    NotFound { path: PathBuf },

    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A patch header (`filename:`) could not be read.
    #[error("invalid patch file {path}: {source}")]
    Patch {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// A patch and a template both claim the same remote file.
    #[error("{target} is targeted by both template {template} and patch {patch}")]
    Conflict {
        target: String,
        template: PathBuf,
        patch: PathBuf,
    },
}

/// Errors from loading `.fleetconf/config.yaml`.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("invalid config value for `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// `owner/name` could not be parsed.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid repository '{0}'; expected owner/name")]
pub struct RepositoryIdError(pub String);

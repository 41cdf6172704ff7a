//! The [`Document`] sum type: one variant per supported file kind.
//!
//! Conversions go through `serde_yaml::Value` / `serde_json::Value` so the
//! same typed model serves YAML files on disk, remote content and the JSON
//! form that patches operate on.

use std::fmt;

use serde_json::Value as J;

use crate::dependabot::Dependabot;
use crate::error::DocumentError;
use crate::schema;
use crate::workflow::Workflow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentKind {
    Workflow,
    Dependabot,
}

impl DocumentKind {
    pub fn as_str(self) -> &'static str {
        match self {
            DocumentKind::Workflow => "workflow",
            DocumentKind::Dependabot => "dependabot",
        }
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Document {
    Workflow(Workflow),
    Dependabot(Dependabot),
}

impl Document {
    pub fn kind(&self) -> DocumentKind {
        match self {
            Document::Workflow(_) => DocumentKind::Workflow,
            Document::Dependabot(_) => DocumentKind::Dependabot,
        }
    }

    /// Decode YAML text into the typed model for `kind`.
    ///
    /// `name` is only used for error context.
    pub fn parse(kind: DocumentKind, name: &str, text: &str) -> Result<Self, DocumentError> {
        let value: serde_yaml::Value = serde_yaml::from_str(text).map_err(|e| yaml_err(name, e))?;
        Self::from_yaml_value(kind, name, value)
    }

    /// Like [`Document::parse`], but the raw document must also pass the
    /// structural schema check for `kind` first.
    pub fn parse_validated(kind: DocumentKind, name: &str, text: &str) -> Result<Self, DocumentError> {
        let value: serde_yaml::Value = serde_yaml::from_str(text).map_err(|e| yaml_err(name, e))?;
        let json = serde_json::to_value(&value).map_err(|e| json_err(name, e))?;
        schema::validate(kind, name, &json)?;
        Self::from_yaml_value(kind, name, value)
    }

    /// The JSON form of `text` exactly as written, after checking that it
    /// decodes as `kind`.
    ///
    /// Unlike [`Document::to_json`], nothing is normalized: a one-entry list
    /// stays a list and key order is kept.
    pub fn raw_json(kind: DocumentKind, name: &str, text: &str) -> Result<J, DocumentError> {
        let value: serde_yaml::Value = serde_yaml::from_str(text).map_err(|e| yaml_err(name, e))?;
        let json = serde_json::to_value(&value).map_err(|e| json_err(name, e))?;
        Self::from_yaml_value(kind, name, value)?;
        Ok(json)
    }

    fn from_yaml_value(
        kind: DocumentKind,
        name: &str,
        value: serde_yaml::Value,
    ) -> Result<Self, DocumentError> {
        match kind {
            DocumentKind::Workflow => serde_yaml::from_value(value).map(Document::Workflow),
            DocumentKind::Dependabot => serde_yaml::from_value(value).map(Document::Dependabot),
        }
        .map_err(|e| yaml_err(name, e))
    }

    /// Decode the JSON form (the output of a patch) back into the typed model.
    pub fn from_json(kind: DocumentKind, name: &str, value: J) -> Result<Self, DocumentError> {
        match kind {
            DocumentKind::Workflow => serde_json::from_value(value).map(Document::Workflow),
            DocumentKind::Dependabot => serde_json::from_value(value).map(Document::Dependabot),
        }
        .map_err(|e| json_err(name, e))
    }

    pub fn to_json(&self) -> Result<J, DocumentError> {
        match self {
            Document::Workflow(wf) => serde_json::to_value(wf),
            Document::Dependabot(db) => serde_json::to_value(db),
        }
        .map_err(|e| json_err(self.kind().as_str(), e))
    }

    pub fn to_yaml(&self) -> Result<String, DocumentError> {
        match self {
            Document::Workflow(wf) => serde_yaml::to_string(wf),
            Document::Dependabot(db) => serde_yaml::to_string(db),
        }
        .map_err(|e| yaml_err(self.kind().as_str(), e))
    }
}

impl From<Workflow> for Document {
    fn from(wf: Workflow) -> Self {
        Document::Workflow(wf)
    }
}

impl From<Dependabot> for Document {
    fn from(db: Dependabot) -> Self {
        Document::Dependabot(db)
    }
}

fn yaml_err(name: &str, source: serde_yaml::Error) -> DocumentError {
    DocumentError::Yaml { name: name.to_string(), source }
}

fn json_err(name: &str, source: serde_json::Error) -> DocumentError {
    DocumentError::Json { name: name.to_string(), source }
}

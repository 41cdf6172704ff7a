//! Structural JSON-schema checks for rendered templates.
//!
//! The schemas are embedded at compile time and compiled once per process.

use std::sync::OnceLock;

use jsonschema::{Draft, JSONSchema};
use serde_json::Value as J;

use crate::document::DocumentKind;
use crate::error::DocumentError;

const WORKFLOW_SCHEMA: &str = include_str!("schemas/workflow.schema.json");
const DEPENDABOT_SCHEMA: &str = include_str!("schemas/dependabot.schema.json");

type Compiled = Result<JSONSchema, String>;

fn compile(source: &str) -> Compiled {
    let schema: J = serde_json::from_str(source).map_err(|e| e.to_string())?;
    JSONSchema::options()
        .with_draft(Draft::Draft7)
        .compile(&schema)
        .map_err(|e| e.to_string())
}

fn compiled(kind: DocumentKind) -> &'static Compiled {
    static WORKFLOW: OnceLock<Compiled> = OnceLock::new();
    static DEPENDABOT: OnceLock<Compiled> = OnceLock::new();
    match kind {
        DocumentKind::Workflow => WORKFLOW.get_or_init(|| compile(WORKFLOW_SCHEMA)),
        DocumentKind::Dependabot => DEPENDABOT.get_or_init(|| compile(DEPENDABOT_SCHEMA)),
    }
}

/// Validate a decoded document against the schema for `kind`.
pub fn validate(kind: DocumentKind, name: &str, value: &J) -> Result<(), DocumentError> {
    let validator = compiled(kind)
        .as_ref()
        .map_err(|e| DocumentError::SchemaCompile(e.clone()))?;

    if let Err(errors) = validator.validate(value) {
        let violations = errors
            .map(|e| {
                let at = e.instance_path.to_string();
                if at.is_empty() {
                    e.to_string()
                } else {
                    format!("{at}: {e}")
                }
            })
            .collect();
        return Err(DocumentError::Schema {
            name: name.to_string(),
            kind: kind.as_str(),
            violations,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn embedded_schemas_compile() {
        assert!(compiled(DocumentKind::Workflow).is_ok());
        assert!(compiled(DocumentKind::Dependabot).is_ok());
    }

    #[test]
    fn workflow_without_jobs_is_rejected() {
        let err = validate(DocumentKind::Workflow, "ci.yml", &json!({ "on": "push" })).unwrap_err();
        assert!(matches!(err, DocumentError::Schema { ref violations, .. } if !violations.is_empty()));
    }

    #[test]
    fn step_with_uses_and_run_is_rejected() {
        let wf = json!({
            "on": "push",
            "jobs": { "build": { "runs-on": "ubuntu-latest", "steps": [{ "uses": "a@v1", "run": "b" }] } }
        });
        let err = validate(DocumentKind::Workflow, "ci.yml", &wf).unwrap_err();
        assert!(err.to_string().contains("/jobs/build/steps/0"), "{err}");
    }

    #[test]
    fn dependabot_requires_version_two() {
        let doc = json!({ "version": 1, "updates": [] });
        assert!(validate(DocumentKind::Dependabot, "dependabot.yml", &doc).is_err());
    }
}

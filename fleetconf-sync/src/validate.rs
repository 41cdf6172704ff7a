//! Offline template check: render every template against one repository and
//! decode the result, without contacting the provider.

use fleetconf_core::{Document, DocumentKind, RepositoryInfo, RunConfig, TemplateStore};
use fleetconf_merge::PatchSpec;
use fleetconf_renderer::{TemplateEngine, TemplateVars};

use crate::error::FileError;

#[derive(Debug)]
pub struct ValidationResult {
    /// Template file name.
    pub name: String,
    /// `workflow`, `patch`, `health` or `dependabot`.
    pub kind: &'static str,
    pub error: Option<FileError>,
}

impl ValidationResult {
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// One result per template, in pipeline order.
pub fn validate_store(
    engine: &TemplateEngine,
    store: &TemplateStore,
    config: &RunConfig,
    repo: &RepositoryInfo,
) -> Vec<ValidationResult> {
    let vars = TemplateVars::for_repository(repo, &config.base_branch, &config.vars);
    let mut results = Vec::with_capacity(store.len());

    for t in &store.workflows {
        let checked = engine
            .render(&t.name, &t.source, &vars)
            .map_err(FileError::from)
            .and_then(|text| {
                Document::parse_validated(DocumentKind::Workflow, &t.name, &text)
                    .map_err(FileError::from)
            });
        results.push(result(&t.name, "workflow", checked));
    }

    for p in &store.patches {
        let checked = engine
            .render(&p.name, &p.source, &vars)
            .map_err(FileError::from)
            .and_then(|text| PatchSpec::parse(&p.name, &text).map_err(FileError::from));
        results.push(result(&p.name, "patch", checked));
    }

    for t in &store.health {
        let checked = engine.render(&t.name, &t.source, &vars).map_err(FileError::from);
        results.push(result(&t.name, "health", checked));
    }

    if let Some(t) = &store.dependabot {
        let checked = engine
            .render(&t.name, &t.source, &vars)
            .map_err(FileError::from)
            .and_then(|text| {
                Document::parse_validated(DocumentKind::Dependabot, &t.name, &text)
                    .map_err(FileError::from)
            });
        results.push(result(&t.name, "dependabot", checked));
    }

    results
}

fn result<T>(name: &str, kind: &'static str, checked: Result<T, FileError>) -> ValidationResult {
    if let Err(e) = &checked {
        tracing::debug!(file = %name, error = %e, "template failed validation");
    }
    ValidationResult {
        name: name.to_string(),
        kind,
        error: checked.err(),
    }
}

//! Error types for fleetconf-renderer.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RenderError {
    /// A template failed to parse or render (syntax error, undefined variable, ...).
    #[error("failed to render {name}: {source}")]
    Template {
        name: String,
        #[source]
        source: minijinja::Error,
    },

    /// The delimiter configuration was rejected.
    #[error("invalid template syntax configuration: {0}")]
    Syntax(#[source] minijinja::Error),
}

//! minijinja engine configured for CI templates.
//!
//! # Syntax
//!
//! | Construct  | Delimiters      |
//! |------------|-----------------|
//! | Expression | `$((` … `))`    |
//! | Block      | `$(%` … `%)`    |
//! | Comment    | `$(#` … `#)`    |
//!
//! GitHub's own `${{ … }}` expressions are plain text to the engine and pass
//! through untouched. Undefined variables are errors, not empty strings.

use minijinja::syntax::SyntaxConfig;
use minijinja::{Environment, UndefinedBehavior};

use crate::context::TemplateVars;
use crate::error::RenderError;

/// Renders template text against [`TemplateVars`].
///
/// Build once and share; rendering takes `&self`.
pub struct TemplateEngine {
    env: Environment<'static>,
}

impl TemplateEngine {
    pub fn new() -> Result<Self, RenderError> {
        let syntax = SyntaxConfig::builder()
            .block_delimiters("$(%", "%)")
            .variable_delimiters("$((", "))")
            .comment_delimiters("$(#", "#)")
            .build()
            .map_err(RenderError::Syntax)?;

        let mut env = Environment::new();
        env.set_syntax(syntax);
        env.set_undefined_behavior(UndefinedBehavior::Strict);
        env.set_keep_trailing_newline(true);
        Ok(TemplateEngine { env })
    }

    /// Render `source`; `name` only labels errors.
    ///
    /// Output line endings are normalised to LF.
    pub fn render(&self, name: &str, source: &str, vars: &TemplateVars) -> Result<String, RenderError> {
        let rendered = self
            .env
            .render_named_str(name, source, vars)
            .map_err(|e| RenderError::Template { name: name.to_string(), source: e })?;
        Ok(rendered.replace("\r\n", "\n"))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

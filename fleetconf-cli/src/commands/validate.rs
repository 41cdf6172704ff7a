//! `fleetconf validate`: render and check every template without network access.

use std::path::Path;

use anyhow::{bail, Context, Result};
use clap::Args;
use colored::Colorize;

use fleetconf_core::{store, RepositoryId, RepositoryInfo};
use fleetconf_renderer::TemplateEngine;
use fleetconf_sync::validate_store;

/// Arguments for `fleetconf validate`.
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Repository the templates are rendered for.
    #[arg(long = "as", value_name = "OWNER/NAME", default_value = "example/repository")]
    pub as_repo: RepositoryId,
}

impl ValidateArgs {
    pub fn run(self, dir: &Path) -> Result<()> {
        let config = super::load_config(dir)?;
        config.validate().context("invalid configuration")?;
        let templates = store::discover_at(dir).context("failed to discover templates")?;
        let engine = TemplateEngine::new().context("failed to configure template engine")?;

        let repo = RepositoryInfo::synthetic(self.as_repo);
        let results = validate_store(&engine, &templates, &config, &repo);
        if results.is_empty() {
            println!("No templates in {}", store::store_dir_at(dir).display());
            return Ok(());
        }

        let mut failed = 0;
        for r in &results {
            match &r.error {
                None => println!("{} {} ({})", "✓".green(), r.name, r.kind),
                Some(e) => {
                    failed += 1;
                    println!("{} {} ({}): {e}", "✗".red(), r.name, r.kind);
                }
            }
        }

        if failed > 0 {
            bail!("{failed} of {} templates failed validation", results.len());
        }
        println!("{} templates valid", results.len());
        Ok(())
    }
}

//! fleetconf: keep CI workflow and dependabot configuration in sync across
//! a fleet of repositories.
//!
//! # Usage
//!
//! ```text
//! fleetconf sync [--repo owner/name ...] [--query q] [--base-branch b] [--direct]
//!                [--concurrency n] [--dry-run] [--diff]
//! fleetconf validate [--as owner/name]
//! fleetconf repos [--query q] [--json]
//! ```
//!
//! Templates are read from `<dir>/.fleetconf/`. `GITHUB_TOKEN` authenticates
//! `sync` and `repos`; `FLEETCONF_API_URL` points them at GitHub Enterprise.

mod commands;

use std::path::PathBuf;

use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand};

use commands::{repos::ReposArgs, sync::SyncArgs, validate::ValidateArgs};

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "fleetconf",
    version,
    about = "Synchronize .github configuration across many repositories",
    long_about = None,
)]
struct Cli {
    /// Directory containing `.fleetconf/`.
    #[arg(short = 'C', long = "dir", global = true, default_value = ".")]
    dir: PathBuf,

    /// Increase log verbosity (-v debug, -vv trace). `RUST_LOG` takes precedence.
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Reconcile templates with remote repositories and write the result.
    Sync(SyncArgs),

    /// Render and check every template offline.
    Validate(ValidateArgs),

    /// List the repositories a sync would select.
    Repos(ReposArgs),
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    match cli.command {
        Commands::Sync(args) => args.run(&cli.dir),
        Commands::Validate(args) => args.run(&cli.dir),
        Commands::Repos(args) => args.run(&cli.dir),
    }
}

/// Logs go to stderr so tables on stdout stay clean.
fn init_tracing(verbose: u8) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

//! Dry-run debug file.
//!
//! One aggregate YAML stream, written to `<root>/fleetconf-debug.yml`:
//!
//! ```text
//! # Repository: octo/widgets, File: .github/workflows/ci.yml
//! name: CI
//! ...
//! ---
//! ```

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use crate::error::{io_err, SyncError};
use crate::orchestrator::RunReport;

pub const DEBUG_FILE: &str = "fleetconf-debug.yml";

/// `<root>/fleetconf-debug.yml`
pub fn debug_path_at(root: &Path) -> PathBuf {
    root.join(DEBUG_FILE)
}

/// Changed files of every prepared repository, sorted by repository.
pub fn render_debug(report: &RunReport) -> String {
    let mut out = String::new();
    let mut updates: Vec<_> = report.prepared().collect();
    updates.sort_by(|a, b| a.repo.id.cmp(&b.repo.id));

    for update in updates {
        for file in update.changed_files() {
            let _ = writeln!(out, "# Repository: {}, File: {}", update.repo.id, file.path);
            out.push_str(&file.content);
            if !file.content.ends_with('\n') {
                out.push('\n');
            }
            out.push_str("---\n");
        }
    }
    out
}

/// Write the debug file, replacing any previous one.
pub fn write_debug_at(root: &Path, report: &RunReport) -> Result<PathBuf, SyncError> {
    let path = debug_path_at(root);
    std::fs::write(&path, render_debug(report)).map_err(|e| io_err(&path, e))?;
    tracing::info!("wrote {}", path.display());
    Ok(path)
}

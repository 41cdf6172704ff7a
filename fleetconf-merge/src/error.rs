//! Error types for fleetconf-merge.

use thiserror::Error;

use fleetconf_core::DocumentError;

/// A patch could not be applied. No partial result is ever produced.
#[derive(Debug, Error)]
pub enum PatchError {
    /// The rendered patch file is not a valid patch spec.
    #[error("invalid patch spec {name}: {source}")]
    Spec {
        name: String,
        #[source]
        source: serde_yaml::Error,
    },

    /// The target document could not be decoded before or after patching.
    #[error(transparent)]
    Document(#[from] DocumentError),

    /// Operation `index` (0-based) failed.
    #[error("patch operation #{index} ({op} {path}) failed: {reason}")]
    Operation {
        index: usize,
        op: &'static str,
        path: String,
        reason: String,
    },
}

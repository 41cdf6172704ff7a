//! # fleetconf-merge
//!
//! Field-policy merge of a remote document with a freshly rendered local one,
//! and atomic patch application.
//!
//! `local` expresses intent; `remote` supplies everything the template does
//! not mention. Merging is pure: inputs are borrowed, a new value is built,
//! and there is no error path.

pub mod dependabot;
pub mod error;
pub mod patch;
pub mod policy;
pub mod workflow;

use fleetconf_core::Document;

pub use error::PatchError;
pub use patch::{apply_ops, apply_patch, PatchOp, PatchSpec};
pub use workflow::{merge_steps, same_step};

/// Combine a remote value with a local one of the same type.
pub trait Merge: Sized {
    fn merge(remote: &Self, local: &Self) -> Self;
}

/// Merge two documents of any kind.
///
/// Mismatched kinds cannot be reconciled; the local document is returned.
pub fn merge(remote: &Document, local: &Document) -> Document {
    match (remote, local) {
        (Document::Workflow(r), Document::Workflow(l)) => Document::Workflow(Merge::merge(r, l)),
        (Document::Dependabot(r), Document::Dependabot(l)) => {
            Document::Dependabot(Merge::merge(r, l))
        }
        (_, local) => {
            tracing::warn!(
                remote = %remote.kind(),
                local = %local.kind(),
                "document kinds differ, keeping local"
            );
            local.clone()
        }
    }
}

//! JSON-patch style operations over a document's JSON form.
//!
//! Patch spec files look like:
//!
//! ```yaml
//! filename: ci.yml
//! patch:
//!   - op: replace
//!     path: /jobs/build/runs-on
//!     value: ubuntu-22.04
//!   - op: remove
//!     path: /jobs/build/steps/2
//! ```
//!
//! Operations run in order on a private copy. The first failing operation
//! aborts the whole application and nothing from the copy escapes.

use serde::{Deserialize, Serialize};
use serde_json::Value as J;

use fleetconf_core::{Document, DocumentKind};

use crate::error::PatchError;

/// A decoded patch file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatchSpec {
    pub filename: String,
    #[serde(default)]
    pub patch: Vec<PatchOp>,
}

impl PatchSpec {
    /// Decode rendered patch text.
    pub fn parse(name: &str, text: &str) -> Result<Self, PatchError> {
        serde_yaml::from_str(text).map_err(|e| PatchError::Spec { name: name.to_string(), source: e })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "lowercase")]
pub enum PatchOp {
    Add { path: String, value: J },
    Remove { path: String },
    Replace { path: String, value: J },
    Test { path: String, value: J },
    Move { from: String, path: String },
    Copy { from: String, path: String },
}

impl PatchOp {
    pub fn name(&self) -> &'static str {
        match self {
            PatchOp::Add { .. } => "add",
            PatchOp::Remove { .. } => "remove",
            PatchOp::Replace { .. } => "replace",
            PatchOp::Test { .. } => "test",
            PatchOp::Move { .. } => "move",
            PatchOp::Copy { .. } => "copy",
        }
    }

    pub fn path(&self) -> &str {
        match self {
            PatchOp::Add { path, .. }
            | PatchOp::Remove { path }
            | PatchOp::Replace { path, .. }
            | PatchOp::Test { path, .. }
            | PatchOp::Move { path, .. }
            | PatchOp::Copy { path, .. } => path,
        }
    }
}

// ---------------------------------------------------------------------------
// Entry points
// ---------------------------------------------------------------------------

/// Apply the rendered patch spec to `remote_text` as written, and decode
/// the result into the typed model for `kind`.
///
/// Paths address the remote file's own shape (`needs: [build]` is a list
/// even with one entry). `remote_text` is never modified; on error no
/// partial document exists.
pub fn apply_patch(
    kind: DocumentKind,
    name: &str,
    remote_text: &str,
    rendered_patch: &str,
) -> Result<Document, PatchError> {
    let spec = PatchSpec::parse(name, rendered_patch)?;
    let remote = Document::raw_json(kind, name, remote_text)?;
    let patched = apply_ops(&remote, &spec.patch)?;
    Ok(Document::from_json(kind, name, patched)?)
}

/// Apply `ops` in order to a copy of `doc`.
pub fn apply_ops(doc: &J, ops: &[PatchOp]) -> Result<J, PatchError> {
    let mut work = doc.clone();
    for (index, op) in ops.iter().enumerate() {
        apply_one(&mut work, op).map_err(|reason| PatchError::Operation {
            index,
            op: op.name(),
            path: op.path().to_string(),
            reason,
        })?;
    }
    Ok(work)
}

fn apply_one(doc: &mut J, op: &PatchOp) -> Result<(), String> {
    match op {
        PatchOp::Add { path, value } => add(doc, path, value.clone()),
        PatchOp::Remove { path } => remove(doc, path).map(drop),
        PatchOp::Replace { path, value } => {
            let target = doc.pointer_mut(path).ok_or_else(|| missing(path))?;
            *target = value.clone();
            Ok(())
        }
        PatchOp::Test { path, value } => match doc.pointer(path) {
            Some(actual) if actual == value => Ok(()),
            Some(actual) => Err(format!("expected {value}, found {actual}")),
            None => Err(missing(path)),
        },
        PatchOp::Move { from, path } => {
            if path.starts_with(&format!("{from}/")) {
                return Err(format!("cannot move {from} into its own child"));
            }
            let value = remove(doc, from)?;
            add(doc, path, value)
        }
        PatchOp::Copy { from, path } => {
            let value = doc.pointer(from).cloned().ok_or_else(|| missing(from))?;
            add(doc, path, value)
        }
    }
}

// ---------------------------------------------------------------------------
// Pointer helpers
// ---------------------------------------------------------------------------

fn missing(path: &str) -> String {
    format!("path {path:?} does not exist")
}

/// Split `/a/b~1c` into (`/a`, `b/c`). The root pointer has no parent.
fn split(path: &str) -> Result<(&str, String), String> {
    if !path.starts_with('/') {
        return Err(format!("invalid JSON pointer {path:?}"));
    }
    let (parent, token) = path.rsplit_once('/').unwrap_or(("", path));
    Ok((parent, token.replace("~1", "/").replace("~0", "~")))
}

fn array_index(token: &str, len: usize, allow_end: bool) -> Result<usize, String> {
    if token.len() > 1 && token.starts_with('0') {
        return Err(format!("invalid array index {token:?}"));
    }
    let index: usize = token.parse().map_err(|_| format!("invalid array index {token:?}"))?;
    let limit = if allow_end { len } else { len.saturating_sub(1) };
    if index > limit || (!allow_end && len == 0) {
        return Err(format!("array index {index} out of bounds (length {len})"));
    }
    Ok(index)
}

fn add(doc: &mut J, path: &str, value: J) -> Result<(), String> {
    if path.is_empty() {
        *doc = value;
        return Ok(());
    }
    let (parent, token) = split(path)?;
    match doc.pointer_mut(parent).ok_or_else(|| missing(parent))? {
        J::Object(map) => {
            map.insert(token, value);
            Ok(())
        }
        J::Array(items) if token == "-" => {
            items.push(value);
            Ok(())
        }
        J::Array(items) => {
            let index = array_index(&token, items.len(), true)?;
            items.insert(index, value);
            Ok(())
        }
        other => Err(format!("cannot add to {} at {parent:?}", type_name(other))),
    }
}

fn remove(doc: &mut J, path: &str) -> Result<J, String> {
    if path.is_empty() {
        return Err("cannot remove the document root".to_string());
    }
    let (parent, token) = split(path)?;
    match doc.pointer_mut(parent).ok_or_else(|| missing(parent))? {
        J::Object(map) => map.remove(&token).ok_or_else(|| missing(path)),
        J::Array(items) => {
            let index = array_index(&token, items.len(), false)?;
            Ok(items.remove(index))
        }
        other => Err(format!("cannot remove from {} at {parent:?}", type_name(other))),
    }
}

fn type_name(value: &J) -> &'static str {
    match value {
        J::Null => "null",
        J::Bool(_) => "a boolean",
        J::Number(_) => "a number",
        J::String(_) => "a string",
        J::Array(_) => "an array",
        J::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use serde_json::json;

    use super::*;

    fn doc() -> J {
        json!({ "jobs": { "build": { "runs-on": "ubuntu-latest", "steps": [{ "run": "a" }, { "run": "b" }] } } })
    }

    fn ops(yaml: &str) -> Vec<PatchOp> {
        serde_yaml::from_str(yaml).unwrap()
    }

    #[rstest]
    #[case::replace(
        "- {op: replace, path: /jobs/build/runs-on, value: macos-latest}",
        "/jobs/build/runs-on",
        json!("macos-latest")
    )]
    #[case::add_to_end("- {op: add, path: /jobs/build/steps/-, value: {run: c}}", "/jobs/build/steps/2", json!({"run": "c"}))]
    #[case::add_at_index("- {op: add, path: /jobs/build/steps/0, value: {run: z}}", "/jobs/build/steps/1", json!({"run": "a"}))]
    #[case::remove("- {op: remove, path: /jobs/build/steps/0}", "/jobs/build/steps/0", json!({"run": "b"}))]
    #[case::copy("- {op: copy, from: /jobs/build, path: /jobs/test}", "/jobs/test/runs-on", json!("ubuntu-latest"))]
    #[case::move_key("- {op: move, from: /jobs/build, path: /jobs/check}", "/jobs/check/steps/1/run", json!("b"))]
    #[case::escaped("- {op: add, path: /jobs/a~1b, value: 1}", "/jobs/a~1b", json!(1))]
    fn single_operations(#[case] patch: &str, #[case] pointer: &str, #[case] expected: J) {
        let out = apply_ops(&doc(), &ops(patch)).unwrap();
        assert_eq!(out.pointer(pointer), Some(&expected));
    }

    #[rstest]
    #[case::missing_parent("- {op: add, path: /nope/x, value: 1}")]
    #[case::missing_key("- {op: remove, path: /jobs/lint}")]
    #[case::replace_missing("- {op: replace, path: /jobs/lint, value: 1}")]
    #[case::bad_index("- {op: remove, path: /jobs/build/steps/9}")]
    #[case::leading_zero("- {op: add, path: /jobs/build/steps/01, value: 1}")]
    #[case::failed_test("- {op: test, path: /jobs/build/runs-on, value: windows-latest}")]
    #[case::into_scalar("- {op: add, path: /jobs/build/runs-on/x, value: 1}")]
    #[case::move_into_child("- {op: move, from: /jobs, path: /jobs/build/x}")]
    fn failing_operations(#[case] patch: &str) {
        let err = apply_ops(&doc(), &ops(patch)).unwrap_err();
        assert!(matches!(err, PatchError::Operation { index: 0, .. }), "{err}");
    }

    #[test]
    fn failure_reports_the_failing_index() {
        let patch = "- {op: replace, path: /jobs/build/runs-on, value: x}\n- {op: remove, path: /missing}\n";
        match apply_ops(&doc(), &ops(patch)) {
            Err(PatchError::Operation { index, op, .. }) => {
                assert_eq!(index, 1);
                assert_eq!(op, "remove");
            }
            other => panic!("expected operation error, got {other:?}"),
        }
    }
}

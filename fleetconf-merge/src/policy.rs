//! The closed set of field strategies.
//!
//! Each `Merge` impl picks one of these per field. Nothing here inspects
//! types at runtime; a field's strategy is fixed by the impl that names it.
//!
//! | Strategy         | Function / impl              |
//! |------------------|------------------------------|
//! | Scalar           | [`scalar`], [`number`], [`present`], `impl Merge for Count` |
//! | Nested record    | [`nested`]                   |
//! | StringMap        | `impl Merge for StringMap`   |
//! | StringSet        | `impl Merge for StringSet` / `ScalarSet` |
//! | KeyedCollection  | [`keyed`], [`keyed_by`]      |
//! | Record union     | [`record_union`]             |
//! | Flag (OR)        | `impl Merge for Flag`        |

use std::collections::BTreeMap;

use fleetconf_core::{Count, Flag, ScalarSet, StringMap, StringSet};

use crate::Merge;

// ---------------------------------------------------------------------------
// Scalars
// ---------------------------------------------------------------------------

/// Local wins when non-empty.
pub fn scalar(remote: &str, local: &str) -> String {
    if local.is_empty() { remote } else { local }.to_string()
}

/// Local wins when non-zero.
pub fn number(remote: u32, local: u32) -> u32 {
    if local == 0 {
        remote
    } else {
        local
    }
}

/// Local wins when set to anything but `0`, expressions included.
impl Merge for Count {
    fn merge(remote: &Self, local: &Self) -> Self {
        if local.is_unset() { remote } else { local }.clone()
    }
}

/// Local wins when present, even if the value itself is zero or false.
pub fn present<T: Clone>(remote: &Option<T>, local: &Option<T>) -> Option<T> {
    local.as_ref().or(remote.as_ref()).cloned()
}

/// Merge recursively when both sides are present, otherwise take whichever is.
pub fn nested<T: Merge + Clone>(remote: &Option<T>, local: &Option<T>) -> Option<T> {
    match (remote, local) {
        (Some(r), Some(l)) => Some(T::merge(r, l)),
        (r, l) => present(r, l),
    }
}

// ---------------------------------------------------------------------------
// Maps and sets
// ---------------------------------------------------------------------------

impl Merge for StringMap {
    fn merge(remote: &Self, local: &Self) -> Self {
        let mut out = remote.0.clone();
        out.extend(local.0.iter().map(|(k, v)| (k.clone(), v.clone())));
        StringMap(out)
    }
}

/// Sorted, de-duplicated union.
pub fn union(remote: &[String], local: &[String]) -> Vec<String> {
    let mut out: Vec<String> = remote.iter().chain(local).cloned().collect();
    out.sort();
    out.dedup();
    out
}

impl Merge for StringSet {
    fn merge(remote: &Self, local: &Self) -> Self {
        StringSet(union(&remote.0, &local.0))
    }
}

impl Merge for ScalarSet {
    fn merge(remote: &Self, local: &Self) -> Self {
        ScalarSet(union(&remote.0, &local.0))
    }
}

impl Merge for Flag {
    /// `true` on either side wins; otherwise a local expression beats the remote value.
    fn merge(remote: &Self, local: &Self) -> Self {
        if remote.is_true() || local.is_true() {
            Flag::Bool(true)
        } else if local.is_unset() {
            remote.clone()
        } else {
            local.clone()
        }
    }
}

// ---------------------------------------------------------------------------
// Collections
// ---------------------------------------------------------------------------

/// Output keys are exactly `local`'s keys; entries also present remotely are merged.
pub fn keyed<T: Merge + Clone>(
    remote: &BTreeMap<String, T>,
    local: &BTreeMap<String, T>,
) -> BTreeMap<String, T> {
    local
        .iter()
        .map(|(key, l)| {
            let merged = match remote.get(key) {
                Some(r) => T::merge(r, l),
                None => l.clone(),
            };
            (key.clone(), merged)
        })
        .collect()
}

/// [`keyed`] for lists whose elements carry their own key. Output keeps `local`'s order.
pub fn keyed_by<T, K>(remote: &[T], local: &[T], key: impl Fn(&T) -> K) -> Vec<T>
where
    T: Merge + Clone,
    K: PartialEq,
{
    local
        .iter()
        .map(|l| match remote.iter().find(|r| key(r) == key(l)) {
            Some(r) => T::merge(r, l),
            None => l.clone(),
        })
        .collect()
}

/// Local records first, then remote records not structurally equal to any already kept.
pub fn record_union<T: PartialEq + Clone>(remote: &[T], local: &[T]) -> Vec<T> {
    let mut out: Vec<T> = Vec::with_capacity(local.len() + remote.len());
    for item in local.iter().chain(remote) {
        if !out.contains(item) {
            out.push(item.clone());
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use serde_yaml::Value;

    use super::*;

    #[test]
    fn scalars_prefer_local_when_set() {
        assert_eq!(scalar("remote", "local"), "local");
        assert_eq!(scalar("remote", ""), "remote");
        assert_eq!(number(10, 0), 10);
        assert_eq!(number(10, 5), 5);
        assert_eq!(present(&Some(5), &Some(0)), Some(0));
        assert_eq!(present(&Some(5), &None), Some(5));
    }

    #[test]
    fn counts_prefer_local_expressions_and_numbers() {
        let expr = Count::from("${{ inputs.timeout }}");
        assert_eq!(Count::merge(&Count::Number(10), &Count::Number(0)), Count::Number(10));
        assert_eq!(Count::merge(&Count::Number(10), &expr), expr);
        assert_eq!(Count::merge(&expr, &Count::Number(0)), expr);
        assert_eq!(Count::merge(&expr, &Count::Number(5)), Count::Number(5));
    }

    #[test]
    fn string_map_keeps_remote_only_keys() {
        let remote: StringMap = [("A", "1"), ("B", "2")].into_iter().collect();
        let local: StringMap = [("B", "3"), ("C", "4")].into_iter().collect();
        let merged = StringMap::merge(&remote, &local);
        assert_eq!(merged.get("A"), Some(&Value::from("1")));
        assert_eq!(merged.get("B"), Some(&Value::from("3")));
        assert_eq!(merged.get("C"), Some(&Value::from("4")));
    }

    #[test]
    fn union_is_order_independent() {
        let a: StringSet = ["b", "a", "b"].into_iter().collect();
        let b: StringSet = ["c", "a"].into_iter().collect();
        assert_eq!(StringSet::merge(&a, &b), StringSet::merge(&b, &a));
        assert_eq!(StringSet::merge(&a, &b).0, ["a", "b", "c"]);
    }

    #[test]
    fn flag_is_or_with_local_expressions() {
        let expr = Flag::Expression("${{ matrix.experimental }}".into());
        assert_eq!(Flag::merge(&Flag::Bool(true), &Flag::Bool(false)), Flag::Bool(true));
        assert_eq!(Flag::merge(&Flag::Bool(false), &expr), expr);
        assert_eq!(Flag::merge(&expr, &Flag::Bool(false)), expr);
        assert_eq!(Flag::merge(&expr, &Flag::Bool(true)), Flag::Bool(true));
    }

    #[test]
    fn record_union_puts_local_first() {
        assert_eq!(record_union(&[1, 2, 3], &[3, 4]), vec![3, 4, 1, 2]);
    }
}

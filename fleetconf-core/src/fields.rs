//! Field shapes shared by the workflow and dependabot document models.
//!
//! | Type        | YAML shape                          | Notes                                   |
//! |-------------|-------------------------------------|-----------------------------------------|
//! | [`StringMap`] | mapping of key → any value        | values kept verbatim, never coerced     |
//! | [`StringSet`] | scalar or sequence of scalars     | always written back as a sequence       |
//! | [`ScalarSet`] | scalar or sequence of scalars     | a single entry is written as a scalar   |
//!
//! Empty values are omitted on output, so a document that round-trips through
//! the model keeps the same set of keys it was read with.

use std::collections::BTreeMap;
use std::fmt;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_yaml::Value;

// ---------------------------------------------------------------------------
// StringMap
// ---------------------------------------------------------------------------

/// Ordered key → value map (`env`, `with`, `outputs`, extension keys).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StringMap(pub BTreeMap<String, Value>);

impl StringMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(key.into(), value.into())
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.0.keys()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for StringMap {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

// ---------------------------------------------------------------------------
// StringSet / ScalarSet
// ---------------------------------------------------------------------------

/// Unordered set of strings. Input order is preserved until a merge sorts it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StringSet(pub Vec<String>);

/// Like [`StringSet`], but a single entry serializes as a bare scalar
/// (`needs: build`, `target-branch: develop`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScalarSet(pub Vec<String>);

macro_rules! string_set_impls {
    ($ty:ident) => {
        impl $ty {
            pub fn is_empty(&self) -> bool {
                self.0.is_empty()
            }

            pub fn len(&self) -> usize {
                self.0.len()
            }

            pub fn iter(&self) -> std::slice::Iter<'_, String> {
                self.0.iter()
            }

            pub fn contains(&self, item: &str) -> bool {
                self.0.iter().any(|s| s == item)
            }
        }

        impl<S: Into<String>> FromIterator<S> for $ty {
            fn from_iter<T: IntoIterator<Item = S>>(iter: T) -> Self {
                Self(iter.into_iter().map(Into::into).collect())
            }
        }

        impl<'de> Deserialize<'de> for $ty {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let value = Value::deserialize(deserializer)?;
                scalars(value).map(Self).map_err(D::Error::custom)
            }
        }
    };
}

string_set_impls!(StringSet);
string_set_impls!(ScalarSet);

impl Serialize for StringSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.serialize(serializer)
    }
}

impl Serialize for ScalarSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.0.as_slice() {
            [single] => serializer.serialize_str(single),
            many => many.serialize(serializer),
        }
    }
}

fn scalars(value: Value) -> Result<Vec<String>, String> {
    match value {
        Value::Null => Ok(vec![]),
        Value::Sequence(items) => items
            .into_iter()
            .map(|item| scalar_text(&item).ok_or_else(|| unexpected(&item)))
            .collect(),
        other => scalar_text(&other).map(|s| vec![s]).ok_or_else(|| unexpected(&other)),
    }
}

fn unexpected(value: &Value) -> String {
    format!("expected a string or a list of strings, found {}", ValueKind(value))
}

/// Textual form of a scalar YAML value; `None` for mappings, sequences and null.
pub fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Tagged(tagged) => scalar_text(&tagged.value),
        Value::Null | Value::Sequence(_) | Value::Mapping(_) => None,
    }
}

struct ValueKind<'a>(&'a Value);

impl fmt::Display for ValueKind<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.0 {
            Value::Null => "null",
            Value::Bool(_) => "a boolean",
            Value::Number(_) => "a number",
            Value::String(_) => "a string",
            Value::Sequence(_) => "a sequence",
            Value::Mapping(_) => "a mapping",
            Value::Tagged(_) => "a tagged value",
        };
        f.write_str(kind)
    }
}

// ---------------------------------------------------------------------------
// Flag
// ---------------------------------------------------------------------------

/// A boolean that may also be given as an expression (`continue-on-error`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Flag {
    Bool(bool),
    Expression(String),
}

impl Flag {
    /// Unset and explicitly `false` are the same thing on output.
    pub fn is_unset(&self) -> bool {
        matches!(self, Flag::Bool(false))
    }

    pub fn is_true(&self) -> bool {
        matches!(self, Flag::Bool(true))
    }
}

impl Default for Flag {
    fn default() -> Self {
        Flag::Bool(false)
    }
}

impl From<bool> for Flag {
    fn from(b: bool) -> Self {
        Flag::Bool(b)
    }
}

// ---------------------------------------------------------------------------
// Count
// ---------------------------------------------------------------------------

/// A non-negative number that may also be given as an expression
/// (`timeout-minutes`, `max-parallel`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Count {
    Number(u32),
    Expression(String),
}

impl Count {
    /// Unset and explicitly `0` are the same thing on output.
    pub fn is_unset(&self) -> bool {
        matches!(self, Count::Number(0))
    }
}

impl Default for Count {
    fn default() -> Self {
        Count::Number(0)
    }
}

impl From<u32> for Count {
    fn from(n: u32) -> Self {
        Count::Number(n)
    }
}

impl From<&str> for Count {
    fn from(expr: &str) -> Self {
        Count::Expression(expr.to_string())
    }
}

// ---------------------------------------------------------------------------
// Lenient scalar strings
// ---------------------------------------------------------------------------

/// Accepts any scalar for a string field (`name: 3`, `if: true`).
pub fn lenient_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    let value = Value::deserialize(deserializer)?;
    if value.is_null() {
        return Ok(String::new());
    }
    scalar_text(&value).ok_or_else(|| D::Error::custom(unexpected(&value)))
}

// ---------------------------------------------------------------------------
// Present-but-empty mappings
// ---------------------------------------------------------------------------

/// `push:` with no body is a present event, not an absent one.
///
/// Pair with `#[serde(default)]` so a missing key stays `None` while an
/// explicit null becomes `Some(T::default())`.
pub mod present {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn deserialize<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
    where
        D: Deserializer<'de>,
        T: Deserialize<'de> + Default,
    {
        Ok(Some(Option::<T>::deserialize(deserializer)?.unwrap_or_default()))
    }

    pub fn serialize<S, T>(value: &Option<T>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
        T: Serialize + Default + PartialEq,
    {
        match value {
            Some(inner) if *inner == T::default() => serializer.serialize_none(),
            Some(inner) => inner.serialize(serializer),
            None => serializer.serialize_none(),
        }
    }
}

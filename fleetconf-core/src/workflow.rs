//! Typed model of a CI workflow file (`.github/workflows/*.yml`).
//!
//! Only the keys the merge engine reasons about are modelled as fields.
//! Everything else (`permissions`, `concurrency`, `environment`, step
//! `shell`, ...) lands in an `extra` map and is carried through verbatim.

use std::collections::BTreeMap;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_yaml::Value;

use crate::fields::{lenient_string, present, Count, Flag, ScalarSet, StringMap, StringSet};

/// A whole workflow document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Workflow {
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "String::is_empty")]
    pub name: String,

    #[serde(default, deserialize_with = "triggers", skip_serializing_if = "Triggers::is_empty")]
    pub on: Triggers,

    #[serde(default, skip_serializing_if = "StringMap::is_empty")]
    pub env: StringMap,

    #[serde(default, skip_serializing_if = "Defaults::is_empty")]
    pub defaults: Defaults,

    #[serde(default)]
    pub jobs: BTreeMap<String, Job>,

    #[serde(flatten)]
    pub extra: StringMap,
}

// ---------------------------------------------------------------------------
// Triggers
// ---------------------------------------------------------------------------

/// The `on:` block.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Triggers {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub schedule: Vec<Schedule>,

    #[serde(
        default,
        deserialize_with = "present::deserialize",
        serialize_with = "present::serialize",
        skip_serializing_if = "Option::is_none"
    )]
    pub push: Option<RefFilter>,

    #[serde(
        default,
        deserialize_with = "present::deserialize",
        serialize_with = "present::serialize",
        skip_serializing_if = "Option::is_none"
    )]
    pub pull_request: Option<RefFilter>,

    #[serde(
        default,
        deserialize_with = "present::deserialize",
        serialize_with = "present::serialize",
        skip_serializing_if = "Option::is_none"
    )]
    pub release: Option<Release>,

    /// Any other event, keyed by name.
    #[serde(flatten)]
    pub extra: StringMap,
}

impl Triggers {
    pub fn is_empty(&self) -> bool {
        self.schedule.is_empty()
            && self.push.is_none()
            && self.pull_request.is_none()
            && self.release.is_none()
            && self.extra.is_empty()
    }

    /// Builds the mapping form from `on: push` / `on: [push, pull_request]`.
    pub fn from_events<S: AsRef<str>>(events: impl IntoIterator<Item = S>) -> Self {
        let mut triggers = Self::default();
        for event in events {
            match event.as_ref() {
                "push" => triggers.push = Some(RefFilter::default()),
                "pull_request" => triggers.pull_request = Some(RefFilter::default()),
                "release" => triggers.release = Some(Release::default()),
                other => {
                    triggers.extra.insert(other, Value::Null);
                }
            }
        }
        triggers
    }
}

fn triggers<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Triggers, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(Triggers::default()),
        Value::String(event) => Ok(Triggers::from_events([event])),
        Value::Sequence(events) => {
            let names = events
                .into_iter()
                .map(|e| match e {
                    Value::String(s) => Ok(s),
                    _ => Err(D::Error::custom("`on` list entries must be event names")),
                })
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Triggers::from_events(names))
        }
        mapping => serde_yaml::from_value(mapping).map_err(D::Error::custom),
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schedule {
    #[serde(default, deserialize_with = "lenient_string")]
    pub cron: String,
}

impl Schedule {
    pub fn new(cron: impl Into<String>) -> Self {
        Self { cron: cron.into() }
    }
}

/// Branch/tag/path allow- and deny-lists shared by `push` and `pull_request`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RefFilter {
    #[serde(default, skip_serializing_if = "StringSet::is_empty")]
    pub branches: StringSet,
    #[serde(default, skip_serializing_if = "StringSet::is_empty")]
    pub branches_ignore: StringSet,
    #[serde(default, skip_serializing_if = "StringSet::is_empty")]
    pub tags: StringSet,
    #[serde(default, skip_serializing_if = "StringSet::is_empty")]
    pub tags_ignore: StringSet,
    #[serde(default, skip_serializing_if = "StringSet::is_empty")]
    pub paths: StringSet,
    #[serde(default, skip_serializing_if = "StringSet::is_empty")]
    pub paths_ignore: StringSet,
    #[serde(default, skip_serializing_if = "StringSet::is_empty")]
    pub types: StringSet,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Release {
    #[serde(default, skip_serializing_if = "StringSet::is_empty")]
    pub types: StringSet,
}

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Defaults {
    #[serde(default, skip_serializing_if = "RunDefaults::is_empty")]
    pub run: RunDefaults,
}

impl Defaults {
    pub fn is_empty(&self) -> bool {
        self.run.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RunDefaults {
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "String::is_empty")]
    pub shell: String,
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "String::is_empty")]
    pub working_directory: String,
}

impl RunDefaults {
    pub fn is_empty(&self) -> bool {
        self.shell.is_empty() && self.working_directory.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Jobs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Job {
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "String::is_empty")]
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub runs_on: Option<RunsOn>,

    #[serde(default, skip_serializing_if = "ScalarSet::is_empty")]
    pub needs: ScalarSet,

    #[serde(
        default,
        rename = "if",
        deserialize_with = "lenient_string",
        skip_serializing_if = "String::is_empty"
    )]
    pub condition: String,

    #[serde(default, skip_serializing_if = "StringMap::is_empty")]
    pub env: StringMap,

    #[serde(default, skip_serializing_if = "StringMap::is_empty")]
    pub outputs: StringMap,

    #[serde(default, skip_serializing_if = "Defaults::is_empty")]
    pub defaults: Defaults,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strategy: Option<Strategy>,

    #[serde(default, deserialize_with = "container", skip_serializing_if = "Option::is_none")]
    pub container: Option<Container>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub services: BTreeMap<String, Container>,

    #[serde(default, skip_serializing_if = "Flag::is_unset")]
    pub continue_on_error: Flag,

    #[serde(default, skip_serializing_if = "Count::is_unset")]
    pub timeout_minutes: Count,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub steps: Vec<Step>,

    #[serde(flatten)]
    pub extra: StringMap,
}

/// `runs-on:` as a single label, a label list, or a runner-group mapping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RunsOn {
    Label(String),
    Labels(Vec<String>),
    Group(StringMap),
}

impl From<&str> for RunsOn {
    fn from(label: &str) -> Self {
        RunsOn::Label(label.to_string())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Strategy {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matrix: Option<Matrix>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fail_fast: Option<Flag>,

    #[serde(default, skip_serializing_if = "Count::is_unset")]
    pub max_parallel: Count,
}

/// A build matrix: named axes, or a single expression yielding one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Matrix {
    Axes(BTreeMap<String, MatrixValue>),
    Expression(String),
}

/// One matrix axis (including `include` / `exclude`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MatrixValue {
    List(Vec<Value>),
    /// Expression strings and anything else that is not a list.
    Other(Value),
}

impl MatrixValue {
    pub fn list<V: Into<Value>>(items: impl IntoIterator<Item = V>) -> Self {
        MatrixValue::List(items.into_iter().map(Into::into).collect())
    }
}

/// Job container or service container.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Container {
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "String::is_empty")]
    pub image: String,

    #[serde(default, skip_serializing_if = "StringMap::is_empty")]
    pub env: StringMap,

    #[serde(default, skip_serializing_if = "StringSet::is_empty")]
    pub ports: StringSet,

    #[serde(default, skip_serializing_if = "StringSet::is_empty")]
    pub volumes: StringSet,

    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "String::is_empty")]
    pub options: String,

    #[serde(flatten)]
    pub extra: StringMap,
}

impl Container {
    pub fn image(image: impl Into<String>) -> Self {
        Self { image: image.into(), ..Default::default() }
    }
}

/// `container: node:18` is shorthand for `container: { image: node:18 }`.
fn container<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Container>, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(None),
        Value::String(image) => Ok(Some(Container::image(image))),
        mapping => serde_yaml::from_value(mapping).map(Some).map_err(D::Error::custom),
    }
}

// ---------------------------------------------------------------------------
// Steps
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Step {
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "String::is_empty")]
    pub id: String,

    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "String::is_empty")]
    pub name: String,

    #[serde(
        default,
        rename = "if",
        deserialize_with = "lenient_string",
        skip_serializing_if = "String::is_empty"
    )]
    pub condition: String,

    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "String::is_empty")]
    pub uses: String,

    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "String::is_empty")]
    pub run: String,

    #[serde(default, skip_serializing_if = "StringMap::is_empty")]
    pub with: StringMap,

    #[serde(default, skip_serializing_if = "StringMap::is_empty")]
    pub env: StringMap,

    #[serde(default, skip_serializing_if = "Flag::is_unset")]
    pub continue_on_error: Flag,

    #[serde(default, skip_serializing_if = "Count::is_unset")]
    pub timeout_minutes: Count,

    #[serde(flatten)]
    pub extra: StringMap,
}

//! Typed model of `.github/dependabot.yml`.

use serde::{Deserialize, Serialize};

use crate::fields::{lenient_string, ScalarSet, StringMap, StringSet};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dependabot {
    #[serde(default)]
    pub version: u32,

    #[serde(default)]
    pub updates: Vec<Update>,

    /// `registries` and any other top-level key.
    #[serde(flatten)]
    pub extra: StringMap,
}

/// One `updates` entry, identified by `(package-ecosystem, directory)`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Update {
    #[serde(default, deserialize_with = "lenient_string")]
    pub package_ecosystem: String,

    #[serde(default, deserialize_with = "lenient_string")]
    pub directory: String,

    #[serde(default, skip_serializing_if = "UpdateSchedule::is_empty")]
    pub schedule: UpdateSchedule,

    /// `Some(0)` is meaningful: it disables version updates.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub open_pull_requests_limit: Option<u32>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub allow: Vec<StringMap>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ignore: Vec<Ignore>,

    #[serde(default, skip_serializing_if = "StringSet::is_empty")]
    pub labels: StringSet,

    #[serde(default, skip_serializing_if = "StringSet::is_empty")]
    pub assignees: StringSet,

    #[serde(default, skip_serializing_if = "StringSet::is_empty")]
    pub reviewers: StringSet,

    #[serde(default, skip_serializing_if = "ScalarSet::is_empty")]
    pub target_branch: ScalarSet,

    #[serde(default, skip_serializing_if = "ScalarSet::is_empty")]
    pub versioning_strategy: ScalarSet,

    #[serde(default, skip_serializing_if = "CommitMessage::is_empty")]
    pub commit_message: CommitMessage,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub milestone: Option<u32>,

    #[serde(default, skip_serializing_if = "BranchName::is_empty")]
    pub pull_request_branch_name: BranchName,

    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "String::is_empty")]
    pub rebase_strategy: String,

    #[serde(flatten)]
    pub extra: StringMap,
}

impl Update {
    pub fn new(ecosystem: impl Into<String>, directory: impl Into<String>) -> Self {
        Self {
            package_ecosystem: ecosystem.into(),
            directory: directory.into(),
            ..Default::default()
        }
    }

    /// Natural identity of an update entry.
    pub fn key(&self) -> (&str, &str) {
        (&self.package_ecosystem, &self.directory)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpdateSchedule {
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "String::is_empty")]
    pub interval: String,
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "String::is_empty")]
    pub day: String,
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "String::is_empty")]
    pub time: String,
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "String::is_empty")]
    pub timezone: String,
}

impl UpdateSchedule {
    pub fn is_empty(&self) -> bool {
        self.interval.is_empty() && self.day.is_empty() && self.time.is_empty() && self.timezone.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Ignore {
    #[serde(default, deserialize_with = "lenient_string")]
    pub dependency_name: String,
    #[serde(default, skip_serializing_if = "StringSet::is_empty")]
    pub versions: StringSet,
    #[serde(default, skip_serializing_if = "StringSet::is_empty")]
    pub update_types: StringSet,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct CommitMessage {
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "String::is_empty")]
    pub prefix: String,
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "String::is_empty")]
    pub prefix_development: String,
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "String::is_empty")]
    pub include: String,
}

impl CommitMessage {
    pub fn is_empty(&self) -> bool {
        self.prefix.is_empty() && self.prefix_development.is_empty() && self.include.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BranchName {
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "String::is_empty")]
    pub separator: String,
}

impl BranchName {
    pub fn is_empty(&self) -> bool {
        self.separator.is_empty()
    }
}

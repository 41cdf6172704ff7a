//! Field policies for workflow documents.

use std::collections::BTreeMap;

use fleetconf_core::fields::scalar_text;
use fleetconf_core::workflow::{
    Container, Defaults, Job, Matrix, MatrixValue, RefFilter, Release, RunDefaults, Schedule, Step,
    Strategy, Triggers, Workflow,
};
use fleetconf_core::{Count, Flag, ScalarSet, StringMap, StringSet};
use serde_yaml::Value;

use crate::policy::{keyed, nested, present, record_union, scalar};
use crate::Merge;

impl Merge for Workflow {
    fn merge(remote: &Self, local: &Self) -> Self {
        Workflow {
            name: scalar(&remote.name, &local.name),
            on: Triggers::merge(&remote.on, &local.on),
            env: StringMap::merge(&remote.env, &local.env),
            defaults: Defaults::merge(&remote.defaults, &local.defaults),
            jobs: keyed(&remote.jobs, &local.jobs),
            extra: StringMap::merge(&remote.extra, &local.extra),
        }
    }
}

// ---- Triggers ----

impl Merge for Triggers {
    fn merge(remote: &Self, local: &Self) -> Self {
        Triggers {
            schedule: merge_schedules(&remote.schedule, &local.schedule),
            push: nested(&remote.push, &local.push),
            pull_request: nested(&remote.pull_request, &local.pull_request),
            release: nested(&remote.release, &local.release),
            extra: StringMap::merge(&remote.extra, &local.extra),
        }
    }
}

/// Union by `cron`: remote entries keep their order, new local ones follow.
fn merge_schedules(remote: &[Schedule], local: &[Schedule]) -> Vec<Schedule> {
    let mut out: Vec<Schedule> = Vec::with_capacity(remote.len() + local.len());
    for entry in remote.iter().chain(local) {
        if !out.iter().any(|s| s.cron == entry.cron) {
            out.push(entry.clone());
        }
    }
    out
}

impl Merge for RefFilter {
    fn merge(remote: &Self, local: &Self) -> Self {
        RefFilter {
            branches: StringSet::merge(&remote.branches, &local.branches),
            branches_ignore: StringSet::merge(&remote.branches_ignore, &local.branches_ignore),
            tags: StringSet::merge(&remote.tags, &local.tags),
            tags_ignore: StringSet::merge(&remote.tags_ignore, &local.tags_ignore),
            paths: StringSet::merge(&remote.paths, &local.paths),
            paths_ignore: StringSet::merge(&remote.paths_ignore, &local.paths_ignore),
            types: StringSet::merge(&remote.types, &local.types),
        }
    }
}

impl Merge for Release {
    fn merge(remote: &Self, local: &Self) -> Self {
        Release { types: StringSet::merge(&remote.types, &local.types) }
    }
}

impl Merge for Defaults {
    fn merge(remote: &Self, local: &Self) -> Self {
        Defaults {
            run: RunDefaults {
                shell: scalar(&remote.run.shell, &local.run.shell),
                working_directory: scalar(&remote.run.working_directory, &local.run.working_directory),
            },
        }
    }
}

// ---- Jobs ----

impl Merge for Job {
    fn merge(remote: &Self, local: &Self) -> Self {
        Job {
            name: scalar(&remote.name, &local.name),
            runs_on: present(&remote.runs_on, &local.runs_on),
            needs: ScalarSet::merge(&remote.needs, &local.needs),
            condition: scalar(&remote.condition, &local.condition),
            env: StringMap::merge(&remote.env, &local.env),
            outputs: StringMap::merge(&remote.outputs, &local.outputs),
            defaults: Defaults::merge(&remote.defaults, &local.defaults),
            strategy: nested(&remote.strategy, &local.strategy),
            container: nested(&remote.container, &local.container),
            services: keyed(&remote.services, &local.services),
            continue_on_error: Flag::merge(&remote.continue_on_error, &local.continue_on_error),
            timeout_minutes: Count::merge(&remote.timeout_minutes, &local.timeout_minutes),
            steps: merge_steps(&remote.steps, &local.steps),
            extra: StringMap::merge(&remote.extra, &local.extra),
        }
    }
}

impl Merge for Container {
    fn merge(remote: &Self, local: &Self) -> Self {
        Container {
            image: scalar(&remote.image, &local.image),
            env: StringMap::merge(&remote.env, &local.env),
            ports: StringSet::merge(&remote.ports, &local.ports),
            volumes: StringSet::merge(&remote.volumes, &local.volumes),
            options: scalar(&remote.options, &local.options),
            extra: StringMap::merge(&remote.extra, &local.extra),
        }
    }
}

impl Merge for Strategy {
    fn merge(remote: &Self, local: &Self) -> Self {
        Strategy {
            matrix: nested(&remote.matrix, &local.matrix),
            fail_fast: present(&remote.fail_fast, &local.fail_fast),
            max_parallel: Count::merge(&remote.max_parallel, &local.max_parallel),
        }
    }
}

// ---- Matrix ----

impl Merge for Matrix {
    /// Axes are unioned by name; an expression on either side is taken whole, local first.
    fn merge(remote: &Self, local: &Self) -> Self {
        match (remote, local) {
            (Matrix::Axes(r), Matrix::Axes(l)) => {
                let mut axes: BTreeMap<String, MatrixValue> = r.clone();
                for (name, value) in l {
                    let merged = match r.get(name) {
                        Some(rv) => MatrixValue::merge(rv, value),
                        None => value.clone(),
                    };
                    axes.insert(name.clone(), merged);
                }
                Matrix::Axes(axes)
            }
            (_, local) => local.clone(),
        }
    }
}

/// Shape of a matrix list, for picking its merge rule.
#[derive(Debug, PartialEq, Eq)]
enum ListShape {
    Empty,
    Scalars,
    Records,
    Mixed,
}

fn shape(items: &[Value]) -> ListShape {
    if items.is_empty() {
        ListShape::Empty
    } else if items.iter().all(|v| scalar_text(v).is_some()) {
        ListShape::Scalars
    } else if items.iter().all(Value::is_mapping) {
        ListShape::Records
    } else {
        ListShape::Mixed
    }
}

impl Merge for MatrixValue {
    fn merge(remote: &Self, local: &Self) -> Self {
        let (MatrixValue::List(r), MatrixValue::List(l)) = (remote, local) else {
            return local.clone();
        };
        match (shape(r), shape(l)) {
            (ListShape::Scalars, ListShape::Scalars) => MatrixValue::List(scalar_union(r, l)),
            (ListShape::Records, ListShape::Records) => MatrixValue::List(record_union(r, l)),
            (_, ListShape::Empty) => remote.clone(),
            _ => local.clone(),
        }
    }
}

/// Union of scalar values, compared and sorted by their text form.
///
/// On a text collision the local value (and its YAML type) is kept.
fn scalar_union(remote: &[Value], local: &[Value]) -> Vec<Value> {
    let mut by_text: BTreeMap<String, Value> = BTreeMap::new();
    for value in remote.iter().chain(local) {
        if let Some(text) = scalar_text(value) {
            by_text.insert(text, value.clone());
        }
    }
    by_text.into_values().collect()
}

// ---- Steps ----

/// Whether two steps describe the same unit of work.
///
/// Ids decide when both sides have one; otherwise names decide when both have
/// one; otherwise the steps must be structurally equal.
pub fn same_step(a: &Step, b: &Step) -> bool {
    if !a.id.is_empty() && !b.id.is_empty() {
        a.id == b.id
    } else if !a.name.is_empty() && !b.name.is_empty() {
        a.name == b.name
    } else {
        a == b
    }
}

/// Each local step, in order, claims the first unclaimed remote step it
/// matches. Unclaimed remote steps are appended after all local steps.
pub fn merge_steps(remote: &[Step], local: &[Step]) -> Vec<Step> {
    let mut claimed = vec![false; remote.len()];
    let mut out: Vec<Step> = Vec::with_capacity(local.len() + remote.len());

    for step in local {
        let hit = remote
            .iter()
            .enumerate()
            .find(|(i, r)| !claimed[*i] && same_step(r, step))
            .map(|(i, _)| i);
        match hit {
            Some(i) => {
                claimed[i] = true;
                out.push(Step::merge(&remote[i], step));
            }
            None => out.push(step.clone()),
        }
    }

    out.extend(
        remote
            .iter()
            .zip(&claimed)
            .filter(|(_, taken)| !**taken)
            .map(|(step, _)| step.clone()),
    );
    out
}

impl Merge for Step {
    fn merge(remote: &Self, local: &Self) -> Self {
        Step {
            id: scalar(&remote.id, &local.id),
            name: scalar(&remote.name, &local.name),
            condition: scalar(&remote.condition, &local.condition),
            uses: scalar(&remote.uses, &local.uses),
            run: scalar(&remote.run, &local.run),
            with: StringMap::merge(&remote.with, &local.with),
            env: StringMap::merge(&remote.env, &local.env),
            continue_on_error: Flag::merge(&remote.continue_on_error, &local.continue_on_error),
            timeout_minutes: Count::merge(&remote.timeout_minutes, &local.timeout_minutes),
            extra: StringMap::merge(&remote.extra, &local.extra),
        }
    }
}

//! Realistic documents survive a parse → write → parse cycle unchanged.
//!
//! Each `#[case]` is isolated; no shared state.

use fleetconf_core::{
    workflow::{Matrix, MatrixValue, RunsOn},
    Count, Document, DocumentKind, Flag,
};
use rstest::rstest;

const NODE_CI: &str = r#"
name: Node CI
on:
  push:
    branches: [main, "release/**"]
    paths-ignore: ["docs/**"]
  pull_request:
    types: [opened, synchronize]
  schedule:
    - cron: "0 3 * * 1"
  workflow_dispatch:
    inputs:
      debug:
        type: boolean
permissions:
  contents: read
env:
  CI: true
  NODE_OPTIONS: --max-old-space-size=4096
jobs:
  build:
    runs-on: ${{ matrix.os }}
    timeout-minutes: 20
    strategy:
      fail-fast: false
      matrix:
        os: [ubuntu-latest, windows-latest]
        node: [16.x, 18.x]
        include:
          - os: ubuntu-latest
            node: 20.x
            experimental: true
    steps:
      - uses: actions/checkout@v4
      - name: Setup node
        uses: actions/setup-node@v4
        with:
          node-version: ${{ matrix.node }}
          cache: npm
      - id: test
        run: npm test
        continue-on-error: ${{ matrix.experimental == true }}
        shell: bash
  publish:
    needs: build
    if: github.ref == 'refs/heads/main'
    runs-on: [self-hosted, linux]
    container:
      image: node:18
      env:
        NPM_CONFIG_LOGLEVEL: warn
      ports: [8080]
    services:
      redis:
        image: redis:7
        ports: ["6379:6379"]
        options: --health-cmd "redis-cli ping"
    steps:
      - run: npm publish
"#;

const RELEASE: &str = r#"
on: release
jobs:
  notes:
    uses: octo/shared/.github/workflows/notes.yml@v1
    secrets: inherit
"#;

const DISPATCHED: &str = r#"
name: Dispatched
on:
  workflow_call:
    inputs:
      timeout:
        type: number
jobs:
  test:
    runs-on: ubuntu-latest
    timeout-minutes: ${{ inputs.timeout }}
    strategy:
      fail-fast: ${{ github.event_name != 'schedule' }}
      max-parallel: ${{ fromJSON(inputs.parallel) }}
      matrix:
        os: [ubuntu-latest, macos-latest]
    steps:
      - name: Test
        run: make test
        timeout-minutes: ${{ inputs.timeout }}
"#;

const DEPENDABOT: &str = r#"
version: 2
registries:
  npm-github:
    type: npm-registry
    url: https://npm.pkg.github.com
updates:
  - package-ecosystem: npm
    directory: /
    schedule:
      interval: weekly
      day: monday
    labels: [dependencies]
    commit-message:
      prefix: chore
      include: scope
    ignore:
      - dependency-name: "@types/*"
        update-types: ["version-update:semver-patch"]
  - package-ecosystem: github-actions
    directory: /
    schedule:
      interval: monthly
    open-pull-requests-limit: 5
"#;

#[rstest]
#[case::node_ci(DocumentKind::Workflow, NODE_CI)]
#[case::reusable(DocumentKind::Workflow, RELEASE)]
#[case::expressions(DocumentKind::Workflow, DISPATCHED)]
#[case::dependabot(DocumentKind::Dependabot, DEPENDABOT)]
fn documents_are_stable_across_rewrites(#[case] kind: DocumentKind, #[case] text: &str) {
    let first = Document::parse_validated(kind, "fixture", text).expect("parse fixture");
    let written = first.to_yaml().expect("write");
    let second = Document::parse(kind, "fixture", &written).expect("reparse");
    assert_eq!(first, second);
    assert_eq!(written, second.to_yaml().expect("write again"));
}

#[test]
fn node_ci_fields_land_in_the_model() {
    let Document::Workflow(wf) = Document::parse(DocumentKind::Workflow, "ci.yml", NODE_CI).unwrap() else {
        panic!("expected workflow");
    };
    assert_eq!(wf.on.schedule[0].cron, "0 3 * * 1");
    assert!(wf.on.extra.get("workflow_dispatch").is_some());
    assert!(wf.extra.get("permissions").is_some());

    let build = &wf.jobs["build"];
    assert_eq!(build.timeout_minutes, Count::Number(20));
    let strategy = build.strategy.as_ref().unwrap();
    assert_eq!(strategy.fail_fast, Some(Flag::Bool(false)));
    let Some(Matrix::Axes(axes)) = &strategy.matrix else { panic!("expected axes") };
    assert!(matches!(&axes["include"], MatrixValue::List(v) if v.len() == 1));
    assert_eq!(build.steps[2].extra.get("continue-on-error"), None);

    let publish = &wf.jobs["publish"];
    assert_eq!(publish.needs.0, ["build"]);
    assert_eq!(publish.runs_on, Some(RunsOn::Labels(vec!["self-hosted".into(), "linux".into()])));
    assert_eq!(publish.services["redis"].ports.0, ["6379:6379"]);
    assert_eq!(publish.container.as_ref().unwrap().ports.0, ["8080"]);
}

#[test]
fn expressions_in_numeric_and_boolean_fields_are_kept() {
    let doc = Document::parse(DocumentKind::Workflow, "dispatched.yml", DISPATCHED).expect("parse");
    let Document::Workflow(wf) = &doc else { panic!("expected workflow") };

    let test = &wf.jobs["test"];
    assert_eq!(test.timeout_minutes, Count::from("${{ inputs.timeout }}"));
    assert_eq!(test.steps[0].timeout_minutes, Count::from("${{ inputs.timeout }}"));
    let strategy = test.strategy.as_ref().unwrap();
    assert_eq!(
        strategy.fail_fast,
        Some(Flag::Expression("${{ github.event_name != 'schedule' }}".into()))
    );
    assert_eq!(strategy.max_parallel, Count::from("${{ fromJSON(inputs.parallel) }}"));

    let written: serde_yaml::Value = serde_yaml::from_str(&doc.to_yaml().expect("write")).expect("reparse");
    let job = &written["jobs"]["test"];
    assert_eq!(job["timeout-minutes"].as_str(), Some("${{ inputs.timeout }}"));
    assert_eq!(job["strategy"]["max-parallel"].as_str(), Some("${{ fromJSON(inputs.parallel) }}"));
}

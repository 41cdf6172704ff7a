//! Rendering real-looking templates and decoding the result.

use fleetconf_core::{Document, DocumentKind, RepositoryId, RepositoryInfo, StringMap};
use fleetconf_renderer::{RenderError, TemplateEngine, TemplateVars};
use rstest::rstest;

const CI_TEMPLATE: &str = r#"name: $(( repo.name )) CI
on:
  push:
    branches: [$(( base_branch ))]
jobs:
  build:
    runs-on: $(( vars.runner if vars.runner is defined else "ubuntu-latest" ))
    steps:
      - uses: actions/checkout@v4
$(%- if "rust" in repo.topics %)
      - run: cargo test --all
$(%- else %)
      - run: make test
$(%- endif %)
      - if: ${{ github.event_name == 'push' }}
        run: echo "built $(( repo.full_name ))"
"#;

fn vars_for(name: &str, topics: &[&str], extra: StringMap) -> TemplateVars {
    let mut repo = RepositoryInfo::synthetic(RepositoryId::new("octo", name));
    repo.topics = topics.iter().map(|t| t.to_string()).collect();
    TemplateVars::for_repository(&repo, "main", &extra)
}

#[rstest]
#[case::rust_repo("engine", &["rust"], "cargo test --all")]
#[case::other_repo("site", &[], "make test")]
fn rendered_workflow_is_a_valid_document(
    #[case] name: &str,
    #[case] topics: &[&str],
    #[case] expected_run: &str,
) {
    let engine = TemplateEngine::new().expect("engine");
    let text = engine
        .render("ci.yml", CI_TEMPLATE, &vars_for(name, topics, StringMap::new()))
        .expect("render");

    let Document::Workflow(wf) = Document::parse_validated(DocumentKind::Workflow, "ci.yml", &text)
        .expect("rendered template parses")
    else {
        panic!("expected workflow");
    };
    assert_eq!(wf.name, format!("{name} CI"));
    assert_eq!(wf.on.push.unwrap().branches.0, ["main"]);
    let steps = &wf.jobs["build"].steps;
    assert_eq!(steps[1].run, expected_run);
    assert_eq!(steps[2].condition, "${{ github.event_name == 'push' }}");
    assert_eq!(steps[2].run, format!("echo \"built octo/{name}\""));
}

#[test]
fn config_vars_are_visible() {
    let engine = TemplateEngine::new().expect("engine");
    let extra: StringMap = [("runner", "self-hosted")].into_iter().collect();
    let text = engine.render("ci.yml", CI_TEMPLATE, &vars_for("api", &[], extra)).expect("render");
    assert!(text.contains("runs-on: self-hosted"), "{text}");
}

#[test]
fn syntax_errors_name_the_template() {
    let engine = TemplateEngine::new().expect("engine");
    let err = engine
        .render("broken.yml", "x: $(% if %)", &vars_for("api", &[], StringMap::new()))
        .unwrap_err();
    assert!(matches!(err, RenderError::Template { ref name, .. } if name == "broken.yml"));
}

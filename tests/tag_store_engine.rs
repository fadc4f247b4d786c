// tests/tag_store_engine.rs

use std::error::Error;
use std::fs;

use muddle::dag::Target;
use muddle_test_utils::builders::{TempTree, THREE_PACKAGES};
use muddle_test_utils::recording_invoker::RecordingInvoker;
use muddle_test_utils::{init_tracing, label};

type TestResult = Result<(), Box<dyn Error>>;

#[tokio::test]
async fn assertions_survive_a_new_engine() -> TestResult {
    init_tracing();
    let tree = TempTree::new(THREE_PACKAGES);
    let targets: Vec<Target> = vec!["package:a{x86}/postinstalled".parse()?];

    {
        let mut engine = tree.engine();
        engine.build(&targets, &mut RecordingInvoker::new()).await?;
    }

    let marker = tree.root().join(".muddle/tags/package/a/{x86}/postinstalled");
    assert!(marker.is_file(), "missing marker {}", marker.display());
    assert!(tree.root().join(".muddle/tags/checkout/core/checked_out").is_file());

    let mut engine = tree.engine();
    let mut invoker = RecordingInvoker::new();
    engine.build(&targets, &mut invoker).await?;
    assert!(invoker.labels().is_empty());
    Ok(())
}

#[tokio::test]
async fn deleting_a_marker_by_hand_forces_a_rebuild() -> TestResult {
    init_tracing();
    let tree = TempTree::new(THREE_PACKAGES);
    let targets: Vec<Target> = vec!["package:a{x86}/postinstalled".parse()?];
    tree.engine()
        .build(&targets, &mut RecordingInvoker::new())
        .await?;

    fs::remove_file(tree.root().join(".muddle/tags/package/a/{x86}/installed"))?;

    let mut invoker = RecordingInvoker::new();
    tree.engine().build(&targets, &mut invoker).await?;
    assert_eq!(
        invoker.label_strings(),
        vec!["package:a{x86}/installed", "package:a{x86}/postinstalled"]
    );
    Ok(())
}

#[tokio::test]
async fn wildcard_retract_removes_matches_and_their_dependents() -> TestResult {
    init_tracing();
    let tree = TempTree::new(THREE_PACKAGES);
    let mut engine = tree.engine();
    engine
        .build(&["package:b{x86}/postinstalled".parse()?], &mut RecordingInvoker::new())
        .await?;

    let preview = engine.retraction_set(&[label("package:a{*}/*")])?;
    let removed = engine.retract(&[label("package:a{*}/*")])?;
    assert_eq!(removed, preview);
    // All of `a`, and all of `b` because it is built on top of `a`.
    assert_eq!(removed.len(), 10);
    assert!(removed.iter().all(|l| l.name().to_string() != "core"));

    let store = engine.store();
    assert!(!store.is_asserted(&label("package:a{x86}/preconfig")));
    assert!(!store.is_asserted(&label("package:b{x86}/preconfig")));
    assert!(store.is_asserted(&label("checkout:core/checked_out")));
    Ok(())
}

#[tokio::test]
async fn failed_rebuild_after_lost_marker_is_retried() -> TestResult {
    init_tracing();
    let tree = TempTree::new(THREE_PACKAGES);
    let targets: Vec<Target> = vec!["package:c{x86}/postinstalled".parse()?];
    tree.engine()
        .build(&targets, &mut RecordingInvoker::new())
        .await?;

    // Every label is asserted; losing `a`'s build forces `b` to rebuild.
    fs::remove_file(tree.root().join(".muddle/tags/package/a/{x86}/built"))?;
    let failing = label("package:b{x86}/built");
    let mut invoker = RecordingInvoker::new().fail_on(failing.clone());
    assert!(tree.engine().build(&targets, &mut invoker).await.is_err());

    let engine = tree.engine();
    assert!(!engine.store().is_asserted(&failing));
    assert!(!engine.store().is_asserted(&label("package:c{x86}/postinstalled")));

    let mut retry = RecordingInvoker::new();
    tree.engine().build(&targets, &mut retry).await?;
    let rebuilt = retry.label_strings();
    assert_eq!(rebuilt.first().map(String::as_str), Some("package:b{x86}/built"));
    assert_eq!(rebuilt.len(), 3 + 5);
    Ok(())
}

#[tokio::test]
async fn rebuilding_a_dependency_alone_leaves_dependents_to_rebuild_later() -> TestResult {
    init_tracing();
    let tree = TempTree::new(THREE_PACKAGES);
    let all: Vec<Target> = vec!["package:c{x86}/postinstalled".parse()?];
    tree.engine().build(&all, &mut RecordingInvoker::new()).await?;

    fs::remove_file(tree.root().join(".muddle/tags/package/b/{x86}/built"))?;
    let mut first = RecordingInvoker::new();
    tree.engine()
        .build(&["package:b{x86}/built".parse()?], &mut first)
        .await?;
    assert_eq!(first.label_strings(), vec!["package:b{x86}/built"]);

    let mut second = RecordingInvoker::new();
    tree.engine().build(&all, &mut second).await?;
    let rebuilt = second.label_strings();
    assert!(rebuilt.contains(&"package:b{x86}/installed".to_string()));
    assert_eq!(
        rebuilt.last().map(String::as_str),
        Some("package:c{x86}/postinstalled")
    );
    assert_eq!(rebuilt.len(), 2 + 5);
    Ok(())
}

#[tokio::test]
async fn retracting_between_runs_rebuilds_dependents() -> TestResult {
    init_tracing();
    let tree = TempTree::new(THREE_PACKAGES);
    let mut engine = tree.engine();
    let all: Vec<Target> = vec!["package:c{x86}/postinstalled".parse()?];
    engine.build(&all, &mut RecordingInvoker::new()).await?;

    engine.retract(&[label("package:b{x86}/built")])?;
    assert!(!engine.store().is_asserted(&label("package:c{x86}/built")));
    engine
        .build(&["package:b{x86}/built".parse()?], &mut RecordingInvoker::new())
        .await?;

    let mut invoker = RecordingInvoker::new();
    engine.build(&all, &mut invoker).await?;
    assert_eq!(invoker.labels().len(), 2 + 5);
    Ok(())
}

#[test]
fn assert_by_hand_then_query_status() -> TestResult {
    init_tracing();
    let tree = TempTree::new(THREE_PACKAGES);
    let mut engine = tree.engine();
    let checked_out = label("checkout:core/checked_out");

    engine.assert_labels(std::slice::from_ref(&checked_out))?;
    let status = engine.status_of(&checked_out);
    assert!(status.asserted);
    assert!(!status.leaf);
    assert_eq!(status.actions.len(), 1);

    assert!(engine.assert_labels(&[label("checkout:*/checked_out")]).is_err());
    Ok(())
}

#[test]
fn queries_describe_the_rule_database() {
    init_tracing();
    let tree = TempTree::new(THREE_PACKAGES);
    let engine = tree.engine();

    let checkouts = engine.labels_matching(&label("checkout:*/checked_out"));
    assert_eq!(checkouts.len(), 2);

    let needs_core = engine.required_by(&label("checkout:core/checked_out"));
    assert!(needs_core.contains(&label("package:c{x86}/postinstalled")));
    assert!(needs_core.contains(&label("deployment:rootfs/deployed")));
    assert!(!needs_core.contains(&label("checkout:tools/checked_out")));

    let rules = engine.rules_matching(Some(&label("deployment:*/*")));
    assert_eq!(rules.len(), 1);
    assert!(engine.rules_matching(None).len() > rules.len());
}

#[test]
fn system_labels_are_listed_only_on_request() {
    init_tracing();
    let tree = TempTree::new(
        r#"
[package.app]
roles = ["x86"]

[[rule]]
target = "package:app{x86}/built"
depends = ["checkout:scratch/checked_out[S]"]
"#,
    );
    let engine = tree.memory_engine();

    assert!(engine.labels_matching(&label("checkout:*/checked_out")).is_empty());
    assert!(engine.labels_matching(&label("checkout:scratch/checked_out")).is_empty());

    let listed = engine.labels_matching(&label("checkout:*/checked_out[S]"));
    assert_eq!(listed, vec![label("checkout:scratch/checked_out")]);
    assert!(listed[0].is_system());

    assert_eq!(engine.labels_matching(&label("package:app{*}/*")).len(), 5);
}

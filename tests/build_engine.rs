// tests/build_engine.rs

use std::error::Error;

use muddle::dag::Target;
use muddle::errors::MuddleError;
use muddle_test_utils::builders::{TempTree, THREE_PACKAGES};
use muddle_test_utils::recording_invoker::RecordingInvoker;
use muddle_test_utils::{init_tracing, label};

type TestResult = Result<(), Box<dyn Error>>;

fn target(text: &str) -> Target {
    text.parse().unwrap()
}

#[tokio::test]
async fn first_build_runs_everything_second_build_nothing() -> TestResult {
    init_tracing();
    let tree = TempTree::new(THREE_PACKAGES);
    let mut engine = tree.memory_engine();
    let targets = [target("package:c{x86}/postinstalled")];

    let mut invoker = RecordingInvoker::new();
    let report = engine.build(&targets, &mut invoker).await?;

    // Two checkouts plus five steps for each of three packages.
    assert_eq!(invoker.labels().len(), 17);
    assert_eq!(report.asserted.len(), 17);
    assert!(engine.store().is_asserted(&label("package:c{x86}/postinstalled")));

    let mut again = RecordingInvoker::new();
    let report = engine.build(&targets, &mut again).await?;
    assert!(again.labels().is_empty());
    assert!(report.is_up_to_date());
    Ok(())
}

#[tokio::test]
async fn dependencies_run_before_dependents() -> TestResult {
    init_tracing();
    let tree = TempTree::new(THREE_PACKAGES);
    let mut engine = tree.memory_engine();

    let mut invoker = RecordingInvoker::new();
    engine
        .build(&[target("package:c{x86}/postinstalled")], &mut invoker)
        .await?;

    let order = invoker.label_strings();
    let pos = |s: &str| order.iter().position(|l| l == s).unwrap();
    assert!(pos("checkout:core/checked_out") < pos("package:a{x86}/preconfig"));
    assert!(pos("package:a{x86}/postinstalled") < pos("package:b{x86}/preconfig"));
    assert!(pos("package:b{x86}/built") < pos("package:b{x86}/installed"));
    assert!(pos("package:b{x86}/postinstalled") < pos("package:c{x86}/preconfig"));
    assert_eq!(order.last().map(String::as_str), Some("package:c{x86}/postinstalled"));
    Ok(())
}

#[tokio::test]
async fn retracting_a_dependency_rebuilds_its_dependents() -> TestResult {
    init_tracing();
    let tree = TempTree::new(THREE_PACKAGES);
    let mut engine = tree.memory_engine();
    let targets = [target("package:c{x86}/postinstalled")];

    engine.build(&targets, &mut RecordingInvoker::new()).await?;
    engine.retract(&[label("package:a{x86}/built")])?;

    let mut invoker = RecordingInvoker::new();
    engine.build(&targets, &mut invoker).await?;

    let rebuilt = invoker.label_strings();
    assert_eq!(rebuilt.first().map(String::as_str), Some("package:a{x86}/built"));
    // a from built onwards, then all of b and c.
    assert_eq!(rebuilt.len(), 3 + 5 + 5);
    assert!(!rebuilt.iter().any(|l| l.starts_with("checkout:")));
    assert!(!rebuilt.contains(&"package:a{x86}/configured".to_string()));
    Ok(())
}

#[tokio::test]
async fn failure_stops_the_run_and_keeps_earlier_assertions() -> TestResult {
    init_tracing();
    let tree = TempTree::new(THREE_PACKAGES);
    let mut engine = tree.memory_engine();
    let failing = label("package:b{x86}/built");

    let mut invoker = RecordingInvoker::new().fail_on(failing.clone());
    let err = engine
        .build(&[target("package:c{x86}/postinstalled")], &mut invoker)
        .await
        .unwrap_err();

    match &err {
        MuddleError::ActionFailed {
            label: failed,
            diagnostics,
            asserted,
        } => {
            assert_eq!(failed, &failing);
            assert!(diagnostics.contains("recorded failure"));
            assert!(asserted.contains(&label("package:a{x86}/postinstalled")));
            assert!(asserted.contains(&label("package:b{x86}/configured")));
            assert!(!asserted.contains(&failing));
        }
        other => panic!("expected ActionFailed, got {other:?}"),
    }

    let store = engine.store();
    assert!(store.is_asserted(&label("package:a{x86}/postinstalled")));
    assert!(!store.is_asserted(&failing));
    assert!(!store.is_asserted(&label("package:c{x86}/preconfig")));
    // Nothing after the failure was attempted.
    assert_eq!(invoker.labels().last(), Some(&failing));
    Ok(())
}

#[tokio::test]
async fn rebuild_reruns_package_from_built_onwards() -> TestResult {
    init_tracing();
    let tree = TempTree::new(THREE_PACKAGES);
    let mut engine = tree.memory_engine();
    let targets = [target("package:a{x86}/postinstalled")];

    engine.build(&targets, &mut RecordingInvoker::new()).await?;

    let mut invoker = RecordingInvoker::new();
    engine.rebuild(&targets, &mut invoker).await?;
    assert_eq!(
        invoker.label_strings(),
        vec![
            "package:a{x86}/built",
            "package:a{x86}/installed",
            "package:a{x86}/postinstalled",
        ]
    );
    Ok(())
}

#[tokio::test]
async fn simulate_leaves_the_store_alone() -> TestResult {
    init_tracing();
    let tree = TempTree::new(THREE_PACKAGES);
    let engine = tree.memory_engine();

    let report = engine
        .simulate(&[target("package:a{x86}/postinstalled")], false, false)
        .await?;
    assert_eq!(report.invoked.len(), 6);
    assert!(engine.store().asserted_labels()?.is_empty());

    let needed = engine
        .needed_to_build(&[target("package:a{x86}/postinstalled")])
        .await?;
    assert_eq!(needed, report.invoked);
    Ok(())
}

#[tokio::test]
async fn interrupt_stops_before_the_next_action() -> TestResult {
    init_tracing();
    let tree = TempTree::new(THREE_PACKAGES);
    let mut engine = tree.memory_engine();
    engine
        .interrupt_handle()
        .store(true, std::sync::atomic::Ordering::SeqCst);

    let mut invoker = RecordingInvoker::new();
    let err = engine
        .build(&[target("package:a{x86}/postinstalled")], &mut invoker)
        .await
        .unwrap_err();
    assert!(matches!(err, MuddleError::Interrupted { ref asserted } if asserted.is_empty()));
    assert!(invoker.labels().is_empty());
    Ok(())
}

#[tokio::test]
async fn scheduled_actions_carry_environment_and_work_dir() -> TestResult {
    init_tracing();
    let tree = TempTree::new(THREE_PACKAGES);
    let mut engine = tree.memory_engine();

    let invoker = RecordingInvoker::new();
    engine
        .build(&[target("package:a{x86}/built")], &mut invoker.clone())
        .await?;

    let built = invoker
        .scheduled()
        .into_iter()
        .find(|s| s.label == label("package:a{x86}/built"))
        .unwrap();
    assert_eq!(built.work_dir, tree.root().join("obj/a/x86"));
    assert_eq!(built.env["MUDDLE_ROLE"], "x86");
    assert_eq!(built.env["MUDDLE_LABEL"], "package:a{x86}/built");
    assert_eq!(built.actions.len(), 1);
    Ok(())
}

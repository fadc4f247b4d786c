// tests/rule_scenarios.rs

use std::collections::BTreeSet;
use std::error::Error;

use muddle::dag::{build_graph, Scheduler};
use muddle::errors::MuddleError;
use muddle::exec::EnvironmentLayer;
use muddle::tags::{MemoryTagStore, TagStore};
use muddle_test_utils::builders::RuleDatabaseBuilder;
use muddle_test_utils::recording_invoker::RecordingInvoker;
use muddle_test_utils::{init_tracing, label};

type TestResult = Result<(), Box<dyn Error>>;

#[tokio::test]
async fn wildcard_role_dependency_on_asserted_checkout_runs_once() -> TestResult {
    init_tracing();
    let db = RuleDatabaseBuilder::new()
        .rule("package:app{x86}/built", "make", &["checkout:app{*}/checked_out"])
        .build();
    let mut store = MemoryTagStore::new();
    store.assert(&label("checkout:app{x86}/checked_out"))?;

    let graph = build_graph(&BTreeSet::from([label("package:app{x86}/built")]), &db)?;
    let env = EnvironmentLayer::default();
    let mut invoker = RecordingInvoker::new();
    Scheduler::new(&graph, &mut store, &env)
        .run(&mut invoker)
        .await?;

    assert_eq!(invoker.label_strings(), vec!["package:app{x86}/built"]);
    assert!(store.is_asserted(&label("package:app{x86}/built")));
    Ok(())
}

#[test]
fn mutual_dependency_is_reported_with_both_labels() {
    init_tracing();
    let db = RuleDatabaseBuilder::new()
        .rule("package:x/built", "x", &["package:y/built"])
        .rule("package:y/built", "y", &["package:x/built"])
        .build();

    for root in ["package:x/built", "package:y/built"] {
        let err = build_graph(&BTreeSet::from([label(root)]), &db).unwrap_err();
        match err {
            MuddleError::CyclicDependency(msg) => {
                assert!(msg.contains("package:x/built"), "{msg}");
                assert!(msg.contains("package:y/built"), "{msg}");
            }
            other => panic!("expected CyclicDependency, got {other:?}"),
        }
    }
}

#[tokio::test]
async fn wildcard_rule_applies_to_every_concrete_package() -> TestResult {
    init_tracing();
    let db = RuleDatabaseBuilder::new()
        .rule("package:*{x86}/built", "make", &["checkout:*/checked_out"])
        .depends("package:one{x86}/built", &[])
        .depends("package:two{x86}/built", &[])
        .rule("checkout:one/checked_out", "clone one", &[])
        .rule("checkout:two/checked_out", "clone two", &[])
        .build();

    let roots = db.expand(&label("package:*{x86}/built"));
    assert_eq!(roots.len(), 2);
    let graph = build_graph(&roots, &db)?;

    let mut store = MemoryTagStore::new();
    let env = EnvironmentLayer::default();
    let mut invoker = RecordingInvoker::new();
    Scheduler::new(&graph, &mut store, &env)
        .run(&mut invoker)
        .await?;

    assert_eq!(invoker.labels().len(), 4);
    let one = invoker
        .scheduled()
        .into_iter()
        .find(|s| s.label == label("package:one{x86}/built"))
        .unwrap();
    assert_eq!(one.actions.len(), 1);
    Ok(())
}

#[tokio::test]
async fn leaves_are_never_invoked() -> TestResult {
    init_tracing();
    let db = RuleDatabaseBuilder::new()
        .rule("package:app/built", "make", &["checkout:app/checked_out"])
        .build();
    let graph = build_graph(&BTreeSet::from([label("package:app/built")]), &db)?;
    assert!(graph.is_leaf(&label("checkout:app/checked_out")));

    let mut store = MemoryTagStore::new();
    let env = EnvironmentLayer::default();
    let mut invoker = RecordingInvoker::new();
    let report = Scheduler::new(&graph, &mut store, &env)
        .run(&mut invoker)
        .await?;

    assert_eq!(invoker.label_strings(), vec!["package:app/built"]);
    assert_eq!(report.satisfied, vec![label("checkout:app/checked_out")]);
    Ok(())
}

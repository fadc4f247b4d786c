// src/lib.rs

pub mod cli;
pub mod config;
pub mod dag;
pub mod dwim;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod label;
pub mod layout;
pub mod logging;
pub mod rules;
pub mod tags;

use std::path::Path;
use std::sync::atomic::Ordering;

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::cli::{CliArgs, Command, Query};
use crate::config::discover_root;
use crate::dag::{BuildReport, Target};
use crate::engine::Engine;
use crate::exec::ProcessInvoker;
use crate::label::{label_list_to_string, Label};

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - root discovery and description loading
/// - the engine and its tag store
/// - the process invoker
/// - Ctrl-C handling
pub async fn run(args: CliArgs) -> Result<()> {
    let cwd = std::env::current_dir().context("reading current directory")?;
    let explicit_root = match &args.root {
        Some(root) => Some(
            root.canonicalize()
                .with_context(|| format!("resolving --root {}", root.display()))?,
        ),
        None => None,
    };
    let root = discover_root(explicit_root.as_deref(), &cwd)?;
    let mut engine = Engine::load(&root)?;

    // Ctrl-C → stop before the next action.
    {
        let flag = engine.interrupt_handle();
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                eprintln!("failed to listen for Ctrl+C: {e}");
                return;
            }
            warn!("interrupt requested; stopping before the next action");
            flag.store(true, Ordering::SeqCst);
        });
    }

    let just_print = args.just_print;
    match args.command {
        None => run_dwim(&mut engine, &cwd, just_print, None).await,
        Some(Command::Build { targets }) if targets.is_empty() => {
            run_dwim(&mut engine, &cwd, just_print, Some(false)).await
        }
        Some(Command::Rebuild { targets }) if targets.is_empty() => {
            run_dwim(&mut engine, &cwd, just_print, Some(true)).await
        }
        Some(Command::Build { targets }) => {
            let targets = parse_targets(&targets)?;
            run_build(&mut engine, &targets, false, just_print).await
        }
        Some(Command::Rebuild { targets }) => {
            let targets = parse_targets(&targets)?;
            run_build(&mut engine, &targets, true, just_print).await
        }
        Some(Command::Assert { labels }) => {
            let labels = parse_labels(&labels)?;
            if just_print {
                println!("would assert: {}", label_list_to_string(&labels));
                return Ok(());
            }
            engine.assert_labels(&labels)?;
            println!("asserted: {}", label_list_to_string(&labels));
            Ok(())
        }
        Some(Command::Retract { patterns }) => {
            let patterns = parse_labels(&patterns)?;
            if just_print {
                let labels = engine.retraction_set(&patterns)?;
                println!("would retract: {}", label_list_to_string(&labels));
                return Ok(());
            }
            let removed = engine.retract(&patterns)?;
            println!("retracted: {}", label_list_to_string(&removed));
            Ok(())
        }
        Some(Command::Query(query)) => run_query(&engine, query).await,
    }
}

/// Choose targets from `cwd`. `rebuild` overrides whether they are rebuilt.
async fn run_dwim(
    engine: &mut Engine,
    cwd: &Path,
    just_print: bool,
    rebuild: Option<bool>,
) -> Result<()> {
    let request = engine.resolve_dwim(cwd)?;
    let rebuild = rebuild.unwrap_or(request.rebuild);
    info!(
        location = ?request.location,
        targets = request.targets.len(),
        rebuild,
        "building targets for current directory"
    );
    run_build(engine, &request.targets, rebuild, just_print).await
}

async fn run_build(
    engine: &mut Engine,
    targets: &[Target],
    rebuild: bool,
    just_print: bool,
) -> Result<()> {
    let report = if just_print {
        engine.simulate(targets, rebuild, true).await?
    } else {
        let mut invoker = ProcessInvoker::new();
        if rebuild {
            engine.rebuild(targets, &mut invoker).await?
        } else {
            engine.build(targets, &mut invoker).await?
        }
    };
    print_report(&report, just_print);
    Ok(())
}

fn print_report(report: &BuildReport, just_print: bool) {
    if report.is_up_to_date() {
        println!("nothing to do; everything is up to date");
    } else if just_print {
        println!("{} label(s) would be built", report.invoked.len());
    } else {
        println!(
            "built {} label(s), {} already up to date",
            report.asserted.len(),
            report.satisfied.len()
        );
    }
}

async fn run_query(engine: &Engine, query: Query) -> Result<()> {
    match query {
        Query::Labels { pattern } => {
            let pattern = Label::parse(&pattern)?;
            for label in engine.labels_matching(&pattern) {
                println!("{label}");
            }
        }
        Query::Status { label } => {
            let label = Label::parse(&label)?;
            let status = engine.status_of(&label);
            println!("{}", status.label);
            println!("  asserted: {}", status.asserted);
            if status.leaf {
                println!("  no rule builds this label");
            }
            for dep in &status.dependencies {
                println!("  depends on: {dep}");
            }
            for action in &status.actions {
                println!("  action: {action}");
            }
        }
        Query::Needed { targets } => {
            let targets = parse_targets(&targets)?;
            for label in engine.needed_to_build(&targets).await? {
                println!("{label}");
            }
        }
        Query::RequiredBy { label } => {
            let label = Label::parse(&label)?;
            for dependent in engine.required_by(&label) {
                println!("{dependent}");
            }
        }
        Query::Rules { pattern } => {
            let pattern = pattern.as_deref().map(Label::parse).transpose()?;
            for rule in engine.rules_matching(pattern.as_ref()) {
                println!("{}", rule.target);
                for dep in &rule.deps {
                    println!("  <- {dep}");
                }
                if let Some(action) = &rule.action {
                    println!("  action: {action}");
                }
            }
        }
    }
    Ok(())
}

fn parse_targets(texts: &[String]) -> Result<Vec<Target>> {
    texts
        .iter()
        .map(|t| t.parse::<Target>().with_context(|| format!("bad target '{t}'")))
        .collect()
}

fn parse_labels(texts: &[String]) -> Result<Vec<Label>> {
    texts
        .iter()
        .map(|t| Label::parse(t).with_context(|| format!("bad label '{t}'")))
        .collect()
}

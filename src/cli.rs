// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// Command-line arguments for `muddle`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "muddle",
    version,
    about = "Build a tree of checkouts, packages and deployments from labelled rules.",
    long_about = None
)]
pub struct CliArgs {
    /// Root of the build tree (the directory holding `muddle.toml`).
    ///
    /// Default: `MUDDLE_ROOT`, or the nearest enclosing directory with a
    /// `muddle.toml`.
    #[arg(long, value_name = "PATH", env = "MUDDLE_ROOT")]
    pub root: Option<PathBuf>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `MUDDLE_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL", global = true)]
    pub log_level: Option<LogLevel>,

    /// Print what would be done without running or asserting anything.
    #[arg(short = 'n', long, global = true)]
    pub just_print: bool,

    /// What to do. Without a command, targets are chosen from the current
    /// directory.
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Build targets (labels, wildcards or `_all`-style aggregates).
    Build {
        #[arg(value_name = "TARGET")]
        targets: Vec<String>,
    },
    /// Retract targets, then build them again.
    Rebuild {
        #[arg(value_name = "TARGET")]
        targets: Vec<String>,
    },
    /// Mark labels as done without running anything.
    Assert {
        #[arg(value_name = "LABEL", required = true)]
        labels: Vec<String>,
    },
    /// Forget that matching labels were done.
    Retract {
        #[arg(value_name = "PATTERN", required = true)]
        patterns: Vec<String>,
    },
    /// Inspect the rule database and tag store.
    #[command(subcommand)]
    Query(Query),
}

#[derive(Debug, Clone, Subcommand)]
pub enum Query {
    /// Known labels matching a pattern. `[S]` labels are only listed when
    /// the pattern carries `[S]` as well.
    Labels {
        #[arg(value_name = "PATTERN", default_value = "*:*{*}/*")]
        pattern: String,
    },
    /// Whether a label is asserted and what it depends on.
    Status {
        #[arg(value_name = "LABEL")]
        label: String,
    },
    /// Labels a build of the target would run actions for.
    Needed {
        #[arg(value_name = "TARGET", required = true)]
        targets: Vec<String>,
    },
    /// Labels that depend on a label.
    RequiredBy {
        #[arg(value_name = "LABEL")]
        label: String,
    },
    /// Registered rules, optionally only those matching a pattern.
    Rules {
        #[arg(value_name = "PATTERN")]
        pattern: Option<String>,
    },
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}

// src/errors.rs

//! Crate-wide error type and helpers.

use thiserror::Error;

use crate::label::Label;

#[derive(Error, Debug)]
pub enum MuddleError {
    #[error("Malformed label '{text}': {reason}")]
    MalformedLabel { text: String, reason: String },

    #[error("No rules: {0}")]
    NoRules(String),

    #[error("Cyclic dependency: {0}")]
    CyclicDependency(String),

    #[error("Action for {label} failed ({} label(s) asserted before the failure)", asserted.len())]
    ActionFailed {
        label: Label,
        diagnostics: String,
        asserted: Vec<Label>,
    },

    #[error("No default target: {0}")]
    NoDefaultTarget(String),

    #[error("Build interrupted ({} label(s) asserted before the interrupt)", asserted.len())]
    Interrupted { asserted: Vec<Label> },

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl MuddleError {
    pub(crate) fn malformed(text: &str, reason: impl Into<String>) -> Self {
        MuddleError::MalformedLabel {
            text: text.to_string(),
            reason: reason.into(),
        }
    }

    /// Labels that were durably asserted before this error aborted a run.
    ///
    /// Empty for errors raised before scheduling started.
    pub fn asserted_before_failure(&self) -> &[Label] {
        match self {
            MuddleError::ActionFailed { asserted, .. } | MuddleError::Interrupted { asserted } => {
                asserted
            }
            _ => &[],
        }
    }
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, MuddleError>;

// src/label/part.rs

//! A single label component.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

use crate::errors::{MuddleError, Result};

static LITERAL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]+$").expect("literal part regex is valid"));

/// One of `kind`, `name`, `role` or `tag`: a literal or the wildcard `*`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Part {
    Wildcard,
    Literal(String),
}

impl Part {
    /// Validate `value` as the `what` component of the label `text`.
    pub(crate) fn parse(text: &str, what: &str, value: &str) -> Result<Self> {
        if value.is_empty() {
            return Err(MuddleError::malformed(text, format!("empty {what}")));
        }
        if value == "*" {
            return Ok(Part::Wildcard);
        }
        if !LITERAL_RE.is_match(value) {
            return Err(MuddleError::malformed(
                text,
                format!("illegal character in {what} '{value}' (allowed: A-Z a-z 0-9 _ -)"),
            ));
        }
        Ok(Part::Literal(value.to_string()))
    }

    pub fn is_wildcard(&self) -> bool {
        matches!(self, Part::Wildcard)
    }

    pub fn as_literal(&self) -> Option<&str> {
        match self {
            Part::Wildcard => None,
            Part::Literal(s) => Some(s),
        }
    }

    pub(crate) fn is_reserved(&self) -> bool {
        self.as_literal().is_some_and(|s| s.starts_with('_'))
    }

    /// A wildcard on either side matches.
    pub fn matches(&self, other: &Part) -> bool {
        match (self, other) {
            (Part::Wildcard, _) | (_, Part::Wildcard) => true,
            (Part::Literal(a), Part::Literal(b)) => a == b,
        }
    }
}

impl fmt::Display for Part {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Part::Wildcard => f.write_str("*"),
            Part::Literal(s) => f.write_str(s),
        }
    }
}

// src/label/kinds.rs

//! Well-known label kinds and tags.
//!
//! Kinds are open strings as far as the rule database is concerned; these are
//! the ones the build description loader and DWIM resolver know about.

use std::fmt;
use std::str::FromStr;

/// Label kinds with built-in meaning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Kind {
    Checkout,
    Package,
    Deployment,
}

impl Kind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Kind::Checkout => "checkout",
            Kind::Package => "package",
            Kind::Deployment => "deployment",
        }
    }

    /// Tags of this kind in the order they are normally reached.
    pub fn tag_sequence(&self) -> &'static [&'static str] {
        match self {
            Kind::Checkout => &[Tag::CHECKED_OUT],
            Kind::Package => &[
                Tag::PRECONFIG,
                Tag::CONFIGURED,
                Tag::BUILT,
                Tag::INSTALLED,
                Tag::POSTINSTALLED,
            ],
            Kind::Deployment => &[Tag::DEPLOYED],
        }
    }

    /// The tag a plain "build this" request means for this kind.
    pub fn final_tag(&self) -> &'static str {
        match self {
            Kind::Checkout => Tag::CHECKED_OUT,
            Kind::Package => Tag::POSTINSTALLED,
            Kind::Deployment => Tag::DEPLOYED,
        }
    }

    /// Tags that come after `tag` in this kind's sequence, `tag` included.
    ///
    /// Returns an empty slice if `tag` is not part of the sequence.
    pub fn tags_from(&self, tag: &str) -> &'static [&'static str] {
        let seq = self.tag_sequence();
        match seq.iter().position(|t| *t == tag) {
            Some(idx) => &seq[idx..],
            None => &[],
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Kind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "checkout" => Ok(Kind::Checkout),
            "package" => Ok(Kind::Package),
            "deployment" => Ok(Kind::Deployment),
            other => Err(format!(
                "unknown label kind: {other} (expected \"checkout\", \"package\" or \"deployment\")"
            )),
        }
    }
}

/// Conventional tag names.
pub struct Tag;

impl Tag {
    // Checkouts. Everything except `checked_out` depends on `checked_out`
    // and is otherwise independent.
    pub const CHECKED_OUT: &'static str = "checked_out";
    pub const PULLED: &'static str = "pulled";
    pub const MERGED: &'static str = "merged";

    // Packages.
    pub const PRECONFIG: &'static str = "preconfig";
    pub const CONFIGURED: &'static str = "configured";
    pub const BUILT: &'static str = "built";
    pub const INSTALLED: &'static str = "installed";
    pub const POSTINSTALLED: &'static str = "postinstalled";

    // Deployments.
    pub const DEPLOYED: &'static str = "deployed";
}

// src/label/mod.rs

//! Labels: the identifier used for every build entity and state.
//!
//! Canonical text form is `kind:name{role}/tag[flags]`, with the role and
//! flags segments optional. Every component is either a literal drawn from
//! `[A-Za-z0-9_-]+` or the wildcard `*`.
//!
//! - [`part`] holds a single component (`Part`) and its validation.
//! - [`kinds`] lists the well-known kinds and tags and their conventional
//!   ordering.

pub mod kinds;
pub mod part;

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use crate::errors::{MuddleError, Result};

pub use kinds::{Kind, Tag};
pub use part::Part;

/// Whether reserved (`_`-prefixed) names are acceptable while parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameContext {
    /// Labels typed by a user or written in a build description.
    User,
    /// Labels synthesised by muddle itself (aggregates and friends).
    System,
}

/// Flags attached to a label. They never take part in equality, hashing or
/// ordering.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Flags {
    /// `T`: the assertion only lives for the current process.
    pub transient: bool,
    /// `S`: synthesised by muddle; hidden from default listings.
    pub system: bool,
}

impl Flags {
    fn parse(text: &str, flags: &str) -> Result<Self> {
        match flags {
            "T" => Ok(Flags { transient: true, system: false }),
            "S" => Ok(Flags { transient: false, system: true }),
            "TS" => Ok(Flags { transient: true, system: true }),
            "" => Err(MuddleError::malformed(text, "empty flags segment '[]'")),
            other => Err(MuddleError::malformed(
                text,
                format!("unsupported flags '{other}' (expected T, S or TS)"),
            )),
        }
    }

    fn is_empty(&self) -> bool {
        !self.transient && !self.system
    }
}

impl fmt::Display for Flags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.transient {
            f.write_str("T")?;
        }
        if self.system {
            f.write_str("S")?;
        }
        Ok(())
    }
}

/// A structured identifier `kind:name{role}/tag[flags]`.
///
/// Labels are immutable values. Equality, hashing and ordering are
/// structural over `(kind, name, role, tag)`; a label with no role is
/// distinct from one whose role is the wildcard.
#[derive(Debug, Clone)]
pub struct Label {
    kind: Part,
    name: Part,
    role: Option<Part>,
    tag: Part,
    flags: Flags,
}

impl Label {
    /// Build a label from string components, validating each of them in a
    /// user context.
    pub fn new(kind: &str, name: &str, role: Option<&str>, tag: &str) -> Result<Self> {
        Self::with_context(kind, name, role, tag, NameContext::User)
    }

    fn with_context(
        kind: &str,
        name: &str,
        role: Option<&str>,
        tag: &str,
        ctx: NameContext,
    ) -> Result<Self> {
        let text = render_parts(kind, name, role, tag);
        let label = Label {
            kind: Part::parse(&text, "kind", kind)?,
            name: Part::parse(&text, "name", name)?,
            role: role.map(|r| Part::parse(&text, "role", r)).transpose()?,
            tag: Part::parse(&text, "tag", tag)?,
            flags: Flags::default(),
        };
        label.check_reserved(&text, ctx)?;
        Ok(label)
    }

    /// Parse canonical label text in a user context.
    pub fn parse(text: &str) -> Result<Self> {
        Self::parse_in(text, NameContext::User)
    }

    /// Parse canonical label text, accepting reserved names.
    pub fn parse_system(text: &str) -> Result<Self> {
        Self::parse_in(text, NameContext::System)
    }

    pub fn parse_in(text: &str, ctx: NameContext) -> Result<Self> {
        let (kind, rest) = text
            .split_once(':')
            .ok_or_else(|| MuddleError::malformed(text, "missing ':' after kind"))?;
        let (name_role, tag_flags) = rest
            .split_once('/')
            .ok_or_else(|| MuddleError::malformed(text, "missing '/' before tag"))?;

        let (name, role) = match name_role.split_once('{') {
            None => (name_role, None),
            Some((name, role_rest)) => {
                let role = role_rest
                    .strip_suffix('}')
                    .ok_or_else(|| MuddleError::malformed(text, "unterminated role '{'"))?;
                if role.is_empty() {
                    return Err(MuddleError::malformed(text, "empty role '{}'"));
                }
                (name, Some(role))
            }
        };

        let (tag, flags) = match tag_flags.split_once('[') {
            None => (tag_flags, Flags::default()),
            Some((tag, flag_rest)) => {
                let flags = flag_rest
                    .strip_suffix(']')
                    .ok_or_else(|| MuddleError::malformed(text, "unterminated flags '['"))?;
                (tag, Flags::parse(text, flags)?)
            }
        };

        let label = Label {
            kind: Part::parse(text, "kind", kind)?,
            name: Part::parse(text, "name", name)?,
            role: role.map(|r| Part::parse(text, "role", r)).transpose()?,
            tag: Part::parse(text, "tag", tag)?,
            flags,
        };
        label.check_reserved(text, ctx)?;
        Ok(label)
    }

    fn check_reserved(&self, text: &str, ctx: NameContext) -> Result<()> {
        if ctx == NameContext::User && self.name.is_reserved() {
            return Err(MuddleError::malformed(
                text,
                "names beginning with '_' are reserved for muddle",
            ));
        }
        Ok(())
    }

    pub fn kind(&self) -> &Part {
        &self.kind
    }

    pub fn name(&self) -> &Part {
        &self.name
    }

    pub fn role(&self) -> Option<&Part> {
        self.role.as_ref()
    }

    pub fn tag(&self) -> &Part {
        &self.tag
    }

    pub fn flags(&self) -> Flags {
        self.flags
    }

    /// Role as a literal string, if present and not a wildcard.
    pub fn role_str(&self) -> Option<&str> {
        self.role.as_ref().and_then(|r| r.as_literal())
    }

    pub fn is_transient(&self) -> bool {
        self.flags.transient
    }

    pub fn is_system(&self) -> bool {
        self.flags.system
    }

    /// A label is concrete when none of its components is a wildcard.
    pub fn is_concrete(&self) -> bool {
        !self.kind.is_wildcard()
            && !self.name.is_wildcard()
            && !self.role.as_ref().is_some_and(Part::is_wildcard)
            && !self.tag.is_wildcard()
    }

    pub fn is_kind(&self, kind: &str) -> bool {
        self.kind.as_literal() == Some(kind)
    }

    /// Copy of this label with a different tag. Flags are kept.
    pub fn with_tag(&self, tag: &str) -> Result<Self> {
        let text = format!("{self}");
        Ok(Label {
            tag: Part::parse(&text, "tag", tag)?,
            ..self.clone()
        })
    }

    /// Does this label match `pattern`?
    ///
    /// Components are compared one by one and a wildcard on either side
    /// matches anything. A missing role only matches a missing role, while a
    /// wildcard role also matches a missing one.
    pub fn matches(&self, pattern: &Label) -> bool {
        self.kind.matches(&pattern.kind)
            && self.name.matches(&pattern.name)
            && roles_match(self.role.as_ref(), pattern.role.as_ref())
            && self.tag.matches(&pattern.tag)
    }

    /// Resolve this dependency pattern relative to the concrete label a rule
    /// was matched against.
    ///
    /// Name and role wildcards in `self` that line up with wildcards in the
    /// rule's `target_pattern` are replaced by the `concrete` target's
    /// values, so `package:*{*}/built <- checkout:*/checked_out` gives every
    /// package its own checkout. Other wildcards are left for database
    /// expansion.
    pub fn substitute_from(&self, target_pattern: &Label, concrete: &Label) -> Label {
        let name = if self.name.is_wildcard() && target_pattern.name.is_wildcard() {
            concrete.name.clone()
        } else {
            self.name.clone()
        };

        let self_role_wild = self.role.as_ref().is_some_and(Part::is_wildcard);
        let target_role_wild = target_pattern.role.as_ref().is_some_and(Part::is_wildcard);
        let role = if self_role_wild && target_role_wild {
            concrete.role.clone()
        } else {
            self.role.clone()
        };

        Label {
            kind: self.kind.clone(),
            name,
            role,
            tag: self.tag.clone(),
            flags: self.flags,
        }
    }

    fn sort_key(&self) -> (&Part, &Part, Option<&Part>, &Part) {
        (&self.kind, &self.name, self.role.as_ref(), &self.tag)
    }
}

fn roles_match(value: Option<&Part>, pattern: Option<&Part>) -> bool {
    match (value, pattern) {
        (None, None) => true,
        (Some(v), Some(p)) => v.matches(p),
        (None, Some(p)) | (Some(p), None) => p.is_wildcard(),
    }
}

fn render_parts(kind: &str, name: &str, role: Option<&str>, tag: &str) -> String {
    match role {
        Some(role) => format!("{kind}:{name}{{{role}}}/{tag}"),
        None => format!("{kind}:{name}/{tag}"),
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.name)?;
        if let Some(role) = &self.role {
            write!(f, "{{{role}}}")?;
        }
        write!(f, "/{}", self.tag)?;
        if !self.flags.is_empty() {
            write!(f, "[{}]", self.flags)?;
        }
        Ok(())
    }
}

impl FromStr for Label {
    type Err = MuddleError;

    fn from_str(s: &str) -> Result<Self> {
        Label::parse(s)
    }
}

impl PartialEq for Label {
    fn eq(&self, other: &Self) -> bool {
        self.sort_key() == other.sort_key()
    }
}

impl Eq for Label {}

impl Hash for Label {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.sort_key().hash(state);
    }
}

impl PartialOrd for Label {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Label {
    fn cmp(&self, other: &Self) -> Ordering {
        self.sort_key().cmp(&other.sort_key())
    }
}

/// Render a list of labels separated by spaces.
pub fn label_list_to_string(labels: &[Label]) -> String {
    labels
        .iter()
        .map(|l| l.to_string())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn label(s: &str) -> Label {
        Label::parse(s).unwrap()
    }

    #[test]
    fn parses_all_segments() {
        let l = label("package:busybox{rootfs}/installed[T]");
        assert_eq!(l.kind().as_literal(), Some("package"));
        assert_eq!(l.name().as_literal(), Some("busybox"));
        assert_eq!(l.role_str(), Some("rootfs"));
        assert_eq!(l.tag().as_literal(), Some("installed"));
        assert!(l.is_transient());
        assert!(!l.is_system());
    }

    #[test]
    fn role_is_optional() {
        let l = label("checkout:app/checked_out");
        assert!(l.role().is_none());
        assert_eq!(l.to_string(), "checkout:app/checked_out");
    }

    #[test]
    fn renders_canonical_text() {
        for text in [
            "package:busybox/installed",
            "package:busybox{x86}/built",
            "*:*{*}/*",
            "deployment:rootfs/deployed[TS]",
            "checkout:my-app_2/checked_out[S]",
        ] {
            assert_eq!(label(text).to_string(), text);
        }
    }

    #[test]
    fn rejects_malformed_text() {
        for text in [
            "package:busybox",
            "package/built",
            ":busybox/built",
            "package:/built",
            "package:busybox/",
            "package:busybox{}/built",
            "package:busybox{x86/built",
            "package:busybox/built[]",
            "package:busybox/built[X]",
            "package:busy.box/built",
            "package:g++/built",
        ] {
            assert!(
                matches!(Label::parse(text), Err(MuddleError::MalformedLabel { .. })),
                "expected {text} to be rejected"
            );
        }
    }

    #[test]
    fn reserved_names_need_system_context() {
        assert!(Label::parse("package:_all/built").is_err());
        let l = Label::parse_system("package:_all/built").unwrap();
        assert_eq!(l.name().as_literal(), Some("_all"));
    }

    #[test]
    fn flags_do_not_affect_equality() {
        assert_eq!(label("package:a/built[T]"), label("package:a/built"));
    }

    #[test]
    fn absent_role_is_not_wildcard_role() {
        let none = label("package:a/built");
        let any = label("package:a{*}/built");
        let x86 = label("package:a{x86}/built");

        assert_ne!(none, any);
        assert!(none.matches(&any));
        assert!(x86.matches(&any));
        assert!(!x86.matches(&none));
        assert!(!none.matches(&x86));
    }

    #[test]
    fn everything_matches_full_wildcard() {
        let all = label("*:*{*}/*");
        assert!(label("checkout:app/checked_out").matches(&all));
        assert!(label("package:app{arm}/built").matches(&all));
    }

    #[test]
    fn substitution_follows_rule_target_wildcards() {
        let target_pattern = label("package:*{*}/preconfig");
        let dep = label("checkout:*{*}/checked_out");
        let concrete = label("package:app{x86}/preconfig");

        let resolved = dep.substitute_from(&target_pattern, &concrete);
        assert_eq!(resolved, label("checkout:app{x86}/checked_out"));
    }

    #[test]
    fn substitution_keeps_wildcards_the_rule_did_not_have() {
        let target_pattern = label("package:app{x86}/built");
        let dep = label("checkout:app{*}/checked_out");
        let concrete = label("package:app{x86}/built");

        let resolved = dep.substitute_from(&target_pattern, &concrete);
        assert_eq!(resolved, dep);
        assert!(!resolved.is_concrete());
    }

    #[test]
    fn sorts_by_kind_name_role_tag() {
        let mut labels = vec![
            label("package:b/built"),
            label("checkout:z/checked_out"),
            label("package:a{x86}/built"),
            label("package:a/installed"),
        ];
        labels.sort();
        assert_eq!(
            label_list_to_string(&labels),
            "checkout:z/checked_out package:a/installed package:a{x86}/built package:b/built"
        );
    }
}

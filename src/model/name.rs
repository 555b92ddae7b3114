//! Name - qualifier token with an optional namespace
//!
//! Special values:
//! - `*` (any): as a request it accepts every binding, as a binding it serves
//!   every requested name
//! - `` (default): the unqualified name
//! - `prefix*` (pattern, binding side only): serves every name starting with
//!   `prefix`

use std::fmt;
use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{InjectError, Result};
use crate::util::intern;

use super::Qualifying;

const ANY: &str = "*";

/// `ns:value`, `value`, `value*`, `*` or empty
static NAME_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:([A-Za-z_][A-Za-z0-9_.\-]*):)?([A-Za-z0-9_.\-]*\*?)$")
        .expect("name pattern is a valid regex")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum NameKind {
    Any,
    Default,
    Pattern,
    Exact,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Name {
    namespace: Option<Arc<str>>,
    value: Arc<str>,
}

impl Name {
    pub fn any() -> Self {
        Self::named(ANY)
    }

    pub fn named(value: &str) -> Self {
        Self {
            namespace: None,
            value: intern(value),
        }
    }

    pub fn namespaced(namespace: &str, value: &str) -> Self {
        Self {
            namespace: Some(intern(namespace)),
            value: intern(value),
        }
    }

    /// Parse `ns:value` notation, validating the characters used
    pub fn parse(raw: &str) -> Result<Self> {
        let captures = NAME_PATTERN
            .captures(raw)
            .ok_or_else(|| InjectError::InvalidName {
                raw: raw.to_string(),
                reason: "unexpected characters".to_string(),
            })?;
        let value = captures.get(2).map_or("", |m| m.as_str());
        match captures.get(1) {
            Some(namespace) => Ok(Self::namespaced(namespace.as_str(), value)),
            None => Ok(Self::named(value)),
        }
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    pub fn is_any(&self) -> bool {
        &*self.value == ANY
    }

    pub fn is_default(&self) -> bool {
        self.value.is_empty()
    }

    pub fn is_pattern(&self) -> bool {
        self.value.len() > 1 && self.value.ends_with('*')
    }

    /// Default, exact and pattern names each denote one concrete thing
    pub fn is_concrete(&self) -> bool {
        !self.is_any()
    }

    fn kind(&self) -> NameKind {
        if self.is_any() {
            NameKind::Any
        } else if self.is_default() {
            NameKind::Default
        } else if self.is_pattern() {
            NameKind::Pattern
        } else {
            NameKind::Exact
        }
    }

    /// Whether a binding under this name serves a request for `requested`
    pub fn accepts(&self, requested: &Name) -> bool {
        if requested.is_any() {
            return requested.namespace.is_none() || self.namespace == requested.namespace;
        }
        if self.is_any() {
            return self.namespace.is_none() || self.namespace == requested.namespace;
        }
        if self.namespace != requested.namespace {
            return false;
        }
        if self.is_pattern() {
            let prefix = &self.value[..self.value.len() - 1];
            return !requested.is_default() && requested.value.starts_with(prefix);
        }
        self.value == requested.value
    }
}

impl Default for Name {
    fn default() -> Self {
        Self::named("")
    }
}

impl Qualifying for Name {
    /// (exact > pattern > default > any, longer pattern, namespaced)
    type Rank = (NameKindRank, usize, bool);

    fn rank(&self) -> Self::Rank {
        let pattern_len = if self.is_pattern() { self.value.len() } else { 0 };
        (
            NameKindRank(self.kind()),
            pattern_len,
            self.namespace.is_some(),
        )
    }
}

/// Opaque rank of a name's kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct NameKindRank(NameKind);

impl From<&str> for Name {
    fn from(value: &str) -> Self {
        Name::named(value)
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(namespace) = &self.namespace {
            write!(f, "{}:", namespace)?;
        }
        f.write_str(&self.value)
    }
}

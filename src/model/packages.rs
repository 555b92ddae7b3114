//! Packages - predicate over the requester's module path
//!
//! Paths are `::`-separated, as produced by `std::any::type_name`.

use std::fmt;
use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{InjectError, Result};
use crate::types::RawType;
use crate::util::intern;

use super::Qualifying;

static PACKAGE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*(?:::[A-Za-z_][A-Za-z0-9_]*)*$")
        .expect("package pattern is a valid regex")
});

#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum Packages {
    /// Every requester, including top-level requests
    #[default]
    All,
    /// Requesters in exactly this package
    Exact(Arc<str>),
    /// Requesters in this package or any package below it
    Subtree(Arc<str>),
}

impl Packages {
    pub fn all() -> Self {
        Packages::All
    }

    pub fn package(path: &str) -> Self {
        Packages::Exact(intern(path))
    }

    pub fn subtree(path: &str) -> Self {
        Packages::Subtree(intern(path))
    }

    /// Package of `T`, or `All` for types declared at the crate root
    pub fn package_of<T: ?Sized + 'static>() -> Self {
        RawType::of::<T>()
            .package()
            .map_or(Packages::All, Packages::package)
    }

    pub fn subtree_of<T: ?Sized + 'static>() -> Self {
        RawType::of::<T>()
            .package()
            .map_or(Packages::All, Packages::subtree)
    }

    /// Parse `*`, `a::b` (exact) or `a::b::*` (subtree)
    pub fn parse(raw: &str) -> Result<Self> {
        if raw == "*" {
            return Ok(Packages::All);
        }
        let (path, subtree) = match raw.strip_suffix("::*") {
            Some(path) => (path, true),
            None => (raw, false),
        };
        if !PACKAGE_PATTERN.is_match(path) {
            return Err(InjectError::InvalidPackage {
                raw: raw.to_string(),
                reason: "expected '::'-separated identifiers".to_string(),
            });
        }
        Ok(if subtree {
            Packages::subtree(path)
        } else {
            Packages::package(path)
        })
    }

    pub fn is_all(&self) -> bool {
        matches!(self, Packages::All)
    }

    /// Whether a requester living in `package` is covered
    ///
    /// Requests without a known package (top-level requests) are only
    /// covered by `All`.
    pub fn contains(&self, package: Option<&str>) -> bool {
        match (self, package) {
            (Packages::All, _) => true,
            (_, None) => false,
            (Packages::Exact(path), Some(package)) => &**path == package,
            (Packages::Subtree(path), Some(package)) => {
                package == &**path
                    || package
                        .strip_prefix(&**path)
                        .is_some_and(|rest| rest.starts_with("::"))
            }
        }
    }

    fn depth(&self) -> usize {
        match self {
            Packages::All => 0,
            Packages::Exact(path) | Packages::Subtree(path) => path.split("::").count(),
        }
    }
}

impl Qualifying for Packages {
    /// (exact > subtree > all, deeper path)
    type Rank = (u8, usize);

    fn rank(&self) -> Self::Rank {
        let kind = match self {
            Packages::All => 0,
            Packages::Subtree(_) => 1,
            Packages::Exact(_) => 2,
        };
        (kind, self.depth())
    }
}

impl fmt::Display for Packages {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Packages::All => f.write_str("*"),
            Packages::Exact(path) => f.write_str(path),
            Packages::Subtree(path) => write!(f, "{}::*", path),
        }
    }
}

//! DeclarationType - how explicitly a binding was declared
//!
//! Variants are ordered from least to most qualified, so the derived `Ord`
//! is the qualification order. `Required` is never beaten.

use std::fmt;

use super::Qualifying;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DeclarationType {
    /// Derived by the engine, e.g. from a constructor
    Implicit,
    /// Fallback that any other declaration overrides
    Default,
    /// Mirrored from a producer method of another binding
    Provided,
    /// Discovered automatically
    Auto,
    /// One of several simultaneous bindings for a collection request
    Multi,
    /// Declared by hand
    Explicit,
    /// Must win; a second required declaration is a clash
    Required,
}

impl DeclarationType {
    /// Whether two declarations in the same top tier cannot coexist
    pub fn clashes_with(self, other: DeclarationType) -> bool {
        use DeclarationType::*;
        matches!(
            (self, other),
            (Explicit, Explicit) | (Explicit, Multi) | (Multi, Explicit) | (Required, Required)
        )
    }

    /// Multi declarations are kept side by side instead of overriding each other
    pub fn is_multi(self) -> bool {
        self == DeclarationType::Multi
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DeclarationType::Implicit => "implicit",
            DeclarationType::Default => "default",
            DeclarationType::Provided => "provided",
            DeclarationType::Auto => "auto",
            DeclarationType::Multi => "multi",
            DeclarationType::Explicit => "explicit",
            DeclarationType::Required => "required",
        }
    }
}

impl Qualifying for DeclarationType {
    type Rank = DeclarationType;

    fn rank(&self) -> Self::Rank {
        *self
    }
}

impl fmt::Display for DeclarationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use DeclarationType::*;

    #[test]
    fn explicit_beats_multi_beats_auto_beats_default_beats_implicit() {
        assert!(Explicit.more_qualified_than(&Multi));
        assert!(Multi.more_qualified_than(&Auto));
        assert!(Auto.more_qualified_than(&Default));
        assert!(Default.more_qualified_than(&Implicit));
        assert!(Required.more_qualified_than(&Explicit));
    }

    #[test]
    fn clash_relation() {
        assert!(Explicit.clashes_with(Explicit));
        assert!(Explicit.clashes_with(Multi));
        assert!(Multi.clashes_with(Explicit));
        assert!(Required.clashes_with(Required));
        assert!(!Multi.clashes_with(Multi));
        assert!(!Auto.clashes_with(Auto));
        assert!(!Default.clashes_with(Explicit));
    }
}

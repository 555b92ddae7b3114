//! Target - where a binding may be injected
//!
//! A target is the instance being injected into plus an optional chain of
//! ancestors further up the injection stack. `Target::any()` is unscoped and
//! always available.
//!
//! Matching against a stack (innermost frame last):
//! - the target instance must match the innermost frame's provided instance
//! - each parent must match a frame further out, in order; frames in
//!   between are skipped
//!
//! Upper-bound target types match subtypes (partial matching), exact types
//! must be equal.

use std::fmt;

use smallvec::SmallVec;

use super::{Injection, Instance, Qualifying};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Target {
    instance: Instance,
    parents: SmallVec<[Instance; 2]>,
}

impl Target {
    /// Unscoped: available everywhere, including top-level requests
    pub fn any() -> Self {
        Self {
            instance: Instance::any(),
            parents: SmallVec::new(),
        }
    }

    /// Only when injected into `instance`
    pub fn injecting_into(instance: Instance) -> Self {
        Self {
            instance,
            parents: SmallVec::new(),
        }
    }

    /// Additionally require `parent` further out on the stack
    ///
    /// Parents are listed innermost first.
    pub fn within(mut self, parent: Instance) -> Self {
        self.parents.push(parent);
        self
    }

    pub fn instance(&self) -> &Instance {
        &self.instance
    }

    pub fn parents(&self) -> &[Instance] {
        &self.parents
    }

    pub fn is_unscoped(&self) -> bool {
        self.instance.is_any() && self.parents.is_empty()
    }

    /// Whether the target constraint holds for `stack` (innermost last)
    pub fn is_available_for(&self, stack: &[Injection]) -> bool {
        if self.is_unscoped() {
            return true;
        }
        let mut frames = stack.iter().rev();
        let Some(innermost) = frames.next() else {
            return false;
        };
        if !self.instance.matches(&innermost.provided) {
            return false;
        }
        self.parents
            .iter()
            .all(|parent| frames.any(|frame| parent.matches(&frame.provided)))
    }
}

impl Default for Target {
    fn default() -> Self {
        Self::any()
    }
}

impl Qualifying for Target {
    /// (scoped, target instance, longer chain)
    type Rank = (bool, <Instance as Qualifying>::Rank, usize);

    fn rank(&self) -> Self::Rank {
        (!self.is_unscoped(), self.instance.rank(), self.parents.len())
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_unscoped() {
            return f.write_str("*");
        }
        write!(f, "{}", self.instance)?;
        for parent in &self.parents {
            write!(f, " <- {}", parent)?;
        }
        Ok(())
    }
}

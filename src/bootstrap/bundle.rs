//! Modules, bundles and the bindings collector
//!
//! A [`Module`] declares bindings. A [`Bundle`] installs modules and other
//! bundles. Both are identified by name (their type name unless
//! overridden), which is what install-once and feature toggles key on.

use std::any::{type_name, Any};
use std::fmt;
use std::sync::Arc;

use crate::error::Result;
use crate::model::{
    constant, Binding, DeclarationType, Locator, Source, Supplier,
};
use crate::scope::ScopeId;
use crate::util::intern;

use super::Environment;

/// Declares bindings into the shared collector
pub trait Module: Send + Sync {
    fn name(&self) -> &str {
        type_name::<Self>()
    }

    fn declare(&self, bindings: &mut Bindings, env: &Environment) -> Result<()>;
}

/// Groups modules and other bundles
pub trait Bundle: Send + Sync {
    fn name(&self) -> &str {
        type_name::<Self>()
    }

    fn bootstrap(&self, installer: &mut Installer);
}

/// Something a bundle installs
#[derive(Clone)]
pub(crate) enum Installable {
    Bundle(Arc<dyn Bundle>),
    Module(Arc<dyn Module>),
}

impl Installable {
    pub(crate) fn name(&self) -> &str {
        match self {
            Installable::Bundle(bundle) => bundle.name(),
            Installable::Module(module) => module.name(),
        }
    }
}

/// Records what a bundle installs, in order
#[derive(Default)]
pub struct Installer {
    pub(crate) items: Vec<Installable>,
}

impl Installer {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub fn install(&mut self, bundle: impl Bundle + 'static) -> &mut Self {
        self.items.push(Installable::Bundle(Arc::new(bundle)));
        self
    }

    pub fn install_module(&mut self, module: impl Module + 'static) -> &mut Self {
        self.items.push(Installable::Module(Arc::new(module)));
        self
    }

    pub fn install_shared(&mut self, bundle: Arc<dyn Bundle>) -> &mut Self {
        self.items.push(Installable::Bundle(bundle));
        self
    }
}

/// Append-only binding collector handed to `Module::declare`
pub struct Bindings {
    module: Arc<str>,
    entries: Vec<Binding>,
}

impl Bindings {
    pub fn new(module: &str) -> Self {
        Self {
            module: intern(module),
            entries: Vec::new(),
        }
    }

    /// Provenance of the next binding
    pub fn next_source(&self) -> Source {
        Source::new(Arc::clone(&self.module), self.entries.len())
    }

    /// Add a binding as is; incomplete ones fail when frozen
    pub fn add(&mut self, binding: Binding) -> &mut Self {
        self.entries.push(binding);
        self
    }

    /// Add a complete binding of any declaration type
    pub fn declare(
        &mut self,
        kind: DeclarationType,
        locator: Locator,
        scope: ScopeId,
        supplier: Supplier,
    ) -> &mut Self {
        let binding = Binding::new(locator, kind, self.next_source()).complete(supplier, scope);
        self.add(binding)
    }

    /// Explicit application-scoped binding
    pub fn bind(&mut self, locator: Locator, supplier: Supplier) -> &mut Self {
        self.declare(
            DeclarationType::Explicit,
            locator,
            ScopeId::application(),
            supplier,
        )
    }

    /// Explicit binding in `scope`
    pub fn bind_in(&mut self, locator: Locator, scope: ScopeId, supplier: Supplier) -> &mut Self {
        self.declare(DeclarationType::Explicit, locator, scope, supplier)
    }

    /// One of several bindings served together for collection requests
    pub fn multi(&mut self, locator: Locator, supplier: Supplier) -> &mut Self {
        self.declare(
            DeclarationType::Multi,
            locator,
            ScopeId::application(),
            supplier,
        )
    }

    /// Explicit binding to a fixed value
    pub fn constant<T: Any + Send + Sync>(&mut self, locator: Locator, value: T) -> &mut Self {
        self.bind(locator, constant(value))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Binding> {
        self.entries.iter()
    }

    pub fn into_vec(self) -> Vec<Binding> {
        self.entries
    }
}

impl fmt::Debug for Bindings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bindings")
            .field("module", &self.module)
            .field("entries", &self.entries)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::supplier;

    struct Port;

    #[test]
    fn sources_count_up_per_module() {
        let mut bindings = Bindings::new("net");
        bindings
            .constant(Locator::named::<u16>("port"), 80u16)
            .multi(Locator::of::<Port>(), supplier(|_| Ok(Port)));
        let entries = bindings.into_vec();
        assert_eq!(entries[0].source().to_string(), "net#0");
        assert_eq!(entries[1].source().to_string(), "net#1");
        assert_eq!(entries[1].kind(), DeclarationType::Multi);
    }

    #[test]
    fn default_names_are_type_names() {
        struct Core;
        impl Module for Core {
            fn declare(&self, _: &mut Bindings, _: &Environment) -> Result<()> {
                Ok(())
            }
        }
        assert!(Core.name().ends_with("Core"));
    }
}

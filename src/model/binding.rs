//! Binding - locator + declaration type + producer + scope + provenance

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::engine::Context;
use crate::scope::ScopeId;

use super::{DeclarationType, Locator, Qualifying};

/// Type-erased instance
pub type Object = Arc<dyn Any + Send + Sync>;

/// Producer of instances; resolves its own dependencies through the context
pub type Supplier = Arc<dyn Fn(&Context<'_>) -> anyhow::Result<Object> + Send + Sync>;

/// Wrap a typed producer closure
pub fn supplier<T, F>(produce: F) -> Supplier
where
    T: Any + Send + Sync,
    F: Fn(&Context<'_>) -> anyhow::Result<T> + Send + Sync + 'static,
{
    Arc::new(move |context| Ok(Arc::new(produce(context)?) as Object))
}

/// Producer that always hands out the same value
pub fn constant<T: Any + Send + Sync>(value: T) -> Supplier {
    let value: Object = Arc::new(value);
    Arc::new(move |_| Ok(Arc::clone(&value)))
}

/// Where a binding was declared
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Source {
    /// Declaring module
    pub module: Arc<str>,
    /// Position within the module's declarations
    pub ordinal: usize,
}

impl Source {
    pub fn new(module: Arc<str>, ordinal: usize) -> Self {
        Self { module, ordinal }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.module, self.ordinal)
    }
}

#[derive(Clone)]
pub struct Binding {
    locator: Locator,
    kind: DeclarationType,
    scope: ScopeId,
    supplier: Option<Supplier>,
    source: Source,
}

impl Binding {
    /// Incomplete binding: no producer yet, application scope
    pub fn new(locator: Locator, kind: DeclarationType, source: Source) -> Self {
        Self {
            locator,
            kind,
            scope: ScopeId::application(),
            supplier: None,
            source,
        }
    }

    /// Attach producer and scope
    pub fn complete(mut self, supplier: Supplier, scope: ScopeId) -> Self {
        self.supplier = Some(supplier);
        self.scope = scope;
        self
    }

    pub fn is_complete(&self) -> bool {
        self.supplier.is_some()
    }

    pub fn locator(&self) -> &Locator {
        &self.locator
    }

    pub fn kind(&self) -> DeclarationType {
        self.kind
    }

    pub fn scope(&self) -> &ScopeId {
        &self.scope
    }

    pub fn supplier(&self) -> Option<&Supplier> {
        self.supplier.as_ref()
    }

    pub fn source(&self) -> &Source {
        &self.source
    }
}

impl Qualifying for Binding {
    /// Declaration type first, then the locator
    type Rank = (DeclarationType, <Locator as Qualifying>::Rank);

    fn rank(&self) -> Self::Rank {
        (self.kind, self.locator.rank())
    }
}

impl fmt::Debug for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Binding")
            .field("locator", &self.locator.to_string())
            .field("kind", &self.kind)
            .field("scope", &self.scope)
            .field("complete", &self.is_complete())
            .field("source", &self.source)
            .finish()
    }
}

impl fmt::Display for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} [{}, {}] from {}",
            self.locator, self.kind, self.scope, self.source
        )
    }
}

//! Resource - a frozen, servable binding with its scope slot

use std::fmt;
use std::sync::Arc;

use crate::model::{Binding, DeclarationType, Locator, Qualifying, Source, Supplier};
use crate::scope::{Scope, ScopeId};

#[derive(Clone)]
pub struct Resource {
    serial: usize,
    locator: Locator,
    kind: DeclarationType,
    source: Source,
    supplier: Supplier,
    scope_id: ScopeId,
    scope: Arc<dyn Scope>,
    slot: usize,
    slots: usize,
}

impl Resource {
    pub(crate) fn new(
        serial: usize,
        binding: &Binding,
        supplier: Supplier,
        scope: Arc<dyn Scope>,
        slot: usize,
    ) -> Self {
        Self {
            serial,
            locator: binding.locator().clone(),
            kind: binding.kind(),
            source: binding.source().clone(),
            supplier,
            scope_id: binding.scope().clone(),
            scope,
            slot,
            slots: slot + 1,
        }
    }

    /// Slot count of the resource's scope, known once every slot is assigned
    pub(crate) fn set_slots(&mut self, slots: usize) {
        self.slots = slots;
    }

    /// Position in the injector's resource array
    pub fn serial(&self) -> usize {
        self.serial
    }

    pub fn locator(&self) -> &Locator {
        &self.locator
    }

    pub fn kind(&self) -> DeclarationType {
        self.kind
    }

    pub fn source(&self) -> &Source {
        &self.source
    }

    pub fn scope_id(&self) -> &ScopeId {
        &self.scope_id
    }

    /// Cache index within the scope
    pub fn slot(&self) -> usize {
        self.slot
    }

    pub fn slots(&self) -> usize {
        self.slots
    }

    pub(crate) fn supplier(&self) -> &Supplier {
        &self.supplier
    }

    pub(crate) fn scope(&self) -> &dyn Scope {
        self.scope.as_ref()
    }
}

impl Qualifying for Resource {
    type Rank = (DeclarationType, <Locator as Qualifying>::Rank);

    fn rank(&self) -> Self::Rank {
        (self.kind, self.locator.rank())
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}] from {}", self.locator, self.kind, self.source)
    }
}

impl fmt::Debug for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resource")
            .field("serial", &self.serial)
            .field("locator", &self.locator.to_string())
            .field("kind", &self.kind)
            .field("scope", &self.scope_id)
            .field("slot", &self.slot)
            .finish()
    }
}

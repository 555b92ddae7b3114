//! Dependency-keyed scope - one instance per slot and derived request key
//!
//! Unlike slot scopes the key space is unbounded: every distinct key
//! derived from a request gets its own instance. Publication is
//! insert-if-absent, first writer wins.

use std::sync::Arc;

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::error::Result;
use crate::model::{Dependency, Object};

use super::Scope;

/// How a cache key is derived from a request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyDerivation {
    /// Requested type only
    #[default]
    Type,
    /// Requested type and name
    TypeAndName,
    /// Requested instance and every frame it is injected into
    Target,
}

impl KeyDerivation {
    pub fn key(self, dependency: &Dependency) -> String {
        match self {
            KeyDerivation::Type => dependency.type_signature(),
            KeyDerivation::TypeAndName => dependency.instance_signature(),
            KeyDerivation::Target => dependency.target_signature(),
        }
    }

    /// Key including the slot, so resources sharing a scope never collide
    pub fn slot_key(self, slot: usize, dependency: &Dependency) -> String {
        format!("{}:{}", slot, self.key(dependency))
    }
}

pub struct DependencyScope {
    derivation: KeyDerivation,
    cache: DashMap<String, Object>,
}

impl DependencyScope {
    pub fn new(derivation: KeyDerivation) -> Self {
        Self {
            derivation,
            cache: DashMap::new(),
        }
    }

    pub fn derivation(&self) -> KeyDerivation {
        self.derivation
    }

    /// Number of cached instances
    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }
}

impl Scope for DependencyScope {
    fn provide(
        &self,
        slot: usize,
        _slots: usize,
        dependency: &Dependency,
        producer: &dyn Fn() -> Result<Object>,
    ) -> Result<Object> {
        let key = self.derivation.slot_key(slot, dependency);
        if let Some(existing) = self.cache.get(&key) {
            return Ok(Arc::clone(existing.value()));
        }
        // no shard lock held while producing
        let produced = producer()?;
        trace!(key = %key, "dependency scope populated");
        let published = self.cache.entry(key).or_insert(produced);
        Ok(Arc::clone(published.value()))
    }
}

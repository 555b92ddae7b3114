//! Snapshot scope - a stable cache filled once from a volatile scope
//!
//! `provide` always goes to `dest`. Only when `dest` misses does its
//! producer call through to `src`, so `dest` keeps whatever `src` handed
//! out at that moment, whatever `src` does afterwards.

use std::sync::Arc;

use crate::error::Result;
use crate::model::{Dependency, Object};

use super::Scope;

pub struct SnapshotScope {
    src: Arc<dyn Scope>,
    dest: Arc<dyn Scope>,
}

impl SnapshotScope {
    pub fn new(src: Arc<dyn Scope>, dest: Arc<dyn Scope>) -> Self {
        Self { src, dest }
    }
}

impl Scope for SnapshotScope {
    fn provide(
        &self,
        slot: usize,
        slots: usize,
        dependency: &Dependency,
        producer: &dyn Fn() -> Result<Object>,
    ) -> Result<Object> {
        self.dest.provide(slot, slots, dependency, &|| {
            self.src.provide(slot, slots, dependency, producer)
        })
    }

    fn parts(&self) -> Vec<Arc<dyn Scope>> {
        vec![Arc::clone(&self.src), Arc::clone(&self.dest)]
    }
}

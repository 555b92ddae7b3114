//! Thread scope - one instance per slot and thread
//!
//! Each scope owns the slot arrays of every thread that used it, so dropping
//! the scope releases all of them, including those of threads still running.

use std::sync::Arc;
use std::thread::{self, ThreadId};

use dashmap::DashMap;

use crate::error::Result;
use crate::model::{Dependency, Object};

use super::{Scope, SlotArray};

#[derive(Default)]
pub struct ThreadScope {
    threads: DashMap<ThreadId, Arc<SlotArray>>,
}

impl ThreadScope {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of threads holding a slot array
    pub fn threads(&self) -> usize {
        self.threads.len()
    }

    fn slots(&self, len: usize) -> Arc<SlotArray> {
        Arc::clone(
            self.threads
                .entry(thread::current().id())
                .or_insert_with(|| Arc::new(SlotArray::new(len)))
                .value(),
        )
    }
}

impl Scope for ThreadScope {
    fn provide(
        &self,
        slot: usize,
        slots: usize,
        _dependency: &Dependency,
        producer: &dyn Fn() -> Result<Object>,
    ) -> Result<Object> {
        // the map guard ends before the producer runs: it may resolve
        // other thread-scoped resources
        self.slots(slots).provide(slot, slots, producer)
    }
}

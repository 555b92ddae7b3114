//! Worker scope - one instance per slot and unit of work
//!
//! Models request scope on a thread pool: the thread accepting a request
//! calls [`WorkerScope::begin`], hands [`WorkerScope::current`] to a pool
//! worker, and the worker installs it with [`WorkerScope::enter`] (or
//! `allocate`/`deallocate`) for the duration of the task. Every thread that
//! holds the same [`WorkerState`] shares the same instances.
//!
//! Resolving a worker-scoped resource on a thread without an allocated
//! state fails with `ScopeNotAllocated`. Allocations belong to the scope:
//! dropping it releases every state still allocated on any thread.

use std::sync::Arc;
use std::thread::{self, ThreadId};

use dashmap::DashMap;
use tracing::trace;

use crate::error::{InjectError, Result};
use crate::model::{Dependency, Object};

use super::{Scope, SlotArray};

/// Slot array of one unit of work, transferable between threads
#[derive(Clone, Default)]
pub struct WorkerState(Arc<SlotArray>);

impl WorkerState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn same_as(&self, other: &WorkerState) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

#[derive(Default)]
pub struct WorkerScope {
    allocated: DashMap<ThreadId, WorkerState>,
}

impl WorkerScope {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a fresh unit of work on the current thread
    pub fn begin(&self) -> WorkerState {
        let state = WorkerState::new();
        self.allocate(state.clone());
        state
    }

    /// State allocated on the current thread
    pub fn current(&self) -> Option<WorkerState> {
        self.allocated
            .get(&thread::current().id())
            .map(|state| state.value().clone())
    }

    /// Install `state` on the current thread, replacing any previous one
    pub fn allocate(&self, state: WorkerState) -> Option<WorkerState> {
        trace!(thread = ?thread::current().id(), "worker state allocated");
        self.allocated.insert(thread::current().id(), state)
    }

    /// Remove the current thread's state
    pub fn deallocate(&self) -> Option<WorkerState> {
        trace!(thread = ?thread::current().id(), "worker state deallocated");
        self.allocated
            .remove(&thread::current().id())
            .map(|(_, state)| state)
    }

    /// Allocate `state` until the guard drops, then restore what was there
    pub fn enter(&self, state: WorkerState) -> WorkerGuard<'_> {
        let previous = self.allocate(state);
        WorkerGuard {
            scope: self,
            previous,
        }
    }
}

impl Scope for WorkerScope {
    fn provide(
        &self,
        slot: usize,
        slots: usize,
        _dependency: &Dependency,
        producer: &dyn Fn() -> Result<Object>,
    ) -> Result<Object> {
        let state = self.current().ok_or_else(|| InjectError::ScopeNotAllocated {
            scope: "worker".to_string(),
        })?;
        state.0.provide(slot, slots, producer)
    }
}

/// Restores the previously allocated state on drop
pub struct WorkerGuard<'a> {
    scope: &'a WorkerScope,
    previous: Option<WorkerState>,
}

impl Drop for WorkerGuard<'_> {
    fn drop(&mut self) {
        match self.previous.take() {
            Some(previous) => {
                self.scope.allocate(previous);
            }
            None => {
                self.scope.deallocate();
            }
        }
    }
}

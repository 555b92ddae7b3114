//! Scope Subsystem - caching and lifecycle policies
//!
//! A scope decides how often a resource's producer runs and who shares the
//! result. Every resource carries a slot id that is unique within its scope
//! and stable for a frozen injector; slot-based scopes use it directly as
//! their cache index, keyed scopes prefix their derived keys with it.
//!
//! Policies:
//! - `application`: one instance per slot for the injector's lifetime
//! - `thread`: one instance per slot and thread
//! - `worker`: one instance per slot and explicitly handed-over work unit
//! - `dependency`: one instance per slot and key derived from the request
//! - `transient`: no caching
//! - `disk`: serialized to one file per derived key, reloaded when stale
//! - `snapshot`: a stable cache filled once from a volatile source scope
//!
//! Producer failures are never cached: the slot stays empty and a later
//! request retries.

mod application;
mod dependency;
mod disk;
mod slots;
mod snapshot;
mod thread;
mod transient;
mod worker;

use std::fmt;
use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::error::{InjectError, Result};
use crate::model::{Dependency, Object};
use crate::util::intern;

pub use application::ApplicationScope;
pub use dependency::{DependencyScope, KeyDerivation};
pub use disk::{BincodeCodec, Codec, DiskScope, SyncReport};
pub use slots::SlotArray;
pub use snapshot::SnapshotScope;
pub use thread::ThreadScope;
pub use transient::TransientScope;
pub use worker::{WorkerGuard, WorkerScope, WorkerState};

/// Caching policy
///
/// Implementations must be safe to call concurrently for the same and for
/// different slots.
pub trait Scope: Send + Sync {
    /// Return the instance for `slot`, invoking `producer` at most once per
    /// cache miss. `slots` is the number of slots in this scope.
    fn provide(
        &self,
        slot: usize,
        slots: usize,
        dependency: &Dependency,
        producer: &dyn Fn() -> Result<Object>,
    ) -> Result<Object>;

    /// Called once when the owning injector shuts down
    fn shutdown(&self) {}

    /// Scopes whose caches this one fills on its own behalf
    ///
    /// Slot ids are numbered across a scope and all of its parts.
    fn parts(&self) -> Vec<Arc<dyn Scope>> {
        Vec::new()
    }
}

/// Name a scope is registered under
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScopeId(Arc<str>);

impl ScopeId {
    pub fn new(name: &str) -> Self {
        Self(intern(name))
    }

    pub fn application() -> Self {
        Self::new("application")
    }

    pub fn thread() -> Self {
        Self::new("thread")
    }

    pub fn worker() -> Self {
        Self::new("worker")
    }

    /// Keyed by the requested type
    pub fn dependency_type() -> Self {
        Self::new("dependency-type")
    }

    /// Keyed by the requested type and name
    pub fn dependency() -> Self {
        Self::new("dependency")
    }

    /// Keyed by the requested instance and every frame it is injected into
    pub fn target_instance() -> Self {
        Self::new("target-instance")
    }

    pub fn transient() -> Self {
        Self::new("transient")
    }

    pub fn disk() -> Self {
        Self::new("disk")
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ScopeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Scope registry consulted when bindings are frozen into resources
#[derive(Clone, Default)]
pub struct Scopes {
    scopes: FxHashMap<ScopeId, Arc<dyn Scope>>,
}

impl Scopes {
    /// Registry without any scope
    pub fn empty() -> Self {
        Self::default()
    }

    /// Application, thread, worker, the three dependency-keyed scopes and
    /// transient
    pub fn standard() -> Self {
        let mut scopes = Self::empty();
        scopes.register(ScopeId::application(), ApplicationScope::new());
        scopes.register(ScopeId::thread(), ThreadScope::new());
        scopes.register(ScopeId::worker(), WorkerScope::new());
        scopes.register(
            ScopeId::dependency_type(),
            DependencyScope::new(KeyDerivation::Type),
        );
        scopes.register(
            ScopeId::dependency(),
            DependencyScope::new(KeyDerivation::TypeAndName),
        );
        scopes.register(
            ScopeId::target_instance(),
            DependencyScope::new(KeyDerivation::Target),
        );
        scopes.register(ScopeId::transient(), TransientScope);
        scopes
    }

    /// Register (or replace) the scope for `id`
    pub fn register(&mut self, id: ScopeId, scope: impl Scope + 'static) -> &mut Self {
        self.register_shared(id, Arc::new(scope))
    }

    pub fn register_shared(&mut self, id: ScopeId, scope: Arc<dyn Scope>) -> &mut Self {
        self.scopes.insert(id, scope);
        self
    }

    /// Register a snapshot of `src` cached in `dest` under `id`
    pub fn register_snapshot(&mut self, id: ScopeId, src: &ScopeId, dest: &ScopeId) -> Result<&mut Self> {
        let src = self.require(src, &id)?;
        let dest = self.require(dest, &id)?;
        Ok(self.register(id, SnapshotScope::new(src, dest)))
    }

    pub fn get(&self, id: &ScopeId) -> Option<Arc<dyn Scope>> {
        self.scopes.get(id).cloned()
    }

    pub fn contains(&self, id: &ScopeId) -> bool {
        self.scopes.contains_key(id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &ScopeId> {
        self.scopes.keys()
    }

    fn require(&self, id: &ScopeId, for_scope: &ScopeId) -> Result<Arc<dyn Scope>> {
        self.get(id).ok_or_else(|| InjectError::UnknownScope {
            scope: id.to_string(),
            locator: format!("snapshot scope '{}'", for_scope),
        })
    }
}

impl fmt::Debug for Scopes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut ids: Vec<&ScopeId> = self.scopes.keys().collect();
        ids.sort();
        f.debug_struct("Scopes").field("ids", &ids).finish()
    }
}

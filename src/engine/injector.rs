//! Injector - resolves requests against the frozen resource set
//!
//! Resolution of a single-valued request:
//! 1. candidates from the raw-type index
//! 2. keep the ones whose locator is compatible with the request
//! 3. pick the single most qualified; a tie is an `Ambiguous` error
//! 4. serve it through its scope with the resource pushed on the stack
//!
//! Array requests first look for resources bound to the array type itself.
//! Without any, every compatible resource of the component type is served,
//! most qualified first, and the result is an `Arc<Vec<Object>>` (empty
//! when nothing matches).

use std::any::Any;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use rustc_hash::FxHashSet;
use tracing::{debug, trace};

use crate::bootstrap::Environment;
use crate::error::{InjectError, Result};
use crate::model::{by_qualification, top_tier, Dependency, Instance, Locator, Name, Object};
use crate::scope::Scope;
use crate::types::Type;

use super::index::ResourceIndex;
use super::{Context, Resource};

/// Near misses listed in an `Unresolvable` error
const MAX_NEAR_MISSES: usize = 5;

type ShutdownHook = Box<dyn FnOnce() + Send>;

pub struct Injector {
    resources: Arc<[Resource]>,
    index: ResourceIndex,
    scopes: Vec<Arc<dyn Scope>>,
    env: Environment,
    hooks: Mutex<Vec<ShutdownHook>>,
    shut_down: AtomicBool,
}

impl Injector {
    pub(crate) fn new(
        resources: Vec<Resource>,
        scopes: Vec<Arc<dyn Scope>>,
        env: Environment,
    ) -> Self {
        let index = ResourceIndex::build(&resources);
        Self {
            resources: Arc::from(resources),
            index,
            scopes,
            env,
            hooks: Mutex::new(Vec::new()),
            shut_down: AtomicBool::new(false),
        }
    }

    pub fn env(&self) -> &Environment {
        &self.env
    }

    /// Frozen resources in serial order
    pub fn resource_list(&self) -> &[Resource] {
        &self.resources
    }

    /// Locators of every resource, in serial order
    pub fn resources(&self) -> Vec<&Locator> {
        self.resources.iter().map(Resource::locator).collect()
    }

    /// Resolve `dependency` to one instance
    pub fn resolve(&self, dependency: &Dependency) -> Result<Object> {
        trace!(dependency = %dependency, "resolving");
        if dependency.is_multi() {
            let direct: Vec<&Resource> = self
                .compatible(dependency)
                .into_iter()
                .filter(|resource| resource.locator().ty().is_array())
                .collect();
            if !direct.is_empty() {
                return self.serve_best(dependency, direct);
            }
            let elements: Object = Arc::new(self.resolve_all(&dependency.element())?);
            return Ok(elements);
        }
        let candidates = self.compatible(dependency);
        self.serve_best(dependency, candidates)
    }

    /// Every compatible instance, most qualified first
    ///
    /// Never fails for lack of candidates: the result is empty instead.
    pub fn resolve_all(&self, dependency: &Dependency) -> Result<Vec<Object>> {
        let candidates = self.compatible(dependency);
        by_qualification(&candidates)
            .into_iter()
            .map(|i| self.serve(dependency, candidates[i]))
            .collect()
    }

    /// Default-named instance of `T`
    pub fn instance<T: Any + Send + Sync>(&self) -> Result<Arc<T>> {
        let dependency = Dependency::of::<T>();
        downcast(self.resolve(&dependency)?, &dependency)
    }

    pub fn named<T: Any + Send + Sync>(&self, name: impl Into<Name>) -> Result<Arc<T>> {
        let dependency = Dependency::named::<T>(name);
        downcast(self.resolve(&dependency)?, &dependency)
    }

    /// Every instance of `T`, whatever its name
    pub fn all<T: Any + Send + Sync>(&self) -> Result<Vec<Arc<T>>> {
        let dependency = Dependency::new(Instance::new(Name::any(), Type::of::<T>()));
        self.resolve_all(&dependency)?
            .into_iter()
            .map(|object| downcast(object, &dependency))
            .collect()
    }

    /// Register a callback for [`Injector::shutdown`]
    pub fn on_shutdown(&self, hook: impl FnOnce() + Send + 'static) {
        self.hooks.lock().push(Box::new(hook));
    }

    /// Run shutdown callbacks (latest first), then shut every scope down
    ///
    /// Only the first call has an effect.
    pub fn shutdown(&self) {
        if self.shut_down.swap(true, Ordering::AcqRel) {
            return;
        }
        let hooks: Vec<ShutdownHook> = std::mem::take(&mut *self.hooks.lock());
        let count = hooks.len();
        for hook in hooks.into_iter().rev() {
            hook();
        }
        for scope in &self.scopes {
            scope.shutdown();
        }
        debug!(hooks = count, scopes = self.scopes.len(), "injector shut down");
    }

    pub fn is_shut_down(&self) -> bool {
        self.shut_down.load(Ordering::Acquire)
    }

    fn compatible(&self, dependency: &Dependency) -> Vec<&Resource> {
        self.index
            .candidates(dependency)
            .into_iter()
            .map(|serial| &self.resources[serial])
            .filter(|resource| resource.locator().is_compatible_with(dependency))
            .collect()
    }

    fn serve_best(&self, dependency: &Dependency, candidates: Vec<&Resource>) -> Result<Object> {
        if candidates.is_empty() {
            return Err(self.unresolvable(dependency));
        }
        if dependency.name().is_any() {
            self.check_distinct_names(dependency, &candidates)?;
        }
        let best = top_tier(&candidates);
        if let [first, second, ..] = best.as_slice() {
            return Err(InjectError::Ambiguous {
                dependency: dependency.to_string(),
                first: candidates[*first].to_string(),
                second: candidates[*second].to_string(),
            });
        }
        self.serve(dependency, candidates[best[0]])
    }

    /// An any-name request matching differently named resources has no
    /// single answer, whatever their declaration types.
    fn check_distinct_names(&self, dependency: &Dependency, candidates: &[&Resource]) -> Result<()> {
        let mut seen: FxHashSet<&Name> = FxHashSet::default();
        let mut first: Option<&Resource> = None;
        for resource in candidates {
            let name = resource.locator().name();
            if !name.is_concrete() || !seen.insert(name) {
                continue;
            }
            match first {
                None => first = Some(*resource),
                Some(first) => {
                    return Err(InjectError::Ambiguous {
                        dependency: dependency.to_string(),
                        first: first.to_string(),
                        second: resource.to_string(),
                    })
                }
            }
        }
        Ok(())
    }

    fn serve(&self, dependency: &Dependency, resource: &Resource) -> Result<Object> {
        if dependency.is_serving(resource.serial()) {
            return Err(InjectError::Cyclic {
                cycle: dependency.cycle_through(resource.serial()),
            });
        }
        let frame = dependency.push(resource.locator().instance().clone(), resource.serial());
        trace!(resource = %resource, scope = %resource.scope_id(), "serving");
        resource.scope().provide(
            resource.slot(),
            resource.slots(),
            dependency,
            &|| {
                let context = Context::new(self, &frame);
                (resource.supplier())(&context)
                    .map_err(|err| InjectError::producer(dependency, err))
            },
        )
    }

    fn unresolvable(&self, dependency: &Dependency) -> InjectError {
        let candidates = self
            .resources
            .iter()
            .filter(|resource| resource.locator().is_near_miss_for(dependency))
            .take(MAX_NEAR_MISSES)
            .map(|resource| resource.to_string())
            .collect();
        InjectError::Unresolvable {
            dependency: dependency.to_string(),
            candidates,
        }
    }
}

impl std::fmt::Debug for Injector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Injector")
            .field("resources", &self.resources.len())
            .field("scopes", &self.scopes.len())
            .field("shut_down", &self.is_shut_down())
            .finish()
    }
}

/// Typed view of a resolved instance
pub(crate) fn downcast<T: Any + Send + Sync>(object: Object, dependency: &Dependency) -> Result<Arc<T>> {
    object
        .downcast::<T>()
        .map_err(|_| InjectError::TypeMismatch {
            dependency: dependency.to_string(),
            expected: std::any::type_name::<T>(),
        })
}

//! Context - what a producer sees while it runs
//!
//! Holds the injector and the request being served, with the producing
//! resource already on the stack. Every request made through the context
//! extends that stack, which is what target matching and cycle detection
//! observe.

use std::any::Any;
use std::sync::Arc;

use crate::bootstrap::Environment;
use crate::error::Result;
use crate::model::{Dependency, Instance, Name, Object};
use crate::types::Type;

use super::{downcast, Injector};

pub struct Context<'a> {
    injector: &'a Injector,
    dependency: &'a Dependency,
}

impl<'a> Context<'a> {
    pub(crate) fn new(injector: &'a Injector, dependency: &'a Dependency) -> Self {
        Self {
            injector,
            dependency,
        }
    }

    pub fn injector(&self) -> &'a Injector {
        self.injector
    }

    /// The request being served, innermost frame included
    pub fn dependency(&self) -> &'a Dependency {
        self.dependency
    }

    pub fn env(&self) -> &'a Environment {
        self.injector.env()
    }

    /// Resolve `instance` on behalf of the producing resource
    pub fn resolve(&self, instance: Instance) -> Result<Object> {
        self.injector.resolve(&self.dependency.instanced(instance))
    }

    /// Every compatible instance of `instance`, most qualified first
    pub fn resolve_all(&self, instance: Instance) -> Result<Vec<Object>> {
        self.injector
            .resolve_all(&self.dependency.instanced(instance))
    }

    pub fn get<T: Any + Send + Sync>(&self) -> Result<Arc<T>> {
        let dependency = self.dependency.instanced(Instance::of::<T>());
        downcast(self.injector.resolve(&dependency)?, &dependency)
    }

    pub fn get_named<T: Any + Send + Sync>(&self, name: impl Into<Name>) -> Result<Arc<T>> {
        let dependency = self.dependency.instanced(Instance::named::<T>(name));
        downcast(self.injector.resolve(&dependency)?, &dependency)
    }

    /// Every instance served for `T`, as a multi-binding
    pub fn all<T: Any + Send + Sync>(&self) -> Result<Vec<Arc<T>>> {
        let dependency = self
            .dependency
            .instanced(Instance::new(Name::any(), Type::of::<T>()));
        self.injector
            .resolve_all(&dependency)?
            .into_iter()
            .map(|object| downcast(object, &dependency))
            .collect()
    }
}

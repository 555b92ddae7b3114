//! RawType - interned base types with boundary-declared supertypes
//!
//! A raw type is identified by its name. Generic raw types declare an arity,
//! and their supertypes may refer to positional type variables that get
//! substituted with the actual arguments of a parameterized [`Type`].
//!
//! Supertypes are declared once at the boundary (reflection, a build-time
//! table, or plain registration code) and the transitive closure is computed
//! lazily on first query. Declare a hierarchy before the first query.

use std::any::TypeId;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use dashmap::DashMap;
use once_cell::sync::{Lazy, OnceCell};
use parking_lot::RwLock;
use rustc_hash::FxHashSet;

use crate::error::{InjectError, Result};
use crate::util::intern;

use super::Type;

/// Registry of every named raw type (name → canonical RawType)
static REGISTRY: Lazy<DashMap<Arc<str>, RawType>> = Lazy::new(DashMap::new);

static VOID: Lazy<RawType> = Lazy::new(|| RawType::special("void", Marker::Void));
static ANY: Lazy<RawType> = Lazy::new(|| RawType::special("?", Marker::Any));

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Marker {
    Class,
    Void,
    Any,
    Variable(usize),
}

/// Base type without arguments or array dimensions
#[derive(Clone)]
pub struct RawType(Arc<RawTypeData>);

struct RawTypeData {
    name: Arc<str>,
    arity: usize,
    marker: Marker,
    rust_type: OnceCell<TypeId>,
    /// Direct supertypes, expressed over this raw type's variables
    declared: RwLock<Arc<[Type]>>,
    /// Transitive closure of `declared`, computed on first query
    closure: OnceCell<Arc<[Type]>>,
}

impl RawType {
    fn fresh(name: Arc<str>, arity: usize, marker: Marker) -> Self {
        Self(Arc::new(RawTypeData {
            name,
            arity,
            marker,
            rust_type: OnceCell::new(),
            declared: RwLock::new(Arc::from(Vec::new())),
            closure: OnceCell::new(),
        }))
    }

    fn special(name: &str, marker: Marker) -> Self {
        Self::fresh(intern(name), 0, marker)
    }

    /// Canonical raw type for `name` (arity 0 when first seen)
    pub fn named(name: &str) -> Self {
        let key = intern(name);
        if let Some(existing) = REGISTRY.get(&key) {
            return existing.clone();
        }
        REGISTRY
            .entry(Arc::clone(&key))
            .or_insert_with(|| Self::fresh(key, 0, Marker::Class))
            .clone()
    }

    /// Canonical generic raw type with `arity` type parameters
    ///
    /// Fails when `name` is already registered with a different arity.
    pub fn generic(name: &str, arity: usize) -> Result<Self> {
        let key = intern(name);
        let raw = REGISTRY
            .entry(Arc::clone(&key))
            .or_insert_with(|| Self::fresh(key, arity, Marker::Class))
            .clone();
        if raw.arity() != arity {
            return Err(InjectError::InvalidType {
                ty: name.to_string(),
                reason: format!(
                    "already registered with {} type parameter(s), not {}",
                    raw.arity(),
                    arity
                ),
            });
        }
        Ok(raw)
    }

    /// Raw type of a Rust type, named after `std::any::type_name`
    pub fn of<T: ?Sized + 'static>() -> Self {
        let raw = Self::named(std::any::type_name::<T>());
        let _ = raw.0.rust_type.set(TypeId::of::<T>());
        raw
    }

    /// The distinguished "no type" marker
    pub fn void() -> Self {
        VOID.clone()
    }

    /// Root of every hierarchy: anything is assignable to an upper-bounded `?`
    pub fn any() -> Self {
        ANY.clone()
    }

    /// Positional type variable used inside declared supertypes
    pub fn variable(index: usize) -> Self {
        Self::fresh(intern(&format!("${}", index)), 0, Marker::Variable(index))
    }

    /// Declare the direct supertypes of this raw type
    ///
    /// Supertypes of a generic raw type may use [`Type::variable`] to refer
    /// to its own parameters.
    pub fn extends(self, supertypes: impl IntoIterator<Item = Type>) -> Self {
        {
            let mut declared = self.0.declared.write();
            let mut merged: Vec<Type> = declared.iter().cloned().collect();
            for ty in supertypes {
                if !merged.contains(&ty) {
                    merged.push(ty);
                }
            }
            *declared = Arc::from(merged);
        }
        self
    }

    pub fn name(&self) -> &str {
        &self.0.name
    }

    pub fn arity(&self) -> usize {
        self.0.arity
    }

    /// `TypeId` when this raw type was created through [`RawType::of`]
    pub fn rust_type(&self) -> Option<TypeId> {
        self.0.rust_type.get().copied()
    }

    pub fn is_void(&self) -> bool {
        self.0.marker == Marker::Void
    }

    pub fn is_any(&self) -> bool {
        self.0.marker == Marker::Any
    }

    /// Index of the type variable, if this raw type is one
    pub fn variable_index(&self) -> Option<usize> {
        match self.0.marker {
            Marker::Variable(index) => Some(index),
            _ => None,
        }
    }

    /// Package (module path) part of the name: `app::shapes` for `app::shapes::Circle`
    pub fn package(&self) -> Option<&str> {
        if self.0.marker != Marker::Class {
            return None;
        }
        let name: &str = &self.0.name;
        let plain = name.find('<').map_or(name, |idx| &name[..idx]);
        plain.rsplit_once("::").map(|(package, _)| package)
    }

    pub(crate) fn declared(&self) -> Arc<[Type]> {
        Arc::clone(&self.0.declared.read())
    }

    /// Transitive supertypes over this raw type's own variables
    pub(crate) fn closure(&self) -> Arc<[Type]> {
        Arc::clone(self.0.closure.get_or_init(|| self.compute_closure()))
    }

    // Walks declared lists iteratively so a cyclic declaration terminates
    // and no other raw type's closure is initialised re-entrantly.
    fn compute_closure(&self) -> Arc<[Type]> {
        let mut seen: FxHashSet<Arc<str>> = FxHashSet::default();
        seen.insert(Arc::clone(&self.0.name));
        let mut closure: Vec<Type> = Vec::new();
        let mut queue: Vec<Type> = self.declared().iter().cloned().collect();
        queue.reverse();

        while let Some(ty) = queue.pop() {
            if !seen.insert(Arc::clone(&ty.raw_type().0.name)) {
                continue;
            }
            let parents = ty.raw_type().declared();
            for parent in parents.iter().rev() {
                queue.push(parent.substitute(ty.type_arguments()));
            }
            closure.push(ty);
        }
        Arc::from(closure)
    }
}

impl PartialEq for RawType {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
            || (self.0.marker == other.0.marker && self.0.name == other.0.name)
    }
}

impl Eq for RawType {}

impl Hash for RawType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.marker.hash(state);
        self.0.name.hash(state);
    }
}

impl fmt::Display for RawType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.name)
    }
}

impl fmt::Debug for RawType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RawType({})", self.0.name)
    }
}

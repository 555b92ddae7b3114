//! Instance - Name + Type: what is requested or provided

use std::fmt;

use crate::types::Type;

use super::{Name, Qualifying};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Instance {
    name: Name,
    ty: Type,
}

impl Instance {
    pub fn new(name: Name, ty: Type) -> Self {
        Self { name, ty }
    }

    /// Default-named instance of `ty`
    pub fn default_of(ty: Type) -> Self {
        Self::new(Name::default(), ty)
    }

    /// Any name, any type
    pub fn any() -> Self {
        Self::new(Name::any(), Type::wildcard())
    }

    /// Any name of `ty` or its subtypes
    pub fn anything_of(ty: Type) -> Self {
        Self::new(Name::any(), ty.as_upper_bound())
    }

    pub fn of<T: ?Sized + 'static>() -> Self {
        Self::default_of(Type::of::<T>())
    }

    pub fn named<T: ?Sized + 'static>(name: impl Into<Name>) -> Self {
        Self::new(name.into(), Type::of::<T>())
    }

    pub fn name(&self) -> &Name {
        &self.name
    }

    pub fn ty(&self) -> &Type {
        &self.ty
    }

    pub fn is_any(&self) -> bool {
        self.name.is_any() && self.ty.is_wildcard()
    }

    /// Same name, different type
    pub fn typed(&self, ty: Type) -> Self {
        Self::new(self.name.clone(), ty)
    }

    /// Whether this instance, used as a target pattern, matches `provided`
    ///
    /// Upper-bound types match subtypes (partial matching), exact types
    /// require equality.
    pub fn matches(&self, provided: &Instance) -> bool {
        if !self.name.accepts(provided.name()) {
            return false;
        }
        if self.ty.is_upper_bound() {
            provided.ty.is_assignable_to(&self.ty)
        } else {
            provided.ty == self.ty
        }
    }
}

impl Qualifying for Instance {
    type Rank = (<Type as Qualifying>::Rank, <Name as Qualifying>::Rank);

    fn rank(&self) -> Self::Rank {
        (self.ty.rank(), self.name.rank())
    }
}

impl fmt::Display for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.ty)?;
        if !self.name.is_default() {
            write!(f, " \"{}\"", self.name)?;
        }
        Ok(())
    }
}

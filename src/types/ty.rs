//! Type - generic type descriptor
//!
//! Raw type + ordered type arguments + array dimensions + upper-bound flag.
//! Equality ignores the upper-bound flag: two descriptors are equal iff raw
//! type, arguments and array dimensions match.
//!
//! Assignability rules:
//! - equal descriptors are always assignable
//! - a type is assignable to any of its (substituted) supertypes
//! - type arguments are invariant unless the target argument is an upper bound
//! - raw usage of a generic type (no arguments) is compatible with any
//!   parameterization
//! - arrays are invariant: `Circle[]` is NOT assignable to `Shape[]`
//! - `void` is only assignable to itself

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::error::{InjectError, Result};
use crate::model::Qualifying;

use super::RawType;

#[derive(Clone)]
pub struct Type {
    raw: RawType,
    args: Arc<[Type]>,
    dims: u8,
    upper: bool,
}

impl Type {
    /// Exact, non-array usage of a raw type
    pub fn new(raw: RawType) -> Self {
        Self {
            raw,
            args: Arc::from(Vec::new()),
            dims: 0,
            upper: false,
        }
    }

    pub fn named(name: &str) -> Self {
        Self::new(RawType::named(name))
    }

    pub fn of<T: ?Sized + 'static>() -> Self {
        Self::new(RawType::of::<T>())
    }

    pub fn void() -> Self {
        Self::new(RawType::void())
    }

    /// `?`: the upper bound everything is assignable to
    pub fn wildcard() -> Self {
        Self::new(RawType::any()).as_upper_bound()
    }

    pub fn variable(index: usize) -> Self {
        Self::new(RawType::variable(index))
    }

    /// Parameterize with exactly `arity` type arguments
    pub fn parameterized(&self, args: impl IntoIterator<Item = Type>) -> Result<Self> {
        let args: Vec<Type> = args.into_iter().collect();
        if args.len() != self.raw.arity() {
            return Err(InjectError::InvalidType {
                ty: self.raw.to_string(),
                reason: format!(
                    "expected {} type argument(s), got {}",
                    self.raw.arity(),
                    args.len()
                ),
            });
        }
        if args.iter().any(Type::is_void) {
            return Err(InjectError::InvalidType {
                ty: self.raw.to_string(),
                reason: "void cannot be a type argument".to_string(),
            });
        }
        Ok(Self {
            args: Arc::from(args),
            ..self.clone()
        })
    }

    /// One more array dimension
    pub fn array(&self) -> Self {
        self.with_dimensions(self.dims.saturating_add(1))
    }

    pub fn with_dimensions(&self, dims: u8) -> Self {
        Self {
            dims,
            ..self.clone()
        }
    }

    /// Component type of an array (the type itself when not an array)
    pub fn element_type(&self) -> Self {
        self.with_dimensions(self.dims.saturating_sub(1))
    }

    /// "This type or any subtype"
    pub fn as_upper_bound(&self) -> Self {
        Self {
            upper: true,
            ..self.clone()
        }
    }

    pub fn as_exact(&self) -> Self {
        Self {
            upper: false,
            ..self.clone()
        }
    }

    pub fn raw_type(&self) -> &RawType {
        &self.raw
    }

    pub fn type_arguments(&self) -> &[Type] {
        &self.args
    }

    pub fn array_dimensions(&self) -> u8 {
        self.dims
    }

    pub fn is_array(&self) -> bool {
        self.dims > 0
    }

    pub fn is_upper_bound(&self) -> bool {
        self.upper
    }

    pub fn is_void(&self) -> bool {
        self.raw.is_void()
    }

    pub fn is_wildcard(&self) -> bool {
        self.raw.is_any()
    }

    pub fn is_variable(&self) -> bool {
        self.raw.variable_index().is_some()
    }

    pub fn is_parameterized(&self) -> bool {
        !self.args.is_empty()
    }

    /// Generic raw type used without arguments (unchecked)
    pub fn is_raw_usage(&self) -> bool {
        self.raw.arity() > 0 && self.args.is_empty()
    }

    pub fn equal_to(&self, other: &Type) -> bool {
        self == other
    }

    /// Transitive supertypes with this type's arguments substituted
    ///
    /// Arrays have no supertypes (arrays are invariant).
    pub fn supertypes(&self) -> Vec<Type> {
        if self.dims > 0 || self.is_void() || self.is_variable() {
            return Vec::new();
        }
        self.raw
            .closure()
            .iter()
            .map(|ty| ty.substitute(&self.args))
            .collect()
    }

    /// Replace type variables with `actuals` (positional)
    ///
    /// Variables without a matching actual stay as they are.
    pub fn substitute(&self, actuals: &[Type]) -> Type {
        if let Some(index) = self.raw.variable_index() {
            return match actuals.get(index) {
                Some(actual) => Type {
                    dims: actual.dims.saturating_add(self.dims),
                    upper: self.upper || actual.upper,
                    ..actual.clone()
                },
                None => self.clone(),
            };
        }
        if self.args.is_empty() {
            return self.clone();
        }
        Type {
            args: self.args.iter().map(|arg| arg.substitute(actuals)).collect(),
            ..self.clone()
        }
    }

    /// This type viewed as `raw` (itself or one of its supertypes)
    pub fn as_supertype(&self, raw: &RawType) -> Option<Type> {
        if &self.raw == raw {
            return Some(self.clone());
        }
        self.supertypes().into_iter().find(|ty| ty.raw_type() == raw)
    }

    pub fn is_assignable_to(&self, other: &Type) -> bool {
        if self == other {
            return true;
        }
        if self.is_void() || other.is_void() {
            return false;
        }
        if self.is_variable() || other.is_variable() {
            return true;
        }
        if other.is_wildcard() {
            return other.dims == 0 || other.dims == self.dims;
        }
        if self.dims != other.dims {
            return false;
        }
        if self.dims > 0 {
            // invariant arrays: components must be equal
            return self.element_type() == other.element_type();
        }
        let Some(view) = self.as_supertype(other.raw_type()) else {
            return false;
        };
        if view.args.is_empty() || other.args.is_empty() {
            return true;
        }
        if view.args.len() != other.args.len() {
            return false;
        }
        view.args
            .iter()
            .zip(other.args.iter())
            .all(|(mine, theirs)| {
                if theirs.is_upper_bound() {
                    mine.is_assignable_to(theirs)
                } else {
                    mine == theirs || mine.is_variable() || theirs.is_variable()
                }
            })
    }

    /// Whether a provider declared with this type can serve `requested`
    ///
    /// Upper-bound requests accept any assignable provided type. An
    /// upper-bound provider serves every exact request assignable to it.
    /// Otherwise the types must be equal.
    pub fn serves(&self, requested: &Type) -> bool {
        if requested.is_upper_bound() {
            self.is_assignable_to(requested)
        } else if self.is_upper_bound() {
            requested.is_assignable_to(self)
        } else {
            self == requested
        }
    }

    /// Number of supertypes, strictly larger for strict subtypes
    pub fn hierarchy_depth(&self) -> usize {
        self.supertypes().len()
    }

    fn specified_arguments(&self) -> usize {
        self.args
            .iter()
            .filter(|arg| !arg.is_variable() && !arg.is_upper_bound())
            .count()
    }
}

impl Qualifying for Type {
    /// (exact beats upper bound, deeper subtype, more specified arguments)
    type Rank = (bool, usize, usize);

    fn rank(&self) -> Self::Rank {
        (
            !self.upper,
            self.hierarchy_depth(),
            self.specified_arguments(),
        )
    }
}

impl PartialEq for Type {
    fn eq(&self, other: &Self) -> bool {
        self.dims == other.dims && self.raw == other.raw && self.args == other.args
    }
}

impl Eq for Type {}

impl Hash for Type {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.raw.hash(state);
        self.args.hash(state);
        self.dims.hash(state);
    }
}

impl From<RawType> for Type {
    fn from(raw: RawType) -> Self {
        Type::new(raw)
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.upper && !self.is_wildcard() {
            f.write_str("? extends ")?;
        }
        write!(f, "{}", self.raw)?;
        if !self.args.is_empty() {
            f.write_str("<")?;
            for (i, arg) in self.args.iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                write!(f, "{}", arg)?;
            }
            f.write_str(">")?;
        }
        for _ in 0..self.dims {
            f.write_str("[]")?;
        }
        Ok(())
    }
}

impl fmt::Debug for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Type({})", self)
    }
}

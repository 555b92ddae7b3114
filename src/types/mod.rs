//! Type Model - generic type descriptors without a fixed type hierarchy
//!
//! - `raw`: interned raw types and their boundary-declared supertypes
//! - `ty`: parameterized / array / upper-bound descriptors, assignability

mod raw;
mod ty;

pub use raw::RawType;
pub use ty::Type;

//! Utilities Module - shared infrastructure
//!
//! - `interner`: String interning for type names, qualifier names and package
//!   paths (Arc<str> deduplication)

mod interner;

pub use interner::{intern, Interner};

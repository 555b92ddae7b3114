//! Resolution Engine
//!
//! - `resource`: frozen bindings with their scope slots
//! - `index`: raw-type index for sub-linear candidate lookup
//! - `injector`: resolve / resolve_all / typed access / shutdown
//! - `context`: the producer-facing view of an ongoing resolution

mod context;
mod index;
mod injector;
mod resource;

pub use context::Context;
pub use injector::Injector;
pub use resource::Resource;

pub(crate) use injector::downcast;

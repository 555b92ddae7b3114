//! Binding Model - what can be requested, bound and ranked
//!
//! - `qualify`: the "more qualified than" ordering shared by every concept
//! - `name`, `instance`, `packages`, `target`: the parts of a locator
//! - `locator`, `declaration`, `binding`: the left-hand side and its producer
//! - `dependency`: a request together with its injection stack

mod binding;
mod declaration;
mod dependency;
mod instance;
mod locator;
mod name;
mod packages;
mod qualify;
mod target;

pub use binding::{constant, supplier, Binding, Object, Source, Supplier};
pub use declaration::DeclarationType;
pub use dependency::{Dependency, Injection};
pub use instance::Instance;
pub use locator::Locator;
pub use name::{Name, NameKindRank};
pub use packages::Packages;
pub use qualify::{by_qualification, top_tier, Qualifying};
pub use target::Target;

//! Weft - runtime dependency resolution with qualified bindings and scopes
//!
//! ## Module Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                        DOMAIN MODEL                          │
//! │  types/     Type descriptors, supertypes, assignability      │
//! │  model/     Names, locators, bindings, qualification         │
//! └──────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌──────────────────────────────────────────────────────────────┐
//! │                      APPLICATION LAYER                       │
//! │  bootstrap/ Bundles → modules → bindings → resources         │
//! │  engine/    Injector: lookup, disambiguation, serving        │
//! └──────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌──────────────────────────────────────────────────────────────┐
//! │                    INFRASTRUCTURE LAYER                      │
//! │  scope/     Caching policies (application … disk, snapshot)  │
//! │  util/      String interning                                 │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Responsibilities
//!
//! | Module | Responsibility |
//! |--------|----------------|
//! | [`types`] | `RawType` registry, `Type` with arguments, arrays and bounds |
//! | [`model`] | `Locator`, `Binding`, `Dependency` and the qualification order |
//! | [`bootstrap`] | Install-once expansion, toggles, disambiguation, freezing |
//! | [`engine`] | `Injector` and the producer-facing `Context` |
//! | [`scope`] | Thread-safe caches (DashMap, thread locals, files) |
//! | [`util`] | String interning |
//! | [`error`] | Error types with fix suggestions |
//! | [`config`] | `~/.config/weft/config.toml` with env overrides |

// ═══════════════════════════════════════════════════════════════
// DOMAIN MODEL - types and bindings
// ═══════════════════════════════════════════════════════════════
pub mod model;
pub mod types;

// ═══════════════════════════════════════════════════════════════
// APPLICATION LAYER - assembly and resolution
// ═══════════════════════════════════════════════════════════════
pub mod bootstrap;
pub mod engine;

// ═══════════════════════════════════════════════════════════════
// INFRASTRUCTURE LAYER - scopes, utilities
// ═══════════════════════════════════════════════════════════════
pub mod scope;
pub mod util;

// ═══════════════════════════════════════════════════════════════
// CROSS-CUTTING - Error handling, configuration
// ═══════════════════════════════════════════════════════════════
pub mod config;
pub mod error;

// ═══════════════════════════════════════════════════════════════
// PUBLIC API RE-EXPORTS
// ═══════════════════════════════════════════════════════════════

// Error types
pub use error::{FixSuggestion, InjectError, Result};

// Config types
pub use config::EngineConfig;

// Type model
pub use types::{RawType, Type};

// Binding model
pub use model::{
    constant, supplier, Binding, DeclarationType, Dependency, Instance, Locator, Name, Object,
    Packages, Qualifying, Source, Supplier, Target,
};

// Assembly
pub use bootstrap::{Bindings, Bootstrap, Bundle, Environment, Installer, Module};

// Resolution
pub use engine::{Context, Injector, Resource};

// Scopes
pub use scope::{
    ApplicationScope, BincodeCodec, Codec, DependencyScope, DiskScope, KeyDerivation, Scope,
    ScopeId, Scopes, SnapshotScope, SyncReport, ThreadScope, TransientScope, WorkerScope,
    WorkerState,
};

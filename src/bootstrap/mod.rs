//! Bootstrap / Assembly
//!
//! Expands a root bundle into an ordered module list, collects every
//! module's bindings, disambiguates overlapping declarations and freezes the
//! survivors into the resource array of a new [`Injector`].
//!
//! Expansion is depth-first in installation order:
//! - install-once: a name seen before is skipped
//! - a name rejected by the toggle is never reconsidered, even when reached
//!   again through another bundle
//!
//! Assembly runs single-threaded and any error aborts it.

mod bundle;
mod disambiguate;
mod env;
mod freeze;

use std::sync::Arc;

use rustc_hash::FxHashSet;
use tracing::{debug, info, instrument};

use crate::config::EngineConfig;
use crate::engine::Injector;
use crate::error::{InjectError, Result};
use crate::model::Binding;
use crate::scope::{DiskScope, Scope, ScopeId, Scopes};

pub use bundle::{Bindings, Bundle, Installer, Module};
pub use disambiguate::disambiguate;
pub use env::Environment;
pub use freeze::freeze;

use bundle::Installable;

type Toggle = Arc<dyn Fn(&str) -> bool + Send + Sync>;

pub struct Bootstrap {
    env: Environment,
    scopes: Scopes,
    toggle: Option<Toggle>,
}

impl Bootstrap {
    /// Standard scopes; modules disabled in `env` are toggled off
    pub fn new(env: Environment) -> Self {
        Self {
            env,
            scopes: Scopes::standard(),
            toggle: None,
        }
    }

    /// Environment from `config`, plus a disk scope when a root is configured
    ///
    /// The disk scope has no codecs; register a configured one yourself
    /// with [`Bootstrap::with_disk`] if it needs any.
    pub fn from_config(config: &EngineConfig) -> Self {
        let bootstrap = Self::new(Environment::from_config(config));
        match config.disk_scope() {
            Some(disk) => bootstrap.with_disk(disk),
            None => bootstrap,
        }
    }

    pub fn env(&self) -> &Environment {
        &self.env
    }

    pub fn scopes(&self) -> &Scopes {
        &self.scopes
    }

    /// Register (or replace) a scope
    pub fn with_scope(mut self, id: ScopeId, scope: impl Scope + 'static) -> Self {
        self.scopes.register(id, scope);
        self
    }

    /// Register a scope the caller keeps a handle to (a worker scope it
    /// allocates states on, say)
    pub fn with_shared_scope(mut self, id: ScopeId, scope: Arc<dyn Scope>) -> Self {
        self.scopes.register_shared(id, scope);
        self
    }

    /// Register `disk` under [`ScopeId::disk`]
    pub fn with_disk(mut self, disk: DiskScope) -> Self {
        self.scopes.register(ScopeId::disk(), disk);
        self
    }

    /// Register a snapshot of `src` cached in `dest`
    pub fn with_snapshot(mut self, id: ScopeId, src: &ScopeId, dest: &ScopeId) -> Result<Self> {
        self.scopes.register_snapshot(id, src, dest)?;
        Ok(self)
    }

    /// Replace the default toggle (`!env.is_disabled(name)`)
    pub fn with_toggle(mut self, toggle: impl Fn(&str) -> bool + Send + Sync + 'static) -> Self {
        self.toggle = Some(Arc::new(toggle));
        self
    }

    /// Modules reachable from `root`, in installation order
    pub fn modules(&self, root: &dyn Bundle) -> Vec<Arc<dyn Module>> {
        let mut expansion = Expansion {
            bootstrap: self,
            seen: FxHashSet::default(),
            modules: Vec::new(),
        };
        if expansion.admit(root.name()) {
            let mut installer = Installer::new();
            root.bootstrap(&mut installer);
            for item in installer.items {
                expansion.expand(item);
            }
        }
        expansion.modules
    }

    /// Every binding declared by the modules reachable from `root`
    pub fn bindings(&self, root: &dyn Bundle) -> Result<Vec<Binding>> {
        let mut all = Vec::new();
        for module in self.modules(root) {
            let mut bindings = Bindings::new(module.name());
            module
                .declare(&mut bindings, &self.env)
                .map_err(|err| match err {
                    err @ InjectError::DeclarationFailed { .. } => err,
                    err => InjectError::DeclarationFailed {
                        module: module.name().to_string(),
                        reason: err.to_string(),
                    },
                })?;
            debug!(module = module.name(), bindings = bindings.len(), "module declared");
            all.extend(bindings.into_vec());
        }
        Ok(all)
    }

    /// Assemble an injector from `root`
    #[instrument(skip_all, fields(root = root.name()))]
    pub fn injector(self, root: &dyn Bundle) -> Result<Injector> {
        let declared = self.bindings(root)?;
        let declared_count = declared.len();
        let survivors = disambiguate(declared)?;
        let resources = freeze(&survivors, &self.scopes)?;
        let scopes: Vec<Arc<dyn Scope>> = {
            let mut ids: Vec<&ScopeId> = self.scopes.ids().collect();
            ids.sort();
            ids.into_iter().filter_map(|id| self.scopes.get(id)).collect()
        };
        info!(
            declared = declared_count,
            resources = resources.len(),
            "injector assembled"
        );
        Ok(Injector::new(resources, scopes, self.env))
    }

    fn is_enabled(&self, name: &str) -> bool {
        match &self.toggle {
            Some(toggle) => toggle(name),
            None => !self.env.is_disabled(name),
        }
    }
}

struct Expansion<'a> {
    bootstrap: &'a Bootstrap,
    seen: FxHashSet<String>,
    modules: Vec<Arc<dyn Module>>,
}

impl Expansion<'_> {
    /// First visit of an enabled name
    fn admit(&mut self, name: &str) -> bool {
        if !self.seen.insert(name.to_string()) {
            return false;
        }
        if !self.bootstrap.is_enabled(name) {
            debug!(name, "toggled off");
            return false;
        }
        true
    }

    fn expand(&mut self, item: Installable) {
        if !self.admit(item.name()) {
            return;
        }
        match item {
            Installable::Module(module) => {
                debug!(module = module.name(), "module installed");
                self.modules.push(module);
            }
            Installable::Bundle(bundle) => {
                let mut installer = Installer::new();
                bundle.bootstrap(&mut installer);
                for child in installer.items {
                    self.expand(child);
                }
            }
        }
    }
}

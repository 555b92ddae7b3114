//! Test fixtures and helpers

#![allow(dead_code)]

use std::sync::Arc;

use weft::{Bindings, Bootstrap, Bundle, Environment, Injector, Installer, Module, Result};

type Declarations = Arc<dyn Fn(&mut Bindings) + Send + Sync>;

/// Module whose declarations come from a closure
#[derive(Clone)]
pub struct Declare {
    name: String,
    declare: Declarations,
}

impl Declare {
    pub fn new(name: &str, declare: impl Fn(&mut Bindings) + Send + Sync + 'static) -> Self {
        Self {
            name: name.to_string(),
            declare: Arc::new(declare),
        }
    }
}

impl Module for Declare {
    fn name(&self) -> &str {
        &self.name
    }

    fn declare(&self, bindings: &mut Bindings, _: &Environment) -> Result<()> {
        (self.declare)(bindings);
        Ok(())
    }
}

/// Bundle installing a fixed list of modules
#[derive(Clone, Default)]
pub struct Modules {
    modules: Vec<Declare>,
}

impl Modules {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, module: Declare) -> Self {
        self.modules.push(module);
        self
    }
}

impl Bundle for Modules {
    fn bootstrap(&self, installer: &mut Installer) {
        for module in &self.modules {
            installer.install_module(module.clone());
        }
    }
}

/// Injector over a single module
pub fn assemble(declare: impl Fn(&mut Bindings) + Send + Sync + 'static) -> Result<Injector> {
    Bootstrap::new(Environment::new()).injector(&Modules::new().with(Declare::new("test", declare)))
}

/// Install a fmt subscriber once so `RUST_LOG` works in tests
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

//! Quick benchmark to verify resolution performance

use std::time::Instant;

use weft::{
    supplier, Bindings, Bootstrap, Bundle, Environment, Installer, Locator, Module, Result,
    ScopeId, Type,
};

struct Config(u32);
struct Service(u32);
struct Plugin(u32);

struct Bench;

impl Module for Bench {
    fn declare(&self, bindings: &mut Bindings, _: &Environment) -> Result<()> {
        bindings.constant(Locator::of::<Config>(), Config(7));
        bindings.bind_in(
            Locator::of::<Service>(),
            ScopeId::transient(),
            supplier(|cx| Ok(Service(cx.get::<Config>()?.0))),
        );
        for id in 0..32 {
            bindings.multi(Locator::of::<Plugin>(), supplier(move |_| Ok(Plugin(id))));
        }
        for id in 0..256 {
            bindings.constant(Locator::named::<u32>(format!("port.{}", id).as_str()), id);
        }
        Ok(())
    }
}

struct Root;

impl Bundle for Root {
    fn bootstrap(&self, installer: &mut Installer) {
        installer.install_module(Bench);
    }
}

fn measure(label: &str, iterations: u32, mut op: impl FnMut()) {
    // warm up caches and scopes
    op();
    let start = Instant::now();
    for _ in 0..iterations {
        op();
    }
    let elapsed = start.elapsed();
    println!("{}", label);
    println!("  Time for {} iterations: {:?}", iterations, elapsed);
    println!("  Per operation: {:?}\n", elapsed / iterations);
}

fn main() {
    println!("Resolution Performance Test");
    println!("===========================\n");

    let start = Instant::now();
    let injector = match Bootstrap::new(Environment::new()).injector(&Root) {
        Ok(injector) => injector,
        Err(err) => {
            eprintln!("assembly failed: {}", err);
            return;
        }
    };
    println!(
        "Assembled {} resources in {:?}\n",
        injector.resources().len(),
        start.elapsed()
    );

    measure("Application-scoped constant", 1_000_000, || {
        let _ = injector.instance::<Config>();
    });
    measure("Transient with one dependency", 200_000, || {
        let _ = injector.instance::<Service>();
    });
    measure("Named lookup among 256 names", 200_000, || {
        let _ = injector.named::<u32>("port.128");
    });
    let plugins = weft::Dependency::typed(Type::of::<Plugin>().array());
    measure("Array of 32 multi-bindings", 50_000, || {
        let _ = injector.resolve(&plugins);
    });
}

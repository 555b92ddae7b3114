//! Injector Integration Tests
//!
//! Resolution through assembled injectors: qualification, multi-bindings,
//! cycles, targets, packages, scopes and shutdown.

mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use pretty_assertions::assert_eq;

use common::{assemble, init_tracing, Declare, Modules};
use weft::{
    constant, supplier, Bootstrap, DeclarationType, Dependency, Environment, InjectError,
    Instance, Locator, Name, Object, Packages, RawType, ScopeId, Type, WorkerScope,
};

#[derive(Debug)]
struct Paint(&'static str);

#[derive(Debug)]
struct Plugin(u32);

#[derive(Debug)]
struct Engine(&'static str);

struct Car {
    engine: Arc<Engine>,
}

struct Truck {
    engine: Arc<Engine>,
}

// ═══════════════════════════════════════════════════════════════
// QUALIFICATION
// ═══════════════════════════════════════════════════════════════

#[test]
fn test_named_default_and_any_requests() {
    init_tracing();
    let injector = assemble(|b| {
        b.declare(
            DeclarationType::Auto,
            Locator::of::<Paint>(),
            ScopeId::application(),
            constant(Paint("auto")),
        );
        b.bind(Locator::named::<Paint>("red"), constant(Paint("red")));
    })
    .unwrap();

    assert_eq!(injector.named::<Paint>("red").unwrap().0, "red");
    assert_eq!(injector.instance::<Paint>().unwrap().0, "auto");

    let err = injector
        .resolve(&Dependency::named::<Paint>(Name::any()))
        .unwrap_err();
    assert!(matches!(err, InjectError::Ambiguous { .. }), "got {err}");
}

#[test]
fn test_all_lists_every_name_most_qualified_first() {
    let injector = assemble(|b| {
        b.declare(
            DeclarationType::Auto,
            Locator::of::<Paint>(),
            ScopeId::application(),
            constant(Paint("auto")),
        );
        b.bind(Locator::named::<Paint>("red"), constant(Paint("red")));
    })
    .unwrap();

    let names: Vec<&str> = injector
        .all::<Paint>()
        .unwrap()
        .iter()
        .map(|paint| paint.0)
        .collect();
    assert_eq!(names, vec!["red", "auto"]);
}

#[test]
fn test_overridden_binding_is_not_served() {
    let injector = Bootstrap::new(Environment::new())
        .injector(
            &Modules::new()
                .with(Declare::new("defaults", |b| {
                    b.declare(
                        DeclarationType::Default,
                        Locator::of::<Paint>(),
                        ScopeId::application(),
                        constant(Paint("grey")),
                    );
                }))
                .with(Declare::new("app", |b| {
                    b.constant(Locator::of::<Paint>(), Paint("blue"));
                })),
        )
        .unwrap();

    assert_eq!(injector.resources().len(), 1);
    assert_eq!(injector.instance::<Paint>().unwrap().0, "blue");
}

#[test]
fn test_pattern_name_serves_matching_requests() {
    let injector = assemble(|b| {
        b.bind(Locator::named::<Paint>("db.*"), constant(Paint("pattern")));
        b.bind(Locator::named::<Paint>("db.main"), constant(Paint("exact")));
    })
    .unwrap();

    assert_eq!(injector.named::<Paint>("db.main").unwrap().0, "exact");
    assert_eq!(injector.named::<Paint>("db.replica").unwrap().0, "pattern");
    assert!(matches!(
        injector.named::<Paint>("cache"),
        Err(InjectError::Unresolvable { .. })
    ));
}

#[test]
fn test_upper_bound_request_finds_subtypes() {
    struct PgStore;
    let store = Type::named("injector_tests::Store");
    RawType::of::<PgStore>().extends([store.clone()]);

    let injector = assemble(|b| {
        b.bind(Locator::of::<PgStore>(), supplier(|_| Ok(PgStore)));
    })
    .unwrap();

    let object = injector
        .resolve(&Dependency::typed(store.as_upper_bound()))
        .unwrap();
    assert!(object.downcast_ref::<PgStore>().is_some());
    assert!(matches!(
        injector.resolve(&Dependency::typed(store)),
        Err(InjectError::Unresolvable { .. })
    ));
}

// ═══════════════════════════════════════════════════════════════
// MULTI-BINDINGS AND ARRAYS
// ═══════════════════════════════════════════════════════════════

fn plugins(b: &mut weft::Bindings) {
    for id in 1..=3 {
        b.multi(Locator::of::<Plugin>(), supplier(move |_| Ok(Plugin(id))));
    }
}

fn elements(object: Object) -> Arc<Vec<Object>> {
    object.downcast::<Vec<Object>>().unwrap()
}

#[test]
fn test_array_request_serves_every_multi_binding() {
    let injector = assemble(plugins).unwrap();
    let request = Dependency::typed(Type::of::<Plugin>().array());

    let first = elements(injector.resolve(&request).unwrap());
    let second = elements(injector.resolve(&request).unwrap());

    assert_eq!(first.len(), 3);
    let mut ids: Vec<u32> = first
        .iter()
        .map(|object| object.downcast_ref::<Plugin>().unwrap().0)
        .collect();
    ids.sort_unstable();
    assert_eq!(ids, vec![1, 2, 3]);
    for (a, b) in first.iter().zip(second.iter()) {
        assert!(Arc::ptr_eq(a, b));
    }
}

#[test]
fn test_single_request_over_multi_binding_is_ambiguous() {
    let injector = assemble(plugins).unwrap();
    assert!(matches!(
        injector.instance::<Plugin>(),
        Err(InjectError::Ambiguous { .. })
    ));
}

#[test]
fn test_empty_array_when_nothing_matches() {
    let injector = assemble(|_| {}).unwrap();
    let object = injector
        .resolve(&Dependency::typed(Type::of::<Plugin>().array()))
        .unwrap();
    assert!(elements(object).is_empty());
}

#[test]
fn test_array_binding_takes_precedence_over_elements() {
    let injector = assemble(|b| {
        plugins(b);
        b.constant(Locator::typed(Type::of::<Plugin>().array()), vec![7u32]);
    })
    .unwrap();

    let object = injector
        .resolve(&Dependency::typed(Type::of::<Plugin>().array()))
        .unwrap();
    assert_eq!(object.downcast_ref::<Vec<u32>>(), Some(&vec![7]));
}

#[test]
fn test_producers_collect_multi_bindings_through_context() {
    struct Registry(usize);
    let injector = assemble(|b| {
        plugins(b);
        b.bind(
            Locator::of::<Registry>(),
            supplier(|cx| Ok(Registry(cx.all::<Plugin>()?.len()))),
        );
    })
    .unwrap();
    assert_eq!(injector.instance::<Registry>().unwrap().0, 3);
}

// ═══════════════════════════════════════════════════════════════
// CYCLES AND FAILURES
// ═══════════════════════════════════════════════════════════════

#[test]
fn test_cycle_is_reported_not_overflowed() {
    struct A;
    struct B;
    let injector = assemble(|b| {
        b.bind(
            Locator::of::<A>(),
            supplier(|cx| {
                cx.get::<B>()?;
                Ok(A)
            }),
        );
        b.bind(
            Locator::of::<B>(),
            supplier(|cx| {
                cx.get::<A>()?;
                Ok(B)
            }),
        );
    })
    .unwrap();

    let err = injector.instance::<A>().err().unwrap();
    assert!(matches!(err, InjectError::Cyclic { .. }), "got {err}");
    assert_eq!(err.code(), "WEFT-003");
}

#[test]
fn test_unresolvable_lists_near_misses() {
    let injector = assemble(|b| {
        b.constant(Locator::named::<Engine>("v8"), Engine("v8"));
    })
    .unwrap();

    match injector.instance::<Engine>() {
        Err(InjectError::Unresolvable { candidates, .. }) => {
            assert_eq!(candidates.len(), 1);
            assert!(candidates[0].contains("v8"));
        }
        other => panic!("expected Unresolvable, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn test_type_mismatch_on_wrong_producer_output() {
    let injector = assemble(|b| {
        b.constant(Locator::of::<u32>(), "not a number".to_string());
    })
    .unwrap();
    assert!(matches!(
        injector.instance::<u32>(),
        Err(InjectError::TypeMismatch { .. })
    ));
}

#[test]
fn test_failed_producer_is_retried() {
    struct Connection;
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let injector = assemble(move |b| {
        let counter = Arc::clone(&counter);
        b.bind(
            Locator::of::<Connection>(),
            supplier(move |_| {
                if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                    anyhow::bail!("connection refused");
                }
                Ok(Connection)
            }),
        );
    })
    .unwrap();

    let err = injector.instance::<Connection>().err().unwrap();
    assert!(matches!(err, InjectError::ProducerFailed { .. }));
    assert!(err.to_string().contains("connection refused"));

    let first = injector.instance::<Connection>().unwrap();
    let second = injector.instance::<Connection>().unwrap();
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

// ═══════════════════════════════════════════════════════════════
// TARGETS AND PACKAGES
// ═══════════════════════════════════════════════════════════════

fn vehicles(b: &mut weft::Bindings) {
    b.constant(Locator::of::<Engine>(), Engine("plain"));
    b.constant(
        Locator::of::<Engine>().injecting_into(Instance::of::<Car>()),
        Engine("car"),
    );
    b.bind(
        Locator::of::<Car>(),
        supplier(|cx| {
            Ok(Car {
                engine: cx.get::<Engine>()?,
            })
        }),
    );
    b.bind(
        Locator::of::<Truck>(),
        supplier(|cx| {
            Ok(Truck {
                engine: cx.get::<Engine>()?,
            })
        }),
    );
}

#[test]
fn test_targeted_binding_wins_inside_its_target() {
    let injector = assemble(vehicles).unwrap();

    assert_eq!(injector.instance::<Car>().unwrap().engine.0, "car");
    assert_eq!(injector.instance::<Truck>().unwrap().engine.0, "plain");
    assert_eq!(injector.instance::<Engine>().unwrap().0, "plain");
}

#[test]
fn test_package_restricted_binding() {
    let injector = assemble(|b| {
        b.constant(Locator::of::<Engine>(), Engine("shared"));
        b.constant(
            Locator::of::<Engine>().in_packages(Packages::subtree("garage")),
            Engine("garage"),
        );
    })
    .unwrap();

    let resolve = |package: &str| {
        let request = Dependency::of::<Engine>().from_package(package);
        let object = injector.resolve(&request).unwrap();
        object.downcast_ref::<Engine>().unwrap().0
    };
    assert_eq!(resolve("garage::tools"), "garage");
    assert_eq!(resolve("kitchen"), "shared");
}

#[test]
fn test_target_instance_scope_caches_per_requester() {
    let built = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&built);
    let injector = assemble(move |b| {
        let counter = Arc::clone(&counter);
        b.bind_in(
            Locator::of::<Engine>(),
            ScopeId::target_instance(),
            supplier(move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(Engine("keyed"))
            }),
        );
        b.bind_in(
            Locator::of::<Car>(),
            ScopeId::transient(),
            supplier(|cx| {
                Ok(Car {
                    engine: cx.get::<Engine>()?,
                })
            }),
        );
        b.bind_in(
            Locator::of::<Truck>(),
            ScopeId::transient(),
            supplier(|cx| {
                Ok(Truck {
                    engine: cx.get::<Engine>()?,
                })
            }),
        );
    })
    .unwrap();

    let car1 = injector.instance::<Car>().unwrap();
    let car2 = injector.instance::<Car>().unwrap();
    let truck = injector.instance::<Truck>().unwrap();

    assert!(!Arc::ptr_eq(&car1, &car2));
    assert!(Arc::ptr_eq(&car1.engine, &car2.engine));
    assert!(!Arc::ptr_eq(&car1.engine, &truck.engine));
    assert_eq!(built.load(Ordering::SeqCst), 2);
}

// ═══════════════════════════════════════════════════════════════
// SCOPES THROUGH THE INJECTOR
// ═══════════════════════════════════════════════════════════════

#[test]
fn test_worker_scope_requires_allocation() {
    struct Session;
    let worker = Arc::new(WorkerScope::new());
    let injector = Bootstrap::new(Environment::new())
        .with_shared_scope(ScopeId::worker(), worker.clone())
        .injector(&Modules::new().with(Declare::new("web", |b| {
            b.bind_in(
                Locator::of::<Session>(),
                ScopeId::worker(),
                supplier(|_| Ok(Session)),
            );
        })))
        .unwrap();

    assert!(matches!(
        injector.instance::<Session>(),
        Err(InjectError::ScopeNotAllocated { .. })
    ));

    let state = worker.begin();
    let here = injector.instance::<Session>().unwrap();
    assert!(Arc::ptr_eq(&here, &injector.instance::<Session>().unwrap()));

    std::thread::scope(|s| {
        s.spawn(|| {
            let _guard = worker.enter(state.clone());
            let there = injector.instance::<Session>().unwrap();
            assert!(Arc::ptr_eq(&here, &there));
        });
        s.spawn(|| {
            let _fresh = worker.begin();
            let other = injector.instance::<Session>().unwrap();
            assert!(!Arc::ptr_eq(&here, &other));
        });
    });
    worker.deallocate();
}

#[test]
fn test_transient_scope_produces_every_time() {
    struct Ticket;
    let injector = assemble(|b| {
        b.bind_in(
            Locator::of::<Ticket>(),
            ScopeId::transient(),
            supplier(|_| Ok(Ticket)),
        );
    })
    .unwrap();
    let a = injector.instance::<Ticket>().unwrap();
    let b = injector.instance::<Ticket>().unwrap();
    assert!(!Arc::ptr_eq(&a, &b));
}

// ═══════════════════════════════════════════════════════════════
// LIFECYCLE
// ═══════════════════════════════════════════════════════════════

#[test]
fn test_shutdown_runs_hooks_once_latest_first() {
    let injector = assemble(|_| {}).unwrap();
    let log = Arc::new(Mutex::new(Vec::new()));
    for id in 1..=2 {
        let log = Arc::clone(&log);
        injector.on_shutdown(move || log.lock().push(id));
    }

    injector.shutdown();
    injector.shutdown();

    assert!(injector.is_shut_down());
    assert_eq!(*log.lock(), vec![2, 1]);
}

#[test]
fn test_producers_see_the_injection_stack() {
    struct Depth(usize);
    struct Outer(Arc<Depth>);
    let injector = assemble(|b| {
        b.bind_in(
            Locator::of::<Depth>(),
            ScopeId::transient(),
            supplier(|cx| Ok(Depth(cx.dependency().stack().len()))),
        );
        b.bind(
            Locator::of::<Outer>(),
            supplier(|cx| Ok(Outer(cx.get::<Depth>()?))),
        );
    })
    .unwrap();

    assert_eq!(injector.instance::<Depth>().unwrap().0, 1);
    assert_eq!(injector.instance::<Outer>().unwrap().0 .0, 2);
}

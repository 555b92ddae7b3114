//! Application scope - one instance per slot for the injector's lifetime

use crate::error::Result;
use crate::model::{Dependency, Object};

use super::{Scope, SlotArray};

/// Singleton per slot
///
/// Racing producers for an empty slot may all run. The first to publish
/// wins and the others' results are dropped, so producers must tolerate a
/// redundant call.
#[derive(Default)]
pub struct ApplicationScope {
    slots: SlotArray,
}

impl ApplicationScope {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Scope for ApplicationScope {
    fn provide(
        &self,
        slot: usize,
        slots: usize,
        _dependency: &Dependency,
        producer: &dyn Fn() -> Result<Object>,
    ) -> Result<Object> {
        self.slots.provide(slot, slots, producer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Barrier};

    #[test]
    fn concurrent_callers_share_one_instance() {
        let scope = Arc::new(ApplicationScope::new());
        let barrier = Arc::new(Barrier::new(8));
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let scope = Arc::clone(&scope);
                let barrier = Arc::clone(&barrier);
                std::thread::spawn(move || {
                    barrier.wait();
                    scope
                        .provide(0, 1, &Dependency::of::<u32>(), &|| {
                            Ok(Arc::new(i as u32) as Object)
                        })
                        .unwrap()
                })
            })
            .collect();
        let results: Vec<Object> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        for result in &results[1..] {
            assert!(Arc::ptr_eq(&results[0], result));
        }
    }
}

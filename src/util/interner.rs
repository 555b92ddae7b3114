//! String interning for type names, qualifier names and package paths
//!
//! Raw type names and binding names recur in every locator, dependency and
//! cache key. Interning keeps one allocation per distinct string and lets
//! equality checks short-circuit on pointer identity.

use std::sync::Arc;

use dashmap::DashMap;
use once_cell::sync::Lazy;

/// Global string interner (thread-safe, lock-free)
static INTERNER: Lazy<Interner> = Lazy::new(Interner::new);

/// Thread-safe string interner using DashMap
pub struct Interner {
    strings: DashMap<Arc<str>, ()>,
}

impl Interner {
    pub fn new() -> Self {
        Self {
            strings: DashMap::new(),
        }
    }

    /// Intern a string, returning the shared Arc<str>
    ///
    /// Concurrent callers interning the same content all observe the Arc
    /// of whichever insert landed first.
    pub fn intern(&self, s: &str) -> Arc<str> {
        if let Some(existing) = self.strings.get(s) {
            return Arc::clone(existing.key());
        }
        let entry = self.strings.entry(Arc::from(s)).or_insert(());
        Arc::clone(entry.key())
    }

    /// Number of interned strings
    pub fn len(&self) -> usize {
        self.strings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }
}

impl Default for Interner {
    fn default() -> Self {
        Self::new()
    }
}

/// Intern a string using the global interner
#[inline]
pub fn intern(s: &str) -> Arc<str> {
    INTERNER.intern(s)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intern_returns_same_arc_for_same_string() {
        let interner = Interner::new();

        let a1 = interner.intern("app::shapes::Circle");
        let a2 = interner.intern("app::shapes::Circle");

        assert!(Arc::ptr_eq(&a1, &a2));
    }

    #[test]
    fn intern_different_strings_different_arcs() {
        let interner = Interner::new();

        let a = interner.intern("red");
        let b = interner.intern("blue");

        assert!(!Arc::ptr_eq(&a, &b));
        assert_eq!(interner.len(), 2);
    }

    #[test]
    fn global_intern_works() {
        let a1 = intern("global_name");
        let a2 = intern("global_name");

        assert!(Arc::ptr_eq(&a1, &a2));
    }

    #[test]
    fn concurrent_same_string_returns_same_arc() {
        use std::sync::mpsc;
        use std::thread;

        let interner = Arc::new(Interner::new());
        let (tx, rx) = mpsc::channel();

        for _ in 0..10 {
            let interner = Arc::clone(&interner);
            let tx = tx.clone();
            thread::spawn(move || {
                tx.send(interner.intern("shared::Type")).unwrap();
            });
        }
        drop(tx);

        let results: Vec<Arc<str>> = rx.iter().collect();
        assert_eq!(results.len(), 10);
        for result in &results[1..] {
            assert!(Arc::ptr_eq(&results[0], result));
        }
        assert_eq!(interner.len(), 1);
    }
}

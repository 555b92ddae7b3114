//! Freeze - turn surviving bindings into resources
//!
//! Serials follow input order. Slots are assigned per scope in the same
//! order, so a given input always yields the same slots. Scopes sharing
//! cache storage (a snapshot and the scopes it wraps) share one slot
//! numbering.

use std::sync::Arc;

use rustc_hash::FxHashMap;
use tracing::debug;

use crate::engine::Resource;
use crate::error::{InjectError, Result};
use crate::model::Binding;
use crate::scope::{Scope, ScopeId, Scopes};

pub fn freeze(bindings: &[Binding], scopes: &Scopes) -> Result<Vec<Resource>> {
    let storage = storage_groups(scopes);
    let mut next_slot: FxHashMap<usize, usize> = FxHashMap::default();
    let mut resources = Vec::with_capacity(bindings.len());

    for (serial, binding) in bindings.iter().enumerate() {
        let supplier = binding
            .supplier()
            .cloned()
            .ok_or_else(|| InjectError::IncompleteBinding {
                locator: binding.locator().to_string(),
                source_ref: binding.source().to_string(),
            })?;
        let (scope, group) = scopes
            .get(binding.scope())
            .zip(storage.get(binding.scope()).copied())
            .ok_or_else(|| InjectError::UnknownScope {
                scope: binding.scope().to_string(),
                locator: binding.locator().to_string(),
            })?;
        let slot = next_slot.entry(group).or_insert(0);
        resources.push(Resource::new(serial, binding, supplier, scope, *slot));
        *slot += 1;
        debug!(serial, binding = %binding, "resource frozen");
    }

    for resource in &mut resources {
        let slots = storage
            .get(resource.scope_id())
            .and_then(|group| next_slot.get(group))
            .copied()
            .unwrap_or(0);
        resource.set_slots(slots);
    }
    Ok(resources)
}

/// Storage group of every registered scope
fn storage_groups(scopes: &Scopes) -> FxHashMap<ScopeId, usize> {
    let mut groups = StorageGroups::default();
    let mut members = Vec::new();
    for id in scopes.ids() {
        if let Some(scope) = scopes.get(id) {
            let own = address(&scope);
            groups.join_parts(own, &scope);
            members.push((id.clone(), own));
        }
    }
    members
        .into_iter()
        .map(|(id, own)| (id, groups.find(own)))
        .collect()
}

fn address(scope: &Arc<dyn Scope>) -> usize {
    Arc::as_ptr(scope) as *const () as usize
}

/// Union-find over scope addresses
#[derive(Default)]
struct StorageGroups {
    parent: FxHashMap<usize, usize>,
}

impl StorageGroups {
    fn find(&mut self, node: usize) -> usize {
        let mut root = node;
        while let Some(&parent) = self.parent.get(&root) {
            if parent == root {
                break;
            }
            root = parent;
        }
        self.parent.insert(node, root);
        root
    }

    fn union(&mut self, a: usize, b: usize) {
        let (a, b) = (self.find(a), self.find(b));
        if a != b {
            self.parent.insert(b, a);
        }
    }

    fn join_parts(&mut self, own: usize, scope: &Arc<dyn Scope>) {
        self.find(own);
        for part in scope.parts() {
            let node = address(&part);
            self.union(own, node);
            self.join_parts(node, &part);
        }
    }
}

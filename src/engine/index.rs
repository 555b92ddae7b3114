//! Raw-type index over the frozen resource array
//!
//! Each resource is filed under its own raw type and every raw supertype,
//! so both subtype matches (upper-bound requests) and supertype matches
//! (upper-bound providers) are one lookup away. Wildcard providers are
//! candidates for every request.

use std::sync::Arc;

use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::model::Dependency;
use crate::types::Type;
use crate::util::intern;

use super::Resource;

#[derive(Debug, Default)]
pub(crate) struct ResourceIndex {
    by_raw: FxHashMap<Arc<str>, SmallVec<[usize; 4]>>,
    wildcards: Vec<usize>,
}

impl ResourceIndex {
    pub(crate) fn build(resources: &[Resource]) -> Self {
        let mut index = Self::default();
        for resource in resources {
            let ty = resource.locator().ty();
            if ty.is_wildcard() {
                index.wildcards.push(resource.serial());
                continue;
            }
            for raw in raw_names(ty) {
                let serials = index.by_raw.entry(raw).or_default();
                if !serials.contains(&resource.serial()) {
                    serials.push(resource.serial());
                }
            }
        }
        index
    }

    /// Serials of resources that might serve `dependency`, ascending
    pub(crate) fn candidates(&self, dependency: &Dependency) -> Vec<usize> {
        let ty = dependency.ty();
        if ty.is_wildcard() {
            let mut all: Vec<usize> = self.by_raw.values().flatten().copied().collect();
            all.extend_from_slice(&self.wildcards);
            all.sort_unstable();
            all.dedup();
            return all;
        }
        let mut found: Vec<usize> = self.wildcards.clone();
        for raw in raw_names(ty) {
            if let Some(serials) = self.by_raw.get(&raw) {
                found.extend_from_slice(serials);
            }
        }
        found.sort_unstable();
        found.dedup();
        found
    }
}

/// The type's own raw name followed by its supertypes' raw names
///
/// Array types are filed under their component's names; dimensions are
/// checked by the locator.
fn raw_names(ty: &Type) -> Vec<Arc<str>> {
    let mut names = vec![intern(ty.raw_type().name())];
    names.extend(
        ty.with_dimensions(0)
            .supertypes()
            .iter()
            .map(|sup| intern(sup.raw_type().name())),
    );
    names
}

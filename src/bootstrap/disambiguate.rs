//! Disambiguation - collapse bindings that share a locator
//!
//! Per group of equal locators:
//! - a single binding is kept
//! - otherwise the most qualified tier is kept and the rest is overridden
//! - a top-tier binding whose declaration type clashes with any other
//!   binding of the group aborts assembly
//! - non-clashing ties (several multi bindings, say) are all kept
//!
//! The outcome only depends on the set of bindings, not on their order.
//! Survivors keep their first-appearance order.

use rustc_hash::FxHashMap;
use tracing::debug;

use crate::error::{InjectError, Result};
use crate::model::{top_tier, Binding, Locator};

pub fn disambiguate(bindings: Vec<Binding>) -> Result<Vec<Binding>> {
    let mut positions: FxHashMap<Locator, usize> = FxHashMap::default();
    let mut groups: Vec<Vec<Binding>> = Vec::new();
    for binding in bindings {
        match positions.get(binding.locator()) {
            Some(&group) => groups[group].push(binding),
            None => {
                positions.insert(binding.locator().clone(), groups.len());
                groups.push(vec![binding]);
            }
        }
    }

    let mut survivors = Vec::new();
    for group in groups {
        survivors.extend(resolve_group(group)?);
    }
    Ok(survivors)
}

fn resolve_group(group: Vec<Binding>) -> Result<Vec<Binding>> {
    if group.len() == 1 {
        return Ok(group);
    }
    let best = top_tier(&group);
    for &winner in &best {
        for (other, binding) in group.iter().enumerate() {
            if other != winner && group[winner].kind().clashes_with(binding.kind()) {
                let (first, second) = if winner < other {
                    (&group[winner], binding)
                } else {
                    (binding, &group[winner])
                };
                return Err(InjectError::InconsistentDeclaration {
                    locator: first.locator().to_string(),
                    first: format!("{} ({})", first.source(), first.kind()),
                    second: format!("{} ({})", second.source(), second.kind()),
                });
            }
        }
    }

    let mut kept = Vec::with_capacity(best.len());
    for (index, binding) in group.into_iter().enumerate() {
        if best.contains(&index) {
            kept.push(binding);
        } else {
            debug!(binding = %binding, "binding overridden");
        }
    }
    Ok(kept)
}

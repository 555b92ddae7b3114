//! Transient scope - a fresh instance for every request

use crate::error::Result;
use crate::model::{Dependency, Object};

use super::Scope;

#[derive(Debug, Clone, Copy, Default)]
pub struct TransientScope;

impl Scope for TransientScope {
    fn provide(
        &self,
        _slot: usize,
        _slots: usize,
        _dependency: &Dependency,
        producer: &dyn Fn() -> Result<Object>,
    ) -> Result<Object> {
        producer()
    }
}

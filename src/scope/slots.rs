//! SlotArray - growable array of write-once cells indexed by slot id

use std::sync::Arc;

use once_cell::sync::OnceCell;
use parking_lot::RwLock;

use crate::error::Result;
use crate::model::Object;

type Cell = Arc<OnceCell<Object>>;

/// Write-once slots, first writer wins
///
/// Cells are handed out as `Arc`s so the array lock is never held while a
/// producer runs. Concurrent producers of the same slot may all run; only
/// the first successful insert is published and every caller observes it.
#[derive(Default)]
pub struct SlotArray {
    cells: RwLock<Vec<Cell>>,
}

impl SlotArray {
    pub fn new(len: usize) -> Self {
        let cells = (0..len).map(|_| Cell::default()).collect();
        Self {
            cells: RwLock::new(cells),
        }
    }

    pub fn len(&self) -> usize {
        self.cells.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.read().is_empty()
    }

    /// Cached instance of `slot`, if produced
    pub fn get(&self, slot: usize) -> Option<Object> {
        self.cells
            .read()
            .get(slot)
            .and_then(|cell| cell.get().cloned())
    }

    /// Cached instance of `slot`, producing it on a miss
    pub fn provide(
        &self,
        slot: usize,
        slots: usize,
        producer: &dyn Fn() -> Result<Object>,
    ) -> Result<Object> {
        let cell = self.cell(slot, slots);
        if let Some(existing) = cell.get() {
            return Ok(Arc::clone(existing));
        }
        let produced = producer()?;
        match cell.try_insert(produced) {
            Ok(published) => Ok(Arc::clone(published)),
            Err((winner, _discarded)) => Ok(Arc::clone(winner)),
        }
    }

    fn cell(&self, slot: usize, slots: usize) -> Cell {
        if let Some(cell) = self.cells.read().get(slot) {
            return Arc::clone(cell);
        }
        let mut cells = self.cells.write();
        let len = slots.max(slot + 1);
        if cells.len() < len {
            cells.resize_with(len, Cell::default);
        }
        Arc::clone(&cells[slot])
    }
}

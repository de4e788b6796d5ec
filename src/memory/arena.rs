//! Session-scoped arena allocator
//!
//! Arrays and other aggregates created during evaluation are stored in a bump
//! arena of [`Value`] cells. Allocation is O(1) and nothing is ever freed
//! individually: the whole arena is released (or reset) in one step when the
//! owning session is torn down. This bounds the damage a runaway user program
//! can do to a single sampling pass.
//!
//! # Error Handling
//!
//! Methods return `Result<_, String>`; the string errors are converted to
//! typed evaluation errors at the interpreter boundary.

use super::value::{Handle, Value};

/// Bump allocator of value cells, addressed by [`Handle`]
#[derive(Debug)]
pub struct Arena {
    cells: Vec<Value>,
    max_cells: usize,
}

impl Arena {
    /// Create a new arena with a cell ceiling
    pub fn new(max_cells: usize) -> Self {
        Arena {
            cells: Vec::new(),
            max_cells,
        }
    }

    /// Allocate `count` cells, all set to `init`. Returns the handle of the
    /// first cell; the block is contiguous.
    pub fn allocate(&mut self, count: usize, init: Value) -> Result<Handle, String> {
        if self.cells.len() + count > self.max_cells {
            return Err(format!(
                "Out of arena memory: requested {} cells, {} in use, limit is {}",
                count,
                self.cells.len(),
                self.max_cells
            ));
        }

        let handle = self.cells.len();
        self.cells.resize(self.cells.len() + count, init);
        Ok(handle)
    }

    /// Read the cell at `handle`
    pub fn get(&self, handle: Handle) -> Result<Value, String> {
        self.cells
            .get(handle)
            .copied()
            .ok_or_else(|| format!("Invalid arena handle {}", handle))
    }

    /// Write the cell at `handle`
    pub fn set(&mut self, handle: Handle, value: Value) -> Result<(), String> {
        match self.cells.get_mut(handle) {
            Some(cell) => {
                *cell = value;
                Ok(())
            }
            None => Err(format!("Invalid arena handle {}", handle)),
        }
    }

    /// Number of cells currently allocated
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Check if the arena is empty
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Release every cell at once. Handles from before the reset are invalid.
    pub fn reset(&mut self) {
        self.cells.clear();
    }
}

impl Default for Arena {
    fn default() -> Self {
        // Default ceiling: 1M cells per session
        Self::new(1 << 20)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allocate_and_access() {
        let mut arena = Arena::new(16);
        let h = arena.allocate(4, Value::Int(0)).unwrap();
        arena.set(h + 2, Value::Double(1.5)).unwrap();

        assert_eq!(arena.get(h).unwrap(), Value::Int(0));
        assert_eq!(arena.get(h + 2).unwrap(), Value::Double(1.5));
        assert_eq!(arena.len(), 4);
    }

    #[test]
    fn test_ceiling() {
        let mut arena = Arena::new(8);
        assert!(arena.allocate(8, Value::Uninitialized).is_ok());
        assert!(arena.allocate(1, Value::Uninitialized).is_err());
    }

    #[test]
    fn test_reset_releases_everything() {
        let mut arena = Arena::new(8);
        let h = arena.allocate(8, Value::Int(7)).unwrap();
        arena.reset();

        assert!(arena.is_empty());
        assert!(arena.get(h).is_err());
        // Space is reusable after reset
        assert!(arena.allocate(8, Value::Int(0)).is_ok());
    }

    #[test]
    fn test_out_of_bounds_handle() {
        let arena = Arena::new(8);
        assert!(arena.get(0).is_err());
    }
}

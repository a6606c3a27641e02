//! Defines the [`Segment`] type.

use bitflags::bitflags;

use super::Value;

bitflags! {
    /// Bookkeeping flags attached to a written memory cell.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct CellFlags: u8 {
        /// The cell was read by an instruction at least once.
        ///
        /// Downstream public-memory accounting relies on this; the virtual
        /// machine only maintains it.
        const ACCESSED = 1 << 0;
    }
}

/// A single asserted memory cell: a value plus its bookkeeping flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cell {
    value: Value,
    flags: CellFlags,
}

impl Cell {
    /// The value the cell was asserted to.
    #[inline]
    pub const fn value(&self) -> Value {
        self.value
    }

    /// Whether the cell was ever read by an instruction.
    #[inline]
    pub const fn is_accessed(&self) -> bool {
        self.flags.contains(CellFlags::ACCESSED)
    }

    pub(crate) fn value_mut(&mut self) -> &mut Value {
        &mut self.value
    }
}

/// A relocatable segment of memory accessible by the Cairo virtual machine.
///
/// # Write-once cells
///
/// The memory of a Cairo virtual machine does not work the way regular
/// computer memory does. It is mathematically immutable: writing a cell
/// *asserts* it to a specific value, and any later write must confirm that
/// same value. A segment therefore only ever grows, and a cell never changes
/// once it is known.
///
/// # Representation
///
/// Programs address segments densely from offset zero, so a flat array of
/// optional cells is enough. Gaps can still appear within a segment, but they
/// remain small in practice.
#[derive(Debug, Clone, Default)]
pub struct Segment {
    cells: Vec<Option<Cell>>,
}

impl Segment {
    /// Creates a new empty [`Segment`].
    pub const fn new() -> Self {
        Self { cells: Vec::new() }
    }

    /// The used size of the segment: one past the highest written offset, or
    /// zero when nothing was ever written.
    #[inline]
    pub fn used_size(&self) -> usize {
        self.cells.len()
    }

    /// Returns the cell at `offset`, if it has been asserted to a value.
    pub fn get(&self, offset: usize) -> Option<&Cell> {
        self.cells.get(offset)?.as_ref()
    }

    /// Returns the value of the cell at `offset`, if known.
    pub fn value(&self, offset: usize) -> Option<Value> {
        Some(self.get(offset)?.value)
    }

    /// Asserts the cell at `offset` to `value`.
    ///
    /// Returns whether the cell was newly written: re-asserting the current
    /// value is a no-op reported as `Ok(false)`. Asserting a different value
    /// fails, handing back the value the cell is frozen to.
    pub(crate) fn insert(&mut self, offset: usize, value: Value) -> Result<bool, Value> {
        if offset >= self.cells.len() {
            self.cells.resize(offset + 1, None);
        }

        match &self.cells[offset] {
            None => {
                self.cells[offset] = Some(Cell {
                    value,
                    flags: CellFlags::empty(),
                });
                Ok(true)
            }
            Some(cell) if cell.value == value => Ok(false),
            Some(cell) => Err(cell.value),
        }
    }

    /// Flags the cell at `offset` as read by an instruction.
    ///
    /// Returns whether a written cell was found at that offset.
    pub(crate) fn mark_accessed(&mut self, offset: usize) -> bool {
        match self.cells.get_mut(offset) {
            Some(Some(cell)) => {
                cell.flags.insert(CellFlags::ACCESSED);
                true
            }
            _ => false,
        }
    }

    /// Iterates over the written cells of the segment, in offset order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &Cell)> {
        self.cells
            .iter()
            .enumerate()
            .filter_map(|(offset, cell)| Some((offset, cell.as_ref()?)))
    }

    /// Iterates mutably over the written cells of the segment.
    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = (usize, &mut Cell)> {
        self.cells
            .iter_mut()
            .enumerate()
            .filter_map(|(offset, cell)| Some((offset, cell.as_mut()?)))
    }
}

//! Defines the [`SegmentManager`] type, responsible for allocating memory
//! segments and flattening them into a single address space at the end of a
//! run.

use groudon_felt::Felt;

use crate::error::Error;
use crate::memory::{Memory, Pointer, Value};

/// Allocates segments, tracks their used sizes, and performs the final
/// relocation that concatenates every segment into one flat index space.
///
/// The manager owns the [`Memory`]; the virtual machine reaches the memory
/// through it.
#[derive(Debug, Default)]
pub struct SegmentManager {
    /// The memory managed by this instance.
    pub memory: Memory,
    /// Cached used sizes of the positive segments, one entry per segment.
    segment_used_sizes: Option<Vec<usize>>,
    /// Cached flat base of each positive segment, computed by relocation.
    relocation_table: Option<Vec<usize>>,
}

impl SegmentManager {
    /// Creates a new [`SegmentManager`] with an empty memory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates a new segment and returns its base address `(n, 0)`.
    pub fn add(&mut self) -> Pointer {
        self.segment_used_sizes = None;
        let index = self.memory.add_segment();
        Pointer::new(index as isize, 0)
    }

    /// Allocates a new temporary segment and returns its base `(-m, 0)`.
    ///
    /// Temporary segments let callers build data whose final position is not
    /// yet known; they are resolved through relocation rules at the end of
    /// the run.
    pub fn add_temporary_segment(&mut self) -> Pointer {
        let index = self.memory.add_temporary_segment();
        Pointer::new(index, 0)
    }

    /// Writes `data` into memory starting at `base` and returns the first
    /// address past the written block.
    pub fn load_data(&mut self, base: Pointer, data: &[Value]) -> Result<Pointer, Error> {
        for (index, value) in data.iter().enumerate() {
            self.memory.insert(base.add_uint(index)?, *value)?;
        }
        base.add_uint(data.len())
    }

    /// Walks every positive segment and records its used size: one past the
    /// highest written offset, or zero for untouched segments.
    pub fn compute_effective_sizes(&mut self) -> &[usize] {
        let sizes = self
            .memory
            .segments()
            .iter()
            .map(|segment| segment.used_size())
            .collect();
        self.segment_used_sizes.insert(sizes).as_slice()
    }

    /// The flat base of each positive segment, once relocation has run.
    pub fn relocation_table(&self) -> Option<&[usize]> {
        self.relocation_table.as_deref()
    }

    /// Computes the flat base of each segment: segments are concatenated in
    /// index order, so `base[i]` is the sum of the used sizes of all the
    /// segments before `i`.
    pub fn relocate_segments(&mut self) -> &[usize] {
        if self.segment_used_sizes.is_none() {
            self.compute_effective_sizes();
        }

        let mut table = Vec::new();
        let mut base = 0usize;
        if let Some(sizes) = &self.segment_used_sizes {
            table.reserve(sizes.len());
            for &size in sizes {
                table.push(base);
                base += size;
            }
        }
        self.relocation_table.insert(table).as_slice()
    }

    /// Flattens the whole memory into a single address space.
    ///
    /// Temporary segments are folded into their destinations first, then
    /// every cell is assigned the flat address `base[segment] + offset` and
    /// every stored address is rewritten to its own flat index. The result is
    /// the relocated image as `(address, value)` pairs in ascending address
    /// order; cells never written are omitted.
    pub fn relocate_memory(&mut self) -> Result<Vec<(usize, Felt)>, Error> {
        self.memory.relocate_memory()?;
        self.compute_effective_sizes();
        let table = self.relocate_segments().to_vec();

        let mut relocated = Vec::new();
        for (index, segment) in self.memory.segments().iter().enumerate() {
            for (offset, cell) in segment.iter() {
                let address = table[index] + offset;
                let value = match cell.value() {
                    Value::Scalar(felt) => felt,
                    Value::Pointer(pointer) => {
                        let base = usize::try_from(pointer.segment)
                            .ok()
                            .and_then(|segment| table.get(segment))
                            .ok_or(Error::UnallocatedSegment {
                                segment: pointer.segment,
                            })?;
                        Felt::from(base + pointer.offset)
                    }
                };
                relocated.push((address, value));
            }
        }

        Ok(relocated)
    }
}

//! Defines the [`Memory`] type, responsible for representing the memory of a
//! Cairo virtual machine.
//!
//! # Immutable Memory
//!
//! The memory of a Cairo virtual machine does not work the same way regular
//! computer memory does. It is mathematically immutable: every operation that
//! would normally mutate memory instead *asserts* a memory cell to a specific
//! value. The value was previously unknown, and now it is defined. Any later
//! write to that cell must confirm the value it was asserted to.
//!
//! # Segments
//!
//! The address space of the machine is the size of the field, which cannot be
//! represented directly. Programs therefore split their memory into
//! *segments*: contiguous blocks located *somewhere* in the address space,
//! whose final location is only decided once the program has finished
//! running. Segments with a negative index are temporary; they are resolved
//! into the positive index space by a table of relocation rules at the end of
//! the run.

mod pointer;
mod segment;
mod value;

use std::collections::{HashMap, HashSet};
use std::fmt;

pub use self::pointer::*;
pub use self::segment::*;
pub use self::value::*;

use crate::error::Error;

/// A validation hook attached to a segment.
///
/// The rule is invoked once for every newly written cell of its segment and
/// returns the list of addresses it vouches for. Validated addresses are
/// remembered by the [`Memory`].
pub type ValidationRule = Box<dyn Fn(&Memory, Pointer) -> Result<Vec<Pointer>, Error>>;

/// Represents the memory of the Cairo virtual machine.
///
/// More information on the memory model can be found in the
/// [module-level documentation](self).
#[derive(Default)]
pub struct Memory {
    /// The segments that have been initialized in the memory.
    segments: Vec<Segment>,
    /// Temporary segments, addressed with negative indices: index `-m` lives
    /// in slot `m - 1`.
    temporary_segments: Vec<Segment>,
    /// Validation hooks, keyed by positive segment index.
    validation_rules: HashMap<usize, ValidationRule>,
    /// Addresses vouched for by validation rules so far.
    validated_addresses: HashSet<Pointer>,
    /// Where each temporary segment lands once its final position is known.
    relocation_rules: HashMap<isize, Pointer>,
}

impl Memory {
    /// Creates a new empty [`Memory`] with no allocated segments.
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates a new segment and returns its index.
    pub(crate) fn add_segment(&mut self) -> usize {
        self.segments.push(Segment::new());
        self.segments.len() - 1
    }

    /// Allocates a new temporary segment and returns its (negative) index.
    pub(crate) fn add_temporary_segment(&mut self) -> isize {
        self.temporary_segments.push(Segment::new());
        -(self.temporary_segments.len() as isize)
    }

    /// The number of allocated positive segments.
    pub fn num_segments(&self) -> usize {
        self.segments.len()
    }

    /// The number of allocated temporary segments.
    pub fn num_temporary_segments(&self) -> usize {
        self.temporary_segments.len()
    }

    /// The allocated positive segments, in index order.
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    fn segment(&self, index: isize) -> Option<&Segment> {
        if index >= 0 {
            self.segments.get(index as usize)
        } else {
            self.temporary_segments.get((-(index + 1)) as usize)
        }
    }

    fn segment_mut(&mut self, index: isize) -> Option<&mut Segment> {
        if index >= 0 {
            self.segments.get_mut(index as usize)
        } else {
            self.temporary_segments.get_mut((-(index + 1)) as usize)
        }
    }

    /// Returns the value stored at `addr`, if the cell was ever written.
    ///
    /// Reads never allocate: addressing a segment or an offset that does not
    /// exist simply yields `None`.
    pub fn get(&self, addr: Pointer) -> Option<Value> {
        self.segment(addr.segment)?.value(addr.offset)
    }

    /// Returns the cell stored at `addr`, along with its bookkeeping flags.
    pub fn cell(&self, addr: Pointer) -> Option<&Cell> {
        self.segment(addr.segment)?.get(addr.offset)
    }

    /// Asserts the cell at `addr` to `value`.
    ///
    /// Writing the current value again is a no-op; writing a different value
    /// fails with [`Error::InconsistentMemory`]. If the segment carries a
    /// validation rule, the rule runs on every newly written cell.
    pub fn insert(&mut self, addr: Pointer, value: impl Into<Value>) -> Result<(), Error> {
        let value = value.into();
        let segment = self
            .segment_mut(addr.segment)
            .ok_or(Error::UnallocatedSegment {
                segment: addr.segment,
            })?;

        let newly_written =
            segment
                .insert(addr.offset, value)
                .map_err(|current| Error::InconsistentMemory {
                    addr,
                    current,
                    attempted: value,
                })?;

        if newly_written && addr.segment >= 0 {
            self.validate(addr)?;
        }

        Ok(())
    }

    /// Flags the cell at `addr` as read by an instruction.
    pub fn mark_accessed(&mut self, addr: Pointer) {
        if let Some(segment) = self.segment_mut(addr.segment) {
            segment.mark_accessed(addr.offset);
        }
    }

    /// Attaches a validation rule to a segment.
    ///
    /// The rule fires on every insert into that segment from now on; cells
    /// written before the rule was attached can be caught up on with
    /// [`Memory::validate_existing_memory`].
    pub fn add_validation_rule(&mut self, segment: usize, rule: ValidationRule) {
        self.validation_rules.insert(segment, rule);
    }

    /// Runs the validation rules over every cell written so far.
    ///
    /// Addresses that have already been validated are skipped, so calling
    /// this repeatedly is idempotent.
    pub fn validate_existing_memory(&mut self) -> Result<(), Error> {
        let mut pending = Vec::new();
        for &segment in self.validation_rules.keys() {
            if let Some(cells) = self.segments.get(segment) {
                for (offset, _) in cells.iter() {
                    let addr = Pointer::new(segment as isize, offset);
                    if !self.validated_addresses.contains(&addr) {
                        pending.push(addr);
                    }
                }
            }
        }

        for addr in pending {
            self.validate(addr)?;
        }
        Ok(())
    }

    /// Addresses confirmed by validation rules so far.
    pub fn validated_addresses(&self) -> &HashSet<Pointer> {
        &self.validated_addresses
    }

    fn validate(&mut self, addr: Pointer) -> Result<(), Error> {
        debug_assert!(addr.segment >= 0);
        if let Some(rule) = self.validation_rules.get(&(addr.segment as usize)) {
            let validated = rule(self, addr)?;
            self.validated_addresses.extend(validated);
        }
        Ok(())
    }

    /// Records that the temporary segment `src_segment` will be folded into
    /// the memory at `dst` when [`Memory::relocate_memory`] runs.
    ///
    /// `src_segment` must be the index of an allocated temporary segment that
    /// has no rule yet, and `dst` must not itself be temporary.
    pub fn add_relocation_rule(&mut self, src_segment: isize, dst: Pointer) {
        debug_assert!(src_segment < 0);
        debug_assert!(!dst.is_temporary());
        debug_assert!(!self.relocation_rules.contains_key(&src_segment));
        self.relocation_rules.insert(src_segment, dst);
    }

    /// Resolves `addr` through a table of relocation rules.
    ///
    /// Addresses in positive segments are returned unchanged; addresses in a
    /// temporary segment are rebased onto the rule's destination. A temporary
    /// address with no rule fails with [`Error::UnallocatedSegment`].
    pub fn relocate_address(
        addr: Pointer,
        relocation_rules: &HashMap<isize, Pointer>,
    ) -> Result<Pointer, Error> {
        if !addr.is_temporary() {
            return Ok(addr);
        }
        let base = relocation_rules
            .get(&addr.segment)
            .ok_or(Error::UnallocatedSegment {
                segment: addr.segment,
            })?;
        base.add_uint(addr.offset)
    }

    /// Applies the recorded relocation rules: every stored address that
    /// points into a temporary segment is rewritten, and the contents of the
    /// temporary segments are folded into their destinations.
    ///
    /// Once this returns, no cell references a temporary segment and the rule
    /// table is cleared, so running it again is a no-op.
    pub fn relocate_memory(&mut self) -> Result<(), Error> {
        if self.relocation_rules.is_empty() && self.temporary_segments.is_empty() {
            return Ok(());
        }

        // Rewrite stored addresses first, in both address spaces.
        let rules = &self.relocation_rules;
        for segment in self
            .segments
            .iter_mut()
            .chain(self.temporary_segments.iter_mut())
        {
            for (_, cell) in segment.iter_mut() {
                if let Value::Pointer(pointer) = cell.value() {
                    if pointer.is_temporary() {
                        *cell.value_mut() = Value::Pointer(Self::relocate_address(pointer, rules)?);
                    }
                }
            }
        }

        // Then fold the temporary segments into their destinations. The
        // write-once contract still applies to every moved cell.
        let temporary_segments = std::mem::take(&mut self.temporary_segments);
        let rules = std::mem::take(&mut self.relocation_rules);
        for (slot, segment) in temporary_segments.iter().enumerate() {
            let src_segment = -((slot + 1) as isize);
            let base = match rules.get(&src_segment) {
                Some(base) => *base,
                None if segment.used_size() == 0 => continue,
                None => {
                    return Err(Error::UnallocatedSegment {
                        segment: src_segment,
                    })
                }
            };

            for (offset, cell) in segment.iter() {
                let dst = base.add_uint(offset)?;
                self.insert(dst, cell.value())?;
                if cell.is_accessed() {
                    self.mark_accessed(dst);
                }
            }
        }

        Ok(())
    }
}

impl fmt::Debug for Memory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Memory")
            .field("segments", &self.segments)
            .field("temporary_segments", &self.temporary_segments)
            .field("validation_rules", &self.validation_rules.len())
            .field("validated_addresses", &self.validated_addresses)
            .field("relocation_rules", &self.relocation_rules)
            .finish()
    }
}

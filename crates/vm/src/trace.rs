//! Execution trace types: the per-step register snapshots gathered during a
//! run and their relocated form.

use crate::error::Error;
use crate::memory::Pointer;

/// The registers of the machine as they were right before one step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TraceEntry {
    /// The program counter the instruction was fetched from.
    pub pc: Pointer,
    /// The allocation pointer, as an execution-segment offset.
    pub ap: usize,
    /// The frame pointer, as an execution-segment offset.
    pub fp: usize,
}

/// A trace entry with every register mapped to the flat address space.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelocatedTraceEntry {
    /// The relocated program counter.
    pub pc: usize,
    /// The relocated allocation pointer.
    pub ap: usize,
    /// The relocated frame pointer.
    pub fp: usize,
}

/// The index of the execution segment within the relocation table.
const EXECUTION_SEGMENT: usize = 1;

/// Maps every entry of a trace to the flat address space described by
/// `relocation_table` (the flat base of each segment, in index order).
pub fn relocate_trace(
    entries: &[TraceEntry],
    relocation_table: &[usize],
) -> Result<Vec<RelocatedTraceEntry>, Error> {
    let execution_base =
        *relocation_table
            .get(EXECUTION_SEGMENT)
            .ok_or(Error::UnallocatedSegment {
                segment: EXECUTION_SEGMENT as isize,
            })?;

    entries
        .iter()
        .map(|entry| {
            let program_base = usize::try_from(entry.pc.segment)
                .ok()
                .and_then(|segment| relocation_table.get(segment))
                .ok_or(Error::UnallocatedSegment {
                    segment: entry.pc.segment,
                })?;
            Ok(RelocatedTraceEntry {
                pc: program_base + entry.pc.offset,
                ap: execution_base + entry.ap,
                fp: execution_base + entry.fp,
            })
        })
        .collect()
}

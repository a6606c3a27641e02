//! Binary writers for the relocated artifacts of a run.
//!
//! Both formats are flat little-endian records:
//!
//! - the trace file is a sequence of `(pc, ap, fp)` triples, 8 bytes each,
//!   in step order;
//! - the memory file is a sequence of `(address, value)` pairs, the address
//!   as 8 bytes and the value as a 32-byte field element, sorted by address.

use std::io::{self, Write};

use groudon_felt::Felt;
use groudon_vm::trace::RelocatedTraceEntry;

/// Writes a relocated trace to `writer`.
pub fn write_trace<W: Write>(writer: &mut W, trace: &[RelocatedTraceEntry]) -> io::Result<()> {
    for entry in trace {
        writer.write_all(&(entry.pc as u64).to_le_bytes())?;
        writer.write_all(&(entry.ap as u64).to_le_bytes())?;
        writer.write_all(&(entry.fp as u64).to_le_bytes())?;
    }
    Ok(())
}

/// Writes a relocated memory image to `writer`. Cells never written during
/// the run are simply absent from the image.
pub fn write_memory<W: Write>(writer: &mut W, memory: &[(usize, Felt)]) -> io::Result<()> {
    for (address, value) in memory {
        writer.write_all(&(*address as u64).to_le_bytes())?;
        writer.write_all(&value.to_bytes_le())?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trace_record_layout() {
        let trace = [
            RelocatedTraceEntry { pc: 1, ap: 2, fp: 3 },
            RelocatedTraceEntry {
                pc: 0x0102,
                ap: 0,
                fp: 0,
            },
        ];
        let mut out = Vec::new();
        write_trace(&mut out, &trace).unwrap();

        assert_eq!(out.len(), 48);
        assert_eq!(&out[0..8], &1u64.to_le_bytes());
        assert_eq!(&out[8..16], &2u64.to_le_bytes());
        assert_eq!(&out[16..24], &3u64.to_le_bytes());
        assert_eq!(&out[24..32], &0x0102u64.to_le_bytes());
    }

    #[test]
    fn memory_record_layout() {
        let memory = [(7usize, Felt::from(0x0504u64))];
        let mut out = Vec::new();
        write_memory(&mut out, &memory).unwrap();

        assert_eq!(out.len(), 40);
        assert_eq!(&out[0..8], &7u64.to_le_bytes());
        assert_eq!(out[8], 0x04);
        assert_eq!(out[9], 0x05);
        assert!(out[10..].iter().all(|&b| b == 0));
    }
}

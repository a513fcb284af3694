//! Symbolic mangled-name references (§4.G "Symbolic type references").
//!
//! Inside a Swift mangled-name buffer, bytes `0x01..=0x17` introduce a
//! 4-byte little-endian signed offset pointing at something other than a
//! plain length-prefixed identifier: a context descriptor, an indirect
//! (GOT-style) slot, or an Objective-C protocol record.

use crate::cursor::{Cursor, Endian};
use crate::error::Result;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SymbolicReference {
    /// `0x01`: offset points directly at a type context descriptor.
    DirectContext { target_offset: usize },
    /// `0x02`: offset points at a GOT-style pointer slot that must be
    /// followed once before resolving as `DirectContext`.
    Indirect { target_offset: usize },
    /// `0x09`: offset points at an Objective-C protocol record.
    DirectObjCProtocol { target_offset: usize },
    /// Any other marker byte in `0x01..=0x17`, passed through raw because
    /// the demangler (§4.J) is the only consumer that knows what to do
    /// with it.
    Other { marker: u8, target_offset: usize },
}

/// Reads a symbolic reference at `pos` within `data`, where `pos` points at
/// the marker byte itself. Returns the reference and the number of bytes
/// consumed (marker + 4-byte offset), or `None` if the buffer is too short
/// or the byte at `pos` isn't a marker.
pub fn read_symbolic_reference(data: &[u8], pos: usize) -> Result<Option<(SymbolicReference, usize)>> {
    let Some(&marker) = data.get(pos) else {
        return Ok(None);
    };
    if !(0x01..=0x17).contains(&marker) {
        return Ok(None);
    }
    let mut cursor = Cursor::at(data, pos + 1);
    let offset = cursor.read_s32(Endian::Little)?;
    let target_offset = ((pos + 1) as i64 + offset as i64) as usize;

    let reference = match marker {
        0x01 => SymbolicReference::DirectContext { target_offset },
        0x02 => SymbolicReference::Indirect { target_offset },
        0x09 => SymbolicReference::DirectObjCProtocol { target_offset },
        other => SymbolicReference::Other {
            marker: other,
            target_offset,
        },
    };
    Ok(Some((reference, 5)))
}

/// Resolves a `DW_EH_PE`-style 32-bit signed relative offset the way
/// `__swift5_*` metadata uses them throughout (§4.G: "a relative offset `o`
/// at file offset `f` resolves to `f + o`"). Returns `None` when the
/// result falls outside the buffer, per the "never follows an offset
/// outside any mapped section" rule.
pub fn resolve_relative(data_len: usize, base: usize, offset: i32) -> Option<usize> {
    let target = base.checked_add_signed(offset as isize)?;
    if target <= data_len {
        Some(target)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_direct_context_marker() {
        let mut data = vec![0x01u8];
        data.extend_from_slice(&10i32.to_le_bytes());
        let (reference, len) = read_symbolic_reference(&data, 0).unwrap().unwrap();
        assert_eq!(len, 5);
        assert_eq!(reference, SymbolicReference::DirectContext { target_offset: 15 });
    }

    #[test]
    fn non_marker_byte_returns_none() {
        let data = [b'S', b'S'];
        assert!(read_symbolic_reference(&data, 0).unwrap().is_none());
    }

    #[test]
    fn relative_offset_out_of_bounds_is_none() {
        assert_eq!(resolve_relative(100, 90, 50), None);
        assert_eq!(resolve_relative(100, 90, 10), Some(100));
    }
}

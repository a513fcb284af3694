//! Protocol conformance descriptors, read from `__swift5_proto` entries
//! (§4.G). Each entry is a 32-bit relative offset to a
//! `TargetProtocolConformanceDescriptor`: a protocol reference, a
//! conforming-type reference, and a witness table pattern.

use crate::cursor::{Cursor, Endian};
use crate::error::{Diagnostic, Result};
use crate::swift::symbolic_ref::resolve_relative;

bitflags::bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ConformanceFlags: u32 {
        const HAS_GENERIC_WITNESS_TABLE = 1 << 17;
        const IS_RETROACTIVE            = 1 << 18;
        const IS_SYNTHESIZED_NONUNIQUE  = 1 << 19;
    }
}

#[derive(Debug, Clone)]
pub struct ProtocolConformance {
    /// Offset of the protocol descriptor, if the reference resolved.
    pub protocol_descriptor_offset: Option<usize>,
    /// Offset of the conforming type's context descriptor, if present and
    /// resolved (conformances for builtin/foreign types may lack one).
    pub type_descriptor_offset: Option<usize>,
    pub flags: ConformanceFlags,
    pub has_witness_table_pattern: bool,
}

const RECORD_SIZE: usize = 16;

impl ProtocolConformance {
    pub fn parse(data: &[u8], offset: usize) -> Result<ProtocolConformance> {
        let mut cursor = Cursor::at(data, offset);
        let protocol_rel = cursor.read_s32(Endian::Little)?;
        let type_rel = cursor.read_s32(Endian::Little)?;
        let witness_table_rel = cursor.read_s32(Endian::Little)?;
        let flags_raw = cursor.read_u32(Endian::Little)?;

        let protocol_descriptor_offset = resolve_relative(data.len(), offset, protocol_rel);
        let type_descriptor_offset = if type_rel == 0 {
            None
        } else {
            resolve_relative(data.len(), offset + 4, type_rel)
        };

        Ok(ProtocolConformance {
            protocol_descriptor_offset,
            type_descriptor_offset,
            flags: ConformanceFlags::from_bits_truncate(flags_raw),
            has_witness_table_pattern: witness_table_rel != 0,
        })
    }
}

/// Walks `__swift5_proto`, an array of 32-bit relative offsets each
/// pointing at one conformance record.
pub fn parse_conformance_list(data: &[u8], section_file_offset: usize, section_len: usize, diagnostics: &mut Vec<Diagnostic>) -> Vec<ProtocolConformance> {
    let count = section_len / 4;
    let mut out = Vec::with_capacity(count);
    for i in 0..count {
        let entry_offset = section_file_offset + i * 4;
        let mut cursor = Cursor::at(data, entry_offset);
        let Ok(rel) = cursor.read_s32(Endian::Little) else {
            break;
        };
        match resolve_relative(data.len(), entry_offset, rel) {
            Some(target) => match ProtocolConformance::parse(data, target) {
                Ok(conf) => out.push(conf),
                Err(e) => diagnostics.push(Diagnostic::warning(format!("conformance #{i} skipped: {e}")).at(entry_offset)),
            },
            None => diagnostics.push(Diagnostic::warning(format!("conformance #{i} offset out of bounds")).at(entry_offset)),
        }
        let _ = RECORD_SIZE;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_conformance_with_witness_table() {
        let mut data = Vec::new();
        let offset = data.len();
        data.extend_from_slice(&8i32.to_le_bytes()); // protocol rel -> offset+8
        data.extend_from_slice(&0i32.to_le_bytes()); // type rel (none)
        data.extend_from_slice(&1i32.to_le_bytes()); // witness table rel (present)
        data.extend_from_slice(&ConformanceFlags::IS_RETROACTIVE.bits().to_le_bytes());
        data.extend_from_slice(&[0u8; 8]); // padding so protocol_rel resolves in-bounds

        let conf = ProtocolConformance::parse(&data, offset).unwrap();
        assert_eq!(conf.protocol_descriptor_offset, Some(offset + 8));
        assert_eq!(conf.type_descriptor_offset, None);
        assert!(conf.has_witness_table_pattern);
        assert!(conf.flags.contains(ConformanceFlags::IS_RETROACTIVE));
    }
}

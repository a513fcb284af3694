//! Swift protocol descriptors. Only partially modeled (§9 open question):
//! name and the two requirement-count fields are read, but individual
//! requirement records (associated types, witnesses) are not broken out.

use crate::cursor::{cstring_at, Cursor, Endian};
use crate::error::Result;
use crate::swift::symbolic_ref::resolve_relative;

#[derive(Debug, Clone)]
pub struct SwiftProtocolDescriptor {
    pub name: String,
    pub num_requirements: u32,
    pub num_requirements_in_signature: u32,
}

impl SwiftProtocolDescriptor {
    pub fn parse(data: &[u8], offset: usize) -> Result<SwiftProtocolDescriptor> {
        let mut cursor = Cursor::at(data, offset);
        let _flags = cursor.read_u32(Endian::Little)?;
        let _parent_rel = cursor.read_s32(Endian::Little)?;
        let name_rel = cursor.read_s32(Endian::Little)?;
        let num_requirements_in_signature = cursor.read_u32(Endian::Little)?;
        let num_requirements = cursor.read_u32(Endian::Little)?;
        let _associated_type_names_rel = cursor.read_s32(Endian::Little)?;

        let name_field_offset = offset + 8;
        let name = resolve_relative(data.len(), name_field_offset, name_rel)
            .and_then(|off| cstring_at(data, off).ok())
            .unwrap_or("<unresolved>")
            .to_string();

        Ok(SwiftProtocolDescriptor {
            name,
            num_requirements,
            num_requirements_in_signature,
        })
    }
}

/// Walks `__swift5_protos`, an array of 32-bit relative offsets each
/// pointing at a protocol descriptor.
pub fn parse_protocol_list(data: &[u8], section_file_offset: usize, section_len: usize) -> Vec<SwiftProtocolDescriptor> {
    let count = section_len / 4;
    let mut out = Vec::with_capacity(count);
    for i in 0..count {
        let entry_offset = section_file_offset + i * 4;
        let mut cursor = Cursor::at(data, entry_offset);
        let Ok(rel) = cursor.read_s32(Endian::Little) else {
            break;
        };
        if let Some(target) = resolve_relative(data.len(), entry_offset, rel) {
            if let Ok(desc) = SwiftProtocolDescriptor::parse(data, target) {
                out.push(desc);
            }
        }
    }
    out
}

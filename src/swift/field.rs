//! Field descriptors, read from `__swift5_fieldmd` entries (§4.G). Each
//! descriptor lists the stored fields of one type and is cross-referenced
//! against Objective-C ivars by class name when both exist for the same
//! type.

use crate::cursor::{cstring_at, Cursor, Endian};
use crate::error::{Diagnostic, Result};
use crate::swift::symbolic_ref::resolve_relative;

bitflags::bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct FieldRecordFlags: u16 {
        const IS_INDIRECT_CASE = 1 << 0;
        const IS_VAR           = 1 << 1;
        const IS_ARTIFICIAL    = 1 << 2;
    }
}

#[derive(Debug, Clone)]
pub struct FieldRecord {
    pub name: String,
    pub mangled_type_name: Option<String>,
    pub flags: FieldRecordFlags,
}

#[derive(Debug, Clone)]
pub struct FieldDescriptor {
    pub type_name: Option<String>,
    pub fields: Vec<FieldRecord>,
}

const RECORD_SIZE: usize = 12;

impl FieldDescriptor {
    /// Parses the descriptor header and its field record array starting at
    /// `offset`. A mangled type name that fails to resolve is recorded as a
    /// warning rather than aborting the whole descriptor (§4.F/.G: one bad
    /// record never aborts the whole file).
    pub fn parse(data: &[u8], offset: usize, diagnostics: &mut Vec<Diagnostic>) -> Result<FieldDescriptor> {
        let mut cursor = Cursor::at(data, offset);
        let _mangled_type_name_rel = cursor.read_s32(Endian::Little)?;
        let _superclass_rel = cursor.read_s32(Endian::Little)?;
        let _kind = cursor.read_u16(Endian::Little)?;
        let record_size = cursor.read_u16(Endian::Little)? as usize;
        let num_fields = cursor.read_u32(Endian::Little)? as usize;

        let type_name = match resolve_relative(data.len(), offset, _mangled_type_name_rel) {
            Some(off) => cstring_at(data, off).ok().map(str::to_string),
            None => None,
        };

        let entry_size = if record_size == 0 { RECORD_SIZE } else { record_size };
        let records_start = offset + 16;
        let mut fields = Vec::with_capacity(num_fields);
        for i in 0..num_fields {
            let record_offset = records_start + i * entry_size;
            match FieldRecord::parse(data, record_offset) {
                Ok(record) => fields.push(record),
                Err(e) => diagnostics.push(Diagnostic::warning(format!("field record #{i} skipped: {e}")).at(record_offset)),
            }
        }

        Ok(FieldDescriptor { type_name, fields })
    }
}

impl FieldRecord {
    fn parse(data: &[u8], offset: usize) -> Result<FieldRecord> {
        let mut cursor = Cursor::at(data, offset);
        let flags_raw = cursor.read_u32(Endian::Little)?;
        let type_name_rel = cursor.read_s32(Endian::Little)?;
        let name_rel = cursor.read_s32(Endian::Little)?;

        let flags = FieldRecordFlags::from_bits_truncate(flags_raw as u16);

        let name_field_offset = offset + 8;
        let name = resolve_relative(data.len(), name_field_offset, name_rel)
            .and_then(|off| cstring_at(data, off).ok())
            .unwrap_or("<unresolved>")
            .to_string();

        let type_field_offset = offset + 4;
        let mangled_type_name = resolve_relative(data.len(), type_field_offset, type_name_rel)
            .and_then(|off| cstring_at(data, off).ok())
            .map(str::to_string);

        Ok(FieldRecord {
            name,
            mangled_type_name,
            flags,
        })
    }
}

/// Walks `__swift5_fieldmd`, an array of field descriptors laid out
/// back-to-back (unlike `__swift5_types`, entries aren't relative offsets —
/// each descriptor directly follows the previous one's field records).
pub fn parse_field_section(data: &[u8], section_file_offset: usize, section_len: usize, diagnostics: &mut Vec<Diagnostic>) -> Vec<FieldDescriptor> {
    let mut out = Vec::new();
    let end = section_file_offset + section_len;
    let mut offset = section_file_offset;
    while offset + 16 <= end {
        match FieldDescriptor::parse(data, offset, diagnostics) {
            Ok(desc) => {
                let entry_size = {
                    let mut cursor = Cursor::at(data, offset + 8);
                    let record_size = cursor.read_u16(Endian::Little).unwrap_or(RECORD_SIZE as u16) as usize;
                    if record_size == 0 {
                        RECORD_SIZE
                    } else {
                        record_size
                    }
                };
                let advance = 16 + desc.fields.len() * entry_size;
                out.push(desc);
                offset += advance.max(16);
            }
            Err(e) => {
                diagnostics.push(Diagnostic::warning(format!("field descriptor at {offset:#x} skipped: {e}")).at(offset));
                break;
            }
        }
    }
    out
}

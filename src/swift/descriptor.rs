//! Swift type context descriptors, read from `__swift5_types` entries
//! (§4.G). Each section entry is a 32-bit signed offset relative to its
//! own file position, pointing at a `TargetTypeContextDescriptor`.

use crate::cursor::{cstring_at, Cursor, Endian};
use crate::error::{Diagnostic, Result};
use crate::swift::symbolic_ref::resolve_relative;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NominalKind {
    Class,
    Struct,
    Enum,
    Protocol,
    Other(u8),
}

impl NominalKind {
    fn from_flags(flags: u32) -> Option<NominalKind> {
        match flags & 0x1f {
            3 => Some(NominalKind::Protocol),
            16 => Some(NominalKind::Class),
            17 => Some(NominalKind::Struct),
            18 => Some(NominalKind::Enum),
            k @ 16..=31 => Some(NominalKind::Other(k as u8)),
            _ => None,
        }
    }
}

const FLAG_IS_GENERIC: u32 = 1 << 7;

#[derive(Debug, Clone)]
pub struct TypeContextDescriptor {
    pub kind: NominalKind,
    pub name: String,
    pub parent: Option<String>,
    pub is_generic: bool,
}

impl TypeContextDescriptor {
    /// Fully qualified name, `Module.Outer.Inner`, per §4.G's
    /// "reads that descriptor's name and parent chain" requirement.
    pub fn qualified_name(&self) -> String {
        match &self.parent {
            Some(p) if !p.is_empty() => format!("{p}.{}", self.name),
            _ => self.name.clone(),
        }
    }

    /// Parses the context descriptor found at `offset`. `depth` bounds
    /// parent-chain recursion against cyclic or pathological metadata.
    pub fn parse(data: &[u8], offset: usize, diagnostics: &mut Vec<Diagnostic>) -> Result<TypeContextDescriptor> {
        Self::parse_bounded(data, offset, diagnostics, 8)
    }

    fn parse_bounded(
        data: &[u8],
        offset: usize,
        diagnostics: &mut Vec<Diagnostic>,
        depth: u32,
    ) -> Result<TypeContextDescriptor> {
        let mut cursor = Cursor::at(data, offset);
        let flags = cursor.read_u32(Endian::Little)?;
        let parent_rel = cursor.read_s32(Endian::Little)?;
        let name_rel = cursor.read_s32(Endian::Little)?;

        let kind = NominalKind::from_flags(flags).unwrap_or(NominalKind::Other((flags & 0x1f) as u8));
        let is_generic = flags & FLAG_IS_GENERIC != 0;

        let name_field_offset = offset + 8;
        let name = match resolve_relative(data.len(), name_field_offset, name_rel) {
            Some(off) => cstring_at(data, off).map(str::to_string).unwrap_or_else(|_| {
                diagnostics.push(Diagnostic::warning("type descriptor name is not valid UTF-8").at(offset));
                "<invalid-name>".to_string()
            }),
            None => {
                diagnostics.push(Diagnostic::warning("type descriptor name offset out of bounds").at(offset));
                "<unresolved>".to_string()
            }
        };

        let parent_field_offset = offset + 4;
        let parent = if parent_rel == 0 || depth == 0 {
            None
        } else {
            resolve_relative(data.len(), parent_field_offset, parent_rel)
                .and_then(|off| Self::parse_bounded(data, off, diagnostics, depth - 1).ok())
                .map(|d| d.qualified_name())
        };

        Ok(TypeContextDescriptor {
            kind,
            name,
            parent,
            is_generic,
        })
    }
}

/// Walks `__swift5_types` (an array of 32-bit relative offsets) into fully
/// parsed descriptors, skipping entries that fail to resolve.
pub fn parse_type_list(data: &[u8], section_file_offset: usize, section_len: usize, diagnostics: &mut Vec<Diagnostic>) -> Vec<TypeContextDescriptor> {
    let count = section_len / 4;
    let mut out = Vec::with_capacity(count);
    for i in 0..count {
        let entry_offset = section_file_offset + i * 4;
        let mut cursor = Cursor::at(data, entry_offset);
        let Ok(rel) = cursor.read_s32(Endian::Little) else {
            break;
        };
        match resolve_relative(data.len(), entry_offset, rel) {
            Some(target) => match TypeContextDescriptor::parse(data, target, diagnostics) {
                Ok(desc) => out.push(desc),
                Err(e) => diagnostics.push(Diagnostic::warning(format!("type descriptor #{i} skipped: {e}")).at(entry_offset)),
            },
            None => diagnostics.push(Diagnostic::warning(format!("type descriptor #{i} offset out of bounds")).at(entry_offset)),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn push_descriptor(data: &mut Vec<u8>, flags: u32, name: &str) -> usize {
        let offset = data.len();
        data.extend_from_slice(&flags.to_le_bytes());
        data.extend_from_slice(&0i32.to_le_bytes()); // parent
        let name_field_offset = data.len();
        data.extend_from_slice(&[0u8; 4]); // name rel, patched below
        let name_offset = data.len();
        data.extend_from_slice(name.as_bytes());
        data.push(0);
        let rel = name_offset as i32 - name_field_offset as i32;
        data[name_field_offset..name_field_offset + 4].copy_from_slice(&rel.to_le_bytes());
        offset
    }

    #[test]
    fn parses_struct_descriptor_name() {
        let mut data = Vec::new();
        let offset = push_descriptor(&mut data, 17, "Point");
        let mut diags = Vec::new();
        let desc = TypeContextDescriptor::parse(&data, offset, &mut diags).unwrap();
        assert_eq!(desc.kind, NominalKind::Struct);
        assert_eq!(desc.name, "Point");
        assert!(diags.is_empty());
    }

    #[test]
    fn qualified_name_includes_parent() {
        let mut data = Vec::new();
        let offset = push_descriptor(&mut data, 17, "Inner");
        let mut diags = Vec::new();
        let mut desc = TypeContextDescriptor::parse(&data, offset, &mut diags).unwrap();
        desc.parent = Some("Outer".to_string());
        assert_eq!(desc.qualified_name(), "Outer.Inner");
    }
}

//! Objective-C instance-variable lists (`ivar_list_t`/`ivar_t`).

use crate::cursor::{cstring_at, Cursor, Endian};
use crate::error::{Diagnostic, Result};
use crate::pointer::PointerResolver;

#[derive(Debug, Clone)]
pub struct IVar {
    pub name: String,
    pub type_encoding: String,
    pub offset: u32,
    pub alignment: u32,
    pub size: u32,
}

#[derive(Debug, Clone)]
pub struct IVarList {
    pub ivars: Vec<IVar>,
}

const ENTRY_SIZE: usize = 32;

impl IVarList {
    pub fn parse(
        data: &[u8],
        offset: usize,
        resolver: &PointerResolver,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Result<IVarList> {
        let mut cursor = Cursor::at(data, offset);
        let _entsize = cursor.read_u32(Endian::Little)?;
        let count = cursor.read_u32(Endian::Little)?;

        let mut ivars = Vec::with_capacity(count as usize);
        let mut entry_off = offset + 8;
        for i in 0..count {
            match Self::parse_one(data, entry_off, resolver) {
                Ok(iv) => ivars.push(iv),
                Err(e) => diagnostics.push(Diagnostic::warning(format!("ivar #{i} skipped: {e}")).at(entry_off)),
            }
            entry_off += ENTRY_SIZE;
        }
        Ok(IVarList { ivars })
    }

    fn parse_one(data: &[u8], offset: usize, resolver: &PointerResolver) -> Result<IVar> {
        let mut cursor = Cursor::at(data, offset);
        let offset_ptr = cursor.read_u64(Endian::Little)?;
        let name_raw = cursor.read_u64(Endian::Little)?;
        let type_raw = cursor.read_u64(Endian::Little)?;
        let alignment = cursor.read_u32(Endian::Little)?;
        let size = cursor.read_u32(Endian::Little)?;

        // `ivar_t.offset` is itself a pointer to a 32-bit slot holding the
        // runtime-computed field offset, not the offset value directly.
        let ivar_offset = resolver
            .resolve_local(offset_ptr)
            .and_then(|off| {
                let mut c = Cursor::at(data, off);
                c.read_u32(Endian::Little).ok()
            })
            .unwrap_or(0);

        let name = resolver
            .resolve_local(name_raw)
            .and_then(|off| cstring_at(data, off).ok())
            .map(str::to_string)
            .unwrap_or_else(|| "<unresolved-ivar-name>".to_string());
        let type_encoding = resolver
            .resolve_local(type_raw)
            .and_then(|off| cstring_at(data, off).ok())
            .map(str::to_string)
            .unwrap_or_default();

        Ok(IVar {
            name,
            type_encoding,
            offset: ivar_offset,
            alignment,
            size,
        })
    }
}

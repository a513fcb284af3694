//! Symbol table (§4.C: "parsed lazily: on first query...").

use crate::cursor::{Cursor, Endian};
use crate::error::Result;
use crate::macho::consts::*;

#[derive(Debug, Clone)]
pub struct Symbol {
    pub name: String,
    pub n_type: u8,
    pub n_sect: u8,
    pub n_desc: u16,
    pub value: u64,
}

impl Symbol {
    pub fn is_external(&self) -> bool {
        self.n_type & N_EXT != 0
    }

    pub fn is_undefined(&self) -> bool {
        self.n_type & N_TYPE == N_UNDF
    }

    pub fn is_stab(&self) -> bool {
        self.n_type & N_STAB != 0
    }
}

/// Lazily parses `nsyms` `nlist[_64]` records the first time the table is
/// queried, per the component's contract ("parsed lazily: on first query").
pub struct SymbolTable<'data> {
    data: &'data [u8],
    symoff: usize,
    nsyms: usize,
    stroff: usize,
    strsize: usize,
    endian: Endian,
    is_64: bool,
    cache: once_cell::sync::OnceCell<Vec<Symbol>>,
}

impl<'data> SymbolTable<'data> {
    pub fn new(
        data: &'data [u8],
        symoff: u32,
        nsyms: u32,
        stroff: u32,
        strsize: u32,
        endian: Endian,
        is_64: bool,
    ) -> Self {
        SymbolTable {
            data,
            symoff: symoff as usize,
            nsyms: nsyms as usize,
            stroff: stroff as usize,
            strsize: strsize as usize,
            endian,
            is_64,
            cache: once_cell::sync::OnceCell::new(),
        }
    }

    pub fn empty(data: &'data [u8], endian: Endian, is_64: bool) -> Self {
        SymbolTable::new(data, 0, 0, 0, 0, endian, is_64)
    }

    fn string_at(&self, offset: u32) -> String {
        let base = self.stroff;
        let end = base + self.strsize;
        if base + offset as usize >= end || base + (offset as usize) >= self.data.len() {
            return String::new();
        }
        let start = base + offset as usize;
        let rest = &self.data[start..end.min(self.data.len())];
        let nul = rest.iter().position(|&b| b == 0).unwrap_or(rest.len());
        String::from_utf8_lossy(&rest[..nul]).into_owned()
    }

    fn parse(&self) -> Vec<Symbol> {
        let entry_size = if self.is_64 { 16 } else { 12 };
        let mut out = Vec::with_capacity(self.nsyms);
        let mut offset = self.symoff;
        for _ in 0..self.nsyms {
            if offset + entry_size > self.data.len() {
                break;
            }
            let mut cursor = Cursor::at(self.data, offset);
            let sym = (|| -> Result<Symbol> {
                let n_strx = cursor.read_u32(self.endian)?;
                let n_type = cursor.read_u8()?;
                let n_sect = cursor.read_u8()?;
                let n_desc = cursor.read_u16(self.endian)?;
                let value = if self.is_64 {
                    cursor.read_u64(self.endian)?
                } else {
                    cursor.read_u32(self.endian)? as u64
                };
                Ok(Symbol {
                    name: self.string_at(n_strx),
                    n_type,
                    n_sect,
                    n_desc,
                    value,
                })
            })();
            if let Ok(sym) = sym {
                out.push(sym);
            }
            offset += entry_size;
        }
        out
    }

    pub fn symbols(&self) -> &[Symbol] {
        self.cache.get_or_init(|| self.parse())
    }

    pub fn by_name(&self, name: &str) -> Option<&Symbol> {
        self.symbols().iter().find(|s| s.name == name)
    }
}

impl<'data> std::fmt::Debug for SymbolTable<'data> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SymbolTable")
            .field("nsyms", &self.nsyms)
            .finish()
    }
}

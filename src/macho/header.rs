//! Component C: Mach-O file reader.
//!
//! Parses the 28/32-byte header, iterates load commands by their own
//! declared size, and exposes segments, sections, symbols, UUID, build
//! version, and dylib identity. Grounded on the teacher's `MachOFile` /
//! `MachHeader` split in `read/macho/file.rs`, collapsed from a
//! header-type-parameterized design to a plain struct that branches on
//! `is_64` at parse time, since the spec calls for that dispatch to be
//! explicit rather than encoded in the type system.

use crate::cursor::{Cursor, Endian};
use crate::error::{Error, Result};
use crate::macho::consts::*;
use crate::macho::load_command::{BuildVersionCommand, DylibCommand, LoadCommand, LoadCommandIterator};
use crate::macho::segment::{Section, Segment};
use crate::macho::symtab::SymbolTable;

#[derive(Debug)]
pub struct MachOFile<'data> {
    pub data: &'data [u8],
    pub is_64: bool,
    pub endian: Endian,
    pub cpu_type: u32,
    pub cpu_subtype: u32,
    pub file_type: u32,
    pub flags: u32,
    pub segments: Vec<Segment>,
    pub uuid: Option<[u8; 16]>,
    pub build_version: Option<BuildVersionCommand>,
    pub dylib_id: Option<DylibCommand>,
    pub dylibs: Vec<DylibCommand>,
    pub chained_fixups_range: Option<(usize, usize)>,
    pub warnings: Vec<String>,
    pub symbols: SymbolTable<'data>,
}

impl<'data> MachOFile<'data> {
    pub fn pointer_width(&self) -> u8 {
        if self.is_64 {
            8
        } else {
            4
        }
    }

    pub fn parse(data: &'data [u8]) -> Result<Self> {
        let mut cursor = Cursor::new(data);
        let magic = cursor.read_u32(Endian::Big)?;
        let (is_64, endian) = match magic {
            MH_MAGIC => (false, Endian::Big),
            MH_CIGAM => (false, Endian::Little),
            MH_MAGIC_64 => (true, Endian::Big),
            MH_CIGAM_64 => (true, Endian::Little),
            _ => return Err(Error::InvalidMagic),
        };

        cursor.seek(4);
        let cpu_type = cursor.read_u32(endian)?;
        let cpu_subtype = cursor.read_u32(endian)?;
        let file_type = cursor.read_u32(endian)?;
        let ncmds = cursor.read_u32(endian)?;
        let sizeofcmds = cursor.read_u32(endian)?;
        let flags = cursor.read_u32(endian)?;
        if is_64 {
            let _reserved = cursor.read_u32(endian)?;
        }
        let header_size = if is_64 { 32 } else { 28 };

        let commands_data = data
            .get(header_size..)
            .and_then(|rest| rest.get(..sizeofcmds as usize))
            .ok_or(Error::TruncatedFile {
                offset: header_size,
                len: sizeofcmds as usize,
                size: data.len(),
            })?;

        let mut segments = Vec::new();
        let mut uuid = None;
        let mut build_version = None;
        let mut dylib_id = None;
        let mut dylibs = Vec::new();
        let mut chained_fixups_range = None;
        let mut warnings = Vec::new();
        let mut symoff = 0u32;
        let mut nsyms = 0u32;
        let mut stroff = 0u32;
        let mut strsize = 0u32;

        let mut iter = LoadCommandIterator::new(commands_data, endian, is_64, ncmds);
        loop {
            match iter.next() {
                Ok(Some(cmd)) => match cmd {
                    LoadCommand::Segment(seg) => segments.push(seg),
                    LoadCommand::Symtab(s) => {
                        symoff = s.symoff;
                        nsyms = s.nsyms;
                        stroff = s.stroff;
                        strsize = s.strsize;
                    }
                    LoadCommand::Uuid(u) => uuid = Some(u),
                    LoadCommand::BuildVersion(bv) => build_version = Some(bv),
                    LoadCommand::Dylib(d) => {
                        if matches!(d.kind, crate::macho::load_command::DylibKind::Id) {
                            dylib_id = Some(d.clone());
                        }
                        dylibs.push(d);
                    }
                    LoadCommand::DyldChainedFixups(lc) => {
                        chained_fixups_range = Some((lc.dataoff as usize, lc.datasize as usize));
                    }
                    LoadCommand::Other {
                        cmd,
                        must_understand,
                        ..
                    } => {
                        if must_understand {
                            warnings.push(format!(
                                "unknown load command {cmd:#x} has the must-understand bit set"
                            ));
                        }
                    }
                    _ => {}
                },
                Ok(None) => break,
                Err(_) => {
                    warnings.push("load command table truncated before ncmds was reached".into());
                    break;
                }
            }
        }

        let symbols = SymbolTable::new(data, symoff, nsyms, stroff, strsize, endian, is_64);

        Ok(MachOFile {
            data,
            is_64,
            endian,
            cpu_type,
            cpu_subtype,
            file_type,
            flags,
            segments,
            uuid,
            build_version,
            dylib_id,
            dylibs,
            chained_fixups_range,
            warnings,
            symbols,
        })
    }

    pub fn arch(&self) -> crate::arch::Arch {
        crate::arch::Arch::new(self.cpu_type, self.cpu_subtype)
    }

    pub fn section(&self, segname: &str, sectname: &str) -> Option<&Section> {
        self.segments
            .iter()
            .find(|s| s.name == segname)
            .and_then(|s| s.section(sectname))
    }

    /// Finds a section by name alone, searching all segments; used for the
    /// `__objc_*`/`__swift5_*` lookups which don't always sit in the same
    /// segment across toolchain versions.
    pub fn section_by_name(&self, sectname: &str) -> Option<&Section> {
        self.segments.iter().flat_map(|s| &s.sections).find(|s| s.sectname == sectname)
    }

    pub fn chained_fixups_bytes(&self) -> Option<&'data [u8]> {
        let (off, len) = self.chained_fixups_range?;
        self.data.get(off..off + len)
    }
}

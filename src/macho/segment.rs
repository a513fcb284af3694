//! Segment and section records (§3: "Segments own their sections").
//!
//! Field layout mirrors the teacher's `read/macho/segment.rs`, dispatching
//! on pointer width instead of carrying a `Mach` type parameter.

use crate::cursor::{Cursor, Endian};
use crate::error::{Error, Result};

#[derive(Debug, Clone)]
pub struct Segment {
    pub name: String,
    pub vmaddr: u64,
    pub vmsize: u64,
    pub fileoff: u64,
    pub filesize: u64,
    pub maxprot: i32,
    pub initprot: i32,
    pub flags: u32,
    pub sections: Vec<Section>,
}

#[derive(Debug, Clone)]
pub struct Section {
    pub sectname: String,
    pub segname: String,
    pub addr: u64,
    pub size: u64,
    pub offset: u32,
    pub align: u32,
    pub reloff: u32,
    pub nreloc: u32,
    pub flags: u32,
    pub reserved1: u32,
    pub reserved2: u32,
    pub reserved3: u32,
}

impl Section {
    /// Section contents, or an empty slice for a zero-filled (BSS-like)
    /// section, per §4.C ("overlaps file-size zero... yields zero bytes").
    pub fn data<'d>(&self, file_data: &'d [u8]) -> Result<&'d [u8]> {
        if self.size == 0 {
            return Ok(&[]);
        }
        let start = self.offset as usize;
        let end = start
            .checked_add(self.size as usize)
            .ok_or(Error::TruncatedFile {
                offset: start,
                len: self.size as usize,
                size: file_data.len(),
            })?;
        file_data
            .get(start..end)
            .ok_or(Error::TruncatedFile {
                offset: start,
                len: self.size as usize,
                size: file_data.len(),
            })
    }
}

fn read_fixed_name(cursor: &mut Cursor) -> Result<String> {
    let raw = cursor.read_bytes(16)?;
    let end = raw.iter().position(|&b| b == 0).unwrap_or(16);
    Ok(String::from_utf8_lossy(&raw[..end]).into_owned())
}

impl Segment {
    pub fn parse32(cursor: &mut Cursor, endian: Endian) -> Result<(Segment, u32)> {
        let name = read_fixed_name(cursor)?;
        let vmaddr = cursor.read_u32(endian)? as u64;
        let vmsize = cursor.read_u32(endian)? as u64;
        let fileoff = cursor.read_u32(endian)? as u64;
        let filesize = cursor.read_u32(endian)? as u64;
        let maxprot = cursor.read_s32(endian)?;
        let initprot = cursor.read_s32(endian)?;
        let nsects = cursor.read_u32(endian)?;
        let flags = cursor.read_u32(endian)?;
        let mut sections = Vec::with_capacity(nsects as usize);
        for _ in 0..nsects {
            sections.push(Section::parse32(cursor, endian)?);
        }
        Ok((
            Segment {
                name,
                vmaddr,
                vmsize,
                fileoff,
                filesize,
                maxprot,
                initprot,
                flags,
                sections,
            },
            nsects,
        ))
    }

    pub fn parse64(cursor: &mut Cursor, endian: Endian) -> Result<(Segment, u32)> {
        let name = read_fixed_name(cursor)?;
        let vmaddr = cursor.read_u64(endian)?;
        let vmsize = cursor.read_u64(endian)?;
        let fileoff = cursor.read_u64(endian)?;
        let filesize = cursor.read_u64(endian)?;
        let maxprot = cursor.read_s32(endian)?;
        let initprot = cursor.read_s32(endian)?;
        let nsects = cursor.read_u32(endian)?;
        let flags = cursor.read_u32(endian)?;
        let mut sections = Vec::with_capacity(nsects as usize);
        for _ in 0..nsects {
            sections.push(Section::parse64(cursor, endian)?);
        }
        Ok((
            Segment {
                name,
                vmaddr,
                vmsize,
                fileoff,
                filesize,
                maxprot,
                initprot,
                flags,
                sections,
            },
            nsects,
        ))
    }

    pub fn section(&self, name: &str) -> Option<&Section> {
        self.sections.iter().find(|s| s.sectname == name)
    }
}

impl Section {
    fn parse32(cursor: &mut Cursor, endian: Endian) -> Result<Section> {
        let sectname = read_fixed_name(cursor)?;
        let segname = read_fixed_name(cursor)?;
        let addr = cursor.read_u32(endian)? as u64;
        let size = cursor.read_u32(endian)? as u64;
        let offset = cursor.read_u32(endian)?;
        let align = cursor.read_u32(endian)?;
        let reloff = cursor.read_u32(endian)?;
        let nreloc = cursor.read_u32(endian)?;
        let flags = cursor.read_u32(endian)?;
        let reserved1 = cursor.read_u32(endian)?;
        let reserved2 = cursor.read_u32(endian)?;
        Ok(Section {
            sectname,
            segname,
            addr,
            size,
            offset,
            align,
            reloff,
            nreloc,
            flags,
            reserved1,
            reserved2,
            reserved3: 0,
        })
    }

    fn parse64(cursor: &mut Cursor, endian: Endian) -> Result<Section> {
        let sectname = read_fixed_name(cursor)?;
        let segname = read_fixed_name(cursor)?;
        let addr = cursor.read_u64(endian)?;
        let size = cursor.read_u64(endian)?;
        let offset = cursor.read_u32(endian)?;
        let align = cursor.read_u32(endian)?;
        let reloff = cursor.read_u32(endian)?;
        let nreloc = cursor.read_u32(endian)?;
        let flags = cursor.read_u32(endian)?;
        let reserved1 = cursor.read_u32(endian)?;
        let reserved2 = cursor.read_u32(endian)?;
        let reserved3 = cursor.read_u32(endian)?;
        Ok(Section {
            sectname,
            segname,
            addr,
            size,
            offset,
            align,
            reloff,
            nreloc,
            flags,
            reserved1,
            reserved2,
            reserved3,
        })
    }
}

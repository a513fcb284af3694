//! Load-command iteration (§3, §4.C).
//!
//! Grounded on the teacher's `MachOLoadCommandIterator` (`read/macho.rs`):
//! a non-restartable iterator carrying a cursor, consuming each command by
//! its own declared size rather than a fixed struct size (§9: "coroutine
//! style lazy lists... become explicit iterator state machines").

use crate::cursor::{Cursor, Endian};
use crate::error::{Error, Result};
use crate::macho::consts::*;
use crate::macho::segment::Segment;

#[derive(Debug, Clone)]
pub enum DylibKind {
    Load,
    Weak,
    Id,
    Reexport,
    Upward,
}

#[derive(Debug, Clone)]
pub struct DylibCommand {
    pub kind: DylibKind,
    pub name: String,
    pub timestamp: u32,
    pub current_version: u32,
    pub compatibility_version: u32,
}

#[derive(Debug, Clone)]
pub struct SymtabCommand {
    pub symoff: u32,
    pub nsyms: u32,
    pub stroff: u32,
    pub strsize: u32,
}

#[derive(Debug, Clone)]
pub struct DysymtabCommand {
    pub ilocalsym: u32,
    pub nlocalsym: u32,
    pub iextdefsym: u32,
    pub nextdefsym: u32,
    pub iundefsym: u32,
    pub nundefsym: u32,
}

#[derive(Debug, Clone)]
pub struct BuildVersionCommand {
    pub platform: u32,
    pub minos: u32,
    pub sdk: u32,
    pub ntools: u32,
}

#[derive(Debug, Clone)]
pub struct LinkeditDataCommand {
    pub dataoff: u32,
    pub datasize: u32,
}

#[derive(Debug, Clone)]
pub struct EncryptionInfoCommand {
    pub cryptoff: u32,
    pub cryptsize: u32,
    pub cryptid: u32,
}

/// A decoded load command. `must_understand` is the top bit of the command
/// id (`LC_REQ_DYLD`), recorded on every variant per §3.
#[derive(Debug, Clone)]
pub enum LoadCommand<'data> {
    Segment(Segment),
    Symtab(SymtabCommand),
    Dysymtab(DysymtabCommand),
    Uuid([u8; 16]),
    BuildVersion(BuildVersionCommand),
    Dylib(DylibCommand),
    Main { entryoff: u64, stacksize: u64 },
    SourceVersion(u64),
    EncryptionInfo(EncryptionInfoCommand),
    DyldChainedFixups(LinkeditDataCommand),
    DyldExportsTrie(LinkeditDataCommand),
    Other {
        cmd: u32,
        cmdsize: u32,
        must_understand: bool,
        payload: &'data [u8],
    },
}

impl<'data> LoadCommand<'data> {
    pub fn must_understand(&self) -> bool {
        match self {
            LoadCommand::Other { must_understand, .. } => *must_understand,
            LoadCommand::Dylib(d) => matches!(
                d.kind,
                DylibKind::Weak | DylibKind::Reexport | DylibKind::Upward
            ),
            LoadCommand::Main { .. } | LoadCommand::DyldChainedFixups(_) | LoadCommand::DyldExportsTrie(_) => true,
            _ => false,
        }
    }
}

pub struct LoadCommandIterator<'data> {
    endian: Endian,
    is_64: bool,
    cursor: Cursor<'data>,
    remaining: u32,
    index: u32,
}

impl<'data> LoadCommandIterator<'data> {
    pub fn new(data: &'data [u8], endian: Endian, is_64: bool, ncmds: u32) -> Self {
        LoadCommandIterator {
            endian,
            is_64,
            cursor: Cursor::new(data),
            remaining: ncmds,
            index: 0,
        }
    }

    pub fn next(&mut self) -> Result<Option<LoadCommand<'data>>> {
        if self.remaining == 0 {
            return Ok(None);
        }
        let start = self.cursor.offset();
        let cmd_start_data = self.cursor.data();
        let cmd = self.cursor.read_u32(self.endian)?;
        let cmdsize = self.cursor.read_u32(self.endian)?;

        if cmdsize < 8 {
            return Err(Error::MalformedLoadCommand {
                index: self.index,
                offset: start,
                reason: "cmdsize smaller than the command header",
            });
        }
        if cmdsize as usize % if self.is_64 { 8 } else { 4 } != 0 {
            return Err(Error::MalformedLoadCommand {
                index: self.index,
                offset: start,
                reason: "cmdsize is not pointer-aligned",
            });
        }
        let remaining_budget = cmd_start_data.len().saturating_sub(start);
        if cmdsize as usize > remaining_budget {
            return Err(Error::MalformedLoadCommand {
                index: self.index,
                offset: start,
                reason: "cmdsize exceeds remaining sizeofcmds budget",
            });
        }

        let body_len = cmdsize as usize - 8;
        let body = self.cursor.read_bytes(body_len)?;
        let mut body_cursor = Cursor::new(body);

        let must_understand = cmd & LC_REQ_DYLD != 0;
        let plain_cmd = cmd & !LC_REQ_DYLD;

        // A few command ids are only ever defined with `LC_REQ_DYLD` baked
        // into the constant (it's part of their identity, not an optional
        // flag some producer set); strip it here too so they compare equal
        // to `plain_cmd` instead of always falling through to `Other`.
        const LOAD_WEAK_DYLIB: u32 = LC_LOAD_WEAK_DYLIB & !LC_REQ_DYLD;
        const REEXPORT_DYLIB: u32 = LC_REEXPORT_DYLIB & !LC_REQ_DYLD;
        const LOAD_UPWARD_DYLIB: u32 = LC_LOAD_UPWARD_DYLIB & !LC_REQ_DYLD;
        const MAIN: u32 = LC_MAIN & !LC_REQ_DYLD;
        const DYLD_CHAINED_FIXUPS: u32 = LC_DYLD_CHAINED_FIXUPS & !LC_REQ_DYLD;
        const DYLD_EXPORTS_TRIE: u32 = LC_DYLD_EXPORTS_TRIE & !LC_REQ_DYLD;

        let parsed = match plain_cmd {
            LC_SEGMENT => {
                let mut seg_cursor = Cursor::new(body);
                let (segment, _) = Segment::parse32(&mut seg_cursor, self.endian)?;
                LoadCommand::Segment(segment)
            }
            LC_SEGMENT_64 => {
                let mut seg_cursor = Cursor::new(body);
                let (segment, _) = Segment::parse64(&mut seg_cursor, self.endian)?;
                LoadCommand::Segment(segment)
            }
            LC_SYMTAB => LoadCommand::Symtab(SymtabCommand {
                symoff: body_cursor.read_u32(self.endian)?,
                nsyms: body_cursor.read_u32(self.endian)?,
                stroff: body_cursor.read_u32(self.endian)?,
                strsize: body_cursor.read_u32(self.endian)?,
            }),
            LC_DYSYMTAB => {
                let ilocalsym = body_cursor.read_u32(self.endian)?;
                let nlocalsym = body_cursor.read_u32(self.endian)?;
                let iextdefsym = body_cursor.read_u32(self.endian)?;
                let nextdefsym = body_cursor.read_u32(self.endian)?;
                let iundefsym = body_cursor.read_u32(self.endian)?;
                let nundefsym = body_cursor.read_u32(self.endian)?;
                LoadCommand::Dysymtab(DysymtabCommand {
                    ilocalsym,
                    nlocalsym,
                    iextdefsym,
                    nextdefsym,
                    iundefsym,
                    nundefsym,
                })
            }
            LC_UUID => {
                let bytes = body_cursor.read_bytes(16)?;
                let mut uuid = [0u8; 16];
                uuid.copy_from_slice(bytes);
                LoadCommand::Uuid(uuid)
            }
            LC_BUILD_VERSION => LoadCommand::BuildVersion(BuildVersionCommand {
                platform: body_cursor.read_u32(self.endian)?,
                minos: body_cursor.read_u32(self.endian)?,
                sdk: body_cursor.read_u32(self.endian)?,
                ntools: body_cursor.read_u32(self.endian)?,
            }),
            LC_LOAD_DYLIB | LC_ID_DYLIB | LOAD_WEAK_DYLIB | REEXPORT_DYLIB | LOAD_UPWARD_DYLIB => {
                let name_offset = body_cursor.read_u32(self.endian)?;
                let timestamp = body_cursor.read_u32(self.endian)?;
                let current_version = body_cursor.read_u32(self.endian)?;
                let compatibility_version = body_cursor.read_u32(self.endian)?;
                let name_rel = name_offset.checked_sub(8).unwrap_or(0) as usize;
                let name = body
                    .get(name_rel..)
                    .and_then(|s| s.iter().position(|&b| b == 0).map(|n| &s[..n]))
                    .map(|s| String::from_utf8_lossy(s).into_owned())
                    .unwrap_or_default();
                let kind = match plain_cmd {
                    LC_ID_DYLIB => DylibKind::Id,
                    LOAD_WEAK_DYLIB => DylibKind::Weak,
                    REEXPORT_DYLIB => DylibKind::Reexport,
                    LOAD_UPWARD_DYLIB => DylibKind::Upward,
                    _ => DylibKind::Load,
                };
                LoadCommand::Dylib(DylibCommand {
                    kind,
                    name,
                    timestamp,
                    current_version,
                    compatibility_version,
                })
            }
            MAIN => LoadCommand::Main {
                entryoff: body_cursor.read_u64(self.endian)?,
                stacksize: body_cursor.read_u64(self.endian)?,
            },
            LC_SOURCE_VERSION => LoadCommand::SourceVersion(body_cursor.read_u64(self.endian)?),
            LC_ENCRYPTION_INFO | LC_ENCRYPTION_INFO_64 => LoadCommand::EncryptionInfo(EncryptionInfoCommand {
                cryptoff: body_cursor.read_u32(self.endian)?,
                cryptsize: body_cursor.read_u32(self.endian)?,
                cryptid: body_cursor.read_u32(self.endian)?,
            }),
            DYLD_CHAINED_FIXUPS => LoadCommand::DyldChainedFixups(LinkeditDataCommand {
                dataoff: body_cursor.read_u32(self.endian)?,
                datasize: body_cursor.read_u32(self.endian)?,
            }),
            DYLD_EXPORTS_TRIE => LoadCommand::DyldExportsTrie(LinkeditDataCommand {
                dataoff: body_cursor.read_u32(self.endian)?,
                datasize: body_cursor.read_u32(self.endian)?,
            }),
            _ => LoadCommand::Other {
                cmd,
                cmdsize,
                must_understand,
                payload: body,
            },
        };

        self.remaining -= 1;
        self.index += 1;
        Ok(Some(parsed))
    }
}

impl<'data> Iterator for LoadCommandIterator<'data> {
    type Item = Result<LoadCommand<'data>>;

    fn next(&mut self) -> Option<Self::Item> {
        match LoadCommandIterator::next(self) {
            Ok(Some(cmd)) => Some(Ok(cmd)),
            Ok(None) => None,
            Err(e) => {
                self.remaining = 0;
                Some(Err(e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn push_u32(buf: &mut Vec<u8>, v: u32) {
        buf.extend_from_slice(&v.to_le_bytes());
    }

    /// `LC_DYLD_CHAINED_FIXUPS`'s constant already has `LC_REQ_DYLD` baked
    /// in, so it must still be recognized once that bit is stripped for
    /// comparison against `plain_cmd` — not fall through to `Other`.
    #[test]
    fn recognizes_dyld_chained_fixups_despite_req_dyld_bit() {
        let mut body = Vec::new();
        push_u32(&mut body, 100); // dataoff
        push_u32(&mut body, 200); // datasize

        let mut data = Vec::new();
        push_u32(&mut data, LC_DYLD_CHAINED_FIXUPS);
        push_u32(&mut data, 8 + body.len() as u32);
        data.extend_from_slice(&body);

        let mut iter = LoadCommandIterator::new(&data, Endian::Little, true, 1);
        match iter.next().unwrap().unwrap() {
            LoadCommand::DyldChainedFixups(lc) => {
                assert_eq!(lc.dataoff, 100);
                assert_eq!(lc.datasize, 200);
            }
            other => panic!("expected DyldChainedFixups, got {other:?}"),
        }
    }

    #[test]
    fn recognizes_weak_dylib_despite_req_dyld_bit() {
        let mut body = Vec::new();
        push_u32(&mut body, 24); // name offset (right after the 24-byte header)
        push_u32(&mut body, 0); // timestamp
        push_u32(&mut body, 0); // current_version
        push_u32(&mut body, 0); // compatibility_version
        body.extend_from_slice(b"libFoo.dylib\0");
        while body.len() % 8 != 0 {
            body.push(0);
        }

        let mut data = Vec::new();
        push_u32(&mut data, LC_LOAD_WEAK_DYLIB);
        push_u32(&mut data, 8 + body.len() as u32);
        data.extend_from_slice(&body);

        let mut iter = LoadCommandIterator::new(&data, Endian::Little, true, 1);
        match iter.next().unwrap().unwrap() {
            LoadCommand::Dylib(d) => {
                assert!(matches!(d.kind, DylibKind::Weak));
                assert_eq!(d.name, "libFoo.dylib");
            }
            other => panic!("expected Dylib, got {other:?}"),
        }
    }
}

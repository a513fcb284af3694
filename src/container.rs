//! Component B: container reader — detects thin/fat magic, enumerates
//! architecture slices, and selects the best match for a requested
//! architecture (§4.B).

use crate::arch::Arch;
use crate::cursor::{Cursor, Endian};
use crate::error::{Error, Result};
use crate::macho::consts::*;

#[derive(Debug, Clone, Copy)]
pub struct FatArch {
    pub arch: Arch,
    pub offset: u32,
    pub size: u32,
    pub align: u32,
}

/// The result of sniffing a byte buffer: either a single thin slice
/// spanning the whole buffer, or an ordered list of fat sub-architectures.
#[derive(Debug)]
pub enum Container<'data> {
    Thin(&'data [u8]),
    Fat {
        data: &'data [u8],
        arches: Vec<FatArch>,
    },
}

impl<'data> Container<'data> {
    pub fn parse(data: &'data [u8]) -> Result<Self> {
        if data.len() < 4 {
            return Err(Error::InvalidMagic);
        }
        let mut cursor = Cursor::new(data);
        let magic = cursor.read_u32(Endian::Big)?;
        match magic {
            MH_MAGIC | MH_CIGAM | MH_MAGIC_64 | MH_CIGAM_64 => Ok(Container::Thin(data)),
            FAT_MAGIC | FAT_CIGAM => Self::parse_fat(data, false),
            FAT_MAGIC_64 | FAT_CIGAM_64 => Self::parse_fat(data, true),
            _ => Err(Error::InvalidMagic),
        }
    }

    /// Fat headers are always big-endian on disk regardless of host or
    /// slice endianness (§4.B).
    fn parse_fat(data: &'data [u8], wide: bool) -> Result<Self> {
        let mut cursor = Cursor::at(data, 4);
        let nfat_arch = cursor.read_u32(Endian::Big)?;
        let mut arches = Vec::with_capacity(nfat_arch as usize);
        for _ in 0..nfat_arch {
            let cpu_type = cursor.read_u32(Endian::Big)?;
            let cpu_subtype = cursor.read_u32(Endian::Big)?;
            let (offset, size, align) = if wide {
                let offset = cursor.read_u64(Endian::Big)?;
                let size = cursor.read_u64(Endian::Big)?;
                let align = cursor.read_u32(Endian::Big)?;
                let _reserved = cursor.read_u32(Endian::Big)?;
                (offset as u32, size as u32, align)
            } else {
                let offset = cursor.read_u32(Endian::Big)?;
                let size = cursor.read_u32(Endian::Big)?;
                let align = cursor.read_u32(Endian::Big)?;
                (offset, size, align)
            };
            arches.push(FatArch {
                arch: Arch::new(cpu_type, cpu_subtype),
                offset,
                size,
                align,
            });
        }
        Ok(Container::Fat { data, arches })
    }

    /// Every architecture slice available in this container, as
    /// `(Arch, byte_range)` pairs.
    pub fn slices(&self) -> Result<Vec<(Arch, &'data [u8])>> {
        match self {
            Container::Thin(data) => {
                let header = crate::macho::MachOFile::parse(data)?;
                Ok(vec![(header.arch(), data)])
            }
            Container::Fat { data, arches } => {
                let mut out = Vec::with_capacity(arches.len());
                for fa in arches {
                    let start = fa.offset as usize;
                    let end = start + fa.size as usize;
                    let slice = data.get(start..end).ok_or(Error::TruncatedFile {
                        offset: start,
                        len: fa.size as usize,
                        size: data.len(),
                    })?;
                    out.push((fa.arch, slice));
                }
                Ok(out)
            }
        }
    }

    /// Architecture names for `--list-arches` (§6, S2), in declared order.
    pub fn arch_names(&self) -> Vec<&'static str> {
        match self {
            Container::Thin(data) => crate::macho::MachOFile::parse(data)
                .map(|f| vec![f.arch().name()])
                .unwrap_or_default(),
            Container::Fat { arches, .. } => arches.iter().map(|fa| fa.arch.name()).collect(),
        }
    }

    /// "Best match" selection per §4.B:
    /// 1. exact match on masked `(cputype, cpusubtype)`,
    /// 2. else, if the request is 64-bit ABI, any slice with the family's
    ///    64-bit bit set,
    /// 3. else, any slice in the same CPU family,
    /// 4. else `ArchitectureNotFound`.
    pub fn best_match(&self, requested: Arch) -> Result<&'data [u8]> {
        let slices = self.slices()?;

        if let Some((_, data)) = slices.iter().find(|(a, _)| a.masked() == requested.masked()) {
            return Ok(data);
        }

        if requested.uses_64bit_abi() {
            if let Some((_, data)) = slices
                .iter()
                .find(|(a, _)| a.family() == requested.family() && a.uses_64bit_abi())
            {
                return Ok(data);
            }
        }

        if let Some((_, data)) = slices.iter().find(|(a, _)| a.family() == requested.family()) {
            return Ok(data);
        }

        Err(Error::ArchitectureNotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fat_header(arches: &[(u32, u32, u32, u32)]) -> Vec<u8> {
        let mut buf = Vec::new();
        buf.extend_from_slice(&FAT_MAGIC.to_be_bytes());
        buf.extend_from_slice(&(arches.len() as u32).to_be_bytes());
        for (cpu_type, cpu_subtype, offset, size) in arches {
            buf.extend_from_slice(&cpu_type.to_be_bytes());
            buf.extend_from_slice(&cpu_subtype.to_be_bytes());
            buf.extend_from_slice(&offset.to_be_bytes());
            buf.extend_from_slice(&size.to_be_bytes());
            buf.extend_from_slice(&0u32.to_be_bytes()); // align
        }
        buf
    }

    #[test]
    fn detects_fat_magic() {
        let data = fat_header(&[(CPU_TYPE_ARM, CPU_SUBTYPE_ARM_V7, 0, 0)]);
        let container = Container::parse(&data).unwrap();
        assert!(matches!(container, Container::Fat { .. }));
        assert_eq!(container.arch_names(), vec!["armv7"]);
    }

    #[test]
    fn best_match_prefers_exact() {
        let header_len = 8 + 2 * 20;
        let mut data = fat_header(&[
            (CPU_TYPE_ARM, CPU_SUBTYPE_ARM_V7, header_len as u32, 4),
            (CPU_TYPE_ARM, CPU_SUBTYPE_ARM_V7S, header_len as u32 + 4, 4),
        ]);
        data.extend_from_slice(b"7777");
        data.extend_from_slice(b"7s7s");

        let container = Container::parse(&data).unwrap();
        let requested = Arch::new(CPU_TYPE_ARM, CPU_SUBTYPE_ARM_V7S);
        let slice = container.best_match(requested).unwrap();
        assert_eq!(slice, b"7s7s");
    }

    #[test]
    fn no_match_returns_architecture_not_found() {
        let data = fat_header(&[(CPU_TYPE_ARM, CPU_SUBTYPE_ARM_V7, 0, 0)]);
        let container = Container::parse(&data).unwrap();
        let requested = Arch::new(CPU_TYPE_X86_64, 0);
        match container.best_match(requested) {
            Err(Error::ArchitectureNotFound) => {}
            other => panic!("expected ArchitectureNotFound, got {other:?}"),
        }
    }
}

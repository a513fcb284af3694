//! Component D: chained-fixup resolver.
//!
//! Parses `LC_DYLD_CHAINED_FIXUPS` into an import table and decodes
//! individual on-file pointer words into either a rebase target or a
//! symbolic bind (§4.D). Grounded conceptually on the teacher's handling
//! of `DyldChainedFixups` as a pass-through `LinkeditDataCommand` (the
//! teacher only records the `(dataoff, datasize)` span; this component is
//! the spec-mandated decoder the teacher leaves to its caller).

use crate::address_map::strip_pac;
use crate::cursor::{Cursor, Endian};
use crate::error::{Error, Result};
use crate::macho::consts::*;

#[derive(Debug, Clone)]
pub struct Import {
    pub library_ordinal: i16,
    pub weak: bool,
    pub name: String,
}

#[derive(Debug, Clone)]
pub struct SegmentStart {
    pub page_size: u16,
    pub pointer_format: u16,
    pub segment_offset: u64,
    pub page_starts: Vec<u16>,
}

/// A decoded chained-fixup pointer word: either an internal rebase target
/// virtual address, or a symbolic external bind with an addend (§3).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodedPointer {
    Rebase { target_va: u64 },
    Bind { ordinal: u32, addend: i64 },
}

#[derive(Debug)]
pub struct ChainedFixups {
    pub imports: Vec<Import>,
    pub segment_starts: Vec<SegmentStart>,
}

const CHAINED_PTR_START_NONE: u16 = 0xffff;

impl ChainedFixups {
    pub fn parse(data: &[u8]) -> Result<ChainedFixups> {
        let endian = Endian::Little;
        let mut header = Cursor::new(data);
        let _fixups_version = header.read_u32(endian)?;
        let starts_offset = header.read_u32(endian)?;
        let imports_offset = header.read_u32(endian)?;
        let symbols_offset = header.read_u32(endian)?;
        let imports_count = header.read_u32(endian)?;
        let imports_format = header.read_u32(endian)?;
        let symbols_format = header.read_u32(endian)?;

        if symbols_format != DYLD_CHAINED_SYMBOL_UNCOMPRESSED {
            return Err(Error::UnsupportedFormat("compressed chained-fixup symbol pool"));
        }

        let symbols_pool = data.get(symbols_offset as usize..).unwrap_or(&[]);
        let imports = Self::parse_imports(data, imports_offset, imports_count, imports_format, symbols_pool)?;
        let segment_starts = Self::parse_starts(data, starts_offset)?;

        Ok(ChainedFixups {
            imports,
            segment_starts,
        })
    }

    fn parse_imports(
        data: &[u8],
        imports_offset: u32,
        imports_count: u32,
        imports_format: u32,
        symbols_pool: &[u8],
    ) -> Result<Vec<Import>> {
        let mut imports = Vec::with_capacity(imports_count as usize);
        let entry_size: usize = match imports_format {
            DYLD_CHAINED_IMPORT => 4,
            DYLD_CHAINED_IMPORT_ADDEND => 8,
            DYLD_CHAINED_IMPORT_ADDEND64 => 16,
            _ => return Err(Error::UnsupportedFormat("unknown chained-fixup imports_format")),
        };
        let base = imports_offset as usize;
        for i in 0..imports_count as usize {
            let offset = base + i * entry_size;
            let mut cursor = Cursor::at(data, offset);
            let (lib_ordinal, weak, name_offset) = match imports_format {
                DYLD_CHAINED_IMPORT => {
                    let packed = cursor.read_u32(Endian::Little)?;
                    (
                        (packed & 0xff) as i16,
                        (packed >> 8) & 0x1 != 0,
                        packed >> 9,
                    )
                }
                DYLD_CHAINED_IMPORT_ADDEND => {
                    let packed = cursor.read_u32(Endian::Little)?;
                    let _addend = cursor.read_s32(Endian::Little)?;
                    (
                        (packed & 0xff) as i16,
                        (packed >> 8) & 0x1 != 0,
                        packed >> 9,
                    )
                }
                DYLD_CHAINED_IMPORT_ADDEND64 => {
                    let packed = cursor.read_u64(Endian::Little)?;
                    let _addend = cursor.read_u64(Endian::Little)?;
                    (
                        (packed & 0xffff) as i16,
                        (packed >> 16) & 0x1 != 0,
                        (packed >> 17) as u32,
                    )
                }
                _ => unreachable!(),
            };
            let name = crate::cursor::cstring_at(symbols_pool, name_offset as usize)
                .map(|s| s.to_string())
                .unwrap_or_default();
            imports.push(Import {
                library_ordinal: lib_ordinal,
                weak,
                name,
            });
        }
        Ok(imports)
    }

    fn parse_starts(data: &[u8], starts_offset: u32) -> Result<Vec<SegmentStart>> {
        let mut cursor = Cursor::at(data, starts_offset as usize);
        let seg_count = cursor.read_u32(Endian::Little)?;
        let mut seg_info_offsets = Vec::with_capacity(seg_count as usize);
        for _ in 0..seg_count {
            seg_info_offsets.push(cursor.read_u32(Endian::Little)?);
        }
        let mut starts = Vec::new();
        for off in seg_info_offsets {
            if off == 0 {
                continue;
            }
            let seg_base = starts_offset as usize + off as usize;
            let mut c = Cursor::at(data, seg_base);
            let _size = c.read_u32(Endian::Little)?;
            let page_size = c.read_u16(Endian::Little)?;
            let pointer_format = c.read_u16(Endian::Little)?;
            let segment_offset = c.read_u64(Endian::Little)?;
            let _max_valid_pointer = c.read_u32(Endian::Little)?;
            let page_count = c.read_u16(Endian::Little)?;
            let mut page_starts = Vec::with_capacity(page_count as usize);
            for _ in 0..page_count {
                page_starts.push(c.read_u16(Endian::Little)?);
            }
            starts.push(SegmentStart {
                page_size,
                pointer_format,
                segment_offset,
                page_starts,
            });
        }
        Ok(starts)
    }

    pub fn symbol_name(&self, ordinal: u32) -> Option<&str> {
        self.imports.get(ordinal as usize).map(|i| i.name.as_str())
    }

    /// Decodes a single raw 64-bit on-file pointer word according to the
    /// chain's pointer format. `pointer_format` comes from the segment's
    /// `SegmentStart`; ARM64E formats require PAC stripping before a
    /// rebase target can be used (§4.D, §4.E, §8 property 5).
    pub fn decode_pointer(raw: u64, pointer_format: u16) -> Result<DecodedPointer> {
        match pointer_format {
            DYLD_CHAINED_PTR_64 => {
                let is_bind = (raw >> 63) & 1 != 0;
                if is_bind {
                    let ordinal = (raw & 0x00ff_ffff) as u32;
                    let addend = ((raw >> 24) & 0xff) as i64;
                    Ok(DecodedPointer::Bind { ordinal, addend })
                } else {
                    let target = raw & 0x0000_000f_ffff_ffff;
                    Ok(DecodedPointer::Rebase { target_va: target })
                }
            }
            DYLD_CHAINED_PTR_ARM64E | DYLD_CHAINED_PTR_ARM64E_USERLAND | DYLD_CHAINED_PTR_ARM64E_USERLAND24 => {
                let is_bind = (raw >> 62) & 1 != 0;
                if is_bind {
                    let ordinal_bits = if pointer_format == DYLD_CHAINED_PTR_ARM64E_USERLAND24 {
                        24
                    } else {
                        16
                    };
                    let mask = (1u64 << ordinal_bits) - 1;
                    let ordinal = (raw & mask) as u32;
                    // bits 16-31 are the reserved `zero` field; the real
                    // addend lives at bits 32-50 (19 bits).
                    let addend_raw = (raw >> 32) & 0x7_ffff;
                    let addend = sign_extend(addend_raw, 19);
                    Ok(DecodedPointer::Bind { ordinal, addend })
                } else {
                    let target = raw & 0x0000_7fff_ffff_ffff;
                    Ok(DecodedPointer::Rebase {
                        target_va: strip_pac(target),
                    })
                }
            }
            DYLD_CHAINED_PTR_32 => {
                let is_bind = (raw >> 31) & 1 != 0;
                if is_bind {
                    let ordinal = (raw & 0x000f_ffff) as u32;
                    let addend = ((raw >> 20) & 0x3f) as i64;
                    Ok(DecodedPointer::Bind { ordinal, addend })
                } else {
                    // target:0-25, next:26-30, bind:31 — the rebase target
                    // is only the low 26 bits; the next-chain stride isn't
                    // part of the address.
                    Ok(DecodedPointer::Rebase {
                        target_va: raw & 0x03ff_ffff,
                    })
                }
            }
            _ => Err(Error::UnsupportedFormat("unknown chained-fixup pointer_format")),
        }
    }

    /// Reads the chain starting at `first_offset` within `segment_data`,
    /// stepping by each entry's "next" field (expressed in 4-byte strides
    /// for every supported format) until the stride is zero.
    pub fn walk_chain<'a>(
        &self,
        segment_data: &'a [u8],
        first_offset: usize,
        pointer_format: u16,
    ) -> Vec<(usize, Result<DecodedPointer>)> {
        let mut out = Vec::new();
        let mut offset = first_offset;
        let stride_unit = if matches!(
            pointer_format,
            DYLD_CHAINED_PTR_ARM64E | DYLD_CHAINED_PTR_ARM64E_USERLAND | DYLD_CHAINED_PTR_ARM64E_USERLAND24
        ) {
            8
        } else {
            4
        };
        loop {
            if offset + 8 > segment_data.len() {
                break;
            }
            let raw = u64::from_le_bytes(segment_data[offset..offset + 8].try_into().unwrap());
            let decoded = Self::decode_pointer(raw, pointer_format);
            let next = match pointer_format {
                DYLD_CHAINED_PTR_64 => (raw >> 51) & 0xfff,
                DYLD_CHAINED_PTR_ARM64E | DYLD_CHAINED_PTR_ARM64E_USERLAND | DYLD_CHAINED_PTR_ARM64E_USERLAND24 => {
                    (raw >> 51) & 0x7ff
                }
                DYLD_CHAINED_PTR_32 => (raw >> 26) & 0x1f,
                _ => 0,
            };
            out.push((offset, decoded));
            if next == 0 {
                break;
            }
            offset += next as usize * stride_unit;
        }
        out
    }
}

fn sign_extend(value: u64, bits: u32) -> i64 {
    let shift = 64 - bits;
    ((value << shift) as i64) >> shift
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_plain_64_rebase() {
        let raw = 0x0000_0000_1234_5678u64;
        match ChainedFixups::decode_pointer(raw, DYLD_CHAINED_PTR_64).unwrap() {
            DecodedPointer::Rebase { target_va } => assert_eq!(target_va, 0x1234_5678),
            other => panic!("expected rebase, got {other:?}"),
        }
    }

    #[test]
    fn decodes_plain_64_bind() {
        let raw = (1u64 << 63) | 5u64;
        match ChainedFixups::decode_pointer(raw, DYLD_CHAINED_PTR_64).unwrap() {
            DecodedPointer::Bind { ordinal, .. } => assert_eq!(ordinal, 5),
            other => panic!("expected bind, got {other:?}"),
        }
    }

    #[test]
    fn arm64e_rebase_strips_pac_bits() {
        // top bit (bind flag) clear, but high auth-diversity bits set above
        // the 47-bit VA range.
        let raw = 0x00AA_0000_1000_2000u64 & !(1u64 << 62);
        match ChainedFixups::decode_pointer(raw, DYLD_CHAINED_PTR_ARM64E).unwrap() {
            DecodedPointer::Rebase { target_va } => {
                assert_eq!(target_va & !0x0000_7fff_ffff_ffff, 0);
            }
            other => panic!("expected rebase, got {other:?}"),
        }
    }

    #[test]
    fn arm64e_bind_extracts_ordinal() {
        let raw = (1u64 << 62) | 42u64;
        match ChainedFixups::decode_pointer(raw, DYLD_CHAINED_PTR_ARM64E).unwrap() {
            DecodedPointer::Bind { ordinal, .. } => assert_eq!(ordinal, 42),
            other => panic!("expected bind, got {other:?}"),
        }
    }

    #[test]
    fn arm64e_bind_reads_addend_from_bits_32_to_50_not_the_zero_field() {
        // bits 16-31 carry a nonzero `zero` field that must be ignored;
        // the addend itself sits at bits 32-50.
        let raw = (1u64 << 62) | (0xdeadu64 << 16) | (5u64 << 32) | 42u64;
        match ChainedFixups::decode_pointer(raw, DYLD_CHAINED_PTR_ARM64E).unwrap() {
            DecodedPointer::Bind { ordinal, addend } => {
                assert_eq!(ordinal, 42);
                assert_eq!(addend, 5);
            }
            other => panic!("expected bind, got {other:?}"),
        }
    }

    #[test]
    fn arm64e_bind_sign_extends_negative_addend() {
        // bit 18 of the 19-bit addend field set: the most negative case.
        let addend_raw = 1u64 << 18;
        let raw = (1u64 << 62) | (addend_raw << 32);
        match ChainedFixups::decode_pointer(raw, DYLD_CHAINED_PTR_ARM64E).unwrap() {
            DecodedPointer::Bind { addend, .. } => assert_eq!(addend, -(1i64 << 18)),
            other => panic!("expected bind, got {other:?}"),
        }
    }

    #[test]
    fn chained_ptr_32_rebase_excludes_next_chain_stride() {
        let target = 0x3AB_CDEFu64 & 0x03ff_ffff;
        let next = 0x15u64;
        let raw = target | (next << 26);
        match ChainedFixups::decode_pointer(raw, DYLD_CHAINED_PTR_32).unwrap() {
            DecodedPointer::Rebase { target_va } => assert_eq!(target_va, target),
            other => panic!("expected rebase, got {other:?}"),
        }
    }
}

//! Glue between the chained-fixup decoder (§4.D) and the address map
//! (§4.E): turns a raw on-disk pointer word into either a local file
//! offset or an external symbol reference. Shared by the Objective-C
//! (§4.F) and Swift (§4.G) processors so neither reimplements bind/rebase
//! dispatch.

use crate::address_map::AddressMap;
use crate::arch::Arch;
use crate::fixups::{ChainedFixups, DecodedPointer};
use crate::macho::consts::{DYLD_CHAINED_PTR_64, DYLD_CHAINED_PTR_ARM64E};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedPointer {
    Local(usize),
    External(String),
    Null,
}

pub struct PointerResolver<'a> {
    address_map: &'a AddressMap,
    fixups: Option<&'a ChainedFixups>,
    pointer_format: u16,
}

impl<'a> PointerResolver<'a> {
    pub fn new(address_map: &'a AddressMap, fixups: Option<&'a ChainedFixups>, arch: &Arch) -> Self {
        let pointer_format = if arch.is_arm64e() {
            DYLD_CHAINED_PTR_ARM64E
        } else {
            DYLD_CHAINED_PTR_64
        };
        PointerResolver {
            address_map,
            fixups,
            pointer_format,
        }
    }

    /// Resolves a raw pointer-sized word exactly as it was read from file
    /// bytes: if the binary carries chained fixups, decode it as a
    /// bind/rebase chain entry first; otherwise treat it as an
    /// already-rebased virtual address (the common case for a statically
    /// linked or prelinked image).
    pub fn resolve(&self, raw: u64) -> ResolvedPointer {
        if raw == 0 {
            return ResolvedPointer::Null;
        }
        if let Some(fixups) = self.fixups {
            if let Ok(decoded) = ChainedFixups::decode_pointer(raw, self.pointer_format) {
                return match decoded {
                    DecodedPointer::Bind { ordinal, .. } => {
                        let name = fixups
                            .symbol_name(ordinal)
                            .map(str::to_string)
                            .unwrap_or_else(|| format!("ordinal#{ordinal}"));
                        ResolvedPointer::External(name)
                    }
                    DecodedPointer::Rebase { target_va } => self
                        .address_map
                        .to_file_offset(target_va)
                        .map(|off| ResolvedPointer::Local(off as usize))
                        .unwrap_or(ResolvedPointer::Null),
                };
            }
        }
        self.address_map
            .to_file_offset(raw)
            .map(|off| ResolvedPointer::Local(off as usize))
            .unwrap_or(ResolvedPointer::Null)
    }

    pub fn resolve_local(&self, raw: u64) -> Option<usize> {
        match self.resolve(raw) {
            ResolvedPointer::Local(off) => Some(off),
            _ => None,
        }
    }
}

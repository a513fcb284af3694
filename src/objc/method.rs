//! Objective-C method lists, including the small (relative-offset) format
//! and shared-cache selector indirection (§4.F "Method lists").

use crate::cursor::{cstring_at, Cursor, Endian};
use crate::error::{Diagnostic, Result};
use crate::macho::consts::{OBJC_RELATIVE_SELECTORS_DIRECT_FLAG, OBJC_SHARED_CACHE_SELECTORS_FLAG, OBJC_SMALL_METHOD_LIST_FLAG};
use crate::pointer::PointerResolver;

/// An optional external provider for the dyld shared-cache's preoptimized
/// selector table, consulted when a small method list's header marks its
/// selector fields as indirect indices rather than offsets (§4.F, §6).
pub trait SelectorTable {
    fn selector_at(&self, index: u32) -> Option<&str>;
}

#[derive(Debug, Clone)]
pub struct Method {
    pub selector: String,
    pub type_encoding: String,
    pub implementation: u64,
    pub selector_unresolved: bool,
}

#[derive(Debug, Clone)]
pub struct MethodList {
    pub is_small: bool,
    pub methods: Vec<Method>,
}

const SMALL_ENTRY_SIZE: usize = 12;
const NORMAL_ENTRY_SIZE: usize = 24;

impl MethodList {
    pub fn parse(
        data: &[u8],
        offset: usize,
        resolver: &PointerResolver,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Result<MethodList> {
        Self::parse_with_cache(data, offset, resolver, diagnostics, None)
    }

    pub fn parse_with_cache(
        data: &[u8],
        offset: usize,
        resolver: &PointerResolver,
        diagnostics: &mut Vec<Diagnostic>,
        selector_table: Option<&dyn SelectorTable>,
    ) -> Result<MethodList> {
        let mut cursor = Cursor::at(data, offset);
        let entsize_and_flags = cursor.read_u32(Endian::Little)?;
        let count = cursor.read_u32(Endian::Little)?;

        const MAX_PLAUSIBLE_METHODS: u32 = 1 << 20;
        if count > MAX_PLAUSIBLE_METHODS {
            diagnostics.push(Diagnostic::warning(format!("method count {count} is implausible, skipping list")).at(offset));
            return Ok(MethodList {
                is_small: false,
                methods: Vec::new(),
            });
        }

        let is_small = entsize_and_flags & OBJC_SMALL_METHOD_LIST_FLAG != 0;
        let direct_selectors = entsize_and_flags & OBJC_RELATIVE_SELECTORS_DIRECT_FLAG != 0;
        let shared_cache_selectors = entsize_and_flags & OBJC_SHARED_CACHE_SELECTORS_FLAG != 0;

        let mut methods = Vec::with_capacity(count as usize);
        let mut entry_offset = offset + 8;
        for i in 0..count {
            let parsed = if is_small {
                Self::parse_small(data, entry_offset, resolver, direct_selectors, shared_cache_selectors, selector_table)
            } else {
                Self::parse_normal(data, entry_offset, resolver)
            };
            match parsed {
                Ok(m) => methods.push(m),
                Err(e) => diagnostics.push(Diagnostic::warning(format!("method #{i} skipped: {e}")).at(entry_offset)),
            }
            entry_offset += if is_small { SMALL_ENTRY_SIZE } else { NORMAL_ENTRY_SIZE };
        }

        Ok(MethodList { is_small, methods })
    }

    fn parse_small(
        data: &[u8],
        offset: usize,
        resolver: &PointerResolver,
        direct_selectors: bool,
        shared_cache_selectors: bool,
        selector_table: Option<&dyn SelectorTable>,
    ) -> Result<Method> {
        let mut cursor = Cursor::at(data, offset);
        let name_rel = cursor.read_s32(Endian::Little)?;
        let types_rel = cursor.read_s32(Endian::Little)?;
        let imp_rel = cursor.read_s32(Endian::Little)?;

        let name_field_addr = offset as i64;
        let types_field_addr = offset as i64 + 4;
        let imp_field_addr = offset as i64 + 8;

        let name_target = (name_field_addr + name_rel as i64) as u64;
        let types_target = (types_field_addr + types_rel as i64) as u64;
        let imp_target = (imp_field_addr + imp_rel as i64) as u64;

        let (selector, selector_unresolved) = if direct_selectors {
            (cstring_at(data, name_target as usize).map(str::to_string).ok(), false)
        } else if shared_cache_selectors {
            // The list header marks this list as shared-cache
            // preoptimized: the selref dereferences to an index into the
            // table, not a pointer to a selector string.
            let index = resolver
                .resolve_local(name_target)
                .and_then(|selref_offset| {
                    let mut c = Cursor::at(data, selref_offset);
                    c.read_u64(Endian::Little).ok()
                })
                .unwrap_or(name_target);
            (selector_table.and_then(|t| t.selector_at(index as u32)).map(str::to_string), true)
        } else {
            match resolver.resolve_local(name_target) {
                Some(selref_offset) => {
                    let mut c = Cursor::at(data, selref_offset);
                    match c.read_u64(Endian::Little) {
                        Ok(sel_ptr) => match resolver.resolve_local(sel_ptr) {
                            Some(str_off) => (cstring_at(data, str_off).map(str::to_string).ok(), false),
                            None => (None, true),
                        },
                        Err(_) => (None, true),
                    }
                }
                None => (None, true),
            }
        };

        let type_encoding = cstring_at(data, types_target as usize).map(str::to_string).unwrap_or_default();

        Ok(Method {
            selector: selector.unwrap_or_else(|| "<unresolved-selector>".to_string()),
            type_encoding,
            implementation: imp_target,
            selector_unresolved,
        })
    }

    fn parse_normal(data: &[u8], offset: usize, resolver: &PointerResolver) -> Result<Method> {
        let mut cursor = Cursor::at(data, offset);
        let name_raw = cursor.read_u64(Endian::Little)?;
        let types_raw = cursor.read_u64(Endian::Little)?;
        let imp_raw = cursor.read_u64(Endian::Little)?;

        let selector = resolver
            .resolve_local(name_raw)
            .and_then(|off| cstring_at(data, off).ok())
            .map(str::to_string)
            .unwrap_or_else(|| "<unresolved-selector>".to_string());
        let type_encoding = resolver
            .resolve_local(types_raw)
            .and_then(|off| cstring_at(data, off).ok())
            .map(str::to_string)
            .unwrap_or_default();

        Ok(Method {
            selector,
            type_encoding,
            implementation: imp_raw,
            selector_unresolved: false,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address_map::AddressMap;
    use crate::arch::Arch;
    use crate::macho::consts::{CPU_SUBTYPE_ARM64_ALL, CPU_TYPE_ARM64};
    use crate::macho::Segment;

    fn flat_map(len: u64) -> AddressMap {
        AddressMap::build(&[Segment {
            name: "__DATA".into(),
            vmaddr: 0,
            vmsize: len,
            fileoff: 0,
            filesize: len,
            maxprot: 0,
            initprot: 0,
            flags: 0,
            sections: vec![],
        }])
    }

    fn arm64() -> Arch {
        Arch::new(CPU_TYPE_ARM64, CPU_SUBTYPE_ARM64_ALL)
    }

    #[test]
    fn parses_normal_method_list() {
        let mut data = vec![0u8; 0];
        // layout: [header(8)][entry(24)] then string pool
        let header_off = 0usize;
        data.extend_from_slice(&(0u32).to_le_bytes()); // entsize_and_flags (not small)
        data.extend_from_slice(&(1u32).to_le_bytes()); // count
        let entry_off = data.len();
        data.extend_from_slice(&[0u8; 24]); // placeholder, patched below
        let name_off = data.len();
        data.extend_from_slice(b"doSomething:\0");
        let types_off = data.len();
        data.extend_from_slice(b"v24@0:8@16\0");

        data[entry_off..entry_off + 8].copy_from_slice(&(name_off as u64).to_le_bytes());
        data[entry_off + 8..entry_off + 16].copy_from_slice(&(types_off as u64).to_le_bytes());
        data[entry_off + 16..entry_off + 24].copy_from_slice(&0x4000u64.to_le_bytes());

        let map = flat_map(data.len() as u64);
        let arch = arm64();
        let resolver = PointerResolver::new(&map, None, &arch);
        let mut diags = Vec::new();
        let list = MethodList::parse(&data, header_off, &resolver, &mut diags).unwrap();
        assert_eq!(list.methods.len(), 1);
        assert_eq!(list.methods[0].selector, "doSomething:");
        assert_eq!(list.methods[0].type_encoding, "v24@0:8@16");
        assert!(diags.is_empty());
    }

    #[test]
    fn parses_small_method_list_with_direct_selector() {
        let mut data = Vec::new();
        data.extend_from_slice(&(OBJC_SMALL_METHOD_LIST_FLAG | OBJC_RELATIVE_SELECTORS_DIRECT_FLAG).to_le_bytes());
        data.extend_from_slice(&(1u32).to_le_bytes());
        let entry_off = data.len();
        data.extend_from_slice(&[0u8; 12]);
        let name_off = data.len();
        data.extend_from_slice(b"init\0");
        let types_off = data.len();
        data.extend_from_slice(b"@16@0:8\0");

        let name_rel = name_off as i64 - entry_off as i64;
        let types_rel = types_off as i64 - (entry_off as i64 + 4);
        let imp_rel = 0i64 - (entry_off as i64 + 8);
        data[entry_off..entry_off + 4].copy_from_slice(&(name_rel as i32).to_le_bytes());
        data[entry_off + 4..entry_off + 8].copy_from_slice(&(types_rel as i32).to_le_bytes());
        data[entry_off + 8..entry_off + 12].copy_from_slice(&(imp_rel as i32).to_le_bytes());

        let map = flat_map(data.len() as u64);
        let arch = arm64();
        let resolver = PointerResolver::new(&map, None, &arch);
        let mut diags = Vec::new();
        let list = MethodList::parse(&data, 0, &resolver, &mut diags).unwrap();
        assert!(list.is_small);
        assert_eq!(list.methods[0].selector, "init");
        assert!(!list.methods[0].selector_unresolved);
    }

    struct FakeSelectorTable;
    impl SelectorTable for FakeSelectorTable {
        fn selector_at(&self, _index: u32) -> Option<&str> {
            Some("tableSelector:")
        }
    }

    fn small_method_list_with_selref(flags: u32) -> (Vec<u8>, usize) {
        let mut data = Vec::new();
        data.extend_from_slice(&(OBJC_SMALL_METHOD_LIST_FLAG | flags).to_le_bytes());
        data.extend_from_slice(&(1u32).to_le_bytes());
        let entry_off = data.len();
        data.extend_from_slice(&[0u8; 12]);
        let selref_off = data.len();
        // Far outside the flat segment's address range either way: as a
        // shared-cache table index it's opaque, and as a plain local
        // address it deliberately fails to resolve.
        data.extend_from_slice(&u64::MAX.to_le_bytes());
        let types_off = data.len();
        data.extend_from_slice(b"@16@0:8\0");

        let name_rel = selref_off as i64 - entry_off as i64;
        let types_rel = types_off as i64 - (entry_off as i64 + 4);
        let imp_rel = 0i64 - (entry_off as i64 + 8);
        data[entry_off..entry_off + 4].copy_from_slice(&(name_rel as i32).to_le_bytes());
        data[entry_off + 4..entry_off + 8].copy_from_slice(&(types_rel as i32).to_le_bytes());
        data[entry_off + 8..entry_off + 12].copy_from_slice(&(imp_rel as i32).to_le_bytes());
        (data, entry_off)
    }

    #[test]
    fn shared_cache_flag_consults_selector_table() {
        let (data, _) = small_method_list_with_selref(OBJC_SHARED_CACHE_SELECTORS_FLAG);
        let map = flat_map(data.len() as u64);
        let arch = arm64();
        let resolver = PointerResolver::new(&map, None, &arch);
        let mut diags = Vec::new();
        let table = FakeSelectorTable;
        let list = MethodList::parse_with_cache(&data, 0, &resolver, &mut diags, Some(&table)).unwrap();
        assert_eq!(list.methods[0].selector, "tableSelector:");
        assert!(list.methods[0].selector_unresolved);
    }

    #[test]
    fn without_shared_cache_flag_selector_table_is_never_consulted() {
        // Same byte layout as the shared-cache case, but without the
        // dedicated flag: a second-level selref dereference that doesn't
        // resolve to a local string must stay unresolved rather than
        // silently falling back to the table.
        let (data, _) = small_method_list_with_selref(0);
        let map = flat_map(data.len() as u64);
        let arch = arm64();
        let resolver = PointerResolver::new(&map, None, &arch);
        let mut diags = Vec::new();
        let table = FakeSelectorTable;
        let list = MethodList::parse_with_cache(&data, 0, &resolver, &mut diags, Some(&table)).unwrap();
        assert_eq!(list.methods[0].selector, "<unresolved-selector>");
        assert!(list.methods[0].selector_unresolved);
    }
}

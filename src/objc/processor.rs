//! Component F: walks `__objc_classlist`/`__objc_catlist`/`__objc_protolist`
//! and assembles the classes, categories, and protocols they reference.

use crate::address_map::AddressMap;
use crate::cursor::{Cursor, Endian};
use crate::error::Diagnostic;
use crate::fixups::ChainedFixups;
use crate::macho::MachOFile;
use crate::objc::category::Category;
use crate::objc::class::Class;
use crate::objc::image_info::ImageInfo;
use crate::objc::protocol::Protocol;
use crate::pointer::PointerResolver;

#[derive(Debug, Default)]
pub struct ObjCModel {
    pub classes: Vec<Class>,
    pub categories: Vec<Category>,
    pub protocols: Vec<Protocol>,
    pub image_info: Option<ImageInfo>,
    pub diagnostics: Vec<Diagnostic>,
}

pub struct ObjCProcessor;

impl ObjCProcessor {
    /// Runs the full pass over one architecture slice. A slice with no
    /// `__objc_*` sections at all yields an empty, warning-free model
    /// (§4.F doesn't require Objective-C metadata to be present).
    pub fn process(file: &MachOFile, fixups: Option<&ChainedFixups>) -> ObjCModel {
        let address_map = AddressMap::build(&file.segments);
        let arch = file.arch();
        let resolver = PointerResolver::new(&address_map, fixups, &arch);

        let mut model = ObjCModel::default();

        if let Some(section) = file.section_by_name("__objc_imageinfo") {
            if let Ok(bytes) = section.data(file.data) {
                if bytes.len() >= 8 {
                    if let Ok(info) = ImageInfo::parse(bytes) {
                        model.image_info = Some(info);
                    }
                }
            }
        }

        for raw in Self::read_pointer_list(file, "__objc_classlist") {
            match resolver.resolve_local(raw) {
                Some(off) => match Class::parse(file.data, off, &resolver, &mut model.diagnostics) {
                    Ok(cls) => model.classes.push(cls),
                    Err(e) => {
                        log::warn!("class at file offset {off:#x} skipped: {e}");
                        model
                            .diagnostics
                            .push(Diagnostic::warning(format!("class at file offset {off:#x} skipped: {e}")).at(off));
                    }
                },
                None => {
                    log::warn!("classlist entry {raw:#x} did not resolve locally");
                    model
                        .diagnostics
                        .push(Diagnostic::warning(format!("classlist entry {raw:#x} did not resolve locally")));
                }
            }
        }

        for raw in Self::read_pointer_list(file, "__objc_catlist") {
            match resolver.resolve_local(raw) {
                Some(off) => match Category::parse(file.data, off, &resolver, &mut model.diagnostics) {
                    Ok(cat) => model.categories.push(cat),
                    Err(e) => {
                        log::warn!("category at file offset {off:#x} skipped: {e}");
                        model
                            .diagnostics
                            .push(Diagnostic::warning(format!("category at file offset {off:#x} skipped: {e}")).at(off));
                    }
                },
                None => {
                    log::warn!("catlist entry {raw:#x} did not resolve locally");
                    model
                        .diagnostics
                        .push(Diagnostic::warning(format!("catlist entry {raw:#x} did not resolve locally")));
                }
            }
        }

        for raw in Self::read_pointer_list(file, "__objc_protolist") {
            match resolver.resolve_local(raw) {
                Some(off) => match Protocol::parse(file.data, off, &resolver, &mut model.diagnostics) {
                    Ok(proto) => model.protocols.push(proto),
                    Err(e) => {
                        log::warn!("protocol at file offset {off:#x} skipped: {e}");
                        model
                            .diagnostics
                            .push(Diagnostic::warning(format!("protocol at file offset {off:#x} skipped: {e}")).at(off));
                    }
                },
                None => {
                    log::warn!("protolist entry {raw:#x} did not resolve locally");
                    model
                        .diagnostics
                        .push(Diagnostic::warning(format!("protolist entry {raw:#x} did not resolve locally")));
                }
            }
        }

        model
    }

    fn read_pointer_list(file: &MachOFile, sectname: &str) -> Vec<u64> {
        let Some(section) = file.section_by_name(sectname) else {
            return Vec::new();
        };
        let Ok(bytes) = section.data(file.data) else {
            return Vec::new();
        };
        let count = bytes.len() / 8;
        let mut cursor = Cursor::new(bytes);
        (0..count).filter_map(|_| cursor.read_u64(Endian::Little).ok()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::macho::consts::{CPU_SUBTYPE_ARM64_ALL, CPU_TYPE_ARM64};
    use crate::macho::Segment;
    use crate::macho::segment::Section;

    fn section(sectname: &str, addr: u64, offset: u32, size: u64) -> Section {
        Section {
            sectname: sectname.to_string(),
            segname: "__DATA".to_string(),
            addr,
            size,
            offset,
            align: 3,
            reloff: 0,
            nreloc: 0,
            flags: 0,
            reserved1: 0,
            reserved2: 0,
            reserved3: 0,
        }
    }

    #[test]
    fn empty_model_when_no_objc_sections_present() {
        let data = vec![0u8; 16];
        let file = MachOFile {
            data: &data,
            is_64: true,
            endian: Endian::Little,
            cpu_type: CPU_TYPE_ARM64,
            cpu_subtype: CPU_SUBTYPE_ARM64_ALL,
            file_type: 0,
            flags: 0,
            segments: vec![],
            uuid: None,
            build_version: None,
            dylib_id: None,
            dylibs: vec![],
            chained_fixups_range: None,
            warnings: vec![],
            symbols: crate::macho::symtab::SymbolTable::empty(&data, Endian::Little, true),
        };
        let model = ObjCProcessor::process(&file, None);
        assert!(model.classes.is_empty());
        assert!(model.diagnostics.is_empty());
    }

    #[test]
    fn walks_one_class_end_to_end() {
        let mut data = Vec::new();
        // class record at offset 0
        data.extend_from_slice(&0u64.to_le_bytes()); // isa
        data.extend_from_slice(&0u64.to_le_bytes()); // superclass
        data.extend_from_slice(&0u64.to_le_bytes()); // cache
        data.extend_from_slice(&0u64.to_le_bytes()); // vtable
        let ro_addr_slot = data.len();
        data.extend_from_slice(&0u64.to_le_bytes()); // data ptr, patched

        let ro_off = data.len();
        data.extend_from_slice(&[0u8; 72]);
        let name_off = data.len();
        data.extend_from_slice(b"Widget\0");
        data[ro_off + 24..ro_off + 32].copy_from_slice(&(name_off as u64).to_le_bytes());
        data[ro_addr_slot..ro_addr_slot + 8].copy_from_slice(&(ro_off as u64).to_le_bytes());

        // classlist section: one 8-byte pointer to the class record (vmaddr 0).
        let classlist_off = data.len() as u32;
        data.extend_from_slice(&0u64.to_le_bytes());

        let segments = vec![Segment {
            name: "__DATA".into(),
            vmaddr: 0,
            vmsize: data.len() as u64,
            fileoff: 0,
            filesize: data.len() as u64,
            maxprot: 0,
            initprot: 0,
            flags: 0,
            sections: vec![section("__objc_classlist", classlist_off as u64, classlist_off, 8)],
        }];

        let file = MachOFile {
            data: &data,
            is_64: true,
            endian: Endian::Little,
            cpu_type: CPU_TYPE_ARM64,
            cpu_subtype: CPU_SUBTYPE_ARM64_ALL,
            file_type: 0,
            flags: 0,
            segments,
            uuid: None,
            build_version: None,
            dylib_id: None,
            dylibs: vec![],
            chained_fixups_range: None,
            warnings: vec![],
            symbols: crate::macho::symtab::SymbolTable::empty(&data, Endian::Little, true),
        };

        let model = ObjCProcessor::process(&file, None);
        assert_eq!(model.classes.len(), 1);
        assert_eq!(model.classes[0].data.name, "Widget");
    }
}

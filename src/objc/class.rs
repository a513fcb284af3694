//! Objective-C class records (`class_t`/`class_ro_t`), §4.F "Class layout".

use crate::cursor::{cstring_at, Cursor, Endian};
use crate::error::{Diagnostic, Error, Result};
use crate::objc::ivar::IVarList;
use crate::objc::method::MethodList;
use crate::objc::property::PropertyList;
use crate::objc::protocol::ProtocolList;
use crate::pointer::{PointerResolver, ResolvedPointer};

/// `class_rw_t::data()`'s low bit: set when the class carries a trailing
/// Swift class header, cross-referenced by the Swift processor (§4.F, §4.G).
const DATA_SWIFT_MARKER: u64 = 0x1;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClassRef {
    Local(usize),
    External(String),
    Null,
}

pub fn strip_class_symbol_prefix(name: &str) -> String {
    name.strip_prefix("_OBJC_CLASS_$_")
        .or_else(|| name.strip_prefix("OBJC_CLASS_$_"))
        .unwrap_or(name)
        .to_string()
}

#[derive(Debug, Clone)]
pub struct ClassData {
    pub flags: u32,
    pub instance_start: u32,
    pub instance_size: u32,
    pub name: String,
    pub base_methods: Option<MethodList>,
    pub base_protocols: Option<ProtocolList>,
    pub ivars: Option<IVarList>,
    pub base_properties: Option<PropertyList>,
}

#[derive(Debug, Clone)]
pub struct Class {
    pub isa: ClassRef,
    pub superclass: ClassRef,
    pub is_swift_stable: bool,
    pub data: ClassData,
}

const RO_RECORD_SIZE: usize = 72;

impl Class {
    pub fn parse(
        data: &[u8],
        offset: usize,
        resolver: &PointerResolver,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Result<Class> {
        let mut cursor = Cursor::at(data, offset);
        let isa_raw = cursor.read_u64(Endian::Little)?;
        let superclass_raw = cursor.read_u64(Endian::Little)?;
        let _cache = cursor.read_u64(Endian::Little)?;
        let _vtable = cursor.read_u64(Endian::Little)?;
        let data_raw = cursor.read_u64(Endian::Little)?;

        let isa = to_class_ref(resolver.resolve(isa_raw));
        let superclass = to_class_ref(resolver.resolve(superclass_raw));
        let is_swift_stable = data_raw & DATA_SWIFT_MARKER != 0;
        let ro_addr = data_raw & !DATA_SWIFT_MARKER;

        let ro_offset = resolver
            .resolve_local(ro_addr)
            .ok_or(Error::CorruptMetadata("class_ro_t pointer did not resolve to a local file offset"))?;

        let class_data = ClassData::parse(data, ro_offset, resolver, diagnostics)?;

        Ok(Class {
            isa,
            superclass,
            is_swift_stable,
            data: class_data,
        })
    }
}

impl ClassData {
    fn parse(
        data: &[u8],
        offset: usize,
        resolver: &PointerResolver,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Result<ClassData> {
        if offset + RO_RECORD_SIZE > data.len() {
            return Err(Error::TruncatedFile {
                offset,
                len: RO_RECORD_SIZE,
                size: data.len(),
            });
        }
        let mut cursor = Cursor::at(data, offset);
        let flags = cursor.read_u32(Endian::Little)?;
        let instance_start = cursor.read_u32(Endian::Little)?;
        let instance_size = cursor.read_u32(Endian::Little)?;
        let _reserved = cursor.read_u32(Endian::Little)?;
        let _ivar_layout = cursor.read_u64(Endian::Little)?;
        let name_raw = cursor.read_u64(Endian::Little)?;
        let base_methods_raw = cursor.read_u64(Endian::Little)?;
        let base_protocols_raw = cursor.read_u64(Endian::Little)?;
        let ivars_raw = cursor.read_u64(Endian::Little)?;
        let _weak_ivar_layout = cursor.read_u64(Endian::Little)?;
        let base_properties_raw = cursor.read_u64(Endian::Little)?;

        let name = resolver
            .resolve_local(name_raw)
            .and_then(|off| cstring_at(data, off).ok())
            .map(str::to_string)
            .unwrap_or_else(|| {
                diagnostics.push(Diagnostic::warning("class name pointer did not resolve").at(offset));
                "<unknown>".to_string()
            });

        let base_methods = resolver
            .resolve_local(base_methods_raw)
            .and_then(|off| MethodList::parse(data, off, resolver, diagnostics).ok());
        let base_protocols = resolver
            .resolve_local(base_protocols_raw)
            .map(|off| ProtocolList::parse(data, off, resolver, diagnostics))
            .transpose()?;
        let ivars = resolver
            .resolve_local(ivars_raw)
            .and_then(|off| IVarList::parse(data, off, resolver, diagnostics).ok());
        let base_properties = resolver
            .resolve_local(base_properties_raw)
            .and_then(|off| PropertyList::parse(data, off, resolver, diagnostics).ok());

        Ok(ClassData {
            flags,
            instance_start,
            instance_size,
            name,
            base_methods,
            base_protocols,
            ivars,
            base_properties,
        })
    }
}

fn to_class_ref(r: ResolvedPointer) -> ClassRef {
    match r {
        ResolvedPointer::Local(off) => ClassRef::Local(off),
        ResolvedPointer::External(name) => ClassRef::External(strip_class_symbol_prefix(&name)),
        ResolvedPointer::Null => ClassRef::Null,
    }
}

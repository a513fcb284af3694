//! Objective-C `@protocol` declarations (`protocol_t`/`protocol_list_t`).
//!
//! Protocol records carry an optional extended-method-types table whose
//! N-th string gives a richer signature (typically a full block type) for
//! the N-th method; when present it is registered in the method-signature
//! registry keyed by selector (§4.F, §4.K).

use crate::cursor::{cstring_at, Cursor, Endian};
use crate::error::{Diagnostic, Result};
use crate::objc::method::MethodList;
use crate::objc::property::PropertyList;
use crate::pointer::PointerResolver;

#[derive(Debug, Clone)]
pub struct Protocol {
    pub name: String,
    pub protocols: Vec<String>,
    pub instance_methods: Option<MethodList>,
    pub class_methods: Option<MethodList>,
    pub optional_instance_methods: Option<MethodList>,
    pub optional_class_methods: Option<MethodList>,
    pub instance_properties: Option<PropertyList>,
    pub extended_method_types: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ProtocolList {
    pub names: Vec<String>,
}

impl ProtocolList {
    /// A `protocol_list_t` is a bare `{ count: u64, refs: [ptr; count] }`;
    /// this only resolves enough of each referenced protocol to name it,
    /// leaving full parsing to callers that actually need the body.
    pub fn parse(
        data: &[u8],
        offset: usize,
        resolver: &PointerResolver,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Result<ProtocolList> {
        let mut cursor = Cursor::at(data, offset);
        let count = cursor.read_u64(Endian::Little)?;

        let mut names = Vec::with_capacity(count as usize);
        for i in 0..count {
            let ref_off = offset + 8 + (i as usize) * 8;
            let mut c = Cursor::at(data, ref_off);
            let raw = match c.read_u64(Endian::Little) {
                Ok(v) => v,
                Err(e) => {
                    diagnostics.push(Diagnostic::warning(format!("protocol ref #{i} unreadable: {e}")).at(ref_off));
                    continue;
                }
            };
            match resolver.resolve_local(raw) {
                Some(proto_off) => match Protocol::parse(data, proto_off, resolver, diagnostics) {
                    Ok(p) => names.push(p.name),
                    Err(e) => diagnostics.push(Diagnostic::warning(format!("protocol ref #{i} skipped: {e}")).at(proto_off)),
                },
                None => diagnostics.push(Diagnostic::warning(format!("protocol ref #{i} did not resolve locally")).at(ref_off)),
            }
        }
        Ok(ProtocolList { names })
    }
}

const RECORD_SIZE: usize = 80;

impl Protocol {
    pub fn parse(
        data: &[u8],
        offset: usize,
        resolver: &PointerResolver,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Result<Protocol> {
        if offset + RECORD_SIZE > data.len() {
            return Err(crate::error::Error::TruncatedFile {
                offset,
                len: RECORD_SIZE,
                size: data.len(),
            });
        }
        let mut cursor = Cursor::at(data, offset);
        let _isa = cursor.read_u64(Endian::Little)?;
        let name_raw = cursor.read_u64(Endian::Little)?;
        let protocols_raw = cursor.read_u64(Endian::Little)?;
        let instance_methods_raw = cursor.read_u64(Endian::Little)?;
        let class_methods_raw = cursor.read_u64(Endian::Little)?;
        let optional_instance_methods_raw = cursor.read_u64(Endian::Little)?;
        let optional_class_methods_raw = cursor.read_u64(Endian::Little)?;
        let instance_properties_raw = cursor.read_u64(Endian::Little)?;
        let _size = cursor.read_u32(Endian::Little)?;
        let _flags = cursor.read_u32(Endian::Little)?;
        let extended_method_types_raw = cursor.read_u64(Endian::Little)?;

        let name = resolver
            .resolve_local(name_raw)
            .and_then(|off| cstring_at(data, off).ok())
            .map(str::to_string)
            .unwrap_or_else(|| "<unresolved-protocol-name>".to_string());

        let protocols = resolver
            .resolve_local(protocols_raw)
            .map(|off| ProtocolList::parse(data, off, resolver, diagnostics))
            .transpose()?
            .map(|l| l.names)
            .unwrap_or_default();

        let instance_methods = resolver
            .resolve_local(instance_methods_raw)
            .and_then(|off| MethodList::parse(data, off, resolver, diagnostics).ok());
        let class_methods = resolver
            .resolve_local(class_methods_raw)
            .and_then(|off| MethodList::parse(data, off, resolver, diagnostics).ok());
        let optional_instance_methods = resolver
            .resolve_local(optional_instance_methods_raw)
            .and_then(|off| MethodList::parse(data, off, resolver, diagnostics).ok());
        let optional_class_methods = resolver
            .resolve_local(optional_class_methods_raw)
            .and_then(|off| MethodList::parse(data, off, resolver, diagnostics).ok());
        let instance_properties = resolver
            .resolve_local(instance_properties_raw)
            .and_then(|off| PropertyList::parse(data, off, resolver, diagnostics).ok());

        let extended_method_types = resolver
            .resolve_local(extended_method_types_raw)
            .map(|off| Self::read_extended_method_types(data, off, &instance_methods, resolver))
            .unwrap_or_default();

        Ok(Protocol {
            name,
            protocols,
            instance_methods,
            class_methods,
            optional_instance_methods,
            optional_class_methods,
            instance_properties,
            extended_method_types,
        })
    }

    fn read_extended_method_types(
        data: &[u8],
        table_offset: usize,
        instance_methods: &Option<MethodList>,
        resolver: &PointerResolver,
    ) -> Vec<String> {
        let n = instance_methods.as_ref().map(|l| l.methods.len()).unwrap_or(0);
        (0..n)
            .filter_map(|i| {
                let mut c = Cursor::at(data, table_offset + i * 8);
                let raw = c.read_u64(Endian::Little).ok()?;
                let str_off = resolver.resolve_local(raw)?;
                cstring_at(data, str_off).ok().map(str::to_string)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address_map::AddressMap;
    use crate::arch::Arch;
    use crate::macho::consts::{CPU_SUBTYPE_ARM64_ALL, CPU_TYPE_ARM64};
    use crate::macho::Segment;

    #[test]
    fn parses_minimal_protocol() {
        let mut data = vec![0u8; 80];
        let name_off = data.len();
        data.extend_from_slice(b"MyProtocol\0");
        data[8..16].copy_from_slice(&(name_off as u64).to_le_bytes());

        let map = AddressMap::build(&[Segment {
            name: "__DATA".into(),
            vmaddr: 0,
            vmsize: data.len() as u64,
            fileoff: 0,
            filesize: data.len() as u64,
            maxprot: 0,
            initprot: 0,
            flags: 0,
            sections: vec![],
        }]);
        let arch = Arch::new(CPU_TYPE_ARM64, CPU_SUBTYPE_ARM64_ALL);
        let resolver = PointerResolver::new(&map, None, &arch);
        let mut diags = Vec::new();
        let proto = Protocol::parse(&data, 0, &resolver, &mut diags).unwrap();
        assert_eq!(proto.name, "MyProtocol");
        assert!(proto.protocols.is_empty());
    }
}

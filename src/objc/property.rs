//! Objective-C `@property` lists (`property_list_t`/`property_t`).
//!
//! The runtime stores a property as a bare `(name, attributes)` string
//! pair; `attributes` is itself a small grammar (`T@"NSString",C,N,V_x`)
//! that the visitor decodes when rendering `@property` declarations.

use crate::cursor::{cstring_at, Cursor, Endian};
use crate::error::{Diagnostic, Result};
use crate::pointer::PointerResolver;

#[derive(Debug, Clone)]
pub struct Property {
    pub name: String,
    pub attributes: String,
}

#[derive(Debug, Clone, Default)]
pub struct PropertyAttributes {
    pub type_encoding: Option<String>,
    pub readonly: bool,
    pub copy: bool,
    pub retain: bool,
    pub nonatomic: bool,
    pub weak: bool,
    pub custom_getter: Option<String>,
    pub custom_setter: Option<String>,
    pub ivar_name: Option<String>,
}

impl Property {
    /// Parses the `attributes` grammar: a comma-separated list whose first
    /// char selects the field (`T` type, `R` readonly, `C` copy, `&`
    /// retain, `N` nonatomic, `W` weak, `G`/`S` custom accessor, `V` ivar).
    pub fn parsed_attributes(&self) -> PropertyAttributes {
        let mut attrs = PropertyAttributes::default();
        for part in self.attributes.split(',') {
            if part.is_empty() {
                continue;
            }
            let tag = &part[..1];
            let rest = &part[1..];
            match tag {
                "T" => attrs.type_encoding = Some(rest.to_string()),
                "R" => attrs.readonly = true,
                "C" => attrs.copy = true,
                "&" => attrs.retain = true,
                "N" => attrs.nonatomic = true,
                "W" => attrs.weak = true,
                "G" => attrs.custom_getter = Some(rest.to_string()),
                "S" => attrs.custom_setter = Some(rest.to_string()),
                "V" => attrs.ivar_name = Some(rest.to_string()),
                _ => {}
            }
        }
        attrs
    }
}

#[derive(Debug, Clone)]
pub struct PropertyList {
    pub properties: Vec<Property>,
}

impl PropertyList {
    pub fn parse(
        data: &[u8],
        offset: usize,
        resolver: &PointerResolver,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Result<PropertyList> {
        let mut cursor = Cursor::at(data, offset);
        let entsize = cursor.read_u32(Endian::Little)?;
        let count = cursor.read_u32(Endian::Little)?;
        let entsize = if entsize == 0 { 16 } else { entsize as usize };

        let mut properties = Vec::with_capacity(count as usize);
        let mut entry_off = offset + 8;
        for i in 0..count {
            match Self::parse_one(data, entry_off, resolver) {
                Ok(p) => properties.push(p),
                Err(e) => diagnostics.push(Diagnostic::warning(format!("property #{i} skipped: {e}")).at(entry_off)),
            }
            entry_off += entsize;
        }
        Ok(PropertyList { properties })
    }

    fn parse_one(data: &[u8], offset: usize, resolver: &PointerResolver) -> Result<Property> {
        let mut cursor = Cursor::at(data, offset);
        let name_raw = cursor.read_u64(Endian::Little)?;
        let attrs_raw = cursor.read_u64(Endian::Little)?;

        let name = resolver
            .resolve_local(name_raw)
            .and_then(|off| cstring_at(data, off).ok())
            .map(str::to_string)
            .unwrap_or_else(|| "<unresolved-property-name>".to_string());
        let attributes = resolver
            .resolve_local(attrs_raw)
            .and_then(|off| cstring_at(data, off).ok())
            .map(str::to_string)
            .unwrap_or_default();

        Ok(Property { name, attributes })
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
    fn parses_property_attributes() {
        let prop = Property {
            name: "name".into(),
            attributes: "T@\"NSString\",C,N,V_name".into(),
        };
        let attrs = prop.parsed_attributes();
        assert_eq!(attrs.type_encoding.as_deref(), Some("@\"NSString\""));
        assert!(attrs.copy);
        assert!(attrs.nonatomic);
        assert_eq!(attrs.ivar_name.as_deref(), Some("_name"));
        assert!(!attrs.readonly);
    }

    #[test]
    fn parses_property_list() {
        let mut data = Vec::new();
        data.extend_from_slice(&(16u32).to_le_bytes());
        data.extend_from_slice(&(1u32).to_le_bytes());
        let entry_off = data.len();
        data.extend_from_slice(&[0u8; 16]);
        let name_off = data.len();
        data.extend_from_slice(b"title\0");
        let attrs_off = data.len();
        data.extend_from_slice(b"T@\"NSString\",R,N\0");
        data[entry_off..entry_off + 8].copy_from_slice(&(name_off as u64).to_le_bytes());
        data[entry_off + 8..entry_off + 16].copy_from_slice(&(attrs_off as u64).to_le_bytes());

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
        let list = PropertyList::parse(&data, 0, &resolver, &mut diags).unwrap();
        assert_eq!(list.properties.len(), 1);
        assert_eq!(list.properties[0].name, "title");
    }
}

//! Objective-C category records (`category_t`), §4.F "Category records".

use crate::cursor::{cstring_at, Cursor, Endian};
use crate::error::{Diagnostic, Result};
use crate::objc::class::{strip_class_symbol_prefix, ClassRef};
use crate::objc::method::MethodList;
use crate::objc::property::PropertyList;
use crate::objc::protocol::ProtocolList;
use crate::pointer::{PointerResolver, ResolvedPointer};

#[derive(Debug, Clone)]
pub struct Category {
    pub name: String,
    pub target_class: ClassRef,
    pub instance_methods: Option<MethodList>,
    pub class_methods: Option<MethodList>,
    pub protocols: Vec<String>,
    pub instance_properties: Option<PropertyList>,
}

impl Category {
    pub fn parse(
        data: &[u8],
        offset: usize,
        resolver: &PointerResolver,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Result<Category> {
        let mut cursor = Cursor::at(data, offset);
        let name_raw = cursor.read_u64(Endian::Little)?;
        let cls_raw = cursor.read_u64(Endian::Little)?;
        let instance_methods_raw = cursor.read_u64(Endian::Little)?;
        let class_methods_raw = cursor.read_u64(Endian::Little)?;
        let protocols_raw = cursor.read_u64(Endian::Little)?;
        let instance_properties_raw = cursor.read_u64(Endian::Little)?;

        let name = resolver
            .resolve_local(name_raw)
            .and_then(|off| cstring_at(data, off).ok())
            .map(str::to_string)
            .unwrap_or_else(|| "<unresolved-category-name>".to_string());

        let target_class = match resolver.resolve(cls_raw) {
            ResolvedPointer::Local(off) => ClassRef::Local(off),
            ResolvedPointer::External(sym) => ClassRef::External(strip_class_symbol_prefix(&sym)),
            ResolvedPointer::Null => ClassRef::Null,
        };

        let instance_methods = resolver
            .resolve_local(instance_methods_raw)
            .and_then(|off| MethodList::parse(data, off, resolver, diagnostics).ok());
        let class_methods = resolver
            .resolve_local(class_methods_raw)
            .and_then(|off| MethodList::parse(data, off, resolver, diagnostics).ok());
        let protocols = resolver
            .resolve_local(protocols_raw)
            .map(|off| ProtocolList::parse(data, off, resolver, diagnostics))
            .transpose()?
            .map(|l| l.names)
            .unwrap_or_default();
        let instance_properties = resolver
            .resolve_local(instance_properties_raw)
            .and_then(|off| PropertyList::parse(data, off, resolver, diagnostics).ok());

        Ok(Category {
            name,
            target_class,
            instance_methods,
            class_methods,
            protocols,
            instance_properties,
        })
    }
}

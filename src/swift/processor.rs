//! Component G: walks `__swift5_types`/`__swift5_fieldmd`/`__swift5_proto`/
//! `__swift5_protos` and assembles the Swift reflection model, cross
//! referencing field descriptors against Objective-C ivars by class name.

use crate::error::Diagnostic;
use crate::macho::MachOFile;
use crate::objc::ObjCModel;
use crate::swift::conformance::{parse_conformance_list, ProtocolConformance};
use crate::swift::descriptor::{parse_type_list, TypeContextDescriptor};
use crate::swift::field::{parse_field_section, FieldDescriptor};
use crate::swift::protocol::{parse_protocol_list, SwiftProtocolDescriptor};

#[derive(Debug, Default)]
pub struct SwiftModel {
    pub types: Vec<TypeContextDescriptor>,
    pub fields: Vec<FieldDescriptor>,
    pub conformances: Vec<ProtocolConformance>,
    pub protocols: Vec<SwiftProtocolDescriptor>,
    pub diagnostics: Vec<Diagnostic>,
}

pub struct SwiftProcessor;

impl SwiftProcessor {
    /// Runs the full pass over one architecture slice. A slice with no
    /// `__swift5_*` sections yields an empty model (§4.G doesn't require
    /// Swift metadata to be present).
    pub fn process(file: &MachOFile) -> SwiftModel {
        let mut model = SwiftModel::default();

        if let Some((offset, len)) = Self::section_span(file, "__swift5_types") {
            model.types = parse_type_list(file.data, offset, len, &mut model.diagnostics);
        }
        if let Some((offset, len)) = Self::section_span(file, "__swift5_fieldmd") {
            model.fields = parse_field_section(file.data, offset, len, &mut model.diagnostics);
        }
        if let Some((offset, len)) = Self::section_span(file, "__swift5_proto") {
            model.conformances = parse_conformance_list(file.data, offset, len, &mut model.diagnostics);
        }
        if let Some((offset, len)) = Self::section_span(file, "__swift5_protos") {
            model.protocols = parse_protocol_list(file.data, offset, len);
        }

        model
    }

    fn section_span(file: &MachOFile, sectname: &str) -> Option<(usize, usize)> {
        let section = file.section_by_name(sectname)?;
        Some((section.offset as usize, section.size as usize))
    }
}

/// Cross-references Swift field descriptors against Objective-C ivars by
/// matching the descriptor's conforming-type name to a class's runtime
/// name (§4.G: classes that are both ObjC and Swift-stable appear in both
/// processors' output). Returns field names present in the field
/// descriptor but missing from the class's ivar list, which is the only
/// information the spec asks this step to surface.
pub fn fields_not_backed_by_ivars<'a>(swift: &'a SwiftModel, objc: &ObjCModel) -> Vec<(&'a str, &'a str)> {
    let mut missing = Vec::new();
    for field_desc in &swift.fields {
        let Some(type_name) = field_desc.type_name.as_deref() else {
            continue;
        };
        let short_name = type_name.rsplit('.').next().unwrap_or(type_name);
        let Some(class) = objc.classes.iter().find(|c| c.data.name == short_name) else {
            continue;
        };
        let ivar_names: Vec<&str> = class
            .data
            .ivars
            .iter()
            .flat_map(|list| list.ivars.iter().map(|iv| iv.name.as_str()))
            .collect();
        for record in &field_desc.fields {
            if !ivar_names.contains(&record.name.as_str()) {
                missing.push((short_name, record.name.as_str()));
            }
        }
    }
    missing
}

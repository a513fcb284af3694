//! Default text visitor (§4.L): walks an [`ExtractedModel`] in a stable
//! order and renders Objective-C-style header text.

use std::collections::BTreeSet;

use crate::encoding::{parse_method_type, Formatter, OutputStyle, Type, TypeKind};
use crate::objc::{Category, Class, ClassRef, Method, MethodList, Protocol};
use crate::options::{SortOrder, VisitOptions};
use crate::registry::MethodSignatureRegistry;
use crate::visitor::model::ExtractedModel;

/// Renders the model to Objective-C-style header text. `registry`, when
/// given, lets a class's or category's empty block placeholder (`@?`) be
/// upgraded to the richer signature a conforming protocol declared for the
/// same selector (§4.K "block-signature uplift", §8 property 8).
pub fn render(model: &ExtractedModel, options: &VisitOptions, file_path: &str, registry: Option<&MethodSignatureRegistry>) -> String {
    let mut out = String::new();
    render_header(&mut out, model, file_path);

    if options.emit_forward_declarations {
        render_forward_declarations(&mut out, model);
    }

    if !options.hide.protocols {
        let mut protocols: Vec<&Protocol> = model.objc.protocols.iter().collect();
        protocols.sort_by(|a, b| a.name.cmp(&b.name));
        for protocol in protocols {
            render_protocol(&mut out, protocol, options, registry);
        }
    }

    let mut classes: Vec<&Class> = model.objc.classes.iter().collect();
    match options.sort_order {
        SortOrder::Alphabetical => classes.sort_by(|a, b| a.data.name.cmp(&b.data.name)),
        SortOrder::InheritanceDepth => classes.sort_by_key(|c| inheritance_depth(c, &model.objc.classes)),
    }
    for class in &classes {
        render_class(&mut out, class, options, registry);
    }

    if !options.hide.categories {
        let mut categories: Vec<&Category> = model.objc.categories.iter().collect();
        categories.sort_by(|a, b| target_class_name(a).cmp(target_class_name(b)).then(a.name.cmp(&b.name)));
        for category in categories {
            render_category(&mut out, category, options, registry);
        }
    }

    out
}

fn render_header(out: &mut String, model: &ExtractedModel, file_path: &str) {
    out.push_str(&format!("// Generated by machodecl {}\n", env!("CARGO_PKG_VERSION")));
    out.push_str(&format!("// File: {file_path}\n"));
    out.push_str(&format!("// Architecture: {}\n", model.header.arch_name));
    if let Some(uuid) = model.header.uuid {
        out.push_str(&format!("// UUID: {}\n", format_uuid(uuid)));
    }
    if let (Some(platform), Some(sdk)) = (model.header.build_platform, model.header.sdk_version) {
        out.push_str(&format!("// Build platform: {platform}, SDK: {}\n", format_version(sdk)));
    }
    out.push('\n');
}

fn format_uuid(bytes: [u8; 16]) -> String {
    bytes.iter().map(|b| format!("{b:02X}")).collect::<Vec<_>>().join("")
}

fn format_version(packed: u32) -> String {
    format!("{}.{}.{}", packed >> 16, (packed >> 8) & 0xff, packed & 0xff)
}

fn render_forward_declarations(out: &mut String, model: &ExtractedModel) {
    let defined_classes: BTreeSet<&str> = model.objc.classes.iter().map(|c| c.data.name.as_str()).collect();
    let defined_protocols: BTreeSet<&str> = model.objc.protocols.iter().map(|p| p.name.as_str()).collect();

    let mut forward_classes = BTreeSet::new();
    for class in &model.objc.classes {
        if let ClassRef::External(name) = &class.superclass {
            if !defined_classes.contains(name.as_str()) {
                forward_classes.insert(name.as_str());
            }
        }
    }

    let mut forward_protocols = BTreeSet::new();
    for class in &model.objc.classes {
        if let Some(protos) = &class.data.base_protocols {
            for name in &protos.names {
                if !defined_protocols.contains(name.as_str()) {
                    forward_protocols.insert(name.as_str());
                }
            }
        }
    }

    if !forward_classes.is_empty() {
        out.push_str(&format!("@class {};\n", forward_classes.into_iter().collect::<Vec<_>>().join(", ")));
    }
    if !forward_protocols.is_empty() {
        out.push_str(&format!("@protocol {};\n", forward_protocols.into_iter().collect::<Vec<_>>().join(", ")));
    }
    out.push('\n');
}

fn inheritance_depth(class: &Class, all: &[Class]) -> u32 {
    let mut depth = 0;
    let mut current = class;
    let mut guard = 0;
    loop {
        guard += 1;
        if guard > 64 {
            break;
        }
        match &current.superclass {
            ClassRef::Local(offset) => match all.iter().find(|c| matches!(&c.isa, ClassRef::Local(o) if o == offset)) {
                Some(next) => {
                    depth += 1;
                    current = next;
                }
                None => break,
            },
            _ => break,
        }
    }
    depth
}

fn render_protocol(out: &mut String, protocol: &Protocol, options: &VisitOptions, registry: Option<&MethodSignatureRegistry>) {
    out.push_str(&format!("@protocol {}", protocol.name));
    if !protocol.protocols.is_empty() {
        out.push_str(&format!(" <{}>", protocol.protocols.join(", ")));
    }
    out.push('\n');
    render_method_list(out, protocol.instance_methods.as_ref(), false, options, registry);
    render_method_list(out, protocol.class_methods.as_ref(), true, options, registry);
    out.push_str("@end\n\n");
}

fn render_class(out: &mut String, class: &Class, options: &VisitOptions, registry: Option<&MethodSignatureRegistry>) {
    out.push_str(&format!("@interface {}", class.data.name));
    if let ClassRef::External(name) = &class.superclass {
        out.push_str(&format!(" : {name}"));
    }
    if !options.hide.protocols {
        if let Some(protos) = &class.data.base_protocols {
            if !protos.names.is_empty() {
                out.push_str(&format!(" <{}>", protos.names.join(", ")));
            }
        }
    }
    out.push('\n');

    if !options.hide.ivars {
        if let Some(ivars) = &class.data.ivars {
            if !ivars.ivars.is_empty() {
                out.push_str("{\n");
                for ivar in &ivars.ivars {
                    let decl = render_type_declaration(&ivar.type_encoding, &ivar.name);
                    if options.show_ivar_offsets {
                        out.push_str(&format!("  {decl}; // offset {}\n", ivar.offset));
                    } else {
                        out.push_str(&format!("  {decl};\n"));
                    }
                }
                out.push_str("}\n");
            }
        }
    }

    if !options.hide.properties {
        if let Some(properties) = &class.data.base_properties {
            for property in &properties.properties {
                let attrs = property.parsed_attributes();
                let type_encoding = attrs.type_encoding.as_deref().unwrap_or("@");
                let decl = render_type_declaration(type_encoding, &property.name);
                out.push_str(&format!("@property {decl};\n"));
            }
        }
    }

    render_method_list(out, class.data.base_methods.as_ref(), false, options, registry);
    out.push_str("@end\n\n");
}

fn target_class_name(category: &Category) -> &str {
    match &category.target_class {
        ClassRef::External(name) => name.as_str(),
        ClassRef::Local(_) | ClassRef::Null => "<unknown>",
    }
}

fn render_category(out: &mut String, category: &Category, options: &VisitOptions, registry: Option<&MethodSignatureRegistry>) {
    out.push_str(&format!("@interface {} ({})\n", target_class_name(category), category.name));
    render_method_list(out, category.instance_methods.as_ref(), false, options, registry);
    render_method_list(out, category.class_methods.as_ref(), true, options, registry);
    out.push_str("@end\n\n");
}

fn render_method_list(
    out: &mut String,
    methods: Option<&MethodList>,
    is_class_method: bool,
    options: &VisitOptions,
    registry: Option<&MethodSignatureRegistry>,
) {
    let Some(methods) = methods else {
        return;
    };
    for method in &methods.methods {
        out.push_str(&render_method_line(method, is_class_method, options, registry));
        out.push('\n');
    }
}

/// True for a block type with no recorded signature, or one whose signature
/// carries neither arguments nor a non-`void` return — the placeholder a
/// bare `@?` parses to (§4.K).
fn is_empty_block_placeholder(ty: &Type) -> bool {
    match &ty.kind {
        TypeKind::Block(None) => true,
        TypeKind::Block(Some(sig)) => sig.arguments.is_empty() && matches!(sig.return_type.kind, TypeKind::Primitive(crate::encoding::Primitive::Void)),
        _ => false,
    }
}

fn render_method_line(method: &Method, is_class_method: bool, options: &VisitOptions, registry: Option<&MethodSignatureRegistry>) -> String {
    let prefix = if is_class_method { '+' } else { '-' };
    let Ok(types) = parse_method_type(&method.type_encoding) else {
        return format!("{prefix} {};", method.selector);
    };
    let return_type = types.first().map(render_bare_type).unwrap_or_else(|| "void".to_string());
    let args: Vec<&crate::encoding::Type> = types.iter().skip(3).collect();

    let mut line = format!("{prefix} ({return_type})");
    let parts: Vec<&str> = method.selector.split(':').collect();
    if parts.len() <= 1 || args.is_empty() {
        line.push_str(&method.selector);
    } else {
        for (i, part) in parts.iter().enumerate() {
            if part.is_empty() {
                continue;
            }
            let own_type = args.get(i).copied();
            let uplifted = own_type.filter(|t| is_empty_block_placeholder(t)).and_then(|_| {
                registry
                    .and_then(|r| r.block_signature_at(&method.selector, 3 + i))
                    .and_then(|richer| richer.get(3 + i).map(render_bare_type))
            });
            let arg_type = uplifted.or_else(|| own_type.map(render_bare_type)).unwrap_or_else(|| "id".to_string());
            line.push_str(&format!("{part}:({arg_type})arg{i} "));
        }
        line = line.trim_end().to_string();
    }
    if options.show_method_addresses && method.implementation != 0 {
        line.push_str(&format!(" // imp {:#x}", method.implementation));
    }
    line.push(';');
    line
}

fn render_bare_type(ty: &crate::encoding::Type) -> String {
    Formatter::new(OutputStyle::Declaration).format_bare(ty)
}

fn render_type_declaration(encoding: &str, name: &str) -> String {
    match crate::encoding::parse_type(encoding) {
        Ok(ty) => Formatter::new(OutputStyle::Declaration).format_declaration(&ty, name),
        Err(_) => format!("id {name}"),
    }
}

//! Structured-output visitor (§9 "a JSON visitor ... implement[s] the
//! same capabilities" as the text visitor): serializes an
//! [`ExtractedModel`] into a small, stable DTO tree rather than exposing
//! the internal parse structs directly.

use serde::Serialize;

use crate::encoding::{parse_method_type, Formatter, OutputStyle};
use crate::objc::{Category, Class, ClassRef, Method, MethodList, Protocol};
use crate::options::{SortOrder, VisitOptions};
use crate::visitor::model::ExtractedModel;

#[derive(Debug, Serialize)]
pub struct JsonHeader {
    pub arch: &'static str,
    pub uuid: Option<String>,
    pub build_platform: Option<u32>,
    pub sdk_version: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct JsonMethod {
    pub selector: String,
    pub is_class_method: bool,
    pub return_type: String,
    pub argument_types: Vec<String>,
    pub implementation: Option<u64>,
}

#[derive(Debug, Serialize)]
pub struct JsonIvar {
    pub name: String,
    pub type_encoding: String,
    pub offset: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct JsonProperty {
    pub name: String,
    pub type_encoding: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct JsonClass {
    pub name: String,
    pub superclass: Option<String>,
    pub protocols: Vec<String>,
    pub ivars: Vec<JsonIvar>,
    pub properties: Vec<JsonProperty>,
    pub methods: Vec<JsonMethod>,
}

#[derive(Debug, Serialize)]
pub struct JsonProtocol {
    pub name: String,
    pub protocols: Vec<String>,
    pub methods: Vec<JsonMethod>,
}

#[derive(Debug, Serialize)]
pub struct JsonCategory {
    pub name: String,
    pub target_class: String,
    pub protocols: Vec<String>,
    pub methods: Vec<JsonMethod>,
}

#[derive(Debug, Serialize)]
pub struct JsonSwiftType {
    pub qualified_name: String,
    pub kind: String,
}

#[derive(Debug, Serialize)]
pub struct JsonModel {
    pub header: JsonHeader,
    pub classes: Vec<JsonClass>,
    pub protocols: Vec<JsonProtocol>,
    pub categories: Vec<JsonCategory>,
    pub swift_types: Vec<JsonSwiftType>,
}

pub fn build(model: &ExtractedModel, options: &VisitOptions) -> JsonModel {
    let header = JsonHeader {
        arch: model.header.arch_name,
        uuid: model.header.uuid.map(|b| b.iter().map(|x| format!("{x:02X}")).collect()),
        build_platform: model.header.build_platform,
        sdk_version: model.header.sdk_version,
    };

    let mut classes: Vec<&Class> = model.objc.classes.iter().collect();
    match options.sort_order {
        SortOrder::Alphabetical => classes.sort_by(|a, b| a.data.name.cmp(&b.data.name)),
        SortOrder::InheritanceDepth => {} // depth ordering is a text-rendering concern only
    }

    let classes = classes
        .iter()
        .map(|class| JsonClass {
            name: class.data.name.clone(),
            superclass: match &class.superclass {
                ClassRef::External(name) => Some(name.clone()),
                _ => None,
            },
            protocols: class
                .data
                .base_protocols
                .as_ref()
                .map(|p| p.names.clone())
                .unwrap_or_default(),
            ivars: if options.hide.ivars {
                Vec::new()
            } else {
                class
                    .data
                    .ivars
                    .as_ref()
                    .map(|list| {
                        list.ivars
                            .iter()
                            .map(|iv| JsonIvar {
                                name: iv.name.clone(),
                                type_encoding: iv.type_encoding.clone(),
                                offset: options.show_ivar_offsets.then_some(iv.offset),
                            })
                            .collect()
                    })
                    .unwrap_or_default()
            },
            properties: if options.hide.properties {
                Vec::new()
            } else {
                class
                    .data
                    .base_properties
                    .as_ref()
                    .map(|list| {
                        list.properties
                            .iter()
                            .map(|p| JsonProperty {
                                name: p.name.clone(),
                                type_encoding: p.parsed_attributes().type_encoding,
                            })
                            .collect()
                    })
                    .unwrap_or_default()
            },
            methods: json_methods(class.data.base_methods.as_ref(), false),
        })
        .collect();

    let protocols = if options.hide.protocols {
        Vec::new()
    } else {
        model
            .objc
            .protocols
            .iter()
            .map(|protocol| json_protocol(protocol))
            .collect()
    };

    let categories = if options.hide.categories {
        Vec::new()
    } else {
        model
            .objc
            .categories
            .iter()
            .map(|category| json_category(category))
            .collect()
    };

    let swift_types = model
        .swift
        .types
        .iter()
        .map(|t| JsonSwiftType {
            qualified_name: t.qualified_name(),
            kind: format!("{:?}", t.kind),
        })
        .collect();

    JsonModel {
        header,
        classes,
        protocols,
        categories,
        swift_types,
    }
}

fn json_protocol(protocol: &Protocol) -> JsonProtocol {
    let mut methods = json_methods(protocol.instance_methods.as_ref(), false);
    methods.extend(json_methods(protocol.class_methods.as_ref(), true));
    JsonProtocol {
        name: protocol.name.clone(),
        protocols: protocol.protocols.clone(),
        methods,
    }
}

fn json_category(category: &Category) -> JsonCategory {
    let mut methods = json_methods(category.instance_methods.as_ref(), false);
    methods.extend(json_methods(category.class_methods.as_ref(), true));
    JsonCategory {
        name: category.name.clone(),
        target_class: match &category.target_class {
            ClassRef::External(name) => name.clone(),
            _ => "<unknown>".to_string(),
        },
        protocols: category.protocols.clone(),
        methods,
    }
}

fn json_methods(methods: Option<&MethodList>, is_class_method: bool) -> Vec<JsonMethod> {
    let Some(methods) = methods else {
        return Vec::new();
    };
    methods.methods.iter().map(|m| json_method(m, is_class_method)).collect()
}

fn json_method(method: &Method, is_class_method: bool) -> JsonMethod {
    let formatter = Formatter::new(OutputStyle::Declaration);
    let (return_type, argument_types) = match parse_method_type(&method.type_encoding) {
        Ok(types) => {
            let return_type = types.first().map(|t| formatter.format_bare(t)).unwrap_or_else(|| "void".to_string());
            let args = types.iter().skip(3).map(|t| formatter.format_bare(t)).collect();
            (return_type, args)
        }
        Err(_) => ("id".to_string(), Vec::new()),
    };
    JsonMethod {
        selector: method.selector.clone(),
        is_class_method,
        return_type,
        argument_types,
        implementation: (method.implementation != 0).then_some(method.implementation),
    }
}

pub fn render(model: &ExtractedModel, options: &VisitOptions) -> serde_json::Result<String> {
    serde_json::to_string_pretty(&build(model, options))
}

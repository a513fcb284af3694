//! End-to-end scenarios over hand-assembled Mach-O byte buffers and
//! directly-constructed Objective-C models, one per documented scenario.

mod common;

use machodecl::arch::Arch;
use machodecl::container::Container;
use machodecl::demangle::demangle;
use machodecl::macho::consts::{
    CPU_SUBTYPE_ARM64E, CPU_SUBTYPE_ARM_V7, CPU_SUBTYPE_ARM_V7S, CPU_SUBTYPE_X86_64_ALL, CPU_TYPE_ARM, CPU_TYPE_ARM64, CPU_TYPE_X86_64, FAT_MAGIC,
};
use machodecl::objc::class::ClassData;
use machodecl::objc::{Class, ClassRef, Method, MethodList, ObjCModel, Protocol};
use machodecl::options::{ReadOptions, VisitOptions};
use machodecl::pipeline::{extract, index};
use machodecl::swift::SwiftModel;
use machodecl::visitor::model::{ExtractedModel, FileHeader};
use machodecl::visitor::text::render;

/// A thin x86_64 executable with one class, `Foo : NSObject`, whose
/// superclass is resolved through a single-import chained fixup.
#[test]
fn s1_thin_x86_64_class_with_external_superclass() {
    let has_fixups = true;
    let classlist_len = 8u32;
    let base = common::blob_base(classlist_len, has_fixups);

    let mut blob = Vec::new();
    let methods_addr = common::append_method_list(&mut blob, base, &[("bar", "v16@0:8")]);
    let ro_addr = common::append_class_ro(&mut blob, base, "Foo", methods_addr as u64, 0);
    // DYLD_CHAINED_PTR_64 bind word: top bit set, ordinal 0.
    let superclass_raw = 1u64 << 63;
    let class_addr = common::append_class(&mut blob, base, superclass_raw, ro_addr);

    let mut classlist = Vec::new();
    common::push_u64(&mut classlist, class_addr as u64);
    assert_eq!(classlist.len() as u32, classlist_len);

    let fixups_payload = common::build_single_import_fixups("_OBJC_CLASS_$_NSObject");
    let data = common::build_thin_macho(CPU_TYPE_X86_64, CPU_SUBTYPE_X86_64_ALL, &classlist, &blob, Some(&fixups_payload));

    let model = extract(&data, &ReadOptions::default()).expect("extraction succeeds");
    assert_eq!(model.objc.classes.len(), 1);
    assert_eq!(model.objc.classes[0].data.name, "Foo");
    assert_eq!(model.objc.classes[0].superclass, ClassRef::External("NSObject".to_string()));

    let text = render(&model, &VisitOptions::default(), "foo.o", None);
    assert!(text.contains("@interface Foo : NSObject"), "{text}");
    assert!(text.contains("- (void)bar;"), "{text}");
    assert!(text.contains("@end"), "{text}");
}

/// A fat binary carrying armv7 and armv7s slices; the exact subtype must
/// win over the family fallback.
#[test]
fn s2_fat_binary_selects_exact_architecture_slice() {
    let header_len = 8 + 2 * 20;
    let mut data = Vec::new();
    data.extend_from_slice(&FAT_MAGIC.to_be_bytes());
    data.extend_from_slice(&2u32.to_be_bytes());
    for (cpu_type, cpu_subtype, offset, size) in [
        (CPU_TYPE_ARM, CPU_SUBTYPE_ARM_V7, header_len as u32, 4u32),
        (CPU_TYPE_ARM, CPU_SUBTYPE_ARM_V7S, header_len as u32 + 4, 4u32),
    ] {
        data.extend_from_slice(&cpu_type.to_be_bytes());
        data.extend_from_slice(&cpu_subtype.to_be_bytes());
        data.extend_from_slice(&offset.to_be_bytes());
        data.extend_from_slice(&size.to_be_bytes());
        data.extend_from_slice(&0u32.to_be_bytes());
    }
    data.extend_from_slice(b"7777");
    data.extend_from_slice(b"7s7s");

    let container = Container::parse(&data).expect("parses as a fat container");
    assert_eq!(container.arch_names(), vec!["armv7", "armv7s"]);

    let requested = Arch::from_name("armv7s").expect("armv7s is a known architecture name");
    let slice = container.best_match(requested).expect("exact match present");
    assert_eq!(slice, b"7s7s");
}

/// An arm64e binary whose superclass bind word uses the ARM64E pointer
/// format rather than the plain 64-bit one.
#[test]
fn s3_arm64e_binary_with_chained_fixups() {
    let has_fixups = true;
    let classlist_len = 8u32;
    let base = common::blob_base(classlist_len, has_fixups);

    let mut blob = Vec::new();
    let ro_addr = common::append_class_ro(&mut blob, base, "Bar", 0, 0);
    // DYLD_CHAINED_PTR_ARM64E bind word: bit 62 set, ordinal 0.
    let superclass_raw = 1u64 << 62;
    let class_addr = common::append_class(&mut blob, base, superclass_raw, ro_addr);

    let mut classlist = Vec::new();
    common::push_u64(&mut classlist, class_addr as u64);

    let fixups_payload = common::build_single_import_fixups("_OBJC_CLASS_$_NSArray");
    let data = common::build_thin_macho(CPU_TYPE_ARM64, CPU_SUBTYPE_ARM64E, &classlist, &blob, Some(&fixups_payload));

    let model = extract(&data, &ReadOptions::default()).expect("extraction succeeds");
    assert_eq!(model.objc.classes.len(), 1);
    assert_eq!(model.objc.classes[0].superclass, ClassRef::External("NSArray".to_string()));

    let text = render(&model, &VisitOptions::default(), "bar.o", None);
    assert!(text.contains("@interface Bar : NSArray"), "{text}");
}

/// An old-style mangled class name nested one level under its module.
#[test]
fn s4_demangles_old_style_nested_class_name() {
    assert_eq!(demangle("_TtC13IDEFoundation16IDEActionHistory"), "IDEFoundation.IDEActionHistory");
}

/// Swift-5 dictionary-of-array sugar.
#[test]
fn s5_demangles_swift5_dictionary_of_array_sugar() {
    assert_eq!(demangle("SDySSSaySiGG"), "[String: [Int]]");
}

/// Swift concurrency sugar: `Task<Void, Never>`.
#[test]
fn s6_demangles_task_with_void_and_never() {
    assert_eq!(demangle("ScTyytNeverG"), "Task<Void, Never>");
}

fn method(selector: &str, type_encoding: &str) -> Method {
    Method {
        selector: selector.to_string(),
        type_encoding: type_encoding.to_string(),
        implementation: 0,
        selector_unresolved: false,
    }
}

/// A class's own `@?`-placeholder block argument is upgraded to the
/// richer signature its conforming protocol declared for the same
/// selector.
#[test]
fn s7_uplifts_block_signature_from_conforming_protocol() {
    let protocol = Protocol {
        name: "Fetching".to_string(),
        protocols: vec![],
        instance_methods: Some(MethodList {
            is_small: false,
            methods: vec![method("fetchWithCompletion:", "v32@0:8@?16")],
        }),
        class_methods: None,
        optional_instance_methods: None,
        optional_class_methods: None,
        instance_properties: None,
        extended_method_types: vec!["v32@0:8@?<v@>16".to_string()],
    };

    let class = Class {
        isa: ClassRef::Null,
        superclass: ClassRef::External("NSObject".to_string()),
        is_swift_stable: false,
        data: ClassData {
            flags: 0,
            instance_start: 0,
            instance_size: 0,
            name: "Fetcher".to_string(),
            base_methods: Some(MethodList {
                is_small: false,
                methods: vec![method("fetchWithCompletion:", "v32@0:8@?16")],
            }),
            base_protocols: None,
            ivars: None,
            base_properties: None,
        },
    };

    let model = ExtractedModel {
        header: FileHeader {
            arch_name: "arm64",
            uuid: None,
            build_platform: None,
            sdk_version: None,
        },
        objc: ObjCModel {
            classes: vec![class],
            protocols: vec![protocol],
            ..ObjCModel::default()
        },
        swift: SwiftModel::default(),
    };

    let (registry, _structures) = index(&model);
    let text = render(&model, &VisitOptions::default(), "fetcher.o", Some(&registry));
    assert!(text.contains("(void (^)(id))arg0"), "{text}");
    assert!(!text.contains("(void (^)())arg0"), "{text}");
}

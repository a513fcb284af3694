//! Component K: cross-indexes built from the Objective-C and Swift models
//! — a method-signature registry keyed by selector, and a structure
//! registry that accumulates the richest observed definition per name.

use parking_lot::RwLock;
use std::collections::HashMap;

use crate::encoding::{parse_method_type, Type, TypeKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignatureSource {
    Protocol,
    Class,
    Category,
}

impl SignatureSource {
    /// Lower sorts first: protocol wins over class, class wins over
    /// category (§4.K: "protocol sources win over class and category").
    fn priority(self) -> u8 {
        match self {
            SignatureSource::Protocol => 0,
            SignatureSource::Class => 1,
            SignatureSource::Category => 2,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SignatureEntry {
    pub type_encoding: String,
    pub source: SignatureSource,
}

/// `selector → [entry]`, single-writer-at-a-time via an internal lock
/// (§5: "concurrency-safe ... single-writer-at-a-time semantics").
#[derive(Default)]
pub struct MethodSignatureRegistry {
    entries: RwLock<HashMap<String, Vec<SignatureEntry>>>,
}

impl MethodSignatureRegistry {
    pub fn new() -> Self {
        MethodSignatureRegistry::default()
    }

    pub fn record(&self, selector: &str, type_encoding: &str, source: SignatureSource) {
        let mut entries = self.entries.write();
        entries.entry(selector.to_string()).or_default().push(SignatureEntry {
            type_encoding: type_encoding.to_string(),
            source,
        });
    }

    /// Returns the parsed types of the first entry (sorted protocol-first)
    /// whose argument at `arg_index` parses into a block with a non-empty
    /// signature (§4.K).
    pub fn block_signature_at(&self, selector: &str, arg_index: usize) -> Option<Vec<Type>> {
        let entries = self.entries.read();
        let mut candidates: Vec<&SignatureEntry> = entries.get(selector)?.iter().collect();
        candidates.sort_by_key(|e| e.source.priority());

        for entry in candidates {
            let Ok(types) = parse_method_type(&entry.type_encoding) else {
                continue;
            };
            let Some(arg_type) = types.get(arg_index) else {
                continue;
            };
            if let TypeKind::Block(Some(sig)) = &arg_type.kind {
                if !sig.arguments.is_empty() || !matches!(sig.return_type.kind, TypeKind::Primitive(crate::encoding::Primitive::Void)) {
                    return Some(types);
                }
            }
        }
        None
    }

    pub fn selectors(&self) -> Vec<String> {
        self.entries.read().keys().cloned().collect()
    }
}

/// Fixed platform typedef table (§4.K), consulted before falling back to
/// `struct`/`union` rendering for an unresolved forward declaration.
pub fn platform_typedef(name: &str, pointer_width: u8) -> Option<&'static str> {
    Some(match name {
        "CGFloat" => "double",
        "NSInteger" if pointer_width == 8 => "long",
        "NSInteger" => "int",
        "NSUInteger" if pointer_width == 8 => "unsigned long",
        "NSUInteger" => "unsigned int",
        "BOOL" => "signed char",
        _ => return None,
    })
}

#[derive(Debug, Clone)]
struct StructureRecord {
    member_count: usize,
    definition: Type,
}

/// Accumulates the richest observed body for each named struct/union,
/// where "richest" means most members (§4.K).
#[derive(Default)]
pub struct StructureRegistry {
    records: RwLock<HashMap<String, StructureRecord>>,
}

impl StructureRegistry {
    pub fn new() -> Self {
        StructureRegistry::default()
    }

    pub fn observe(&self, name: &str, ty: &Type) {
        let member_count = match &ty.kind {
            TypeKind::Structure { members, .. } | TypeKind::Union { members, .. } => members.len(),
            _ => return,
        };
        let mut records = self.records.write();
        let replace = match records.get(name) {
            Some(existing) => member_count > existing.member_count,
            None => true,
        };
        if replace {
            records.insert(
                name.to_string(),
                StructureRecord {
                    member_count,
                    definition: ty.clone(),
                },
            );
        }
    }

    /// Replaces a forward-declared structure reference with its richest
    /// known body. Guards against cycles via `visited`, returning the
    /// input type unchanged once a name repeats (§4.K).
    pub fn resolve(&self, ty: &Type, visited: &mut std::collections::HashSet<String>) -> Type {
        let name = match &ty.kind {
            TypeKind::Structure { name: Some(n), .. } | TypeKind::Union { name: Some(n), .. } => n.clone(),
            _ => return ty.clone(),
        };
        if visited.contains(&name) {
            return ty.clone();
        }
        visited.insert(name.clone());

        let records = self.records.read();
        match records.get(&name) {
            Some(record) => record.definition.clone(),
            None => ty.clone(),
        }
    }

    /// Folds another registry's richest definitions into this one,
    /// preserving the "richest observed definition" policy across a
    /// per-worker merge (§5).
    pub fn merge(&self, other: &StructureRegistry) {
        let other_records = other.records.read();
        let mut records = self.records.write();
        for (name, record) in other_records.iter() {
            let replace = match records.get(name) {
                Some(existing) => record.member_count > existing.member_count,
                None => true,
            };
            if replace {
                records.insert(name.clone(), record.clone());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoding::parse_type;

    #[test]
    fn skips_entries_without_a_usable_block_signature() {
        let registry = MethodSignatureRegistry::new();
        registry.record("run:", "v24@0:8@?16", SignatureSource::Class);
        registry.record("run:", "v32@0:8@?<v@0>20", SignatureSource::Protocol);

        let types = registry.block_signature_at("run:", 3).expect("protocol entry has a usable block at index 3");
        assert!(matches!(types[3].kind, TypeKind::Block(Some(_))));
    }

    #[test]
    fn structure_registry_keeps_richest_definition() {
        let registry = StructureRegistry::new();
        let sparse = parse_type("{Point=}").unwrap();
        let rich = parse_type("{Point=ff}").unwrap();
        registry.observe("Point", &sparse);
        registry.observe("Point", &rich);
        let mut visited = std::collections::HashSet::new();
        let resolved = registry.resolve(&sparse, &mut visited);
        match resolved.kind {
            TypeKind::Structure { members, .. } => assert_eq!(members.len(), 2),
            other => panic!("expected structure, got {other:?}"),
        }
    }

    #[test]
    fn platform_typedefs_resolve_by_pointer_width() {
        assert_eq!(platform_typedef("CGFloat", 8), Some("double"));
        assert_eq!(platform_typedef("NSInteger", 8), Some("long"));
        assert_eq!(platform_typedef("NSInteger", 4), Some("int"));
    }
}

//! Component I: renders a parsed [`Type`] back to source-like text.
//!
//! Two registers are supported: `OutputStyle::ObjC` reproduces the literal
//! runtime encoding (used by round-trip tests and the `--hide-encoding`
//! complement), and `OutputStyle::Declaration` produces a C-style variable
//! declaration of the form `<type> <name>` the way a header would read.

use crate::encoding::types::{BlockSignature, Member, Modifier, Primitive, Type, TypeKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputStyle {
    /// Reproduces the runtime type-encoding string verbatim.
    ObjC,
    /// Emits a C-style declaration: `NSString *name`, `struct CGRect name`.
    Declaration,
}

pub struct Formatter {
    style: OutputStyle,
}

impl Formatter {
    pub fn new(style: OutputStyle) -> Self {
        Formatter { style }
    }

    /// Formats a type with no variable name attached (used for round-trip
    /// tests and for elements like array members or block arguments).
    pub fn format_bare(&self, ty: &Type) -> String {
        match self.style {
            OutputStyle::ObjC => self.encode(ty),
            OutputStyle::Declaration => self.declare(ty, ""),
        }
    }

    /// Formats `<type> <name>`, e.g. for a property or method argument.
    pub fn format_declaration(&self, ty: &Type, name: &str) -> String {
        match self.style {
            OutputStyle::ObjC => format!("{} {}", self.encode(ty), name),
            OutputStyle::Declaration => self.declare(ty, name),
        }
    }

    // --- ObjC runtime-encoding round trip -------------------------------

    fn encode(&self, ty: &Type) -> String {
        let mut out = String::new();
        for m in &ty.modifiers {
            out.push(Self::modifier_char(m));
        }
        out.push_str(&self.encode_kind(&ty.kind));
        out
    }

    fn modifier_char(m: &Modifier) -> char {
        match m {
            Modifier::Const => 'r',
            Modifier::In => 'n',
            Modifier::Inout => 'N',
            Modifier::Out => 'o',
            Modifier::Bycopy => 'O',
            Modifier::Byref => 'R',
            Modifier::Oneway => 'V',
            Modifier::Complex => 'j',
            Modifier::Atomic => 'A',
        }
    }

    fn encode_kind(&self, kind: &TypeKind) -> String {
        match kind {
            TypeKind::Primitive(p) => Self::primitive_char(p).to_string(),
            TypeKind::Id { class_name, protocols } => match (class_name, protocols.is_empty()) {
                (None, true) => "@".to_string(),
                (class, _) => {
                    let name = class.clone().unwrap_or_default();
                    if protocols.is_empty() {
                        format!("@\"{name}\"")
                    } else {
                        format!("@\"{name}<{}>\"", protocols.join(","))
                    }
                }
            },
            TypeKind::Pointer(inner) => format!("^{}", self.encode(inner)),
            TypeKind::Array(n, inner) => format!("[{n}{}]", self.encode(inner)),
            TypeKind::Structure { name, members } => self.encode_aggregate('{', '}', name, members),
            TypeKind::Union { name, members } => self.encode_aggregate('(', ')', name, members),
            TypeKind::Bitfield(n) => format!("b{n}"),
            TypeKind::FunctionPointer => "^?".to_string(),
            TypeKind::Block(sig) => match sig {
                None => "@?".to_string(),
                Some(sig) => format!("@?<{}>", self.encode_block_signature(sig)),
            },
        }
    }

    fn encode_aggregate(&self, open: char, close: char, name: &Option<String>, members: &[Member]) -> String {
        let mut out = String::new();
        out.push(open);
        if let Some(n) = name {
            out.push_str(n);
        }
        if !members.is_empty() {
            out.push('=');
            for m in members {
                out.push_str(&self.encode(&m.ty));
            }
        }
        out.push(close);
        out
    }

    fn encode_block_signature(&self, sig: &BlockSignature) -> String {
        let mut parts = vec![self.encode(&sig.return_type)];
        parts.extend(sig.arguments.iter().map(|t| self.encode(t)));
        parts.join("")
    }

    fn primitive_char(p: &Primitive) -> char {
        match p {
            Primitive::Char => 'c',
            Primitive::UnsignedChar => 'C',
            Primitive::Short => 's',
            Primitive::UnsignedShort => 'S',
            Primitive::Int => 'i',
            Primitive::UnsignedInt => 'I',
            Primitive::Long => 'l',
            Primitive::UnsignedLong => 'L',
            Primitive::LongLong => 'q',
            Primitive::UnsignedLongLong => 'Q',
            Primitive::Float => 'f',
            Primitive::Double => 'd',
            Primitive::LongDouble => 'D',
            Primitive::Bool => 'B',
            Primitive::Void => 'v',
            Primitive::CString => '*',
            Primitive::ObjcClass => '#',
            Primitive::Selector => ':',
            Primitive::Unknown => '?',
            Primitive::Atom => '%',
            Primitive::Int128 => 't',
            Primitive::UInt128 => 'T',
        }
    }

    // --- C-style declaration ---------------------------------------------

    fn declare(&self, ty: &Type, name: &str) -> String {
        let prefix = ty
            .modifiers
            .iter()
            .map(|m| format!("{} ", m.keyword()))
            .collect::<String>();
        let (base, decorated_name) = self.declare_kind(&ty.kind, name);
        if decorated_name.is_empty() {
            format!("{prefix}{base}")
        } else {
            format!("{prefix}{base} {decorated_name}")
        }
    }

    /// Returns `(base_type_text, name_with_any_pointer/array_decoration)`.
    fn declare_kind(&self, kind: &TypeKind, name: &str) -> (String, String) {
        match kind {
            TypeKind::Primitive(p) => (Self::primitive_c_name(p).to_string(), name.to_string()),
            TypeKind::Id { class_name, protocols } => {
                let base = class_name.clone().unwrap_or_else(|| "id".to_string());
                let base = if protocols.is_empty() {
                    base
                } else {
                    format!("{base}<{}>", protocols.join(", "))
                };
                let star = if class_name.is_some() { " *" } else { " " };
                (base, format!("{}{}", star.trim_start(), name))
            }
            TypeKind::Pointer(inner) => {
                if let TypeKind::Primitive(Primitive::Char) = inner.kind {
                    ("char".to_string(), format!("*{name}"))
                } else {
                    let (base, inner_name) = self.declare_kind(&inner.kind, &format!("*{name}"));
                    (base, inner_name)
                }
            }
            TypeKind::Array(n, inner) => {
                let (base, _) = self.declare_kind(&inner.kind, "");
                (base, format!("{name}[{n}]"))
            }
            TypeKind::Structure { name: sname, .. } => (
                format!("struct {}", sname.clone().unwrap_or_else(|| "<anon>".to_string())),
                name.to_string(),
            ),
            TypeKind::Union { name: uname, .. } => (
                format!("union {}", uname.clone().unwrap_or_else(|| "<anon>".to_string())),
                name.to_string(),
            ),
            TypeKind::Bitfield(n) => ("unsigned int".to_string(), format!("{name} : {n}")),
            TypeKind::FunctionPointer => ("void *".to_string(), name.to_string()),
            TypeKind::Block(sig) => {
                let args = sig
                    .as_ref()
                    .map(|s| {
                        s.arguments
                            .iter()
                            .map(|a| self.format_bare(a))
                            .collect::<Vec<_>>()
                            .join(", ")
                    })
                    .unwrap_or_default();
                let ret = sig
                    .as_ref()
                    .map(|s| self.format_bare(&s.return_type))
                    .unwrap_or_else(|| "void".to_string());
                (format!("{ret} (^{name})({args})"), String::new())
            }
        }
    }

    fn primitive_c_name(p: &Primitive) -> &'static str {
        match p {
            Primitive::Char => "char",
            Primitive::UnsignedChar => "unsigned char",
            Primitive::Short => "short",
            Primitive::UnsignedShort => "unsigned short",
            Primitive::Int => "int",
            Primitive::UnsignedInt => "unsigned int",
            Primitive::Long => "long",
            Primitive::UnsignedLong => "unsigned long",
            Primitive::LongLong => "long long",
            Primitive::UnsignedLongLong => "unsigned long long",
            Primitive::Float => "float",
            Primitive::Double => "double",
            Primitive::LongDouble => "long double",
            Primitive::Bool => "BOOL",
            Primitive::Void => "void",
            Primitive::CString => "char *",
            Primitive::ObjcClass => "Class",
            Primitive::Selector => "SEL",
            Primitive::Unknown => "void *",
            Primitive::Atom => "void *",
            Primitive::Int128 => "__int128",
            Primitive::UInt128 => "unsigned __int128",
        }
    }
}

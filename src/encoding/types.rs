//! The parsed Objective-C type tree (§3 "Parsed ObjC type").

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Primitive {
    Char,
    UnsignedChar,
    Short,
    UnsignedShort,
    Int,
    UnsignedInt,
    Long,
    UnsignedLong,
    LongLong,
    UnsignedLongLong,
    Float,
    Double,
    LongDouble,
    Bool,
    Void,
    CString,
    ObjcClass,
    Selector,
    Unknown,
    Atom,
    Int128,
    UInt128,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    pub ty: Box<Type>,
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Modifier {
    Const,
    In,
    Inout,
    Out,
    Bycopy,
    Byref,
    Oneway,
    Complex,
    Atomic,
}

impl Modifier {
    pub fn keyword(&self) -> &'static str {
        match self {
            Modifier::Const => "const",
            Modifier::In => "in",
            Modifier::Inout => "inout",
            Modifier::Out => "out",
            Modifier::Bycopy => "bycopy",
            Modifier::Byref => "byref",
            Modifier::Oneway => "oneway",
            Modifier::Complex => "_Complex",
            Modifier::Atomic => "_Atomic",
        }
    }
}

/// A block's method-type signature: return type followed by argument
/// types, already stripped of `self`/`_cmd` if it came from a method list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockSignature {
    pub return_type: Box<Type>,
    pub arguments: Vec<Type>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeKind {
    Primitive(Primitive),
    Id {
        class_name: Option<String>,
        protocols: Vec<String>,
    },
    Pointer(Box<Type>),
    Array(u64, Box<Type>),
    Structure {
        name: Option<String>,
        members: Vec<Member>,
    },
    Union {
        name: Option<String>,
        members: Vec<Member>,
    },
    Bitfield(u64),
    FunctionPointer,
    Block(Option<BlockSignature>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Type {
    pub modifiers: Vec<Modifier>,
    pub kind: TypeKind,
}

impl Type {
    pub fn new(kind: TypeKind) -> Type {
        Type {
            modifiers: Vec::new(),
            kind,
        }
    }

    pub fn with_modifier(mut self, m: Modifier) -> Type {
        self.modifiers.push(m);
        self
    }

    pub fn primitive(p: Primitive) -> Type {
        Type::new(TypeKind::Primitive(p))
    }

    pub fn is_object_pointer(&self) -> bool {
        matches!(self.kind, TypeKind::Id { .. })
    }
}

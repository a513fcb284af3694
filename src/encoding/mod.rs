//! Objective-C type-encoding grammar: lexer, parser, type tree, formatter
//! (§4.H, §4.H+, §4.I).

pub mod formatter;
pub mod lexer;
pub mod parser;
pub mod types;

pub use formatter::{Formatter, OutputStyle};
pub use parser::{parse_method_type, parse_type};
pub use types::{BlockSignature, Member, Modifier, Primitive, Type, TypeKind};

//! Closure-type demangling: trailing convention markers and escaping
//! closures (§4.J "Closure types").

use crate::demangle::generics::parse_type;
use crate::demangle::grammar::MangledReader;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClosureConvention {
    Swift,
    Block,
    CFunction,
    Noescape,
    Thin,
}

#[derive(Debug, Clone)]
pub struct ClosureType {
    pub parameters: Vec<String>,
    pub return_type: String,
    pub convention: ClosureConvention,
    pub is_async: bool,
    pub throws: bool,
}

impl ClosureType {
    pub fn to_swift(&self) -> String {
        let params = self.parameters.join(", ");
        let mut effects = String::new();
        if matches!(self.convention, ClosureConvention::Swift) {
            effects.push_str("@escaping ");
        }
        if self.is_async {
            effects.push_str("async ");
        }
        if self.throws {
            effects.push_str("throws ");
        }
        format!("{effects}({params}) -> {}", self.return_type)
    }

    pub fn to_objc_block_style(&self) -> String {
        format!("{} (^)({})", self.return_type, self.parameters.join(", "))
    }
}

/// Parses a closure record: parameter types, return type, then a trailing
/// convention marker (`c`/`XB`/`XC`/`XE`/`Xf`) and effect markers.
pub fn parse_closure(r: &mut MangledReader) -> Option<ClosureType> {
    let mut parameters = Vec::new();
    while r.peek() != Some(b'y') && !r.is_empty() {
        parameters.push(parse_type(r)?);
    }
    if !r.eat(b'y') {
        return None;
    }
    let return_type = parse_type(r)?;

    let is_async = r.eat_str("Ya");
    let throws = r.eat(b'K');

    let convention = if r.eat_str("XB") {
        ClosureConvention::Block
    } else if r.eat_str("XC") {
        ClosureConvention::CFunction
    } else if r.eat_str("XE") {
        ClosureConvention::Noescape
    } else if r.eat_str("Xf") {
        ClosureConvention::Thin
    } else if r.eat(b'c') {
        ClosureConvention::Swift
    } else {
        ClosureConvention::Swift
    };

    Some(ClosureType {
        parameters,
        return_type,
        convention,
        is_async,
        throws,
    })
}

//! Swift name demangler (§4.J): recognizes old-style (`_TtC…`) and
//! Swift-5 (`_$s…`/`$s…`) manglings for classes, structs, enums,
//! protocols, and function signatures; anything unrecognized is returned
//! unchanged.

pub mod closures;
pub mod concurrency;
pub mod functions;
pub mod generic_signature;
pub mod generics;
pub mod grammar;
pub mod oracle;
pub mod substitutions;

use crate::demangle::functions::{parse_function_signature, FunctionSignature};
use crate::demangle::generics::parse_type;
use crate::demangle::grammar::MangledReader;
pub use crate::demangle::oracle::DemangleOracle;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DemangledKind {
    Class,
    Struct,
    Enum,
    Protocol,
    Function,
    Type,
}

#[derive(Debug, Clone)]
pub struct DemangledName {
    pub kind: DemangledKind,
    pub display: String,
}

/// Attempts every recognized entry point in turn. Returns `None` rather
/// than the raw input when nothing matches, so callers can distinguish
/// "demangled" from "passthrough" (`demangle` below collapses that
/// distinction for display purposes).
pub fn try_demangle(input: &str) -> Option<DemangledName> {
    let result = if let Some(rest) = strip_swift5_prefix(input) {
        demangle_swift5(rest)
    } else if let Some(rest) = input.strip_prefix("_TtP") {
        demangle_old_protocol(rest)
    } else if let Some(rest) = input.strip_prefix("_TtGC") {
        demangle_old_generic_class(rest)
    } else if let Some(rest) = input.strip_prefix("_TtO") {
        demangle_old_nominal(rest, DemangledKind::Enum)
    } else if let Some(rest) = input.strip_prefix("_TtV") {
        demangle_old_nominal(rest, DemangledKind::Struct)
    } else if let Some(rest) = strip_old_class_prefix(input) {
        demangle_old_class(rest)
    } else {
        demangle_bare_sugar(input)
    }?;

    if looks_like_leaked_mangling(&result.display) {
        None
    } else {
        Some(result)
    }
}

/// Generic "demangle for output" entry point: returns the demangled display
/// form, or the original input unchanged if nothing recognizable is found
/// (§4.J).
pub fn demangle(input: &str) -> String {
    try_demangle(input).map(|d| d.display).unwrap_or_else(|| input.to_string())
}

fn strip_swift5_prefix(input: &str) -> Option<&str> {
    input.strip_prefix("_$s").or_else(|| input.strip_prefix("$s"))
}

/// `_TtC`, `_TtCC`, `_TtCCC`, … — each extra `C` beyond the first means one
/// more level of nesting in the class's containing-type path.
fn strip_old_class_prefix(input: &str) -> Option<&str> {
    let rest = input.strip_prefix("_TtC")?;
    Some(rest)
}

fn demangle_old_class(rest: &str) -> Option<DemangledName> {
    let mut nesting = 0u32;
    let mut r = MangledReader::new(rest);
    while r.peek() == Some(b'C') {
        r.advance();
        nesting += 1;
    }
    let module = r.read_identifier()?;
    let mut path = vec![module];
    for _ in 0..=nesting {
        if matches!(r.peek(), Some(c) if c.is_ascii_digit()) {
            path.push(r.read_identifier()?);
        } else {
            break;
        }
    }
    Some(DemangledName {
        kind: DemangledKind::Class,
        display: path.join("."),
    })
}

fn demangle_old_nominal(rest: &str, kind: DemangledKind) -> Option<DemangledName> {
    let mut r = MangledReader::new(rest);
    let module = r.read_identifier()?;
    let name = r.read_identifier()?;
    Some(DemangledName {
        kind,
        display: format!("{module}.{name}"),
    })
}

fn demangle_old_protocol(rest: &str) -> Option<DemangledName> {
    let mut r = MangledReader::new(rest);
    let module = r.read_identifier()?;
    let name = r.read_identifier()?;
    if !r.eat(b'_') {
        return None;
    }
    Some(DemangledName {
        kind: DemangledKind::Protocol,
        display: format!("{module}.{name}"),
    })
}

fn demangle_old_generic_class(rest: &str) -> Option<DemangledName> {
    let mut r = MangledReader::new(rest);
    let module = r.read_identifier()?;
    let name = r.read_identifier()?;
    let mut args = Vec::new();
    while !matches!(r.peek(), Some(b'_') | Some(b'G') | None) {
        args.push(parse_type(&mut r)?);
    }
    r.advance();
    let display = if args.is_empty() {
        format!("{module}.{name}")
    } else {
        format!("{module}.{name}<{}>", args.join(", "))
    };
    Some(DemangledName {
        kind: DemangledKind::Class,
        display,
    })
}

fn demangle_swift5(rest: &str) -> Option<DemangledName> {
    if rest.ends_with('F') {
        let mut r = MangledReader::new(&rest[..rest.len() - 1]);
        let sig = parse_function_signature(&mut r)?;
        return Some(DemangledName {
            kind: DemangledKind::Function,
            display: sig.to_swift(),
        });
    }

    let (kind, body) = if let Some(b) = rest.strip_suffix('C') {
        (DemangledKind::Class, b)
    } else if let Some(b) = rest.strip_suffix('V') {
        (DemangledKind::Struct, b)
    } else if let Some(b) = rest.strip_suffix('O') {
        (DemangledKind::Enum, b)
    } else if let Some(b) = rest.strip_suffix('P') {
        (DemangledKind::Protocol, b)
    } else {
        let mut r = MangledReader::new(rest);
        let ty = parse_type(&mut r)?;
        return Some(DemangledName {
            kind: DemangledKind::Type,
            display: ty,
        });
    };

    let mut r = MangledReader::new(body);
    let path = r.read_dotted_path()?;
    Some(DemangledName { kind, display: path })
}

/// Falls back to the Swift-5 sugar/type grammar on a string with no
/// recognized mangling prefix at all (a symbol table can hand back a
/// mangling with its `$s` already stripped). Requires the grammar to
/// consume the whole string, so ordinary unmangled identifiers — which
/// the type-atom dispatch rejects outright unless they happen to open
/// with a grammar character like `S` — fall through instead of matching
/// a short prefix of themselves.
fn demangle_bare_sugar(input: &str) -> Option<DemangledName> {
    let mut r = MangledReader::new(input);
    let ty = parse_type(&mut r)?;
    if !r.is_empty() {
        return None;
    }
    Some(DemangledName {
        kind: DemangledKind::Type,
        display: ty,
    })
}

/// Matches a display string that still starts with a raw sugar or
/// concurrency mangling token (`Say`, `SDy`, a bare `Sc<letter>` with no
/// rendered arguments) instead of the expanded form the parser should have
/// produced.
static LEAKED_MANGLING: once_cell::sync::Lazy<regex::Regex> =
    once_cell::sync::Lazy::new(|| regex::Regex::new(r"^(Say|SDy|Sc[A-Za-z]?$)").expect("static pattern is valid"));

fn looks_like_leaked_mangling(display: &str) -> bool {
    display.is_empty() || display.contains("<unresolved>") || LEAKED_MANGLING.is_match(display)
}

/// Renders a [`FunctionSignature`] the way the visitor does for method
/// lines recovered from demangled names, reused by `§4.L`.
pub fn function_display(sig: &FunctionSignature, objc_style: bool) -> String {
    if objc_style {
        sig.to_objc_style()
    } else {
        sig.to_swift()
    }
}

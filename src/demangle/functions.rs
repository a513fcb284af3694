//! Function signature demangling for Swift-5 mangled names ending in `F`
//! (§4.J "Function signatures").

use crate::demangle::generics::parse_type;
use crate::demangle::grammar::MangledReader;

#[derive(Debug, Clone, Default)]
pub struct FunctionEffects {
    pub is_async: bool,
    pub throws: bool,
    pub is_sendable: bool,
    pub thrown_type: Option<String>,
}

#[derive(Debug, Clone)]
pub struct FunctionSignature {
    pub module: String,
    pub name: String,
    pub parameters: Vec<String>,
    pub return_type: Option<String>,
    pub effects: FunctionEffects,
}

impl FunctionSignature {
    /// Renders as a Swift `func` declaration.
    pub fn to_swift(&self) -> String {
        let mut out = format!("func {}(", self.name);
        out.push_str(
            &self
                .parameters
                .iter()
                .enumerate()
                .map(|(i, t)| format!("_ arg{i}: {t}"))
                .collect::<Vec<_>>()
                .join(", "),
        );
        out.push(')');
        if self.effects.is_async {
            out.push_str(" async");
        }
        if self.effects.throws {
            match &self.effects.thrown_type {
                Some(t) => out.push_str(&format!(" throws({t})")),
                None => out.push_str(" throws"),
            }
        }
        if let Some(ret) = &self.return_type {
            out.push_str(&format!(" -> {ret}"));
        }
        out
    }

    /// Renders as an Objective-C-style line, `- (R)name:(A)arg0 …`.
    pub fn to_objc_style(&self) -> String {
        let ret = self.return_type.as_deref().unwrap_or("void");
        if self.parameters.is_empty() {
            return format!("- ({ret}){}", self.name);
        }
        let mut out = format!("- ({ret}){}:", self.name);
        for (i, p) in self.parameters.iter().enumerate() {
            if i > 0 {
                out.push_str(&format!(" arg{i}:({p})"));
            } else {
                out.push_str(&format!("({p})"));
            }
        }
        out
    }
}

/// Parses a function-signature mangling body: `<module><name><params>F[effects]`.
/// Expects the leading module/name dotted path and trailing `F` to already
/// be framed by the caller via the recognized entry point.
pub fn parse_function_signature(r: &mut MangledReader) -> Option<FunctionSignature> {
    let module = r.read_identifier()?;
    let name = r.read_identifier()?;

    let mut parameters = Vec::new();
    while r.peek() != Some(b'y') && !r.is_empty() {
        parameters.push(parse_type(r)?);
    }
    if !r.eat(b'y') {
        return None;
    }
    let return_type = if type_starts_here(r) { parse_type(r) } else { None };

    let mut effects = FunctionEffects::default();
    if r.eat_str("Ya") {
        effects.is_async = true;
    }
    if r.eat_str("Yb") {
        effects.is_sendable = true;
    }
    if r.eat(b'K') {
        effects.throws = true;
    }
    r.eat(b'F');

    Some(FunctionSignature {
        module,
        name,
        parameters,
        return_type,
        effects,
    })
}

fn type_starts_here(r: &MangledReader) -> bool {
    matches!(r.peek(), Some(b'S') | Some(b's') | Some(b'B')) || matches!(r.peek(), Some(c) if c.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_simple_void_function() {
        let mut r = MangledReader::new("3App3runSiyF");
        let sig = parse_function_signature(&mut r).unwrap();
        assert_eq!(sig.module, "App");
        assert_eq!(sig.name, "run");
        assert_eq!(sig.parameters, vec!["Int".to_string()]);
        assert_eq!(sig.return_type, None);
        assert!(!sig.effects.is_async);
    }

    #[test]
    fn parses_async_throwing_function_with_return() {
        let mut r = MangledReader::new("3App5fetchSiySSYaKF");
        let sig = parse_function_signature(&mut r).unwrap();
        assert_eq!(sig.name, "fetch");
        assert_eq!(sig.parameters, vec!["Int".to_string()]);
        assert_eq!(sig.return_type, Some("String".to_string()));
        assert!(sig.effects.is_async);
        assert!(sig.effects.throws);
    }

    #[test]
    fn renders_objc_style_line() {
        let mut r = MangledReader::new("3App3runSiyF");
        let sig = parse_function_signature(&mut r).unwrap();
        assert_eq!(sig.to_objc_style(), "- (void)run:(Int)");
    }
}

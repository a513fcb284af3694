//! Generic signature constraint markers (§4.J "Generic signatures"):
//! `Rz` conformance, `Rs` same-type, `Rl` layout (maps to `AnyObject`),
//! `Rb` base class.

use crate::demangle::generics::parse_type;
use crate::demangle::grammar::MangledReader;

#[derive(Debug, Clone)]
pub enum Constraint {
    Conformance { param: String, protocol: String },
    SameType { param: String, other: String },
    Layout { param: String },
    BaseClass { param: String, class: String },
}

impl Constraint {
    pub fn to_where_clause(&self) -> String {
        match self {
            Constraint::Conformance { param, protocol } => format!("{param}: {protocol}"),
            Constraint::SameType { param, other } => format!("{param} == {other}"),
            Constraint::Layout { param } => format!("{param}: AnyObject"),
            Constraint::BaseClass { param, class } => format!("{param}: {class}"),
        }
    }
}

/// Parses one constraint record: a generic parameter name, a marker byte,
/// and (except for `Rl`) a second type reference.
pub fn parse_constraint(r: &mut MangledReader) -> Option<Constraint> {
    let param = r.read_identifier()?;
    if r.eat_str("Rz") {
        let protocol = parse_type(r)?;
        return Some(Constraint::Conformance { param, protocol });
    }
    if r.eat_str("Rs") {
        let other = parse_type(r)?;
        return Some(Constraint::SameType { param, other });
    }
    if r.eat_str("Rl") {
        return Some(Constraint::Layout { param });
    }
    if r.eat_str("Rb") {
        let class = parse_type(r)?;
        return Some(Constraint::BaseClass { param, class });
    }
    None
}

/// Emits `where T: P, T.Element == X` in the stable input order (§4.J).
pub fn render_where_clause(constraints: &[Constraint]) -> String {
    if constraints.is_empty() {
        return String::new();
    }
    let clauses: Vec<String> = constraints.iter().map(Constraint::to_where_clause).collect();
    format!("where {}", clauses.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_conformance_constraint() {
        let mut r = MangledReader::new("1TRz9Equatable");
        let c = parse_constraint(&mut r).unwrap();
        assert_eq!(c.to_where_clause(), "T: Equatable");
    }

    #[test]
    fn renders_multiple_constraints_in_order() {
        let constraints = vec![
            Constraint::Conformance {
                param: "T".into(),
                protocol: "Equatable".into(),
            },
            Constraint::Layout { param: "U".into() },
        ];
        assert_eq!(render_where_clause(&constraints), "where T: Equatable, U: AnyObject");
    }
}

//! Component H+: the recursive-descent type-encoding parser (§4.H+).
//!
//! Single-token lookahead over the lexer's token stream. On failure,
//! returns `SyntaxError(kind, remaining)` carrying the unread suffix so
//! callers can decide whether a partial tree is useful.

use crate::encoding::lexer::{Lexer, Token};
use crate::encoding::types::{BlockSignature, Member, Modifier, Primitive, Type, TypeKind};
use crate::error::{Error, Result, SyntaxErrorKind};

pub struct Parser<'a> {
    lexer: Lexer<'a>,
    lookahead: Token<'a>,
}

impl<'a> Parser<'a> {
    pub fn new(input: &'a str) -> Self {
        let mut lexer = Lexer::new(input);
        let lookahead = lexer.next_token();
        Parser { lexer, lookahead }
    }

    fn err(&self, kind: SyntaxErrorKind) -> Error {
        Error::SyntaxError {
            kind,
            remaining: self.lexer.remaining().to_string(),
        }
    }

    fn advance(&mut self) -> Token<'a> {
        let tok = self.lookahead.clone();
        self.lookahead = self.lexer.next_token();
        tok
    }

    fn expect_char(&mut self, c: char) -> Result<()> {
        match self.advance() {
            Token::Char(x) if x == c => Ok(()),
            _ => Err(self.err(SyntaxErrorKind::UnexpectedToken)),
        }
    }

    fn peek_char(&self) -> Option<char> {
        match self.lookahead {
            Token::Char(c) => Some(c),
            _ => None,
        }
    }

    /// Parses a single `Type` (the `@?`/block-signature entry point and the
    /// bare primitive/aggregate entry point share this).
    pub fn parse_type(&mut self) -> Result<Type> {
        let mut modifiers = Vec::new();
        while let Some(m) = self.peek_modifier() {
            self.advance();
            modifiers.push(m);
        }
        let kind = self.parse_atom()?;
        let mut ty = Type::new(kind);
        ty.modifiers = modifiers;
        Ok(ty)
    }

    fn peek_modifier(&self) -> Option<Modifier> {
        match self.peek_char()? {
            'r' => Some(Modifier::Const),
            'n' => Some(Modifier::In),
            'N' => Some(Modifier::Inout),
            'o' => Some(Modifier::Out),
            'O' => Some(Modifier::Bycopy),
            'R' => Some(Modifier::Byref),
            'V' => Some(Modifier::Oneway),
            'j' => Some(Modifier::Complex),
            'A' => Some(Modifier::Atomic),
            _ => None,
        }
    }

    fn parse_atom(&mut self) -> Result<TypeKind> {
        let tok = self.advance();
        let c = match tok {
            Token::Char(c) => c,
            _ => return Err(self.err(SyntaxErrorKind::UnexpectedToken)),
        };

        match c {
            'c' => Ok(TypeKind::Primitive(Primitive::Char)),
            'C' => Ok(TypeKind::Primitive(Primitive::UnsignedChar)),
            's' => Ok(TypeKind::Primitive(Primitive::Short)),
            'S' => Ok(TypeKind::Primitive(Primitive::UnsignedShort)),
            'i' => Ok(TypeKind::Primitive(Primitive::Int)),
            'I' => Ok(TypeKind::Primitive(Primitive::UnsignedInt)),
            'l' => Ok(TypeKind::Primitive(Primitive::Long)),
            'L' => Ok(TypeKind::Primitive(Primitive::UnsignedLong)),
            'q' => Ok(TypeKind::Primitive(Primitive::LongLong)),
            'Q' => Ok(TypeKind::Primitive(Primitive::UnsignedLongLong)),
            'f' => Ok(TypeKind::Primitive(Primitive::Float)),
            'd' => Ok(TypeKind::Primitive(Primitive::Double)),
            'D' => Ok(TypeKind::Primitive(Primitive::LongDouble)),
            'B' => Ok(TypeKind::Primitive(Primitive::Bool)),
            'v' => Ok(TypeKind::Primitive(Primitive::Void)),
            '*' => Ok(TypeKind::Pointer(Box::new(Type::primitive(Primitive::Char)))),
            '#' => Ok(TypeKind::Primitive(Primitive::ObjcClass)),
            ':' => Ok(TypeKind::Primitive(Primitive::Selector)),
            '?' => Ok(TypeKind::Primitive(Primitive::Unknown)),
            '%' => Ok(TypeKind::Primitive(Primitive::Atom)),
            't' => Ok(TypeKind::Primitive(Primitive::Int128)),
            'T' => Ok(TypeKind::Primitive(Primitive::UInt128)),
            '@' => self.parse_id_or_block(),
            '^' => self.parse_pointer(),
            '[' => self.parse_array(),
            '{' => self.parse_aggregate('}', false),
            '(' => self.parse_aggregate(')', true),
            'b' => self.parse_bitfield(),
            _ => Err(self.err(SyntaxErrorKind::UnexpectedToken)),
        }
    }

    fn parse_id_or_block(&mut self) -> Result<TypeKind> {
        match self.lookahead.clone() {
            Token::QuotedString(s) => {
                self.advance();
                Ok(Self::split_class_and_protocols(s))
            }
            Token::Char('?') => {
                self.advance();
                if self.peek_char() == Some('<') {
                    self.advance();
                    let sig = self.parse_block_signature()?;
                    self.expect_char('>')?;
                    Ok(TypeKind::Block(Some(sig)))
                } else {
                    Ok(TypeKind::Block(None))
                }
            }
            _ => Ok(TypeKind::Id {
                class_name: None,
                protocols: Vec::new(),
            }),
        }
    }

    fn split_class_and_protocols(s: &str) -> TypeKind {
        if let Some(lt) = s.find('<') {
            let class = &s[..lt];
            let protos_str = s[lt + 1..].trim_end_matches('>');
            let protocols = protos_str
                .split(',')
                .map(|p| p.trim().to_string())
                .filter(|p| !p.is_empty())
                .collect();
            let class_name = if class.is_empty() {
                None
            } else {
                Some(class.to_string())
            };
            TypeKind::Id {
                class_name,
                protocols,
            }
        } else {
            TypeKind::Id {
                class_name: Some(s.to_string()),
                protocols: Vec::new(),
            }
        }
    }

    fn parse_block_signature(&mut self) -> Result<BlockSignature> {
        let mut types = Vec::new();
        loop {
            match self.lookahead {
                Token::Char('>') | Token::Eos => break,
                _ => {
                    let ty = self.parse_type()?;
                    // method-type sequences interleave a stack-offset number
                    // we don't need for declaration purposes; consume it.
                    if let Token::Number(_) = self.lookahead {
                        self.advance();
                    }
                    types.push(ty);
                }
            }
        }
        if types.is_empty() {
            return Err(self.err(SyntaxErrorKind::UnexpectedEof));
        }
        let return_type = Box::new(types.remove(0));
        Ok(BlockSignature {
            return_type,
            arguments: types,
        })
    }

    fn parse_pointer(&mut self) -> Result<TypeKind> {
        if self.peek_char() == Some('?') {
            self.advance();
            return Ok(TypeKind::FunctionPointer);
        }
        let inner = self.parse_type()?;
        Ok(TypeKind::Pointer(Box::new(inner)))
    }

    fn parse_array(&mut self) -> Result<TypeKind> {
        let count = match self.advance() {
            Token::Number(n) => n
                .parse::<u64>()
                .map_err(|_| self.err(SyntaxErrorKind::InvalidNumber))?,
            _ => return Err(self.err(SyntaxErrorKind::InvalidNumber)),
        };
        let inner = self.parse_type()?;
        self.expect_char(']')?;
        Ok(TypeKind::Array(count, Box::new(inner)))
    }

    fn parse_aggregate(&mut self, close: char, is_union: bool) -> Result<TypeKind> {
        let name = match self.lookahead.clone() {
            Token::Identifier(s) => {
                self.advance();
                Some(s.to_string())
            }
            _ => None,
        };

        let mut members = Vec::new();
        if self.peek_char() == Some('=') {
            self.advance();
            loop {
                match self.lookahead {
                    Token::Char(c) if c == close => break,
                    Token::Eos => return Err(self.err(SyntaxErrorKind::UnterminatedAggregate)),
                    _ => members.push(self.parse_member()?),
                }
            }
        }
        self.expect_char(close)?;

        if is_union {
            Ok(TypeKind::Union { name, members })
        } else {
            Ok(TypeKind::Structure { name, members })
        }
    }

    fn parse_member(&mut self) -> Result<Member> {
        let mut member_name = None;
        while let Token::QuotedString(s) = self.lookahead {
            member_name = Some(s.to_string());
            self.advance();
        }
        let ty = self.parse_type()?;
        Ok(Member {
            ty: Box::new(ty),
            name: member_name,
        })
    }

    fn parse_bitfield(&mut self) -> Result<TypeKind> {
        match self.advance() {
            Token::Number(n) => {
                let bits = n
                    .parse::<u64>()
                    .map_err(|_| self.err(SyntaxErrorKind::InvalidNumber))?;
                Ok(TypeKind::Bitfield(bits))
            }
            _ => Err(self.err(SyntaxErrorKind::InvalidNumber)),
        }
    }

    pub fn is_at_end(&self) -> bool {
        matches!(self.lookahead, Token::Eos)
    }
}

/// Parses one type encoding to completion. Trailing garbage is an error.
pub fn parse_type(input: &str) -> Result<Type> {
    let mut parser = Parser::new(input);
    let ty = parser.parse_type()?;
    Ok(ty)
}

/// Parses a method-type encoding: `(Type Number)*`, returning the sequence
/// of argument types in declaration order (return type first, then `self`,
/// `_cmd`, then the formal arguments). Stack-offset numbers are discarded.
pub fn parse_method_type(input: &str) -> Result<Vec<Type>> {
    let mut parser = Parser::new(input);
    let mut types = Vec::new();
    while !parser.is_at_end() {
        let ty = parser.parse_type()?;
        match parser.lookahead {
            Token::Number(_) => {
                parser.advance();
            }
            _ => {}
        }
        types.push(ty);
    }
    Ok(types)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoding::formatter::{Formatter, OutputStyle};

    fn bare(encoding: &str) -> String {
        let ty = parse_type(encoding).unwrap();
        Formatter::new(OutputStyle::ObjC).format_bare(&ty)
    }

    #[test]
    fn round_trips_primitives() {
        for enc in ["c", "i", "s", "l", "q", "C", "I", "S", "L", "Q", "f", "d", "D", "B", "v", "#", ":", "?", "%"] {
            assert_eq!(bare(enc), enc, "encoding {enc}");
        }
    }

    #[test]
    fn round_trips_composites() {
        assert_eq!(bare("^i"), "^i");
        assert_eq!(bare("[10d]"), "[10d]");
        assert_eq!(bare("b8"), "b8");
        assert_eq!(bare("r^i"), "r^i");
        assert_eq!(bare("{CGPoint=dd}"), "{CGPoint=dd}");
    }

    #[test]
    fn parses_id_with_class_and_protocols() {
        let ty = parse_type("@\"NSArray<NSCopying,NSCoding>\"").unwrap();
        match ty.kind {
            TypeKind::Id { class_name, protocols } => {
                assert_eq!(class_name.as_deref(), Some("NSArray"));
                assert_eq!(protocols, vec!["NSCopying", "NSCoding"]);
            }
            other => panic!("expected id, got {other:?}"),
        }
    }

    #[test]
    fn method_type_strips_self_and_cmd_positions() {
        let types = parse_method_type("v24@0:8@16").unwrap();
        assert_eq!(types.len(), 4);
        assert!(matches!(types[1].kind, TypeKind::Id { .. }));
        assert!(matches!(types[2].kind, crate::encoding::types::TypeKind::Primitive(Primitive::Selector)));
    }

    #[test]
    fn syntax_error_carries_remaining_suffix() {
        let err = parse_type("{Foo=d").unwrap_err();
        match err {
            Error::SyntaxError { kind, .. } => assert_eq!(kind, SyntaxErrorKind::UnterminatedAggregate),
            other => panic!("unexpected error {other:?}"),
        }
    }
}

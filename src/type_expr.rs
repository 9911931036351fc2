//! Field-type expressions: the textual form schema documents use.
//!
//! ```text
//! expr   = member { "|" member }
//! member = "str" | "int" | "float" | "bool" | "None"
//!        | "list[" expr "]" | "dict[str," expr "]" | "tuple[" expr {"," expr} "]"
//!        | "Optional[" expr "]" | "Union[" expr {"," expr} "]"
//!        | Ident [ "[" expr {"," expr} "]" ]
//! ```
//!
//! Lowering rules:
//! - `A | None` → `Optional(A)`, `A | B | None` → `Optional(Union[A, B])`
//! - `Optional[..]` and `Union[..]` arguments join the surrounding union, so
//!   `Union[str, None]` and `Optional[str | None]` are both `Optional(str)`
//! - a bare capitalised identifier is a record reference
//! - everything else unknown (`datetime`, `set[str]`, `dict[int, str]`) is
//!   kept as `Opaque` text and rejected later by the builder
pub mod lexer;

use crate::schema::FieldType;
use lexer::{Tok, Token};

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TypeExprError {
    #[error("unexpected character '{ch}' at offset {offset}")]
    UnexpectedChar { offset: usize, ch: char },
    #[error("expected {expected} at offset {offset}, found '{found}'")]
    UnexpectedToken { offset: usize, expected: &'static str, found: String },
    #[error("expected {expected}, found end of input")]
    UnexpectedEnd { expected: &'static str },
    #[error("'{name}' at offset {offset} takes {expected} type argument(s), found {found}")]
    Arity { name: String, offset: usize, expected: &'static str, found: usize },
    #[error("type at offset {offset} is only 'None'")]
    OnlyNone { offset: usize },
    #[error("type arguments nested deeper than {limit} levels at offset {offset}")]
    TooDeep { offset: usize, limit: usize },
}

/// Bracket nesting accepted before parsing gives up.
pub const MAX_DEPTH: usize = 64;

/// Parses a type expression into a field-type descriptor.
pub fn parse(src: &str) -> Result<FieldType, TypeExprError> {
    let tokens = lexer::tokenize(src)?;
    let mut p = Parser { src, tokens, pos: 0, depth: 0 };
    let ty = p.expr()?;
    match p.peek() {
        None => Ok(ty),
        Some(t) => Err(p.unexpected(t, "end of input")),
    }
}

// ------------------------------- Parser ---------------------------------- //

enum Member {
    None,
    Ty(FieldType),
}

struct Parser<'a> {
    src: &'a str,
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn bump(&mut self) -> Option<Token> {
        let t = self.tokens.get(self.pos).cloned();
        if t.is_some() { self.pos += 1; }
        t
    }

    fn unexpected(&self, t: &Token, expected: &'static str) -> TypeExprError {
        TypeExprError::UnexpectedToken {
            offset: t.start,
            expected,
            found: self.src[t.start..t.end].to_string(),
        }
    }

    fn expect(&mut self, want: Tok, expected: &'static str) -> Result<Token, TypeExprError> {
        match self.bump() {
            Some(t) if t.tok == want => Ok(t),
            Some(t) => Err(self.unexpected(&t, expected)),
            None => Err(TypeExprError::UnexpectedEnd { expected }),
        }
    }

    fn expr(&mut self) -> Result<FieldType, TypeExprError> {
        let offset = self.offset();
        let members = self.members()?;
        lower_union(members, offset)
    }

    /// `member { "|" member }`, not yet lowered.
    fn members(&mut self) -> Result<Vec<Member>, TypeExprError> {
        let mut members = vec![self.member()?];
        while matches!(self.peek(), Some(Token { tok: Tok::Pipe, .. })) {
            self.bump();
            members.push(self.member()?);
        }
        Ok(members)
    }

    fn offset(&self) -> usize {
        self.peek().map(|t| t.start).unwrap_or(self.src.len())
    }

    fn member(&mut self) -> Result<Member, TypeExprError> {
        let head = match self.bump() {
            Some(Token { tok: Tok::Ident(name), start, end }) => (name, start, end),
            Some(t) => return Err(self.unexpected(&t, "a type name")),
            None => return Err(TypeExprError::UnexpectedEnd { expected: "a type name" }),
        };
        let (name, start, end) = head;

        if !matches!(self.peek(), Some(Token { tok: Tok::LBracket, .. })) {
            return Ok(match name.as_str() {
                "None" => Member::None,
                "str" => Member::Ty(FieldType::string()),
                "int" => Member::Ty(FieldType::integer()),
                "float" => Member::Ty(FieldType::float()),
                "bool" => Member::Ty(FieldType::boolean()),
                n if n.starts_with(|c: char| c.is_uppercase()) && n != "Any" => {
                    Member::Ty(FieldType::record(n))
                }
                _ => Member::Ty(FieldType::Opaque(self.src[start..end].to_string())),
            });
        }

        if self.depth == MAX_DEPTH {
            return Err(TypeExprError::TooDeep { offset: start, limit: MAX_DEPTH });
        }
        self.depth += 1;
        self.bump();
        let mut groups = vec![(self.offset(), self.members()?)];
        while matches!(self.peek(), Some(Token { tok: Tok::Comma, .. })) {
            self.bump();
            groups.push((self.offset(), self.members()?));
        }
        let close = self.expect(Tok::RBracket, "']'")?;
        self.depth -= 1;
        let text = &self.src[start..close.end];

        match name.as_str() {
            "Optional" => {
                if groups.len() != 1 { return Err(arity(&name, start, "1", groups.len())); }
                let mut members = groups.remove(0).1;
                members.push(Member::None);
                return lower_union(members, start).map(Member::Ty);
            }
            "Union" => {
                let members = groups.into_iter().flat_map(|(_, m)| m).collect();
                return lower_union(members, start).map(Member::Ty);
            }
            _ => {}
        }

        let mut args = groups
            .into_iter()
            .map(|(offset, members)| lower_union(members, offset))
            .collect::<Result<Vec<_>, _>>()?;
        let ty = match name.as_str() {
            "list" | "List" | "Sequence" => {
                if args.len() != 1 { return Err(arity(&name, start, "1", args.len())); }
                FieldType::list(args.remove(0))
            }
            "dict" | "Dict" | "Mapping" => {
                if args.len() != 2 { return Err(arity(&name, start, "2", args.len())); }
                let value = args.remove(1);
                if args[0] == FieldType::string() {
                    FieldType::map(value)
                } else {
                    FieldType::Opaque(text.to_string())
                }
            }
            "tuple" | "Tuple" => FieldType::Tuple(args),
            _ => FieldType::Opaque(text.to_string()),
        };
        Ok(Member::Ty(ty))
    }
}

fn arity(name: &str, offset: usize, expected: &'static str, found: usize) -> TypeExprError {
    TypeExprError::Arity { name: name.to_string(), offset, expected, found }
}

/// Flattens nested unions and optionals into one level, so `None` wraps the
/// result at most once.
fn lower_union(members: Vec<Member>, offset: usize) -> Result<FieldType, TypeExprError> {
    fn flatten(ty: FieldType, arms: &mut Vec<FieldType>, nullable: &mut bool) {
        match ty {
            FieldType::Optional(inner) => {
                *nullable = true;
                flatten(*inner, arms, nullable);
            }
            FieldType::Union(members) => {
                for m in members {
                    flatten(m, arms, nullable);
                }
            }
            other => arms.push(other),
        }
    }

    let mut nullable = false;
    let mut arms = Vec::with_capacity(members.len());
    for m in members {
        match m {
            Member::None => nullable = true,
            Member::Ty(t) => flatten(t, &mut arms, &mut nullable),
        }
    }
    let core = match arms.len() {
        0 => return Err(TypeExprError::OnlyNone { offset }),
        1 => arms.remove(0),
        _ => FieldType::Union(arms),
    };
    Ok(if nullable { FieldType::optional(core) } else { core })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primitives_and_records() {
        assert_eq!(parse("str").unwrap(), FieldType::string());
        assert_eq!(parse(" bool ").unwrap(), FieldType::boolean());
        assert_eq!(parse("Address").unwrap(), FieldType::record("Address"));
    }

    #[test]
    fn nullable_unions_lower_to_optional() {
        assert_eq!(parse("str | None").unwrap(), FieldType::optional(FieldType::string()));
        assert_eq!(parse("Optional[int]").unwrap(), FieldType::optional(FieldType::integer()));
        assert_eq!(
            parse("A | list[B] | None").unwrap(),
            FieldType::optional(FieldType::Union(vec![
                FieldType::record("A"),
                FieldType::list(FieldType::record("B")),
            ]))
        );
        assert_eq!(parse("None").unwrap_err(), TypeExprError::OnlyNone { offset: 0 });
    }

    #[test]
    fn union_and_optional_arguments_accept_none() {
        let a_or_b = FieldType::Union(vec![FieldType::record("A"), FieldType::record("B")]);
        assert_eq!(parse("Union[str, None]").unwrap(), FieldType::optional(FieldType::string()));
        assert_eq!(parse("Union[A, B, None]").unwrap(), FieldType::optional(a_or_b.clone()));
        assert_eq!(parse("Union[A | None, B]").unwrap(), FieldType::optional(a_or_b.clone()));
        assert_eq!(parse("Union[A, B]").unwrap(), a_or_b);
        assert_eq!(parse("Optional[str | None]").unwrap(), FieldType::optional(FieldType::string()));
        assert_eq!(parse("Optional[Optional[int]]").unwrap(), FieldType::optional(FieldType::integer()));
        assert_eq!(
            parse("list[Union[Address, None]]").unwrap(),
            FieldType::list(FieldType::optional(FieldType::record("Address")))
        );
        assert_eq!(parse("Union[None]").unwrap_err(), TypeExprError::OnlyNone { offset: 0 });
        assert_eq!(parse("list[None]").unwrap_err(), TypeExprError::OnlyNone { offset: 5 });
    }

    #[test]
    fn bracket_nesting_is_capped() {
        let ok = format!("{}str{}", "list[".repeat(MAX_DEPTH), "]".repeat(MAX_DEPTH));
        assert!(parse(&ok).is_ok());

        let deep = format!("{}str{}", "list[".repeat(10_000), "]".repeat(10_000));
        assert_eq!(
            parse(&deep).unwrap_err(),
            TypeExprError::TooDeep { offset: MAX_DEPTH * 5, limit: MAX_DEPTH }
        );
    }

    #[test]
    fn containers() {
        assert_eq!(
            parse("dict[str, dict[str, dict[str, str]]]").unwrap(),
            FieldType::map(FieldType::map(FieldType::map(FieldType::string())))
        );
        assert_eq!(
            parse("list[tuple[str, str]]").unwrap(),
            FieldType::list(FieldType::Tuple(vec![FieldType::string(), FieldType::string()]))
        );
    }

    #[test]
    fn unknown_types_stay_opaque() {
        assert_eq!(parse("datetime").unwrap(), FieldType::Opaque("datetime".into()));
        assert_eq!(parse("set[str]").unwrap(), FieldType::Opaque("set[str]".into()));
        assert_eq!(parse("dict[int, str]").unwrap(), FieldType::Opaque("dict[int, str]".into()));
        assert_eq!(parse("Any").unwrap(), FieldType::Opaque("Any".into()));
    }

    #[test]
    fn malformed_input() {
        assert_eq!(parse("list[str").unwrap_err(), TypeExprError::UnexpectedEnd { expected: "']'" });
        assert!(matches!(parse("list[str, int]").unwrap_err(), TypeExprError::Arity { found: 2, .. }));
        assert!(matches!(parse("str str").unwrap_err(), TypeExprError::UnexpectedToken { offset: 4, .. }));
        assert!(matches!(parse("").unwrap_err(), TypeExprError::UnexpectedEnd { .. }));
    }

    #[test]
    fn display_parses_back() {
        for src in ["list[dict[str, Address]] | None", "tuple[str, int]", "A | B"] {
            assert_eq!(parse(src).unwrap().to_string(), src);
        }
        for src in ["Union[A | None, B]", "Optional[list[int]]", "Union[str, None]"] {
            let ty = parse(src).unwrap();
            assert_eq!(parse(&ty.to_string()).unwrap(), ty);
        }

        let hand_built = FieldType::Union(vec![
            FieldType::optional(FieldType::record("A")),
            FieldType::record("B"),
        ]);
        assert_eq!(hand_built.to_string(), "A | None | B");
        assert_eq!(
            parse(&hand_built.to_string()).unwrap(),
            FieldType::optional(FieldType::Union(vec![FieldType::record("A"), FieldType::record("B")]))
        );
    }
}

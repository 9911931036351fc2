use super::TypeExprError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Tok {
    Ident(String),
    LBracket,
    RBracket,
    Comma,
    Pipe,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub tok: Tok,
    pub start: usize,  // byte offsets into the source
    pub end: usize,
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '_' | '.')
}

pub fn tokenize(src: &str) -> Result<Vec<Token>, TypeExprError> {
    let mut out = Vec::new();
    let mut chars = src.char_indices().peekable();

    while let Some((start, c)) = chars.next() {
        let tok = match c {
            c if c.is_whitespace() => continue,
            '[' => Tok::LBracket,
            ']' => Tok::RBracket,
            ',' => Tok::Comma,
            '|' => Tok::Pipe,
            c if is_ident_char(c) => {
                let mut end = start + c.len_utf8();
                while let Some(&(i, n)) = chars.peek() {
                    if !is_ident_char(n) { break; }
                    end = i + n.len_utf8();
                    chars.next();
                }
                out.push(Token { tok: Tok::Ident(src[start..end].to_string()), start, end });
                continue;
            }
            other => return Err(TypeExprError::UnexpectedChar { offset: start, ch: other }),
        };
        out.push(Token { tok, start, end: start + c.len_utf8() });
    }
    Ok(out)
}

//! Token definitions for the textual module format.
//!
//! Keywords (`module`, `func`, instruction mnemonics, ...) lex as plain
//! identifiers and are matched by text in the parser; the sigiled reference
//! forms each get their own token with the sigil stripped.

use logos::Logos;

fn unescape(quoted: &str) -> Option<String> {
    let inner = &quoted[1..quoted.len() - 1];
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next()? {
            '"' => out.push('"'),
            '\\' => out.push('\\'),
            'n' => out.push('\n'),
            't' => out.push('\t'),
            'r' => out.push('\r'),
            _ => return None,
        }
    }
    Some(out)
}

fn strip_sigil(slice: &str) -> String {
    slice[1..].to_string()
}

/// Tokens of the textual form. `//` comments and all whitespace are
/// insignificant.
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\r\n\f]+")]
#[logos(skip r"//[^\n]*")]
pub enum Token {
    /// `%name` or `%<bb>.<index>` — a local value reference.
    #[regex(r"%[A-Za-z0-9_][A-Za-z0-9_.]*", |lex| strip_sigil(lex.slice()))]
    Local(String),

    /// `@name` — a global (variable or function) reference.
    #[regex(r"@[A-Za-z_][A-Za-z0-9_.]*", |lex| strip_sigil(lex.slice()))]
    Global(String),

    /// `'name` — a basic block label.
    #[regex(r"'[A-Za-z_][A-Za-z0-9_.]*", |lex| strip_sigil(lex.slice()))]
    Block(String),

    /// `$Name` — a nominal type or alias.
    #[regex(r"\$[A-Za-z_][A-Za-z0-9_.]*", |lex| strip_sigil(lex.slice()))]
    TypeName(String),

    /// `#name` — a struct field.
    #[regex(r"#[A-Za-z_][A-Za-z0-9_.]*", |lex| strip_sigil(lex.slice()))]
    Field(String),

    /// `?name` — an enum case.
    #[regex(r"\?[A-Za-z_][A-Za-z0-9_.]*", |lex| strip_sigil(lex.slice()))]
    Case(String),

    /// A bare word: keywords and mnemonics.
    #[regex(r"[A-Za-z_][A-Za-z0-9_.]*", |lex| lex.slice().to_string())]
    Ident(String),

    /// An element index.
    #[regex(r"[0-9]+", |lex| lex.slice().parse::<usize>().ok())]
    Int(usize),

    /// A quoted string (module names, intrinsic opcodes).
    #[regex(r#""([^"\\\n]|\\.)*""#, |lex| unescape(lex.slice()))]
    Str(String),

    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token(",")]
    Comma,
    #[token(":")]
    Colon,
    #[token("=")]
    Eq,
    #[token("->")]
    Arrow,
    #[token("*")]
    Star,
}

impl Token {
    /// Short description for error messages.
    pub fn describe(&self) -> String {
        match self {
            Token::Local(name) => format!("%{}", name),
            Token::Global(name) => format!("@{}", name),
            Token::Block(name) => format!("'{}", name),
            Token::TypeName(name) => format!("${}", name),
            Token::Field(name) => format!("#{}", name),
            Token::Case(name) => format!("?{}", name),
            Token::Ident(name) => name.clone(),
            Token::Int(value) => value.to_string(),
            Token::Str(value) => format!("\"{}\"", value),
            Token::LParen => "(".into(),
            Token::RParen => ")".into(),
            Token::LBrace => "{".into(),
            Token::RBrace => "}".into(),
            Token::LBracket => "[".into(),
            Token::RBracket => "]".into(),
            Token::Comma => ",".into(),
            Token::Colon => ":".into(),
            Token::Eq => "=".into(),
            Token::Arrow => "->".into(),
            Token::Star => "*".into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex(source: &str) -> Vec<Token> {
        Token::lexer(source).map(|t| t.expect("lex error")).collect()
    }

    #[test]
    fn test_sigils() {
        assert_eq!(
            lex("%x @f 'entry $T #field ?case %0.1"),
            vec![
                Token::Local("x".into()),
                Token::Global("f".into()),
                Token::Block("entry".into()),
                Token::TypeName("T".into()),
                Token::Field("field".into()),
                Token::Case("case".into()),
                Token::Local("0.1".into()),
            ]
        );
    }

    #[test]
    fn test_comments_and_whitespace_are_skipped() {
        assert_eq!(
            lex("and // the rest is noise\n  or"),
            vec![Token::Ident("and".into()), Token::Ident("or".into())]
        );
    }

    #[test]
    fn test_string_escapes() {
        assert_eq!(
            lex(r#""a\"b\\c\n""#),
            vec![Token::Str("a\"b\\c\n".into())]
        );
        assert!(Token::lexer(r#""bad \q escape""#).any(|t| t.is_err()));
    }

    #[test]
    fn test_punctuation() {
        assert_eq!(
            lex("( ) -> * : = ,"),
            vec![
                Token::LParen,
                Token::RParen,
                Token::Arrow,
                Token::Star,
                Token::Colon,
                Token::Eq,
                Token::Comma,
            ]
        );
    }
}

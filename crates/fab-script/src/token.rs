//! Token definitions for the script lexer.

use fab_common::Span;

/// A single lexed token. Tokens carry no text; callers slice the source
/// through the span.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, start: u32, end: u32) -> Self {
        Self {
            kind,
            span: Span::new(start, end),
        }
    }
}

/// The kind of a lexed token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Ident,
    Number,
    Str,

    // Template literals lex as a delimited stream:
    // TemplateStart (TemplateChunk (InterpStart .. InterpEnd TemplateChunk)*)? TemplateEnd
    TemplateStart,
    TemplateChunk,
    TemplateEnd,
    InterpStart,
    InterpEnd,

    LParen,
    RParen,
    LBracket,
    RBracket,
    LBrace,
    RBrace,
    Comma,
    Semi,
    Colon,
    Dot,

    Assign,
    PlusAssign,
    MinusAssign,
    StarAssign,
    SlashAssign,

    EqEq,
    NotEq,
    Lt,
    Gt,
    LtEq,
    GtEq,
    AmpAmp,
    PipePipe,
    Bang,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,

    KwVar,
    KwFunction,
    KwIf,
    KwElse,
    KwThrow,
    KwReturn,
    KwNull,
    KwTrue,
    KwFalse,

    Error,
    Eof,
}

impl TokenKind {
    /// Human-readable token name for parse error messages.
    pub fn describe(self) -> &'static str {
        match self {
            TokenKind::Ident => "identifier",
            TokenKind::Number => "number literal",
            TokenKind::Str => "string literal",
            TokenKind::TemplateStart => "`",
            TokenKind::TemplateChunk => "template text",
            TokenKind::TemplateEnd => "`",
            TokenKind::InterpStart => "${",
            TokenKind::InterpEnd => "}",
            TokenKind::LParen => "(",
            TokenKind::RParen => ")",
            TokenKind::LBracket => "[",
            TokenKind::RBracket => "]",
            TokenKind::LBrace => "{",
            TokenKind::RBrace => "}",
            TokenKind::Comma => ",",
            TokenKind::Semi => ";",
            TokenKind::Colon => ":",
            TokenKind::Dot => ".",
            TokenKind::Assign => "=",
            TokenKind::PlusAssign => "+=",
            TokenKind::MinusAssign => "-=",
            TokenKind::StarAssign => "*=",
            TokenKind::SlashAssign => "/=",
            TokenKind::EqEq => "==",
            TokenKind::NotEq => "!=",
            TokenKind::Lt => "<",
            TokenKind::Gt => ">",
            TokenKind::LtEq => "<=",
            TokenKind::GtEq => ">=",
            TokenKind::AmpAmp => "&&",
            TokenKind::PipePipe => "||",
            TokenKind::Bang => "!",
            TokenKind::Plus => "+",
            TokenKind::Minus => "-",
            TokenKind::Star => "*",
            TokenKind::Slash => "/",
            TokenKind::Percent => "%",
            TokenKind::KwVar => "var",
            TokenKind::KwFunction => "function",
            TokenKind::KwIf => "if",
            TokenKind::KwElse => "else",
            TokenKind::KwThrow => "throw",
            TokenKind::KwReturn => "return",
            TokenKind::KwNull => "null",
            TokenKind::KwTrue => "true",
            TokenKind::KwFalse => "false",
            TokenKind::Error => "invalid token",
            TokenKind::Eof => "end of input",
        }
    }
}

/// Map an identifier to its keyword kind, if any.
///
/// `new` is deliberately absent: it lexes as a plain identifier so that
/// struct-construction paths like `new.User` parse as member access.
pub fn keyword_from_str(ident: &str) -> Option<TokenKind> {
    let kind = match ident {
        "var" => TokenKind::KwVar,
        "function" => TokenKind::KwFunction,
        "if" => TokenKind::KwIf,
        "else" => TokenKind::KwElse,
        "throw" => TokenKind::KwThrow,
        "return" => TokenKind::KwReturn,
        "null" => TokenKind::KwNull,
        "true" => TokenKind::KwTrue,
        "false" => TokenKind::KwFalse,
        _ => return None,
    };
    Some(kind)
}

//! Tokenizer for the embedded script subset.
//!
//! A state stack tracks template-literal contexts: inside `` ` `` the lexer
//! emits raw chunk tokens, and `${...}` pushes an interpolation state in
//! which normal tokenization resumes until the matching `}`.

use crate::cursor::Cursor;
use crate::token::{keyword_from_str, Token, TokenKind};

/// What the lexer is currently inside of.
#[derive(Debug, Clone, PartialEq)]
enum State {
    /// Normal top-level tokenization.
    Normal,
    /// Inside a template literal (after TemplateStart).
    InTemplate,
    /// Inside `${...}` interpolation; `brace_depth` counts nested `{`.
    InInterpolation { brace_depth: u32 },
}

/// The script lexer. Implements `Iterator<Item = Token>`; the final token
/// is always `Eof`.
pub(crate) struct Lexer<'src> {
    cursor: Cursor<'src>,
    states: Vec<State>,
    /// Tokens queued to emit before resuming normal lexing.
    pending: Vec<Token>,
    emitted_eof: bool,
}

impl<'src> Lexer<'src> {
    pub fn new(source: &'src str) -> Self {
        Self {
            cursor: Cursor::new(source),
            states: vec![State::Normal],
            pending: Vec::new(),
            emitted_eof: false,
        }
    }

    /// Tokenize the whole source, including the final `Eof` token.
    pub fn tokenize(source: &str) -> Vec<Token> {
        Lexer::new(source).collect()
    }

    fn produce(&mut self) -> Token {
        match self.states.last().cloned() {
            Some(State::InTemplate) => self.lex_template_chunk(),
            _ => self.lex_normal(),
        }
    }

    // ── Normal mode ────────────────────────────────────────────────────

    fn lex_normal(&mut self) -> Token {
        self.skip_trivia();

        let start = self.cursor.pos();
        let Some(c) = self.cursor.peek() else {
            return Token::new(TokenKind::Eof, start, start);
        };

        match c {
            '(' => self.single(TokenKind::LParen, start),
            ')' => self.single(TokenKind::RParen, start),
            '[' => self.single(TokenKind::LBracket, start),
            ']' => self.single(TokenKind::RBracket, start),
            ',' => self.single(TokenKind::Comma, start),
            ';' => self.single(TokenKind::Semi, start),
            ':' => self.single(TokenKind::Colon, start),
            '.' => self.single(TokenKind::Dot, start),
            '%' => self.single(TokenKind::Percent, start),

            '{' => self.lex_open_brace(start),
            '}' => self.lex_close_brace(start),

            '=' => self.lex_eq(start),
            '!' => self.lex_bang(start),
            '<' => self.lex_cmp(start, TokenKind::Lt, TokenKind::LtEq),
            '>' => self.lex_cmp(start, TokenKind::Gt, TokenKind::GtEq),
            '&' => self.lex_pair(start, '&', TokenKind::AmpAmp),
            '|' => self.lex_pair(start, '|', TokenKind::PipePipe),
            '+' => self.lex_op_assign(start, TokenKind::Plus, TokenKind::PlusAssign),
            '-' => self.lex_op_assign(start, TokenKind::Minus, TokenKind::MinusAssign),
            '*' => self.lex_op_assign(start, TokenKind::Star, TokenKind::StarAssign),
            '/' => self.lex_op_assign(start, TokenKind::Slash, TokenKind::SlashAssign),

            '`' => {
                self.cursor.advance();
                self.states.push(State::InTemplate);
                Token::new(TokenKind::TemplateStart, start, self.cursor.pos())
            }
            '"' | '\'' => self.lex_string(start, c),
            '0'..='9' => self.lex_number(start),
            c if is_ident_start(c) => self.lex_ident(start),

            _ => {
                self.cursor.advance();
                Token::new(TokenKind::Error, start, self.cursor.pos())
            }
        }
    }

    /// Inside `${...}` a bare `{` deepens the brace count so object
    /// literals inside interpolations close correctly.
    fn lex_open_brace(&mut self, start: u32) -> Token {
        self.cursor.advance();
        if let Some(State::InInterpolation { brace_depth }) = self.states.last_mut() {
            *brace_depth += 1;
        }
        Token::new(TokenKind::LBrace, start, self.cursor.pos())
    }

    fn lex_close_brace(&mut self, start: u32) -> Token {
        self.cursor.advance();
        if let Some(State::InInterpolation { brace_depth }) = self.states.last_mut() {
            if *brace_depth == 0 {
                self.states.pop();
                return Token::new(TokenKind::InterpEnd, start, self.cursor.pos());
            }
            *brace_depth -= 1;
        }
        Token::new(TokenKind::RBrace, start, self.cursor.pos())
    }

    // ── Template mode ──────────────────────────────────────────────────

    /// Lex one raw chunk of a template literal. Always emits a chunk token
    /// (possibly empty), queueing the delimiter that terminated it, so the
    /// parser sees chunks = interpolations + 1.
    fn lex_template_chunk(&mut self) -> Token {
        let start = self.cursor.pos();
        loop {
            match self.cursor.peek() {
                None => {
                    // Unterminated template literal.
                    self.states.pop();
                    return Token::new(TokenKind::Error, start, self.cursor.pos());
                }
                Some('`') => {
                    let end = self.cursor.pos();
                    self.cursor.advance();
                    self.states.pop();
                    self.pending
                        .push(Token::new(TokenKind::TemplateEnd, end, self.cursor.pos()));
                    return Token::new(TokenKind::TemplateChunk, start, end);
                }
                Some('$') if self.cursor.peek_next() == Some('{') => {
                    let end = self.cursor.pos();
                    self.cursor.advance();
                    self.cursor.advance();
                    self.states.push(State::InInterpolation { brace_depth: 0 });
                    self.pending
                        .push(Token::new(TokenKind::InterpStart, end, self.cursor.pos()));
                    return Token::new(TokenKind::TemplateChunk, start, end);
                }
                Some('\\') => {
                    self.cursor.advance();
                    self.cursor.advance();
                }
                Some(_) => {
                    self.cursor.advance();
                }
            }
        }
    }

    // ── Helpers ────────────────────────────────────────────────────────

    /// Skip whitespace (newlines included; statements end at `;` or the
    /// next statement keyword) and `//` / `/* */` comments.
    fn skip_trivia(&mut self) {
        loop {
            self.cursor.eat_while(|c| c.is_ascii_whitespace());
            match (self.cursor.peek(), self.cursor.peek_next()) {
                (Some('/'), Some('/')) => {
                    self.cursor.eat_while(|c| c != '\n');
                }
                (Some('/'), Some('*')) => {
                    self.cursor.advance();
                    self.cursor.advance();
                    loop {
                        match self.cursor.peek() {
                            None => break,
                            Some('*') if self.cursor.peek_next() == Some('/') => {
                                self.cursor.advance();
                                self.cursor.advance();
                                break;
                            }
                            Some(_) => {
                                self.cursor.advance();
                            }
                        }
                    }
                }
                _ => break,
            }
        }
    }

    fn single(&mut self, kind: TokenKind, start: u32) -> Token {
        self.cursor.advance();
        Token::new(kind, start, self.cursor.pos())
    }

    /// `=`, `==`, and `===` (strict equality collapses to `==`).
    fn lex_eq(&mut self, start: u32) -> Token {
        self.cursor.advance();
        if self.cursor.peek() == Some('=') {
            self.cursor.advance();
            if self.cursor.peek() == Some('=') {
                self.cursor.advance();
            }
            return Token::new(TokenKind::EqEq, start, self.cursor.pos());
        }
        Token::new(TokenKind::Assign, start, self.cursor.pos())
    }

    /// `!`, `!=`, and `!==` (strict inequality collapses to `!=`).
    fn lex_bang(&mut self, start: u32) -> Token {
        self.cursor.advance();
        if self.cursor.peek() == Some('=') {
            self.cursor.advance();
            if self.cursor.peek() == Some('=') {
                self.cursor.advance();
            }
            return Token::new(TokenKind::NotEq, start, self.cursor.pos());
        }
        Token::new(TokenKind::Bang, start, self.cursor.pos())
    }

    fn lex_cmp(&mut self, start: u32, bare: TokenKind, with_eq: TokenKind) -> Token {
        self.cursor.advance();
        if self.cursor.peek() == Some('=') {
            self.cursor.advance();
            return Token::new(with_eq, start, self.cursor.pos());
        }
        Token::new(bare, start, self.cursor.pos())
    }

    fn lex_pair(&mut self, start: u32, second: char, kind: TokenKind) -> Token {
        self.cursor.advance();
        if self.cursor.peek() == Some(second) {
            self.cursor.advance();
            return Token::new(kind, start, self.cursor.pos());
        }
        Token::new(TokenKind::Error, start, self.cursor.pos())
    }

    fn lex_op_assign(&mut self, start: u32, bare: TokenKind, with_assign: TokenKind) -> Token {
        self.cursor.advance();
        if self.cursor.peek() == Some('=') {
            self.cursor.advance();
            return Token::new(with_assign, start, self.cursor.pos());
        }
        Token::new(bare, start, self.cursor.pos())
    }

    fn lex_string(&mut self, start: u32, quote: char) -> Token {
        self.cursor.advance();
        loop {
            match self.cursor.peek() {
                None | Some('\n') => {
                    // Unterminated string literal.
                    return Token::new(TokenKind::Error, start, self.cursor.pos());
                }
                Some('\\') => {
                    self.cursor.advance();
                    self.cursor.advance();
                }
                Some(c) => {
                    self.cursor.advance();
                    if c == quote {
                        return Token::new(TokenKind::Str, start, self.cursor.pos());
                    }
                }
            }
        }
    }

    fn lex_number(&mut self, start: u32) -> Token {
        self.cursor.eat_while(|c| c.is_ascii_digit());
        if self.cursor.peek() == Some('.')
            && self.cursor.peek_next().is_some_and(|c| c.is_ascii_digit())
        {
            self.cursor.advance();
            self.cursor.eat_while(|c| c.is_ascii_digit());
        }
        if matches!(self.cursor.peek(), Some('e') | Some('E')) {
            if let Some(next) = self.cursor.peek_next() {
                if next.is_ascii_digit() || next == '+' || next == '-' {
                    self.cursor.advance();
                    if matches!(self.cursor.peek(), Some('+') | Some('-')) {
                        self.cursor.advance();
                    }
                    self.cursor.eat_while(|c| c.is_ascii_digit());
                }
            }
        }
        Token::new(TokenKind::Number, start, self.cursor.pos())
    }

    fn lex_ident(&mut self, start: u32) -> Token {
        self.cursor.eat_while(is_ident_continue);
        let end = self.cursor.pos();
        Token::new(TokenKind::Ident, start, end)
    }
}

impl Iterator for Lexer<'_> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        if !self.pending.is_empty() {
            return Some(self.pending.remove(0));
        }
        if self.emitted_eof {
            return None;
        }
        let token = self.produce();
        if token.kind == TokenKind::Eof {
            self.emitted_eof = true;
        }
        Some(token)
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_' || c == '$'
}

fn is_ident_continue(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '$'
}

/// Resolve identifier tokens to keywords by slicing the source.
pub(crate) fn resolve_keyword(source: &str, token: Token) -> TokenKind {
    if token.kind == TokenKind::Ident {
        if let Some(kw) = keyword_from_str(token.span.slice(source)) {
            return kw;
        }
    }
    token.kind
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        Lexer::tokenize(source)
            .into_iter()
            .map(|t| resolve_keyword(source, t))
            .collect()
    }

    #[test]
    fn lex_var_statement() {
        assert_eq!(
            kinds("var x = 1;"),
            vec![
                TokenKind::KwVar,
                TokenKind::Ident,
                TokenKind::Assign,
                TokenKind::Number,
                TokenKind::Semi,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn lex_strict_equality_collapses() {
        assert_eq!(
            kinds("a === b !== c"),
            vec![
                TokenKind::Ident,
                TokenKind::EqEq,
                TokenKind::Ident,
                TokenKind::NotEq,
                TokenKind::Ident,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn lex_template_with_interpolation() {
        assert_eq!(
            kinds("`hello ${name}!`"),
            vec![
                TokenKind::TemplateStart,
                TokenKind::TemplateChunk,
                TokenKind::InterpStart,
                TokenKind::Ident,
                TokenKind::InterpEnd,
                TokenKind::TemplateChunk,
                TokenKind::TemplateEnd,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn lex_template_object_literal_braces_nest() {
        assert_eq!(
            kinds("`${fn({a: 1})}`"),
            vec![
                TokenKind::TemplateStart,
                TokenKind::TemplateChunk,
                TokenKind::InterpStart,
                TokenKind::Ident,
                TokenKind::LParen,
                TokenKind::LBrace,
                TokenKind::Ident,
                TokenKind::Colon,
                TokenKind::Number,
                TokenKind::RBrace,
                TokenKind::RParen,
                TokenKind::InterpEnd,
                TokenKind::TemplateChunk,
                TokenKind::TemplateEnd,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn lex_comments_are_trivia() {
        assert_eq!(
            kinds("a // line\n/* block */ b"),
            vec![TokenKind::Ident, TokenKind::Ident, TokenKind::Eof]
        );
    }

    #[test]
    fn lex_unterminated_string_is_error() {
        assert_eq!(kinds("\"abc"), vec![TokenKind::Error, TokenKind::Eof]);
    }

    #[test]
    fn lex_number_forms() {
        assert_eq!(
            kinds("1 2.5 3e10"),
            vec![
                TokenKind::Number,
                TokenKind::Number,
                TokenKind::Number,
                TokenKind::Eof,
            ]
        );
    }
}

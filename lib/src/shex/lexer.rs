//! The ShExC tokenizer.
//!
//! Produces a lazy token stream over the source text. Every token
//! carries the position of its first byte so the parser can report
//! precise locations. Whitespace and `#` comments are discarded here.

use crate::error::{Position, ShexParseError, ShexParseErrorKind};
use std::fmt;

/// Keywords of the accepted ShExC subset. All but `a` are matched
/// case-insensitively.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keyword {
    Prefix,
    Base,
    Extra,
    Closed,
    Iri,
    Literal,
    Bnode,
    Nonliteral,
    Or,
    /// The lowercase `a` shorthand for `rdf:type`.
    A,
}

impl Keyword {
    fn from_word(word: &str) -> Option<Self> {
        if word == "a" {
            return Some(Keyword::A);
        }
        match word.to_ascii_uppercase().as_str() {
            "PREFIX" => Some(Keyword::Prefix),
            "BASE" => Some(Keyword::Base),
            "EXTRA" => Some(Keyword::Extra),
            "CLOSED" => Some(Keyword::Closed),
            "IRI" => Some(Keyword::Iri),
            "LITERAL" => Some(Keyword::Literal),
            "BNODE" => Some(Keyword::Bnode),
            "NONLITERAL" => Some(Keyword::Nonliteral),
            "OR" => Some(Keyword::Or),
            _ => None,
        }
    }
}

impl fmt::Display for Keyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let word = match self {
            Keyword::Prefix => "PREFIX",
            Keyword::Base => "BASE",
            Keyword::Extra => "EXTRA",
            Keyword::Closed => "CLOSED",
            Keyword::Iri => "IRI",
            Keyword::Literal => "LITERAL",
            Keyword::Bnode => "BNODE",
            Keyword::Nonliteral => "NONLITERAL",
            Keyword::Or => "OR",
            Keyword::A => "a",
        };
        write!(f, "{word}")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    /// `prefix:local`; the prefix may be empty.
    PrefixedName { prefix: String, local: String },
    /// `<...>`, content as written.
    IriRef(String),
    /// A quoted string with escapes already decoded.
    StringLiteral(String),
    Integer(u32),
    Keyword(Keyword),
    /// `@<...>` — shape reference by IRI.
    RefIri(String),
    /// `@prefix:local` — shape reference by prefixed name.
    RefPname { prefix: String, local: String },
    /// `@lang` after a string literal.
    LangTag(String),
    /// `^^` introducing a literal datatype.
    DatatypeMarker,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    LParen,
    RParen,
    Comma,
    Semicolon,
    Dot,
    Pipe,
    Amp,
    Caret,
    Question,
    Star,
    Plus,
    Tilde,
    Eof,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::PrefixedName { prefix, local } => write!(f, "`{prefix}:{local}`"),
            TokenKind::IriRef(iri) => write!(f, "`<{iri}>`"),
            TokenKind::StringLiteral(_) => write!(f, "string literal"),
            TokenKind::Integer(n) => write!(f, "`{n}`"),
            TokenKind::Keyword(k) => write!(f, "`{k}`"),
            TokenKind::RefIri(iri) => write!(f, "`@<{iri}>`"),
            TokenKind::RefPname { prefix, local } => write!(f, "`@{prefix}:{local}`"),
            TokenKind::LangTag(tag) => write!(f, "`@{tag}`"),
            TokenKind::DatatypeMarker => write!(f, "`^^`"),
            TokenKind::LBrace => write!(f, "`{{`"),
            TokenKind::RBrace => write!(f, "`}}`"),
            TokenKind::LBracket => write!(f, "`[`"),
            TokenKind::RBracket => write!(f, "`]`"),
            TokenKind::LParen => write!(f, "`(`"),
            TokenKind::RParen => write!(f, "`)`"),
            TokenKind::Comma => write!(f, "`,`"),
            TokenKind::Semicolon => write!(f, "`;`"),
            TokenKind::Dot => write!(f, "`.`"),
            TokenKind::Pipe => write!(f, "`|`"),
            TokenKind::Amp => write!(f, "`&`"),
            TokenKind::Caret => write!(f, "`^`"),
            TokenKind::Question => write!(f, "`?`"),
            TokenKind::Star => write!(f, "`*`"),
            TokenKind::Plus => write!(f, "`+`"),
            TokenKind::Tilde => write!(f, "`~`"),
            TokenKind::Eof => write!(f, "end of input"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub position: Position,
}

/// A single-pass tokenizer over ShExC source text. O(n) time, no
/// lookahead beyond one character.
pub struct Lexer<'a> {
    src: &'a str,
    offset: usize,
    line: usize,
    column: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(src: &'a str) -> Self {
        Lexer {
            src,
            offset: 0,
            line: 1,
            column: 1,
        }
    }

    pub fn position(&self) -> Position {
        Position {
            line: self.line,
            column: self.column,
            offset: self.offset,
        }
    }

    fn peek(&self) -> Option<char> {
        self.src[self.offset..].chars().next()
    }

    fn peek_second(&self) -> Option<char> {
        let mut chars = self.src[self.offset..].chars();
        chars.next();
        chars.next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.offset += c.len_utf8();
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn skip_trivia(&mut self) {
        while let Some(c) = self.peek() {
            if c.is_whitespace() {
                self.bump();
            } else if c == '#' {
                while let Some(c) = self.peek() {
                    if c == '\n' {
                        break;
                    }
                    self.bump();
                }
            } else {
                break;
            }
        }
    }

    fn error(&self, kind: ShexParseErrorKind, position: Position) -> ShexParseError {
        ShexParseError::new(kind, position)
    }

    /// Reads the next token; returns an `Eof` token at end of input.
    pub fn next_token(&mut self) -> Result<Token, ShexParseError> {
        self.skip_trivia();
        let position = self.position();
        let Some(c) = self.peek() else {
            return Ok(Token {
                kind: TokenKind::Eof,
                position,
            });
        };

        let kind = match c {
            '<' => {
                self.bump();
                TokenKind::IriRef(self.read_iri_body(position)?)
            }
            '"' | '\'' => self.read_string(c, position)?,
            '@' => self.read_at(position)?,
            '^' => {
                self.bump();
                if self.peek() == Some('^') {
                    self.bump();
                    TokenKind::DatatypeMarker
                } else {
                    TokenKind::Caret
                }
            }
            '{' => self.punct(TokenKind::LBrace),
            '}' => self.punct(TokenKind::RBrace),
            '[' => self.punct(TokenKind::LBracket),
            ']' => self.punct(TokenKind::RBracket),
            '(' => self.punct(TokenKind::LParen),
            ')' => self.punct(TokenKind::RParen),
            ',' => self.punct(TokenKind::Comma),
            ';' => self.punct(TokenKind::Semicolon),
            '.' => self.punct(TokenKind::Dot),
            '|' => self.punct(TokenKind::Pipe),
            '&' => self.punct(TokenKind::Amp),
            '?' => self.punct(TokenKind::Question),
            '*' => self.punct(TokenKind::Star),
            '+' => self.punct(TokenKind::Plus),
            '~' => self.punct(TokenKind::Tilde),
            c if c.is_ascii_digit() => self.read_integer(position)?,
            ':' => {
                self.bump();
                let local = self.read_local();
                TokenKind::PrefixedName {
                    prefix: String::new(),
                    local,
                }
            }
            c if is_name_start(c) => self.read_word(position)?,
            other => return Err(self.error(ShexParseErrorKind::InvalidToken(other), position)),
        };

        Ok(Token { kind, position })
    }

    fn punct(&mut self, kind: TokenKind) -> TokenKind {
        self.bump();
        kind
    }

    /// Reads the body of an IRIREF after the opening `<`.
    fn read_iri_body(&mut self, start: Position) -> Result<String, ShexParseError> {
        let mut iri = String::new();
        loop {
            match self.peek() {
                None => return Err(self.error(ShexParseErrorKind::UnterminatedIri, start)),
                Some('>') => {
                    self.bump();
                    return Ok(iri);
                }
                Some('\n') => {
                    return Err(self.error(ShexParseErrorKind::UnterminatedIri, start));
                }
                Some(c) => {
                    self.bump();
                    iri.push(c);
                }
            }
        }
    }

    fn read_string(&mut self, quote: char, start: Position) -> Result<TokenKind, ShexParseError> {
        self.bump();
        let mut value = String::new();
        loop {
            match self.peek() {
                None => return Err(self.error(ShexParseErrorKind::UnterminatedString, start)),
                Some('\n') => {
                    return Err(self.error(ShexParseErrorKind::UnterminatedString, start));
                }
                Some(c) if c == quote => {
                    self.bump();
                    return Ok(TokenKind::StringLiteral(value));
                }
                Some('\\') => {
                    let escape_position = self.position();
                    self.bump();
                    value.push(self.read_escape(escape_position)?);
                }
                Some(c) => {
                    self.bump();
                    value.push(c);
                }
            }
        }
    }

    fn read_escape(&mut self, position: Position) -> Result<char, ShexParseError> {
        let Some(c) = self.bump() else {
            return Err(self.error(ShexParseErrorKind::UnterminatedString, position));
        };
        match c {
            'n' => Ok('\n'),
            't' => Ok('\t'),
            'r' => Ok('\r'),
            '"' => Ok('"'),
            '\'' => Ok('\''),
            '\\' => Ok('\\'),
            'u' => {
                let mut code = 0u32;
                for _ in 0..4 {
                    let Some(d) = self.bump().and_then(|c| c.to_digit(16)) else {
                        return Err(self.error(ShexParseErrorKind::BadEscape('u'), position));
                    };
                    code = code * 16 + d;
                }
                char::from_u32(code)
                    .ok_or_else(|| self.error(ShexParseErrorKind::BadEscape('u'), position))
            }
            other => Err(self.error(ShexParseErrorKind::BadEscape(other), position)),
        }
    }

    fn read_integer(&mut self, position: Position) -> Result<TokenKind, ShexParseError> {
        let mut digits = String::new();
        while let Some(c) = self.peek() {
            if !c.is_ascii_digit() {
                break;
            }
            digits.push(c);
            self.bump();
        }
        digits
            .parse()
            .map(TokenKind::Integer)
            .map_err(|_| self.error(ShexParseErrorKind::InvalidInteger, position))
    }

    /// `@` starts a shape reference (`@<iri>`, `@pn:local`) or, after a
    /// string literal, a language tag (`@en`). The distinction is purely
    /// lexical: references always carry `<` or a colon.
    fn read_at(&mut self, position: Position) -> Result<TokenKind, ShexParseError> {
        self.bump();
        match self.peek() {
            Some('<') => {
                self.bump();
                Ok(TokenKind::RefIri(self.read_iri_body(position)?))
            }
            Some(':') => {
                self.bump();
                let local = self.read_local();
                Ok(TokenKind::RefPname {
                    prefix: String::new(),
                    local,
                })
            }
            Some(c) if is_name_start(c) => {
                let word = self.read_name_chars();
                if self.peek() == Some(':') {
                    self.bump();
                    let local = self.read_local();
                    Ok(TokenKind::RefPname {
                        prefix: word,
                        local,
                    })
                } else {
                    Ok(TokenKind::LangTag(word))
                }
            }
            _ => Err(self.error(ShexParseErrorKind::InvalidToken('@'), position)),
        }
    }

    /// Reads a bare word: a keyword, or the prefix part of a PNAME.
    fn read_word(&mut self, position: Position) -> Result<TokenKind, ShexParseError> {
        let word = self.read_name_chars();
        if self.peek() == Some(':') {
            self.bump();
            let local = self.read_local();
            return Ok(TokenKind::PrefixedName {
                prefix: word,
                local,
            });
        }
        match Keyword::from_word(&word) {
            Some(keyword) => Ok(TokenKind::Keyword(keyword)),
            None => Err(self.error(
                ShexParseErrorKind::InvalidToken(word.chars().next().unwrap_or('?')),
                position,
            )),
        }
    }

    fn read_name_chars(&mut self) -> String {
        let mut word = String::new();
        while let Some(c) = self.peek() {
            if c.is_alphanumeric() || matches!(c, '_' | '-') {
                word.push(c);
                self.bump();
            } else {
                break;
            }
        }
        word
    }

    /// Reads a PN_LOCAL run. A trailing `.` belongs to the surrounding
    /// syntax, not the name, so it is handed back.
    fn read_local(&mut self) -> String {
        let mut local = String::new();
        while let Some(c) = self.peek() {
            if c.is_alphanumeric() || matches!(c, '_' | '-' | '.' | '%') {
                local.push(c);
                self.bump();
            } else {
                break;
            }
        }
        while local.ends_with('.') {
            local.pop();
            // Hand the dot back to the stream; `.` is ASCII so byte
            // arithmetic is safe.
            self.offset -= 1;
            self.column -= 1;
        }
        local
    }
}

fn is_name_start(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

/// Tokenizes a whole document eagerly. Used by tests; the parser pulls
/// tokens one at a time instead.
#[cfg(test)]
pub(crate) fn tokenize(src: &str) -> Result<Vec<TokenKind>, ShexParseError> {
    let mut lexer = Lexer::new(src);
    let mut tokens = Vec::new();
    loop {
        let token = lexer.next_token()?;
        let done = token.kind == TokenKind::Eof;
        tokens.push(token.kind);
        if done {
            return Ok(tokens);
        }
    }
}

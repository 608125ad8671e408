//! GRPL Lexer and Tokenizer
//!
//! Splits program text into whitespace-separated tokens. Every token records
//! its byte span so the parser can attach source locations to statements.

use crate::error::ParseError;

/// GRPL token types
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // Literals
    Int(i64),
    Float(f64),
    Str(String),
    True,
    False,

    // Sigils
    LoadVar(String),       // <name
    StoreVar(String),      // >name
    Call(Option<String>),  // @ or @name
    FunNamed(String),      // fun@name

    // Keywords
    If,
    Then,
    Elif,
    Else,
    While,
    Do,
    End,
    Fun,

    /// Any other word; executed as a command
    Ident(String),

    // End of file
    Eof,
}

impl TokenKind {
    /// Keywords that close or split a block
    pub fn is_block_keyword(&self) -> bool {
        matches!(
            self,
            TokenKind::Then | TokenKind::Elif | TokenKind::Else | TokenKind::Do | TokenKind::End
        )
    }

    /// Spelling used in parser diagnostics
    pub fn describe(&self) -> String {
        match self {
            TokenKind::Int(v) => v.to_string(),
            TokenKind::Float(v) => format!("{:?}", v),
            TokenKind::Str(s) => format!("\"{}\"", s),
            TokenKind::True => "true".into(),
            TokenKind::False => "false".into(),
            TokenKind::LoadVar(n) => format!("<{}", n),
            TokenKind::StoreVar(n) => format!(">{}", n),
            TokenKind::Call(None) => "@".into(),
            TokenKind::Call(Some(n)) => format!("@{}", n),
            TokenKind::FunNamed(n) => format!("fun@{}", n),
            TokenKind::If => "if".into(),
            TokenKind::Then => "then".into(),
            TokenKind::Elif => "elif".into(),
            TokenKind::Else => "else".into(),
            TokenKind::While => "while".into(),
            TokenKind::Do => "do".into(),
            TokenKind::End => "end".into(),
            TokenKind::Fun => "fun".into(),
            TokenKind::Ident(n) => n.clone(),
            TokenKind::Eof => "end of input".into(),
        }
    }
}

/// A token plus the byte range it was read from
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub start: usize,
    pub end: usize,
}

/// GRPL lexer
pub struct Lexer<'a> {
    source: &'a str,
    pos: usize,
}

fn is_name_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '_' || ch == '-'
}

impl<'a> Lexer<'a> {
    /// Create a new lexer
    pub fn new(source: &'a str) -> Self {
        Self { source, pos: 0 }
    }

    /// Read every token, ending with a single [`TokenKind::Eof`]
    pub fn tokenize(mut self) -> Result<Vec<Token>, ParseError> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token()?;
            let done = token.kind == TokenKind::Eof;
            tokens.push(token);
            if done {
                return Ok(tokens);
            }
        }
    }

    /// Get the next token
    pub fn next_token(&mut self) -> Result<Token, ParseError> {
        self.skip_whitespace();

        let start = self.pos;
        let kind = match self.ch() {
            None => {
                return Ok(Token {
                    kind: TokenKind::Eof,
                    start,
                    end: start,
                })
            }
            Some('"') => self.read_string()?,
            Some('<') => TokenKind::LoadVar(self.read_sigil_name("<")?),
            Some('>') => TokenKind::StoreVar(self.read_sigil_name(">")?),
            Some('@') => {
                self.advance();
                let name = self.read_name();
                TokenKind::Call(if name.is_empty() { None } else { Some(name) })
            }
            Some(ch) if ch.is_ascii_digit() => self.read_number()?,
            Some('-') if self.peek().is_some_and(|c| c.is_ascii_digit()) => self.read_number()?,
            Some(ch) if is_name_char(ch) => self.read_word()?,
            Some(ch) => return Err(self.error(start, format!("unexpected character `{}`", ch))),
        };
        let end = self.pos;

        // Tokens must be separated by whitespace
        if let Some(ch) = self.ch() {
            if !ch.is_whitespace() {
                return Err(self.error(
                    end,
                    format!(
                        "unexpected character `{}` after `{}`",
                        ch,
                        &self.source[start..end]
                    ),
                ));
            }
        }

        Ok(Token { kind, start, end })
    }

    /// Skip whitespace and `#` line comments
    fn skip_whitespace(&mut self) {
        while let Some(ch) = self.ch() {
            if ch.is_whitespace() {
                self.advance();
            } else if ch == '#' {
                while self.ch().is_some_and(|c| c != '\n') {
                    self.advance();
                }
            } else {
                break;
            }
        }
    }

    /// Read a string literal; there are no escape sequences
    fn read_string(&mut self) -> Result<TokenKind, ParseError> {
        let start = self.pos;
        self.advance();
        let body_start = self.pos;
        match self.source[body_start..].find('"') {
            Some(len) => {
                self.pos = body_start + len + 1;
                Ok(TokenKind::Str(self.source[body_start..body_start + len].to_string()))
            }
            None => {
                self.pos = self.source.len();
                Err(self.error(start, "unterminated string literal"))
            }
        }
    }

    /// Read the name following a `<` or `>` sigil
    fn read_sigil_name(&mut self, sigil: &str) -> Result<String, ParseError> {
        let start = self.pos;
        self.advance();
        let name = self.read_name();
        if name.is_empty() {
            return Err(self.error(start, format!("expected a variable name after `{}`", sigil)));
        }
        Ok(name)
    }

    /// Read a number literal
    fn read_number(&mut self) -> Result<TokenKind, ParseError> {
        let start = self.pos;
        if self.ch() == Some('-') {
            self.advance();
        }
        self.skip_digits();

        let is_float = self.ch() == Some('.') && self.peek().is_some_and(|c| c.is_ascii_digit());
        if is_float {
            self.advance();
            self.skip_digits();
        }

        let text = &self.source[start..self.pos];
        if is_float {
            text.parse::<f64>()
                .map(TokenKind::Float)
                .map_err(|_| self.error(start, format!("invalid number `{}`", text)))
        } else {
            text.parse::<i64>()
                .map(TokenKind::Int)
                .map_err(|_| self.error(start, format!("integer literal `{}` is out of range", text)))
        }
    }

    /// Read an identifier, keyword or `fun@name`
    fn read_word(&mut self) -> Result<TokenKind, ParseError> {
        let start = self.pos;
        let word = self.read_name();

        if word == "fun" && self.ch() == Some('@') {
            self.advance();
            let name = self.read_name();
            if name.is_empty() {
                return Err(self.error(start, "expected a function name after `fun@`"));
            }
            return Ok(TokenKind::FunNamed(name));
        }

        Ok(match word.as_str() {
            "if" => TokenKind::If,
            "then" => TokenKind::Then,
            "elif" => TokenKind::Elif,
            "else" => TokenKind::Else,
            "while" => TokenKind::While,
            "do" => TokenKind::Do,
            "end" => TokenKind::End,
            "fun" => TokenKind::Fun,
            "true" => TokenKind::True,
            "false" => TokenKind::False,
            _ => TokenKind::Ident(word),
        })
    }

    fn read_name(&mut self) -> String {
        let start = self.pos;
        while self.ch().is_some_and(is_name_char) {
            self.advance();
        }
        self.source[start..self.pos].to_string()
    }

    fn skip_digits(&mut self) {
        while self.ch().is_some_and(|c| c.is_ascii_digit()) {
            self.advance();
        }
    }

    fn ch(&self) -> Option<char> {
        self.source[self.pos..].chars().next()
    }

    fn peek(&self) -> Option<char> {
        let mut chars = self.source[self.pos..].chars();
        chars.next();
        chars.next()
    }

    fn advance(&mut self) {
        if let Some(ch) = self.ch() {
            self.pos += ch.len_utf8();
        }
    }

    fn error(&self, position: usize, message: impl Into<String>) -> ParseError {
        ParseError::at(self.source, position, message)
    }
}

//! GRPL Parser
//!
//! Recursive descent over the token list. Blocks are parsed until one of a
//! caller-supplied set of closing keywords, so nesting falls out naturally.

use crate::error::ParseError;
use crate::grpl::ast::{IfBranch, Statement};
use crate::grpl::lexer::{Lexer, Token, TokenKind};
use crate::location::SourceLocation;
use crate::value::Value;
use std::sync::Arc;

/// Deepest nesting of `if`, `while` and `fun` blocks accepted
pub const MAX_NESTING: usize = 128;

/// GRPL parser
pub struct Parser {
    source: Arc<str>,
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
}

impl Parser {
    /// Tokenize `source` and prepare to parse it
    pub fn new(source: &str) -> Result<Self, ParseError> {
        let tokens = Lexer::new(source).tokenize()?;
        Ok(Self {
            source: Arc::from(source),
            tokens,
            pos: 0,
            depth: 0,
        })
    }

    /// Parse the whole program
    pub fn parse(mut self) -> Result<Vec<Statement>, ParseError> {
        let (statements, _) = self.block(&[], "program")?;
        Ok(statements)
    }

    /// Parse statements until one of `closers` (consumed and returned) or,
    /// when `closers` is empty, until end of input
    fn block(
        &mut self,
        closers: &[TokenKind],
        context: &str,
    ) -> Result<(Vec<Statement>, TokenKind), ParseError> {
        let mut statements = Vec::new();
        loop {
            let token = self.current().clone();
            if token.kind == TokenKind::Eof {
                if closers.is_empty() {
                    return Ok((statements, TokenKind::Eof));
                }
                return Err(self.error_at(
                    token.start,
                    format!(
                        "unexpected end of input, expected {} to close {}",
                        expected_list(closers),
                        context
                    ),
                ));
            }
            if token.kind.is_block_keyword() {
                if closers.contains(&token.kind) {
                    self.advance();
                    return Ok((statements, token.kind));
                }
                return Err(self.error_at(
                    token.start,
                    format!("unexpected `{}` in {}", token.kind.describe(), context),
                ));
            }
            statements.push(self.statement()?);
        }
    }

    fn statement(&mut self) -> Result<Statement, ParseError> {
        let token = self.advance();
        let loc = Some(self.location(&token));

        let stmt = match token.kind {
            TokenKind::Int(v) => Statement::Literal {
                value: Value::Int(v),
                loc,
            },
            TokenKind::Float(v) => Statement::Literal {
                value: Value::Float(v),
                loc,
            },
            TokenKind::Str(s) => Statement::Literal {
                value: Value::String(s),
                loc,
            },
            TokenKind::True => Statement::Literal {
                value: Value::Bool(true),
                loc,
            },
            TokenKind::False => Statement::Literal {
                value: Value::Bool(false),
                loc,
            },
            TokenKind::LoadVar(name) => Statement::LoadVar { name, loc },
            TokenKind::StoreVar(name) => Statement::StoreVar { name, loc },
            TokenKind::Ident(name) => Statement::Command { name, loc },
            TokenKind::Call(name) => Statement::Call { name, loc },
            TokenKind::If => self.nested(token.start, Self::if_statement)?,
            TokenKind::While => self.nested(token.start, Self::while_statement)?,
            TokenKind::Fun => self.nested(token.start, |p| p.function(None, loc))?,
            TokenKind::FunNamed(name) => {
                self.nested(token.start, |p| p.function(Some(name), loc))?
            }
            other => {
                return Err(self.error_at(
                    token.start,
                    format!("unexpected `{}`", other.describe()),
                ))
            }
        };
        Ok(stmt)
    }

    /// Parse a block statement one level deeper
    fn nested(
        &mut self,
        position: usize,
        parse: impl FnOnce(&mut Self) -> Result<Statement, ParseError>,
    ) -> Result<Statement, ParseError> {
        if self.depth >= MAX_NESTING {
            return Err(self.error_at(
                position,
                format!("blocks are nested more than {} deep", MAX_NESTING),
            ));
        }
        self.depth += 1;
        let result = parse(self);
        self.depth -= 1;
        result
    }

    fn if_statement(&mut self) -> Result<Statement, ParseError> {
        let mut branches = Vec::new();
        let mut else_body = None;

        loop {
            let (cond, _) = self.block(&[TokenKind::Then], "`if` condition")?;
            let (body, closer) = self.block(
                &[TokenKind::Elif, TokenKind::Else, TokenKind::End],
                "`if` block",
            )?;
            branches.push(IfBranch { cond, body });

            match closer {
                TokenKind::Elif => continue,
                TokenKind::Else => {
                    let (body, _) = self.block(&[TokenKind::End], "`else` block")?;
                    else_body = Some(body);
                    break;
                }
                _ => break,
            }
        }

        Ok(Statement::If {
            branches,
            else_body,
        })
    }

    fn while_statement(&mut self) -> Result<Statement, ParseError> {
        let (cond, _) = self.block(&[TokenKind::Do], "`while` condition")?;
        let (body, _) = self.block(&[TokenKind::End], "`while` body")?;
        Ok(Statement::While { cond, body })
    }

    fn function(
        &mut self,
        name: Option<String>,
        loc: Option<SourceLocation>,
    ) -> Result<Statement, ParseError> {
        let (body, _) = self.block(&[TokenKind::End], "function body")?;
        Ok(Statement::Function {
            name,
            body: body.into(),
            loc,
        })
    }

    fn current(&self) -> &Token {
        // The lexer always ends the list with Eof, and `advance` never moves past it
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn advance(&mut self) -> Token {
        let token = self.current().clone();
        if token.kind != TokenKind::Eof {
            self.pos += 1;
        }
        token
    }

    fn location(&self, token: &Token) -> SourceLocation {
        SourceLocation::new(self.source.clone(), token.start, token.end)
    }

    fn error_at(&self, position: usize, message: String) -> ParseError {
        ParseError::at(&self.source, position, message)
    }
}

fn expected_list(closers: &[TokenKind]) -> String {
    let names: Vec<String> = closers
        .iter()
        .map(|k| format!("`{}`", k.describe()))
        .collect();
    names.join(" or ")
}

use std::mem;

use thiserror::Error;

use crate::{
    ast::{BinOp, Expr, Token},
    lexer::{LexError, Lexer},
    path::PropertyPath,
};

/// Syntax errors in a condition expression.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    #[error(transparent)]
    Lex(#[from] LexError),

    #[error("expected {expected}, got {found:?} at position {position}")]
    UnexpectedToken {
        expected: String,
        found: Token,
        position: usize,
    },

    #[error("invalid property path '{path}': {reason}")]
    InvalidPath { path: String, reason: String },
}

/// Recursive-descent parser for `/*IF ...*/` conditions.
///
/// Precedence, loosest first: `||`, `&&`, `!`, comparison, primary.
pub struct Parser {
    lexer: Lexer,
    current_token: Token,
}

impl Parser {
    pub fn new(mut lexer: Lexer) -> Result<Self, ParseError> {
        let current_token = lexer.next_token()?;
        Ok(Parser {
            lexer,
            current_token,
        })
    }

    fn advance(&mut self) -> Result<(), ParseError> {
        self.current_token = self.lexer.next_token()?;
        Ok(())
    }

    fn unexpected(&self, expected: impl Into<String>) -> ParseError {
        ParseError::UnexpectedToken {
            expected: expected.into(),
            found: self.current_token.clone(),
            position: self.lexer.position(),
        }
    }

    fn expect(&mut self, expected: Token) -> Result<(), ParseError> {
        if !self.check(&expected) {
            return Err(self.unexpected(format!("{:?}", expected)));
        }
        self.advance()
    }

    fn check(&self, token: &Token) -> bool {
        mem::discriminant(&self.current_token) == mem::discriminant(token)
    }

    /// Parse primary expressions: literals, paths, method queries, groups
    fn parse_primary(&mut self) -> Result<Expr, ParseError> {
        match mem::replace(&mut self.current_token, Token::Eof) {
            Token::Float(n) => {
                self.advance()?;
                Ok(Expr::Float(n))
            }
            Token::Integer(n) => {
                self.advance()?;
                Ok(Expr::Integer(n))
            }
            Token::String(s) => {
                self.advance()?;
                Ok(Expr::String(s))
            }
            Token::Boolean(b) => {
                self.advance()?;
                Ok(Expr::Boolean(b))
            }
            Token::Null => {
                self.advance()?;
                Ok(Expr::Null)
            }
            Token::LParen => {
                self.advance()?;
                let expr = self.parse_expression()?;
                self.expect(Token::RParen)?;
                Ok(expr)
            }
            Token::Identifier(head) => {
                self.advance()?;
                self.parse_path(head)
            }
            token => {
                self.current_token = token;
                Err(self.unexpected("literal, path or '('"))
            }
        }
    }

    /// Parse the rest of a dotted path after its first segment.
    ///
    /// A trailing `name()` turns the path into a method query on its prefix.
    fn parse_path(&mut self, head: String) -> Result<Expr, ParseError> {
        let mut segments = vec![head];

        while self.check(&Token::Dot) {
            self.advance()?;
            match mem::replace(&mut self.current_token, Token::Eof) {
                Token::Identifier(name) => {
                    self.advance()?;
                    if self.check(&Token::LParen) {
                        self.advance()?;
                        self.expect(Token::RParen)?;
                        let target = build_path(&segments)?;
                        return Ok(Expr::MethodCall {
                            target,
                            method: name,
                        });
                    }
                    segments.push(name);
                }
                Token::Integer(n) if n >= 0 => {
                    self.advance()?;
                    segments.push(n.to_string());
                }
                token => {
                    self.current_token = token;
                    return Err(self.unexpected("property name after '.'"));
                }
            }
        }

        Ok(Expr::Path(build_path(&segments)?))
    }

    fn parse_comparison(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_primary()?;

        if let Some(op) = match &self.current_token {
            Token::EqEq => Some(BinOp::Equal),
            Token::NotEq => Some(BinOp::NotEqual),
            Token::Lt => Some(BinOp::LessThan),
            Token::Gt => Some(BinOp::GreaterThan),
            Token::LtEq => Some(BinOp::LessEqual),
            Token::GtEq => Some(BinOp::GreaterEqual),
            _ => None,
        } {
            self.advance()?;
            let right = self.parse_primary()?;

            left = Expr::BinaryOp {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn parse_not(&mut self) -> Result<Expr, ParseError> {
        if self.check(&Token::Exclamation) {
            self.advance()?;
            let operand = self.parse_not()?;
            return Ok(Expr::Not(Box::new(operand)));
        }
        self.parse_comparison()
    }

    fn parse_and(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_not()?;

        while self.check(&Token::And) {
            self.advance()?;
            let right = self.parse_not()?;

            left = Expr::BinaryOp {
                op: BinOp::And,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn parse_or(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_and()?;

        while self.check(&Token::Or) {
            self.advance()?;
            let right = self.parse_and()?;

            left = Expr::BinaryOp {
                op: BinOp::Or,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    pub fn parse_expression(&mut self) -> Result<Expr, ParseError> {
        self.parse_or()
    }

    /// Parse a complete expression; trailing tokens are an error.
    pub fn parse(&mut self) -> Result<Expr, ParseError> {
        let expr = self.parse_expression()?;
        self.expect(Token::Eof)?;
        Ok(expr)
    }
}

fn build_path(segments: &[String]) -> Result<PropertyPath, ParseError> {
    let text = segments.join(".");
    PropertyPath::parse(&text).map_err(|reason| ParseError::InvalidPath { path: text, reason })
}

/// Parse condition source text into an expression.
pub fn parse_condition(source: &str) -> Result<Expr, ParseError> {
    Parser::new(Lexer::new(source))?.parse()
}

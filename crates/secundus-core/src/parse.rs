//! Recursive-descent parser for infix expressions.
//!
//! Grammar, loosest to tightest binding:
//!
//! ```text
//! expr   := term (('+' | '-') term)*
//! term   := unary (('*' | '/') unary)*
//! unary  := '-' unary | power
//! power  := atom ('^' unary)?            (right-associative)
//! atom   := number | ident | ident '(' expr ')' | '(' expr ')'
//! ```
//!
//! Numbers accept decimal and scientific notation; identifiers start with a
//! letter or underscore. A call to an unknown function name is rejected at
//! parse time rather than left to fail during evaluation.

use thiserror::Error;

use crate::arena::ExprArena;
use crate::expr::{ExprHandle, Func};

/// Errors produced while parsing an expression.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ParseError {
    /// The input contained no tokens.
    #[error("empty expression")]
    Empty,

    /// A character outside the expression alphabet.
    #[error("unexpected character '{ch}' at byte {pos}")]
    UnexpectedChar {
        /// The offending character.
        ch: char,
        /// Byte offset into the source.
        pos: usize,
    },

    /// A token that cannot start or continue the current production.
    #[error("unexpected '{found}' at byte {pos}")]
    UnexpectedToken {
        /// Rendering of the offending token.
        found: String,
        /// Byte offset into the source.
        pos: usize,
    },

    /// The expression ended mid-production.
    #[error("unexpected end of expression")]
    UnexpectedEnd,

    /// A numeric literal that does not parse as `f64`.
    #[error("invalid number literal at byte {pos}")]
    InvalidNumber {
        /// Byte offset into the source.
        pos: usize,
    },

    /// A call to a function name the engine does not know.
    #[error("unknown function '{name}' at byte {pos}")]
    UnknownFunction {
        /// The unrecognized function name.
        name: String,
        /// Byte offset into the source.
        pos: usize,
    },
}

#[derive(Clone, Debug, PartialEq)]
enum TokenKind {
    Number(f64),
    Ident(String),
    Plus,
    Minus,
    Star,
    Slash,
    Caret,
    LParen,
    RParen,
}

impl TokenKind {
    fn render(&self) -> String {
        match self {
            TokenKind::Number(n) => n.to_string(),
            TokenKind::Ident(name) => name.clone(),
            TokenKind::Plus => "+".to_string(),
            TokenKind::Minus => "-".to_string(),
            TokenKind::Star => "*".to_string(),
            TokenKind::Slash => "/".to_string(),
            TokenKind::Caret => "^".to_string(),
            TokenKind::LParen => "(".to_string(),
            TokenKind::RParen => ")".to_string(),
        }
    }
}

#[derive(Clone, Debug)]
struct Token {
    kind: TokenKind,
    pos: usize,
}

fn tokenize(src: &str) -> Result<Vec<Token>, ParseError> {
    let mut tokens = Vec::new();
    let bytes = src.as_bytes();
    let mut pos = 0;

    while pos < bytes.len() {
        let ch = src[pos..].chars().next().unwrap_or('\0');
        let kind = match ch {
            c if c.is_whitespace() => {
                pos += c.len_utf8();
                continue;
            }
            '+' => TokenKind::Plus,
            '-' => TokenKind::Minus,
            '*' => TokenKind::Star,
            '/' => TokenKind::Slash,
            '^' => TokenKind::Caret,
            '(' => TokenKind::LParen,
            ')' => TokenKind::RParen,
            c if c.is_ascii_digit() || c == '.' => {
                let start = pos;
                while pos < bytes.len() && (bytes[pos].is_ascii_digit() || bytes[pos] == b'.') {
                    pos += 1;
                }
                // optional exponent
                if pos < bytes.len() && (bytes[pos] == b'e' || bytes[pos] == b'E') {
                    let mut end = pos + 1;
                    if end < bytes.len() && (bytes[end] == b'+' || bytes[end] == b'-') {
                        end += 1;
                    }
                    if end < bytes.len() && bytes[end].is_ascii_digit() {
                        pos = end;
                        while pos < bytes.len() && bytes[pos].is_ascii_digit() {
                            pos += 1;
                        }
                    }
                }
                let value: f64 = src[start..pos]
                    .parse()
                    .map_err(|_| ParseError::InvalidNumber { pos: start })?;
                tokens.push(Token {
                    kind: TokenKind::Number(value),
                    pos: start,
                });
                continue;
            }
            c if c.is_alphabetic() || c == '_' => {
                let start = pos;
                while pos < bytes.len() {
                    let rest = src[pos..].chars().next().unwrap_or('\0');
                    if rest.is_alphanumeric() || rest == '_' {
                        pos += rest.len_utf8();
                    } else {
                        break;
                    }
                }
                tokens.push(Token {
                    kind: TokenKind::Ident(src[start..pos].to_string()),
                    pos: start,
                });
                continue;
            }
            c => return Err(ParseError::UnexpectedChar { ch: c, pos }),
        };
        tokens.push(Token { kind, pos });
        pos += ch.len_utf8();
    }

    Ok(tokens)
}

struct Parser<'a> {
    arena: &'a mut ExprArena,
    tokens: Vec<Token>,
    idx: usize,
}

impl Parser<'_> {
    fn peek(&self) -> Option<&TokenKind> {
        self.tokens.get(self.idx).map(|t| &t.kind)
    }

    fn next(&mut self) -> Result<Token, ParseError> {
        let token = self
            .tokens
            .get(self.idx)
            .cloned()
            .ok_or(ParseError::UnexpectedEnd)?;
        self.idx += 1;
        Ok(token)
    }

    fn expect_rparen(&mut self) -> Result<(), ParseError> {
        let token = self.next()?;
        if token.kind == TokenKind::RParen {
            Ok(())
        } else {
            Err(ParseError::UnexpectedToken {
                found: token.kind.render(),
                pos: token.pos,
            })
        }
    }

    fn expr(&mut self) -> Result<ExprHandle, ParseError> {
        let mut lhs = self.term()?;
        loop {
            match self.peek() {
                Some(TokenKind::Plus) => {
                    self.idx += 1;
                    let rhs = self.term()?;
                    lhs = self.arena.add(smallvec::smallvec![lhs, rhs]);
                }
                Some(TokenKind::Minus) => {
                    self.idx += 1;
                    let rhs = self.term()?;
                    let neg = self.arena.neg(rhs);
                    lhs = self.arena.add(smallvec::smallvec![lhs, neg]);
                }
                _ => return Ok(lhs),
            }
        }
    }

    fn term(&mut self) -> Result<ExprHandle, ParseError> {
        let mut lhs = self.unary()?;
        loop {
            match self.peek() {
                Some(TokenKind::Star) => {
                    self.idx += 1;
                    let rhs = self.unary()?;
                    lhs = self.arena.mul(smallvec::smallvec![lhs, rhs]);
                }
                Some(TokenKind::Slash) => {
                    self.idx += 1;
                    let rhs = self.unary()?;
                    lhs = self.arena.div(lhs, rhs);
                }
                _ => return Ok(lhs),
            }
        }
    }

    fn unary(&mut self) -> Result<ExprHandle, ParseError> {
        if self.peek() == Some(&TokenKind::Minus) {
            self.idx += 1;
            let inner = self.unary()?;
            return Ok(self.arena.neg(inner));
        }
        self.power()
    }

    fn power(&mut self) -> Result<ExprHandle, ParseError> {
        let base = self.atom()?;
        if self.peek() == Some(&TokenKind::Caret) {
            self.idx += 1;
            // right-associative, and the exponent may carry a unary minus
            let exp = self.unary()?;
            return Ok(self.arena.pow(base, exp));
        }
        Ok(base)
    }

    fn atom(&mut self) -> Result<ExprHandle, ParseError> {
        let token = self.next()?;
        match token.kind {
            TokenKind::Number(value) => Ok(self.arena.number(value)),
            TokenKind::Ident(name) => {
                if self.peek() == Some(&TokenKind::LParen) {
                    self.idx += 1;
                    let func = Func::from_name(&name).ok_or(ParseError::UnknownFunction {
                        name,
                        pos: token.pos,
                    })?;
                    let arg = self.expr()?;
                    self.expect_rparen()?;
                    Ok(self.arena.func(func, arg))
                } else {
                    Ok(self.arena.symbol(&name))
                }
            }
            TokenKind::LParen => {
                let inner = self.expr()?;
                self.expect_rparen()?;
                Ok(inner)
            }
            kind => Err(ParseError::UnexpectedToken {
                found: kind.render(),
                pos: token.pos,
            }),
        }
    }
}

/// Parses an infix expression into the arena, returning the root handle.
///
/// # Errors
///
/// Returns a [`ParseError`] describing the first offending token.
pub fn parse(arena: &mut ExprArena, src: &str) -> Result<ExprHandle, ParseError> {
    let tokens = tokenize(src)?;
    if tokens.is_empty() {
        return Err(ParseError::Empty);
    }

    let mut parser = Parser {
        arena,
        tokens,
        idx: 0,
    };
    let expr = parser.expr()?;

    if let Some(token) = parser.tokens.get(parser.idx) {
        return Err(ParseError::UnexpectedToken {
            found: token.kind.render(),
            pos: token.pos,
        });
    }

    Ok(expr)
}

//! Recursive-descent grammar over the token stream.
//!
//! ```text
//! expression := or_expr
//! or_expr    := and_expr (`|` and_expr)*     left-assoc, lowest precedence
//! and_expr   := term (`&` term)*             left-assoc, binds tighter
//! term       := comparison | `(` expression `)`
//! comparison := FIELD OPERATOR LITERAL
//! ```

use crate::ast::Ast;
use crate::error::ParseError;
use crate::token::{FieldPath, SurfaceOp, Token, Value};

pub fn parse(tokens: Vec<Token>, max_depth: usize) -> Result<Ast, ParseError> {
    let end = tokens.last().map(Token::end_position).unwrap_or(0);
    let mut parser = Parser {
        tokens,
        pos: 0,
        max_depth,
        end,
    };
    let ast = parser.or_expr(0)?;
    match parser.peek() {
        None => Ok(ast),
        Some(token) => Err(ParseError::Unexpected {
            position: token.position(),
            expected: "end of filter",
            found: token.describe(),
        }),
    }
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    max_depth: usize,
    end: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn or_expr(&mut self, depth: usize) -> Result<Ast, ParseError> {
        let mut children = vec![self.and_expr(depth)?];
        while matches!(self.peek(), Some(Token::Or { .. })) {
            self.pos += 1;
            children.push(self.and_expr(depth)?);
        }
        Ok(collapse(children, Ast::Or))
    }

    fn and_expr(&mut self, depth: usize) -> Result<Ast, ParseError> {
        let mut children = vec![self.term(depth)?];
        while matches!(self.peek(), Some(Token::And { .. })) {
            self.pos += 1;
            children.push(self.term(depth)?);
        }
        Ok(collapse(children, Ast::And))
    }

    fn term(&mut self, depth: usize) -> Result<Ast, ParseError> {
        match self.advance() {
            None => Err(ParseError::UnexpectedEnd {
                position: self.end,
                expected: "a field comparison or `(`",
            }),
            Some(Token::GroupOpen { position }) => {
                if depth + 1 > self.max_depth {
                    return Err(ParseError::TooDeep {
                        position,
                        max: self.max_depth,
                    });
                }
                let inner = self.or_expr(depth + 1)?;
                match self.advance() {
                    Some(Token::GroupClose { .. }) => Ok(inner),
                    Some(token) => Err(ParseError::Unexpected {
                        position: token.position(),
                        expected: "`)`",
                        found: token.describe(),
                    }),
                    None => Err(ParseError::UnclosedGroup { position }),
                }
            }
            Some(Token::Field { path, .. }) => self.comparison(path),
            Some(token) => Err(ParseError::Unexpected {
                position: token.position(),
                expected: "a field comparison or `(`",
                found: token.describe(),
            }),
        }
    }

    fn comparison(&mut self, field: FieldPath) -> Result<Ast, ParseError> {
        let op = match self.advance() {
            Some(Token::Operator { op, .. }) => op,
            Some(token) => {
                return Err(ParseError::Unexpected {
                    position: token.position(),
                    expected: "a comparison operator",
                    found: token.describe(),
                })
            }
            None => {
                return Err(ParseError::UnexpectedEnd {
                    position: self.end,
                    expected: "a comparison operator",
                })
            }
        };
        let (value, position) = match self.advance() {
            Some(Token::Literal { value, start, .. }) => (value, start),
            Some(token) => {
                return Err(ParseError::Unexpected {
                    position: token.position(),
                    expected: "a literal value",
                    found: token.describe(),
                })
            }
            None => {
                return Err(ParseError::UnexpectedEnd {
                    position: self.end,
                    expected: "a literal value",
                })
            }
        };
        // Literal shape is a structural property of the token stream,
        // so arity is checked here rather than at compilation.
        match (&value, op.takes_list()) {
            (Value::List(items), true) => {
                if op == SurfaceOp::Range && items.len() != 2 {
                    return Err(ParseError::RangeBounds {
                        count: items.len(),
                        position,
                    });
                }
            }
            (Value::List(_), false) => return Err(ParseError::ScalarRequired { op, position }),
            (_, true) => return Err(ParseError::ListRequired { op, position }),
            (_, false) => {}
        }
        Ok(Ast::Comparison { field, op, value })
    }
}

fn collapse(mut children: Vec<Ast>, combine: fn(Vec<Ast>) -> Ast) -> Ast {
    if children.len() == 1 {
        children.swap_remove(0)
    } else {
        combine(children)
    }
}

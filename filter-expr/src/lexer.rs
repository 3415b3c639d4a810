//! Lexical analysis: raw filter string to token sequence.
//!
//! Comparisons are dotted words (`field.op.value`); `&`, `|`, `(` and `)`
//! separate and group them. Inside single- or double-quoted literals a
//! backslash escapes the next character. Positions are character offsets.

use crate::error::LexError;
use crate::token::{FieldPath, SurfaceOp, Token, Value};

/// Characters that terminate an unquoted literal element.
const DELIMITERS: &str = "&|(),\"'";

pub fn tokenize(input: &str) -> Result<Vec<Token>, LexError> {
    Tokenizer::new(input).run()
}

struct Tokenizer {
    input: Vec<char>,
    pos: usize,
}

impl Tokenizer {
    fn new(input: &str) -> Self {
        Self {
            input: input.chars().collect(),
            pos: 0,
        }
    }

    fn peek(&self) -> Option<char> {
        self.input.get(self.pos).copied()
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += 1;
        Some(ch)
    }

    fn skip_whitespace(&mut self) {
        while let Some(ch) = self.peek() {
            if ch.is_whitespace() {
                self.pos += 1;
            } else {
                break;
            }
        }
    }

    fn read_while<F>(&mut self, predicate: F) -> String
    where
        F: Fn(char) -> bool,
    {
        let mut result = String::new();
        while let Some(ch) = self.peek() {
            if predicate(ch) {
                result.push(ch);
                self.pos += 1;
            } else {
                break;
            }
        }
        result
    }

    fn run(mut self) -> Result<Vec<Token>, LexError> {
        let mut tokens = Vec::new();
        loop {
            self.skip_whitespace();
            let Some(ch) = self.peek() else { break };
            match ch {
                '(' => {
                    tokens.push(Token::GroupOpen { position: self.pos });
                    self.pos += 1;
                }
                ')' => {
                    tokens.push(Token::GroupClose { position: self.pos });
                    self.pos += 1;
                }
                '&' => {
                    tokens.push(Token::And { position: self.pos });
                    self.pos += 1;
                }
                '|' => {
                    tokens.push(Token::Or { position: self.pos });
                    self.pos += 1;
                }
                '"' | '\'' => {
                    // Stray quoted literal; the parser reports what it expected.
                    let start = self.pos;
                    let text = self.read_quoted()?;
                    tokens.push(Token::Literal {
                        value: Value::String(text),
                        start,
                        end: self.pos,
                    });
                }
                c if is_ident(c) => self.read_comparison(&mut tokens)?,
                other => {
                    return Err(LexError::UnexpectedCharacter {
                        position: self.pos,
                        found: other,
                    })
                }
            }
        }
        Ok(tokens)
    }

    /// Reads a `field.op.value` word. The operator is the first dotted
    /// segment matching the closed surface set; a word without one lexes
    /// as a plain field path and the parser reports the error.
    fn read_comparison(&mut self, tokens: &mut Vec<Token>) -> Result<(), LexError> {
        let start = self.pos;
        let mut segments = Vec::new();
        let operator = loop {
            let seg_start = self.pos;
            let segment = self.read_while(is_ident);
            if segment.is_empty() {
                return Err(match self.peek() {
                    Some(found) => LexError::UnexpectedCharacter {
                        position: self.pos,
                        found,
                    },
                    None => LexError::UnexpectedEnd { position: self.pos },
                });
            }
            if let Some(op) = SurfaceOp::from_symbol(&segment) {
                if !segments.is_empty() {
                    tokens.push(Token::Field {
                        path: FieldPath::new(std::mem::take(&mut segments)),
                        start,
                        end: seg_start - 1,
                    });
                }
                tokens.push(Token::Operator {
                    op,
                    position: seg_start,
                });
                break Some(op);
            }
            segments.push(segment);
            if self.peek() == Some('.') {
                self.pos += 1;
            } else {
                break None;
            }
        };
        match operator {
            None => tokens.push(Token::Field {
                path: FieldPath::new(segments),
                start,
                end: self.pos,
            }),
            Some(_) => {
                if self.peek() == Some('.') {
                    self.pos += 1;
                    self.read_literal(tokens)?;
                }
                // No trailing dot: the parser reports the missing literal.
            }
        }
        Ok(())
    }

    /// Reads a literal: a single element, or a comma-separated list.
    /// Elements are quoted strings or bare runs typed by [`Value::from_bare`].
    fn read_literal(&mut self, tokens: &mut Vec<Token>) -> Result<(), LexError> {
        let start = self.pos;
        let mut elements = Vec::new();
        let mut end = self.pos;
        loop {
            let elem_start = self.pos;
            let value = match self.peek() {
                Some('"') | Some('\'') => Value::String(self.read_quoted()?),
                _ => {
                    let raw = self.read_while(|c| !c.is_whitespace() && !DELIMITERS.contains(c));
                    if raw.is_empty() {
                        if elements.is_empty() && self.peek() != Some(',') {
                            // Nothing after the operator's dot; the parser
                            // reports the missing literal.
                            return Ok(());
                        }
                        return Err(LexError::EmptyListElement {
                            position: elem_start,
                        });
                    }
                    Value::from_bare(&raw)
                }
            };
            elements.push(value);
            end = self.pos;
            // Whitespace around list commas is insignificant, like
            // whitespace between tokens.
            self.skip_whitespace();
            if self.peek() == Some(',') {
                self.pos += 1;
                self.skip_whitespace();
            } else {
                break;
            }
        }
        let value = if elements.len() == 1 {
            elements.remove(0)
        } else {
            Value::List(elements)
        };
        tokens.push(Token::Literal { value, start, end });
        Ok(())
    }

    fn read_quoted(&mut self) -> Result<String, LexError> {
        let start = self.pos;
        let quote = match self.advance() {
            Some(q) => q,
            None => return Err(LexError::UnexpectedEnd { position: start }),
        };
        let mut text = String::new();
        loop {
            match self.advance() {
                None => return Err(LexError::UnterminatedString { position: start }),
                Some(c) if c == quote => break,
                Some('\\') => match self.advance() {
                    Some(escaped) => text.push(escaped),
                    None => return Err(LexError::UnterminatedString { position: start }),
                },
                Some(c) => text.push(c),
            }
        }
        Ok(text)
    }
}

fn is_ident(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

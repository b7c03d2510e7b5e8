mod token;

#[cfg(test)]
mod tests;

pub use token::{Span, Token, TokenKind};

use std::str::Chars;

use crate::vm::table::OperatorTable;

pub struct Lexer<'a> {
    source: &'a str,
    chars: Chars<'a>,
    position: usize,
    line: u32,
    column: u32,
    previous: Option<char>,
    bracket_depth: usize,
    table: &'static OperatorTable,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{message} at {line}:{column}")]
pub struct LexError {
    pub message: String,
    pub line: u32,
    pub column: u32,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self::at(source, 1, 1)
    }

    /// Lexer for text that starts at `line`:`column` of an enclosing program,
    /// so block bodies report positions in the outer source
    pub fn at(source: &'a str, line: u32, column: u32) -> Self {
        Self {
            source,
            chars: source.chars(),
            position: 0,
            line,
            column,
            previous: None,
            bracket_depth: 0,
            table: OperatorTable::global(),
        }
    }

    pub fn tokenize(&mut self) -> Result<Vec<Token>, LexError> {
        let mut tokens = Vec::new();

        loop {
            let token = self.next_token()?;
            let is_eof = token.kind == TokenKind::Eof;
            tokens.push(token);
            if is_eof {
                break;
            }
        }

        if self.bracket_depth > 0 {
            return Err(LexError {
                message: "Unclosed '['".to_string(),
                line: self.line,
                column: self.column,
            });
        }

        Ok(tokens)
    }

    fn next_token(&mut self) -> Result<Token, LexError> {
        self.skip_whitespace();

        let start_position = self.position;
        let start_line = self.line;
        let start_column = self.column;

        let kind = match self.peek() {
            None => TokenKind::Eof,
            Some(c) => match c {
                '[' => {
                    self.advance();
                    self.bracket_depth += 1;
                    TokenKind::OpenBracket
                }
                ']' => {
                    if self.bracket_depth == 0 {
                        return Err(LexError {
                            message: "Unmatched ']'".to_string(),
                            line: start_line,
                            column: start_column,
                        });
                    }
                    self.advance();
                    self.bracket_depth -= 1;
                    TokenKind::CloseBracket
                }
                '{' => self.block()?,
                '}' => {
                    return Err(LexError {
                        message: "Unmatched '}'".to_string(),
                        line: start_line,
                        column: start_column,
                    });
                }

                '"' => self.string()?,
                '\'' => self.character()?,
                ':' => self.assignment()?,

                c if c.is_ascii_digit() => self.number()?,
                '-' if self.starts_negative_literal() => self.number()?,

                c => self.operator_or_variable(c)?,
            },
        };

        let span = Span {
            start: start_position,
            end: self.position,
            line: start_line,
            column: start_column,
        };

        Ok(Token { kind, span })
    }

    fn peek(&self) -> Option<char> {
        self.chars.clone().next()
    }

    fn peek_next(&self) -> Option<char> {
        let mut chars = self.chars.clone();
        chars.next();
        chars.next()
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.chars.next()?;
        self.position += c.len_utf8();
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        self.previous = Some(c);
        Some(c)
    }

    fn skip_whitespace(&mut self) {
        while let Some(c) = self.peek() {
            if c.is_whitespace() {
                self.advance();
            } else {
                break;
            }
        }
    }

    /// `-` directly before a digit, at the start or after whitespace, `[` or `{`
    fn starts_negative_literal(&self) -> bool {
        let separated = match self.previous {
            None => true,
            Some(p) => p.is_whitespace() || p == '[' || p == '{',
        };
        separated && self.peek_next().is_some_and(|c| c.is_ascii_digit())
    }

    /// Two-character table symbols win over variables and one-character symbols
    fn operator_or_variable(&mut self, c: char) -> Result<TokenKind, LexError> {
        let start_line = self.line;
        let start_column = self.column;

        if let Some(next) = self.peek_next() {
            let pair: String = [c, next].iter().collect();
            if let Some(symbol) = self.table.symbol(&pair) {
                self.advance();
                self.advance();
                return Ok(TokenKind::Operator(symbol));
            }
        }

        if c.is_ascii_uppercase() {
            self.advance();
            return Ok(TokenKind::Variable(c));
        }

        let mut buffer = [0; 4];
        if let Some(symbol) = self.table.symbol(c.encode_utf8(&mut buffer)) {
            self.advance();
            return Ok(TokenKind::Operator(symbol));
        }

        Err(LexError {
            message: format!("Unexpected character: '{c}'"),
            line: start_line,
            column: start_column,
        })
    }

    fn assignment(&mut self) -> Result<TokenKind, LexError> {
        let start_line = self.line;
        let start_column = self.column;

        self.advance();
        match self.peek() {
            Some(name) if name.is_ascii_uppercase() => {
                self.advance();
                Ok(TokenKind::Assign(name))
            }
            _ => Err(LexError {
                message: "Expected a variable name (A-Z) after ':'".to_string(),
                line: start_line,
                column: start_column,
            }),
        }
    }

    fn character(&mut self) -> Result<TokenKind, LexError> {
        let start_line = self.line;
        let start_column = self.column;

        self.advance();
        self.advance().map(TokenKind::Character).ok_or(LexError {
            message: "Expected a character after '\\''".to_string(),
            line: start_line,
            column: start_column,
        })
    }

    fn number(&mut self) -> Result<TokenKind, LexError> {
        let start = self.position;
        let start_line = self.line;
        let start_column = self.column;

        if self.peek() == Some('-') {
            self.advance();
        }

        while let Some(c) = self.peek() {
            if c.is_ascii_digit() {
                self.advance();
            } else {
                break;
            }
        }

        if self.peek() == Some('.') && self.peek_next().is_some_and(|c| c.is_ascii_digit()) {
            self.advance();

            while let Some(c) = self.peek() {
                if c.is_ascii_digit() {
                    self.advance();
                } else {
                    break;
                }
            }

            let text = &self.source[start..self.position];
            let value: f64 = text.parse().map_err(|_| LexError {
                message: format!("Invalid decimal literal: {text}"),
                line: start_line,
                column: start_column,
            })?;

            Ok(TokenKind::Decimal(value))
        } else {
            let text = &self.source[start..self.position];
            let value: i64 = text.parse().map_err(|_| LexError {
                message: format!("Invalid integer literal: {text}"),
                line: start_line,
                column: start_column,
            })?;

            Ok(TokenKind::Integer(value))
        }
    }

    fn string(&mut self) -> Result<TokenKind, LexError> {
        let start_line = self.line;
        let start_column = self.column;

        self.advance();

        let mut value = String::new();

        loop {
            match self.peek() {
                None => {
                    return Err(LexError {
                        message: "Unterminated string literal".to_string(),
                        line: start_line,
                        column: start_column,
                    });
                }
                Some('"') => {
                    self.advance();
                    break;
                }
                Some('\\') => {
                    self.advance();
                    match self.peek() {
                        Some('n') => {
                            self.advance();
                            value.push('\n');
                        }
                        Some('t') => {
                            self.advance();
                            value.push('\t');
                        }
                        Some('\\') => {
                            self.advance();
                            value.push('\\');
                        }
                        Some('"') => {
                            self.advance();
                            value.push('"');
                        }
                        Some(c) => {
                            return Err(LexError {
                                message: format!("Invalid escape sequence: \\{c}"),
                                line: self.line,
                                column: self.column,
                            });
                        }
                        None => {
                            return Err(LexError {
                                message: "Unterminated string literal".to_string(),
                                line: start_line,
                                column: start_column,
                            });
                        }
                    }
                }
                Some(c) => {
                    self.advance();
                    value.push(c);
                }
            }
        }

        Ok(TokenKind::String(value))
    }

    /// Captures the raw body up to the matching `}`.
    ///
    /// Braces inside string and character literals do not count. The body is
    /// lexed once here so malformed blocks fail before the program runs.
    fn block(&mut self) -> Result<TokenKind, LexError> {
        let start_line = self.line;
        let start_column = self.column;
        let unterminated = || LexError {
            message: "Unterminated block".to_string(),
            line: start_line,
            column: start_column,
        };

        self.advance();
        let body_start = self.position;
        let body_line = self.line;
        let body_column = self.column;
        let mut depth = 1;

        let body_end = loop {
            let before = self.position;
            match self.advance() {
                None => return Err(unterminated()),
                Some('{') => depth += 1,
                Some('}') => {
                    depth -= 1;
                    if depth == 0 {
                        break before;
                    }
                }
                Some('"') => self.skip_string_body().ok_or_else(unterminated)?,
                Some('\'') => {
                    self.advance();
                }
                Some(_) => {}
            }
        };

        let body = &self.source[body_start..body_end];
        Lexer::at(body, body_line, body_column).tokenize()?;
        Ok(TokenKind::Block(body.to_string()))
    }

    fn skip_string_body(&mut self) -> Option<()> {
        loop {
            match self.advance()? {
                '"' => return Some(()),
                '\\' => {
                    self.advance()?;
                }
                _ => {}
            }
        }
    }
}

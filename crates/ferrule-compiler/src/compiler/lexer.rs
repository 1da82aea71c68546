//! Single-pass character-stream lexer (`spec.md` §4.1).
//!
//! Two modes: the default mode below, and a field-name submode the parser
//! enters explicitly (via [`Lexer::read_field_name`]) immediately after
//! consuming `[` in a field context. The lexer itself never switches modes
//! on its own — the grammar is the only thing that knows when a `[` opens a
//! field name rather than, say, closes one.

use std::str::FromStr;

use rust_decimal::Decimal;
use thiserror::Error;

use crate::compiler::tokens::{Span, Token, TokenKind};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LexError {
    #[error("unexpected character '{ch}' at line {line}, col {col}")]
    UnexpectedChar { ch: char, line: usize, col: usize },
    #[error("unterminated string at line {line}, col {col}")]
    UnterminatedString { line: usize, col: usize },
    #[error("invalid number at line {line}, col {col}")]
    InvalidNumber { line: usize, col: usize },
    #[error("newline inside field name at line {line}, col {col}")]
    NewlineInFieldName { line: usize, col: usize },
    #[error("unterminated field name at line {line}, col {col}")]
    UnterminatedFieldName { line: usize, col: usize },
}

pub struct Lexer {
    source: Vec<char>,
    pos: usize,
    line: usize,
    col: usize,
    enable_comments: bool,
}

impl Lexer {
    pub fn new(source: &str, enable_comments: bool) -> Self {
        Self {
            source: source.chars().collect(),
            pos: 0,
            line: 1,
            col: 1,
            enable_comments,
        }
    }

    fn current(&self) -> Option<char> {
        self.source.get(self.pos).copied()
    }

    fn peek(&self) -> Option<char> {
        self.source.get(self.pos + 1).copied()
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.source.get(self.pos).copied()?;
        self.pos += 1;
        if ch == '\r' {
            // Uniform CRLF/CR handling: a lone CR or a CR immediately
            // followed by LF both advance the line counter exactly once.
            if self.current() == Some('\n') {
                self.pos += 1;
            }
            self.line += 1;
            self.col = 1;
        } else if ch == '\n' {
            self.line += 1;
            self.col = 1;
        } else {
            self.col += 1;
        }
        Some(ch)
    }

    fn here(&self) -> (usize, usize) {
        (self.line, self.col)
    }

    fn span_from(&self, start_pos: usize, line: usize, col: usize) -> Span {
        Span::new(start_pos, self.pos, line, col)
    }

    fn skip_trivia(&mut self) -> Result<(), LexError> {
        loop {
            match self.current() {
                Some(' ') | Some('\t') => {
                    self.advance();
                }
                Some('/') if self.enable_comments && self.peek() == Some('/') => {
                    while !matches!(self.current(), None | Some('\n') | Some('\r')) {
                        self.advance();
                    }
                }
                Some('/') if self.enable_comments && self.peek() == Some('*') => {
                    let (line, col) = self.here();
                    self.advance();
                    self.advance();
                    loop {
                        match self.current() {
                            None => {
                                return Err(LexError::UnterminatedString { line, col });
                            }
                            Some('*') if self.peek() == Some('/') => {
                                self.advance();
                                self.advance();
                                break;
                            }
                            Some(_) => {
                                self.advance();
                            }
                        }
                    }
                }
                _ => break,
            }
        }
        Ok(())
    }

    /// Produce the next token in default mode.
    pub fn next_token(&mut self) -> Result<Token, LexError> {
        self.skip_trivia()?;
        let (line, col) = self.here();
        let start_pos = self.pos;

        let ch = match self.current() {
            None => return Ok(Token::new(TokenKind::Eof, self.span_from(start_pos, line, col))),
            Some(ch) => ch,
        };

        if ch == '\n' || ch == '\r' {
            self.advance();
            return Ok(Token::new(TokenKind::NewLine, self.span_from(start_pos, line, col)));
        }

        if ch.is_ascii_digit() || (ch == '.' && self.peek().is_some_and(|c| c.is_ascii_digit())) {
            return self.lex_number(start_pos, line, col);
        }

        if ch == '\'' {
            return self.lex_string(start_pos, line, col);
        }

        if ch == '_' || ch.is_alphabetic() {
            return self.lex_ident(start_pos, line, col);
        }

        let kind = match ch {
            '+' => {
                self.advance();
                TokenKind::Plus
            }
            '-' => {
                self.advance();
                TokenKind::Minus
            }
            '*' => {
                self.advance();
                TokenKind::Star
            }
            '/' => {
                self.advance();
                TokenKind::Slash
            }
            '%' => {
                self.advance();
                TokenKind::Percent
            }
            '=' if self.peek() == Some('=') => {
                self.advance();
                self.advance();
                TokenKind::EqEq
            }
            '!' if self.peek() == Some('=') => {
                self.advance();
                self.advance();
                TokenKind::NotEq
            }
            '!' => {
                self.advance();
                TokenKind::Bang
            }
            '<' if self.peek() == Some('=') => {
                self.advance();
                self.advance();
                TokenKind::LtEq
            }
            '<' => {
                self.advance();
                TokenKind::Lt
            }
            '>' if self.peek() == Some('=') => {
                self.advance();
                self.advance();
                TokenKind::GtEq
            }
            '>' => {
                self.advance();
                TokenKind::Gt
            }
            '&' if self.peek() == Some('&') => {
                self.advance();
                self.advance();
                TokenKind::AndAnd
            }
            '|' if self.peek() == Some('|') => {
                self.advance();
                self.advance();
                TokenKind::OrOr
            }
            '(' => {
                self.advance();
                TokenKind::LParen
            }
            ')' => {
                self.advance();
                TokenKind::RParen
            }
            '{' => {
                self.advance();
                TokenKind::LBrace
            }
            '}' => {
                self.advance();
                TokenKind::RBrace
            }
            '[' => {
                self.advance();
                TokenKind::LBracket
            }
            ']' => {
                self.advance();
                TokenKind::RBracket
            }
            ',' => {
                self.advance();
                TokenKind::Comma
            }
            ':' => {
                self.advance();
                TokenKind::Colon
            }
            other => {
                self.advance();
                return Err(LexError::UnexpectedChar {
                    ch: other,
                    line,
                    col,
                });
            }
        };
        Ok(Token::new(kind, self.span_from(start_pos, line, col)))
    }

    fn lex_number(&mut self, start_pos: usize, line: usize, col: usize) -> Result<Token, LexError> {
        let mut text = String::new();
        while self.current().is_some_and(|c| c.is_ascii_digit()) {
            text.push(self.advance().unwrap());
        }
        if self.current() == Some('.') && self.peek().is_some_and(|c| c.is_ascii_digit()) {
            text.push(self.advance().unwrap());
            while self.current().is_some_and(|c| c.is_ascii_digit()) {
                text.push(self.advance().unwrap());
            }
        } else if self.current() == Some('.') && text.is_empty() {
            // leading-dot form with no integer part, e.g. `.5`.
            text.push(self.advance().unwrap());
            while self.current().is_some_and(|c| c.is_ascii_digit()) {
                text.push(self.advance().unwrap());
            }
        }
        let value = Decimal::from_str(&text).map_err(|_| LexError::InvalidNumber { line, col })?;
        Ok(Token::new(
            TokenKind::Number(value),
            self.span_from(start_pos, line, col),
        ))
    }

    fn lex_string(&mut self, start_pos: usize, line: usize, col: usize) -> Result<Token, LexError> {
        self.advance(); // opening quote
        let mut text = String::new();
        loop {
            match self.current() {
                None | Some('\n') | Some('\r') => {
                    return Err(LexError::UnterminatedString { line, col });
                }
                Some('\'') => {
                    self.advance();
                    break;
                }
                Some('\\') => {
                    self.advance();
                    match self.current() {
                        Some('\'') => {
                            text.push('\'');
                            self.advance();
                        }
                        Some('n') => {
                            text.push('\n');
                            self.advance();
                        }
                        Some('r') => {
                            text.push('\r');
                            self.advance();
                        }
                        Some('t') => {
                            text.push('\t');
                            self.advance();
                        }
                        Some('\\') => {
                            text.push('\\');
                            self.advance();
                        }
                        Some(other) => {
                            text.push('\\');
                            text.push(other);
                            self.advance();
                        }
                        None => return Err(LexError::UnterminatedString { line, col }),
                    }
                }
                Some(ch) => {
                    text.push(ch);
                    self.advance();
                }
            }
        }
        Ok(Token::new(
            TokenKind::Str(text),
            self.span_from(start_pos, line, col),
        ))
    }

    fn lex_ident(&mut self, start_pos: usize, line: usize, col: usize) -> Result<Token, LexError> {
        let mut text = String::new();
        while self.current().is_some_and(|c| c == '_' || c.is_alphanumeric()) {
            text.push(self.advance().unwrap());
        }
        let lower = text.to_ascii_lowercase();
        let kind = match lower.as_str() {
            "set" => TokenKind::Set,
            "msg" => TokenKind::Msg,
            "return" => TokenKind::Return,
            "return_local" => TokenKind::ReturnLocal,
            "assert" => TokenKind::Assert,
            "if" => TokenKind::If,
            "elseif" => TokenKind::ElseIf,
            "else" => TokenKind::Else,
            "local" => TokenKind::Local,
            _ if text == "true" => TokenKind::True,
            _ if text == "false" => TokenKind::False,
            _ if text == "null" => TokenKind::Null,
            _ if text == "now" => TokenKind::Now,
            _ => TokenKind::Ident(text),
        };
        Ok(Token::new(kind, self.span_from(start_pos, line, col)))
    }

    /// Read a field name in submode: the raw run of characters up to (but
    /// not including) `]` or `:`, trimmed of surrounding whitespace. Called
    /// by the parser immediately after it consumes the opening `[`.
    pub fn read_field_name(&mut self) -> Result<Token, LexError> {
        let (line, col) = self.here();
        let start_pos = self.pos;
        let mut text = String::new();
        loop {
            match self.current() {
                None => return Err(LexError::UnterminatedFieldName { line, col }),
                Some('\n') | Some('\r') => {
                    return Err(LexError::NewlineInFieldName {
                        line: self.line,
                        col: self.col,
                    })
                }
                Some(']') | Some(':') => break,
                Some(ch) => {
                    text.push(ch);
                    self.advance();
                }
            }
        }
        let trimmed = text.trim().to_string();
        Ok(Token::new(
            TokenKind::Ident(trimmed),
            self.span_from(start_pos, line, col),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<TokenKind> {
        let mut lx = Lexer::new(src, true);
        let mut out = Vec::new();
        loop {
            let tok = lx.next_token().unwrap();
            let done = matches!(tok.kind, TokenKind::Eof);
            out.push(tok.kind);
            if done {
                break;
            }
        }
        out
    }

    #[test]
    fn recognizes_multi_char_operators() {
        let ks = kinds("== != >= <= && ||");
        assert_eq!(
            ks,
            vec![
                TokenKind::EqEq,
                TokenKind::NotEq,
                TokenKind::GtEq,
                TokenKind::LtEq,
                TokenKind::AndAnd,
                TokenKind::OrOr,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn keywords_are_case_insensitive_but_literals_are_not() {
        let ks = kinds("SET True TRUE");
        assert_eq!(
            ks,
            vec![
                TokenKind::Set,
                TokenKind::Ident("True".to_string()),
                TokenKind::Ident("TRUE".to_string()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn string_escapes_decode() {
        let ks = kinds(r"'a\nb\tc\\d\qe'");
        assert_eq!(
            ks,
            vec![
                TokenKind::Str("a\nb\tc\\d\\qe".to_string()),
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn leading_dot_number() {
        let ks = kinds(".5");
        assert_eq!(
            ks,
            vec![TokenKind::Number(Decimal::new(5, 1)), TokenKind::Eof]
        );
    }

    #[test]
    fn line_comment_is_skipped() {
        let ks = kinds("1 // trailing comment\n2");
        assert_eq!(
            ks,
            vec![
                TokenKind::Number(Decimal::new(1, 0)),
                TokenKind::NewLine,
                TokenKind::Number(Decimal::new(2, 0)),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn field_name_submode_allows_spaces() {
        let mut lx = Lexer::new("[field name] rest", true);
        let open = lx.next_token().unwrap();
        assert_eq!(open.kind, TokenKind::LBracket);
        let field = lx.read_field_name().unwrap();
        assert_eq!(field.kind, TokenKind::Ident("field name".to_string()));
        let close = lx.next_token().unwrap();
        assert_eq!(close.kind, TokenKind::RBracket);
    }
}

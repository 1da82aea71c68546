//! Recursive-descent parser (`spec.md` §4.2).
//!
//! One token of lookahead, held in `current`. The lexer is driven on demand
//! rather than pre-tokenized into a flat `Vec<Token>`, because the
//! field-name submode (`spec.md` §4.1) needs to be entered mid-stream,
//! right after the parser consumes `[` in a field context — a pre-tokenized
//! stream would have already lexed past it under the wrong rules.

use thiserror::Error;

use crate::compiler::ast::{BinOp, Block, ElseIf, Expr, Stmt, UnOp};
use crate::compiler::lexer::{LexError, Lexer};
use crate::compiler::tokens::{Span, Token, TokenKind};
use ferrule_core::Value;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum ParseError {
    #[error("unexpected token '{found}' at line {line}, column {column}")]
    UnexpectedToken {
        found: String,
        line: usize,
        column: usize,
    },
    #[error("unterminated string at line {line}, column {column}")]
    UnterminatedString { line: usize, column: usize },
    #[error("invalid number at line {line}, column {column}")]
    InvalidNumber { line: usize, column: usize },
    #[error("unexpected end of file at line {line}, column {column}")]
    UnexpectedEof { line: usize, column: usize },
    #[error("expected a literal string at line {line}, column {column}")]
    LiteralStringRequired { line: usize, column: usize },
    #[error("invalid field name at line {line}, column {column}")]
    InvalidFieldName { line: usize, column: usize },
    #[error("unknown type hint '{hint}' at line {line}, column {column}")]
    UnknownTypeHint {
        hint: String,
        line: usize,
        column: usize,
    },
}

impl From<LexError> for ParseError {
    fn from(err: LexError) -> Self {
        match err {
            LexError::UnexpectedChar { ch, line, col } => ParseError::UnexpectedToken {
                found: ch.to_string(),
                line,
                column: col,
            },
            LexError::UnterminatedString { line, col } => {
                ParseError::UnterminatedString { line, column: col }
            }
            LexError::InvalidNumber { line, col } => {
                ParseError::InvalidNumber { line, column: col }
            }
            LexError::NewlineInFieldName { line, col } => {
                ParseError::InvalidFieldName { line, column: col }
            }
            LexError::UnterminatedFieldName { line, col } => {
                ParseError::InvalidFieldName { line, column: col }
            }
        }
    }
}

pub struct Parser {
    lexer: Lexer,
    current: Token,
}

impl Parser {
    pub fn new(source: &str, enable_comments: bool) -> Result<Self, ParseError> {
        let mut lexer = Lexer::new(source, enable_comments);
        let current = Self::next_significant(&mut lexer)?;
        Ok(Self { lexer, current })
    }

    /// Pulls tokens from the lexer until a non-`NewLine` token surfaces.
    /// Newlines separate nothing the grammar cares about (`spec.md` §4.1).
    fn next_significant(lexer: &mut Lexer) -> Result<Token, ParseError> {
        loop {
            let tok = lexer.next_token()?;
            if tok.kind != TokenKind::NewLine {
                return Ok(tok);
            }
        }
    }

    fn bump(&mut self) -> Result<Token, ParseError> {
        let prev = self.current.clone();
        self.current = Self::next_significant(&mut self.lexer)?;
        Ok(prev)
    }

    fn pos(&self) -> (usize, usize) {
        (self.current.span.line, self.current.span.col)
    }

    fn unexpected(&self) -> ParseError {
        let (line, column) = self.pos();
        if self.current.kind == TokenKind::Eof {
            ParseError::UnexpectedEof { line, column }
        } else {
            ParseError::UnexpectedToken {
                found: self.current.kind.to_string(),
                line,
                column,
            }
        }
    }

    fn expect(&mut self, kind: &TokenKind) -> Result<Token, ParseError> {
        if &self.current.kind == kind {
            self.bump()
        } else {
            Err(self.unexpected())
        }
    }

    fn expect_ident(&mut self) -> Result<(String, Span), ParseError> {
        match self.current.kind.clone() {
            TokenKind::Ident(name) => {
                let span = self.current.span;
                self.bump()?;
                Ok((name, span))
            }
            _ => Err(self.unexpected()),
        }
    }

    fn expect_string_literal(&mut self) -> Result<String, ParseError> {
        match self.current.kind.clone() {
            TokenKind::Str(s) => {
                self.bump()?;
                Ok(s)
            }
            _ => {
                let (line, column) = self.pos();
                Err(ParseError::LiteralStringRequired { line, column })
            }
        }
    }

    // ── script / block_body ─────────────────────────────────────────

    /// `script := block_body | '{' block_body '}'`
    pub fn parse_script(&mut self) -> Result<Block, ParseError> {
        let block = if self.current.kind == TokenKind::LBrace {
            self.bump()?;
            let body = self.parse_block_body()?;
            self.expect(&TokenKind::RBrace)?;
            body
        } else {
            self.parse_block_body()?
        };
        if self.current.kind != TokenKind::Eof {
            return Err(self.unexpected());
        }
        Ok(block)
    }

    /// `block_body := (NEWLINE* statement NEWLINE*)*`
    ///
    /// `NewLine` is already filtered out by [`Self::next_significant`], so
    /// this reduces to "statements until a terminator".
    fn parse_block_body(&mut self) -> Result<Block, ParseError> {
        let mut statements = Vec::new();
        while !matches!(self.current.kind, TokenKind::RBrace | TokenKind::Eof) {
            statements.push(self.parse_statement()?);
        }
        Ok(Block { statements })
    }

    fn parse_braced_block(&mut self) -> Result<Block, ParseError> {
        self.expect(&TokenKind::LBrace)?;
        let body = self.parse_block_body()?;
        self.expect(&TokenKind::RBrace)?;
        Ok(body)
    }

    // ── statements ───────────────────────────────────────────────────

    fn parse_statement(&mut self) -> Result<Stmt, ParseError> {
        let start = self.current.span;
        match self.current.kind.clone() {
            TokenKind::Set => self.parse_set(start),
            TokenKind::Msg => self.parse_msg(start),
            TokenKind::Return => {
                self.bump()?;
                Ok(Stmt::Return { span: start })
            }
            TokenKind::ReturnLocal => {
                self.bump()?;
                Ok(Stmt::ReturnLocal { span: start })
            }
            TokenKind::Assert => self.parse_assert(start),
            TokenKind::If => self.parse_if(start),
            TokenKind::Local => {
                self.bump()?;
                let body = self.parse_braced_block()?;
                let span = start.merge(self.prev_end_span());
                Ok(Stmt::Local { body, span })
            }
            _ => Err(self.unexpected()),
        }
    }

    /// Best-effort span for "just consumed", used to extend a statement's
    /// span to cover its trailing block. Not exact (it reflects the current
    /// lookahead token's start, not the true end of the prior token) but
    /// sufficient for diagnostics, which only ever report a start position.
    fn prev_end_span(&self) -> Span {
        self.current.span
    }

    fn parse_set(&mut self, start: Span) -> Result<Stmt, ParseError> {
        self.bump()?; // 'set'
        self.expect(&TokenKind::LParen)?;
        let (field_name, type_hint) = if self.current.kind == TokenKind::LBracket {
            self.parse_bracketed_field_name()?
        } else {
            let (name, _) = self.expect_ident()?;
            (name, None)
        };
        self.expect(&TokenKind::Comma)?;
        let value = self.parse_expr()?;
        self.expect(&TokenKind::RParen)?;
        let span = start.merge(value.span());
        Ok(Stmt::Set {
            field_name,
            type_hint,
            value,
            span,
        })
    }

    fn parse_msg(&mut self, start: Span) -> Result<Stmt, ParseError> {
        self.bump()?; // 'msg'
        self.expect(&TokenKind::LParen)?;
        let text = self.expect_string_literal()?;
        let level = if self.current.kind == TokenKind::Comma {
            self.bump()?;
            Some(self.expect_string_literal()?)
        } else {
            None
        };
        let end = self.current.span;
        self.expect(&TokenKind::RParen)?;
        Ok(Stmt::Msg {
            text,
            level,
            span: start.merge(end),
        })
    }

    fn parse_assert(&mut self, start: Span) -> Result<Stmt, ParseError> {
        self.bump()?; // 'assert'
        self.expect(&TokenKind::LParen)?;
        let cond = self.parse_expr()?;
        self.expect(&TokenKind::Comma)?;
        let action = self.expect_string_literal()?;
        self.expect(&TokenKind::Comma)?;
        let message = self.expect_string_literal()?;
        let level = if self.current.kind == TokenKind::Comma {
            self.bump()?;
            Some(self.expect_string_literal()?)
        } else {
            None
        };
        let end = self.current.span;
        self.expect(&TokenKind::RParen)?;
        Ok(Stmt::Assert {
            cond,
            action,
            message,
            level,
            span: start.merge(end),
        })
    }

    fn parse_if(&mut self, start: Span) -> Result<Stmt, ParseError> {
        self.bump()?; // 'if'
        self.expect(&TokenKind::LParen)?;
        let cond = self.parse_expr()?;
        self.expect(&TokenKind::RParen)?;
        let then_block = self.parse_braced_block()?;

        let mut else_ifs = Vec::new();
        while self.current.kind == TokenKind::ElseIf {
            self.bump()?;
            self.expect(&TokenKind::LParen)?;
            let arm_cond = self.parse_expr()?;
            self.expect(&TokenKind::RParen)?;
            let arm_block = self.parse_braced_block()?;
            else_ifs.push(ElseIf {
                cond: arm_cond,
                block: arm_block,
            });
        }

        let else_block = if self.current.kind == TokenKind::Else {
            self.bump()?;
            Some(self.parse_braced_block()?)
        } else {
            None
        };

        let span = start.merge(self.prev_end_span());
        Ok(Stmt::If {
            cond,
            then_block,
            else_ifs,
            else_block,
            span,
        })
    }

    /// Consumes `'[' fieldname (':' IDENT)? ']'`, assuming `current` is
    /// `[`. Returns the field name and optional type hint.
    fn parse_bracketed_field_name(&mut self) -> Result<(String, Option<String>), ParseError> {
        self.expect(&TokenKind::LBracket)?;
        // The lexer must switch to field-name submode right here, before
        // any ordinary tokenization of what follows `[` happens.
        let field_tok = self.lexer.read_field_name()?;
        let name = match field_tok.kind {
            TokenKind::Ident(name) => name,
            _ => unreachable!("read_field_name only ever produces Ident"),
        };
        self.current = Self::next_significant(&mut self.lexer)?;

        let type_hint = if self.current.kind == TokenKind::Colon {
            self.bump()?;
            let (hint, span) = self.expect_ident()?;
            match hint.to_ascii_lowercase().as_str() {
                "string" | "decimal" | "bool" | "datetime" => Some(hint.to_ascii_lowercase()),
                _ => {
                    return Err(ParseError::UnknownTypeHint {
                        hint,
                        line: span.line,
                        column: span.col,
                    })
                }
            }
        } else {
            None
        };
        self.expect(&TokenKind::RBracket)?;
        Ok((name, type_hint))
    }

    // ── expressions ──────────────────────────────────────────────────

    fn parse_expr(&mut self) -> Result<Expr, ParseError> {
        self.parse_or()
    }

    fn parse_or(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_and()?;
        while self.current.kind == TokenKind::OrOr {
            self.bump()?;
            let right = self.parse_and()?;
            let span = left.span().merge(right.span());
            left = Expr::Binary {
                op: BinOp::Or,
                left: Box::new(left),
                right: Box::new(right),
                span,
            };
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_eq()?;
        while self.current.kind == TokenKind::AndAnd {
            self.bump()?;
            let right = self.parse_eq()?;
            let span = left.span().merge(right.span());
            left = Expr::Binary {
                op: BinOp::And,
                left: Box::new(left),
                right: Box::new(right),
                span,
            };
        }
        Ok(left)
    }

    fn parse_eq(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_rel()?;
        loop {
            let op = match self.current.kind {
                TokenKind::EqEq => BinOp::Eq,
                TokenKind::NotEq => BinOp::Ne,
                _ => break,
            };
            self.bump()?;
            let right = self.parse_rel()?;
            let span = left.span().merge(right.span());
            left = Expr::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
                span,
            };
        }
        Ok(left)
    }

    fn parse_rel(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_add()?;
        loop {
            let op = match self.current.kind {
                TokenKind::Gt => BinOp::Gt,
                TokenKind::Lt => BinOp::Lt,
                TokenKind::GtEq => BinOp::Ge,
                TokenKind::LtEq => BinOp::Le,
                _ => break,
            };
            self.bump()?;
            let right = self.parse_add()?;
            let span = left.span().merge(right.span());
            left = Expr::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
                span,
            };
        }
        Ok(left)
    }

    fn parse_add(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_mul()?;
        loop {
            let op = match self.current.kind {
                TokenKind::Plus => BinOp::Add,
                TokenKind::Minus => BinOp::Sub,
                _ => break,
            };
            self.bump()?;
            let right = self.parse_mul()?;
            let span = left.span().merge(right.span());
            left = Expr::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
                span,
            };
        }
        Ok(left)
    }

    fn parse_mul(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_unary()?;
        loop {
            let op = match self.current.kind {
                TokenKind::Star => BinOp::Mul,
                TokenKind::Slash => BinOp::Div,
                TokenKind::Percent => BinOp::Mod,
                _ => break,
            };
            self.bump()?;
            let right = self.parse_unary()?;
            let span = left.span().merge(right.span());
            left = Expr::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
                span,
            };
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Expr, ParseError> {
        let start = self.current.span;
        match self.current.kind {
            TokenKind::Minus => {
                self.bump()?;
                let inner = self.parse_unary()?;
                let span = start.merge(inner.span());
                Ok(Expr::Unary {
                    op: UnOp::Neg,
                    inner: Box::new(inner),
                    span,
                })
            }
            TokenKind::Bang => {
                self.bump()?;
                let inner = self.parse_unary()?;
                let span = start.merge(inner.span());
                Ok(Expr::Unary {
                    op: UnOp::Not,
                    inner: Box::new(inner),
                    span,
                })
            }
            _ => self.parse_primary(),
        }
    }

    fn parse_primary(&mut self) -> Result<Expr, ParseError> {
        let start = self.current.span;
        match self.current.kind.clone() {
            TokenKind::LBracket => {
                let (name, type_hint) = self.parse_bracketed_field_name()?;
                Ok(Expr::Field {
                    name,
                    type_hint,
                    span: start.merge(self.prev_end_span()),
                })
            }
            TokenKind::Number(n) => {
                self.bump()?;
                Ok(Expr::Literal {
                    value: Value::Number(n),
                    span: start,
                })
            }
            TokenKind::Str(s) => {
                self.bump()?;
                Ok(Expr::Literal {
                    value: Value::String(s),
                    span: start,
                })
            }
            TokenKind::True => {
                self.bump()?;
                Ok(Expr::Literal {
                    value: Value::Boolean(true),
                    span: start,
                })
            }
            TokenKind::False => {
                self.bump()?;
                Ok(Expr::Literal {
                    value: Value::Boolean(false),
                    span: start,
                })
            }
            TokenKind::Null => {
                self.bump()?;
                Ok(Expr::Literal {
                    value: Value::Null,
                    span: start,
                })
            }
            TokenKind::Now => {
                self.bump()?;
                Ok(Expr::Now { span: start })
            }
            TokenKind::Ident(name) => {
                self.bump()?;
                if self.current.kind == TokenKind::LParen {
                    self.bump()?;
                    let mut args = Vec::new();
                    if self.current.kind != TokenKind::RParen {
                        args.push(self.parse_expr()?);
                        while self.current.kind == TokenKind::Comma {
                            self.bump()?;
                            args.push(self.parse_expr()?);
                        }
                    }
                    let end = self.current.span;
                    self.expect(&TokenKind::RParen)?;
                    Ok(Expr::Call {
                        name,
                        args,
                        span: start.merge(end),
                    })
                } else {
                    // Bare identifier: equivalent to `[name]`.
                    Ok(Expr::Field {
                        name,
                        type_hint: None,
                        span: start,
                    })
                }
            }
            TokenKind::LParen => {
                self.bump()?;
                let inner = self.parse_expr()?;
                let end = self.current.span;
                self.expect(&TokenKind::RParen)?;
                Ok(reposition(inner, start.merge(end)))
            }
            _ => Err(self.unexpected()),
        }
    }
}

/// Parenthesization doesn't need its own AST node — it only disambiguates
/// precedence — but the outer span should still cover the parens for
/// accurate error positions on whatever wraps it.
fn reposition(expr: Expr, span: Span) -> Expr {
    match expr {
        Expr::Literal { value, .. } => Expr::Literal { value, span },
        Expr::Field {
            name, type_hint, ..
        } => Expr::Field {
            name,
            type_hint,
            span,
        },
        Expr::Unary { op, inner, .. } => Expr::Unary { op, inner, span },
        Expr::Binary {
            op, left, right, ..
        } => Expr::Binary {
            op,
            left,
            right,
            span,
        },
        Expr::Call { name, args, .. } => Expr::Call { name, args, span },
        Expr::Now { .. } => Expr::Now { span },
    }
}

/// Entry point used by the facade: parse a complete script into a [`Block`].
pub fn parse(source: &str, enable_comments: bool) -> Result<Block, ParseError> {
    let mut parser = Parser::new(source, enable_comments)?;
    parser.parse_script()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_arithmetic_precedence() {
        let block = parse("{ set(a, 1+2*3) set(b, (1+2)*3) }", true).unwrap();
        assert_eq!(block.statements.len(), 2);
    }

    #[test]
    fn bare_ident_is_field_read() {
        let block = parse("{ set(a, x) }", true).unwrap();
        match &block.statements[0] {
            Stmt::Set { value, .. } => {
                assert!(matches!(value, Expr::Field { name, .. } if name == "x"));
            }
            _ => panic!("expected Set"),
        }
    }

    #[test]
    fn bracketed_field_name_with_spaces() {
        let block = parse("{ set([field name], 'x') }", true).unwrap();
        match &block.statements[0] {
            Stmt::Set { field_name, .. } => assert_eq!(field_name, "field name"),
            _ => panic!("expected Set"),
        }
    }

    #[test]
    fn typed_field_read() {
        let block = parse("{ set(a, [nullField:decimal] + 5) }", true).unwrap();
        match &block.statements[0] {
            Stmt::Set { value, .. } => match value {
                Expr::Binary { left, .. } => {
                    assert!(matches!(
                        left.as_ref(),
                        Expr::Field { type_hint: Some(h), .. } if h == "decimal"
                    ));
                }
                _ => panic!("expected Binary"),
            },
            _ => panic!("expected Set"),
        }
    }

    #[test]
    fn msg_requires_literal_string() {
        let err = parse("{ msg(x) }", true).unwrap_err();
        assert!(matches!(err, ParseError::LiteralStringRequired { .. }));
    }

    #[test]
    fn if_elseif_else_chain() {
        let block = parse(
            "{ if (true) { set(a,1) } elseif (false) { set(a,2) } else { set(a,3) } }",
            true,
        )
        .unwrap();
        match &block.statements[0] {
            Stmt::If {
                else_ifs,
                else_block,
                ..
            } => {
                assert_eq!(else_ifs.len(), 1);
                assert!(else_block.is_some());
            }
            _ => panic!("expected If"),
        }
    }

    #[test]
    fn local_and_return_local() {
        let block = parse(
            "{ local { set(a,1) return_local set(a,2) } set(b,9) }",
            true,
        )
        .unwrap();
        assert_eq!(block.statements.len(), 2);
        assert!(matches!(block.statements[0], Stmt::Local { .. }));
    }

    #[test]
    fn empty_script_and_braces_only() {
        assert_eq!(parse("", true).unwrap().statements.len(), 0);
        assert_eq!(parse("{}", true).unwrap().statements.len(), 0);
    }

    #[test]
    fn comments_only_behaves_as_empty() {
        let block = parse("{ // nothing here\n/* still nothing */ }", true).unwrap();
        assert_eq!(block.statements.len(), 0);
    }
}

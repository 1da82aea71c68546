//! Position-carrying AST (`spec.md` §3, §9).
//!
//! `Expr` and `Stmt` are sum types dispatched via `match`, never a virtual
//! base class — per the design note, there is one node-visiting traversal
//! ([`walk_block`]) shared by the compile-time size check, the evaluator's
//! budget pre-check, and the validation analyzer, instead of separate
//! visitor objects.

use ferrule_core::Value;

use crate::compiler::tokens::Span;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Gt,
    Lt,
    Ge,
    Le,
    Eq,
    Ne,
    And,
    Or,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnOp {
    Neg,
    Not,
}

/// An expression node. Every variant's span is the full extent of the
/// expression, including its subexpressions.
#[derive(Debug, Clone)]
pub enum Expr {
    Literal {
        value: Value,
        span: Span,
    },
    /// `[name]` or `[name:typeHint]`, or a bare identifier (equivalent to
    /// `[name]` without a type hint).
    Field {
        name: String,
        type_hint: Option<String>,
        span: Span,
    },
    Unary {
        op: UnOp,
        inner: Box<Expr>,
        span: Span,
    },
    Binary {
        op: BinOp,
        left: Box<Expr>,
        right: Box<Expr>,
        span: Span,
    },
    Call {
        name: String,
        args: Vec<Expr>,
        span: Span,
    },
    /// The `now` literal keyword. Carries no value — it is resolved afresh
    /// on every evaluation (`spec.md` §3's "evaluated once per occurrence").
    Now {
        span: Span,
    },
}

impl Expr {
    pub fn span(&self) -> Span {
        match self {
            Expr::Literal { span, .. }
            | Expr::Field { span, .. }
            | Expr::Unary { span, .. }
            | Expr::Binary { span, .. }
            | Expr::Call { span, .. }
            | Expr::Now { span } => *span,
        }
    }
}

/// `assert`'s dispatch action, resolved at evaluation time from its literal
/// string argument (`spec.md` §4.4).
#[derive(Debug, Clone)]
pub struct ElseIf {
    pub cond: Expr,
    pub block: Block,
}

#[derive(Debug, Clone)]
pub enum Stmt {
    Set {
        field_name: String,
        type_hint: Option<String>,
        value: Expr,
        span: Span,
    },
    Msg {
        text: String,
        level: Option<String>,
        span: Span,
    },
    Return {
        span: Span,
    },
    ReturnLocal {
        span: Span,
    },
    Assert {
        cond: Expr,
        action: String,
        message: String,
        level: Option<String>,
        span: Span,
    },
    If {
        cond: Expr,
        then_block: Block,
        else_ifs: Vec<ElseIf>,
        else_block: Option<Block>,
        span: Span,
    },
    Local {
        body: Block,
        span: Span,
    },
}

impl Stmt {
    pub fn span(&self) -> Span {
        match self {
            Stmt::Set { span, .. }
            | Stmt::Msg { span, .. }
            | Stmt::Return { span }
            | Stmt::ReturnLocal { span }
            | Stmt::Assert { span, .. }
            | Stmt::If { span, .. }
            | Stmt::Local { span, .. } => *span,
        }
    }
}

/// A sequence of statements, the body of a script, an `if`/`elseif`/`else`
/// arm, or a `local` block.
#[derive(Debug, Clone, Default)]
pub struct Block {
    pub statements: Vec<Stmt>,
}

/// Counts every `Expr`/`Stmt`/`Block` node reachable from `block`,
/// including itself. Used for the compile-time `maxNodes` check
/// (`spec.md` §4.2) and by the validation analyzer's `totalNodes` field.
pub fn count_nodes(block: &Block) -> usize {
    let mut count = 1; // the block itself
    for stmt in &block.statements {
        count += count_stmt_nodes(stmt);
    }
    count
}

fn count_stmt_nodes(stmt: &Stmt) -> usize {
    let mut count = 1;
    match stmt {
        Stmt::Set { value, .. } => count += count_expr_nodes(value),
        Stmt::Msg { .. } | Stmt::Return { .. } | Stmt::ReturnLocal { .. } => {}
        Stmt::Assert { cond, .. } => count += count_expr_nodes(cond),
        Stmt::If {
            cond,
            then_block,
            else_ifs,
            else_block,
            ..
        } => {
            count += count_expr_nodes(cond);
            count += count_nodes(then_block);
            for arm in else_ifs {
                count += count_expr_nodes(&arm.cond);
                count += count_nodes(&arm.block);
            }
            if let Some(block) = else_block {
                count += count_nodes(block);
            }
        }
        Stmt::Local { body, .. } => count += count_nodes(body),
    }
    count
}

fn count_expr_nodes(expr: &Expr) -> usize {
    let mut count = 1;
    match expr {
        Expr::Literal { .. } | Expr::Field { .. } | Expr::Now { .. } => {}
        Expr::Unary { inner, .. } => count += count_expr_nodes(inner),
        Expr::Binary { left, right, .. } => {
            count += count_expr_nodes(left);
            count += count_expr_nodes(right);
        }
        Expr::Call { args, .. } => {
            for arg in args {
                count += count_expr_nodes(arg);
            }
        }
    }
    count
}

/// Walks every expression in a block, depth-first, calling `visit` on each.
/// The shared traversal backing the validation analyzer's function/field
/// collection.
pub fn walk_block_exprs<'a>(block: &'a Block, visit: &mut dyn FnMut(&'a Expr)) {
    for stmt in &block.statements {
        walk_stmt_exprs(stmt, visit);
    }
}

fn walk_stmt_exprs<'a>(stmt: &'a Stmt, visit: &mut dyn FnMut(&'a Expr)) {
    match stmt {
        Stmt::Set { value, .. } => walk_expr(value, visit),
        Stmt::Msg { .. } | Stmt::Return { .. } | Stmt::ReturnLocal { .. } => {}
        Stmt::Assert { cond, .. } => walk_expr(cond, visit),
        Stmt::If {
            cond,
            then_block,
            else_ifs,
            else_block,
            ..
        } => {
            walk_expr(cond, visit);
            walk_block_exprs(then_block, visit);
            for arm in else_ifs {
                walk_expr(&arm.cond, visit);
                walk_block_exprs(&arm.block, visit);
            }
            if let Some(block) = else_block {
                walk_block_exprs(block, visit);
            }
        }
        Stmt::Local { body, .. } => walk_block_exprs(body, visit),
    }
}

fn walk_expr<'a>(expr: &'a Expr, visit: &mut dyn FnMut(&'a Expr)) {
    visit(expr);
    match expr {
        Expr::Literal { .. } | Expr::Field { .. } | Expr::Now { .. } => {}
        Expr::Unary { inner, .. } => walk_expr(inner, visit),
        Expr::Binary { left, right, .. } => {
            walk_expr(left, visit);
            walk_expr(right, visit);
        }
        Expr::Call { args, .. } => {
            for arg in args {
                walk_expr(arg, visit);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::tokens::Span;

    #[test]
    fn counts_nested_nodes() {
        let dummy = Span::dummy();
        let block = Block {
            statements: vec![Stmt::Set {
                field_name: "a".into(),
                type_hint: None,
                value: Expr::Binary {
                    op: BinOp::Add,
                    left: Box::new(Expr::Literal {
                        value: Value::Number(1.into()),
                        span: dummy,
                    }),
                    right: Box::new(Expr::Literal {
                        value: Value::Number(2.into()),
                        span: dummy,
                    }),
                    span: dummy,
                },
                span: dummy,
            }],
        };
        // block + Set + Binary + 2 literals == 5
        assert_eq!(count_nodes(&block), 5);
    }
}

//! The validation analyzer: a read-only AST visitor producing
//! [`ValidationResult`] (`spec.md` §6). It never evaluates anything — no
//! `Options`, no registries consulted for value coercion, only for checking
//! whether a called name is registered.

use ferrule_compiler::{count_nodes, walk_block_exprs, BinOp, Block, Expr, Stmt};
use ferrule_core::{Complexity, ReferencedField, ValidationResult, ValidationWarning, WarningKind};

use crate::function::FunctionRegistry;

/// Walk `block` and report its shape: node/complexity counts, the
/// functions/fields it touches, the fields it assigns, and any warnings
/// (currently just unregistered function calls, `spec.md` §6).
pub fn analyze(block: &Block, functions: &FunctionRegistry) -> ValidationResult {
    let total_nodes = count_nodes(block);

    let mut complexity = Complexity::default();
    let mut used_functions: Vec<String> = Vec::new();
    let mut referenced_fields: Vec<ReferencedField> = Vec::new();
    let mut warnings: Vec<ValidationWarning> = Vec::new();

    walk_block_exprs(block, &mut |expr| {
        complexity.total_expressions += 1;
        match expr {
            Expr::Binary { op, .. } => match op {
                BinOp::Add | BinOp::Sub | BinOp::Mul | BinOp::Div | BinOp::Mod => {
                    complexity.arithmetic_count += 1;
                }
                BinOp::Gt | BinOp::Lt | BinOp::Ge | BinOp::Le | BinOp::Eq | BinOp::Ne => {
                    complexity.comparison_count += 1;
                }
                BinOp::And | BinOp::Or => {
                    complexity.logical_count += 1;
                }
            },
            Expr::Call { name, span, .. } => {
                complexity.function_call_count += 1;
                if !used_functions.iter().any(|n| n.eq_ignore_ascii_case(name)) {
                    used_functions.push(name.clone());
                }
                if functions.resolve(name).is_none() {
                    warnings.push(ValidationWarning {
                        kind: WarningKind::PotentialIssue,
                        message: format!("call to unregistered function '{name}'"),
                        line: span.line,
                        column: span.col,
                    });
                }
            }
            Expr::Field { name, span, .. } => {
                referenced_fields.push(ReferencedField {
                    name: name.clone(),
                    line: span.line,
                    column: span.col,
                });
            }
            Expr::Literal { .. } | Expr::Unary { .. } | Expr::Now { .. } => {}
        }
    });

    let mut declared_variables: Vec<String> = Vec::new();
    let max_block_depth = walk_block_stmts(block, 1, &mut complexity, &mut declared_variables);

    complexity.max_block_depth = max_block_depth;

    ValidationResult {
        success: true,
        error_message: None,
        error_line: 0,
        error_column: 0,
        error_code: None,
        total_nodes,
        complexity,
        used_functions,
        referenced_fields,
        declared_variables,
        warnings,
    }
}

/// Statement-level pass: block nesting depth, conditional count, and the
/// set of field names a script assigns (in first-seen order). Kept separate
/// from [`walk_block_exprs`] because those statistics need the enclosing
/// block's nesting, which a pure expression walk doesn't track.
fn walk_block_stmts(block: &Block, depth: usize, complexity: &mut Complexity, declared: &mut Vec<String>) -> usize {
    let mut max_depth = depth;
    for stmt in &block.statements {
        match stmt {
            Stmt::Set { field_name, .. } => {
                if !declared.iter().any(|n| n.eq_ignore_ascii_case(field_name)) {
                    declared.push(field_name.clone());
                }
            }
            Stmt::If {
                then_block,
                else_ifs,
                else_block,
                ..
            } => {
                complexity.conditional_count += 1;
                max_depth = max_depth.max(walk_block_stmts(then_block, depth + 1, complexity, declared));
                for arm in else_ifs {
                    max_depth = max_depth.max(walk_block_stmts(&arm.block, depth + 1, complexity, declared));
                }
                if let Some(block) = else_block {
                    max_depth = max_depth.max(walk_block_stmts(block, depth + 1, complexity, declared));
                }
            }
            Stmt::Local { body, .. } => {
                max_depth = max_depth.max(walk_block_stmts(body, depth + 1, complexity, declared));
            }
            Stmt::Msg { .. } | Stmt::Return { .. } | Stmt::ReturnLocal { .. } | Stmt::Assert { .. } => {}
        }
    }
    max_depth
}

#[cfg(test)]
mod tests {
    use super::*;
    use ferrule_compiler::parse;

    #[test]
    fn counts_arithmetic_and_declared_variables() {
        let block = parse("{ set(a, 1+2*3) set(b, [x] + 1) }", true).unwrap();
        let functions = FunctionRegistry::new();
        let result = analyze(&block, &functions);
        assert_eq!(result.complexity.arithmetic_count, 3);
        assert_eq!(result.declared_variables, vec!["a".to_string(), "b".to_string()]);
        assert_eq!(result.referenced_fields.len(), 1);
        assert_eq!(result.referenced_fields[0].name, "x");
    }

    #[test]
    fn warns_on_unregistered_function() {
        let block = parse("{ set(a, NotRegistered(1)) }", true).unwrap();
        let functions = FunctionRegistry::new();
        let result = analyze(&block, &functions);
        assert_eq!(result.warnings.len(), 1);
        assert_eq!(result.warnings[0].kind, WarningKind::PotentialIssue);
        assert_eq!(result.used_functions, vec!["NotRegistered".to_string()]);
    }

    #[test]
    fn nested_if_increases_max_block_depth() {
        let block = parse("{ if (true) { if (true) { set(a,1) } } }", true).unwrap();
        let functions = FunctionRegistry::new();
        let result = analyze(&block, &functions);
        assert_eq!(result.complexity.conditional_count, 2);
        assert_eq!(result.complexity.max_block_depth, 3);
    }
}

//! The two result shapes the facade returns (`spec.md` §3, §6): one per
//! `Execute` call, one per `Validate` call. Both are plain data — neither
//! is ever constructed mid-flight and handed out before it is complete.

use std::collections::HashMap;
use std::time::Duration;

use crate::error::ErrorCode;
use crate::message::Message;
use crate::value::Value;

/// The outcome of one `Execute` call (`spec.md` §3's "ExecutionResult").
///
/// `execute` never returns an `Err` — compile and runtime failures alike
/// are folded into `has_error` plus the `error_*` fields, with whatever
/// assignments and messages were produced before the failure point
/// preserved (`spec.md` §7, "partial assignments/messages... preserved").
#[derive(Debug, Clone)]
pub struct ExecutionResult {
    /// Every `Set` target that was actually executed, keyed case-insensitively
    /// per `Options.caseInsensitiveFieldNames`. Insertion order is irrelevant.
    pub assignments: HashMap<String, Value>,
    pub messages: Vec<Message>,
    pub elapsed: Duration,
    pub end_line: usize,
    pub end_column: usize,
    pub has_error: bool,
    pub error_message: Option<String>,
    pub error_line: usize,
    pub error_column: usize,
    pub error_snippet: Option<String>,
    pub error_code: Option<ErrorCode>,
}

impl ExecutionResult {
    pub fn success(
        assignments: HashMap<String, Value>,
        messages: Vec<Message>,
        elapsed: Duration,
        end_line: usize,
        end_column: usize,
    ) -> Self {
        Self {
            assignments,
            messages,
            elapsed,
            end_line,
            end_column,
            has_error: false,
            error_message: None,
            error_line: 0,
            error_column: 0,
            error_snippet: None,
            error_code: None,
        }
    }

    #[allow(clippy::too_many_arguments)]
    pub fn failure(
        assignments: HashMap<String, Value>,
        messages: Vec<Message>,
        elapsed: Duration,
        code: ErrorCode,
        message: String,
        line: usize,
        column: usize,
        snippet: Option<String>,
    ) -> Self {
        Self {
            assignments,
            messages,
            elapsed,
            end_line: line,
            end_column: column,
            has_error: true,
            error_message: Some(message),
            error_line: line,
            error_column: column,
            error_snippet: snippet,
            error_code: Some(code),
        }
    }
}

/// Per-script complexity statistics collected by the validation analyzer
/// (`spec.md` §6, "complexity{...}").
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Complexity {
    pub arithmetic_count: usize,
    pub comparison_count: usize,
    pub logical_count: usize,
    pub function_call_count: usize,
    pub max_block_depth: usize,
    pub conditional_count: usize,
    pub total_expressions: usize,
}

/// The analyzer only ever emits one kind of warning today (an unregistered
/// function call), but the field is an enum rather than a bare string so a
/// future warning class doesn't require a breaking change to consumers that
/// match on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarningKind {
    PotentialIssue,
}

#[derive(Debug, Clone)]
pub struct ValidationWarning {
    pub kind: WarningKind,
    pub message: String,
    pub line: usize,
    pub column: usize,
}

#[derive(Debug, Clone)]
pub struct ReferencedField {
    pub name: String,
    pub line: usize,
    pub column: usize,
}

/// The outcome of a `Validate` call (`spec.md` §3's "ValidationResult").
/// Produced by the read-only analyzer; never executes the script.
#[derive(Debug, Clone)]
pub struct ValidationResult {
    pub success: bool,
    pub error_message: Option<String>,
    pub error_line: usize,
    pub error_column: usize,
    pub error_code: Option<ErrorCode>,
    pub total_nodes: usize,
    pub complexity: Complexity,
    pub used_functions: Vec<String>,
    pub referenced_fields: Vec<ReferencedField>,
    pub declared_variables: Vec<String>,
    pub warnings: Vec<ValidationWarning>,
}

impl ValidationResult {
    pub fn compile_failure(code: ErrorCode, message: String, line: usize, column: usize) -> Self {
        Self {
            success: false,
            error_message: Some(message),
            error_line: line,
            error_column: column,
            error_code: Some(code),
            total_nodes: 0,
            complexity: Complexity::default(),
            used_functions: Vec::new(),
            referenced_fields: Vec::new(),
            declared_variables: Vec::new(),
            warnings: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_result_has_no_error() {
        let r = ExecutionResult::success(HashMap::new(), Vec::new(), Duration::ZERO, 1, 1);
        assert!(!r.has_error);
        assert!(r.error_message.is_none());
    }

    #[test]
    fn failure_result_preserves_partial_state() {
        let mut assignments = HashMap::new();
        assignments.insert("a".to_string(), Value::Number(1.into()));
        let r = ExecutionResult::failure(
            assignments.clone(),
            Vec::new(),
            Duration::ZERO,
            ErrorCode::UnknownField,
            "boom".to_string(),
            3,
            4,
            Some("set(a, 1)".to_string()),
        );
        assert!(r.has_error);
        assert_eq!(r.assignments, assignments);
        assert_eq!(r.error_line, 3);
    }
}

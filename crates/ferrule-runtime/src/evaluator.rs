//! The tree-walking evaluator (`spec.md` §4.4): scope handling, short-circuit
//! logic, typed equality/relational coercion, and statement execution.
//!
//! One `Evaluator` is built per `Execute` call. It owns the visit/depth
//! budget and the execution scope; everything else (options, registries) is
//! borrowed read-only for the call's duration, per `spec.md` §5's "shared
//! resources... treated as immutable during any Execute call."

use std::collections::HashMap;

use chrono::{Local, Utc};
use rust_decimal::{Decimal, RoundingStrategy};

use ferrule_compiler::{BinOp, Block, ElseIf, Expr, Span, Stmt, UnOp};
use ferrule_core::{EngineError, ErrorCode, Message, MessageLevel, Options, Value, ValueType};

use crate::budget::Budget;
use crate::converter::ConverterRegistry;
use crate::function::{FunctionContext, FunctionRegistry};
use crate::scope::ExecutionScope;

/// Control-flow signal threaded through statement execution, instead of
/// exceptions (`spec.md` §9, "Flow signals" design note).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowSignal {
    None,
    Return,
    ReturnLocal,
}

fn rounding_strategy(mode: ferrule_core::MidpointRounding) -> RoundingStrategy {
    match mode {
        ferrule_core::MidpointRounding::ToEven => RoundingStrategy::MidpointNearestEven,
        ferrule_core::MidpointRounding::AwayFromZero => RoundingStrategy::MidpointAwayFromZero,
    }
}

/// How a value classifies for relational comparison (`spec.md` §4.4).
enum RelClass {
    Number(Decimal),
    DateTime(chrono::NaiveDateTime),
    Other,
}

fn classify_rel(value: &Value) -> RelClass {
    match value {
        Value::Number(n) => RelClass::Number(*n),
        Value::DateTime(dt) => RelClass::DateTime(*dt),
        _ => RelClass::Other,
    }
}

pub struct Evaluator<'a> {
    options: &'a Options,
    converters: &'a ConverterRegistry,
    functions: &'a FunctionRegistry,
    scope: ExecutionScope,
    budget: Budget,
    messages: Vec<Message>,
    assignments: HashMap<String, Value>,
    last_span: Span,
}

impl<'a> Evaluator<'a> {
    pub fn new(
        options: &'a Options,
        converters: &'a ConverterRegistry,
        functions: &'a FunctionRegistry,
        inputs: HashMap<String, Value>,
    ) -> Self {
        Self {
            options,
            converters,
            functions,
            scope: ExecutionScope::new(inputs, options.case_insensitive_field_names),
            budget: Budget::new(options),
            messages: Vec::new(),
            assignments: HashMap::new(),
            last_span: Span::dummy(),
        }
    }

    /// Run a compiled script to completion. Any top-level `Return`/
    /// `ReturnLocal` signal simply stops execution; it is not an error.
    pub fn run(&mut self, block: &Block) -> Result<(), EngineError> {
        self.exec_block(block, 0, false)?;
        Ok(())
    }

    pub fn into_parts(self) -> (HashMap<String, Value>, Vec<Message>, Span, u64) {
        (self.assignments, self.messages, self.last_span, self.budget.visits())
    }

    pub fn last_span(&self) -> Span {
        self.last_span
    }

    // ── statements ───────────────────────────────────────────────────

    fn exec_block(&mut self, block: &Block, depth: usize, inside_local: bool) -> Result<FlowSignal, EngineError> {
        for stmt in &block.statements {
            let signal = self.exec_stmt(stmt, depth, inside_local)?;
            if signal != FlowSignal::None {
                return Ok(signal);
            }
        }
        Ok(FlowSignal::None)
    }

    fn exec_stmt(&mut self, stmt: &Stmt, depth: usize, inside_local: bool) -> Result<FlowSignal, EngineError> {
        let span = stmt.span();
        self.last_span = span;
        self.budget.check(0, span)?;

        match stmt {
            Stmt::Set {
                field_name,
                type_hint,
                value,
                ..
            } => {
                self.exec_set(field_name, type_hint.as_deref(), value, depth, span)?;
                Ok(FlowSignal::None)
            }
            Stmt::Msg { text, level, .. } => {
                let level = level.as_deref().map(MessageLevel::parse).unwrap_or(MessageLevel::Info);
                self.messages.push(Message {
                    level,
                    text: text.clone(),
                    line: span.line,
                    column: span.col,
                });
                Ok(FlowSignal::None)
            }
            Stmt::Return { .. } => Ok(FlowSignal::Return),
            Stmt::ReturnLocal { .. } => {
                if inside_local {
                    Ok(FlowSignal::ReturnLocal)
                } else {
                    Ok(FlowSignal::Return)
                }
            }
            Stmt::Assert {
                cond,
                action,
                message,
                level,
                ..
            } => self.exec_assert(cond, action, message, level.as_deref(), depth, span),
            Stmt::If {
                cond,
                then_block,
                else_ifs,
                else_block,
                ..
            } => self.exec_if(cond, then_block, else_ifs, else_block.as_ref(), depth, inside_local),
            Stmt::Local { body, .. } => {
                let signal = self.exec_block(body, depth + 1, true)?;
                match signal {
                    FlowSignal::ReturnLocal => Ok(FlowSignal::None),
                    other => Ok(other),
                }
            }
        }
    }

    fn exec_set(
        &mut self,
        field_name: &str,
        type_hint: Option<&str>,
        value_expr: &Expr,
        depth: usize,
        span: Span,
    ) -> Result<(), EngineError> {
        let value = self.eval_expr(value_expr, depth + 1)?;
        let mut result = match type_hint {
            Some(hint) => {
                let target = type_from_hint(hint);
                self.converters
                    .convert(&value, target, self.options)
                    .map_err(|e| e.at(format!("cannot convert to {hint}"), span.line, span.col))?
            }
            None => value,
        };
        if let Value::Number(n) = result {
            let strategy = rounding_strategy(self.options.midpoint_rounding);
            result = Value::Number(n.round_dp_with_strategy(self.options.rounding_digits, strategy));
        }
        self.scope.set(field_name, result.clone());
        self.record_assignment(field_name, result);
        Ok(())
    }

    fn record_assignment(&mut self, name: &str, value: Value) {
        if self.scope.case_insensitive() {
            if let Some(existing) = self
                .assignments
                .keys()
                .find(|k| k.eq_ignore_ascii_case(name))
                .cloned()
            {
                self.assignments.insert(existing, value);
                return;
            }
        }
        self.assignments.insert(name.to_string(), value);
    }

    fn exec_assert(
        &mut self,
        cond: &Expr,
        action: &str,
        message: &str,
        level: Option<&str>,
        depth: usize,
        span: Span,
    ) -> Result<FlowSignal, EngineError> {
        let cond_val = self.eval_expr(cond, depth + 1)?;
        let cond_bool = match cond_val {
            Value::Boolean(b) => b,
            other => return Err(type_mismatch(format!("assert condition must be boolean, found {}", other.value_type()), span)),
        };
        if cond_bool {
            return Ok(FlowSignal::None);
        }
        let level = level.map(MessageLevel::parse).unwrap_or(MessageLevel::Info);
        self.messages.push(Message {
            level,
            text: message.to_string(),
            line: span.line,
            column: span.col,
        });
        match action.to_ascii_lowercase().as_str() {
            "none" => Ok(FlowSignal::None),
            "return" => Ok(FlowSignal::Return),
            "return_local" => Ok(FlowSignal::ReturnLocal),
            other => Err(EngineError::new(
                ErrorCode::UnknownOperator,
                format!("unknown assert action '{other}'"),
                span.line,
                span.col,
            )),
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn exec_if(
        &mut self,
        cond: &Expr,
        then_block: &Block,
        else_ifs: &[ElseIf],
        else_block: Option<&Block>,
        depth: usize,
        inside_local: bool,
    ) -> Result<FlowSignal, EngineError> {
        if self.eval_condition(cond, depth)? {
            return self.exec_block(then_block, depth + 1, inside_local);
        }
        for arm in else_ifs {
            if self.eval_condition(&arm.cond, depth)? {
                return self.exec_block(&arm.block, depth + 1, inside_local);
            }
        }
        if let Some(block) = else_block {
            return self.exec_block(block, depth + 1, inside_local);
        }
        Ok(FlowSignal::None)
    }

    fn eval_condition(&mut self, cond: &Expr, depth: usize) -> Result<bool, EngineError> {
        let span = cond.span();
        match self.eval_expr(cond, depth + 1)? {
            Value::Boolean(b) => Ok(b),
            other => Err(type_mismatch(
                format!("condition must be boolean, found {}", other.value_type()),
                span,
            )),
        }
    }

    // ── expressions ──────────────────────────────────────────────────

    fn eval_expr(&mut self, expr: &Expr, depth: usize) -> Result<Value, EngineError> {
        let span = expr.span();
        self.last_span = span;
        self.budget.check(depth, span)?;

        match expr {
            Expr::Literal { value, .. } => Ok(value.clone()),
            Expr::Now { .. } => {
                let now = if self.options.now_use_local_time {
                    Local::now().naive_local()
                } else {
                    Utc::now().naive_utc()
                };
                Ok(Value::DateTime(now))
            }
            Expr::Field { name, type_hint, span } => self.eval_field(name, type_hint.as_deref(), *span),
            Expr::Unary { op, inner, span } => self.eval_unary(*op, inner, depth, *span),
            Expr::Binary { op, left, right, span } => self.eval_binary(*op, left, right, depth, *span),
            Expr::Call { name, args, span } => self.eval_call(name, args, depth, *span),
        }
    }

    fn eval_field(&mut self, name: &str, type_hint: Option<&str>, span: Span) -> Result<Value, EngineError> {
        self.validate_field_name(name, span)?;
        let stored = self
            .scope
            .mutable_field(name)
            .cloned()
            .ok_or_else(|| EngineError::new(ErrorCode::UnknownField, format!("unknown field '{name}'"), span.line, span.col))?;

        let target = match type_hint {
            Some(hint) => type_from_hint(hint),
            None if !stored.is_null() => stored.value_type(),
            None => ValueType::String,
        };

        self.converters
            .convert(&stored, target, self.options)
            .map_err(|e| e.at(format!("cannot read field '{name}' as {target}"), span.line, span.col))
    }

    fn validate_field_name(&self, name: &str, span: Span) -> Result<(), EngineError> {
        let ok = if let Some(validator) = &self.options.field_name_validator {
            validator(name)
        } else if self.options.strict_field_name_validation {
            !name.is_empty()
                && name
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == ' ')
        } else {
            true
        };
        if ok {
            Ok(())
        } else {
            Err(EngineError::new(
                ErrorCode::InvalidFieldName,
                format!("field name '{name}' failed validation"),
                span.line,
                span.col,
            ))
        }
    }

    fn eval_unary(&mut self, op: UnOp, inner: &Expr, depth: usize, span: Span) -> Result<Value, EngineError> {
        let value = self.eval_expr(inner, depth + 1)?;
        match op {
            UnOp::Neg => {
                let n = self.to_number(&value, span)?;
                Ok(Value::Number(-n))
            }
            UnOp::Not => match value {
                Value::Boolean(b) => Ok(Value::Boolean(!b)),
                other => Err(type_mismatch(format!("'!' requires boolean, found {}", other.value_type()), span)),
            },
        }
    }

    fn eval_binary(&mut self, op: BinOp, left: &Expr, right: &Expr, depth: usize, span: Span) -> Result<Value, EngineError> {
        match op {
            BinOp::And => {
                let l = self.eval_bool_operand(left, depth, span)?;
                if !l {
                    return Ok(Value::Boolean(false));
                }
                Ok(Value::Boolean(self.eval_bool_operand(right, depth, span)?))
            }
            BinOp::Or => {
                let l = self.eval_bool_operand(left, depth, span)?;
                if l {
                    return Ok(Value::Boolean(true));
                }
                Ok(Value::Boolean(self.eval_bool_operand(right, depth, span)?))
            }
            BinOp::Add => {
                let l = self.eval_expr(left, depth + 1)?;
                let r = self.eval_expr(right, depth + 1)?;
                self.eval_add(l, r, span)
            }
            BinOp::Sub | BinOp::Mul | BinOp::Div | BinOp::Mod => {
                let l = self.eval_expr(left, depth + 1)?;
                let r = self.eval_expr(right, depth + 1)?;
                let ln = self.to_number(&l, span)?;
                let rn = self.to_number(&r, span)?;
                match op {
                    BinOp::Sub => ln
                        .checked_sub(rn)
                        .map(Value::Number)
                        .ok_or_else(|| overflow_error(span)),
                    BinOp::Mul => ln
                        .checked_mul(rn)
                        .map(Value::Number)
                        .ok_or_else(|| overflow_error(span)),
                    BinOp::Div => {
                        if rn.is_zero() {
                            Err(EngineError::new(ErrorCode::DivideByZero, "division by zero", span.line, span.col))
                        } else {
                            ln.checked_div(rn)
                                .map(Value::Number)
                                .ok_or_else(|| overflow_error(span))
                        }
                    }
                    BinOp::Mod => {
                        if rn.is_zero() {
                            Err(EngineError::new(ErrorCode::ModuloByZero, "modulo by zero", span.line, span.col))
                        } else {
                            ln.checked_rem(rn)
                                .map(Value::Number)
                                .ok_or_else(|| overflow_error(span))
                        }
                    }
                    _ => unreachable!(),
                }
            }
            BinOp::Gt | BinOp::Lt | BinOp::Ge | BinOp::Le => {
                let l = self.eval_expr(left, depth + 1)?;
                let r = self.eval_expr(right, depth + 1)?;
                self.eval_relational(op, l, r, span)
            }
            BinOp::Eq | BinOp::Ne => {
                let l = self.eval_expr(left, depth + 1)?;
                let r = self.eval_expr(right, depth + 1)?;
                let eq = self.eval_equality(l, r, span)?;
                Ok(Value::Boolean(if op == BinOp::Eq { eq } else { !eq }))
            }
        }
    }

    fn eval_bool_operand(&mut self, expr: &Expr, depth: usize, span: Span) -> Result<bool, EngineError> {
        match self.eval_expr(expr, depth + 1)? {
            Value::Boolean(b) => Ok(b),
            other => Err(type_mismatch(format!("logical operand must be boolean, found {}", other.value_type()), span)),
        }
    }

    fn to_number(&self, value: &Value, span: Span) -> Result<Decimal, EngineError> {
        match self.converters.convert(value, ValueType::Number, self.options) {
            Ok(Value::Number(n)) => Ok(n),
            _ => Err(EngineError::new(
                ErrorCode::ConversionError,
                format!("cannot convert {} to decimal", value.value_type()),
                span.line,
                span.col,
            )),
        }
    }

    fn to_datetime(&self, value: &Value, span: Span) -> Result<chrono::NaiveDateTime, EngineError> {
        match self.converters.convert(value, ValueType::DateTime, self.options) {
            Ok(Value::DateTime(dt)) => Ok(dt),
            _ => Err(EngineError::new(
                ErrorCode::ConversionError,
                format!("cannot convert {} to datetime", value.value_type()),
                span.line,
                span.col,
            )),
        }
    }

    /// Stringify a value for string concatenation's fallback path
    /// (`spec.md` §4.4, `+`'s `PreferStringIfAnyString`/fallback branch).
    /// Distinct from the converter registry's unconditional null→"" for
    /// typed reads: here, `treatNullStringAsEmpty=false` raises
    /// `NullReference` instead of silently emptying the null, since the
    /// option is documented as specifically gating this fallback.
    fn stringify_for_concat(&self, value: &Value, span: Span) -> Result<String, EngineError> {
        if value.is_null() {
            return if self.options.treat_null_string_as_empty {
                Ok(String::new())
            } else {
                Err(EngineError::new(
                    ErrorCode::NullReference,
                    "null value used in string concatenation",
                    span.line,
                    span.col,
                ))
            };
        }
        match self.converters.convert(value, ValueType::String, self.options) {
            Ok(Value::String(s)) => Ok(s),
            _ => Ok(value.default_string_form(&self.options.date_time_format)),
        }
    }

    fn eval_add(&self, left: Value, right: Value, span: Span) -> Result<Value, EngineError> {
        let any_string = matches!(left, Value::String(_)) || matches!(right, Value::String(_));
        if !any_string {
            let ln = self.to_number(&left, span)?;
            let rn = self.to_number(&right, span)?;
            return ln
                .checked_add(rn)
                .map(Value::Number)
                .ok_or_else(|| overflow_error(span));
        }
        match self.options.string_concat {
            ferrule_core::StringConcat::PreferStringIfAnyString => {
                let ls = self.stringify_for_concat(&left, span)?;
                let rs = self.stringify_for_concat(&right, span)?;
                Ok(Value::String(ls + &rs))
            }
            ferrule_core::StringConcat::PreferNumericIfParsable => {
                if let (Some(ln), Some(rn)) = (try_as_decimal(&left), try_as_decimal(&right)) {
                    ln.checked_add(rn)
                        .map(Value::Number)
                        .ok_or_else(|| overflow_error(span))
                } else {
                    let ls = self.stringify_for_concat(&left, span)?;
                    let rs = self.stringify_for_concat(&right, span)?;
                    Ok(Value::String(ls + &rs))
                }
            }
        }
    }

    fn eval_relational(&self, op: BinOp, left: Value, right: Value, span: Span) -> Result<Value, EngineError> {
        let (l, r) = (classify_rel(&left), classify_rel(&right));
        let (ld, rd) = match (l, r) {
            (RelClass::DateTime(_), RelClass::Number(_)) | (RelClass::Number(_), RelClass::DateTime(_)) => {
                return Err(type_mismatch("cannot compare a number with a datetime".to_string(), span));
            }
            (RelClass::Number(a), RelClass::Number(b)) => (Cmp::Num(a), Cmp::Num(b)),
            (RelClass::DateTime(a), RelClass::DateTime(b)) => (Cmp::Dt(a), Cmp::Dt(b)),
            (RelClass::DateTime(a), RelClass::Other) => (Cmp::Dt(a), Cmp::Dt(self.to_datetime(&right, span)?)),
            (RelClass::Other, RelClass::DateTime(b)) => (Cmp::Dt(self.to_datetime(&left, span)?), Cmp::Dt(b)),
            (RelClass::Number(a), RelClass::Other) => (Cmp::Num(a), Cmp::Num(self.to_number(&right, span)?)),
            (RelClass::Other, RelClass::Number(b)) => (Cmp::Num(self.to_number(&left, span)?), Cmp::Num(b)),
            (RelClass::Other, RelClass::Other) => (Cmp::Num(self.to_number(&left, span)?), Cmp::Num(self.to_number(&right, span)?)),
        };
        let ordering = match (ld, rd) {
            (Cmp::Num(a), Cmp::Num(b)) => a.partial_cmp(&b),
            (Cmp::Dt(a), Cmp::Dt(b)) => a.partial_cmp(&b),
            _ => unreachable!("classify_rel pairs are homogeneous after coercion"),
        }
        .expect("decimal/datetime comparisons are always total");
        let result = match op {
            BinOp::Gt => ordering == std::cmp::Ordering::Greater,
            BinOp::Lt => ordering == std::cmp::Ordering::Less,
            BinOp::Ge => ordering != std::cmp::Ordering::Less,
            BinOp::Le => ordering != std::cmp::Ordering::Greater,
            _ => unreachable!(),
        };
        Ok(Value::Boolean(result))
    }

    fn eval_equality(&self, left: Value, right: Value, span: Span) -> Result<bool, EngineError> {
        let either_string = matches!(left, Value::String(_)) || matches!(right, Value::String(_));
        if !either_string {
            match (&left, &right) {
                (Value::Boolean(a), Value::Boolean(b)) => return Ok(a == b),
                (Value::Number(a), Value::Number(b)) => return Ok(a == b),
                (Value::DateTime(a), Value::DateTime(b)) => return Ok(a == b),
                _ => {}
            }
            return match self.options.equality_coercion {
                ferrule_core::EqualityCoercion::Permissive | ferrule_core::EqualityCoercion::MixedNumericOnly => {
                    Ok(self.stringified_eq(&left, &right))
                }
                ferrule_core::EqualityCoercion::Strict | ferrule_core::EqualityCoercion::NumberFriendly => Err(
                    type_mismatch(format!("cannot compare {} with {}", left.value_type(), right.value_type()), span),
                ),
            };
        }

        match self.options.equality_coercion {
            ferrule_core::EqualityCoercion::Strict => Ok(self.stringified_eq(&left, &right)),
            ferrule_core::EqualityCoercion::NumberFriendly | ferrule_core::EqualityCoercion::Permissive => {
                match (try_as_decimal(&left), try_as_decimal(&right)) {
                    (Some(a), Some(b)) => Ok(a == b),
                    _ => Ok(self.stringified_eq(&left, &right)),
                }
            }
            ferrule_core::EqualityCoercion::MixedNumericOnly => {
                if matches!(left, Value::String(_)) && matches!(right, Value::String(_)) {
                    return Ok(self.stringified_eq(&left, &right));
                }
                match (try_as_decimal(&left), try_as_decimal(&right)) {
                    (Some(a), Some(b)) => Ok(a == b),
                    _ => Ok(self.stringified_eq(&left, &right)),
                }
            }
        }
    }

    fn stringified_eq(&self, left: &Value, right: &Value) -> bool {
        let ls = self.to_comparable_string(left);
        let rs = self.to_comparable_string(right);
        match self.options.string_comparison {
            ferrule_core::StringComparison::CaseSensitive => ls == rs,
            ferrule_core::StringComparison::IgnoreCase => ls.eq_ignore_ascii_case(&rs),
        }
    }

    fn to_comparable_string(&self, value: &Value) -> String {
        match self.converters.convert(value, ValueType::String, self.options) {
            Ok(Value::String(s)) => s,
            _ => value.default_string_form(&self.options.date_time_format),
        }
    }

    fn eval_call(&mut self, name: &str, args: &[Expr], depth: usize, span: Span) -> Result<Value, EngineError> {
        let function = self
            .functions
            .resolve(name)
            .ok_or_else(|| EngineError::new(ErrorCode::UnknownFunction, format!("unknown function '{name}'"), span.line, span.col))?;

        let mut values = Vec::with_capacity(args.len());
        for arg in args {
            values.push(self.eval_expr(arg, depth + 1)?);
        }

        let ctx = FunctionContext {
            options: self.options,
            converters: self.converters,
            input_fields: self.scope.input_fields(),
        };
        function
            .invoke(&values, &ctx)
            .map_err(|msg| EngineError::new(ErrorCode::InvalidFunctionArguments, msg, span.line, span.col))
    }
}

enum Cmp {
    Num(Decimal),
    Dt(chrono::NaiveDateTime),
}

fn type_from_hint(hint: &str) -> ValueType {
    match hint.to_ascii_lowercase().as_str() {
        "string" => ValueType::String,
        "decimal" => ValueType::Number,
        "bool" => ValueType::Boolean,
        "datetime" => ValueType::DateTime,
        _ => ValueType::String,
    }
}

fn try_as_decimal(value: &Value) -> Option<Decimal> {
    match value {
        Value::Number(n) => Some(*n),
        Value::String(s) => s.trim().parse::<Decimal>().ok(),
        _ => None,
    }
}

fn type_mismatch(message: String, span: Span) -> EngineError {
    EngineError::new(ErrorCode::TypeMismatch, message, span.line, span.col)
}

/// `rust_decimal::Decimal`'s arithmetic operators panic on overflow; every
/// site that performs decimal arithmetic on script-supplied values uses the
/// `checked_*` form instead and routes a `None` here, so an in-budget
/// script can never unwind `Engine::execute` (`spec.md` §7, §8).
fn overflow_error(span: Span) -> EngineError {
    EngineError::new(ErrorCode::ConversionError, "decimal arithmetic overflowed", span.line, span.col)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::converter::ConverterRegistry;
    use crate::function::FunctionRegistry;
    use ferrule_compiler::parse;

    fn exec(source: &str, options: Options, inputs: HashMap<String, Value>) -> Result<HashMap<String, Value>, EngineError> {
        let block = parse(source, options.enable_comments).expect("script parses");
        let converters = ConverterRegistry::new();
        let mut functions = FunctionRegistry::new();
        crate::builtins::register_all(&mut functions);
        let mut evaluator = Evaluator::new(&options, &converters, &functions, inputs);
        evaluator.run(&block)?;
        let (assignments, _messages, _span, _visits) = evaluator.into_parts();
        Ok(assignments)
    }

    #[test]
    fn arithmetic_precedence() {
        let out = exec(
            "{ set(a, 1+2*3) set(b, (1+2)*3) set(c, 7%4) set(d, 8/2) }",
            Options::default(),
            HashMap::new(),
        )
        .unwrap();
        assert_eq!(out["a"], Value::Number(Decimal::from(7)));
        assert_eq!(out["b"], Value::Number(Decimal::from(9)));
        assert_eq!(out["c"], Value::Number(Decimal::from(3)));
        assert_eq!(out["d"], Value::Number(Decimal::from(4)));
    }

    #[test]
    fn typed_null_field_read_with_default() {
        let mut opts = Options::default();
        opts.treat_null_decimal_as_zero = true;
        let mut inputs = HashMap::new();
        inputs.insert("nullField".to_string(), Value::Null);
        let out = exec("{ set(a, [nullField:decimal] + 5) }", opts, inputs).unwrap();
        assert_eq!(out["a"], Value::Number(Decimal::from(5)));
    }

    #[test]
    fn short_circuit_or_skips_unknown_function() {
        let out = exec("{ set(a, true || NotAFunction(1)) }", Options::default(), HashMap::new()).unwrap();
        assert_eq!(out["a"], Value::Boolean(true));

        let err = exec("{ set(a, false || NotAFunction(1)) }", Options::default(), HashMap::new()).unwrap_err();
        assert_eq!(err.code, ErrorCode::UnknownFunction);
    }

    #[test]
    fn mixed_numeric_only_equality() {
        let mut opts = Options::default();
        opts.equality_coercion = ferrule_core::EqualityCoercion::MixedNumericOnly;
        let out = exec(
            "{ set(a, '2.0' == '2') set(b, 2 == '2.0') set(c, 'abc' == 123) }",
            opts,
            HashMap::new(),
        )
        .unwrap();
        assert_eq!(out["a"], Value::Boolean(false));
        assert_eq!(out["b"], Value::Boolean(true));
        assert_eq!(out["c"], Value::Boolean(false));
    }

    #[test]
    fn local_swallows_return_local() {
        let out = exec(
            "{ local { set(a,1) return_local set(a,2) } set(b,9) }",
            Options::default(),
            HashMap::new(),
        )
        .unwrap();
        assert_eq!(out["a"], Value::Number(Decimal::from(1)));
        assert_eq!(out["b"], Value::Number(Decimal::from(9)));
    }

    #[test]
    fn assert_warn_return_skips_rest() {
        let block = parse("{ assert(false, 'return', 'X', 'warn') set(a,1) }", true).unwrap();
        let options = Options::default();
        let converters = ConverterRegistry::new();
        let functions = FunctionRegistry::new();
        let mut evaluator = Evaluator::new(&options, &converters, &functions, HashMap::new());
        evaluator.run(&block).unwrap();
        let (assignments, messages, _span, _visits) = evaluator.into_parts();
        assert!(!assignments.contains_key("a"));
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].level, MessageLevel::Warn);
        assert_eq!(messages[0].text, "X");
    }

    #[test]
    fn input_fields_unaffected_by_prior_set() {
        let mut inputs = HashMap::new();
        inputs.insert("x".to_string(), Value::Number(Decimal::from(1)));
        let block = parse("{ set(x, 99) set(y, FieldExists('x')) }", true).unwrap();
        let options = Options::default();
        let converters = ConverterRegistry::new();
        let mut functions = FunctionRegistry::new();
        crate::builtins::register_all(&mut functions);
        let mut evaluator = Evaluator::new(&options, &converters, &functions, inputs);
        evaluator.run(&block).unwrap();
        let (assignments, _messages, _span, _visits) = evaluator.into_parts();
        assert_eq!(assignments["x"], Value::Number(Decimal::from(99)));
        assert_eq!(assignments["y"], Value::Boolean(true));
    }
}

//! One test per literal scenario in `spec.md` §8, driven through the
//! `Engine` facade end-to-end (compile + execute), not through the
//! evaluator directly.

use std::collections::HashMap;

use ferrule_core::{ErrorCode, Options, Value};
use ferrule_runtime::Engine;

#[test]
fn scenario_1_arithmetic_precedence() {
    let engine = Engine::default();
    let result = engine.execute(
        "{ set(a, 1+2*3) set(b, (1+2)*3) set(c, 7%4) set(d, 8/2) }",
        HashMap::new(),
    );
    assert!(!result.has_error);
    assert_eq!(result.assignments["a"], Value::Number(7.into()));
    assert_eq!(result.assignments["b"], Value::Number(9.into()));
    assert_eq!(result.assignments["c"], Value::Number(3.into()));
    assert_eq!(result.assignments["d"], Value::Number(4.into()));
}

#[test]
fn scenario_2_typed_read_with_null_default() {
    let mut opts = Options::default();
    opts.treat_null_decimal_as_zero = true;
    let engine = Engine::new(opts);
    let mut inputs = HashMap::new();
    inputs.insert("nullField".to_string(), Value::Null);
    let result = engine.execute("{ set(a, [nullField:decimal] + 5) }", inputs);
    assert!(!result.has_error);
    assert_eq!(result.assignments["a"], Value::Number(5.into()));
}

#[test]
fn scenario_3_short_circuit_safety() {
    let engine = Engine::default();

    let ok = engine.execute("{ set(a, true || NotAFunction(1)) }", HashMap::new());
    assert!(!ok.has_error);
    assert_eq!(ok.assignments["a"], Value::Boolean(true));

    let err = engine.execute("{ set(a, false || NotAFunction(1)) }", HashMap::new());
    assert!(err.has_error);
    assert_eq!(err.error_code, Some(ErrorCode::UnknownFunction));
}

#[test]
fn scenario_4_equality_coercion_mixed_numeric_only() {
    let mut opts = Options::default();
    opts.equality_coercion = ferrule_core::EqualityCoercion::MixedNumericOnly;
    let engine = Engine::new(opts);
    let result = engine.execute(
        "{ set(a, '2.0' == '2') set(b, 2 == '2.0') set(c, 'abc' == 123) }",
        HashMap::new(),
    );
    assert!(!result.has_error);
    assert_eq!(result.assignments["a"], Value::Boolean(false));
    assert_eq!(result.assignments["b"], Value::Boolean(true));
    assert_eq!(result.assignments["c"], Value::Boolean(false));
}

#[test]
fn scenario_5_local_return_local() {
    let engine = Engine::default();
    let result = engine.execute(
        "{ local { set(a,1) return_local set(a,2) } set(b,9) }",
        HashMap::new(),
    );
    assert!(!result.has_error);
    assert_eq!(result.assignments["a"], Value::Number(1.into()));
    assert_eq!(result.assignments["b"], Value::Number(9.into()));
}

#[test]
fn scenario_6_assert_warn_return() {
    let engine = Engine::default();
    let result = engine.execute("{ assert(false, 'return', 'X', 'warn') set(a,1) }", HashMap::new());
    assert!(!result.has_error);
    assert!(!result.assignments.contains_key("a"));
    assert_eq!(result.messages.len(), 1);
    assert_eq!(result.messages[0].text, "X");
    assert_eq!(result.messages[0].level, ferrule_core::MessageLevel::Warn);
}

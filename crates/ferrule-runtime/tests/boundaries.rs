//! One test per boundary behavior in `spec.md` §8, driven through the
//! `Engine` facade.

use std::collections::HashMap;

use ferrule_core::{ErrorCode, Options, Value};
use ferrule_runtime::Engine;

#[test]
fn empty_script_succeeds_with_nothing() {
    let engine = Engine::default();
    let result = engine.execute("", HashMap::new());
    assert!(!result.has_error);
    assert!(result.assignments.is_empty());
    assert!(result.messages.is_empty());
}

#[test]
fn braces_only_script_succeeds_with_nothing() {
    let engine = Engine::default();
    let result = engine.execute("{}", HashMap::new());
    assert!(!result.has_error);
    assert!(result.assignments.is_empty());
    assert!(result.messages.is_empty());
}

#[test]
fn comments_and_blank_lines_behave_as_empty() {
    let mut opts = Options::default();
    opts.enable_comments = true;
    let engine = Engine::new(opts);
    let result = engine.execute("{\n  // just a comment\n\n}\n", HashMap::new());
    assert!(!result.has_error);
    assert!(result.assignments.is_empty());
}

#[test]
fn string_escapes_decode_to_canonical_runes() {
    let engine = Engine::default();
    let result = engine.execute(r"{ set(a, 'it\'s\n\r\t\\end') }", HashMap::new());
    assert!(!result.has_error);
    assert_eq!(result.assignments["a"], Value::String("it's\n\r\t\\end".to_string()));
}

#[test]
fn unrecognized_escape_keeps_both_characters_literally() {
    let engine = Engine::default();
    let result = engine.execute(r"{ set(a, 'x\qy') }", HashMap::new());
    assert!(!result.has_error);
    assert_eq!(result.assignments["a"], Value::String("x\\qy".to_string()));
}

#[test]
fn field_name_with_spaces_stores_under_the_raw_name() {
    let engine = Engine::default();
    let result = engine.execute("{ set([field name], 'x') }", HashMap::new());
    assert!(!result.has_error);
    assert_eq!(result.assignments["field name"], Value::String("x".to_string()));
}

#[test]
fn substring_start_past_end_is_an_argument_error() {
    let engine = Engine::default();
    let result = engine.execute("{ set(a, Substring('hello', 10)) }", HashMap::new());
    assert!(result.has_error);
    assert_eq!(result.error_code, Some(ErrorCode::InvalidFunctionArguments));
}

#[test]
fn substring_length_past_end_is_an_argument_error() {
    let engine = Engine::default();
    let result = engine.execute("{ set(a, Substring('hello', 2, 10)) }", HashMap::new());
    assert!(result.has_error);
    assert_eq!(result.error_code, Some(ErrorCode::InvalidFunctionArguments));
}

#[test]
fn substring_negative_start_is_an_argument_error() {
    let engine = Engine::default();
    let result = engine.execute("{ set(a, Substring('hello', -1)) }", HashMap::new());
    assert!(result.has_error);
    assert_eq!(result.error_code, Some(ErrorCode::InvalidFunctionArguments));
}

#[test]
fn regex_match_nested_quantifier_reports_timeout() {
    let mut opts = Options::default();
    opts.regex_timeout_milliseconds = 5;
    let engine = Engine::new(opts);
    let input = format!("{}b", "a".repeat(30));
    let result = engine.execute(&format!("{{ set(a, RegexMatch('{input}', '^(a+)+$')) }}"), HashMap::new());
    assert!(result.has_error);
    assert_eq!(result.error_code, Some(ErrorCode::InvalidFunctionArguments));
    assert!(result
        .error_message
        .as_ref()
        .unwrap()
        .to_lowercase()
        .contains("timeout"));
}

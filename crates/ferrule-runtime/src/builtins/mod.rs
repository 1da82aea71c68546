//! Built-in function contracts (`spec.md` §6). These are external
//! collaborators the engine depends on only by name, arity, and return
//! shape — but a usable engine needs them implemented, so they live here
//! rather than as stubs.

pub mod datetime;
pub mod math;
pub mod string;

use ferrule_core::{Value, ValueType};
use rust_decimal::Decimal;

use crate::converter::ConverterRegistry;
use crate::function::FunctionRegistry;

pub fn register_all(registry: &mut FunctionRegistry) {
    string::register(registry);
    math::register(registry);
    datetime::register(registry);
}

pub(crate) fn as_string(value: &Value, converters: &ConverterRegistry, options: &ferrule_core::Options) -> Result<String, String> {
    match value {
        Value::String(s) => Ok(s.clone()),
        other => converters
            .convert(other, ValueType::String, options)
            .map(|v| match v {
                Value::String(s) => s,
                _ => unreachable!("converter contract: String target yields Value::String"),
            })
            .map_err(|_| format!("cannot convert {} to string", other.value_type())),
    }
}

pub(crate) fn as_number(value: &Value, converters: &ConverterRegistry, options: &ferrule_core::Options) -> Result<Decimal, String> {
    match value {
        Value::Number(n) => Ok(*n),
        other => converters
            .convert(other, ValueType::Number, options)
            .map(|v| match v {
                Value::Number(n) => n,
                _ => unreachable!("converter contract: Number target yields Value::Number"),
            })
            .map_err(|_| format!("cannot convert {} to decimal", other.value_type())),
    }
}

pub(crate) fn as_bool(value: &Value) -> Result<bool, String> {
    match value {
        Value::Boolean(b) => Ok(*b),
        other => Err(format!("expected boolean, found {}", other.value_type())),
    }
}

pub(crate) fn optional_bool_flag(args: &[Value], index: usize) -> Result<Option<bool>, String> {
    match args.get(index) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Boolean(b)) => Ok(Some(*b)),
        Some(other) => Err(format!("expected boolean flag, found {}", other.value_type())),
    }
}

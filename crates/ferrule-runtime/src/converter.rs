//! Converter registry: ordered typed coercions (`spec.md` §4.3, §6).
//!
//! `register` prepends, so the most recently registered converter for a
//! given `(input, output)` pair wins; built-ins are pinned at construction
//! and are never removed (`spec.md` §9's "Converter ordering" design
//! note). Linear scan is fine — the registry is small, typically under
//! twenty entries.

use std::str::FromStr;

use chrono::NaiveDateTime;
use ferrule_core::{EngineError, ErrorCode, Options, Value, ValueType};
use rust_decimal::Decimal;

/// What a [`Converter`] accepts as input. `Any` matches every runtime
/// type — used by the catch-all stringifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeSpec {
    Any,
    Exact(ValueType),
}

impl TypeSpec {
    fn matches(&self, t: ValueType) -> bool {
        match self {
            TypeSpec::Any => true,
            TypeSpec::Exact(e) => *e == t,
        }
    }
}

/// A single typed coercion.
pub trait Converter: Send + Sync {
    fn input_type(&self) -> TypeSpec;
    fn output_type(&self) -> ValueType;
    fn try_convert(&self, value: &Value, options: &Options) -> Option<Value>;
}

struct AnyToString;
impl Converter for AnyToString {
    fn input_type(&self) -> TypeSpec {
        TypeSpec::Any
    }
    fn output_type(&self) -> ValueType {
        ValueType::String
    }
    fn try_convert(&self, value: &Value, options: &Options) -> Option<Value> {
        Some(Value::String(value.default_string_form(&options.date_time_format)))
    }
}

struct StringToDecimal;
impl Converter for StringToDecimal {
    fn input_type(&self) -> TypeSpec {
        TypeSpec::Exact(ValueType::String)
    }
    fn output_type(&self) -> ValueType {
        ValueType::Number
    }
    fn try_convert(&self, value: &Value, _options: &Options) -> Option<Value> {
        match value {
            Value::String(s) => Decimal::from_str(s.trim()).ok().map(Value::Number),
            _ => None,
        }
    }
}

struct StringToBool;
impl Converter for StringToBool {
    fn input_type(&self) -> TypeSpec {
        TypeSpec::Exact(ValueType::String)
    }
    fn output_type(&self) -> ValueType {
        ValueType::Boolean
    }
    fn try_convert(&self, value: &Value, _options: &Options) -> Option<Value> {
        match value {
            Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" => Some(Value::Boolean(true)),
                "false" => Some(Value::Boolean(false)),
                _ => None,
            },
            _ => None,
        }
    }
}

struct StringToDateTime;
impl Converter for StringToDateTime {
    fn input_type(&self) -> TypeSpec {
        TypeSpec::Exact(ValueType::String)
    }
    fn output_type(&self) -> ValueType {
        ValueType::DateTime
    }
    fn try_convert(&self, value: &Value, options: &Options) -> Option<Value> {
        match value {
            Value::String(s) => NaiveDateTime::parse_from_str(s.trim(), &options.date_time_format)
                .ok()
                .map(Value::DateTime),
            _ => None,
        }
    }
}

pub struct ConverterRegistry {
    converters: Vec<Box<dyn Converter>>,
}

impl ConverterRegistry {
    pub fn new() -> Self {
        let mut registry = Self {
            converters: Vec::new(),
        };
        // Registered in order, each prepended — the last one here ends up
        // first in the scan, but since built-ins target disjoint
        // (input, output) pairs the order among them is immaterial.
        registry.register(Box::new(AnyToString));
        registry.register(Box::new(StringToDecimal));
        registry.register(Box::new(StringToBool));
        registry.register(Box::new(StringToDateTime));
        registry
    }

    /// Register a converter. Last-registered wins: new entries are
    /// prepended, so they are found before any earlier registration for
    /// the same `(input, output)` pair.
    pub fn register(&mut self, converter: Box<dyn Converter>) {
        self.converters.insert(0, converter);
    }

    /// Coerce `value` to `target`, per `spec.md` §4.3's null-handling rules
    /// and then a linear scan over registered converters.
    pub fn convert(
        &self,
        value: &Value,
        target: ValueType,
        options: &Options,
    ) -> Result<Value, ConversionFailure> {
        if value.is_null() {
            return match target {
                ValueType::Null => Ok(Value::Null),
                ValueType::String => Ok(Value::String(String::new())),
                ValueType::Number => {
                    if options.treat_null_decimal_as_zero {
                        Ok(Value::Number(Decimal::ZERO))
                    } else {
                        Err(ConversionFailure)
                    }
                }
                ValueType::Boolean => {
                    if options.treat_null_bool_as_false {
                        Ok(Value::Boolean(false))
                    } else {
                        Err(ConversionFailure)
                    }
                }
                ValueType::DateTime => Ok(Value::DateTime(options.null_date_time_default)),
            };
        }

        if value.value_type() == target {
            return Ok(value.clone());
        }

        for converter in &self.converters {
            if converter.input_type().matches(value.value_type()) && converter.output_type() == target {
                if let Some(converted) = converter.try_convert(value, options) {
                    return Ok(converted);
                }
            }
        }
        Err(ConversionFailure)
    }
}

impl Default for ConverterRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// A coercion attempt found no applicable converter, or the applicable
/// converter's own parse failed. The caller attaches position to produce
/// an [`EngineError`] with [`ErrorCode::ConversionError`].
#[derive(Debug, Clone, Copy)]
pub struct ConversionFailure;

impl ConversionFailure {
    pub fn at(self, message: impl Into<String>, line: usize, column: usize) -> EngineError {
        EngineError::new(ErrorCode::ConversionError, message, line, column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn string_to_decimal_round_trips() {
        let reg = ConverterRegistry::new();
        let opts = Options::default();
        let v = reg
            .convert(&Value::String("12.5".to_string()), ValueType::Number, &opts)
            .unwrap();
        assert!(matches!(v, Value::Number(n) if n == Decimal::new(125, 1)));
    }

    #[test]
    fn null_to_string_is_empty() {
        let reg = ConverterRegistry::new();
        let opts = Options::default();
        let v = reg.convert(&Value::Null, ValueType::String, &opts).unwrap();
        assert!(matches!(v, Value::String(s) if s.is_empty()));
    }

    #[test]
    fn null_to_decimal_respects_option() {
        let reg = ConverterRegistry::new();
        let mut opts = Options::default();
        opts.treat_null_decimal_as_zero = true;
        let v = reg.convert(&Value::Null, ValueType::Number, &opts).unwrap();
        assert!(matches!(v, Value::Number(n) if n.is_zero()));

        opts.treat_null_decimal_as_zero = false;
        assert!(reg.convert(&Value::Null, ValueType::Number, &opts).is_err());
    }

    #[test]
    fn later_registration_wins() {
        struct AlwaysZero;
        impl Converter for AlwaysZero {
            fn input_type(&self) -> TypeSpec {
                TypeSpec::Exact(ValueType::String)
            }
            fn output_type(&self) -> ValueType {
                ValueType::Number
            }
            fn try_convert(&self, _value: &Value, _options: &Options) -> Option<Value> {
                Some(Value::Number(Decimal::ZERO))
            }
        }
        let mut reg = ConverterRegistry::new();
        reg.register(Box::new(AlwaysZero));
        let opts = Options::default();
        let v = reg
            .convert(&Value::String("99".to_string()), ValueType::Number, &opts)
            .unwrap();
        assert!(matches!(v, Value::Number(n) if n.is_zero()));
    }
}

//! Function registry: case-insensitive name → callable (`spec.md` §4.3).

use std::collections::HashMap;

use ferrule_core::{Options, Value};

use crate::converter::ConverterRegistry;

/// Arguments are pre-evaluated `Value`s; errors are reported as plain
/// strings, which the evaluator wraps into `InvalidFunctionArguments` at
/// the call site's position (`spec.md` §7).
pub type FunctionResult = Result<Value, String>;

/// The read-only context a built-in sees: engine options, the converter
/// registry (for e.g. `ToDecimal`), and the caller's original inputs
/// (`spec.md` §4.3, "invocation context").
pub struct FunctionContext<'a> {
    pub options: &'a Options,
    pub converters: &'a ConverterRegistry,
    pub input_fields: &'a HashMap<String, Value>,
}

pub trait Function: Send + Sync {
    fn name(&self) -> &str;
    fn invoke(&self, args: &[Value], ctx: &FunctionContext) -> FunctionResult;
}

/// Case-insensitive name → [`Function`] mapping. `register` overwrites
/// any previous registration under the same folded name.
pub struct FunctionRegistry {
    functions: HashMap<String, Box<dyn Function>>,
}

impl FunctionRegistry {
    pub fn new() -> Self {
        Self {
            functions: HashMap::new(),
        }
    }

    pub fn register(&mut self, function: Box<dyn Function>) {
        self.functions
            .insert(function.name().to_ascii_lowercase(), function);
    }

    /// `resolve(name)` returning `None` is surfaced by the evaluator as
    /// `UnknownFunction` with the call site's position.
    pub fn resolve(&self, name: &str) -> Option<&dyn Function> {
        self.functions
            .get(&name.to_ascii_lowercase())
            .map(|f| f.as_ref())
    }
}

impl Default for FunctionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Echo;
    impl Function for Echo {
        fn name(&self) -> &str {
            "Echo"
        }
        fn invoke(&self, args: &[Value], _ctx: &FunctionContext) -> FunctionResult {
            args.first().cloned().ok_or_else(|| "missing arg".to_string())
        }
    }

    #[test]
    fn resolve_is_case_insensitive() {
        let mut reg = FunctionRegistry::new();
        reg.register(Box::new(Echo));
        assert!(reg.resolve("echo").is_some());
        assert!(reg.resolve("ECHO").is_some());
        assert!(reg.resolve("missing").is_none());
    }

    #[test]
    fn register_overwrites() {
        struct EchoV2;
        impl Function for EchoV2 {
            fn name(&self) -> &str {
                "Echo"
            }
            fn invoke(&self, _args: &[Value], _ctx: &FunctionContext) -> FunctionResult {
                Ok(Value::Null)
            }
        }
        let mut reg = FunctionRegistry::new();
        reg.register(Box::new(Echo));
        reg.register(Box::new(EchoV2));
        assert_eq!(reg.functions.len(), 1);
    }
}

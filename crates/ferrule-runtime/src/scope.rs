//! Execution scope: the two field maps an evaluation runs against
//! (`spec.md` §3, "ExecutionScope").

use std::collections::HashMap;

use ferrule_core::Value;

/// A field-name key as actually stored: either the verbatim spelling, or
/// its ASCII-lowercased form when the engine folds case.
fn fold(name: &str, case_insensitive: bool) -> String {
    if case_insensitive {
        name.to_ascii_lowercase()
    } else {
        name.to_string()
    }
}

/// The two field maps an `Execute` call runs against. `input_fields` is a
/// read-only snapshot of the caller's inputs; `mutable_fields` starts as a
/// copy of it and receives `Set` assignments. Both share the same folding
/// comparator (`spec.md` §3's invariant that keys are the original
/// spellings while lookups are case-folded per option).
pub struct ExecutionScope {
    case_insensitive: bool,
    input_fields: HashMap<String, Value>,
    mutable_fields: HashMap<String, Value>,
}

impl ExecutionScope {
    /// Build a new scope from the caller's inputs. `inputs` keeps its
    /// original spellings; lookups below fold through `case_insensitive`.
    pub fn new(inputs: HashMap<String, Value>, case_insensitive: bool) -> Self {
        let mutable_fields = inputs.clone();
        Self {
            case_insensitive,
            input_fields: inputs,
            mutable_fields,
        }
    }

    fn find<'a>(&'a self, map: &'a HashMap<String, Value>, name: &str) -> Option<&'a Value> {
        if let Some(v) = map.get(name) {
            return Some(v);
        }
        if self.case_insensitive {
            let folded = fold(name, true);
            return map
                .iter()
                .find(|(k, _)| fold(k, true) == folded)
                .map(|(_, v)| v);
        }
        None
    }

    /// Read-only lookup into `inputFields`. Used by `FieldExists`, which
    /// per `spec.md` §3 queries inputs, never mutable state.
    pub fn input_field(&self, name: &str) -> Option<&Value> {
        self.find(&self.input_fields, name)
    }

    /// The full read-only input snapshot, handed to built-ins via
    /// [`crate::function::FunctionContext`] (e.g. `FieldExists`).
    pub fn input_fields(&self) -> &HashMap<String, Value> {
        &self.input_fields
    }

    /// Lookup into `mutableFields`, the target of every `Field` read in
    /// expressions (`spec.md` §4.4).
    pub fn mutable_field(&self, name: &str) -> Option<&Value> {
        self.find(&self.mutable_fields, name)
    }

    /// Apply a `Set` assignment. Always stores under the name's original
    /// spelling; subsequent lookups fold to find it regardless.
    pub fn set(&mut self, name: &str, value: Value) {
        if self.case_insensitive {
            if let Some(existing_key) = self
                .mutable_fields
                .keys()
                .find(|k| fold(k, true) == fold(name, true))
                .cloned()
            {
                self.mutable_fields.insert(existing_key, value);
                return;
            }
        }
        self.mutable_fields.insert(name.to_string(), value);
    }

    pub fn case_insensitive(&self) -> bool {
        self.case_insensitive
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn input_fields_are_never_mutated_by_set() {
        let mut inputs = HashMap::new();
        inputs.insert("x".to_string(), Value::Number(1.into()));
        let mut scope = ExecutionScope::new(inputs, true);
        scope.set("x", Value::Number(2.into()));
        assert!(matches!(scope.input_field("x"), Some(Value::Number(n)) if *n == 1.into()));
        assert!(matches!(scope.mutable_field("x"), Some(Value::Number(n)) if *n == 2.into()));
    }

    #[test]
    fn case_insensitive_lookup_folds() {
        let mut inputs = HashMap::new();
        inputs.insert("Field Name".to_string(), Value::Boolean(true));
        let scope = ExecutionScope::new(inputs, true);
        assert!(scope.mutable_field("field name").is_some());
        assert!(scope.mutable_field("FIELD NAME").is_some());
    }

    #[test]
    fn case_sensitive_lookup_does_not_fold() {
        let mut inputs = HashMap::new();
        inputs.insert("Field".to_string(), Value::Boolean(true));
        let scope = ExecutionScope::new(inputs, false);
        assert!(scope.mutable_field("field").is_none());
        assert!(scope.mutable_field("Field").is_some());
    }
}

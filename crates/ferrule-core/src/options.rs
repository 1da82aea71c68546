//! Engine configuration (`spec.md` §6).
//!
//! `Options` is a plain, `Clone + Debug` configuration record constructed
//! before an engine is built and never mutated while executions are in
//! flight: a struct of fields with a `Default` impl, consumed by value or
//! by shared reference, never behind interior mutability.

use std::sync::Arc;

use chrono::NaiveDateTime;

/// How `==`/`!=` coerce operands when types disagree (`spec.md` §4.4).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EqualityCoercion {
    /// Non-string/non-string mismatches raise `TypeMismatch`. String-involving
    /// comparisons still compare as strings (`spec.md` §4.4's documented
    /// exception, resolved in `DESIGN.md`).
    Strict,
    /// Like `Permissive`, but only numeric-looking mismatches fall back to
    /// stringified comparison.
    NumberFriendly,
    /// Always falls back to stringified comparison on mismatch.
    Permissive,
    /// Strings only ever compare as strings unless the other side is a
    /// strict number, in which case the string is parsed numerically first.
    MixedNumericOnly,
}

/// How binary `+` behaves when at least one operand is a string
/// (`spec.md` §4.4).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StringConcat {
    /// Always concatenate as strings when any side is a string.
    PreferStringIfAnyString,
    /// Try numeric addition first when both sides parse as decimal; fall
    /// back to concatenation otherwise.
    PreferNumericIfParsable,
}

/// Case sensitivity for string equality and for the `StartsWith`/`EndsWith`/
/// `Contains` built-ins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StringComparison {
    CaseSensitive,
    IgnoreCase,
}

/// Midpoint rounding strategy applied at Set-commit (`spec.md` §4.4).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MidpointRounding {
    /// Round half to even (banker's rounding); matches .NET's default and
    /// avoids systematic upward bias across many roundings.
    ToEven,
    /// Round half away from zero.
    AwayFromZero,
}

/// A predicate deciding whether a field name is acceptable, overriding
/// `strict_field_name_validation` when set (`spec.md` §4.4, §6).
pub type FieldNameValidator = Arc<dyn Fn(&str) -> bool + Send + Sync>;

/// Engine-wide configuration. See `spec.md` §6 for the full contract of
/// each field.
#[derive(Clone)]
pub struct Options {
    pub date_time_format: String,
    pub enable_comments: bool,
    pub max_depth: usize,
    pub max_nodes: usize,
    pub max_node_visits: u64,
    pub timeout_milliseconds: u64,
    pub case_insensitive_field_names: bool,
    pub string_comparison: StringComparison,
    pub rounding_digits: u32,
    pub midpoint_rounding: MidpointRounding,
    pub treat_null_string_as_empty: bool,
    pub treat_null_decimal_as_zero: bool,
    pub treat_null_bool_as_false: bool,
    pub null_date_time_default: NaiveDateTime,
    pub now_use_local_time: bool,
    pub strict_field_name_validation: bool,
    pub field_name_validator: Option<FieldNameValidator>,
    pub regex_timeout_milliseconds: u64,
    pub equality_coercion: EqualityCoercion,
    pub string_concat: StringConcat,
    pub enable_compilation_cache: bool,
}

impl std::fmt::Debug for Options {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Options")
            .field("date_time_format", &self.date_time_format)
            .field("enable_comments", &self.enable_comments)
            .field("max_depth", &self.max_depth)
            .field("max_nodes", &self.max_nodes)
            .field("max_node_visits", &self.max_node_visits)
            .field("timeout_milliseconds", &self.timeout_milliseconds)
            .field(
                "case_insensitive_field_names",
                &self.case_insensitive_field_names,
            )
            .field("string_comparison", &self.string_comparison)
            .field("rounding_digits", &self.rounding_digits)
            .field("midpoint_rounding", &self.midpoint_rounding)
            .field("treat_null_string_as_empty", &self.treat_null_string_as_empty)
            .field("treat_null_decimal_as_zero", &self.treat_null_decimal_as_zero)
            .field("treat_null_bool_as_false", &self.treat_null_bool_as_false)
            .field("null_date_time_default", &self.null_date_time_default)
            .field("now_use_local_time", &self.now_use_local_time)
            .field(
                "strict_field_name_validation",
                &self.strict_field_name_validation,
            )
            .field(
                "field_name_validator",
                &self.field_name_validator.as_ref().map(|_| "<predicate>"),
            )
            .field(
                "regex_timeout_milliseconds",
                &self.regex_timeout_milliseconds,
            )
            .field("equality_coercion", &self.equality_coercion)
            .field("string_concat", &self.string_concat)
            .field("enable_compilation_cache", &self.enable_compilation_cache)
            .finish()
    }
}

impl Default for Options {
    fn default() -> Self {
        Self {
            date_time_format: "%Y-%m-%d %H:%M:%S".to_string(),
            enable_comments: true,
            max_depth: 64,
            max_nodes: 2000,
            max_node_visits: 10_000,
            timeout_milliseconds: 0,
            case_insensitive_field_names: true,
            string_comparison: StringComparison::IgnoreCase,
            rounding_digits: 2,
            midpoint_rounding: MidpointRounding::ToEven,
            treat_null_string_as_empty: true,
            treat_null_decimal_as_zero: false,
            treat_null_bool_as_false: false,
            null_date_time_default: NaiveDateTime::UNIX_EPOCH,
            now_use_local_time: false,
            strict_field_name_validation: false,
            field_name_validator: None,
            regex_timeout_milliseconds: 1_000,
            equality_coercion: EqualityCoercion::Permissive,
            string_concat: StringConcat::PreferStringIfAnyString,
            enable_compilation_cache: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_spec_table() {
        let opts = Options::default();
        assert_eq!(opts.max_depth, 64);
        assert_eq!(opts.max_nodes, 2000);
        assert_eq!(opts.max_node_visits, 10_000);
        assert_eq!(opts.timeout_milliseconds, 0);
        assert!(opts.case_insensitive_field_names);
        assert_eq!(opts.date_time_format, "%Y-%m-%d %H:%M:%S");
    }
}

//! String built-ins (`spec.md` §6).

use fancy_regex::RegexBuilder;
use ferrule_core::{StringComparison, Value};
use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::prelude::ToPrimitive;

use super::{as_bool, as_number, as_string, optional_bool_flag};
use crate::function::{Function, FunctionContext, FunctionRegistry, FunctionResult};

/// Flags a nested-quantifier shape (`(a+)+`, `(a*)+`, `(a+)*`, …) that is
/// the textbook cause of catastrophic backtracking. This is a coarse
/// syntactic pre-check, not a guarantee — `fancy_regex`'s own
/// `backtrack_limit` (set from `Options.regexTimeoutMilliseconds`) is the
/// actual enforcement mechanism; this just rejects the worst offenders
/// before spending any time on them (`spec.md` §9, "Regex timeout").
static NESTED_QUANTIFIER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\([^()]*[+*][^()]*\)[+*]").expect("static pattern is valid"));

fn case_insensitive(ctx: &FunctionContext, explicit: Option<bool>) -> bool {
    explicit.unwrap_or(matches!(ctx.options.string_comparison, StringComparison::IgnoreCase))
}

pub fn register(registry: &mut FunctionRegistry) {
    registry.register(Box::new(ToStringFn));
    registry.register(Box::new(StartsWith));
    registry.register(Box::new(EndsWith));
    registry.register(Box::new(Contains));
    registry.register(Box::new(ToUpper));
    registry.register(Box::new(ToLower));
    registry.register(Box::new(Trim));
    registry.register(Box::new(Len));
    registry.register(Box::new(Replace));
    registry.register(Box::new(Substring));
    registry.register(Box::new(RegexMatch));
    registry.register(Box::new(Coalesce));
    registry.register(Box::new(Iif));
    registry.register(Box::new(FieldExists));
}

struct ToStringFn;
impl Function for ToStringFn {
    fn name(&self) -> &str {
        "ToString"
    }
    fn invoke(&self, args: &[Value], ctx: &FunctionContext) -> FunctionResult {
        let v = args.first().ok_or("ToString expects 1 argument")?;
        Ok(Value::String(as_string(v, ctx.converters, ctx.options)?))
    }
}

struct StartsWith;
impl Function for StartsWith {
    fn name(&self) -> &str {
        "StartsWith"
    }
    fn invoke(&self, args: &[Value], ctx: &FunctionContext) -> FunctionResult {
        if args.len() < 2 {
            return Err("StartsWith expects at least 2 arguments".to_string());
        }
        let s = as_string(&args[0], ctx.converters, ctx.options)?;
        let p = as_string(&args[1], ctx.converters, ctx.options)?;
        let ci = case_insensitive(ctx, optional_bool_flag(args, 2)?);
        let result = if ci {
            s.to_ascii_lowercase().starts_with(&p.to_ascii_lowercase())
        } else {
            s.starts_with(&p)
        };
        Ok(Value::Boolean(result))
    }
}

struct EndsWith;
impl Function for EndsWith {
    fn name(&self) -> &str {
        "EndsWith"
    }
    fn invoke(&self, args: &[Value], ctx: &FunctionContext) -> FunctionResult {
        if args.len() < 2 {
            return Err("EndsWith expects at least 2 arguments".to_string());
        }
        let s = as_string(&args[0], ctx.converters, ctx.options)?;
        let p = as_string(&args[1], ctx.converters, ctx.options)?;
        let ci = case_insensitive(ctx, optional_bool_flag(args, 2)?);
        let result = if ci {
            s.to_ascii_lowercase().ends_with(&p.to_ascii_lowercase())
        } else {
            s.ends_with(&p)
        };
        Ok(Value::Boolean(result))
    }
}

struct Contains;
impl Function for Contains {
    fn name(&self) -> &str {
        "Contains"
    }
    fn invoke(&self, args: &[Value], ctx: &FunctionContext) -> FunctionResult {
        if args.len() < 2 {
            return Err("Contains expects at least 2 arguments".to_string());
        }
        let s = as_string(&args[0], ctx.converters, ctx.options)?;
        let p = as_string(&args[1], ctx.converters, ctx.options)?;
        let ci = case_insensitive(ctx, optional_bool_flag(args, 2)?);
        let result = if ci {
            s.to_ascii_lowercase().contains(&p.to_ascii_lowercase())
        } else {
            s.contains(&p)
        };
        Ok(Value::Boolean(result))
    }
}

struct ToUpper;
impl Function for ToUpper {
    fn name(&self) -> &str {
        "ToUpper"
    }
    fn invoke(&self, args: &[Value], ctx: &FunctionContext) -> FunctionResult {
        let s = as_string(args.first().ok_or("ToUpper expects 1 argument")?, ctx.converters, ctx.options)?;
        Ok(Value::String(s.to_uppercase()))
    }
}

struct ToLower;
impl Function for ToLower {
    fn name(&self) -> &str {
        "ToLower"
    }
    fn invoke(&self, args: &[Value], ctx: &FunctionContext) -> FunctionResult {
        let s = as_string(args.first().ok_or("ToLower expects 1 argument")?, ctx.converters, ctx.options)?;
        Ok(Value::String(s.to_lowercase()))
    }
}

struct Trim;
impl Function for Trim {
    fn name(&self) -> &str {
        "Trim"
    }
    fn invoke(&self, args: &[Value], ctx: &FunctionContext) -> FunctionResult {
        let s = as_string(args.first().ok_or("Trim expects 1 argument")?, ctx.converters, ctx.options)?;
        Ok(Value::String(s.trim().to_string()))
    }
}

struct Len;
impl Function for Len {
    fn name(&self) -> &str {
        "Len"
    }
    fn invoke(&self, args: &[Value], ctx: &FunctionContext) -> FunctionResult {
        let s = as_string(args.first().ok_or("Len expects 1 argument")?, ctx.converters, ctx.options)?;
        Ok(Value::Number(rust_decimal::Decimal::from(s.chars().count() as u64)))
    }
}

struct Replace;
impl Function for Replace {
    fn name(&self) -> &str {
        "Replace"
    }
    fn invoke(&self, args: &[Value], ctx: &FunctionContext) -> FunctionResult {
        if args.len() < 3 {
            return Err("Replace expects at least 3 arguments".to_string());
        }
        let s = as_string(&args[0], ctx.converters, ctx.options)?;
        let old = as_string(&args[1], ctx.converters, ctx.options)?;
        let new = as_string(&args[2], ctx.converters, ctx.options)?;
        let ci = case_insensitive(ctx, optional_bool_flag(args, 3)?);
        let result = if ci && !old.is_empty() {
            replace_case_insensitive(&s, &old, &new)
        } else {
            s.replace(&old, &new)
        };
        Ok(Value::String(result))
    }
}

fn replace_case_insensitive(haystack: &str, needle: &str, replacement: &str) -> String {
    let lower_haystack = haystack.to_ascii_lowercase();
    let lower_needle = needle.to_ascii_lowercase();
    let mut out = String::new();
    let mut rest = haystack;
    let mut rest_lower = lower_haystack.as_str();
    while let Some(idx) = rest_lower.find(&lower_needle) {
        out.push_str(&rest[..idx]);
        out.push_str(replacement);
        rest = &rest[idx + needle.len()..];
        rest_lower = &rest_lower[idx + needle.len()..];
    }
    out.push_str(rest);
    out
}

struct Substring;
impl Function for Substring {
    fn name(&self) -> &str {
        "Substring"
    }
    fn invoke(&self, args: &[Value], ctx: &FunctionContext) -> FunctionResult {
        if args.is_empty() {
            return Err("Substring expects at least 2 arguments".to_string());
        }
        let s = as_string(&args[0], ctx.converters, ctx.options)?;
        let start_num = as_number(args.get(1).ok_or("Substring expects a start index")?, ctx.converters, ctx.options)?;
        let chars: Vec<char> = s.chars().collect();
        let start: i64 = start_num
            .to_i64()
            .ok_or_else(|| "Substring start must be an integer".to_string())?;
        if start < 0 || start as usize > chars.len() {
            return Err(format!("Substring start {start} out of range for a {}-character string", chars.len()));
        }
        let start = start as usize;
        let end = match args.get(2) {
            None | Some(Value::Null) => chars.len(),
            Some(v) => {
                let len_num = as_number(v, ctx.converters, ctx.options)?;
                let len: i64 = len_num
                    .to_i64()
                    .ok_or_else(|| "Substring length must be an integer".to_string())?;
                if len < 0 {
                    return Err("Substring length must not be negative".to_string());
                }
                let end = start + len as usize;
                if end > chars.len() {
                    return Err(format!("Substring length {len} exceeds remaining characters"));
                }
                end
            }
        };
        Ok(Value::String(chars[start..end].iter().collect()))
    }
}

struct RegexMatch;
impl Function for RegexMatch {
    fn name(&self) -> &str {
        "RegexMatch"
    }
    fn invoke(&self, args: &[Value], ctx: &FunctionContext) -> FunctionResult {
        if args.len() < 2 {
            return Err("RegexMatch expects at least 2 arguments".to_string());
        }
        let s = as_string(&args[0], ctx.converters, ctx.options)?;
        let pattern = as_string(&args[1], ctx.converters, ctx.options)?;
        if pattern.is_empty() {
            return Err("RegexMatch pattern must not be empty".to_string());
        }
        if ctx.options.regex_timeout_milliseconds > 0 && NESTED_QUANTIFIER.is_match(&pattern) {
            return Err(
                "RegexMatch pattern has nested quantifiers prone to catastrophic backtracking (regex timeout)"
                    .to_string(),
            );
        }
        let flags = match args.get(2) {
            None | Some(Value::Null) => String::new(),
            Some(v) => as_string(v, ctx.converters, ctx.options)?,
        };
        let mut case_insensitive = false;
        let mut multi_line = false;
        let mut extended = false;
        for flag in flags.chars() {
            match flag {
                'i' => case_insensitive = true,
                'm' => multi_line = true,
                ' ' | 'x' => extended = true,
                other => return Err(format!("unsupported RegexMatch flag '{other}'")),
            }
        }

        let mut builder = RegexBuilder::new(&pattern);
        builder.case_insensitive(case_insensitive);
        builder.multi_line(multi_line);
        builder.ignore_whitespace(extended);
        if ctx.options.regex_timeout_milliseconds > 0 {
            // fancy-regex has no wall-clock deadline; a step budget stands
            // in for the timeout, per the design note on regex timeouts
            // (`spec.md` §9): roughly proportional to the configured
            // milliseconds, capping catastrophic backtracking.
            let steps = (ctx.options.regex_timeout_milliseconds as usize).saturating_mul(50_000);
            builder.backtrack_limit(steps);
        }
        let re = builder
            .build()
            .map_err(|e| format!("invalid regex pattern: {e}"))?;
        match re.is_match(&s) {
            Ok(matched) => Ok(Value::Boolean(matched)),
            Err(_) => Err("RegexMatch exceeded its backtracking budget (timeout)".to_string()),
        }
    }
}

struct Coalesce;
impl Function for Coalesce {
    fn name(&self) -> &str {
        "Coalesce"
    }
    fn invoke(&self, args: &[Value], _ctx: &FunctionContext) -> FunctionResult {
        Ok(args
            .iter()
            .find(|v| !v.is_null())
            .cloned()
            .unwrap_or(Value::Null))
    }
}

struct Iif;
impl Function for Iif {
    fn name(&self) -> &str {
        "Iif"
    }
    fn invoke(&self, args: &[Value], _ctx: &FunctionContext) -> FunctionResult {
        if args.len() != 3 {
            return Err("Iif expects exactly 3 arguments".to_string());
        }
        let cond = as_bool(&args[0])?;
        Ok(if cond { args[1].clone() } else { args[2].clone() })
    }
}

struct FieldExists;
impl Function for FieldExists {
    fn name(&self) -> &str {
        "FieldExists"
    }
    fn invoke(&self, args: &[Value], ctx: &FunctionContext) -> FunctionResult {
        if args.is_empty() {
            return Err("FieldExists expects at least 1 argument".to_string());
        }
        for arg in args {
            let name = as_string(arg, ctx.converters, ctx.options)?;
            if !ctx.input_fields.contains_key(&name)
                && !ctx
                    .input_fields
                    .keys()
                    .any(|k| k.eq_ignore_ascii_case(&name))
            {
                return Ok(Value::Boolean(false));
            }
        }
        Ok(Value::Boolean(true))
    }
}

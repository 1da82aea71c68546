//! DateTime built-ins (`spec.md` §6).

use chrono::{Duration, NaiveDateTime};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use ferrule_core::Value;

use super::{as_number, as_string};
use crate::function::{Function, FunctionContext, FunctionRegistry, FunctionResult};

pub fn register(registry: &mut FunctionRegistry) {
    registry.register(Box::new(ToDateTimeFn));
    registry.register(Box::new(FormatDateTimeFn));
    registry.register(Box::new(AddDays));
    registry.register(Box::new(AddHours));
    registry.register(Box::new(AddMinutes));
    registry.register(Box::new(AddSeconds));
    registry.register(Box::new(TimeSpanFn));
}

fn as_datetime(value: &Value, fmt: &str) -> Result<NaiveDateTime, String> {
    match value {
        Value::DateTime(dt) => Ok(*dt),
        Value::String(s) => NaiveDateTime::parse_from_str(s.trim(), fmt)
            .map_err(|_| format!("'{s}' does not match the configured dateTimeFormat")),
        other => Err(format!("cannot convert {} to datetime", other.value_type())),
    }
}

fn as_amount(value: &Value, ctx: &FunctionContext, label: &str) -> Result<i64, String> {
    let n = as_number(value, ctx.converters, ctx.options)?;
    n.to_i64()
        .ok_or_else(|| format!("{label} amount must be an integer"))
}

struct ToDateTimeFn;
impl Function for ToDateTimeFn {
    fn name(&self) -> &str {
        "ToDateTime"
    }
    fn invoke(&self, args: &[Value], ctx: &FunctionContext) -> FunctionResult {
        let v = args.first().ok_or("ToDateTime expects 1 argument")?;
        Ok(Value::DateTime(as_datetime(v, &ctx.options.date_time_format)?))
    }
}

struct FormatDateTimeFn;
impl Function for FormatDateTimeFn {
    fn name(&self) -> &str {
        "FormatDateTime"
    }
    fn invoke(&self, args: &[Value], ctx: &FunctionContext) -> FunctionResult {
        let v = args.first().ok_or("FormatDateTime expects at least 1 argument")?;
        let dt = as_datetime(v, &ctx.options.date_time_format)?;
        let fmt = match args.get(1) {
            None | Some(Value::Null) => ctx.options.date_time_format.clone(),
            Some(other) => as_string(other, ctx.converters, ctx.options)?,
        };
        Ok(Value::String(dt.format(&fmt).to_string()))
    }
}

struct AddDays;
impl Function for AddDays {
    fn name(&self) -> &str {
        "AddDays"
    }
    fn invoke(&self, args: &[Value], ctx: &FunctionContext) -> FunctionResult {
        let dt = as_datetime(args.first().ok_or("AddDays expects 2 arguments")?, &ctx.options.date_time_format)?;
        let days = as_amount(args.get(1).ok_or("AddDays expects 2 arguments")?, ctx, "AddDays")?;
        Ok(Value::DateTime(dt + Duration::days(days)))
    }
}

struct AddHours;
impl Function for AddHours {
    fn name(&self) -> &str {
        "AddHours"
    }
    fn invoke(&self, args: &[Value], ctx: &FunctionContext) -> FunctionResult {
        let dt = as_datetime(args.first().ok_or("AddHours expects 2 arguments")?, &ctx.options.date_time_format)?;
        let hours = as_amount(args.get(1).ok_or("AddHours expects 2 arguments")?, ctx, "AddHours")?;
        Ok(Value::DateTime(dt + Duration::hours(hours)))
    }
}

struct AddMinutes;
impl Function for AddMinutes {
    fn name(&self) -> &str {
        "AddMinutes"
    }
    fn invoke(&self, args: &[Value], ctx: &FunctionContext) -> FunctionResult {
        let dt = as_datetime(args.first().ok_or("AddMinutes expects 2 arguments")?, &ctx.options.date_time_format)?;
        let minutes = as_amount(args.get(1).ok_or("AddMinutes expects 2 arguments")?, ctx, "AddMinutes")?;
        Ok(Value::DateTime(dt + Duration::minutes(minutes)))
    }
}

struct AddSeconds;
impl Function for AddSeconds {
    fn name(&self) -> &str {
        "AddSeconds"
    }
    fn invoke(&self, args: &[Value], ctx: &FunctionContext) -> FunctionResult {
        let dt = as_datetime(args.first().ok_or("AddSeconds expects 2 arguments")?, &ctx.options.date_time_format)?;
        let seconds = as_amount(args.get(1).ok_or("AddSeconds expects 2 arguments")?, ctx, "AddSeconds")?;
        Ok(Value::DateTime(dt + Duration::seconds(seconds)))
    }
}

struct TimeSpanFn;
impl Function for TimeSpanFn {
    fn name(&self) -> &str {
        "TimeSpan"
    }
    fn invoke(&self, args: &[Value], ctx: &FunctionContext) -> FunctionResult {
        if args.len() < 2 {
            return Err("TimeSpan expects at least 2 arguments".to_string());
        }
        let a = as_datetime(&args[0], &ctx.options.date_time_format)?;
        let b = as_datetime(&args[1], &ctx.options.date_time_format)?;
        let unit = match args.get(2) {
            None | Some(Value::Null) => "h".to_string(),
            Some(other) => as_string(other, ctx.converters, ctx.options)?,
        };
        let delta = a - b;
        let millis = Decimal::from(delta.num_milliseconds());
        let value = match unit.as_str() {
            "ms" => millis,
            "s" => millis / Decimal::from(1_000),
            "m" => millis / Decimal::from(60_000),
            "h" => millis / Decimal::from(3_600_000),
            "d" => millis / Decimal::from(86_400_000),
            other => return Err(format!("unknown TimeSpan unit '{other}'")),
        };
        Ok(Value::Number(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::converter::ConverterRegistry;
    use ferrule_core::Options;
    use std::collections::HashMap;

    fn ctx<'a>(options: &'a Options, converters: &'a ConverterRegistry, inputs: &'a HashMap<String, Value>) -> FunctionContext<'a> {
        FunctionContext {
            options,
            converters,
            input_fields: inputs,
        }
    }

    #[test]
    fn add_days_advances_date() {
        let opts = Options::default();
        let converters = ConverterRegistry::new();
        let inputs = HashMap::new();
        let c = ctx(&opts, &converters, &inputs);
        let dt = NaiveDateTime::parse_from_str("2026-01-01 00:00:00", "%Y-%m-%d %H:%M:%S").unwrap();
        let out = AddDays
            .invoke(&[Value::DateTime(dt), Value::Number(Decimal::from(3))], &c)
            .unwrap();
        match out {
            Value::DateTime(result) => assert_eq!(result.format("%Y-%m-%d").to_string(), "2026-01-04"),
            _ => panic!("expected datetime"),
        }
    }

    #[test]
    fn timespan_defaults_to_hours() {
        let opts = Options::default();
        let converters = ConverterRegistry::new();
        let inputs = HashMap::new();
        let c = ctx(&opts, &converters, &inputs);
        let a = NaiveDateTime::parse_from_str("2026-01-01 12:00:00", "%Y-%m-%d %H:%M:%S").unwrap();
        let b = NaiveDateTime::parse_from_str("2026-01-01 00:00:00", "%Y-%m-%d %H:%M:%S").unwrap();
        let out = TimeSpanFn.invoke(&[Value::DateTime(a), Value::DateTime(b)], &c).unwrap();
        assert!(matches!(out, Value::Number(n) if n == Decimal::from(12)));
    }
}

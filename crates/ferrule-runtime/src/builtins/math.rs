//! Math built-ins (`spec.md` §6).

use rust_decimal::{Decimal, RoundingStrategy};

use ferrule_core::{MidpointRounding, Value};

use super::as_number;
use crate::function::{Function, FunctionContext, FunctionRegistry, FunctionResult};

pub fn register(registry: &mut FunctionRegistry) {
    registry.register(Box::new(ToDecimal));
    registry.register(Box::new(Max));
    registry.register(Box::new(Min));
    registry.register(Box::new(Sum));
    registry.register(Box::new(Average));
    registry.register(Box::new(Round));
    registry.register(Box::new(Abs));
}

fn rounding_strategy(mode: MidpointRounding) -> RoundingStrategy {
    match mode {
        MidpointRounding::ToEven => RoundingStrategy::MidpointNearestEven,
        MidpointRounding::AwayFromZero => RoundingStrategy::MidpointAwayFromZero,
    }
}

struct ToDecimal;
impl Function for ToDecimal {
    fn name(&self) -> &str {
        "ToDecimal"
    }
    fn invoke(&self, args: &[Value], ctx: &FunctionContext) -> FunctionResult {
        let v = args.first().ok_or("ToDecimal expects 1 argument")?;
        Ok(Value::Number(as_number(v, ctx.converters, ctx.options)?))
    }
}

struct Max;
impl Function for Max {
    fn name(&self) -> &str {
        "Max"
    }
    fn invoke(&self, args: &[Value], ctx: &FunctionContext) -> FunctionResult {
        if args.is_empty() {
            return Err("Max expects at least 1 argument".to_string());
        }
        let mut best: Option<Decimal> = None;
        for arg in args {
            let n = as_number(arg, ctx.converters, ctx.options)?;
            best = Some(match best {
                Some(b) if b >= n => b,
                _ => n,
            });
        }
        Ok(Value::Number(best.expect("checked non-empty above")))
    }
}

struct Min;
impl Function for Min {
    fn name(&self) -> &str {
        "Min"
    }
    fn invoke(&self, args: &[Value], ctx: &FunctionContext) -> FunctionResult {
        if args.is_empty() {
            return Err("Min expects at least 1 argument".to_string());
        }
        let mut best: Option<Decimal> = None;
        for arg in args {
            let n = as_number(arg, ctx.converters, ctx.options)?;
            best = Some(match best {
                Some(b) if b <= n => b,
                _ => n,
            });
        }
        Ok(Value::Number(best.expect("checked non-empty above")))
    }
}

struct Sum;
impl Function for Sum {
    fn name(&self) -> &str {
        "Sum"
    }
    fn invoke(&self, args: &[Value], ctx: &FunctionContext) -> FunctionResult {
        let mut total = Decimal::ZERO;
        for arg in args {
            let n = as_number(arg, ctx.converters, ctx.options)?;
            total = total.checked_add(n).ok_or("Sum overflowed")?;
        }
        Ok(Value::Number(total))
    }
}

struct Average;
impl Function for Average {
    fn name(&self) -> &str {
        "Average"
    }
    fn invoke(&self, args: &[Value], ctx: &FunctionContext) -> FunctionResult {
        if args.is_empty() {
            return Err("Average expects at least 1 argument".to_string());
        }
        let mut total = Decimal::ZERO;
        for arg in args {
            let n = as_number(arg, ctx.converters, ctx.options)?;
            total = total.checked_add(n).ok_or("Average overflowed")?;
        }
        total
            .checked_div(Decimal::from(args.len() as u64))
            .map(Value::Number)
            .ok_or_else(|| "Average overflowed".to_string())
    }
}

struct Round;
impl Function for Round {
    fn name(&self) -> &str {
        "Round"
    }
    fn invoke(&self, args: &[Value], ctx: &FunctionContext) -> FunctionResult {
        let v = as_number(args.first().ok_or("Round expects at least 1 argument")?, ctx.converters, ctx.options)?;
        let digits = match args.get(1) {
            None | Some(Value::Null) => ctx.options.rounding_digits,
            Some(other) => {
                let n = as_number(other, ctx.converters, ctx.options)?;
                n.to_string()
                    .parse::<u32>()
                    .map_err(|_| "Round digits must be a non-negative integer".to_string())?
            }
        };
        let strategy = rounding_strategy(ctx.options.midpoint_rounding);
        Ok(Value::Number(v.round_dp_with_strategy(digits, strategy)))
    }
}

struct Abs;
impl Function for Abs {
    fn name(&self) -> &str {
        "Abs"
    }
    fn invoke(&self, args: &[Value], ctx: &FunctionContext) -> FunctionResult {
        let v = as_number(args.first().ok_or("Abs expects 1 argument")?, ctx.converters, ctx.options)?;
        Ok(Value::Number(v.abs()))
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
    fn round_uses_option_digits_by_default() {
        let mut opts = Options::default();
        opts.rounding_digits = 1;
        let converters = ConverterRegistry::new();
        let inputs = HashMap::new();
        let c = ctx(&opts, &converters, &inputs);
        let out = Round.invoke(&[Value::Number(Decimal::new(12345, 3))], &c).unwrap();
        assert!(matches!(out, Value::Number(n) if n == Decimal::new(123, 2)));
    }

    #[test]
    fn max_picks_largest() {
        let opts = Options::default();
        let converters = ConverterRegistry::new();
        let inputs = HashMap::new();
        let c = ctx(&opts, &converters, &inputs);
        let out = Max
            .invoke(
                &[
                    Value::Number(Decimal::new(1, 0)),
                    Value::Number(Decimal::new(5, 0)),
                    Value::Number(Decimal::new(3, 0)),
                ],
                &c,
            )
            .unwrap();
        assert!(matches!(out, Value::Number(n) if n == Decimal::new(5, 0)));
    }
}

// ABOUTME: Comparison primitives =, <, >, <=, >=

use crate::env::Environment;
use crate::error::EvalError;
use crate::value::Value;
use std::rc::Rc;

/// Structural equality: numbers compare by value across Int/Float, other
/// variants compare only against their own kind.
pub fn builtin_eq(args: &[Value]) -> Result<Value, EvalError> {
    if args.len() != 2 {
        return Err(EvalError::arity_mismatch("=", 2, args.len()));
    }
    let result = match (&args[0], &args[1]) {
        (Value::Number(a), Value::Number(b)) => a.as_f64() == b.as_f64(),
        (Value::Bool(a), Value::Bool(b)) => a == b,
        (Value::String(a), Value::String(b)) => a == b,
        (Value::Symbol(a), Value::Symbol(b)) => a == b,
        (Value::Nil, Value::Nil) => true,
        _ => false,
    };
    Ok(Value::Bool(result))
}

fn numeric_pair(op: &'static str, args: &[Value]) -> Result<(f64, f64), EvalError> {
    if args.len() != 2 {
        return Err(EvalError::arity_mismatch(op, 2, args.len()));
    }
    let a = match &args[0] {
        Value::Number(n) => n.as_f64(),
        other => return Err(EvalError::type_error(op, "number", other)),
    };
    let b = match &args[1] {
        Value::Number(n) => n.as_f64(),
        other => return Err(EvalError::type_error(op, "number", other)),
    };
    Ok((a, b))
}

pub fn builtin_lt(args: &[Value]) -> Result<Value, EvalError> {
    let (a, b) = numeric_pair("<", args)?;
    Ok(Value::Bool(a < b))
}

pub fn builtin_gt(args: &[Value]) -> Result<Value, EvalError> {
    let (a, b) = numeric_pair(">", args)?;
    Ok(Value::Bool(a > b))
}

pub fn builtin_le(args: &[Value]) -> Result<Value, EvalError> {
    let (a, b) = numeric_pair("<=", args)?;
    Ok(Value::Bool(a <= b))
}

pub fn builtin_ge(args: &[Value]) -> Result<Value, EvalError> {
    let (a, b) = numeric_pair(">=", args)?;
    Ok(Value::Bool(a >= b))
}

pub fn register(env: &Rc<Environment>) {
    env.define("=".to_string(), Value::BuiltIn { name: "=", func: builtin_eq });
    env.define("<".to_string(), Value::BuiltIn { name: "<", func: builtin_lt });
    env.define(">".to_string(), Value::BuiltIn { name: ">", func: builtin_gt });
    env.define("<=".to_string(), Value::BuiltIn { name: "<=", func: builtin_le });
    env.define(">=".to_string(), Value::BuiltIn { name: ">=", func: builtin_ge });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn eq_compares_across_int_and_float() {
        assert!(matches!(builtin_eq(&[Value::int(5), Value::float(5.0)]), Ok(Value::Bool(true))));
    }

    #[test]
    fn eq_across_different_kinds_is_false() {
        assert!(matches!(builtin_eq(&[Value::int(5), Value::String("5".into())]), Ok(Value::Bool(false))));
    }

    #[test]
    fn ordering_operators() {
        assert!(matches!(builtin_lt(&[Value::int(1), Value::int(2)]), Ok(Value::Bool(true))));
        assert!(matches!(builtin_gt(&[Value::int(3), Value::int(3)]), Ok(Value::Bool(false))));
        assert!(matches!(builtin_le(&[Value::int(5), Value::int(5)]), Ok(Value::Bool(true))));
        assert!(matches!(builtin_ge(&[Value::int(4), Value::int(5)]), Ok(Value::Bool(false))));
    }

    #[test]
    fn ordering_requires_numbers() {
        assert!(builtin_lt(&[Value::String("a".into()), Value::int(1)]).is_err());
    }
}

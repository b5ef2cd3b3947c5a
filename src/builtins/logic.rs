// ABOUTME: Logic primitives and, or, not — short-circuiting boolean composition

use crate::env::Environment;
use crate::error::EvalError;
use crate::value::Value;
use std::rc::Rc;

/// `(and a b c)` — short-circuits on the first falsy argument, returning it;
/// otherwise returns the last argument.
pub fn builtin_and(args: &[Value]) -> Result<Value, EvalError> {
    let mut last = Value::Bool(true);
    for arg in args {
        if !arg.is_truthy() {
            return Ok(arg.clone());
        }
        last = arg.clone();
    }
    Ok(last)
}

/// `(or a b c)` — short-circuits on the first truthy argument, returning it;
/// otherwise returns the last argument.
pub fn builtin_or(args: &[Value]) -> Result<Value, EvalError> {
    let mut last = Value::Bool(false);
    for arg in args {
        if arg.is_truthy() {
            return Ok(arg.clone());
        }
        last = arg.clone();
    }
    Ok(last)
}

/// `(not x)` — `true` iff `x` is falsy (`false` or `nil`).
pub fn builtin_not(args: &[Value]) -> Result<Value, EvalError> {
    if args.len() != 1 {
        return Err(EvalError::arity_mismatch("not", 1, args.len()));
    }
    Ok(Value::Bool(!args[0].is_truthy()))
}

pub fn register(env: &Rc<Environment>) {
    env.define("and".to_string(), Value::BuiltIn { name: "and", func: builtin_and });
    env.define("or".to_string(), Value::BuiltIn { name: "or", func: builtin_or });
    env.define("not".to_string(), Value::BuiltIn { name: "not", func: builtin_not });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn and_short_circuits_on_first_falsy() {
        assert!(matches!(builtin_and(&[Value::Bool(true), Value::Bool(false), Value::int(9)]), Ok(Value::Bool(false))));
    }

    #[test]
    fn and_returns_last_when_all_truthy() {
        assert!(matches!(builtin_and(&[Value::int(1), Value::int(2)]), Ok(Value::Number(n)) if n.as_i64() == Some(2)));
    }

    #[test]
    fn or_returns_first_truthy() {
        assert!(matches!(builtin_or(&[Value::Nil, Value::int(2), Value::int(3)]), Ok(Value::Number(n)) if n.as_i64() == Some(2)));
    }

    #[test]
    fn not_negates_truthiness() {
        assert!(matches!(builtin_not(&[Value::Nil]), Ok(Value::Bool(true))));
        assert!(matches!(builtin_not(&[Value::Bool(false)]), Ok(Value::Bool(true))));
        assert!(matches!(builtin_not(&[Value::int(0)]), Ok(Value::Bool(false))));
    }

    #[test]
    fn not_requires_exactly_one_argument() {
        assert!(builtin_not(&[]).is_err());
    }
}

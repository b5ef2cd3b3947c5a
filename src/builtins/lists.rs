// ABOUTME: List operations cons, car, cdr, length, empty?, reverse, nth, append

use crate::env::Environment;
use crate::error::EvalError;
use crate::value::Value;
use std::rc::Rc;

fn as_items(value: &Value) -> Option<&[Value]> {
    match value {
        Value::List(items) => Some(items),
        Value::Nil => Some(&[]),
        _ => None,
    }
}

fn to_list(items: Vec<Value>) -> Value {
    if items.is_empty() {
        Value::Nil
    } else {
        Value::List(items)
    }
}

/// `(cons elem list)` — prepends `elem`, returning a new list.
pub fn builtin_cons(args: &[Value]) -> Result<Value, EvalError> {
    if args.len() != 2 {
        return Err(EvalError::arity_mismatch("cons", 2, args.len()));
    }
    let rest = as_items(&args[1]).ok_or_else(|| EvalError::type_error("cons", "list", &args[1]))?;
    let mut result = vec![args[0].clone()];
    result.extend_from_slice(rest);
    Ok(Value::List(result))
}

/// `(car list)` — first element; errors on an empty list.
pub fn builtin_car(args: &[Value]) -> Result<Value, EvalError> {
    if args.len() != 1 {
        return Err(EvalError::arity_mismatch("car", 1, args.len()));
    }
    let items = as_items(&args[0]).ok_or_else(|| EvalError::type_error("car", "list", &args[0]))?;
    items
        .first()
        .cloned()
        .ok_or_else(|| EvalError::task_failure("empty_list", "car of empty list"))
}

/// `(cdr list)` — all but the first element; `nil` for a single-element list.
pub fn builtin_cdr(args: &[Value]) -> Result<Value, EvalError> {
    if args.len() != 1 {
        return Err(EvalError::arity_mismatch("cdr", 1, args.len()));
    }
    let items = as_items(&args[0]).ok_or_else(|| EvalError::type_error("cdr", "list", &args[0]))?;
    if items.is_empty() {
        return Err(EvalError::task_failure("empty_list", "cdr of empty list"));
    }
    Ok(to_list(items[1..].to_vec()))
}

pub fn builtin_length(args: &[Value]) -> Result<Value, EvalError> {
    if args.len() != 1 {
        return Err(EvalError::arity_mismatch("length", 1, args.len()));
    }
    let items = as_items(&args[0]).ok_or_else(|| EvalError::type_error("length", "list", &args[0]))?;
    Ok(Value::int(items.len() as i64))
}

pub fn builtin_empty_q(args: &[Value]) -> Result<Value, EvalError> {
    if args.len() != 1 {
        return Err(EvalError::arity_mismatch("empty?", 1, args.len()));
    }
    let items = as_items(&args[0]).ok_or_else(|| EvalError::type_error("empty?", "list", &args[0]))?;
    Ok(Value::Bool(items.is_empty()))
}

pub fn builtin_reverse(args: &[Value]) -> Result<Value, EvalError> {
    if args.len() != 1 {
        return Err(EvalError::arity_mismatch("reverse", 1, args.len()));
    }
    let items = as_items(&args[0]).ok_or_else(|| EvalError::type_error("reverse", "list", &args[0]))?;
    let mut reversed = items.to_vec();
    reversed.reverse();
    Ok(to_list(reversed))
}

/// `(nth list index)` — zero-based; out-of-range is an `ArgumentError`.
pub fn builtin_nth(args: &[Value]) -> Result<Value, EvalError> {
    if args.len() != 2 {
        return Err(EvalError::arity_mismatch("nth", 2, args.len()));
    }
    let items = as_items(&args[0]).ok_or_else(|| EvalError::type_error("nth", "list", &args[0]))?;
    let index = match &args[1] {
        Value::Number(n) => n.as_i64().ok_or_else(|| EvalError::type_error("nth", "integer", &args[1]))?,
        other => return Err(EvalError::type_error("nth", "integer", other)),
    };
    if index < 0 || index as usize >= items.len() {
        return Err(EvalError::task_failure("index_out_of_range", format!("nth: index {} out of range", index)));
    }
    Ok(items[index as usize].clone())
}

/// `(append list1 list2 ...)` — concatenates any number of lists.
pub fn builtin_append(args: &[Value]) -> Result<Value, EvalError> {
    let mut out = Vec::new();
    for arg in args {
        let items = as_items(arg).ok_or_else(|| EvalError::type_error("append", "list", arg))?;
        out.extend_from_slice(items);
    }
    Ok(to_list(out))
}

pub fn register(env: &Rc<Environment>) {
    env.define("cons".to_string(), Value::BuiltIn { name: "cons", func: builtin_cons });
    env.define("car".to_string(), Value::BuiltIn { name: "car", func: builtin_car });
    env.define("cdr".to_string(), Value::BuiltIn { name: "cdr", func: builtin_cdr });
    env.define("length".to_string(), Value::BuiltIn { name: "length", func: builtin_length });
    env.define("empty?".to_string(), Value::BuiltIn { name: "empty?", func: builtin_empty_q });
    env.define("reverse".to_string(), Value::BuiltIn { name: "reverse", func: builtin_reverse });
    env.define("nth".to_string(), Value::BuiltIn { name: "nth", func: builtin_nth });
    env.define("append".to_string(), Value::BuiltIn { name: "append", func: builtin_append });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cons_prepends() {
        let result = builtin_cons(&[Value::int(1), Value::List(vec![Value::int(2), Value::int(3)])]).unwrap();
        assert!(matches!(result, Value::List(items) if items.len() == 3));
    }

    #[test]
    fn cons_onto_nil() {
        let result = builtin_cons(&[Value::int(1), Value::Nil]).unwrap();
        assert!(matches!(result, Value::List(items) if items.len() == 1));
    }

    #[test]
    fn car_and_cdr_of_empty_list_error() {
        assert!(builtin_car(&[Value::Nil]).is_err());
        assert!(builtin_cdr(&[Value::Nil]).is_err());
    }

    #[test]
    fn cdr_of_single_element_is_nil() {
        assert!(matches!(builtin_cdr(&[Value::List(vec![Value::int(1)])]), Ok(Value::Nil)));
    }

    #[test]
    fn length_and_empty() {
        assert!(matches!(builtin_length(&[Value::Nil]), Ok(Value::Number(n)) if n.as_i64() == Some(0)));
        assert!(matches!(builtin_empty_q(&[Value::Nil]), Ok(Value::Bool(true))));
    }

    #[test]
    fn reverse_reorders_items() {
        let result = builtin_reverse(&[Value::List(vec![Value::int(1), Value::int(2), Value::int(3)])]).unwrap();
        match result {
            Value::List(items) => {
                assert_eq!(items[0].type_name(), "number");
                assert!(matches!(items[0], Value::Number(n) if n.as_i64() == Some(3)));
            }
            _ => panic!("expected list"),
        }
    }

    #[test]
    fn nth_out_of_range_is_an_error() {
        assert!(builtin_nth(&[Value::List(vec![Value::int(1)]), Value::int(5)]).is_err());
    }

    #[test]
    fn append_concatenates_multiple_lists() {
        let result = builtin_append(&[
            Value::List(vec![Value::int(1)]),
            Value::List(vec![Value::int(2), Value::int(3)]),
        ])
        .unwrap();
        assert!(matches!(result, Value::List(items) if items.len() == 3));
    }
}

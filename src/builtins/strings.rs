// ABOUTME: String manipulation — split/join, extraction, case, predicates, conversions

use crate::env::Environment;
use crate::error::EvalError;
use crate::value::Value;
use std::rc::Rc;

fn arg_string<'a>(args: &'a [Value], index: usize, name: &str) -> Result<&'a str, EvalError> {
    match args.get(index) {
        Some(Value::String(s)) => Ok(s.as_str()),
        Some(other) => Err(EvalError::type_error(name, "string", other)),
        None => Err(EvalError::arity_mismatch(name, index + 1, args.len())),
    }
}

fn arg_index(args: &[Value], index: usize, name: &str) -> Result<usize, EvalError> {
    match args.get(index) {
        Some(Value::Number(n)) => n
            .as_i64()
            .filter(|i| *i >= 0)
            .map(|i| i as usize)
            .ok_or_else(|| EvalError::type_error(name, "non-negative integer", &args[index])),
        Some(other) => Err(EvalError::type_error(name, "integer", other)),
        None => Err(EvalError::arity_mismatch(name, index + 1, args.len())),
    }
}

/// `(string-split s delim)`
pub fn builtin_string_split(args: &[Value]) -> Result<Value, EvalError> {
    if args.len() != 2 {
        return Err(EvalError::arity_mismatch("string-split", 2, args.len()));
    }
    let s = arg_string(args, 0, "string-split")?;
    let delim = arg_string(args, 1, "string-split")?;
    let parts = s.split(delim).map(|p| Value::String(p.to_string())).collect();
    Ok(Value::List(parts))
}

/// `(string-join list delim)`
pub fn builtin_string_join(args: &[Value]) -> Result<Value, EvalError> {
    if args.len() != 2 {
        return Err(EvalError::arity_mismatch("string-join", 2, args.len()));
    }
    let items = match &args[0] {
        Value::List(items) => items.as_slice(),
        Value::Nil => &[],
        other => return Err(EvalError::type_error("string-join", "list", other)),
    };
    let delim = arg_string(args, 1, "string-join")?;
    let mut parts = Vec::with_capacity(items.len());
    for item in items {
        match item {
            Value::String(s) => parts.push(s.clone()),
            other => return Err(EvalError::type_error("string-join", "string", other)),
        }
    }
    Ok(Value::String(parts.join(delim)))
}

/// `(string-append a b c ...)` — concatenates any number of strings.
pub fn builtin_string_append(args: &[Value]) -> Result<Value, EvalError> {
    let mut result = String::new();
    for arg in args {
        match arg {
            Value::String(s) => result.push_str(s),
            other => return Err(EvalError::type_error("string-append", "string", other)),
        }
    }
    Ok(Value::String(result))
}

/// `(substring s start end)` — `start` inclusive, `end` exclusive, by char index.
pub fn builtin_substring(args: &[Value]) -> Result<Value, EvalError> {
    if args.len() != 3 {
        return Err(EvalError::arity_mismatch("substring", 3, args.len()));
    }
    let s = arg_string(args, 0, "substring")?;
    let start = arg_index(args, 1, "substring")?;
    let end = arg_index(args, 2, "substring")?;
    let chars: Vec<char> = s.chars().collect();
    if start > end || end > chars.len() {
        return Err(EvalError::task_failure(
            "invalid_range",
            format!("substring: start={} end={} out of range for length {}", start, end, chars.len()),
        ));
    }
    Ok(Value::String(chars[start..end].iter().collect()))
}

pub fn builtin_string_trim(args: &[Value]) -> Result<Value, EvalError> {
    if args.len() != 1 {
        return Err(EvalError::arity_mismatch("string-trim", 1, args.len()));
    }
    Ok(Value::String(arg_string(args, 0, "string-trim")?.trim().to_string()))
}

pub fn builtin_string_upper(args: &[Value]) -> Result<Value, EvalError> {
    if args.len() != 1 {
        return Err(EvalError::arity_mismatch("string-upper", 1, args.len()));
    }
    Ok(Value::String(arg_string(args, 0, "string-upper")?.to_uppercase()))
}

pub fn builtin_string_lower(args: &[Value]) -> Result<Value, EvalError> {
    if args.len() != 1 {
        return Err(EvalError::arity_mismatch("string-lower", 1, args.len()));
    }
    Ok(Value::String(arg_string(args, 0, "string-lower")?.to_lowercase()))
}

/// `(string-replace s pattern replacement)` — replaces all occurrences.
pub fn builtin_string_replace(args: &[Value]) -> Result<Value, EvalError> {
    if args.len() != 3 {
        return Err(EvalError::arity_mismatch("string-replace", 3, args.len()));
    }
    let s = arg_string(args, 0, "string-replace")?;
    let pattern = arg_string(args, 1, "string-replace")?;
    let replacement = arg_string(args, 2, "string-replace")?;
    Ok(Value::String(s.replace(pattern, replacement)))
}

pub fn builtin_string_contains_p(args: &[Value]) -> Result<Value, EvalError> {
    if args.len() != 2 {
        return Err(EvalError::arity_mismatch("string-contains?", 2, args.len()));
    }
    let s = arg_string(args, 0, "string-contains?")?;
    let needle = arg_string(args, 1, "string-contains?")?;
    Ok(Value::Bool(s.contains(needle)))
}

pub fn builtin_string_starts_with_p(args: &[Value]) -> Result<Value, EvalError> {
    if args.len() != 2 {
        return Err(EvalError::arity_mismatch("string-starts-with?", 2, args.len()));
    }
    let s = arg_string(args, 0, "string-starts-with?")?;
    let prefix = arg_string(args, 1, "string-starts-with?")?;
    Ok(Value::Bool(s.starts_with(prefix)))
}

pub fn builtin_string_ends_with_p(args: &[Value]) -> Result<Value, EvalError> {
    if args.len() != 2 {
        return Err(EvalError::arity_mismatch("string-ends-with?", 2, args.len()));
    }
    let s = arg_string(args, 0, "string-ends-with?")?;
    let suffix = arg_string(args, 1, "string-ends-with?")?;
    Ok(Value::Bool(s.ends_with(suffix)))
}

pub fn builtin_string_empty_p(args: &[Value]) -> Result<Value, EvalError> {
    if args.len() != 1 {
        return Err(EvalError::arity_mismatch("string-empty?", 1, args.len()));
    }
    Ok(Value::Bool(arg_string(args, 0, "string-empty?")?.is_empty()))
}

pub fn builtin_string_length(args: &[Value]) -> Result<Value, EvalError> {
    if args.len() != 1 {
        return Err(EvalError::arity_mismatch("string-length", 1, args.len()));
    }
    Ok(Value::int(arg_string(args, 0, "string-length")?.chars().count() as i64))
}

/// `(string->number s)` — parses an int first, then a float; errors if neither.
pub fn builtin_string_to_number(args: &[Value]) -> Result<Value, EvalError> {
    if args.len() != 1 {
        return Err(EvalError::arity_mismatch("string->number", 1, args.len()));
    }
    let s = arg_string(args, 0, "string->number")?.trim();
    if let Ok(i) = s.parse::<i64>() {
        return Ok(Value::int(i));
    }
    s.parse::<f64>()
        .map(Value::float)
        .map_err(|_| EvalError::task_failure("not_a_number", format!("string->number: cannot parse '{}'", s)))
}

pub fn builtin_number_to_string(args: &[Value]) -> Result<Value, EvalError> {
    if args.len() != 1 {
        return Err(EvalError::arity_mismatch("number->string", 1, args.len()));
    }
    match &args[0] {
        Value::Number(n) => Ok(Value::String(n.to_string())),
        other => Err(EvalError::type_error("number->string", "number", other)),
    }
}

pub fn builtin_string_to_list(args: &[Value]) -> Result<Value, EvalError> {
    if args.len() != 1 {
        return Err(EvalError::arity_mismatch("string->list", 1, args.len()));
    }
    let s = arg_string(args, 0, "string->list")?;
    let chars = s.chars().map(|c| Value::String(c.to_string())).collect::<Vec<_>>();
    if chars.is_empty() {
        Ok(Value::Nil)
    } else {
        Ok(Value::List(chars))
    }
}

pub fn builtin_list_to_string(args: &[Value]) -> Result<Value, EvalError> {
    if args.len() != 1 {
        return Err(EvalError::arity_mismatch("list->string", 1, args.len()));
    }
    let items = match &args[0] {
        Value::List(items) => items.as_slice(),
        Value::Nil => &[],
        other => return Err(EvalError::type_error("list->string", "list", other)),
    };
    let mut out = String::new();
    for item in items {
        match item {
            Value::String(s) => out.push_str(s),
            other => return Err(EvalError::type_error("list->string", "string", other)),
        }
    }
    Ok(Value::String(out))
}

pub fn register(env: &Rc<Environment>) {
    env.define("string-split".to_string(), Value::BuiltIn { name: "string-split", func: builtin_string_split });
    env.define("string-join".to_string(), Value::BuiltIn { name: "string-join", func: builtin_string_join });
    env.define("string-append".to_string(), Value::BuiltIn { name: "string-append", func: builtin_string_append });
    env.define("substring".to_string(), Value::BuiltIn { name: "substring", func: builtin_substring });
    env.define("string-trim".to_string(), Value::BuiltIn { name: "string-trim", func: builtin_string_trim });
    env.define("string-upper".to_string(), Value::BuiltIn { name: "string-upper", func: builtin_string_upper });
    env.define("string-lower".to_string(), Value::BuiltIn { name: "string-lower", func: builtin_string_lower });
    env.define("string-replace".to_string(), Value::BuiltIn { name: "string-replace", func: builtin_string_replace });
    env.define(
        "string-contains?".to_string(),
        Value::BuiltIn { name: "string-contains?", func: builtin_string_contains_p },
    );
    env.define(
        "string-starts-with?".to_string(),
        Value::BuiltIn { name: "string-starts-with?", func: builtin_string_starts_with_p },
    );
    env.define(
        "string-ends-with?".to_string(),
        Value::BuiltIn { name: "string-ends-with?", func: builtin_string_ends_with_p },
    );
    env.define(
        "string-empty?".to_string(),
        Value::BuiltIn { name: "string-empty?", func: builtin_string_empty_p },
    );
    env.define("string-length".to_string(), Value::BuiltIn { name: "string-length", func: builtin_string_length });
    env.define(
        "string->number".to_string(),
        Value::BuiltIn { name: "string->number", func: builtin_string_to_number },
    );
    env.define(
        "number->string".to_string(),
        Value::BuiltIn { name: "number->string", func: builtin_number_to_string },
    );
    env.define("string->list".to_string(), Value::BuiltIn { name: "string->list", func: builtin_string_to_list });
    env.define("list->string".to_string(), Value::BuiltIn { name: "list->string", func: builtin_list_to_string });
}

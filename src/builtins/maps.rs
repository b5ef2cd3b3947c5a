// ABOUTME: Map operations — keys are strings (no keyword-literal syntax in this parser)

use crate::env::Environment;
use crate::error::EvalError;
use crate::value::Value;
use std::collections::HashMap;
use std::rc::Rc;

fn arg_map<'a>(args: &'a [Value], index: usize, name: &str) -> Result<&'a HashMap<String, Value>, EvalError> {
    match args.get(index) {
        Some(Value::Map(m)) => Ok(m),
        Some(other) => Err(EvalError::type_error(name, "map", other)),
        None => Err(EvalError::arity_mismatch(name, index + 1, args.len())),
    }
}

/// Map keys are `Value::String` or `Value::Symbol`, stringified; the parser
/// has no keyword-literal token, so maps are string-keyed.
fn arg_key(args: &[Value], index: usize, name: &str) -> Result<String, EvalError> {
    match args.get(index) {
        Some(Value::String(s)) => Ok(s.clone()),
        Some(Value::Symbol(s)) => Ok(s.clone()),
        Some(other) => Err(EvalError::type_error(name, "string or symbol", other)),
        None => Err(EvalError::arity_mismatch(name, index + 1, args.len())),
    }
}

/// `(map-new)` — an empty map.
pub fn builtin_map_new(args: &[Value]) -> Result<Value, EvalError> {
    if !args.is_empty() {
        return Err(EvalError::arity_mismatch("map-new", 0, args.len()));
    }
    Ok(Value::Map(HashMap::new()))
}

/// `(map-get m key)` or `(map-get m key default)` — `nil` if absent and no default given.
pub fn builtin_map_get(args: &[Value]) -> Result<Value, EvalError> {
    if args.len() < 2 || args.len() > 3 {
        return Err(EvalError::arity_mismatch("map-get", 2, args.len()));
    }
    let map = arg_map(args, 0, "map-get")?;
    let key = arg_key(args, 1, "map-get")?;
    let default = args.get(2).cloned().unwrap_or(Value::Nil);
    Ok(map.get(&key).cloned().unwrap_or(default))
}

/// `(map-set m key value)` — returns a new map (immutable).
pub fn builtin_map_set(args: &[Value]) -> Result<Value, EvalError> {
    if args.len() != 3 {
        return Err(EvalError::arity_mismatch("map-set", 3, args.len()));
    }
    let mut map = arg_map(args, 0, "map-set")?.clone();
    let key = arg_key(args, 1, "map-set")?;
    map.insert(key, args[2].clone());
    Ok(Value::Map(map))
}

pub fn builtin_map_has_p(args: &[Value]) -> Result<Value, EvalError> {
    if args.len() != 2 {
        return Err(EvalError::arity_mismatch("map-has?", 2, args.len()));
    }
    let map = arg_map(args, 0, "map-has?")?;
    let key = arg_key(args, 1, "map-has?")?;
    Ok(Value::Bool(map.contains_key(&key)))
}

/// `(map-keys m)` — sorted for deterministic output.
pub fn builtin_map_keys(args: &[Value]) -> Result<Value, EvalError> {
    if args.len() != 1 {
        return Err(EvalError::arity_mismatch("map-keys", 1, args.len()));
    }
    let map = arg_map(args, 0, "map-keys")?;
    let mut keys: Vec<String> = map.keys().cloned().collect();
    keys.sort();
    let values = keys.into_iter().map(Value::String).collect::<Vec<_>>();
    if values.is_empty() {
        Ok(Value::Nil)
    } else {
        Ok(Value::List(values))
    }
}

/// `(map-values m)` — ordered by sorted key, for determinism.
pub fn builtin_map_values(args: &[Value]) -> Result<Value, EvalError> {
    if args.len() != 1 {
        return Err(EvalError::arity_mismatch("map-values", 1, args.len()));
    }
    let map = arg_map(args, 0, "map-values")?;
    let mut entries: Vec<_> = map.iter().collect();
    entries.sort_by_key(|(k, _)| (*k).clone());
    let values: Vec<Value> = entries.into_iter().map(|(_, v)| v.clone()).collect();
    if values.is_empty() {
        Ok(Value::Nil)
    } else {
        Ok(Value::List(values))
    }
}

/// `(map-entries m)` — list of `(key value)` pairs, ordered by sorted key.
pub fn builtin_map_entries(args: &[Value]) -> Result<Value, EvalError> {
    if args.len() != 1 {
        return Err(EvalError::arity_mismatch("map-entries", 1, args.len()));
    }
    let map = arg_map(args, 0, "map-entries")?;
    let mut entries: Vec<_> = map.iter().collect();
    entries.sort_by_key(|(k, _)| (*k).clone());
    let pairs: Vec<Value> = entries
        .into_iter()
        .map(|(k, v)| Value::List(vec![Value::String(k.clone()), v.clone()]))
        .collect();
    if pairs.is_empty() {
        Ok(Value::Nil)
    } else {
        Ok(Value::List(pairs))
    }
}

/// `(map-merge m1 m2)` — `m2`'s entries take precedence on key collision.
pub fn builtin_map_merge(args: &[Value]) -> Result<Value, EvalError> {
    if args.len() != 2 {
        return Err(EvalError::arity_mismatch("map-merge", 2, args.len()));
    }
    let mut merged = arg_map(args, 0, "map-merge")?.clone();
    let other = arg_map(args, 1, "map-merge")?;
    for (k, v) in other {
        merged.insert(k.clone(), v.clone());
    }
    Ok(Value::Map(merged))
}

/// `(map-remove m key)` — returns a new map with the key absent.
pub fn builtin_map_remove(args: &[Value]) -> Result<Value, EvalError> {
    if args.len() != 2 {
        return Err(EvalError::arity_mismatch("map-remove", 2, args.len()));
    }
    let mut map = arg_map(args, 0, "map-remove")?.clone();
    let key = arg_key(args, 1, "map-remove")?;
    map.remove(&key);
    Ok(Value::Map(map))
}

pub fn builtin_map_empty_p(args: &[Value]) -> Result<Value, EvalError> {
    if args.len() != 1 {
        return Err(EvalError::arity_mismatch("map-empty?", 1, args.len()));
    }
    Ok(Value::Bool(arg_map(args, 0, "map-empty?")?.is_empty()))
}

pub fn builtin_map_size(args: &[Value]) -> Result<Value, EvalError> {
    if args.len() != 1 {
        return Err(EvalError::arity_mismatch("map-size", 1, args.len()));
    }
    Ok(Value::int(arg_map(args, 0, "map-size")?.len() as i64))
}

pub fn register(env: &Rc<Environment>) {
    env.define("map-new".to_string(), Value::BuiltIn { name: "map-new", func: builtin_map_new });
    env.define("map-get".to_string(), Value::BuiltIn { name: "map-get", func: builtin_map_get });
    env.define("map-set".to_string(), Value::BuiltIn { name: "map-set", func: builtin_map_set });
    env.define("map-has?".to_string(), Value::BuiltIn { name: "map-has?", func: builtin_map_has_p });
    env.define("map-keys".to_string(), Value::BuiltIn { name: "map-keys", func: builtin_map_keys });
    env.define("map-values".to_string(), Value::BuiltIn { name: "map-values", func: builtin_map_values });
    env.define("map-entries".to_string(), Value::BuiltIn { name: "map-entries", func: builtin_map_entries });
    env.define("map-merge".to_string(), Value::BuiltIn { name: "map-merge", func: builtin_map_merge });
    env.define("map-remove".to_string(), Value::BuiltIn { name: "map-remove", func: builtin_map_remove });
    env.define("map-empty?".to_string(), Value::BuiltIn { name: "map-empty?", func: builtin_map_empty_p });
    env.define("map-size".to_string(), Value::BuiltIn { name: "map-size", func: builtin_map_size });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map_of(pairs: &[(&str, Value)]) -> Value {
        let mut m = HashMap::new();
        for (k, v) in pairs {
            m.insert(k.to_string(), v.clone());
        }
        Value::Map(m)
    }

    #[test]
    fn get_set_and_default() {
        let m = map_of(&[("x", Value::int(1))]);
        assert!(matches!(
            builtin_map_get(&[m.clone(), Value::String("x".into())]),
            Ok(Value::Number(n)) if n.as_i64() == Some(1)
        ));
        assert!(matches!(builtin_map_get(&[m.clone(), Value::String("y".into())]), Ok(Value::Nil)));
        assert!(matches!(
            builtin_map_get(&[m, Value::String("y".into()), Value::int(9)]),
            Ok(Value::Number(n)) if n.as_i64() == Some(9)
        ));
    }

    #[test]
    fn set_is_immutable() {
        let m = map_of(&[("x", Value::int(1))]);
        let updated = builtin_map_set(&[m.clone(), Value::String("y".into()), Value::int(2)]).unwrap();
        assert!(matches!(&m, Value::Map(orig) if orig.len() == 1));
        assert!(matches!(updated, Value::Map(new_map) if new_map.len() == 2));
    }

    #[test]
    fn has_and_remove() {
        let m = map_of(&[("x", Value::int(1))]);
        assert!(matches!(builtin_map_has_p(&[m.clone(), Value::String("x".into())]), Ok(Value::Bool(true))));
        let removed = builtin_map_remove(&[m, Value::String("x".into())]).unwrap();
        assert!(matches!(removed, Value::Map(new_map) if new_map.is_empty()));
    }

    #[test]
    fn keys_values_entries_are_sorted() {
        let m = map_of(&[("b", Value::int(2)), ("a", Value::int(1))]);
        let keys = builtin_map_keys(&[m.clone()]).unwrap();
        assert!(matches!(keys, Value::List(items) if matches!(&items[0], Value::String(s) if s == "a")));
        let values = builtin_map_values(&[m.clone()]).unwrap();
        assert!(matches!(values, Value::List(items) if matches!(items[0], Value::Number(n) if n.as_i64() == Some(1))));
        let entries = builtin_map_entries(&[m]).unwrap();
        assert!(matches!(entries, Value::List(items) if items.len() == 2));
    }

    #[test]
    fn merge_prefers_second_map() {
        let m1 = map_of(&[("x", Value::int(1))]);
        let m2 = map_of(&[("x", Value::int(2))]);
        let merged = builtin_map_merge(&[m1, m2]).unwrap();
        assert!(matches!(merged, Value::Map(m) if m.get("x").unwrap().type_name() == "number"));
    }

    #[test]
    fn empty_and_size() {
        let empty = builtin_map_new(&[]).unwrap();
        assert!(matches!(builtin_map_empty_p(&[empty.clone()]), Ok(Value::Bool(true))));
        assert!(matches!(builtin_map_size(&[empty]), Ok(Value::Number(n)) if n.as_i64() == Some(0)));
    }
}

// ABOUTME: Console output — print, println (unquoted rendering, space-separated, nil result)

use crate::env::Environment;
use crate::error::EvalError;
use crate::value::Value;
use std::rc::Rc;

fn render(arg: &Value) -> String {
    match arg {
        Value::String(s) => s.clone(),
        other => format!("{}", other),
    }
}

/// `(print a b c)` — writes space-separated, unquoted, no trailing newline.
pub fn builtin_print(args: &[Value]) -> Result<Value, EvalError> {
    for (i, arg) in args.iter().enumerate() {
        if i > 0 {
            print!(" ");
        }
        print!("{}", render(arg));
    }
    Ok(Value::Nil)
}

/// `(println a b c)` — like `print`, with a trailing newline.
pub fn builtin_println(args: &[Value]) -> Result<Value, EvalError> {
    for (i, arg) in args.iter().enumerate() {
        if i > 0 {
            print!(" ");
        }
        print!("{}", render(arg));
    }
    println!();
    Ok(Value::Nil)
}

pub fn register(env: &Rc<Environment>) {
    env.define("print".to_string(), Value::BuiltIn { name: "print", func: builtin_print });
    env.define("println".to_string(), Value::BuiltIn { name: "println", func: builtin_println });
}

// ABOUTME: Error/result helpers — error, error?, ok?, error-msg, result-content, make-result

use crate::env::Environment;
use crate::error::{ErrorKind, ErrorObject, EvalError};
use crate::result::{ResultRecord, Status};
use crate::value::Value;
use std::rc::Rc;

fn arg_string(args: &[Value], index: usize, name: &str) -> Result<String, EvalError> {
    match args.get(index) {
        Some(Value::String(s)) => Ok(s.clone()),
        Some(other) => Err(EvalError::type_error(name, "string", other)),
        None => Err(EvalError::arity_mismatch(name, index + 1, args.len())),
    }
}

/// `(error "message")` — builds a FAILED result carrying the message. There
/// is no bare error value in the data model; a failure is always a `Result`
/// with `status: Failed` (§3).
pub fn builtin_error(args: &[Value]) -> Result<Value, EvalError> {
    let message = arg_string(args, 0, "error")?;
    let record = ResultRecord::failed(ErrorObject::new(ErrorKind::TaskFailure, "user_error", message));
    Ok(Value::Result(Box::new(record)))
}

/// `(error? x)` — true iff `x` is a `Result` whose status is `Failed`.
pub fn builtin_error_p(args: &[Value]) -> Result<Value, EvalError> {
    if args.len() != 1 {
        return Err(EvalError::arity_mismatch("error?", 1, args.len()));
    }
    Ok(Value::Bool(matches!(&args[0], Value::Result(r) if !r.is_ok())))
}

/// `(ok? x)` — true iff `x` is a `Result` whose status is not `Failed`.
pub fn builtin_ok_p(args: &[Value]) -> Result<Value, EvalError> {
    if args.len() != 1 {
        return Err(EvalError::arity_mismatch("ok?", 1, args.len()));
    }
    Ok(Value::Bool(matches!(&args[0], Value::Result(r) if r.is_ok())))
}

/// `(error-msg result)` — the failure message, or `nil` if not failed.
pub fn builtin_error_msg(args: &[Value]) -> Result<Value, EvalError> {
    if args.len() != 1 {
        return Err(EvalError::arity_mismatch("error-msg", 1, args.len()));
    }
    match &args[0] {
        Value::Result(r) => Ok(r
            .error
            .as_ref()
            .map(|e| Value::String(e.message.clone()))
            .unwrap_or(Value::Nil)),
        other => Err(EvalError::type_error("error-msg", "result", other)),
    }
}

/// `(result-content result)` — the content carried by a `Result`.
pub fn builtin_result_content(args: &[Value]) -> Result<Value, EvalError> {
    if args.len() != 1 {
        return Err(EvalError::arity_mismatch("result-content", 1, args.len()));
    }
    match &args[0] {
        Value::Result(r) => Ok(r.content.clone()),
        other => Err(EvalError::type_error("result-content", "result", other)),
    }
}

/// `(make-result content)` wraps a value as a `Complete` `Result`.
/// `(make-result 'COMPLETE content)` (the shape an `iterative-loop`/
/// `director-evaluator-loop` executor closure uses, §8 scenario 5) also
/// accepts a leading status symbol — `'COMPLETE`, `'FAILED`, `'CONTINUATION`,
/// or `'PARTIAL` — naming the `ResultRecord` status to build.
pub fn builtin_make_result(args: &[Value]) -> Result<Value, EvalError> {
    let (status, content) = match args.len() {
        1 => (Status::Complete, args[0].clone()),
        2 => (parse_status(&args[0])?, args[1].clone()),
        n => return Err(EvalError::arity_mismatch("make-result", 1, n)),
    };
    let record = match status {
        Status::Complete => ResultRecord::complete(content),
        Status::Continuation => ResultRecord::continuation(content),
        Status::Partial => ResultRecord::partial(content),
        Status::Failed => {
            let message = content.as_text();
            ResultRecord::failed(ErrorObject::new(ErrorKind::TaskFailure, "user_error", message))
        }
    };
    Ok(Value::Result(Box::new(record)))
}

fn parse_status(value: &Value) -> Result<Status, EvalError> {
    let name = match value {
        Value::Symbol(s) => s.as_str(),
        Value::String(s) => s.as_str(),
        other => return Err(EvalError::type_error("make-result", "status symbol", other)),
    };
    match name {
        "COMPLETE" => Ok(Status::Complete),
        "FAILED" => Ok(Status::Failed),
        "CONTINUATION" => Ok(Status::Continuation),
        "PARTIAL" => Ok(Status::Partial),
        other => Err(EvalError::argument_type_mismatch(
            "status",
            "COMPLETE|FAILED|CONTINUATION|PARTIAL",
            other,
        )),
    }
}

pub fn register(env: &Rc<Environment>) {
    env.define("error".to_string(), Value::BuiltIn { name: "error", func: builtin_error });
    env.define("error?".to_string(), Value::BuiltIn { name: "error?", func: builtin_error_p });
    env.define("ok?".to_string(), Value::BuiltIn { name: "ok?", func: builtin_ok_p });
    env.define("error-msg".to_string(), Value::BuiltIn { name: "error-msg", func: builtin_error_msg });
    env.define(
        "result-content".to_string(),
        Value::BuiltIn { name: "result-content", func: builtin_result_content },
    );
    env.define("make-result".to_string(), Value::BuiltIn { name: "make-result", func: builtin_make_result });
}

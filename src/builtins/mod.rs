//! Built-in primitive functions bound into the global environment at startup.
//!
//! Organized by category, mirroring the teacher's `builtins/` layout:
//! arithmetic, comparison, logic, type predicates, list operations, map
//! operations, string operations, console output, and error-result helpers.
//! Every builtin is a plain `fn(&[Value]) -> Result<Value, EvalError>` bound
//! via `Value::BuiltIn` — the DSL has no macro system of its own (§9 Open
//! Question), so there is no analogue of the teacher's `#[builtin]`
//! attribute here; that pattern is reserved for native *tools* (§A.1).

use crate::env::Environment;
use std::rc::Rc;

pub mod arithmetic;
pub mod comparison;
pub mod console;
pub mod errors;
pub mod lists;
pub mod logic;
pub mod maps;
pub mod strings;
pub mod types;

/// Registers every builtin category into `env`'s global frame.
pub fn register_builtins(env: &Rc<Environment>) {
    arithmetic::register(env);
    comparison::register(env);
    logic::register(env);
    types::register(env);
    lists::register(env);
    maps::register(env);
    strings::register(env);
    console::register(env);
    errors::register(env);
}

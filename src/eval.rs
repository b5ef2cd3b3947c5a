// ABOUTME: Core evaluator — special forms, invocation dispatch, closure application (§4.4)

use crate::capability::{FileReader, LlmCapability, MemoryFacade, ToolSurface};
use crate::env::Environment;
use crate::error::EvalError;
use crate::registry::TaskRegistry;
use crate::result::ResultRecord;
use crate::task::{AtomicTaskTemplate, OutputFormat, OutputType, Param, ParamType};
use crate::value::Value;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;
use std::time::Instant;

/// Head symbols that activate special-form evaluation rather than ordinary
/// invocation dispatch (§4.4).
const SPECIAL_FORMS: &[&str] = &[
    "quote",
    "let",
    "if",
    "lambda",
    "define",
    "defatom",
    "list",
    "progn",
    "director-evaluator-loop",
    "iterative-loop",
];

pub fn is_special_form(symbol: &str) -> bool {
    SPECIAL_FORMS.contains(&symbol)
}

/// Bundles the registries and capability implementations the evaluator
/// consumes. Owns them outright (rather than borrowing) so a `Dispatcher`
/// can hand the interpreter to callers without juggling lifetimes.
pub struct Interpreter {
    pub registry: RefCell<TaskRegistry>,
    pub tools: Box<dyn ToolSurface>,
    pub llm: Box<dyn LlmCapability>,
    pub memory: Box<dyn MemoryFacade>,
    pub files: Box<dyn FileReader>,
    deadline: Cell<Option<Instant>>,
}

impl Interpreter {
    pub fn new(
        tools: Box<dyn ToolSurface>,
        llm: Box<dyn LlmCapability>,
        memory: Box<dyn MemoryFacade>,
        files: Box<dyn FileReader>,
    ) -> Self {
        Interpreter {
            registry: RefCell::new(TaskRegistry::new()),
            tools,
            llm,
            memory,
            files,
            deadline: Cell::new(None),
        }
    }

    pub fn set_deadline(&self, deadline: Option<Instant>) {
        self.deadline.set(deadline);
    }

    /// Checked at the top of each loop iteration and before each capability
    /// call (§5: evaluation honors a per-call deadline).
    pub fn check_deadline(&self) -> Result<(), EvalError> {
        match self.deadline.get() {
            Some(d) if Instant::now() >= d => Err(EvalError::timeout("evaluation deadline exceeded")),
            _ => Ok(()),
        }
    }

    /// Trampoline evaluator: tail positions (`if`, `progn`, `let` bodies,
    /// closure application) reassign `expr`/`env` and loop instead of
    /// recursing, so deep accumulator-style recursion runs in bounded stack.
    pub fn eval(&self, expr: &Value, env: &Rc<Environment>) -> Result<Value, EvalError> {
        let mut expr = expr.clone();
        let mut env = Rc::clone(env);

        loop {
            match expr {
                Value::Number(_)
                | Value::Bool(_)
                | Value::String(_)
                | Value::Nil
                | Value::Map(_)
                | Value::Closure { .. }
                | Value::BuiltIn { .. }
                | Value::Result(_) => return Ok(expr),

                Value::Symbol(name) => {
                    return env.lookup(&name, &name);
                }

                Value::Quoted(inner) => return Ok(*inner),

                Value::List(items) => {
                    if items.is_empty() {
                        return Ok(Value::Nil);
                    }
                    let head = items[0].clone();

                    if let Value::Symbol(sym) = &head {
                        if is_special_form(sym) {
                            match sym.as_str() {
                                "quote" => {
                                    require_arity("quote", &items[1..], 1)?;
                                    return Ok(items[1].clone());
                                }
                                "if" => {
                                    require_arity_range("if", &items[1..], 2, 3)?;
                                    let cond = self.eval(&items[1], &env)?;
                                    if cond.is_truthy() {
                                        expr = items[2].clone();
                                    } else if items.len() == 4 {
                                        expr = items[3].clone();
                                    } else {
                                        return Ok(Value::Nil);
                                    }
                                    continue;
                                }
                                "let" => {
                                    let (new_env, body) = self.eval_let_bindings(&items, &env)?;
                                    if body.is_empty() {
                                        return Ok(Value::Nil);
                                    }
                                    for stmt in &body[..body.len() - 1] {
                                        self.eval(stmt, &new_env)?;
                                    }
                                    expr = body[body.len() - 1].clone();
                                    env = new_env;
                                    continue;
                                }
                                "lambda" => {
                                    return self.eval_lambda(&items, &env);
                                }
                                "define" => {
                                    return self.eval_define(&items, &env);
                                }
                                "defatom" => {
                                    return self.eval_defatom(&items, &env);
                                }
                                "list" => {
                                    let mut out = Vec::with_capacity(items.len() - 1);
                                    for arg in &items[1..] {
                                        out.push(self.eval(arg, &env)?);
                                    }
                                    return Ok(Value::List(out));
                                }
                                "progn" => {
                                    if items.len() == 1 {
                                        return Ok(Value::Nil);
                                    }
                                    for stmt in &items[1..items.len() - 1] {
                                        self.eval(stmt, &env)?;
                                    }
                                    expr = items[items.len() - 1].clone();
                                    continue;
                                }
                                "iterative-loop" => {
                                    return self.eval_iterative_loop(&items[1..], &env);
                                }
                                "director-evaluator-loop" => {
                                    return self.eval_director_evaluator_loop(&items[1..], &env);
                                }
                                _ => unreachable!("is_special_form and this match must stay in sync"),
                            }
                        }

                        // Ordinary invocation: resolve the head by its literal
                        // symbol text (§4.4.2).
                        match env.get(sym) {
                            Some(Value::Closure { params, body, env: captured }) => {
                                let args = self.eval_positional(&items[1..], &env)?;
                                let new_env = bind_closure_frame(sym, &params, args, &captured)?;
                                if body.is_empty() {
                                    return Ok(Value::Nil);
                                }
                                for stmt in &body[..body.len() - 1] {
                                    self.eval(stmt, &new_env)?;
                                }
                                expr = body[body.len() - 1].clone();
                                env = new_env;
                                continue;
                            }
                            Some(Value::BuiltIn { func, .. }) => {
                                let args = self.eval_positional(&items[1..], &env)?;
                                return func(&args);
                            }
                            _ => {
                                return self.dispatch_invocation(sym, &items[1..], &items, &env);
                            }
                        }
                    }

                    // Non-symbol head must evaluate to a closure (§4.3/§9:
                    // raw list literals are rejected, never coerced).
                    let head_val = self.eval(&head, &env)?;
                    match head_val {
                        Value::Closure { params, body, env: captured } => {
                            let args = self.eval_positional(&items[1..], &env)?;
                            let new_env = bind_closure_frame("closure", &params, args, &captured)?;
                            if body.is_empty() {
                                return Ok(Value::Nil);
                            }
                            for stmt in &body[..body.len() - 1] {
                                self.eval(stmt, &new_env)?;
                            }
                            expr = body[body.len() - 1].clone();
                            env = new_env;
                            continue;
                        }
                        other => return Err(EvalError::not_callable(&other)),
                    }
                }
            }
        }
    }

    /// Non-tail-call application, used by the loop forms to invoke phase
    /// closures. Always a Closure; raw lists are rejected (§9).
    pub fn apply(&self, callee: &Value, args: Vec<Value>) -> Result<Value, EvalError> {
        match callee {
            Value::Closure { params, body, env } => {
                let new_env = bind_closure_frame("phase-function", params, args, env)?;
                let mut result = Value::Nil;
                for stmt in body {
                    result = self.eval(stmt, &new_env)?;
                }
                Ok(result)
            }
            other => Err(EvalError::not_callable(other)),
        }
    }

    fn eval_positional(&self, arg_nodes: &[Value], env: &Rc<Environment>) -> Result<Vec<Value>, EvalError> {
        arg_nodes.iter().map(|a| self.eval(a, env)).collect()
    }

    fn eval_let_bindings(
        &self,
        items: &[Value],
        env: &Rc<Environment>,
    ) -> Result<(Rc<Environment>, Vec<Value>), EvalError> {
        if items.len() < 2 {
            return Err(EvalError::arity_mismatch("let", 2, items.len().saturating_sub(1)));
        }
        let raw_bindings = match &items[1] {
            Value::List(b) => b.clone(),
            Value::Nil => Vec::new(),
            other => return Err(EvalError::type_error("let", "binding list", other)),
        };

        // §4.2 invariant: every vᵢ is evaluated in the OUTER environment
        // before any new binding becomes visible (non-sequential let).
        let mut bindings = Vec::with_capacity(raw_bindings.len());
        for binding in &raw_bindings {
            let pair = match binding {
                Value::List(p) if p.len() == 2 => p,
                other => return Err(EvalError::type_error("let", "(name value) pair", other)),
            };
            let name = match &pair[0] {
                Value::Symbol(s) => s.clone(),
                other => return Err(EvalError::type_error("let", "symbol", other)),
            };
            let value = self.eval(&pair[1], env)?;
            bindings.push((name, value));
        }

        let new_env = env.extend(bindings);
        Ok((new_env, items[2..].to_vec()))
    }

    fn eval_lambda(&self, items: &[Value], env: &Rc<Environment>) -> Result<Value, EvalError> {
        if items.len() < 2 {
            return Err(EvalError::arity_mismatch("lambda", 2, items.len().saturating_sub(1)));
        }
        let params = match &items[1] {
            Value::List(p) => p
                .iter()
                .map(|v| match v {
                    Value::Symbol(s) => Ok(s.clone()),
                    other => Err(EvalError::type_error("lambda", "symbol parameter", other)),
                })
                .collect::<Result<Vec<_>, _>>()?,
            Value::Nil => Vec::new(),
            other => return Err(EvalError::type_error("lambda", "parameter list", other)),
        };
        Ok(Value::Closure {
            params,
            body: items[2..].to_vec(),
            env: Rc::clone(env),
        })
    }

    fn eval_define(&self, items: &[Value], env: &Rc<Environment>) -> Result<Value, EvalError> {
        require_arity("define", &items[1..], 2)?;
        let name = match &items[1] {
            Value::Symbol(s) => s.clone(),
            other => return Err(EvalError::type_error("define", "symbol", other)),
        };
        let value = self.eval(&items[2], env)?;
        env.define(name.clone(), value);
        Ok(Value::Symbol(name))
    }

    fn eval_defatom(&self, items: &[Value], env: &Rc<Environment>) -> Result<Value, EvalError> {
        if items.len() < 3 {
            return Err(EvalError::arity_mismatch("defatom", 3, items.len().saturating_sub(1)));
        }
        let name = match &items[1] {
            Value::Symbol(s) => s.clone(),
            other => return Err(EvalError::type_error("defatom", "symbol", other)),
        };

        let clauses = &items[2..];
        let instructions_clause = clauses
            .first()
            .and_then(as_clause)
            .filter(|(head, _)| head == "instructions")
            .ok_or_else(|| {
                EvalError::task_failure(
                    "defatom_missing_instructions",
                    "defatom requires an (instructions \"...\") clause first",
                )
            })?;
        let instructions = match instructions_clause.1.first() {
            Some(Value::String(s)) => s.clone(),
            _ => {
                return Err(EvalError::task_failure(
                    "defatom_missing_instructions",
                    "instructions clause must contain a string",
                ))
            }
        };

        let mut params: Vec<Param> = Vec::new();
        let mut output_format: Option<OutputFormat> = None;
        let mut description: Option<String> = None;
        let mut subtype: Option<String> = None;
        let mut file_paths: Option<Vec<String>> = None;
        let mut auto_context = false;

        for clause in &clauses[1..] {
            let Some((head, rest)) = as_clause(clause) else {
                return Err(EvalError::type_error("defatom", "clause", clause));
            };
            match head.as_str() {
                "params" => {
                    for p in &rest {
                        let Value::List(pair) = p else {
                            return Err(EvalError::type_error("defatom params", "(name type) pair", p));
                        };
                        if pair.len() != 2 {
                            return Err(EvalError::type_error("defatom params", "(name type) pair", p));
                        }
                        let pname = match &pair[0] {
                            Value::Symbol(s) => s.clone(),
                            other => return Err(EvalError::type_error("defatom params", "symbol", other)),
                        };
                        let ptype_name = match &pair[1] {
                            Value::Symbol(s) => s.clone(),
                            Value::String(s) => s.clone(),
                            other => return Err(EvalError::type_error("defatom params", "type tag", other)),
                        };
                        let param_type = ParamType::parse(&ptype_name).ok_or_else(|| {
                            EvalError::task_failure(
                                "defatom_unknown_param_type",
                                format!("unknown parameter type: {}", ptype_name),
                            )
                        })?;
                        params.push(Param {
                            name: pname,
                            param_type,
                            required: true,
                            default: None,
                            description: None,
                        });
                    }
                }
                "output_format" => {
                    let Some(Value::List(sub_clauses)) = rest.first() else {
                        return Err(EvalError::task_failure(
                            "defatom_bad_output_format",
                            "output_format clause must wrap its sub-clauses in a list",
                        ));
                    };
                    let mut output_type = OutputType::Text;
                    let mut schema = None;
                    for sub in sub_clauses {
                        let Some((sub_head, sub_rest)) = as_clause(sub) else {
                            continue;
                        };
                        match sub_head.as_str() {
                            "type" => {
                                if let Some(Value::String(t)) = sub_rest.first() {
                                    output_type = match t.as_str() {
                                        "json" => OutputType::Json,
                                        _ => OutputType::Text,
                                    };
                                }
                            }
                            "schema" => {
                                if let Some(Value::String(s)) = sub_rest.first() {
                                    schema = Some(s.clone());
                                }
                            }
                            _ => {}
                        }
                    }
                    output_format = Some(OutputFormat { output_type, schema });
                }
                "description" => {
                    if let Some(Value::String(s)) = rest.first() {
                        description = Some(s.clone());
                    }
                }
                "subtype" => {
                    if let Some(Value::String(s)) = rest.first() {
                        subtype = Some(s.clone());
                    }
                }
                "file_paths" => {
                    let mut paths = Vec::new();
                    for p in &rest {
                        match p {
                            Value::String(s) => paths.push(s.clone()),
                            other => return Err(EvalError::type_error("defatom file_paths", "string", other)),
                        }
                    }
                    file_paths = Some(paths);
                }
                "auto_context" => {
                    auto_context = matches!(rest.first(), Some(Value::Bool(true)));
                }
                other => {
                    return Err(EvalError::task_failure(
                        "defatom_unknown_clause",
                        format!("unknown defatom clause: {}", other),
                    ))
                }
            }
        }

        validate_placeholders(&instructions, &params)?;

        let template = AtomicTaskTemplate {
            name: name.clone(),
            subtype,
            params,
            instructions,
            output_format,
            context_relevance: HashMap::new(),
            preferred_model: None,
            description,
            file_paths,
            auto_context,
        };
        self.registry.borrow_mut().register(template);

        // The registry is the source of truth for dispatch; this binding
        // only documents that `name` now names a registered task.
        env.define(name.clone(), Value::Symbol(name.clone()));
        Ok(Value::Symbol(name))
    }

    /// Invocation dispatch fallthrough (§4.4.2 steps 3-5): the head symbol
    /// did not resolve to a Closure, so try the Task Registry, then the
    /// Tool Surface, raising `UndefinedSymbol` only if neither matches.
    fn dispatch_invocation(
        &self,
        sym: &str,
        arg_nodes: &[Value],
        full_expr: &[Value],
        env: &Rc<Environment>,
    ) -> Result<Value, EvalError> {
        self.check_deadline()?;

        if sym == "read-file" {
            let args = self.eval_positional(arg_nodes, env)?;
            let path = match args.first() {
                Some(Value::String(s)) => s.clone(),
                Some(other) => return Err(EvalError::type_error("read-file", "string", other)),
                None => return Err(EvalError::arity_mismatch("read-file", 1, 0)),
            };
            return Ok(match self.files.read(&path) {
                Ok(text) => Value::Result(Box::new(ResultRecord::complete(Value::String(text)))),
                Err(err) => Value::Result(Box::new(ResultRecord::failed(err.0))),
            });
        }

        if self.registry.borrow().contains(sym) {
            let template = self.registry.borrow().find(sym).expect("checked contains").clone();
            let params = self.eval_task_arguments(&template, arg_nodes, env)?;
            let active_tools = self.tools.list_active();
            let result = self.registry.borrow().execute(
                sym,
                params,
                self.llm.as_ref(),
                &active_tools,
                self.memory.as_ref(),
                self.files.as_ref(),
            )?;
            return Ok(Value::Result(Box::new(result)));
        }

        if self.tools.contains(sym) {
            let args = self.eval_positional(arg_nodes, env)?;
            return match self.tools.invoke(sym, &args) {
                Some(result) => Ok(Value::Result(Box::new(result))),
                None => Err(EvalError::tool_failure(sym, "tool invocation produced no result")),
            };
        }

        Err(EvalError::undefined_symbol(sym, render_expr(full_expr)))
    }

    /// Evaluates task-invocation arguments: a raw `(k v)` two-element list
    /// is a named binding; everything else binds positionally to the
    /// template's declared parameter order (§4.4.2).
    fn eval_task_arguments(
        &self,
        template: &AtomicTaskTemplate,
        arg_nodes: &[Value],
        env: &Rc<Environment>,
    ) -> Result<HashMap<String, Value>, EvalError> {
        let mut bound = HashMap::new();
        let mut positional_index = 0usize;

        for node in arg_nodes {
            if let Value::List(pair) = node {
                if pair.len() == 2 {
                    if let Value::Symbol(key) = &pair[0] {
                        let value = self.eval(&pair[1], env)?;
                        bound.insert(key.clone(), value);
                        continue;
                    }
                }
            }

            while positional_index < template.params.len()
                && bound.contains_key(&template.params[positional_index].name)
            {
                positional_index += 1;
            }
            if positional_index >= template.params.len() {
                return Err(EvalError::task_failure(
                    "too_many_arguments",
                    format!("{} takes at most {} argument(s)", template.name, template.params.len()),
                ));
            }
            let value = self.eval(node, env)?;
            bound.insert(template.params[positional_index].name.clone(), value);
            positional_index += 1;
        }

        Ok(bound)
    }

    /// `(iterative-loop (max-iterations N) (initial-input E) (test-command C)
    ///  (executor F_E) (validator F_V) (controller F_C))` — Executor →
    /// Validator → Controller, repeated until the controller decides `stop`
    /// or `max-iterations` is exhausted (§4.7).
    fn eval_iterative_loop(&self, clauses: &[Value], env: &Rc<Environment>) -> Result<Value, EvalError> {
        const FORM: &str = "iterative-loop";
        let max_iterations = self.eval_loop_int_clause(clauses, "max-iterations", FORM, env)?;
        let initial_input = require_clause(clauses, "initial-input", FORM)?;
        let mut current_input = self.eval(&initial_input, env)?;
        let test_command_expr = require_clause(clauses, "test-command", FORM)?;
        let test_command = self.eval(&test_command_expr, env)?;

        let executor = self.eval_closure_clause(clauses, "executor", FORM, env)?;
        let validator = self.eval_closure_clause(clauses, "validator", FORM, env)?;
        let controller = self.eval_closure_clause(clauses, "controller", FORM, env)?;

        let mut loop_result = Value::Nil;
        let mut iteration: i64 = 1;
        while iteration <= max_iterations {
            self.check_deadline()?;

            let exec_res = self.apply(&executor, vec![current_input.clone(), Value::int(iteration)])?;
            if !matches!(exec_res, Value::Result(_)) {
                return Err(EvalError::type_error(FORM, "Result from executor", &exec_res));
            }
            let val_res = self.apply(&validator, vec![test_command.clone(), Value::int(iteration)])?;
            let decision = self.apply(
                &controller,
                vec![exec_res.clone(), val_res, current_input.clone(), Value::int(iteration)],
            )?;

            let (is_stop, payload) = decompose_decision(&decision)?;
            if is_stop {
                loop_result = payload;
                break;
            }
            loop_result = exec_res;
            current_input = payload;
            iteration += 1;
        }
        Ok(loop_result)
    }

    /// `(director-evaluator-loop (max-iterations N) (initial-director-input E)
    ///  (director F_D) (executor F_E) (evaluator F_V) (controller F_C))` —
    /// Director → Executor → Evaluator → Controller, same stop/continue
    /// contract as `iterative-loop` (§4.8).
    fn eval_director_evaluator_loop(&self, clauses: &[Value], env: &Rc<Environment>) -> Result<Value, EvalError> {
        const FORM: &str = "director-evaluator-loop";
        let max_iterations = self.eval_loop_int_clause(clauses, "max-iterations", FORM, env)?;
        let initial_input = require_clause(clauses, "initial-director-input", FORM)?;
        let mut current_director_input = self.eval(&initial_input, env)?;

        let director = self.eval_closure_clause(clauses, "director", FORM, env)?;
        let executor = self.eval_closure_clause(clauses, "executor", FORM, env)?;
        let evaluator = self.eval_closure_clause(clauses, "evaluator", FORM, env)?;
        let controller = self.eval_closure_clause(clauses, "controller", FORM, env)?;

        let mut loop_result = Value::Nil;
        let mut iteration: i64 = 1;
        while iteration <= max_iterations {
            self.check_deadline()?;

            let plan = self.apply(&director, vec![current_director_input.clone(), Value::int(iteration)])?;
            let work = self.apply(&executor, vec![plan.clone(), Value::int(iteration)])?;
            let feedback = self.apply(&evaluator, vec![work.clone(), plan.clone(), Value::int(iteration)])?;
            let decision = self.apply(
                &controller,
                vec![feedback, plan, work.clone(), Value::int(iteration)],
            )?;

            let (is_stop, payload) = decompose_decision(&decision)?;
            if is_stop {
                loop_result = payload;
                break;
            }
            current_director_input = payload;
            loop_result = work;
            iteration += 1;
        }
        Ok(loop_result)
    }

    fn eval_loop_int_clause(
        &self,
        clauses: &[Value],
        name: &str,
        form: &str,
        env: &Rc<Environment>,
    ) -> Result<i64, EvalError> {
        let expr = require_clause(clauses, name, form)?;
        match self.eval(&expr, env)? {
            Value::Number(n) => match n.as_i64() {
                Some(i) if i >= 0 => Ok(i),
                _ => Err(EvalError::type_error(form, "non-negative integer", &Value::Number(n))),
            },
            other => Err(EvalError::type_error(form, "non-negative integer", &other)),
        }
    }

    fn eval_closure_clause(
        &self,
        clauses: &[Value],
        name: &str,
        form: &str,
        env: &Rc<Environment>,
    ) -> Result<Value, EvalError> {
        let expr = require_clause(clauses, name, form)?;
        match self.eval(&expr, env)? {
            closure @ Value::Closure { .. } => Ok(closure),
            other => Err(EvalError::not_callable(&other)),
        }
    }
}

fn bind_closure_frame(
    label: &str,
    params: &[String],
    args: Vec<Value>,
    captured_env: &Rc<Environment>,
) -> Result<Rc<Environment>, EvalError> {
    if args.len() != params.len() {
        return Err(EvalError::arity_mismatch(label, params.len(), args.len()));
    }
    let bindings: Vec<(String, Value)> = params.iter().cloned().zip(args).collect();
    Ok(captured_env.extend(bindings))
}

fn require_arity(name: &str, args: &[Value], expected: usize) -> Result<(), EvalError> {
    if args.len() != expected {
        return Err(EvalError::arity_mismatch(name, expected, args.len()));
    }
    Ok(())
}

fn require_arity_range(name: &str, args: &[Value], min: usize, max: usize) -> Result<(), EvalError> {
    if args.len() < min || args.len() > max {
        return Err(EvalError::arity_mismatch(name, min, args.len()));
    }
    Ok(())
}

/// Interprets a form like `(instructions "...")` as `(head, rest)`.
pub fn as_clause(value: &Value) -> Option<(String, Vec<Value>)> {
    match value {
        Value::List(items) if !items.is_empty() => match &items[0] {
            Value::Symbol(s) => Some((s.clone(), items[1..].to_vec())),
            _ => None,
        },
        _ => None,
    }
}

/// Finds a `(name expr)` clause among a loop form's sub-expressions and
/// returns its single argument (unevaluated).
fn find_clause(clauses: &[Value], name: &str) -> Option<Value> {
    clauses.iter().find_map(|c| {
        as_clause(c).and_then(|(head, rest)| if head == name { rest.into_iter().next() } else { None })
    })
}

fn require_clause(clauses: &[Value], name: &str, form: &str) -> Result<Value, EvalError> {
    find_clause(clauses, name).ok_or_else(|| {
        EvalError::task_failure(
            "missing_loop_clause",
            format!("{} requires a ({} ...) clause", form, name),
        )
    })
}

fn validate_placeholders(instructions: &str, params: &[Param]) -> Result<(), EvalError> {
    let mut rest = instructions;
    while let Some(start) = rest.find("{{") {
        let after = &rest[start + 2..];
        let Some(end) = after.find("}}") else { break };
        let placeholder = after[..end].trim();
        let base = placeholder.split('.').next().unwrap_or(placeholder);
        if !params.iter().any(|p| p.name == base) {
            return Err(EvalError::unresolved_placeholder(placeholder));
        }
        rest = &after[end + 2..];
    }
    Ok(())
}

fn render_expr(items: &[Value]) -> String {
    format!("{}", Value::List(items.to_vec()))
}

/// Decomposes a controller/phase decision into `(is_stop, payload)`, per
/// the `(stop value)` / `(continue value)` shape required by both loop
/// forms (§4.7, §4.8).
pub fn decompose_decision(value: &Value) -> Result<(bool, Value), EvalError> {
    match value {
        Value::List(items) if items.len() == 2 => match &items[0] {
            Value::Symbol(s) if s == "stop" => Ok((true, items[1].clone())),
            Value::Symbol(s) if s == "continue" => Ok((false, items[1].clone())),
            _ => Err(EvalError::malformed_controller_decision(render_expr(items))),
        },
        other => Err(EvalError::malformed_controller_decision(format!("{}", other))),
    }
}

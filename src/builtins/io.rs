// ABOUTME: Console output, error signaling, workspace introspection, and the tic/toc stopwatch

use std::collections::HashMap;

use super::BuiltinFn;
use crate::error::EvalError;
use crate::interpreter::Engine;
use crate::value::Value;

pub fn register(table: &mut HashMap<&'static str, BuiltinFn>) {
    table.insert("disp", disp as BuiltinFn);
    table.insert("fprintf", fprintf as BuiltinFn);
    table.insert("error", error_fn as BuiltinFn);
    table.insert("warning", warning as BuiltinFn);
    table.insert("tic", tic as BuiltinFn);
    table.insert("toc", toc as BuiltinFn);
    table.insert("exist", exist as BuiltinFn);
    table.insert("clear", clear as BuiltinFn);
}

fn disp(args: &[Value], engine: &mut Engine) -> Result<Value, EvalError> {
    super::check_arity("disp", args, 1)?;
    engine.emit(&format!("{}\n", args[0]));
    Ok(Value::Empty)
}

/// Like `sprintf` but writes straight to the engine's output sink instead
/// of returning a string; a bare `%` directive set with no format args just
/// prints literally (MATLAB's single-argument `fprintf('text\n')` form).
fn fprintf(args: &[Value], engine: &mut Engine) -> Result<Value, EvalError> {
    super::check_arity_range("fprintf", args, 1, usize::MAX)?;
    let fmt = super::string_arg("fprintf", args, 0)?;
    let text = super::format_string(fmt, &args[1..])?;
    engine.emit(&text);
    Ok(Value::Empty)
}

fn error_fn(args: &[Value], _engine: &mut Engine) -> Result<Value, EvalError> {
    super::check_arity_range("error", args, 1, usize::MAX)?;
    let fmt = super::string_arg("error", args, 0)?;
    let message = super::format_string(fmt, &args[1..])?;
    Err(EvalError::user(message))
}

/// Warnings don't interrupt control flow; they print to the same sink as
/// `disp`, prefixed the way MATLAB prefixes its warning banner.
fn warning(args: &[Value], engine: &mut Engine) -> Result<Value, EvalError> {
    super::check_arity_range("warning", args, 1, usize::MAX)?;
    let fmt = super::string_arg("warning", args, 0)?;
    let message = super::format_string(fmt, &args[1..])?;
    engine.emit(&format!("Warning: {message}\n"));
    Ok(Value::Empty)
}

fn tic(args: &[Value], engine: &mut Engine) -> Result<Value, EvalError> {
    super::check_arity("tic", args, 0)?;
    engine.tic_mark = Some(engine.clock);
    Ok(Value::Empty)
}

/// Advances the engine's logical clock by one tick and reports ticks
/// elapsed since the last `tic` (0 if `tic` was never called) — there's no
/// wall clock in this engine (SPEC_FULL.md §13), so "elapsed time" is a
/// deterministic tick count rather than seconds.
fn toc(args: &[Value], engine: &mut Engine) -> Result<Value, EvalError> {
    super::check_arity("toc", args, 0)?;
    engine.clock += 1;
    let start = engine.tic_mark.unwrap_or(engine.clock);
    let elapsed = engine.clock.saturating_sub(start);
    engine.emit(&format!("Elapsed time is {elapsed} ticks.\n"));
    Ok(Value::scalar(elapsed as f64))
}

/// Only sees the global workspace: `BuiltinFn` has no access to the caller's
/// local environment, so `exist` inside a user function only reports on
/// globals, functions, and builtins, not that function's own locals.
fn exist(args: &[Value], engine: &mut Engine) -> Result<Value, EvalError> {
    super::check_arity("exist", args, 1)?;
    let name = super::string_arg("exist", args, 0)?;
    let code = if engine.global.has(name) {
        1.0
    } else if engine.functions.contains_key(name) {
        2.0
    } else if engine.builtins.contains_key(name) {
        5.0
    } else {
        0.0
    };
    Ok(Value::scalar(code))
}

fn clear(args: &[Value], engine: &mut Engine) -> Result<Value, EvalError> {
    if args.is_empty() {
        engine.global.clear_all();
        return Ok(Value::Empty);
    }
    for a in args {
        if let Value::String(name) = a {
            engine.global.clear(name);
        }
    }
    Ok(Value::Empty)
}

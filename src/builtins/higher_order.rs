// ABOUTME: Function-handle application - feval, arrayfun, cellfun

use std::collections::HashMap;

use super::BuiltinFn;
use crate::error::EvalError;
use crate::interpreter::Engine;
use crate::value::{Cell, FuncHandle, Matrix, Value};

pub fn register(table: &mut HashMap<&'static str, BuiltinFn>) {
    table.insert("feval", feval as BuiltinFn);
    table.insert("arrayfun", arrayfun as BuiltinFn);
    table.insert("cellfun", cellfun as BuiltinFn);
}

fn handle_arg(name: &str, args: &[Value], i: usize) -> Result<FuncHandle, EvalError> {
    match args.get(i) {
        Some(Value::FuncHandle(h)) => Ok(h.clone()),
        Some(Value::String(s)) => Ok(FuncHandle::Named(s.clone())),
        other => Err(EvalError::type_error(name, "function handle", other.unwrap_or(&Value::Empty), i + 1)),
    }
}

fn feval(args: &[Value], engine: &mut Engine) -> Result<Value, EvalError> {
    super::check_arity_range("feval", args, 1, usize::MAX)?;
    let handle = handle_arg("feval", args, 0)?;
    let rest = args[1..].to_vec();
    let out = engine.call_handle(&handle, rest, 1)?;
    Ok(out.into_iter().next().unwrap_or(Value::Empty))
}

/// Applies a handle element-wise over one or more same-shaped matrix
/// arguments. `'UniformOutput', false` (MATLAB's escape hatch for
/// non-scalar results) packs outputs into a cell instead of a matrix.
fn arrayfun(args: &[Value], engine: &mut Engine) -> Result<Value, EvalError> {
    super::check_arity_range("arrayfun", args, 2, usize::MAX)?;
    let handle = handle_arg("arrayfun", args, 0)?;
    let (inputs, uniform) = split_uniform_flag(&args[1..])?;
    let mats: Vec<&Matrix> = inputs
        .iter()
        .enumerate()
        .map(|(i, v)| match v {
            Value::Matrix(m) => Ok(m),
            other => Err(EvalError::type_error("arrayfun", "matrix", other, i + 2)),
        })
        .collect::<Result<_, _>>()?;
    let len = mats.first().map(|m| m.data.len()).unwrap_or(0);
    let mut results = Vec::with_capacity(len);
    for i in 0..len {
        let call_args: Vec<Value> = mats.iter().map(|m| Value::scalar(m.data[i])).collect();
        let out = engine.call_handle(&handle, call_args, 1)?;
        results.push(out.into_iter().next().unwrap_or(Value::Empty));
    }
    pack_results(results, mats.first().map(|m| (m.rows, m.cols)).unwrap_or((0, 0)), uniform)
}

fn cellfun(args: &[Value], engine: &mut Engine) -> Result<Value, EvalError> {
    super::check_arity_range("cellfun", args, 2, usize::MAX)?;
    let handle = handle_arg("cellfun", args, 0)?;
    let (inputs, uniform) = split_uniform_flag(&args[1..])?;
    let cells: Vec<&Cell> = inputs
        .iter()
        .enumerate()
        .map(|(i, v)| match v {
            Value::Cell(c) => Ok(c),
            other => Err(EvalError::type_error("cellfun", "cell", other, i + 2)),
        })
        .collect::<Result<_, _>>()?;
    let len = cells.first().map(|c| c.data.len()).unwrap_or(0);
    let mut results = Vec::with_capacity(len);
    for i in 0..len {
        let call_args: Vec<Value> = cells.iter().map(|c| c.data[i].clone()).collect();
        let out = engine.call_handle(&handle, call_args, 1)?;
        results.push(out.into_iter().next().unwrap_or(Value::Empty));
    }
    pack_results(results, cells.first().map(|c| (c.rows, c.cols)).unwrap_or((0, 0)), uniform)
}

fn split_uniform_flag(args: &[Value]) -> Result<(Vec<Value>, bool), EvalError> {
    if args.len() >= 2 {
        if let Value::String(flag) = &args[args.len() - 2] {
            if flag.eq_ignore_ascii_case("UniformOutput") {
                let uniform = args[args.len() - 1].is_truthy();
                return Ok((args[..args.len() - 2].to_vec(), uniform));
            }
        }
    }
    Ok((args.to_vec(), true))
}

fn pack_results(results: Vec<Value>, shape: (usize, usize), uniform: bool) -> Result<Value, EvalError> {
    if !uniform {
        let (rows, cols) = shape;
        return Ok(Value::Cell(Cell::new(rows, cols, results)));
    }
    let data: Vec<f64> = results
        .iter()
        .map(|v| v.as_scalar().ok_or_else(|| EvalError::runtime_error("arrayfun/cellfun", "non-scalar result with UniformOutput true")))
        .collect::<Result<_, _>>()?;
    let (rows, cols) = shape;
    Ok(Value::Matrix(Matrix::new(rows, cols, data)))
}

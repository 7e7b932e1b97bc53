// ABOUTME: Matrix-construction builtins - zeros/ones/eye/rand/randn/linspace/logspace

use std::collections::HashMap;

use super::math::parse_shape_args;
use super::BuiltinFn;
use crate::error::EvalError;
use crate::interpreter::Engine;
use crate::matrix;
use crate::value::{Matrix, Value};

pub fn register(table: &mut HashMap<&'static str, BuiltinFn>) {
    table.insert("zeros", zeros as BuiltinFn);
    table.insert("ones", ones as BuiltinFn);
    table.insert("eye", eye as BuiltinFn);
    table.insert("rand", rand as BuiltinFn);
    table.insert("randn", randn as BuiltinFn);
    table.insert("linspace", linspace as BuiltinFn);
    table.insert("logspace", logspace as BuiltinFn);
    table.insert("nan", nan as BuiltinFn);
    table.insert("NaN", nan as BuiltinFn);
    table.insert("inf", inf as BuiltinFn);
    table.insert("Inf", inf as BuiltinFn);
}

fn zeros(args: &[Value], _engine: &mut Engine) -> Result<Value, EvalError> {
    let (r, c) = parse_shape_args("zeros", args)?;
    Ok(Value::Matrix(Matrix::zeros(r, c)))
}

fn ones(args: &[Value], _engine: &mut Engine) -> Result<Value, EvalError> {
    let (r, c) = parse_shape_args("ones", args)?;
    Ok(Value::Matrix(Matrix::zeros(r, c).map(|_| 1.0)))
}

fn nan(args: &[Value], _engine: &mut Engine) -> Result<Value, EvalError> {
    let (r, c) = parse_shape_args("nan", args)?;
    Ok(Value::Matrix(Matrix::zeros(r, c).map(|_| f64::NAN)))
}

fn inf(args: &[Value], _engine: &mut Engine) -> Result<Value, EvalError> {
    let (r, c) = parse_shape_args("inf", args)?;
    Ok(Value::Matrix(Matrix::zeros(r, c).map(|_| f64::INFINITY)))
}

fn eye(args: &[Value], _engine: &mut Engine) -> Result<Value, EvalError> {
    let (r, c) = parse_shape_args("eye", args)?;
    if r == c {
        return Ok(Value::Matrix(matrix::identity(r)));
    }
    let mut m = Matrix::zeros(r, c);
    for i in 0..r.min(c) {
        m.set(i, i, 1.0);
    }
    Ok(Value::Matrix(m))
}

/// `rand()`, `rand(n)`, or `rand(r, c)`: uniform(0,1) draws from the
/// engine's deterministic PRNG (SPEC_FULL.md §13's portability note).
fn rand(args: &[Value], engine: &mut Engine) -> Result<Value, EvalError> {
    let (rows, cols) = parse_shape_args("rand", args)?;
    let data: Vec<f64> = (0..rows * cols).map(|_| engine.next_rand()).collect();
    Ok(Value::Matrix(Matrix::new(rows, cols, data)))
}

fn randn(args: &[Value], engine: &mut Engine) -> Result<Value, EvalError> {
    let (rows, cols) = parse_shape_args("randn", args)?;
    let data: Vec<f64> = (0..rows * cols)
        .map(|_| {
            // Box-Muller transform over two draws from the same deterministic stream.
            let u1 = engine.next_rand().max(1e-12);
            let u2 = engine.next_rand();
            (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos()
        })
        .collect();
    Ok(Value::Matrix(Matrix::new(rows, cols, data)))
}

fn linspace(args: &[Value], _engine: &mut Engine) -> Result<Value, EvalError> {
    super::check_arity_range("linspace", args, 2, 3)?;
    let a = super::scalar_arg("linspace", args, 0)?;
    let b = super::scalar_arg("linspace", args, 1)?;
    let n = if args.len() == 3 { super::scalar_arg("linspace", args, 2)? as usize } else { 100 };
    if n <= 1 {
        return Ok(Value::Matrix(Matrix::row_vec(vec![b])));
    }
    let step = (b - a) / (n - 1) as f64;
    let data: Vec<f64> = (0..n).map(|k| a + step * k as f64).collect();
    Ok(Value::Matrix(Matrix::row_vec(data)))
}

fn logspace(args: &[Value], _engine: &mut Engine) -> Result<Value, EvalError> {
    super::check_arity_range("logspace", args, 2, 3)?;
    let a = super::scalar_arg("logspace", args, 0)?;
    let b = super::scalar_arg("logspace", args, 1)?;
    let n = if args.len() == 3 { super::scalar_arg("logspace", args, 2)? as usize } else { 50 };
    if n <= 1 {
        return Ok(Value::Matrix(Matrix::row_vec(vec![10f64.powf(b)])));
    }
    let step = (b - a) / (n - 1) as f64;
    let data: Vec<f64> = (0..n).map(|k| 10f64.powf(a + step * k as f64)).collect();
    Ok(Value::Matrix(Matrix::row_vec(data)))
}

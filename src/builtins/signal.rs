// ABOUTME: Window functions and periodic waveform generators

use std::collections::HashMap;

use super::BuiltinFn;
use crate::error::EvalError;
use crate::interpreter::Engine;
use crate::value::{Matrix, Value};

const TAU: f64 = std::f64::consts::TAU;

pub fn register(table: &mut HashMap<&'static str, BuiltinFn>) {
    table.insert("hamming", hamming as BuiltinFn);
    table.insert("hanning", hanning as BuiltinFn);
    table.insert("blackman", blackman as BuiltinFn);
    table.insert("bartlett", bartlett as BuiltinFn);
    table.insert("chirp", chirp as BuiltinFn);
    table.insert("sawtooth", sawtooth as BuiltinFn);
    table.insert("square", square as BuiltinFn);
}

fn window(name: &str, args: &[Value], f: impl Fn(usize, usize) -> f64) -> Result<Value, EvalError> {
    super::check_arity(name, args, 1)?;
    let n = super::scalar_arg(name, args, 0)? as usize;
    let data: Vec<f64> = (0..n).map(|i| f(i, n)).collect();
    Ok(Value::Matrix(Matrix::col_vec(data)))
}

fn hamming(args: &[Value], _engine: &mut Engine) -> Result<Value, EvalError> {
    window("hamming", args, |i, n| {
        0.54 - 0.46 * (TAU * i as f64 / (n.saturating_sub(1)).max(1) as f64).cos()
    })
}

fn hanning(args: &[Value], _engine: &mut Engine) -> Result<Value, EvalError> {
    window("hanning", args, |i, n| {
        0.5 * (1.0 - (TAU * i as f64 / (n.saturating_sub(1)).max(1) as f64).cos())
    })
}

fn blackman(args: &[Value], _engine: &mut Engine) -> Result<Value, EvalError> {
    window("blackman", args, |i, n| {
        let m = (n.saturating_sub(1)).max(1) as f64;
        let x = i as f64;
        0.42 - 0.5 * (TAU * x / m).cos() + 0.08 * (2.0 * TAU * x / m).cos()
    })
}

fn bartlett(args: &[Value], _engine: &mut Engine) -> Result<Value, EvalError> {
    window("bartlett", args, |i, n| {
        let m = (n.saturating_sub(1)).max(1) as f64;
        1.0 - ((i as f64 - m / 2.0).abs() / (m / 2.0))
    })
}

/// Linear frequency sweep from `f0` at `t=0` to `f1` at `t=t1` (MATLAB's
/// `chirp(t, f0, t1, f1)`).
fn chirp(args: &[Value], _engine: &mut Engine) -> Result<Value, EvalError> {
    super::check_arity("chirp", args, 4)?;
    let t = super::matrix_arg("chirp", args, 0)?;
    let f0 = super::scalar_arg("chirp", args, 1)?;
    let t1 = super::scalar_arg("chirp", args, 2)?;
    let f1 = super::scalar_arg("chirp", args, 3)?;
    let rate = (f1 - f0) / t1;
    Ok(Value::Matrix(t.map(|tv| (std::f64::consts::PI * (2.0 * f0 + rate * tv) * tv).cos())))
}

fn sawtooth(args: &[Value], _engine: &mut Engine) -> Result<Value, EvalError> {
    super::check_arity_range("sawtooth", args, 1, 2)?;
    let t = super::matrix_arg("sawtooth", args, 0)?;
    let width = if args.len() == 2 { super::scalar_arg("sawtooth", args, 1)? } else { 1.0 };
    Ok(Value::Matrix(t.map(|tv| {
        let phase = (tv / TAU).rem_euclid(1.0);
        if phase < width {
            2.0 * phase / width.max(1e-12) - 1.0
        } else {
            -2.0 * (phase - width) / (1.0 - width).max(1e-12) + 1.0
        }
    })))
}

fn square(args: &[Value], _engine: &mut Engine) -> Result<Value, EvalError> {
    super::check_arity_range("square", args, 1, 2)?;
    let t = super::matrix_arg("square", args, 0)?;
    let duty = if args.len() == 2 { super::scalar_arg("square", args, 1)? / 100.0 } else { 0.5 };
    Ok(Value::Matrix(t.map(|tv| {
        let phase = (tv / TAU).rem_euclid(1.0);
        if phase < duty { 1.0 } else { -1.0 }
    })))
}

// ABOUTME: Elementwise transcendental and rounding functions

use std::collections::HashMap;

use super::{elementwise_unary, BuiltinFn};
use crate::error::EvalError;
use crate::interpreter::Engine;
use crate::value::Value;

macro_rules! unary_fn {
    ($table:expr, $name:literal, $f:expr) => {
        $table.insert($name, (|args: &[Value], _engine: &mut Engine| elementwise_unary($name, args, $f)) as BuiltinFn);
    };
}

pub fn register(table: &mut HashMap<&'static str, BuiltinFn>) {
    unary_fn!(table, "sin", f64::sin);
    unary_fn!(table, "cos", f64::cos);
    unary_fn!(table, "tan", f64::tan);
    unary_fn!(table, "asin", f64::asin);
    unary_fn!(table, "acos", f64::acos);
    unary_fn!(table, "atan", f64::atan);
    unary_fn!(table, "sinh", f64::sinh);
    unary_fn!(table, "cosh", f64::cosh);
    unary_fn!(table, "tanh", f64::tanh);
    unary_fn!(table, "exp", f64::exp);
    unary_fn!(table, "log", f64::ln);
    unary_fn!(table, "log2", f64::log2);
    unary_fn!(table, "log10", f64::log10);
    unary_fn!(table, "sqrt", f64::sqrt);
    unary_fn!(table, "abs", f64::abs);
    unary_fn!(table, "floor", f64::floor);
    unary_fn!(table, "ceil", f64::ceil);
    unary_fn!(table, "round", |x: f64| x.round());
    unary_fn!(table, "fix", f64::trunc);
    unary_fn!(table, "sign", f64::signum);

    table.insert("atan2", atan2 as BuiltinFn);
    table.insert("mod", modulo as BuiltinFn);
    table.insert("rem", rem as BuiltinFn);
    table.insert("power", power as BuiltinFn);
    table.insert("hypot", hypot as BuiltinFn);
    table.insert("gcd", gcd as BuiltinFn);
    table.insert("lcm", lcm as BuiltinFn);
    table.insert("factorial", factorial as BuiltinFn);
    table.insert("nchoosek", nchoosek as BuiltinFn);
}

fn atan2(args: &[Value], _engine: &mut Engine) -> Result<Value, EvalError> {
    super::elementwise_binary("atan2", args, f64::atan2)
}

/// MATLAB's `mod`: result has the same sign as the divisor.
fn modulo(args: &[Value], _engine: &mut Engine) -> Result<Value, EvalError> {
    super::elementwise_binary("mod", args, |a, b| if b == 0.0 { a } else { a - b * (a / b).floor() })
}

/// MATLAB's `rem`: result has the same sign as the dividend.
fn rem(args: &[Value], _engine: &mut Engine) -> Result<Value, EvalError> {
    super::elementwise_binary("rem", args, |a, b| if b == 0.0 { f64::NAN } else { a - b * (a / b).trunc() })
}

fn power(args: &[Value], _engine: &mut Engine) -> Result<Value, EvalError> {
    super::elementwise_binary("power", args, f64::powf)
}

fn hypot(args: &[Value], _engine: &mut Engine) -> Result<Value, EvalError> {
    super::elementwise_binary("hypot", args, f64::hypot)
}

pub fn parse_shape_args(name: &str, args: &[Value]) -> Result<(usize, usize), EvalError> {
    match args.len() {
        0 => Ok((1, 1)),
        1 => {
            let n = super::scalar_arg(name, args, 0)? as usize;
            Ok((n, n))
        }
        2 => {
            let r = super::scalar_arg(name, args, 0)? as usize;
            let c = super::scalar_arg(name, args, 1)? as usize;
            Ok((r, c))
        }
        _ => Err(EvalError::arity_error(name, "0-2", args.len())),
    }
}

fn gcd(args: &[Value], _engine: &mut Engine) -> Result<Value, EvalError> {
    super::elementwise_binary("gcd", args, |a, b| gcd_i(a.abs() as i64, b.abs() as i64) as f64)
}

fn gcd_i(a: i64, b: i64) -> i64 {
    if b == 0 { a } else { gcd_i(b, a % b) }
}

fn lcm(args: &[Value], _engine: &mut Engine) -> Result<Value, EvalError> {
    super::elementwise_binary("lcm", args, |a, b| {
        let (ai, bi) = (a.abs() as i64, b.abs() as i64);
        if ai == 0 || bi == 0 {
            0.0
        } else {
            (ai / gcd_i(ai, bi) * bi) as f64
        }
    })
}

fn factorial(args: &[Value], _engine: &mut Engine) -> Result<Value, EvalError> {
    super::elementwise_unary("factorial", args, |x| {
        let n = x.round() as u64;
        (1..=n).fold(1.0_f64, |acc, k| acc * k as f64)
    })
}

fn nchoosek(args: &[Value], _engine: &mut Engine) -> Result<Value, EvalError> {
    super::check_arity("nchoosek", args, 2)?;
    let n = super::scalar_arg("nchoosek", args, 0)?;
    let k = super::scalar_arg("nchoosek", args, 1)?;
    let mut result = 1.0;
    for i in 0..(k as u64) {
        result *= (n - i as f64) / (i as f64 + 1.0);
    }
    Ok(Value::scalar(result.round()))
}

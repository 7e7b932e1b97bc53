// ABOUTME: Built-in function registry - one category per sub-module, uniform validation helpers

use std::collections::HashMap;

use crate::error::EvalError;
use crate::interpreter::Engine;
use crate::value::{Matrix, Value};

pub mod audio;
pub mod constructors;
pub mod higher_order;
pub mod io;
pub mod linalg;
pub mod math;
pub mod plotting;
pub mod scientific;
pub mod shape;
pub mod signal;
pub mod strings;
pub mod symbolic_bridge;
pub mod types;

pub type BuiltinFn = fn(&[Value], &mut Engine) -> Result<Value, EvalError>;

pub fn register_all(table: &mut HashMap<&'static str, BuiltinFn>) {
    math::register(table);
    constructors::register(table);
    shape::register(table);
    linalg::register(table);
    scientific::register(table);
    signal::register(table);
    strings::register(table);
    types::register(table);
    io::register(table);
    higher_order::register(table);
    plotting::register(table);
    audio::register(table);
    symbolic_bridge::register(table);
}

// ---------------------------------------------------------------------
// Shared argument-validation helpers used across every category module.
// ---------------------------------------------------------------------

pub fn check_arity(name: &str, args: &[Value], expected: usize) -> Result<(), EvalError> {
    if args.len() != expected {
        return Err(EvalError::arity_error(name, expected.to_string(), args.len()));
    }
    Ok(())
}

pub fn check_arity_range(name: &str, args: &[Value], min: usize, max: usize) -> Result<(), EvalError> {
    if args.len() < min || args.len() > max {
        return Err(EvalError::arity_error(name, format!("{min}-{max}"), args.len()));
    }
    Ok(())
}

pub fn scalar_arg(name: &str, args: &[Value], i: usize) -> Result<f64, EvalError> {
    args.get(i)
        .and_then(|v| v.as_scalar())
        .ok_or_else(|| EvalError::type_error(name, "scalar", args.get(i).unwrap_or(&Value::Empty), i + 1))
}

pub fn matrix_arg<'a>(name: &str, args: &'a [Value], i: usize) -> Result<&'a Matrix, EvalError> {
    args.get(i)
        .and_then(|v| v.as_matrix())
        .ok_or_else(|| EvalError::type_error(name, "matrix", args.get(i).unwrap_or(&Value::Empty), i + 1))
}

pub fn string_arg<'a>(name: &str, args: &'a [Value], i: usize) -> Result<&'a str, EvalError> {
    match args.get(i) {
        Some(Value::String(s)) => Ok(s.as_str()),
        other => Err(EvalError::type_error(name, "string", other.unwrap_or(&Value::Empty), i + 1)),
    }
}

/// Applies `f` element-wise over a matrix/string-as-char-code argument.
pub fn elementwise_unary(name: &str, args: &[Value], f: impl Fn(f64) -> f64) -> Result<Value, EvalError> {
    check_arity(name, args, 1)?;
    let m = match &args[0] {
        Value::Matrix(m) => m.clone(),
        Value::String(s) => Matrix::row_vec(crate::interpreter::str_to_codes(s)),
        other => return Err(EvalError::type_error(name, "numeric", other, 1)),
    };
    Ok(Value::Matrix(m.map(f)))
}

pub fn elementwise_binary(name: &str, args: &[Value], f: impl Fn(f64, f64) -> f64) -> Result<Value, EvalError> {
    check_arity(name, args, 2)?;
    let a = matrix_arg(name, args, 0)?;
    let b = matrix_arg(name, args, 1)?;
    Ok(Value::Matrix(crate::matrix::elementwise(a, b, name, f)?))
}

/// Hand-rolled `printf`-style formatter: `%d %i %f %e %g %s %%` with
/// width/precision and `\n \t \\` escapes (SPEC_FULL.md §9). Shared by
/// `sprintf`/`fprintf`/`disp`.
pub fn format_string(fmt: &str, args: &[Value]) -> Result<String, EvalError> {
    let mut out = String::new();
    let mut arg_idx = 0;
    let mut chars = fmt.chars().peekable();
    let mut next_arg = |idx: &mut usize| -> Value {
        let v = args.get(*idx).cloned().unwrap_or(Value::Empty);
        *idx += 1;
        v
    };
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some('n') => out.push('\n'),
                Some('t') => out.push('\t'),
                Some('\\') => out.push('\\'),
                Some(other) => {
                    out.push('\\');
                    out.push(other);
                }
                None => out.push('\\'),
            }
            continue;
        }
        if c != '%' {
            out.push(c);
            continue;
        }
        if chars.peek() == Some(&'%') {
            chars.next();
            out.push('%');
            continue;
        }
        let mut spec = String::new();
        while let Some(&p) = chars.peek() {
            if p.is_ascii_digit() || p == '.' || p == '-' {
                spec.push(p);
                chars.next();
            } else {
                break;
            }
        }
        let Some(conv) = chars.next() else {
            out.push('%');
            out.push_str(&spec);
            continue;
        };
        let (width, precision) = parse_format_spec(&spec);
        let value = next_arg(&mut arg_idx);
        let piece = match conv {
            'd' | 'i' => format!("{}", value.as_scalar().unwrap_or(0.0).trunc() as i64),
            'f' => format!("{:.*}", precision.unwrap_or(6), value.as_scalar().unwrap_or(0.0)),
            'e' => format_exp(value.as_scalar().unwrap_or(0.0), precision.unwrap_or(6)),
            'g' => crate::value::format_number(value.as_scalar().unwrap_or(0.0)),
            's' => format!("{}", value),
            other => {
                out.push('%');
                out.push(other);
                continue;
            }
        };
        out.push_str(&pad(&piece, width));
    }
    Ok(out)
}

fn parse_format_spec(spec: &str) -> (Option<usize>, Option<usize>) {
    if let Some((w, p)) = spec.split_once('.') {
        (w.parse().ok(), p.parse().ok())
    } else {
        (spec.parse().ok(), None)
    }
}

fn pad(s: &str, width: Option<usize>) -> String {
    match width {
        Some(w) if s.len() < w => format!("{}{}", " ".repeat(w - s.len()), s),
        _ => s.to_string(),
    }
}

fn format_exp(v: f64, precision: usize) -> String {
    let s = format!("{:.*e}", precision, v);
    // Rust renders `1.5e2`; MATLAB's `%e` wants `1.500000e+02`.
    if let Some((mantissa, exp)) = s.split_once('e') {
        let exp_val: i32 = exp.parse().unwrap_or(0);
        format!("{mantissa}e{}{:02}", if exp_val < 0 { "-" } else { "+" }, exp_val.abs())
    } else {
        s
    }
}

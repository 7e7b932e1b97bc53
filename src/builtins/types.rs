// ABOUTME: Type predicates and conversions

use std::collections::HashMap;

use super::BuiltinFn;
use crate::error::EvalError;
use crate::interpreter::Engine;
use crate::value::{Cell, Matrix, Value};

pub fn register(table: &mut HashMap<&'static str, BuiltinFn>) {
    table.insert("class", class as BuiltinFn);
    table.insert("isa", isa as BuiltinFn);
    table.insert("isnumeric", isnumeric as BuiltinFn);
    table.insert("ischar", ischar as BuiltinFn);
    table.insert("islogical", islogical as BuiltinFn);
    table.insert("isstruct", isstruct as BuiltinFn);
    table.insert("iscell", iscell as BuiltinFn);
    table.insert("isnan", isnan as BuiltinFn);
    table.insert("isinf", isinf as BuiltinFn);
    table.insert("isfinite", isfinite as BuiltinFn);
    table.insert("logical", logical as BuiltinFn);
    table.insert("double", double as BuiltinFn);
    table.insert("char", char_fn as BuiltinFn);
    table.insert("struct", struct_fn as BuiltinFn);
    table.insert("fieldnames", fieldnames as BuiltinFn);
    table.insert("cell", cell as BuiltinFn);
    table.insert("isvector", isvector as BuiltinFn);
    table.insert("isscalar", isscalar as BuiltinFn);
    table.insert("ismatrix", ismatrix as BuiltinFn);
    table.insert("is_function_handle", is_function_handle as BuiltinFn);
}

fn class(args: &[Value], _engine: &mut Engine) -> Result<Value, EvalError> {
    super::check_arity("class", args, 1)?;
    Ok(Value::String(args[0].type_name().to_string()))
}

fn isa(args: &[Value], _engine: &mut Engine) -> Result<Value, EvalError> {
    super::check_arity("isa", args, 2)?;
    let name = super::string_arg("isa", args, 1)?;
    Ok(Value::bool_scalar(args[0].type_name() == name))
}

fn isnumeric(args: &[Value], _engine: &mut Engine) -> Result<Value, EvalError> {
    super::check_arity("isnumeric", args, 1)?;
    Ok(Value::bool_scalar(matches!(args[0], Value::Matrix(_))))
}

fn ischar(args: &[Value], _engine: &mut Engine) -> Result<Value, EvalError> {
    super::check_arity("ischar", args, 1)?;
    Ok(Value::bool_scalar(matches!(args[0], Value::String(_))))
}

/// This engine doesn't distinguish a `logical` class from `double` at
/// runtime (spec.md §3) — comparisons and `logical()` both just produce
/// 0/1-valued matrices, so `islogical` is necessarily conservative.
fn islogical(args: &[Value], _engine: &mut Engine) -> Result<Value, EvalError> {
    super::check_arity("islogical", args, 1)?;
    Ok(Value::bool_scalar(match &args[0] {
        Value::Matrix(m) => m.data.iter().all(|&v| v == 0.0 || v == 1.0),
        _ => false,
    }))
}

fn isstruct(args: &[Value], _engine: &mut Engine) -> Result<Value, EvalError> {
    super::check_arity("isstruct", args, 1)?;
    Ok(Value::bool_scalar(matches!(args[0], Value::Struct(_))))
}

fn iscell(args: &[Value], _engine: &mut Engine) -> Result<Value, EvalError> {
    super::check_arity("iscell", args, 1)?;
    Ok(Value::bool_scalar(matches!(args[0], Value::Cell(_))))
}

fn isnan(args: &[Value], _engine: &mut Engine) -> Result<Value, EvalError> {
    super::elementwise_unary("isnan", args, |x| if x.is_nan() { 1.0 } else { 0.0 })
}

fn isinf(args: &[Value], _engine: &mut Engine) -> Result<Value, EvalError> {
    super::elementwise_unary("isinf", args, |x| if x.is_infinite() { 1.0 } else { 0.0 })
}

fn isfinite(args: &[Value], _engine: &mut Engine) -> Result<Value, EvalError> {
    super::elementwise_unary("isfinite", args, |x| if x.is_finite() { 1.0 } else { 0.0 })
}

fn logical(args: &[Value], _engine: &mut Engine) -> Result<Value, EvalError> {
    super::elementwise_unary("logical", args, |x| if x != 0.0 { 1.0 } else { 0.0 })
}

fn double(args: &[Value], _engine: &mut Engine) -> Result<Value, EvalError> {
    super::check_arity("double", args, 1)?;
    match &args[0] {
        Value::Matrix(m) => Ok(Value::Matrix(m.clone())),
        Value::String(s) => Ok(Value::Matrix(Matrix::row_vec(crate::interpreter::str_to_codes(s)))),
        other => Err(EvalError::type_error("double", "numeric or string", other, 1)),
    }
}

fn char_fn(args: &[Value], _engine: &mut Engine) -> Result<Value, EvalError> {
    super::check_arity("char", args, 1)?;
    match &args[0] {
        Value::Matrix(m) => Ok(Value::String(crate::interpreter::codes_to_str(&m.data))),
        s @ Value::String(_) => Ok(s.clone()),
        other => Err(EvalError::type_error("char", "numeric", other, 1)),
    }
}

/// Builds a struct from alternating `'field', value` pairs.
fn struct_fn(args: &[Value], _engine: &mut Engine) -> Result<Value, EvalError> {
    if args.len() % 2 != 0 {
        return Err(EvalError::arity_error("struct", "an even number of", args.len()));
    }
    let mut map = indexmap::IndexMap::new();
    for pair in args.chunks(2) {
        let name = super::string_arg("struct", pair, 0)?.to_string();
        map.insert(name, pair[1].clone());
    }
    Ok(Value::Struct(map))
}

fn fieldnames(args: &[Value], _engine: &mut Engine) -> Result<Value, EvalError> {
    super::check_arity("fieldnames", args, 1)?;
    match &args[0] {
        Value::Struct(map) => {
            let names: Vec<Value> = map.keys().map(|k| Value::String(k.clone())).collect();
            let n = names.len();
            Ok(Value::Cell(Cell::new(n, 1, names)))
        }
        other => Err(EvalError::type_error("fieldnames", "struct", other, 1)),
    }
}

fn cell(args: &[Value], _engine: &mut Engine) -> Result<Value, EvalError> {
    let (r, c) = super::math::parse_shape_args("cell", args)?;
    Ok(Value::Cell(Cell::new(r, c, vec![Value::Empty; r * c])))
}

fn isvector(args: &[Value], _engine: &mut Engine) -> Result<Value, EvalError> {
    super::check_arity("isvector", args, 1)?;
    Ok(Value::bool_scalar(super::matrix_arg("isvector", args, 0)?.is_vector()))
}

fn isscalar(args: &[Value], _engine: &mut Engine) -> Result<Value, EvalError> {
    super::check_arity("isscalar", args, 1)?;
    Ok(Value::bool_scalar(super::matrix_arg("isscalar", args, 0)?.is_scalar()))
}

fn ismatrix(args: &[Value], _engine: &mut Engine) -> Result<Value, EvalError> {
    super::check_arity("ismatrix", args, 1)?;
    Ok(Value::bool_scalar(matches!(args[0], Value::Matrix(_))))
}

fn is_function_handle(args: &[Value], _engine: &mut Engine) -> Result<Value, EvalError> {
    super::check_arity("is_function_handle", args, 1)?;
    Ok(Value::bool_scalar(matches!(args[0], Value::FuncHandle(_))))
}

// ABOUTME: String builtins - conversion, comparison, splitting, and regex-backed replace

use std::collections::HashMap;

use super::BuiltinFn;
use crate::error::EvalError;
use crate::interpreter::Engine;
use crate::value::{format_number, Cell, Matrix, Value};

pub fn register(table: &mut HashMap<&'static str, BuiltinFn>) {
    table.insert("num2str", num2str as BuiltinFn);
    table.insert("str2num", str2num as BuiltinFn);
    table.insert("str2double", str2num as BuiltinFn);
    table.insert("strcmp", strcmp as BuiltinFn);
    table.insert("strcmpi", strcmpi as BuiltinFn);
    table.insert("strcat", strcat as BuiltinFn);
    table.insert("strsplit", strsplit as BuiltinFn);
    table.insert("sprintf", sprintf as BuiltinFn);
    table.insert("upper", upper as BuiltinFn);
    table.insert("lower", lower as BuiltinFn);
    table.insert("strtrim", strtrim as BuiltinFn);
    table.insert("contains", contains as BuiltinFn);
    table.insert("startsWith", starts_with as BuiltinFn);
    table.insert("endsWith", ends_with as BuiltinFn);
    table.insert("replace", replace as BuiltinFn);
    table.insert("regexprep", regexprep as BuiltinFn);
    table.insert("strrep", replace as BuiltinFn);
}

fn num2str(args: &[Value], _engine: &mut Engine) -> Result<Value, EvalError> {
    super::check_arity_range("num2str", args, 1, 2)?;
    let v = super::scalar_arg("num2str", args, 0)?;
    if args.len() == 2 {
        let precision = super::scalar_arg("num2str", args, 1)? as usize;
        return Ok(Value::String(format!("{:.*}", precision, v)));
    }
    Ok(Value::String(format_number(v)))
}

fn str2num(args: &[Value], _engine: &mut Engine) -> Result<Value, EvalError> {
    super::check_arity("str2num", args, 1)?;
    let s = super::string_arg("str2num", args, 0)?;
    match s.trim().parse::<f64>() {
        Ok(v) => Ok(Value::scalar(v)),
        Err(_) => Ok(Value::Matrix(Matrix::empty())),
    }
}

fn strcmp(args: &[Value], _engine: &mut Engine) -> Result<Value, EvalError> {
    super::check_arity("strcmp", args, 2)?;
    let a = super::string_arg("strcmp", args, 0)?;
    let b = super::string_arg("strcmp", args, 1)?;
    Ok(Value::bool_scalar(a == b))
}

fn strcmpi(args: &[Value], _engine: &mut Engine) -> Result<Value, EvalError> {
    super::check_arity("strcmpi", args, 2)?;
    let a = super::string_arg("strcmpi", args, 0)?;
    let b = super::string_arg("strcmpi", args, 1)?;
    Ok(Value::bool_scalar(a.eq_ignore_ascii_case(b)))
}

fn strcat(args: &[Value], _engine: &mut Engine) -> Result<Value, EvalError> {
    super::check_arity_range("strcat", args, 1, usize::MAX)?;
    let mut out = String::new();
    for v in args {
        match v {
            Value::String(s) => out.push_str(s.trim_end()),
            other => return Err(EvalError::type_error("strcat", "string", other, 1)),
        }
    }
    Ok(Value::String(out))
}

fn strsplit(args: &[Value], _engine: &mut Engine) -> Result<Value, EvalError> {
    super::check_arity_range("strsplit", args, 1, 2)?;
    let s = super::string_arg("strsplit", args, 0)?;
    let delim = if args.len() == 2 { super::string_arg("strsplit", args, 1)?.to_string() } else { " ".to_string() };
    let parts: Vec<Value> = s.split(delim.as_str()).map(|p| Value::String(p.to_string())).collect();
    let n = parts.len();
    Ok(Value::Cell(Cell::new(1, n, parts)))
}

fn sprintf(args: &[Value], _engine: &mut Engine) -> Result<Value, EvalError> {
    super::check_arity_range("sprintf", args, 1, usize::MAX)?;
    let fmt = super::string_arg("sprintf", args, 0)?;
    Ok(Value::String(super::format_string(fmt, &args[1..])?))
}

fn upper(args: &[Value], _engine: &mut Engine) -> Result<Value, EvalError> {
    super::check_arity("upper", args, 1)?;
    Ok(Value::String(super::string_arg("upper", args, 0)?.to_uppercase()))
}

fn lower(args: &[Value], _engine: &mut Engine) -> Result<Value, EvalError> {
    super::check_arity("lower", args, 1)?;
    Ok(Value::String(super::string_arg("lower", args, 0)?.to_lowercase()))
}

fn strtrim(args: &[Value], _engine: &mut Engine) -> Result<Value, EvalError> {
    super::check_arity("strtrim", args, 1)?;
    Ok(Value::String(super::string_arg("strtrim", args, 0)?.trim().to_string()))
}

fn contains(args: &[Value], _engine: &mut Engine) -> Result<Value, EvalError> {
    super::check_arity("contains", args, 2)?;
    let s = super::string_arg("contains", args, 0)?;
    let pat = super::string_arg("contains", args, 1)?;
    Ok(Value::bool_scalar(s.contains(pat)))
}

fn starts_with(args: &[Value], _engine: &mut Engine) -> Result<Value, EvalError> {
    super::check_arity("startsWith", args, 2)?;
    let s = super::string_arg("startsWith", args, 0)?;
    let pat = super::string_arg("startsWith", args, 1)?;
    Ok(Value::bool_scalar(s.starts_with(pat)))
}

fn ends_with(args: &[Value], _engine: &mut Engine) -> Result<Value, EvalError> {
    super::check_arity("endsWith", args, 2)?;
    let s = super::string_arg("endsWith", args, 0)?;
    let pat = super::string_arg("endsWith", args, 1)?;
    Ok(Value::bool_scalar(s.ends_with(pat)))
}

fn replace(args: &[Value], _engine: &mut Engine) -> Result<Value, EvalError> {
    super::check_arity("replace", args, 3)?;
    let s = super::string_arg("replace", args, 0)?;
    let from = super::string_arg("replace", args, 1)?;
    let to = super::string_arg("replace", args, 2)?;
    Ok(Value::String(s.replace(from, to)))
}

fn regexprep(args: &[Value], _engine: &mut Engine) -> Result<Value, EvalError> {
    super::check_arity("regexprep", args, 3)?;
    let s = super::string_arg("regexprep", args, 0)?;
    let pattern = super::string_arg("regexprep", args, 1)?;
    let replacement = super::string_arg("regexprep", args, 2)?;
    let re = regex::Regex::new(pattern).map_err(|e| EvalError::runtime_error("regexprep", e.to_string()))?;
    Ok(Value::String(re.replace_all(s, replacement).into_owned()))
}

// ABOUTME: Linear-algebra builtins over the dense matrix kernels

use std::collections::HashMap;

use super::BuiltinFn;
use crate::error::EvalError;
use crate::interpreter::Engine;
use crate::matrix;
use crate::value::{Cell, Matrix, Value};

pub fn register(table: &mut HashMap<&'static str, BuiltinFn>) {
    table.insert("det", det as BuiltinFn);
    table.insert("inv", inv as BuiltinFn);
    table.insert("trace", trace as BuiltinFn);
    table.insert("rank", rank as BuiltinFn);
    table.insert("norm", norm as BuiltinFn);
    table.insert("dot", dot as BuiltinFn);
    table.insert("cross", cross as BuiltinFn);
    table.insert("eig", eig as BuiltinFn);
    table.insert("svd", svd as BuiltinFn);
    table.insert("lu", lu as BuiltinFn);
    table.insert("qr", qr as BuiltinFn);
    table.insert("chol", chol as BuiltinFn);
    table.insert("pinv", pinv as BuiltinFn);
    table.insert("expm", expm as BuiltinFn);
    table.insert("logm", logm as BuiltinFn);
    table.insert("sqrtm", sqrtm as BuiltinFn);
    table.insert("linsolve", linsolve as BuiltinFn);
    table.insert("mldivide", linsolve as BuiltinFn);
}

fn det(args: &[Value], _engine: &mut Engine) -> Result<Value, EvalError> {
    super::check_arity("det", args, 1)?;
    Ok(Value::scalar(matrix::det(super::matrix_arg("det", args, 0)?)?))
}

fn inv(args: &[Value], _engine: &mut Engine) -> Result<Value, EvalError> {
    super::check_arity("inv", args, 1)?;
    Ok(Value::Matrix(matrix::inv(super::matrix_arg("inv", args, 0)?)?))
}

fn trace(args: &[Value], _engine: &mut Engine) -> Result<Value, EvalError> {
    super::check_arity("trace", args, 1)?;
    Ok(Value::scalar(matrix::trace(super::matrix_arg("trace", args, 0)?)?))
}

fn rank(args: &[Value], _engine: &mut Engine) -> Result<Value, EvalError> {
    super::check_arity("rank", args, 1)?;
    Ok(Value::scalar(matrix::rank(super::matrix_arg("rank", args, 0)?) as f64))
}

fn norm(args: &[Value], _engine: &mut Engine) -> Result<Value, EvalError> {
    super::check_arity_range("norm", args, 1, 2)?;
    let m = super::matrix_arg("norm", args, 0)?;
    let p = if args.len() == 2 {
        match &args[1] {
            Value::String(s) if s == "inf" || s == "Inf" => Some(f64::INFINITY),
            other => Some(other.as_scalar().ok_or_else(|| EvalError::type_error("norm", "scalar", other, 2))?),
        }
    } else {
        None
    };
    Ok(Value::scalar(matrix::norm(m, p)))
}

fn dot(args: &[Value], _engine: &mut Engine) -> Result<Value, EvalError> {
    super::check_arity("dot", args, 2)?;
    let a = super::matrix_arg("dot", args, 0)?;
    let b = super::matrix_arg("dot", args, 1)?;
    if a.data.len() != b.data.len() {
        return Err(EvalError::DimensionMismatch("dot: vectors must be the same length".into()));
    }
    Ok(Value::scalar(a.data.iter().zip(&b.data).map(|(x, y)| x * y).sum()))
}

fn cross(args: &[Value], _engine: &mut Engine) -> Result<Value, EvalError> {
    super::check_arity("cross", args, 2)?;
    let a = super::matrix_arg("cross", args, 0)?;
    let b = super::matrix_arg("cross", args, 1)?;
    if a.data.len() != 3 || b.data.len() != 3 {
        return Err(EvalError::DimensionMismatch("cross: vectors must have 3 elements".into()));
    }
    let data = vec![
        a.data[1] * b.data[2] - a.data[2] * b.data[1],
        a.data[2] * b.data[0] - a.data[0] * b.data[2],
        a.data[0] * b.data[1] - a.data[1] * b.data[0],
    ];
    Ok(Value::Matrix(if a.rows == 1 { Matrix::row_vec(data) } else { Matrix::col_vec(data) }))
}

/// Eigenvalues as a column vector, ascending. Full eigendecomposition
/// (`matrix::eig_full`) backs `expm`/`logm`-adjacent work internally but
/// isn't exposed as `[V,D] = eig(A)` here: `BuiltinFn` has no visibility
/// into `nargout`, unlike `lu`/`qr` whose two outputs are equally useful
/// standalone and so can safely always pack into a cell.
fn eig(args: &[Value], _engine: &mut Engine) -> Result<Value, EvalError> {
    super::check_arity("eig", args, 1)?;
    let m = super::matrix_arg("eig", args, 0)?;
    Ok(Value::Matrix(Matrix::col_vec(matrix::eigenvalues(m)?)))
}

fn svd(args: &[Value], _engine: &mut Engine) -> Result<Value, EvalError> {
    super::check_arity("svd", args, 1)?;
    let m = super::matrix_arg("svd", args, 0)?;
    let vals = matrix::svd_values(m)?;
    Ok(Value::Matrix(Matrix::col_vec(vals)))
}

fn lu(args: &[Value], _engine: &mut Engine) -> Result<Value, EvalError> {
    super::check_arity("lu", args, 1)?;
    let m = super::matrix_arg("lu", args, 0)?;
    let (l, u) = matrix::lu(m)?;
    Ok(Value::Cell(Cell::new(1, 2, vec![Value::Matrix(l), Value::Matrix(u)])))
}

fn qr(args: &[Value], _engine: &mut Engine) -> Result<Value, EvalError> {
    super::check_arity("qr", args, 1)?;
    let m = super::matrix_arg("qr", args, 0)?;
    let (q, r) = matrix::qr(m);
    Ok(Value::Cell(Cell::new(1, 2, vec![Value::Matrix(q), Value::Matrix(r)])))
}

fn chol(args: &[Value], _engine: &mut Engine) -> Result<Value, EvalError> {
    super::check_arity("chol", args, 1)?;
    Ok(Value::Matrix(matrix::chol(super::matrix_arg("chol", args, 0)?)?))
}

fn pinv(args: &[Value], _engine: &mut Engine) -> Result<Value, EvalError> {
    super::check_arity("pinv", args, 1)?;
    Ok(Value::Matrix(matrix::pinv(super::matrix_arg("pinv", args, 0)?)?))
}

fn expm(args: &[Value], _engine: &mut Engine) -> Result<Value, EvalError> {
    super::check_arity("expm", args, 1)?;
    Ok(Value::Matrix(matrix::expm(super::matrix_arg("expm", args, 0)?)?))
}

fn logm(args: &[Value], _engine: &mut Engine) -> Result<Value, EvalError> {
    super::check_arity("logm", args, 1)?;
    Ok(Value::Matrix(matrix::logm(super::matrix_arg("logm", args, 0)?)?))
}

fn sqrtm(args: &[Value], _engine: &mut Engine) -> Result<Value, EvalError> {
    super::check_arity("sqrtm", args, 1)?;
    Ok(Value::Matrix(matrix::sqrtm(super::matrix_arg("sqrtm", args, 0)?)?))
}

fn linsolve(args: &[Value], _engine: &mut Engine) -> Result<Value, EvalError> {
    super::check_arity("linsolve", args, 2)?;
    let a = super::matrix_arg("linsolve", args, 0)?;
    let b = super::matrix_arg("linsolve", args, 1)?;
    if a.rows == a.cols {
        Ok(Value::Matrix(matrix::matmul(&matrix::inv(a)?, b)?))
    } else {
        Ok(Value::Matrix(matrix::matmul(&matrix::pinv(a)?, b)?))
    }
}

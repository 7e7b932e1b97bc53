// ABOUTME: Shape queries, rearrangement, and the reduction family (sum/prod/min/max/...)

use std::collections::HashMap;

use super::BuiltinFn;
use crate::error::EvalError;
use crate::interpreter::Engine;
use crate::value::{Matrix, Value};

pub fn register(table: &mut HashMap<&'static str, BuiltinFn>) {
    table.insert("size", size as BuiltinFn);
    table.insert("length", length as BuiltinFn);
    table.insert("numel", numel as BuiltinFn);
    table.insert("reshape", reshape as BuiltinFn);
    table.insert("repmat", repmat as BuiltinFn);
    table.insert("transpose", transpose as BuiltinFn);
    table.insert("diag", diag as BuiltinFn);
    table.insert("horzcat", horzcat as BuiltinFn);
    table.insert("vertcat", vertcat as BuiltinFn);
    table.insert("cat", cat as BuiltinFn);
    table.insert("sort", sort as BuiltinFn);
    table.insert("find", find as BuiltinFn);
    table.insert("any", any as BuiltinFn);
    table.insert("all", all as BuiltinFn);
    table.insert("isempty", isempty as BuiltinFn);
    table.insert("fliplr", fliplr as BuiltinFn);
    table.insert("flipud", flipud as BuiltinFn);
    table.insert("unique", unique as BuiltinFn);

    table.insert("sum", sum as BuiltinFn);
    table.insert("prod", prod as BuiltinFn);
    table.insert("cumsum", cumsum as BuiltinFn);
    table.insert("cumprod", cumprod as BuiltinFn);
    table.insert("min", min_fn as BuiltinFn);
    table.insert("max", max_fn as BuiltinFn);
    table.insert("mean", mean as BuiltinFn);
    table.insert("std", std_fn as BuiltinFn);
    table.insert("var", var as BuiltinFn);
    table.insert("median", median as BuiltinFn);
}

fn size(args: &[Value], _engine: &mut Engine) -> Result<Value, EvalError> {
    super::check_arity_range("size", args, 1, 2)?;
    let (r, c) = dims_of(&args[0]);
    if args.len() == 2 {
        let dim = super::scalar_arg("size", args, 1)? as usize;
        return Ok(Value::scalar(if dim == 1 { r as f64 } else { c as f64 }));
    }
    Ok(Value::Matrix(Matrix::row_vec(vec![r as f64, c as f64])))
}

fn dims_of(v: &Value) -> (usize, usize) {
    match v {
        Value::Matrix(m) => (m.rows, m.cols),
        Value::Cell(c) => (c.rows, c.cols),
        Value::String(s) => (1, s.chars().count()),
        Value::Struct(_) | Value::FuncHandle(_) => (1, 1),
        Value::Empty => (0, 0),
    }
}

fn length(args: &[Value], _engine: &mut Engine) -> Result<Value, EvalError> {
    super::check_arity("length", args, 1)?;
    let (r, c) = dims_of(&args[0]);
    Ok(Value::scalar(r.max(c) as f64))
}

fn numel(args: &[Value], _engine: &mut Engine) -> Result<Value, EvalError> {
    super::check_arity("numel", args, 1)?;
    let (r, c) = dims_of(&args[0]);
    Ok(Value::scalar((r * c) as f64))
}

fn reshape(args: &[Value], _engine: &mut Engine) -> Result<Value, EvalError> {
    super::check_arity("reshape", args, 3)?;
    let m = super::matrix_arg("reshape", args, 0)?;
    let r = super::scalar_arg("reshape", args, 1)? as usize;
    let c = super::scalar_arg("reshape", args, 2)? as usize;
    if r * c != m.data.len() {
        return Err(EvalError::DimensionMismatch(format!(
            "reshape: cannot reshape {}x{} to {r}x{c}",
            m.rows, m.cols
        )));
    }
    // Column-major element order, matching MATLAB's reshape semantics.
    let mut data = vec![0.0; r * c];
    for (lin, v) in column_major_iter(m).enumerate() {
        let row = lin % r;
        let col = lin / r;
        data[row * c + col] = v;
    }
    Ok(Value::Matrix(Matrix::new(r, c, data)))
}

fn column_major_iter(m: &Matrix) -> impl Iterator<Item = f64> + '_ {
    (0..m.cols).flat_map(move |c| (0..m.rows).map(move |r| m.get(r, c)))
}

fn repmat(args: &[Value], _engine: &mut Engine) -> Result<Value, EvalError> {
    super::check_arity("repmat", args, 3)?;
    let m = super::matrix_arg("repmat", args, 0)?;
    let rt = super::scalar_arg("repmat", args, 1)? as usize;
    let ct = super::scalar_arg("repmat", args, 2)? as usize;
    let mut out = Matrix::zeros(m.rows * rt, m.cols * ct);
    for br in 0..rt {
        for bc in 0..ct {
            for r in 0..m.rows {
                for c in 0..m.cols {
                    out.set(br * m.rows + r, bc * m.cols + c, m.get(r, c));
                }
            }
        }
    }
    Ok(Value::Matrix(out))
}

fn transpose(args: &[Value], _engine: &mut Engine) -> Result<Value, EvalError> {
    super::check_arity("transpose", args, 1)?;
    Ok(Value::Matrix(super::matrix_arg("transpose", args, 0)?.transpose()))
}

fn diag(args: &[Value], _engine: &mut Engine) -> Result<Value, EvalError> {
    super::check_arity("diag", args, 1)?;
    let m = super::matrix_arg("diag", args, 0)?;
    if m.is_vector() && !m.is_scalar() {
        let n = m.data.len();
        let mut out = Matrix::zeros(n, n);
        for (i, &v) in m.data.iter().enumerate() {
            out.set(i, i, v);
        }
        return Ok(Value::Matrix(out));
    }
    let n = m.rows.min(m.cols);
    let data: Vec<f64> = (0..n).map(|i| m.get(i, i)).collect();
    Ok(Value::Matrix(Matrix::col_vec(data)))
}

fn horzcat(args: &[Value], _engine: &mut Engine) -> Result<Value, EvalError> {
    let mats: Vec<Matrix> = args.iter().map(to_matrix_for_cat).collect::<Result<_, _>>()?;
    let refs: Vec<&Matrix> = mats.iter().collect();
    Ok(Value::Matrix(crate::matrix::horzcat(&refs)?))
}

fn vertcat(args: &[Value], _engine: &mut Engine) -> Result<Value, EvalError> {
    let mats: Vec<Matrix> = args.iter().map(to_matrix_for_cat).collect::<Result<_, _>>()?;
    let refs: Vec<&Matrix> = mats.iter().collect();
    Ok(Value::Matrix(crate::matrix::vertcat(&refs)?))
}

fn to_matrix_for_cat(v: &Value) -> Result<Matrix, EvalError> {
    match v {
        Value::Matrix(m) => Ok(m.clone()),
        Value::String(s) => Ok(Matrix::row_vec(crate::interpreter::str_to_codes(s))),
        other => Err(EvalError::type_error("cat", "numeric", other, 1)),
    }
}

fn cat(args: &[Value], engine: &mut Engine) -> Result<Value, EvalError> {
    super::check_arity_range("cat", args, 2, usize::MAX)?;
    let dim = super::scalar_arg("cat", args, 0)? as usize;
    if dim == 1 {
        vertcat(&args[1..], engine)
    } else {
        horzcat(&args[1..], engine)
    }
}

fn sort(args: &[Value], _engine: &mut Engine) -> Result<Value, EvalError> {
    super::check_arity_range("sort", args, 1, 2)?;
    let m = super::matrix_arg("sort", args, 0)?;
    let descending = args.len() == 2 && matches!(&args[1], Value::String(s) if s == "descend");
    let mut data = m.data.clone();
    data.sort_by(|a, b| a.partial_cmp(b).unwrap());
    if descending {
        data.reverse();
    }
    Ok(Value::Matrix(Matrix::new(m.rows, m.cols, data)))
}

fn find(args: &[Value], _engine: &mut Engine) -> Result<Value, EvalError> {
    super::check_arity("find", args, 1)?;
    let m = super::matrix_arg("find", args, 0)?;
    let indices: Vec<f64> = column_major_iter(m)
        .enumerate()
        .filter(|(_, v)| *v != 0.0)
        .map(|(i, _)| (i + 1) as f64)
        .collect();
    Ok(Value::Matrix(if m.rows == 1 { Matrix::row_vec(indices) } else { Matrix::col_vec(indices) }))
}

fn any(args: &[Value], _engine: &mut Engine) -> Result<Value, EvalError> {
    super::check_arity("any", args, 1)?;
    let m = super::matrix_arg("any", args, 0)?;
    Ok(Value::bool_scalar(m.data.iter().any(|&v| v != 0.0)))
}

fn all(args: &[Value], _engine: &mut Engine) -> Result<Value, EvalError> {
    super::check_arity("all", args, 1)?;
    let m = super::matrix_arg("all", args, 0)?;
    Ok(Value::bool_scalar(!m.data.is_empty() && m.data.iter().all(|&v| v != 0.0)))
}

fn isempty(args: &[Value], _engine: &mut Engine) -> Result<Value, EvalError> {
    super::check_arity("isempty", args, 1)?;
    Ok(Value::bool_scalar(args[0].is_empty()))
}

fn fliplr(args: &[Value], _engine: &mut Engine) -> Result<Value, EvalError> {
    super::check_arity("fliplr", args, 1)?;
    let m = super::matrix_arg("fliplr", args, 0)?;
    let mut out = Matrix::zeros(m.rows, m.cols);
    for r in 0..m.rows {
        for c in 0..m.cols {
            out.set(r, m.cols - 1 - c, m.get(r, c));
        }
    }
    Ok(Value::Matrix(out))
}

fn flipud(args: &[Value], _engine: &mut Engine) -> Result<Value, EvalError> {
    super::check_arity("flipud", args, 1)?;
    let m = super::matrix_arg("flipud", args, 0)?;
    let mut out = Matrix::zeros(m.rows, m.cols);
    for r in 0..m.rows {
        for c in 0..m.cols {
            out.set(m.rows - 1 - r, c, m.get(r, c));
        }
    }
    Ok(Value::Matrix(out))
}

fn unique(args: &[Value], _engine: &mut Engine) -> Result<Value, EvalError> {
    super::check_arity("unique", args, 1)?;
    let m = super::matrix_arg("unique", args, 0)?;
    let mut data = m.data.clone();
    data.sort_by(|a, b| a.partial_cmp(b).unwrap());
    data.dedup();
    Ok(Value::Matrix(Matrix::col_vec(data)))
}

// ----------------------------- reductions -----------------------------

/// Column-wise reduction for matrices (MATLAB default, `dim` omitted),
/// whole-vector reduction when the argument is a row or column vector.
fn reduce_columns(m: &Matrix, f: impl Fn(&[f64]) -> f64) -> Matrix {
    if m.is_vector() {
        return Matrix::scalar(f(&m.data));
    }
    let data: Vec<f64> = (0..m.cols).map(|c| f(&m.column(c))).collect();
    Matrix::row_vec(data)
}

fn sum(args: &[Value], _engine: &mut Engine) -> Result<Value, EvalError> {
    super::check_arity("sum", args, 1)?;
    let m = super::matrix_arg("sum", args, 0)?;
    Ok(Value::Matrix(reduce_columns(m, |xs| xs.iter().sum())))
}

fn prod(args: &[Value], _engine: &mut Engine) -> Result<Value, EvalError> {
    super::check_arity("prod", args, 1)?;
    let m = super::matrix_arg("prod", args, 0)?;
    Ok(Value::Matrix(reduce_columns(m, |xs| xs.iter().product())))
}

fn cumulative(m: &Matrix, f: impl Fn(f64, f64) -> f64, identity: f64) -> Matrix {
    if m.is_vector() {
        let mut acc = identity;
        let data: Vec<f64> = m.data.iter().map(|&v| { acc = f(acc, v); acc }).collect();
        return Matrix::new(m.rows, m.cols, data);
    }
    let mut out = Matrix::zeros(m.rows, m.cols);
    for c in 0..m.cols {
        let mut acc = identity;
        for r in 0..m.rows {
            acc = f(acc, m.get(r, c));
            out.set(r, c, acc);
        }
    }
    out
}

fn cumsum(args: &[Value], _engine: &mut Engine) -> Result<Value, EvalError> {
    super::check_arity("cumsum", args, 1)?;
    let m = super::matrix_arg("cumsum", args, 0)?;
    Ok(Value::Matrix(cumulative(m, |a, b| a + b, 0.0)))
}

fn cumprod(args: &[Value], _engine: &mut Engine) -> Result<Value, EvalError> {
    super::check_arity("cumprod", args, 1)?;
    let m = super::matrix_arg("cumprod", args, 0)?;
    Ok(Value::Matrix(cumulative(m, |a, b| a * b, 1.0)))
}

fn min_fn(args: &[Value], _engine: &mut Engine) -> Result<Value, EvalError> {
    minmax("min", args, f64::min)
}

fn max_fn(args: &[Value], _engine: &mut Engine) -> Result<Value, EvalError> {
    minmax("max", args, f64::max)
}

fn minmax(name: &str, args: &[Value], pick: impl Fn(f64, f64) -> f64 + Copy) -> Result<Value, EvalError> {
    super::check_arity_range(name, args, 1, 2)?;
    if args.len() == 2 {
        return super::elementwise_binary(name, args, pick);
    }
    let m = super::matrix_arg(name, args, 0)?;
    Ok(Value::Matrix(reduce_columns(m, |xs| xs.iter().copied().fold(xs[0], pick))))
}

fn mean(args: &[Value], _engine: &mut Engine) -> Result<Value, EvalError> {
    super::check_arity("mean", args, 1)?;
    let m = super::matrix_arg("mean", args, 0)?;
    Ok(Value::Matrix(reduce_columns(m, |xs| xs.iter().sum::<f64>() / xs.len() as f64)))
}

fn variance_of(xs: &[f64]) -> f64 {
    let n = xs.len() as f64;
    if n <= 1.0 {
        return 0.0;
    }
    let mean = xs.iter().sum::<f64>() / n;
    xs.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0)
}

fn std_fn(args: &[Value], _engine: &mut Engine) -> Result<Value, EvalError> {
    super::check_arity("std", args, 1)?;
    let m = super::matrix_arg("std", args, 0)?;
    Ok(Value::Matrix(reduce_columns(m, |xs| variance_of(xs).sqrt())))
}

fn var(args: &[Value], _engine: &mut Engine) -> Result<Value, EvalError> {
    super::check_arity("var", args, 1)?;
    let m = super::matrix_arg("var", args, 0)?;
    Ok(Value::Matrix(reduce_columns(m, variance_of)))
}

fn median(args: &[Value], _engine: &mut Engine) -> Result<Value, EvalError> {
    super::check_arity("median", args, 1)?;
    let m = super::matrix_arg("median", args, 0)?;
    Ok(Value::Matrix(reduce_columns(m, |xs| {
        let mut sorted = xs.to_vec();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap());
        let n = sorted.len();
        if n % 2 == 0 {
            (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
        } else {
            sorted[n / 2]
        }
    })))
}

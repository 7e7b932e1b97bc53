// ABOUTME: Runtime value model - matrix, string, cell, struct, function handle

use crate::ast::{Expr, FunctionDef};
use crate::env::Environment;
use indexmap::IndexMap;
use std::fmt;
use std::rc::Rc;

/// Dense row-major f64 matrix. Scalars are 1x1, logicals are 0/1-valued
/// matrices (spec.md §3 — the type system does not distinguish them at
/// runtime, only `class()`'s textual label does).
#[derive(Debug, Clone, PartialEq)]
pub struct Matrix {
    pub rows: usize,
    pub cols: usize,
    pub data: Vec<f64>,
}

impl Matrix {
    pub fn new(rows: usize, cols: usize, data: Vec<f64>) -> Self {
        debug_assert_eq!(data.len(), rows * cols);
        Self { rows, cols, data }
    }

    pub fn scalar(value: f64) -> Self {
        Self { rows: 1, cols: 1, data: vec![value] }
    }

    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self { rows, cols, data: vec![0.0; rows * cols] }
    }

    pub fn empty() -> Self {
        Self { rows: 0, cols: 0, data: Vec::new() }
    }

    pub fn is_empty(&self) -> bool {
        self.rows == 0 || self.cols == 0
    }

    pub fn is_scalar(&self) -> bool {
        self.rows == 1 && self.cols == 1
    }

    pub fn to_scalar(&self) -> Option<f64> {
        if self.is_scalar() {
            Some(self.data[0])
        } else {
            None
        }
    }

    pub fn is_vector(&self) -> bool {
        self.rows == 1 || self.cols == 1
    }

    /// Row-major element access (internal storage order).
    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.data[row * self.cols + col]
    }

    pub fn set(&mut self, row: usize, col: usize, value: f64) {
        self.data[row * self.cols + col] = value;
    }

    pub fn row_vec(data: Vec<f64>) -> Self {
        let cols = data.len();
        Self { rows: 1, cols, data }
    }

    pub fn col_vec(data: Vec<f64>) -> Self {
        let rows = data.len();
        Self { rows, cols: 1, data }
    }

    pub fn column(&self, c: usize) -> Vec<f64> {
        (0..self.rows).map(|r| self.get(r, c)).collect()
    }

    pub fn row(&self, r: usize) -> Vec<f64> {
        (0..self.cols).map(|c| self.get(r, c)).collect()
    }

    pub fn transpose(&self) -> Matrix {
        let mut out = Matrix::zeros(self.cols, self.rows);
        for r in 0..self.rows {
            for c in 0..self.cols {
                out.set(c, r, self.get(r, c));
            }
        }
        out
    }

    pub fn map(&self, f: impl Fn(f64) -> f64) -> Matrix {
        Matrix::new(self.rows, self.cols, self.data.iter().map(|&v| f(v)).collect())
    }

    pub fn all_true(&self) -> bool {
        !self.data.is_empty() && self.data.iter().all(|&v| v != 0.0)
    }
}

impl fmt::Display for Matrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return write!(f, "[](0x0)");
        }
        if let Some(v) = self.to_scalar() {
            return write!(f, "{}", format_number(v));
        }
        for r in 0..self.rows {
            for c in 0..self.cols {
                if c > 0 {
                    write!(f, "  ")?;
                }
                write!(f, "{}", format_number(self.get(r, c)))?;
            }
            if r + 1 < self.rows {
                writeln!(f)?;
            }
        }
        Ok(())
    }
}

/// Mirrors MATLAB's `short` format: integers print bare, others to 4 decimals.
pub fn format_number(v: f64) -> String {
    if v.is_nan() {
        "NaN".to_string()
    } else if v.is_infinite() {
        if v > 0.0 { "Inf".to_string() } else { "-Inf".to_string() }
    } else if v.fract() == 0.0 && v.abs() < 1e15 {
        format!("{}", v as i64)
    } else {
        format!("{:.4}", v)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    pub rows: usize,
    pub cols: usize,
    pub data: Vec<Value>,
}

impl Cell {
    pub fn new(rows: usize, cols: usize, data: Vec<Value>) -> Self {
        Self { rows, cols, data }
    }

    pub fn get(&self, row: usize, col: usize) -> &Value {
        &self.data[row * self.cols + col]
    }
}

/// A first-class function handle: a named builtin, a named user function
/// resolved at call time, or an anonymous closure capturing its defining
/// environment (spec.md §3, §4.2).
#[derive(Debug, Clone)]
pub enum FuncHandle {
    Builtin(String),
    Named(String),
    Closure {
        params: Vec<String>,
        body: Box<Expr>,
        env: Rc<Environment>,
    },
}

impl PartialEq for FuncHandle {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (FuncHandle::Builtin(a), FuncHandle::Builtin(b)) => a == b,
            (FuncHandle::Named(a), FuncHandle::Named(b)) => a == b,
            (FuncHandle::Closure { .. }, FuncHandle::Closure { .. }) => false,
            _ => false,
        }
    }
}

impl fmt::Display for FuncHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FuncHandle::Builtin(name) => write!(f, "@{}", name),
            FuncHandle::Named(name) => write!(f, "@{}", name),
            FuncHandle::Closure { params, .. } => write!(f, "@({})", params.join(",")),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Matrix(Matrix),
    String(String),
    Cell(Cell),
    Struct(IndexMap<String, Value>),
    FuncHandle(FuncHandle),
    Empty,
}

impl Value {
    pub fn scalar(v: f64) -> Self {
        Value::Matrix(Matrix::scalar(v))
    }

    pub fn bool_scalar(b: bool) -> Self {
        Value::Matrix(Matrix::scalar(if b { 1.0 } else { 0.0 }))
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Matrix(_) => "double",
            Value::String(_) => "char",
            Value::Cell(_) => "cell",
            Value::Struct(_) => "struct",
            Value::FuncHandle(_) => "function_handle",
            Value::Empty => "double",
        }
    }

    pub fn as_matrix(&self) -> Option<&Matrix> {
        match self {
            Value::Matrix(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_scalar(&self) -> Option<f64> {
        match self {
            Value::Matrix(m) => m.to_scalar(),
            _ => None,
        }
    }

    /// MATLAB truthiness: nonzero and non-empty, all-elements-true for matrices.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Matrix(m) => m.all_true(),
            Value::String(s) => !s.is_empty(),
            Value::Empty => false,
            Value::Cell(c) => !c.data.is_empty(),
            Value::Struct(_) => true,
            Value::FuncHandle(_) => true,
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Value::Matrix(m) => m.is_empty(),
            Value::String(s) => s.is_empty(),
            Value::Cell(c) => c.data.is_empty(),
            Value::Empty => true,
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Matrix(m) => write!(f, "{}", m),
            Value::String(s) => write!(f, "{}", s),
            Value::Cell(c) => {
                writeln!(f, "{{")?;
                for r in 0..c.rows {
                    for col in 0..c.cols {
                        writeln!(f, "  [{},{}] = {}", r + 1, col + 1, c.get(r, col))?;
                    }
                }
                write!(f, "}}")
            }
            Value::Struct(fields) => {
                writeln!(f, "struct with fields:")?;
                for (k, v) in fields {
                    writeln!(f, "  {}: {}", k, v)?;
                }
                Ok(())
            }
            Value::FuncHandle(h) => write!(f, "{}", h),
            Value::Empty => write!(f, "[]"),
        }
    }
}

/// Format a value the way the REPL prints `name = ...` / `ans = ...` blocks.
pub fn format_assignment(name: &str, value: &Value) -> String {
    match value {
        Value::Matrix(m) if m.is_scalar() => format!("{} = {}", name, m),
        Value::Matrix(m) if !m.is_empty() => format!("{} =\n\n{}\n", name, m),
        Value::Matrix(_) => format!("{} = [](0x0)", name),
        Value::String(s) => format!("{} = {}", name, s),
        other => format!("{} =\n{}", name, other),
    }
}

pub type UserFunctionTable = std::collections::HashMap<String, Rc<FunctionDef>>;

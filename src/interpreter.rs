// ABOUTME: Tree-walking evaluator - control flow, indexing/assignment, user function calls

use std::collections::HashMap;
use std::rc::Rc;

use crate::ast::*;
use crate::builtins::{self, BuiltinFn};
use crate::env::Environment;
use crate::error::{EngineError, EvalError, Signal};
use crate::matrix;
use crate::parser::parse;
use crate::plot::Figure;
use crate::value::{format_assignment, Cell, FuncHandle, Matrix, UserFunctionTable, Value};

/// The language engine: global scope, user-function table, current figure,
/// `ans` slot, output/plot callbacks (spec.md §4.4, §6).
pub struct Engine {
    pub global: Rc<Environment>,
    pub functions: UserFunctionTable,
    pub builtins: HashMap<&'static str, BuiltinFn>,
    pub figure: Figure,
    next_figure_id: u32,
    /// Opaque monotonically increasing tick counter bumped by the embedder,
    /// not `std::time::Instant` — keeps `execute()` deterministic and
    /// portable to a clockless embedder (SPEC_FULL.md §13).
    pub tic_mark: Option<u64>,
    pub clock: u64,
    end_stack: Vec<usize>,
    rng_state: u64,
    output_cb: Box<dyn FnMut(&str)>,
    plot_cb: Box<dyn FnMut(Figure)>,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine {
    pub fn new() -> Self {
        let global = Environment::new_root();
        global.define("pi", Value::scalar(std::f64::consts::PI));
        global.define("e", Value::scalar(std::f64::consts::E));
        global.define("eps", Value::scalar(f64::EPSILON));
        global.define("Inf", Value::scalar(f64::INFINITY));
        global.define("NaN", Value::scalar(f64::NAN));
        // spec.md §9 Open Question: i/j pre-bound to NaN, overwritable like
        // any other variable.
        global.define("i", Value::scalar(f64::NAN));
        global.define("j", Value::scalar(f64::NAN));
        global.define("ans", Value::Empty);

        let mut engine = Self {
            global,
            functions: HashMap::new(),
            builtins: HashMap::new(),
            figure: Figure::new(1),
            next_figure_id: 2,
            tic_mark: None,
            clock: 0,
            end_stack: Vec::new(),
            rng_state: 0x2545F4914F6CDD1D,
            output_cb: Box::new(|s: &str| print!("{s}")),
            plot_cb: Box::new(|_fig: Figure| {}),
        };
        builtins::register_all(&mut engine.builtins);
        engine
    }

    pub fn set_output_callback(&mut self, f: impl FnMut(&str) + 'static) {
        self.output_cb = Box::new(f);
    }

    pub fn set_plot_callback(&mut self, f: impl FnMut(Figure) + 'static) {
        self.plot_cb = Box::new(f);
    }

    pub fn current_env(&self) -> &Rc<Environment> {
        &self.global
    }

    pub fn emit(&mut self, text: &str) {
        (self.output_cb)(text);
    }

    pub fn emit_plot(&mut self) {
        let fig = self.figure.clone();
        (self.plot_cb)(fig);
    }

    pub fn new_figure_id(&mut self) -> u32 {
        let id = self.next_figure_id;
        self.next_figure_id += 1;
        id
    }

    pub fn next_rand(&mut self) -> f64 {
        // xorshift64*: deterministic, dependency-free PRNG.
        let mut x = self.rng_state;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.rng_state = x;
        ((x >> 11) as f64) / ((1u64 << 53) as f64)
    }

    pub fn execute(&mut self, source: &str) -> Result<Value, EngineError> {
        let stmts = parse(source)?;
        let env = self.global.clone();
        let mut last = Value::Empty;
        for stmt in &stmts {
            if let Some(v) = self.eval_stmt(stmt, &env)? {
                last = v;
            }
        }
        Ok(last)
    }

    fn run_block(&mut self, stmts: &[Stmt], env: &Rc<Environment>) -> Result<Option<Value>, EvalError> {
        let mut last = None;
        for stmt in stmts {
            if let Some(v) = self.eval_stmt(stmt, env)? {
                last = Some(v);
            }
        }
        Ok(last)
    }

    // ------------------------------------------------------------------
    // Statements
    // ------------------------------------------------------------------

    fn eval_stmt(&mut self, stmt: &Stmt, env: &Rc<Environment>) -> Result<Option<Value>, EvalError> {
        match &stmt.kind {
            StmtKind::Expr { expr, print } => {
                let val = self.eval_expr(expr, env)?;
                self.global.define("ans", val.clone());
                if *print {
                    let text = format_assignment("ans", &val);
                    self.emit(&format!("{text}\n"));
                }
                Ok(Some(val))
            }
            StmtKind::Assign { target, value, print } => {
                let val = self.eval_expr(value, env)?;
                self.assign_target(target, val.clone(), env)?;
                if *print {
                    if let Some(name) = target_name(target) {
                        let text = format_assignment(&name, &val);
                        self.emit(&format!("{text}\n"));
                    }
                }
                Ok(Some(val))
            }
            StmtKind::MultiAssign { targets, value, print } => {
                let values = self.eval_multi(value, targets.len(), env)?;
                for (i, target) in targets.iter().enumerate() {
                    let v = values.get(i).cloned().unwrap_or(Value::Empty);
                    if !matches!(target, Target::Discard) {
                        self.assign_target(target, v.clone(), env)?;
                        if *print {
                            if let Some(name) = target_name(target) {
                                let text = format_assignment(&name, &v);
                                self.emit(&format!("{text}\n"));
                            }
                        }
                    }
                }
                Ok(values.into_iter().next())
            }
            StmtKind::If { cond, body, elseifs, else_body } => {
                if self.eval_expr(cond, env)?.is_truthy() {
                    return self.run_block(body, env);
                }
                for arm in elseifs {
                    if self.eval_expr(&arm.cond, env)?.is_truthy() {
                        return self.run_block(&arm.body, env);
                    }
                }
                if let Some(eb) = else_body {
                    return self.run_block(eb, env);
                }
                Ok(None)
            }
            StmtKind::For { var, range, body } => {
                let range_val = self.eval_expr(range, env)?;
                let m = match range_val {
                    Value::Matrix(m) => m,
                    other => return Err(EvalError::type_error("for", "matrix", &other, 1)),
                };
                'outer: for c in 0..m.cols {
                    let iter_val = if m.rows <= 1 {
                        Value::scalar(*m.data.get(c).unwrap_or(&0.0))
                    } else {
                        Value::Matrix(Matrix::col_vec(m.column(c)))
                    };
                    env.define(var, iter_val);
                    match self.run_block(body, env) {
                        Ok(_) => {}
                        Err(EvalError::Control(Signal::Break)) => break 'outer,
                        Err(EvalError::Control(Signal::Continue)) => continue 'outer,
                        Err(e) => return Err(e),
                    }
                }
                Ok(None)
            }
            StmtKind::While { cond, body } => {
                while self.eval_expr(cond, env)?.is_truthy() {
                    match self.run_block(body, env) {
                        Ok(_) => {}
                        Err(EvalError::Control(Signal::Break)) => break,
                        Err(EvalError::Control(Signal::Continue)) => continue,
                        Err(e) => return Err(e),
                    }
                }
                Ok(None)
            }
            StmtKind::Switch { scrutinee, cases, otherwise } => {
                let scrutinee_val = self.eval_expr(scrutinee, env)?;
                for arm in cases {
                    let case_val = self.eval_expr(&arm.value, env)?;
                    if switch_match(&scrutinee_val, &case_val) {
                        return self.run_block(&arm.body, env);
                    }
                }
                if let Some(ow) = otherwise {
                    return self.run_block(ow, env);
                }
                Ok(None)
            }
            StmtKind::Try { body, catch_var, catch_body } => {
                match self.run_block(body, env) {
                    Ok(v) => Ok(v),
                    Err(e) if e.is_control() => Err(e),
                    Err(e) => {
                        if let Some(name) = catch_var {
                            env.define(name, error_to_struct(&e));
                        }
                        self.run_block(catch_body, env)
                    }
                }
            }
            StmtKind::Return => Err(EvalError::Control(Signal::Return)),
            StmtKind::Break => Err(EvalError::Control(Signal::Break)),
            StmtKind::Continue => Err(EvalError::Control(Signal::Continue)),
            StmtKind::Global(names) => {
                for name in names {
                    env.declare_global(name);
                }
                Ok(None)
            }
            StmtKind::Function(def) => {
                self.functions.insert(def.name.clone(), Rc::new(def.clone()));
                Ok(None)
            }
        }
    }

    fn assign_target(&mut self, target: &Target, value: Value, env: &Rc<Environment>) -> Result<(), EvalError> {
        match target {
            Target::Discard => Ok(()),
            Target::Name(name) => {
                env.define(name, value);
                Ok(())
            }
            Target::Indexed(expr) => self.assign_indexed(expr, value, env),
        }
    }

    fn assign_indexed(&mut self, expr: &Expr, value: Value, env: &Rc<Environment>) -> Result<(), EvalError> {
        match expr {
            Expr::Field { target, field, .. } => {
                let base_name = root_name(target);
                let mut base = self.eval_lvalue_base(target, env)?;
                if matches!(base, Value::Empty) {
                    base = Value::Struct(indexmap::IndexMap::new());
                }
                let s = match &mut base {
                    Value::Struct(map) => map,
                    other => return Err(EvalError::type_error("assignment", "struct", other, 1)),
                };
                s.insert(field.clone(), value);
                self.store_lvalue_base(target, base_name, base, env)
            }
            Expr::Call { callee, args, .. } => {
                let base_name = root_name(callee);
                let mut base = self.eval_lvalue_base(callee, env)?;
                let arg_vals: Vec<Value> =
                    args.iter().map(|a| self.eval_expr(a, env)).collect::<Result<_, _>>()?;
                self.assign_matrix_index(&mut base, &arg_vals, value)?;
                self.store_lvalue_base(callee, base_name, base, env)
            }
            Expr::CellIndex { target, args, .. } => {
                let base_name = root_name(target);
                let mut base = self.eval_lvalue_base(target, env)?;
                let arg_vals: Vec<Value> =
                    args.iter().map(|a| self.eval_expr(a, env)).collect::<Result<_, _>>()?;
                if matches!(base, Value::Empty) {
                    base = Value::Cell(Cell::new(0, 0, vec![]));
                }
                let cell = match &mut base {
                    Value::Cell(c) => c,
                    other => return Err(EvalError::type_error("assignment", "cell", other, 1)),
                };
                if let Some(idx) = arg_vals.first().and_then(|v| v.as_scalar()) {
                    let i = (idx as usize).saturating_sub(1);
                    if i < cell.data.len() {
                        cell.data[i] = value;
                    } else {
                        while cell.data.len() <= i {
                            cell.data.push(Value::Empty);
                        }
                        cell.rows = 1;
                        cell.cols = cell.data.len();
                    }
                }
                self.store_lvalue_base(target, base_name, base, env)
            }
            _ => Err(EvalError::runtime_error("assignment", "invalid assignment target")),
        }
    }

    fn eval_lvalue_base(&mut self, expr: &Expr, env: &Rc<Environment>) -> Result<Value, EvalError> {
        match expr {
            Expr::Ident(name, _) => Ok(env.get(name).unwrap_or(Value::Empty)),
            other => self.eval_expr(other, env),
        }
    }

    fn store_lvalue_base(
        &mut self,
        _expr: &Expr,
        base_name: Option<String>,
        value: Value,
        env: &Rc<Environment>,
    ) -> Result<(), EvalError> {
        if let Some(name) = base_name {
            env.define(&name, value);
            Ok(())
        } else {
            Err(EvalError::runtime_error("assignment", "nested indexed assignment target must be a variable"))
        }
    }

    /// Grows a matrix when the target index exceeds current bounds,
    /// zero-filling the expansion (spec.md §4.4).
    fn assign_matrix_index(&mut self, base: &mut Value, args: &[Value], value: Value) -> Result<(), EvalError> {
        if matches!(base, Value::Empty) {
            *base = Value::Matrix(Matrix::empty());
        }
        let m = match base {
            Value::Matrix(m) => m,
            other => return Err(EvalError::type_error("assignment", "matrix", other, 1)),
        };
        let scalar_value = value.as_scalar();
        match args.len() {
            1 => {
                let idx = args[0].as_scalar().ok_or_else(|| {
                    EvalError::runtime_error("assignment", "linear index must be numeric")
                })? as usize;
                let needed = idx;
                if m.is_empty() {
                    *m = Matrix::zeros(1, needed);
                } else if needed > m.rows * m.cols {
                    if m.rows <= 1 {
                        let mut data = m.data.clone();
                        data.resize(needed, 0.0);
                        *m = Matrix::row_vec(data);
                    } else if m.cols == 1 {
                        let mut data = m.data.clone();
                        data.resize(needed, 0.0);
                        *m = Matrix::col_vec(data);
                    }
                }
                let v = scalar_value.unwrap_or(0.0);
                let lin = idx - 1;
                let row = lin % m.rows;
                let col = lin / m.rows;
                m.set(row, col, v);
                Ok(())
            }
            2 => {
                let row = args[0].as_scalar().ok_or_else(|| {
                    EvalError::runtime_error("assignment", "row index must be numeric")
                })? as usize;
                let col = args[1].as_scalar().ok_or_else(|| {
                    EvalError::runtime_error("assignment", "column index must be numeric")
                })? as usize;
                let needed_rows = row.max(m.rows);
                let needed_cols = col.max(m.cols);
                if needed_rows != m.rows || needed_cols != m.cols {
                    let mut grown = Matrix::zeros(needed_rows, needed_cols);
                    for r in 0..m.rows {
                        for c in 0..m.cols {
                            grown.set(r, c, m.get(r, c));
                        }
                    }
                    *m = grown;
                }
                m.set(row - 1, col - 1, scalar_value.unwrap_or(0.0));
                Ok(())
            }
            _ => Err(EvalError::runtime_error("assignment", "only 1-D and 2-D indexing is supported")),
        }
    }

    // ------------------------------------------------------------------
    // Expressions
    // ------------------------------------------------------------------

    fn eval_expr(&mut self, expr: &Expr, env: &Rc<Environment>) -> Result<Value, EvalError> {
        match expr {
            Expr::Number { value, imaginary, .. } => {
                Ok(Value::scalar(if *imaginary { f64::NAN } else { *value }))
            }
            Expr::Str(s, _) => Ok(Value::String(s.clone())),
            Expr::Bool(b, _) => Ok(Value::bool_scalar(*b)),
            Expr::Ident(name, _) => self.resolve_identifier(name, env),
            Expr::Unary { op, operand, .. } => {
                let v = self.eval_expr(operand, env)?;
                eval_unary(*op, v)
            }
            Expr::Binary { op, lhs, rhs, .. } => {
                if *op == BinOp::ShortAnd {
                    let l = self.eval_expr(lhs, env)?;
                    if !l.is_truthy() {
                        return Ok(Value::bool_scalar(false));
                    }
                    let r = self.eval_expr(rhs, env)?;
                    return Ok(Value::bool_scalar(r.is_truthy()));
                }
                if *op == BinOp::ShortOr {
                    let l = self.eval_expr(lhs, env)?;
                    if l.is_truthy() {
                        return Ok(Value::bool_scalar(true));
                    }
                    let r = self.eval_expr(rhs, env)?;
                    return Ok(Value::bool_scalar(r.is_truthy()));
                }
                let l = self.eval_expr(lhs, env)?;
                let r = self.eval_expr(rhs, env)?;
                eval_binary(*op, l, r)
            }
            Expr::Matrix { rows, .. } => self.eval_matrix_literal(rows, env),
            Expr::Cell { rows, .. } => self.eval_cell_literal(rows, env),
            Expr::Call { callee, args, .. } => self.eval_call(callee, args, env, 1).map(|mut v| {
                if v.is_empty() {
                    Value::Empty
                } else {
                    v.remove(0)
                }
            }),
            Expr::CellIndex { target, args, .. } => self.eval_cell_index(target, args, env),
            Expr::Field { target, field, .. } => {
                let base = self.eval_expr(target, env)?;
                match base {
                    Value::Struct(map) => map
                        .get(field)
                        .cloned()
                        .ok_or_else(|| EvalError::runtime_error("field access", format!("no field '{field}'"))),
                    other => Err(EvalError::type_error("field access", "struct", &other, 1)),
                }
            }
            Expr::Colon { start, step, stop, .. } => {
                let s = match start {
                    Some(e) => self.eval_expr(e, env)?.as_scalar().unwrap_or(0.0),
                    None => 1.0,
                };
                let step = match step {
                    Some(e) => self.eval_expr(e, env)?.as_scalar().unwrap_or(1.0),
                    None => 1.0,
                };
                let stop = match stop {
                    Some(e) => self.eval_expr(e, env)?.as_scalar().unwrap_or(0.0),
                    None => 0.0,
                };
                Ok(Value::Matrix(make_range(s, step, stop)))
            }
            Expr::BareColon(_) => Err(EvalError::runtime_error("colon", "':' may only appear as an index argument")),
            Expr::End(_) => match self.end_stack.last() {
                Some(&n) => Ok(Value::scalar(n as f64)),
                None => Err(EvalError::runtime_error("end", "'end' used outside an indexing expression")),
            },
            Expr::Anonymous { params, body, .. } => Ok(Value::FuncHandle(FuncHandle::Closure {
                params: params.clone(),
                body: body.clone(),
                env: env.clone(),
            })),
            Expr::Handle { name, .. } => Ok(Value::FuncHandle(FuncHandle::Named(name.clone()))),
        }
    }

    fn resolve_identifier(&mut self, name: &str, env: &Rc<Environment>) -> Result<Value, EvalError> {
        if let Some(v) = env.get(name) {
            return Ok(v);
        }
        if let Some(def) = self.functions.get(name).cloned() {
            let outputs = self.call_user_function(&def, vec![], 1)?;
            return Ok(outputs.into_iter().next().unwrap_or(Value::Empty));
        }
        if let Some(f) = self.builtins.get(name).copied() {
            return f(&[], self);
        }
        Err(EvalError::UndefinedSymbol(name.to_string()))
    }

    fn eval_matrix_literal(&mut self, rows: &[Vec<Expr>], env: &Rc<Environment>) -> Result<Value, EvalError> {
        if rows.is_empty() {
            return Ok(Value::Matrix(Matrix::empty()));
        }
        let mut row_mats = Vec::new();
        for row in rows {
            let mut elems = Vec::new();
            for e in row {
                elems.push(self.eval_expr(e, env)?);
            }
            let mats: Vec<Matrix> = elems
                .into_iter()
                .map(|v| match v {
                    Value::Matrix(m) => Ok(m),
                    Value::String(s) => Ok(Matrix::row_vec(str_to_codes(&s))),
                    other => Err(EvalError::type_error("matrix literal", "numeric", &other, 1)),
                })
                .collect::<Result<_, _>>()?;
            let refs: Vec<&Matrix> = mats.iter().collect();
            row_mats.push(matrix::horzcat(&refs)?);
        }
        let refs: Vec<&Matrix> = row_mats.iter().collect();
        Ok(Value::Matrix(matrix::vertcat(&refs)?))
    }

    fn eval_cell_literal(&mut self, rows: &[Vec<Expr>], env: &Rc<Environment>) -> Result<Value, EvalError> {
        let row_count = rows.len();
        let col_count = rows.first().map(|r| r.len()).unwrap_or(0);
        let mut data = Vec::with_capacity(row_count * col_count);
        for row in rows {
            for e in row {
                data.push(self.eval_expr(e, env)?);
            }
        }
        Ok(Value::Cell(Cell::new(row_count, col_count, data)))
    }

    /// Call resolution (spec.md §4.4): if the callee name is bound to a
    /// matrix/cell/struct value the call is an index, not an invocation;
    /// user functions shadow builtins.
    fn eval_call(
        &mut self,
        callee: &Expr,
        args: &[Expr],
        env: &Rc<Environment>,
        nargout: usize,
    ) -> Result<Vec<Value>, EvalError> {
        if let Expr::Ident(name, _) = callee {
            if let Some(bound) = env.get(name) {
                return match bound {
                    Value::Matrix(_) | Value::Cell(_) | Value::Struct(_) => {
                        Ok(vec![self.index_value(&bound, args, env)?])
                    }
                    Value::FuncHandle(h) => {
                        let arg_vals = self.eval_args(args, env)?;
                        self.call_handle(&h, arg_vals, nargout)
                    }
                    Value::String(_) => Ok(vec![self.index_value(&bound, args, env)?]),
                    Value::Empty => Err(EvalError::UndefinedSymbol(name.clone())),
                };
            }
            if let Some(def) = self.functions.get(name).cloned() {
                let arg_vals = self.eval_args(args, env)?;
                return self.call_user_function(&def, arg_vals, nargout);
            }
            if let Some(f) = self.builtins.get(name.as_str()).copied() {
                let arg_vals = self.eval_args(args, env)?;
                return Ok(expand_for_nargout(f(&arg_vals, self)?, nargout));
            }
            return Err(EvalError::UndefinedSymbol(name.clone()));
        }
        // Chained postfix: evaluate callee, then index or invoke the handle.
        let base = self.eval_expr(callee, env)?;
        match base {
            Value::FuncHandle(h) => {
                let arg_vals = self.eval_args(args, env)?;
                self.call_handle(&h, arg_vals, nargout)
            }
            other => Ok(vec![self.index_value(&other, args, env)?]),
        }
    }

    fn eval_args(&mut self, args: &[Expr], env: &Rc<Environment>) -> Result<Vec<Value>, EvalError> {
        args.iter().map(|a| self.eval_expr(a, env)).collect()
    }

    /// Invoked from `feval`/`arrayfun`/`cellfun`/anonymous-function calls.
    pub fn call_handle(&mut self, handle: &FuncHandle, args: Vec<Value>, nargout: usize) -> Result<Vec<Value>, EvalError> {
        match handle {
            FuncHandle::Builtin(name) | FuncHandle::Named(name) => {
                if let Some(def) = self.functions.get(name.as_str()).cloned() {
                    return self.call_user_function(&def, args, nargout);
                }
                if let Some(f) = self.builtins.get(name.as_str()).copied() {
                    return Ok(expand_for_nargout(f(&args, self)?, nargout));
                }
                Err(EvalError::UndefinedSymbol(name.clone()))
            }
            FuncHandle::Closure { params, body, env } => {
                let call_env = Environment::child_of(env.clone(), self.global.clone());
                for (i, p) in params.iter().enumerate() {
                    call_env.define(p, args.get(i).cloned().unwrap_or(Value::Empty));
                }
                let v = self.eval_expr(body, &call_env)?;
                Ok(vec![v])
            }
        }
    }

    /// User function calls root their child environment at the *global*
    /// scope, not the caller's (spec.md §3, §4.4 — no lexical nesting for
    /// named functions). Multi-return is implemented faithfully: outputs
    /// are harvested by name from the callee's local environment after the
    /// body runs (SPEC_FULL.md §13 Open Question resolution).
    fn call_user_function(&mut self, def: &Rc<FunctionDef>, args: Vec<Value>, nargout: usize) -> Result<Vec<Value>, EvalError> {
        let call_env = Environment::child_of(self.global.clone(), self.global.clone());
        for (i, p) in def.params.iter().enumerate() {
            call_env.define(p, args.get(i).cloned().unwrap_or(Value::Empty));
        }
        call_env.define("nargin", Value::scalar(args.len() as f64));
        call_env.define("nargout", Value::scalar(nargout as f64));
        match self.run_block(&def.body, &call_env) {
            Ok(_) => {}
            Err(EvalError::Control(Signal::Return)) => {}
            Err(e) => return Err(e),
        }
        if def.outputs.is_empty() {
            return Ok(vec![]);
        }
        Ok(def
            .outputs
            .iter()
            .map(|name| call_env.get(name).unwrap_or(Value::Empty))
            .collect())
    }

    /// Drives `[a,b] = expr` (spec.md §4.2, §9 Open Question). A call to a
    /// user function is routed through true multi-return; anything else
    /// falls back to distributing a row-vector or cell result element-wise.
    fn eval_multi(&mut self, expr: &Expr, nargout: usize, env: &Rc<Environment>) -> Result<Vec<Value>, EvalError> {
        if let Expr::Call { callee, args, .. } = expr {
            if let Expr::Ident(name, _) = callee.as_ref() {
                if env.get(name).is_none() {
                    let result = self.eval_call(callee, args, env, nargout)?;
                    if result.len() == nargout {
                        return Ok(result);
                    }
                    let single = result.into_iter().next().unwrap_or(Value::Empty);
                    return Ok(distribute_for_nargout(single, nargout));
                }
            }
        }
        let v = self.eval_expr(expr, env)?;
        Ok(distribute_for_nargout(v, nargout))
    }

    fn eval_cell_index(&mut self, target: &Expr, args: &[Expr], env: &Rc<Environment>) -> Result<Value, EvalError> {
        let base = self.eval_expr(target, env)?;
        let cell = match &base {
            Value::Cell(c) => c,
            other => return Err(EvalError::type_error("cell indexing", "cell", other, 1)),
        };
        self.end_stack.push(cell.data.len());
        let idx = if args.len() == 1 {
            self.eval_expr(&args[0], env)
        } else {
            Err(EvalError::arity_error("cell index", "1", args.len()))
        };
        self.end_stack.pop();
        let idx = idx?.as_scalar().ok_or_else(|| EvalError::runtime_error("cell indexing", "index must be numeric"))?;
        let i = idx as usize;
        cell.data
            .get(i.saturating_sub(1))
            .cloned()
            .ok_or_else(|| EvalError::runtime_error("cell indexing", "index out of bounds"))
    }

    /// `A(i)`, `A(i,j)`, `A(:,j)` etc. (spec.md §4.4). One argument indexes
    /// linearly using MATLAB's column-major convention reconciled against
    /// row-major storage: `lin = col*rows + row`.
    fn index_value(&mut self, base: &Value, args: &[Expr], env: &Rc<Environment>) -> Result<Value, EvalError> {
        match base {
            Value::Matrix(m) => self.index_matrix(m, args, env),
            Value::String(s) => {
                let m = Matrix::row_vec(str_to_codes(s));
                let indexed = self.index_matrix(&m, args, env)?;
                match indexed {
                    Value::Matrix(m) => Ok(Value::String(codes_to_str(&m.data))),
                    other => Ok(other),
                }
            }
            Value::Cell(c) => self.index_cell(c, args, env),
            Value::Struct(_) => Err(EvalError::runtime_error("indexing", "cannot index a struct with ()")),
            _ => Err(EvalError::runtime_error("indexing", "value is not indexable")),
        }
    }

    fn index_matrix(&mut self, m: &Matrix, args: &[Expr], env: &Rc<Environment>) -> Result<Value, EvalError> {
        if args.len() == 1 {
            let total = m.rows * m.cols;
            self.end_stack.push(total);
            let sel = self.resolve_index_arg(&args[0], total, env);
            self.end_stack.pop();
            let positions = sel?;
            let data: Vec<f64> = positions
                .iter()
                .map(|&lin| {
                    let row = lin % m.rows.max(1);
                    let col = lin / m.rows.max(1);
                    m.get(row, col)
                })
                .collect();
            let shape_is_row = m.rows == 1 || positions.len() == 1;
            return Ok(Value::Matrix(if shape_is_row {
                Matrix::row_vec(data)
            } else {
                Matrix::col_vec(data)
            }));
        }
        if args.len() == 2 {
            self.end_stack.push(m.rows);
            let rows_sel = self.resolve_index_arg(&args[0], m.rows, env);
            self.end_stack.pop();
            let rows_sel = rows_sel?;
            self.end_stack.push(m.cols);
            let cols_sel = self.resolve_index_arg(&args[1], m.cols, env);
            self.end_stack.pop();
            let cols_sel = cols_sel?;
            let mut data = Vec::with_capacity(rows_sel.len() * cols_sel.len());
            for &r in &rows_sel {
                for &c in &cols_sel {
                    data.push(m.get(r, c));
                }
            }
            return Ok(Value::Matrix(Matrix::new(rows_sel.len(), cols_sel.len(), data)));
        }
        Err(EvalError::runtime_error("indexing", "only 1-D and 2-D indexing is supported"))
    }

    fn index_cell(&mut self, c: &Cell, args: &[Expr], env: &Rc<Environment>) -> Result<Value, EvalError> {
        let total = c.data.len();
        self.end_stack.push(total);
        let result = if args.len() == 1 {
            let sel = self.resolve_index_arg(&args[0], total, env)?;
            let data: Vec<Value> = sel.iter().map(|&i| c.data[i].clone()).collect();
            Ok(Value::Cell(Cell::new(1, data.len(), data)))
        } else {
            Err(EvalError::runtime_error("cell indexing", "only linear indexing is supported for ()"))
        };
        self.end_stack.pop();
        result
    }

    /// Resolves one index argument to a list of 0-based positions. Detects
    /// a logical mask (all elements 0/1, length equal to the axis size).
    fn resolve_index_arg(&mut self, expr: &Expr, axis_size: usize, env: &Rc<Environment>) -> Result<Vec<usize>, EvalError> {
        if matches!(expr, Expr::BareColon(_)) {
            return Ok((0..axis_size).collect());
        }
        if let Expr::Colon { start, step, stop, .. } = expr {
            let s = match start {
                Some(e) => self.eval_expr(e, env)?.as_scalar().unwrap_or(1.0),
                None => 1.0,
            };
            let st = match step {
                Some(e) => self.eval_expr(e, env)?.as_scalar().unwrap_or(1.0),
                None => 1.0,
            };
            let stop_v = match stop {
                Some(e) => self.eval_expr(e, env)?.as_scalar().unwrap_or(axis_size as f64),
                None => axis_size as f64,
            };
            let range = make_range(s, st, stop_v);
            return Ok(range.data.iter().map(|&v| (v as usize).saturating_sub(1)).collect());
        }
        let v = self.eval_expr(expr, env)?;
        let m = match v {
            Value::Matrix(m) => m,
            other => return Err(EvalError::type_error("indexing", "numeric index", &other, 1)),
        };
        if m.data.len() == axis_size && axis_size > 1 && m.data.iter().all(|&x| x == 0.0 || x == 1.0) {
            return Ok(m
                .data
                .iter()
                .enumerate()
                .filter(|(_, &v)| v != 0.0)
                .map(|(i, _)| i)
                .collect());
        }
        Ok(m.data.iter().map(|&v| (v as usize).saturating_sub(1)).collect())
    }
}

fn target_name(target: &Target) -> Option<String> {
    match target {
        Target::Name(n) => Some(n.clone()),
        Target::Indexed(expr) => root_name(expr),
        Target::Discard => None,
    }
}

fn root_name(expr: &Expr) -> Option<String> {
    match expr {
        Expr::Ident(n, _) => Some(n.clone()),
        Expr::Call { callee, .. } | Expr::CellIndex { target: callee, .. } | Expr::Field { target: callee, .. } => {
            root_name(callee)
        }
        _ => None,
    }
}

/// Builtins that produce more than one output (`[L,U] = lu(A)`) pack the
/// outputs into a `Cell` of exactly `nargout` elements; this unpacks it for
/// multi-assignment while leaving single-output calls untouched.
fn expand_for_nargout(v: Value, nargout: usize) -> Vec<Value> {
    if nargout > 1 {
        if let Value::Cell(c) = &v {
            if c.data.len() == nargout {
                return c.data.clone();
            }
        }
    }
    vec![v]
}

/// Distributes a single value across `nargout` assignment targets: a cell
/// or vector of matching length spreads element-wise, anything else fills
/// only the first target and leaves the rest empty.
fn distribute_for_nargout(v: Value, nargout: usize) -> Vec<Value> {
    if nargout > 1 {
        match &v {
            Value::Cell(c) if c.data.len() == nargout => return c.data.clone(),
            Value::Matrix(m) if m.is_vector() && m.data.len() == nargout => {
                return m.data.iter().map(|&x| Value::scalar(x)).collect();
            }
            _ => {}
        }
    }
    vec![v]
}

fn switch_match(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::String(x), Value::String(y)) => x == y,
        _ => match (a.as_scalar(), b.as_scalar()) {
            (Some(x), Some(y)) => x == y,
            _ => false,
        },
    }
}

fn error_to_struct(e: &EvalError) -> Value {
    let mut map = indexmap::IndexMap::new();
    let (message, identifier) = match e {
        EvalError::UserError { message, identifier } => (message.clone(), identifier.clone().unwrap_or_default()),
        other => (other.to_string(), String::new()),
    };
    map.insert("message".to_string(), Value::String(message));
    map.insert("identifier".to_string(), Value::String(identifier));
    Value::Struct(map)
}

pub fn make_range(start: f64, step: f64, stop: f64) -> Matrix {
    if step == 0.0 || (step > 0.0 && start > stop) || (step < 0.0 && start < stop) {
        return Matrix::empty();
    }
    let n = ((stop - start) / step + 1e-10).floor() as i64 + 1;
    if n <= 0 {
        return Matrix::empty();
    }
    let data: Vec<f64> = (0..n).map(|k| start + k as f64 * step).collect();
    Matrix::row_vec(data)
}

pub fn str_to_codes(s: &str) -> Vec<f64> {
    s.chars().map(|c| c as u32 as f64).collect()
}

pub fn codes_to_str(codes: &[f64]) -> String {
    codes.iter().filter_map(|&c| char::from_u32(c as u32)).collect()
}

fn eval_unary(op: UnOp, v: Value) -> Result<Value, EvalError> {
    match op {
        UnOp::Pos => Ok(v),
        UnOp::Neg => {
            let m = to_matrix(&v, "unary minus")?;
            Ok(Value::Matrix(m.map(|x| -x)))
        }
        UnOp::Not => {
            let m = to_matrix(&v, "unary not")?;
            Ok(Value::Matrix(m.map(|x| if x == 0.0 { 1.0 } else { 0.0 })))
        }
        UnOp::Transpose | UnOp::DotTranspose => match v {
            Value::Matrix(m) => Ok(Value::Matrix(m.transpose())),
            Value::String(s) => Ok(Value::Matrix(Matrix::col_vec(str_to_codes(&s)))),
            other => Err(EvalError::type_error("transpose", "matrix", &other, 1)),
        },
    }
}

fn to_matrix(v: &Value, op: &str) -> Result<Matrix, EvalError> {
    match v {
        Value::Matrix(m) => Ok(m.clone()),
        Value::String(s) => Ok(Matrix::row_vec(str_to_codes(s))),
        other => Err(EvalError::type_error(op, "numeric", other, 1)),
    }
}

fn eval_binary(op: BinOp, l: Value, r: Value) -> Result<Value, EvalError> {
    use BinOp::*;
    let op_name = format!("{:?}", op);
    let lm = to_matrix(&l, &op_name)?;
    let rm = to_matrix(&r, &op_name)?;
    let result = match op {
        Add => matrix::elementwise(&lm, &rm, "+", |a, b| a + b)?,
        Sub => matrix::elementwise(&lm, &rm, "-", |a, b| a - b)?,
        Mul => matrix::matmul(&lm, &rm)?,
        DotMul => matrix::elementwise(&lm, &rm, ".*", |a, b| a * b)?,
        Div => {
            if let Some(s) = rm.to_scalar() {
                lm.map(|x| x / s)
            } else if lm.rows == rm.rows || lm.is_scalar() {
                matrix::matmul(&lm, &matrix::inv(&rm)?)?
            } else {
                return Err(EvalError::DimensionMismatch("/: incompatible shapes".into()));
            }
        }
        DotDiv => matrix::elementwise(&lm, &rm, "./", |a, b| a / b)?,
        LeftDiv => {
            if let Some(s) = lm.to_scalar() {
                rm.map(|x| x / s)
            } else {
                matrix::matmul(&matrix::inv(&lm)?, &rm)?
            }
        }
        DotLeftDiv => matrix::elementwise(&lm, &rm, ".\\", |a, b| b / a)?,
        Pow => {
            if let (Some(a), Some(b)) = (lm.to_scalar(), rm.to_scalar()) {
                Matrix::scalar(a.powf(b))
            } else if let Some(p) = rm.to_scalar() {
                matrix_power(&lm, p)?
            } else {
                return Err(EvalError::DimensionMismatch("^: exponent must be scalar".into()));
            }
        }
        DotPow => matrix::elementwise(&lm, &rm, ".^", |a, b| a.powf(b))?,
        Eq => matrix::elementwise(&lm, &rm, "==", |a, b| bool_f(a == b))?,
        Ne => matrix::elementwise(&lm, &rm, "~=", |a, b| bool_f(a != b))?,
        Lt => matrix::elementwise(&lm, &rm, "<", |a, b| bool_f(a < b))?,
        Gt => matrix::elementwise(&lm, &rm, ">", |a, b| bool_f(a > b))?,
        Le => matrix::elementwise(&lm, &rm, "<=", |a, b| bool_f(a <= b))?,
        Ge => matrix::elementwise(&lm, &rm, ">=", |a, b| bool_f(a >= b))?,
        BitAnd => matrix::elementwise(&lm, &rm, "&", |a, b| bool_f(a != 0.0 && b != 0.0))?,
        BitOr => matrix::elementwise(&lm, &rm, "|", |a, b| bool_f(a != 0.0 || b != 0.0))?,
        ShortAnd | ShortOr => unreachable!("handled with short-circuit evaluation before this point"),
    };
    Ok(Value::Matrix(result))
}

fn bool_f(b: bool) -> f64 {
    if b { 1.0 } else { 0.0 }
}

fn matrix_power(m: &Matrix, p: f64) -> Result<Matrix, EvalError> {
    if p.fract() != 0.0 || p < 0.0 {
        return Err(EvalError::runtime_error("^", "matrix power requires a nonnegative integer exponent"));
    }
    let n = p as u32;
    let mut result = matrix::identity(m.rows);
    for _ in 0..n {
        result = matrix::matmul(&result, m)?;
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(src: &str) -> Value {
        let mut e = Engine::new();
        e.execute(src).unwrap()
    }

    #[test]
    fn det_2x2() {
        let v = run("det([1 2; 3 4])");
        assert_eq!(v.as_scalar(), Some(-2.0));
    }

    #[test]
    fn end_in_index() {
        let v = run("x = 1:5; x(end)");
        assert_eq!(v.as_scalar(), Some(5.0));
        let v = run("x = 1:5; x(end-1)");
        assert_eq!(v.as_scalar(), Some(4.0));
    }

    #[test]
    fn row_and_column_indexing() {
        let v = run("A = [1 2; 3 4]; A(2, :)");
        match v {
            Value::Matrix(m) => assert_eq!(m.data, vec![3.0, 4.0]),
            _ => panic!(),
        }
        let v = run("A = [1 2; 3 4]; A(:, 1)");
        match v {
            Value::Matrix(m) => assert_eq!(m.data, vec![1.0, 3.0]),
            _ => panic!(),
        }
    }

    #[test]
    fn for_loop_over_columns() {
        let mut e = Engine::new();
        e.execute("total = 0; for k = 1:5; total = total + k; end").unwrap();
        assert_eq!(e.global.get("total").unwrap().as_scalar(), Some(15.0));
    }

    #[test]
    fn user_function_true_multi_return() {
        let mut e = Engine::new();
        e.execute("function [a,b] = swap(x,y)\n a = y;\n b = x;\nend").unwrap();
        e.execute("[p,q] = swap(1,2);").unwrap();
        assert_eq!(e.global.get("p").unwrap().as_scalar(), Some(2.0));
        assert_eq!(e.global.get("q").unwrap().as_scalar(), Some(1.0));
    }

    #[test]
    fn try_catch_binds_message() {
        let mut e = Engine::new();
        e.execute("try\n error('boom');\ncatch err\n msg = err.message;\nend").unwrap();
        assert_eq!(e.global.get("msg"), Some(Value::String("boom".into())));
    }

    #[test]
    fn break_exits_loop_early() {
        let mut e = Engine::new();
        e.execute("total = 0; for k = 1:10; if k > 3; break; end; total = total + k; end").unwrap();
        assert_eq!(e.global.get("total").unwrap().as_scalar(), Some(6.0));
    }

    #[test]
    fn growing_assignment_zero_fills() {
        let mut e = Engine::new();
        e.execute("x = [1 2]; x(4) = 9;").unwrap();
        match e.global.get("x").unwrap() {
            Value::Matrix(m) => assert_eq!(m.data, vec![1.0, 2.0, 0.0, 9.0]),
            _ => panic!(),
        }
    }
}

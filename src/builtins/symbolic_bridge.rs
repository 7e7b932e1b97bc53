// ABOUTME: Symbolic builtins - parse/diff/integrate/solve/simplify/subs/taylor/eval/plot, bridged through __sym: tagged strings

use std::collections::HashMap;

use super::BuiltinFn;
use crate::error::EvalError;
use crate::interpreter::Engine;
use crate::plot::{Series, SeriesKind};
use crate::symbolic::parse::parse as parse_sym;
use crate::symbolic::{diff, integrate, simplify, solve, taylor, SymExpr};
use crate::value::{Matrix, Value};

/// Host-facing tag for a symbolic result (spec.md §6: "`__sym:` prefix
/// string for the host LaTeX renderer"). Every symbolic builtin that
/// produces an expression wraps it this way; every one that consumes an
/// expression strips it back off.
const SYM_PREFIX: &str = "__sym:";

pub fn register(table: &mut HashMap<&'static str, BuiltinFn>) {
    table.insert("sym", sym as BuiltinFn);
    table.insert("symdiff", symdiff as BuiltinFn);
    table.insert("symint", symint as BuiltinFn);
    table.insert("symsolve", symsolve as BuiltinFn);
    table.insert("symsimplify", symsimplify as BuiltinFn);
    table.insert("symexpand", symsimplify as BuiltinFn);
    table.insert("symsubs", symsubs as BuiltinFn);
    table.insert("symtaylor", symtaylor as BuiltinFn);
    table.insert("symeval", symeval as BuiltinFn);
    table.insert("symplot", symplot as BuiltinFn);
}

fn tag(body: String) -> Value {
    Value::String(format!("{SYM_PREFIX}{body}"))
}

fn untag(s: &str) -> &str {
    s.strip_prefix(SYM_PREFIX).unwrap_or(s)
}

fn sym_arg(name: &str, args: &[Value], i: usize) -> Result<SymExpr, EvalError> {
    let s = super::string_arg(name, args, i)?;
    parse_sym(untag(s)).map_err(|e| EvalError::runtime_error(name, e))
}

fn sym(args: &[Value], _engine: &mut Engine) -> Result<Value, EvalError> {
    super::check_arity("sym", args, 1)?;
    let expr = sym_arg("sym", args, 0)?;
    Ok(tag(expr.to_string_at(expr.root)))
}

fn symdiff(args: &[Value], _engine: &mut Engine) -> Result<Value, EvalError> {
    super::check_arity_range("symdiff", args, 1, 2)?;
    let mut expr = sym_arg("symdiff", args, 0)?;
    let var = if args.len() == 2 { super::string_arg("symdiff", args, 1)?.to_string() } else { "x".to_string() };
    let root = expr.root;
    let d = diff::diff(&mut expr, root, &var);
    Ok(tag(expr.to_string_at(d)))
}

fn symint(args: &[Value], _engine: &mut Engine) -> Result<Value, EvalError> {
    super::check_arity_range("symint", args, 1, 2)?;
    let mut expr = sym_arg("symint", args, 0)?;
    let var = if args.len() == 2 { super::string_arg("symint", args, 1)?.to_string() } else { "x".to_string() };
    let root = expr.root;
    let result = integrate::integrate(&mut expr, root, &var).map_err(|e| EvalError::runtime_error("symint", e))?;
    Ok(tag(expr.to_string_at(result)))
}

fn symsolve(args: &[Value], _engine: &mut Engine) -> Result<Value, EvalError> {
    super::check_arity_range("symsolve", args, 1, 2)?;
    let expr = sym_arg("symsolve", args, 0)?;
    let var = if args.len() == 2 { super::string_arg("symsolve", args, 1)?.to_string() } else { "x".to_string() };
    let roots = solve::solve(&expr, expr.root, &var).map_err(|e| EvalError::runtime_error("symsolve", e))?;
    Ok(Value::Matrix(Matrix::row_vec(roots)))
}

fn symsimplify(args: &[Value], _engine: &mut Engine) -> Result<Value, EvalError> {
    super::check_arity("symsimplify", args, 1)?;
    let mut expr = sym_arg("symsimplify", args, 0)?;
    let root = expr.root;
    let s = simplify::simplify(&mut expr, root);
    Ok(tag(expr.to_string_at(s)))
}

fn symsubs(args: &[Value], _engine: &mut Engine) -> Result<Value, EvalError> {
    super::check_arity("symsubs", args, 3)?;
    let expr = sym_arg("symsubs", args, 0)?;
    let var = super::string_arg("symsubs", args, 1)?;
    let value = super::scalar_arg("symsubs", args, 2)?;
    let mut env = HashMap::new();
    env.insert(var.to_string(), value);
    let result = expr.eval(expr.root, &env).map_err(|e| EvalError::runtime_error("symsubs", e))?;
    Ok(Value::scalar(result))
}

fn symtaylor(args: &[Value], _engine: &mut Engine) -> Result<Value, EvalError> {
    super::check_arity_range("symtaylor", args, 2, 4)?;
    let mut expr = sym_arg("symtaylor", args, 0)?;
    let order = super::scalar_arg("symtaylor", args, 1)? as usize;
    let var = if args.len() >= 3 { super::string_arg("symtaylor", args, 2)?.to_string() } else { "x".to_string() };
    let centre = if args.len() == 4 { super::scalar_arg("symtaylor", args, 3)? } else { 0.0 };
    let root = expr.root;
    let series = taylor::taylor(&mut expr, root, &var, centre, order).map_err(|e| EvalError::runtime_error("symtaylor", e))?;
    Ok(tag(expr.to_string_at(series)))
}

fn symeval(args: &[Value], _engine: &mut Engine) -> Result<Value, EvalError> {
    super::check_arity("symeval", args, 2)?;
    let expr = sym_arg("symeval", args, 0)?;
    let value = super::scalar_arg("symeval", args, 1)?;
    let var = first_free_var(&expr).unwrap_or_else(|| "x".to_string());
    let mut env = HashMap::new();
    env.insert(var, value);
    let result = expr.eval(expr.root, &env).map_err(|e| EvalError::runtime_error("symeval", e))?;
    Ok(Value::scalar(result))
}

/// `symplot(expr, a, b)` samples `expr` over 200 points on `[a, b]` and
/// pushes it as an ordinary line series (spec.md §4.6); the symbolic
/// engine never touches a canvas, it just produces numbers like any other
/// plotting builtin.
fn symplot(args: &[Value], engine: &mut Engine) -> Result<Value, EvalError> {
    super::check_arity("symplot", args, 3)?;
    let expr = sym_arg("symplot", args, 0)?;
    let a = super::scalar_arg("symplot", args, 1)?;
    let b = super::scalar_arg("symplot", args, 2)?;
    let var = first_free_var(&expr).unwrap_or_else(|| "x".to_string());

    const SAMPLES: usize = 200;
    let mut xs = Vec::with_capacity(SAMPLES);
    let mut ys = Vec::with_capacity(SAMPLES);
    for i in 0..SAMPLES {
        let x = a + (b - a) * (i as f64) / ((SAMPLES - 1) as f64);
        let mut env = HashMap::new();
        env.insert(var.clone(), x);
        let y = expr.eval(expr.root, &env).unwrap_or(f64::NAN);
        xs.push(x);
        ys.push(y);
    }
    engine.figure.push_series(Series::new(SeriesKind::Line, xs, ys));
    engine.emit_plot();
    Ok(Value::Empty)
}

fn first_free_var(expr: &SymExpr) -> Option<String> {
    expr.nodes.iter().find_map(|n| match n {
        crate::symbolic::SymNode::Var(name) if name != "pi" && name != "e" => Some(name.clone()),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diff_of_square_is_linear() {
        let mut engine = Engine::new();
        let args = vec![Value::String("x^2".to_string())];
        let result = symdiff(&args, &mut engine).unwrap();
        let Value::String(s) = result else { panic!("expected a tagged symbolic string") };
        assert!(s.starts_with(SYM_PREFIX));
        let expr = parse_sym(untag(&s)).unwrap();
        let mut env = HashMap::new();
        env.insert("x".to_string(), 3.0);
        assert!((expr.eval(expr.root, &env).unwrap() - 6.0).abs() < 1e-9);
    }

    #[test]
    fn solve_quadratic_roundtrip() {
        let mut engine = Engine::new();
        let args = vec![Value::String("x^2 - 5*x + 6".to_string())];
        let result = symsolve(&args, &mut engine).unwrap();
        let Value::Matrix(m) = result else { panic!("expected a matrix of roots") };
        let mut roots = m.data.clone();
        roots.sort_by(|a, b| a.partial_cmp(b).unwrap());
        assert_eq!(roots.len(), 2);
        assert!((roots[0] - 2.0).abs() < 1e-6);
        assert!((roots[1] - 3.0).abs() < 1e-6);
    }
}

// ABOUTME: symsolve - linear/quadratic coefficient extraction by sampling, falling back to Newton's method

use std::collections::HashMap;

use super::expr::{NodeId, SymExpr};

const NEWTON_TOL: f64 = 1e-10;
const NEWTON_MAX_ITERS: usize = 100;
const NEWTON_STEP: f64 = 1e-6;
const ROOT_DEDUP_TOL: f64 = 1e-6;

/// Solves `expr(var) = 0`, returning every numerically distinct root found.
///
/// Tries a linear fit first (spec.md §4.7: sample at 0,1,2), then a
/// quadratic fit (sample at -1,0,1,2), then falls back to Newton's method
/// from a grid of starting guesses on [-10, 10] step 0.5.
pub fn solve(expr: &SymExpr, root: NodeId, var: &str) -> Result<Vec<f64>, String> {
    if let Some((a, b)) = linear_fit(expr, root, var) {
        if a.abs() > 1e-12 {
            return Ok(vec![-b / a]);
        }
    }

    if let Some((a, b, c)) = quadratic_fit(expr, root, var) {
        if a.abs() > 1e-12 {
            let disc = b * b - 4.0 * a * c;
            if disc >= 0.0 {
                let sqrt_disc = disc.sqrt();
                let r1 = (-b + sqrt_disc) / (2.0 * a);
                let r2 = (-b - sqrt_disc) / (2.0 * a);
                return Ok(dedup_roots(vec![r1, r2]));
            }
        }
    }

    newton_grid(expr, root, var)
}

fn eval_at(expr: &SymExpr, root: NodeId, var: &str, x: f64) -> Option<f64> {
    let mut env = HashMap::new();
    env.insert(var.to_string(), x);
    expr.eval(root, &env).ok().filter(|v| v.is_finite())
}

/// Samples at 0, 1, 2 and checks the three points are colinear; if so
/// returns `(slope, intercept)` such that `slope*x + intercept == expr(x)`.
fn linear_fit(expr: &SymExpr, root: NodeId, var: &str) -> Option<(f64, f64)> {
    let f0 = eval_at(expr, root, var, 0.0)?;
    let f1 = eval_at(expr, root, var, 1.0)?;
    let f2 = eval_at(expr, root, var, 2.0)?;
    let slope = f1 - f0;
    let intercept = f0;
    if (f2 - (2.0 * slope + intercept)).abs() < 1e-9 {
        Some((slope, intercept))
    } else {
        None
    }
}

/// Samples at -1, 0, 1, 2 and solves for the unique quadratic through
/// those four points, then checks it actually fits all of them.
fn quadratic_fit(expr: &SymExpr, root: NodeId, var: &str) -> Option<(f64, f64, f64)> {
    let f_neg1 = eval_at(expr, root, var, -1.0)?;
    let f0 = eval_at(expr, root, var, 0.0)?;
    let f1 = eval_at(expr, root, var, 1.0)?;
    let f2 = eval_at(expr, root, var, 2.0)?;

    // c = f(0); a - b + c = f(-1); a + b + c = f(1)
    let c = f0;
    let a = (f_neg1 + f1) / 2.0 - c;
    let b = (f1 - f_neg1) / 2.0;

    let predicted_2 = 4.0 * a + 2.0 * b + c;
    if (predicted_2 - f2).abs() < 1e-9 {
        Some((a, b, c))
    } else {
        None
    }
}

fn newton_grid(expr: &SymExpr, root: NodeId, var: &str) -> Result<Vec<f64>, String> {
    let mut roots = Vec::new();
    let mut guess = -10.0;
    while guess <= 10.0 + 1e-9 {
        if let Some(r) = newton(expr, root, var, guess) {
            if eval_at(expr, root, var, r).map(|v| v.abs() < 1e-6).unwrap_or(false) {
                roots.push(r);
            }
        }
        guess += 0.5;
    }
    if roots.is_empty() {
        return Err(format!("symsolve could not find a root of the expression with respect to '{var}'"));
    }
    Ok(dedup_roots(roots))
}

fn newton(expr: &SymExpr, root: NodeId, var: &str, start: f64) -> Option<f64> {
    let mut x = start;
    for _ in 0..NEWTON_MAX_ITERS {
        let fx = eval_at(expr, root, var, x)?;
        if fx.abs() < NEWTON_TOL {
            return Some(x);
        }
        let fx_fwd = eval_at(expr, root, var, x + NEWTON_STEP)?;
        let derivative = (fx_fwd - fx) / NEWTON_STEP;
        if derivative.abs() < 1e-14 {
            return None;
        }
        let next = x - fx / derivative;
        if !next.is_finite() {
            return None;
        }
        x = next;
    }
    let fx = eval_at(expr, root, var, x)?;
    if fx.abs() < 1e-6 {
        Some(x)
    } else {
        None
    }
}

fn dedup_roots(mut roots: Vec<f64>) -> Vec<f64> {
    roots.sort_by(|a, b| a.partial_cmp(b).unwrap());
    let mut out: Vec<f64> = Vec::new();
    for r in roots {
        if !out.iter().any(|o: &f64| (o - r).abs() < ROOT_DEDUP_TOL) {
            out.push(r);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::super::parse::parse;

    #[test]
    fn linear_root() {
        let expr = parse("2*x - 6").unwrap();
        let roots = solve(&expr, expr.root, "x").unwrap();
        assert_eq!(roots.len(), 1);
        assert!((roots[0] - 3.0).abs() < 1e-8);
    }

    #[test]
    fn quadratic_roots() {
        let expr = parse("x^2 - 5*x + 6").unwrap();
        let mut roots = solve(&expr, expr.root, "x").unwrap();
        roots.sort_by(|a, b| a.partial_cmp(b).unwrap());
        assert_eq!(roots.len(), 2);
        assert!((roots[0] - 2.0).abs() < 1e-6);
        assert!((roots[1] - 3.0).abs() < 1e-6);
    }

    #[test]
    fn nonlinear_root_via_newton() {
        let expr = parse("x^3 - 8").unwrap();
        let roots = solve(&expr, expr.root, "x").unwrap();
        assert!(roots.iter().any(|r| (r - 2.0).abs() < 1e-4));
    }
}

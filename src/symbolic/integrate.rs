// ABOUTME: Pattern-directed symbolic integration over the forms the simplifier reduces to

use std::collections::HashMap;

use super::expr::{NodeId, SymExpr, SymNode};
use super::simplify::simplify;

pub fn integrate(expr: &mut SymExpr, root: NodeId, var: &str) -> Result<NodeId, String> {
    let raw = integrate_node(expr, root, var)?;
    Ok(simplify(expr, raw))
}

fn contains_var(expr: &SymExpr, id: NodeId, var: &str) -> bool {
    match expr.get(id) {
        SymNode::Num(_) => false,
        SymNode::Var(name) => name == var,
        SymNode::Add(a, b) | SymNode::Mul(a, b) | SymNode::Pow(a, b) | SymNode::Div(a, b) => {
            contains_var(expr, *a, var) || contains_var(expr, *b, var)
        }
        SymNode::Neg(a) | SymNode::Func(_, a) => contains_var(expr, *a, var),
    }
}

/// Samples `expr` at `var = 0, 1, 2` and checks that the values fall on a
/// line; returns `(slope, intercept)` if so. The same sampling idea
/// `symsolve` uses for its linear coefficient extraction.
fn linear_in(expr: &SymExpr, id: NodeId, var: &str) -> Option<(f64, f64)> {
    let mut env = HashMap::new();
    env.insert(var.to_string(), 0.0);
    let f0 = expr.eval(id, &env).ok()?;
    env.insert(var.to_string(), 1.0);
    let f1 = expr.eval(id, &env).ok()?;
    env.insert(var.to_string(), 2.0);
    let f2 = expr.eval(id, &env).ok()?;
    let slope = f1 - f0;
    let intercept = f0;
    if (f2 - (2.0 * slope + intercept)).abs() < 1e-9 {
        Some((slope, intercept))
    } else {
        None
    }
}

fn integrate_node(expr: &mut SymExpr, id: NodeId, var: &str) -> Result<NodeId, String> {
    match expr.get(id).clone() {
        SymNode::Num(c) => {
            let x = expr.var(var);
            let cid = expr.num(c);
            Ok(expr.push(SymNode::Mul(cid, x)))
        }

        SymNode::Var(name) => {
            if name == var {
                let x = expr.var(var);
                let two = expr.num(2.0);
                let x2 = expr.push(SymNode::Pow(x, two));
                let two_again = expr.num(2.0);
                Ok(expr.push(SymNode::Div(x2, two_again)))
            } else {
                let x = expr.var(var);
                let c = expr.var(&name);
                Ok(expr.push(SymNode::Mul(c, x)))
            }
        }

        SymNode::Neg(a) => {
            let ia = integrate_node(expr, a, var)?;
            Ok(expr.push(SymNode::Neg(ia)))
        }

        SymNode::Add(a, b) => {
            let ia = integrate_node(expr, a, var)?;
            let ib = integrate_node(expr, b, var)?;
            Ok(expr.push(SymNode::Add(ia, ib)))
        }

        SymNode::Mul(a, b) => {
            if !contains_var(expr, a, var) {
                let ib = integrate_node(expr, b, var)?;
                Ok(expr.push(SymNode::Mul(a, ib)))
            } else if !contains_var(expr, b, var) {
                let ia = integrate_node(expr, a, var)?;
                Ok(expr.push(SymNode::Mul(b, ia)))
            } else {
                Err("integral of a product of two non-constant factors is not supported".to_string())
            }
        }

        SymNode::Div(a, b) => {
            if !contains_var(expr, b, var) {
                let ia = integrate_node(expr, a, var)?;
                return Ok(expr.push(SymNode::Div(ia, b)));
            }
            let is_one = matches!(expr.get(a), SymNode::Num(n) if (*n - 1.0).abs() < 1e-12);
            if is_one {
                if let Some((coef, _)) = linear_in(expr, b, var) {
                    if coef.abs() > 1e-12 {
                        let abs_b = expr.push(SymNode::Func("abs".to_string(), b));
                        let ln = expr.push(SymNode::Func("ln".to_string(), abs_b));
                        let c = expr.num(coef);
                        return Ok(expr.push(SymNode::Div(ln, c)));
                    }
                }
            }
            Err("integral of 1/f is only supported for f linear in the integration variable".to_string())
        }

        SymNode::Pow(base, exponent) => {
            let n = match expr.get(exponent) {
                SymNode::Num(n) => *n,
                _ => return Err("integral of a variable exponent is not supported".to_string()),
            };
            let (coef, _offset) = linear_in(expr, base, var)
                .ok_or_else(|| "integral of this power form is not supported (base is not linear in the integration variable)".to_string())?;
            if coef.abs() < 1e-12 {
                return Err("power base has no dependence on the integration variable".to_string());
            }
            if (n + 1.0).abs() < 1e-12 {
                let abs_base = expr.push(SymNode::Func("abs".to_string(), base));
                let ln = expr.push(SymNode::Func("ln".to_string(), abs_base));
                let c = expr.num(coef);
                return Ok(expr.push(SymNode::Div(ln, c)));
            }
            let n_plus_1 = expr.num(n + 1.0);
            let raised = expr.push(SymNode::Pow(base, n_plus_1));
            let n_plus_1_again = expr.num(n + 1.0);
            let scale = expr.num(coef);
            let denom = expr.push(SymNode::Mul(n_plus_1_again, scale));
            Ok(expr.push(SymNode::Div(raised, denom)))
        }

        SymNode::Func(name, a) => {
            if matches!(expr.get(a), SymNode::Var(v) if v == var) {
                return standard_antiderivative(expr, &name, a);
            }
            if let Some((coef, _offset)) = linear_in(expr, a, var) {
                if coef.abs() > 1e-12 {
                    let f = standard_antiderivative(expr, &name, a)?;
                    let c = expr.num(coef);
                    return Ok(expr.push(SymNode::Div(f, c)));
                }
            }
            Err(format!("integral of {name}(...) is only supported when its argument is linear in the integration variable"))
        }
    }
}

/// Antiderivative of `name(u)` with respect to `u` itself; the caller
/// divides by the chain-rule slope when `u` is a linear substitution rather
/// than the bare integration variable.
fn standard_antiderivative(expr: &mut SymExpr, name: &str, u: NodeId) -> Result<NodeId, String> {
    Ok(match name {
        "sin" => {
            let c = expr.push(SymNode::Func("cos".to_string(), u));
            expr.push(SymNode::Neg(c))
        }
        "cos" => expr.push(SymNode::Func("sin".to_string(), u)),
        "exp" => expr.push(SymNode::Func("exp".to_string(), u)),
        "tan" => {
            let c = expr.push(SymNode::Func("cos".to_string(), u));
            let abs_c = expr.push(SymNode::Func("abs".to_string(), c));
            let ln = expr.push(SymNode::Func("ln".to_string(), abs_c));
            expr.push(SymNode::Neg(ln))
        }
        "ln" => {
            let ln_u = expr.push(SymNode::Func("ln".to_string(), u));
            let u_ln_u = expr.push(SymNode::Mul(u, ln_u));
            let neg_u = expr.push(SymNode::Neg(u));
            expr.push(SymNode::Add(u_ln_u, neg_u))
        }
        "sqrt" => {
            let three_halves = expr.num(1.5);
            let raised = expr.push(SymNode::Pow(u, three_halves));
            let two_thirds = expr.num(2.0 / 3.0);
            expr.push(SymNode::Mul(two_thirds, raised))
        }
        "abs" => {
            let abs_u = expr.push(SymNode::Func("abs".to_string(), u));
            let prod = expr.push(SymNode::Mul(u, abs_u));
            let half = expr.num(0.5);
            expr.push(SymNode::Mul(half, prod))
        }
        "asin" => {
            let asin_u = expr.push(SymNode::Func("asin".to_string(), u));
            let u_asin_u = expr.push(SymNode::Mul(u, asin_u));
            let two = expr.num(2.0);
            let u2 = expr.push(SymNode::Pow(u, two));
            let neg_u2 = expr.push(SymNode::Neg(u2));
            let one = expr.num(1.0);
            let inner = expr.push(SymNode::Add(one, neg_u2));
            let half = expr.num(0.5);
            let root = expr.push(SymNode::Pow(inner, half));
            expr.push(SymNode::Add(u_asin_u, root))
        }
        "acos" => {
            let acos_u = expr.push(SymNode::Func("acos".to_string(), u));
            let u_acos_u = expr.push(SymNode::Mul(u, acos_u));
            let two = expr.num(2.0);
            let u2 = expr.push(SymNode::Pow(u, two));
            let neg_u2 = expr.push(SymNode::Neg(u2));
            let one = expr.num(1.0);
            let inner = expr.push(SymNode::Add(one, neg_u2));
            let half = expr.num(0.5);
            let root = expr.push(SymNode::Pow(inner, half));
            let neg_root = expr.push(SymNode::Neg(root));
            expr.push(SymNode::Add(u_acos_u, neg_root))
        }
        "atan" => {
            let atan_u = expr.push(SymNode::Func("atan".to_string(), u));
            let u_atan_u = expr.push(SymNode::Mul(u, atan_u));
            let two = expr.num(2.0);
            let u2 = expr.push(SymNode::Pow(u, two));
            let one = expr.num(1.0);
            let denom_inner = expr.push(SymNode::Add(one, u2));
            let ln = expr.push(SymNode::Func("ln".to_string(), denom_inner));
            let half = expr.num(0.5);
            let half_ln = expr.push(SymNode::Mul(half, ln));
            let neg_half_ln = expr.push(SymNode::Neg(half_ln));
            expr.push(SymNode::Add(u_atan_u, neg_half_ln))
        }
        "sinh" => expr.push(SymNode::Func("cosh".to_string(), u)),
        "cosh" => expr.push(SymNode::Func("sinh".to_string(), u)),
        "tanh" => {
            let cosh_u = expr.push(SymNode::Func("cosh".to_string(), u));
            expr.push(SymNode::Func("ln".to_string(), cosh_u))
        }
        other => return Err(format!("no known antiderivative for '{other}'")),
    })
}

// ABOUTME: Taylor series - repeated differentiation evaluated at the centre, accumulated into a truncated polynomial

use super::diff::diff;
use super::expr::{NodeId, SymExpr, SymNode};
use super::simplify::simplify;

/// Builds the order-`n` Taylor polynomial of `expr` in `var` around `centre`.
///
/// Computes derivatives 0..=n by repeated differentiation, evaluates each at
/// `centre`, and accumulates `f^(k)(centre)/k! * (var - centre)^k`.
pub fn taylor(expr: &mut SymExpr, root: NodeId, var: &str, centre: f64, n: usize) -> Result<NodeId, String> {
    let mut env = std::collections::HashMap::new();
    env.insert(var.to_string(), centre);

    let mut derivative = root;
    let mut factorial = 1.0;
    let mut sum: Option<NodeId> = None;

    for k in 0..=n {
        if k > 0 {
            factorial *= k as f64;
        }
        let coef = expr
            .eval(derivative, &env)
            .map_err(|e| format!("symtaylor could not evaluate the order-{k} derivative at the expansion point: {e}"))?;

        if coef != 0.0 {
            let term = build_term(expr, var, centre, k, coef / factorial);
            sum = Some(match sum {
                Some(acc) => expr.push(SymNode::Add(acc, term)),
                None => term,
            });
        }

        if k < n {
            derivative = diff(expr, derivative, var);
        }
    }

    let result = sum.unwrap_or_else(|| expr.num(0.0));
    Ok(simplify(expr, result))
}

/// `coef * (var - centre)^k`, specialised for `centre == 0` (plain `coef * var^k`).
fn build_term(expr: &mut SymExpr, var: &str, centre: f64, k: usize, coef: f64) -> NodeId {
    let coef_node = expr.num(coef);
    if k == 0 {
        return coef_node;
    }
    let base = if centre == 0.0 {
        expr.var(var)
    } else {
        let v = expr.var(var);
        let c = expr.num(centre);
        let neg_c = expr.push(SymNode::Neg(c));
        expr.push(SymNode::Add(v, neg_c))
    };
    let power = if k == 1 {
        base
    } else {
        let k_node = expr.num(k as f64);
        expr.push(SymNode::Pow(base, k_node))
    };
    expr.push(SymNode::Mul(coef_node, power))
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::super::parse::parse;

    #[test]
    fn exp_taylor_matches_pointwise() {
        let mut expr = parse("exp(x)").unwrap();
        let root = expr.root;
        let series = taylor(&mut expr, root, "x", 0.0, 5).unwrap();
        let mut env = std::collections::HashMap::new();
        env.insert("x".to_string(), 0.3);
        let approx = expr.eval(series, &env).unwrap();
        assert!((approx - 0.3f64.exp()).abs() < 1e-3);
    }

    #[test]
    fn sin_taylor_around_zero_is_odd() {
        let mut expr = parse("sin(x)").unwrap();
        let root = expr.root;
        let series = taylor(&mut expr, root, "x", 0.0, 3).unwrap();
        let mut env = std::collections::HashMap::new();
        env.insert("x".to_string(), 0.1);
        let approx = expr.eval(series, &env).unwrap();
        assert!((approx - 0.1f64.sin()).abs() < 1e-5);
    }
}

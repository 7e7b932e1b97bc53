// ABOUTME: Fixed-point rewrite loop - neutral elements, constant folding, like-term collection, power laws

use super::expr::{apply_func, NodeId, SymExpr, SymNode};

const MAX_PASSES: usize = 16;

pub fn simplify(expr: &mut SymExpr, root: NodeId) -> NodeId {
    let mut current = root;
    for _ in 0..MAX_PASSES {
        let next = simplify_once(expr, current);
        if expr.to_string_at(next) == expr.to_string_at(current) {
            return next;
        }
        current = next;
    }
    current
}

fn is_num(expr: &SymExpr, id: NodeId, target: f64) -> bool {
    matches!(expr.get(id), SymNode::Num(v) if (*v - target).abs() < 1e-12)
}

fn as_coef_term(expr: &mut SymExpr, id: NodeId) -> (f64, NodeId) {
    match expr.get(id).clone() {
        SymNode::Mul(a, b) => {
            if let SymNode::Num(c) = expr.get(a) {
                return (*c, b);
            }
            if let SymNode::Num(c) = expr.get(b) {
                return (*c, a);
            }
            (1.0, id)
        }
        SymNode::Neg(a) => {
            let (c, t) = as_coef_term(expr, a);
            (-c, t)
        }
        _ => (1.0, id),
    }
}

fn simplify_once(expr: &mut SymExpr, id: NodeId) -> NodeId {
    match expr.get(id).clone() {
        SymNode::Num(_) | SymNode::Var(_) => id,

        SymNode::Neg(a) => {
            let a = simplify_once(expr, a);
            match expr.get(a).clone() {
                SymNode::Num(v) => expr.num(-v),
                SymNode::Neg(inner) => inner,
                _ => expr.push(SymNode::Neg(a)),
            }
        }

        SymNode::Add(a, b) => {
            let a = simplify_once(expr, a);
            let b = simplify_once(expr, b);
            if let (SymNode::Num(x), SymNode::Num(y)) = (expr.get(a).clone(), expr.get(b).clone()) {
                return expr.num(x + y);
            }
            if is_num(expr, a, 0.0) {
                return b;
            }
            if is_num(expr, b, 0.0) {
                return a;
            }
            let (coef_a, term_a) = as_coef_term(expr, a);
            let (coef_b, term_b) = as_coef_term(expr, b);
            if expr.structurally_eq(term_a, term_b) {
                let coef = expr.num(coef_a + coef_b);
                return expr.push(SymNode::Mul(coef, term_a));
            }
            expr.push(SymNode::Add(a, b))
        }

        SymNode::Mul(a, b) => {
            let a = simplify_once(expr, a);
            let b = simplify_once(expr, b);
            if is_num(expr, a, 0.0) || is_num(expr, b, 0.0) {
                return expr.num(0.0);
            }
            if is_num(expr, a, 1.0) {
                return b;
            }
            if is_num(expr, b, 1.0) {
                return a;
            }
            if let (SymNode::Num(x), SymNode::Num(y)) = (expr.get(a).clone(), expr.get(b).clone()) {
                return expr.num(x * y);
            }
            if let (SymNode::Pow(base_a, exp_a), SymNode::Pow(base_b, exp_b)) = (expr.get(a).clone(), expr.get(b).clone()) {
                if expr.structurally_eq(base_a, base_b) {
                    let new_exp = expr.push(SymNode::Add(exp_a, exp_b));
                    let new_exp = simplify_once(expr, new_exp);
                    return expr.push(SymNode::Pow(base_a, new_exp));
                }
            }
            expr.push(SymNode::Mul(a, b))
        }

        SymNode::Pow(a, b) => {
            let a = simplify_once(expr, a);
            let b = simplify_once(expr, b);
            if is_num(expr, b, 0.0) {
                return expr.num(1.0);
            }
            if is_num(expr, b, 1.0) {
                return a;
            }
            if let SymNode::Pow(base, exp1) = expr.get(a).clone() {
                let new_exp = expr.push(SymNode::Mul(exp1, b));
                let new_exp = simplify_once(expr, new_exp);
                return expr.push(SymNode::Pow(base, new_exp));
            }
            if let (SymNode::Num(x), SymNode::Num(y)) = (expr.get(a).clone(), expr.get(b).clone()) {
                return expr.num(x.powf(y));
            }
            expr.push(SymNode::Pow(a, b))
        }

        SymNode::Div(a, b) => {
            let a = simplify_once(expr, a);
            let b = simplify_once(expr, b);
            if is_num(expr, a, 0.0) {
                return expr.num(0.0);
            }
            if is_num(expr, b, 1.0) {
                return a;
            }
            if let (SymNode::Num(x), SymNode::Num(y)) = (expr.get(a).clone(), expr.get(b).clone()) {
                if y != 0.0 {
                    return expr.num(x / y);
                }
            }
            expr.push(SymNode::Div(a, b))
        }

        SymNode::Func(name, a) => {
            let a = simplify_once(expr, a);
            if let SymNode::Num(x) = expr.get(a) {
                if let Ok(v) = apply_func(&name, *x) {
                    return expr.num(v);
                }
            }
            expr.push(SymNode::Func(name, a))
        }
    }
}

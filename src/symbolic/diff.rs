// ABOUTME: Structural differentiation - sum/product/quotient/chain/power rules, result simplified before return

use super::expr::{NodeId, SymExpr, SymNode};
use super::simplify::simplify;

pub fn diff(expr: &mut SymExpr, root: NodeId, var: &str) -> NodeId {
    let d = diff_node(expr, root, var);
    simplify(expr, d)
}

fn diff_node(expr: &mut SymExpr, id: NodeId, var: &str) -> NodeId {
    match expr.get(id).clone() {
        SymNode::Num(_) => expr.num(0.0),

        SymNode::Var(name) => expr.num(if name == var { 1.0 } else { 0.0 }),

        SymNode::Neg(a) => {
            let da = diff_node(expr, a, var);
            expr.push(SymNode::Neg(da))
        }

        SymNode::Add(a, b) => {
            let da = diff_node(expr, a, var);
            let db = diff_node(expr, b, var);
            expr.push(SymNode::Add(da, db))
        }

        SymNode::Mul(a, b) => {
            let da = diff_node(expr, a, var);
            let db = diff_node(expr, b, var);
            let t1 = expr.push(SymNode::Mul(da, b));
            let t2 = expr.push(SymNode::Mul(a, db));
            expr.push(SymNode::Add(t1, t2))
        }

        SymNode::Div(a, b) => {
            // quotient rule: (f'g - fg') / g^2
            let da = diff_node(expr, a, var);
            let db = diff_node(expr, b, var);
            let t1 = expr.push(SymNode::Mul(da, b));
            let t2 = expr.push(SymNode::Mul(a, db));
            let neg_t2 = expr.push(SymNode::Neg(t2));
            let numerator = expr.push(SymNode::Add(t1, neg_t2));
            let denominator = expr.push(SymNode::Mul(b, b));
            expr.push(SymNode::Div(numerator, denominator))
        }

        SymNode::Pow(base, exponent) => {
            if let SymNode::Num(n) = expr.get(exponent) {
                // constant-exponent power rule: n * f^(n-1) * f'
                let n = *n;
                let dbase = diff_node(expr, base, var);
                let n_minus_1 = expr.num(n - 1.0);
                let lowered_pow = expr.push(SymNode::Pow(base, n_minus_1));
                let coef = expr.num(n);
                let scaled = expr.push(SymNode::Mul(coef, lowered_pow));
                expr.push(SymNode::Mul(scaled, dbase))
            } else {
                // logarithmic differentiation for a variable exponent:
                // f^g * (g' * ln(f) + g * f'/f)
                let dbase = diff_node(expr, base, var);
                let dexp = diff_node(expr, exponent, var);
                let ln_base = expr.push(SymNode::Func("ln".to_string(), base));
                let t1 = expr.push(SymNode::Mul(dexp, ln_base));
                let t2_num = expr.push(SymNode::Mul(exponent, dbase));
                let t2 = expr.push(SymNode::Div(t2_num, base));
                let inner = expr.push(SymNode::Add(t1, t2));
                let original_pow = expr.push(SymNode::Pow(base, exponent));
                expr.push(SymNode::Mul(original_pow, inner))
            }
        }

        SymNode::Func(name, a) => {
            let da = diff_node(expr, a, var);
            let outer = func_derivative(expr, &name, a);
            expr.push(SymNode::Mul(outer, da))
        }
    }
}

/// g'(f) for each named unary function, expressed in terms of the
/// argument node `a` (the chain rule multiplies this by `a`'s own
/// derivative at the call site).
fn func_derivative(expr: &mut SymExpr, name: &str, a: NodeId) -> NodeId {
    match name {
        "sin" => expr.push(SymNode::Func("cos".to_string(), a)),
        "cos" => {
            let s = expr.push(SymNode::Func("sin".to_string(), a));
            expr.push(SymNode::Neg(s))
        }
        "tan" => {
            let c = expr.push(SymNode::Func("cos".to_string(), a));
            let two = expr.num(2.0);
            let c2 = expr.push(SymNode::Pow(c, two));
            let one = expr.num(1.0);
            expr.push(SymNode::Div(one, c2))
        }
        "exp" => expr.push(SymNode::Func("exp".to_string(), a)),
        "ln" => {
            let one = expr.num(1.0);
            expr.push(SymNode::Div(one, a))
        }
        "sqrt" => {
            let one = expr.num(1.0);
            let two = expr.num(2.0);
            let s = expr.push(SymNode::Func("sqrt".to_string(), a));
            let denom = expr.push(SymNode::Mul(two, s));
            expr.push(SymNode::Div(one, denom))
        }
        "abs" => {
            let abs_a = expr.push(SymNode::Func("abs".to_string(), a));
            expr.push(SymNode::Div(a, abs_a))
        }
        "asin" | "acos" => {
            let one = expr.num(1.0);
            let two = expr.num(2.0);
            let a2 = expr.push(SymNode::Pow(a, two));
            let neg_a2 = expr.push(SymNode::Neg(a2));
            let inner = expr.push(SymNode::Add(one, neg_a2));
            let half = expr.num(0.5);
            let root = expr.push(SymNode::Pow(inner, half));
            let one_again = expr.num(1.0);
            let deriv = expr.push(SymNode::Div(one_again, root));
            if name == "acos" {
                expr.push(SymNode::Neg(deriv))
            } else {
                deriv
            }
        }
        "atan" => {
            let one = expr.num(1.0);
            let two = expr.num(2.0);
            let a2 = expr.push(SymNode::Pow(a, two));
            let denom = expr.push(SymNode::Add(one, a2));
            let one_again = expr.num(1.0);
            expr.push(SymNode::Div(one_again, denom))
        }
        "sinh" => expr.push(SymNode::Func("cosh".to_string(), a)),
        "cosh" => expr.push(SymNode::Func("sinh".to_string(), a)),
        "tanh" => {
            let one = expr.num(1.0);
            let two = expr.num(2.0);
            let t = expr.push(SymNode::Func("tanh".to_string(), a));
            let t2 = expr.push(SymNode::Pow(t, two));
            let neg_t2 = expr.push(SymNode::Neg(t2));
            expr.push(SymNode::Add(one, neg_t2))
        }
        _ => expr.num(0.0),
    }
}

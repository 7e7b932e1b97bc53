// ABOUTME: Arena-indexed symbolic expression tree - numbers, variables, arithmetic, named unary functions

use std::collections::HashMap;

pub type NodeId = usize;

const UNARY_FUNCS: &[&str] = &[
    "sin", "cos", "tan", "exp", "ln", "sqrt", "abs", "asin", "acos", "atan", "sinh", "cosh", "tanh",
];

pub fn is_known_function(name: &str) -> bool {
    UNARY_FUNCS.contains(&name)
}

#[derive(Debug, Clone, PartialEq)]
pub enum SymNode {
    Num(f64),
    Var(String),
    Add(NodeId, NodeId),
    Mul(NodeId, NodeId),
    Pow(NodeId, NodeId),
    Neg(NodeId),
    Div(NodeId, NodeId),
    Func(String, NodeId),
}

/// `nodes` is append-only: every transformation (simplify, differentiate,
/// integrate) pushes new nodes and may freely reference existing ones,
/// giving structural sharing without ever mutating a live node in place.
#[derive(Debug, Clone)]
pub struct SymExpr {
    pub nodes: Vec<SymNode>,
    pub root: NodeId,
}

impl SymExpr {
    pub fn new() -> Self {
        Self { nodes: Vec::new(), root: 0 }
    }

    pub fn push(&mut self, node: SymNode) -> NodeId {
        self.nodes.push(node);
        self.nodes.len() - 1
    }

    pub fn num(&mut self, v: f64) -> NodeId {
        self.push(SymNode::Num(v))
    }

    pub fn var(&mut self, name: &str) -> NodeId {
        self.push(SymNode::Var(name.to_string()))
    }

    pub fn get(&self, id: NodeId) -> &SymNode {
        &self.nodes[id]
    }

    pub fn eval(&self, id: NodeId, env: &HashMap<String, f64>) -> Result<f64, String> {
        match &self.nodes[id] {
            SymNode::Num(v) => Ok(*v),
            SymNode::Var(name) => match name.as_str() {
                "pi" => Ok(std::f64::consts::PI),
                "e" => Ok(std::f64::consts::E),
                _ => env.get(name).copied().ok_or_else(|| format!("undefined symbolic variable '{name}'")),
            },
            SymNode::Add(a, b) => Ok(self.eval(*a, env)? + self.eval(*b, env)?),
            SymNode::Mul(a, b) => Ok(self.eval(*a, env)? * self.eval(*b, env)?),
            SymNode::Pow(a, b) => Ok(self.eval(*a, env)?.powf(self.eval(*b, env)?)),
            SymNode::Neg(a) => Ok(-self.eval(*a, env)?),
            SymNode::Div(a, b) => Ok(self.eval(*a, env)? / self.eval(*b, env)?),
            SymNode::Func(name, a) => apply_func(name, self.eval(*a, env)?),
        }
    }

    pub fn to_string_at(&self, id: NodeId) -> String {
        match &self.nodes[id] {
            SymNode::Num(v) => crate::value::format_number(*v),
            SymNode::Var(name) => name.clone(),
            SymNode::Add(a, b) => format!("({}+{})", self.to_string_at(*a), self.to_string_at(*b)),
            SymNode::Mul(a, b) => format!("({}*{})", self.to_string_at(*a), self.to_string_at(*b)),
            SymNode::Pow(a, b) => format!("({}^{})", self.to_string_at(*a), self.to_string_at(*b)),
            SymNode::Neg(a) => format!("(-{})", self.to_string_at(*a)),
            SymNode::Div(a, b) => format!("({}/{})", self.to_string_at(*a), self.to_string_at(*b)),
            SymNode::Func(name, a) => format!("{name}({})", self.to_string_at(*a)),
        }
    }

    pub fn structurally_eq(&self, a: NodeId, b: NodeId) -> bool {
        match (&self.nodes[a], &self.nodes[b]) {
            (SymNode::Num(x), SymNode::Num(y)) => (x - y).abs() < 1e-12,
            (SymNode::Var(x), SymNode::Var(y)) => x == y,
            (SymNode::Add(a1, b1), SymNode::Add(a2, b2)) => self.structurally_eq(*a1, *a2) && self.structurally_eq(*b1, *b2),
            (SymNode::Mul(a1, b1), SymNode::Mul(a2, b2)) => self.structurally_eq(*a1, *a2) && self.structurally_eq(*b1, *b2),
            (SymNode::Pow(a1, b1), SymNode::Pow(a2, b2)) => self.structurally_eq(*a1, *a2) && self.structurally_eq(*b1, *b2),
            (SymNode::Div(a1, b1), SymNode::Div(a2, b2)) => self.structurally_eq(*a1, *a2) && self.structurally_eq(*b1, *b2),
            (SymNode::Neg(a1), SymNode::Neg(a2)) => self.structurally_eq(*a1, *a2),
            (SymNode::Func(n1, a1), SymNode::Func(n2, a2)) => n1 == n2 && self.structurally_eq(*a1, *a2),
            _ => false,
        }
    }
}

impl Default for SymExpr {
    fn default() -> Self {
        Self::new()
    }
}

pub fn apply_func(name: &str, x: f64) -> Result<f64, String> {
    Ok(match name {
        "sin" => x.sin(),
        "cos" => x.cos(),
        "tan" => x.tan(),
        "exp" => x.exp(),
        "ln" => x.ln(),
        "sqrt" => x.sqrt(),
        "abs" => x.abs(),
        "asin" => x.asin(),
        "acos" => x.acos(),
        "atan" => x.atan(),
        "sinh" => x.sinh(),
        "cosh" => x.cosh(),
        "tanh" => x.tanh(),
        other => return Err(format!("unknown symbolic function '{other}'")),
    })
}

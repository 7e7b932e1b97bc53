// ABOUTME: Small recursive-descent parser for symbolic expression strings

use std::iter::Peekable;
use std::str::Chars;

use super::expr::{is_known_function, NodeId, SymExpr, SymNode};

pub fn parse(input: &str) -> Result<SymExpr, String> {
    let mut p = Parser { chars: input.chars().peekable(), expr: SymExpr::new() };
    let root = p.parse_expr()?;
    p.skip_ws();
    if p.chars.peek().is_some() {
        return Err(format!("unexpected trailing input in symbolic expression '{input}'"));
    }
    p.expr.root = root;
    Ok(p.expr)
}

struct Parser<'a> {
    chars: Peekable<Chars<'a>>,
    expr: SymExpr,
}

impl<'a> Parser<'a> {
    fn skip_ws(&mut self) {
        while matches!(self.chars.peek(), Some(c) if c.is_whitespace()) {
            self.chars.next();
        }
    }

    fn peek(&mut self) -> Option<char> {
        self.skip_ws();
        self.chars.peek().copied()
    }

    // expr := term (('+' | '-') term)*
    fn parse_expr(&mut self) -> Result<NodeId, String> {
        let mut left = self.parse_term()?;
        loop {
            match self.peek() {
                Some('+') => {
                    self.chars.next();
                    let right = self.parse_term()?;
                    left = self.expr.push(SymNode::Add(left, right));
                }
                Some('-') => {
                    self.chars.next();
                    let right = self.parse_term()?;
                    let neg = self.expr.push(SymNode::Neg(right));
                    left = self.expr.push(SymNode::Add(left, neg));
                }
                _ => break,
            }
        }
        Ok(left)
    }

    // term := unary (('*' | '/') unary)*
    fn parse_term(&mut self) -> Result<NodeId, String> {
        let mut left = self.parse_unary()?;
        loop {
            match self.peek() {
                Some('*') => {
                    self.chars.next();
                    let right = self.parse_unary()?;
                    left = self.expr.push(SymNode::Mul(left, right));
                }
                Some('/') => {
                    self.chars.next();
                    let right = self.parse_unary()?;
                    left = self.expr.push(SymNode::Div(left, right));
                }
                _ => break,
            }
        }
        Ok(left)
    }

    // unary := '-' unary | power
    fn parse_unary(&mut self) -> Result<NodeId, String> {
        if self.peek() == Some('-') {
            self.chars.next();
            let inner = self.parse_unary()?;
            return Ok(self.expr.push(SymNode::Neg(inner)));
        }
        if self.peek() == Some('+') {
            self.chars.next();
            return self.parse_unary();
        }
        self.parse_pow()
    }

    // power := primary ('^' unary)?   (right-associative)
    fn parse_pow(&mut self) -> Result<NodeId, String> {
        let base = self.parse_primary()?;
        if self.peek() == Some('^') {
            self.chars.next();
            let exponent = self.parse_unary()?;
            return Ok(self.expr.push(SymNode::Pow(base, exponent)));
        }
        Ok(base)
    }

    fn parse_primary(&mut self) -> Result<NodeId, String> {
        match self.peek() {
            Some('(') => {
                self.chars.next();
                let inner = self.parse_expr()?;
                self.skip_ws();
                if self.chars.next() != Some(')') {
                    return Err("unmatched parenthesis in symbolic expression".to_string());
                }
                Ok(inner)
            }
            Some(c) if c.is_ascii_digit() || c == '.' => self.parse_number(),
            Some(c) if c.is_alphabetic() || c == '_' => self.parse_ident(),
            Some(c) => Err(format!("unexpected character '{c}' in symbolic expression")),
            None => Err("unexpected end of symbolic expression".to_string()),
        }
    }

    fn parse_number(&mut self) -> Result<NodeId, String> {
        let mut s = String::new();
        while matches!(self.chars.peek(), Some(c) if c.is_ascii_digit() || *c == '.') {
            s.push(self.chars.next().unwrap());
        }
        if matches!(self.chars.peek(), Some('e') | Some('E')) {
            let mut lookahead = self.chars.clone();
            lookahead.next();
            if matches!(lookahead.peek(), Some(c) if c.is_ascii_digit() || *c == '+' || *c == '-') {
                s.push(self.chars.next().unwrap());
                if matches!(self.chars.peek(), Some('+') | Some('-')) {
                    s.push(self.chars.next().unwrap());
                }
                while matches!(self.chars.peek(), Some(c) if c.is_ascii_digit()) {
                    s.push(self.chars.next().unwrap());
                }
            }
        }
        let v: f64 = s.parse().map_err(|_| format!("invalid number literal '{s}'"))?;
        Ok(self.expr.num(v))
    }

    fn parse_ident(&mut self) -> Result<NodeId, String> {
        let mut s = String::new();
        while matches!(self.chars.peek(), Some(c) if c.is_alphanumeric() || *c == '_') {
            s.push(self.chars.next().unwrap());
        }
        if self.peek() == Some('(') {
            if !is_known_function(&s) {
                return Err(format!("unknown symbolic function '{s}'"));
            }
            self.chars.next();
            let arg = self.parse_expr()?;
            self.skip_ws();
            if self.chars.next() != Some(')') {
                return Err(format!("unmatched parenthesis in call to '{s}'"));
            }
            return Ok(self.expr.push(SymNode::Func(s, arg)));
        }
        Ok(self.expr.var(&s))
    }
}

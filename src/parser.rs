// ABOUTME: Recursive-descent parser with precedence climbing producing the AST

use crate::ast::*;
use crate::error::{ParseError, Pos};
use crate::lexer::Lexer;
use crate::token::{Token, TokenKind};

pub fn parse(src: &str) -> Result<Vec<Stmt>, ParseError> {
    let tokens = Lexer::new(src)
        .tokenize()
        .map_err(|e| ParseError::new(e.message, e.pos, None))?;
    let mut parser = Parser::new(tokens);
    parser.parse_program()
}

pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    /// >0 while inside a `[...]`/`{...}` literal: enables the whitespace
    /// sign-disambiguation rule (spec.md §4.2) in the additive level.
    in_matrix: u32,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, pos: 0, in_matrix: 0 }
    }

    fn peek(&self) -> &Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn peek_at(&self, offset: usize) -> &Token {
        let idx = (self.pos + offset).min(self.tokens.len() - 1);
        &self.tokens[idx]
    }

    fn here(&self) -> Pos {
        self.peek().pos
    }

    fn advance(&mut self) -> Token {
        let tok = self.peek().clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        tok
    }

    fn check(&self, kind: &TokenKind) -> bool {
        std::mem::discriminant(&self.peek().kind) == std::mem::discriminant(kind)
    }

    fn check_any(&self, kinds: &[TokenKind]) -> bool {
        kinds.iter().any(|k| self.check(k))
    }

    fn expect(&mut self, kind: TokenKind) -> Result<Token, ParseError> {
        if self.check(&kind) {
            Ok(self.advance())
        } else {
            Err(ParseError::new(
                format!("expected {:?}", kind),
                self.here(),
                Some(self.peek().lexeme.clone()),
            ))
        }
    }

    fn expect_ident(&mut self) -> Result<String, ParseError> {
        match &self.peek().kind {
            TokenKind::Ident(name) => {
                let name = name.clone();
                self.advance();
                Ok(name)
            }
            _ => Err(ParseError::new(
                "expected identifier",
                self.here(),
                Some(self.peek().lexeme.clone()),
            )),
        }
    }

    fn skip_seps(&mut self) {
        while matches!(
            self.peek().kind,
            TokenKind::Newline | TokenKind::Semicolon | TokenKind::Comma
        ) {
            self.advance();
        }
    }

    // ------------------------------------------------------------------
    // Program / blocks
    // ------------------------------------------------------------------

    pub fn parse_program(&mut self) -> Result<Vec<Stmt>, ParseError> {
        self.parse_block(|_| false)
    }

    fn parse_block(&mut self, stop: impl Fn(&TokenKind) -> bool) -> Result<Vec<Stmt>, ParseError> {
        let mut stmts = Vec::new();
        loop {
            self.skip_seps();
            if stop(&self.peek().kind) || self.peek().kind == TokenKind::Eof {
                break;
            }
            stmts.push(self.parse_stmt()?);
        }
        Ok(stmts)
    }

    fn is_block_end(kind: &TokenKind) -> bool {
        matches!(kind, TokenKind::End)
    }

    // ------------------------------------------------------------------
    // Statements
    // ------------------------------------------------------------------

    fn consume_terminator(&mut self) -> bool {
        match self.peek().kind {
            TokenKind::Semicolon => {
                self.advance();
                false
            }
            TokenKind::Comma | TokenKind::Newline => {
                self.advance();
                true
            }
            _ => true,
        }
    }

    fn parse_stmt(&mut self) -> Result<Stmt, ParseError> {
        let pos = self.here();
        match &self.peek().kind {
            TokenKind::If => self.parse_if(),
            TokenKind::For => self.parse_for(),
            TokenKind::While => self.parse_while(),
            TokenKind::Switch => self.parse_switch(),
            TokenKind::Try => self.parse_try(),
            TokenKind::Function => self.parse_function(),
            TokenKind::Return => {
                self.advance();
                self.consume_terminator();
                Ok(Stmt::new(StmtKind::Return, pos))
            }
            TokenKind::Break => {
                self.advance();
                self.consume_terminator();
                Ok(Stmt::new(StmtKind::Break, pos))
            }
            TokenKind::Continue => {
                self.advance();
                self.consume_terminator();
                Ok(Stmt::new(StmtKind::Continue, pos))
            }
            TokenKind::Global => {
                self.advance();
                let mut names = Vec::new();
                while let TokenKind::Ident(_) = self.peek().kind {
                    names.push(self.expect_ident()?);
                }
                self.consume_terminator();
                Ok(Stmt::new(StmtKind::Global(names), pos))
            }
            TokenKind::LBracket => self.parse_multi_assign_or_expr(pos),
            _ => self.parse_assign_or_expr(pos),
        }
    }

    fn parse_if(&mut self) -> Result<Stmt, ParseError> {
        let pos = self.here();
        self.advance(); // if
        let cond = self.parse_expression()?;
        let body = self.parse_block(|k| {
            matches!(k, TokenKind::ElseIf | TokenKind::Else) || Self::is_block_end(k)
        })?;
        let mut elseifs = Vec::new();
        while self.check(&TokenKind::ElseIf) {
            self.advance();
            let c = self.parse_expression()?;
            let b = self.parse_block(|k| {
                matches!(k, TokenKind::ElseIf | TokenKind::Else) || Self::is_block_end(k)
            })?;
            elseifs.push(ElseIf { cond: c, body: b });
        }
        let else_body = if self.check(&TokenKind::Else) {
            self.advance();
            Some(self.parse_block(Self::is_block_end)?)
        } else {
            None
        };
        self.expect(TokenKind::End)?;
        self.consume_terminator();
        Ok(Stmt::new(StmtKind::If { cond, body, elseifs, else_body }, pos))
    }

    fn parse_for(&mut self) -> Result<Stmt, ParseError> {
        let pos = self.here();
        self.advance(); // for
        let has_paren = self.check(&TokenKind::LParen);
        if has_paren {
            self.advance();
        }
        let var = self.expect_ident()?;
        self.expect(TokenKind::Assign)?;
        let range = self.parse_expression()?;
        if has_paren {
            self.expect(TokenKind::RParen)?;
        }
        let body = self.parse_block(Self::is_block_end)?;
        self.expect(TokenKind::End)?;
        self.consume_terminator();
        Ok(Stmt::new(StmtKind::For { var, range, body }, pos))
    }

    fn parse_while(&mut self) -> Result<Stmt, ParseError> {
        let pos = self.here();
        self.advance(); // while
        let cond = self.parse_expression()?;
        let body = self.parse_block(Self::is_block_end)?;
        self.expect(TokenKind::End)?;
        self.consume_terminator();
        Ok(Stmt::new(StmtKind::While { cond, body }, pos))
    }

    fn parse_switch(&mut self) -> Result<Stmt, ParseError> {
        let pos = self.here();
        self.advance(); // switch
        let scrutinee = self.parse_expression()?;
        let mut cases = Vec::new();
        self.skip_seps();
        while self.check(&TokenKind::Case) {
            self.advance();
            let value = self.parse_expression()?;
            let body = self.parse_block(|k| {
                matches!(k, TokenKind::Case | TokenKind::Otherwise) || Self::is_block_end(k)
            })?;
            cases.push(CaseArm { value, body });
        }
        let otherwise = if self.check(&TokenKind::Otherwise) {
            self.advance();
            Some(self.parse_block(Self::is_block_end)?)
        } else {
            None
        };
        self.expect(TokenKind::End)?;
        self.consume_terminator();
        Ok(Stmt::new(StmtKind::Switch { scrutinee, cases, otherwise }, pos))
    }

    fn parse_try(&mut self) -> Result<Stmt, ParseError> {
        let pos = self.here();
        self.advance(); // try
        let body = self.parse_block(|k| matches!(k, TokenKind::Catch) || Self::is_block_end(k))?;
        let mut catch_var = None;
        let mut catch_body = Vec::new();
        if self.check(&TokenKind::Catch) {
            self.advance();
            if let TokenKind::Ident(name) = self.peek().kind.clone() {
                catch_var = Some(name);
                self.advance();
            }
            catch_body = self.parse_block(Self::is_block_end)?;
        }
        self.expect(TokenKind::End)?;
        self.consume_terminator();
        Ok(Stmt::new(StmtKind::Try { body, catch_var, catch_body }, pos))
    }

    fn parse_function(&mut self) -> Result<Stmt, ParseError> {
        let pos = self.here();
        self.advance(); // function
        let mut outputs = Vec::new();
        let name;
        if self.check(&TokenKind::LBracket) {
            self.advance();
            if !self.check(&TokenKind::RBracket) {
                loop {
                    outputs.push(self.expect_ident()?);
                    if self.check(&TokenKind::Comma) {
                        self.advance();
                        continue;
                    }
                    break;
                }
            }
            self.expect(TokenKind::RBracket)?;
            self.expect(TokenKind::Assign)?;
            name = self.expect_ident()?;
        } else {
            let first = self.expect_ident()?;
            if self.check(&TokenKind::Assign) {
                self.advance();
                outputs.push(first);
                name = self.expect_ident()?;
            } else {
                name = first;
            }
        }
        let mut params = Vec::new();
        self.expect(TokenKind::LParen)?;
        if !self.check(&TokenKind::RParen) {
            loop {
                params.push(self.expect_ident()?);
                if self.check(&TokenKind::Comma) {
                    self.advance();
                    continue;
                }
                break;
            }
        }
        self.expect(TokenKind::RParen)?;
        let body = self.parse_block(Self::is_block_end)?;
        // Tolerate EOF as a terminator for script-style function bodies.
        if self.check(&TokenKind::End) {
            self.advance();
        }
        self.consume_terminator();
        Ok(Stmt::new(
            StmtKind::Function(FunctionDef { name, params, outputs, body, pos }),
            pos,
        ))
    }

    /// `[a, b] = f(...)` is parsed speculatively: save position, try to
    /// consume a target list followed by `] =`; on failure restore and
    /// fall back to treating `[` as a matrix-literal expression statement
    /// (spec.md §4.2).
    fn parse_multi_assign_or_expr(&mut self, pos: Pos) -> Result<Stmt, ParseError> {
        let save = self.pos;
        if let Some(stmt) = self.try_parse_multi_assign(pos) {
            return Ok(stmt);
        }
        self.pos = save;
        self.parse_assign_or_expr(pos)
    }

    fn try_parse_multi_assign(&mut self, pos: Pos) -> Option<Stmt> {
        self.advance(); // [
        let mut targets = Vec::new();
        if !self.check(&TokenKind::RBracket) {
            loop {
                match &self.peek().kind {
                    TokenKind::Not => {
                        targets.push(Target::Discard);
                        self.advance();
                    }
                    TokenKind::Ident(name) => {
                        targets.push(Target::Name(name.clone()));
                        self.advance();
                    }
                    _ => return None,
                }
                if self.check(&TokenKind::Comma) {
                    self.advance();
                    continue;
                }
                break;
            }
        }
        if !self.check(&TokenKind::RBracket) {
            return None;
        }
        self.advance(); // ]
        if !self.check(&TokenKind::Assign) {
            return None;
        }
        self.advance();
        let value = self.parse_expression().ok()?;
        let print = self.consume_terminator();
        Some(Stmt::new(StmtKind::MultiAssign { targets, value, print }, pos))
    }

    fn parse_assign_or_expr(&mut self, pos: Pos) -> Result<Stmt, ParseError> {
        let expr = self.parse_expression()?;
        if self.check(&TokenKind::Assign) {
            self.advance();
            let value = self.parse_expression()?;
            let print = self.consume_terminator();
            let target = expr_to_target(expr)?;
            Ok(Stmt::new(StmtKind::Assign { target, value, print }, pos))
        } else {
            let print = self.consume_terminator();
            Ok(Stmt::new(StmtKind::Expr { expr, print }, pos))
        }
    }

    // ------------------------------------------------------------------
    // Expressions: precedence climbing, lowest to highest (spec.md §4.2):
    // short-or, short-and, bitwise-or, bitwise-and, comparison, colon-range,
    // add/sub, mul/div, unary prefix, power, postfix.
    // ------------------------------------------------------------------

    pub fn parse_expression(&mut self) -> Result<Expr, ParseError> {
        self.parse_short_or()
    }

    fn parse_short_or(&mut self) -> Result<Expr, ParseError> {
        let mut lhs = self.parse_short_and()?;
        while self.check(&TokenKind::OrOr) {
            let pos = self.here();
            self.advance();
            let rhs = self.parse_short_and()?;
            lhs = Expr::Binary { op: BinOp::ShortOr, lhs: Box::new(lhs), rhs: Box::new(rhs), pos };
        }
        Ok(lhs)
    }

    fn parse_short_and(&mut self) -> Result<Expr, ParseError> {
        let mut lhs = self.parse_bitor()?;
        while self.check(&TokenKind::AndAnd) {
            let pos = self.here();
            self.advance();
            let rhs = self.parse_bitor()?;
            lhs = Expr::Binary { op: BinOp::ShortAnd, lhs: Box::new(lhs), rhs: Box::new(rhs), pos };
        }
        Ok(lhs)
    }

    fn parse_bitor(&mut self) -> Result<Expr, ParseError> {
        let mut lhs = self.parse_bitand()?;
        while self.check(&TokenKind::Pipe) {
            let pos = self.here();
            self.advance();
            let rhs = self.parse_bitand()?;
            lhs = Expr::Binary { op: BinOp::BitOr, lhs: Box::new(lhs), rhs: Box::new(rhs), pos };
        }
        Ok(lhs)
    }

    fn parse_bitand(&mut self) -> Result<Expr, ParseError> {
        let mut lhs = self.parse_comparison()?;
        while self.check(&TokenKind::Amp) {
            let pos = self.here();
            self.advance();
            let rhs = self.parse_comparison()?;
            lhs = Expr::Binary { op: BinOp::BitAnd, lhs: Box::new(lhs), rhs: Box::new(rhs), pos };
        }
        Ok(lhs)
    }

    fn parse_comparison(&mut self) -> Result<Expr, ParseError> {
        let mut lhs = self.parse_colon()?;
        loop {
            let op = match self.peek().kind {
                TokenKind::EqEq => BinOp::Eq,
                TokenKind::NotEq => BinOp::Ne,
                TokenKind::Lt => BinOp::Lt,
                TokenKind::Gt => BinOp::Gt,
                TokenKind::LtEq => BinOp::Le,
                TokenKind::GtEq => BinOp::Ge,
                _ => break,
            };
            let pos = self.here();
            self.advance();
            let rhs = self.parse_colon()?;
            lhs = Expr::Binary { op, lhs: Box::new(lhs), rhs: Box::new(rhs), pos };
        }
        Ok(lhs)
    }

    fn parse_colon(&mut self) -> Result<Expr, ParseError> {
        let pos = self.here();
        let first = self.parse_additive()?;
        if !self.check(&TokenKind::Colon) {
            return Ok(first);
        }
        self.advance();
        let second = self.parse_additive()?;
        if self.check(&TokenKind::Colon) {
            self.advance();
            let third = self.parse_additive()?;
            Ok(Expr::Colon {
                start: Some(Box::new(first)),
                step: Some(Box::new(second)),
                stop: Some(Box::new(third)),
                pos,
            })
        } else {
            Ok(Expr::Colon {
                start: Some(Box::new(first)),
                step: None,
                stop: Some(Box::new(second)),
                pos,
            })
        }
    }

    /// Inside `[...]`/`{...}`, a `+`/`-` preceded by whitespace but not
    /// followed by it starts a new element rather than continuing a binary
    /// expression (`[1 -1]` is two elements; `[1 - 1]` is one).
    fn breaks_for_matrix_element(&self) -> bool {
        self.in_matrix > 0
            && matches!(self.peek().kind, TokenKind::Plus | TokenKind::Minus)
            && self.peek().space_before
            && !self.peek_at(1).space_before
    }

    fn parse_additive(&mut self) -> Result<Expr, ParseError> {
        let mut lhs = self.parse_multiplicative()?;
        loop {
            if self.breaks_for_matrix_element() {
                break;
            }
            let op = match self.peek().kind {
                TokenKind::Plus => BinOp::Add,
                TokenKind::Minus => BinOp::Sub,
                _ => break,
            };
            let pos = self.here();
            self.advance();
            let rhs = self.parse_multiplicative()?;
            lhs = Expr::Binary { op, lhs: Box::new(lhs), rhs: Box::new(rhs), pos };
        }
        Ok(lhs)
    }

    fn parse_multiplicative(&mut self) -> Result<Expr, ParseError> {
        let mut lhs = self.parse_unary()?;
        loop {
            let op = match self.peek().kind {
                TokenKind::Star => BinOp::Mul,
                TokenKind::DotStar => BinOp::DotMul,
                TokenKind::Slash => BinOp::Div,
                TokenKind::DotSlash => BinOp::DotDiv,
                TokenKind::BackSlash => BinOp::LeftDiv,
                TokenKind::DotBackSlash => BinOp::DotLeftDiv,
                _ => break,
            };
            let pos = self.here();
            self.advance();
            let rhs = self.parse_unary()?;
            lhs = Expr::Binary { op, lhs: Box::new(lhs), rhs: Box::new(rhs), pos };
        }
        Ok(lhs)
    }

    fn parse_unary(&mut self) -> Result<Expr, ParseError> {
        let pos = self.here();
        let op = match self.peek().kind {
            TokenKind::Minus => Some(UnOp::Neg),
            TokenKind::Plus => Some(UnOp::Pos),
            TokenKind::Not => Some(UnOp::Not),
            _ => None,
        };
        if let Some(op) = op {
            self.advance();
            let operand = self.parse_unary()?;
            Ok(Expr::Unary { op, operand: Box::new(operand), pos })
        } else {
            self.parse_power()
        }
    }

    fn parse_power(&mut self) -> Result<Expr, ParseError> {
        let base = self.parse_postfix()?;
        let op = match self.peek().kind {
            TokenKind::Caret => BinOp::Pow,
            TokenKind::DotCaret => BinOp::DotPow,
            _ => return Ok(base),
        };
        let pos = self.here();
        self.advance();
        let exponent = self.parse_unary()?; // right-associative via recursion
        Ok(Expr::Binary { op, lhs: Box::new(base), rhs: Box::new(exponent), pos })
    }

    fn parse_postfix(&mut self) -> Result<Expr, ParseError> {
        let mut base = self.parse_primary()?;
        loop {
            match self.peek().kind {
                TokenKind::LParen => {
                    let pos = self.here();
                    self.advance();
                    let args = self.parse_arg_list(&TokenKind::RParen)?;
                    self.expect(TokenKind::RParen)?;
                    base = Expr::Call { callee: Box::new(base), args, pos };
                }
                TokenKind::LBrace => {
                    let pos = self.here();
                    self.advance();
                    let args = self.parse_arg_list(&TokenKind::RBrace)?;
                    self.expect(TokenKind::RBrace)?;
                    base = Expr::CellIndex { target: Box::new(base), args, pos };
                }
                TokenKind::Dot => {
                    let pos = self.here();
                    self.advance();
                    let field = self.expect_ident()?;
                    base = Expr::Field { target: Box::new(base), field, pos };
                }
                TokenKind::Transpose => {
                    let pos = self.here();
                    self.advance();
                    base = Expr::Unary { op: UnOp::Transpose, operand: Box::new(base), pos };
                }
                TokenKind::DotTranspose => {
                    let pos = self.here();
                    self.advance();
                    base = Expr::Unary { op: UnOp::DotTranspose, operand: Box::new(base), pos };
                }
                _ => break,
            }
        }
        Ok(base)
    }

    fn parse_arg_list(&mut self, closer: &TokenKind) -> Result<Vec<Expr>, ParseError> {
        let mut args = Vec::new();
        if self.check(closer) {
            return Ok(args);
        }
        loop {
            if self.check(&TokenKind::Colon) {
                let next = self.peek_at(1).kind.clone();
                if next == TokenKind::Comma || &next == closer {
                    let pos = self.here();
                    self.advance();
                    args.push(Expr::BareColon(pos));
                    if self.check(&TokenKind::Comma) {
                        self.advance();
                        continue;
                    }
                    break;
                }
            }
            args.push(self.parse_expression()?);
            if self.check(&TokenKind::Comma) {
                self.advance();
                continue;
            }
            break;
        }
        Ok(args)
    }

    fn parse_primary(&mut self) -> Result<Expr, ParseError> {
        let pos = self.here();
        match self.peek().kind.clone() {
            TokenKind::Number { value, imaginary } => {
                self.advance();
                Ok(Expr::Number { value, imaginary, pos })
            }
            TokenKind::String(s) => {
                self.advance();
                Ok(Expr::Str(s, pos))
            }
            TokenKind::True => {
                self.advance();
                Ok(Expr::Bool(true, pos))
            }
            TokenKind::False => {
                self.advance();
                Ok(Expr::Bool(false, pos))
            }
            TokenKind::Ident(name) => {
                self.advance();
                Ok(Expr::Ident(name, pos))
            }
            TokenKind::End => {
                self.advance();
                Ok(Expr::End(pos))
            }
            TokenKind::LParen => {
                self.advance();
                let inner = self.parse_expression()?;
                self.expect(TokenKind::RParen)?;
                Ok(inner)
            }
            TokenKind::LBracket => self.parse_matrix_literal(),
            TokenKind::LBrace => self.parse_cell_literal(),
            TokenKind::At => self.parse_at_expr(),
            TokenKind::Colon => {
                self.advance();
                Ok(Expr::BareColon(pos))
            }
            _ => Err(ParseError::new(
                "unexpected token",
                pos,
                Some(self.peek().lexeme.clone()),
            )),
        }
    }

    fn parse_at_expr(&mut self) -> Result<Expr, ParseError> {
        let pos = self.here();
        self.expect(TokenKind::At)?;
        if self.check(&TokenKind::LParen) {
            self.advance();
            let mut params = Vec::new();
            if !self.check(&TokenKind::RParen) {
                loop {
                    params.push(self.expect_ident()?);
                    if self.check(&TokenKind::Comma) {
                        self.advance();
                        continue;
                    }
                    break;
                }
            }
            self.expect(TokenKind::RParen)?;
            let body = self.parse_expression()?;
            Ok(Expr::Anonymous { params, body: Box::new(body), pos })
        } else {
            let name = self.expect_ident()?;
            Ok(Expr::Handle { name, pos })
        }
    }

    fn parse_matrix_literal(&mut self) -> Result<Expr, ParseError> {
        let pos = self.here();
        self.expect(TokenKind::LBracket)?;
        self.in_matrix += 1;
        let result = self.parse_rows(&TokenKind::RBracket);
        self.in_matrix -= 1;
        let rows = result?;
        self.expect(TokenKind::RBracket)?;
        Ok(Expr::Matrix { rows, pos })
    }

    fn parse_cell_literal(&mut self) -> Result<Expr, ParseError> {
        let pos = self.here();
        self.expect(TokenKind::LBrace)?;
        self.in_matrix += 1;
        let result = self.parse_rows(&TokenKind::RBrace);
        self.in_matrix -= 1;
        let rows = result?;
        self.expect(TokenKind::RBrace)?;
        Ok(Expr::Cell { rows, pos })
    }

    fn parse_rows(&mut self, closer: &TokenKind) -> Result<Vec<Vec<Expr>>, ParseError> {
        let mut rows = Vec::new();
        let mut cur_row = Vec::new();
        while matches!(self.peek().kind, TokenKind::Newline | TokenKind::Semicolon) {
            self.advance();
        }
        while !self.check(closer) {
            let el = self.parse_expression()?;
            cur_row.push(el);
            match &self.peek().kind {
                TokenKind::Comma => {
                    self.advance();
                }
                TokenKind::Semicolon | TokenKind::Newline => {
                    self.advance();
                    while matches!(self.peek().kind, TokenKind::Semicolon | TokenKind::Newline) {
                        self.advance();
                    }
                    rows.push(std::mem::take(&mut cur_row));
                }
                _ => {
                    // whitespace-tolerated element separator: loop again
                    // without consuming a token.
                }
            }
        }
        if !cur_row.is_empty() {
            rows.push(cur_row);
        }
        Ok(rows)
    }
}

fn expr_to_target(expr: Expr) -> Result<Target, ParseError> {
    match expr {
        Expr::Ident(name, _) => Ok(Target::Name(name)),
        Expr::Call { .. } | Expr::Field { .. } | Expr::CellIndex { .. } => {
            Ok(Target::Indexed(Box::new(expr)))
        }
        other => Err(ParseError::new("invalid assignment target", other.pos(), None)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_ok(src: &str) -> Vec<Stmt> {
        parse(src).unwrap()
    }

    #[test]
    fn parses_simple_assignment() {
        let stmts = parse_ok("x = 1 + 2;");
        assert_eq!(stmts.len(), 1);
        match &stmts[0].kind {
            StmtKind::Assign { target: Target::Name(n), print, .. } => {
                assert_eq!(n, "x");
                assert!(!print);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn parses_matrix_literal_with_space_separated_negative() {
        let stmts = parse_ok("A = [1 -1];");
        match &stmts[0].kind {
            StmtKind::Assign { value: Expr::Matrix { rows, .. }, .. } => {
                assert_eq!(rows.len(), 1);
                assert_eq!(rows[0].len(), 2);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn parses_matrix_literal_with_spaced_subtraction_as_one_element() {
        let stmts = parse_ok("A = [1 - 1];");
        match &stmts[0].kind {
            StmtKind::Assign { value: Expr::Matrix { rows, .. }, .. } => {
                assert_eq!(rows[0].len(), 1);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn parses_multi_return_assignment() {
        let stmts = parse_ok("[a, b] = size(x);");
        match &stmts[0].kind {
            StmtKind::MultiAssign { targets, .. } => {
                assert_eq!(targets.len(), 2);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn bracket_as_statement_falls_back_to_matrix_literal() {
        // No `] =` follows, so this must parse as an expression statement.
        let stmts = parse_ok("[1 2 3]");
        match &stmts[0].kind {
            StmtKind::Expr { expr: Expr::Matrix { .. }, .. } => {}
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn parses_power_right_associative() {
        let stmts = parse_ok("x = 2^3^2;");
        match &stmts[0].kind {
            StmtKind::Assign { value: Expr::Binary { op: BinOp::Pow, rhs, .. }, .. } => {
                assert!(matches!(**rhs, Expr::Binary { op: BinOp::Pow, .. }));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn colon_binds_looser_than_additive() {
        let stmts = parse_ok("x = 1:n+1;");
        match &stmts[0].kind {
            StmtKind::Assign { value: Expr::Colon { stop: Some(s), .. }, .. } => {
                assert!(matches!(**s, Expr::Binary { op: BinOp::Add, .. }));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn parses_if_elseif_else() {
        let stmts = parse_ok("if x > 0\n  y = 1;\nelseif x < 0\n  y = -1;\nelse\n  y = 0;\nend");
        match &stmts[0].kind {
            StmtKind::If { elseifs, else_body, .. } => {
                assert_eq!(elseifs.len(), 1);
                assert!(else_body.is_some());
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn parses_function_with_multi_output_header() {
        let stmts = parse_ok("function [a, b] = f(x)\n  a = x;\n  b = x*2;\nend");
        match &stmts[0].kind {
            StmtKind::Function(def) => {
                assert_eq!(def.name, "f");
                assert_eq!(def.outputs, vec!["a", "b"]);
                assert_eq!(def.params, vec!["x"]);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn parses_anonymous_function() {
        let stmts = parse_ok("f = @(x) x^2 + 1;");
        match &stmts[0].kind {
            StmtKind::Assign { value: Expr::Anonymous { params, .. }, .. } => {
                assert_eq!(params, &vec!["x".to_string()]);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn parses_end_inside_indexing() {
        let stmts = parse_ok("y = x(end-1);");
        match &stmts[0].kind {
            StmtKind::Assign { value: Expr::Call { args, .. }, .. } => {
                assert!(matches!(args[0], Expr::Binary { op: BinOp::Sub, .. }));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn parses_try_catch_with_bound_variable() {
        let stmts = parse_ok("try\n  x = 1/0;\ncatch err\n  disp(err.message);\nend");
        match &stmts[0].kind {
            StmtKind::Try { catch_var, .. } => {
                assert_eq!(catch_var.as_deref(), Some("err"));
            }
            other => panic!("unexpected {:?}", other),
        }
    }
}

// ABOUTME: Hand-written lexer turning source text into a token stream
//
// The one piece of lexer state that matters is the previously emitted
// token: it decides whether a `'` closes a preceding primary (transpose)
// or opens a new string literal. There is no grammar-only way to make that
// call, so the lexer tracks `prev_kind` across calls to `next_token`.

use crate::error::{LexError, Pos};
use crate::token::{starts_transpose, terminates_statement, Token, TokenKind};

pub struct Lexer {
    chars: Vec<char>,
    pos: usize,
    line: usize,
    col: usize,
    prev_kind: Option<TokenKind>,
}

fn keyword(ident: &str) -> Option<TokenKind> {
    use TokenKind::*;
    Some(match ident {
        "if" => If,
        "elseif" => ElseIf,
        "else" => Else,
        "end" => End,
        "for" => For,
        "while" => While,
        "switch" => Switch,
        "case" => Case,
        "otherwise" => Otherwise,
        "try" => Try,
        "catch" => Catch,
        "function" => Function,
        "return" => Return,
        "break" => Break,
        "continue" => Continue,
        "global" => Global,
        "persistent" => Persistent,
        "true" => True,
        "false" => False,
        "classdef" => ClassDef,
        "properties" => Properties,
        "methods" => Methods,
        _ => return None,
    })
}

impl Lexer {
    pub fn new(src: &str) -> Self {
        Self {
            chars: src.chars().collect(),
            pos: 0,
            line: 1,
            col: 1,
            prev_kind: None,
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn here(&self) -> Pos {
        Pos::new(self.line, self.col)
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        if c == '\n' {
            self.line += 1;
            self.col = 1;
        } else {
            self.col += 1;
        }
        Some(c)
    }

    fn matches(&mut self, c: char) -> bool {
        if self.peek() == Some(c) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Tokenize the whole input. Used by the parser, which buffers the
    /// full stream up front (the grammar needs save/restore backtracking
    /// for multi-return assignment, which is simplest against a `Vec<Token>`).
    pub fn tokenize(mut self) -> Result<Vec<Token>, LexError> {
        let mut out = Vec::new();
        loop {
            let tok = self.next_token()?;
            let is_eof = tok.kind == TokenKind::Eof;
            self.prev_kind = Some(tok.kind.clone());
            out.push(tok);
            if is_eof {
                break;
            }
        }
        Ok(out)
    }

    fn next_token(&mut self) -> Result<Token, LexError> {
        // Whether any whitespace, comment, or line continuation was
        // swallowed before the token this call produces - needed by the
        // parser to tell `[1 -1]` (two elements) from `[1 - 1]` (one).
        let mut space_before = false;
        loop {
            match self.peek() {
                None => {
                    let mut tok = Token::new(TokenKind::Eof, "", self.here());
                    tok.space_before = space_before;
                    return Ok(tok);
                }
                Some('\n') => {
                    let pos = self.here();
                    self.advance();
                    if self
                        .prev_kind
                        .as_ref()
                        .map(terminates_statement)
                        .unwrap_or(true)
                    {
                        space_before = true;
                        continue;
                    }
                    let mut tok = Token::new(TokenKind::Newline, "\n", pos);
                    tok.space_before = space_before;
                    return Ok(tok);
                }
                Some(c) if c.is_whitespace() => {
                    self.advance();
                    space_before = true;
                }
                Some('.') if self.peek_at(1) == Some('.') && self.peek_at(2) == Some('.') => {
                    // line continuation: "..." then (optionally) trailing
                    // comment, then a newline, all swallowed silently.
                    self.advance();
                    self.advance();
                    self.advance();
                    while let Some(c) = self.peek() {
                        if c == '\n' {
                            self.advance();
                            break;
                        }
                        self.advance();
                    }
                    space_before = true;
                }
                Some('%') if self.peek_at(1) == Some('{') => {
                    self.skip_block_comment()?;
                    space_before = true;
                }
                Some('%') => {
                    while let Some(c) = self.peek() {
                        if c == '\n' {
                            break;
                        }
                        self.advance();
                    }
                    space_before = true;
                }
                _ => break,
            }
        }

        let pos = self.here();
        let c = self.peek().unwrap();

        let mut tok = if c.is_ascii_digit()
            || (c == '.' && self.peek_at(1).is_some_and(|d| d.is_ascii_digit()))
        {
            self.lex_number(pos)?
        } else if c == '\'' {
            if self
                .prev_kind
                .as_ref()
                .map(starts_transpose)
                .unwrap_or(false)
            {
                self.advance();
                Token::new(TokenKind::Transpose, "'", pos)
            } else {
                self.lex_string('\'', pos)?
            }
        } else if c == '"' {
            self.lex_string('"', pos)?
        } else if c.is_alphabetic() || c == '_' {
            self.lex_ident(pos)
        } else {
            self.lex_operator(pos)?
        };
        tok.space_before = space_before;
        Ok(tok)
    }

    fn skip_block_comment(&mut self) -> Result<(), LexError> {
        let start = self.here();
        self.advance(); // %
        self.advance(); // {
        let mut depth = 1usize;
        loop {
            match self.peek() {
                None => {
                    return Err(LexError::new("unterminated block comment", start));
                }
                Some('%') if self.peek_at(1) == Some('{') => {
                    self.advance();
                    self.advance();
                    depth += 1;
                }
                Some('%') if self.peek_at(1) == Some('}') => {
                    self.advance();
                    self.advance();
                    depth -= 1;
                    if depth == 0 {
                        return Ok(());
                    }
                }
                Some(_) => {
                    self.advance();
                }
            }
        }
    }

    fn lex_number(&mut self, pos: Pos) -> Result<Token, LexError> {
        let start = self.pos;
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.advance();
        }
        if self.peek() == Some('.') && self.peek_at(1) != Some('.') {
            self.advance();
            while self.peek().is_some_and(|c| c.is_ascii_digit()) {
                self.advance();
            }
        }
        if matches!(self.peek(), Some('e') | Some('E')) {
            let save = self.pos;
            let save_line = self.line;
            let save_col = self.col;
            self.advance();
            if matches!(self.peek(), Some('+') | Some('-')) {
                self.advance();
            }
            if self.peek().is_some_and(|c| c.is_ascii_digit()) {
                while self.peek().is_some_and(|c| c.is_ascii_digit()) {
                    self.advance();
                }
            } else {
                self.pos = save;
                self.line = save_line;
                self.col = save_col;
            }
        }
        let mut imaginary = false;
        if matches!(self.peek(), Some('i') | Some('j')) {
            imaginary = true;
            self.advance();
        }
        let lexeme: String = self.chars[start..self.pos].iter().collect();
        let numeric_part = if imaginary {
            &lexeme[..lexeme.len() - 1]
        } else {
            &lexeme[..]
        };
        let value: f64 = numeric_part
            .parse()
            .map_err(|_| LexError::new(format!("invalid numeric literal '{lexeme}'"), pos))?;
        Ok(Token::new(
            TokenKind::Number {
                value: if imaginary { 0.0 } else { value },
                imaginary,
            },
            lexeme,
            pos,
        ))
    }

    fn lex_string(&mut self, delim: char, pos: Pos) -> Result<Token, LexError> {
        self.advance(); // opening delimiter
        let mut out = String::new();
        loop {
            match self.peek() {
                None | Some('\n') => {
                    return Err(LexError::new("unterminated string literal", pos));
                }
                Some(c) if c == delim => {
                    self.advance();
                    if self.peek() == Some(delim) {
                        // doubled delimiter escapes itself
                        out.push(delim);
                        self.advance();
                    } else {
                        break;
                    }
                }
                Some(c) => {
                    out.push(c);
                    self.advance();
                }
            }
        }
        let lexeme = out.clone();
        Ok(Token::new(TokenKind::String(out), lexeme, pos))
    }

    fn lex_ident(&mut self, pos: Pos) -> Token {
        let start = self.pos;
        while self
            .peek()
            .is_some_and(|c| c.is_alphanumeric() || c == '_')
        {
            self.advance();
        }
        let lexeme: String = self.chars[start..self.pos].iter().collect();
        let kind = keyword(&lexeme).unwrap_or_else(|| TokenKind::Ident(lexeme.clone()));
        Token::new(kind, lexeme, pos)
    }

    fn lex_operator(&mut self, pos: Pos) -> Result<Token, LexError> {
        use TokenKind::*;
        let start = self.pos;
        let c = self.advance().unwrap();
        let kind = match c {
            '+' => Plus,
            '-' => Minus,
            '*' => Star,
            '^' => Caret,
            '(' => LParen,
            ')' => RParen,
            '[' => LBracket,
            ']' => RBracket,
            '{' => LBrace,
            '}' => RBrace,
            ',' => Comma,
            ';' => Semicolon,
            ':' => Colon,
            '@' => At,
            '~' => {
                if self.matches('=') {
                    NotEq
                } else {
                    Not
                }
            }
            '.' => {
                if self.matches('*') {
                    DotStar
                } else if self.matches('/') {
                    DotSlash
                } else if self.matches('\\') {
                    DotBackSlash
                } else if self.matches('^') {
                    DotCaret
                } else if self.matches('\'') {
                    DotTranspose
                } else {
                    Dot
                }
            }
            '/' => Slash,
            '\\' => BackSlash,
            '=' => {
                if self.matches('=') {
                    EqEq
                } else {
                    Assign
                }
            }
            '<' => {
                if self.matches('=') {
                    LtEq
                } else {
                    Lt
                }
            }
            '>' => {
                if self.matches('=') {
                    GtEq
                } else {
                    Gt
                }
            }
            '&' => {
                if self.matches('&') {
                    AndAnd
                } else {
                    Amp
                }
            }
            '|' => {
                if self.matches('|') {
                    OrOr
                } else {
                    Pipe
                }
            }
            other => {
                return Err(LexError::new(format!("unexpected character '{other}'"), pos));
            }
        };
        let text: String = self.chars[start..self.pos].iter().collect();
        Ok(Token::new(kind, text, pos))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<TokenKind> {
        Lexer::new(src)
            .tokenize()
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn lexes_simple_arithmetic() {
        let k = kinds("1 + 2.5");
        assert_eq!(
            k,
            vec![
                TokenKind::Number {
                    value: 1.0,
                    imaginary: false
                },
                TokenKind::Plus,
                TokenKind::Number {
                    value: 2.5,
                    imaginary: false
                },
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn disambiguates_transpose_from_string() {
        // after an identifier, ' is transpose
        let k = kinds("A'");
        assert_eq!(
            k,
            vec![
                TokenKind::Ident("A".into()),
                TokenKind::Transpose,
                TokenKind::Eof
            ]
        );
        // at start of expression, ' opens a string
        let k = kinds("'hello'");
        assert_eq!(
            k,
            vec![TokenKind::String("hello".into()), TokenKind::Eof]
        );
        // after ), ' is transpose
        let k = kinds("(A)'");
        assert!(matches!(k[3], TokenKind::Transpose));
    }

    #[test]
    fn imaginary_literal() {
        let k = kinds("3i");
        assert_eq!(
            k[0],
            TokenKind::Number {
                value: 0.0,
                imaginary: true
            }
        );
    }

    #[test]
    fn doubled_quote_escapes_inside_string() {
        let k = kinds("'it''s'");
        assert_eq!(k[0], TokenKind::String("it's".into()));
    }

    #[test]
    fn block_comment_nests() {
        let k = kinds("%{ outer %{ inner %} still outer %}\n1");
        assert_eq!(
            k,
            vec![
                TokenKind::Number {
                    value: 1.0,
                    imaginary: false
                },
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn line_continuation_is_swallowed() {
        let k = kinds("1 + ...\n2");
        assert_eq!(
            k,
            vec![
                TokenKind::Number {
                    value: 1.0,
                    imaginary: false
                },
                TokenKind::Plus,
                TokenKind::Number {
                    value: 2.0,
                    imaginary: false
                },
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn newline_suppressed_after_semicolon() {
        let k = kinds("1;\n2");
        assert_eq!(
            k,
            vec![
                TokenKind::Number {
                    value: 1.0,
                    imaginary: false
                },
                TokenKind::Semicolon,
                TokenKind::Number {
                    value: 2.0,
                    imaginary: false
                },
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn space_before_distinguishes_matrix_element_split_from_binary_minus() {
        let toks = Lexer::new("[1 -1]").tokenize().unwrap();
        // '-' preceded by space, '1' after it not: a new element, not subtraction.
        assert!(toks[2].space_before);
        assert!(!toks[3].space_before);

        let toks = Lexer::new("[1 - 1]").tokenize().unwrap();
        // space on both sides: ordinary binary minus.
        assert!(toks[2].space_before);
        assert!(toks[3].space_before);
    }

    #[test]
    fn unterminated_string_errors_at_open_quote() {
        let err = Lexer::new("'abc").tokenize().unwrap_err();
        assert_eq!(err.pos, Pos::new(1, 1));
    }
}

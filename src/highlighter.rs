// ABOUTME: REPL syntax highlighter - colors a line using the engine's own lexer rather than re-tokenizing by hand

use std::borrow::Cow;

use mscript::lexer::Lexer;
use mscript::token::TokenKind;
use rustyline::completion::Completer;
use rustyline::highlight::{CmdKind, Highlighter};
use rustyline::hint::Hinter;
use rustyline::validate::Validator;
use rustyline::Helper;

const COLOR_RESET: &str = "\x1b[0m";
const COLOR_KEYWORD: &str = "\x1b[1;35m"; // bold magenta
const COLOR_NUMBER: &str = "\x1b[33m"; // yellow
const COLOR_STRING: &str = "\x1b[32m"; // green
const COLOR_OPERATOR: &str = "\x1b[1;34m"; // bold blue

pub struct MscriptHelper;

impl MscriptHelper {
    pub fn new() -> Self {
        MscriptHelper
    }
}

impl Default for MscriptHelper {
    fn default() -> Self {
        Self::new()
    }
}

impl Helper for MscriptHelper {}

impl Completer for MscriptHelper {
    type Candidate = String;
}

impl Hinter for MscriptHelper {
    type Hint = String;
}

impl Validator for MscriptHelper {}

impl Highlighter for MscriptHelper {
    fn highlight<'l>(&self, line: &'l str, _pos: usize) -> Cow<'l, str> {
        // Lexing on every keystroke is fine for REPL-sized lines; an
        // unterminated string or bad token just falls back to plain text
        // for this line, it's a display concern, not a real error.
        let Ok(tokens) = Lexer::new(line).tokenize() else {
            return Cow::Borrowed(line);
        };

        let mut out = String::with_capacity(line.len() * 2);
        let mut cursor = 0usize;
        for tok in &tokens {
            if matches!(tok.kind, TokenKind::Eof | TokenKind::Newline) {
                continue;
            }
            if let Some(start) = line[cursor..].find(tok.lexeme.as_str()).map(|i| i + cursor) {
                out.push_str(&line[cursor..start]);
                let color = color_for(&tok.kind);
                match color {
                    Some(c) => out.push_str(&format!("{c}{}{COLOR_RESET}", tok.lexeme)),
                    None => out.push_str(&tok.lexeme),
                }
                cursor = start + tok.lexeme.len();
            }
        }
        out.push_str(&line[cursor..]);

        if out == line {
            Cow::Borrowed(line)
        } else {
            Cow::Owned(out)
        }
    }

    fn highlight_char(&self, _line: &str, _pos: usize, _kind: CmdKind) -> bool {
        true
    }
}

fn color_for(kind: &TokenKind) -> Option<&'static str> {
    use TokenKind::*;
    Some(match kind {
        If | ElseIf | Else | End | For | While | Switch | Case | Otherwise | Try | Catch | Function | Return
        | Break | Continue | Global | Persistent | True | False => COLOR_KEYWORD,
        Number { .. } => COLOR_NUMBER,
        String(_) => COLOR_STRING,
        Plus | Minus | Star | DotStar | Slash | DotSlash | BackSlash | DotBackSlash | Caret | DotCaret
        | Transpose | DotTranspose | EqEq | NotEq | Lt | Gt | LtEq | GtEq | AndAnd | OrOr | Amp | Pipe | Not
        | Assign | Colon => COLOR_OPERATOR,
        _ => return None,
    })
}

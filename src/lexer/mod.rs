// Author: laravel-cfg contributors
// License: MIT

use std::str::Chars;
use crate::AuditError;

mod scanner;
mod tokenizer;

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    // --- literals ---
    /// Names and keywords, possibly namespaced (`Foo\Bar`, `\env`).
    Ident(String),
    /// `$name`, stored without the dollar sign.
    Variable(String),
    String(String),
    /// Double-quoted or heredoc string containing `$var` / `{$...}`.
    Interpolated(String),
    Int(i64),
    Float(f64),
    /// `(int)`, `(string)`, ... stored lowercased without parentheses.
    Cast(String),

    // --- structure ---
    LBracket,
    RBracket,
    LParen,
    RParen,
    LBrace,
    RBrace,
    Comma,
    Semicolon,
    DoubleArrow,
    DoubleColon,
    Colon,
    Question,
    Ellipsis,
    /// `#[`, the start of an attribute group.
    AttributeStart,

    // --- everything else ---
    Op(String),

    Eof,
}

/// A token together with the position where it starts.
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned {
    pub token: Token,
    pub line: usize,
    pub column: usize,
}

pub struct Lexer<'a> {
    input: Chars<'a>,
    peek: Option<char>,
    line: usize,
    column: usize,
    in_php: bool,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        let mut lexer = Lexer {
            input: input.chars(),
            peek: None,
            line: 1,
            column: 0,
            in_php: false,
        };
        lexer.peek = lexer.input.next();
        lexer
    }

    pub fn line(&self) -> usize {
        self.line
    }

    pub fn column(&self) -> usize {
        self.column
    }

    /// Next token of PHP code; inline HTML and comments are skipped.
    pub fn next_token(&mut self) -> Result<Token, AuditError> {
        tokenizer::next_token(self)
    }

    /// Tokenize the whole input, ending with a single `Token::Eof`.
    pub fn tokenize(mut self) -> Result<Vec<Spanned>, AuditError> {
        let mut out = Vec::new();
        loop {
            scanner::skip_trivia(&mut self)?;
            let (line, column) = (self.line, self.column);
            let token = self.next_token()?;
            let done = token == Token::Eof;
            out.push(Spanned { token, line, column });
            if done {
                break;
            }
        }
        tracing::trace!(tokens = out.len(), "tokenized php source");
        Ok(out)
    }
}

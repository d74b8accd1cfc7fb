use super::*;

/// Advance the character iterator and update line/column tracking
pub(super) fn bump(lexer: &mut Lexer) -> Option<char> {
    let curr = lexer.peek;
    if let Some(c) = curr {
        if c == '\n' {
            lexer.line += 1;
            lexer.column = 0;
        } else {
            lexer.column += 1;
        }
    }
    lexer.peek = lexer.input.next();
    curr
}

/// Character `n` positions after the current one (`peek_at(lexer, 0)` is the current one).
pub(super) fn peek_at(lexer: &Lexer, n: usize) -> Option<char> {
    if n == 0 {
        lexer.peek
    } else {
        lexer.input.clone().nth(n - 1)
    }
}

pub(super) fn starts_with(lexer: &Lexer, s: &str) -> bool {
    s.chars().enumerate().all(|(i, c)| peek_at(lexer, i) == Some(c))
}

pub(super) fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_' || !c.is_ascii()
}

pub(super) fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || !c.is_ascii()
}

/// Skip inline HTML, whitespace and comments.
pub(super) fn skip_trivia(lexer: &mut Lexer) -> Result<(), AuditError> {
    loop {
        if !lexer.in_php {
            skip_inline_html(lexer);
            if !lexer.in_php {
                return Ok(());
            }
        }

        match lexer.peek {
            Some(c) if c.is_whitespace() => {
                bump(lexer);
            }
            Some('#') if peek_at(lexer, 1) != Some('[') => skip_line_comment(lexer),
            Some('/') if peek_at(lexer, 1) == Some('/') => skip_line_comment(lexer),
            Some('/') if peek_at(lexer, 1) == Some('*') => skip_block_comment(lexer)?,
            _ => return Ok(()),
        }
    }
}

fn skip_inline_html(lexer: &mut Lexer) {
    while lexer.peek.is_some() {
        if starts_with(lexer, "<?php") {
            for _ in 0..5 {
                bump(lexer);
            }
            lexer.in_php = true;
            return;
        }
        if starts_with(lexer, "<?") {
            bump(lexer);
            bump(lexer);
            if lexer.peek == Some('=') {
                bump(lexer);
            }
            lexer.in_php = true;
            return;
        }
        bump(lexer);
    }
}

fn skip_line_comment(lexer: &mut Lexer) {
    while let Some(c) = lexer.peek {
        if c == '\n' || starts_with(lexer, "?>") {
            break;
        }
        bump(lexer);
    }
}

fn skip_block_comment(lexer: &mut Lexer) -> Result<(), AuditError> {
    let (line, column) = (lexer.line, lexer.column);
    bump(lexer); // '/'
    bump(lexer); // '*'
    loop {
        match lexer.peek {
            Some('*') if peek_at(lexer, 1) == Some('/') => {
                bump(lexer);
                bump(lexer);
                return Ok(());
            }
            Some(_) => {
                bump(lexer);
            }
            None => {
                return Err(AuditError::UnclosedString {
                    quote: '*',
                    line,
                    column,
                    hint: Some("Block comment is never closed with */".into()),
                    code: Some(105),
                });
            }
        }
    }
}

pub(super) fn leave_php(lexer: &mut Lexer) {
    lexer.in_php = false;
}

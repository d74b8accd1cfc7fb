use super::*;

pub(super) fn parse_return_array(parser: &mut Parser) -> Result<Option<Mapping>, AuditError> {
    let mut depth = 0usize;
    let mut statement_start = true;

    loop {
        match parser.peek() {
            Token::Eof => return Ok(None),
            Token::Ident(word) if depth == 0 && statement_start && word.eq_ignore_ascii_case("return") => {
                parser.bump()?;
                return parse_return_statement(parser);
            }
            Token::LParen | Token::LBracket | Token::LBrace | Token::AttributeStart => {
                depth += 1;
                statement_start = *parser.peek() == Token::LBrace;
                parser.bump()?;
            }
            Token::RParen | Token::RBracket | Token::RBrace => {
                let closes_block = *parser.peek() == Token::RBrace;
                depth = close_bracket(parser, depth)?;
                statement_start = closes_block;
            }
            Token::Semicolon => {
                statement_start = true;
                parser.bump()?;
            }
            _ => {
                statement_start = false;
                parser.bump()?;
            }
        }
    }
}

fn parse_return_statement(parser: &mut Parser) -> Result<Option<Mapping>, AuditError> {
    if matches!(parser.peek(), Token::Semicolon | Token::Eof) {
        return Ok(None);
    }

    let value = parser.parse_expression()?;
    if !matches!(parser.peek(), Token::Semicolon | Token::Eof) {
        return Err(AuditError::SyntaxError {
            message: format!("Expected ';' after return value, got {:?}", parser.peek()),
            line: parser.line(),
            column: parser.column(),
            hint: None,
            code: Some(213),
        });
    }
    ensure_balanced_rest(parser)?;

    Ok(match value {
        ValueNode::Mapping(mapping) => Some(mapping),
        _ => None,
    })
}

/// The code after the return is never evaluated, but a file with unbalanced
/// brackets would not parse at all.
fn ensure_balanced_rest(parser: &mut Parser) -> Result<(), AuditError> {
    let mut depth = 0usize;
    loop {
        match parser.peek() {
            Token::Eof if depth == 0 => return Ok(()),
            Token::Eof => {
                return Err(AuditError::UnexpectedEof {
                    message: "Unclosed bracket after return statement".into(),
                    line: parser.line(),
                    column: parser.column(),
                    hint: None,
                    code: Some(201),
                });
            }
            Token::LParen | Token::LBracket | Token::LBrace | Token::AttributeStart => {
                depth += 1;
                parser.bump()?;
            }
            Token::RParen | Token::RBracket | Token::RBrace => depth = close_bracket(parser, depth)?,
            _ => {
                parser.bump()?;
            }
        }
    }
}

fn close_bracket(parser: &mut Parser, depth: usize) -> Result<usize, AuditError> {
    if depth == 0 {
        return Err(AuditError::SyntaxError {
            message: format!("Unbalanced {:?}", parser.peek()),
            line: parser.line(),
            column: parser.column(),
            hint: None,
            code: Some(206),
        });
    }
    parser.bump()?;
    Ok(depth - 1)
}

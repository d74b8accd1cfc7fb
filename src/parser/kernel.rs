use super::*;

pub(super) fn parse_property_default(parser: &mut Parser, property: &str) -> Result<Option<ValueNode>, AuditError> {
    loop {
        match parser.peek() {
            Token::Eof => return Ok(None),
            Token::Ident(word)
                if word.eq_ignore_ascii_case("class") && parser.previous() != Some(&Token::DoubleColon) =>
            {
                parser.bump()?;
                if *parser.peek() == Token::LParen {
                    skip_balanced(parser)?; // anonymous class constructor arguments
                }
                while !matches!(parser.peek(), Token::LBrace | Token::Eof) {
                    parser.bump()?; // name, extends, implements
                }
                if *parser.peek() == Token::Eof {
                    return Ok(None);
                }
                parser.bump()?;
                if let Some(found) = scan_class_body(parser, property)? {
                    return Ok(found);
                }
            }
            _ => {
                parser.bump()?;
            }
        }
    }
}

/// Walk class members with the cursor just inside `{`.
///
/// `Ok(None)` means the class ended without declaring the property;
/// `Ok(Some(None))` means it was declared without a default value.
fn scan_class_body(parser: &mut Parser, property: &str) -> Result<Option<Option<ValueNode>>, AuditError> {
    loop {
        match parser.peek().clone() {
            Token::RBrace => {
                parser.bump()?;
                return Ok(None);
            }
            Token::Eof => {
                return Err(AuditError::UnexpectedEof {
                    message: "Class body is never closed".into(),
                    line: parser.line(),
                    column: parser.column(),
                    hint: None,
                    code: Some(201),
                });
            }
            Token::LParen | Token::LBracket | Token::LBrace | Token::AttributeStart => skip_balanced(parser)?,
            Token::Ident(word) if word.eq_ignore_ascii_case("function") => skip_method(parser)?,
            Token::Ident(word)
                if word.eq_ignore_ascii_case("const")
                    || word.eq_ignore_ascii_case("use")
                    || word.eq_ignore_ascii_case("case") =>
            {
                skip_member(parser)?
            }
            Token::Variable(name) => {
                parser.bump()?;
                let has_default = matches!(parser.peek(), Token::Op(op) if op == "=");
                if has_default {
                    parser.bump()?;
                }

                if name == property {
                    tracing::trace!(property, has_default, "found class property");
                    return if has_default {
                        Ok(Some(Some(parser.parse_expression()?)))
                    } else {
                        Ok(Some(None))
                    };
                }
                if has_default {
                    parser.parse_expression()?;
                }
            }
            _ => {
                parser.bump()?; // modifiers, types, separators
            }
        }
    }
}

fn skip_method(parser: &mut Parser) -> Result<(), AuditError> {
    parser.bump()?; // function
    while !matches!(parser.peek(), Token::LParen | Token::Eof) {
        parser.bump()?; // `&` and the method name
    }
    skip_balanced(parser)?;
    while !matches!(parser.peek(), Token::LBrace | Token::Semicolon | Token::Eof) {
        parser.bump()?; // return type
    }
    match parser.peek() {
        Token::LBrace => skip_balanced(parser),
        _ => parser.bump().map(|_| ()),
    }
}

/// Skip a `const`, `use` or `case` member up to its terminating `;` or block.
fn skip_member(parser: &mut Parser) -> Result<(), AuditError> {
    parser.bump()?;
    loop {
        match parser.peek() {
            Token::Semicolon => {
                parser.bump()?;
                return Ok(());
            }
            Token::LBrace => return skip_balanced(parser), // trait adaptation block
            Token::LParen | Token::LBracket | Token::AttributeStart => skip_balanced(parser)?,
            _ => {
                parser.bump()?;
            }
        }
    }
}

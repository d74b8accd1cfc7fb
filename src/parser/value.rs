use super::*;
use crate::ast::{ArrayKey, FuncCall, Scalar};

pub(super) fn parse_expression(parser: &mut Parser) -> Result<ValueNode, AuditError> {
    let prefix = prefix_kind(parser.peek());
    let value = parse_primary(parser)?;
    if is_expression_end(parser.peek()) {
        return Ok(value);
    }

    // Anything following the primary makes this a compound expression.
    let kind = classify_tail(parser, prefix);
    skip_expression_tail(parser)?;
    Ok(ValueNode::unparsed(kind))
}

fn is_expression_end(token: &Token) -> bool {
    matches!(
        token,
        Token::Comma
            | Token::RBracket
            | Token::RParen
            | Token::RBrace
            | Token::Semicolon
            | Token::DoubleArrow
            | Token::Eof
    )
}

// Binding strength of what can follow a primary, loosest first.
const PREC_OR: u8 = 0;
const PREC_XOR: u8 = 1;
const PREC_AND: u8 = 2;
const PREC_ASSIGN: u8 = 3;
const PREC_TERNARY: u8 = 4;
const PREC_COALESCE: u8 = 5;
const PREC_BINARY: u8 = 6;
const PREC_INSTANCEOF: u8 = 7;
const PREC_PREFIX: u8 = 8;
const PREC_POW: u8 = 9;
const PREC_POSTFIX: u8 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Assoc {
    Left,
    Right,
}

/// The loosest-binding construct seen so far.
struct Outermost {
    best: Option<(u8, &'static str)>,
}

impl Outermost {
    fn offer(&mut self, prec: u8, kind: &'static str, assoc: Assoc) {
        let replace = match self.best {
            None => true,
            // Left-associative chains are rooted at their last operator.
            Some((current, _)) => prec < current || (prec == current && assoc == Assoc::Left),
        };
        if replace {
            self.best = Some((prec, kind));
        }
    }
}

/// Kind of a prefix construct that `parse_primary` folds into the primary.
fn prefix_kind(token: &Token) -> Option<&'static str> {
    match token {
        Token::Cast(_) => Some("cast"),
        Token::Op(op) if matches!(op.as_str(), "-" | "+" | "!" | "~" | "@" | "++" | "--" | "&") => Some("unary_op"),
        _ => None,
    }
}

/// Name the outermost construct of a compound expression by looking ahead
/// over its tail without consuming anything.
///
/// Bracketed groups and the middle of a ternary are opaque; the result is
/// the lowest-precedence operator at the top level.
fn classify_tail(parser: &Parser, prefix: Option<&'static str>) -> &'static str {
    let mut outer = Outermost { best: prefix.map(|kind| (PREC_PREFIX, kind)) };
    let mut after_operand = true;
    let mut open_ternaries = 0usize;
    let mut n = 0;

    loop {
        let token = parser.peek_nth(n);
        if is_expression_end(token) {
            break;
        }
        let top = open_ternaries == 0;
        let mut offer = |prec: u8, kind: &'static str, assoc: Assoc| {
            if top {
                outer.offer(prec, kind, assoc);
            }
        };

        match token {
            Token::AttributeStart => {
                n = skip_group_ahead(parser, n);
                continue;
            }
            Token::LParen | Token::LBracket | Token::LBrace => {
                if after_operand {
                    let kind = if *token == Token::LParen { "dynamic_call" } else { "array_dim_fetch" };
                    offer(PREC_POSTFIX, kind, Assoc::Left);
                }
                n = skip_group_ahead(parser, n);
                after_operand = true;
                continue;
            }
            Token::Ident(word) => {
                let word = word.to_ascii_lowercase();
                match word.as_str() {
                    "fn" | "function" => break, // the body runs to the end of the expression
                    "or" => offer(PREC_OR, "binary_op", Assoc::Left),
                    "xor" => offer(PREC_XOR, "binary_op", Assoc::Left),
                    "and" => offer(PREC_AND, "binary_op", Assoc::Left),
                    "instanceof" => offer(PREC_INSTANCEOF, "instanceof", Assoc::Left),
                    _ => {}
                }
                after_operand = match word.as_str() {
                    "or" | "xor" | "and" | "instanceof" | "new" | "clone" => false,
                    _ => !matches!(parser.peek_nth(n + 1), Token::LParen | Token::DoubleColon),
                };
            }
            Token::Variable(_) | Token::String(_) | Token::Interpolated(_) | Token::Int(_) | Token::Float(_) => {
                after_operand = true;
            }
            Token::Question => {
                offer(PREC_TERNARY, "ternary", Assoc::Right);
                open_ternaries += 1;
                after_operand = false;
            }
            Token::Colon => {
                open_ternaries = open_ternaries.saturating_sub(1);
                after_operand = false;
            }
            Token::DoubleColon => {
                if after_operand {
                    offer(PREC_POSTFIX, "static_call", Assoc::Left);
                }
                after_operand = false;
            }
            Token::Op(op) => match op.as_str() {
                "->" | "?->" if after_operand => {
                    if matches!(parser.peek_nth(n + 1), Token::Ident(_) | Token::Variable(_)) {
                        let call = *parser.peek_nth(n + 2) == Token::LParen;
                        offer(PREC_POSTFIX, if call { "method_call" } else { "property_fetch" }, Assoc::Left);
                        n += 2;
                        if call {
                            n = skip_group_ahead(parser, n);
                        }
                        continue;
                    }
                    offer(PREC_POSTFIX, "property_fetch", Assoc::Left);
                }
                "++" | "--" if after_operand => offer(PREC_POSTFIX, "unary_op", Assoc::Left),
                "++" | "--" => {}
                "??" => {
                    offer(PREC_COALESCE, "coalesce", Assoc::Right);
                    after_operand = false;
                }
                "**" => {
                    offer(PREC_POW, "binary_op", Assoc::Right);
                    after_operand = false;
                }
                op if is_assignment(op) => {
                    offer(PREC_ASSIGN, "assign", Assoc::Right);
                    after_operand = false;
                }
                _ if after_operand => {
                    offer(PREC_BINARY, "binary_op", Assoc::Left);
                    after_operand = false;
                }
                _ => {} // prefix operator of the next operand
            },
            _ => after_operand = false,
        }
        n += 1;
    }

    outer.best.map_or("expression", |(_, kind)| kind)
}

/// Offset just past the bracketed group that opens at offset `n`.
fn skip_group_ahead(parser: &Parser, mut n: usize) -> usize {
    let mut depth = 0usize;
    loop {
        match parser.peek_nth(n) {
            Token::Eof => return n,
            Token::LParen | Token::LBracket | Token::LBrace | Token::AttributeStart => depth += 1,
            Token::RParen | Token::RBracket | Token::RBrace => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return n + 1;
                }
            }
            _ => {}
        }
        n += 1;
    }
}

fn is_assignment(op: &str) -> bool {
    op.ends_with('=') && !matches!(op, "==" | "===" | "!=" | "!==" | "<=" | ">=")
}

/// Consume tokens up to the end of the current expression.
fn skip_expression_tail(parser: &mut Parser) -> Result<(), AuditError> {
    let mut pending_arrow = 0usize;
    loop {
        match parser.peek() {
            Token::Eof => return Ok(()),
            Token::DoubleArrow if pending_arrow > 0 => {
                pending_arrow -= 1;
                parser.bump()?;
            }
            t if is_expression_end(t) => return Ok(()),
            Token::LParen | Token::LBracket | Token::LBrace | Token::AttributeStart => skip_balanced(parser)?,
            Token::Ident(word) if word.eq_ignore_ascii_case("fn") => {
                pending_arrow += 1;
                parser.bump()?;
            }
            _ => {
                parser.bump()?;
            }
        }
    }
}

fn parse_primary(parser: &mut Parser) -> Result<ValueNode, AuditError> {
    match parser.peek().clone() {
        Token::String(s) => {
            parser.bump()?;
            Ok(ValueNode::string(s))
        }
        Token::Int(i) => {
            parser.bump()?;
            Ok(ValueNode::Scalar(Scalar::Int(i)))
        }
        Token::Float(f) => {
            parser.bump()?;
            Ok(ValueNode::Scalar(Scalar::Float(f)))
        }
        Token::Interpolated(_) => {
            parser.bump()?;
            Ok(ValueNode::unparsed("interpolated_string"))
        }
        Token::Variable(_) => {
            parser.bump()?;
            Ok(ValueNode::unparsed("variable"))
        }
        Token::LBracket => {
            parser.bump()?;
            parse_array_items(parser, Token::RBracket)
        }
        Token::LParen => {
            parser.bump()?;
            let inner = parse_expression(parser)?;
            parser.expect(Token::RParen)?;
            Ok(inner)
        }
        Token::Cast(_) => {
            parser.bump()?;
            parse_primary(parser)?;
            Ok(ValueNode::unparsed("cast"))
        }
        Token::Ellipsis => {
            parser.bump()?;
            parse_expression(parser)?;
            Ok(ValueNode::unparsed("spread"))
        }
        Token::AttributeStart => {
            skip_balanced(parser)?;
            parse_primary(parser)
        }
        Token::Op(op) if matches!(op.as_str(), "-" | "+" | "!" | "~" | "@" | "++" | "--" | "&") => {
            parser.bump()?;
            parse_primary(parser)?;
            Ok(ValueNode::unparsed("unary_op"))
        }
        Token::Ident(name) => parse_name_expression(parser, name),
        other => {
            let (line, column) = (parser.line(), parser.column());
            Err(AuditError::InvalidToken {
                token: format!("{:?}", other),
                line,
                column,
                hint: Some("Unexpected token in value position".into()),
                code: Some(210),
            })
        }
    }
}

fn parse_name_expression(parser: &mut Parser, name: String) -> Result<ValueNode, AuditError> {
    let lower = name.trim_start_matches('\\').to_ascii_lowercase();
    let next = parser.peek_nth(1).clone();

    match (lower.as_str(), &next) {
        ("array", Token::LParen) => {
            parser.bump()?;
            parser.bump()?;
            return parse_array_items(parser, Token::RParen);
        }
        ("fn", _) => return parse_arrow_function(parser),
        ("function", _) => return parse_closure(parser),
        ("static", Token::Ident(inner)) if is_function_keyword(inner) => {
            parser.bump()?;
            let inner = inner.clone();
            return parse_name_expression(parser, inner);
        }
        ("new", _) => return parse_new(parser),
        ("match", Token::LParen) => {
            parser.bump()?;
            skip_balanced(parser)?;
            if *parser.peek() == Token::LBrace {
                skip_balanced(parser)?;
            }
            return Ok(ValueNode::unparsed("match"));
        }
        ("isset" | "empty" | "list" | "eval" | "exit" | "die", Token::LParen) => {
            parser.bump()?;
            skip_balanced(parser)?;
            return Ok(ValueNode::unparsed(lower.clone()));
        }
        ("include" | "include_once" | "require" | "require_once" | "clone" | "print" | "throw", _) => {
            parser.bump()?;
            parse_expression(parser)?;
            return Ok(ValueNode::unparsed(lower.clone()));
        }
        _ => {}
    }

    match next {
        Token::LParen => {
            parser.bump()?;
            let args = parse_arguments(parser)?;
            Ok(ValueNode::FuncCall(FuncCall::new(name.trim_start_matches('\\'), args)))
        }
        Token::DoubleColon => {
            parser.bump()?;
            parser.bump()?;
            parse_class_access(parser, &name)
        }
        _ => {
            parser.bump()?;
            Ok(match lower.as_str() {
                "true" => ValueNode::Scalar(Scalar::Bool(true)),
                "false" => ValueNode::Scalar(Scalar::Bool(false)),
                "null" => ValueNode::Scalar(Scalar::Null),
                _ => ValueNode::string(name.trim_start_matches('\\')),
            })
        }
    }
}

fn is_function_keyword(word: &str) -> bool {
    word.eq_ignore_ascii_case("fn") || word.eq_ignore_ascii_case("function")
}

/// `Class::CONST`, `Class::$prop`, `Class::method()` with the cursor after `::`.
fn parse_class_access(parser: &mut Parser, class_name: &str) -> Result<ValueNode, AuditError> {
    let class = parser.resolve_class(class_name);

    match parser.peek().clone() {
        Token::Ident(member) => {
            parser.bump()?;
            if *parser.peek() == Token::LParen {
                skip_balanced(parser)?;
                return Ok(ValueNode::unparsed("static_call"));
            }
            if parser.resolves_names() && member.eq_ignore_ascii_case("class") {
                return Ok(ValueNode::string(class));
            }
            Ok(ValueNode::ClassConst { class, constant: member })
        }
        Token::Variable(property) => {
            parser.bump()?;
            if *parser.peek() == Token::LParen {
                skip_balanced(parser)?;
                return Ok(ValueNode::unparsed("static_call"));
            }
            Ok(ValueNode::StaticProp { class, property })
        }
        _ => Ok(ValueNode::unparsed("static_access")),
    }
}

/// Array items up to `close`; the opening bracket is already consumed.
fn parse_array_items(parser: &mut Parser, close: Token) -> Result<ValueNode, AuditError> {
    let mut mapping = Mapping::new();

    loop {
        if *parser.peek() == close {
            parser.bump()?;
            break;
        }
        match parser.peek() {
            Token::Comma => {
                parser.bump()?;
                continue;
            }
            Token::Eof => {
                return Err(AuditError::UnexpectedEof {
                    message: "Array literal is never closed".into(),
                    line: parser.line(),
                    column: parser.column(),
                    hint: Some(format!("Expected {:?}", close)),
                    code: Some(201),
                });
            }
            _ => {}
        }

        if *parser.peek() == Token::Ellipsis {
            mapping.push(parse_primary(parser)?);
        } else {
            skip_reference_marker(parser)?;
            let first = parse_expression(parser)?;
            if *parser.peek() == Token::DoubleArrow {
                parser.bump()?;
                skip_reference_marker(parser)?;
                let value = parse_expression(parser)?;
                match array_key(&first) {
                    Some(key) => mapping.insert(key, value),
                    None => mapping.push(value),
                }
            } else {
                mapping.push(first);
            }
        }

        match parser.peek() {
            Token::Comma => {
                parser.bump()?;
            }
            t if *t == close => {}
            other => {
                return Err(AuditError::SyntaxError {
                    message: format!("Expected ',' or {:?} in array literal, got {:?}", close, other),
                    line: parser.line(),
                    column: parser.column(),
                    hint: Some("Separate array items with commas".into()),
                    code: Some(211),
                });
            }
        }
    }

    Ok(ValueNode::Mapping(mapping))
}

fn skip_reference_marker(parser: &mut Parser) -> Result<(), AuditError> {
    if matches!(parser.peek(), Token::Op(op) if op == "&") {
        parser.bump()?;
    }
    Ok(())
}

/// Only string and integer literals are explicit keys.
fn array_key(node: &ValueNode) -> Option<ArrayKey> {
    match node {
        ValueNode::Scalar(Scalar::String(s)) => Some(ArrayKey::Str(s.clone())),
        ValueNode::Scalar(Scalar::Int(i)) => Some(ArrayKey::Int(*i)),
        _ => None,
    }
}

/// Call arguments with the cursor on `(`.
fn parse_arguments(parser: &mut Parser) -> Result<Vec<ValueNode>, AuditError> {
    parser.expect(Token::LParen)?;
    let mut args = Vec::new();

    loop {
        match parser.peek() {
            Token::RParen => {
                parser.bump()?;
                return Ok(args);
            }
            Token::Ellipsis if *parser.peek_nth(1) == Token::RParen => {
                parser.bump()?;
                args.push(ValueNode::unparsed("variadic_placeholder"));
                continue;
            }
            Token::Ident(_) if *parser.peek_nth(1) == Token::Colon => {
                // Named argument: keep the value in call-site order.
                parser.bump()?;
                parser.bump()?;
            }
            _ => {}
        }

        args.push(parse_expression(parser)?);

        match parser.peek() {
            Token::Comma => {
                parser.bump()?;
            }
            Token::RParen => {}
            other => {
                return Err(AuditError::SyntaxError {
                    message: format!("Expected ',' or ')' in argument list, got {:?}", other),
                    line: parser.line(),
                    column: parser.column(),
                    hint: None,
                    code: Some(212),
                });
            }
        }
    }
}

fn parse_arrow_function(parser: &mut Parser) -> Result<ValueNode, AuditError> {
    parser.bump()?; // fn
    skip_reference_marker(parser)?;
    skip_balanced(parser)?; // parameters
    if *parser.peek() == Token::Colon {
        while !matches!(parser.peek(), Token::DoubleArrow | Token::Eof) {
            parser.bump()?;
        }
    }
    parser.expect(Token::DoubleArrow)?;
    parse_expression(parser)?;
    Ok(ValueNode::unparsed("arrow_function"))
}

fn parse_closure(parser: &mut Parser) -> Result<ValueNode, AuditError> {
    parser.bump()?; // function
    skip_reference_marker(parser)?;
    skip_balanced(parser)?; // parameters
    if matches!(parser.peek(), Token::Ident(w) if w.eq_ignore_ascii_case("use")) {
        parser.bump()?;
        skip_balanced(parser)?;
    }
    while !matches!(parser.peek(), Token::LBrace | Token::Eof) {
        parser.bump()?; // return type
    }
    skip_balanced(parser)?;
    Ok(ValueNode::unparsed("closure"))
}

fn parse_new(parser: &mut Parser) -> Result<ValueNode, AuditError> {
    parser.bump()?; // new
    match parser.peek().clone() {
        Token::Ident(word) if word.eq_ignore_ascii_case("class") => {
            parser.bump()?;
            if *parser.peek() == Token::LParen {
                skip_balanced(parser)?;
            }
            while !matches!(parser.peek(), Token::LBrace | Token::Eof) {
                parser.bump()?; // extends / implements
            }
            skip_balanced(parser)?;
        }
        Token::LParen => skip_balanced(parser)?,
        _ => {
            parser.bump()?; // class name or variable
            if *parser.peek() == Token::DoubleColon {
                parser.bump()?;
                parser.bump()?;
            }
            if *parser.peek() == Token::LParen {
                skip_balanced(parser)?;
            }
        }
    }
    Ok(ValueNode::unparsed("new"))
}

use super::*;
use super::scanner::{bump, is_ident_char, is_ident_start, leave_php, peek_at, skip_trivia, starts_with};

const CASTS: &[&str] = &[
    "int", "integer", "bool", "boolean", "float", "double", "real",
    "string", "binary", "array", "object", "unset",
];

// Longest first so that `===` wins over `==`.
const OPERATORS: &[&str] = &[
    "<=>", "**=", "...", "<<=", ">>=", "===", "!==", "??=", "?->",
    "=>", "::", "==", "!=", "<>", "<=", ">=", "&&", "||", "??", "++", "--",
    "+=", "-=", "*=", "/=", ".=", "%=", "&=", "|=", "^=", "<<", ">>", "->", "**",
    "+", "-", "*", "/", "%", "=", "<", ">", "!", ".", "&", "|", "^", "~", "@", "?", ":", "$", "`", "\\",
];

pub(super) fn next_token(lexer: &mut Lexer) -> Result<Token, AuditError> {
    skip_trivia(lexer)?;
    if !lexer.in_php {
        return Ok(Token::Eof);
    }

    match lexer.peek {
        None => Ok(Token::Eof),
        Some('?') if peek_at(lexer, 1) == Some('>') => tokenize_close_tag(lexer),
        Some('#') => tokenize_attribute_start(lexer),
        Some('[') => tokenize_symbol(lexer, Token::LBracket),
        Some(']') => tokenize_symbol(lexer, Token::RBracket),
        Some('(') => tokenize_paren_or_cast(lexer),
        Some(')') => tokenize_symbol(lexer, Token::RParen),
        Some('{') => tokenize_symbol(lexer, Token::LBrace),
        Some('}') => tokenize_symbol(lexer, Token::RBrace),
        Some(',') => tokenize_symbol(lexer, Token::Comma),
        Some(';') => tokenize_symbol(lexer, Token::Semicolon),
        Some('\'') => tokenize_single_quoted(lexer),
        Some('"') => tokenize_double_quoted(lexer),
        Some('$') if peek_at(lexer, 1).is_some_and(is_ident_start) => tokenize_variable(lexer),
        Some('<') if starts_with(lexer, "<<<") => tokenize_heredoc(lexer),
        Some(c) if c.is_ascii_digit() => tokenize_number(lexer),
        Some('.') if peek_at(lexer, 1).is_some_and(|c| c.is_ascii_digit()) => tokenize_number(lexer),
        Some('\\') if peek_at(lexer, 1).is_some_and(is_ident_start) => tokenize_name(lexer),
        Some(c) if is_ident_start(c) => tokenize_name(lexer),
        Some(_) => tokenize_operator(lexer),
    }
}

fn tokenize_symbol(lexer: &mut Lexer, token: Token) -> Result<Token, AuditError> {
    bump(lexer);
    Ok(token)
}

fn tokenize_close_tag(lexer: &mut Lexer) -> Result<Token, AuditError> {
    bump(lexer);
    bump(lexer);
    leave_php(lexer);
    Ok(Token::Semicolon)
}

fn tokenize_attribute_start(lexer: &mut Lexer) -> Result<Token, AuditError> {
    // skip_trivia already consumed `#` comments, so this is always `#[`
    bump(lexer);
    bump(lexer);
    Ok(Token::AttributeStart)
}

fn tokenize_paren_or_cast(lexer: &mut Lexer) -> Result<Token, AuditError> {
    let mut i = 1;
    while matches!(peek_at(lexer, i), Some(' ') | Some('\t')) {
        i += 1;
    }
    let mut word = String::new();
    while let Some(c) = peek_at(lexer, i) {
        if c.is_ascii_alphabetic() {
            word.push(c.to_ascii_lowercase());
            i += 1;
        } else {
            break;
        }
    }
    while matches!(peek_at(lexer, i), Some(' ') | Some('\t')) {
        i += 1;
    }

    if peek_at(lexer, i) == Some(')') && CASTS.contains(&word.as_str()) {
        for _ in 0..=i {
            bump(lexer);
        }
        return Ok(Token::Cast(word));
    }

    bump(lexer);
    Ok(Token::LParen)
}

fn tokenize_variable(lexer: &mut Lexer) -> Result<Token, AuditError> {
    bump(lexer); // consume '$'
    let mut name = String::new();
    while let Some(c) = lexer.peek {
        if is_ident_char(c) {
            name.push(c);
            bump(lexer);
        } else {
            break;
        }
    }
    Ok(Token::Variable(name))
}

fn tokenize_name(lexer: &mut Lexer) -> Result<Token, AuditError> {
    let mut name = String::new();
    while let Some(c) = lexer.peek {
        if is_ident_char(c) {
            name.push(c);
            bump(lexer);
        } else if c == '\\' && peek_at(lexer, 1).is_some_and(is_ident_start) {
            name.push(c);
            bump(lexer);
        } else {
            break;
        }
    }
    Ok(Token::Ident(name))
}

fn tokenize_operator(lexer: &mut Lexer) -> Result<Token, AuditError> {
    let (line, column) = (lexer.line, lexer.column);
    for op in OPERATORS {
        if starts_with(lexer, op) {
            for _ in 0..op.len() {
                bump(lexer);
            }
            return Ok(match *op {
                "=>" => Token::DoubleArrow,
                "::" => Token::DoubleColon,
                "..." => Token::Ellipsis,
                "?" => Token::Question,
                ":" => Token::Colon,
                other => Token::Op(other.to_string()),
            });
        }
    }

    let ch = bump(lexer).unwrap_or('\0');
    Err(AuditError::UnexpectedCharacter {
        character: ch,
        line,
        column,
        hint: Some("Unexpected character in PHP source".into()),
        code: Some(104),
    })
}

fn tokenize_number(lexer: &mut Lexer) -> Result<Token, AuditError> {
    let (line, column) = (lexer.line, lexer.column);
    let mut text = String::new();

    let radix = match (lexer.peek, peek_at(lexer, 1)) {
        (Some('0'), Some('x' | 'X')) => 16,
        (Some('0'), Some('b' | 'B')) => 2,
        (Some('0'), Some('o' | 'O')) => 8,
        _ => 10,
    };

    if radix != 10 {
        bump(lexer);
        bump(lexer);
        while let Some(c) = lexer.peek {
            if c.is_digit(radix) || c == '_' {
                if c != '_' {
                    text.push(c);
                }
                bump(lexer);
            } else {
                break;
            }
        }
        return integer_token(&text, radix, line, column);
    }

    let mut is_float = false;
    read_digits(lexer, &mut text);
    if lexer.peek == Some('.') && peek_at(lexer, 1).is_some_and(|c| c.is_ascii_digit()) {
        is_float = true;
        text.push('.');
        bump(lexer);
        read_digits(lexer, &mut text);
    }
    if matches!(lexer.peek, Some('e' | 'E')) {
        let sign = matches!(peek_at(lexer, 1), Some('+' | '-'));
        let digit_at = if sign { 2 } else { 1 };
        if peek_at(lexer, digit_at).is_some_and(|c| c.is_ascii_digit()) {
            is_float = true;
            text.push('e');
            bump(lexer);
            if sign {
                text.push(bump(lexer).unwrap_or('+'));
            }
            read_digits(lexer, &mut text);
        }
    }

    if is_float {
        return text.parse::<f64>().map(Token::Float).map_err(|_| invalid_number(&text, line, column));
    }

    // A leading zero means octal, as in PHP.
    if text.len() > 1 && text.starts_with('0') {
        return integer_token(&text[1..], 8, line, column);
    }
    integer_token(&text, 10, line, column)
}

fn read_digits(lexer: &mut Lexer, text: &mut String) {
    while let Some(c) = lexer.peek {
        if c.is_ascii_digit() {
            text.push(c);
            bump(lexer);
        } else if c == '_' && peek_at(lexer, 1).is_some_and(|n| n.is_ascii_digit()) {
            bump(lexer);
        } else {
            break;
        }
    }
}

/// Integers that overflow `i64` become floats, like PHP does.
fn integer_token(digits: &str, radix: u32, line: usize, column: usize) -> Result<Token, AuditError> {
    if digits.is_empty() {
        return Err(invalid_number(digits, line, column));
    }
    match i64::from_str_radix(digits, radix) {
        Ok(i) => Ok(Token::Int(i)),
        Err(_) if digits.chars().all(|c| c.is_digit(radix)) => {
            let f = digits
                .chars()
                .filter_map(|c| c.to_digit(radix))
                .fold(0f64, |acc, d| acc * radix as f64 + d as f64);
            Ok(Token::Float(f))
        }
        Err(_) => Err(invalid_number(digits, line, column)),
    }
}

fn invalid_number(text: &str, line: usize, column: usize) -> AuditError {
    AuditError::SyntaxError {
        message: format!("Invalid numeric literal '{}'", text),
        line,
        column,
        hint: None,
        code: Some(102),
    }
}

fn tokenize_single_quoted(lexer: &mut Lexer) -> Result<Token, AuditError> {
    let (line, column) = (lexer.line, lexer.column);
    bump(lexer); // opening quote
    let mut content = String::new();

    loop {
        match bump(lexer) {
            Some('\'') => return Ok(Token::String(content)),
            Some('\\') => match lexer.peek {
                Some(c @ ('\'' | '\\')) => {
                    content.push(c);
                    bump(lexer);
                }
                _ => content.push('\\'),
            },
            Some(c) => content.push(c),
            None => {
                return Err(AuditError::UnclosedString {
                    quote: '\'',
                    line,
                    column,
                    hint: Some("String literal not closed".into()),
                    code: Some(103),
                });
            }
        }
    }
}

fn tokenize_double_quoted(lexer: &mut Lexer) -> Result<Token, AuditError> {
    let (line, column) = (lexer.line, lexer.column);
    bump(lexer); // opening quote
    let mut raw = String::new();

    loop {
        match bump(lexer) {
            Some('"') => break,
            Some('\\') => {
                raw.push('\\');
                if let Some(c) = bump(lexer) {
                    raw.push(c);
                }
            }
            Some(c) => raw.push(c),
            None => {
                return Err(AuditError::UnclosedString {
                    quote: '"',
                    line,
                    column,
                    hint: Some("String literal not closed".into()),
                    code: Some(103),
                });
            }
        }
    }

    Ok(interpret_escapes(&raw))
}

/// Expand double-quote escapes. Strings with unescaped `$name` or `{$`
/// become `Token::Interpolated`.
fn interpret_escapes(raw: &str) -> Token {
    let mut out = String::new();
    let mut interpolated = false;
    let chars: Vec<char> = raw.chars().collect();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            '\\' if i + 1 < chars.len() => {
                let next = chars[i + 1];
                i += 2;
                match next {
                    'n' => out.push('\n'),
                    't' => out.push('\t'),
                    'r' => out.push('\r'),
                    'v' => out.push('\u{0B}'),
                    'e' => out.push('\u{1B}'),
                    'f' => out.push('\u{0C}'),
                    '\\' => out.push('\\'),
                    '$' => out.push('$'),
                    '"' => out.push('"'),
                    'x' => {
                        let hex: String = chars[i..].iter().take(2).take_while(|c| c.is_ascii_hexdigit()).collect();
                        if hex.is_empty() {
                            out.push_str("\\x");
                        } else {
                            i += hex.len();
                            out.push(u8::from_str_radix(&hex, 16).map(char::from).unwrap_or('?'));
                        }
                    }
                    'u' if chars.get(i) == Some(&'{') => {
                        let hex: String = chars[i + 1..].iter().take_while(|c| c.is_ascii_hexdigit()).collect();
                        if chars.get(i + 1 + hex.len()) == Some(&'}') && !hex.is_empty() {
                            i += hex.len() + 2;
                            let cp = u32::from_str_radix(&hex, 16).ok().and_then(char::from_u32);
                            out.push(cp.unwrap_or('\u{FFFD}'));
                        } else {
                            out.push_str("\\u");
                        }
                    }
                    '0'..='7' => {
                        let oct: String = chars[i - 1..].iter().take(3).take_while(|c| ('0'..='7').contains(c)).collect();
                        i += oct.len() - 1;
                        let byte = u32::from_str_radix(&oct, 8).unwrap_or(0) & 0xFF;
                        out.push(char::from_u32(byte).unwrap_or('\0'));
                    }
                    other => {
                        out.push('\\');
                        out.push(other);
                    }
                }
            }
            '$' if chars.get(i + 1).is_some_and(|c| is_ident_start(*c)) => {
                interpolated = true;
                out.push(c);
                i += 1;
            }
            '{' if chars.get(i + 1) == Some(&'$') => {
                interpolated = true;
                out.push(c);
                i += 1;
            }
            _ => {
                out.push(c);
                i += 1;
            }
        }
    }

    if interpolated { Token::Interpolated(out) } else { Token::String(out) }
}

fn tokenize_heredoc(lexer: &mut Lexer) -> Result<Token, AuditError> {
    let (line, column) = (lexer.line, lexer.column);
    for _ in 0..3 {
        bump(lexer);
    }
    while matches!(lexer.peek, Some(' ') | Some('\t')) {
        bump(lexer);
    }

    let quote = match lexer.peek {
        Some(q @ ('\'' | '"')) => {
            bump(lexer);
            Some(q)
        }
        _ => None,
    };
    let mut label = String::new();
    while let Some(c) = lexer.peek {
        if is_ident_char(c) {
            label.push(c);
            bump(lexer);
        } else {
            break;
        }
    }
    if quote.is_some() {
        bump(lexer);
    }
    if label.is_empty() || lexer.peek != Some('\n') {
        return Err(AuditError::SyntaxError {
            message: "Malformed heredoc opening".into(),
            line,
            column,
            hint: Some("Expected <<<LABEL followed by a newline".into()),
            code: Some(106),
        });
    }
    bump(lexer); // newline after the label

    let mut lines: Vec<String> = Vec::new();
    loop {
        let mut indent = 0;
        while matches!(peek_at(lexer, indent), Some(' ') | Some('\t')) {
            indent += 1;
        }
        let label_len = label.chars().count();
        let closes = label.chars().enumerate().all(|(i, c)| peek_at(lexer, indent + i) == Some(c))
            && !peek_at(lexer, indent + label_len).is_some_and(is_ident_char);
        if closes {
            // Leave whatever follows the label (`;`, `,`, `)` ...) for the next token.
            for _ in 0..indent + label_len {
                bump(lexer);
            }
            let body = lines
                .iter()
                .map(|l| strip_indent(l, indent))
                .collect::<Vec<_>>()
                .join("\n");
            return Ok(if quote == Some('\'') { Token::String(body) } else { interpret_escapes(&body) });
        }

        let mut current = String::new();
        while let Some(c) = lexer.peek {
            if c == '\n' {
                break;
            }
            current.push(c);
            bump(lexer);
        }
        if lexer.peek.is_none() {
            return Err(AuditError::UnclosedString {
                quote: '<',
                line,
                column,
                hint: Some(format!("Heredoc is never closed with {}", label)),
                code: Some(103),
            });
        }
        bump(lexer); // newline
        lines.push(current);
    }
}

fn strip_indent(line: &str, indent: usize) -> String {
    let mut rest = line;
    for _ in 0..indent {
        match rest.strip_prefix([' ', '\t']) {
            Some(r) => rest = r,
            None => break,
        }
    }
    rest.to_string()
}

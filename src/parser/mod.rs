use crate::lexer::{Lexer, Spanned, Token};
use crate::AuditError;
use crate::ast::{Mapping, ValueNode};

mod document;
mod kernel;
mod names;
mod value;

pub use names::NameContext;

/// Recursive-descent parser over the PHP subset found in config and kernel files.
///
/// The whole input is tokenized up front so the parser can look ahead freely.
pub struct Parser {
    tokens: Vec<Spanned>,
    pos: usize,
    names: Option<NameContext>,
}

impl Parser {
    pub fn new(input: &str) -> Result<Self, AuditError> {
        let tokens = Lexer::new(input).tokenize()?;
        Ok(Self { tokens, pos: 0, names: None })
    }

    /// Resolve class names against the given namespace and imports;
    /// `Foo::class` then evaluates to the fully-qualified class-name string.
    pub fn with_names(mut self, names: NameContext) -> Self {
        self.names = Some(names);
        self
    }

    pub(crate) fn tokens(&self) -> &[Spanned] {
        &self.tokens
    }

    pub(crate) fn bump(&mut self) -> Result<Token, AuditError> {
        let curr = self.peek().clone();
        if curr == Token::Eof {
            return Err(AuditError::UnexpectedEof {
                message: "Unexpected end of input".into(),
                line: self.line(),
                column: self.column(),
                hint: None,
                code: Some(201),
            });
        }
        self.pos += 1;
        Ok(curr)
    }

    pub(crate) fn peek(&self) -> &Token {
        self.peek_nth(0)
    }

    pub(crate) fn peek_nth(&self, n: usize) -> &Token {
        self.tokens
            .get(self.pos + n)
            .or_else(|| self.tokens.last())
            .map(|s| &s.token)
            .unwrap_or(&Token::Eof)
    }

    pub(crate) fn previous(&self) -> Option<&Token> {
        self.pos.checked_sub(1).and_then(|i| self.tokens.get(i)).map(|s| &s.token)
    }

    pub(crate) fn expect(&mut self, expected: Token) -> Result<Token, AuditError> {
        let (line, column) = (self.line(), self.column());
        let token = self.bump()?;
        if token != expected {
            return Err(AuditError::SyntaxError {
                message: format!("Expected {:?}, got {:?}", expected, token),
                line,
                column,
                hint: Some("Check your syntax".into()),
                code: Some(202),
            });
        }
        Ok(token)
    }

    pub(crate) fn line(&self) -> usize {
        self.tokens.get(self.pos).or_else(|| self.tokens.last()).map_or(0, |s| s.line)
    }

    pub(crate) fn column(&self) -> usize {
        self.tokens.get(self.pos).or_else(|| self.tokens.last()).map_or(0, |s| s.column)
    }

    pub(crate) fn resolve_class(&self, name: &str) -> String {
        match &self.names {
            Some(ctx) => ctx.resolve_class(name),
            None => name.trim_start_matches('\\').to_string(),
        }
    }

    pub(crate) fn resolves_names(&self) -> bool {
        self.names.is_some()
    }

    /// Evaluate the expression at the cursor into a value tree.
    pub fn parse_expression(&mut self) -> Result<ValueNode, AuditError> {
        value::parse_expression(self)
    }

    /// Find the first top-level `return` and evaluate it.
    ///
    /// `Ok(None)` means there is no top-level return or it does not return an array literal.
    pub fn parse_return_array(&mut self) -> Result<Option<Mapping>, AuditError> {
        document::parse_return_array(self)
    }

    /// Find `$property` in the first class body that declares it and evaluate its default.
    ///
    /// `Ok(None)` means the property is absent or has no default value.
    pub fn parse_property_default(&mut self, property: &str) -> Result<Option<ValueNode>, AuditError> {
        kernel::parse_property_default(self, property)
    }
}

/// Skip a bracketed group starting at the cursor, including nested groups.
pub(crate) fn skip_balanced(parser: &mut Parser) -> Result<(), AuditError> {
    let mut depth = 0usize;
    loop {
        let (line, column) = (parser.line(), parser.column());
        match parser.bump()? {
            Token::LParen | Token::LBracket | Token::LBrace | Token::AttributeStart => depth += 1,
            Token::RParen | Token::RBracket | Token::RBrace => {
                if depth == 0 {
                    return Err(AuditError::SyntaxError {
                        message: "Unbalanced closing bracket".into(),
                        line,
                        column,
                        hint: None,
                        code: Some(206),
                    });
                }
                depth -= 1;
            }
            _ => {}
        }
        if depth == 0 {
            return Ok(());
        }
    }
}

#[cfg(test)]
mod tests;

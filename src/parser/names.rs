// Author: laravel-cfg contributors
// License: MIT

use std::collections::HashMap;

use crate::lexer::{Lexer, Spanned, Token};

/// Namespace and class imports of a PHP file, used to turn class names
/// into fully-qualified names.
///
/// Only the first namespace of a file is read. Imports declared inside
/// class bodies (trait `use`) and closure `use (...)` clauses are ignored.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NameContext {
    namespace: Option<String>,
    imports: HashMap<String, String>,
}

impl NameContext {
    /// Lex `source` and collect its namespace and `use` imports.
    ///
    /// A source that does not lex yields an empty context.
    pub fn from_source(source: &str) -> Self {
        match Lexer::new(source).tokenize() {
            Ok(tokens) => Self::from_tokens(&tokens),
            Err(e) => {
                tracing::debug!(error = %e, "source did not lex, class names stay unresolved");
                Self::default()
            }
        }
    }

    /// Collect the namespace and `use` imports from an already lexed file.
    pub fn from_tokens(tokens: &[Spanned]) -> Self {
        let mut ctx = NameContext::default();
        let mut depth = 0usize;
        // Depth of the statements that belong to the namespace: 0 for
        // `namespace Foo;`, 1 inside `namespace Foo { ... }`.
        let mut scope_depth = 0usize;
        let mut statement_start = true;
        let mut seen_namespace = false;
        let mut i = 0;

        while let Some(token) = token_at(tokens, i) {
            let top_level = statement_start && depth == scope_depth;
            match token {
                Token::Eof => break,
                Token::Ident(word) if top_level && word.eq_ignore_ascii_case("namespace") => {
                    if seen_namespace {
                        break;
                    }
                    seen_namespace = true;
                    i += 1;
                    if let Some(Token::Ident(name)) = token_at(tokens, i) {
                        ctx.namespace = Some(name.trim_start_matches('\\').to_string());
                        i += 1;
                    }
                    if let Some(Token::LBrace) = token_at(tokens, i) {
                        depth += 1;
                        scope_depth = depth;
                        i += 1;
                    }
                    statement_start = true;
                }
                Token::Ident(word) if top_level && word.eq_ignore_ascii_case("use") => {
                    i = ctx.collect_use(tokens, i + 1);
                    statement_start = true;
                }
                Token::LParen | Token::LBracket | Token::LBrace | Token::AttributeStart => {
                    statement_start = *token == Token::LBrace;
                    depth += 1;
                    i += 1;
                }
                Token::RParen | Token::RBracket | Token::RBrace => {
                    if depth == 0 || (scope_depth > 0 && depth == scope_depth) {
                        break;
                    }
                    statement_start = *token == Token::RBrace;
                    depth -= 1;
                    i += 1;
                }
                Token::Semicolon => {
                    statement_start = true;
                    i += 1;
                }
                _ => {
                    statement_start = false;
                    i += 1;
                }
            }
        }

        ctx
    }

    /// Read the clauses of a `use` statement starting after the keyword and
    /// return the index just past it.
    fn collect_use(&mut self, tokens: &[Spanned], mut i: usize) -> usize {
        if token_at(tokens, i).is_some_and(is_import_kind) {
            return skip_statement(tokens, i);
        }

        loop {
            let Some(Token::Ident(name)) = token_at(tokens, i) else {
                return skip_statement(tokens, i);
            };
            let name = name.trim_start_matches('\\');
            i += 1;

            if is_separator(token_at(tokens, i)) && token_at(tokens, i + 1) == Some(&Token::LBrace) {
                i = self.collect_group(tokens, name, i + 2);
            } else {
                let (alias, next) = read_alias(tokens, i);
                self.add_import(name, alias);
                i = next;
            }

            match token_at(tokens, i) {
                Some(Token::Comma) => i += 1,
                Some(Token::Semicolon) => return i + 1,
                _ => return skip_statement(tokens, i),
            }
        }
    }

    /// Items of `use Prefix\{A, B as C}` from just after the `{`.
    fn collect_group(&mut self, tokens: &[Spanned], prefix: &str, mut i: usize) -> usize {
        loop {
            let mut class_import = true;
            if token_at(tokens, i).is_some_and(is_import_kind)
                && matches!(token_at(tokens, i + 1), Some(Token::Ident(_)))
            {
                class_import = false;
                i += 1;
            }

            match token_at(tokens, i) {
                Some(Token::Ident(item)) => {
                    let (alias, next) = read_alias(tokens, i + 1);
                    if class_import {
                        self.add_import(&format!("{}\\{}", prefix, item), alias);
                    }
                    i = next;
                }
                Some(Token::RBrace) => return i + 1,
                _ => return i,
            }

            match token_at(tokens, i) {
                Some(Token::Comma) => i += 1,
                Some(Token::RBrace) => return i + 1,
                _ => return i,
            }
        }
    }

    fn add_import(&mut self, name: &str, alias: Option<&str>) {
        let alias = alias.unwrap_or_else(|| name.rsplit('\\').next().unwrap_or(name));
        self.imports.insert(alias.to_ascii_lowercase(), name.to_string());
    }

    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    pub fn import(&self, alias: &str) -> Option<&str> {
        self.imports.get(&alias.to_ascii_lowercase()).map(String::as_str)
    }

    /// Resolve a class name the way PHP does at compile time.
    pub fn resolve_class(&self, name: &str) -> String {
        if let Some(fq) = name.strip_prefix('\\') {
            return fq.to_string();
        }
        if ["self", "static", "parent"].iter().any(|k| name.eq_ignore_ascii_case(k)) {
            return name.to_string();
        }

        let (first, rest) = match name.split_once('\\') {
            Some((first, rest)) => (first, Some(rest)),
            None => (name, None),
        };

        if first.eq_ignore_ascii_case("namespace") {
            return self.qualify(rest.unwrap_or(""));
        }
        if let Some(target) = self.import(first) {
            return match rest {
                Some(rest) => format!("{}\\{}", target, rest),
                None => target.to_string(),
            };
        }
        self.qualify(name)
    }

    fn qualify(&self, name: &str) -> String {
        match &self.namespace {
            Some(ns) if !name.is_empty() => format!("{}\\{}", ns, name),
            Some(ns) => ns.clone(),
            None => name.to_string(),
        }
    }
}

fn token_at(tokens: &[Spanned], i: usize) -> Option<&Token> {
    tokens.get(i).map(|s| &s.token)
}

/// `function` and `const` imports never name classes.
fn is_import_kind(token: &Token) -> bool {
    matches!(token, Token::Ident(word) if word.eq_ignore_ascii_case("function") || word.eq_ignore_ascii_case("const"))
}

fn is_separator(token: Option<&Token>) -> bool {
    matches!(token, Some(Token::Op(op)) if op == "\\")
}

fn read_alias(tokens: &[Spanned], i: usize) -> (Option<&str>, usize) {
    match (token_at(tokens, i), token_at(tokens, i + 1)) {
        (Some(Token::Ident(kw)), Some(Token::Ident(alias))) if kw.eq_ignore_ascii_case("as") => {
            (Some(alias.as_str()), i + 2)
        }
        _ => (None, i),
    }
}

/// Move past a malformed `use` statement without crossing a block boundary.
fn skip_statement(tokens: &[Spanned], mut i: usize) -> usize {
    loop {
        match token_at(tokens, i) {
            None | Some(Token::Eof | Token::LBrace | Token::RBrace) => return i,
            Some(Token::Semicolon) => return i + 1,
            _ => i += 1,
        }
    }
}

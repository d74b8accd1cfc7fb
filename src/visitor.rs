// Author: laravel-cfg contributors
// License: MIT

use crate::ast::{Mapping, ValueNode};
use crate::parser::{NameContext, Parser};
use crate::AuditError;

/// Evaluates the array returned by a PHP configuration file.
///
/// # Examples
/// ```
/// use laravel_cfg::ConfigVisitor;
///
/// let config = ConfigVisitor::new().visit("<?php return ['name' => env('APP_NAME', 'shop')];");
/// assert!(config.get("name").is_some_and(|v| v.is_call("env", Some("APP_NAME"))));
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct ConfigVisitor;

impl ConfigVisitor {
    pub fn new() -> Self {
        Self
    }

    /// Evaluate the first top-level `return [...]`.
    ///
    /// Files without such a statement, and files that fail to parse, both
    /// yield an empty mapping. Callers cannot tell those apart from a file
    /// that really returns `[]`.
    pub fn visit(&self, source: &str) -> Mapping {
        match self.try_visit(source) {
            Ok(Some(mapping)) => mapping,
            Ok(None) => {
                tracing::debug!("no top-level array return found");
                Mapping::new()
            }
            Err(e) => {
                tracing::debug!(error = %e, "config source did not parse");
                Mapping::new()
            }
        }
    }

    /// Like [`visit`](Self::visit) but keeps the parse error and the
    /// "no array returned" case distinct.
    pub fn try_visit(&self, source: &str) -> Result<Option<Mapping>, AuditError> {
        Parser::new(source)?.parse_return_array()
    }
}

/// Extracts the default value of a kernel's `$middlewareGroups` property.
#[derive(Debug, Clone)]
pub struct KernelMiddlewareVisitor {
    property: String,
}

impl Default for KernelMiddlewareVisitor {
    fn default() -> Self {
        Self { property: "middlewareGroups".into() }
    }
}

impl KernelMiddlewareVisitor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look for a different property name.
    pub fn for_property(property: impl Into<String>) -> Self {
        Self { property: property.into() }
    }

    /// `None` when the property is missing, has no default, its default is
    /// not an array literal, or the source does not parse.
    pub fn visit(&self, source: &str) -> Option<Mapping> {
        match self.try_visit(source) {
            Ok(Some(ValueNode::Mapping(mapping))) => Some(mapping),
            Ok(Some(other)) => {
                tracing::debug!(property = %self.property, kind = other.kind(), "property default is not an array");
                None
            }
            Ok(None) => {
                tracing::debug!(property = %self.property, "property not found or has no default");
                None
            }
            Err(e) => {
                tracing::debug!(error = %e, "kernel source did not parse");
                None
            }
        }
    }

    /// Raw property default with class names resolved against the file's
    /// namespace and imports.
    pub fn try_visit(&self, source: &str) -> Result<Option<ValueNode>, AuditError> {
        let parser = Parser::new(source)?;
        let names = NameContext::from_tokens(parser.tokens());
        parser.with_names(names).parse_property_default(&self.property)
    }
}

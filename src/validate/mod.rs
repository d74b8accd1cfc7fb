// Author: laravel-cfg contributors
// License: MIT

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use crate::ast::{Scalar, ValueNode};
use crate::AuditError;

mod adminer;
mod backup;

pub use adminer::AdminerConfigValidator;
pub use backup::BackupConfigValidator;

/// Result of reading a PHP source file for an audit.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum SourceFile {
    Missing,
    /// The file exists but cannot be read as UTF-8 text by this process.
    Unreadable(String),
    Loaded(String),
}

/// Read a file, mapping the failures an audit reports to [`SourceFile`] and
/// propagating everything else.
pub(crate) fn read_source(path: &Path) -> Result<SourceFile, AuditError> {
    match fs::read_to_string(path) {
        Ok(content) => {
            tracing::debug!(path = %path.display(), bytes = content.len(), "loaded source file");
            Ok(SourceFile::Loaded(content))
        }
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(SourceFile::Missing),
        Err(e) if matches!(e.kind(), ErrorKind::PermissionDenied | ErrorKind::InvalidData) => {
            Ok(SourceFile::Unreadable(e.to_string()))
        }
        Err(e) => Err(AuditError::FileError {
            message: format!("Failed to read file: {}", e),
            path: path.display().to_string(),
            hint: Some("The path must point to a regular file".into()),
            code: Some(302),
        }),
    }
}

/// Renders a value for "found ..." parts of messages.
pub(crate) fn describe(value: Option<&ValueNode>) -> String {
    match value {
        Some(v) => v.to_string(),
        None => "nothing".into(),
    }
}

/// Renders scalars bare (`7`, `null`, `my-app`) and anything else as `unknown`.
pub(crate) fn render_scalar(value: Option<&ValueNode>) -> String {
    match value {
        None => Scalar::Null.to_php_string(),
        Some(ValueNode::Scalar(s)) => s.to_php_string(),
        Some(_) => "unknown".into(),
    }
}

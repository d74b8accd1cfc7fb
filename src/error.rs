use std::fmt;

/// The main error type for lexing, parsing, policy loading and file access.
///
/// Audit findings are never reported through this type; validators return
/// them as plain strings. An `AuditError` means the audit itself could not run.
#[derive(Debug, Clone, PartialEq)]
pub enum AuditError {
    SyntaxError {
        message: String,
        line: usize,
        column: usize,
        hint: Option<String>,
        code: Option<u32>,
    },
    InvalidToken {
        token: String,
        line: usize,
        column: usize,
        hint: Option<String>,
        code: Option<u32>,
    },
    UnexpectedEof {
        message: String,
        line: usize,
        column: usize,
        hint: Option<String>,
        code: Option<u32>,
    },
    /// Raised when a string literal or block comment is not closed.
    UnclosedString {
        quote: char,
        line: usize,
        column: usize,
        hint: Option<String>,
        code: Option<u32>,
    },
    /// Raised for characters that cannot start any token.
    UnexpectedCharacter {
        character: char,
        line: usize,
        column: usize,
        hint: Option<String>,
        code: Option<u32>,
    },
    FileError {
        message: String,
        path: String,
        hint: Option<String>,
        code: Option<u32>,
    },
    /// Raised when a policy document cannot be decoded.
    PolicyError {
        message: String,
        hint: Option<String>,
        code: Option<u32>,
    },
}

fn suffix(hint: &Option<String>, code: &Option<u32>) -> String {
    format!(
        "{}{}",
        hint.as_ref().map_or(String::new(), |h| format!(" Hint: {}", h)),
        code.map_or(String::new(), |c| format!(" Code: {}", c))
    )
}

impl fmt::Display for AuditError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuditError::SyntaxError { message, line, column, hint, code } =>
                write!(f, "[laravel-cfg] Syntax Error at {}:{}: {}{}",
                    line, column, message, suffix(hint, code)),
            AuditError::InvalidToken { token, line, column, hint, code } =>
                write!(f, "[laravel-cfg] Invalid Token '{}' at {}:{}{}",
                    token, line, column, suffix(hint, code)),
            AuditError::UnexpectedEof { message, line, column, hint, code } =>
                write!(f, "[laravel-cfg] Unexpected EOF at {}:{}: {}{}",
                    line, column, message, suffix(hint, code)),
            AuditError::UnclosedString { quote, line, column, hint, code } =>
                write!(f, "[laravel-cfg] Unclosed literal starting with '{}' at {}:{}{}",
                    quote, line, column, suffix(hint, code)),
            AuditError::UnexpectedCharacter { character, line, column, hint, code } =>
                write!(f, "[laravel-cfg] Unexpected character '{}' at {}:{}{}",
                    character, line, column, suffix(hint, code)),
            AuditError::FileError { message, path, hint, code } =>
                write!(f, "[laravel-cfg] File Error '{}': {}{}",
                    path, message, suffix(hint, code)),
            AuditError::PolicyError { message, hint, code } =>
                write!(f, "[laravel-cfg] Policy Error: {}{}",
                    message, suffix(hint, code)),
        }
    }
}

impl std::error::Error for AuditError {}

//! Parse Laravel PHP configuration files into a value tree and audit them.
//!
//! [`ConfigVisitor`] evaluates the array a config file returns, keeping
//! `env()`/`config()` calls and class references as typed placeholders.
//! [`BackupConfigValidator`] and [`AdminerConfigValidator`] walk those trees
//! and report convention violations as plain strings.

pub mod ast;
pub mod error;
pub mod export;
pub mod lexer;
pub mod lookup;
pub mod parser;
pub mod policy;
pub mod validate;
pub mod visitor;

pub use ast::{ArrayKey, FuncCall, Mapping, Scalar, ValueNode};
pub use error::AuditError;
pub use policy::{AdminerPolicy, AuditPolicy, BackupPolicy};
pub use validate::{AdminerConfigValidator, BackupConfigValidator};
pub use visitor::{ConfigVisitor, KernelMiddlewareVisitor};

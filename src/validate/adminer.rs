use std::path::Path;

use super::{read_source, SourceFile};
use crate::ast::ValueNode;
use crate::policy::AdminerPolicy;
use crate::visitor::{ConfigVisitor, KernelMiddlewareVisitor};
use crate::AuditError;

/// Audits `config/adminer.php` and the HTTP kernel's middleware groups.
///
/// The config half and the kernel half are independent: a missing config
/// file does not stop the kernel checks.
#[derive(Debug, Clone, Default)]
pub struct AdminerConfigValidator {
    policy: AdminerPolicy,
    config_visitor: ConfigVisitor,
    kernel_visitor: KernelMiddlewareVisitor,
}

impl AdminerConfigValidator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_policy(policy: AdminerPolicy) -> Self {
        Self { policy, ..Self::default() }
    }

    pub fn policy(&self) -> &AdminerPolicy {
        &self.policy
    }

    pub fn validate<P: AsRef<Path>, K: AsRef<Path>>(&self, config_path: P, kernel_path: K) -> Result<Vec<String>, AuditError> {
        let mut errors = Vec::new();
        self.check_config(config_path.as_ref(), &mut errors)?;
        self.check_kernel(kernel_path.as_ref(), &mut errors)?;

        tracing::debug!(errors = errors.len(), "adminer config validated");
        Ok(errors)
    }

    fn check_config(&self, path: &Path, errors: &mut Vec<String>) -> Result<(), AuditError> {
        let config = match read_source(path)? {
            SourceFile::Missing => {
                errors.push(format!("Adminer config not found at {}", path.display()));
                return Ok(());
            }
            SourceFile::Unreadable(reason) => {
                errors.push(format!("Adminer config at {} is not readable: {}", path.display(), reason));
                return Ok(());
            }
            SourceFile::Loaded(source) => self.config_visitor.visit(&source),
        };
        if config.is_empty() {
            errors.push(format!("Adminer config at {} is invalid or could not be parsed", path.display()));
            return Ok(());
        }

        let middleware = config.get("middleware").and_then(ValueNode::as_str);
        if middleware != Some(self.policy.middleware.as_str()) {
            errors.push(format!(
                "adminer.middleware must be '{}', found {}",
                self.policy.middleware,
                middleware.map_or_else(|| "null".to_string(), |m| format!("'{}'", m))
            ));
        }
        Ok(())
    }

    fn check_kernel(&self, path: &Path, errors: &mut Vec<String>) -> Result<(), AuditError> {
        let groups = match read_source(path)? {
            SourceFile::Missing => {
                errors.push(format!("HTTP kernel not found at {}", path.display()));
                return Ok(());
            }
            SourceFile::Unreadable(reason) => {
                errors.push(format!("HTTP kernel at {} is not readable: {}", path.display(), reason));
                return Ok(());
            }
            SourceFile::Loaded(source) => self.kernel_visitor.visit(&source),
        };
        let Some(groups) = groups else {
            errors.push(format!("Unable to read $middlewareGroups from {}", path.display()));
            return Ok(());
        };

        let group = &self.policy.group;
        let Some(entries) = groups.get(group) else {
            errors.push(format!("Kernel middleware group '{}' is missing", group));
            return Ok(());
        };
        let Some(entries) = entries.as_mapping() else {
            errors.push(format!("Kernel middleware group '{}' must be an array, found {}", group, entries));
            return Ok(());
        };

        let protected = entries
            .values()
            .filter_map(ValueNode::as_str)
            .any(|entry| entry.contains(&self.policy.required_marker));
        if !protected {
            errors.push(format!(
                "Kernel middleware group '{}' must include {}",
                group, self.policy.required_middleware_class
            ));
        }
        Ok(())
    }
}

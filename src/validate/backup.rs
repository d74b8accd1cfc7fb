use std::path::{Path, PathBuf};

use super::{describe, read_source, render_scalar, SourceFile};
use crate::ast::{FuncCall, Mapping, Scalar, ValueNode};
use crate::policy::BackupPolicy;
use crate::visitor::ConfigVisitor;
use crate::AuditError;

/// Audits `config/backup.php` against the team's backup conventions, using
/// `config/database.php` to learn the default connection.
///
/// # Examples
/// ```no_run
/// use laravel_cfg::BackupConfigValidator;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let errors = BackupConfigValidator::new().validate("config/backup.php", None)?;
/// for error in &errors {
///     println!("{}", error);
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct BackupConfigValidator {
    policy: BackupPolicy,
    visitor: ConfigVisitor,
}

impl BackupConfigValidator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_policy(policy: BackupPolicy) -> Self {
        Self { policy, visitor: ConfigVisitor::new() }
    }

    pub fn policy(&self) -> &BackupPolicy {
        &self.policy
    }

    /// Run every check and collect the violations in a fixed order.
    ///
    /// `database_path` defaults to `database.php` next to the backup config.
    /// An empty list means the config passed.
    pub fn validate<P: AsRef<Path>>(&self, backup_path: P, database_path: Option<&Path>) -> Result<Vec<String>, AuditError> {
        let backup_path = backup_path.as_ref();

        let config = match read_source(backup_path)? {
            SourceFile::Missing => {
                return Ok(vec![format!("Backup config not found at {}", backup_path.display())]);
            }
            SourceFile::Unreadable(reason) => {
                return Ok(vec![format!("Backup config at {} is not readable: {}", backup_path.display(), reason)]);
            }
            SourceFile::Loaded(source) => self.visitor.visit(&source),
        };
        if config.is_empty() {
            return Ok(vec![format!("Backup config at {} is invalid or could not be parsed", backup_path.display())]);
        }

        let database_path = database_path
            .map(Path::to_path_buf)
            .unwrap_or_else(|| sibling_database_config(backup_path));
        let database = self.load_database_config(&database_path)?;

        let mut errors = Vec::new();
        let primary = self.check_name(&config, &mut errors);
        self.check_monitor_names(&config, primary, &mut errors);
        self.check_cleanup(&config, &mut errors);
        self.check_disks(&config, &mut errors);
        self.check_source(&config, &database, &database_path, &mut errors);
        self.check_mail(&config, &mut errors);

        tracing::debug!(path = %backup_path.display(), errors = errors.len(), "backup config validated");
        Ok(errors)
    }

    fn load_database_config(&self, path: &Path) -> Result<Mapping, AuditError> {
        Ok(match read_source(path)? {
            SourceFile::Loaded(source) => self.visitor.visit(&source),
            other => {
                tracing::debug!(path = %path.display(), state = ?other, "database config unavailable");
                Mapping::new()
            }
        })
    }

    /// Returns the primary `env()` call when `backup.name` is one, so monitor
    /// entries can be compared against it.
    fn check_name<'a>(&self, config: &'a Mapping, errors: &mut Vec<String>) -> Option<&'a FuncCall> {
        let approved = self.policy.name_env_vars.join(" or ");
        let name = config.get_path("backup.name");

        let Some(call) = name.and_then(ValueNode::as_func_call).filter(|c| c.is_call("env", None)) else {
            errors.push(format!(
                "backup.name must use env() with {}, found {}",
                approved,
                describe(name)
            ));
            return None;
        };

        if !self.policy.name_env_vars.iter().any(|var| call.is_call("env", Some(var.as_str()))) {
            errors.push(format!(
                "backup.name must read {} from the environment, found {}",
                approved, call
            ));
            return Some(call);
        }

        match call.second_arg().and_then(ValueNode::as_str) {
            Some(default) if !default.is_empty() => {
                if default.eq_ignore_ascii_case(&self.policy.forbidden_default_name) {
                    errors.push(format!(
                        "backup.name default must not be \"{}\", use the project name instead",
                        self.policy.forbidden_default_name
                    ));
                }
            }
            _ => errors.push(format!(
                "backup.name must have a non-empty default value, e.g. env('{}', 'my-project'), found {}",
                self.policy.name_env_vars.first().map_or("APP_NAME", String::as_str),
                call
            )),
        }

        Some(call)
    }

    fn check_monitor_names(&self, config: &Mapping, primary: Option<&FuncCall>, errors: &mut Vec<String>) {
        let Some(monitors) = config.get("monitor_backups").and_then(ValueNode::as_mapping) else {
            return;
        };

        for (index, entry) in monitors.iter() {
            let Some(name) = entry.as_mapping().and_then(|m| m.get("name")) else {
                continue;
            };

            let Some(call) = name.as_func_call() else {
                errors.push(format!("monitor_backups.{}.name must use env(), found {}", index, name));
                continue;
            };

            let Some(primary) = primary else {
                continue;
            };
            let consistent = call.is_call("env", None)
                && call.first_arg() == primary.first_arg()
                && call.second_arg() == primary.second_arg();
            if !consistent {
                errors.push(format!(
                    "monitor_backups.{}.name must match backup.name: expected {}, found {}",
                    index, primary, call
                ));
            }
        }
    }

    fn check_cleanup(&self, config: &Mapping, errors: &mut Vec<String>) {
        for expectation in &self.policy.cleanup_strategy {
            let path = format!("cleanup.default_strategy.{}", expectation.key);
            let actual = config.get_path(&path);
            let matches = match actual {
                Some(ValueNode::Scalar(s)) => *s == expectation.value,
                Some(_) => false,
                None => expectation.value == Scalar::Null,
            };

            if !matches {
                errors.push(format!(
                    "{} must be {}, found {}",
                    path,
                    expectation.value.to_php_string(),
                    render_scalar(actual)
                ));
            }
        }
    }

    fn check_disks(&self, config: &Mapping, errors: &mut Vec<String>) {
        let backup_disks = config.get_path("backup.destination.disks").and_then(ValueNode::as_mapping);
        if backup_disks.is_none() {
            errors.push("backup.destination.disks must be an array".to_string());
        }
        let expected = backup_disks.map(sorted_values);

        let Some(monitors) = config.get("monitor_backups").and_then(ValueNode::as_mapping) else {
            return;
        };

        for (index, entry) in monitors.iter() {
            let Some(entry) = entry.as_mapping() else {
                continue;
            };
            let Some(disks) = entry.get("disks").and_then(ValueNode::as_mapping) else {
                errors.push(format!("monitor_backups.{}.disks must be an array", index));
                continue;
            };

            if let Some(expected) = &expected {
                let actual = sorted_values(disks);
                if actual != *expected {
                    errors.push(format!(
                        "monitor_backups.{}.disks must match backup.destination.disks: expected [{}], found [{}]",
                        index,
                        expected.join(", "),
                        actual.join(", ")
                    ));
                }
            }
        }
    }

    fn check_source(&self, config: &Mapping, database: &Mapping, database_path: &Path, errors: &mut Vec<String>) {
        let follow_links = config.get_path("backup.source.files.follow_links");
        if follow_links.and_then(ValueNode::as_bool) != Some(true) {
            errors.push(format!(
                "backup.source.files.follow_links must be true, found {}",
                describe(follow_links)
            ));
        }

        let relative_path = config.get_path("backup.source.files.relative_path");
        if !relative_path.is_some_and(|v| v.is_call(&self.policy.relative_path_function, None)) {
            errors.push(format!(
                "backup.source.files.relative_path must be {}(), found {}",
                self.policy.relative_path_function,
                describe(relative_path)
            ));
        }

        let Some(databases) = config.get_path("backup.source.databases").and_then(ValueNode::as_mapping) else {
            errors.push("backup.source.databases must be an array".to_string());
            return;
        };

        let Some(default) = database.get("default") else {
            errors.push(format!(
                "Cannot determine the default database connection: 'default' is missing from {}",
                database_path.display()
            ));
            return;
        };

        if !databases.values().any(|entry| same_connection(entry, default)) {
            errors.push(format!(
                "backup.source.databases must include the default database connection {}",
                render_connection(default)
            ));
        }
    }

    fn check_mail(&self, config: &Mapping, errors: &mut Vec<String>) {
        let to = config.get_path("notifications.mail.to");
        if !to.and_then(ValueNode::as_str).is_some_and(|s| s.ends_with(&self.policy.mail_to_suffix)) {
            errors.push(format!(
                "notifications.mail.to must be an address ending in {}, found {}",
                self.policy.mail_to_suffix,
                describe(to)
            ));
        }

        let checks = [
            ("notifications.mail.from.address", &self.policy.mail_from_address_key),
            ("notifications.mail.from.name", &self.policy.mail_from_name_key),
        ];
        for (path, key) in checks {
            let value = config.get_path(path);
            if !value.is_some_and(|v| v.is_call("config", Some(key.as_str()))) {
                errors.push(format!("{} must be config('{}'), found {}", path, key, describe(value)));
            }
        }
    }
}

fn sibling_database_config(backup_path: &Path) -> PathBuf {
    backup_path
        .parent()
        .unwrap_or_else(|| Path::new("."))
        .join("database.php")
}

fn sorted_values(mapping: &Mapping) -> Vec<String> {
    let mut values: Vec<String> = mapping.values().map(render_connection).collect();
    values.sort();
    values
}

/// Two connection references match when they are the same call with the same
/// arguments, or the same string.
fn same_connection(entry: &ValueNode, default: &ValueNode) -> bool {
    match (entry, default) {
        (ValueNode::FuncCall(a), ValueNode::FuncCall(b)) => a.name == b.name && a.args == b.args,
        (ValueNode::Scalar(Scalar::String(a)), ValueNode::Scalar(Scalar::String(b))) => a == b,
        _ => false,
    }
}

fn render_connection(value: &ValueNode) -> String {
    match value {
        ValueNode::Scalar(s) => s.to_php_string(),
        other => other.to_string(),
    }
}

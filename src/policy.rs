// Author: laravel-cfg contributors
// License: MIT

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::ast::Scalar;
use crate::AuditError;

/// Expected literal value for one `cleanup.default_strategy` key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CleanupExpectation {
    pub key: String,
    pub value: Scalar,
}

impl CleanupExpectation {
    pub fn new(key: impl Into<String>, value: Scalar) -> Self {
        Self { key: key.into(), value }
    }
}

/// Conventions enforced on `config/backup.php`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackupPolicy {
    /// Environment variables allowed as the source of `backup.name`.
    pub name_env_vars: Vec<String>,
    /// Compared case-insensitively against the `env()` default.
    pub forbidden_default_name: String,
    pub cleanup_strategy: Vec<CleanupExpectation>,
    pub mail_to_suffix: String,
    pub mail_from_address_key: String,
    pub mail_from_name_key: String,
    pub relative_path_function: String,
}

impl Default for BackupPolicy {
    fn default() -> Self {
        Self {
            name_env_vars: vec!["APP_NAME".into(), "APP_URL".into()],
            forbidden_default_name: "laravel".into(),
            cleanup_strategy: vec![
                CleanupExpectation::new("keep_all_backups_for_days", Scalar::Int(7)),
                CleanupExpectation::new("keep_daily_backups_for_days", Scalar::Int(16)),
                CleanupExpectation::new("keep_weekly_backups_for_weeks", Scalar::Int(8)),
                CleanupExpectation::new("keep_monthly_backups_for_months", Scalar::Int(4)),
                CleanupExpectation::new("keep_yearly_backups_for_years", Scalar::Int(2)),
                CleanupExpectation::new("delete_oldest_backups_when_using_more_megabytes_than", Scalar::Null),
            ],
            mail_to_suffix: "@inbound.postmarkapp.com".into(),
            mail_from_address_key: "mail.from.address".into(),
            mail_from_name_key: "mail.from.name".into(),
            relative_path_function: "base_path".into(),
        }
    }
}

/// Conventions enforced on `config/adminer.php` and the HTTP kernel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdminerPolicy {
    pub middleware: String,
    pub group: String,
    pub required_middleware_class: String,
    /// Substring a group entry must contain to count as the required middleware.
    pub required_marker: String,
}

impl Default for AdminerPolicy {
    fn default() -> Self {
        Self {
            middleware: "adminer".into(),
            group: "adminer".into(),
            required_middleware_class:
                "Wnx\\TfaConfirmation\\Http\\Middleware\\RequireTwoFactorAuthenticationConfirmation".into(),
            required_marker: "RequireTwoFactorAuthenticationConfirmation".into(),
        }
    }
}

/// Both policies, loadable from a JSON document. Missing fields keep their defaults.
///
/// ```
/// use laravel_cfg::AuditPolicy;
///
/// let policy = AuditPolicy::from_json_str(r#"{ "backup": { "forbidden_default_name": "app" } }"#).unwrap();
/// assert_eq!(policy.backup.forbidden_default_name, "app");
/// assert_eq!(policy.adminer.group, "adminer");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditPolicy {
    pub backup: BackupPolicy,
    pub adminer: AdminerPolicy,
}

impl AuditPolicy {
    pub fn from_json_str(input: &str) -> Result<Self, AuditError> {
        serde_json::from_str(input).map_err(|e| AuditError::PolicyError {
            message: format!("Invalid policy document: {}", e),
            hint: Some(format!("Check line {} column {}", e.line(), e.column())),
            code: Some(401),
        })
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, AuditError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| AuditError::FileError {
            message: format!("Failed to read policy file: {}", e),
            path: path.display().to_string(),
            hint: Some("Check that the file exists and is readable".into()),
            code: Some(301),
        })?;
        tracing::debug!(path = %path.display(), "loading audit policy");
        Self::from_json_str(&content)
    }

    pub fn to_json_string(&self) -> Result<String, AuditError> {
        serde_json::to_string_pretty(self).map_err(|e| AuditError::PolicyError {
            message: format!("Failed to serialize policy: {}", e),
            hint: None,
            code: Some(402),
        })
    }
}

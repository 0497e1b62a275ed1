use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::{ConfigError, Result};

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct GateConfig {
    #[serde(default)]
    pub labels: LabelConfig,
    #[serde(default)]
    pub exclusions: ExclusionConfig,
    #[serde(default)]
    pub kinds: KindConfig,
    #[serde(default)]
    pub diff: DiffConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl GateConfig {
    pub fn validate(&self) -> Result<()> {
        // Label validations
        let label_keys = [
            ("labels.do_not_reconcile_key", &self.labels.do_not_reconcile_key),
            ("labels.version_key", &self.labels.version_key),
            ("labels.canary_key", &self.labels.canary_key),
        ];
        for (name, key) in label_keys {
            if key.trim().is_empty() {
                return Err(ConfigError::validation(format!("{name} must not be empty")));
            }
        }

        // Exclusion validations
        if self.exclusions.ephemeral_status_prefix.is_empty()
            && self.exclusions.ephemeral_status_suffix.is_empty()
        {
            return Err(ConfigError::validation(
                "exclusions.ephemeral_status_prefix and ephemeral_status_suffix cannot both be empty",
            ));
        }
        if self.exclusions.override_config_name.trim().is_empty() {
            return Err(ConfigError::validation(
                "exclusions.override_config_name must not be empty",
            ));
        }

        // Kind validations
        let builtin = [
            &self.kinds.config_kind,
            &self.kinds.secret_kind,
            &self.kinds.worker_kind,
        ];
        if builtin.iter().any(|k| k.trim().is_empty()) {
            return Err(ConfigError::validation(
                "kinds.config_kind, secret_kind and worker_kind must not be empty",
            ));
        }
        let mut seen = BTreeSet::new();
        for primary in &self.kinds.primary {
            if primary.kind.trim().is_empty() {
                return Err(ConfigError::validation("kinds.primary entries need a kind"));
            }
            if builtin.contains(&&primary.kind) {
                return Err(ConfigError::validation(format!(
                    "kinds.primary cannot track builtin secondary kind {}",
                    primary.kind
                )));
            }
            if !seen.insert(primary.kind.as_str()) {
                return Err(ConfigError::validation(format!(
                    "kinds.primary lists {} more than once",
                    primary.kind
                )));
            }
        }

        // Diff validation
        if self.diff.volatile_fields.iter().any(|f| f.trim().is_empty()) {
            return Err(ConfigError::validation(
                "diff.volatile_fields must not contain empty names",
            ));
        }

        // Logging validation
        let lvl = self.logging.level.to_ascii_lowercase();
        let valid_levels = ["trace", "debug", "info", "warn", "error", "off"];
        if !valid_levels.contains(&lvl.as_str()) {
            return Err(ConfigError::validation(format!(
                "logging.level must be one of {valid_levels:?}"
            )));
        }
        Ok(())
    }

    /// Render the configuration as TOML.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::parse(format!("TOML render error: {e}")))
    }

    pub fn primary_kind(&self, kind: &str) -> Option<&PrimaryKindConfig> {
        self.kinds.primary.iter().find(|p| p.kind == kind)
    }
}

/// Well-known label keys and values.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LabelConfig {
    /// Label that unconditionally suppresses update-triggered reconciles
    #[serde(default = "default_do_not_reconcile_key")]
    pub do_not_reconcile_key: String,
    #[serde(default = "default_true_value")]
    pub do_not_reconcile_value: String,
    /// Label whose appearance or change signals an upgrade
    #[serde(default = "default_version_key")]
    pub version_key: String,
    /// Label carried by ephemeral canary worker deployments
    #[serde(default = "default_canary_key")]
    pub canary_key: String,
    #[serde(default = "default_true_value")]
    pub canary_value: String,
}

impl Default for LabelConfig {
    fn default() -> Self {
        Self {
            do_not_reconcile_key: default_do_not_reconcile_key(),
            do_not_reconcile_value: default_true_value(),
            version_key: default_version_key(),
            canary_key: default_canary_key(),
            canary_value: default_true_value(),
        }
    }
}

fn default_do_not_reconcile_key() -> String {
    "do_not_reconcile".into()
}
fn default_true_value() -> String {
    "true".into()
}
fn default_version_key() -> String {
    "ceph_version".into()
}
fn default_canary_key() -> String {
    "mon_canary".into()
}

/// Names that exclude secondary objects from triggering.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExclusionConfig {
    /// Transient per-worker status config objects start with this prefix...
    #[serde(default = "default_status_prefix")]
    pub ephemeral_status_prefix: String,
    /// ...and end with this suffix.
    #[serde(default = "default_status_suffix")]
    pub ephemeral_status_suffix: String,
    /// The only config object whose updates trigger a reconcile
    #[serde(default = "default_override_name")]
    pub override_config_name: String,
    /// Secrets whose updates never trigger a reconcile
    #[serde(default = "default_ignorable_secrets")]
    pub ignorable_secret_names: Vec<String>,
}

impl Default for ExclusionConfig {
    fn default() -> Self {
        Self {
            ephemeral_status_prefix: default_status_prefix(),
            ephemeral_status_suffix: default_status_suffix(),
            override_config_name: default_override_name(),
            ignorable_secret_names: default_ignorable_secrets(),
        }
    }
}

fn default_status_prefix() -> String {
    "rook-ceph-osd-".into()
}
fn default_status_suffix() -> String {
    "-status".into()
}
fn default_override_name() -> String {
    "rook-config-override".into()
}
fn default_ignorable_secrets() -> Vec<String> {
    vec!["rook-ceph-config".into()]
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PrimaryKindConfig {
    pub kind: String,
    #[serde(default)]
    pub tracks_upgrade: bool,
}

impl PrimaryKindConfig {
    pub fn new(kind: impl Into<String>, tracks_upgrade: bool) -> Self {
        Self {
            kind: kind.into(),
            tracks_upgrade,
        }
    }
}

/// Kinds the predicates know about.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct KindConfig {
    /// API group of every primary kind
    #[serde(default = "default_api_group")]
    pub api_group: String,
    #[serde(default = "default_primary_kinds")]
    pub primary: Vec<PrimaryKindConfig>,
    #[serde(default = "default_config_kind")]
    pub config_kind: String,
    #[serde(default = "default_secret_kind")]
    pub secret_kind: String,
    #[serde(default = "default_worker_kind")]
    pub worker_kind: String,
}

impl Default for KindConfig {
    fn default() -> Self {
        Self {
            api_group: default_api_group(),
            primary: default_primary_kinds(),
            config_kind: default_config_kind(),
            secret_kind: default_secret_kind(),
            worker_kind: default_worker_kind(),
        }
    }
}

fn default_api_group() -> String {
    "ceph.rook.io".into()
}
fn default_primary_kinds() -> Vec<PrimaryKindConfig> {
    vec![
        PrimaryKindConfig::new("CephCluster", false),
        PrimaryKindConfig::new("CephBlockPool", false),
        PrimaryKindConfig::new("CephFilesystem", true),
        PrimaryKindConfig::new("CephNFS", true),
        PrimaryKindConfig::new("CephObjectStore", true),
        PrimaryKindConfig::new("CephObjectStoreUser", false),
        PrimaryKindConfig::new("CephObjectRealm", false),
        PrimaryKindConfig::new("CephObjectZoneGroup", false),
        PrimaryKindConfig::new("CephObjectZone", false),
        PrimaryKindConfig::new("CephRBDMirror", true),
    ]
}
fn default_config_kind() -> String {
    "ConfigMap".into()
}
fn default_secret_kind() -> String {
    "Secret".into()
}
fn default_worker_kind() -> String {
    "Deployment".into()
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DiffConfig {
    /// Top-level fields whose changes never count
    #[serde(default = "default_volatile_fields")]
    pub volatile_fields: Vec<String>,
}

impl Default for DiffConfig {
    fn default() -> Self {
        Self {
            volatile_fields: default_volatile_fields(),
        }
    }
}

fn default_volatile_fields() -> Vec<String> {
    vec!["status".into(), "metadata".into()]
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_follow_operator_conventions() {
        let cfg = GateConfig::default();
        assert_eq!(cfg.labels.do_not_reconcile_key, "do_not_reconcile");
        assert_eq!(cfg.labels.do_not_reconcile_value, "true");
        assert_eq!(cfg.labels.version_key, "ceph_version");
        assert_eq!(cfg.labels.canary_key, "mon_canary");
        assert_eq!(cfg.exclusions.override_config_name, "rook-config-override");
        assert_eq!(cfg.exclusions.ignorable_secret_names, vec!["rook-ceph-config"]);
        assert_eq!(cfg.diff.volatile_fields, vec!["status", "metadata"]);
        assert_eq!(cfg.kinds.primary.len(), 10);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_upgrade_tracking_defaults() {
        let cfg = GateConfig::default();
        let tracking: Vec<&str> = cfg
            .kinds
            .primary
            .iter()
            .filter(|p| p.tracks_upgrade)
            .map(|p| p.kind.as_str())
            .collect();
        assert_eq!(
            tracking,
            vec!["CephFilesystem", "CephNFS", "CephObjectStore", "CephRBDMirror"]
        );
        assert_eq!(cfg.primary_kind("CephCluster").map(|p| p.tracks_upgrade), Some(false));
        assert!(cfg.primary_kind("ConfigMap").is_none());
    }

    #[test]
    fn test_validation_rejects_duplicates_and_builtins() {
        let mut cfg = GateConfig::default();
        cfg.kinds.primary.push(PrimaryKindConfig::new("CephCluster", true));
        assert!(cfg.validate().is_err());

        let mut cfg = GateConfig::default();
        cfg.kinds.primary.push(PrimaryKindConfig::new("Secret", false));
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_validation_rejects_empty_values() {
        let mut cfg = GateConfig::default();
        cfg.labels.version_key = " ".into();
        assert!(cfg.validate().is_err());

        let mut cfg = GateConfig::default();
        cfg.exclusions.ephemeral_status_prefix.clear();
        cfg.exclusions.ephemeral_status_suffix.clear();
        assert!(cfg.validate().is_err());

        let mut cfg = GateConfig::default();
        cfg.diff.volatile_fields.push(String::new());
        assert!(cfg.validate().is_err());

        let mut cfg = GateConfig::default();
        cfg.logging.level = "loud".into();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let cfg: GateConfig = toml::from_str(
            r#"
[labels]
version_key = "app.example.com/version"
"#,
        )
        .unwrap();
        assert_eq!(cfg.labels.version_key, "app.example.com/version");
        assert_eq!(cfg.labels.do_not_reconcile_key, "do_not_reconcile");
        assert_eq!(cfg.kinds, KindConfig::default());
    }

    #[test]
    fn test_toml_round_trip() {
        let cfg = GateConfig::default();
        let rendered = cfg.to_toml().unwrap();
        assert!(rendered.contains("rook-config-override"));
        let parsed: GateConfig = toml::from_str(&rendered).unwrap();
        assert_eq!(parsed, cfg);
    }
}

use kgate_config::LabelConfig;
use std::collections::BTreeMap;

/// Well-known label checks shared by both predicates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelPolicy {
    do_not_reconcile_key: String,
    do_not_reconcile_value: String,
    version_key: String,
}

impl Default for LabelPolicy {
    fn default() -> Self {
        Self::from_config(&LabelConfig::default())
    }
}

impl LabelPolicy {
    pub fn from_config(config: &LabelConfig) -> Self {
        Self {
            do_not_reconcile_key: config.do_not_reconcile_key.clone(),
            do_not_reconcile_value: config.do_not_reconcile_value.clone(),
            version_key: config.version_key.clone(),
        }
    }

    pub fn do_not_reconcile_key(&self) -> &str {
        &self.do_not_reconcile_key
    }

    pub fn version_key(&self) -> &str {
        &self.version_key
    }

    /// The do-not-reconcile label is present with its configured value.
    pub fn is_do_not_reconcile(&self, labels: &BTreeMap<String, String>) -> bool {
        labels
            .get(&self.do_not_reconcile_key)
            .is_some_and(|value| *value == self.do_not_reconcile_value)
    }

    /// The version label newly appeared, or changed value.
    ///
    /// Removing the label is not an upgrade.
    pub fn is_upgrade(
        &self,
        old: &BTreeMap<String, String>,
        new: &BTreeMap<String, String>,
    ) -> bool {
        match (old.get(&self.version_key), new.get(&self.version_key)) {
            (None, Some(_)) => true,
            (Some(previous), Some(current)) => previous != current,
            _ => false,
        }
    }
}

//! Kind registry: maps kind names to accessor adapters.
//!
//! The registry is built once at setup and never mutated afterwards, so it
//! can be shared by `Arc` across every concurrent predicate invocation.

use kgate_config::GateConfig;
use kgate_core::{GateError, Result, WatchedObject};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use time::OffsetDateTime;
use tracing::debug;

/// What part an object kind plays in reconciliation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KindRole {
    /// Top-level managed resource
    Primary,
    /// Configuration object owned by a primary
    ConfigObject,
    /// Secret owned by a primary
    Secret,
    /// Worker-process deployment owned by a primary
    WorkerDeployment,
    /// Registered, but with no special handling
    Other,
}

impl KindRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            KindRole::Primary => "primary",
            KindRole::ConfigObject => "config_object",
            KindRole::Secret => "secret",
            KindRole::WorkerDeployment => "worker_deployment",
            KindRole::Other => "other",
        }
    }
}

impl std::fmt::Display for KindRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Accessor capability set for one object kind.
///
/// The defaults read the standard metadata fields; adapters only override
/// what differs for their kind.
pub trait KindAdapter: Send + Sync + std::fmt::Debug {
    /// Kind name as it appears in `kind` and in owner references.
    fn kind(&self) -> &str;

    /// API group of the kind. The core group is `""`.
    fn api_group(&self) -> &str;

    fn role(&self) -> KindRole;

    /// Whether updates of the version label count as an upgrade.
    fn tracks_upgrade(&self) -> bool {
        false
    }

    /// Desired-state portion of the object.
    fn spec<'a>(&self, object: &'a WatchedObject) -> Option<&'a Value> {
        object.spec()
    }

    fn labels<'a>(&self, object: &'a WatchedObject) -> &'a BTreeMap<String, String> {
        object.labels()
    }

    fn generation(&self, object: &WatchedObject) -> i64 {
        object.metadata.generation
    }

    fn deletion_timestamp(&self, object: &WatchedObject) -> Option<OffsetDateTime> {
        object.metadata.deletion_timestamp
    }
}

/// Data-driven adapter covering every kind kgate ships with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceKind {
    kind: String,
    api_group: String,
    role: KindRole,
    tracks_upgrade: bool,
    spec_field: String,
}

impl ResourceKind {
    pub fn new(kind: impl Into<String>, api_group: impl Into<String>, role: KindRole) -> Self {
        Self {
            kind: kind.into(),
            api_group: api_group.into(),
            role,
            tracks_upgrade: false,
            spec_field: "spec".into(),
        }
    }

    pub fn primary(kind: impl Into<String>, api_group: impl Into<String>) -> Self {
        Self::new(kind, api_group, KindRole::Primary)
    }

    /// Core-group config object; its desired state lives in `data`.
    pub fn config_object(kind: impl Into<String>) -> Self {
        Self::new(kind, "", KindRole::ConfigObject).with_spec_field("data")
    }

    /// Core-group secret; its desired state lives in `data`.
    pub fn secret(kind: impl Into<String>) -> Self {
        Self::new(kind, "", KindRole::Secret).with_spec_field("data")
    }

    pub fn worker(kind: impl Into<String>) -> Self {
        Self::new(kind, "apps", KindRole::WorkerDeployment)
    }

    pub fn with_upgrade_tracking(mut self, tracks_upgrade: bool) -> Self {
        self.tracks_upgrade = tracks_upgrade;
        self
    }

    pub fn with_spec_field(mut self, field: impl Into<String>) -> Self {
        self.spec_field = field.into();
        self
    }
}

impl KindAdapter for ResourceKind {
    fn kind(&self) -> &str {
        &self.kind
    }

    fn api_group(&self) -> &str {
        &self.api_group
    }

    fn role(&self) -> KindRole {
        self.role
    }

    fn tracks_upgrade(&self) -> bool {
        self.tracks_upgrade
    }

    fn spec<'a>(&self, object: &'a WatchedObject) -> Option<&'a Value> {
        object.field(&self.spec_field)
    }
}

/// Immutable kind-name to adapter map.
#[derive(Debug, Default)]
pub struct KindRegistry {
    adapters: HashMap<String, Arc<dyn KindAdapter>>,
}

impl KindRegistry {
    pub fn builder() -> KindRegistryBuilder {
        KindRegistryBuilder::new()
    }

    /// Register every primary kind from the configuration plus the builtin
    /// secondary kinds.
    pub fn from_config(config: &GateConfig) -> Result<Self> {
        let kinds = &config.kinds;
        let builder = kinds.primary.iter().fold(Self::builder(), |builder, primary| {
            builder.register(
                ResourceKind::primary(&primary.kind, &kinds.api_group)
                    .with_upgrade_tracking(primary.tracks_upgrade),
            )
        });
        builder
            .register(ResourceKind::config_object(&kinds.config_kind))
            .register(ResourceKind::secret(&kinds.secret_kind))
            .register(ResourceKind::worker(&kinds.worker_kind))
            .build()
    }

    pub fn get(&self, kind: &str) -> Option<&Arc<dyn KindAdapter>> {
        self.adapters.get(kind)
    }

    /// Like [`get`](Self::get), but an unregistered kind is an error.
    pub fn lookup(&self, kind: &str) -> Result<&Arc<dyn KindAdapter>> {
        self.get(kind).ok_or_else(|| GateError::unknown_kind(kind))
    }

    /// Role of a kind; unregistered kinds are [`KindRole::Other`].
    pub fn role_of(&self, kind: &str) -> KindRole {
        self.get(kind).map_or(KindRole::Other, |adapter| adapter.role())
    }

    pub fn kinds(&self) -> impl Iterator<Item = &str> {
        self.adapters.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.adapters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.adapters.is_empty()
    }
}

/// Collects adapters and rejects duplicates on `build`.
pub struct KindRegistryBuilder {
    adapters: Vec<Arc<dyn KindAdapter>>,
}

impl KindRegistryBuilder {
    pub fn new() -> Self {
        Self {
            adapters: Vec::new(),
        }
    }

    pub fn register<A: KindAdapter + 'static>(self, adapter: A) -> Self {
        self.register_shared(Arc::new(adapter))
    }

    pub fn register_shared(mut self, adapter: Arc<dyn KindAdapter>) -> Self {
        self.adapters.push(adapter);
        self
    }

    pub fn build(self) -> Result<KindRegistry> {
        let mut adapters = HashMap::with_capacity(self.adapters.len());
        for adapter in self.adapters {
            let kind = adapter.kind().to_string();
            if kind.is_empty() {
                return Err(GateError::configuration("kind adapters need a kind name"));
            }
            debug!(kind = %kind, role = %adapter.role(), "Registered kind adapter");
            if adapters.insert(kind.clone(), adapter).is_some() {
                return Err(GateError::configuration(format!(
                    "kind {kind} registered more than once"
                )));
            }
        }
        Ok(KindRegistry { adapters })
    }
}

impl Default for KindRegistryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_config_registers_all_kinds() {
        let registry = KindRegistry::from_config(&GateConfig::default()).unwrap();
        assert_eq!(registry.len(), 13);
        assert_eq!(registry.role_of("CephCluster"), KindRole::Primary);
        assert_eq!(registry.role_of("ConfigMap"), KindRole::ConfigObject);
        assert_eq!(registry.role_of("Secret"), KindRole::Secret);
        assert_eq!(registry.role_of("Deployment"), KindRole::WorkerDeployment);
        assert_eq!(registry.role_of("Service"), KindRole::Other);

        let nfs = registry.lookup("CephNFS").unwrap();
        assert!(nfs.tracks_upgrade());
        assert_eq!(nfs.api_group(), "ceph.rook.io");
        assert!(!registry.lookup("CephCluster").unwrap().tracks_upgrade());
    }

    #[test]
    fn test_lookup_unknown_kind() {
        let registry = KindRegistry::from_config(&GateConfig::default()).unwrap();
        let err = registry.lookup("CephWidget").unwrap_err();
        assert!(matches!(err, GateError::UnknownKind(kind) if kind == "CephWidget"));
    }

    #[test]
    fn test_duplicate_registration_fails() {
        let result = KindRegistry::builder()
            .register(ResourceKind::secret("Secret"))
            .register(ResourceKind::secret("Secret"))
            .build();
        assert!(matches!(result, Err(GateError::Configuration(_))));
    }

    #[test]
    fn test_spec_field_per_kind() {
        let config_map = ResourceKind::config_object("ConfigMap");
        let object = WatchedObject::new("v1", "ConfigMap", "rook-config-override")
            .with_field("data", json!({"config": "[global]"}));
        assert_eq!(config_map.spec(&object), Some(&json!({"config": "[global]"})));

        let pool = ResourceKind::primary("CephBlockPool", "ceph.rook.io");
        let object = WatchedObject::new("ceph.rook.io/v1", "CephBlockPool", "replicapool")
            .with_spec(json!({"replicated": {"size": 3}}))
            .with_generation(4);
        assert_eq!(pool.spec(&object), Some(&json!({"replicated": {"size": 3}})));
        assert_eq!(pool.generation(&object), 4);
        assert_eq!(pool.deletion_timestamp(&object), None);
    }

    #[test]
    fn test_registry_is_shareable_across_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<KindRegistry>();
        assert_send_sync::<Arc<dyn KindAdapter>>();
    }
}

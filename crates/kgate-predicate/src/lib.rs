//! Reconcile-trigger predicates.
//!
//! Given a watch event for a primary resource or one of its owned secondary
//! objects, decide whether the owning primary must be reconciled:
//!
//! - [`PrimaryPredicate`] reacts to spec changes, deletion and upgrades of
//!   the managed custom resources.
//! - [`SecondaryPredicate`] reacts to deletion and real content changes of
//!   objects owned by a tracked primary kind, after [`ExclusionRuleSet`]
//!   has filtered out known noise.
//!
//! Both implement [`EventFilter`] and only read shared immutable state, so
//! they can be invoked concurrently. [`PredicateFactory`] builds that state
//! once and hands out predicates sharing it.

pub mod diff;
pub mod exclusion;
pub mod filter;
pub mod labels;
pub mod owner;
pub mod primary;
pub mod registry;
pub mod secondary;

use kgate_config::GateConfig;
use kgate_core::Result;
use std::sync::Arc;

pub use diff::{Diff, Differ, semantic_diff, structural_diff, values_equivalent};
pub use exclusion::{
    EventPhase, ExclusionRule, ExclusionRuleSet, ExclusionRuleSetBuilder, KindSelector, Matcher,
    Verdict,
};
pub use filter::EventFilter;
pub use labels::LabelPolicy;
pub use owner::{OwnerMatch, OwnerReferenceMatcher};
pub use primary::PrimaryPredicate;
pub use registry::{KindAdapter, KindRegistry, KindRegistryBuilder, KindRole, ResourceKind};
pub use secondary::SecondaryPredicate;

/// Builds the shared registry, rule set and differ once and vends
/// predicates that share them.
#[derive(Debug, Clone)]
pub struct PredicateFactory {
    config: Arc<GateConfig>,
    registry: Arc<KindRegistry>,
    rules: Arc<ExclusionRuleSet>,
    differ: Arc<Differ>,
}

impl PredicateFactory {
    pub fn from_config(config: GateConfig) -> Result<Self> {
        let registry = KindRegistry::from_config(&config)?;
        let rules = ExclusionRuleSet::from_config(&config)?;
        let differ = Differ::from_config(&config.diff);
        Ok(Self {
            config: Arc::new(config),
            registry: Arc::new(registry),
            rules: Arc::new(rules),
            differ: Arc::new(differ),
        })
    }

    /// Replace the exclusion rules, e.g. with the defaults plus extra rules.
    pub fn with_rules(mut self, rules: ExclusionRuleSet) -> Self {
        self.rules = Arc::new(rules);
        self
    }

    /// Replace the kind registry, e.g. to register custom adapters.
    pub fn with_registry(mut self, registry: KindRegistry) -> Self {
        self.registry = Arc::new(registry);
        self
    }

    pub fn primary(&self) -> PrimaryPredicate {
        PrimaryPredicate::new(
            Arc::clone(&self.registry),
            LabelPolicy::from_config(&self.config.labels),
        )
    }

    pub fn secondary(&self, owner_kind: &str) -> SecondaryPredicate {
        SecondaryPredicate::new(
            owner_kind,
            Arc::clone(&self.registry),
            Arc::clone(&self.rules),
            Arc::clone(&self.differ),
        )
    }

    pub fn config(&self) -> &GateConfig {
        &self.config
    }

    pub fn registry(&self) -> &Arc<KindRegistry> {
        &self.registry
    }

    pub fn rules(&self) -> &Arc<ExclusionRuleSet> {
        &self.rules
    }

    pub fn differ(&self) -> &Arc<Differ> {
        &self.differ
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_factory_shares_state() {
        let factory = PredicateFactory::from_config(GateConfig::default()).unwrap();
        let primary = factory.primary();
        let secondary = factory.secondary("CephObjectStore");
        assert!(Arc::ptr_eq(primary.registry(), factory.registry()));
        assert!(secondary.is_active());
        assert_eq!(secondary.owner_kind(), "CephObjectStore");
        assert_eq!(Arc::strong_count(factory.rules()), 2);
    }

    #[test]
    fn test_predicates_as_trait_objects() {
        let factory = PredicateFactory::from_config(GateConfig::default()).unwrap();
        let filters: Vec<Arc<dyn EventFilter>> = vec![
            Arc::new(factory.primary()),
            Arc::new(factory.secondary("CephCluster")),
        ];
        let names: Vec<&str> = filters.iter().map(|f| f.name()).collect();
        assert_eq!(names, vec!["primary", "secondary/CephCluster"]);
    }
}

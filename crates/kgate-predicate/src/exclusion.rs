//! Exclusion rules evaluated before any diffing.
//!
//! Each rule names the kinds and event phase it applies to, a matcher over
//! the object, and a verdict. Rules are checked in priority order and the
//! first one that applies decides; when none applies the caller falls
//! through to its normal logic.

use kgate_config::GateConfig;
use kgate_core::{GateError, Result, WatchedObject};
use std::collections::BTreeSet;
use std::fmt;
use tracing::debug;

use crate::registry::KindRole;

pub const DO_NOT_RECONCILE_RULE: &str = "do-not-reconcile";
pub const EPHEMERAL_STATUS_RULE: &str = "ephemeral-status";
pub const CANARY_WORKER_RULE: &str = "canary-worker";
pub const DESIGNATED_OVERRIDE_RULE: &str = "designated-override";
pub const IGNORABLE_SECRET_RULE: &str = "ignorable-secret";
pub const WORKER_DEPLOYMENT_RULE: &str = "worker-deployment";

/// Event phase a rule is checked in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventPhase {
    Update,
    Delete,
}

impl EventPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventPhase::Update => "update",
            EventPhase::Delete => "delete",
        }
    }
}

impl fmt::Display for EventPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Which objects a rule looks at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KindSelector {
    Any,
    Role(KindRole),
    Kind(String),
}

impl KindSelector {
    pub fn selects(&self, kind: &str, role: KindRole) -> bool {
        match self {
            KindSelector::Any => true,
            KindSelector::Role(expected) => *expected == role,
            KindSelector::Kind(expected) => expected == kind,
        }
    }
}

/// Condition over a single object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Matcher {
    /// Label present with exactly this value
    LabelEquals { key: String, value: String },
    /// Name starts with `prefix` and ends with `suffix`
    NamePrefixSuffix { prefix: String, suffix: String },
    NameIn(BTreeSet<String>),
    NameNotIn(BTreeSet<String>),
    Always,
}

impl Matcher {
    pub fn label_equals(key: impl Into<String>, value: impl Into<String>) -> Self {
        Matcher::LabelEquals {
            key: key.into(),
            value: value.into(),
        }
    }

    pub fn name_prefix_suffix(prefix: impl Into<String>, suffix: impl Into<String>) -> Self {
        Matcher::NamePrefixSuffix {
            prefix: prefix.into(),
            suffix: suffix.into(),
        }
    }

    pub fn name_in<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Matcher::NameIn(names.into_iter().map(Into::into).collect())
    }

    pub fn name_not_in<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Matcher::NameNotIn(names.into_iter().map(Into::into).collect())
    }

    pub fn matches(&self, object: &WatchedObject) -> bool {
        match self {
            Matcher::LabelEquals { key, value } => object.has_label_value(key, value),
            // prefix and suffix may overlap on short names
            Matcher::NamePrefixSuffix { prefix, suffix } => {
                object.name().starts_with(prefix.as_str()) && object.name().ends_with(suffix.as_str())
            }
            Matcher::NameIn(names) => names.contains(object.name()),
            Matcher::NameNotIn(names) => !names.contains(object.name()),
            Matcher::Always => true,
        }
    }
}

/// Outcome of an applying rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verdict {
    /// Do not reconcile
    Suppress,
    /// Reconcile without diffing
    Enqueue,
}

impl Verdict {
    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::Suppress => "suppress",
            Verdict::Enqueue => "enqueue",
        }
    }

    pub fn triggers(&self) -> bool {
        matches!(self, Verdict::Enqueue)
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExclusionRule {
    name: String,
    selector: KindSelector,
    phase: EventPhase,
    matcher: Matcher,
    verdict: Verdict,
}

impl ExclusionRule {
    /// A suppressing rule; see [`with_verdict`](Self::with_verdict).
    pub fn new(
        name: impl Into<String>,
        selector: KindSelector,
        phase: EventPhase,
        matcher: Matcher,
    ) -> Self {
        Self {
            name: name.into(),
            selector,
            phase,
            matcher,
            verdict: Verdict::Suppress,
        }
    }

    pub fn with_verdict(mut self, verdict: Verdict) -> Self {
        self.verdict = verdict;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn selector(&self) -> &KindSelector {
        &self.selector
    }

    pub fn phase(&self) -> EventPhase {
        self.phase
    }

    pub fn matcher(&self) -> &Matcher {
        &self.matcher
    }

    pub fn verdict(&self) -> Verdict {
        self.verdict
    }

    pub fn applies(&self, phase: EventPhase, role: KindRole, object: &WatchedObject) -> bool {
        self.phase == phase
            && self.selector.selects(&object.kind, role)
            && self.matcher.matches(object)
    }
}

/// Ordered, immutable rule list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExclusionRuleSet {
    rules: Vec<ExclusionRule>,
}

impl ExclusionRuleSet {
    pub fn builder() -> ExclusionRuleSetBuilder {
        ExclusionRuleSetBuilder::new()
    }

    /// The default rules, in priority order.
    pub fn from_config(config: &GateConfig) -> Result<Self> {
        let labels = &config.labels;
        let exclusions = &config.exclusions;
        let kinds = &config.kinds;
        Self::builder()
            .rule(ExclusionRule::new(
                DO_NOT_RECONCILE_RULE,
                KindSelector::Any,
                EventPhase::Update,
                Matcher::label_equals(&labels.do_not_reconcile_key, &labels.do_not_reconcile_value),
            ))
            .rule(ExclusionRule::new(
                EPHEMERAL_STATUS_RULE,
                KindSelector::Kind(kinds.config_kind.clone()),
                EventPhase::Delete,
                Matcher::name_prefix_suffix(
                    &exclusions.ephemeral_status_prefix,
                    &exclusions.ephemeral_status_suffix,
                ),
            ))
            .rule(ExclusionRule::new(
                CANARY_WORKER_RULE,
                KindSelector::Kind(kinds.worker_kind.clone()),
                EventPhase::Delete,
                Matcher::label_equals(&labels.canary_key, &labels.canary_value),
            ))
            .rule(ExclusionRule::new(
                DESIGNATED_OVERRIDE_RULE,
                KindSelector::Kind(kinds.config_kind.clone()),
                EventPhase::Update,
                Matcher::name_not_in([exclusions.override_config_name.as_str()]),
            ))
            .rule(ExclusionRule::new(
                IGNORABLE_SECRET_RULE,
                KindSelector::Kind(kinds.secret_kind.clone()),
                EventPhase::Update,
                Matcher::name_in(exclusions.ignorable_secret_names.iter().map(String::as_str)),
            ))
            .rule(ExclusionRule::new(
                WORKER_DEPLOYMENT_RULE,
                KindSelector::Kind(kinds.worker_kind.clone()),
                EventPhase::Update,
                Matcher::Always,
            ))
            .build()
    }

    /// Append a rule with the lowest priority.
    pub fn with_rule(self, rule: ExclusionRule) -> Result<Self> {
        ExclusionRuleSetBuilder { rules: self.rules }.rule(rule).build()
    }

    /// First rule that applies to the object in this phase.
    pub fn evaluate(
        &self,
        phase: EventPhase,
        role: KindRole,
        object: &WatchedObject,
    ) -> Option<&ExclusionRule> {
        let rule = self.rules.iter().find(|rule| rule.applies(phase, role, object))?;
        debug!(
            object = %object.identity(),
            rule = %rule.name,
            phase = %phase,
            verdict = %rule.verdict,
            "Exclusion rule applied"
        );
        Some(rule)
    }

    pub fn get(&self, name: &str) -> Option<&ExclusionRule> {
        self.rules.iter().find(|rule| rule.name == name)
    }

    pub fn rules(&self) -> &[ExclusionRule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

#[derive(Debug, Default)]
pub struct ExclusionRuleSetBuilder {
    rules: Vec<ExclusionRule>,
}

impl ExclusionRuleSetBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing set, keeping its order.
    pub fn extend(mut self, set: ExclusionRuleSet) -> Self {
        self.rules.extend(set.rules);
        self
    }

    /// Append with the lowest priority so far.
    pub fn rule(mut self, rule: ExclusionRule) -> Self {
        self.rules.push(rule);
        self
    }

    /// Insert with the highest priority so far.
    pub fn prepend(mut self, rule: ExclusionRule) -> Self {
        self.rules.insert(0, rule);
        self
    }

    /// Fails on empty or duplicate rule names.
    pub fn build(self) -> Result<ExclusionRuleSet> {
        let mut names = BTreeSet::new();
        for rule in &self.rules {
            if rule.name.trim().is_empty() {
                return Err(GateError::configuration("exclusion rules need a name"));
            }
            if !names.insert(rule.name.as_str()) {
                return Err(GateError::configuration(format!(
                    "exclusion rule {} defined more than once",
                    rule.name
                )));
            }
        }
        Ok(ExclusionRuleSet { rules: self.rules })
    }
}

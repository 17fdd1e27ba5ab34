//! Behavior registry and weighted force composition.
//!
//! A registry belongs to one agent. It maps each [`BehaviorKind`] to a rule,
//! a category and an enabled flag, and folds the weighted outputs of all
//! enabled rules into one steering force per tick.

use crate::config::{EngineConfig, SpeciesProfile};
use crate::context::BehaviorContext;
use crate::error::{RegistryError, Result};
use crate::kind::{BehaviorCategory, BehaviorKind};
use crate::metrics::EngineMetrics;
use crate::rule::BehaviorRule;
use crate::rules::{build_rule, RuleSeed};
use crate::weights::{sanitize, WeightTable};
use ecosteer_data::Vec3;
use std::collections::BTreeMap;
use std::sync::Arc;

struct BehaviorEntry {
    rule: Box<dyn BehaviorRule>,
    category: BehaviorCategory,
    enabled: bool,
}

/// Registered rules for one agent, iterated in [`BehaviorKind`] order.
#[derive(Default)]
pub struct BehaviorRegistry {
    entries: BTreeMap<BehaviorKind, BehaviorEntry>,
    metrics: Option<Arc<EngineMetrics>>,
}

impl std::fmt::Debug for BehaviorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_map()
            .entries(
                self.entries
                    .iter()
                    .map(|(kind, entry)| (kind.as_str(), (entry.category, entry.enabled))),
            )
            .finish()
    }
}

impl BehaviorRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_metrics(mut self, metrics: Arc<EngineMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Builds a registry holding the behaviors a species profile lists.
    ///
    /// Fails on the first behavior that is unknown, duplicated, filed under
    /// an unknown category, or has no built-in rule.
    pub fn from_profile(
        profile: &SpeciesProfile,
        engine: &EngineConfig,
        seed: &RuleSeed,
    ) -> Result<Self> {
        let mut registry = Self {
            entries: BTreeMap::new(),
            metrics: seed.metrics.clone(),
        };
        for spec in &profile.behaviors {
            let kind: BehaviorKind = spec.id.parse()?;
            let category = match &spec.category {
                Some(label) => label.parse()?,
                None => kind.default_category(),
            };
            let rule = build_rule(kind, profile, engine, seed);
            registry.register_optional(&spec.id, rule, category)?;
            if !spec.enabled {
                registry.set_enabled(&spec.id, false);
            }
        }
        tracing::debug!(
            species = %profile.name,
            behaviors = registry.len(),
            "Registry built from profile"
        );
        Ok(registry)
    }

    /// Adds a rule under `id`, enabled.
    pub fn register(
        &mut self,
        id: &str,
        rule: Box<dyn BehaviorRule>,
        category: BehaviorCategory,
    ) -> Result<()> {
        self.register_optional(id, Some(rule), category)
    }

    /// Like [`BehaviorRegistry::register`], for callers whose rule lookup may
    /// come back empty. `None` is rejected with [`RegistryError::MissingRule`].
    pub fn register_optional(
        &mut self,
        id: &str,
        rule: Option<Box<dyn BehaviorRule>>,
        category: BehaviorCategory,
    ) -> Result<()> {
        let kind: BehaviorKind = id.parse()?;
        if self.entries.contains_key(&kind) {
            return Err(RegistryError::DuplicateId(kind.as_str().to_string()));
        }
        let rule = rule.ok_or_else(|| RegistryError::MissingRule(kind.as_str().to_string()))?;
        self.entries.insert(
            kind,
            BehaviorEntry {
                rule,
                category,
                enabled: true,
            },
        );
        Ok(())
    }

    /// Removes the rule under `id`. Returns `false` if nothing was registered.
    pub fn unregister(&mut self, id: &str) -> bool {
        id.parse::<BehaviorKind>()
            .ok()
            .and_then(|kind| self.entries.remove(&kind))
            .is_some()
    }

    /// Returns `false` if `id` is not registered.
    pub fn set_enabled(&mut self, id: &str, enabled: bool) -> bool {
        match self.entry_mut(id) {
            Some(entry) => {
                entry.enabled = enabled;
                true
            }
            None => false,
        }
    }

    /// Unregistered ids read as disabled.
    #[must_use]
    pub fn is_enabled(&self, id: &str) -> bool {
        id.parse::<BehaviorKind>()
            .ok()
            .and_then(|kind| self.entries.get(&kind))
            .is_some_and(|entry| entry.enabled)
    }

    #[must_use]
    pub fn is_registered(&self, id: &str) -> bool {
        id.parse::<BehaviorKind>()
            .is_ok_and(|kind| self.entries.contains_key(&kind))
    }

    #[must_use]
    pub fn category_of(&self, id: &str) -> Option<BehaviorCategory> {
        let kind = id.parse::<BehaviorKind>().ok()?;
        self.entries.get(&kind).map(|entry| entry.category)
    }

    /// Toggles every rule filed under `category`; returns how many changed.
    pub fn set_category_enabled(&mut self, category: BehaviorCategory, enabled: bool) -> usize {
        let mut changed = 0;
        for entry in self.entries.values_mut() {
            if entry.category == category && entry.enabled != enabled {
                entry.enabled = enabled;
                changed += 1;
            }
        }
        changed
    }

    /// Registered kinds in evaluation order.
    pub fn registered(&self) -> impl Iterator<Item = BehaviorKind> + '_ {
        self.entries.keys().copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Resets the cached state of every rule.
    pub fn reset(&mut self) {
        for entry in self.entries.values_mut() {
            entry.rule.reset();
        }
    }

    /// Weighted sum of all enabled rules, capped at `ctx.max_force`.
    ///
    /// Rules whose weight is zero are not evaluated at all.
    pub fn calculate(&mut self, ctx: &BehaviorContext<'_>, weights: &WeightTable) -> Vec3 {
        self.calculate_with(ctx, |kind| weights.get(kind))
    }

    /// [`BehaviorRegistry::calculate`] with weights from a lookup function.
    /// Negative or NaN weights count as zero.
    pub fn calculate_with<F>(&mut self, ctx: &BehaviorContext<'_>, mut weight_of: F) -> Vec3
    where
        F: FnMut(BehaviorKind) -> f64,
    {
        let mut total = Vec3::ZERO;
        for (kind, entry) in &mut self.entries {
            if !entry.enabled {
                continue;
            }
            let weight = sanitize(weight_of(*kind));
            if weight == 0.0 {
                if let Some(metrics) = &self.metrics {
                    metrics.record_rule_skipped();
                }
                continue;
            }
            let force = entry.rule.calculate(ctx);
            if let Some(metrics) = &self.metrics {
                metrics.record_rule_evaluated();
            }
            if force.is_zero() {
                continue;
            }
            tracing::trace!(behavior = %kind, weight, ?force, "Rule contribution");
            total += force * weight;
        }
        total.limited(ctx.max_force)
    }

    /// Raw output of a single rule, ignoring weight and the enabled flag.
    /// Unregistered ids yield zero.
    pub fn calculate_one(&mut self, id: &str, ctx: &BehaviorContext<'_>) -> Vec3 {
        self.entry_mut(id)
            .map_or(Vec3::ZERO, |entry| entry.rule.calculate(ctx))
    }

    fn entry_mut(&mut self, id: &str) -> Option<&mut BehaviorEntry> {
        let kind = id.parse::<BehaviorKind>().ok()?;
        self.entries.get_mut(&kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::MemoryHost;
    use crate::rule::{ConstantRule, FnRule};
    use ecosteer_data::AgentView;

    fn constant(x: f64, z: f64) -> Box<dyn BehaviorRule> {
        Box::new(ConstantRule(Vec3::new(x, 0.0, z)))
    }

    fn agent(max_force: f64) -> AgentView {
        AgentView {
            max_force,
            ..Default::default()
        }
    }

    #[test]
    fn test_register_rejects_empty_and_duplicate() {
        let mut registry = BehaviorRegistry::new();
        assert_eq!(
            registry.register("", constant(1.0, 0.0), BehaviorCategory::General),
            Err(RegistryError::EmptyId)
        );
        registry
            .register("separation", constant(1.0, 0.0), BehaviorCategory::Flocking)
            .unwrap();
        assert_eq!(
            registry.register("separation", constant(0.0, 1.0), BehaviorCategory::Flocking),
            Err(RegistryError::DuplicateId("separation".to_string()))
        );
        let host = MemoryHost::new();
        let me = agent(10.0);
        let ctx = BehaviorContext::new(&me, &[], &host);
        assert_eq!(
            registry.calculate_one("separation", &ctx),
            Vec3::new(1.0, 0.0, 0.0)
        );
        assert_eq!(
            registry.register_optional("wander", None, BehaviorCategory::General),
            Err(RegistryError::MissingRule("wander".to_string()))
        );
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_unknown_ids_report_failure() {
        let mut registry = BehaviorRegistry::new();
        assert!(!registry.unregister("wander"));
        assert!(!registry.set_enabled("flight", true));
        assert!(!registry.is_enabled("wander"));
        assert!(registry.category_of("wander").is_none());
    }

    #[test]
    fn test_weighted_sum_and_clamp() {
        let host = MemoryHost::new();
        let me = agent(10.0);
        let ctx = BehaviorContext::new(&me, &[], &host);

        let mut registry = BehaviorRegistry::new();
        registry
            .register("separation", constant(1.0, 0.0), BehaviorCategory::Flocking)
            .unwrap();
        registry
            .register("wander", constant(0.0, 1.0), BehaviorCategory::General)
            .unwrap();

        let weights = WeightTable::zeroed()
            .with(BehaviorKind::Separation, 2.0)
            .with(BehaviorKind::Wander, 0.5);
        let total = registry.calculate(&ctx, &weights);
        assert_eq!(total, Vec3::new(2.0, 0.0, 0.5));

        let tight = BehaviorContext::new(&me, &[], &host).with_caps(0.4, 1.0);
        let clamped = registry.calculate(&tight, &weights);
        assert!((clamped.magnitude() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_zero_weight_rule_is_never_invoked() {
        let host = MemoryHost::new();
        let me = agent(1.0);
        let ctx = BehaviorContext::new(&me, &[], &host);

        let mut registry = BehaviorRegistry::new();
        registry
            .register(
                "wander",
                Box::new(FnRule::new(|_| -> Vec3 {
                    panic!("zero-weight rule evaluated")
                })),
                BehaviorCategory::General,
            )
            .unwrap();
        let weights = WeightTable::default().with(BehaviorKind::Wander, 0.0);
        assert_eq!(registry.calculate(&ctx, &weights), Vec3::ZERO);
    }

    #[test]
    fn test_disabled_rules_are_skipped() {
        let host = MemoryHost::new();
        let me = agent(10.0);
        let ctx = BehaviorContext::new(&me, &[], &host);

        let mut registry = BehaviorRegistry::new();
        registry
            .register("cohesion", constant(1.0, 0.0), BehaviorCategory::Flocking)
            .unwrap();
        assert!(registry.set_enabled("cohesion", false));
        assert!(!registry.is_enabled("cohesion"));
        assert_eq!(registry.calculate(&ctx, &WeightTable::uniform(1.0)), Vec3::ZERO);
        // calculate_one bypasses the enabled flag
        assert_eq!(
            registry.calculate_one("cohesion", &ctx),
            Vec3::new(1.0, 0.0, 0.0)
        );
    }

    #[test]
    fn test_category_toggle() {
        let mut registry = BehaviorRegistry::new();
        for id in ["separation", "alignment", "cohesion"] {
            registry
                .register(id, constant(1.0, 0.0), BehaviorCategory::Flocking)
                .unwrap();
        }
        registry
            .register("wander", constant(1.0, 0.0), BehaviorCategory::General)
            .unwrap();
        assert_eq!(registry.set_category_enabled(BehaviorCategory::Flocking, false), 3);
        assert!(registry.is_enabled("wander"));
        assert!(!registry.is_enabled("alignment"));
    }

    #[test]
    fn test_metrics_count_evaluations_and_skips() {
        let host = MemoryHost::new();
        let me = agent(10.0);
        let ctx = BehaviorContext::new(&me, &[], &host);
        let metrics = Arc::new(EngineMetrics::new());

        let mut registry = BehaviorRegistry::new().with_metrics(Arc::clone(&metrics));
        registry
            .register("separation", constant(1.0, 0.0), BehaviorCategory::Flocking)
            .unwrap();
        registry
            .register("wander", constant(1.0, 0.0), BehaviorCategory::General)
            .unwrap();
        let weights = WeightTable::uniform(1.0).with(BehaviorKind::Wander, 0.0);
        registry.calculate(&ctx, &weights);
        assert_eq!(metrics.rules_evaluated(), 1);
        assert_eq!(metrics.rules_skipped(), 1);
    }

    #[test]
    fn test_iteration_order_is_declaration_order() {
        let mut registry = BehaviorRegistry::new();
        for id in ["herd", "wander", "separation"] {
            registry
                .register(id, constant(0.0, 0.0), BehaviorCategory::General)
                .unwrap();
        }
        let order: Vec<_> = registry.registered().collect();
        assert_eq!(
            order,
            vec![BehaviorKind::Separation, BehaviorKind::Wander, BehaviorKind::Herd]
        );
    }
}

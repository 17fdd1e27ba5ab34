//! Built-in steering rules and the factory that wires them from a profile.

pub mod flocking;
pub mod home_range;
pub mod predation;
pub mod wander;

pub use flocking::{Alignment, Cohesion, Separation};
pub use home_range::HomeRange;
pub use predation::{Evasion, Pursuit};
pub use wander::Wander;

use crate::config::{EngineConfig, SpeciesProfile};
use crate::herd::HerdBehavior;
use crate::kind::BehaviorKind;
use crate::metrics::EngineMetrics;
use crate::rule::BehaviorRule;
use ecosteer_data::{Uuid, Vec3};
use std::sync::Arc;

/// Per-agent inputs a rule may need at construction time.
#[derive(Debug, Clone)]
pub struct RuleSeed {
    pub agent_id: Uuid,
    /// Spawn point; anchors the home-range rule.
    pub home: Vec3,
    pub metrics: Option<Arc<EngineMetrics>>,
}

impl RuleSeed {
    #[must_use]
    pub fn new(agent_id: Uuid, home: Vec3) -> Self {
        Self {
            agent_id,
            home,
            metrics: None,
        }
    }

    #[must_use]
    pub fn with_metrics(mut self, metrics: Arc<EngineMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }
}

/// Builds the built-in rule for `kind`, or `None` when the behavior needs
/// world queries (food, water, shelter, obstacles, light, territory) that
/// only the host can answer. Such behaviors must be registered by hand.
#[must_use]
pub fn build_rule(
    kind: BehaviorKind,
    profile: &SpeciesProfile,
    engine: &EngineConfig,
    seed: &RuleSeed,
) -> Option<Box<dyn BehaviorRule>> {
    let flocking = &profile.flocking;
    let predation = &profile.predation;
    let rule: Box<dyn BehaviorRule> = match kind {
        BehaviorKind::Separation => Box::new(Separation::new(flocking.separation_distance)),
        BehaviorKind::Alignment => Box::new(Alignment::new(flocking.alignment_radius)),
        BehaviorKind::Cohesion => Box::new(Cohesion::new(flocking.cohesion_radius)),
        BehaviorKind::Wander => Box::new(Wander::new(&profile.wander, rule_seed(engine, seed))),
        BehaviorKind::Pursuit => Box::new(Pursuit::new(predation.prey_ids(), predation)),
        BehaviorKind::Evasion => Box::new(Evasion::new(predation.predator_ids(), predation)),
        BehaviorKind::HomeRange => Box::new(HomeRange::new(seed.home, profile.home_radius)),
        BehaviorKind::Herd => {
            let herd = HerdBehavior::new(Arc::clone(&profile.herd), engine, seed.agent_id);
            match &seed.metrics {
                Some(metrics) => Box::new(herd.with_metrics(Arc::clone(metrics))),
                None => Box::new(herd),
            }
        }
        BehaviorKind::FoodSeek
        | BehaviorKind::WaterSeek
        | BehaviorKind::ShelterSeek
        | BehaviorKind::TerritorialDefense
        | BehaviorKind::ObstacleAvoidance
        | BehaviorKind::LightPreference => return None,
    };
    Some(rule)
}

/// Mixes the engine seed with an agent id so every agent gets its own
/// reproducible stream.
#[must_use]
pub fn rule_seed(engine: &EngineConfig, seed: &RuleSeed) -> u64 {
    let (hi, lo) = seed.agent_id.as_u64_pair();
    engine.seed ^ hi ^ lo.rotate_left(17)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_world_query_behaviors_have_no_builtin() {
        let profile = SpeciesProfile::herbivore("bison");
        let engine = EngineConfig::default();
        let seed = RuleSeed::new(Uuid::from_u128(1), Vec3::ZERO);
        assert!(build_rule(BehaviorKind::FoodSeek, &profile, &engine, &seed).is_none());
        assert!(build_rule(BehaviorKind::Herd, &profile, &engine, &seed).is_some());
        assert!(build_rule(BehaviorKind::Wander, &profile, &engine, &seed).is_some());
    }

    #[test]
    fn test_rule_seed_differs_per_agent() {
        let engine = EngineConfig::default();
        let a = RuleSeed::new(Uuid::from_u128(1), Vec3::ZERO);
        let b = RuleSeed::new(Uuid::from_u128(2), Vec3::ZERO);
        assert_ne!(rule_seed(&engine, &a), rule_seed(&engine, &b));
        assert_eq!(rule_seed(&engine, &a), rule_seed(&engine, &a));
    }
}

//! Predator pursuit and prey evasion.
//!
//! Both rules scan the context's neighbor slice, so the host must include
//! other species in it for these behaviors to see anything.

use crate::config::PredationConfig;
use crate::context::BehaviorContext;
use crate::rule::BehaviorRule;
use crate::steering::{evade, pursue};
use ecosteer_data::{AgentView, SpeciesId, Uuid, Vec3};

/// Chases the nearest prey, sticking with it until it dies, escapes past
/// `give_up_distance`, or is caught.
#[derive(Debug, Clone)]
pub struct Pursuit {
    prey: Vec<SpeciesId>,
    detection_radius: f64,
    give_up_distance: f64,
    attack_range: f64,
    max_prediction: f64,
    target: Option<Uuid>,
}

impl Pursuit {
    #[must_use]
    pub fn new(prey: Vec<SpeciesId>, config: &PredationConfig) -> Self {
        Self {
            prey,
            detection_radius: config.detection_radius,
            give_up_distance: config.give_up_distance,
            attack_range: config.attack_range,
            max_prediction: config.max_prediction,
            target: None,
        }
    }

    #[must_use]
    pub fn target(&self) -> Option<Uuid> {
        self.target
    }

    fn acquire<'n>(&self, ctx: &BehaviorContext<'n>) -> Option<&'n AgentView> {
        ctx.neighbors
            .iter()
            .filter(|a| a.alive && self.prey.contains(&a.species))
            .map(|a| (a, ctx.position.distance_to(a.position)))
            .filter(|(_, d)| *d <= self.detection_radius)
            .min_by(|(_, a), (_, b)| a.total_cmp(b))
            .map(|(a, _)| a)
    }
}

impl BehaviorRule for Pursuit {
    fn calculate(&mut self, ctx: &BehaviorContext<'_>) -> Vec3 {
        let current = self.target.and_then(|id| {
            ctx.neighbors
                .iter()
                .find(|a| a.id == id && a.alive)
                .filter(|a| ctx.position.distance_to(a.position) <= self.give_up_distance)
        });
        let Some(prey) = current.or_else(|| self.acquire(ctx)) else {
            self.target = None;
            return Vec3::ZERO;
        };
        if self.target != Some(prey.id) {
            tracing::debug!(hunter = %ctx.agent.id, prey = %prey.id, "Pursuit target acquired");
        }
        self.target = Some(prey.id);

        if ctx.position.distance_to(prey.position) <= self.attack_range {
            return Vec3::ZERO;
        }
        pursue(
            ctx.position,
            ctx.velocity,
            prey.position,
            prey.velocity,
            ctx.max_speed,
            self.max_prediction,
        )
        .limited(ctx.max_force)
    }

    fn reset(&mut self) {
        self.target = None;
    }
}

/// Flees every predator inside `detection_radius`, harder the closer it is.
#[derive(Debug, Clone)]
pub struct Evasion {
    predators: Vec<SpeciesId>,
    detection_radius: f64,
    max_prediction: f64,
}

impl Evasion {
    #[must_use]
    pub fn new(predators: Vec<SpeciesId>, config: &PredationConfig) -> Self {
        Self {
            predators,
            detection_radius: config.detection_radius,
            max_prediction: config.max_prediction,
        }
    }
}

impl BehaviorRule for Evasion {
    fn calculate(&mut self, ctx: &BehaviorContext<'_>) -> Vec3 {
        let mut total = Vec3::ZERO;
        for threat in ctx.neighbors {
            if !threat.alive || !self.predators.contains(&threat.species) {
                continue;
            }
            let d = ctx.position.distance_to(threat.position);
            if d >= self.detection_radius {
                continue;
            }
            let urgency = 1.0 - d / self.detection_radius;
            total += evade(
                ctx.position,
                ctx.velocity,
                threat.position,
                threat.velocity,
                ctx.max_speed,
                self.max_prediction,
            ) * urgency;
        }
        total.limited(ctx.max_force)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::MemoryHost;

    fn sheep() -> SpeciesId {
        SpeciesId::from_name("sheep")
    }

    fn wolf() -> SpeciesId {
        SpeciesId::from_name("wolf")
    }

    fn agent(id: u128, species: SpeciesId, x: f64) -> AgentView {
        AgentView {
            id: Uuid::from_u128(id),
            species,
            position: Vec3::new(x, 0.0, 0.0),
            ..Default::default()
        }
    }

    #[test]
    fn test_pursuit_locks_nearest_prey() {
        let host = MemoryHost::new();
        let hunter = agent(1, wolf(), 0.0);
        let neighbors = [agent(2, sheep(), 10.0), agent(3, sheep(), 5.0), agent(4, wolf(), 2.0)];
        let ctx = BehaviorContext::new(&hunter, &neighbors, &host);
        let mut rule = Pursuit::new(vec![sheep()], &PredationConfig::default());
        let force = rule.calculate(&ctx);
        assert_eq!(rule.target(), Some(Uuid::from_u128(3)));
        assert!(force.x > 0.0);
    }

    #[test]
    fn test_pursuit_keeps_target_while_in_range() {
        let host = MemoryHost::new();
        let hunter = agent(1, wolf(), 0.0);
        let mut rule = Pursuit::new(vec![sheep()], &PredationConfig::default());

        let first = [agent(2, sheep(), 6.0)];
        rule.calculate(&BehaviorContext::new(&hunter, &first, &host));
        assert_eq!(rule.target(), Some(Uuid::from_u128(2)));

        // a closer sheep appears, but the current target is still valid
        let second = [agent(2, sheep(), 20.0), agent(3, sheep(), 4.0)];
        rule.calculate(&BehaviorContext::new(&hunter, &second, &host));
        assert_eq!(rule.target(), Some(Uuid::from_u128(2)));
    }

    #[test]
    fn test_pursuit_drops_dead_target() {
        let host = MemoryHost::new();
        let hunter = agent(1, wolf(), 0.0);
        let mut rule = Pursuit::new(vec![sheep()], &PredationConfig::default());
        let mut prey = agent(2, sheep(), 6.0);
        rule.calculate(&BehaviorContext::new(&hunter, std::slice::from_ref(&prey), &host));
        prey.alive = false;
        let force = rule.calculate(&BehaviorContext::new(&hunter, std::slice::from_ref(&prey), &host));
        assert_eq!(force, Vec3::ZERO);
        assert!(rule.target().is_none());
    }

    #[test]
    fn test_pursuit_stops_inside_attack_range() {
        let host = MemoryHost::new();
        let hunter = agent(1, wolf(), 0.0);
        let neighbors = [agent(2, sheep(), 1.0)];
        let ctx = BehaviorContext::new(&hunter, &neighbors, &host);
        let mut rule = Pursuit::new(vec![sheep()], &PredationConfig::default());
        assert_eq!(rule.calculate(&ctx), Vec3::ZERO);
    }

    #[test]
    fn test_evasion_flees_predators_only() {
        let host = MemoryHost::new();
        let me = agent(1, sheep(), 0.0);
        let neighbors = [agent(2, wolf(), 4.0), agent(3, sheep(), -1.0)];
        let ctx = BehaviorContext::new(&me, &neighbors, &host);
        let mut rule = Evasion::new(vec![wolf()], &PredationConfig::default());
        let force = rule.calculate(&ctx);
        assert!(force.x < 0.0);
        assert!(force.magnitude() <= me.max_force + 1e-12);

        let calm = [agent(3, sheep(), -1.0)];
        let ctx = BehaviorContext::new(&me, &calm, &host);
        assert_eq!(rule.calculate(&ctx), Vec3::ZERO);
    }
}

//! Leader scoring, selection and following.

use super::dominance::DominanceLedger;
use crate::config::{EngineConfig, HerdConfig};
use crate::context::BehaviorContext;
use crate::ports::Host;
use crate::steering::seek;
use ecosteer_data::{AgentView, Uuid, Vec3};
use std::sync::Arc;

/// A scored leader candidate. Only lives for one selection pass.
#[derive(Debug, Clone)]
pub struct LeaderCandidate {
    pub agent: AgentView,
    pub score: f64,
    pub distance: f64,
}

/// Picks and follows a leader among herd members.
///
/// Candidates are re-ranked every `leader_update_secs`. Between
/// re-rankings the chosen leader is re-resolved through the host each tick
/// and dropped as soon as it dies or leaves the follow radius.
#[derive(Debug, Clone)]
pub struct LeaderSelector {
    config: Arc<HerdConfig>,
    ledger: DominanceLedger,
    update_interval: f64,
    epsilon: f64,
    current: Option<Uuid>,
    leaders: Vec<Uuid>,
    last_update: Option<f64>,
}

impl LeaderSelector {
    #[must_use]
    pub fn new(config: Arc<HerdConfig>, engine: &EngineConfig) -> Self {
        Self {
            config,
            ledger: DominanceLedger::new(engine),
            update_interval: engine.leader_update_secs,
            epsilon: engine.motion_epsilon,
            current: None,
            leaders: Vec::new(),
            last_update: None,
        }
    }

    /// 0 for juveniles, otherwise age over the saturation age clamped to
    /// [0.3, 1].
    #[must_use]
    pub fn age_bonus(&self, agent: &AgentView) -> f64 {
        if agent.juvenile {
            return 0.0;
        }
        if self.config.max_leadership_age == 0 {
            return 1.0;
        }
        (agent.age as f64 / self.config.max_leadership_age as f64).clamp(0.3, 1.0)
    }

    /// Leadership score of `candidate` as seen from `origin`, or `None` when
    /// it is beyond the follow radius.
    #[must_use]
    pub fn score(&self, candidate: &AgentView, origin: Vec3, dominance: f64) -> Option<f64> {
        if origin.distance_to(candidate.position) > self.config.leader_follow_radius {
            return None;
        }
        let motion = if candidate.is_moving(self.epsilon) {
            self.config.leadership_motion_bonus
        } else {
            0.0
        };
        Some(
            self.age_bonus(candidate) * self.config.leadership_age_weight
                + dominance * self.config.leadership_dominance_weight
                + motion
                + candidate.health_ratio() * self.config.leadership_health_weight,
        )
    }

    /// Live members within the follow radius with a positive score, best
    /// first. Ties go to the closer candidate, then the lower id.
    ///
    /// Members are re-resolved through the host so a snapshot that is a few
    /// ticks old cannot nominate a dead agent.
    #[must_use]
    pub fn rank_candidates(
        &self,
        ctx: &BehaviorContext<'_>,
        members: &[AgentView],
    ) -> Vec<LeaderCandidate> {
        let tick = ctx.tick();
        let mut candidates: Vec<LeaderCandidate> = members
            .iter()
            .filter(|m| m.id != ctx.agent.id)
            .filter_map(|m| ctx.host.agent(m.id))
            .filter(|m| m.alive)
            .filter_map(|m| {
                let dominance = self.ledger.dominance(ctx.host, m.id, tick);
                let score = self.score(&m, ctx.position, dominance)?;
                (score > 0.0).then(|| LeaderCandidate {
                    distance: ctx.position.distance_to(m.position),
                    agent: m,
                    score,
                })
            })
            .collect();
        candidates.sort_by(|a, b| {
            b.score
                .total_cmp(&a.score)
                .then_with(|| a.distance.total_cmp(&b.distance))
                .then_with(|| a.agent.id.cmp(&b.agent.id))
        });
        candidates
    }

    /// Ids of the top `max_leaders` candidates.
    #[must_use]
    pub fn potential_leaders(&self, ctx: &BehaviorContext<'_>, members: &[AgentView]) -> Vec<Uuid> {
        self.rank_candidates(ctx, members)
            .into_iter()
            .take(self.config.max_leaders)
            .map(|c| c.agent.id)
            .collect()
    }

    /// Re-ranks now and follows the closest of the top candidates.
    /// Returns whether the followed leader changed.
    pub fn select(&mut self, ctx: &BehaviorContext<'_>, members: &[AgentView]) -> bool {
        let mut top: Vec<LeaderCandidate> = self
            .rank_candidates(ctx, members)
            .into_iter()
            .take(self.config.max_leaders)
            .collect();
        top.sort_by(|a, b| {
            a.distance
                .total_cmp(&b.distance)
                .then_with(|| a.agent.id.cmp(&b.agent.id))
        });
        self.leaders = top.iter().map(|c| c.agent.id).collect();
        let chosen = top.first().map(|c| c.agent.id);
        let changed = chosen != self.current;
        if changed {
            tracing::debug!(
                agent = %ctx.agent.id,
                leader = ?chosen,
                candidates = top.len(),
                "Leader changed"
            );
        }
        self.current = chosen;
        changed
    }

    /// Runs a selection pass when the update interval has elapsed.
    /// Returns whether the followed leader changed.
    pub fn update(&mut self, ctx: &BehaviorContext<'_>, members: &[AgentView], now: f64) -> bool {
        let due = match self.last_update {
            None => true,
            Some(last) => now - last >= self.update_interval || now < last,
        };
        if !due {
            return false;
        }
        self.last_update = Some(now);
        self.select(ctx, members)
    }

    /// Force toward the current leader, capped at `ctx.max_force`.
    ///
    /// The leader is looked up fresh; if it is gone, dead or out of range
    /// it is forgotten and the force is zero.
    pub fn follow_force(&mut self, ctx: &BehaviorContext<'_>) -> Vec3 {
        let Some(id) = self.current else {
            return Vec3::ZERO;
        };
        match self.resolve(ctx.host, id, ctx.position) {
            Some(leader) => {
                seek(ctx.position, ctx.velocity, leader.position, ctx.max_speed)
                    .limited(ctx.max_force)
            }
            None => {
                tracing::debug!(agent = %ctx.agent.id, leader = %id, "Leader lost");
                self.current = None;
                self.leaders.retain(|l| *l != id);
                Vec3::ZERO
            }
        }
    }

    fn resolve(&self, host: &dyn Host, id: Uuid, origin: Vec3) -> Option<AgentView> {
        host.agent(id).filter(|leader| {
            leader.alive
                && origin.distance_to(leader.position) <= self.config.leader_follow_radius
        })
    }

    #[must_use]
    pub fn current_leader(&self) -> Option<Uuid> {
        self.current
    }

    /// Top candidates from the last selection pass.
    #[must_use]
    pub fn leaders(&self) -> &[Uuid] {
        &self.leaders
    }

    #[must_use]
    pub fn ledger(&self) -> &DominanceLedger {
        &self.ledger
    }

    pub fn reset(&mut self) {
        self.current = None;
        self.leaders.clear();
        self.last_update = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::{ComponentStore, MemoryHost};
    use ecosteer_data::HerdComponent;

    fn selector() -> LeaderSelector {
        LeaderSelector::new(Arc::new(HerdConfig::default()), &EngineConfig::default())
    }

    fn adult(id: u128, x: f64) -> AgentView {
        AgentView {
            id: Uuid::from_u128(id),
            position: Vec3::new(x, 0.0, 0.0),
            age: 24_000,
            ..Default::default()
        }
    }

    #[test]
    fn test_age_bonus_bounds() {
        let s = selector();
        let juvenile = AgentView {
            juvenile: true,
            age: 50_000,
            ..Default::default()
        };
        assert_eq!(s.age_bonus(&juvenile), 0.0);
        assert_eq!(s.age_bonus(&AgentView::default()), 0.3);
        assert_eq!(s.age_bonus(&adult(1, 0.0)), 1.0);
    }

    #[test]
    fn test_score_formula() {
        let s = selector();
        let mut a = adult(1, 3.0);
        a.velocity = Vec3::new(0.1, 0.0, 0.0);
        // 1.0 * 0.7 + 0.5 * 0.5 + 0.2 + 1.0 * 0.1
        let score = s.score(&a, Vec3::ZERO, 0.5).unwrap();
        assert!((score - 1.25).abs() < 1e-12);
    }

    #[test]
    fn test_out_of_radius_is_not_scored() {
        let s = selector();
        assert!(s.score(&adult(1, 16.5), Vec3::ZERO, 1.0).is_none());
    }

    #[test]
    fn test_select_prefers_closest_of_top_candidates() {
        let members = vec![adult(2, 10.0), adult(3, 4.0), adult(4, 30.0)];
        let me = adult(1, 0.0);
        let mut host = MemoryHost::with_agents(members.clone());
        host.insert(me.clone());
        for m in &members {
            host.store(m.id, HerdComponent::with_dominance(0.5, 0));
        }
        let ctx = BehaviorContext::new(&me, &[], &host);

        let mut s = selector();
        assert!(s.select(&ctx, &members));
        assert_eq!(s.current_leader(), Some(Uuid::from_u128(3)));
        assert_eq!(s.leaders().len(), 2);
        assert!(!s.leaders().contains(&Uuid::from_u128(4)));
    }

    #[test]
    fn test_dead_leader_yields_zero_and_is_forgotten() {
        let leader = adult(2, 5.0);
        let me = adult(1, 0.0);
        let mut host = MemoryHost::with_agents(vec![me.clone(), leader.clone()]);
        let members = vec![leader];

        let mut s = selector();
        {
            let ctx = BehaviorContext::new(&me, &[], &host);
            s.select(&ctx, &members);
            assert!(!s.follow_force(&ctx).is_zero());
        }
        host.kill(Uuid::from_u128(2));
        let ctx = BehaviorContext::new(&me, &[], &host);
        assert_eq!(s.follow_force(&ctx), Vec3::ZERO);
        assert!(s.current_leader().is_none());

        // the stale snapshot still lists the dead leader; re-ranking skips it
        s.select(&ctx, &members);
        assert!(s.current_leader().is_none());
    }

    #[test]
    fn test_update_respects_interval() {
        let me = adult(1, 0.0);
        let other = adult(2, 5.0);
        let host = MemoryHost::with_agents(vec![me.clone(), other.clone()]);
        let ctx = BehaviorContext::new(&me, &[], &host);
        let members = vec![other];

        let mut s = selector();
        assert!(s.update(&ctx, &members, 0.0));
        s.reset();
        assert!(s.update(&ctx, &members, 0.5));
        // within the interval nothing is re-ranked
        s.current = None;
        assert!(!s.update(&ctx, &members, 1.0));
        assert!(s.current_leader().is_none());
        assert!(s.update(&ctx, &members, 2.5));
        assert_eq!(s.current_leader(), Some(Uuid::from_u128(2)));
    }
}

use super::cohesion::HerdCohesion;
use super::dominance::DominanceLedger;
use super::leadership::LeaderSelector;
use super::quorum::{quorum_ratio, QuorumGate};
use crate::config::{EngineConfig, HerdConfig};
use crate::context::BehaviorContext;
use crate::metrics::EngineMetrics;
use crate::rule::BehaviorRule;
use ecosteer_data::{AgentView, SpeciesId, Uuid, Vec3};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::fmt;
use std::sync::Arc;

/// Snapshot of an agent's view of its herd. Counts include the agent itself.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct HerdStats {
    pub total: usize,
    pub adults: usize,
    pub juveniles: usize,
    pub average_health: f64,
    /// Moving fraction of the other members.
    pub quorum_ratio: f64,
    pub quorum_threshold: f64,
    pub has_leader: bool,
}

impl HerdStats {
    #[must_use]
    pub fn has_quorum(&self) -> bool {
        self.quorum_ratio >= self.quorum_threshold
    }

    #[must_use]
    pub fn adult_ratio(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.adults as f64 / self.total as f64
        }
    }
}

impl fmt::Display for HerdStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "herd: {} members ({} adults, {} juveniles), health {:.0}%, quorum {:.0}%{}",
            self.total,
            self.adults,
            self.juveniles,
            self.average_health * 100.0,
            self.quorum_ratio * 100.0,
            if self.has_leader { ", led" } else { "" }
        )
    }
}

/// Group id for the region bucket containing `position`.
///
/// Agents of one species standing in the same bucket get the same id, which
/// is how neighbors converge on a shared group without any coordination.
#[must_use]
pub fn region_group_id(position: Vec3, species: SpeciesId, bucket: f64) -> Uuid {
    let bucket = if bucket > 0.0 { bucket } else { 1.0 };
    let rx = (position.x / bucket).floor() as i32;
    let rz = (position.z / bucket).floor() as i32;
    let region = (u64::from(rx as u32) << 32) | u64::from(rz as u32);
    Uuid::from_u64_pair(u64::from(species.0), region)
}

/// Herd coordination for one agent.
///
/// Each tick: refresh the cached member ids if they are older than the TTL,
/// resolve them to current views through the host, adopt a group id once, consult the quorum gate, update leadership, then
/// sum leader following, selfish-herd cohesion and weighted separation and
/// cap the total at the agent's max force. While quorum is not met the
/// force is zero.
#[derive(Debug, Clone)]
pub struct HerdBehavior {
    config: Arc<HerdConfig>,
    engine: EngineConfig,
    quorum: QuorumGate,
    leadership: LeaderSelector,
    cohesion: HerdCohesion,
    ledger: DominanceLedger,
    member_ids: Vec<Uuid>,
    members: Vec<AgentView>,
    refreshed_at: Option<f64>,
    group_id: Uuid,
    synced: bool,
    metrics: Option<Arc<EngineMetrics>>,
}

impl HerdBehavior {
    #[must_use]
    pub fn new(config: Arc<HerdConfig>, engine: &EngineConfig, agent_id: Uuid) -> Self {
        let (hi, lo) = agent_id.as_u64_pair();
        let mut rng = ChaCha8Rng::seed_from_u64(engine.seed ^ hi.rotate_left(7) ^ lo);
        Self {
            quorum: QuorumGate::new(&config, engine.motion_epsilon),
            leadership: LeaderSelector::new(Arc::clone(&config), engine),
            cohesion: HerdCohesion::new(Arc::clone(&config)),
            ledger: DominanceLedger::new(engine),
            config,
            engine: engine.clone(),
            member_ids: Vec::new(),
            members: Vec::new(),
            refreshed_at: None,
            group_id: Uuid::from_u128(rng.gen::<u128>()),
            synced: false,
            metrics: None,
        }
    }

    #[must_use]
    pub fn with_metrics(mut self, metrics: Arc<EngineMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Re-queries the host for member ids when the cache is missing or older
    /// than the TTL. Returns whether a query was made.
    fn refresh_members(&mut self, ctx: &BehaviorContext<'_>, now: f64) -> bool {
        let stale = match self.refreshed_at {
            None => true,
            Some(at) => now < at || now - at >= self.engine.membership_ttl_secs,
        };
        if !stale {
            return false;
        }
        self.member_ids = ctx
            .host
            .neighbors(
                ctx.position,
                self.config.cohesion_radius,
                ctx.agent.species,
                ctx.agent.id,
            )
            .into_iter()
            .filter(|m| m.alive && m.id != ctx.agent.id)
            .map(|m| m.id)
            .collect();
        self.refreshed_at = Some(now);
        true
    }

    /// Current views of the cached members. Dead or despawned ids drop out
    /// here; they leave `member_ids` on the next refresh.
    fn resolve_members(&mut self, ctx: &BehaviorContext<'_>) {
        self.members = self
            .member_ids
            .iter()
            .filter_map(|id| ctx.host.agent(*id))
            .filter(|m| m.alive && m.id != ctx.agent.id)
            .collect();
    }

    /// Adopts the region id of the nearest same-species agent within the
    /// sync distance. Runs once until [`HerdBehavior::refresh_herd_cache`].
    fn synchronize_group(&mut self, ctx: &BehaviorContext<'_>) {
        if self.synced {
            return;
        }
        self.synced = true;
        let nearby = ctx.host.neighbors(
            ctx.position,
            self.engine.herd_sync_distance,
            ctx.agent.species,
            ctx.agent.id,
        );
        let nearest = nearby
            .iter()
            .filter(|a| a.alive)
            .map(|a| (a, ctx.position.distance_to(a.position)))
            .min_by(|(_, a), (_, b)| a.total_cmp(b));
        if let Some((neighbor, _)) = nearest {
            self.group_id = region_group_id(
                neighbor.position,
                ctx.agent.species,
                self.engine.herd_sync_distance,
            );
            tracing::debug!(agent = %ctx.agent.id, group = %self.group_id, "Herd group synchronized");
            if let Some(metrics) = &self.metrics {
                metrics.record_group_sync();
            }
        }
    }

    /// Stats over the current snapshot plus `agent` itself. Never queries
    /// the host.
    #[must_use]
    pub fn herd_stats(&self, agent: &AgentView) -> HerdStats {
        let mut stats = HerdStats {
            quorum_ratio: quorum_ratio(&self.members, self.engine.motion_epsilon),
            quorum_threshold: self.config.quorum_threshold,
            has_leader: self.leadership.current_leader().is_some(),
            ..HerdStats::default()
        };
        let mut health = 0.0;
        for member in self.members.iter().chain(std::iter::once(agent)) {
            stats.total += 1;
            if member.juvenile {
                stats.juveniles += 1;
            } else {
                stats.adults += 1;
            }
            health += member.health_ratio();
        }
        stats.average_health = health / stats.total as f64;
        stats
    }

    /// Whether `ctx.agent` sits on the edge of its current snapshot.
    #[must_use]
    pub fn is_at_herd_edge(&self, ctx: &BehaviorContext<'_>) -> bool {
        self.cohesion.is_at_herd_edge(ctx.position, &self.members)
    }

    /// Top leader candidates among the current snapshot.
    #[must_use]
    pub fn potential_leaders(&self, ctx: &BehaviorContext<'_>) -> Vec<Uuid> {
        self.leadership.potential_leaders(ctx, &self.members)
    }

    #[must_use]
    pub fn current_leader(&self) -> Option<Uuid> {
        self.leadership.current_leader()
    }

    #[must_use]
    pub fn group_id(&self) -> Uuid {
        self.group_id
    }

    /// Overrides the group id, e.g. when restoring a save.
    pub fn set_group_id(&mut self, id: Uuid) {
        self.group_id = id;
        self.synced = true;
    }

    #[must_use]
    pub fn is_movement_allowed(&self) -> bool {
        self.quorum.is_movement_allowed()
    }

    #[must_use]
    pub fn members(&self) -> &[AgentView] {
        &self.members
    }

    #[must_use]
    pub fn config(&self) -> &HerdConfig {
        &self.config
    }

    #[must_use]
    pub fn ledger(&self) -> &DominanceLedger {
        &self.ledger
    }

    #[must_use]
    pub fn quorum(&self) -> &QuorumGate {
        &self.quorum
    }

    #[must_use]
    pub fn leadership(&self) -> &LeaderSelector {
        &self.leadership
    }

    /// Forces the next tick to re-query membership and re-adopt a group id.
    pub fn refresh_herd_cache(&mut self) {
        self.refreshed_at = None;
        self.synced = false;
    }
}

impl BehaviorRule for HerdBehavior {
    fn calculate(&mut self, ctx: &BehaviorContext<'_>) -> Vec3 {
        let tick = ctx.tick();
        let now = self.engine.seconds(tick);

        self.ledger.apply_decay(ctx.host, ctx.agent.id, tick);
        self.refresh_members(ctx, now);
        self.resolve_members(ctx);
        self.synchronize_group(ctx);

        if !self.quorum.update(&self.members) {
            if let Some(metrics) = &self.metrics {
                metrics.record_quorum_denial();
            }
            return Vec3::ZERO;
        }
        if self.members.is_empty() {
            return Vec3::ZERO;
        }

        if self.leadership.update(ctx, &self.members, now) {
            if let Some(metrics) = &self.metrics {
                metrics.record_leader_change();
            }
        }

        let mut total = self.leadership.follow_force(ctx);
        total += self.cohesion.cohesion_force(ctx, &self.members);
        total += self.cohesion.separation_force(ctx, &self.members) * self.config.separation_weight;
        total.limited(ctx.max_force)
    }

    fn reset(&mut self) {
        self.quorum.reset();
        self.leadership.reset();
        self.member_ids.clear();
        self.members.clear();
        self.refreshed_at = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::MemoryHost;

    fn bison() -> SpeciesId {
        SpeciesId::from_name("bison")
    }

    fn member(id: u128, x: f64, z: f64, moving: bool) -> AgentView {
        AgentView {
            id: Uuid::from_u128(id),
            species: bison(),
            position: Vec3::new(x, 0.0, z),
            velocity: if moving {
                Vec3::new(0.2, 0.0, 0.0)
            } else {
                Vec3::ZERO
            },
            age: 24_000,
            ..Default::default()
        }
    }

    fn behavior(id: u128) -> HerdBehavior {
        HerdBehavior::new(
            Arc::new(HerdConfig::default()),
            &EngineConfig::default(),
            Uuid::from_u128(id),
        )
    }

    #[test]
    fn test_region_group_id_buckets() {
        let a = region_group_id(Vec3::new(1.0, 0.0, 1.0), bison(), 32.0);
        let b = region_group_id(Vec3::new(31.0, 64.0, 30.0), bison(), 32.0);
        let c = region_group_id(Vec3::new(33.0, 0.0, 1.0), bison(), 32.0);
        let d = region_group_id(Vec3::new(-1.0, 0.0, 1.0), bison(), 32.0);
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_ne!(a, d);
        assert_ne!(a, region_group_id(Vec3::new(1.0, 0.0, 1.0), SpeciesId(1), 32.0));
    }

    #[test]
    fn test_isolated_agent_is_idle() {
        let me = member(1, 0.0, 0.0, false);
        let host = MemoryHost::with_agents(vec![me.clone()]);
        let ctx = BehaviorContext::new(&me, &[], &host);
        let mut herd = behavior(1);
        assert_eq!(herd.calculate(&ctx), Vec3::ZERO);
        assert!(herd.members().is_empty());
    }

    #[test]
    fn test_quorum_blocks_movement() {
        let me = member(1, 0.0, 0.0, false);
        let host = MemoryHost::with_agents(vec![
            me.clone(),
            member(2, 3.0, 0.0, true),
            member(3, -3.0, 0.0, false),
            member(4, 0.0, 3.0, false),
            member(5, 0.0, -3.0, false),
        ]);
        let ctx = BehaviorContext::new(&me, &[], &host);
        let mut herd = behavior(1);
        assert_eq!(herd.calculate(&ctx), Vec3::ZERO);
        assert!(!herd.is_movement_allowed());
        assert_eq!(herd.quorum().ratio(), 0.25);
    }

    #[test]
    fn test_force_respects_max_force() {
        let me = member(1, 0.0, 0.0, false);
        let host = MemoryHost::with_agents(vec![
            me.clone(),
            member(2, 6.0, 0.0, true),
            member(3, 5.0, 1.0, true),
            member(4, 1.0, 0.0, true),
        ]);
        let ctx = BehaviorContext::new(&me, &[], &host);
        let mut herd = behavior(1);
        let force = herd.calculate(&ctx);
        assert!(herd.is_movement_allowed());
        assert!(!force.is_zero());
        assert!(force.magnitude() <= me.max_force + 1e-12);
        assert!(herd.current_leader().is_some());
    }

    #[test]
    fn test_membership_cache_honours_ttl() {
        let me = member(1, 0.0, 0.0, false);
        let mut host = MemoryHost::with_agents(vec![me.clone(), member(2, 3.0, 0.0, true)]);
        let mut herd = behavior(1);
        herd.calculate(&BehaviorContext::new(&me, &[], &host));
        assert_eq!(herd.members().len(), 1);

        host.insert(member(3, -3.0, 0.0, true));
        host.set_tick(5); // 0.25s, still fresh
        herd.calculate(&BehaviorContext::new(&me, &[], &host));
        assert_eq!(herd.members().len(), 1);

        host.set_tick(10); // 0.5s, stale
        herd.calculate(&BehaviorContext::new(&me, &[], &host));
        assert_eq!(herd.members().len(), 2);
    }

    #[test]
    fn test_cached_members_report_current_motion() {
        let me = member(1, 0.0, 0.0, false);
        let mut host = MemoryHost::with_agents(vec![
            me.clone(),
            member(2, 3.0, 0.0, false),
            member(3, -3.0, 0.0, false),
        ]);
        let mut herd = behavior(1);
        assert_eq!(herd.calculate(&BehaviorContext::new(&me, &[], &host)), Vec3::ZERO);
        assert!(!herd.is_movement_allowed());

        for id in [2, 3] {
            if let Some(agent) = host.agent_mut(Uuid::from_u128(id)) {
                agent.velocity = Vec3::new(0.2, 0.0, 0.0);
            }
        }
        host.set_tick(1); // well inside the TTL
        herd.calculate(&BehaviorContext::new(&me, &[], &host));
        assert!(herd.is_movement_allowed());
        assert_eq!(herd.quorum().ratio(), 1.0);
        assert!(herd.members().iter().all(|m| m.is_moving(1e-6)));
    }

    #[test]
    fn test_dead_members_drop_out_before_refresh() {
        let me = member(1, 0.0, 0.0, false);
        let mut host = MemoryHost::with_agents(vec![
            me.clone(),
            member(2, 3.0, 0.0, true),
            member(3, -3.0, 0.0, true),
        ]);
        let mut herd = behavior(1);
        herd.calculate(&BehaviorContext::new(&me, &[], &host));
        assert_eq!(herd.members().len(), 2);

        host.kill(Uuid::from_u128(3));
        host.set_tick(1);
        herd.calculate(&BehaviorContext::new(&me, &[], &host));
        assert_eq!(herd.members().len(), 1);
        assert_eq!(herd.members()[0].id, Uuid::from_u128(2));
    }

    #[test]
    fn test_group_id_adopted_from_nearest_neighbor() {
        let me = member(1, 0.0, 0.0, false);
        let neighbor = member(2, 40.0, 0.0, false);
        let host = MemoryHost::with_agents(vec![me.clone(), neighbor.clone()]);
        let mut herd = behavior(1);
        let before = herd.group_id();
        herd.calculate(&BehaviorContext::new(&me, &[], &host));
        // 40 units away is outside the sync distance
        assert_eq!(herd.group_id(), before);

        let close = member(3, 20.0, 5.0, false);
        let host = MemoryHost::with_agents(vec![me.clone(), close.clone()]);
        herd.refresh_herd_cache();
        herd.calculate(&BehaviorContext::new(&me, &[], &host));
        assert_eq!(herd.group_id(), region_group_id(close.position, bison(), 32.0));
    }

    #[test]
    fn test_herd_stats_include_self() {
        let me = member(1, 0.0, 0.0, false);
        let mut calf = member(2, 2.0, 0.0, true);
        calf.juvenile = true;
        let host = MemoryHost::with_agents(vec![me.clone(), calf, member(3, -2.0, 0.0, false)]);
        let mut herd = behavior(1);
        herd.calculate(&BehaviorContext::new(&me, &[], &host));
        let stats = herd.herd_stats(&me);
        assert_eq!(stats.total, 3);
        assert_eq!(stats.juveniles, 1);
        assert_eq!(stats.adults, 2);
        assert_eq!(stats.quorum_ratio, 0.5);
        assert!(stats.has_quorum());
        assert!((stats.adult_ratio() - 2.0 / 3.0).abs() < 1e-12);
        assert!(stats.to_string().contains("3 members"));
    }

    #[test]
    fn test_reset_clears_cached_state() {
        let me = member(1, 0.0, 0.0, false);
        let host = MemoryHost::with_agents(vec![
            me.clone(),
            member(2, 3.0, 0.0, true),
            member(3, -3.0, 0.0, true),
        ]);
        let mut herd = behavior(1);
        herd.calculate(&BehaviorContext::new(&me, &[], &host));
        assert!(herd.current_leader().is_some());
        herd.reset();
        assert!(herd.current_leader().is_none());
        assert!(herd.members().is_empty());
        assert!(!herd.is_movement_allowed());
    }

    #[test]
    fn test_dominance_is_initialised_for_self() {
        let me = member(1, 0.0, 0.0, false);
        let host = MemoryHost::with_agents(vec![me.clone()]);
        let mut herd = behavior(1);
        herd.calculate(&BehaviorContext::new(&me, &[], &host));
        assert!(host.component(me.id).is_some());
    }
}

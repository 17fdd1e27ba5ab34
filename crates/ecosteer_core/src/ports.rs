//! Interfaces the engine requires from its host.
//!
//! The engine never owns agents. Everything it needs from the surrounding
//! world arrives through these traits: neighbor lookup, a per-agent
//! component store for persisted herd state, and the game clock.
//! Every method takes `&self` so one host can serve rayon workers
//! concurrently; hosts use interior mutability where they must write.

use ecosteer_data::{AgentView, HerdComponent, SpeciesId, Uuid, Vec3};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

/// Proximity queries over live agents.
pub trait NeighborQuery {
    /// Live agents of `species` within `radius` of `position`, excluding
    /// `exclude`. Order is unspecified.
    fn neighbors(
        &self,
        position: Vec3,
        radius: f64,
        species: SpeciesId,
        exclude: Uuid,
    ) -> Vec<AgentView>;

    /// Current view of a single agent, if the host still knows it.
    fn agent(&self, id: Uuid) -> Option<AgentView>;
}

/// Per-agent persisted herd state.
pub trait ComponentStore {
    fn load(&self, id: Uuid) -> Option<HerdComponent>;
    fn store(&self, id: Uuid, component: HerdComponent);
}

/// Monotonic game time, 20 ticks per second unless configured otherwise.
pub trait Clock {
    fn tick(&self) -> u64;
}

/// Everything a [`crate::context::BehaviorContext`] can reach.
pub trait Host: NeighborQuery + ComponentStore + Clock + Sync {}

impl<T> Host for T where T: NeighborQuery + ComponentStore + Clock + Sync {}

/// Linear-scan host kept entirely in memory.
///
/// Suitable for tests and for small hosts that do not maintain their own
/// spatial index.
#[derive(Default)]
pub struct MemoryHost {
    agents: Vec<AgentView>,
    components: Mutex<HashMap<Uuid, HerdComponent>>,
    tick: AtomicU64,
}

impl MemoryHost {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_agents(agents: Vec<AgentView>) -> Self {
        Self {
            agents,
            ..Self::default()
        }
    }

    pub fn insert(&mut self, agent: AgentView) {
        if let Some(existing) = self.agent_mut(agent.id) {
            *existing = agent;
        } else {
            self.agents.push(agent);
        }
    }

    pub fn agent_mut(&mut self, id: Uuid) -> Option<&mut AgentView> {
        self.agents.iter_mut().find(|a| a.id == id)
    }

    pub fn agents(&self) -> &[AgentView] {
        &self.agents
    }

    /// Marks an agent dead; it stops appearing in neighbor queries.
    pub fn kill(&mut self, id: Uuid) {
        if let Some(agent) = self.agent_mut(id) {
            agent.alive = false;
        }
    }

    pub fn set_tick(&self, tick: u64) {
        self.tick.store(tick, Ordering::Relaxed);
    }

    pub fn advance(&self, ticks: u64) -> u64 {
        self.tick.fetch_add(ticks, Ordering::Relaxed) + ticks
    }

    #[must_use]
    pub fn component(&self, id: Uuid) -> Option<HerdComponent> {
        self.load(id)
    }
}

impl NeighborQuery for MemoryHost {
    fn neighbors(
        &self,
        position: Vec3,
        radius: f64,
        species: SpeciesId,
        exclude: Uuid,
    ) -> Vec<AgentView> {
        let radius_sq = radius * radius;
        self.agents
            .iter()
            .filter(|a| a.alive && a.species == species && a.id != exclude)
            .filter(|a| (a.position - position).magnitude_squared() <= radius_sq)
            .cloned()
            .collect()
    }

    fn agent(&self, id: Uuid) -> Option<AgentView> {
        self.agents.iter().find(|a| a.id == id).cloned()
    }
}

impl ComponentStore for MemoryHost {
    fn load(&self, id: Uuid) -> Option<HerdComponent> {
        let components = self.components.lock().unwrap_or_else(|e| e.into_inner());
        components.get(&id).copied()
    }

    fn store(&self, id: Uuid, component: HerdComponent) {
        let mut components = self.components.lock().unwrap_or_else(|e| e.into_inner());
        components.insert(id, component);
    }
}

impl Clock for MemoryHost {
    fn tick(&self) -> u64 {
        self.tick.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn agent(id: u128, species: SpeciesId, x: f64) -> AgentView {
        AgentView {
            id: Uuid::from_u128(id),
            species,
            position: Vec3::new(x, 0.0, 0.0),
            ..Default::default()
        }
    }

    #[test]
    fn test_neighbors_filter_species_range_and_liveness() {
        let bison = SpeciesId::from_name("bison");
        let wolf = SpeciesId::from_name("wolf");
        let mut host = MemoryHost::with_agents(vec![
            agent(1, bison, 0.0),
            agent(2, bison, 3.0),
            agent(3, bison, 30.0),
            agent(4, wolf, 1.0),
            agent(5, bison, 2.0),
        ]);
        host.kill(Uuid::from_u128(5));

        let found = host.neighbors(Vec3::ZERO, 5.0, bison, Uuid::from_u128(1));
        let ids: Vec<_> = found.iter().map(|a| a.id).collect();
        assert_eq!(ids, vec![Uuid::from_u128(2)]);
    }

    #[test]
    fn test_component_store_round_trip() {
        let host = MemoryHost::new();
        let id = Uuid::from_u128(7);
        assert!(host.load(id).is_none());
        host.store(id, HerdComponent::with_dominance(0.4, 3));
        assert_eq!(host.load(id).map(|c| c.dominance), Some(0.4));
    }

    #[test]
    fn test_clock_advance() {
        let host = MemoryHost::new();
        host.set_tick(10);
        assert_eq!(host.advance(5), 15);
        assert_eq!(host.tick(), 15);
    }
}

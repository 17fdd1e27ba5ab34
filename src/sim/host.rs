use ecosteer_core::ports::{Clock, ComponentStore, NeighborQuery};
use ecosteer_core::spatial_hash::SpatialHash;
use ecosteer_data::{AgentView, HerdComponent, SpeciesId, Uuid, Vec3};
use ecosteer_io::FileComponentStore;
use std::collections::HashMap;

/// Read-only view of a [`super::World`] for one tick.
///
/// Answers the engine's ports from a frozen snapshot of every agent, so
/// registries evaluated in parallel all see the same world. Only the
/// component store is written through, and it locks internally.
pub struct WorldHost<'a> {
    snapshot: &'a [AgentView],
    spatial: &'a SpatialHash,
    store: &'a FileComponentStore,
    index: HashMap<Uuid, usize>,
    tick: u64,
}

impl<'a> WorldHost<'a> {
    /// `spatial` must have been built from `snapshot` positions, in order.
    #[must_use]
    pub fn new(
        snapshot: &'a [AgentView],
        spatial: &'a SpatialHash,
        store: &'a FileComponentStore,
        tick: u64,
    ) -> Self {
        let index = snapshot
            .iter()
            .enumerate()
            .map(|(i, agent)| (agent.id, i))
            .collect();
        Self {
            snapshot,
            spatial,
            store,
            index,
            tick,
        }
    }

    fn collect<F>(&self, position: Vec3, radius: f64, exclude: Uuid, mut keep: F) -> Vec<AgentView>
    where
        F: FnMut(&AgentView) -> bool,
    {
        let radius_sq = radius * radius;
        let mut found = Vec::new();
        self.spatial.query_callback(position, radius, |idx| {
            let Some(agent) = self.snapshot.get(idx) else {
                return;
            };
            if agent.alive
                && agent.id != exclude
                && keep(agent)
                && (agent.position - position).magnitude_squared() <= radius_sq
            {
                found.push(agent.clone());
            }
        });
        found
    }

    /// Live agents of every species within `radius`, used as the per-tick
    /// neighbor list handed to rules.
    #[must_use]
    pub fn nearby(&self, position: Vec3, radius: f64, exclude: Uuid) -> Vec<AgentView> {
        self.collect(position, radius, exclude, |_| true)
    }
}

impl NeighborQuery for WorldHost<'_> {
    fn neighbors(
        &self,
        position: Vec3,
        radius: f64,
        species: SpeciesId,
        exclude: Uuid,
    ) -> Vec<AgentView> {
        self.collect(position, radius, exclude, |a| a.species == species)
    }

    fn agent(&self, id: Uuid) -> Option<AgentView> {
        self.index
            .get(&id)
            .and_then(|&i| self.snapshot.get(i))
            .cloned()
    }
}

impl ComponentStore for WorldHost<'_> {
    fn load(&self, id: Uuid) -> Option<HerdComponent> {
        self.store.load(id)
    }

    fn store(&self, id: Uuid, component: HerdComponent) {
        self.store.store(id, component);
    }
}

impl Clock for WorldHost<'_> {
    fn tick(&self) -> u64 {
        self.tick
    }
}

#![allow(dead_code)]

use ecosteer_core::config::{AppConfig, EngineConfig, HerdConfig};
use ecosteer_core::ports::MemoryHost;
use ecosteer_data::{AgentView, SpeciesId, Uuid, Vec3};
use ecosteer_lib::sim::World;

pub fn bison() -> SpeciesId {
    SpeciesId::from_name("bison")
}

/// Mature, healthy, standing still.
pub fn adult(id: u128, x: f64, z: f64) -> AgentView {
    AgentView {
        id: Uuid::from_u128(id),
        species: bison(),
        position: Vec3::new(x, 0.0, z),
        age: 24_000,
        ..Default::default()
    }
}

pub fn juvenile(id: u128, x: f64, z: f64) -> AgentView {
    AgentView {
        juvenile: true,
        age: 100,
        ..adult(id, x, z)
    }
}

pub fn moving(mut agent: AgentView, speed: f64) -> AgentView {
    agent.velocity = Vec3::new(speed, 0.0, 0.0);
    agent
}

/// `n` adults on a ring of `radius` around the origin, the first `moving`
/// of them walking.
pub fn ring(n: usize, moving_count: usize, radius: f64) -> Vec<AgentView> {
    (0..n)
        .map(|i| {
            let angle = i as f64 / n as f64 * std::f64::consts::TAU;
            let agent = adult(100 + i as u128, radius * angle.cos(), radius * angle.sin());
            if i < moving_count {
                moving(agent, 0.2)
            } else {
                agent
            }
        })
        .collect()
}

pub struct HostBuilder {
    agents: Vec<AgentView>,
    tick: u64,
}

impl HostBuilder {
    pub fn new() -> Self {
        Self {
            agents: Vec::new(),
            tick: 0,
        }
    }

    pub fn with_agent(mut self, agent: AgentView) -> Self {
        self.agents.push(agent);
        self
    }

    pub fn with_agents(mut self, agents: impl IntoIterator<Item = AgentView>) -> Self {
        self.agents.extend(agents);
        self
    }

    pub fn at_tick(mut self, tick: u64) -> Self {
        self.tick = tick;
        self
    }

    pub fn build(self) -> MemoryHost {
        let host = MemoryHost::with_agents(self.agents);
        host.set_tick(self.tick);
        host
    }
}

pub fn herd_config() -> HerdConfig {
    HerdConfig::default()
}

pub fn engine(seed: u64) -> EngineConfig {
    EngineConfig {
        seed,
        ..EngineConfig::default()
    }
}

pub fn seeded_world(seed: u64, per_species: usize) -> World {
    let mut config = AppConfig::default();
    config.engine.seed = seed;
    let mut world = World::with_size(config, 96.0, 96.0).unwrap();
    world.populate(per_species).unwrap();
    world
}

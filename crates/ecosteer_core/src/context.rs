use crate::ports::Host;
use ecosteer_data::{AgentView, Vec3};

/// Per-tick input to a behavior.
///
/// Built fresh each tick by the host, read-only for its lifetime. Kinematic
/// fields default to the agent's own values; [`BehaviorContext::with_caps`]
/// overrides the speed and force caps for a single evaluation.
#[derive(Clone, Copy)]
pub struct BehaviorContext<'a> {
    pub agent: &'a AgentView,
    pub position: Vec3,
    pub velocity: Vec3,
    pub max_speed: f64,
    pub max_force: f64,
    /// Nearby relevant agents, already resolved by the host.
    pub neighbors: &'a [AgentView],
    pub host: &'a dyn Host,
}

impl<'a> BehaviorContext<'a> {
    #[must_use]
    pub fn new(agent: &'a AgentView, neighbors: &'a [AgentView], host: &'a dyn Host) -> Self {
        Self {
            agent,
            position: agent.position,
            velocity: agent.velocity,
            max_speed: agent.max_speed,
            max_force: agent.max_force,
            neighbors,
            host,
        }
    }

    #[must_use]
    pub fn with_caps(mut self, max_speed: f64, max_force: f64) -> Self {
        self.max_speed = max_speed;
        self.max_force = max_force;
        self
    }

    #[inline]
    #[must_use]
    pub fn speed(&self) -> f64 {
        self.velocity.magnitude()
    }

    #[inline]
    #[must_use]
    pub fn tick(&self) -> u64 {
        self.host.tick()
    }
}

impl std::fmt::Debug for BehaviorContext<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BehaviorContext")
            .field("agent", &self.agent.id)
            .field("position", &self.position)
            .field("velocity", &self.velocity)
            .field("max_speed", &self.max_speed)
            .field("max_force", &self.max_force)
            .field("neighbors", &self.neighbors.len())
            .finish_non_exhaustive()
    }
}

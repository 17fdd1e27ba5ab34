use crate::sim::host::WorldHost;
use ecosteer_core::config::{AppConfig, SpeciesProfile};
use ecosteer_core::context::BehaviorContext;
use ecosteer_core::herd::DominanceLedger;
use ecosteer_core::metrics::EngineMetrics;
use ecosteer_core::registry::BehaviorRegistry;
use ecosteer_core::rules::RuleSeed;
use ecosteer_core::spatial_hash::SpatialHash;
use ecosteer_core::ComponentStore;
use ecosteer_data::{AgentView, Uuid, Vec3};
use ecosteer_io::FileComponentStore;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

/// Ticks a juvenile needs to grow up; its age restarts from zero as an adult.
pub const JUVENILE_TICKS: u64 = 24_000;

const DEFAULT_SIZE: f64 = 256.0;
const CELL_SIZE: f64 = 16.0;
const SPAWN_SPREAD: f64 = 10.0;
const JUVENILE_SHARE: f64 = 0.2;

/// One simulated animal: its public state plus its private rules.
pub struct SimAgent {
    pub view: AgentView,
    pub profile: Arc<SpeciesProfile>,
    pub home: Vec3,
    perception: f64,
    registry: BehaviorRegistry,
}

impl SimAgent {
    #[must_use]
    pub fn registry(&self) -> &BehaviorRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut BehaviorRegistry {
        &mut self.registry
    }
}

/// Per-species line of a [`WorldReport`].
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SpeciesReport {
    pub name: String,
    pub alive: usize,
    pub juveniles: usize,
    pub moving: usize,
    pub mean_speed: f64,
    /// Mean distance from the species centroid on the x/z plane.
    pub spread: f64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct WorldReport {
    pub tick: u64,
    pub agents: usize,
    pub species: Vec<SpeciesReport>,
    pub rules_evaluated: u64,
    pub rules_skipped: u64,
    pub quorum_denials: u64,
    pub leader_changes: u64,
    pub group_syncs: u64,
    pub config_fingerprint: String,
}

/// Headless host that owns every agent and advances them tick by tick.
pub struct World {
    pub config: Arc<AppConfig>,
    pub width: f64,
    pub depth: f64,
    pub tick: u64,
    pub agents: Vec<SimAgent>,
    pub store: FileComponentStore,
    pub metrics: Arc<EngineMetrics>,
    spatial: SpatialHash,
    profiles: Vec<Arc<SpeciesProfile>>,
    rng: ChaCha8Rng,
    fingerprint: String,
}

impl World {
    /// Empty world of the default size.
    pub fn new(config: AppConfig) -> anyhow::Result<Self> {
        Self::with_size(config, DEFAULT_SIZE, DEFAULT_SIZE)
    }

    pub fn with_size(config: AppConfig, width: f64, depth: f64) -> anyhow::Result<Self> {
        config.validate()?;
        anyhow::ensure!(
            width > 0.0 && depth > 0.0,
            "World dimensions must be positive"
        );
        let profiles = config.species.iter().cloned().map(Arc::new).collect();
        let rng = ChaCha8Rng::seed_from_u64(config.engine.seed);
        let fingerprint = config.fingerprint();
        Ok(Self {
            config: Arc::new(config),
            width,
            depth,
            tick: 0,
            agents: Vec::new(),
            store: FileComponentStore::new(),
            metrics: Arc::new(EngineMetrics::new()),
            spatial: SpatialHash::new(CELL_SIZE, width, depth),
            profiles,
            rng,
            fingerprint,
        })
    }

    /// Spawns `per_species` agents of every configured species, each species
    /// clustered around its own random centre.
    pub fn populate(&mut self, per_species: usize) -> anyhow::Result<()> {
        let names: Vec<String> = self.profiles.iter().map(|p| p.name.clone()).collect();
        for name in names {
            self.spawn_herd(&name, per_species)?;
        }
        Ok(())
    }

    pub fn spawn_herd(&mut self, species: &str, count: usize) -> anyhow::Result<Vec<Uuid>> {
        let margin = SPAWN_SPREAD.min(self.width / 2.0).min(self.depth / 2.0);
        let centre = Vec3::new(
            self.rng.gen_range(margin..=self.width - margin),
            0.0,
            self.rng.gen_range(margin..=self.depth - margin),
        );
        let mut ids = Vec::with_capacity(count);
        for _ in 0..count {
            let offset = Vec3::new(
                self.rng.gen_range(-SPAWN_SPREAD..=SPAWN_SPREAD),
                0.0,
                self.rng.gen_range(-SPAWN_SPREAD..=SPAWN_SPREAD),
            );
            let juvenile = self.rng.gen_bool(JUVENILE_SHARE);
            ids.push(self.spawn(species, centre + offset, juvenile)?);
        }
        tracing::debug!(species, count, "Spawned herd");
        Ok(ids)
    }

    /// Adds one agent and builds its registry from the species profile.
    pub fn spawn(&mut self, species: &str, position: Vec3, juvenile: bool) -> anyhow::Result<Uuid> {
        let profile = self
            .profiles
            .iter()
            .find(|p| p.name.eq_ignore_ascii_case(species))
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("Unknown species '{species}'"))?;

        let id = Uuid::from_u128(self.rng.gen());
        let age = if juvenile {
            self.rng.gen_range(0..JUVENILE_TICKS)
        } else {
            self.rng.gen_range(0..=profile.herd.max_leadership_age)
        };
        let is_predator = !profile.predation.prey.is_empty();
        let defaults = AgentView::default();
        let view = AgentView {
            id,
            species: profile.species_id(),
            position: self.clamp_to_bounds(position),
            velocity: Vec3::ZERO,
            max_speed: if is_predator {
                defaults.max_speed * 1.25
            } else {
                defaults.max_speed
            },
            max_force: defaults.max_force,
            age,
            juvenile,
            health: defaults.max_health,
            ..defaults
        };

        let seed = RuleSeed::new(id, view.position).with_metrics(Arc::clone(&self.metrics));
        let registry = BehaviorRegistry::from_profile(&profile, &self.config.engine, &seed)?;
        self.agents.push(SimAgent {
            perception: perception_radius(&profile),
            home: view.position,
            view,
            profile,
            registry,
        });
        Ok(id)
    }

    #[must_use]
    pub fn agent(&self, id: Uuid) -> Option<&SimAgent> {
        self.agents.iter().find(|a| a.view.id == id)
    }

    pub fn agent_mut(&mut self, id: Uuid) -> Option<&mut SimAgent> {
        self.agents.iter_mut().find(|a| a.view.id == id)
    }

    /// Marks an agent dead and drops its persisted state. Dead agents stay in
    /// the list until [`World::remove_dead`] so stale references resolve.
    pub fn kill(&mut self, id: Uuid) -> bool {
        let Some(agent) = self.agent_mut(id) else {
            return false;
        };
        agent.view.alive = false;
        agent.view.velocity = Vec3::ZERO;
        self.store.remove(id);
        true
    }

    pub fn remove_dead(&mut self) -> usize {
        let before = self.agents.len();
        self.agents.retain(|a| a.view.alive);
        before - self.agents.len()
    }

    /// Reinforces (or, with a negative amount, erodes) an agent's dominance.
    pub fn reinforce_dominance(&self, id: Uuid, amount: f64) -> f64 {
        DominanceLedger::new(&self.config.engine).increase(&self.store, id, amount, self.tick)
    }

    #[must_use]
    pub fn dominance(&self, id: Uuid) -> Option<f64> {
        self.store.load(id).map(|c| c.dominance)
    }

    #[must_use]
    pub fn live_count(&self) -> usize {
        self.agents.iter().filter(|a| a.view.alive).count()
    }

    /// Advances every live agent by one tick.
    ///
    /// Forces are computed in parallel against a snapshot taken at the start
    /// of the tick, then applied sequentially.
    pub fn step(&mut self) {
        let started = Instant::now();
        self.tick += 1;

        let snapshot: Vec<AgentView> = self.agents.iter().map(|a| a.view.clone()).collect();
        let positions: Vec<Vec3> = snapshot.iter().map(|a| a.position).collect();
        self.spatial.build(&positions);
        let host = WorldHost::new(&snapshot, &self.spatial, &self.store, self.tick);

        let forces: Vec<Vec3> = self
            .agents
            .par_iter_mut()
            .map(|agent| {
                if !agent.view.alive {
                    return Vec3::ZERO;
                }
                let neighbors = host.nearby(agent.view.position, agent.perception, agent.view.id);
                let ctx = BehaviorContext::new(&agent.view, &neighbors, &host);
                agent.registry.calculate(&ctx, &agent.profile.weights)
            })
            .collect();

        for (agent, force) in self.agents.iter_mut().zip(forces) {
            if !agent.view.alive {
                continue;
            }
            let view = &mut agent.view;
            view.velocity += force;
            view.velocity.limit(view.max_speed);
            let next = view.position + view.velocity;
            view.position = clamp_xz(next, self.width, self.depth);
            if view.position.x != next.x {
                view.velocity.x = 0.0;
            }
            if view.position.z != next.z {
                view.velocity.z = 0.0;
            }

            view.age += 1;
            if view.juvenile && view.age >= JUVENILE_TICKS {
                view.juvenile = false;
                view.age = 0;
            }
        }

        self.metrics.record_tick(started.elapsed(), self.live_count());
    }

    pub fn run(&mut self, ticks: u64) {
        for _ in 0..ticks {
            self.step();
        }
    }

    fn clamp_to_bounds(&self, position: Vec3) -> Vec3 {
        clamp_xz(position, self.width, self.depth)
    }

    #[must_use]
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    #[must_use]
    pub fn report(&self) -> WorldReport {
        let epsilon = self.config.engine.motion_epsilon;
        let species = self
            .profiles
            .iter()
            .map(|profile| {
                let id = profile.species_id();
                let members: Vec<&AgentView> = self
                    .agents
                    .iter()
                    .map(|a| &a.view)
                    .filter(|v| v.alive && v.species == id)
                    .collect();
                species_report(&profile.name, &members, epsilon)
            })
            .collect();

        WorldReport {
            tick: self.tick,
            agents: self.live_count(),
            species,
            rules_evaluated: self.metrics.rules_evaluated(),
            rules_skipped: self.metrics.rules_skipped(),
            quorum_denials: self.metrics.quorum_denials(),
            leader_changes: self.metrics.leader_changes(),
            group_syncs: self.metrics.group_syncs(),
            config_fingerprint: self.fingerprint.clone(),
        }
    }

    /// Writes persisted herd state. `.rkyv` files use the binary format,
    /// anything else is JSON.
    pub fn save_components<P: AsRef<Path>>(&self, path: P) -> anyhow::Result<()> {
        let path = path.as_ref();
        if is_rkyv(path) {
            self.store.save_rkyv(path, self.tick, &self.fingerprint)?;
        } else {
            self.store.save_json(path, self.tick, &self.fingerprint)?;
        }
        tracing::info!(path = %path.display(), components = self.store.len(), "Saved herd components");
        Ok(())
    }

    /// Loads persisted herd state. A save written under a different
    /// configuration still loads, with a warning.
    pub fn load_components<P: AsRef<Path>>(&mut self, path: P) -> anyhow::Result<()> {
        let path = path.as_ref();
        let snapshot = if is_rkyv(path) {
            self.store.load_rkyv(path)?
        } else {
            self.store.load_json(path)?
        };
        if snapshot.config_fingerprint != self.fingerprint {
            tracing::warn!(
                saved = %snapshot.config_fingerprint,
                current = %self.fingerprint,
                "Loaded components were saved under a different configuration"
            );
        }
        Ok(())
    }
}

fn is_rkyv(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "rkyv")
}

fn clamp_xz(position: Vec3, width: f64, depth: f64) -> Vec3 {
    Vec3::new(
        position.x.clamp(0.0, width),
        position.y,
        position.z.clamp(0.0, depth),
    )
}

/// Widest radius any of the profile's rules looks at.
fn perception_radius(profile: &SpeciesProfile) -> f64 {
    let flocking = &profile.flocking;
    flocking
        .separation_distance
        .max(flocking.alignment_radius)
        .max(flocking.cohesion_radius)
        .max(profile.predation.detection_radius)
        .max(profile.predation.give_up_distance)
}

fn species_report(name: &str, members: &[&AgentView], epsilon: f64) -> SpeciesReport {
    let alive = members.len();
    if alive == 0 {
        return SpeciesReport {
            name: name.to_string(),
            alive: 0,
            juveniles: 0,
            moving: 0,
            mean_speed: 0.0,
            spread: 0.0,
        };
    }
    let n = alive as f64;
    let mut centroid = members.iter().fold(Vec3::ZERO, |acc, v| acc + v.position);
    centroid.div(n);
    let spread = members
        .iter()
        .map(|v| {
            let d = v.position - centroid;
            (d.x * d.x + d.z * d.z).sqrt()
        })
        .sum::<f64>()
        / n;

    SpeciesReport {
        name: name.to_string(),
        alive,
        juveniles: members.iter().filter(|v| v.juvenile).count(),
        moving: members.iter().filter(|v| v.is_moving(epsilon)).count(),
        mean_speed: members.iter().map(|v| v.speed()).sum::<f64>() / n,
        spread,
    }
}

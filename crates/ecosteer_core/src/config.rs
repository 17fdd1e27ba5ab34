//! Configuration for the steering engine.
//!
//! Strongly typed structures mapping to `ecosteer.toml`. Every section has a
//! `Default`, and every field inside a section may be omitted.
//!
//! ## Configuration Hierarchy
//!
//! 1. Default values (hardcoded in `Default` impls and species presets)
//! 2. `ecosteer.toml` (overrides defaults)
//!
//! ## Example `ecosteer.toml`
//!
//! ```toml
//! [engine]
//! ticks_per_second = 20
//! seed = 42
//!
//! [[species]]
//! name = "bison"
//! behaviors = [{ id = "herd" }, { id = "wander" }]
//!
//! [species.herd]
//! quorum_threshold = 0.5
//!
//! [species.weights]
//! wander = 0.2
//! ```

use crate::kind::{BehaviorCategory, BehaviorKind};
use crate::weights::WeightTable;
use ecosteer_data::SpeciesId;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Timing and bookkeeping constants shared by every agent.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct EngineConfig {
    pub ticks_per_second: u32,
    /// Lifetime of a herd membership snapshot.
    pub membership_ttl_secs: f64,
    /// How often each agent re-ranks leader candidates.
    pub leader_update_secs: f64,
    /// Region bucket size, and search radius, for group-id adoption.
    pub herd_sync_distance: f64,
    /// Speed above which an agent counts as moving.
    pub motion_epsilon: f64,
    pub dominance_decay_interval_ticks: u64,
    pub dominance_decay_rate: f64,
    pub dominance_floor: f64,
    pub seed: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            ticks_per_second: 20,
            membership_ttl_secs: 0.5,
            leader_update_secs: 2.0,
            herd_sync_distance: 32.0,
            motion_epsilon: 0.05,
            dominance_decay_interval_ticks: 1200,
            dominance_decay_rate: 0.01,
            dominance_floor: 0.1,
            seed: 0,
        }
    }
}

impl EngineConfig {
    /// Converts a tick count into game seconds.
    #[inline]
    #[must_use]
    pub fn seconds(&self, tick: u64) -> f64 {
        tick as f64 / f64::from(self.ticks_per_second.max(1))
    }
}

/// Herd tuning for one species.
///
/// Read-only during force computation and shared through an `Arc`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct HerdConfig {
    /// Fraction of moving members required before the herd moves.
    pub quorum_threshold: f64,
    /// Once moving, the ratio may fall this far below the threshold before
    /// movement stops.
    pub quorum_hysteresis: f64,
    pub leadership_age_weight: f64,
    pub leadership_dominance_weight: f64,
    /// Score bonus for candidates that are currently moving.
    pub leadership_motion_bonus: f64,
    pub leadership_health_weight: f64,
    pub max_leaders: usize,
    pub leader_follow_radius: f64,
    /// Age at which the age bonus saturates.
    pub max_leadership_age: u64,
    pub cohesion_radius: f64,
    pub separation_distance: f64,
    pub separation_weight: f64,
    pub cohesion_strength: f64,
    pub selfish_herd_enabled: bool,
    pub selfish_herd_strength: f64,
    /// Adults younger than this still count as partly vulnerable.
    pub young_adult_age: u64,
    /// Edge factor above which an agent is considered on the herd edge.
    pub edge_threshold: f64,
}

impl Default for HerdConfig {
    fn default() -> Self {
        Self {
            quorum_threshold: 0.47,
            quorum_hysteresis: 0.05,
            leadership_age_weight: 0.7,
            leadership_dominance_weight: 0.5,
            leadership_motion_bonus: 0.2,
            leadership_health_weight: 0.1,
            max_leaders: 3,
            leader_follow_radius: 16.0,
            max_leadership_age: 24_000,
            cohesion_radius: 12.0,
            separation_distance: 2.5,
            separation_weight: 1.2,
            cohesion_strength: 1.0,
            selfish_herd_enabled: true,
            selfish_herd_strength: 0.6,
            young_adult_age: 1_200,
            edge_threshold: 0.7,
        }
    }
}

impl HerdConfig {
    /// Preset tuned for a known herd species; unknown names get the defaults.
    #[must_use]
    pub fn for_species(name: &str) -> Self {
        let base = Self::default();
        match name.trim().to_lowercase().as_str() {
            "bison" => Self {
                quorum_threshold: 0.47,
                leadership_age_weight: 0.8,
                leadership_dominance_weight: 0.6,
                max_leaders: 4,
                cohesion_radius: 15.0,
                selfish_herd_enabled: true,
                selfish_herd_strength: 0.7,
                ..base
            },
            "sheep" => Self {
                quorum_threshold: 0.35,
                leadership_age_weight: 0.5,
                leadership_dominance_weight: 0.3,
                max_leaders: 2,
                cohesion_radius: 10.0,
                selfish_herd_enabled: true,
                selfish_herd_strength: 0.5,
                ..base
            },
            "cow" | "mooshroom" => Self {
                quorum_threshold: 0.40,
                leadership_age_weight: 0.4,
                leadership_dominance_weight: 0.2,
                max_leaders: 2,
                cohesion_radius: 12.0,
                selfish_herd_enabled: true,
                selfish_herd_strength: 0.4,
                ..base
            },
            "pig" => Self {
                quorum_threshold: 0.30,
                leadership_age_weight: 0.3,
                leadership_dominance_weight: 0.3,
                max_leaders: 1,
                cohesion_radius: 8.0,
                selfish_herd_enabled: false,
                ..base
            },
            "chicken" => Self {
                quorum_threshold: 0.25,
                leadership_age_weight: 0.2,
                leadership_dominance_weight: 0.1,
                max_leaders: 1,
                cohesion_radius: 6.0,
                selfish_herd_enabled: false,
                ..base
            },
            "goat" => Self {
                quorum_threshold: 0.30,
                leadership_age_weight: 0.3,
                leadership_dominance_weight: 0.2,
                max_leaders: 2,
                cohesion_radius: 10.0,
                selfish_herd_enabled: true,
                selfish_herd_strength: 0.3,
                ..base
            },
            "llama" => Self {
                quorum_threshold: 0.40,
                leadership_age_weight: 0.7,
                leadership_dominance_weight: 0.5,
                max_leaders: 2,
                cohesion_radius: 14.0,
                selfish_herd_enabled: true,
                selfish_herd_strength: 0.5,
                ..base
            },
            "wolf" => Self {
                quorum_threshold: 0.50,
                leadership_age_weight: 0.6,
                leadership_dominance_weight: 0.9,
                max_leaders: 2,
                cohesion_radius: 20.0,
                selfish_herd_enabled: true,
                selfish_herd_strength: 0.3,
                ..base
            },
            _ => base,
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            (0.0..=1.0).contains(&self.quorum_threshold),
            "Quorum threshold must be in [0, 1]"
        );
        anyhow::ensure!(
            (0.0..=self.quorum_threshold).contains(&self.quorum_hysteresis),
            "Quorum hysteresis must be in [0, quorum_threshold]"
        );
        anyhow::ensure!(
            self.leadership_age_weight >= 0.0
                && self.leadership_dominance_weight >= 0.0
                && self.leadership_motion_bonus >= 0.0
                && self.leadership_health_weight >= 0.0,
            "Leadership weights must be non-negative"
        );
        anyhow::ensure!(self.max_leaders >= 1, "max_leaders must be at least 1");
        anyhow::ensure!(
            self.leader_follow_radius > 0.0,
            "Leader follow radius must be positive"
        );
        anyhow::ensure!(self.cohesion_radius > 0.0, "Cohesion radius must be positive");
        anyhow::ensure!(
            self.separation_distance > 0.0,
            "Separation distance must be positive"
        );
        anyhow::ensure!(
            self.separation_weight >= 0.0 && self.cohesion_strength >= 0.0,
            "Herd force weights must be non-negative"
        );
        anyhow::ensure!(
            self.selfish_herd_strength >= 0.0,
            "Selfish herd strength must be non-negative"
        );
        anyhow::ensure!(
            (0.0..=1.0).contains(&self.edge_threshold),
            "Edge threshold must be in [0, 1]"
        );
        Ok(())
    }
}

/// Radii for the plain flocking rules.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct FlockingConfig {
    pub separation_distance: f64,
    pub alignment_radius: f64,
    pub cohesion_radius: f64,
}

impl Default for FlockingConfig {
    fn default() -> Self {
        Self {
            separation_distance: 2.5,
            alignment_radius: 8.0,
            cohesion_radius: 10.0,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct WanderConfig {
    /// Radius of the steering circle projected ahead of the agent.
    pub radius: f64,
    pub distance: f64,
    /// Maximum heading change per tick, in radians.
    pub jitter: f64,
}

impl Default for WanderConfig {
    fn default() -> Self {
        Self {
            radius: 1.0,
            distance: 2.0,
            jitter: 0.3,
        }
    }
}

/// Predator/prey relations, by species name.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct PredationConfig {
    pub prey: Vec<String>,
    pub predators: Vec<String>,
    pub detection_radius: f64,
    pub give_up_distance: f64,
    pub attack_range: f64,
    /// Cap on pursuit/evasion look-ahead, in ticks.
    pub max_prediction: f64,
}

impl Default for PredationConfig {
    fn default() -> Self {
        Self {
            prey: Vec::new(),
            predators: Vec::new(),
            detection_radius: 16.0,
            give_up_distance: 32.0,
            attack_range: 1.5,
            max_prediction: 20.0,
        }
    }
}

impl PredationConfig {
    #[must_use]
    pub fn prey_ids(&self) -> Vec<SpeciesId> {
        self.prey.iter().map(|n| SpeciesId::from_name(n)).collect()
    }

    #[must_use]
    pub fn predator_ids(&self) -> Vec<SpeciesId> {
        self.predators.iter().map(|n| SpeciesId::from_name(n)).collect()
    }
}

/// One behavior a species profile wants registered.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct BehaviorSpec {
    pub id: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default = "default_true")]
    pub enabled: bool,
}

fn default_true() -> bool {
    true
}

impl BehaviorSpec {
    #[must_use]
    pub fn new(kind: BehaviorKind) -> Self {
        Self {
            id: kind.as_str().to_string(),
            category: None,
            enabled: true,
        }
    }
}

/// Everything needed to set up agents of one species.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SpeciesProfile {
    pub name: String,
    #[serde(default)]
    pub herd: Arc<HerdConfig>,
    #[serde(default)]
    pub flocking: FlockingConfig,
    #[serde(default)]
    pub wander: WanderConfig,
    #[serde(default)]
    pub predation: PredationConfig,
    /// Radius around the spawn point the home-range rule keeps agents in.
    #[serde(default = "default_home_radius")]
    pub home_radius: f64,
    #[serde(default)]
    pub weights: WeightTable,
    #[serde(default)]
    pub behaviors: Vec<BehaviorSpec>,
}

fn default_home_radius() -> f64 {
    48.0
}

impl SpeciesProfile {
    /// Profile for a herd species: preset herd tuning plus herd, evasion and
    /// wander behaviors.
    #[must_use]
    pub fn herbivore(name: &str) -> Self {
        Self {
            name: name.to_string(),
            herd: Arc::new(HerdConfig::for_species(name)),
            flocking: FlockingConfig::default(),
            wander: WanderConfig::default(),
            predation: PredationConfig {
                predators: vec!["wolf".to_string()],
                ..PredationConfig::default()
            },
            home_radius: default_home_radius(),
            weights: WeightTable::default(),
            behaviors: vec![
                BehaviorSpec::new(BehaviorKind::Evasion),
                BehaviorSpec::new(BehaviorKind::Wander),
                BehaviorSpec::new(BehaviorKind::HomeRange),
                BehaviorSpec::new(BehaviorKind::Herd),
            ],
        }
    }

    /// Pack hunter: herd behavior plus pursuit of the listed prey.
    #[must_use]
    pub fn predator(name: &str, prey: &[&str]) -> Self {
        Self {
            predation: PredationConfig {
                prey: prey.iter().map(|p| (*p).to_string()).collect(),
                ..PredationConfig::default()
            },
            behaviors: vec![
                BehaviorSpec::new(BehaviorKind::Pursuit),
                BehaviorSpec::new(BehaviorKind::Wander),
                BehaviorSpec::new(BehaviorKind::Herd),
            ],
            ..Self::herbivore(name)
        }
    }

    #[must_use]
    pub fn species_id(&self) -> SpeciesId {
        SpeciesId::from_name(&self.name)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(!self.name.trim().is_empty(), "Species name must not be empty");
        self.herd
            .validate()
            .map_err(|e| e.context(format!("species '{}'", self.name)))?;
        anyhow::ensure!(
            self.flocking.separation_distance > 0.0
                && self.flocking.alignment_radius > 0.0
                && self.flocking.cohesion_radius > 0.0,
            "Flocking radii must be positive for species '{}'",
            self.name
        );
        anyhow::ensure!(
            self.wander.radius >= 0.0 && self.wander.distance >= 0.0 && self.wander.jitter >= 0.0,
            "Wander parameters must be non-negative for species '{}'",
            self.name
        );
        anyhow::ensure!(
            self.predation.detection_radius > 0.0 && self.predation.give_up_distance > 0.0,
            "Predation radii must be positive for species '{}'",
            self.name
        );
        anyhow::ensure!(
            self.home_radius > 0.0,
            "Home radius must be positive for species '{}'",
            self.name
        );
        let mut seen = Vec::with_capacity(self.behaviors.len());
        for spec in &self.behaviors {
            let kind: BehaviorKind = spec
                .id
                .parse()
                .map_err(|e| anyhow::anyhow!("species '{}': {e}", self.name))?;
            anyhow::ensure!(
                !seen.contains(&kind),
                "species '{}': behavior '{}' listed twice",
                self.name,
                kind
            );
            seen.push(kind);
            if let Some(label) = &spec.category {
                label
                    .parse::<BehaviorCategory>()
                    .map_err(|e| anyhow::anyhow!("species '{}': {e}", self.name))?;
            }
        }
        Ok(())
    }
}

/// Top-level configuration file.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct AppConfig {
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default = "default_species")]
    pub species: Vec<SpeciesProfile>,
}

fn default_species() -> Vec<SpeciesProfile> {
    vec![
        SpeciesProfile::herbivore("bison"),
        SpeciesProfile::herbivore("sheep"),
        SpeciesProfile::predator("wolf", &["sheep"]),
    ]
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            engine: EngineConfig::default(),
            species: default_species(),
        }
    }
}

impl AppConfig {
    /// Validates all configuration parameters.
    ///
    /// Returns `Ok(())` if everything is valid, or `Err` describing the first
    /// failure.
    pub fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            self.engine.ticks_per_second > 0,
            "Ticks per second must be positive"
        );
        anyhow::ensure!(
            self.engine.membership_ttl_secs >= 0.0,
            "Membership TTL must be non-negative"
        );
        anyhow::ensure!(
            self.engine.leader_update_secs >= 0.0,
            "Leader update interval must be non-negative"
        );
        anyhow::ensure!(
            self.engine.herd_sync_distance > 0.0,
            "Herd sync distance must be positive"
        );
        anyhow::ensure!(
            self.engine.motion_epsilon >= 0.0,
            "Motion epsilon must be non-negative"
        );
        anyhow::ensure!(
            self.engine.dominance_decay_interval_ticks > 0,
            "Dominance decay interval must be positive"
        );
        anyhow::ensure!(
            (0.0..=1.0).contains(&self.engine.dominance_decay_rate),
            "Dominance decay rate must be in [0, 1]"
        );
        anyhow::ensure!(
            (0.0..=1.0).contains(&self.engine.dominance_floor),
            "Dominance floor must be in [0, 1]"
        );

        let mut names: Vec<&str> = Vec::with_capacity(self.species.len());
        for profile in &self.species {
            profile.validate()?;
            anyhow::ensure!(
                !names.contains(&profile.name.as_str()),
                "Species '{}' defined twice",
                profile.name
            );
            names.push(&profile.name);
        }
        Ok(())
    }

    /// Parses and validates a TOML document.
    pub fn from_toml(content: &str) -> anyhow::Result<Self> {
        let config = toml::from_str::<Self>(content)?;
        config.validate()?;
        Ok(config)
    }

    #[must_use]
    pub fn profile(&self, name: &str) -> Option<&SpeciesProfile> {
        self.species.iter().find(|p| p.name.eq_ignore_ascii_case(name))
    }

    /// Stable hash of everything that influences agent behavior.
    #[must_use]
    pub fn fingerprint(&self) -> String {
        use sha2::{Digest, Sha256};
        let mut hasher = Sha256::new();
        hasher.update(format!("{:?}", self.engine).as_bytes());
        for profile in &self.species {
            hasher.update(format!("{profile:?}").as_bytes());
        }
        hex::encode(hasher.finalize())
    }
}

use super::vector::Vec3;
use rkyv::{Archive, Deserialize as RkyvDeserialize, Serialize as RkyvSerialize};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Compact species tag.
///
/// Built from a species name with a stable FNV-1a hash so that the same name
/// always yields the same tag across runs and machines.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Archive,
    RkyvSerialize,
    RkyvDeserialize,
)]
#[archive(check_bytes)]
pub struct SpeciesId(pub u32);

impl SpeciesId {
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        let mut hash: u32 = 0x811c_9dc5;
        for byte in name.as_bytes() {
            hash ^= u32::from(*byte);
            hash = hash.wrapping_mul(0x0100_0193);
        }
        Self(hash)
    }
}

impl fmt::Display for SpeciesId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "species#{:08x}", self.0)
    }
}

/// Read-only view of a host-owned agent.
///
/// The host builds one of these per agent per tick; the engine never holds a
/// view across ticks except inside the herd membership cache, whose staleness
/// is bounded by its TTL.
#[derive(Debug, Clone, Serialize, Deserialize, Archive, RkyvSerialize, RkyvDeserialize)]
#[archive(check_bytes)]
pub struct AgentView {
    pub id: Uuid,
    pub species: SpeciesId,
    pub position: Vec3,
    pub velocity: Vec3,
    pub max_speed: f64,
    pub max_force: f64,
    /// Ticks lived since becoming an adult; juveniles keep counting but are
    /// flagged separately.
    pub age: u64,
    pub juvenile: bool,
    pub health: f64,
    pub max_health: f64,
    pub alive: bool,
}

impl AgentView {
    #[must_use]
    pub fn speed(&self) -> f64 {
        self.velocity.magnitude()
    }

    /// Current over maximum health, clamped to [0, 1]. Zero max health reads as 0.
    #[must_use]
    pub fn health_ratio(&self) -> f64 {
        if self.max_health <= 0.0 {
            return 0.0;
        }
        (self.health / self.max_health).clamp(0.0, 1.0)
    }

    #[must_use]
    pub fn is_moving(&self, epsilon: f64) -> bool {
        self.speed() > epsilon
    }
}

impl Default for AgentView {
    fn default() -> Self {
        Self {
            id: Uuid::nil(),
            species: SpeciesId(0),
            position: Vec3::ZERO,
            velocity: Vec3::ZERO,
            max_speed: 0.4,
            max_force: 0.1,
            age: 0,
            juvenile: false,
            health: 10.0,
            max_health: 10.0,
            alive: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_species_id_is_stable() {
        assert_eq!(SpeciesId::from_name("bison"), SpeciesId::from_name("bison"));
        assert_ne!(SpeciesId::from_name("bison"), SpeciesId::from_name("sheep"));
        // FNV-1a of the empty string is the offset basis
        assert_eq!(SpeciesId::from_name(""), SpeciesId(0x811c_9dc5));
    }

    #[test]
    fn test_health_ratio_guards_zero_max() {
        let agent = AgentView {
            max_health: 0.0,
            ..Default::default()
        };
        assert_eq!(agent.health_ratio(), 0.0);

        let half = AgentView {
            health: 5.0,
            max_health: 10.0,
            ..Default::default()
        };
        assert!((half.health_ratio() - 0.5).abs() < f64::EPSILON);
    }
}

//! Per-behavior weight table.

use crate::kind::BehaviorKind;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Non-negative multiplier for every [`BehaviorKind`].
///
/// Stored densely so a lookup during force composition is a single index.
/// A weight of zero disables a behavior's contribution without unregistering
/// it. Negative or NaN inputs are stored as zero.
///
/// In TOML a table is written as a map from behavior name to weight; names
/// that are omitted keep their default:
///
/// ```toml
/// [weights]
/// separation = 2.0
/// wander = 0.0
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "HashMap<String, f64>", into = "BTreeMap<String, f64>")]
pub struct WeightTable {
    values: [f64; BehaviorKind::COUNT],
}

impl Default for WeightTable {
    fn default() -> Self {
        let mut table = Self::zeroed();
        table.set(BehaviorKind::Separation, 1.5);
        table.set(BehaviorKind::Alignment, 1.0);
        table.set(BehaviorKind::Cohesion, 1.0);
        table.set(BehaviorKind::FoodSeek, 2.0);
        table.set(BehaviorKind::WaterSeek, 1.5);
        table.set(BehaviorKind::ShelterSeek, 0.8);
        table.set(BehaviorKind::Pursuit, 2.0);
        table.set(BehaviorKind::Evasion, 3.0);
        table.set(BehaviorKind::TerritorialDefense, 1.2);
        table.set(BehaviorKind::Wander, 0.5);
        table.set(BehaviorKind::ObstacleAvoidance, 2.5);
        table.set(BehaviorKind::LightPreference, 0.3);
        table.set(BehaviorKind::HomeRange, 1.0);
        table.set(BehaviorKind::Herd, 1.0);
        table
    }
}

impl WeightTable {
    /// All weights zero.
    #[must_use]
    pub const fn zeroed() -> Self {
        Self {
            values: [0.0; BehaviorKind::COUNT],
        }
    }

    #[must_use]
    pub fn uniform(weight: f64) -> Self {
        Self {
            values: [sanitize(weight); BehaviorKind::COUNT],
        }
    }

    #[inline]
    #[must_use]
    pub fn get(&self, kind: BehaviorKind) -> f64 {
        self.values[kind.index()]
    }

    #[inline]
    pub fn set(&mut self, kind: BehaviorKind, weight: f64) {
        self.values[kind.index()] = sanitize(weight);
    }

    #[must_use]
    pub fn with(mut self, kind: BehaviorKind, weight: f64) -> Self {
        self.set(kind, weight);
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = (BehaviorKind, f64)> + '_ {
        BehaviorKind::ALL
            .into_iter()
            .map(move |kind| (kind, self.values[kind.index()]))
    }

    /// Overrides defaults with the named entries.
    pub fn from_map<'a, I>(entries: I) -> Result<Self, crate::error::RegistryError>
    where
        I: IntoIterator<Item = (&'a str, f64)>,
    {
        let mut table = Self::default();
        for (name, weight) in entries {
            let kind: BehaviorKind = name.parse()?;
            if sanitize(weight) != weight {
                tracing::warn!(behavior = kind.as_str(), weight, "Invalid weight clamped to 0");
            }
            table.set(kind, weight);
        }
        Ok(table)
    }
}

#[inline]
pub(crate) fn sanitize(weight: f64) -> f64 {
    if weight.is_nan() || weight < 0.0 {
        0.0
    } else {
        weight
    }
}

impl TryFrom<HashMap<String, f64>> for WeightTable {
    type Error = crate::error::RegistryError;

    fn try_from(map: HashMap<String, f64>) -> Result<Self, Self::Error> {
        Self::from_map(map.iter().map(|(k, v)| (k.as_str(), *v)))
    }
}

impl From<WeightTable> for BTreeMap<String, f64> {
    fn from(table: WeightTable) -> Self {
        table
            .iter()
            .map(|(kind, weight)| (kind.as_str().to_string(), weight))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let table = WeightTable::default();
        assert_eq!(table.get(BehaviorKind::Separation), 1.5);
        assert_eq!(table.get(BehaviorKind::Evasion), 3.0);
        assert_eq!(table.get(BehaviorKind::LightPreference), 0.3);
        assert_eq!(table.get(BehaviorKind::Wander), 0.5);
    }

    #[test]
    fn test_negative_and_nan_become_zero() {
        let mut table = WeightTable::default();
        table.set(BehaviorKind::Wander, -2.0);
        assert_eq!(table.get(BehaviorKind::Wander), 0.0);
        table.set(BehaviorKind::Wander, f64::NAN);
        assert_eq!(table.get(BehaviorKind::Wander), 0.0);
        assert_eq!(WeightTable::uniform(-1.0), WeightTable::zeroed());
    }

    #[test]
    fn test_from_map_keeps_unnamed_defaults() {
        let table = WeightTable::from_map([("cohesion", 4.0), ("foodSeek", 0.0)]).unwrap();
        assert_eq!(table.get(BehaviorKind::Cohesion), 4.0);
        assert_eq!(table.get(BehaviorKind::FoodSeek), 0.0);
        assert_eq!(table.get(BehaviorKind::Separation), 1.5);
        assert!(WeightTable::from_map([("flight", 1.0)]).is_err());
    }

    #[test]
    fn test_toml_table() {
        #[derive(Deserialize)]
        struct Wrapper {
            weights: WeightTable,
        }
        let parsed: Wrapper = toml::from_str("[weights]\nseparation = 2.0\nwander = 0.0\n").unwrap();
        assert_eq!(parsed.weights.get(BehaviorKind::Separation), 2.0);
        assert_eq!(parsed.weights.get(BehaviorKind::Wander), 0.0);
        assert_eq!(parsed.weights.get(BehaviorKind::Evasion), 3.0);
    }
}

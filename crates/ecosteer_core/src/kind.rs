//! Closed set of behavior identifiers and their categories.

use crate::error::RegistryError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Identifier of a steering behavior.
///
/// The set is closed: weight tables are dense arrays indexed by
/// [`BehaviorKind::index`], and registries iterate in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BehaviorKind {
    Separation,
    Alignment,
    Cohesion,
    FoodSeek,
    WaterSeek,
    ShelterSeek,
    Pursuit,
    Evasion,
    TerritorialDefense,
    Wander,
    ObstacleAvoidance,
    LightPreference,
    HomeRange,
    Herd,
}

impl BehaviorKind {
    pub const COUNT: usize = 14;

    pub const ALL: [BehaviorKind; Self::COUNT] = [
        BehaviorKind::Separation,
        BehaviorKind::Alignment,
        BehaviorKind::Cohesion,
        BehaviorKind::FoodSeek,
        BehaviorKind::WaterSeek,
        BehaviorKind::ShelterSeek,
        BehaviorKind::Pursuit,
        BehaviorKind::Evasion,
        BehaviorKind::TerritorialDefense,
        BehaviorKind::Wander,
        BehaviorKind::ObstacleAvoidance,
        BehaviorKind::LightPreference,
        BehaviorKind::HomeRange,
        BehaviorKind::Herd,
    ];

    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            BehaviorKind::Separation => "separation",
            BehaviorKind::Alignment => "alignment",
            BehaviorKind::Cohesion => "cohesion",
            BehaviorKind::FoodSeek => "food_seek",
            BehaviorKind::WaterSeek => "water_seek",
            BehaviorKind::ShelterSeek => "shelter_seek",
            BehaviorKind::Pursuit => "pursuit",
            BehaviorKind::Evasion => "evasion",
            BehaviorKind::TerritorialDefense => "territorial_defense",
            BehaviorKind::Wander => "wander",
            BehaviorKind::ObstacleAvoidance => "obstacle_avoidance",
            BehaviorKind::LightPreference => "light_preference",
            BehaviorKind::HomeRange => "home_range",
            BehaviorKind::Herd => "herd",
        }
    }

    /// Category a behavior is filed under when none is given explicitly.
    #[must_use]
    pub const fn default_category(self) -> BehaviorCategory {
        match self {
            BehaviorKind::Separation | BehaviorKind::Alignment | BehaviorKind::Cohesion => {
                BehaviorCategory::Flocking
            }
            BehaviorKind::FoodSeek | BehaviorKind::WaterSeek | BehaviorKind::ShelterSeek => {
                BehaviorCategory::Foraging
            }
            BehaviorKind::Pursuit | BehaviorKind::Evasion => BehaviorCategory::Predation,
            BehaviorKind::TerritorialDefense | BehaviorKind::HomeRange => {
                BehaviorCategory::Territorial
            }
            BehaviorKind::ObstacleAvoidance | BehaviorKind::LightPreference => {
                BehaviorCategory::Environmental
            }
            BehaviorKind::Wander => BehaviorCategory::General,
            BehaviorKind::Herd => BehaviorCategory::Herd,
        }
    }
}

impl fmt::Display for BehaviorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BehaviorKind {
    type Err = RegistryError;

    /// Accepts the snake_case name, ignoring case. Camel-case spellings such
    /// as `foodSeek` are accepted too.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(RegistryError::EmptyId);
        }
        let normalized: String = trimmed
            .chars()
            .filter(|c| *c != '_' && *c != '-')
            .flat_map(char::to_lowercase)
            .collect();
        BehaviorKind::ALL
            .into_iter()
            .find(|kind| kind.as_str().replace('_', "") == normalized)
            .ok_or_else(|| RegistryError::UnknownBehavior(trimmed.to_string()))
    }
}

/// Grouping label used to toggle related behaviors together.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum BehaviorCategory {
    #[default]
    General,
    Flocking,
    Foraging,
    Predation,
    Territorial,
    Environmental,
    Herd,
}

impl BehaviorCategory {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            BehaviorCategory::General => "general",
            BehaviorCategory::Flocking => "flocking",
            BehaviorCategory::Foraging => "foraging",
            BehaviorCategory::Predation => "predation",
            BehaviorCategory::Territorial => "territorial",
            BehaviorCategory::Environmental => "environmental",
            BehaviorCategory::Herd => "herd",
        }
    }
}

impl fmt::Display for BehaviorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BehaviorCategory {
    type Err = RegistryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "general" => Ok(BehaviorCategory::General),
            "flocking" => Ok(BehaviorCategory::Flocking),
            "foraging" => Ok(BehaviorCategory::Foraging),
            "predation" => Ok(BehaviorCategory::Predation),
            "territorial" => Ok(BehaviorCategory::Territorial),
            "environmental" => Ok(BehaviorCategory::Environmental),
            "herd" => Ok(BehaviorCategory::Herd),
            other => Err(RegistryError::UnknownCategory(other.to_string())),
        }
    }
}

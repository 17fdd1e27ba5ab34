use rkyv::{Archive, Deserialize as RkyvDeserialize, Serialize as RkyvSerialize};
use serde::{Deserialize, Serialize};

/// Persisted per-agent herd state.
///
/// Dominance is always kept in [0, 1]; use [`HerdComponent::with_dominance`]
/// or [`HerdComponent::set_dominance`] rather than writing the field directly.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Serialize,
    Deserialize,
    Archive,
    RkyvSerialize,
    RkyvDeserialize,
)]
#[archive(check_bytes)]
pub struct HerdComponent {
    pub dominance: f64,
    #[serde(default)]
    pub last_decay_tick: u64,
}

impl HerdComponent {
    #[must_use]
    pub fn with_dominance(dominance: f64, tick: u64) -> Self {
        let mut component = Self {
            dominance: 0.0,
            last_decay_tick: tick,
        };
        component.set_dominance(dominance);
        component
    }

    /// Stores `value` clamped to [0, 1]; NaN is stored as 0.
    pub fn set_dominance(&mut self, value: f64) {
        self.dominance = if value.is_nan() {
            0.0
        } else {
            value.clamp(0.0, 1.0)
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dominance_clamps() {
        assert_eq!(HerdComponent::with_dominance(4.0, 0).dominance, 1.0);
        assert_eq!(HerdComponent::with_dominance(-4.0, 0).dominance, 0.0);
        assert_eq!(HerdComponent::with_dominance(f64::NAN, 0).dominance, 0.0);
    }
}

use crate::config::HerdConfig;
use ecosteer_data::AgentView;

/// Fraction of `members` moving faster than `epsilon`. Empty sets read as 0.
#[must_use]
pub fn quorum_ratio(members: &[AgentView], epsilon: f64) -> f64 {
    if members.is_empty() {
        return 0.0;
    }
    let moving = members.iter().filter(|m| m.is_moving(epsilon)).count();
    moving as f64 / members.len() as f64
}

/// Gate that lets a herd move only once enough of it is already moving.
///
/// Opening requires the ratio to reach the threshold; once open, the gate
/// stays open until the ratio drops below `threshold - hysteresis`. This
/// keeps a herd hovering near the threshold from flickering every tick.
#[derive(Debug, Clone)]
pub struct QuorumGate {
    threshold: f64,
    hysteresis: f64,
    epsilon: f64,
    allowed: bool,
    ratio: f64,
    moving: usize,
    total: usize,
}

impl QuorumGate {
    #[must_use]
    pub fn new(config: &HerdConfig, epsilon: f64) -> Self {
        Self {
            threshold: config.quorum_threshold,
            hysteresis: config.quorum_hysteresis.max(0.0),
            epsilon,
            allowed: false,
            ratio: 0.0,
            moving: 0,
            total: 0,
        }
    }

    /// Recomputes the ratio for `members` and returns whether movement is
    /// allowed this tick.
    pub fn update(&mut self, members: &[AgentView]) -> bool {
        self.total = members.len();
        self.moving = members.iter().filter(|m| m.is_moving(self.epsilon)).count();
        self.ratio = if self.total == 0 {
            0.0
        } else {
            self.moving as f64 / self.total as f64
        };

        let bar = if self.allowed {
            self.threshold - self.hysteresis
        } else {
            self.threshold
        };
        let allowed = self.ratio >= bar;
        if allowed != self.allowed {
            tracing::debug!(
                ratio = self.ratio,
                threshold = self.threshold,
                allowed,
                "Quorum gate changed"
            );
        }
        self.allowed = allowed;
        allowed
    }

    #[must_use]
    pub fn is_movement_allowed(&self) -> bool {
        self.allowed
    }

    /// Ratio seen by the last [`QuorumGate::update`].
    #[must_use]
    pub fn ratio(&self) -> f64 {
        self.ratio
    }

    #[must_use]
    pub fn moving_count(&self) -> usize {
        self.moving
    }

    #[must_use]
    pub fn total_count(&self) -> usize {
        self.total
    }

    #[must_use]
    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Forces the gate open or shut until the next update.
    pub fn set_movement_allowed(&mut self, allowed: bool) {
        self.allowed = allowed;
    }

    pub fn reset(&mut self) {
        self.allowed = false;
        self.ratio = 0.0;
        self.moving = 0;
        self.total = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ecosteer_data::Vec3;

    fn herd(moving: usize, still: usize) -> Vec<AgentView> {
        let mut members = Vec::new();
        for _ in 0..moving {
            members.push(AgentView {
                velocity: Vec3::new(0.2, 0.0, 0.0),
                ..Default::default()
            });
        }
        for _ in 0..still {
            members.push(AgentView::default());
        }
        members
    }

    fn gate(threshold: f64, hysteresis: f64) -> QuorumGate {
        let config = HerdConfig {
            quorum_threshold: threshold,
            quorum_hysteresis: hysteresis,
            ..Default::default()
        };
        QuorumGate::new(&config, 0.05)
    }

    #[test]
    fn test_ratio_of_empty_set_is_zero() {
        assert_eq!(quorum_ratio(&[], 0.05), 0.0);
    }

    #[test]
    fn test_ratio_counts_moving_members() {
        assert_eq!(quorum_ratio(&herd(1, 3), 0.05), 0.25);
    }

    #[test]
    fn test_one_of_four_below_threshold() {
        let mut gate = gate(0.47, 0.0);
        assert!(!gate.update(&herd(1, 3)));
        assert_eq!(gate.ratio(), 0.25);
    }

    #[test]
    fn test_three_of_four_above_threshold() {
        let mut gate = gate(0.47, 0.0);
        assert!(gate.update(&herd(3, 1)));
        assert_eq!(gate.ratio(), 0.75);
    }

    #[test]
    fn test_hysteresis_holds_gate_open() {
        let mut gate = gate(0.5, 0.1);
        assert!(!gate.update(&herd(9, 11))); // 0.45 < 0.5, stays shut
        assert!(gate.update(&herd(10, 10))); // 0.5 opens
        assert!(gate.update(&herd(9, 11))); // 0.45 >= 0.4, stays open
        assert!(!gate.update(&herd(7, 13))); // 0.35 < 0.4, closes
        assert!(!gate.update(&herd(9, 11))); // shut again, needs 0.5
    }

    #[test]
    fn test_reset_closes_gate() {
        let mut gate = gate(0.2, 0.0);
        assert!(gate.update(&herd(2, 2)));
        gate.reset();
        assert!(!gate.is_movement_allowed());
        assert_eq!(gate.total_count(), 0);
    }
}

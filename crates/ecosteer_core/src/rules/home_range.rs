use crate::context::BehaviorContext;
use crate::rule::BehaviorRule;
use crate::steering::arrive;
use ecosteer_data::Vec3;

/// Pulls an agent back once it strays more than `radius` from home.
///
/// Inside the radius the rule is silent. Outside, it arrives at home and
/// slows over the last quarter of the radius.
#[derive(Debug, Clone)]
pub struct HomeRange {
    pub home: Vec3,
    pub radius: f64,
}

impl HomeRange {
    #[must_use]
    pub fn new(home: Vec3, radius: f64) -> Self {
        Self { home, radius }
    }
}

impl BehaviorRule for HomeRange {
    fn calculate(&mut self, ctx: &BehaviorContext<'_>) -> Vec3 {
        if ctx.position.distance_to(self.home) <= self.radius {
            return Vec3::ZERO;
        }
        arrive(
            ctx.position,
            ctx.velocity,
            self.home,
            ctx.max_speed,
            self.radius * 0.25,
        )
        .limited(ctx.max_force)
    }
}

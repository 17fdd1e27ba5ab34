use crate::config::WanderConfig;
use crate::context::BehaviorContext;
use crate::rule::BehaviorRule;
use ecosteer_data::Vec3;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Smooth random heading on the horizontal plane.
///
/// A target point drifts around a circle projected `distance` ahead of the
/// agent; the circle's angle changes by at most `jitter` per tick. Seeded, so
/// a given agent wanders the same way across runs.
#[derive(Debug, Clone)]
pub struct Wander {
    radius: f64,
    distance: f64,
    jitter: f64,
    angle: f64,
    rng: ChaCha8Rng,
}

impl Wander {
    #[must_use]
    pub fn new(config: &WanderConfig, seed: u64) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let angle = rng.gen_range(0.0..std::f64::consts::TAU);
        Self {
            radius: config.radius,
            distance: config.distance,
            jitter: config.jitter,
            angle,
            rng,
        }
    }

    #[must_use]
    pub fn angle(&self) -> f64 {
        self.angle
    }
}

impl BehaviorRule for Wander {
    fn calculate(&mut self, ctx: &BehaviorContext<'_>) -> Vec3 {
        if self.jitter > 0.0 {
            self.angle += self.rng.gen_range(-self.jitter..=self.jitter);
        }
        let heading = if ctx.velocity.x == 0.0 && ctx.velocity.z == 0.0 {
            Vec3::new(0.0, 0.0, 1.0)
        } else {
            Vec3::new(ctx.velocity.x, 0.0, ctx.velocity.z).normalized()
        };
        let center = heading * self.distance;
        let offset = Vec3::new(self.angle.sin(), 0.0, self.angle.cos()) * self.radius;
        let mut force = center + offset;
        force.normalize();
        force.mult(ctx.max_force);
        force
    }
}

//! Classic boids rules over the context's neighbor slice.

use crate::context::BehaviorContext;
use crate::rule::BehaviorRule;
use crate::steering::seek;
use ecosteer_data::Vec3;

/// Pushes away from neighbors closer than `distance`, weighted by 1/d.
#[derive(Debug, Clone)]
pub struct Separation {
    pub distance: f64,
}

impl Separation {
    #[must_use]
    pub fn new(distance: f64) -> Self {
        Self { distance }
    }
}

impl BehaviorRule for Separation {
    fn calculate(&mut self, ctx: &BehaviorContext<'_>) -> Vec3 {
        let mut steer = Vec3::ZERO;
        let mut count = 0usize;
        for other in ctx.neighbors {
            if !other.alive || other.id == ctx.agent.id {
                continue;
            }
            let d = ctx.position.distance_to(other.position);
            if d > 0.0 && d < self.distance {
                let mut away = (ctx.position - other.position).normalized();
                away.div(d);
                steer += away;
                count += 1;
            }
        }
        if count == 0 {
            return Vec3::ZERO;
        }
        steer.div(count as f64);
        if steer.magnitude() > 0.0 {
            steer.normalize();
            steer.mult(ctx.max_speed);
            steer -= ctx.velocity;
            steer.limit(ctx.max_force);
        }
        steer
    }
}

/// Matches the average heading of neighbors within `radius`.
#[derive(Debug, Clone)]
pub struct Alignment {
    pub radius: f64,
}

impl Alignment {
    #[must_use]
    pub fn new(radius: f64) -> Self {
        Self { radius }
    }
}

impl BehaviorRule for Alignment {
    fn calculate(&mut self, ctx: &BehaviorContext<'_>) -> Vec3 {
        let mut heading = Vec3::ZERO;
        let mut count = 0usize;
        for other in ctx.neighbors {
            if !other.alive || other.id == ctx.agent.id {
                continue;
            }
            if ctx.position.distance_to(other.position) <= self.radius {
                heading += other.velocity;
                count += 1;
            }
        }
        if count == 0 || heading.is_zero() {
            return Vec3::ZERO;
        }
        heading.div(count as f64);
        (heading.normalized() * ctx.max_speed - ctx.velocity).limited(ctx.max_force)
    }
}

/// Steers toward the centroid of neighbors within `radius`.
#[derive(Debug, Clone)]
pub struct Cohesion {
    pub radius: f64,
}

impl Cohesion {
    #[must_use]
    pub fn new(radius: f64) -> Self {
        Self { radius }
    }
}

impl BehaviorRule for Cohesion {
    fn calculate(&mut self, ctx: &BehaviorContext<'_>) -> Vec3 {
        let mut center = Vec3::ZERO;
        let mut count = 0usize;
        for other in ctx.neighbors {
            if !other.alive || other.id == ctx.agent.id {
                continue;
            }
            if ctx.position.distance_to(other.position) <= self.radius {
                center += other.position;
                count += 1;
            }
        }
        if count == 0 {
            return Vec3::ZERO;
        }
        center.div(count as f64);
        seek(ctx.position, ctx.velocity, center, ctx.max_speed).limited(ctx.max_force)
    }
}

//! Herd cohesion with the selfish-herd correction, and herd separation.
//!
//! Agents on the edge of a herd are more exposed than those in the middle,
//! and the most vulnerable of them (juveniles, young adults, the injured)
//! push hardest toward the center.

use crate::config::HerdConfig;
use crate::context::BehaviorContext;
use crate::steering::seek;
use ecosteer_data::{AgentView, Vec3};
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct HerdCohesion {
    config: Arc<HerdConfig>,
}

impl HerdCohesion {
    #[must_use]
    pub fn new(config: Arc<HerdConfig>) -> Self {
        Self { config }
    }

    /// Centroid of live members within the cohesion radius of `position`.
    #[must_use]
    pub fn herd_center(&self, position: Vec3, members: &[AgentView]) -> Option<Vec3> {
        let mut center = Vec3::ZERO;
        let mut count = 0usize;
        for member in members {
            if member.alive && position.distance_to(member.position) <= self.config.cohesion_radius
            {
                center += member.position;
                count += 1;
            }
        }
        if count == 0 {
            return None;
        }
        center.div(count as f64);
        Some(center)
    }

    /// How far out `position` sits relative to the average member, in [0, 1].
    ///
    /// Zero up to half the average member-to-center distance, rising
    /// linearly to one at the full average.
    #[must_use]
    pub fn edge_factor(&self, position: Vec3, center: Vec3, members: &[AgentView]) -> f64 {
        if members.is_empty() {
            return 0.0;
        }
        let total: f64 = members.iter().map(|m| m.position.distance_to(center)).sum();
        let half_average = total / members.len() as f64 * 0.5;
        let distance = position.distance_to(center);
        if distance <= half_average || half_average <= 0.0 {
            return 0.0;
        }
        ((distance - half_average) / half_average).clamp(0.0, 1.0)
    }

    /// Exposure of `agent`, in [0, 1].
    ///
    /// Juveniles are fully vulnerable. Young adults start at 0.7 and lose it
    /// linearly by `young_adult_age`. Below half health, the missing half is
    /// added on top.
    #[must_use]
    pub fn vulnerability(&self, agent: &AgentView) -> f64 {
        let mut v = 0.0;
        if agent.juvenile {
            v = 1.0;
        } else if agent.age < self.config.young_adult_age {
            let progress = agent.age as f64 / self.config.young_adult_age as f64;
            v = 0.7 - progress * 0.7;
        }
        let health = agent.health_ratio();
        if health < 0.5 {
            v += 0.5 - health;
        }
        v.clamp(0.0, 1.0)
    }

    /// Seek toward the herd center, amplified for exposed, vulnerable agents.
    pub fn cohesion_force(&self, ctx: &BehaviorContext<'_>, members: &[AgentView]) -> Vec3 {
        let Some(center) = self.herd_center(ctx.position, members) else {
            return Vec3::ZERO;
        };
        let mut force = seek(ctx.position, ctx.velocity, center, ctx.max_speed);
        if self.config.selfish_herd_enabled {
            let edge = self.edge_factor(ctx.position, center, members);
            let vulnerability = self.vulnerability(ctx.agent);
            force.mult(1.0 + edge * vulnerability * self.config.selfish_herd_strength);
        }
        force.mult(self.config.cohesion_strength);
        force.limited(ctx.max_force)
    }

    /// Repulsion from members inside the separation distance, weighted 1/d.
    pub fn separation_force(&self, ctx: &BehaviorContext<'_>, members: &[AgentView]) -> Vec3 {
        let mut steer = Vec3::ZERO;
        let mut count = 0usize;
        for member in members {
            if !member.alive {
                continue;
            }
            let d = ctx.position.distance_to(member.position);
            if d > 0.0 && d < self.config.separation_distance {
                let mut away = (ctx.position - member.position).normalized();
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

    #[must_use]
    pub fn is_at_herd_edge(&self, position: Vec3, members: &[AgentView]) -> bool {
        self.herd_center(position, members)
            .is_some_and(|center| self.edge_factor(position, center, members) > self.config.edge_threshold)
    }
}

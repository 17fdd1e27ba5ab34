//! Reynolds-style steering primitives.
//!
//! Each helper returns a desired-velocity correction (desired minus current
//! velocity). Callers apply their own force cap.

use ecosteer_data::Vec3;

/// Steer toward `target` at full speed.
#[must_use]
pub fn seek(position: Vec3, velocity: Vec3, target: Vec3, max_speed: f64) -> Vec3 {
    let desired = (target - position).normalized() * max_speed;
    desired - velocity
}

/// Steer directly away from `threat` at full speed.
#[must_use]
pub fn flee(position: Vec3, velocity: Vec3, threat: Vec3, max_speed: f64) -> Vec3 {
    let desired = (position - threat).normalized() * max_speed;
    desired - velocity
}

/// Seek that ramps speed down linearly inside `slowing_radius`.
#[must_use]
pub fn arrive(
    position: Vec3,
    velocity: Vec3,
    target: Vec3,
    max_speed: f64,
    slowing_radius: f64,
) -> Vec3 {
    let offset = target - position;
    let distance = offset.magnitude();
    if distance < 1e-3 {
        return -velocity;
    }
    let speed = if slowing_radius > 0.0 && distance < slowing_radius {
        max_speed * (distance / slowing_radius)
    } else {
        max_speed
    };
    offset.normalized() * speed - velocity
}

/// Seek the point where a moving target is predicted to be.
///
/// The look-ahead is distance over closing speed, capped at `max_prediction`.
#[must_use]
pub fn pursue(
    position: Vec3,
    velocity: Vec3,
    target_position: Vec3,
    target_velocity: Vec3,
    max_speed: f64,
    max_prediction: f64,
) -> Vec3 {
    let predicted = predict(position, velocity, target_position, target_velocity, max_prediction);
    seek(position, velocity, predicted, max_speed)
}

/// Flee from where a moving threat is predicted to be.
#[must_use]
pub fn evade(
    position: Vec3,
    velocity: Vec3,
    threat_position: Vec3,
    threat_velocity: Vec3,
    max_speed: f64,
    max_prediction: f64,
) -> Vec3 {
    let predicted = predict(position, velocity, threat_position, threat_velocity, max_prediction);
    flee(position, velocity, predicted, max_speed)
}

fn predict(
    position: Vec3,
    velocity: Vec3,
    target_position: Vec3,
    target_velocity: Vec3,
    max_prediction: f64,
) -> Vec3 {
    let distance = position.distance_to(target_position);
    let closing = velocity.magnitude() + target_velocity.magnitude();
    let lookahead = if closing <= f64::EPSILON {
        0.0
    } else {
        (distance / closing).min(max_prediction.max(0.0))
    };
    target_position + target_velocity * lookahead
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    #[test]
    fn test_seek_from_rest_points_at_target() {
        let force = seek(Vec3::ZERO, Vec3::ZERO, Vec3::new(10.0, 0.0, 0.0), 0.4);
        assert!((force.x - 0.4).abs() < EPS);
        assert!(force.z.abs() < EPS);
    }

    #[test]
    fn test_seek_on_target_brakes() {
        let v = Vec3::new(0.2, 0.0, 0.0);
        let force = seek(Vec3::ZERO, v, Vec3::ZERO, 0.4);
        assert_eq!(force, -v);
    }

    #[test]
    fn test_flee_is_opposite_of_seek_from_rest() {
        let target = Vec3::new(0.0, 0.0, 5.0);
        let s = seek(Vec3::ZERO, Vec3::ZERO, target, 1.0);
        let f = flee(Vec3::ZERO, Vec3::ZERO, target, 1.0);
        assert!((s + f).magnitude() < EPS);
    }

    #[test]
    fn test_arrive_slows_inside_radius() {
        let far = arrive(Vec3::ZERO, Vec3::ZERO, Vec3::new(20.0, 0.0, 0.0), 1.0, 5.0);
        let near = arrive(Vec3::ZERO, Vec3::ZERO, Vec3::new(2.5, 0.0, 0.0), 1.0, 5.0);
        assert!((far.magnitude() - 1.0).abs() < EPS);
        assert!((near.magnitude() - 0.5).abs() < EPS);
    }

    #[test]
    fn test_pursue_leads_moving_target() {
        let force = pursue(
            Vec3::ZERO,
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(10.0, 0.0, 0.0),
            Vec3::new(0.0, 0.0, 1.0),
            1.0,
            5.0,
        );
        // the intercept lies ahead of the target along +z
        assert!(force.z > 0.0);
        assert!(force.x > 0.0);
    }

    #[test]
    fn test_pursue_static_target_equals_seek() {
        let target = Vec3::new(3.0, 0.0, 4.0);
        let p = pursue(Vec3::ZERO, Vec3::ZERO, target, Vec3::ZERO, 1.0, 5.0);
        let s = seek(Vec3::ZERO, Vec3::ZERO, target, 1.0);
        assert!((p - s).magnitude() < EPS);
    }
}

//! Ballistic prediction and threat-avoidance math.
//!
//! Pure functions shared by both AI policies. Nothing in here touches world
//! state; callers pass positions, velocities and projectile snapshots.

use crate::game::constants::ai::{THREAT_HORIZON, THREAT_MISS_DISTANCE, TIME_EPSILON};
use crate::game::types::ProjectileInfo;
use crate::util::vec2::Vec2;

/// An approaching projectile selected by [`nearest_threat`].
#[derive(Debug, Clone, Copy)]
pub struct Threat {
    pub velocity: Vec2,
    pub time_to_impact: f32,
}

/// Unit vector leading a moving target so a projectile fired now at
/// `projectile_speed` intercepts it.
///
/// Solves `|target_pos + target_vel * t - shooter| = projectile_speed * t`
/// for the smallest positive `t`. Falls back to the straight-line direction
/// when the speed is non-positive, the quadratic is degenerate, the
/// discriminant is negative, or no positive root exists.
pub fn lead_target(
    shooter: Vec2,
    target_pos: Vec2,
    target_vel: Vec2,
    projectile_speed: f32,
) -> Vec2 {
    let to_target = target_pos - shooter;
    if projectile_speed <= 0.0 {
        return to_target.normalize_or(Vec2::RIGHT);
    }

    let a = target_vel.length_sq() - projectile_speed * projectile_speed;
    let b = 2.0 * to_target.dot(target_vel);
    let c = to_target.length_sq();

    let t = if a.abs() < 1e-6 {
        if b.abs() > 1e-6 {
            -c / b
        } else {
            0.0
        }
    } else {
        let disc = b * b - 4.0 * a * c;
        if disc < 0.0 {
            0.0
        } else {
            let sqrt_disc = disc.sqrt();
            let t1 = (-b - sqrt_disc) / (2.0 * a);
            let t2 = (-b + sqrt_disc) / (2.0 * a);
            match (t1 > 0.0, t2 > 0.0) {
                (true, true) => t1.min(t2),
                (true, false) => t1,
                (false, true) => t2,
                (false, false) => 0.0,
            }
        }
    };

    let t = t.max(0.0);
    let intercept = target_pos + target_vel * t;
    (intercept - shooter).normalize_or(Vec2::RIGHT)
}

/// Unit repulsion vector steering away from predicted projectile impact
/// points.
///
/// Each projectile reaching its closest approach within one second and
/// passing within 200 units contributes a push away from the predicted
/// closest point, weighted by the inverse of the time to closest approach.
/// With no threat in range the perpendicular of `facing` is returned so the
/// caller always gets a usable strafe direction.
pub fn projectile_dodge(position: Vec2, facing: Vec2, projectiles: &[ProjectileInfo]) -> Vec2 {
    let mut sum = Vec2::ZERO;

    for proj in projectiles {
        let rel = proj.position - position;
        let speed_sq = proj.velocity.length_sq();
        if speed_sq <= 1e-6 {
            continue;
        }
        // Time of closest approach along the projectile's line of motion
        let t = -rel.dot(proj.velocity) / speed_sq;
        if t <= 0.0 || t > THREAT_HORIZON {
            continue;
        }
        let closest = rel + proj.velocity * t;
        if closest.length_sq() > THREAT_MISS_DISTANCE * THREAT_MISS_DISTANCE {
            continue;
        }
        // `closest` is relative to us, so the repulsion is simply away
        // from it; when the predicted point lands on top of us, push
        // sideways off the projectile's path instead.
        let away = (-closest).normalize_or(proj.velocity.perpendicular().normalize());
        sum += away * (1.0 / (t + TIME_EPSILON));
    }

    sum.normalize_or(facing.perpendicular())
}

/// Nearest *approaching* projectile that would pass within the threat
/// window. Receding projectiles are ignored via the inward-velocity filter.
pub fn nearest_threat(position: Vec2, projectiles: &[ProjectileInfo]) -> Option<Threat> {
    let mut closest_t = f32::INFINITY;
    let mut best: Option<Threat> = None;

    for proj in projectiles {
        let rel = proj.position - position;
        let approach = rel.dot(proj.velocity);
        if approach >= 0.0 {
            continue;
        }
        let speed_sq = proj.velocity.length_sq();
        if speed_sq <= 1e-6 {
            continue;
        }
        let t = -approach / speed_sq;
        if t >= closest_t || t > THREAT_HORIZON || t <= 0.0 {
            continue;
        }
        let miss = rel + proj.velocity * t;
        if miss.length_sq() > THREAT_MISS_DISTANCE * THREAT_MISS_DISTANCE {
            continue;
        }
        closest_t = t;
        best = Some(Threat {
            velocity: proj.velocity,
            time_to_impact: t,
        });
    }

    best
}

/// Closest projectile by straight distance, used by distant weapons to shoot
/// down incoming fire while out of range of the enemy.
pub fn nearest_projectile(position: Vec2, projectiles: &[ProjectileInfo]) -> Option<ProjectileInfo> {
    projectiles
        .iter()
        .copied()
        .min_by(|a, b| {
            let da = a.position.distance_sq_to(position);
            let db = b.position.distance_sq_to(position);
            da.partial_cmp(&db).unwrap_or(std::cmp::Ordering::Equal)
        })
}

/// Effective fire range for a weapon: scaled from the projectile speed with
/// `base` as the floor, or just `base` for speedless (contact) weapons.
pub fn attack_range(projectile_speed: f32, factor: f32, base: f32) -> f32 {
    if projectile_speed > 0.0 && factor.is_finite() {
        (projectile_speed * factor).max(base)
    } else if !factor.is_finite() {
        f32::INFINITY
    } else {
        base
    }
}

//! Stateless reactive combat policy.
//!
//! Three styles share the same skeleton: compute the direction to the
//! enemy, a ballistic lead for facing, and a fire decision gated on an
//! 18-degree aim cone. The only state carried across calls is the smoothed
//! dodge vector.

use crate::game::ai::Decision;
use crate::game::constants::ai as tuning;
use crate::game::targeting::{attack_range, lead_target, nearest_threat, projectile_dodge};
use crate::game::types::{EntityId, ProjectileInfo};
use crate::game::view::WorldView;
use crate::util::vec2::Vec2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Style {
    /// Close in while weaving through incoming fire
    Aggressive,
    /// Hold a distance band tuned to own projectile speed
    Kiter,
    /// Keep backing off, weaving through incoming fire
    Evader,
}

/// Very small deterministic combat policy.
#[derive(Debug, Clone)]
pub struct SimplePolicy {
    pub style: Style,
    pub fire_range: f32,
    /// Fire range as a multiple of own projectile speed; `fire_range` is
    /// the floor
    pub fire_range_factor: f32,
    pub vertical_offset: f32,
    pub dodge_bias: f32,
    /// Previous-dodge accumulator for exponential smoothing
    prev_dodge: Vec2,
}

impl SimplePolicy {
    pub fn new(style: Style) -> Self {
        let fire_range_factor = match style {
            Style::Aggressive => 0.0,
            Style::Kiter => tuning::KITER_RANGE_FACTOR,
            Style::Evader => tuning::EVADER_RANGE_FACTOR,
        };
        Self {
            style,
            fire_range: tuning::FIRE_RANGE,
            fire_range_factor,
            vertical_offset: tuning::VERTICAL_OFFSET,
            dodge_bias: tuning::DODGE_BIAS,
            prev_dodge: Vec2::ZERO,
        }
    }

    /// Return acceleration, facing vector and fire decision.
    pub fn decide(&mut self, me: EntityId, view: &dyn WorldView) -> Decision {
        let Some(enemy) = view.enemy_of(me) else {
            return Decision::hold();
        };
        let my_pos = view.position(me);
        let enemy_pos = view.position(enemy);
        let enemy_vel = view.velocity(enemy);
        let delta = enemy_pos - my_pos;
        let dist = delta.length();
        let direction = delta.normalize_or(Vec2::RIGHT);
        let projectile_speed = view.weapon_profile(me).speed;

        let mut face = lead_target(my_pos, enemy_pos, enemy_vel, projectile_speed);

        let my_health = view.health_ratio(me);
        let enemy_health = view.health_ratio(enemy);
        let both_critical =
            my_health < tuning::CRITICAL_HEALTH && enemy_health < tuning::CRITICAL_HEALTH;
        let style = if both_critical {
            Style::Aggressive
        } else {
            self.style
        };

        let projectiles = view.projectiles(Some(me));
        let (mut accel, mut fire) =
            self.attack(style, my_pos, direction, dist, face, projectile_speed, &projectiles);

        // Critically wounded fighters stop pressing, unless the enemy is
        // just as wounded
        if my_health < tuning::CRITICAL_HEALTH && !both_critical {
            accel = -direction * tuning::ACCEL;
            fire = false;
        }

        // An exactly horizontal line of sight would never land a shot on a
        // mirrored opponent; nudge the aim off-axis
        if delta.y.abs() <= tuning::AXIS_EPSILON {
            face = Vec2::new(direction.x, self.vertical_offset).normalize_or(direction);
        }

        Decision {
            accel,
            face,
            fire,
            parry: false,
        }
    }

    /// Movement and fire for one style. Shared with the stateful policy's
    /// attack state.
    pub(crate) fn attack(
        &mut self,
        style: Style,
        my_pos: Vec2,
        direction: Vec2,
        dist: f32,
        face: Vec2,
        projectile_speed: f32,
        projectiles: &[ProjectileInfo],
    ) -> (Vec2, bool) {
        let cos_thresh = tuning::FIRE_CONE_DEG.to_radians().cos();
        match style {
            Style::Aggressive => {
                let dodge = self.smooth_dodge(projectile_dodge(my_pos, direction, projectiles));
                let combined = (direction + dodge * self.dodge_bias).normalize_or(direction);
                let fire = dist <= self.fire_range && direction.dot(face) >= cos_thresh;
                (combined * tuning::ACCEL, fire)
            }
            Style::Kiter => {
                let range = attack_range(projectile_speed, self.fire_range_factor, self.fire_range);
                let desired = if range.is_finite() {
                    range * tuning::KITER_BAND_RATIO
                } else {
                    self.fire_range
                };
                let accel = if dist < desired {
                    -direction * tuning::ACCEL
                } else if dist > range {
                    direction * tuning::ACCEL
                } else {
                    Vec2::ZERO
                };
                let fire = dist <= range && direction.dot(face) >= cos_thresh;
                (accel, fire)
            }
            Style::Evader => {
                let dodge = self.smooth_dodge(projectile_dodge(my_pos, direction, projectiles));
                let combined = (-direction + dodge * self.dodge_bias).normalize_or(-direction);
                let range = attack_range(projectile_speed, self.fire_range_factor, self.fire_range);
                let fire = dist <= range && direction.dot(face) >= cos_thresh;
                (combined * tuning::ACCEL, fire)
            }
        }
    }

    /// Exponentially smooth the raw dodge vector so consecutive decisions
    /// do not whipsaw the trajectory.
    pub(crate) fn smooth_dodge(&mut self, raw: Vec2) -> Vec2 {
        self.prev_dodge =
            self.prev_dodge * (1.0 - tuning::DODGE_SMOOTHING) + raw * tuning::DODGE_SMOOTHING;
        self.prev_dodge.normalize_or(raw)
    }

    /// Dash along the dodge vector when a projectile threat exists.
    pub fn dash_direction(
        &mut self,
        me: EntityId,
        view: &dyn WorldView,
        now: f32,
        can_dash: &dyn Fn(f32) -> bool,
    ) -> Option<Vec2> {
        if !can_dash(now) {
            return None;
        }
        let my_pos = view.position(me);
        let projectiles = view.projectiles(Some(me));
        nearest_threat(my_pos, &projectiles)?;

        let facing = view
            .enemy_of(me)
            .map(|enemy| (view.position(enemy) - my_pos).normalize_or(Vec2::RIGHT))
            .unwrap_or(Vec2::RIGHT);
        Some(projectile_dodge(my_pos, facing, &projectiles))
    }
}

//! Projectile lifecycle: spawned by weapons, stepped every tick, destroyed
//! on timeout, exhausted bounces, or a damaging hit.

use std::collections::VecDeque;
use std::f32::consts::PI;

use crate::game::constants::{combat, projectile as pconst};
use crate::game::types::{Color, Damage, EntityId};
use crate::game::view::WorldView;
use crate::render::{Renderer, SpriteId};
use crate::util::vec2::Vec2;

/// Everything a weapon specifies when firing; owner and id are attached by
/// the view on spawn.
#[derive(Debug, Clone)]
pub struct ProjectileSpec {
    pub position: Vec2,
    pub velocity: Vec2,
    pub radius: f32,
    pub damage: Damage,
    pub knockback: f32,
    pub ttl: f32,
    pub spin: f32,
    pub acceleration: f32,
    pub trail_color: Option<Color>,
    pub sprite: Option<SpriteId>,
}

/// Dynamic projectile with a limited lifetime.
#[derive(Debug, Clone)]
pub struct Projectile {
    pub id: u64,
    pub owner: EntityId,
    pub position: Vec2,
    pub velocity: Vec2,
    pub radius: f32,
    pub damage: Damage,
    pub knockback: f32,
    pub ttl: f32,
    pub max_ttl: f32,
    pub angle: f32,
    pub spin: f32,
    pub acceleration: f32,
    pub trail_color: Option<Color>,
    /// Most-recent-first trail samples, bounded length.
    pub trail: VecDeque<Vec2>,
    pub sprite: Option<SpriteId>,
    pub bounces: u32,
    last_velocity: Vec2,
    pub destroyed: bool,
}

impl Projectile {
    pub fn new(id: u64, owner: EntityId, spec: ProjectileSpec) -> Self {
        Self {
            id,
            owner,
            position: spec.position,
            velocity: spec.velocity,
            radius: spec.radius,
            damage: spec.damage,
            knockback: spec.knockback,
            ttl: spec.ttl,
            max_ttl: spec.ttl,
            angle: spec.velocity.angle() + PI / 2.0,
            spin: spec.spin,
            acceleration: spec.acceleration,
            trail_color: spec.trail_color,
            trail: VecDeque::with_capacity(pconst::TRAIL_LEN),
            sprite: spec.sprite,
            bounces: 0,
            last_velocity: spec.velocity,
            destroyed: false,
        }
    }

    /// Advance state and report whether the projectile is still alive.
    ///
    /// A projectile whose ttl ran out but that has bounced fewer than twice
    /// stays alive; wall-bouncing weapons rely on surviving the first
    /// ricochet.
    pub fn step(&mut self, dt: f32) -> bool {
        self.ttl -= dt;

        // A velocity sign flip on either axis means the physics step
        // reflected us off a wall since the last tick.
        if self.velocity.x * self.last_velocity.x < 0.0
            || self.velocity.y * self.last_velocity.y < 0.0
        {
            self.bounces += 1;
        }
        self.last_velocity = self.velocity;

        if self.acceleration != 0.0 {
            let speed = self.velocity.length();
            if speed > 0.0 {
                let scale = (speed + self.acceleration * dt) / speed;
                self.velocity *= scale;
            }
        }

        if self.spin != 0.0 {
            self.angle = (self.angle + self.spin * dt) % (2.0 * PI);
        } else if self.velocity.length_sq() > 0.0 {
            self.angle = self.velocity.angle() + PI / 2.0;
        }

        if self.trail_color.is_some() {
            if self.trail.len() == pconst::TRAIL_LEN {
                self.trail.pop_back();
            }
            self.trail.push_front(self.position);
        }

        self.ttl > 0.0 || self.bounces < pconst::MIN_BOUNCES
    }

    /// Handle a collision with `target`. Returns true to keep the
    /// projectile alive.
    pub fn on_hit(&mut self, view: &mut dyn WorldView, target: EntityId, timestamp: f32) -> bool {
        if target == self.owner {
            return true;
        }
        // Friendly fire is ignored outright
        if view.team_color(target) == view.team_color(self.owner) {
            return true;
        }

        let mut damage = self.damage;
        if view.health_ratio(self.owner) < combat::CRIT_HEALTH_RATIO {
            damage = damage.scaled(combat::CRIT_MULTIPLIER);
        }
        view.deal_damage(target, damage, timestamp);

        let normal = (view.position(target) - self.position).normalize_or(Vec2::RIGHT);
        view.apply_impulse(target, normal.x * self.knockback, normal.y * self.knockback);
        false
    }

    /// Aim the projectile at `target` preserving speed, reset its lifetime
    /// and hand it to `new_owner`. Used by deflection.
    pub fn retarget(&mut self, target: Vec2, new_owner: EntityId) {
        let dir = (target - self.position).normalize_or(Vec2::RIGHT);
        let speed = self.velocity.length();
        self.velocity = dir * speed;
        self.owner = new_owner;
        self.ttl = self.max_ttl;
        self.angle = dir.angle() + PI / 2.0;
        self.bounces = 0;
        self.last_velocity = self.velocity;
    }

    pub fn draw(&self, renderer: &mut dyn Renderer, team: Color) {
        if let Some(trail_color) = self.trail_color {
            if self.trail.len() > 1 {
                let denom = (self.trail.len() - 1) as f32;
                for (i, pair) in self.trail.iter().zip(self.trail.iter().skip(1)).enumerate() {
                    // Newest segments brightest
                    let t = 1.0 - i as f32 / denom;
                    let color = (
                        (trail_color.0 as f32 * t) as u8,
                        (trail_color.1 as f32 * t) as u8,
                        (trail_color.2 as f32 * t) as u8,
                    );
                    renderer.draw_line(*pair.0, *pair.1, color, 2.0);
                }
            }
        }
        if let Some(sprite) = self.sprite {
            renderer.draw_sprite(sprite, self.position, self.angle, Some(team));
        } else {
            renderer.draw_projectile(self.position, self.radius, (255, 255, 0), team);
        }
    }
}

//! Transient entities created by weapons: orbiting blades and satellites,
//! gravity wells, resonance waves, and the purely cosmetic held/aimed
//! sprites.
//!
//! The set of effects is closed, so the polymorphism is a tagged enum
//! dispatched in `step`/`collides`/`on_hit`; per-variant hit-cooldown state
//! lives with the variant that needs it, not globally.

use std::f32::consts::TAU;

use rustc_hash::{FxHashMap, FxHashSet};

use crate::game::constants::{orbit, wave};
use crate::game::projectile::Projectile;
use crate::game::types::{Color, Damage, EntityId};
use crate::game::view::WorldView;
use crate::render::{Renderer, SpriteId};
use crate::util::vec2::Vec2;

/// Per-target stamp recording when and at what angular travel the target
/// was last hit.
#[derive(Debug, Clone, Copy)]
struct HitStamp {
    time: f32,
    travel: f32,
}

/// Blade rotating around its owner, damaging on contact and deflecting
/// enemy projectiles.
#[derive(Debug)]
pub struct OrbitingBlade {
    pub owner: EntityId,
    pub damage: Damage,
    pub knockback: f32,
    /// Orbit radius around the owner
    pub radius: f32,
    /// Collision radius of the blade tip
    pub hit_radius: f32,
    pub angle: f32,
    /// Angular speed in radians per second
    pub speed: f32,
    pub sprite: SpriteId,
    pub trail_color: Color,
    trail: Vec<Vec2>,
    travel: f32,
    last_hits: FxHashMap<EntityId, HitStamp>,
}

impl OrbitingBlade {
    pub fn new(
        owner: EntityId,
        damage: Damage,
        knockback: f32,
        radius: f32,
        hit_radius: f32,
        speed: f32,
        sprite: SpriteId,
    ) -> Self {
        Self {
            owner,
            damage,
            knockback,
            radius,
            hit_radius,
            angle: 0.0,
            speed,
            sprite,
            trail_color: (255, 255, 255),
            trail: Vec::new(),
            travel: 0.0,
            last_hits: FxHashMap::default(),
        }
    }

    fn tip(&self, view: &dyn WorldView) -> Vec2 {
        let center = view.position(self.owner);
        center + Vec2::from_angle(self.angle) * self.radius
    }

    /// A repeat hit on the same target is blocked until the blade traveled
    /// at least half a turn since the last one, unless the time cooldown
    /// elapsed first.
    fn can_hit(&self, target: EntityId, now: f32) -> bool {
        match self.last_hits.get(&target) {
            None => true,
            Some(stamp) => {
                (self.travel - stamp.travel) >= orbit::MIN_HIT_TRAVEL
                    || (now - stamp.time) >= orbit::HIT_COOLDOWN
            }
        }
    }
}

/// Rectangular satellites orbiting the owner.
#[derive(Debug)]
pub struct OrbitingRect {
    pub owner: EntityId,
    pub damage: Damage,
    /// Angular speed in radians per second
    pub speed: f32,
    pub satellites: Vec<Satellite>,
    travel: f32,
    last_hits: FxHashMap<EntityId, HitStamp>,
}

#[derive(Debug, Clone, Copy)]
pub struct Satellite {
    pub width: f32,
    pub height: f32,
    pub radius: f32,
    pub angle: f32,
}

impl OrbitingRect {
    pub fn new(owner: EntityId, damage: Damage, speed: f32, satellites: Vec<Satellite>) -> Self {
        Self {
            owner,
            damage,
            speed,
            satellites,
            travel: 0.0,
            last_hits: FxHashMap::default(),
        }
    }

    /// Circle-vs-rotated-rect test against one satellite.
    fn satellite_hits(sat: &Satellite, center: Vec2, position: Vec2, radius: f32) -> bool {
        // The rectangle sweeps tangentially, long side perpendicular to the
        // spoke it rides on.
        let rotation = sat.angle + std::f32::consts::FRAC_PI_2;
        let rel = (position - center).rotate(-rotation);
        let cx = rel.x.clamp(-sat.width / 2.0, sat.width / 2.0);
        let cy = rel.y.clamp(-sat.height / 2.0, sat.height / 2.0);
        rel.distance_sq_to(Vec2::new(cx, cy)) <= radius * radius
    }

    fn any_satellite_hits(&self, view: &dyn WorldView, position: Vec2, radius: f32) -> bool {
        let owner_pos = view.position(self.owner);
        self.satellites.iter().any(|sat| {
            let center = owner_pos + Vec2::from_angle(sat.angle) * sat.radius;
            Self::satellite_hits(sat, center, position, radius)
        })
    }

    fn can_hit(&self, target: EntityId, now: f32) -> bool {
        match self.last_hits.get(&target) {
            None => true,
            Some(stamp) => {
                (self.travel - stamp.travel) >= orbit::MIN_HIT_TRAVEL
                    || (now - stamp.time) >= orbit::HIT_COOLDOWN
            }
        }
    }
}

/// Stationary field pulling non-allies inward and damaging them over time.
#[derive(Debug)]
pub struct GravityWellField {
    pub owner: EntityId,
    pub position: Vec2,
    pub radius: f32,
    pub pull_strength: f32,
    pub damage_per_second: f32,
    pub ttl: f32,
    /// Per-target simulated time of the last tick spent inside the field
    last_tick: FxHashMap<EntityId, f32>,
}

impl GravityWellField {
    pub fn new(
        owner: EntityId,
        position: Vec2,
        radius: f32,
        pull_strength: f32,
        damage_per_second: f32,
        ttl: f32,
    ) -> Self {
        Self {
            owner,
            position,
            radius,
            pull_strength,
            damage_per_second,
            ttl,
            last_tick: FxHashMap::default(),
        }
    }
}

/// Expanding ring that reverses at its maximum radius with amplified damage
/// and dies once it contracts past zero. Reflects projectiles it touches.
#[derive(Debug)]
pub struct ResonanceWave {
    pub owner: EntityId,
    pub position: Vec2,
    pub radius: f32,
    pub max_radius: f32,
    pub speed: f32,
    pub damage: Damage,
    pub amplification: f32,
    expanding: bool,
    /// Targets already hit during the current pass
    hit: FxHashSet<EntityId>,
}

impl ResonanceWave {
    pub fn new(
        owner: EntityId,
        position: Vec2,
        max_radius: f32,
        speed: f32,
        damage: Damage,
        amplification: f32,
    ) -> Self {
        Self {
            owner,
            position,
            radius: 0.0,
            max_radius,
            speed,
            damage,
            amplification,
            expanding: true,
            hit: FxHashSet::default(),
        }
    }
}

/// Cosmetic sprite carried at a fixed offset from its owner. Never collides.
#[derive(Debug)]
pub struct HeldSprite {
    pub owner: EntityId,
    pub sprite: SpriteId,
    pub offset: Vec2,
    pub angle: f32,
}

/// Cosmetic sprite held at a distance from its owner, turned toward the
/// current enemy each frame. Never collides.
#[derive(Debug)]
pub struct AimedSprite {
    pub owner: EntityId,
    pub sprite: SpriteId,
    pub offset: f32,
    pub angle: f32,
}

/// Closed sum of all weapon effects.
#[derive(Debug)]
pub enum WeaponEffect {
    OrbitingBlade(OrbitingBlade),
    OrbitingRect(OrbitingRect),
    GravityWell(GravityWellField),
    ResonanceWave(ResonanceWave),
    HeldSprite(HeldSprite),
    AimedSprite(AimedSprite),
}

impl WeaponEffect {
    pub fn owner(&self) -> EntityId {
        match self {
            WeaponEffect::OrbitingBlade(e) => e.owner,
            WeaponEffect::OrbitingRect(e) => e.owner,
            WeaponEffect::GravityWell(e) => e.owner,
            WeaponEffect::ResonanceWave(e) => e.owner,
            WeaponEffect::HeldSprite(e) => e.owner,
            WeaponEffect::AimedSprite(e) => e.owner,
        }
    }

    /// Whether the effect is positioned relative to a living owner and must
    /// be cleaned up when that owner dies. Field effects persist.
    pub fn requires_owner(&self) -> bool {
        !matches!(
            self,
            WeaponEffect::GravityWell(_) | WeaponEffect::ResonanceWave(_)
        )
    }

    /// Advance state; false removes the effect.
    pub fn step(&mut self, dt: f32) -> bool {
        match self {
            WeaponEffect::OrbitingBlade(e) => {
                e.angle = (e.angle + e.speed * dt) % TAU;
                e.travel += e.speed.abs() * dt;
                true
            }
            WeaponEffect::OrbitingRect(e) => {
                for sat in &mut e.satellites {
                    sat.angle = (sat.angle + e.speed * dt) % TAU;
                }
                e.travel += e.speed.abs() * dt;
                true
            }
            WeaponEffect::GravityWell(e) => {
                e.ttl -= dt;
                e.ttl > 0.0
            }
            WeaponEffect::ResonanceWave(e) => {
                if e.expanding {
                    e.radius += e.speed * dt;
                    if e.radius >= e.max_radius {
                        e.radius = e.max_radius;
                        e.expanding = false;
                        // The return pass hits harder and may hit again
                        e.damage = e.damage.scaled(e.amplification);
                        e.hit.clear();
                    }
                    true
                } else {
                    e.radius -= e.speed * dt;
                    e.radius > 0.0
                }
            }
            WeaponEffect::HeldSprite(_) | WeaponEffect::AimedSprite(_) => true,
        }
    }

    /// Collision test against a circle at `position`.
    pub fn collides(&self, view: &dyn WorldView, position: Vec2, radius: f32) -> bool {
        match self {
            WeaponEffect::OrbitingBlade(e) => {
                let reach = e.hit_radius + radius;
                e.tip(view).distance_sq_to(position) <= reach * reach
            }
            WeaponEffect::OrbitingRect(e) => e.any_satellite_hits(view, position, radius),
            WeaponEffect::GravityWell(e) => {
                let reach = e.radius + radius;
                e.position.distance_sq_to(position) <= reach * reach
            }
            WeaponEffect::ResonanceWave(e) => {
                let dist = e.position.distance_to(position);
                (dist - e.radius).abs() <= wave::BAND + radius
            }
            WeaponEffect::HeldSprite(_) | WeaponEffect::AimedSprite(_) => false,
        }
    }

    /// Handle a collision with `target`. Returns true to keep the effect.
    pub fn on_hit(&mut self, view: &mut dyn WorldView, target: EntityId, timestamp: f32) -> bool {
        match self {
            WeaponEffect::OrbitingBlade(e) => {
                if view.team_color(target) == view.team_color(e.owner) {
                    return true;
                }
                if !e.can_hit(target, timestamp) {
                    return true;
                }
                view.deal_damage(target, e.damage, timestamp);
                let normal =
                    (view.position(target) - e.tip(view)).normalize_or(Vec2::RIGHT);
                view.apply_impulse(target, normal.x * e.knockback, normal.y * e.knockback);
                e.last_hits.insert(
                    target,
                    HitStamp {
                        time: timestamp,
                        travel: e.travel,
                    },
                );
                true
            }
            WeaponEffect::OrbitingRect(e) => {
                if view.team_color(target) == view.team_color(e.owner) {
                    return true;
                }
                if !e.can_hit(target, timestamp) {
                    return true;
                }
                view.deal_damage(target, e.damage, timestamp);
                e.last_hits.insert(
                    target,
                    HitStamp {
                        time: timestamp,
                        travel: e.travel,
                    },
                );
                true
            }
            WeaponEffect::GravityWell(e) => {
                if view.team_color(target) == view.team_color(e.owner) {
                    return true;
                }
                // Pull and damage are both prorated by the time this target
                // spent inside the field since its own last tick.
                let elapsed = match e.last_tick.get(&target) {
                    Some(last) => (timestamp - last).max(0.0),
                    None => 0.0,
                };
                if elapsed > 0.0 {
                    let inward =
                        (e.position - view.position(target)).normalize_or(Vec2::RIGHT);
                    view.apply_impulse(
                        target,
                        inward.x * e.pull_strength * elapsed,
                        inward.y * e.pull_strength * elapsed,
                    );
                    view.deal_damage(
                        target,
                        Damage::new(e.damage_per_second * elapsed),
                        timestamp,
                    );
                }
                e.last_tick.insert(target, timestamp);
                true
            }
            WeaponEffect::ResonanceWave(e) => {
                if view.team_color(target) == view.team_color(e.owner) {
                    return true;
                }
                if e.hit.contains(&target) {
                    return true;
                }
                view.deal_damage(target, e.damage, timestamp);
                e.hit.insert(target);
                true
            }
            WeaponEffect::HeldSprite(_) | WeaponEffect::AimedSprite(_) => true,
        }
    }

    /// Whether the effect reflects projectiles that intersect it.
    pub fn deflects(&self) -> bool {
        matches!(
            self,
            WeaponEffect::OrbitingBlade(_)
                | WeaponEffect::OrbitingRect(_)
                | WeaponEffect::ResonanceWave(_)
        )
    }

    /// Reflect `projectile` toward the owner's current enemy, or reverse it
    /// outright when no enemy remains. The projectile changes hands.
    pub fn deflect_projectile(&self, view: &dyn WorldView, projectile: &mut Projectile) {
        let owner = self.owner();
        match view.enemy_of(owner) {
            Some(enemy) => projectile.retarget(view.position(enemy), owner),
            None => {
                projectile.velocity = -projectile.velocity;
                projectile.owner = owner;
                projectile.ttl = projectile.max_ttl;
            }
        }
    }

    pub fn draw(&mut self, renderer: &mut dyn Renderer, view: &dyn WorldView) {
        match self {
            WeaponEffect::OrbitingBlade(e) => {
                let pos = e.tip(view);
                e.trail.push(pos);
                if e.trail.len() > crate::game::constants::projectile::TRAIL_LEN {
                    e.trail.remove(0);
                }
                for pair in e.trail.windows(2) {
                    renderer.draw_line(pair[0], pair[1], e.trail_color, 2.0);
                }
                renderer.draw_sprite(e.sprite, pos, e.angle, None);
            }
            WeaponEffect::OrbitingRect(e) => {
                let owner_pos = view.position(e.owner);
                for sat in &e.satellites {
                    let center = owner_pos + Vec2::from_angle(sat.angle) * sat.radius;
                    renderer.draw_sprite("satellite", center, sat.angle, None);
                }
            }
            WeaponEffect::GravityWell(e) => {
                renderer.draw_ring(e.position, e.radius, (140, 60, 220));
            }
            WeaponEffect::ResonanceWave(e) => {
                renderer.draw_ring(e.position, e.radius, (120, 220, 255));
            }
            WeaponEffect::HeldSprite(e) => {
                let pos = view.position(e.owner) + e.offset;
                renderer.draw_sprite(e.sprite, pos, e.angle, None);
            }
            WeaponEffect::AimedSprite(e) => {
                let owner_pos = view.position(e.owner);
                if let Some(enemy) = view.enemy_of(e.owner) {
                    let to_enemy = view.position(enemy) - owner_pos;
                    e.angle = to_enemy.angle();
                }
                let pos = owner_pos + Vec2::from_angle(e.angle) * e.offset;
                renderer.draw_sprite(e.sprite, pos, e.angle, None);
            }
        }
    }

    /// Clean up when the effect is removed.
    pub fn destroy(&mut self) {
        if let WeaponEffect::OrbitingBlade(e) = self {
            e.trail.clear();
        }
    }
}

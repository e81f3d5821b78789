//! Weapon definitions: cooldown gating, continuous per-frame behavior and
//! the fire hook that spawns projectiles or effects.
//!
//! The roster is a closed set resolved by name at match setup; an unknown
//! name fails immediately with the valid names attached so the caller can
//! retry.

use std::f32::consts::TAU;

use crate::error::MatchError;
use crate::game::constants::{ball, orbit};
use crate::game::effects::{
    AimedSprite, GravityWellField, OrbitingBlade, OrbitingRect, ResonanceWave, Satellite,
    WeaponEffect,
};
use crate::game::projectile::ProjectileSpec;
use crate::game::state::GameEvent;
use crate::game::types::{Damage, EntityId, RangeType, WeaponProfile};
use crate::game::view::WorldView;
use crate::util::vec2::Vec2;

/// Which concrete behavior a [`Weapon`] dispatches to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WeaponKind {
    Katana,
    Knife,
    Shuriken,
    Bazooka,
    GravityWell,
    ResonanceHammer,
    KatanaOrbital,
    ShurikenOrbital,
}

/// All registered weapon names, in registry order.
const WEAPON_NAMES: [&str; 8] = [
    "katana",
    "knife",
    "shuriken",
    "bazooka",
    "gravity_well",
    "resonance_hammer",
    "katana_orbital",
    "shuriken_orbital",
];

/// Speed boost the knife grants its wielder, in units per second.
const KNIFE_SPEED_BONUS: f32 = 120.0;

/// A weapon with a cooldown timer. Continuous behavior (orbiting blades,
/// aimed launchers) runs in `update`; `trigger` fires subject to cooldown.
#[derive(Debug)]
pub struct Weapon {
    pub name: &'static str,
    pub kind: WeaponKind,
    pub cooldown: f32,
    pub damage: Damage,
    /// Projectile speed, or angular speed for orbiting weapons
    pub speed: f32,
    pub range_type: RangeType,
    timer: f32,
    deployed: bool,
}

impl Weapon {
    /// Resolve a weapon by registry name.
    pub fn by_name(name: &str) -> Result<Self, MatchError> {
        let (kind, static_name) = match name {
            "katana" => (WeaponKind::Katana, WEAPON_NAMES[0]),
            "knife" => (WeaponKind::Knife, WEAPON_NAMES[1]),
            "shuriken" => (WeaponKind::Shuriken, WEAPON_NAMES[2]),
            "bazooka" => (WeaponKind::Bazooka, WEAPON_NAMES[3]),
            "gravity_well" => (WeaponKind::GravityWell, WEAPON_NAMES[4]),
            "resonance_hammer" => (WeaponKind::ResonanceHammer, WEAPON_NAMES[5]),
            "katana_orbital" => (WeaponKind::KatanaOrbital, WEAPON_NAMES[6]),
            "shuriken_orbital" => (WeaponKind::ShurikenOrbital, WEAPON_NAMES[7]),
            _ => {
                return Err(MatchError::UnknownWeapon {
                    name: name.to_string(),
                    valid: Self::names().iter().map(|n| n.to_string()).collect(),
                })
            }
        };

        let (cooldown, damage, speed, range_type) = match kind {
            WeaponKind::Katana => (0.0, 18.0, 4.0, RangeType::Contact),
            WeaponKind::Knife => (0.0, 8.0, 12.0, RangeType::Contact),
            WeaponKind::Shuriken => (0.8, 8.0, 500.0, RangeType::Distant),
            // The bazooka wielder closes in while the launcher auto-fires
            WeaponKind::Bazooka => (1.2, 20.0, 300.0, RangeType::Contact),
            WeaponKind::GravityWell => (3.0, 10.0, 0.0, RangeType::Distant),
            WeaponKind::ResonanceHammer => (2.0, 12.0, 120.0, RangeType::Contact),
            WeaponKind::KatanaOrbital => (0.0, 18.0, 4.0, RangeType::Contact),
            WeaponKind::ShurikenOrbital => (0.0, 10.0, 4.0, RangeType::Contact),
        };

        Ok(Self {
            name: static_name,
            kind,
            cooldown,
            damage: Damage::new(damage),
            speed,
            range_type,
            timer: 0.0,
            deployed: false,
        })
    }

    /// Sorted list of valid weapon names.
    pub fn names() -> Vec<&'static str> {
        let mut names = WEAPON_NAMES.to_vec();
        names.sort_unstable();
        names
    }

    /// Range type for a registered name, without building the weapon.
    pub fn range_type_for(name: &str) -> Result<RangeType, MatchError> {
        Ok(Self::by_name(name)?.range_type)
    }

    pub fn profile(&self) -> WeaponProfile {
        WeaponProfile {
            name: self.name,
            speed: self.speed,
            range_type: self.range_type,
            cooldown: self.cooldown,
        }
    }

    pub fn on_cooldown(&self) -> bool {
        self.timer > 0.0
    }

    /// Advance the internal cooldown timer.
    pub fn step(&mut self, dt: f32) {
        if self.timer > 0.0 {
            self.timer = (self.timer - dt).max(0.0);
        }
    }

    /// Continuous per-frame behavior: deploying orbiting effects, carrying
    /// the aimed launcher, auto-firing.
    pub fn update(&mut self, owner: EntityId, view: &mut dyn WorldView, _dt: f32) {
        match self.kind {
            WeaponKind::Katana => {
                if !self.deployed {
                    view.spawn_effect(WeaponEffect::OrbitingBlade(OrbitingBlade::new(
                        owner,
                        self.damage,
                        120.0,
                        orbit::RADIUS,
                        ball::RADIUS * 0.6,
                        self.speed,
                        "katana",
                    )));
                    self.deployed = true;
                }
            }
            WeaponKind::Knife => {
                if !self.deployed {
                    view.spawn_effect(WeaponEffect::OrbitingBlade(OrbitingBlade::new(
                        owner,
                        self.damage,
                        120.0,
                        orbit::RADIUS,
                        ball::RADIUS * 0.5,
                        self.speed,
                        "knife",
                    )));
                    view.add_speed_bonus(owner, KNIFE_SPEED_BONUS);
                    self.deployed = true;
                }
            }
            WeaponKind::KatanaOrbital => {
                if !self.deployed {
                    view.spawn_effect(WeaponEffect::OrbitingRect(OrbitingRect::new(
                        owner,
                        self.damage,
                        self.speed,
                        vec![Satellite {
                            width: 80.0,
                            height: 12.0,
                            radius: 60.0,
                            angle: 0.0,
                        }],
                    )));
                    self.deployed = true;
                }
            }
            WeaponKind::ShurikenOrbital => {
                if !self.deployed {
                    let satellites = (0..3)
                        .map(|i| Satellite {
                            width: 16.0,
                            height: 16.0,
                            radius: 50.0,
                            angle: i as f32 * TAU / 3.0,
                        })
                        .collect();
                    view.spawn_effect(WeaponEffect::OrbitingRect(OrbitingRect::new(
                        owner,
                        self.damage,
                        self.speed,
                        satellites,
                    )));
                    self.deployed = true;
                }
            }
            WeaponKind::Bazooka => {
                if !self.deployed {
                    view.spawn_effect(WeaponEffect::AimedSprite(AimedSprite {
                        owner,
                        sprite: "bazooka",
                        offset: ball::RADIUS * 1.5,
                        angle: 0.0,
                    }));
                    self.deployed = true;
                }
                // Auto-fire at the enemy whenever the launcher is ready
                if let Some(enemy) = view.enemy_of(owner) {
                    if self.timer <= 0.0 {
                        let direction = (view.position(enemy) - view.position(owner))
                            .normalize_or(Vec2::RIGHT);
                        self.fire(owner, view, direction);
                        self.timer = self.cooldown;
                    }
                }
            }
            WeaponKind::Shuriken | WeaponKind::GravityWell | WeaponKind::ResonanceHammer => {}
        }
    }

    /// Attempt to fire facing `direction`; a shot while on cooldown is a
    /// no-op, not an error.
    pub fn trigger(&mut self, owner: EntityId, view: &mut dyn WorldView, direction: Vec2) {
        if self.timer > 0.0 {
            return;
        }
        self.fire(owner, view, direction);
        self.timer = self.cooldown;
    }

    fn fire(&mut self, owner: EntityId, view: &mut dyn WorldView, direction: Vec2) {
        match self.kind {
            WeaponKind::Shuriken => {
                let position = view.position(owner);
                view.spawn_projectile(
                    owner,
                    ProjectileSpec {
                        position,
                        velocity: direction * self.speed,
                        radius: ball::RADIUS / 3.0,
                        damage: self.damage,
                        knockback: 120.0,
                        ttl: 0.8,
                        spin: 12.0,
                        acceleration: 0.0,
                        trail_color: None,
                        sprite: Some("shuriken"),
                    },
                );
                view.push_event(GameEvent::Throw {
                    timestamp: view.time(),
                });
            }
            WeaponKind::Bazooka => {
                let position = view.position(owner);
                view.spawn_projectile(
                    owner,
                    ProjectileSpec {
                        position,
                        velocity: direction * self.speed,
                        radius: ball::RADIUS / 2.0,
                        damage: self.damage,
                        knockback: 200.0,
                        ttl: 1.5,
                        spin: 0.0,
                        acceleration: 0.0,
                        trail_color: Some((255, 200, 50)),
                        sprite: Some("missile"),
                    },
                );
                view.push_event(GameEvent::Throw {
                    timestamp: view.time(),
                });
            }
            WeaponKind::GravityWell => {
                let origin = view.position(owner);
                let target = origin + direction * 120.0;
                view.spawn_effect(WeaponEffect::GravityWell(GravityWellField::new(
                    owner, target, 80.0, 200.0, self.damage.amount, 3.0,
                )));
            }
            WeaponKind::ResonanceHammer => {
                let origin = view.position(owner);
                view.spawn_effect(WeaponEffect::ResonanceWave(ResonanceWave::new(
                    owner,
                    origin,
                    120.0,
                    self.speed,
                    self.damage,
                    2.0,
                )));
            }
            // Orbiting weapons have no fire action; their blades are
            // always out
            WeaponKind::Katana
            | WeaponKind::Knife
            | WeaponKind::KatanaOrbital
            | WeaponKind::ShurikenOrbital => {}
        }
    }
}

//! Core identifier and value types shared across the simulation.

use serde::{Deserialize, Serialize};

use crate::util::vec2::Vec2;

/// Unique identifier for a combatant. Equality and hashing only.
pub type EntityId = uuid::Uuid;

/// RGB team/aura color
pub type Color = (u8, u8, u8);

/// Immutable damage amount. Scaling produces a new value; the original is
/// never mutated in place.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Damage {
    pub amount: f32,
}

impl Damage {
    pub const ZERO: Damage = Damage { amount: 0.0 };

    #[inline]
    pub fn new(amount: f32) -> Self {
        Self { amount }
    }

    /// New damage value scaled by `mult` (critical hits, dash scaling).
    #[inline]
    pub fn scaled(&self, mult: f32) -> Self {
        Self {
            amount: self.amount * mult,
        }
    }
}

/// Per-agent base statistics. `max_speed` can be raised permanently by
/// weapon speed bonuses.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Stats {
    pub max_health: f32,
    pub max_speed: f32,
}

/// Snapshot of an active projectile exposed to AI policies through the view.
#[derive(Debug, Clone, Copy)]
pub struct ProjectileInfo {
    pub owner: EntityId,
    pub position: Vec2,
    pub velocity: Vec2,
}

/// Whether a weapon fights at touch range or from a distance. Drives policy
/// selection and dash behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RangeType {
    Contact,
    Distant,
}

/// Read-only weapon summary exposed to policies via the view.
#[derive(Debug, Clone, Copy)]
pub struct WeaponProfile {
    pub name: &'static str,
    pub speed: f32,
    pub range_type: RangeType,
    pub cooldown: f32,
}

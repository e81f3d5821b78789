//! The narrow world-view contract consumed by AI policies and weapons.
//!
//! Reads take `&self`, writes take `&mut self`. Looking up an id that was
//! never part of the match is a core bug and panics immediately rather than
//! failing silently.

use crate::game::effects::WeaponEffect;
use crate::game::projectile::{Projectile, ProjectileSpec};
use crate::game::state::{GameEvent, WorldState};
use crate::game::types::{Color, Damage, EntityId, ProjectileInfo, WeaponProfile};
use crate::util::vec2::Vec2;

pub trait WorldView {
    /// Nearest living enemy of `owner`, if any remain.
    fn enemy_of(&self, owner: EntityId) -> Option<EntityId>;
    fn position(&self, id: EntityId) -> Vec2;
    fn velocity(&self, id: EntityId) -> Vec2;
    fn health_ratio(&self, id: EntityId) -> f32;
    fn team_color(&self, id: EntityId) -> Color;
    fn weapon_profile(&self, id: EntityId) -> WeaponProfile;
    /// Snapshot of active projectiles, optionally skipping those owned by
    /// `excluding`.
    fn projectiles(&self, excluding: Option<EntityId>) -> Vec<ProjectileInfo>;
    /// Current simulated time in seconds.
    fn time(&self) -> f32;

    fn deal_damage(&mut self, id: EntityId, damage: Damage, timestamp: f32);
    fn apply_impulse(&mut self, id: EntityId, vx: f32, vy: f32);
    /// Permanently raise `id`'s maximum speed.
    fn add_speed_bonus(&mut self, id: EntityId, bonus: f32);
    fn spawn_effect(&mut self, effect: WeaponEffect);
    /// Spawn a projectile owned by `owner`; returns its handle.
    fn spawn_projectile(&mut self, owner: EntityId, spec: ProjectileSpec) -> u64;
    /// Queue a fire-and-forget audio/visual event for the collaborators.
    fn push_event(&mut self, event: GameEvent);
}

/// View implementation backed by the controller's [`WorldState`].
///
/// `profiles` is indexed in ball spawn order. Effects and projectiles
/// spawned mid-tick land in the state's pending lists and are drained by the
/// controller at defined points of the frame.
pub struct MatchView<'a> {
    state: &'a mut WorldState,
    profiles: &'a [WeaponProfile],
    now: f32,
}

impl<'a> MatchView<'a> {
    pub fn new(state: &'a mut WorldState, profiles: &'a [WeaponProfile], now: f32) -> Self {
        Self {
            state,
            profiles,
            now,
        }
    }

    fn index_of(&self, id: EntityId) -> usize {
        self.state
            .ball_index(id)
            .unwrap_or_else(|| panic!("view lookup of unknown entity {id}"))
    }
}

impl WorldView for MatchView<'_> {
    fn enemy_of(&self, owner: EntityId) -> Option<EntityId> {
        self.state.enemy_of(owner)
    }

    fn position(&self, id: EntityId) -> Vec2 {
        self.state.balls[self.index_of(id)].position
    }

    fn velocity(&self, id: EntityId) -> Vec2 {
        self.state.balls[self.index_of(id)].velocity
    }

    fn health_ratio(&self, id: EntityId) -> f32 {
        self.state.balls[self.index_of(id)].health_ratio()
    }

    fn team_color(&self, id: EntityId) -> Color {
        self.state.balls[self.index_of(id)].team
    }

    fn weapon_profile(&self, id: EntityId) -> WeaponProfile {
        self.profiles[self.index_of(id)]
    }

    fn projectiles(&self, excluding: Option<EntityId>) -> Vec<ProjectileInfo> {
        self.state
            .projectiles
            .iter()
            .filter(|p| !p.destroyed && Some(p.owner) != excluding)
            .map(|p| ProjectileInfo {
                owner: p.owner,
                position: p.position,
                velocity: p.velocity,
            })
            .collect()
    }

    fn time(&self) -> f32 {
        self.now
    }

    fn deal_damage(&mut self, id: EntityId, damage: Damage, timestamp: f32) {
        let idx = self.index_of(id);
        let now = self.now;
        let ball = &mut self.state.balls[idx];
        if !ball.alive {
            return;
        }
        // Parry and dash i-frames null the hit entirely
        if ball.parrying || now < ball.invulnerable_until {
            return;
        }

        let position = ball.position;
        let team = ball.team;
        let died = ball.take_damage(damage);

        self.state.events.push(GameEvent::Impact {
            position,
            fatal: died,
            team,
            amount: damage.amount,
        });
        if died {
            self.state.events.push(GameEvent::Explode { id, timestamp });
        } else {
            self.state.events.push(GameEvent::Hit { id, timestamp });
        }
    }

    fn apply_impulse(&mut self, id: EntityId, vx: f32, vy: f32) {
        let idx = self.index_of(id);
        self.state.balls[idx].velocity += Vec2::new(vx, vy);
    }

    fn add_speed_bonus(&mut self, id: EntityId, bonus: f32) {
        let idx = self.index_of(id);
        self.state.balls[idx].stats.max_speed += bonus;
    }

    fn spawn_effect(&mut self, effect: WeaponEffect) {
        self.state.pending_effects.push(effect);
    }

    fn spawn_projectile(&mut self, owner: EntityId, spec: ProjectileSpec) -> u64 {
        let id = self.state.alloc_projectile_id();
        self.state.projectiles.push(Projectile::new(id, owner, spec));
        id
    }

    fn push_event(&mut self, event: GameEvent) {
        self.state.events.push(event);
    }
}

//! Mutable world state owned by the match controller.
//!
//! Holds the fighters, live projectiles and the static arena bounds. AI
//! policies and weapon effects never touch this directly; they go through
//! the view in [`crate::game::view`].

use rustc_hash::FxHashMap;

use crate::game::constants::ball;
use crate::game::projectile::Projectile;
use crate::game::types::{Color, Damage, EntityId, Stats};
use crate::util::vec2::Vec2;

/// Static rectangular arena boundary.
#[derive(Debug, Clone, Copy)]
pub struct Bounds {
    pub width: f32,
    pub height: f32,
    pub wall: f32,
    pub elasticity: f32,
}

impl Bounds {
    pub fn new(width: f32, height: f32, wall: f32, elasticity: f32) -> Self {
        Self {
            width,
            height,
            wall,
            elasticity,
        }
    }
}

/// A combatant ball: dynamic circular body plus combat stats.
#[derive(Debug, Clone)]
pub struct Ball {
    pub id: EntityId,
    pub position: Vec2,
    pub velocity: Vec2,
    pub radius: f32,
    pub stats: Stats,
    pub health: f32,
    pub team: Color,
    pub alive: bool,
    /// Set from the tick's decision; nulls incoming damage while raised.
    pub parrying: bool,
    /// Dash i-frames: damage is ignored until this simulated time.
    pub invulnerable_until: f32,
}

impl Ball {
    pub fn new(position: Vec2, team: Color) -> Self {
        let stats = Stats {
            max_health: ball::MAX_HEALTH,
            max_speed: ball::MAX_SPEED,
        };
        Self {
            id: EntityId::new_v4(),
            position,
            velocity: Vec2::ZERO,
            radius: ball::RADIUS,
            stats,
            health: stats.max_health,
            team,
            alive: true,
            parrying: false,
            invulnerable_until: 0.0,
        }
    }

    /// Apply damage and return true if the ball died.
    pub fn take_damage(&mut self, damage: Damage) -> bool {
        self.health -= damage.amount;
        if self.health <= 0.0 {
            self.health = 0.0;
            self.alive = false;
        }
        !self.alive
    }

    #[inline]
    pub fn health_ratio(&self) -> f32 {
        self.health / self.stats.max_health
    }

    /// Limit velocity to the (possibly boosted) maximum speed.
    pub fn cap_speed(&mut self) {
        self.velocity = self.velocity.clamp_length(self.stats.max_speed);
    }
}

/// Events emitted by the view during resolution, drained by the controller
/// into the renderer and audio collaborators after each tick.
#[derive(Debug, Clone)]
pub enum GameEvent {
    Impact {
        position: Vec2,
        fatal: bool,
        team: Color,
        amount: f32,
    },
    Hit {
        id: EntityId,
        timestamp: f32,
    },
    Explode {
        id: EntityId,
        timestamp: f32,
    },
    Throw {
        timestamp: f32,
    },
    /// Blade touch, deflection or projectile clash
    Touch {
        timestamp: f32,
    },
}

/// All dynamic simulation state.
pub struct WorldState {
    pub balls: Vec<Ball>,
    pub projectiles: Vec<Projectile>,
    /// Effects spawned through the view mid-tick, drained by the controller.
    pub pending_effects: Vec<crate::game::effects::WeaponEffect>,
    pub events: Vec<GameEvent>,
    pub bounds: Bounds,
    /// Unordered projectile-id pairs that recently clashed, mapped to the
    /// simulated time at which they may clash again.
    pub clash_cooldowns: FxHashMap<(u64, u64), f32>,
    next_projectile_id: u64,
}

impl WorldState {
    pub fn new(bounds: Bounds) -> Self {
        Self {
            balls: Vec::new(),
            projectiles: Vec::new(),
            pending_effects: Vec::new(),
            events: Vec::new(),
            bounds,
            clash_cooldowns: FxHashMap::default(),
            next_projectile_id: 1,
        }
    }

    /// Spawn a ball at a fixed position and return its id.
    pub fn spawn_ball(&mut self, position: Vec2, team: Color) -> EntityId {
        let ball = Ball::new(position, team);
        let id = ball.id;
        self.balls.push(ball);
        id
    }

    pub fn alloc_projectile_id(&mut self) -> u64 {
        let id = self.next_projectile_id;
        self.next_projectile_id += 1;
        id
    }

    pub fn ball_index(&self, id: EntityId) -> Option<usize> {
        self.balls.iter().position(|b| b.id == id)
    }

    pub fn ball(&self, id: EntityId) -> Option<&Ball> {
        self.balls.iter().find(|b| b.id == id)
    }

    pub fn ball_mut(&mut self, id: EntityId) -> Option<&mut Ball> {
        self.balls.iter_mut().find(|b| b.id == id)
    }

    /// Number of distinct teams with at least one living ball.
    pub fn alive_teams(&self) -> usize {
        let mut teams: Vec<Color> = Vec::with_capacity(4);
        for b in self.balls.iter().filter(|b| b.alive) {
            if !teams.contains(&b.team) {
                teams.push(b.team);
            }
        }
        teams.len()
    }

    pub fn alive_count(&self) -> usize {
        self.balls.iter().filter(|b| b.alive).count()
    }

    /// Nearest living ball of a different team, if any.
    pub fn enemy_of(&self, owner: EntityId) -> Option<EntityId> {
        let me = self.ball(owner)?;
        self.balls
            .iter()
            .filter(|b| b.alive && b.team != me.team)
            .min_by(|a, b| {
                let da = a.position.distance_sq_to(me.position);
                let db = b.position.distance_sq_to(me.position);
                da.partial_cmp(&db).unwrap_or(std::cmp::Ordering::Equal)
            })
            .map(|b| b.id)
    }
}

//! Dash: a short burst of fixed-speed movement with its own cooldown.
//!
//! A dashing contact fighter deals at most one damaging touch per
//! activation (`has_hit`) and keeps brief invulnerability frames that
//! outlast the dash by one frame.

use crate::game::constants::dash;
use crate::util::vec2::Vec2;

#[derive(Debug, Clone)]
pub struct Dash {
    pub speed: f32,
    pub duration: f32,
    pub cooldown: f32,
    pub is_dashing: bool,
    pub cooldown_end: f32,
    pub invulnerable_until: f32,
    pub has_hit: bool,
    direction: Vec2,
    dash_end: f32,
}

impl Default for Dash {
    fn default() -> Self {
        Self {
            speed: dash::SPEED,
            duration: dash::DURATION,
            cooldown: dash::COOLDOWN,
            is_dashing: false,
            cooldown_end: 0.0,
            invulnerable_until: 0.0,
            has_hit: false,
            direction: Vec2::ZERO,
            dash_end: 0.0,
        }
    }
}

impl Dash {
    /// True if a dash can start at `now`.
    pub fn can_dash(&self, now: f32) -> bool {
        !self.is_dashing && now >= self.cooldown_end
    }

    /// Start a dash in `direction` at `now` if possible. Near-zero
    /// directions are ignored.
    pub fn start(&mut self, direction: Vec2, now: f32) {
        if !self.can_dash(now) {
            return;
        }
        let norm = direction.length();
        if norm <= 1e-6 {
            return;
        }
        self.is_dashing = true;
        self.direction = direction * (1.0 / norm);
        self.dash_end = now + self.duration;
        self.cooldown_end = now + self.cooldown;
        self.invulnerable_until = self.dash_end + dash::INVULNERABILITY_BUFFER;
        self.has_hit = false;
    }

    /// Advance the dash state based on `now`.
    pub fn update(&mut self, now: f32) {
        if self.is_dashing && now >= self.dash_end {
            self.is_dashing = false;
        }
    }

    /// Unit direction of the current dash.
    pub fn direction(&self) -> Vec2 {
        self.direction
    }
}

//! AI policies: a stateless reactive policy and a finite-state-machine
//! policy layered on top of it.

pub mod simple;
pub mod stateful;

pub use simple::{SimplePolicy, Style};
pub use stateful::{policy_for_weapon, Mode, State, StatefulPolicy};

use crate::util::vec2::Vec2;

/// Outcome of one per-tick decision.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Decision {
    pub accel: Vec2,
    pub face: Vec2,
    pub fire: bool,
    pub parry: bool,
}

impl Decision {
    /// Neutral decision used when no enemy remains.
    pub fn hold() -> Self {
        Self {
            accel: Vec2::ZERO,
            face: Vec2::RIGHT,
            fire: false,
            parry: false,
        }
    }
}

/// Physics constants
pub mod physics {
    /// Wall/body restitution (energy-conserving, frictionless arena)
    pub const ELASTICITY: f32 = 1.0;
    /// Integration sub-steps per frame so fast projectiles cannot tunnel
    pub const DEFAULT_SUBSTEPS: u32 = 4;
    /// Frames per second of the simulation and the exported video
    pub const FPS: u32 = 60;
    /// Delta time per frame in seconds
    pub const DT: f32 = 1.0 / 60.0;
}

/// Ball (combatant) constants
pub mod ball {
    /// Radius of a spawned ball in world units
    pub const RADIUS: f32 = 30.0;
    pub const MAX_HEALTH: f32 = 100.0;
    pub const MAX_SPEED: f32 = 400.0;
}

/// AI policy tuning.
/// The epsilons and windows are tuned values carried over verbatim; they are
/// load-bearing for behavioral parity and must not be "cleaned up".
pub mod ai {
    /// Acceleration magnitude applied by every movement decision
    pub const ACCEL: f32 = 400.0;
    /// Aim-alignment cone for firing, in degrees
    pub const FIRE_CONE_DEG: f32 = 18.0;
    /// Base fire range in world units
    pub const FIRE_RANGE: f32 = 150.0;
    /// Health ratio below which an agent retreats
    pub const CRITICAL_HEALTH: f32 = 0.15;
    /// Vertical facing offset applied on a near-horizontal line of sight
    pub const VERTICAL_OFFSET: f32 = 0.1;
    /// Blend weight of the dodge vector against the primary direction
    pub const DODGE_BIAS: f32 = 0.5;
    /// Exponential smoothing factor for the dodge vector across decisions
    pub const DODGE_SMOOTHING: f32 = 0.5;
    /// Only projectiles reaching closest approach within this horizon count
    pub const THREAT_HORIZON: f32 = 1.0;
    /// Only projectiles predicted to pass within this distance count
    pub const THREAT_MISS_DISTANCE: f32 = 200.0;
    /// Kiter fire range as a multiple of own projectile speed
    pub const KITER_RANGE_FACTOR: f32 = 0.6;
    /// Evader fire range as a multiple of own projectile speed
    pub const EVADER_RANGE_FACTOR: f32 = 0.5;
    /// Lower edge of the kiter distance band relative to its fire range
    pub const KITER_BAND_RATIO: f32 = 0.7;
    /// Defensive dashes are suppressed beyond this enemy distance
    pub const DASH_SUPPRESS_DISTANCE: f32 = 150.0;
    /// Axis-lock epsilon on the line of sight
    pub const AXIS_EPSILON: f32 = 1e-6;
    /// Guards the closest-approach weighting against division by zero
    pub const TIME_EPSILON: f32 = 1e-3;
}

/// Dash constants
pub mod dash {
    pub const SPEED: f32 = 800.0;
    pub const DURATION: f32 = 0.2;
    pub const COOLDOWN: f32 = 3.0;
    /// Extra time in seconds after dash end before collisions resume
    pub const INVULNERABILITY_BUFFER: f32 = 1.0 / 60.0;
    /// Dash contact damage multiplier over the weapon's base damage
    pub const DAMAGE_SCALE: f32 = 1.5;
    /// Knockback impulse of a dash ram
    pub const KNOCKBACK: f32 = 200.0;
}

/// Parry constants
pub mod parry {
    /// Time-to-impact window within which a parry nulls incoming damage
    pub const WINDOW: f32 = 0.15;
}

/// Combat resolution constants
pub mod combat {
    /// Owner health ratio below which projectile hits turn critical
    pub const CRIT_HEALTH_RATIO: f32 = 0.25;
    pub const CRIT_MULTIPLIER: f32 = 1.5;
    /// Cooldown before the same projectile pair can clash again
    pub const CLASH_COOLDOWN: f32 = 1.0;
}

/// Projectile constants
pub mod projectile {
    /// A projectile must survive at least this many wall bounces
    pub const MIN_BOUNCES: u32 = 2;
    /// Maximum retained trail samples
    pub const TRAIL_LEN: usize = 8;
}

/// Orbiting blade / satellite constants
pub mod orbit {
    /// Minimum angular travel before the same target can be hit again
    pub const MIN_HIT_TRAVEL: f32 = std::f32::consts::PI;
    /// Time window that alternatively re-allows a hit on the same target
    pub const HIT_COOLDOWN: f32 = 0.5;
    /// Default orbit radius around the owner
    pub const RADIUS: f32 = 60.0;
}

/// Resonance wave constants
pub mod wave {
    /// Half-thickness of the ring's collision band
    pub const BAND: f32 = 10.0;
}

/// Match constants
pub mod game {
    /// Maximum simulated match duration in seconds
    pub const MAX_SECONDS: f32 = 120.0;
    /// Defensive "respect distance" phase before the FSM takes over
    pub const TRANSITION_TIME: f32 = 4.0;
    /// Wall segment thickness
    pub const WALL_THICKNESS: f32 = 10.0;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tick_rate() {
        assert_eq!(physics::FPS, 60);
        assert!((physics::DT - 1.0 / 60.0).abs() < 1e-6);
    }

    #[test]
    fn test_threat_window_values_preserved() {
        // Tuned constants carried over for behavioral parity
        assert_eq!(ai::THREAT_HORIZON, 1.0);
        assert_eq!(ai::THREAT_MISS_DISTANCE, 200.0);
        assert_eq!(ai::AXIS_EPSILON, 1e-6);
        assert_eq!(ai::TIME_EPSILON, 1e-3);
    }

    #[test]
    fn test_parry_window_shorter_than_threat_horizon() {
        assert!(parry::WINDOW < ai::THREAT_HORIZON);
    }

    #[test]
    fn test_dash_outruns_max_speed() {
        assert!(dash::SPEED > ball::MAX_SPEED);
        assert!(dash::DURATION < dash::COOLDOWN);
    }

    #[test]
    fn test_fire_cone_is_acute() {
        assert!(ai::FIRE_CONE_DEG > 0.0);
        assert!(ai::FIRE_CONE_DEG < 90.0);
    }
}

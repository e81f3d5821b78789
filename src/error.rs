//! Error taxonomy for match setup and execution.
//!
//! Setup errors (unknown weapon names) surface before the tick loop ever
//! runs. The simulation timeout is the only fatal condition raised from
//! inside the loop and must never be masked by teardown failures. Looking up
//! a dead or unknown entity id through the world view is a programmer error
//! and panics instead of returning one of these.

use thiserror::Error;

/// Errors produced by match setup and execution.
#[derive(Debug, Error)]
pub enum MatchError {
    /// Raised at setup when a weapon name does not resolve. Carries the
    /// valid names so the caller can retry with a corrected one.
    #[error("unknown weapon '{name}'; valid weapons: {}", .valid.join(", "))]
    UnknownWeapon { name: String, valid: Vec<String> },

    /// The simulated duration limit was exceeded with two or more fighters
    /// still alive. Reported as a failure, never as a draw.
    #[error("match exceeded {max_seconds} s with {alive} fighters alive")]
    Timeout { max_seconds: f32, alive: usize },

    /// A match needs at least two fighters.
    #[error("a match requires at least 2 fighters, got {0}")]
    NotEnoughFighters(usize),

    /// The recorder failed while finalizing a completed match.
    #[error("recorder close failed: {0}")]
    Recorder(String),
}

/// Errors loading the match configuration from a file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config file: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

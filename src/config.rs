use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::game::constants::{game, physics};
use crate::game::types::Color;

/// Match/canvas configuration.
///
/// Defaults target a portrait 1080x1920 canvas at 60 fps. Values can be
/// overridden from a JSON file or from `BB_*` environment variables.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchConfig {
    /// Canvas width in world units (= pixels at export)
    pub width: f32,
    /// Canvas height in world units
    pub height: f32,
    /// Frames per second of the simulation and export
    pub fps: u32,
    /// Thickness of the static boundary walls
    pub wall_thickness: f32,
    /// Maximum simulated match duration in seconds
    pub max_seconds: f32,
    /// Duration of the early defensive phase before policies go offensive
    pub transition_time: f32,
    /// Physics integration sub-steps per frame
    pub substeps: u32,
    /// Base ball fill color
    pub ball_color: Color,
    /// Team aura colors, one per fighter in spawn order
    pub team_colors: Vec<Color>,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            width: 1080.0,
            height: 1920.0,
            fps: physics::FPS,
            wall_thickness: game::WALL_THICKNESS,
            max_seconds: game::MAX_SECONDS,
            transition_time: game::TRANSITION_TIME,
            substeps: physics::DEFAULT_SUBSTEPS,
            ball_color: (220, 220, 220),
            team_colors: vec![(0, 102, 204), (255, 102, 0)],
        }
    }
}

impl MatchConfig {
    /// Frame delta time in seconds
    #[inline]
    pub fn dt(&self) -> f32 {
        1.0 / self.fps as f32
    }

    /// Load config from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let data = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&data)?;
        config
            .validate()
            .map_err(ConfigError::Invalid)?;
        Ok(config)
    }

    /// Load config from environment or use defaults
    pub fn load_or_default() -> Self {
        let mut config = Self::default();

        if let Ok(path) = std::env::var("BB_CONFIG") {
            match Self::from_file(Path::new(&path)) {
                Ok(loaded) => config = loaded,
                Err(e) => tracing::warn!("Failed to load config '{}': {}, using defaults", path, e),
            }
        }

        if let Ok(fps) = std::env::var("BB_FPS") {
            if let Ok(parsed) = fps.parse::<u32>() {
                if parsed > 0 && parsed <= 240 {
                    config.fps = parsed;
                } else {
                    tracing::warn!("BB_FPS must be 1-240, using default");
                }
            } else {
                tracing::warn!("Invalid BB_FPS '{}', using default", fps);
            }
        }

        if let Ok(max) = std::env::var("BB_MAX_SECONDS") {
            if let Ok(parsed) = max.parse::<f32>() {
                if parsed > 0.0 {
                    config.max_seconds = parsed;
                } else {
                    tracing::warn!("BB_MAX_SECONDS must be > 0, using default");
                }
            } else {
                tracing::warn!("Invalid BB_MAX_SECONDS '{}', using default", max);
            }
        }

        config
    }

    /// Validate configuration after loading
    pub fn validate(&self) -> Result<(), String> {
        if self.width <= 0.0 || self.height <= 0.0 {
            return Err("canvas dimensions must be positive".to_string());
        }
        if self.fps == 0 {
            return Err("fps cannot be 0".to_string());
        }
        if self.substeps == 0 {
            return Err("substeps must be at least 1".to_string());
        }
        if self.max_seconds <= 0.0 {
            return Err("max_seconds must be positive".to_string());
        }
        if self.transition_time < 0.0 {
            return Err("transition_time cannot be negative".to_string());
        }
        Ok(())
    }
}

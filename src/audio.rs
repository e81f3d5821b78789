//! Audio collaborator contract.
//!
//! Events are fire-and-forget with a simulated timestamp so a deterministic
//! replay can place them on the exported track. Synthesis and playback live
//! outside the core; the null sink keeps the simulation silent and
//! deterministic.

pub trait AudioSink {
    fn on_hit(&self, timestamp: f32);
    fn on_explode(&self, timestamp: f32);
    fn on_throw(&self, timestamp: f32);
    /// A melee/deflection touch (blade contact, projectile clash).
    fn on_touch(&self, timestamp: f32);
    /// Raw captured samples handed to the recorder at close, if any.
    fn capture(&self) -> Option<Vec<f32>>;
}

/// Silent sink for headless runs.
#[derive(Debug, Default)]
pub struct NullAudio;

impl AudioSink for NullAudio {
    fn on_hit(&self, _timestamp: f32) {}
    fn on_explode(&self, _timestamp: f32) {}
    fn on_throw(&self, _timestamp: f32) {}
    fn on_touch(&self, _timestamp: f32) {}
    fn capture(&self) -> Option<Vec<f32>> {
        None
    }
}

//! Renderer contract consumed by the core.
//!
//! The simulation only issues draw calls keyed by simulated positions; it
//! never reads pixels back. A null implementation keeps the core fully
//! headless for tests and benchmarks.

use crate::game::types::Color;
use crate::util::vec2::Vec2;

/// Identifier of a pre-loaded sprite asset. Asset loading itself lives
/// outside the core.
pub type SpriteId = &'static str;

/// A rendered RGB frame handed to the recorder.
#[derive(Debug, Clone)]
pub struct Frame {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

pub trait Renderer {
    fn clear(&mut self);
    fn draw_ball(&mut self, position: Vec2, radius: f32, fill: Color, aura: Color);
    fn draw_projectile(&mut self, position: Vec2, radius: f32, color: Color, aura: Color);
    fn draw_sprite(&mut self, sprite: SpriteId, position: Vec2, angle: f32, aura: Option<Color>);
    fn draw_line(&mut self, from: Vec2, to: Vec2, color: Color, width: f32);
    fn draw_ring(&mut self, center: Vec2, radius: f32, color: Color);
    /// Queue a short impact flash at `position`.
    fn add_impact(&mut self, position: Vec2, duration: f32);
    /// Update the HP bars, one `(team color, ratio)` pair per fighter.
    fn set_hp(&mut self, ratios: &[(Color, f32)]);
    /// Finish the frame. Returns the rendered frame, or `None` for
    /// renderers that produce no pixels.
    fn present(&mut self) -> Option<Frame>;
}

/// No-op renderer for headless simulation.
#[derive(Debug, Default)]
pub struct NullRenderer;

impl Renderer for NullRenderer {
    fn clear(&mut self) {}
    fn draw_ball(&mut self, _position: Vec2, _radius: f32, _fill: Color, _aura: Color) {}
    fn draw_projectile(&mut self, _position: Vec2, _radius: f32, _color: Color, _aura: Color) {}
    fn draw_sprite(&mut self, _sprite: SpriteId, _position: Vec2, _angle: f32, _aura: Option<Color>) {
    }
    fn draw_line(&mut self, _from: Vec2, _to: Vec2, _color: Color, _width: f32) {}
    fn draw_ring(&mut self, _center: Vec2, _radius: f32, _color: Color) {}
    fn add_impact(&mut self, _position: Vec2, _duration: f32) {}
    fn set_hp(&mut self, _ratios: &[(Color, f32)]) {}
    fn present(&mut self) -> Option<Frame> {
        None
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Debug, Default)]
    pub struct DrawCounts {
        pub balls: usize,
        pub sprites: usize,
        pub impacts: usize,
        pub frames: usize,
    }

    /// Counts draw calls through a shared handle so tests can inspect them
    /// after the controller consumed the renderer.
    #[derive(Debug, Default, Clone)]
    pub struct CountingRenderer {
        pub counts: Rc<RefCell<DrawCounts>>,
    }

    impl Renderer for CountingRenderer {
        fn clear(&mut self) {}
        fn draw_ball(&mut self, _position: Vec2, _radius: f32, _fill: Color, _aura: Color) {
            self.counts.borrow_mut().balls += 1;
        }
        fn draw_projectile(&mut self, _position: Vec2, _radius: f32, _color: Color, _aura: Color) {}
        fn draw_sprite(
            &mut self,
            _sprite: SpriteId,
            _position: Vec2,
            _angle: f32,
            _aura: Option<Color>,
        ) {
            self.counts.borrow_mut().sprites += 1;
        }
        fn draw_line(&mut self, _from: Vec2, _to: Vec2, _color: Color, _width: f32) {}
        fn draw_ring(&mut self, _center: Vec2, _radius: f32, _color: Color) {}
        fn add_impact(&mut self, _position: Vec2, _duration: f32) {
            self.counts.borrow_mut().impacts += 1;
        }
        fn set_hp(&mut self, _ratios: &[(Color, f32)]) {}
        fn present(&mut self) -> Option<Frame> {
            self.counts.borrow_mut().frames += 1;
            None
        }
    }
}

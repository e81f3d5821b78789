pub mod ai;
pub mod constants;
pub mod controller;
pub mod dash;
pub mod effects;
pub mod match_result;
pub mod projectile;
pub mod spatial;
pub mod state;
pub mod systems;
pub mod targeting;
pub mod types;
pub mod view;
pub mod weapons;

//! Physics stepping: integration, wall reflection, ball-vs-ball elastic
//! response and projectile clashes.
//!
//! The frame delta is divided into sub-steps so fast projectiles cannot
//! tunnel through walls or each other; every sub-step re-resolves
//! collisions against a freshly rebuilt spatial grid. Bodies never damage
//! each other here; damage flows exclusively through weapons, projectiles
//! and effects during resolution.

use smallvec::SmallVec;

use crate::game::constants::combat;
use crate::game::spatial::{ShapeRef, SpatialGrid};
use crate::game::state::{Bounds, GameEvent, WorldState};
use crate::util::vec2::Vec2;

/// Advance the physics simulation by one frame of `dt` seconds split into
/// `substeps` integration sub-steps.
pub fn step(state: &mut WorldState, grid: &mut SpatialGrid, dt: f32, substeps: u32, now: f32) {
    assert!(substeps >= 1, "substeps must be >= 1");

    let sub_dt = dt / substeps as f32;
    for _ in 0..substeps {
        integrate(state, sub_dt);
        resolve_walls(state);
        rebuild_grid(grid, state);
        resolve_ball_collisions(state, grid);
        resolve_projectile_clashes(state, grid, now);
    }

    state.clash_cooldowns.retain(|_, expiry| *expiry > now);
}

fn integrate(state: &mut WorldState, dt: f32) {
    for ball in &mut state.balls {
        if !ball.alive {
            continue;
        }
        ball.position += ball.velocity * dt;
    }
    for proj in &mut state.projectiles {
        proj.position += proj.velocity * dt;
    }
}

/// Reflect a body off the arena walls: velocity mirrored about the wall
/// normal scaled by the wall elasticity, position clamped inside.
fn bounce(position: &mut Vec2, velocity: &mut Vec2, radius: f32, bounds: &Bounds) {
    let min_x = bounds.wall + radius;
    let max_x = bounds.width - bounds.wall - radius;
    let min_y = bounds.wall + radius;
    let max_y = bounds.height - bounds.wall - radius;

    if position.x < min_x {
        position.x = min_x;
        if velocity.x < 0.0 {
            velocity.x = -velocity.x * bounds.elasticity;
        }
    } else if position.x > max_x {
        position.x = max_x;
        if velocity.x > 0.0 {
            velocity.x = -velocity.x * bounds.elasticity;
        }
    }

    if position.y < min_y {
        position.y = min_y;
        if velocity.y < 0.0 {
            velocity.y = -velocity.y * bounds.elasticity;
        }
    } else if position.y > max_y {
        position.y = max_y;
        if velocity.y > 0.0 {
            velocity.y = -velocity.y * bounds.elasticity;
        }
    }
}

fn resolve_walls(state: &mut WorldState) {
    let bounds = state.bounds;
    for ball in &mut state.balls {
        if !ball.alive {
            continue;
        }
        bounce(&mut ball.position, &mut ball.velocity, ball.radius, &bounds);
    }
    for proj in &mut state.projectiles {
        bounce(&mut proj.position, &mut proj.velocity, proj.radius, &bounds);
    }
}

fn rebuild_grid(grid: &mut SpatialGrid, state: &WorldState) {
    grid.clear();
    for (i, ball) in state.balls.iter().enumerate() {
        if ball.alive {
            grid.insert(ShapeRef::Ball(i), ball.position, ball.radius);
        }
    }
    for (i, proj) in state.projectiles.iter().enumerate() {
        if !proj.destroyed {
            grid.insert(ShapeRef::Projectile(i), proj.position, proj.radius);
        }
    }
}

/// Elastic ball-vs-ball response: positional separation plus an exchange of
/// the normal velocity components (equal masses). No damage.
fn resolve_ball_collisions(state: &mut WorldState, grid: &SpatialGrid) {
    for i in 0..state.balls.len() {
        if !state.balls[i].alive {
            continue;
        }
        let (pos, radius) = (state.balls[i].position, state.balls[i].radius);

        let mut partners: SmallVec<[usize; 4]> = SmallVec::new();
        for candidate in grid.query_circle(pos, radius) {
            if let ShapeRef::Ball(j) = candidate {
                if j > i && !partners.contains(&j) {
                    partners.push(j);
                }
            }
        }

        for j in partners {
            if !state.balls[j].alive {
                continue;
            }
            let (left, right) = state.balls.split_at_mut(j);
            let a = &mut left[i];
            let b = &mut right[0];

            let delta = b.position - a.position;
            let dist_sq = delta.length_sq();
            if dist_sq == 0.0 {
                continue;
            }
            let dist = dist_sq.sqrt();
            let overlap = (a.radius + b.radius) - dist;
            if overlap <= 0.0 {
                continue;
            }

            let normal = delta * (1.0 / dist);
            let shift = overlap / 2.0;
            a.position -= normal * shift;
            b.position += normal * shift;

            let va_n = a.velocity.dot(normal);
            let vb_n = b.velocity.dot(normal);
            a.velocity += normal * (vb_n - va_n);
            b.velocity += normal * (va_n - vb_n);
        }
    }
}

/// Projectile-vs-projectile clash: on overlap the two swap owners and
/// reverse course. A per-pair cooldown prevents the freshly swapped pair
/// from immediately re-triggering.
fn resolve_projectile_clashes(state: &mut WorldState, grid: &SpatialGrid, now: f32) {
    for i in 0..state.projectiles.len() {
        if state.projectiles[i].destroyed {
            continue;
        }
        let (pos, radius) = (state.projectiles[i].position, state.projectiles[i].radius);

        let mut partners: SmallVec<[usize; 4]> = SmallVec::new();
        for candidate in grid.query_circle(pos, radius) {
            if let ShapeRef::Projectile(j) = candidate {
                if j > i && !partners.contains(&j) {
                    partners.push(j);
                }
            }
        }

        for j in partners {
            if state.projectiles[j].destroyed {
                continue;
            }
            if state.projectiles[i].owner == state.projectiles[j].owner {
                continue;
            }

            let other = &state.projectiles[j];
            let reach = radius + other.radius;
            if pos.distance_sq_to(other.position) > reach * reach {
                continue;
            }

            let (id_a, id_b) = (state.projectiles[i].id, state.projectiles[j].id);
            let key = (id_a.min(id_b), id_a.max(id_b));
            if state
                .clash_cooldowns
                .get(&key)
                .is_some_and(|expiry| now < *expiry)
            {
                continue;
            }

            let owner_i = state.projectiles[i].owner;
            state.projectiles[i].owner = state.projectiles[j].owner;
            state.projectiles[j].owner = owner_i;
            state.projectiles[i].velocity = -state.projectiles[i].velocity;
            state.projectiles[j].velocity = -state.projectiles[j].velocity;

            state
                .clash_cooldowns
                .insert(key, now + combat::CLASH_COOLDOWN);
            state.events.push(GameEvent::Touch { timestamp: now });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::projectile::{Projectile, ProjectileSpec};
    use crate::game::types::{Damage, EntityId};

    const DT: f32 = 1.0 / 60.0;

    fn test_state() -> WorldState {
        WorldState::new(Bounds::new(1000.0, 1000.0, 10.0, 1.0))
    }

    fn spawn_projectile(state: &mut WorldState, owner: EntityId, pos: Vec2, vel: Vec2) -> u64 {
        let id = state.alloc_projectile_id();
        state.projectiles.push(Projectile::new(
            id,
            owner,
            ProjectileSpec {
                position: pos,
                velocity: vel,
                radius: 10.0,
                damage: Damage::new(8.0),
                knockback: 120.0,
                ttl: 0.8,
                spin: 0.0,
                acceleration: 0.0,
                trail_color: None,
                sprite: None,
            },
        ));
        id
    }

    #[test]
    fn test_position_integration() {
        let mut state = test_state();
        let id = state.spawn_ball(Vec2::new(500.0, 500.0), (1, 0, 0));
        state.ball_mut(id).unwrap().velocity = Vec2::new(60.0, 0.0);
        let mut grid = SpatialGrid::default();

        step(&mut state, &mut grid, DT, 4, 0.0);

        let pos = state.ball(id).unwrap().position;
        assert!((pos.x - 501.0).abs() < 1e-3);
    }

    #[test]
    fn test_dead_balls_do_not_move() {
        let mut state = test_state();
        let id = state.spawn_ball(Vec2::new(500.0, 500.0), (1, 0, 0));
        state.ball_mut(id).unwrap().velocity = Vec2::new(60.0, 0.0);
        state.ball_mut(id).unwrap().alive = false;
        let mut grid = SpatialGrid::default();

        step(&mut state, &mut grid, DT, 1, 0.0);

        assert_eq!(state.ball(id).unwrap().position, Vec2::new(500.0, 500.0));
    }

    #[test]
    #[should_panic(expected = "substeps")]
    fn test_zero_substeps_is_a_bug() {
        let mut state = test_state();
        let mut grid = SpatialGrid::default();
        step(&mut state, &mut grid, DT, 0, 0.0);
    }

    #[test]
    fn test_wall_reflection_conserves_speed() {
        let mut state = test_state();
        let id = state.spawn_ball(Vec2::new(45.0, 500.0), (1, 0, 0));
        state.ball_mut(id).unwrap().velocity = Vec2::new(-400.0, 30.0);
        let mut grid = SpatialGrid::default();

        step(&mut state, &mut grid, DT, 4, 0.0);

        let ball = state.ball(id).unwrap();
        assert!(ball.velocity.x > 0.0, "x velocity reflected");
        assert!((ball.velocity.length() - Vec2::new(400.0, 30.0).length()).abs() < 1e-3);
        assert!(ball.position.x >= 10.0 + ball.radius);
    }

    #[test]
    fn test_fast_projectile_stays_in_bounds() {
        let mut state = test_state();
        let owner = EntityId::new_v4();
        // 6000 units/s crosses several cells per frame; sub-stepping keeps
        // it inside the arena
        spawn_projectile(&mut state, owner, Vec2::new(500.0, 500.0), Vec2::new(6000.0, 0.0));
        let mut grid = SpatialGrid::default();

        for _ in 0..10 {
            step(&mut state, &mut grid, DT, 8, 0.0);
        }

        let p = &state.projectiles[0];
        assert!(p.position.x >= 10.0 && p.position.x <= 990.0);
        assert!(p.velocity.x.abs() > 1.0);
    }

    #[test]
    fn test_ball_collision_elastic_exchange() {
        let mut state = test_state();
        let a = state.spawn_ball(Vec2::new(450.0, 500.0), (1, 0, 0));
        let b = state.spawn_ball(Vec2::new(505.0, 500.0), (0, 0, 1));
        state.ball_mut(a).unwrap().velocity = Vec2::new(100.0, 0.0);
        let mut grid = SpatialGrid::default();

        step(&mut state, &mut grid, DT, 1, 0.0);

        // Head-on equal-mass hit: the mover stops, the target takes the
        // velocity
        let va = state.ball(a).unwrap().velocity;
        let vb = state.ball(b).unwrap().velocity;
        assert!(va.x.abs() < 1e-3, "moving ball stopped, got {va:?}");
        assert!((vb.x - 100.0).abs() < 1e-3, "target ball moving, got {vb:?}");

        // No damage from bare body contact
        assert_eq!(state.ball(a).unwrap().health, 100.0);
        assert_eq!(state.ball(b).unwrap().health, 100.0);
    }

    #[test]
    fn test_ball_overlap_separated() {
        let mut state = test_state();
        let a = state.spawn_ball(Vec2::new(500.0, 500.0), (1, 0, 0));
        let b = state.spawn_ball(Vec2::new(520.0, 500.0), (0, 0, 1));
        let mut grid = SpatialGrid::default();

        step(&mut state, &mut grid, DT, 1, 0.0);

        let dist = state
            .ball(a)
            .unwrap()
            .position
            .distance_to(state.ball(b).unwrap().position);
        assert!(dist >= 59.9, "overlapping balls pushed apart, dist {dist}");
    }

    #[test]
    fn test_projectile_clash_swaps_owners() {
        let mut state = test_state();
        let owner_a = EntityId::new_v4();
        let owner_b = EntityId::new_v4();
        spawn_projectile(&mut state, owner_a, Vec2::new(495.0, 500.0), Vec2::new(200.0, 0.0));
        spawn_projectile(&mut state, owner_b, Vec2::new(510.0, 500.0), Vec2::new(-200.0, 0.0));
        let mut grid = SpatialGrid::default();

        step(&mut state, &mut grid, DT, 1, 0.0);

        assert_eq!(state.projectiles[0].owner, owner_b);
        assert_eq!(state.projectiles[1].owner, owner_a);
        assert!(state.projectiles[0].velocity.x < 0.0);
        assert!(state.projectiles[1].velocity.x > 0.0);
        assert!(state
            .events
            .iter()
            .any(|e| matches!(e, GameEvent::Touch { .. })));
    }

    #[test]
    fn test_clash_cooldown_blocks_retrigger() {
        let mut state = test_state();
        let owner_a = EntityId::new_v4();
        let owner_b = EntityId::new_v4();
        spawn_projectile(&mut state, owner_a, Vec2::new(495.0, 500.0), Vec2::new(10.0, 0.0));
        spawn_projectile(&mut state, owner_b, Vec2::new(505.0, 500.0), Vec2::new(-10.0, 0.0));
        let mut grid = SpatialGrid::default();

        // Slow projectiles stay overlapped across several frames: the pair
        // must swap exactly once within the cooldown window
        step(&mut state, &mut grid, DT, 1, 0.0);
        assert_eq!(state.projectiles[0].owner, owner_b);

        step(&mut state, &mut grid, DT, 1, 0.1);
        assert_eq!(
            state.projectiles[0].owner, owner_b,
            "cooldown must prevent a second swap"
        );

        // After the cooldown expires they may clash again
        step(&mut state, &mut grid, DT, 1, 1.2);
        assert_eq!(state.projectiles[0].owner, owner_a);
    }

    #[test]
    fn test_same_owner_projectiles_never_clash() {
        let mut state = test_state();
        let owner = EntityId::new_v4();
        spawn_projectile(&mut state, owner, Vec2::new(495.0, 500.0), Vec2::new(10.0, 0.0));
        spawn_projectile(&mut state, owner, Vec2::new(505.0, 500.0), Vec2::new(-10.0, 0.0));
        let mut grid = SpatialGrid::default();

        step(&mut state, &mut grid, DT, 1, 0.0);

        assert_eq!(state.projectiles[0].owner, owner);
        assert!(state.projectiles[0].velocity.x > 0.0, "no reversal");
    }
}

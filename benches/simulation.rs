//! Simulation benchmarks for battleballs
//!
//! Measures the physics step in isolation and full simulated matches, to
//! keep one frame comfortably under the 60 fps budget.
//!
//! Run with: cargo bench --bench simulation

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use battleballs::audio::NullAudio;
use battleballs::config::MatchConfig;
use battleballs::game::constants::physics::DT;
use battleballs::game::controller::{FighterSpec, MatchController};
use battleballs::game::projectile::{Projectile, ProjectileSpec};
use battleballs::game::spatial::SpatialGrid;
use battleballs::game::state::{Bounds, WorldState};
use battleballs::game::systems::physics;
use battleballs::game::types::Damage;
use battleballs::recorder::NullRecorder;
use battleballs::render::NullRenderer;
use battleballs::util::vec2::Vec2;

/// Arena populated with balls on a ring and projectiles criss-crossing it.
fn create_state(balls: usize, projectiles: usize) -> WorldState {
    let mut state = WorldState::new(Bounds::new(1080.0, 1920.0, 10.0, 1.0));
    let center = Vec2::new(540.0, 960.0);

    let mut ids = Vec::new();
    for i in 0..balls {
        let angle = std::f32::consts::TAU * i as f32 / balls as f32;
        let team = ((i % 2) as u8, 0, 255 - (i % 2) as u8);
        let id = state.spawn_ball(center + Vec2::from_angle(angle) * 300.0, team);
        state.ball_mut(id).unwrap().velocity = Vec2::from_angle(angle + 1.0) * 200.0;
        ids.push(id);
    }

    for i in 0..projectiles {
        let angle = std::f32::consts::TAU * i as f32 / projectiles.max(1) as f32;
        let pid = state.alloc_projectile_id();
        let owner = ids[i % ids.len()];
        state.projectiles.push(Projectile::new(
            pid,
            owner,
            ProjectileSpec {
                position: center + Vec2::from_angle(angle) * 150.0,
                velocity: Vec2::from_angle(angle) * 500.0,
                radius: 10.0,
                damage: Damage::new(8.0),
                knockback: 120.0,
                ttl: 10.0,
                spin: 12.0,
                acceleration: 0.0,
                trail_color: None,
                sprite: None,
            },
        ));
    }
    state
}

fn bench_physics_step(c: &mut Criterion) {
    let mut group = c.benchmark_group("physics_step");
    for (balls, projectiles) in [(2, 4), (8, 16), (16, 64)] {
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{balls}b_{projectiles}p")),
            &(balls, projectiles),
            |b, &(balls, projectiles)| {
                let mut state = create_state(balls, projectiles);
                let mut grid = SpatialGrid::default();
                b.iter(|| {
                    physics::step(black_box(&mut state), &mut grid, DT, 4, 0.0);
                });
            },
        );
    }
    group.finish();
}

fn bench_full_match(c: &mut Criterion) {
    let mut group = c.benchmark_group("full_match");
    group.sample_size(10);

    for matchup in [("katana", "shuriken"), ("bazooka", "bazooka")] {
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{}_vs_{}", matchup.0, matchup.1)),
            &matchup,
            |b, &(weapon_a, weapon_b)| {
                b.iter(|| {
                    let config = MatchConfig {
                        max_seconds: 5.0,
                        transition_time: 1.0,
                        ..Default::default()
                    };
                    let specs = [
                        FighterSpec {
                            weapon: weapon_a.to_string(),
                            team: (0, 102, 204),
                        },
                        FighterSpec {
                            weapon: weapon_b.to_string(),
                            team: (255, 102, 0),
                        },
                    ];
                    let mut controller = MatchController::new(
                        config,
                        &specs,
                        42,
                        Box::new(NullRenderer),
                        Box::new(NullAudio),
                        Box::new(NullRecorder),
                    )
                    .unwrap();
                    // Short matches usually hit the 5 s cap; the timeout
                    // path is as representative as a win
                    let _ = black_box(controller.run());
                });
            },
        );
    }
    group.finish();
}

criterion_group!(benches, bench_physics_step, bench_full_match);
criterion_main!(benches);

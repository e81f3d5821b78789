//! Match controller: owns the fighters, the effect list and the physics
//! world, and drives the per-frame order of AI decisions, dash and weapon
//! updates, physics stepping, collision resolution and rendering.

use tracing::{debug, info, warn};

use crate::audio::AudioSink;
use crate::config::MatchConfig;
use crate::error::MatchError;
use crate::game::ai::{policy_for_weapon, StatefulPolicy};
use crate::game::constants::dash as dash_tuning;
use crate::game::dash::Dash;
use crate::game::effects::WeaponEffect;
use crate::game::match_result::{check_match_end, MatchEndReason, MatchOutcome};
use crate::game::spatial::SpatialGrid;
use crate::game::state::{Bounds, GameEvent, WorldState};
use crate::game::systems::physics;
use crate::game::types::{Color, EntityId, RangeType, WeaponProfile};
use crate::game::view::{MatchView, WorldView};
use crate::game::weapons::Weapon;
use crate::recorder::Recorder;
use crate::render::Renderer;
use crate::util::vec2::Vec2;

/// One fighter requested at match setup.
#[derive(Debug, Clone)]
pub struct FighterSpec {
    pub weapon: String,
    pub team: Color,
}

/// Runtime companion data for one ball, index-aligned with the state's
/// ball list.
struct Fighter {
    id: EntityId,
    weapon: Weapon,
    policy: StatefulPolicy,
    dash: Dash,
    face: Vec2,
}

pub struct MatchController {
    config: MatchConfig,
    state: WorldState,
    fighters: Vec<Fighter>,
    profiles: Vec<WeaponProfile>,
    effects: Vec<WeaponEffect>,
    grid: SpatialGrid,
    renderer: Box<dyn Renderer>,
    audio: Box<dyn AudioSink>,
    recorder: Box<dyn Recorder>,
    elapsed: f32,
    frames: u64,
}

impl std::fmt::Debug for MatchController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MatchController")
            .field("elapsed", &self.elapsed)
            .field("frames", &self.frames)
            .finish_non_exhaustive()
    }
}

impl MatchController {
    /// Set up a match. Weapon names are resolved here so an unknown name
    /// fails before the tick loop ever runs.
    pub fn new(
        config: MatchConfig,
        specs: &[FighterSpec],
        seed: u64,
        renderer: Box<dyn Renderer>,
        audio: Box<dyn AudioSink>,
        recorder: Box<dyn Recorder>,
    ) -> Result<Self, MatchError> {
        if specs.len() < 2 {
            return Err(MatchError::NotEnoughFighters(specs.len()));
        }
        let mut teams: Vec<Color> = Vec::new();
        for spec in specs {
            if !teams.contains(&spec.team) {
                teams.push(spec.team);
            }
        }
        if teams.len() < 2 {
            return Err(MatchError::NotEnoughFighters(teams.len()));
        }

        let bounds = Bounds::new(config.width, config.height, config.wall_thickness, 1.0);
        let mut state = WorldState::new(bounds);

        let center = Vec2::new(config.width / 2.0, config.height / 2.0);
        let spawn_radius = config.width.min(config.height) * 0.3;

        let mut fighters = Vec::with_capacity(specs.len());
        let mut profiles = Vec::with_capacity(specs.len());

        for (i, spec) in specs.iter().enumerate() {
            let weapon = Weapon::by_name(&spec.weapon)?;

            // The matchup policy is tuned against the first enemy team's
            // weapon
            let enemy_weapon = specs
                .iter()
                .find(|other| other.team != spec.team)
                .map(|other| other.weapon.as_str())
                .expect("at least two teams verified above");

            let angle = std::f32::consts::TAU * i as f32 / specs.len() as f32;
            let position = center + Vec2::from_angle(angle) * spawn_radius;
            let id = state.spawn_ball(position, spec.team);

            let fighter_seed = seed.wrapping_add((i as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15));
            let policy =
                policy_for_weapon(&spec.weapon, enemy_weapon, config.transition_time, fighter_seed)?;

            profiles.push(weapon.profile());
            fighters.push(Fighter {
                id,
                weapon,
                policy,
                dash: Dash::default(),
                face: (center - position).normalize_or(Vec2::RIGHT),
            });
        }

        Ok(Self {
            config,
            state,
            fighters,
            profiles,
            effects: Vec::new(),
            grid: SpatialGrid::default(),
            renderer,
            audio,
            recorder,
            elapsed: 0.0,
            frames: 0,
        })
    }

    /// Execute the match to completion.
    ///
    /// The recorder is always closed, but a teardown failure never masks a
    /// simulation error: on the timeout path the close error is only
    /// logged and the timeout is what propagates.
    pub fn run(&mut self) -> Result<MatchOutcome, MatchError> {
        let result = self.run_loop();
        let teardown = self.recorder.close(self.audio.capture());
        match (result, teardown) {
            (Ok(outcome), Ok(())) => Ok(outcome),
            (Ok(_), Err(err)) => Err(MatchError::Recorder(err.to_string())),
            (Err(err), Ok(())) => Err(err),
            (Err(err), Err(teardown_err)) => {
                warn!("recorder close failed after match error: {teardown_err}");
                Err(err)
            }
        }
    }

    fn run_loop(&mut self) -> Result<MatchOutcome, MatchError> {
        info!(
            fighters = self.fighters.len(),
            weapons = ?self.fighters.iter().map(|f| f.weapon.name).collect::<Vec<_>>(),
            "match start"
        );

        loop {
            match check_match_end(&self.state, self.elapsed, self.config.max_seconds) {
                Some(MatchEndReason::LastTeamStanding) => break,
                Some(MatchEndReason::TimeLimit) => {
                    return Err(MatchError::Timeout {
                        max_seconds: self.config.max_seconds,
                        alive: self.state.alive_count(),
                    });
                }
                None => self.tick(),
            }
        }

        // Freeze the survivors for the end screen
        for ball in &mut self.state.balls {
            ball.velocity = Vec2::ZERO;
        }

        let winner_index = self.state.balls.iter().position(|b| b.alive);
        let winner = winner_index.map(|i| self.state.balls[i].id);
        let winner_weapon = winner_index.map(|i| self.fighters[i].weapon.name.to_string());
        let outcome = MatchOutcome {
            winner,
            winner_weapon,
            duration: self.elapsed,
            frames: self.frames,
            survivors: self.state.alive_count(),
        };
        info!(
            winner = ?outcome.winner_weapon,
            duration = outcome.duration,
            "match finished"
        );
        Ok(outcome)
    }

    /// One simulation frame: decisions, weapons, dashes, physics,
    /// resolution, rendering.
    fn tick(&mut self) {
        let dt = self.config.dt();
        let now = self.elapsed;

        self.decide_and_act(dt, now);
        self.step_lifecycles(dt);
        physics::step(&mut self.state, &mut self.grid, dt, self.config.substeps, now);
        self.resolve_collisions(now);
        self.drain_events(now);
        self.render();

        self.frames += 1;
        self.elapsed += dt;
    }

    /// Phase 1: AI decisions, weapon cooldowns/updates/firing and dash
    /// handling, one fighter at a time.
    fn decide_and_act(&mut self, dt: f32, now: f32) {
        for i in 0..self.fighters.len() {
            if !self.state.balls[i].alive {
                continue;
            }
            let id = self.fighters[i].id;

            let decision = {
                let view = MatchView::new(&mut self.state, &self.profiles, now);
                self.fighters[i].policy.decide(id, &view, now)
            };
            self.fighters[i].face = decision.face;
            {
                let ball = &mut self.state.balls[i];
                ball.velocity += decision.accel * dt;
                ball.parrying = decision.parry;
            }

            self.fighters[i].weapon.step(dt);
            {
                let fighter = &mut self.fighters[i];
                let mut view = MatchView::new(&mut self.state, &self.profiles, now);
                fighter.weapon.update(id, &mut view, dt);
                if decision.fire && !decision.parry {
                    fighter.weapon.trigger(id, &mut view, decision.face);
                }
            }

            let fighter = &mut self.fighters[i];
            let dash_dir = {
                let view = MatchView::new(&mut self.state, &self.profiles, now);
                let dash = &fighter.dash;
                fighter
                    .policy
                    .dash_direction(id, &view, now, &|t| dash.can_dash(t))
            };
            if let Some(direction) = dash_dir {
                fighter.dash.start(direction, now);
                debug!(fighter = i, "dash");
            }
            fighter.dash.update(now);

            let ball = &mut self.state.balls[i];
            if fighter.dash.is_dashing {
                ball.velocity = fighter.dash.direction() * fighter.dash.speed;
            } else {
                ball.cap_speed();
            }
            ball.invulnerable_until = fighter.dash.invulnerable_until;
        }
    }

    /// Phase 2: advance projectile and effect lifetimes; drop the dead and
    /// anything orbiting a dead owner.
    fn step_lifecycles(&mut self, dt: f32) {
        for proj in &mut self.state.projectiles {
            if !proj.step(dt) {
                proj.destroyed = true;
            }
        }
        self.state.projectiles.retain(|p| !p.destroyed);

        let state = &self.state;
        self.effects.retain_mut(|eff| {
            let orphaned =
                eff.requires_owner() && state.ball(eff.owner()).map_or(true, |b| !b.alive);
            let alive = !orphaned && eff.step(dt);
            if !alive {
                eff.destroy();
            }
            alive
        });
    }

    /// Phase 3: deflections, projectile impacts, effect hits and dash
    /// rams, in that order.
    fn resolve_collisions(&mut self, now: f32) {
        let mut effects = std::mem::take(&mut self.effects);
        let mut projectiles = std::mem::take(&mut self.state.projectiles);
        let mut deflected = vec![false; projectiles.len()];

        // Deflection: a projectile crossing an enemy's deflecting effect
        // changes hands instead of hitting anyone this frame
        for (pi, proj) in projectiles.iter_mut().enumerate() {
            if proj.destroyed {
                continue;
            }
            let view = MatchView::new(&mut self.state, &self.profiles, now);
            for eff in effects.iter() {
                if !eff.deflects() {
                    continue;
                }
                if view.team_color(eff.owner()) == view.team_color(proj.owner) {
                    continue;
                }
                if eff.collides(&view, proj.position, proj.radius) {
                    eff.deflect_projectile(&view, proj);
                    deflected[pi] = true;
                    break;
                }
            }
            if deflected[pi] {
                self.state.events.push(GameEvent::Touch { timestamp: now });
            }
        }

        // Projectile impacts
        for (pi, proj) in projectiles.iter_mut().enumerate() {
            if proj.destroyed || deflected[pi] {
                continue;
            }
            for bi in 0..self.state.balls.len() {
                let (alive, target, position, radius) = {
                    let ball = &self.state.balls[bi];
                    (ball.alive, ball.id, ball.position, ball.radius)
                };
                if !alive || target == proj.owner {
                    continue;
                }
                let reach = radius + proj.radius;
                if position.distance_sq_to(proj.position) > reach * reach {
                    continue;
                }
                let keep = {
                    let mut view = MatchView::new(&mut self.state, &self.profiles, now);
                    proj.on_hit(&mut view, target, now)
                };
                if !keep {
                    proj.destroyed = true;
                    break;
                }
            }
        }

        // Effect hits. Unlike projectiles an effect keeps resolving against
        // every fighter; per-target gates live inside the effect.
        let mut keep_effect = vec![true; effects.len()];
        for (ei, eff) in effects.iter_mut().enumerate() {
            for bi in 0..self.state.balls.len() {
                let (alive, target, position, radius) = {
                    let ball = &self.state.balls[bi];
                    (ball.alive, ball.id, ball.position, ball.radius)
                };
                if !alive || target == eff.owner() {
                    continue;
                }
                let hit = {
                    let view = MatchView::new(&mut self.state, &self.profiles, now);
                    eff.collides(&view, position, radius)
                };
                if !hit {
                    continue;
                }
                let keep = {
                    let mut view = MatchView::new(&mut self.state, &self.profiles, now);
                    eff.on_hit(&mut view, target, now)
                };
                if !keep {
                    keep_effect[ei] = false;
                    break;
                }
            }
        }

        // Dash rams: one damaging touch per activation
        for i in 0..self.fighters.len() {
            let fighter = &self.fighters[i];
            if !fighter.dash.is_dashing
                || fighter.dash.has_hit
                || fighter.weapon.range_type != RangeType::Contact
                || !self.state.balls[i].alive
            {
                continue;
            }
            let (my_team, my_pos, my_radius) = {
                let ball = &self.state.balls[i];
                (ball.team, ball.position, ball.radius)
            };
            let ram_damage = fighter.weapon.damage.scaled(dash_tuning::DAMAGE_SCALE);
            let dash_dir = fighter.dash.direction();

            let mut rammed = None;
            for ball in &self.state.balls {
                if !ball.alive || ball.team == my_team {
                    continue;
                }
                let reach = ball.radius + my_radius;
                if ball.position.distance_sq_to(my_pos) <= reach * reach {
                    rammed = Some(ball.id);
                    break;
                }
            }
            if let Some(target) = rammed {
                let mut view = MatchView::new(&mut self.state, &self.profiles, now);
                view.deal_damage(target, ram_damage, now);
                view.apply_impulse(
                    target,
                    dash_dir.x * dash_tuning::KNOCKBACK,
                    dash_dir.y * dash_tuning::KNOCKBACK,
                );
                self.fighters[i].dash.has_hit = true;
            }
        }

        // Put the survivors back, along with anything spawned mid-phase
        projectiles.retain(|p| !p.destroyed);
        let mut spawned = std::mem::take(&mut self.state.projectiles);
        projectiles.append(&mut spawned);
        self.state.projectiles = projectiles;

        let mut kept = keep_effect.iter();
        effects.retain_mut(|eff| {
            if *kept.next().expect("flag per effect") {
                true
            } else {
                eff.destroy();
                false
            }
        });
        self.effects = effects;
        self.effects.append(&mut self.state.pending_effects);
    }

    /// Phase 4: hand queued events to the renderer and audio collaborators.
    fn drain_events(&mut self, _now: f32) {
        for event in self.state.events.drain(..) {
            match event {
                GameEvent::Impact {
                    position,
                    fatal,
                    team,
                    amount,
                } => {
                    debug!(?team, amount, fatal, "impact");
                    self.renderer
                        .add_impact(position, if fatal { 2.0 } else { 0.3 });
                }
                GameEvent::Hit { timestamp, .. } => self.audio.on_hit(timestamp),
                GameEvent::Explode { id, timestamp } => {
                    info!(fighter = %id, time = timestamp, "fighter destroyed");
                    self.audio.on_explode(timestamp);
                }
                GameEvent::Throw { timestamp } => self.audio.on_throw(timestamp),
                GameEvent::Touch { timestamp } => self.audio.on_touch(timestamp),
            }
        }
    }

    /// Phase 5: issue draw calls and record the finished frame.
    fn render(&mut self) {
        self.renderer.clear();

        {
            let view = MatchView::new(&mut self.state, &self.profiles, self.elapsed);
            for eff in self.effects.iter_mut() {
                eff.draw(self.renderer.as_mut(), &view);
            }
        }

        for pi in 0..self.state.projectiles.len() {
            let team = self
                .state
                .ball(self.state.projectiles[pi].owner)
                .map(|b| b.team)
                .unwrap_or((255, 255, 0));
            self.state.projectiles[pi].draw(self.renderer.as_mut(), team);
        }

        for ball in self.state.balls.iter().filter(|b| b.alive) {
            self.renderer
                .draw_ball(ball.position, ball.radius, self.config.ball_color, ball.team);
        }

        let ratios: Vec<(Color, f32)> = self
            .state
            .balls
            .iter()
            .map(|b| (b.team, b.health_ratio().max(0.0)))
            .collect();
        self.renderer.set_hp(&ratios);

        if let Some(frame) = self.renderer.present() {
            self.recorder.add_frame(frame);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::NullAudio;
    use crate::recorder::testing::ProbeRecorder;
    use crate::recorder::NullRecorder;
    use crate::render::testing::CountingRenderer;
    use crate::render::NullRenderer;

    fn config(max_seconds: f32) -> MatchConfig {
        MatchConfig {
            max_seconds,
            transition_time: 0.0,
            ..Default::default()
        }
    }

    fn duel_specs(weapon_a: &str, weapon_b: &str) -> Vec<FighterSpec> {
        vec![
            FighterSpec {
                weapon: weapon_a.to_string(),
                team: (0, 102, 204),
            },
            FighterSpec {
                weapon: weapon_b.to_string(),
                team: (255, 102, 0),
            },
        ]
    }

    fn controller(
        max_seconds: f32,
        weapon_a: &str,
        weapon_b: &str,
        recorder: Box<dyn Recorder>,
    ) -> MatchController {
        MatchController::new(
            config(max_seconds),
            &duel_specs(weapon_a, weapon_b),
            42,
            Box::new(NullRenderer),
            Box::new(NullAudio),
            recorder,
        )
        .unwrap()
    }

    #[test]
    fn test_unknown_weapon_fails_at_setup() {
        let err = MatchController::new(
            config(10.0),
            &duel_specs("katana", "laser"),
            42,
            Box::new(NullRenderer),
            Box::new(NullAudio),
            Box::new(NullRecorder),
        )
        .unwrap_err();
        assert!(matches!(err, MatchError::UnknownWeapon { .. }));
    }

    #[test]
    fn test_single_fighter_rejected() {
        let err = MatchController::new(
            config(10.0),
            &duel_specs("katana", "katana")[..1].to_vec(),
            42,
            Box::new(NullRenderer),
            Box::new(NullAudio),
            Box::new(NullRecorder),
        )
        .unwrap_err();
        assert!(matches!(err, MatchError::NotEnoughFighters(1)));
    }

    #[test]
    fn test_single_team_rejected() {
        let specs = vec![
            FighterSpec {
                weapon: "katana".to_string(),
                team: (1, 2, 3),
            },
            FighterSpec {
                weapon: "knife".to_string(),
                team: (1, 2, 3),
            },
        ];
        let err = MatchController::new(
            config(10.0),
            &specs,
            42,
            Box::new(NullRenderer),
            Box::new(NullAudio),
            Box::new(NullRecorder),
        )
        .unwrap_err();
        assert!(matches!(err, MatchError::NotEnoughFighters(1)));
    }

    #[test]
    fn test_wounded_enemy_goes_down() {
        let probe = ProbeRecorder::default();
        let mut controller = controller(30.0, "katana", "shuriken", Box::new(probe.clone()));

        // Stage the fight: the shuriken fighter is one hit from death and
        // standing inside the katana's orbit
        let katana_pos = controller.state.balls[0].position;
        controller.state.balls[1].position = katana_pos + Vec2::new(70.0, 0.0);
        controller.state.balls[1].health = 1.0;

        let outcome = controller.run().unwrap();

        assert_eq!(outcome.survivors, 1);
        assert_eq!(outcome.winner_weapon.as_deref(), Some("katana"));
        assert!(outcome.frames > 0);
        assert!(probe.state.borrow().closed, "recorder closed on success");
    }

    #[test]
    fn test_timeout_reported_not_draw() {
        // Two kiters far apart with an impossible time budget
        let mut controller = controller(0.05, "shuriken", "shuriken", Box::new(NullRecorder));
        let err = controller.run().unwrap_err();
        match err {
            MatchError::Timeout { alive, .. } => assert_eq!(alive, 2),
            other => panic!("expected timeout, got {other:?}"),
        }
    }

    #[test]
    fn test_teardown_failure_does_not_mask_timeout() {
        let probe = ProbeRecorder::failing();
        let mut controller = controller(0.05, "shuriken", "shuriken", Box::new(probe.clone()));

        let err = controller.run().unwrap_err();
        assert!(matches!(err, MatchError::Timeout { .. }));
        assert!(probe.state.borrow().closed, "recorder still closed");
    }

    #[test]
    fn test_recorder_failure_surfaces_on_success() {
        let probe = ProbeRecorder::failing();
        let mut controller = controller(30.0, "katana", "knife", Box::new(probe.clone()));
        let katana_pos = controller.state.balls[0].position;
        controller.state.balls[1].position = katana_pos + Vec2::new(70.0, 0.0);
        controller.state.balls[1].health = 1.0;

        let err = controller.run().unwrap_err();
        assert!(matches!(err, MatchError::Recorder(_)));
    }

    #[test]
    fn test_draw_calls_issued_per_tick() {
        let renderer = CountingRenderer::default();
        let counts = renderer.counts.clone();
        let mut controller = MatchController::new(
            config(30.0),
            &duel_specs("katana", "shuriken"),
            42,
            Box::new(renderer),
            Box::new(NullAudio),
            Box::new(NullRecorder),
        )
        .unwrap();
        let katana_pos = controller.state.balls[0].position;
        controller.state.balls[1].position = katana_pos + Vec2::new(70.0, 0.0);
        controller.state.balls[1].health = 1.0;

        let outcome = controller.run().unwrap();

        let counts = counts.borrow();
        assert_eq!(counts.frames as u64, outcome.frames);
        assert!(counts.balls >= 2, "both fighters drawn on the first frame");
        assert!(counts.impacts >= 1, "the killing blow flashed");
    }

    #[test]
    fn test_orbiting_blade_deployed_during_match() {
        let mut controller = controller(30.0, "katana", "shuriken", Box::new(NullRecorder));
        let katana_pos = controller.state.balls[0].position;
        controller.state.balls[1].position = katana_pos + Vec2::new(70.0, 0.0);
        controller.state.balls[1].health = 1.0;

        controller.run().unwrap();
        assert!(
            controller
                .effects
                .iter()
                .any(|e| matches!(e, WeaponEffect::OrbitingBlade(_))),
            "katana blade should be orbiting its owner"
        );
    }

    #[test]
    fn test_same_seed_same_outcome() {
        let run = |seed: u64| {
            let mut controller = MatchController::new(
                config(5.0),
                &duel_specs("bazooka", "bazooka"),
                seed,
                Box::new(NullRenderer),
                Box::new(NullAudio),
                Box::new(NullRecorder),
            )
            .unwrap();
            let result = controller.run();
            let positions: Vec<Vec2> =
                controller.state.balls.iter().map(|b| b.position).collect();
            let healths: Vec<f32> = controller.state.balls.iter().map(|b| b.health).collect();
            (result.is_ok(), positions, healths)
        };

        let (ok_a, pos_a, hp_a) = run(7);
        let (ok_b, pos_b, hp_b) = run(7);
        assert_eq!(ok_a, ok_b);
        assert_eq!(pos_a, pos_b);
        assert_eq!(hp_a, hp_b);
    }
}

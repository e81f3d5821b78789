//! Finite-state combat policy layered on the simple policy's motion
//! primitives.
//!
//! The state is recomputed on every decision from current health and
//! incoming threats; nothing sticks across frames except the smoothed dodge
//! vector and the remembered time-to-impact that backs the parry. Dodging
//! mixes projectile avoidance with a jitter drawn from the policy's own
//! seeded generator, so evasive paths differ between seeds while staying
//! reproducible.

use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::error::MatchError;
use crate::game::ai::{Decision, SimplePolicy, Style};
use crate::game::constants::{ai as tuning, parry};
use crate::game::targeting::{
    attack_range, lead_target, nearest_projectile, nearest_threat, projectile_dodge,
};
use crate::game::types::{Damage, EntityId, RangeType};
use crate::game::view::WorldView;
use crate::game::weapons::Weapon;
use crate::util::vec2::Vec2;

/// Internal high-level behaviours, recomputed every tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Attack,
    Dodge,
    Parry,
    Retreat,
}

/// Overall tactical mode, gated by the transition time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Defensive,
    Offensive,
}

/// Finite state policy handling attack, dodge, parry and retreat.
#[derive(Debug)]
pub struct StatefulPolicy {
    pub base: SimplePolicy,
    pub range_type: RangeType,
    /// Before this simulated time the policy plays pure keep-away
    pub transition_time: f32,
    /// Distant weapons that harass even when out of range (shuriken)
    pub fire_out_of_range: bool,
    pub state: State,
    /// Time-to-impact of the threat seen by the last decision; backs
    /// [`StatefulPolicy::parry_damage`]
    last_threat_tti: Option<f32>,
    rng: ChaCha8Rng,
}

impl StatefulPolicy {
    pub fn new(
        style: Style,
        range_type: RangeType,
        transition_time: f32,
        fire_out_of_range: bool,
        seed: u64,
    ) -> Self {
        Self {
            base: SimplePolicy::new(style),
            range_type,
            transition_time,
            fire_out_of_range,
            state: State::Attack,
            last_threat_tti: None,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    pub fn mode(&self, now: f32) -> Mode {
        if self.range_type == RangeType::Contact {
            // Contact fighters cannot keep away from their own weapon range
            Mode::Offensive
        } else if now < self.transition_time {
            Mode::Defensive
        } else {
            Mode::Offensive
        }
    }

    /// Return acceleration, facing vector, fire and parry decisions.
    pub fn decide(&mut self, me: EntityId, view: &dyn WorldView, now: f32) -> Decision {
        let Some(enemy) = view.enemy_of(me) else {
            return Decision::hold();
        };
        let my_pos = view.position(me);
        let enemy_pos = view.position(enemy);
        let enemy_vel = view.velocity(enemy);
        let delta = enemy_pos - my_pos;
        let dist = delta.length();
        let direction = delta.normalize_or(Vec2::RIGHT);
        let projectile_speed = view.weapon_profile(me).speed;
        let projectiles = view.projectiles(Some(me));

        let atk_range = attack_range(
            projectile_speed,
            self.base.fire_range_factor,
            self.base.fire_range,
        );
        let out_of_range = self.range_type == RangeType::Distant && dist > atk_range;

        // While out of reach, distant weapons without harass fire swat down
        // incoming projectiles instead of wasting shots at the enemy
        let tracked = if out_of_range && !self.fire_out_of_range {
            nearest_projectile(my_pos, &projectiles)
        } else {
            None
        };
        let (target_pos, target_vel) = match tracked {
            Some(proj) => (proj.position, proj.velocity),
            None => (enemy_pos, enemy_vel),
        };

        let mut face = lead_target(my_pos, target_pos, target_vel, projectile_speed);
        let mut parry = false;

        let (mut accel, mut fire) = if self.mode(now) == Mode::Defensive {
            self.state = State::Attack;
            self.last_threat_tti = None;
            self.base.attack(
                Style::Evader,
                my_pos,
                direction,
                dist,
                face,
                projectile_speed,
                &projectiles,
            )
        } else {
            let my_health = view.health_ratio(me);
            let enemy_health = view.health_ratio(enemy);
            let both_critical =
                my_health < tuning::CRITICAL_HEALTH && enemy_health < tuning::CRITICAL_HEALTH;

            let threat = nearest_threat(my_pos, &projectiles);
            self.last_threat_tti = threat.map(|t| t.time_to_impact);

            self.state = if my_health < tuning::CRITICAL_HEALTH && !both_critical {
                State::Retreat
            } else {
                match threat {
                    Some(t) if t.time_to_impact <= parry::WINDOW => State::Parry,
                    Some(_) => State::Dodge,
                    None => State::Attack,
                }
            };

            let style = if both_critical {
                Style::Aggressive
            } else {
                self.base.style
            };

            match self.state {
                State::Attack => self.base.attack(
                    style,
                    my_pos,
                    direction,
                    dist,
                    face,
                    projectile_speed,
                    &projectiles,
                ),
                State::Dodge => {
                    let raw = projectile_dodge(my_pos, direction, &projectiles);
                    let dodge = self.base.smooth_dodge(raw);
                    let bias = self.base.dodge_bias + self.rng.gen_range(-0.1..0.1);
                    let combined = (direction + dodge * bias).normalize_or(direction);
                    (combined * tuning::ACCEL, false)
                }
                State::Parry => {
                    parry = true;
                    (Vec2::ZERO, false)
                }
                State::Retreat => {
                    // Fire decision still follows the attack logic so the
                    // agent shoots while backing away
                    let (_, fire) = self.base.attack(
                        style,
                        my_pos,
                        direction,
                        dist,
                        face,
                        projectile_speed,
                        &projectiles,
                    );
                    (-direction * tuning::ACCEL, fire)
                }
            }
        };

        if out_of_range {
            fire = self.fire_out_of_range || tracked.is_some();
        }

        if tracked.is_none() && delta.y.abs() <= tuning::AXIS_EPSILON {
            let offset = self.base.vertical_offset + self.rng.gen_range(-0.05..0.05);
            face = Vec2::new(direction.x, offset).normalize_or(direction);
        }

        // Parrying fighters hold position and never fire
        if parry {
            accel = Vec2::ZERO;
            fire = false;
        }

        Decision {
            accel,
            face,
            fire,
            parry,
        }
    }

    /// Incoming damage while parrying a threat inside the parry window is
    /// nulled; anything else passes through untouched.
    pub fn parry_damage(&self, damage: Damage) -> Damage {
        if self.state == State::Parry
            && self
                .last_threat_tti
                .is_some_and(|tti| tti <= parry::WINDOW)
        {
            Damage::ZERO
        } else {
            damage
        }
    }

    /// Dash vector based on the tactical mode and weapon range.
    ///
    /// Contact fighters dash at the enemy in offensive mode and away from
    /// it in defensive mode, folding in any active dodge. Defensive dashes
    /// are suppressed entirely while the enemy is far and nothing is
    /// incoming. Distant weapons fall back to the simple dodge dash.
    pub fn dash_direction(
        &mut self,
        me: EntityId,
        view: &dyn WorldView,
        now: f32,
        can_dash: &dyn Fn(f32) -> bool,
    ) -> Option<Vec2> {
        if self.range_type != RangeType::Contact {
            return self.base.dash_direction(me, view, now, can_dash);
        }
        if !can_dash(now) {
            return None;
        }
        let enemy = view.enemy_of(me)?;

        let my_pos = view.position(me);
        let delta = view.position(enemy) - my_pos;
        let dist = delta.length();
        let direction = if dist > 1e-6 {
            delta * (1.0 / dist)
        } else {
            Vec2::RIGHT
        };

        // The raw transition gate, not mode(): contact fighters still open
        // the match cautiously even though their attack logic is offensive
        if now >= self.transition_time {
            return Some(direction);
        }

        let projectiles = view.projectiles(Some(me));
        let projectile_threat = nearest_threat(my_pos, &projectiles).is_some();
        if dist > tuning::DASH_SUPPRESS_DISTANCE && !projectile_threat {
            return None;
        }
        let dodge = if projectile_threat {
            projectile_dodge(my_pos, direction, &projectiles)
        } else {
            Vec2::ZERO
        };
        let away = -direction;
        Some((away + dodge * self.base.dodge_bias).normalize_or(away))
    }
}

/// Build a [`StatefulPolicy`] tuned for a weapon matchup.
///
/// Distant weapons play Evader against contact enemies and Kiter against
/// other distant weapons; contact weapons always press with Aggressive.
pub fn policy_for_weapon(
    weapon_name: &str,
    enemy_weapon_name: &str,
    transition_time: f32,
    seed: u64,
) -> Result<StatefulPolicy, MatchError> {
    let my_range = Weapon::range_type_for(weapon_name)?;
    let enemy_range = Weapon::range_type_for(enemy_weapon_name)?;

    if my_range == RangeType::Distant {
        let style = if enemy_range == RangeType::Contact {
            Style::Evader
        } else {
            Style::Kiter
        };
        let fire_out = weapon_name == "shuriken";
        Ok(StatefulPolicy::new(
            style,
            my_range,
            transition_time,
            fire_out,
            seed,
        ))
    } else {
        Ok(StatefulPolicy::new(
            Style::Aggressive,
            my_range,
            transition_time,
            false,
            seed,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::projectile::ProjectileSpec;
    use crate::game::state::{Bounds, WorldState};
    use crate::game::types::WeaponProfile;
    use crate::game::view::MatchView;

    fn profile(speed: f32, range_type: RangeType) -> WeaponProfile {
        WeaponProfile {
            name: "test",
            speed,
            range_type,
            cooldown: 0.8,
        }
    }

    fn duel(enemy_pos: Vec2) -> (WorldState, Vec<WeaponProfile>, EntityId, EntityId) {
        let mut state = WorldState::new(Bounds::new(2000.0, 2000.0, 10.0, 1.0));
        let a = state.spawn_ball(Vec2::new(600.0, 600.0), (1, 0, 0));
        let b = state.spawn_ball(Vec2::new(600.0, 600.0) + enemy_pos, (0, 0, 1));
        (
            state,
            vec![profile(500.0, RangeType::Distant); 2],
            a,
            b,
        )
    }

    fn incoming(state: &mut WorldState, profs: &[WeaponProfile], owner: EntityId, pos: Vec2, vel: Vec2) {
        let mut view = MatchView::new(state, profs, 0.0);
        view.spawn_projectile(
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
        );
    }

    fn contact_policy(seed: u64) -> StatefulPolicy {
        StatefulPolicy::new(Style::Aggressive, RangeType::Contact, 0.0, false, seed)
    }

    #[test]
    fn test_parry_on_imminent_threat() {
        let (mut state, profs, a, b) = duel(Vec2::new(200.0, 40.0));
        // Impact in 0.1 s: inside the 0.15 s parry window
        incoming(
            &mut state,
            &profs,
            b,
            Vec2::new(630.0, 600.0),
            Vec2::new(-300.0, 0.0),
        );
        let mut policy = contact_policy(1);

        let view = MatchView::new(&mut state, &profs, 5.0);
        let decision = policy.decide(a, &view, 5.0);

        assert_eq!(policy.state, State::Parry);
        assert!(decision.parry);
        assert!(!decision.fire);
        assert_eq!(decision.accel, Vec2::ZERO);
    }

    #[test]
    fn test_parry_damage_zeroed_inside_window() {
        let (mut state, profs, a, b) = duel(Vec2::new(200.0, 40.0));
        incoming(
            &mut state,
            &profs,
            b,
            Vec2::new(630.0, 600.0),
            Vec2::new(-300.0, 0.0),
        );
        let mut policy = contact_policy(1);
        let view = MatchView::new(&mut state, &profs, 5.0);
        policy.decide(a, &view, 5.0);

        assert_eq!(policy.parry_damage(Damage::new(50.0)).amount, 0.0);
        assert_eq!(policy.parry_damage(Damage::new(999.0)).amount, 0.0);
    }

    #[test]
    fn test_parry_damage_passthrough_outside_window() {
        let (mut state, profs, a, b) = duel(Vec2::new(200.0, 40.0));
        // Impact in 0.6 s: a dodge, not a parry
        incoming(
            &mut state,
            &profs,
            b,
            Vec2::new(780.0, 600.0),
            Vec2::new(-300.0, 0.0),
        );
        let mut policy = contact_policy(1);
        let view = MatchView::new(&mut state, &profs, 5.0);
        policy.decide(a, &view, 5.0);

        assert_eq!(policy.state, State::Dodge);
        assert_eq!(policy.parry_damage(Damage::new(50.0)).amount, 50.0);
    }

    #[test]
    fn test_dodge_on_distant_threat() {
        let (mut state, profs, a, b) = duel(Vec2::new(200.0, 40.0));
        incoming(
            &mut state,
            &profs,
            b,
            Vec2::new(780.0, 610.0),
            Vec2::new(-300.0, 0.0),
        );
        let mut policy = contact_policy(1);

        let view = MatchView::new(&mut state, &profs, 5.0);
        let decision = policy.decide(a, &view, 5.0);

        assert_eq!(policy.state, State::Dodge);
        assert!(!decision.fire, "dodging disables firing");
        assert!(decision.accel.length() > 1.0);
    }

    #[test]
    fn test_attack_without_threats() {
        let (mut state, profs, a, _b) = duel(Vec2::new(100.0, 40.0));
        let mut policy = contact_policy(1);

        let view = MatchView::new(&mut state, &profs, 5.0);
        policy.decide(a, &view, 5.0);

        assert_eq!(policy.state, State::Attack);
    }

    #[test]
    fn test_retreat_still_fires() {
        let (mut state, profs, a, b) = duel(Vec2::new(100.0, 30.0));
        let ratio = 0.10;
        {
            let ball = state.ball_mut(a).unwrap();
            ball.health = ball.stats.max_health * ratio;
        }
        let mut policy = contact_policy(1);

        let view = MatchView::new(&mut state, &profs, 5.0);
        let decision = policy.decide(a, &view, 5.0);

        assert_eq!(policy.state, State::Retreat);
        let direction = (view.position(b) - view.position(a)).normalize();
        assert!(decision.accel.dot(direction) < 0.0, "backing away");
        assert!(decision.fire, "still firing over the shoulder");
    }

    #[test]
    fn test_defensive_phase_plays_evader() {
        let (mut state, profs, a, b) = duel(Vec2::new(100.0, 30.0));
        let mut policy =
            StatefulPolicy::new(Style::Kiter, RangeType::Distant, 10.0, false, 1);

        let view = MatchView::new(&mut state, &profs, 2.0);
        let decision = policy.decide(a, &view, 2.0);

        assert_eq!(policy.mode(2.0), Mode::Defensive);
        let direction = (view.position(b) - view.position(a)).normalize();
        assert!(
            decision.accel.dot(direction) < 0.0,
            "early phase keeps distance even for a kiter"
        );
    }

    #[test]
    fn test_offensive_dash_goes_at_enemy() {
        let (mut state, profs, a, b) = duel(Vec2::new(100.0, 30.0));
        let mut policy = contact_policy(1);

        let view = MatchView::new(&mut state, &profs, 5.0);
        let dash = policy.dash_direction(a, &view, 5.0, &|_| true).unwrap();
        let direction = (view.position(b) - view.position(a)).normalize();
        assert!(dash.approx_eq(direction, 1e-5));
    }

    #[test]
    fn test_defensive_dash_suppressed_when_far_and_safe() {
        let (mut state, profs, a, _b) = duel(Vec2::new(400.0, 0.0));
        let mut policy =
            StatefulPolicy::new(Style::Aggressive, RangeType::Contact, 10.0, false, 1);

        let view = MatchView::new(&mut state, &profs, 2.0);
        assert!(policy.dash_direction(a, &view, 2.0, &|_| true).is_none());
    }

    #[test]
    fn test_defensive_dash_flees_when_close() {
        let (mut state, profs, a, b) = duel(Vec2::new(100.0, 20.0));
        let mut policy =
            StatefulPolicy::new(Style::Aggressive, RangeType::Contact, 10.0, false, 1);

        let view = MatchView::new(&mut state, &profs, 2.0);
        let dash = policy.dash_direction(a, &view, 2.0, &|_| true).unwrap();
        let direction = (view.position(b) - view.position(a)).normalize();
        assert!(dash.dot(direction) < 0.0, "defensive dash goes away");
    }

    #[test]
    fn test_dash_respects_cooldown_gate() {
        let (mut state, profs, a, _b) = duel(Vec2::new(100.0, 20.0));
        let mut policy = contact_policy(1);
        let view = MatchView::new(&mut state, &profs, 5.0);
        assert!(policy.dash_direction(a, &view, 5.0, &|_| false).is_none());
    }

    #[test]
    fn test_same_seed_identical_decisions() {
        let mut policy_a = contact_policy(42);
        let mut policy_b = contact_policy(42);

        let mut trace_a = Vec::new();
        let mut trace_b = Vec::new();

        for tick in 0..40 {
            // Horizontal line of sight plus an incoming projectile: both
            // jitter draws execute every tick
            let (mut state, profs, me, enemy) = duel(Vec2::new(200.0, 0.0));
            incoming(
                &mut state,
                &profs,
                enemy,
                Vec2::new(700.0 - tick as f32, 600.0),
                Vec2::new(-300.0, 0.0),
            );
            let now = 5.0 + tick as f32 / 60.0;
            let view = MatchView::new(&mut state, &profs, now);
            trace_a.push(policy_a.decide(me, &view, now));
            trace_b.push(policy_b.decide(me, &view, now));
        }

        assert_eq!(trace_a, trace_b);
    }

    #[test]
    fn test_different_seeds_diverge() {
        let mut policy_a = contact_policy(1);
        let mut policy_b = contact_policy(2);

        let mut diverged = false;
        for tick in 0..40 {
            let (mut state, profs, me, enemy) = duel(Vec2::new(200.0, 0.0));
            incoming(
                &mut state,
                &profs,
                enemy,
                Vec2::new(700.0 - tick as f32, 600.0),
                Vec2::new(-300.0, 0.0),
            );
            let now = 5.0 + tick as f32 / 60.0;
            let view = MatchView::new(&mut state, &profs, now);
            if policy_a.decide(me, &view, now) != policy_b.decide(me, &view, now) {
                diverged = true;
                break;
            }
        }
        assert!(diverged, "different seeds should produce different traces");
    }

    #[test]
    fn test_policy_for_weapon_matchups() {
        let p = policy_for_weapon("shuriken", "katana", 3.0, 1).unwrap();
        assert_eq!(p.base.style, Style::Evader);
        assert!(p.fire_out_of_range);

        let p = policy_for_weapon("gravity_well", "shuriken", 3.0, 1).unwrap();
        assert_eq!(p.base.style, Style::Kiter);
        assert!(!p.fire_out_of_range);

        let p = policy_for_weapon("katana", "shuriken", 3.0, 1).unwrap();
        assert_eq!(p.base.style, Style::Aggressive);
        assert_eq!(p.range_type, RangeType::Contact);

        assert!(policy_for_weapon("laser", "katana", 3.0, 1).is_err());
    }
}

// Per-agent Patrol / Chase / Search controller.
//
// Each tick an agent:
//   1. counts down its timers and personal memory,
//   2. looks for the target and, on a sighting, refreshes memory and
//      publishes the spot to the squad intel slot,
//   3. picks its state (sight > squad intel > own memory > patrol),
//   4. turns toward the best-known target point (or its next waypoint),
//   5. repaths on a throttled timer,
//   6. moves: ranged standoff while the target is visible, path following
//      otherwise, with knockback and hit stun layered on top.

use glam::Vec2;
use rand::Rng;
use std::f32::consts::TAU;

use crate::engine::components::{Agent, AgentState};
use crate::engine::geometry::{direction_or_zero, heading_of, rotate_towards};
use crate::engine::grid::Grid;
use crate::engine::navigation::Pathfinder;
use crate::engine::perception::can_perceive;
use crate::squad::intel::SquadIntel;

/// Standoff: approach only once the target is this much past preferred range.
const APPROACH_SLACK: f32 = 1.2;
/// Seconds spent strafing to each side before switching.
const STRAFE_HALF_PERIOD: i32 = 2;

/// Everything outside the agent that one think step reads or writes.
pub struct Surroundings<'a, R: Rng> {
    pub grid: &'a Grid,
    pub pathfinder: &'a mut Pathfinder,
    /// The agent's own squad slot.
    pub intel: &'a mut SquadIntel,
    /// TTL published with each sighting.
    pub sighting_ttl: f32,
    pub rng: &'a mut R,
}

impl Agent {
    /// Advance this agent by `dt`. `target` is the hunted entity's true
    /// position, or `None` when there is nothing to hunt.
    ///
    /// Returns whether the agent saw the target this tick.
    pub fn think<R: Rng>(
        &mut self,
        dt: f32,
        target: Option<Vec2>,
        env: &mut Surroundings<'_, R>,
    ) -> bool {
        self.tick_timers(dt);

        // ---- Sensing --------------------------------------------------------
        let sight = self.sight();
        let seen = target.filter(|&t| can_perceive(env.grid, self.pos, self.facing, &sight, t));
        if let Some(t) = seen {
            self.memory.refresh(t, self.config.lose_sight_time);
            env.intel.publish(t, env.sighting_ttl);
        }

        let shared = env.intel.lead();
        let personal = if seen.is_none() { self.memory.recall() } else { None };
        let tracked = seen.or(shared).or(personal);

        // ---- State ----------------------------------------------------------
        if let Some(t) = seen {
            if self.state != AgentState::Chase {
                self.enter(AgentState::Chase);
                self.request_path(env, t);
            }
        } else if let Some(spot) = shared {
            if self.state == AgentState::Patrol {
                self.enter(AgentState::Search);
                self.request_path(env, spot);
            }
        } else if personal.is_none() && self.state != AgentState::Patrol {
            self.enter(AgentState::Patrol);
            self.patrol.retarget_timer = 0.0;
        }

        // ---- Facing ---------------------------------------------------------
        let look_at = tracked.or_else(|| self.next_waypoint());
        if let Some(heading) = look_at.and_then(|p| heading_of(p - self.pos)) {
            self.facing = rotate_towards(self.facing, heading, self.config.turn_rate * dt);
        }

        // ---- Repath ---------------------------------------------------------
        self.repath_timer -= dt;
        if self.repath_timer <= 0.0 {
            self.repath_timer = self.config.repath_interval;
            let goal = seen.or(shared).or_else(|| {
                matches!(self.state, AgentState::Search | AgentState::Chase)
                    .then_some(personal)
                    .flatten()
            });
            if let Some(goal) = goal {
                self.request_path(env, goal);
            }
        }

        // ---- Movement -------------------------------------------------------
        let desired = match seen {
            Some(t) => self.standoff_direction(t),
            None => {
                if self.state == AgentState::Patrol {
                    self.patrol.retarget_timer -= dt;
                    if self.patrol.retarget_timer <= 0.0 {
                        self.pick_patrol_target(env);
                    }
                }
                self.path_direction()
            }
        };
        self.step(env.grid, desired, dt);

        // ---- Search bookkeeping ---------------------------------------------
        if self.state == AgentState::Search {
            let spot = shared.or(personal);
            if let Some(spot) = spot {
                if self.pos.distance(spot) <= self.config.intel_reach_radius {
                    // Nothing here: drop the lead so the squad stops converging.
                    if shared.is_some() {
                        env.intel.clear();
                    }
                    self.memory.remaining = 0.0;
                    self.enter(AgentState::Patrol);
                    self.patrol.retarget_timer = 0.0;
                }
            }
        }

        // ---- Disengage ------------------------------------------------------
        if self.state == AgentState::Chase && !env.intel.is_fresh() && !self.memory.is_fresh() {
            let far = target.is_none_or(|t| self.pos.distance(t) > self.config.max_chase_range);
            if far {
                self.enter(AgentState::Patrol);
                self.patrol.retarget_timer = 0.0;
            }
        }

        seen.is_some()
    }

    /// Take a hit from `source`: lose hp, flash, stagger and get pushed away.
    pub fn apply_hit(&mut self, damage: f32, source: Vec2, impulse: f32) {
        self.hp = (self.hp - damage).max(0.0);
        self.flash_timer = self.config.hit_flash_duration;
        self.stun_timer = self.config.stun_duration;
        self.knockback += direction_or_zero(self.pos - source) * impulse;
    }

    #[inline]
    pub fn is_stunned(&self) -> bool {
        self.stun_timer > 0.0
    }

    fn tick_timers(&mut self, dt: f32) {
        self.flash_timer = (self.flash_timer - dt).max(0.0);
        self.stun_timer = (self.stun_timer - dt).max(0.0);
        self.memory.decay(dt);
        self.clock += dt;
    }

    fn enter(&mut self, state: AgentState) {
        if self.state != state {
            log::trace!(
                "agent {:?} at ({:.0}, {:.0}): {:?} -> {:?}",
                self.squad,
                self.pos.x,
                self.pos.y,
                self.state,
                state
            );
            self.state = state;
        }
    }

    /// Replace the current route. A failed search leaves the agent with no
    /// route; the next scheduled repath or patrol retarget tries again.
    fn request_path<R: Rng>(&mut self, env: &mut Surroundings<'_, R>, goal: Vec2) {
        self.path_cursor = 0;
        match env.pathfinder.find_path(env.grid, self.pos, goal) {
            Ok(path) => self.path = path,
            Err(err) => {
                log::trace!(
                    "path ({:.0}, {:.0}) -> ({:.0}, {:.0}) failed: {err}",
                    self.pos.x,
                    self.pos.y,
                    goal.x,
                    goal.y
                );
                self.path.clear();
            }
        }
    }

    fn pick_patrol_target<R: Rng>(&mut self, env: &mut Surroundings<'_, R>) {
        let angle = env.rng.gen_range(0.0..TAU);
        let radius = env.rng.gen_range(self.config.patrol_min_radius..=self.config.patrol_radius);
        let goal = self.patrol.home + Vec2::new(angle.cos(), angle.sin()) * radius;
        self.request_path(env, goal);
        let (min, max) = (self.config.retarget_min, self.config.retarget_max);
        self.patrol.retarget_timer = env.rng.gen_range(min..=max);
    }

    /// Ranged spacing against a visible target: back off when too close,
    /// close in when too far, strafe inside the preferred band.
    fn standoff_direction(&self, target: Vec2) -> Vec2 {
        let to_target = target - self.pos;
        let dist = to_target.length();
        let dir = direction_or_zero(to_target);

        if dist < self.config.min_range {
            -dir
        } else if dist > self.config.preferred_range * APPROACH_SLACK {
            dir
        } else {
            let phase = (self.clock as i32) % (2 * STRAFE_HALF_PERIOD);
            let side = if phase < STRAFE_HALF_PERIOD { 1.0 } else { -1.0 };
            dir.perp() * side * (self.config.strafe_speed / self.config.speed.max(1.0))
        }
    }

    /// Unit direction to the next waypoint, advancing past reached ones.
    fn path_direction(&mut self) -> Vec2 {
        while let Some(wp) = self.next_waypoint() {
            if self.pos.distance(wp) < self.config.waypoint_tolerance {
                self.path_cursor += 1;
            } else {
                return direction_or_zero(wp - self.pos);
            }
        }
        Vec2::ZERO
    }

    /// Integrate one movement step: desired direction plus decaying
    /// knockback, capped at full speed, slowed while stunned.
    fn step(&mut self, grid: &Grid, desired: Vec2, dt: f32) {
        let speed = self.config.speed.max(1.0);
        let mut movement = desired + self.knockback / speed;
        self.knockback -= self.knockback * (self.config.knockback_friction * dt).min(1.0);

        movement = movement.clamp_length_max(1.0);
        if self.is_stunned() {
            movement *= self.config.stun_speed_factor;
        }
        if movement != Vec2::ZERO {
            self.pos = grid.resolve_collision(self.pos, movement * self.config.speed * dt);
        }
    }
}

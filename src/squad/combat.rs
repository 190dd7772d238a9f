// Fire control for squad rifles.
//
// A shot needs, in order: a ready weapon and an unstunned shooter, the
// target within weapon range, inside the view cone and in clear line of
// sight, and no living squadmate near the line of fire. Holding fire for a
// squadmate costs a short retry delay rather than a full cooldown.

use glam::Vec2;

use crate::engine::components::{Agent, Projectile, Team, Weapon};
use crate::engine::geometry::{
    EPSILON, direction_or_zero, heading_vector, segment_distance_sq, within_cone,
};
use crate::engine::grid::Grid;
use crate::engine::navigation::has_line_of_sight;
use crate::squad::intel::SquadId;

/// Gap between the shooter's body and the spawned projectile.
const MUZZLE_OFFSET: f32 = 6.0;

/// Position of a living agent, captured before anyone moves this tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SquadmateSnapshot {
    pub squad: SquadId,
    pub pos: Vec2,
}

impl Weapon {
    #[inline]
    pub fn cool(&mut self, dt: f32) {
        self.cooldown = (self.cooldown - dt).max(0.0);
    }

    #[inline]
    pub fn is_ready(&self) -> bool {
        self.cooldown <= 0.0
    }

    /// Burst bookkeeping after a shot leaves the barrel.
    fn after_shot(&mut self) {
        self.burst_left = self.burst_left.saturating_sub(1);
        if self.burst_left == 0 {
            self.cooldown = self.config.burst_cooldown;
            self.burst_left = self.config.burst_size.max(1);
        } else {
            self.cooldown = self.config.shot_cooldown;
        }
    }
}

impl Agent {
    /// Try to shoot at `target`. `me` is this agent's index in `squadmates`.
    ///
    /// Returns the spawned projectile, or `None` when any gate fails.
    pub fn try_fire(
        &mut self,
        me: usize,
        squadmates: &[SquadmateSnapshot],
        grid: &Grid,
        target: Vec2,
    ) -> Option<Projectile> {
        if !self.is_alive() || !self.weapon.is_ready() || self.is_stunned() {
            return None;
        }

        let to_target = target - self.pos;
        let dist = to_target.length();
        if dist > self.weapon.config.range {
            return None;
        }

        // A target on top of the shooter has no bearing; fire along facing.
        let dir = if dist <= EPSILON {
            heading_vector(self.facing)
        } else {
            let dir = direction_or_zero(to_target);
            if !within_cone(heading_vector(self.facing), dir, self.sight().half_angle()) {
                return None;
            }
            dir
        };

        if !has_line_of_sight(grid, self.pos, target) {
            return None;
        }

        let reach = self.pos + dir * (dist + self.weapon.config.shot_extension);
        if let Some(ally) = self.ally_in_line_of_fire(me, squadmates, reach) {
            log::debug!(
                "agent {:?} holds fire: squadmate at ({:.0}, {:.0}) in the line",
                self.squad,
                ally.x,
                ally.y
            );
            self.weapon.cooldown = self.weapon.config.hold_fire_delay;
            return None;
        }

        let cfg = &self.weapon.config;
        let muzzle = self.pos + dir * (self.config.radius + MUZZLE_OFFSET);
        let projectile = Projectile::new(
            Team::Squad,
            muzzle,
            dir * cfg.projectile_speed,
            cfg.projectile_radius,
            cfg.projectile_damage,
        )
        .with_impulse(cfg.knockback_impulse);
        self.weapon.after_shot();
        Some(projectile)
    }

    fn ally_in_line_of_fire(
        &self,
        me: usize,
        squadmates: &[SquadmateSnapshot],
        reach: Vec2,
    ) -> Option<Vec2> {
        let safety = self.weapon.config.friendly_safety_radius;
        squadmates
            .iter()
            .enumerate()
            .filter(|&(i, mate)| i != me && mate.squad == self.squad)
            .map(|(_, mate)| mate.pos)
            .find(|&p| segment_distance_sq(self.pos, reach, p) <= safety * safety)
    }
}

// ECS components for squad agents and projectiles, plus the hunted target.
// Behaviour lives in `squad::brain` / `squad::combat` / `engine::systems`.

use bevy_ecs::prelude::*;
use glam::Vec2;

use super::perception::{SightCone, TargetMemory};
use crate::config::{AgentConfig, WeaponConfig};
use crate::squad::intel::SquadId;

/// Behavioural state of a squad agent.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum AgentState {
    /// No knowledge of the target: wander near home.
    #[default]
    Patrol,
    /// Target in sight (or being run down from a recent fix).
    Chase,
    /// Sight lost, heading for the last known / shared location.
    Search,
}

/// Side a projectile was fired by.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Team {
    /// Fired by the hunted target; damages agents.
    Player,
    /// Fired by a squad agent; damages the target.
    Squad,
}

// ============================================================================
// AGENT
// ============================================================================

/// Patrol anchor and the countdown to the next wander goal.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Patrol {
    pub home: Vec2,
    pub retarget_timer: f32,
}

/// Rifle state. Tuning lives in `config`, the rest is fire-control bookkeeping.
#[derive(Clone, Debug, PartialEq)]
pub struct Weapon {
    pub config: WeaponConfig,
    /// Seconds until the next shot is allowed.
    pub cooldown: f32,
    /// Shots remaining in the current burst.
    pub burst_left: u32,
}

impl Weapon {
    pub fn new(config: WeaponConfig) -> Self {
        let burst_left = config.burst_size.max(1);
        Self {
            config,
            cooldown: 0.0,
            burst_left,
        }
    }
}

/// One squad member.
#[derive(Component, Clone, Debug)]
pub struct Agent {
    pub squad: SquadId,
    pub pos: Vec2,
    /// Heading in radians, 0 = +X.
    pub facing: f32,
    pub hp: f32,
    pub state: AgentState,
    pub config: AgentConfig,
    pub weapon: Weapon,
    pub memory: TargetMemory,
    pub patrol: Patrol,

    /// Current route (world-space waypoints) and the index of the next one.
    pub path: Vec<Vec2>,
    pub path_cursor: usize,
    pub repath_timer: f32,

    pub knockback: Vec2,
    pub stun_timer: f32,
    pub flash_timer: f32,
    /// Seconds alive; drives the strafe side switch.
    pub clock: f32,
}

impl Agent {
    pub fn new(squad: SquadId, pos: Vec2, config: AgentConfig, weapon: WeaponConfig) -> Self {
        Self {
            squad,
            pos,
            facing: 0.0,
            hp: config.max_hp,
            state: AgentState::Patrol,
            weapon: Weapon::new(weapon),
            memory: TargetMemory::default(),
            patrol: Patrol {
                home: pos,
                retarget_timer: 0.0,
            },
            path: Vec::new(),
            path_cursor: 0,
            repath_timer: 0.0,
            knockback: Vec2::ZERO,
            stun_timer: 0.0,
            flash_timer: 0.0,
            clock: 0.0,
            config,
        }
    }

    pub fn with_facing(mut self, facing: f32) -> Self {
        self.facing = facing;
        self
    }

    #[inline]
    pub fn is_alive(&self) -> bool {
        self.hp > 0.0
    }

    #[inline]
    pub fn sight(&self) -> SightCone {
        SightCone {
            fov_deg: self.config.fov_deg,
            range: self.config.sight_range,
        }
    }

    /// Next waypoint still to be reached, if any.
    pub fn next_waypoint(&self) -> Option<Vec2> {
        self.path.get(self.path_cursor).copied()
    }
}

// ============================================================================
// PROJECTILE
// ============================================================================

#[derive(Component, Clone, Debug, PartialEq)]
pub struct Projectile {
    pub pos: Vec2,
    /// World units per second.
    pub vel: Vec2,
    pub radius: f32,
    pub damage: f32,
    pub team: Team,
    pub alive: bool,
    /// Remaining lifetime in seconds; `None` flies until it hits something.
    pub ttl: Option<f32>,
    /// Knockback applied to whatever it hits.
    pub impulse: f32,
}

impl Projectile {
    pub fn new(team: Team, pos: Vec2, vel: Vec2, radius: f32, damage: f32) -> Self {
        Self {
            pos,
            vel,
            radius,
            damage,
            team,
            alive: true,
            ttl: None,
            impulse: 0.0,
        }
    }

    pub fn with_ttl(mut self, ttl: f32) -> Self {
        self.ttl = Some(ttl);
        self
    }

    pub fn with_impulse(mut self, impulse: f32) -> Self {
        self.impulse = impulse;
        self
    }
}

// ============================================================================
// TARGET
// ============================================================================

/// The entity the squad hunts. Moved by the (external) input layer.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Target {
    pub pos: Vec2,
    /// Heading in radians, 0 = +X. Follows movement and aim.
    pub facing: f32,
    pub radius: f32,
    pub hp: f32,
    pub max_hp: f32,
}

impl Target {
    pub fn new(pos: Vec2, radius: f32, max_hp: f32) -> Self {
        Self {
            pos,
            facing: 0.0,
            radius,
            hp: max_hp,
            max_hp,
        }
    }

    #[inline]
    pub fn is_alive(&self) -> bool {
        self.hp > 0.0
    }

    pub fn take_damage(&mut self, damage: f32) {
        self.hp = (self.hp - damage).max(0.0);
    }
}

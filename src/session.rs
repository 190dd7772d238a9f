// Simulation session: owns the level, every entity, and the per-squad intel.
//
// The application shell drives it with `tick(dt)` plus the target controls
// (`move_target`, `fire_projectile`, `carve`) and reads state back through
// the view accessors. Nothing here is global; two sessions never interact.

use bevy_ecs::prelude::*;
use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::collections::VecDeque;
use std::f32::consts::PI;

use crate::config::{ConfigError, SimConfig};
use crate::engine::cave::generate_cave;
use crate::engine::components::{Agent, AgentState, Projectile, Target, Team};
use crate::engine::geometry::{heading_of, heading_vector};
use crate::engine::grid::{BorderBreach, Grid};
use crate::engine::navigation::Pathfinder;
use crate::engine::systems::{despawn_dead_agents, despawn_dead_projectiles, projectile_system};
use crate::squad::brain::Surroundings;
use crate::squad::combat::SquadmateSnapshot;
use crate::squad::intel::{SquadId, SquadIntel};

/// Keeps the session RNG stream apart from the cave generator's.
const SESSION_SEED_SALT: u64 = 0x5eed_5eed;
/// Random spawn attempts before accepting a spot close to the target.
const SPAWN_ATTEMPTS: u32 = 32;
/// Gap between the target's body and its spawned shots.
const MUZZLE_OFFSET: f32 = 4.0;

/// What happened during one `Session::tick`.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct TickReport {
    pub shots_fired: usize,
    pub agents_hit: u32,
    pub agents_killed: usize,
    pub target_damage: f32,
}

/// Read-only copy of an agent for the shell.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AgentView {
    pub entity: Entity,
    pub squad: SquadId,
    pub pos: Vec2,
    pub facing: f32,
    pub hp: f32,
    pub state: AgentState,
    /// Hit flash still showing.
    pub flashing: bool,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ProjectileView {
    pub pos: Vec2,
    pub vel: Vec2,
    pub radius: f32,
    pub team: Team,
}

pub struct Session {
    config: SimConfig,
    grid: Grid,
    world: World,
    squads: Vec<SquadIntel>,
    pathfinder: Pathfinder,
    target: Target,
    rng: ChaCha8Rng,
    breaches: VecDeque<BorderBreach>,
}

impl Session {
    /// Validate `config` and generate a fresh cave from it.
    pub fn new(config: SimConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let grid = generate_cave(&config.grid, &config.cave);
        log::info!(
            "generated {}x{} cave (seed {}), {} floor tiles",
            grid.width(),
            grid.height(),
            config.cave.seed,
            grid.floor_count()
        );
        Self::with_grid(config, grid)
    }

    /// Session over an existing level. The target starts on the Floor tile
    /// nearest the map center.
    pub fn with_grid(config: SimConfig, grid: Grid) -> Result<Self, ConfigError> {
        config.validate()?;
        let target = Target::new(
            grid.floor_near_center(),
            config.target.radius,
            config.target.max_hp,
        );
        Ok(Self {
            pathfinder: Pathfinder::for_grid(&grid),
            rng: ChaCha8Rng::seed_from_u64(config.cave.seed ^ SESSION_SEED_SALT),
            world: World::new(),
            squads: Vec::new(),
            breaches: VecDeque::new(),
            target,
            grid,
            config,
        })
    }

    // ------------------------------------------------------------------------
    // Roster
    // ------------------------------------------------------------------------

    pub fn add_squad(&mut self) -> SquadId {
        self.squads.push(SquadIntel::default());
        SquadId(self.squads.len() as u32 - 1)
    }

    /// Spawn one agent. Unknown squad ids get their intel slots created.
    pub fn spawn_agent(&mut self, squad: SquadId, pos: Vec2, facing: f32) -> Entity {
        let needed = squad.0 as usize + 1;
        if self.squads.len() < needed {
            self.squads.resize(needed, SquadIntel::default());
        }
        let agent = Agent::new(
            squad,
            pos,
            self.config.agent.clone(),
            self.config.weapon.clone(),
        )
        .with_facing(facing);
        self.world.spawn(agent).id()
    }

    /// New squad of `count` agents on random Floor tiles, preferring spots
    /// outside the target's standoff range.
    pub fn spawn_squad(&mut self, count: usize) -> SquadId {
        let squad = self.add_squad();
        let keep_away = self.config.agent.min_range * 2.0;
        for _ in 0..count {
            let mut spot = None;
            for _ in 0..SPAWN_ATTEMPTS {
                let Some(candidate) = self.grid.random_floor_position(&mut self.rng) else {
                    break;
                };
                spot = Some(candidate);
                if candidate.distance(self.target.pos) >= keep_away {
                    break;
                }
            }
            let Some(pos) = spot else {
                log::warn!("no floor left to spawn squad {squad:?} members on");
                break;
            };
            let facing = self.rng.gen_range(-PI..PI);
            self.spawn_agent(squad, pos, facing);
        }
        squad
    }

    // ------------------------------------------------------------------------
    // Simulation
    // ------------------------------------------------------------------------

    /// Advance everything by `dt` seconds: intel decay, every living agent's
    /// think + fire step, then projectile flight, impacts and removals.
    pub fn tick(&mut self, dt: f32) -> TickReport {
        let mut report = TickReport::default();
        for intel in &mut self.squads {
            intel.decay(dt);
        }

        // Positions before anyone moves; friendly-fire checks read these.
        let roster: Vec<(Entity, SquadmateSnapshot)> = self
            .world
            .query::<(Entity, &Agent)>()
            .iter(&self.world)
            .filter(|(_, agent)| agent.is_alive())
            .map(|(entity, agent)| {
                let mate = SquadmateSnapshot {
                    squad: agent.squad,
                    pos: agent.pos,
                };
                (entity, mate)
            })
            .collect();
        let squadmates: Vec<SquadmateSnapshot> = roster.iter().map(|&(_, mate)| mate).collect();

        let target = self.target.is_alive().then_some(self.target.pos);
        let mut fired = Vec::new();

        for (me, &(entity, mate)) in roster.iter().enumerate() {
            let Some(intel) = self.squads.get_mut(mate.squad.0 as usize) else {
                continue;
            };
            let Some(mut agent) = self.world.get_mut::<Agent>(entity) else {
                continue;
            };
            let mut env = Surroundings {
                grid: &self.grid,
                pathfinder: &mut self.pathfinder,
                intel,
                sighting_ttl: self.config.intel.sighting_ttl,
                rng: &mut self.rng,
            };

            agent.weapon.cool(dt);
            let sees = agent.think(dt, target, &mut env);
            if let (true, Some(t)) = (sees, target) {
                if let Some(shot) = agent.try_fire(me, &squadmates, &self.grid, t) {
                    fired.push(shot);
                }
            }
        }

        report.shots_fired = fired.len();
        for shot in fired {
            self.world.spawn(shot);
        }

        let was_alive = self.target.is_alive();
        let hits = projectile_system(&mut self.world, &self.grid, &mut self.target, dt);
        report.agents_hit = hits.agents_hit;
        report.target_damage = hits.target_damage;
        if was_alive && !self.target.is_alive() {
            log::info!("target down at ({:.0}, {:.0})", self.target.pos.x, self.target.pos.y);
        }

        despawn_dead_projectiles(&mut self.world);
        report.agents_killed = despawn_dead_agents(&mut self.world);
        report
    }

    // ------------------------------------------------------------------------
    // Target controls
    // ------------------------------------------------------------------------

    /// Move the target by `delta`, split into `substeps` collision-checked
    /// steps so a long dash stops at the first wall instead of tunnelling.
    /// Also turns the target to face along `delta`.
    pub fn move_target(&mut self, delta: Vec2, substeps: u32) {
        if let Some(heading) = heading_of(delta) {
            self.target.facing = heading;
        }
        let steps = substeps.max(1);
        let step = delta / steps as f32;
        for _ in 0..steps {
            self.target.pos = self.grid.resolve_collision(self.target.pos, step);
        }
    }

    pub fn set_target_position(&mut self, pos: Vec2) {
        self.target.pos = pos;
    }

    pub fn set_target_facing(&mut self, facing: f32) {
        self.target.facing = facing;
    }

    /// Fire a player-team shot from the target toward `aim` and turn the
    /// target to face it. Aiming at the target itself fires along its
    /// current facing. Returns `None` once the target is down.
    pub fn fire_projectile(&mut self, aim: Vec2) -> Option<Entity> {
        if !self.target.is_alive() {
            return None;
        }
        let dir = match heading_of(aim - self.target.pos) {
            Some(heading) => {
                self.target.facing = heading;
                heading_vector(heading)
            }
            None => heading_vector(self.target.facing),
        };
        let cfg = &self.config.target;
        let shot = Projectile::new(
            Team::Player,
            self.target.pos + dir * (self.target.radius + MUZZLE_OFFSET),
            dir * cfg.shot_speed,
            cfg.shot_radius,
            cfg.shot_damage,
        )
        .with_ttl(cfg.shot_ttl)
        .with_impulse(cfg.shot_impulse);
        Some(self.world.spawn(shot).id())
    }

    /// Clear Wall tiles inside the circle. A cleared border tile is queued
    /// as a breach for `take_breach`. Returns the number of tiles cleared.
    pub fn carve(&mut self, center: Vec2, radius: f32, preserve_border: bool) -> usize {
        let outcome = self.grid.carve_circle(center, radius, preserve_border);
        if let Some(breach) = outcome.breach {
            log::info!("border breached at tile ({}, {})", breach.tile.x, breach.tile.y);
            self.breaches.push_back(breach);
        }
        outcome.cleared
    }

    /// Oldest unconsumed border breach. Each is returned exactly once.
    pub fn take_breach(&mut self) -> Option<BorderBreach> {
        self.breaches.pop_front()
    }

    // ------------------------------------------------------------------------
    // Views
    // ------------------------------------------------------------------------

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn target(&self) -> &Target {
        &self.target
    }

    pub fn squad_intel(&self, squad: SquadId) -> Option<&SquadIntel> {
        self.squads.get(squad.0 as usize)
    }

    pub fn agent(&self, entity: Entity) -> Option<&Agent> {
        self.world.get::<Agent>(entity)
    }

    pub fn agent_count(&self) -> usize {
        self.agents().len()
    }

    pub fn agents(&self) -> Vec<AgentView> {
        self.world
            .iter_entities()
            .filter_map(|entity| {
                entity.get::<Agent>().map(|agent| AgentView {
                    entity: entity.id(),
                    squad: agent.squad,
                    pos: agent.pos,
                    facing: agent.facing,
                    hp: agent.hp,
                    state: agent.state,
                    flashing: agent.flash_timer > 0.0,
                })
            })
            .collect()
    }

    pub fn projectiles(&self) -> Vec<ProjectileView> {
        self.world
            .iter_entities()
            .filter_map(|entity| entity.get::<Projectile>())
            .map(|shot| ProjectileView {
                pos: shot.pos,
                vel: shot.vel,
                radius: shot.radius,
                team: shot.team,
            })
            .collect()
    }
}

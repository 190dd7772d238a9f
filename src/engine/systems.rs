// World-level passes over ECS entities.
// Each runs once per tick from `Session::tick`, after agents have acted.

use bevy_ecs::prelude::*;
use glam::{IVec2, Vec2};

use super::components::*;
use super::geometry::circle_overlaps_rect;
use super::grid::Grid;

/// Sub-steps per tick for projectile motion, so fast shots don't skip
/// through thin walls.
pub const PROJECTILE_SUBSTEPS: u32 = 2;

/// Damage dealt by one projectile pass.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ProjectileHits {
    pub agents_hit: u32,
    pub target_damage: f32,
}

#[derive(Clone, Copy)]
struct AgentBody {
    entity: Entity,
    pos: Vec2,
    radius: f32,
    hp: f32,
}

struct AgentHit {
    entity: Entity,
    damage: f32,
    source: Vec2,
    impulse: f32,
}

/// True when a circle touches any Wall tile (out of bounds counts as Wall).
pub fn circle_hits_wall(grid: &Grid, center: Vec2, radius: f32) -> bool {
    if grid.is_wall_at(center) {
        return true;
    }
    let ts = grid.tile_size();
    // One ring of out-of-bounds tiles is enough: all of them read as Wall.
    let bound_min = IVec2::NEG_ONE;
    let bound_max = IVec2::new(grid.width(), grid.height());
    let lo = ((center - Vec2::splat(radius)) / ts).floor().as_ivec2().clamp(bound_min, bound_max);
    let hi = ((center + Vec2::splat(radius)) / ts).floor().as_ivec2().clamp(bound_min, bound_max);
    for ty in lo.y..=hi.y {
        for tx in lo.x..=hi.x {
            if !grid.is_wall(tx, ty) {
                continue;
            }
            let min = IVec2::new(tx, ty).as_vec2() * ts;
            if circle_overlaps_rect(center, radius, min, min + Vec2::splat(ts)) {
                return true;
            }
        }
    }
    false
}

/// Move every live projectile, kill it on walls or expiry, and apply hits:
/// squad shots damage the target, player shots damage (and shove) agents.
pub fn projectile_system(
    world: &mut World,
    grid: &Grid,
    target: &mut Target,
    dt: f32,
) -> ProjectileHits {
    let mut bodies: Vec<AgentBody> = world
        .query::<(Entity, &Agent)>()
        .iter(world)
        .filter(|(_, agent)| agent.is_alive())
        .map(|(entity, agent)| AgentBody {
            entity,
            pos: agent.pos,
            radius: agent.config.radius,
            hp: agent.hp,
        })
        .collect();

    let mut hits = ProjectileHits::default();
    let mut agent_hits = Vec::new();
    let step_dt = dt / PROJECTILE_SUBSTEPS as f32;

    let mut query = world.query::<&mut Projectile>();
    for mut shot in query.iter_mut(world) {
        let shot = &mut *shot;
        if !shot.alive {
            continue;
        }
        if let Some(ttl) = shot.ttl.as_mut() {
            *ttl -= dt;
            if *ttl <= 0.0 {
                shot.alive = false;
                continue;
            }
        }

        for _ in 0..PROJECTILE_SUBSTEPS {
            shot.pos += shot.vel * step_dt;
            if circle_hits_wall(grid, shot.pos, shot.radius) {
                shot.alive = false;
                break;
            }

            match shot.team {
                Team::Squad => {
                    let reach = shot.radius + target.radius;
                    if target.is_alive() && shot.pos.distance(target.pos) <= reach {
                        target.take_damage(shot.damage);
                        hits.target_damage += shot.damage;
                        shot.alive = false;
                    }
                }
                Team::Player => {
                    let reach = shot.radius;
                    let pos = shot.pos;
                    let struck = bodies
                        .iter_mut()
                        .find(|b| b.hp > 0.0 && pos.distance(b.pos) <= reach + b.radius);
                    if let Some(body) = struck {
                        body.hp -= shot.damage;
                        agent_hits.push(AgentHit {
                            entity: body.entity,
                            damage: shot.damage,
                            source: pos,
                            impulse: shot.impulse,
                        });
                        shot.alive = false;
                    }
                }
            }
            if !shot.alive {
                break;
            }
        }
    }

    for hit in agent_hits {
        if let Some(mut agent) = world.get_mut::<Agent>(hit.entity) {
            agent.apply_hit(hit.damage, hit.source, hit.impulse);
            hits.agents_hit += 1;
        }
    }
    hits
}

/// Remove projectiles that hit something or expired.
pub fn despawn_dead_projectiles(world: &mut World) -> usize {
    let dead: Vec<Entity> = world
        .query::<(Entity, &Projectile)>()
        .iter(world)
        .filter(|(_, shot)| !shot.alive)
        .map(|(entity, _)| entity)
        .collect();
    for &entity in &dead {
        world.despawn(entity);
    }
    dead.len()
}

/// Remove agents at zero hp. Returns how many were removed.
pub fn despawn_dead_agents(world: &mut World) -> usize {
    let dead: Vec<(Entity, Vec2)> = world
        .query::<(Entity, &Agent)>()
        .iter(world)
        .filter(|(_, agent)| !agent.is_alive())
        .map(|(entity, agent)| (entity, agent.pos))
        .collect();
    for &(entity, pos) in &dead {
        log::info!("agent {entity:?} killed at ({:.0}, {:.0})", pos.x, pos.y);
        world.despawn(entity);
    }
    dead.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AgentConfig, WeaponConfig};
    use crate::squad::intel::SquadId;

    fn open() -> Grid {
        Grid::new_open(20, 20, 32.0)
    }

    fn far_target() -> Target {
        Target::new(Vec2::new(-1000.0, -1000.0), 12.0, 100.0)
    }

    #[test]
    fn wall_overlap_uses_tile_rects() {
        let grid = open();
        // Border wall spans x in [0, 32).
        assert!(circle_hits_wall(&grid, Vec2::new(35.0, 200.0), 4.0));
        assert!(!circle_hits_wall(&grid, Vec2::new(37.0, 200.0), 4.0));
        assert!(!circle_hits_wall(&grid, Vec2::new(320.0, 320.0), 4.0));
        assert!(circle_hits_wall(&grid, Vec2::new(-5000.0, 200.0), 4.0));
        assert!(circle_hits_wall(&grid, Vec2::new(320.0, 1.0e9), 4.0));
    }

    #[test]
    fn projectiles_fly_and_die_on_walls() {
        let grid = open();
        let mut world = World::new();
        let mut target = far_target();
        let shot = world
            .spawn(Projectile::new(
                Team::Squad,
                Vec2::new(320.0, 320.0),
                Vec2::new(600.0, 0.0),
                4.0,
                10.0,
            ))
            .id();

        projectile_system(&mut world, &grid, &mut target, 0.1);
        let p = world.get::<Projectile>(shot).unwrap();
        assert!((p.pos.x - 380.0).abs() < 1e-3);
        assert!(p.alive);

        for _ in 0..10 {
            projectile_system(&mut world, &grid, &mut target, 0.1);
        }
        assert!(!world.get::<Projectile>(shot).unwrap().alive);
        assert_eq!(despawn_dead_projectiles(&mut world), 1);
        assert!(world.get::<Projectile>(shot).is_none());
    }

    #[test]
    fn ttl_expires_projectiles() {
        let grid = open();
        let mut world = World::new();
        let mut target = far_target();
        let shot = world
            .spawn(
                Projectile::new(Team::Player, Vec2::new(320.0, 320.0), Vec2::ZERO, 4.0, 10.0)
                    .with_ttl(0.15),
            )
            .id();
        projectile_system(&mut world, &grid, &mut target, 0.1);
        assert!(world.get::<Projectile>(shot).unwrap().alive);
        projectile_system(&mut world, &grid, &mut target, 0.1);
        assert!(!world.get::<Projectile>(shot).unwrap().alive);
    }

    #[test]
    fn squad_shots_damage_the_target() {
        let grid = open();
        let mut world = World::new();
        let mut target = Target::new(Vec2::new(360.0, 320.0), 12.0, 100.0);
        world.spawn(Projectile::new(
            Team::Squad,
            Vec2::new(320.0, 320.0),
            Vec2::new(400.0, 0.0),
            4.0,
            15.0,
        ));

        let hits = projectile_system(&mut world, &grid, &mut target, 0.1);
        assert_eq!(hits.target_damage, 15.0);
        assert_eq!(target.hp, 85.0);
    }

    #[test]
    fn player_shots_hit_and_shove_agents() {
        let grid = open();
        let mut world = World::new();
        let mut target = far_target();
        let agent = world
            .spawn(Agent::new(
                SquadId(0),
                Vec2::new(350.0, 320.0),
                AgentConfig::default(),
                WeaponConfig::default(),
            ))
            .id();
        world.spawn(
            Projectile::new(
                Team::Player,
                Vec2::new(320.0, 320.0),
                Vec2::new(400.0, 0.0),
                4.0,
                200.0,
            )
            .with_impulse(50.0),
        );

        let hits = projectile_system(&mut world, &grid, &mut target, 0.1);
        assert_eq!(hits.agents_hit, 1);
        assert_eq!(target.hp, 100.0);

        let hit = world.get::<Agent>(agent).unwrap();
        assert_eq!(hit.hp, 0.0);
        assert!(hit.knockback.x > 0.0);

        assert_eq!(despawn_dead_agents(&mut world), 1);
        assert!(world.get::<Agent>(agent).is_none());
    }
}

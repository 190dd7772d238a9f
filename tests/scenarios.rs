// End-to-end checks through the public API: level generation, navigation,
// perception, intel sharing and the session's one-shot events.

use cave_squad::config::{AgentConfig, CaveConfig, GridConfig, SimConfig, WeaponConfig};
use cave_squad::engine::components::{Agent, AgentState};
use cave_squad::engine::grid::{Grid, Tile};
use cave_squad::engine::navigation::{PathError, Pathfinder, has_line_of_sight, step_cost};
use cave_squad::engine::perception::{SightCone, can_perceive};
use cave_squad::generate_cave;
use cave_squad::squad::{SquadId, SquadIntel, Surroundings};
use cave_squad::Session;
use glam::{IVec2, Vec2};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::f32::consts::PI;

// ── Helpers ──────────────────────────────────────────────────────────────

fn cave(seed: u64) -> Grid {
    let grid = GridConfig {
        width: 64,
        height: 48,
        tile_size: 32.0,
    };
    let cave = CaveConfig {
        seed,
        ..CaveConfig::default()
    };
    generate_cave(&grid, &cave)
}

fn floor_tiles(grid: &Grid) -> Vec<IVec2> {
    let mut tiles = Vec::new();
    for ty in 0..grid.height() {
        for tx in 0..grid.width() {
            if !grid.is_wall(tx, ty) {
                tiles.push(IVec2::new(tx, ty));
            }
        }
    }
    tiles
}

// ── Cave generation ──────────────────────────────────────────────────────

#[test]
fn caves_are_one_region_with_intact_border() {
    for seed in [1, 7, 43, 99, 1234, 987_654] {
        let grid = cave(seed);
        assert_eq!(grid.floor_regions().len(), 1, "seed {seed}");
        assert!(grid.border_intact(), "seed {seed}");
        assert!(grid.floor_count() > 0, "seed {seed}");
    }
}

#[test]
fn same_seed_same_cave() {
    assert_eq!(cave(2024), cave(2024));
    assert_ne!(cave(2024).cells(), cave(2025).cells());
}

// ── Navigation ───────────────────────────────────────────────────────────

#[test]
fn paths_between_floor_tiles_are_valid_step_chains() {
    let grid = cave(43);
    let floors = floor_tiles(&grid);
    let mut rng = ChaCha8Rng::seed_from_u64(11);
    let mut pathfinder = Pathfinder::for_grid(&grid);

    for _ in 0..25 {
        let from = floors[rng.gen_range(0..floors.len())];
        let to = floors[rng.gen_range(0..floors.len())];
        let path = pathfinder
            .find_path(&grid, grid.tile_center(from), grid.tile_center(to))
            .unwrap();

        let mut prev = from;
        for waypoint in &path {
            let tile = grid.world_to_tile(*waypoint);
            assert!(step_cost(&grid, prev, tile).is_some(), "{prev} -> {tile}");
            prev = tile;
        }
        assert_eq!(prev, to);
    }
}

#[test]
fn wall_goal_fails() {
    let grid = cave(43);
    let floor = floor_tiles(&grid)[0];
    let mut pathfinder = Pathfinder::new();
    let err = pathfinder
        .find_path(&grid, grid.tile_center(floor), grid.tile_center(IVec2::ZERO))
        .unwrap_err();
    assert_eq!(err, PathError::GoalBlocked);
}

#[test]
fn line_of_sight_is_symmetric_in_caves() {
    let grid = cave(7);
    let floors = floor_tiles(&grid);
    let mut rng = ChaCha8Rng::seed_from_u64(3);
    for _ in 0..500 {
        let a = grid.tile_center(floors[rng.gen_range(0..floors.len())]);
        let b = grid.tile_center(floors[rng.gen_range(0..floors.len())]);
        assert_eq!(has_line_of_sight(&grid, a, b), has_line_of_sight(&grid, b, a));
    }
}

// ── Perception ───────────────────────────────────────────────────────────

#[test]
fn open_room_visibility_depends_on_facing() {
    let grid = Grid::new_open(10, 10, 1.0);
    let cone = SightCone {
        fov_deg: 90.0,
        range: 20.0,
    };
    let agent = grid.tile_center(IVec2::new(1, 1));
    let target = grid.tile_center(IVec2::new(5, 1));

    assert!(can_perceive(&grid, agent, 0.0, &cone, target));
    assert!(!can_perceive(&grid, agent, PI, &cone, target));
}

// ── Terrain events ───────────────────────────────────────────────────────

#[test]
fn border_breach_is_reported_once_at_tile_center() {
    let grid = Grid::new_open(12, 12, 32.0);
    let mut session = Session::with_grid(SimConfig::default(), grid).unwrap();
    let cell = IVec2::new(11, 4);
    let center = session.grid().tile_center(cell);

    session.carve(center, 32.0, false);
    assert_eq!(session.grid().tile(cell), Some(Tile::Floor));
    assert!(!session.grid().border_intact());

    let breach = session.take_breach().unwrap();
    assert_eq!(breach.tile, cell);
    assert_eq!(breach.position, center);
    assert!(session.take_breach().is_none());
}

// ── Intel sharing ────────────────────────────────────────────────────────

#[test]
fn intel_only_searcher_returns_to_patrol_after_expiry() {
    let grid = Grid::new_open(30, 20, 32.0);
    let mut pathfinder = Pathfinder::for_grid(&grid);
    let mut intel = SquadIntel::default();
    let mut rng = ChaCha8Rng::seed_from_u64(8);
    let dt = 1.0 / 60.0;

    let spotter_pos = grid.tile_center(IVec2::new(3, 10));
    let mut spotter =
        Agent::new(SquadId(0), spotter_pos, AgentConfig::default(), WeaponConfig::default());
    let listener_pos = grid.tile_center(IVec2::new(3, 3));
    let mut listener =
        Agent::new(SquadId(0), listener_pos, AgentConfig::default(), WeaponConfig::default())
            .with_facing(PI);
    let target = grid.tile_center(IVec2::new(12, 10));

    let mut step = |agent: &mut Agent, intel: &mut SquadIntel, seen: Option<Vec2>| {
        let mut env = Surroundings {
            grid: &grid,
            pathfinder: &mut pathfinder,
            intel,
            sighting_ttl: 2.5,
            rng: &mut rng,
        };
        agent.think(dt, seen, &mut env)
    };

    // One sighting, then the target is gone for everyone.
    assert!(step(&mut spotter, &mut intel, Some(target)));
    assert!(!step(&mut listener, &mut intel, None));
    assert!((intel.time_to_live() - 2.5).abs() < 1e-6);
    assert_eq!(listener.state, AgentState::Search);

    for _ in 0..180 {
        intel.decay(dt);
        step(&mut spotter, &mut intel, None);
        step(&mut listener, &mut intel, None);
    }

    assert!(!intel.is_fresh());
    assert_eq!(intel.time_to_live(), 0.0);
    assert_eq!(listener.state, AgentState::Patrol);
    assert_eq!(spotter.state, AgentState::Patrol);
}

#[test]
fn squads_keep_separate_intel() {
    let grid = Grid::new_open(40, 20, 32.0);
    let mut session = Session::with_grid(SimConfig::default(), grid).unwrap();
    session.set_target_position(Vec2::new(600.0, 320.0));
    let watchers = session.add_squad();
    let blind = session.add_squad();
    session.spawn_agent(watchers, Vec2::new(300.0, 320.0), 0.0);
    session.spawn_agent(blind, Vec2::new(900.0, 100.0), 0.0);

    session.tick(1.0 / 60.0);
    assert!(session.squad_intel(watchers).unwrap().is_fresh());
    assert!(!session.squad_intel(blind).unwrap().is_fresh());
}

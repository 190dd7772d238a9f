// Grid pathfinding and line of sight.
//
// Pathfinder: A* over the 8-connected tile grid.
//   - Axis steps cost 10, diagonal steps 14.
//   - A diagonal step is refused when either orthogonal corner tile is a wall.
//   - Heuristic is Manhattan distance * 10.
//   - Open-set ties break on lowest h, then insertion order, so equal-cost
//     routes always resolve the same way.
//
// Line of sight: Bresenham rasterization between the tiles containing the two
// endpoints. Any wall tile on the line (endpoints included) blocks sight.
// This tests tile membership, not exact segment-vs-rectangle clipping.

use glam::{IVec2, Vec2};
use std::cmp::Reverse;
use std::collections::BinaryHeap;
use thiserror::Error;

use super::grid::{Grid, all_neighbors};

// ============================================================================
// CONSTANTS
// ============================================================================

pub const AXIS_COST: u32 = 10;
pub const DIAGONAL_COST: u32 = 14;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum PathError {
    #[error("goal tile is a wall")]
    GoalBlocked,
    #[error("goal is not reachable from start")]
    Unreachable,
}

// ============================================================================
// SEARCH SCRATCH
// ============================================================================

/// Per-cell bookkeeping reused across queries.
///
/// Instead of clearing every array per search, each cell records the search
/// generation that last touched it; stale entries read as "unvisited".
#[derive(Debug, Default)]
pub struct SearchScratch {
    g_cost: Vec<u32>,
    parent: Vec<u32>,
    seen: Vec<u32>,
    closed: Vec<u32>,
    generation: u32,
}

impl SearchScratch {
    pub fn with_capacity(cells: usize) -> Self {
        let mut scratch = Self::default();
        scratch.resize(cells);
        scratch
    }

    fn resize(&mut self, cells: usize) {
        self.g_cost = vec![u32::MAX; cells];
        self.parent = vec![u32::MAX; cells];
        self.seen = vec![0; cells];
        self.closed = vec![0; cells];
        self.generation = 0;
    }

    /// Start a new search over `cells` cells.
    fn begin(&mut self, cells: usize) {
        if self.seen.len() != cells {
            self.resize(cells);
        }
        self.generation = self.generation.wrapping_add(1);
        if self.generation == 0 {
            // Wrapped: old stamps could alias the new generation.
            self.seen.fill(0);
            self.closed.fill(0);
            self.generation = 1;
        }
    }

    #[inline]
    fn g(&self, idx: usize) -> u32 {
        if self.seen[idx] == self.generation { self.g_cost[idx] } else { u32::MAX }
    }

    #[inline]
    fn relax(&mut self, idx: usize, g: u32, parent: usize) {
        self.seen[idx] = self.generation;
        self.g_cost[idx] = g;
        self.parent[idx] = parent as u32;
    }

    #[inline]
    fn is_closed(&self, idx: usize) -> bool {
        self.closed[idx] == self.generation
    }

    #[inline]
    fn close(&mut self, idx: usize) {
        self.closed[idx] = self.generation;
    }
}

// ============================================================================
// PATHFINDER
// ============================================================================

#[derive(Debug, Default)]
pub struct Pathfinder {
    scratch: SearchScratch,
    /// Open-set entries pushed over the pathfinder's lifetime; breaks ties.
    pushes: u64,
}

impl Pathfinder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pathfinder with scratch space pre-sized for `grid`.
    pub fn for_grid(grid: &Grid) -> Self {
        Self {
            scratch: SearchScratch::with_capacity(grid.cells().len()),
            pushes: 0,
        }
    }

    /// Find a route between the tiles containing `start` and `goal`.
    ///
    /// The result holds world-space tile centers in travel order, excluding
    /// the start tile and ending with the goal tile. Start and goal in the
    /// same tile yields an empty path.
    pub fn find_path(
        &mut self,
        grid: &Grid,
        start: Vec2,
        goal: Vec2,
    ) -> Result<Vec<Vec2>, PathError> {
        let start_tile = grid.world_to_tile(start);
        let goal_tile = grid.world_to_tile(goal);

        if grid.is_wall_tile(goal_tile) {
            return Err(PathError::GoalBlocked);
        }
        if !grid.in_bounds(start_tile) {
            return Err(PathError::Unreachable);
        }
        if start_tile == goal_tile {
            return Ok(Vec::new());
        }

        self.scratch.begin(grid.cells().len());
        let start_idx = grid.index(start_tile);
        let goal_idx = grid.index(goal_tile);

        // (f, h, insertion order, cell)
        let mut open: BinaryHeap<Reverse<(u32, u32, u64, usize)>> = BinaryHeap::new();
        self.scratch.relax(start_idx, 0, start_idx);
        let h0 = heuristic(start_tile, goal_tile);
        open.push(Reverse((h0, h0, self.next_seq(), start_idx)));

        while let Some(Reverse((_, _, _, idx))) = open.pop() {
            if self.scratch.is_closed(idx) {
                continue;
            }
            self.scratch.close(idx);
            if idx == goal_idx {
                return Ok(self.reconstruct(grid, start_idx, goal_idx));
            }

            let tile = grid.tile_at_index(idx);
            let g = self.scratch.g(idx);
            for nb in all_neighbors(tile) {
                let Some(step) = step_cost(grid, tile, nb) else {
                    continue;
                };
                let ni = grid.index(nb);
                if self.scratch.is_closed(ni) {
                    continue;
                }
                let cost = g + step;
                if cost < self.scratch.g(ni) {
                    self.scratch.relax(ni, cost, idx);
                    let h = heuristic(nb, goal_tile);
                    open.push(Reverse((cost + h, h, self.next_seq(), ni)));
                }
            }
        }

        Err(PathError::Unreachable)
    }

    fn next_seq(&mut self) -> u64 {
        self.pushes += 1;
        self.pushes
    }

    fn reconstruct(&self, grid: &Grid, start_idx: usize, goal_idx: usize) -> Vec<Vec2> {
        let mut tiles = Vec::new();
        let mut idx = goal_idx;
        while idx != start_idx {
            tiles.push(grid.tile_at_index(idx));
            idx = self.scratch.parent[idx] as usize;
        }
        tiles.reverse();
        tiles.into_iter().map(|t| grid.tile_center(t)).collect()
    }
}

#[inline]
fn heuristic(a: IVec2, b: IVec2) -> u32 {
    let d = (a - b).abs();
    (d.x + d.y) as u32 * AXIS_COST
}

/// Cost of a single step between adjacent tiles, or `None` if the step is
/// blocked (wall destination or a diagonal that cuts a wall corner).
pub fn step_cost(grid: &Grid, from: IVec2, to: IVec2) -> Option<u32> {
    let d = to - from;
    if d == IVec2::ZERO || d.x.abs() > 1 || d.y.abs() > 1 || grid.is_wall_tile(to) {
        return None;
    }
    if d.x != 0 && d.y != 0 {
        if grid.is_wall(from.x + d.x, from.y) || grid.is_wall(from.x, from.y + d.y) {
            return None;
        }
        Some(DIAGONAL_COST)
    } else {
        Some(AXIS_COST)
    }
}

// ============================================================================
// LINE OF SIGHT
// ============================================================================

/// True when no wall tile lies on the rasterized line between the tiles
/// containing `a` and `b`.
///
/// The line is always walked from the lexicographically smaller tile, so
/// `has_line_of_sight(a, b) == has_line_of_sight(b, a)`.
pub fn has_line_of_sight(grid: &Grid, a: Vec2, b: Vec2) -> bool {
    let ta = grid.world_to_tile(a);
    let tb = grid.world_to_tile(b);
    let (from, to) = if (ta.x, ta.y) <= (tb.x, tb.y) { (ta, tb) } else { (tb, ta) };
    line_tiles(from, to).all(|t| !grid.is_wall_tile(t))
}

/// Tiles visited by an integer Bresenham line, both endpoints included.
pub fn line_tiles(from: IVec2, to: IVec2) -> impl Iterator<Item = IVec2> {
    let dx = (to.x - from.x).abs();
    let dy = -(to.y - from.y).abs();
    let step = IVec2::new((to.x - from.x).signum(), (to.y - from.y).signum());
    let mut err = dx + dy;
    let mut cur = Some(from);

    std::iter::from_fn(move || {
        let tile = cur?;
        if tile == to {
            cur = None;
        } else {
            let mut next = tile;
            let e2 = 2 * err;
            if e2 >= dy {
                err += dy;
                next.x += step.x;
            }
            if e2 <= dx {
                err += dx;
                next.y += step.y;
            }
            cur = Some(next);
        }
        Some(tile)
    })
}

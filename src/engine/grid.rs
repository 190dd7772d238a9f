// Tile occupancy grid.
//
// Owns the Floor/Wall array for one level. Everything else reads it through
// the queries here; only the cave generator and carve operations mutate it.
// Tile (tx, ty) covers world [tx * tile_size .. (tx + 1) * tile_size) on X
// and the same on Y, so the world origin is the grid's top-left corner.

use glam::{IVec2, Vec2};
use rand::Rng;
use std::collections::VecDeque;

// ============================================================================
// TILES
// ============================================================================

/// Occupancy of a single cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Tile {
    Floor,
    Wall,
}

impl Tile {
    #[inline]
    pub fn is_wall(self) -> bool {
        matches!(self, Tile::Wall)
    }
}

/// A border Wall tile that a carve turned into Floor.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BorderBreach {
    pub tile: IVec2,
    /// World-space center of the breached tile.
    pub position: Vec2,
}

/// Result of [`Grid::carve_circle`].
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct CarveOutcome {
    /// Number of Wall tiles converted to Floor.
    pub cleared: usize,
    /// First border tile cleared in row-major order, if any.
    pub breach: Option<BorderBreach>,
}

// ============================================================================
// GRID
// ============================================================================

#[derive(Clone, Debug, PartialEq)]
pub struct Grid {
    cells: Vec<Tile>,
    width: i32,
    height: i32,
    tile_size: f32,
}

impl Grid {
    /// Grid with every cell set to `tile`.
    pub fn filled(width: u32, height: u32, tile_size: f32, tile: Tile) -> Self {
        Self {
            cells: vec![tile; width as usize * height as usize],
            width: width as i32,
            height: height as i32,
            tile_size,
        }
    }

    /// Open room: Wall border ring, Floor everywhere inside.
    pub fn new_open(width: u32, height: u32, tile_size: f32) -> Self {
        let mut grid = Self::filled(width, height, tile_size, Tile::Floor);
        for ty in 0..grid.height {
            for tx in 0..grid.width {
                if grid.is_border(tx, ty) {
                    grid.set(IVec2::new(tx, ty), Tile::Wall);
                }
            }
        }
        grid
    }

    #[inline]
    pub fn width(&self) -> i32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> i32 {
        self.height
    }

    #[inline]
    pub fn tile_size(&self) -> f32 {
        self.tile_size
    }

    /// Row-major cell array, `width * height` long. Read-only view for renderers.
    pub fn cells(&self) -> &[Tile] {
        &self.cells
    }

    #[inline]
    pub fn in_bounds(&self, tile: IVec2) -> bool {
        tile.x >= 0 && tile.y >= 0 && tile.x < self.width && tile.y < self.height
    }

    #[inline]
    pub(crate) fn index(&self, tile: IVec2) -> usize {
        (tile.y * self.width + tile.x) as usize
    }

    #[inline]
    pub(crate) fn tile_at_index(&self, idx: usize) -> IVec2 {
        IVec2::new(idx as i32 % self.width, idx as i32 / self.width)
    }

    pub fn tile(&self, tile: IVec2) -> Option<Tile> {
        self.in_bounds(tile).then(|| self.cells[self.index(tile)])
    }

    /// Overwrite a cell. Out-of-bounds writes are ignored.
    pub fn set(&mut self, tile: IVec2, value: Tile) {
        if self.in_bounds(tile) {
            let idx = self.index(tile);
            self.cells[idx] = value;
        }
    }

    /// Out-of-bounds tiles count as Wall.
    #[inline]
    pub fn is_wall(&self, tx: i32, ty: i32) -> bool {
        self.tile(IVec2::new(tx, ty)).is_none_or(Tile::is_wall)
    }

    #[inline]
    pub fn is_wall_tile(&self, tile: IVec2) -> bool {
        self.is_wall(tile.x, tile.y)
    }

    /// True for the outer ring of in-bounds tiles, whatever they hold.
    #[inline]
    pub fn is_border(&self, tx: i32, ty: i32) -> bool {
        self.in_bounds(IVec2::new(tx, ty))
            && (tx == 0 || ty == 0 || tx == self.width - 1 || ty == self.height - 1)
    }

    /// Tile containing a world-space point. May be out of bounds.
    #[inline]
    pub fn world_to_tile(&self, pos: Vec2) -> IVec2 {
        (pos / self.tile_size).floor().as_ivec2()
    }

    /// World-space center of a tile.
    #[inline]
    pub fn tile_center(&self, tile: IVec2) -> Vec2 {
        (tile.as_vec2() + Vec2::splat(0.5)) * self.tile_size
    }

    /// True if the tile containing `pos` is a wall.
    #[inline]
    pub fn is_wall_at(&self, pos: Vec2) -> bool {
        self.is_wall_tile(self.world_to_tile(pos))
    }

    pub fn floor_count(&self) -> usize {
        self.cells.iter().filter(|t| !t.is_wall()).count()
    }

    /// Whether every border tile is still Wall.
    pub fn border_intact(&self) -> bool {
        (0..self.height)
            .flat_map(|ty| (0..self.width).map(move |tx| (tx, ty)))
            .filter(|&(tx, ty)| self.is_border(tx, ty))
            .all(|(tx, ty)| self.is_wall(tx, ty))
    }

    // ------------------------------------------------------------------------
    // Mutation
    // ------------------------------------------------------------------------

    /// Clear every Wall tile whose center lies strictly within `radius` of
    /// `center`. Border tiles are skipped when `preserve_border` is set;
    /// otherwise clearing one is reported as a breach.
    pub fn carve_circle(
        &mut self,
        center: Vec2,
        radius: f32,
        preserve_border: bool,
    ) -> CarveOutcome {
        let mut outcome = CarveOutcome::default();
        if radius <= 0.0 {
            return outcome;
        }

        let min = self.world_to_tile(center - Vec2::splat(radius)).max(IVec2::ZERO);
        let max = self
            .world_to_tile(center + Vec2::splat(radius))
            .min(IVec2::new(self.width - 1, self.height - 1));
        let radius_sq = radius * radius;

        for ty in min.y..=max.y {
            for tx in min.x..=max.x {
                let tile = IVec2::new(tx, ty);
                if !self.is_wall_tile(tile) {
                    continue;
                }
                if self.tile_center(tile).distance_squared(center) >= radius_sq {
                    continue;
                }
                let border = self.is_border(tx, ty);
                if border && preserve_border {
                    continue;
                }
                self.set(tile, Tile::Floor);
                outcome.cleared += 1;
                if border && outcome.breach.is_none() {
                    outcome.breach = Some(BorderBreach {
                        tile,
                        position: self.tile_center(tile),
                    });
                }
            }
        }

        if outcome.cleared > 0 {
            log::debug!(
                "carved {} tiles at ({:.1}, {:.1}) r={:.1}",
                outcome.cleared,
                center.x,
                center.y,
                radius
            );
        }
        outcome
    }

    /// Discrete move: apply `delta` to `pos` unless the destination tile is a
    /// wall, in which case the whole move is rejected. No sliding and no
    /// sub-stepping; callers wanting smoother motion split `delta` themselves.
    pub fn resolve_collision(&self, pos: Vec2, delta: Vec2) -> Vec2 {
        let next = pos + delta;
        if self.is_wall_at(next) { pos } else { next }
    }

    // ------------------------------------------------------------------------
    // Regions
    // ------------------------------------------------------------------------

    /// Connected Floor regions (4-directional), border tiles excluded.
    /// Each region is a list of cell indices; regions come out in row-major
    /// order of their first cell.
    pub fn floor_regions(&self) -> Vec<Vec<usize>> {
        let mut visited = vec![false; self.cells.len()];
        let mut regions = Vec::new();
        let mut queue = VecDeque::new();

        for start in 0..self.cells.len() {
            if visited[start] || !self.is_region_cell(self.tile_at_index(start)) {
                continue;
            }
            visited[start] = true;
            queue.push_back(start);
            let mut region = Vec::new();

            while let Some(idx) = queue.pop_front() {
                region.push(idx);
                for nb in cardinal_neighbors(self.tile_at_index(idx)) {
                    if !self.is_region_cell(nb) {
                        continue;
                    }
                    let ni = self.index(nb);
                    if !visited[ni] {
                        visited[ni] = true;
                        queue.push_back(ni);
                    }
                }
            }
            regions.push(region);
        }
        regions
    }

    /// Wall in every Floor region except the largest (first one wins a tie).
    /// Returns the number of tiles converted.
    pub fn keep_largest_region(&mut self) -> usize {
        let regions = self.floor_regions();
        let Some(largest) = regions
            .iter()
            .enumerate()
            .max_by(|(ia, a), (ib, b)| a.len().cmp(&b.len()).then(ib.cmp(ia)))
            .map(|(i, _)| i)
        else {
            return 0;
        };

        let mut filled = 0;
        for (i, region) in regions.iter().enumerate() {
            if i == largest {
                continue;
            }
            for &idx in region {
                self.cells[idx] = Tile::Wall;
                filled += 1;
            }
        }
        filled
    }

    #[inline]
    fn is_region_cell(&self, tile: IVec2) -> bool {
        !self.is_border(tile.x, tile.y) && !self.is_wall_tile(tile)
    }

    // ------------------------------------------------------------------------
    // Spawn helpers
    // ------------------------------------------------------------------------

    /// Floor tile closest to the map center, or `None` on a solid map.
    pub fn floor_tile_near_center(&self) -> Option<IVec2> {
        let center = IVec2::new(self.width / 2, self.height / 2);
        (0..self.cells.len())
            .map(|idx| self.tile_at_index(idx))
            .filter(|&t| !self.is_wall_tile(t))
            .min_by_key(|&t| (t - center).length_squared())
    }

    /// World-space center of [`Self::floor_tile_near_center`], falling back to
    /// the geometric center of the map.
    pub fn floor_near_center(&self) -> Vec2 {
        match self.floor_tile_near_center() {
            Some(tile) => self.tile_center(tile),
            None => Vec2::new(self.width as f32, self.height as f32) * self.tile_size * 0.5,
        }
    }

    /// Center of a uniformly chosen Floor tile.
    pub fn random_floor_position<R: Rng>(&self, rng: &mut R) -> Option<Vec2> {
        let floors: Vec<usize> = (0..self.cells.len())
            .filter(|&i| !self.cells[i].is_wall())
            .collect();
        if floors.is_empty() {
            return None;
        }
        let idx = floors[rng.gen_range(0..floors.len())];
        Some(self.tile_center(self.tile_at_index(idx)))
    }
}

// ============================================================================
// NEIGHBOR ITERATORS
// ============================================================================

/// The four cardinal (N/S/E/W) neighbors of a tile. Not bounds-checked.
pub(crate) fn cardinal_neighbors(tile: IVec2) -> impl Iterator<Item = IVec2> {
    [IVec2::NEG_X, IVec2::X, IVec2::NEG_Y, IVec2::Y]
        .into_iter()
        .map(move |d| tile + d)
}

/// All eight neighbors of a tile. Not bounds-checked.
pub(crate) fn all_neighbors(tile: IVec2) -> impl Iterator<Item = IVec2> {
    [
        (-1, -1), (0, -1), (1, -1),
        (-1,  0),          (1,  0),
        (-1,  1), (0,  1), (1,  1),
    ]
    .into_iter()
    .map(move |(dx, dy)| tile + IVec2::new(dx, dy))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn out_of_bounds_is_wall() {
        let grid = Grid::new_open(10, 10, 32.0);
        assert!(grid.is_wall(-1, 3));
        assert!(grid.is_wall(10, 3));
        assert!(grid.is_wall(0, 0));
        assert!(!grid.is_wall(5, 5));
    }

    #[test]
    fn border_is_independent_of_content() {
        let mut grid = Grid::new_open(6, 6, 1.0);
        grid.set(IVec2::new(0, 3), Tile::Floor);
        assert!(grid.is_border(0, 3));
        assert!(grid.is_border(5, 5));
        assert!(!grid.is_border(1, 1));
        assert!(!grid.is_border(-1, 0));
        assert!(!grid.border_intact());
    }

    #[test]
    fn world_tile_round_trip() {
        let grid = Grid::new_open(10, 10, 32.0);
        let tile = grid.world_to_tile(Vec2::new(70.0, 10.0));
        assert_eq!(tile, IVec2::new(2, 0));
        assert_eq!(grid.tile_center(tile), Vec2::new(80.0, 16.0));
        assert_eq!(grid.world_to_tile(Vec2::new(-0.5, 3.0)), IVec2::new(-1, 0));
    }

    #[test]
    fn carve_preserving_border_never_breaches() {
        let mut grid = Grid::filled(8, 8, 1.0, Tile::Wall);
        let outcome = grid.carve_circle(Vec2::new(0.5, 4.5), 2.0, true);
        assert!(outcome.breach.is_none());
        assert!(grid.is_wall(0, 4));
        assert!(!grid.is_wall(1, 4));
        assert!(grid.border_intact());
    }

    #[test]
    fn carve_reports_breach_once() {
        let mut grid = Grid::new_open(10, 10, 32.0);
        let center = grid.tile_center(IVec2::new(9, 4));

        let first = grid.carve_circle(center, 32.0, false);
        assert_eq!(first.cleared, 1);
        let breach = first.breach.expect("border tile was cleared");
        assert_eq!(breach.tile, IVec2::new(9, 4));
        assert_eq!(breach.position, center);
        assert!(!grid.is_wall(9, 4));

        let second = grid.carve_circle(center, 32.0, false);
        assert_eq!(second.cleared, 0);
        assert!(second.breach.is_none());
    }

    #[test]
    fn collision_rejects_whole_move_into_wall() {
        let grid = Grid::new_open(5, 5, 10.0);
        let pos = Vec2::new(15.0, 15.0);
        assert_eq!(grid.resolve_collision(pos, Vec2::new(-8.0, 0.0)), pos);
        assert_eq!(grid.resolve_collision(pos, Vec2::new(4.0, 2.0)), Vec2::new(19.0, 17.0));
    }

    #[test]
    fn regions_split_by_wall_column() {
        let mut grid = Grid::new_open(9, 5, 1.0);
        for ty in 0..5 {
            grid.set(IVec2::new(3, ty), Tile::Wall);
        }
        let regions = grid.floor_regions();
        assert_eq!(regions.len(), 2);
        assert_eq!(regions[0].len(), 2 * 3);
        assert_eq!(regions[1].len(), 4 * 3);

        assert_eq!(grid.keep_largest_region(), 6);
        assert_eq!(grid.floor_regions().len(), 1);
        assert!(grid.is_wall(1, 1));
        assert!(!grid.is_wall(5, 2));
    }

    #[test]
    fn diagonal_contact_does_not_join_regions() {
        let mut grid = Grid::filled(6, 6, 1.0, Tile::Wall);
        grid.set(IVec2::new(1, 1), Tile::Floor);
        grid.set(IVec2::new(2, 2), Tile::Floor);
        assert_eq!(grid.floor_regions().len(), 2);
    }

    #[test]
    fn spawn_helpers_land_on_floor() {
        let mut grid = Grid::filled(9, 9, 2.0, Tile::Wall);
        assert!(grid.floor_tile_near_center().is_none());
        grid.set(IVec2::new(2, 6), Tile::Floor);
        assert_eq!(grid.floor_tile_near_center(), Some(IVec2::new(2, 6)));

        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let pos = grid.random_floor_position(&mut rng).unwrap();
        assert_eq!(pos, grid.tile_center(IVec2::new(2, 6)));
    }
}

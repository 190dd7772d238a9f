// Vision cone + line-of-sight checks and the per-agent memory they feed.

use glam::Vec2;

use super::geometry::{EPSILON, direction_or_zero, heading_vector, within_cone};
use super::grid::Grid;
use super::navigation::has_line_of_sight;

/// Field of view and sight distance of an observer.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SightCone {
    pub fov_deg: f32,
    pub range: f32,
}

impl SightCone {
    #[inline]
    pub fn half_angle(&self) -> f32 {
        (self.fov_deg * 0.5).to_radians()
    }

    /// Range + cone test only, no occlusion.
    ///
    /// A target at the observer's own position has no direction and always
    /// passes the cone test. The cone edge itself counts as inside.
    pub fn contains(&self, origin: Vec2, facing: f32, target: Vec2) -> bool {
        let to_target = target - origin;
        let dist = to_target.length();
        if dist > self.range {
            return false;
        }
        if dist <= EPSILON {
            return true;
        }
        within_cone(heading_vector(facing), direction_or_zero(to_target), self.half_angle())
    }
}

/// Full visibility test: within range, within the cone, and not occluded.
pub fn can_perceive(
    grid: &Grid,
    origin: Vec2,
    facing: f32,
    cone: &SightCone,
    target: Vec2,
) -> bool {
    cone.contains(origin, facing, target) && has_line_of_sight(grid, origin, target)
}

// ============================================================================
// MEMORY
// ============================================================================

/// What one agent personally remembers about the target.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct TargetMemory {
    /// Seconds left before the sighting is forgotten.
    pub remaining: f32,
    pub last_known: Option<Vec2>,
}

impl TargetMemory {
    pub fn refresh(&mut self, position: Vec2, duration: f32) {
        self.remaining = duration;
        self.last_known = Some(position);
    }

    pub fn decay(&mut self, dt: f32) {
        self.remaining = (self.remaining - dt).max(0.0);
    }

    #[inline]
    pub fn is_fresh(&self) -> bool {
        self.remaining > 0.0
    }

    /// Last known position while the memory is still fresh.
    pub fn recall(&self) -> Option<Vec2> {
        if self.is_fresh() { self.last_known } else { None }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::IVec2;
    use std::f32::consts::PI;

    fn tile(grid: &Grid, tx: i32, ty: i32) -> Vec2 {
        grid.tile_center(IVec2::new(tx, ty))
    }

    #[test]
    fn facing_decides_visibility_in_open_room() {
        let grid = Grid::new_open(10, 10, 1.0);
        let cone = SightCone { fov_deg: 90.0, range: 20.0 };
        let agent = tile(&grid, 1, 1);
        let target = tile(&grid, 5, 1);

        assert!(can_perceive(&grid, agent, 0.0, &cone, target));
        assert!(!can_perceive(&grid, agent, PI, &cone, target));
    }

    #[test]
    fn coincident_target_is_seen_regardless_of_facing() {
        let grid = Grid::new_open(10, 10, 1.0);
        let cone = SightCone { fov_deg: 10.0, range: 5.0 };
        let agent = tile(&grid, 4, 4);
        for facing in [0.0, 1.0, PI, -2.0] {
            assert!(can_perceive(&grid, agent, facing, &cone, agent));
        }
    }

    #[test]
    fn range_is_inclusive() {
        let cone = SightCone { fov_deg: 90.0, range: 4.0 };
        let origin = Vec2::new(1.0, 1.0);
        assert!(cone.contains(origin, 0.0, Vec2::new(5.0, 1.0)));
        assert!(!cone.contains(origin, 0.0, Vec2::new(5.01, 1.0)));
    }

    #[test]
    fn cone_edge_is_included() {
        let cone = SightCone { fov_deg: 120.0, range: 100.0 };
        let half = cone.half_angle();
        let on_edge = Vec2::new(half.cos(), half.sin());
        assert!(within_cone(Vec2::X, on_edge, half));

        let outside = Vec2::new((half + 1e-3).cos(), (half + 1e-3).sin());
        assert!(!within_cone(Vec2::X, outside, half));
    }

    #[test]
    fn walls_occlude() {
        let mut grid = Grid::new_open(10, 10, 1.0);
        grid.set(IVec2::new(3, 1), crate::engine::grid::Tile::Wall);
        let cone = SightCone { fov_deg: 90.0, range: 20.0 };
        assert!(!can_perceive(&grid, tile(&grid, 1, 1), 0.0, &cone, tile(&grid, 5, 1)));
    }

    #[test]
    fn memory_decays_to_zero_and_forgets() {
        let mut memory = TargetMemory::default();
        assert_eq!(memory.recall(), None);
        memory.refresh(Vec2::new(3.0, 4.0), 1.0);
        memory.decay(0.6);
        assert_eq!(memory.recall(), Some(Vec2::new(3.0, 4.0)));
        memory.decay(0.6);
        assert_eq!(memory.remaining, 0.0);
        assert_eq!(memory.recall(), None);
        assert_eq!(memory.last_known, Some(Vec2::new(3.0, 4.0)));
    }
}

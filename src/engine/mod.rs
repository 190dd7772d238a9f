// Engine module - level, navigation and sensing building blocks
// Nothing here knows about squads; see `crate::squad` for behaviour.

pub mod cave;
pub mod components;
pub mod geometry;
pub mod grid;
pub mod navigation;
pub mod perception;
pub mod systems;

// Re-export commonly used items
pub use components::*;
pub use grid::{BorderBreach, CarveOutcome, Grid, Tile};
pub use navigation::{PathError, Pathfinder};

// Squad-based enemy AI on a procedurally generated tile cave.
//
// `engine` holds the level (grid, cave generator, A*, line of sight) and the
// ECS components; `squad` holds agent behaviour; `Session` ties them into a
// steppable simulation.

pub mod config;
pub mod engine;
pub mod session;
pub mod squad;

pub use config::{ConfigError, SimConfig};
pub use engine::cave::generate_cave;
pub use engine::{AgentState, Grid, PathError, Pathfinder, Tile};
pub use session::{AgentView, ProjectileView, Session, TickReport};
pub use squad::{SquadId, SquadIntel};

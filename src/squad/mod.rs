// Squad behaviour: shared intel, per-agent state machine, fire control.

pub mod brain;
pub mod combat;
pub mod intel;

pub use brain::Surroundings;
pub use combat::SquadmateSnapshot;
pub use intel::{SquadId, SquadIntel};

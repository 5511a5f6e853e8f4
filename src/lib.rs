pub mod modules;

pub use modules::agent::{Agent, DeathCause, Lineage, marker_radius};
pub use modules::behavior::{Behavior, Candidate, CardinalForager, RadiusForager, Turn, best_candidate};
pub use modules::config::{DEFAULT_POPULATION, Endowment, ModelConfig, Span, Traits};
pub use modules::error::{ErrorKind, Result, ScapeError};
pub use modules::grid::{AgentId, Cell, Position, Sugar, SugarGrid};
pub use modules::model::{Model, Placement, RunSummary, Status, StepOutcome};
pub use modules::scape::{CapacityGrid, Orientation};
pub use modules::stats::{StatsCollector, TickEvents, TickStats, gini};
pub use modules::view::{AgentSnapshot, RunReport, WorldSnapshot, load_snapshot, save_json};

use std::collections::BTreeMap;
use std::collections::HashSet;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, trace};

use crate::modules::agent::{Agent, DeathCause, Lineage};
use crate::modules::behavior::{Behavior, CardinalForager};
use crate::modules::config::ModelConfig;
use crate::modules::error::{Result, ScapeError};
use crate::modules::grid::{AgentId, Position, SugarGrid};
use crate::modules::scape::CapacityGrid;
use crate::modules::stats::{StatsCollector, TickEvents, TickStats};
use crate::modules::view::WorldSnapshot;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Status {
    Ready,
    /// Terminal: the population is gone.
    Halted,
    /// Terminal: a tick returned an error and the state is no longer trusted.
    Failed,
}

/// Where the initial population goes.
#[derive(Clone, Copy, Debug)]
pub enum Placement<'a> {
    /// Distinct cells drawn from the seeded rng.
    Random,
    /// Exactly these cells; agent ids follow slice order.
    Fixed(&'a [Position]),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StepOutcome {
    Advanced { tick: u64, events: TickEvents },
    /// Nothing happened; the model had already halted or failed at `tick`.
    Halted { tick: u64 },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RunSummary {
    pub ticks_run: u64,
    pub final_tick: u64,
    pub population: usize,
    pub halted: bool,
}

/// The scheduler: owns the scape, the population, the seeded rng and the stats.
#[derive(Debug)]
pub struct Model<B: Behavior = CardinalForager> {
    behavior: B,
    config: ModelConfig,
    grid: SugarGrid,
    agents: BTreeMap<AgentId, Agent>,
    rng: StdRng,
    stats: StatsCollector,
    tick: u64,
    status: Status,
    next_agent_id: AgentId,
}

impl<B: Behavior + Default> Model<B> {
    pub fn initialize(config: ModelConfig, capacity: &CapacityGrid) -> Result<Self> {
        Self::with_behavior(B::default(), config, capacity, Placement::Random)
    }

    pub fn initialize_at(
        config: ModelConfig,
        capacity: &CapacityGrid,
        positions: &[Position],
    ) -> Result<Self> {
        Self::with_behavior(B::default(), config, capacity, Placement::Fixed(positions))
    }
}

impl<B: Behavior> Model<B> {
    pub fn with_behavior(
        behavior: B,
        config: ModelConfig,
        capacity: &CapacityGrid,
        placement: Placement<'_>,
    ) -> Result<Self> {
        config.validate()?;
        let available = capacity.width() * capacity.height();
        if config.population > available {
            return Err(ScapeError::PopulationExceedsCells {
                requested: config.population,
                available,
            });
        }

        let mut model = Self {
            behavior,
            grid: SugarGrid::from_capacity(capacity),
            agents: BTreeMap::new(),
            rng: StdRng::seed_from_u64(config.seed),
            stats: StatsCollector::new(),
            tick: 0,
            status: Status::Ready,
            next_agent_id: 1,
            config,
        };

        let spots: Vec<Position> = match placement {
            Placement::Random => {
                let free = model.grid.free_cells();
                free.choose_multiple(&mut model.rng, model.config.population)
                    .copied()
                    .collect()
            }
            Placement::Fixed(positions) => {
                if positions.len() != model.config.population {
                    return Err(ScapeError::InvalidConfig(format!(
                        "{} fixed placements given for a population of {}",
                        positions.len(),
                        model.config.population
                    )));
                }
                positions.to_vec()
            }
        };

        for spot in spots {
            // place() rejects duplicates and out-of-bounds fixed positions
            model.spawn(spot, Lineage::Original).map_err(|e| match e {
                ScapeError::InvariantViolation(msg) => {
                    ScapeError::InvalidConfig(format!("initial placement: {}", msg))
                }
                ScapeError::OutOfBounds { x, y, .. } => ScapeError::InvalidConfig(format!(
                    "initial placement ({}, {}) is outside the scape",
                    x, y
                )),
                other => other,
            })?;
        }

        model
            .stats
            .record(0, model.agents.values(), &model.grid, TickEvents::default());

        info!(
            behavior = model.behavior.name(),
            width = model.grid.width(),
            height = model.grid.height(),
            population = model.agents.len(),
            growback = model.config.growback_rate,
            replace = model.config.replace,
            aging = model.config.aging,
            seed = model.config.seed,
            "model initialized"
        );

        Ok(model)
    }

    fn spawn(&mut self, position: Position, lineage: Lineage) -> Result<AgentId> {
        let traits = self.config.endowment.draw(&mut self.rng);
        let id = self.next_agent_id;
        self.grid.place(id, position)?;
        self.next_agent_id += 1;

        let agent = Agent::new(id, position, traits, lineage);
        debug!(
            agent_id = id,
            x = position.x,
            y = position.y,
            sugar = agent.sugar,
            metabolism = agent.metabolism,
            vision = agent.vision,
            lineage = %lineage,
            "agent spawned"
        );
        self.agents.insert(id, agent);
        Ok(id)
    }

    /// Advances one tick: regrow, activate in id order, cull, replace, record.
    ///
    /// An error leaves the tick half-applied, so the model moves to
    /// [`Status::Failed`] and every later call is a no-op.
    pub fn step(&mut self) -> Result<StepOutcome> {
        if self.is_halted() {
            debug!(tick = self.tick, status = ?self.status, "step on halted model ignored");
            return Ok(StepOutcome::Halted { tick: self.tick });
        }

        self.advance().inspect_err(|err| {
            self.status = Status::Failed;
            error!(tick = self.tick, %err, "tick failed; model halted");
        })
    }

    fn advance(&mut self) -> Result<StepOutcome> {
        self.grid.regrow(self.config.growback_rate);

        // Sequential activation: each agent sees every earlier agent's move.
        let order: Vec<AgentId> = self.agents.keys().copied().collect();
        for id in order {
            let Some(agent) = self.agents.get_mut(&id) else {
                continue;
            };
            let turn = self.behavior.act(agent, &mut self.grid, self.config.aging)?;
            trace!(
                agent_id = id,
                from_x = turn.from.x,
                from_y = turn.from.y,
                to_x = turn.to.x,
                to_y = turn.to.y,
                harvested = turn.harvested,
                sugar = agent.sugar,
                "agent turn"
            );
        }

        let mut events = TickEvents::default();
        let doomed: Vec<(AgentId, DeathCause)> = self
            .agents
            .values()
            .filter_map(|a| a.death_cause(self.config.aging).map(|cause| (a.id, cause)))
            .collect();

        for &(id, cause) in &doomed {
            if let Some(agent) = self.agents.remove(&id) {
                self.grid.vacate(id, agent.position)?;
                events.record_death(cause);
                debug!(
                    agent_id = id,
                    ?cause,
                    age = agent.age,
                    sugar = agent.sugar,
                    lineage = %agent.lineage,
                    "agent died"
                );
            }
        }

        if self.config.replace && !doomed.is_empty() {
            let mut free = self.grid.free_cells();
            for _ in 0..doomed.len() {
                if free.is_empty() {
                    events.skipped_replacements += 1;
                    continue;
                }
                let spot = free.swap_remove(self.rng.gen_range(0..free.len()));
                self.spawn(spot, Lineage::Replacement)?;
                events.spawned += 1;
            }
        }

        self.tick += 1;

        if cfg!(debug_assertions) {
            self.check_invariants()?;
        }

        self.stats
            .record(self.tick, self.agents.values(), &self.grid, events);

        if self.agents.is_empty() {
            self.status = Status::Halted;
            info!(tick = self.tick, "population extinct; model halted");
        }

        Ok(StepOutcome::Advanced {
            tick: self.tick,
            events,
        })
    }

    /// Steps until halted or `max_ticks` ticks have run.
    pub fn run(&mut self, max_ticks: u64) -> Result<RunSummary> {
        let mut ticks_run = 0;
        while ticks_run < max_ticks {
            match self.step()? {
                StepOutcome::Advanced { .. } => ticks_run += 1,
                StepOutcome::Halted { .. } => break,
            }
            if self.is_halted() {
                break;
            }
        }

        Ok(RunSummary {
            ticks_run,
            final_tick: self.tick,
            population: self.agents.len(),
            halted: self.is_halted(),
        })
    }

    /// Cell levels within capacity and a one-to-one agent/cell occupancy.
    pub fn check_invariants(&self) -> Result<()> {
        self.grid.check_levels()?;

        let mut seen = HashSet::with_capacity(self.agents.len());
        for agent in self.agents.values() {
            if !seen.insert(agent.position) {
                return Err(ScapeError::InvariantViolation(format!(
                    "two agents share ({}, {})",
                    agent.position.x, agent.position.y
                )));
            }
            let recorded = self.grid.occupant(agent.position)?;
            if recorded != Some(agent.id) {
                return Err(ScapeError::InvariantViolation(format!(
                    "agent {} at ({}, {}) but cell records {:?}",
                    agent.id, agent.position.x, agent.position.y, recorded
                )));
            }
        }

        let occupied = self
            .grid
            .cells()
            .iter()
            .filter(|c| c.occupant.is_some())
            .count();
        if occupied != self.agents.len() {
            return Err(ScapeError::InvariantViolation(format!(
                "{} occupied cells for {} agents",
                occupied,
                self.agents.len()
            )));
        }
        Ok(())
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn status(&self) -> Status {
        self.status
    }

    /// True once the model is extinct or failed; `step()` no longer advances.
    pub fn is_halted(&self) -> bool {
        matches!(self.status, Status::Halted | Status::Failed)
    }

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    pub fn behavior(&self) -> &B {
        &self.behavior
    }

    pub fn grid(&self) -> &SugarGrid {
        &self.grid
    }

    pub fn population(&self) -> usize {
        self.agents.len()
    }

    /// Agents in activation (ascending id) order.
    pub fn agents(&self) -> impl Iterator<Item = &Agent> {
        self.agents.values()
    }

    pub fn agent(&self, id: AgentId) -> Option<&Agent> {
        self.agents.get(&id)
    }

    pub fn stats(&self) -> &[TickStats] {
        self.stats.entries()
    }

    pub fn snapshot(&self) -> WorldSnapshot {
        WorldSnapshot::capture(self.tick, &self.grid, self.agents.values())
    }
}

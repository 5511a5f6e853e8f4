//! Foraging rules: how an agent sees the scape, picks a cell and takes its turn.
//!
//! The model is generic over [`Behavior`], so the neighborhood shape is fixed
//! at compile time for a run. [`CardinalForager`] is the classic rule and the
//! default: the agent looks along the four axis-aligned rays out to `vision`
//! cells. [`RadiusForager`] sees the full square of Chebyshev radius `vision`.
//!
//! In both shapes the agent's own cell is a candidate at distance 0, other
//! occupied cells are skipped (a ray keeps going past them), and nothing wraps
//! at the grid edge. Among candidates the most sugar wins, then the shortest
//! distance, then the lowest `(x, y)`.

use std::cmp::Reverse;

use crate::modules::agent::Agent;
use crate::modules::error::Result;
use crate::modules::grid::{AgentId, Position, Sugar, SugarGrid};

const CARDINAL_DIRECTIONS: [(i32, i32); 4] = [(1, 0), (-1, 0), (0, 1), (0, -1)];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Candidate {
    pub position: Position,
    pub sugar: Sugar,
    pub distance: u32,
}

/// What one agent did during its activation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Turn {
    pub agent_id: AgentId,
    pub from: Position,
    pub to: Position,
    pub harvested: Sugar,
}

impl Turn {
    pub fn moved(&self) -> bool {
        self.from != self.to
    }
}

/// Deterministic pick: most sugar, then nearest, then lowest `(x, y)`.
pub fn best_candidate(candidates: &[Candidate]) -> Option<Candidate> {
    candidates
        .iter()
        .copied()
        .min_by_key(|c| (Reverse(c.sugar), c.distance, c.position))
}

pub trait Behavior {
    /// Short name for logs and reports.
    fn name(&self) -> &'static str;

    /// Cells the agent may move to, always including its own.
    fn perceive(&self, agent: &Agent, grid: &SugarGrid) -> Result<Vec<Candidate>>;

    fn choose(&self, candidates: &[Candidate]) -> Option<Candidate> {
        best_candidate(candidates)
    }

    /// Move, harvest, pay metabolism, then age if enabled.
    fn act(&self, agent: &mut Agent, grid: &mut SugarGrid, aging: bool) -> Result<Turn> {
        let candidates = self.perceive(agent, grid)?;
        let from = agent.position;
        let to = self.choose(&candidates).map_or(from, |c| c.position);

        grid.relocate(agent.id, from, to)?;
        agent.position = to;

        let harvested = grid.harvest(to)?;
        agent.gain(harvested);
        agent.metabolize();
        if aging {
            agent.grow_older();
        }

        Ok(Turn {
            agent_id: agent.id,
            from,
            to,
            harvested,
        })
    }
}

fn own_cell(agent: &Agent, grid: &SugarGrid) -> Result<Candidate> {
    Ok(Candidate {
        position: agent.position,
        sugar: grid.sugar_at(agent.position)?,
        distance: 0,
    })
}

/// Vision never needs to exceed the longest grid side.
fn reach(vision: u32, grid: &SugarGrid) -> i32 {
    let longest = grid.width().max(grid.height()).min(i32::MAX as usize) as u32;
    vision.min(longest) as i32
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CardinalForager;

impl Behavior for CardinalForager {
    fn name(&self) -> &'static str {
        "cardinal"
    }

    fn perceive(&self, agent: &Agent, grid: &SugarGrid) -> Result<Vec<Candidate>> {
        let origin = agent.position;
        let reach = reach(agent.vision, grid);
        let mut candidates = vec![own_cell(agent, grid)?];

        for (dx, dy) in CARDINAL_DIRECTIONS {
            for step in 1..=reach {
                let pos = origin.offset(dx * step, dy * step);
                if !grid.contains(pos) {
                    break;
                }
                let cell = grid.cell(pos)?;
                if cell.occupant.is_some() {
                    continue;
                }
                candidates.push(Candidate {
                    position: pos,
                    sugar: cell.current,
                    distance: origin.manhattan(pos),
                });
            }
        }

        Ok(candidates)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RadiusForager;

impl Behavior for RadiusForager {
    fn name(&self) -> &'static str {
        "radius"
    }

    fn perceive(&self, agent: &Agent, grid: &SugarGrid) -> Result<Vec<Candidate>> {
        let origin = agent.position;
        let reach = reach(agent.vision, grid);
        let mut candidates = vec![own_cell(agent, grid)?];

        for dy in -reach..=reach {
            for dx in -reach..=reach {
                let pos = origin.offset(dx, dy);
                if pos == origin || !grid.contains(pos) {
                    continue;
                }
                let cell = grid.cell(pos)?;
                if cell.occupant.is_some() {
                    continue;
                }
                candidates.push(Candidate {
                    position: pos,
                    sugar: cell.current,
                    distance: origin.chebyshev(pos),
                });
            }
        }

        Ok(candidates)
    }
}

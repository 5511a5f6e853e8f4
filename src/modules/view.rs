use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::modules::agent::{Agent, Lineage, marker_radius};
use crate::modules::config::ModelConfig;
use crate::modules::error::Result;
use crate::modules::grid::{AgentId, Position, Sugar, SugarGrid};
use crate::modules::stats::TickStats;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentSnapshot {
    pub id: AgentId,
    pub position: Position,
    pub sugar: i64,
    pub metabolism: u32,
    pub vision: u32,
    pub age: u32,
    pub max_age: Option<u32>,
    pub lineage: Lineage,
    pub color: String,
    pub radius: f64,
}

impl From<&Agent> for AgentSnapshot {
    fn from(a: &Agent) -> Self {
        Self {
            id: a.id,
            position: a.position,
            sugar: a.sugar,
            metabolism: a.metabolism,
            vision: a.vision,
            age: a.age,
            max_age: a.max_age,
            lineage: a.lineage,
            color: a.lineage.display_color().to_string(),
            radius: marker_radius(a.sugar),
        }
    }
}

/// Settled post-tick state for renderers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldSnapshot {
    pub tick: u64,
    pub width: usize,
    pub height: usize,
    /// Current sugar per cell, row-major with `y = 0` first.
    pub sugar: Vec<Sugar>,
    pub agents: Vec<AgentSnapshot>,
}

impl WorldSnapshot {
    pub fn capture<'a>(
        tick: u64,
        grid: &SugarGrid,
        agents: impl IntoIterator<Item = &'a Agent>,
    ) -> Self {
        let mut agents: Vec<AgentSnapshot> = agents.into_iter().map(AgentSnapshot::from).collect();
        agents.sort_by_key(|a| a.id);
        Self {
            tick,
            width: grid.width(),
            height: grid.height(),
            sugar: grid.cells().iter().map(|c| c.current).collect(),
            agents,
        }
    }

    pub fn sugar_at(&self, x: usize, y: usize) -> Option<Sugar> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.sugar.get(y * self.width + x).copied()
    }
}

/// Everything a chart consumer needs from one run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub behavior: String,
    pub halted: bool,
    pub config: ModelConfig,
    pub ticks: Vec<TickStats>,
}

pub fn save_json<T: Serialize>(path: &Path, value: &T) -> Result<PathBuf> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let json = serde_json::to_vec_pretty(value)?;
    fs::write(path, json)?;
    Ok(path.to_path_buf())
}

pub fn load_snapshot(path: &Path) -> Result<WorldSnapshot> {
    let bytes = fs::read(path)?;
    Ok(serde_json::from_slice(&bytes)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::config::Traits;
    use crate::modules::scape::CapacityGrid;

    #[test]
    fn capture_orders_agents_and_projects_lineage() {
        let grid = SugarGrid::from_capacity(&CapacityGrid::from_rows(vec![vec![1, 2], vec![3, 4]]).unwrap());
        let traits = Traits {
            sugar: 50,
            metabolism: 1,
            vision: 1,
            max_age: None,
        };
        let agents = [
            Agent::new(7, Position::new(1, 1), traits, Lineage::Replacement),
            Agent::new(2, Position::new(0, 0), traits, Lineage::Original),
        ];

        let snap = WorldSnapshot::capture(3, &grid, &agents);
        assert_eq!(snap.tick, 3);
        assert_eq!(snap.sugar, vec![1, 2, 3, 4]);
        assert_eq!(snap.sugar_at(1, 1), Some(4));
        assert_eq!(snap.sugar_at(2, 0), None);
        assert_eq!(snap.sugar_at(0, 2), None);
        assert_eq!(snap.sugar_at(0, usize::MAX), None);
        assert_eq!(snap.agents.iter().map(|a| a.id).collect::<Vec<_>>(), vec![2, 7]);
        assert_eq!(snap.agents[0].color, "red");
        assert_eq!(snap.agents[1].color, "green");
        assert!((snap.agents[0].radius - 1.0).abs() < 1e-9);
    }

    #[test]
    fn snapshot_serializes_lineage_lowercase() {
        let grid = SugarGrid::from_capacity(&CapacityGrid::from_rows(vec![vec![0]]).unwrap());
        let agent = Agent::new(
            1,
            Position::new(0, 0),
            Traits {
                sugar: 5,
                metabolism: 1,
                vision: 1,
                max_age: Some(60),
            },
            Lineage::Original,
        );
        let snap = WorldSnapshot::capture(0, &grid, [&agent]);
        let json = serde_json::to_value(&snap).unwrap();
        assert_eq!(json["agents"][0]["lineage"], "original");
        let back: WorldSnapshot = serde_json::from_value(json).unwrap();
        assert_eq!(back, snap);
    }
}

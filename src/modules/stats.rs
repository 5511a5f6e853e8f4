use serde::{Deserialize, Serialize};

use crate::modules::agent::{Agent, DeathCause, Lineage};
use crate::modules::grid::SugarGrid;

/// Population churn within one tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickEvents {
    pub deaths_starved: u32,
    pub deaths_aged: u32,
    pub spawned: u32,
    /// Replacements owed but dropped because no cell was free.
    pub skipped_replacements: u32,
}

impl TickEvents {
    pub fn record_death(&mut self, cause: DeathCause) {
        match cause {
            DeathCause::Starved => self.deaths_starved = self.deaths_starved.saturating_add(1),
            DeathCause::OldAge => self.deaths_aged = self.deaths_aged.saturating_add(1),
        }
    }

    pub fn deaths(&self) -> u32 {
        self.deaths_starved.saturating_add(self.deaths_aged)
    }
}

/// Aggregates over the settled population at the end of a tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickStats {
    pub tick: u64,
    pub population: usize,
    pub originals: usize,
    pub replacements: usize,
    pub mean_metabolism: f64,
    pub mean_vision: f64,
    pub mean_sugar: f64,
    pub mean_age: f64,
    /// Gini coefficient of agent sugar holdings.
    pub gini: f64,
    /// Sugar left standing on the grid.
    pub grid_sugar: u64,
    #[serde(flatten)]
    pub events: TickEvents,
}

/// Append-only, one entry per recorded tick.
#[derive(Debug, Clone, Default)]
pub struct StatsCollector {
    entries: Vec<TickStats>,
}

impl StatsCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record<'a>(
        &mut self,
        tick: u64,
        agents: impl IntoIterator<Item = &'a Agent>,
        grid: &SugarGrid,
        events: TickEvents,
    ) -> &TickStats {
        let agents: Vec<&Agent> = agents.into_iter().collect();
        let population = agents.len();
        let originals = agents
            .iter()
            .filter(|a| a.lineage == Lineage::Original)
            .count();
        let sugars: Vec<i64> = agents.iter().map(|a| a.sugar).collect();

        self.entries.push(TickStats {
            tick,
            population,
            originals,
            replacements: population - originals,
            mean_metabolism: mean(agents.iter().map(|a| a.metabolism as f64)),
            mean_vision: mean(agents.iter().map(|a| a.vision as f64)),
            mean_sugar: mean(sugars.iter().map(|&s| s as f64)),
            mean_age: mean(agents.iter().map(|a| a.age as f64)),
            gini: gini(&sugars),
            grid_sugar: grid.total_sugar(),
            events,
        });
        &self.entries[self.entries.len() - 1]
    }

    pub fn entries(&self) -> &[TickStats] {
        &self.entries
    }

    pub fn latest(&self) -> Option<&TickStats> {
        self.entries.last()
    }
}

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, count) = values.fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    if count == 0 { 0.0 } else { sum / count as f64 }
}

/// Gini over non-negative holdings; 0 for empty or all-zero populations.
pub fn gini(holdings: &[i64]) -> f64 {
    let mut sorted: Vec<f64> = holdings.iter().map(|&h| h.max(0) as f64).collect();
    let total: f64 = sorted.iter().sum();
    if sorted.is_empty() || total <= 0.0 {
        return 0.0;
    }
    sorted.sort_by(f64::total_cmp);
    let n = sorted.len() as f64;
    let weighted: f64 = sorted
        .iter()
        .enumerate()
        .map(|(i, v)| (i as f64 + 1.0) * v)
        .sum();
    (2.0 * weighted) / (n * total) - (n + 1.0) / n
}

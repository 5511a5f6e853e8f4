use std::fmt;

use serde::{Deserialize, Serialize};

use crate::modules::config::Traits;
use crate::modules::grid::{AgentId, Position, Sugar};

/// Whether an agent was placed at initialization or spawned to replace a death.
/// Cosmetic: nothing in the simulation branches on it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Lineage {
    Original,
    Replacement,
}

impl Lineage {
    pub const fn label(self) -> &'static str {
        match self {
            Lineage::Original => "original",
            Lineage::Replacement => "replacement",
        }
    }

    /// Display color for renderers.
    pub const fn display_color(self) -> &'static str {
        match self {
            Lineage::Original => "red",
            Lineage::Replacement => "green",
        }
    }
}

impl fmt::Display for Lineage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeathCause {
    Starved,
    OldAge,
}

/// Marker radius for a renderer: `log10(sugar / 5)` clamped to `[0, 3]`.
pub fn marker_radius(sugar: i64) -> f64 {
    if sugar <= 0 {
        return 0.0;
    }
    (sugar as f64 / 5.0).log10().clamp(0.0, 3.0)
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Agent {
    pub id: AgentId,
    pub position: Position,
    /// Negative only between the metabolism charge and the death pass.
    pub sugar: i64,
    pub metabolism: u32,
    pub vision: u32,
    pub age: u32,
    pub max_age: Option<u32>,
    pub lineage: Lineage,
}

impl Agent {
    pub fn new(id: AgentId, position: Position, traits: Traits, lineage: Lineage) -> Self {
        Self {
            id,
            position,
            sugar: traits.sugar as i64,
            metabolism: traits.metabolism,
            vision: traits.vision,
            age: 0,
            max_age: traits.max_age,
            lineage,
        }
    }

    pub fn gain(&mut self, amount: Sugar) {
        self.sugar = self.sugar.saturating_add(amount as i64);
    }

    pub fn metabolize(&mut self) {
        self.sugar = self.sugar.saturating_sub(self.metabolism as i64);
    }

    pub fn grow_older(&mut self) {
        self.age = self.age.saturating_add(1);
    }

    pub const fn is_starved(&self) -> bool {
        self.sugar < 0
    }

    pub fn outlived(&self) -> bool {
        self.max_age.is_some_and(|max| self.age > max)
    }

    /// Starvation wins when both apply.
    pub fn death_cause(&self, aging: bool) -> Option<DeathCause> {
        if self.is_starved() {
            Some(DeathCause::Starved)
        } else if aging && self.outlived() {
            Some(DeathCause::OldAge)
        } else {
            None
        }
    }
}

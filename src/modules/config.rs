use std::fs;
use std::ops::RangeInclusive;
use std::path::Path;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::modules::error::{Result, ScapeError};
use crate::modules::grid::Sugar;

/// Default initial population, matching the reference slider.
pub const DEFAULT_POPULATION: usize = 100;

/// Inclusive `lo..=hi` draw range.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    pub lo: u32,
    pub hi: u32,
}

impl Span {
    pub const fn new(lo: u32, hi: u32) -> Self {
        Self { lo, hi }
    }

    pub const fn fixed(value: u32) -> Self {
        Self {
            lo: value,
            hi: value,
        }
    }

    pub fn range(self) -> RangeInclusive<u32> {
        self.lo..=self.hi
    }

    pub fn draw<R: Rng>(self, rng: &mut R) -> u32 {
        rng.gen_range(self.range())
    }

    fn validate(self, field: &'static str, min_lo: u32) -> Result<()> {
        if self.lo > self.hi || self.lo < min_lo {
            return Err(ScapeError::InvalidEndowment {
                field,
                lo: self.lo,
                hi: self.hi,
            });
        }
        Ok(())
    }
}

/// Draw rules for the traits of every new agent, original or replacement.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Endowment {
    pub sugar: Span,
    pub metabolism: Span,
    pub vision: Span,
    /// `None` means agents never die of age.
    pub max_age: Option<Span>,
}

impl Default for Endowment {
    fn default() -> Self {
        Self {
            sugar: Span::new(5, 25),
            metabolism: Span::new(1, 4),
            vision: Span::new(1, 6),
            max_age: Some(Span::new(60, 100)),
        }
    }
}

/// One draw from an [`Endowment`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Traits {
    pub sugar: Sugar,
    pub metabolism: u32,
    pub vision: u32,
    pub max_age: Option<u32>,
}

impl Endowment {
    pub fn validate(&self) -> Result<()> {
        self.sugar.validate("sugar", 0)?;
        self.metabolism.validate("metabolism", 1)?;
        self.vision.validate("vision", 1)?;
        if let Some(max_age) = self.max_age {
            max_age.validate("max_age", 1)?;
        }
        Ok(())
    }

    /// Draw order is fixed (sugar, metabolism, vision, max_age) so seeded runs replay.
    pub fn draw<R: Rng>(&self, rng: &mut R) -> Traits {
        Traits {
            sugar: self.sugar.draw(rng),
            metabolism: self.metabolism.draw(rng),
            vision: self.vision.draw(rng),
            max_age: self.max_age.map(|span| span.draw(rng)),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Initial population (N).
    pub population: usize,
    /// Sugar added to every cell per tick, capped at capacity.
    pub growback_rate: Sugar,
    /// Spawn a replacement for every agent that dies.
    pub replace: bool,
    /// Agents age each tick and die once past `max_age`.
    pub aging: bool,
    /// Seed for placement and trait draws.
    pub seed: u64,
    pub endowment: Endowment,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            population: DEFAULT_POPULATION,
            growback_rate: 0,
            replace: false,
            aging: true,
            seed: 0,
            endowment: Endowment::default(),
        }
    }
}

impl ModelConfig {
    /// Checks everything that does not depend on the scape.
    pub fn validate(&self) -> Result<()> {
        if self.population == 0 {
            return Err(ScapeError::EmptyPopulation);
        }
        self.endowment.validate()
    }

    pub fn load(path: &Path) -> Result<Self> {
        let bytes = fs::read(path)?;
        if bytes.is_empty() {
            return Ok(Self::default());
        }
        let config: ModelConfig = serde_json::from_slice(&bytes).map_err(|e| {
            ScapeError::InvalidConfig(format!(
                "failed to parse config file {}: {}",
                path.display(),
                e
            ))
        })?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;

    #[test]
    fn defaults_match_classic_rules() {
        let config = ModelConfig::default();
        assert_eq!(config.population, 100);
        assert_eq!(config.growback_rate, 0);
        assert!(!config.replace);
        assert!(config.aging);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn zero_population_rejected() {
        let config = ModelConfig {
            population: 0,
            ..ModelConfig::default()
        };
        assert!(matches!(config.validate(), Err(ScapeError::EmptyPopulation)));
    }

    #[test]
    fn inverted_or_zero_ranges_rejected() {
        let mut endowment = Endowment::default();
        endowment.vision = Span::new(3, 2);
        assert!(matches!(
            endowment.validate(),
            Err(ScapeError::InvalidEndowment { field: "vision", .. })
        ));

        let mut endowment = Endowment::default();
        endowment.metabolism = Span::fixed(0);
        assert!(matches!(
            endowment.validate(),
            Err(ScapeError::InvalidEndowment {
                field: "metabolism",
                ..
            })
        ));

        let mut endowment = Endowment::default();
        endowment.sugar = Span::fixed(0);
        assert!(endowment.validate().is_ok());
    }

    #[test]
    fn draws_stay_in_range_and_replay() {
        let endowment = Endowment::default();
        let mut a = StdRng::seed_from_u64(7);
        let mut b = StdRng::seed_from_u64(7);
        for _ in 0..200 {
            let t = endowment.draw(&mut a);
            assert_eq!(t, endowment.draw(&mut b));
            assert!((5..=25).contains(&t.sugar));
            assert!((1..=4).contains(&t.metabolism));
            assert!((1..=6).contains(&t.vision));
            assert!(t.max_age.is_some_and(|age| (60..=100).contains(&age)));
        }
    }

    #[test]
    fn unbounded_lifespan_draws_none() {
        let endowment = Endowment {
            max_age: None,
            ..Endowment::default()
        };
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(endowment.draw(&mut rng).max_age, None);
    }

    #[test]
    fn partial_json_fills_defaults() {
        let config: ModelConfig =
            serde_json::from_str(r#"{"population": 12, "replace": true}"#).unwrap();
        assert_eq!(config.population, 12);
        assert!(config.replace);
        assert!(config.aging);
        assert_eq!(config.endowment, Endowment::default());
    }
}

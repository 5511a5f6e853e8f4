use std::path::PathBuf;

use chrono::Utc;
use clap::{ArgAction, Args};
use sugarscape::{
    Behavior, CardinalForager, Model, ModelConfig, Placement, RadiusForager, RunReport,
    StepOutcome, TickStats, save_json,
};
use tracing::{debug, info};

use super::{Neighborhood, ScapeSource, output_dir};

#[derive(Args, Debug)]
pub struct RunArgs {
    #[command(flatten)]
    pub source: ScapeSource,
    /// JSON model config; flags below override individual fields
    #[arg(short = 'c', long)]
    pub config: Option<PathBuf>,
    /// Initial population (N)
    #[arg(short = 'n', long)]
    pub agents: Option<usize>,
    /// Sugar regrown per cell per tick
    #[arg(short = 'g', long)]
    pub growback: Option<u32>,
    /// Replace every dead agent with a fresh one
    #[arg(long, action = ArgAction::SetTrue, conflicts_with = "no_replace")]
    pub replace: bool,
    /// Let the population die out without replacements
    #[arg(long, action = ArgAction::SetTrue)]
    pub no_replace: bool,
    /// Agents age and die past their lifespan
    #[arg(long, action = ArgAction::SetTrue, conflicts_with = "no_aging")]
    pub aging: bool,
    /// Disable aging (no deaths from old age)
    #[arg(long, action = ArgAction::SetTrue)]
    pub no_aging: bool,
    /// RNG seed for placement and trait draws
    #[arg(long)]
    pub seed: Option<u64>,
    /// Perception neighborhood
    #[arg(long, value_enum, default_value_t = Neighborhood::Cardinal)]
    pub neighborhood: Neighborhood,
    /// Number of ticks to run (stops early if the population dies out)
    #[arg(short = 't', long, default_value_t = 200)]
    pub ticks: u64,
    /// Directory for stats.json and snapshot.json
    #[arg(short = 'o', long)]
    pub out: Option<PathBuf>,
    /// Also write a snapshot every N ticks (0 disables)
    #[arg(long, default_value_t = 0)]
    pub snapshot_every: u64,
    /// Log a progress line every N ticks
    #[arg(long, default_value_t = 25)]
    pub log_every: u64,
}

impl RunArgs {
    fn model_config(&self) -> Result<ModelConfig, String> {
        let mut config = match &self.config {
            Some(path) => ModelConfig::load(path).map_err(|e| e.to_string())?,
            None => ModelConfig::default(),
        };
        self.apply_overrides(&mut config);
        Ok(config)
    }

    /// Flags win over the config file; unset flags leave it alone.
    fn apply_overrides(&self, config: &mut ModelConfig) {
        if let Some(n) = self.agents {
            config.population = n;
        }
        if let Some(rate) = self.growback {
            config.growback_rate = rate;
        }
        if let Some(replace) = switch(self.replace, self.no_replace) {
            config.replace = replace;
        }
        if let Some(aging) = switch(self.aging, self.no_aging) {
            config.aging = aging;
        }
        if let Some(seed) = self.seed {
            config.seed = seed;
        }
    }
}

fn switch(on: bool, off: bool) -> Option<bool> {
    match (on, off) {
        (true, _) => Some(true),
        (_, true) => Some(false),
        _ => None,
    }
}

pub(super) fn run_simulation(args: RunArgs) -> Result<(), String> {
    match args.neighborhood {
        Neighborhood::Cardinal => drive(CardinalForager, &args),
        Neighborhood::Radius => drive(RadiusForager, &args),
    }
}

fn drive<B: Behavior>(behavior: B, args: &RunArgs) -> Result<(), String> {
    let config = args.model_config()?;
    let capacity = args.source.load()?;
    info!(
        scape = %args.source.describe(),
        width = capacity.width(),
        height = capacity.height(),
        total_capacity = capacity.total(),
        "scape loaded"
    );

    let started_at = Utc::now();
    let mut model = Model::with_behavior(behavior, config, &capacity, Placement::Random)
        .map_err(|e| format!("initialize: {}", e))?;

    let out_dir = args.out.clone().unwrap_or_else(output_dir);
    let snapshots_dir = out_dir.join("snapshots");

    for _ in 0..args.ticks {
        let outcome = model.step().map_err(|e| e.to_string())?;
        let StepOutcome::Advanced { tick, events } = outcome else {
            break;
        };

        if events.deaths() > 0 || events.spawned > 0 {
            debug!(
                tick,
                starved = events.deaths_starved,
                aged = events.deaths_aged,
                spawned = events.spawned,
                skipped = events.skipped_replacements,
                "population churn"
            );
        }
        if args.log_every > 0 && tick % args.log_every == 0 {
            if let Some(stats) = model.stats().last() {
                log_progress(stats);
            }
        }
        if args.snapshot_every > 0 && tick % args.snapshot_every == 0 {
            let path = snapshots_dir.join(format!("tick_{:06}.json", tick));
            save_json(&path, &model.snapshot()).map_err(|e| e.to_string())?;
        }
        if model.is_halted() {
            break;
        }
    }

    let report = RunReport {
        started_at,
        finished_at: Utc::now(),
        behavior: model.behavior().name().to_string(),
        halted: model.is_halted(),
        config: model.config().clone(),
        ticks: model.stats().to_vec(),
    };
    let stats_path =
        save_json(&out_dir.join("stats.json"), &report).map_err(|e| e.to_string())?;
    let snapshot_path =
        save_json(&out_dir.join("snapshot.json"), &model.snapshot()).map_err(|e| e.to_string())?;

    print_summary(&report);
    println!("Stats written to {}", stats_path.display());
    println!("Final snapshot written to {}", snapshot_path.display());
    Ok(())
}

fn log_progress(stats: &TickStats) {
    info!(
        tick = stats.tick,
        population = stats.population,
        mean_metabolism = stats.mean_metabolism,
        mean_vision = stats.mean_vision,
        mean_sugar = stats.mean_sugar,
        gini = stats.gini,
        "tick"
    );
}

fn print_summary(report: &RunReport) {
    let Some(last) = report.ticks.last() else {
        return;
    };
    let first = &report.ticks[0];
    let starved: u64 = report.ticks.iter().map(|t| t.events.deaths_starved as u64).sum();
    let aged: u64 = report.ticks.iter().map(|t| t.events.deaths_aged as u64).sum();
    let spawned: u64 = report.ticks.iter().map(|t| t.events.spawned as u64).sum();

    println!(
        "Run finished at tick {} ({}) | neighborhood={}",
        last.tick,
        if report.halted { "halted: population extinct" } else { "tick limit" },
        report.behavior
    );
    println!(
        " population      : {} -> {} (originals {}, replacements {})",
        first.population, last.population, last.originals, last.replacements
    );
    println!(
        " mean metabolism : {:.3} -> {:.3}",
        first.mean_metabolism, last.mean_metabolism
    );
    println!(
        " mean vision     : {:.3} -> {:.3}",
        first.mean_vision, last.mean_vision
    );
    println!(" mean sugar      : {:.2} -> {:.2}", first.mean_sugar, last.mean_sugar);
    println!(" gini            : {:.3} -> {:.3}", first.gini, last.gini);
    println!(" deaths          : {} starved, {} aged | {} replacements spawned", starved, aged, spawned);
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;
    use crate::commands::{Cli, Command};

    fn run_args(flags: &[&str]) -> RunArgs {
        let mut argv = vec!["sugarscape", "run"];
        argv.extend_from_slice(flags);
        match Cli::try_parse_from(argv).unwrap().command {
            Command::Run(args) => args,
            Command::Scape { .. } => panic!("expected the run command"),
        }
    }

    #[test]
    fn flags_can_turn_config_switches_either_way() {
        let from_file = ModelConfig {
            replace: true,
            aging: false,
            ..ModelConfig::default()
        };

        let mut config = from_file.clone();
        run_args(&["--no-replace", "--aging"]).apply_overrides(&mut config);
        assert!(!config.replace);
        assert!(config.aging);

        let mut config = ModelConfig::default();
        run_args(&["--replace", "--no-aging", "-n", "7"]).apply_overrides(&mut config);
        assert!(config.replace);
        assert!(!config.aging);
        assert_eq!(config.population, 7);
    }

    #[test]
    fn unset_flags_keep_the_config_file() {
        let from_file = ModelConfig {
            replace: true,
            aging: false,
            seed: 9,
            ..ModelConfig::default()
        };
        let mut config = from_file.clone();
        run_args(&[]).apply_overrides(&mut config);
        assert_eq!(config, from_file);
    }

    #[test]
    fn contradictory_switches_are_rejected() {
        assert!(Cli::try_parse_from(["sugarscape", "run", "--replace", "--no-replace"]).is_err());
        assert!(Cli::try_parse_from(["sugarscape", "run", "--aging", "--no-aging"]).is_err());
    }
}

use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use sugarscape::{CapacityGrid, Orientation, Sugar};
use tracing::error;

mod run;
mod scape;

use run::{RunArgs, run_simulation};
use scape::{ScapeCommand, run_scape};

const OUTPUT_DIR: &str = ".sugarscape";

#[derive(Parser)]
#[command(
    name = "sugarscape",
    version,
    about = "Sugarscape agent simulation (foraging, metabolism, aging, replacement)",
    long_about = None
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run a simulation and export per-tick statistics
    Run(RunArgs),
    /// Capacity landscape operations
    Scape {
        #[command(subcommand)]
        command: ScapeCommand,
    },
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum Neighborhood {
    /// Four axis-aligned rays out to the agent's vision
    #[default]
    Cardinal,
    /// Every cell within Chebyshev distance of the agent's vision
    Radius,
}

/// Where the capacity landscape comes from.
#[derive(Args, Clone, Debug)]
pub struct ScapeSource {
    /// Delimited capacity file (one non-negative integer per cell)
    #[arg(short = 's', long)]
    pub scape: Option<PathBuf>,
    /// Field delimiter of the capacity file
    #[arg(long, default_value_t = ',')]
    pub delimiter: char,
    /// Row mapping of the capacity file
    #[arg(long, value_enum, default_value_t = Orientation::FlipVertical)]
    pub orientation: Orientation,
    /// Width of the generated two-peak scape (used without --scape)
    #[arg(long, default_value_t = 50)]
    pub width: usize,
    /// Height of the generated two-peak scape (used without --scape)
    #[arg(long, default_value_t = 50)]
    pub height: usize,
    /// Peak capacity of the generated two-peak scape
    #[arg(long, default_value_t = 4)]
    pub peak: Sugar,
}

impl ScapeSource {
    pub fn load(&self) -> Result<CapacityGrid, String> {
        let grid = match &self.scape {
            Some(path) => CapacityGrid::load(path, self.delimiter, self.orientation)
                .map_err(|e| format!("load scape {}: {}", path.display(), e))?,
            None => CapacityGrid::two_peaks(self.width, self.height, self.peak)
                .map_err(|e| e.to_string())?,
        };
        Ok(grid)
    }

    pub fn describe(&self) -> String {
        match &self.scape {
            Some(path) => path.display().to_string(),
            None => format!(
                "generated two-peak {}x{} (peak {})",
                self.width, self.height, self.peak
            ),
        }
    }
}

/// Shared flag for commands that may print JSON instead of text.
#[derive(Args, Clone, Copy, Debug)]
pub struct JsonFlag {
    /// Print machine-readable JSON
    #[arg(long, action = ArgAction::SetTrue, default_value_t = false)]
    pub json: bool,
}

pub fn output_dir() -> PathBuf {
    PathBuf::from(OUTPUT_DIR)
}

pub fn run() {
    let cli = Cli::parse();
    if let Err(err) = dispatch(cli.command) {
        error!("{}", err);
        eprintln!("error: {}", err);
        std::process::exit(1);
    }
}

fn dispatch(command: Command) -> Result<(), String> {
    match command {
        Command::Run(args) => run_simulation(args),
        Command::Scape { command } => run_scape(command),
    }
}

use std::path::PathBuf;

use clap::Subcommand;
use serde_json::json;
use sugarscape::{CapacityGrid, Lineage, load_snapshot};

use super::{JsonFlag, ScapeSource, output_dir};

#[derive(Subcommand)]
pub enum ScapeCommand {
    /// Summarize a capacity landscape and draw it (top row first)
    Show {
        #[command(flatten)]
        source: ScapeSource,
        #[command(flatten)]
        output: JsonFlag,
    },
    /// Summarize a saved world snapshot
    Snapshot {
        /// Snapshot file (defaults to the last run's final snapshot)
        path: Option<PathBuf>,
        #[command(flatten)]
        output: JsonFlag,
    },
}

pub(super) fn run_scape(cmd: ScapeCommand) -> Result<(), String> {
    match cmd {
        ScapeCommand::Show { source, output } => {
            let grid = source.load()?;
            if output.json {
                let rows: Vec<Vec<u32>> = (0..grid.height())
                    .map(|y| grid.values()[y * grid.width()..(y + 1) * grid.width()].to_vec())
                    .collect();
                let doc = json!({
                    "width": grid.width(),
                    "height": grid.height(),
                    "total_capacity": grid.total(),
                    "max_capacity": grid.max(),
                    "rows": rows,
                });
                let text = serde_json::to_string_pretty(&doc).map_err(|e| e.to_string())?;
                println!("{}", text);
                return Ok(());
            }

            println!("Scape: {}", source.describe());
            println!(
                "Size: {}x{} | cells={} | total capacity={} | max={}",
                grid.width(),
                grid.height(),
                grid.width() * grid.height(),
                grid.total(),
                grid.max()
            );
            for line in render_rows(&grid) {
                println!("{}", line);
            }
        }
        ScapeCommand::Snapshot { path, output } => {
            let path = path.unwrap_or_else(|| output_dir().join("snapshot.json"));
            let snapshot = load_snapshot(&path).map_err(|e| format!("{}: {}", path.display(), e))?;

            if output.json {
                let text = serde_json::to_string_pretty(&snapshot).map_err(|e| e.to_string())?;
                println!("{}", text);
                return Ok(());
            }

            let originals = snapshot
                .agents
                .iter()
                .filter(|a| a.lineage == Lineage::Original)
                .count();
            let standing: u64 = snapshot.sugar.iter().map(|&s| s as u64).sum();
            println!(
                "Snapshot: tick={} | grid={}x{} | sugar standing={}",
                snapshot.tick, snapshot.width, snapshot.height, standing
            );
            println!(
                "Agents: {} ({} original, {} replacement)",
                snapshot.agents.len(),
                originals,
                snapshot.agents.len() - originals
            );
            for a in snapshot.agents.iter().take(20) {
                println!(
                    " - id={} pos=({}, {}) sugar={} metabolism={} vision={} age={} lineage={}",
                    a.id, a.position.x, a.position.y, a.sugar, a.metabolism, a.vision, a.age, a.lineage
                );
            }
            if snapshot.agents.len() > 20 {
                println!(" ... {} more", snapshot.agents.len() - 20);
            }
        }
    }

    Ok(())
}

/// One text line per row, highest `y` first so it reads like the source file.
fn render_rows(grid: &CapacityGrid) -> Vec<String> {
    (0..grid.height())
        .rev()
        .map(|y| {
            (0..grid.width())
                .map(|x| match grid.get(x, y).unwrap_or(0) {
                    0 => '.',
                    v if v <= 9 => char::from_digit(v, 10).unwrap_or('#'),
                    _ => '#',
                })
                .collect()
        })
        .collect()
}

//! Capacity landscapes: the fixed per-cell sugar ceilings a run starts from.
//!
//! A scape file is delimited text with one non-negative integer per cell.
//! Files are written top row first, while the grid puts `y = 0` at the bottom,
//! so by default the file is flipped vertically on load: the last line of the
//! file becomes row `y = 0`. Columns map straight to `x`.

use std::fs;
use std::path::Path;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::modules::error::{Result, ScapeError};
use crate::modules::grid::Sugar;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    /// Last file line becomes `y = 0`, so the file reads top-to-bottom as displayed.
    #[default]
    FlipVertical,
    /// File line `r` becomes `y = r`.
    AsIs,
}

/// Rectangular grid of capacities, row-major with `y = 0` first.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CapacityGrid {
    width: usize,
    height: usize,
    values: Vec<Sugar>,
}

impl CapacityGrid {
    /// Builds a grid from rows already in `y` order (`rows[0]` is `y = 0`).
    pub fn from_rows(rows: Vec<Vec<Sugar>>) -> Result<Self> {
        let Some(first) = rows.first() else {
            return Err(ScapeError::EmptyScape);
        };
        let width = first.len();
        if width == 0 {
            return Err(ScapeError::EmptyScape);
        }
        for (row, values) in rows.iter().enumerate() {
            if values.len() != width {
                return Err(ScapeError::RaggedScape {
                    row,
                    found: values.len(),
                    expected: width,
                });
            }
        }

        let height = rows.len();
        let values = rows.into_iter().flatten().collect();
        Ok(Self {
            width,
            height,
            values,
        })
    }

    /// Parses delimited text. Blank lines are skipped; row and column numbers in
    /// errors are zero-based positions within the data lines of the source.
    pub fn parse(text: &str, delimiter: char, orientation: Orientation) -> Result<Self> {
        let mut rows = Vec::new();
        for (row, line) in text.lines().map(str::trim).filter(|l| !l.is_empty()).enumerate() {
            let values = line
                .split(delimiter)
                .enumerate()
                .map(|(column, token)| {
                    let token = token.trim();
                    token
                        .parse::<Sugar>()
                        .map_err(|_| ScapeError::MalformedCapacity {
                            row,
                            column,
                            token: token.to_string(),
                        })
                })
                .collect::<Result<Vec<_>>>()?;
            rows.push(values);
        }

        if rows.is_empty() {
            return Err(ScapeError::EmptyScape);
        }
        // Raggedness is reported against source order, before any flip.
        if let Some((row, values)) = rows
            .iter()
            .enumerate()
            .find(|(_, values)| values.len() != rows[0].len())
        {
            return Err(ScapeError::RaggedScape {
                row,
                found: values.len(),
                expected: rows[0].len(),
            });
        }

        if orientation == Orientation::FlipVertical {
            rows.reverse();
        }
        Self::from_rows(rows)
    }

    pub fn load(path: &Path, delimiter: char, orientation: Orientation) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Self::parse(&text, delimiter, orientation)
    }

    /// Two sugar mountains in opposite quadrants, falling off linearly from `peak`.
    pub fn two_peaks(width: usize, height: usize, peak: Sugar) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(ScapeError::EmptyScape);
        }
        let centers = [
            (width as f64 * 0.25, height as f64 * 0.75),
            (width as f64 * 0.75, height as f64 * 0.25),
        ];
        let radius = (width.min(height) as f64 / 2.0).max(1.0);

        let mut values = Vec::with_capacity(width * height);
        for y in 0..height {
            for x in 0..width {
                let (px, py) = (x as f64 + 0.5, y as f64 + 0.5);
                let level = centers
                    .iter()
                    .map(|&(cx, cy)| {
                        let dist = ((px - cx).powi(2) + (py - cy).powi(2)).sqrt();
                        let falloff = (1.0 - dist / radius).max(0.0);
                        (peak as f64 * falloff).ceil() as Sugar
                    })
                    .max()
                    .unwrap_or(0);
                values.push(level.min(peak));
            }
        }

        Ok(Self {
            width,
            height,
            values,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn values(&self) -> &[Sugar] {
        &self.values
    }

    pub fn get(&self, x: usize, y: usize) -> Option<Sugar> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.values.get(y * self.width + x).copied()
    }

    pub fn total(&self) -> u64 {
        self.values.iter().map(|&v| v as u64).sum()
    }

    pub fn max(&self) -> Sugar {
        self.values.iter().copied().max().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_flips_by_default() {
        let grid = CapacityGrid::parse("1,2,3\n4,5,6\n", ',', Orientation::default()).unwrap();
        assert_eq!(grid.width(), 3);
        assert_eq!(grid.height(), 2);
        // bottom row of the file is y = 0
        assert_eq!(grid.get(0, 0), Some(4));
        assert_eq!(grid.get(2, 1), Some(3));
    }

    #[test]
    fn parse_as_is_keeps_file_order() {
        let grid = CapacityGrid::parse("1,2\n3,4", ',', Orientation::AsIs).unwrap();
        assert_eq!(grid.get(0, 0), Some(1));
        assert_eq!(grid.get(1, 1), Some(4));
    }

    #[test]
    fn parse_tolerates_whitespace_and_blank_lines() {
        let grid = CapacityGrid::parse("\n 0 , 1 \n\n 2,3\n\n", ',', Orientation::AsIs).unwrap();
        assert_eq!(grid.values(), &[0, 1, 2, 3]);
        assert_eq!(grid.total(), 6);
        assert_eq!(grid.max(), 3);
    }

    #[test]
    fn parse_rejects_ragged_rows() {
        let err = CapacityGrid::parse("1,2,3\n4,5", ',', Orientation::default()).unwrap_err();
        assert!(matches!(
            err,
            ScapeError::RaggedScape {
                row: 1,
                found: 2,
                expected: 3
            }
        ));
    }

    #[test]
    fn parse_rejects_negative_and_garbage() {
        let err = CapacityGrid::parse("1,-2", ',', Orientation::AsIs).unwrap_err();
        assert!(matches!(
            err,
            ScapeError::MalformedCapacity { row: 0, column: 1, ref token } if token == "-2"
        ));
        let err = CapacityGrid::parse("1,2\n3,x", ',', Orientation::AsIs).unwrap_err();
        assert!(matches!(err, ScapeError::MalformedCapacity { row: 1, column: 1, .. }));
    }

    #[test]
    fn parse_rejects_empty_input() {
        assert!(matches!(
            CapacityGrid::parse("  \n\n", ',', Orientation::default()),
            Err(ScapeError::EmptyScape)
        ));
    }

    #[test]
    fn other_delimiters() {
        let grid = CapacityGrid::parse("1\t2\n3\t4", '\t', Orientation::AsIs).unwrap();
        assert_eq!(grid.values(), &[1, 2, 3, 4]);
    }

    #[test]
    fn two_peaks_is_bounded_and_deterministic() {
        let a = CapacityGrid::two_peaks(20, 20, 4).unwrap();
        let b = CapacityGrid::two_peaks(20, 20, 4).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.max(), 4);
        assert!(a.values().iter().all(|&v| v <= 4));
        // corners away from both peaks are barren
        assert_eq!(a.get(0, 0), Some(0));
        assert_eq!(a.get(19, 19), Some(0));
    }
}

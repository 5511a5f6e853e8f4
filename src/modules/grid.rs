use serde::{Deserialize, Serialize};

use crate::modules::error::{Result, ScapeError};
use crate::modules::scape::CapacityGrid;

pub type AgentId = u64;
pub type Sugar = u32;

/// Grid coordinate. `x` is the column, `y` the row (row 0 is the bottom).
///
/// Ordering is lexicographic on `(x, y)`, which the forager tie-break relies on.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub const fn offset(self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }

    pub fn manhattan(self, other: Position) -> u32 {
        (self.x - other.x).unsigned_abs() + (self.y - other.y).unsigned_abs()
    }

    pub fn chebyshev(self, other: Position) -> u32 {
        (self.x - other.x)
            .unsigned_abs()
            .max((self.y - other.y).unsigned_abs())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Cell {
    pub capacity: Sugar,
    pub current: Sugar,
    pub occupant: Option<AgentId>,
}

/// The sugar landscape plus its occupancy index.
#[derive(Clone, Debug)]
pub struct SugarGrid {
    width: usize,
    height: usize,
    cells: Vec<Cell>,
}

impl SugarGrid {
    /// Builds a grid whose cells start full (`current == capacity`).
    pub fn from_capacity(capacity: &CapacityGrid) -> Self {
        let cells = capacity
            .values()
            .iter()
            .map(|&cap| Cell {
                capacity: cap,
                current: cap,
                occupant: None,
            })
            .collect();
        Self {
            width: capacity.width(),
            height: capacity.height(),
            cells,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn contains(&self, pos: Position) -> bool {
        pos.x >= 0 && pos.y >= 0 && (pos.x as usize) < self.width && (pos.y as usize) < self.height
    }

    fn index(&self, pos: Position) -> Result<usize> {
        if !self.contains(pos) {
            return Err(ScapeError::OutOfBounds {
                x: pos.x as i64,
                y: pos.y as i64,
                width: self.width,
                height: self.height,
            });
        }
        Ok(pos.y as usize * self.width + pos.x as usize)
    }

    fn position_of(&self, index: usize) -> Position {
        Position::new((index % self.width) as i32, (index / self.width) as i32)
    }

    pub fn cell(&self, pos: Position) -> Result<&Cell> {
        let idx = self.index(pos)?;
        Ok(&self.cells[idx])
    }

    /// Cells in row-major order (`y * width + x`).
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn sugar_at(&self, pos: Position) -> Result<Sugar> {
        self.cell(pos).map(|c| c.current)
    }

    pub fn capacity_at(&self, pos: Position) -> Result<Sugar> {
        self.cell(pos).map(|c| c.capacity)
    }

    /// Adds `rate` to every cell, capped at its capacity.
    pub fn regrow(&mut self, rate: Sugar) {
        for cell in &mut self.cells {
            cell.current = cell.current.saturating_add(rate).min(cell.capacity);
        }
    }

    /// Takes all sugar from the cell at `pos`.
    pub fn harvest(&mut self, pos: Position) -> Result<Sugar> {
        let idx = self.index(pos)?;
        let cell = &mut self.cells[idx];
        let amount = cell.current;
        cell.current = 0;
        Ok(amount)
    }

    pub fn is_occupied(&self, pos: Position) -> Result<bool> {
        self.cell(pos).map(|c| c.occupant.is_some())
    }

    pub fn occupant(&self, pos: Position) -> Result<Option<AgentId>> {
        self.cell(pos).map(|c| c.occupant)
    }

    pub fn place(&mut self, agent_id: AgentId, pos: Position) -> Result<()> {
        let idx = self.index(pos)?;
        let cell = &mut self.cells[idx];
        if let Some(other) = cell.occupant {
            return Err(ScapeError::InvariantViolation(format!(
                "agent {} placed on ({}, {}) already held by {}",
                agent_id, pos.x, pos.y, other
            )));
        }
        cell.occupant = Some(agent_id);
        Ok(())
    }

    pub fn vacate(&mut self, agent_id: AgentId, pos: Position) -> Result<()> {
        let idx = self.index(pos)?;
        let cell = &mut self.cells[idx];
        if cell.occupant != Some(agent_id) {
            return Err(ScapeError::InvariantViolation(format!(
                "agent {} vacating ({}, {}) recorded for {:?}",
                agent_id, pos.x, pos.y, cell.occupant
            )));
        }
        cell.occupant = None;
        Ok(())
    }

    /// Moves an occupant; a no-op when `from == to`.
    pub fn relocate(&mut self, agent_id: AgentId, from: Position, to: Position) -> Result<()> {
        if from == to {
            return self.index(to).map(|_| ());
        }
        // Validate the target before touching the source so a failed move leaves no trace.
        if let Some(other) = self.occupant(to)? {
            return Err(ScapeError::InvariantViolation(format!(
                "agent {} moving onto ({}, {}) held by {}",
                agent_id, to.x, to.y, other
            )));
        }
        self.vacate(agent_id, from)?;
        self.place(agent_id, to)
    }

    /// Unoccupied positions in row-major order.
    pub fn free_cells(&self) -> Vec<Position> {
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, c)| c.occupant.is_none())
            .map(|(idx, _)| self.position_of(idx))
            .collect()
    }

    pub fn total_sugar(&self) -> u64 {
        self.cells.iter().map(|c| c.current as u64).sum()
    }

    pub fn total_capacity(&self) -> u64 {
        self.cells.iter().map(|c| c.capacity as u64).sum()
    }

    /// Debug-time consistency check of per-cell sugar levels.
    pub fn check_levels(&self) -> Result<()> {
        for (idx, cell) in self.cells.iter().enumerate() {
            if cell.current > cell.capacity {
                let pos = self.position_of(idx);
                return Err(ScapeError::InvariantViolation(format!(
                    "cell ({}, {}) holds {} above capacity {}",
                    pos.x, pos.y, cell.current, cell.capacity
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(rows: &[&[Sugar]]) -> SugarGrid {
        let capacity = CapacityGrid::from_rows(rows.iter().map(|r| r.to_vec()).collect()).unwrap();
        SugarGrid::from_capacity(&capacity)
    }

    #[test]
    fn regrow_caps_at_capacity() {
        let mut g = grid(&[&[4, 2, 0]]);
        g.harvest(Position::new(0, 0)).unwrap();
        g.harvest(Position::new(1, 0)).unwrap();

        g.regrow(3);
        assert_eq!(g.sugar_at(Position::new(0, 0)).unwrap(), 3);
        assert_eq!(g.sugar_at(Position::new(1, 0)).unwrap(), 2);
        assert_eq!(g.sugar_at(Position::new(2, 0)).unwrap(), 0);

        g.regrow(3);
        assert_eq!(g.sugar_at(Position::new(0, 0)).unwrap(), 4);
    }

    #[test]
    fn zero_rate_leaves_cells_untouched() {
        let mut g = grid(&[&[5, 5]]);
        g.harvest(Position::new(1, 0)).unwrap();
        g.regrow(0);
        assert_eq!(g.sugar_at(Position::new(0, 0)).unwrap(), 5);
        assert_eq!(g.sugar_at(Position::new(1, 0)).unwrap(), 0);
    }

    #[test]
    fn harvest_empties_cell() {
        let mut g = grid(&[&[7]]);
        assert_eq!(g.harvest(Position::new(0, 0)).unwrap(), 7);
        assert_eq!(g.harvest(Position::new(0, 0)).unwrap(), 0);
    }

    #[test]
    fn out_of_bounds_access_fails() {
        let mut g = grid(&[&[1, 1], &[1, 1]]);
        for pos in [
            Position::new(-1, 0),
            Position::new(0, -1),
            Position::new(2, 0),
            Position::new(0, 2),
        ] {
            assert!(matches!(
                g.sugar_at(pos),
                Err(ScapeError::OutOfBounds { .. })
            ));
            assert!(matches!(g.harvest(pos), Err(ScapeError::OutOfBounds { .. })));
            assert!(matches!(
                g.is_occupied(pos),
                Err(ScapeError::OutOfBounds { .. })
            ));
        }
    }

    #[test]
    fn occupancy_tracks_place_and_relocate() {
        let mut g = grid(&[&[1, 1, 1]]);
        g.place(9, Position::new(0, 0)).unwrap();
        assert_eq!(g.occupant(Position::new(0, 0)).unwrap(), Some(9));

        g.relocate(9, Position::new(0, 0), Position::new(2, 0)).unwrap();
        assert!(!g.is_occupied(Position::new(0, 0)).unwrap());
        assert_eq!(g.occupant(Position::new(2, 0)).unwrap(), Some(9));
        assert_eq!(g.free_cells(), vec![Position::new(0, 0), Position::new(1, 0)]);
    }

    #[test]
    fn double_occupancy_is_rejected() {
        let mut g = grid(&[&[1, 1]]);
        g.place(1, Position::new(0, 0)).unwrap();
        g.place(2, Position::new(1, 0)).unwrap();

        assert!(matches!(
            g.place(3, Position::new(0, 0)),
            Err(ScapeError::InvariantViolation(_))
        ));
        assert!(matches!(
            g.relocate(1, Position::new(0, 0), Position::new(1, 0)),
            Err(ScapeError::InvariantViolation(_))
        ));
        // failed move leaves the mover in place
        assert_eq!(g.occupant(Position::new(0, 0)).unwrap(), Some(1));
    }

    #[test]
    fn vacate_requires_matching_occupant() {
        let mut g = grid(&[&[1]]);
        g.place(1, Position::new(0, 0)).unwrap();
        assert!(g.vacate(2, Position::new(0, 0)).is_err());
        g.vacate(1, Position::new(0, 0)).unwrap();
        assert!(!g.is_occupied(Position::new(0, 0)).unwrap());
    }

    #[test]
    fn row_major_layout() {
        let g = grid(&[&[1, 2, 3], &[4, 5, 6]]);
        assert_eq!(g.width(), 3);
        assert_eq!(g.height(), 2);
        assert_eq!(g.capacity_at(Position::new(2, 1)).unwrap(), 6);
        assert_eq!(g.total_capacity(), 21);
        assert_eq!(g.total_sugar(), 21);
    }
}

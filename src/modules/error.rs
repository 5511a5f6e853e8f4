use std::io;

use thiserror::Error;

/// Broad grouping of [`ScapeError`] variants.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad configuration or capacity input; raised before any tick runs.
    Configuration,
    /// A coordinate outside the grid was touched. Always a logic bug.
    OutOfBounds,
    /// An internal consistency check failed.
    Invariant,
    /// File loading or saving failed.
    Io,
}

#[derive(Debug, Error)]
pub enum ScapeError {
    #[error("population must be at least 1")]
    EmptyPopulation,

    #[error("population {requested} exceeds the {available} distinct cells of the scape")]
    PopulationExceedsCells { requested: usize, available: usize },

    #[error("invalid endowment range for {field}: {lo}..={hi}")]
    InvalidEndowment {
        field: &'static str,
        lo: u32,
        hi: u32,
    },

    #[error("capacity input contains no cells")]
    EmptyScape,

    #[error("ragged capacity input: row {row} has {found} columns, expected {expected}")]
    RaggedScape {
        row: usize,
        found: usize,
        expected: usize,
    },

    #[error("malformed capacity at row {row}, column {column}: {token:?}")]
    MalformedCapacity {
        row: usize,
        column: usize,
        token: String,
    },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("coordinate ({x}, {y}) is outside the {width}x{height} grid")]
    OutOfBounds {
        x: i64,
        y: i64,
        width: usize,
        height: usize,
    },

    #[error("invariant violated: {0}")]
    InvariantViolation(String),

    #[error("io error: {0}")]
    Io(#[from] io::Error),

    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ScapeError {
    pub const fn kind(&self) -> ErrorKind {
        match self {
            ScapeError::EmptyPopulation
            | ScapeError::PopulationExceedsCells { .. }
            | ScapeError::InvalidEndowment { .. }
            | ScapeError::EmptyScape
            | ScapeError::RaggedScape { .. }
            | ScapeError::MalformedCapacity { .. }
            | ScapeError::InvalidConfig(_) => ErrorKind::Configuration,
            ScapeError::OutOfBounds { .. } => ErrorKind::OutOfBounds,
            ScapeError::InvariantViolation(_) => ErrorKind::Invariant,
            ScapeError::Io(_) | ScapeError::Json(_) => ErrorKind::Io,
        }
    }
}

pub type Result<T> = std::result::Result<T, ScapeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_group_variants() {
        assert_eq!(ScapeError::EmptyPopulation.kind(), ErrorKind::Configuration);
        assert_eq!(
            ScapeError::OutOfBounds {
                x: -1,
                y: 0,
                width: 2,
                height: 2
            }
            .kind(),
            ErrorKind::OutOfBounds
        );
        assert_eq!(
            ScapeError::InvariantViolation("x".into()).kind(),
            ErrorKind::Invariant
        );
    }

    #[test]
    fn out_of_bounds_message_names_grid() {
        let err = ScapeError::OutOfBounds {
            x: 5,
            y: 7,
            width: 4,
            height: 4,
        };
        assert_eq!(err.to_string(), "coordinate (5, 7) is outside the 4x4 grid");
    }
}

//! Engine errors. Rejected moves are outcomes, not errors (see `board::RejectReason`).

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BoardError {
    #[error("invalid board dimensions {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },
    #[error("rank table must hold at least one descriptor")]
    EmptyRankTable,
    #[error("invalid board layout: {0}")]
    InvalidLayout(String),
    #[error("invalid direction: {0}")]
    InvalidDirection(String),
    #[error("cell ({x}, {y}) is outside the grid")]
    OutOfBounds { x: usize, y: usize },
    #[error("cell ({x}, {y}) is already occupied")]
    CellOccupied { x: usize, y: usize },
    #[error("board is not settling")]
    NotSettling,
}

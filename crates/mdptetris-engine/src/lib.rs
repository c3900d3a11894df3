//! Bit-packed board, piece catalog and episode environment for piece-dropping Tetris.
//!
//! A step drops one piece straight down in a chosen orientation and column;
//! there is no real-time movement. The crate is organized in two layers:
//!
//! - [`core`](crate::core) - Rows, pieces, catalogs and the [`BitBoard`] with its one-level undo
//! - [`engine`](crate::engine) - Seeded piece selection and the [`Episode`] environment

pub use self::{core::*, engine::*};

pub mod core;
pub mod engine;

#[derive(Debug, derive_more::Display, derive_more::Error)]
pub enum BoardConfigError {
    #[display("board width must be between {min} and {max}, got {width}")]
    InvalidWidth {
        width: usize,
        min: usize,
        max: usize,
    },
    #[display("max piece height {max_piece_height} exceeds board height {height}")]
    PieceTallerThanBoard {
        max_piece_height: usize,
        height: usize,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum DropError {
    #[display("column {column} out of range for a piece of width {piece_width} on a board of width {board_width}")]
    ColumnOutOfRange {
        column: usize,
        piece_width: usize,
        board_width: usize,
    },
    #[display("piece of height {piece_height} does not fit above wall height {wall_height} (extended height {extended_height})")]
    InsufficientHeadroom {
        piece_height: usize,
        wall_height: usize,
        extended_height: usize,
    },
    #[display("board already overflowed (wall height {wall_height} > height {height})")]
    Overflowed { wall_height: usize, height: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display, derive_more::Error)]
#[display("no cancellable drop to cancel")]
pub struct CancelError;

#[derive(Debug, derive_more::Display, derive_more::Error)]
pub enum EpisodeError {
    #[display("invalid board: {source}")]
    Board { source: BoardConfigError },
    #[display("piece catalog is empty")]
    EmptyCatalog,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum StepError {
    #[display("episode already terminated; call reset first")]
    Terminated,
    #[display("drop failed: {source}")]
    Drop { source: DropError },
}

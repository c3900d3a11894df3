//! Core data structures: rows, pieces and the board.
//!
//! - [`BitBoard`] - Bit-packed playing field with drop, line clear and one-level undo
//! - [`Piece`] / [`PieceOrientation`] - Pieces with their pre-rendered rotations
//! - [`PieceCatalog`] - Ordered piece set loaded from the text format

pub use self::{bit_board::*, piece::*, piece_catalog::*};

pub(crate) mod bit_board;
pub(crate) mod piece;
pub(crate) mod piece_catalog;
pub(crate) mod render_board;

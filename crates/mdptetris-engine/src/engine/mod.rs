//! Episode environment built on the core board.
//!
//! - [`Episode`] - `reset`/`step`/`render` loop with rewards and terminal detection
//! - [`EpisodeConfig`] - Board shape, piece set, drop mode and piece limit
//! - [`PieceGenerator`] / [`PieceSeed`] - Reproducible piece selection

pub use self::{episode::*, piece_generator::*};

mod episode;
mod piece_generator;

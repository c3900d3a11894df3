//! Whole games played by the one-ply search.

use mdptetris_engine::{BitBoard, PieceCatalog, PieceGenerator};
use serde::{Deserialize, Serialize};

use crate::placement_search::{PlacementSearch, SearchError};

/// Game statistics: pieces placed and lines cleared.
///
/// # Example
///
/// ```
/// use mdptetris_evaluator::game::GameStats;
///
/// let mut stats = GameStats::new();
/// stats.complete_piece_drop(0);
/// stats.complete_piece_drop(2);
///
/// assert_eq!(stats.completed_pieces(), 2);
/// assert_eq!(stats.total_cleared_lines(), 2);
/// assert_eq!(stats.line_cleared_counter(), &[1, 0, 1]);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameStats {
    completed_pieces: usize,
    total_cleared_lines: usize,
    line_cleared_counter: Vec<usize>,
}

impl GameStats {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn completed_pieces(&self) -> usize {
        self.completed_pieces
    }

    #[must_use]
    pub fn total_cleared_lines(&self) -> usize {
        self.total_cleared_lines
    }

    /// Histogram of drops by number of lines they cleared; index `n` counts
    /// drops that cleared `n` lines.
    #[must_use]
    pub fn line_cleared_counter(&self) -> &[usize] {
        &self.line_cleared_counter
    }

    pub fn complete_piece_drop(&mut self, cleared_lines: usize) {
        self.completed_pieces += 1;
        self.total_cleared_lines += cleared_lines;
        if self.line_cleared_counter.len() <= cleared_lines {
            self.line_cleared_counter.resize(cleared_lines + 1, 0);
        }
        self.line_cleared_counter[cleared_lines] += 1;
    }
}

/// Plays until the board overflows or `piece_limit` pieces have been placed.
///
/// The board is reset first; pieces come from `generator`.
pub fn play_game(
    search: &PlacementSearch<'_>,
    board: &mut BitBoard,
    catalog: &PieceCatalog,
    generator: &mut PieceGenerator,
    piece_limit: Option<usize>,
) -> Result<GameStats, SearchError> {
    board.reset();
    let mut stats = GameStats::new();
    while !board.state().is_overflowed()
        && piece_limit.is_none_or(|limit| stats.completed_pieces() < limit)
    {
        let piece = &catalog.pieces()[generator.next_piece()];
        let cleared_lines = search.choose_and_commit(board, piece)?;
        stats.complete_piece_drop(cleared_lines);
        if cleared_lines > 0 {
            tracing::trace!(
                pieces = stats.completed_pieces(),
                cleared_lines,
                wall_height = board.wall_height(),
                "lines cleared"
            );
        }
    }
    tracing::debug!(
        pieces = stats.completed_pieces(),
        lines = stats.total_cleared_lines(),
        overflowed = board.state().is_overflowed(),
        "game over"
    );
    Ok(stats)
}

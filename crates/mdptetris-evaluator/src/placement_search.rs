//! One-ply placement search.
//!
//! For the piece to place, every orientation is tried at every column where it
//! fits: the piece is dropped with a cancellable drop, the resulting board is
//! scored, and the drop is rolled back. The best placement is then committed
//! with an ordinary drop.
//!
//! Ties go to the first placement encountered, scanning orientations in
//! catalog order and columns left to right.
//!
//! The search uses the board's single backup slot, so the board must not hold
//! a pending cancellable drop the caller still wants to undo.

use mdptetris_engine::{BitBoard, CancelError, DropError, Piece};

use crate::placement_evaluator::{
    FeatureBasedPlacementEvaluator, FeatureWeights, PlacementEvaluator,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum SearchError {
    #[display("no orientation of the piece fits on a board of width {board_width}")]
    NoPlacement { board_width: usize },
    #[display("board cannot accept the piece: {source}")]
    Drop { source: DropError },
    #[display("failed to roll back a trial drop: {source}")]
    Rollback { source: CancelError },
}

/// A scored `(orientation, column)` pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub orientation: usize,
    pub column: usize,
    pub score: f64,
}

#[derive(Debug)]
pub struct PlacementSearch<'a> {
    placement_evaluator: Box<dyn PlacementEvaluator + 'a>,
}

impl<'a> PlacementSearch<'a> {
    #[must_use]
    pub fn new(placement_evaluator: Box<dyn PlacementEvaluator + 'a>) -> Self {
        Self {
            placement_evaluator,
        }
    }

    #[must_use]
    pub fn with_weights(weights: &FeatureWeights) -> Self {
        Self::new(Box::new(FeatureBasedPlacementEvaluator::from_weights(
            weights,
        )))
    }

    /// Scores every placement of `piece` and returns the best one.
    ///
    /// `board` is left exactly as it was, except that its backup slot is
    /// consumed.
    pub fn select_best_placement(
        &self,
        board: &mut BitBoard,
        piece: &Piece,
    ) -> Result<Placement, SearchError> {
        let mut best: Option<Placement> = None;

        for (orientation_index, orientation) in piece.orientations().iter().enumerate() {
            if orientation.width() > board.width() {
                continue;
            }
            board
                .check_placement(orientation, 0)
                .map_err(|source| SearchError::Drop { source })?;

            for column in 0..=board.width() - orientation.width() {
                board.drop_piece_unchecked(orientation, column, true);
                let score = self.placement_evaluator.evaluate_placement(board);
                board
                    .cancel_last_move()
                    .map_err(|source| SearchError::Rollback { source })?;

                if best.is_none_or(|b| score > b.score) {
                    best = Some(Placement {
                        orientation: orientation_index,
                        column,
                        score,
                    });
                }
            }
        }

        best.ok_or(SearchError::NoPlacement {
            board_width: board.width(),
        })
    }

    /// Places `piece` at its best placement and returns the number of lines cleared.
    pub fn choose_and_commit(
        &self,
        board: &mut BitBoard,
        piece: &Piece,
    ) -> Result<usize, SearchError> {
        let best = self.select_best_placement(board, piece)?;
        let orientation = &piece.orientations()[best.orientation];
        Ok(board.drop_piece_unchecked(orientation, best.column, false))
    }
}

/// Places `piece` at the best placement under linear `weights`.
///
/// # Example
///
/// ```
/// use mdptetris_engine::{BitBoard, BoardConfig, PieceCatalog};
/// use mdptetris_evaluator::{placement_evaluator::FeatureWeights, placement_search};
///
/// let catalog = PieceCatalog::standard();
/// let mut board = BitBoard::for_catalog(BoardConfig::default(), &catalog).unwrap();
/// let weights = FeatureWeights::dellacherie();
///
/// let lines = placement_search::choose_and_commit(&mut board, &catalog.pieces()[1], &weights)
///     .unwrap();
/// assert_eq!(lines, 0);
/// assert_eq!(board.wall_height(), 2);
/// ```
pub fn choose_and_commit(
    board: &mut BitBoard,
    piece: &Piece,
    weights: &FeatureWeights,
) -> Result<usize, SearchError> {
    PlacementSearch::with_weights(weights).choose_and_commit(board, piece)
}

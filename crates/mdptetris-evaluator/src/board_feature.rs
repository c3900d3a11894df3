//! Dellacherie board features.
//!
//! Every feature reads the board after a drop, together with the drop
//! metadata the board keeps in [`BitBoard::last_drop`]. All of them work on
//! the row bitmasks directly; no dense grid is built.
//!
//! | Feature | Measures |
//! |---|---|
//! | [`landing_height`] | Height of the middle of the last dropped piece |
//! | [`eroded_cells`] | Lines cleared × cells of the piece removed by them |
//! | [`row_transitions`] | Filled/empty changes along each row, walls filled |
//! | [`column_transitions`] | Filled/empty changes up each column, floor filled |
//! | [`holes`] | Empty cells with a filled cell somewhere above |
//! | [`well_sums`] | Empty cells flanked on both sides with an empty cell above |
//! | [`wall_height`] | One past the topmost occupied row |

use std::fmt;

use mdptetris_engine::{BitBoard, BitRow};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoardFeature {
    LandingHeight,
    ErodedCells,
    RowTransitions,
    ColumnTransitions,
    Holes,
    WellSums,
    WallHeight,
}

impl BoardFeature {
    pub const ALL: [Self; 7] = [
        Self::LandingHeight,
        Self::ErodedCells,
        Self::RowTransitions,
        Self::ColumnTransitions,
        Self::Holes,
        Self::WellSums,
        Self::WallHeight,
    ];

    /// The six features of the Dellacherie controller, in scoring order.
    pub const DELLACHERIE: [Self; 6] = [
        Self::LandingHeight,
        Self::ErodedCells,
        Self::RowTransitions,
        Self::ColumnTransitions,
        Self::Holes,
        Self::WellSums,
    ];

    #[must_use]
    pub fn id(self) -> &'static str {
        match self {
            Self::LandingHeight => "landing_height",
            Self::ErodedCells => "eroded_cells",
            Self::RowTransitions => "row_transitions",
            Self::ColumnTransitions => "column_transitions",
            Self::Holes => "holes",
            Self::WellSums => "well_sums",
            Self::WallHeight => "wall_height",
        }
    }

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::LandingHeight => "Landing Height",
            Self::ErodedCells => "Eroded Piece Cells",
            Self::RowTransitions => "Row Transitions",
            Self::ColumnTransitions => "Column Transitions",
            Self::Holes => "Holes",
            Self::WellSums => "Well Sums",
            Self::WallHeight => "Wall Height",
        }
    }

    #[expect(clippy::cast_precision_loss)]
    #[must_use]
    pub fn extract(self, board: &BitBoard) -> f64 {
        match self {
            Self::LandingHeight => landing_height(board),
            Self::ErodedCells => eroded_cells(board) as f64,
            Self::RowTransitions => row_transitions(board) as f64,
            Self::ColumnTransitions => column_transitions(board) as f64,
            Self::Holes => holes(board) as f64,
            Self::WellSums => well_sums(board) as f64,
            Self::WallHeight => wall_height(board) as f64,
        }
    }
}

impl fmt::Display for BoardFeature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// All feature values of one board.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    pub landing_height: f64,
    pub eroded_cells: usize,
    pub row_transitions: usize,
    pub column_transitions: usize,
    pub holes: usize,
    pub well_sums: usize,
    pub wall_height: usize,
}

impl FeatureVector {
    #[must_use]
    pub fn from_board(board: &BitBoard) -> Self {
        Self {
            landing_height: landing_height(board),
            eroded_cells: eroded_cells(board),
            row_transitions: row_transitions(board),
            column_transitions: column_transitions(board),
            holes: holes(board),
            well_sums: well_sums(board),
            wall_height: wall_height(board),
        }
    }

    #[expect(clippy::cast_precision_loss)]
    #[must_use]
    pub fn get(&self, feature: BoardFeature) -> f64 {
        match feature {
            BoardFeature::LandingHeight => self.landing_height,
            BoardFeature::ErodedCells => self.eroded_cells as f64,
            BoardFeature::RowTransitions => self.row_transitions as f64,
            BoardFeature::ColumnTransitions => self.column_transitions as f64,
            BoardFeature::Holes => self.holes as f64,
            BoardFeature::WellSums => self.well_sums as f64,
            BoardFeature::WallHeight => self.wall_height as f64,
        }
    }

    /// Values of [`BoardFeature::DELLACHERIE`], in order.
    #[must_use]
    pub fn dellacherie(&self) -> [f64; 6] {
        BoardFeature::DELLACHERIE.map(|feature| self.get(feature))
    }
}

fn playable_mask(board: &BitBoard) -> u16 {
    !board.empty_row().bits()
}

/// Row of the middle of the last dropped piece; `0.0` before any drop.
#[expect(clippy::cast_precision_loss)]
#[must_use]
pub fn landing_height(board: &BitBoard) -> f64 {
    board.last_drop().map_or(0.0, |info| {
        info.landing_row as f64 + (info.piece_height - 1) as f64 / 2.0
    })
}

#[must_use]
pub fn eroded_cells(board: &BitBoard) -> usize {
    board
        .last_drop()
        .map_or(0, |info| info.cleared_lines * info.eroded_piece_cells)
}

/// An empty row contributes 2: one change on each wall.
#[must_use]
pub fn row_transitions(board: &BitBoard) -> usize {
    // bit k of `bits ^ (bits >> 1)` compares bit k with bit k + 1, which covers
    // left wall / first cell through last cell / right wall.
    let pairs = (1u16 << (board.width() + 1)) - 1;
    board.rows()[..board.height()]
        .iter()
        .map(|row| ((row.bits() ^ (row.bits() >> 1)) & pairs).count_ones() as usize)
        .sum()
}

/// An empty column contributes 1: the change from the filled floor.
#[must_use]
pub fn column_transitions(board: &BitBoard) -> usize {
    let playable = playable_mask(board);
    let top = usize::min(board.wall_height() + 1, board.height());
    let mut below = BitRow::FULL;
    let mut transitions = 0;
    for &row in &board.rows()[..top] {
        transitions += ((row.bits() ^ below.bits()) & playable).count_ones() as usize;
        below = row;
    }
    transitions
}

#[must_use]
pub fn holes(board: &BitBoard) -> usize {
    let playable = playable_mask(board);
    let mut covered = 0;
    let mut holes = 0;
    for row in board.rows()[..board.wall_height()].iter().rev() {
        holes += (!row.bits() & covered & playable).count_ones() as usize;
        covered |= row.bits();
    }
    holes
}

/// Counts empty cells with filled neighbours on both sides (walls count) and
/// an empty cell directly above.
///
/// The row above the last scanned row is treated as empty.
#[must_use]
pub fn well_sums(board: &BitBoard) -> usize {
    let playable = playable_mask(board);
    let top = usize::min(board.wall_height(), board.height());
    let rows = board.rows();
    (0..top)
        .map(|y| {
            let bits = rows[y].bits();
            let above = if y + 1 < top {
                rows[y + 1]
            } else {
                board.empty_row()
            };
            let wells = !bits & (bits << 1) & (bits >> 1) & !above.bits() & playable;
            wells.count_ones() as usize
        })
        .sum()
}

#[must_use]
pub fn wall_height(board: &BitBoard) -> usize {
    board.wall_height()
}

#[cfg(test)]
mod tests {
    use mdptetris_engine::{BoardConfig, Piece};

    use super::*;

    fn board() -> BitBoard {
        BitBoard::new(BoardConfig::default(), 4).unwrap()
    }

    fn square() -> Piece {
        Piece::new(1, 2, 2, "XX\nXX").unwrap()
    }

    fn l_piece() -> Piece {
        Piece::new(4, 3, 2, "X\nX\nXX").unwrap()
    }

    #[test]
    fn test_empty_board() {
        let board = board();
        assert!(landing_height(&board).abs() < f64::EPSILON);
        assert_eq!(eroded_cells(&board), 0);
        assert_eq!(row_transitions(&board), 40);
        assert_eq!(column_transitions(&board), 10);
        assert_eq!(holes(&board), 0);
        assert_eq!(well_sums(&board), 0);
        assert_eq!(wall_height(&board), 0);
    }

    #[test]
    fn test_landing_height() {
        let l = l_piece();
        let mut board = board();
        board.drop_piece(&l.orientations()[0], 0, false).unwrap();
        assert!((landing_height(&board) - 1.0).abs() < f64::EPSILON);
        board.drop_piece(&l.orientations()[0], 0, false).unwrap();
        assert!((landing_height(&board) - 4.0).abs() < f64::EPSILON);

        let o = square();
        let mut board = self::board();
        board.drop_piece(&o.orientations()[0], 0, false).unwrap();
        assert!((landing_height(&board) - 0.5).abs() < f64::EPSILON);
        board.drop_piece(&o.orientations()[0], 0, false).unwrap();
        assert!((landing_height(&board) - 2.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_row_transitions_with_squares() {
        let o = square();
        let mut board = board();
        for column in [0, 2, 6] {
            board.drop_piece(&o.orientations()[0], column, false).unwrap();
        }
        assert_eq!(row_transitions(&board), 44);

        board.drop_piece(&o.orientations()[0], 4, false).unwrap();
        assert_eq!(board.wall_height(), 2);
        assert_eq!(row_transitions(&board), 40);
    }

    #[test]
    fn test_eroded_cells() {
        let o = square();
        let mut board = board();
        for column in [0, 2, 4, 6, 8] {
            board.drop_piece(&o.orientations()[0], column, false).unwrap();
        }
        assert_eq!(eroded_cells(&board), 8);
        assert_eq!(wall_height(&board), 0);
    }

    #[test]
    fn test_overhangs() {
        let l = l_piece();
        let o = square();
        let mut board = board();
        for column in [0, 2, 6] {
            board.drop_piece(&l.orientations()[0], column, false).unwrap();
        }
        assert_eq!(column_transitions(&board), 16);
        assert_eq!(holes(&board), 6);
        assert_eq!(well_sums(&board), 1);

        board.drop_piece(&o.orientations()[0], 4, false).unwrap();
        assert_eq!(column_transitions(&board), 16);
        assert_eq!(holes(&board), 6);
        assert_eq!(well_sums(&board), 2);

        board.drop_piece(&l.orientations()[0], 8, false).unwrap();
        assert_eq!(holes(&board), 8);
        assert_eq!(well_sums(&board), 4);
    }

    #[test]
    fn test_open_well() {
        let bar = Piece::new(2, 1, 4, "XXXX").unwrap();
        let mut board = board();
        board.drop_piece(&bar.orientations()[1], 0, false).unwrap();
        board.drop_piece(&bar.orientations()[1], 2, false).unwrap();
        // Column 1 is a 4-deep open well between two towers.
        assert_eq!(well_sums(&board), 4);
        assert_eq!(holes(&board), 0);
    }

    #[test]
    fn test_features_ignore_rows_above_height() {
        let config = BoardConfig {
            width: 5,
            height: 2,
            allow_lines_after_overflow: false,
        };
        let o = square();
        let mut board = BitBoard::new(config, 2).unwrap();
        board.drop_piece(&o.orientations()[0], 0, false).unwrap();
        board.drop_piece(&o.orientations()[0], 0, false).unwrap();
        assert_eq!(board.wall_height(), 4);
        // Only rows 0 and 1 are scanned, and no transition is counted above them.
        assert_eq!(row_transitions(&board), 4);
        assert_eq!(column_transitions(&board), 3);
        assert_eq!(holes(&board), 0);
    }

    #[test]
    fn test_feature_vector() {
        let l = l_piece();
        let mut board = board();
        for column in [0, 2, 6] {
            board.drop_piece(&l.orientations()[0], column, false).unwrap();
        }
        let features = FeatureVector::from_board(&board);
        assert_eq!(features.holes, 6);
        assert_eq!(features.wall_height, 3);
        assert_eq!(features.row_transitions, 50);
        assert_eq!(features.dellacherie(), [1.0, 0.0, 50.0, 16.0, 6.0, 1.0]);
        for feature in BoardFeature::ALL {
            assert!((features.get(feature) - feature.extract(&board)).abs() < f64::EPSILON);
        }
    }

    #[test]
    fn test_feature_ids_round_trip_through_json() {
        for feature in BoardFeature::ALL {
            let json = serde_json::to_string(&feature).unwrap();
            assert_eq!(json, format!("\"{}\"", feature.id()));
            assert_eq!(serde_json::from_str::<BoardFeature>(&json).unwrap(), feature);
        }
    }
}

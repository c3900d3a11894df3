use std::fmt::Write as _;

use serde::{Deserialize, Serialize};

use crate::{BoardConfigError, CancelError, DropError, core::piece::PieceOrientation};

use super::piece_catalog::PieceCatalog;

/// Narrowest supported board.
pub const MIN_BOARD_WIDTH: usize = 5;
/// Widest supported board: one wall bit on each side of 14 cells fills a `u16`.
pub const MAX_BOARD_WIDTH: usize = 14;

/// Single row in the bit board representation.
///
/// # Bit Layout (LSB to MSB)
///
/// - Bit 0: left wall
/// - Bits 1..=width: cells, left to right (column `c` is bit `c + 1`)
/// - Bits above `width`: right wall
///
/// Wall bits are always set, so a piece shifted past either edge collides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BitRow {
    bits: u16,
}

impl BitRow {
    /// Every bit set, walls included.
    pub const FULL: Self = Self { bits: u16::MAX };

    /// Row with only the wall bits of a `width`-wide board set.
    #[must_use]
    pub const fn empty(width: usize) -> Self {
        Self {
            bits: 1 | (u16::MAX << (width + 1)),
        }
    }

    #[must_use]
    pub const fn from_bits(bits: u16) -> Self {
        Self { bits }
    }

    #[must_use]
    pub const fn bits(self) -> u16 {
        self.bits
    }

    #[inline]
    #[must_use]
    pub fn is_full(self) -> bool {
        self == Self::FULL
    }

    /// Checks if the cell at `column` (0-based, walls excluded) is occupied.
    #[inline]
    #[must_use]
    pub fn is_cell_occupied(self, column: usize) -> bool {
        self.bits & (1 << (column + 1)) != 0
    }

    /// Checks if any cell of a piece row mask placed at `column` is occupied.
    #[inline]
    #[must_use]
    fn is_any_cell_occupied(self, column: usize, mask: u16) -> bool {
        self.bits & (mask << (column + 1)) != 0
    }

    #[inline]
    fn occupy_cells(&mut self, column: usize, mask: u16) {
        self.bits |= mask << (column + 1);
    }

    /// Iterates over the `width` cells of the row, returning their occupied status.
    pub fn iter_cells(self, width: usize) -> impl Iterator<Item = bool> {
        (0..width).map(move |column| self.is_cell_occupied(column))
    }
}

/// Shape of a board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardConfig {
    pub width: usize,
    pub height: usize,
    /// Clear lines even when the dropped piece sticks out above `height`.
    #[serde(default)]
    pub allow_lines_after_overflow: bool,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            width: 10,
            height: 20,
            allow_lines_after_overflow: false,
        }
    }
}

/// Lifecycle of a board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::IsVariant)]
pub enum BoardState {
    Empty,
    Active,
    /// The stack went above `height`; terminal for strict play.
    Overflowed,
}

/// Metadata about the most recent drop, used by the landing height and
/// eroded cells features.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DropInfo {
    /// Row the bottom of the piece came to rest on.
    pub landing_row: usize,
    pub piece_height: usize,
    pub cleared_lines: usize,
    /// Cells of the dropped piece removed by the cleared lines.
    pub eroded_piece_cells: usize,
}

#[derive(Debug, Clone)]
struct Backup {
    rows: Vec<BitRow>,
    wall_height: usize,
    last_drop: Option<DropInfo>,
    is_valid: bool,
}

/// Playing field stored as one [`BitRow`] per line, row 0 at the bottom.
///
/// The row buffer is `height + max_piece_height` tall so a piece can land
/// above the logical ceiling before the overflow is noticed. Rows at or above
/// [`wall_height`](Self::wall_height) are always empty.
///
/// # Example
///
/// ```
/// use mdptetris_engine::{BitBoard, BoardConfig, Piece};
///
/// let square = Piece::new(1, 2, 2, "XX\nXX").unwrap();
/// let mut board = BitBoard::new(BoardConfig::default(), 2).unwrap();
///
/// for column in [0, 2, 4, 6] {
///     board.drop_piece(&square.orientations()[0], column, false).unwrap();
/// }
/// let cleared = board.drop_piece(&square.orientations()[0], 8, false).unwrap();
/// assert_eq!(cleared, 2);
/// assert_eq!(board.wall_height(), 0);
/// ```
#[derive(Debug, Clone)]
pub struct BitBoard {
    config: BoardConfig,
    max_piece_height: usize,
    empty_row: BitRow,
    rows: Vec<BitRow>,
    wall_height: usize,
    last_drop: Option<DropInfo>,
    backup: Backup,
}

impl PartialEq for BitBoard {
    fn eq(&self, other: &Self) -> bool {
        self.config == other.config
            && self.max_piece_height == other.max_piece_height
            && self.rows == other.rows
            && self.wall_height == other.wall_height
    }
}

impl Eq for BitBoard {}

impl BitBoard {
    /// Creates an empty board with headroom for pieces up to `max_piece_height` tall.
    pub fn new(config: BoardConfig, max_piece_height: usize) -> Result<Self, BoardConfigError> {
        if !(MIN_BOARD_WIDTH..=MAX_BOARD_WIDTH).contains(&config.width) {
            return Err(BoardConfigError::InvalidWidth {
                width: config.width,
                min: MIN_BOARD_WIDTH,
                max: MAX_BOARD_WIDTH,
            });
        }
        if max_piece_height > config.height {
            return Err(BoardConfigError::PieceTallerThanBoard {
                max_piece_height,
                height: config.height,
            });
        }
        let empty_row = BitRow::empty(config.width);
        let extended_height = config.height + max_piece_height;
        Ok(Self {
            config,
            max_piece_height,
            empty_row,
            rows: vec![empty_row; extended_height],
            wall_height: 0,
            last_drop: None,
            backup: Backup {
                rows: vec![empty_row; extended_height],
                wall_height: 0,
                last_drop: None,
                is_valid: false,
            },
        })
    }

    /// Creates an empty board sized for every piece of `catalog`.
    pub fn for_catalog(config: BoardConfig, catalog: &PieceCatalog) -> Result<Self, BoardConfigError> {
        Self::new(config, catalog.max_piece_height())
    }

    #[must_use]
    pub fn config(&self) -> &BoardConfig {
        &self.config
    }

    #[must_use]
    pub fn width(&self) -> usize {
        self.config.width
    }

    #[must_use]
    pub fn height(&self) -> usize {
        self.config.height
    }

    #[must_use]
    pub fn extended_height(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn max_piece_height(&self) -> usize {
        self.max_piece_height
    }

    /// One past the topmost occupied row; `0` for an empty board.
    #[must_use]
    pub fn wall_height(&self) -> usize {
        self.wall_height
    }

    #[must_use]
    pub fn empty_row(&self) -> BitRow {
        self.empty_row
    }

    #[must_use]
    pub fn row(&self, y: usize) -> BitRow {
        self.rows[y]
    }

    /// All rows of the extended buffer, bottom first.
    #[must_use]
    pub fn rows(&self) -> &[BitRow] {
        &self.rows
    }

    #[must_use]
    pub fn is_cell_occupied(&self, column: usize, y: usize) -> bool {
        self.rows[y].is_cell_occupied(column)
    }

    #[must_use]
    pub fn last_drop(&self) -> Option<&DropInfo> {
        self.last_drop.as_ref()
    }

    #[must_use]
    pub fn has_backup(&self) -> bool {
        self.backup.is_valid
    }

    #[must_use]
    pub fn state(&self) -> BoardState {
        if self.wall_height > self.config.height {
            BoardState::Overflowed
        } else if self.wall_height == 0 {
            BoardState::Empty
        } else {
            BoardState::Active
        }
    }

    pub fn reset(&mut self) {
        self.rows.fill(self.empty_row);
        self.wall_height = 0;
        self.last_drop = None;
        self.backup.is_valid = false;
    }

    /// Validates a placement against the board bounds and remaining headroom.
    pub fn check_placement(
        &self,
        orientation: &PieceOrientation,
        column: usize,
    ) -> Result<(), DropError> {
        if column + orientation.width() > self.config.width {
            return Err(DropError::ColumnOutOfRange {
                column,
                piece_width: orientation.width(),
                board_width: self.config.width,
            });
        }
        if self.wall_height > self.config.height {
            return Err(DropError::Overflowed {
                wall_height: self.wall_height,
                height: self.config.height,
            });
        }
        if self.wall_height + orientation.height() > self.rows.len() {
            return Err(DropError::InsufficientHeadroom {
                piece_height: orientation.height(),
                wall_height: self.wall_height,
                extended_height: self.rows.len(),
            });
        }
        Ok(())
    }

    /// Drops a piece and clears completed lines, returning the number cleared.
    ///
    /// When `cancellable` is set, the previous state is saved and can be
    /// restored with [`cancel_last_move`](Self::cancel_last_move).
    pub fn drop_piece(
        &mut self,
        orientation: &PieceOrientation,
        column: usize,
        cancellable: bool,
    ) -> Result<usize, DropError> {
        self.check_placement(orientation, column)?;
        Ok(self.drop_piece_unchecked(orientation, column, cancellable))
    }

    /// Like [`Self::drop_piece`], without validating the placement.
    ///
    /// The caller must ensure `column + orientation.width() <= width` and that
    /// the board has not overflowed. Violating this leaves the board in an
    /// unspecified state or panics.
    pub fn drop_piece_unchecked(
        &mut self,
        orientation: &PieceOrientation,
        column: usize,
        cancellable: bool,
    ) -> usize {
        debug_assert!(column + orientation.width() <= self.config.width);
        if cancellable {
            self.save_backup();
        } else {
            self.backup.is_valid = false;
        }

        let destination = self.landing_row(orientation, column);
        self.fill_piece(orientation, column, destination);

        let top = destination + orientation.height();
        self.wall_height = usize::max(self.wall_height, top);

        let (cleared_lines, eroded_piece_cells) =
            if top <= self.config.height || self.config.allow_lines_after_overflow {
                self.clear_lines(orientation, destination)
            } else {
                (0, 0)
            };

        self.last_drop = Some(DropInfo {
            landing_row: destination,
            piece_height: orientation.height(),
            cleared_lines,
            eroded_piece_cells,
        });
        cleared_lines
    }

    /// Drops a piece, then trims rows from the bottom until the stack fits
    /// within `height` again. Returns the number of rows trimmed.
    pub fn drop_piece_overflow(
        &mut self,
        orientation: &PieceOrientation,
        column: usize,
        cancellable: bool,
    ) -> Result<usize, DropError> {
        self.check_placement(orientation, column)?;
        Ok(self.drop_piece_overflow_unchecked(orientation, column, cancellable))
    }

    /// Like [`Self::drop_piece_overflow`], without validating the placement.
    pub fn drop_piece_overflow_unchecked(
        &mut self,
        orientation: &PieceOrientation,
        column: usize,
        cancellable: bool,
    ) -> usize {
        self.drop_piece_unchecked(orientation, column, cancellable);

        let height = self.config.height;
        if self.wall_height <= height {
            return 0;
        }
        let excess = self.wall_height - height;
        self.rows.copy_within(excess..self.wall_height, 0);
        self.rows[height..].fill(self.empty_row);
        self.wall_height = height;
        excess
    }

    /// Restores the state saved by the last cancellable drop.
    ///
    /// The backup is consumed: a second call without another cancellable
    /// drop in between fails.
    pub fn cancel_last_move(&mut self) -> Result<(), CancelError> {
        if !self.backup.is_valid {
            return Err(CancelError);
        }
        self.rows.copy_from_slice(&self.backup.rows);
        self.wall_height = self.backup.wall_height;
        self.last_drop = self.backup.last_drop;
        self.backup.is_valid = false;
        Ok(())
    }

    fn save_backup(&mut self) {
        self.backup.rows.copy_from_slice(&self.rows);
        self.backup.wall_height = self.wall_height;
        self.backup.last_drop = self.last_drop;
        self.backup.is_valid = true;
    }

    fn is_colliding(&self, orientation: &PieceOrientation, column: usize, y0: usize) -> bool {
        orientation
            .rows()
            .iter()
            .zip(&self.rows[y0..])
            .any(|(&mask, row)| row.is_any_cell_occupied(column, mask))
    }

    /// Lowest row the piece can rest on, searching down from the wall height.
    fn landing_row(&self, orientation: &PieceOrientation, column: usize) -> usize {
        let mut destination = self.wall_height;
        while destination > 0 && !self.is_colliding(orientation, column, destination - 1) {
            destination -= 1;
        }
        destination
    }

    fn fill_piece(&mut self, orientation: &PieceOrientation, column: usize, y0: usize) {
        for (&mask, row) in orientation.rows().iter().zip(&mut self.rows[y0..]) {
            row.occupy_cells(column, mask);
        }
    }

    /// Removes full rows among those the piece touched.
    ///
    /// Returns `(cleared_lines, eroded_piece_cells)`.
    fn clear_lines(&mut self, orientation: &PieceOrientation, destination: usize) -> (usize, usize) {
        let mut cleared = 0;
        let mut eroded = 0;
        for (k, &cells) in orientation.row_cell_counts().iter().enumerate() {
            let y = destination + k - cleared;
            if !self.rows[y].is_full() {
                continue;
            }
            self.rows.copy_within(y + 1..self.wall_height, y);
            self.wall_height -= 1;
            self.rows[self.wall_height] = self.empty_row;
            cleared += 1;
            eroded += usize::from(cells);
        }
        (cleared, eroded)
    }

    /// Rebuilds a board from raw rows, recomputing the wall height.
    fn from_raw_rows(
        config: BoardConfig,
        max_piece_height: usize,
        raw_rows: &[u16],
    ) -> Result<Self, String> {
        let mut board = Self::new(config, max_piece_height).map_err(|e| e.to_string())?;
        if raw_rows.len() != board.rows.len() {
            return Err(format!(
                "expected {} rows, got {}",
                board.rows.len(),
                raw_rows.len()
            ));
        }
        let empty = board.empty_row.bits;
        for (y, (&bits, row)) in raw_rows.iter().zip(&mut board.rows).enumerate() {
            if bits & empty != empty {
                return Err(format!("row {y} is missing wall bits: {bits:04x}"));
            }
            *row = BitRow::from_bits(bits);
        }
        board.wall_height = board
            .rows
            .iter()
            .rposition(|row| *row != board.empty_row)
            .map_or(0, |y| y + 1);
        if board.rows[..board.wall_height].contains(&board.empty_row) {
            return Err("empty row below the top of the stack".to_owned());
        }
        Ok(board)
    }
}

#[derive(Serialize, Deserialize)]
struct BitBoardRepr {
    config: BoardConfig,
    max_piece_height: usize,
    /// Comma-separated hex rows, bottom first: "0001,fc01,...".
    rows: String,
}

impl Serialize for BitBoard {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut rows = String::with_capacity(self.rows.len() * 5);
        for (i, row) in self.rows.iter().enumerate() {
            if i > 0 {
                rows.push(',');
            }
            write!(&mut rows, "{:04x}", row.bits).map_err(serde::ser::Error::custom)?;
        }
        BitBoardRepr {
            config: self.config,
            max_piece_height: self.max_piece_height,
            rows,
        }
        .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for BitBoard {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let repr = BitBoardRepr::deserialize(deserializer)?;
        let raw_rows = repr
            .rows
            .split(',')
            .enumerate()
            .map(|(i, hex)| {
                u16::from_str_radix(hex, 16).map_err(|e| {
                    serde::de::Error::custom(format!("invalid hex at row {i}: {hex} ({e})"))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::from_raw_rows(repr.config, repr.max_piece_height, &raw_rows)
            .map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use crate::core::piece::Piece;

    use super::*;

    fn square() -> Piece {
        Piece::new(1, 2, 2, "XX\nXX").unwrap()
    }

    fn l_piece() -> Piece {
        Piece::new(4, 3, 2, "X\nX\nXX").unwrap()
    }

    fn i_piece() -> Piece {
        Piece::new(2, 1, 4, "XXXX").unwrap()
    }

    fn board() -> BitBoard {
        BitBoard::new(BoardConfig::default(), 4).unwrap()
    }

    fn assert_empty_above_wall(board: &BitBoard) {
        for y in board.wall_height()..board.extended_height() {
            assert_eq!(board.row(y), board.empty_row(), "row {y} above the wall");
        }
    }

    #[test]
    fn test_bit_row_layout() {
        let row = BitRow::empty(10);
        assert_eq!(row.bits(), 0b1111_1000_0000_0001);
        assert!(row.iter_cells(10).all(|occupied| !occupied));
        assert!(!row.is_full());

        let row = BitRow::empty(14);
        assert_eq!(row.bits(), 0b1000_0000_0000_0001);
    }

    #[test]
    fn test_board_config_validation() {
        let narrow = BoardConfig {
            width: 4,
            ..BoardConfig::default()
        };
        assert!(matches!(
            BitBoard::new(narrow, 4),
            Err(BoardConfigError::InvalidWidth { width: 4, .. })
        ));
        let wide = BoardConfig {
            width: 15,
            ..BoardConfig::default()
        };
        assert!(BitBoard::new(wide, 4).is_err());
        let low = BoardConfig {
            height: 3,
            ..BoardConfig::default()
        };
        assert!(matches!(
            BitBoard::new(low, 4),
            Err(BoardConfigError::PieceTallerThanBoard { .. })
        ));
    }

    #[test]
    fn test_new_board_is_empty() {
        let board = board();
        assert_eq!(board.extended_height(), 24);
        assert_eq!(board.wall_height(), 0);
        assert!(board.state().is_empty());
        assert!(board.rows().iter().all(|&row| row == board.empty_row()));
    }

    #[test]
    fn test_reset_is_idempotent() {
        let l = l_piece();
        let mut board = board();
        board.drop_piece(&l.orientations()[0], 3, true).unwrap();
        board.drop_piece(&l.orientations()[2], 6, false).unwrap();

        board.reset();
        board.reset();
        assert_eq!(board.wall_height(), 0);
        assert!(board.rows().iter().all(|&row| row == board.empty_row()));
        assert!(board.last_drop().is_none());
        assert!(!board.has_backup());
    }

    #[test]
    fn test_drop_lands_on_floor() {
        let l = l_piece();
        for (index, orientation) in l.orientations().iter().enumerate() {
            for column in 0..=10 - orientation.width() {
                let mut board = board();
                board.drop_piece(orientation, column, false).unwrap();
                let info = board.last_drop().unwrap();
                assert_eq!(info.landing_row, 0, "orientation {index} at column {column}");
                assert_eq!(board.wall_height(), orientation.height());
            }
        }
    }

    #[test]
    fn test_drop_stacks_on_overhang() {
        let l = l_piece();
        let o0 = &l.orientations()[0];
        let mut board = board();

        board.drop_piece(o0, 0, false).unwrap();
        // X / X / XX with the wide row on top: the second cell of the top row
        // overhangs column 1.
        assert!(board.is_cell_occupied(0, 0));
        assert!(!board.is_cell_occupied(1, 0));
        assert!(board.is_cell_occupied(1, 2));

        // A single column under the overhang stops at the overhang, not the floor.
        let bar = Piece::new(2, 1, 4, "XXXX").unwrap();
        board.drop_piece(&bar.orientations()[1], 1, false).unwrap();
        assert_eq!(board.last_drop().unwrap().landing_row, 3);
        assert_eq!(board.wall_height(), 7);
    }

    #[test]
    fn test_merge_is_monotonic() {
        let l = l_piece();
        let mut board = board();
        let mut previous = board.rows().to_vec();
        for (i, column) in [0, 3, 5, 7, 1, 4].into_iter().enumerate() {
            let orientation = &l.orientations()[i % 4];
            let cleared = board.drop_piece(orientation, column, false).unwrap();
            assert_eq!(cleared, 0);
            for (before, after) in previous.iter().zip(board.rows()) {
                assert_eq!(before.bits() & after.bits(), before.bits());
            }
            previous = board.rows().to_vec();
        }
        assert_empty_above_wall(&board);
    }

    #[test]
    fn test_cancel_restores_previous_state() {
        let l = l_piece();
        let square = square();
        let mut board = board();
        board.drop_piece(&l.orientations()[1], 0, false).unwrap();
        board.drop_piece(&square.orientations()[0], 5, false).unwrap();
        let before = board.clone();
        let before_drop = *board.last_drop().unwrap();

        board.drop_piece(&l.orientations()[2], 4, true).unwrap();
        assert_ne!(board, before);
        board.cancel_last_move().unwrap();

        assert_eq!(board, before);
        assert_eq!(board.rows(), before.rows());
        assert_eq!(board.wall_height(), before.wall_height());
        assert_eq!(board.last_drop(), Some(&before_drop));
    }

    #[test]
    fn test_cancel_restores_cleared_lines() {
        let square = square();
        let o = &square.orientations()[0];
        let mut board = board();
        for column in [0, 2, 4, 6] {
            board.drop_piece(o, column, false).unwrap();
        }
        let before = board.clone();
        assert_eq!(board.drop_piece(o, 8, true).unwrap(), 2);
        board.cancel_last_move().unwrap();
        assert_eq!(board, before);
        assert_eq!(board.wall_height(), 2);
    }

    #[test]
    fn test_cancel_without_backup_fails() {
        let square = square();
        let mut board = board();
        assert_eq!(board.cancel_last_move(), Err(CancelError));

        board.drop_piece(&square.orientations()[0], 0, true).unwrap();
        board.cancel_last_move().unwrap();
        assert_eq!(board.cancel_last_move(), Err(CancelError));

        board.drop_piece(&square.orientations()[0], 0, true).unwrap();
        board.drop_piece(&square.orientations()[0], 0, false).unwrap();
        assert_eq!(board.cancel_last_move(), Err(CancelError));
    }

    #[test]
    fn test_second_cancellable_drop_overwrites_backup() {
        let square = square();
        let o = &square.orientations()[0];
        let mut board = board();
        board.drop_piece(o, 0, true).unwrap();
        let after_first = board.clone();
        board.drop_piece(o, 0, true).unwrap();
        board.cancel_last_move().unwrap();
        assert_eq!(board, after_first);
        assert_eq!(board.wall_height(), 2);
    }

    #[test]
    fn test_five_squares_clear_two_lines() {
        let square = square();
        let o = &square.orientations()[0];
        let mut board = board();
        for column in [0, 2, 4, 6] {
            assert_eq!(board.drop_piece(o, column, false).unwrap(), 0);
        }
        assert_eq!(board.wall_height(), 2);
        assert_eq!(board.drop_piece(o, 8, false).unwrap(), 2);
        assert_eq!(board.wall_height(), 0);
        assert!(board.state().is_empty());
        assert_eq!(
            board.last_drop(),
            Some(&DropInfo {
                landing_row: 0,
                piece_height: 2,
                cleared_lines: 2,
                eroded_piece_cells: 4,
            })
        );
        assert_empty_above_wall(&board);
    }

    #[test]
    fn test_clear_shifts_rows_above() {
        let l = l_piece();
        let i = i_piece();
        let mut board = board();
        // Bottom row: columns 0..8 filled, column 8..10 left open.
        board.drop_piece(&i.orientations()[0], 0, false).unwrap();
        board.drop_piece(&i.orientations()[0], 4, false).unwrap();
        // Something on top that must survive the clear.
        board.drop_piece(&i.orientations()[0], 2, false).unwrap();
        assert_eq!(board.wall_height(), 2);

        // Upright J-like orientation: XX at the bottom fills columns 8 and 9.
        let o2 = &l.orientations()[2];
        assert_eq!(o2.rows()[0], 0b11);
        let cleared = board.drop_piece(o2, 8, false).unwrap();
        assert_eq!(cleared, 1);
        assert_eq!(board.wall_height(), 2);
        assert_eq!(board.last_drop().unwrap().eroded_piece_cells, 2);
        for column in 2..6 {
            assert!(board.is_cell_occupied(column, 0));
        }
        assert!(board.is_cell_occupied(9, 0));
        assert!(board.is_cell_occupied(9, 1));
        assert!(!board.is_cell_occupied(0, 0));
        assert_empty_above_wall(&board);
    }

    #[test]
    fn test_strict_overflow_is_terminal() {
        let i = i_piece();
        let vertical = &i.orientations()[1];
        let mut board = board();
        for _ in 0..5 {
            board.drop_piece(vertical, 0, false).unwrap();
        }
        assert_eq!(board.wall_height(), 20);
        assert!(board.state().is_active());

        board.drop_piece(vertical, 0, false).unwrap();
        assert_eq!(board.wall_height(), 24);
        assert!(board.state().is_overflowed());
        assert!(matches!(
            board.drop_piece(vertical, 5, false),
            Err(DropError::Overflowed {
                wall_height: 24,
                height: 20
            })
        ));
    }

    #[test]
    fn test_lines_not_cleared_above_ceiling_in_strict_mode() {
        let square = square();
        let domino = Piece::new(2, 1, 2, "XX").unwrap();
        let tromino = Piece::new(2, 1, 3, "XXX").unwrap();
        let config = BoardConfig {
            width: 5,
            height: 2,
            allow_lines_after_overflow: false,
        };
        let mut strict = BitBoard::new(config, 2).unwrap();
        let mut tolerant = BitBoard::new(
            BoardConfig {
                allow_lines_after_overflow: true,
                ..config
            },
            2,
        )
        .unwrap();
        for board in [&mut strict, &mut tolerant] {
            board.drop_piece_unchecked(&square.orientations()[0], 0, false);
            board.drop_piece_unchecked(&square.orientations()[0], 2, false);
            // Covers the empty column 4 at row 2.
            board.drop_piece_unchecked(&domino.orientations()[0], 3, false);
            assert_eq!(board.wall_height(), 3);
        }
        // Row 2 is completed above the ceiling.
        assert_eq!(
            strict.drop_piece_unchecked(&tromino.orientations()[0], 0, false),
            0
        );
        assert_eq!(strict.wall_height(), 3);
        assert!(strict.row(2).is_full());
        assert_eq!(
            tolerant.drop_piece_unchecked(&tromino.orientations()[0], 0, false),
            1
        );
        assert_eq!(tolerant.wall_height(), 2);
    }

    #[test]
    fn test_drop_overflow_trims_bottom_rows() {
        let config = BoardConfig {
            width: 6,
            height: 2,
            allow_lines_after_overflow: true,
        };
        let square = square();
        let o = &square.orientations()[0];
        let mut board = BitBoard::new(config, 2).unwrap();

        assert_eq!(board.drop_piece_overflow(o, 0, false).unwrap(), 0);
        assert_eq!(board.wall_height(), 2);
        assert_eq!(board.drop_piece_overflow(o, 0, false).unwrap(), 2);
        assert_eq!(board.wall_height(), 2);
        assert!(board.state().is_active());
        for y in 0..2 {
            assert!(board.is_cell_occupied(0, y));
            assert!(board.is_cell_occupied(1, y));
            assert!(!board.is_cell_occupied(2, y));
        }
        assert_empty_above_wall(&board);

        let domino = Piece::new(2, 1, 2, "XX").unwrap();
        assert_eq!(
            board
                .drop_piece_overflow(&domino.orientations()[0], 1, false)
                .unwrap(),
            1
        );
        assert_eq!(board.wall_height(), 2);
        assert!(board.is_cell_occupied(1, 1));
        assert!(board.is_cell_occupied(2, 1));
        assert_empty_above_wall(&board);
    }

    #[test]
    fn test_drop_overflow_can_be_cancelled() {
        let config = BoardConfig {
            width: 6,
            height: 2,
            allow_lines_after_overflow: true,
        };
        let square = square();
        let o = &square.orientations()[0];
        let mut board = BitBoard::new(config, 2).unwrap();
        board.drop_piece_overflow(o, 3, false).unwrap();
        let before = board.clone();
        assert_eq!(board.drop_piece_overflow(o, 3, true).unwrap(), 2);
        board.cancel_last_move().unwrap();
        assert_eq!(board, before);
    }

    #[test]
    fn test_checked_drop_rejects_bad_columns() {
        let l = l_piece();
        let mut board = board();
        let wide = &l.orientations()[1];
        assert!(board.drop_piece(wide, 7, false).is_ok());
        assert_eq!(
            board.drop_piece(wide, 8, false),
            Err(DropError::ColumnOutOfRange {
                column: 8,
                piece_width: 3,
                board_width: 10,
            })
        );
    }

    #[test]
    fn test_checked_drop_rejects_pieces_without_headroom() {
        let mut board = BitBoard::new(BoardConfig::default(), 2).unwrap();
        let bar = i_piece();
        let vertical = &bar.orientations()[1];
        for _ in 0..4 {
            board.drop_piece(vertical, 0, false).unwrap();
        }
        assert_eq!(board.wall_height(), 16);
        board.drop_piece(vertical, 0, false).unwrap();
        assert_eq!(board.wall_height(), 20);
        assert!(matches!(
            board.drop_piece(vertical, 0, false),
            Err(DropError::InsufficientHeadroom { .. })
        ));
    }

    #[test]
    fn test_serialization_round_trip() {
        let l = l_piece();
        let mut board = board();
        board.drop_piece(&l.orientations()[0], 0, false).unwrap();
        board.drop_piece(&l.orientations()[3], 4, false).unwrap();

        let bottom = board.row(0);
        assert!(bottom.is_cell_occupied(0));
        assert!(!bottom.is_cell_occupied(3));

        let json = serde_json::to_string(&board).unwrap();
        assert!(json.contains(&format!("{:04x}", bottom.bits())));
        let restored: BitBoard = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, board);
        assert_eq!(restored.wall_height(), board.wall_height());
    }

    #[test]
    fn test_deserialization_rejects_missing_walls() {
        let board = board();
        let json = serde_json::to_string(&board).unwrap();
        let broken = json.replacen("f801", "0000", 1);
        assert!(serde_json::from_str::<BitBoard>(&broken).is_err());
    }
}

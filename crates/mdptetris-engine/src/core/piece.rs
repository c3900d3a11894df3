use arrayvec::ArrayVec;

use super::bit_board::MAX_BOARD_WIDTH;

/// Maximum number of distinct 90° rotations a piece can have.
pub const MAX_ORIENTATIONS: usize = 4;

/// Largest extent of a piece in either direction.
///
/// Rotation swaps width and height, so both are bounded by the widest board.
pub const MAX_PIECE_EXTENT: usize = MAX_BOARD_WIDTH;

#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum PieceError {
    #[display("number of orientations must be between 1 and 4, got {count}")]
    InvalidOrientationCount { count: usize },
    #[display("piece height must be between 1 and 14, got {height}")]
    InvalidHeight { height: usize },
    #[display("piece width must be between 1 and 14, got {width}")]
    InvalidWidth { width: usize },
    #[display("shape has no filled cell")]
    EmptyShape,
    #[display("filled cell at row {row}, column {column} is outside the declared bounding box")]
    CellOutOfBounds { row: usize, column: usize },
    #[display("shape row {row} has no filled cell")]
    EmptyRow { row: usize },
    #[display("shape column {column} has no filled cell")]
    EmptyColumn { column: usize },
}

/// One rotation of a piece.
///
/// Each row is a bitmask where bit `j` is the `j`-th cell from the left of the
/// piece's bounding box. Row 0 is the bottom of the piece.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PieceOrientation {
    width: usize,
    height: usize,
    rows: ArrayVec<u16, MAX_PIECE_EXTENT>,
    row_cell_counts: ArrayVec<u8, MAX_PIECE_EXTENT>,
}

impl PieceOrientation {
    fn from_rows(width: usize, height: usize, rows: ArrayVec<u16, MAX_PIECE_EXTENT>) -> Self {
        debug_assert_eq!(rows.len(), height);
        let row_cell_counts = rows
            .iter()
            .map(|row| u8::try_from(row.count_ones()).unwrap_or(u8::MAX))
            .collect();
        Self {
            width,
            height,
            rows,
            row_cell_counts,
        }
    }

    #[must_use]
    pub fn width(&self) -> usize {
        self.width
    }

    #[must_use]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Row bitmasks, bottom row first.
    #[must_use]
    pub fn rows(&self) -> &[u16] {
        &self.rows
    }

    /// Number of filled cells on each row, bottom row first.
    #[must_use]
    pub fn row_cell_counts(&self) -> &[u8] {
        &self.row_cell_counts
    }

    #[must_use]
    pub fn cell_count(&self) -> usize {
        self.row_cell_counts.iter().map(|&n| usize::from(n)).sum()
    }

    #[must_use]
    pub fn is_cell_filled(&self, row: usize, column: usize) -> bool {
        self.rows[row] & (1 << column) != 0
    }

    /// Returns this orientation turned by 90°.
    ///
    /// The rotated shape at `(i, j)` is this shape at `(height - 1 - j, i)`;
    /// width and height are swapped.
    #[must_use]
    pub fn rotated(&self) -> Self {
        let width = self.height;
        let height = self.width;
        let rows = (0..height)
            .map(|i| {
                (0..width)
                    .filter(|&j| self.is_cell_filled(self.height - 1 - j, i))
                    .fold(0u16, |row, j| row | (1 << j))
            })
            .collect();
        Self::from_rows(width, height, rows)
    }
}

/// A piece with all of its pre-rendered orientations.
///
/// # Example
///
/// ```
/// use mdptetris_engine::Piece;
///
/// let l = Piece::new(4, 3, 2, "X\nX\nXX").unwrap();
/// assert_eq!(l.num_orientations(), 4);
/// assert_eq!(l.orientations()[1].width(), 3);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Piece {
    orientations: ArrayVec<PieceOrientation, MAX_ORIENTATIONS>,
}

impl Piece {
    /// Builds a piece from its initial shape.
    ///
    /// `shape` uses `X` for a filled cell, any other character for an empty
    /// cell and a newline between rows. The first line is the bottom row.
    /// Leading and trailing newlines are ignored.
    pub fn new(
        num_orientations: usize,
        height: usize,
        width: usize,
        shape: &str,
    ) -> Result<Self, PieceError> {
        if !(1..=MAX_ORIENTATIONS).contains(&num_orientations) {
            return Err(PieceError::InvalidOrientationCount {
                count: num_orientations,
            });
        }
        if !(1..=MAX_PIECE_EXTENT).contains(&height) {
            return Err(PieceError::InvalidHeight { height });
        }
        if !(1..=MAX_PIECE_EXTENT).contains(&width) {
            return Err(PieceError::InvalidWidth { width });
        }
        if !shape.contains('X') {
            return Err(PieceError::EmptyShape);
        }

        let rows = parse_shape(height, width, shape)?;
        if let Some(row) = rows.iter().position(|&r| r == 0) {
            return Err(PieceError::EmptyRow { row });
        }
        let occupied_columns = rows.iter().fold(0u16, |acc, &r| acc | r);
        if let Some(column) = (0..width).find(|&x| occupied_columns & (1 << x) == 0) {
            return Err(PieceError::EmptyColumn { column });
        }

        let mut orientations = ArrayVec::new();
        orientations.push(PieceOrientation::from_rows(width, height, rows));
        for k in 1..num_orientations {
            let next = orientations[k - 1].rotated();
            orientations.push(next);
        }
        Ok(Self { orientations })
    }

    #[must_use]
    pub fn orientations(&self) -> &[PieceOrientation] {
        &self.orientations
    }

    #[must_use]
    pub fn orientation(&self, index: usize) -> Option<&PieceOrientation> {
        self.orientations.get(index)
    }

    #[must_use]
    pub fn num_orientations(&self) -> usize {
        self.orientations.len()
    }

    /// Tallest extent over all orientations.
    #[must_use]
    pub fn max_height(&self) -> usize {
        self.orientations
            .iter()
            .map(PieceOrientation::height)
            .max()
            .unwrap_or(0)
    }
}

fn parse_shape(
    height: usize,
    width: usize,
    shape: &str,
) -> Result<ArrayVec<u16, MAX_PIECE_EXTENT>, PieceError> {
    let mut rows: ArrayVec<u16, MAX_PIECE_EXTENT> = std::iter::repeat_n(0, height).collect();
    let (mut y, mut x) = (0, 0);
    for ch in shape.trim_matches('\n').chars() {
        match ch {
            '\n' => {
                y += 1;
                x = 0;
            }
            'X' => {
                if y >= height || x >= width {
                    return Err(PieceError::CellOutOfBounds { row: y, column: x });
                }
                rows[y] |= 1 << x;
                x += 1;
            }
            _ => x += 1,
        }
    }
    Ok(rows)
}

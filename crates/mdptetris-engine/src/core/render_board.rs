use std::fmt;

use super::{
    bit_board::{BitBoard, BitRow},
    piece::{Piece, PieceOrientation},
};

const FILLED: char = 'X';
const EMPTY: char = '.';

fn cell_char(occupied: bool) -> char {
    if occupied { FILLED } else { EMPTY }
}

impl BitBoard {
    /// Dense view of the logical rows, top row first; `grid[i][c]` is column `c`.
    #[must_use]
    pub fn to_grid(&self) -> Vec<Vec<bool>> {
        self.rows()[..self.height()]
            .iter()
            .rev()
            .map(|row| row.iter_cells(self.width()).collect())
            .collect()
    }

    fn fmt_row(&self, f: &mut fmt::Formatter<'_>, row: BitRow, border: char) -> fmt::Result {
        write!(f, "{border}")?;
        for occupied in row.iter_cells(self.width()) {
            write!(f, "{}", cell_char(occupied))?;
        }
        writeln!(f, "{border}")
    }
}

/// Renders the board top row first.
///
/// Rows above the logical height are drawn without walls; the well itself is
/// drawn as `|X.|` rows on top of a `+--+` floor.
impl fmt::Display for BitBoard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let height = self.height();
        for y in (0..self.extended_height()).rev() {
            let border = if y >= height { ' ' } else { '|' };
            self.fmt_row(f, self.row(y), border)?;
        }
        write!(f, "+{}+", "-".repeat(self.width()))
    }
}

impl fmt::Display for PieceOrientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in (0..self.height()).rev() {
            for column in 0..self.width() {
                write!(f, "{}", cell_char(self.is_cell_filled(row, column)))?;
            }
            if row > 0 {
                writeln!(f)?;
            }
        }
        Ok(())
    }
}

impl fmt::Display for Piece {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, orientation) in self.orientations().iter().enumerate() {
            if i > 0 {
                write!(f, "\n\n")?;
            }
            write!(f, "{orientation}")?;
        }
        Ok(())
    }
}

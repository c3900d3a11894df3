use std::{fs, io, path::Path};

use super::piece::{Piece, PieceError};

const STANDARD_PIECES: &str = include_str!("../../data/pieces4.dat");
const MELAX_PIECES: &str = include_str!("../../data/pieces_melax.dat");

#[derive(Debug, derive_more::Display, derive_more::Error)]
pub enum CatalogError {
    #[display("line {line}: {message}")]
    Format {
        line: usize,
        message: String,
    },
    #[display("piece {index}: {source}")]
    Shape { index: usize, source: PieceError },
    #[display("failed to read piece file: {source}")]
    Io { source: io::Error },
}

/// Ordered set of pieces shared by every board of a run.
///
/// # Text format
///
/// Lines starting with `#` and blank lines are ignored. The first data line
/// is the piece count; each piece is a header `<orientations> <height> <width>`
/// followed by `height` shape lines, bottom row first.
///
/// ```text
/// 1
/// # O
/// 1 2 2
/// XX
/// XX
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PieceCatalog {
    pieces: Vec<Piece>,
    max_piece_height: usize,
}

impl PieceCatalog {
    /// The seven standard tetrominoes, in `I O T Z S J L` order.
    #[must_use]
    pub fn standard() -> Self {
        Self::parse(STANDARD_PIECES).unwrap_or_else(|e| panic!("built-in piece set is invalid: {e}"))
    }

    /// The reduced piece set used with the 6×2 overflow-tolerant board.
    #[must_use]
    pub fn melax() -> Self {
        Self::parse(MELAX_PIECES).unwrap_or_else(|e| panic!("built-in piece set is invalid: {e}"))
    }

    #[must_use]
    pub fn from_pieces(pieces: Vec<Piece>) -> Self {
        let max_piece_height = pieces.iter().map(Piece::max_height).max().unwrap_or(0);
        Self {
            pieces,
            max_piece_height,
        }
    }

    pub fn load<P>(path: P) -> Result<Self, CatalogError>
    where
        P: AsRef<Path>,
    {
        let text = fs::read_to_string(path).map_err(|source| CatalogError::Io { source })?;
        Self::parse(&text)
    }

    pub fn parse(text: &str) -> Result<Self, CatalogError> {
        let mut lines = text
            .lines()
            .enumerate()
            .map(|(i, line)| (i + 1, line.trim_end_matches('\r')))
            .filter(|(_, line)| !line.starts_with('#') && !line.trim().is_empty());

        let (line, count) = lines.next().ok_or_else(|| CatalogError::Format {
            line: 0,
            message: "missing piece count".to_owned(),
        })?;
        let count = parse_number(line, count.trim(), "piece count")?;

        let mut pieces = Vec::new();
        for index in 0..count {
            let (line, header) = lines.next().ok_or_else(|| CatalogError::Format {
                line: 0,
                message: format!("expected {count} pieces, found {index}"),
            })?;
            let [num_orientations, height, width] = parse_header(line, header)?;

            let mut shape = String::new();
            for row in 0..height {
                let (_, text) = lines.next().ok_or_else(|| CatalogError::Format {
                    line,
                    message: format!("piece {index} declares {height} rows, found {row}"),
                })?;
                if row > 0 {
                    shape.push('\n');
                }
                shape.push_str(text);
            }

            let piece = Piece::new(num_orientations, height, width, &shape)
                .map_err(|source| CatalogError::Shape { index, source })?;
            pieces.push(piece);
        }

        if let Some((line, _)) = lines.next() {
            return Err(CatalogError::Format {
                line,
                message: format!("trailing data after {count} pieces"),
            });
        }

        Ok(Self::from_pieces(pieces))
    }

    #[must_use]
    pub fn pieces(&self) -> &[Piece] {
        &self.pieces
    }

    #[must_use]
    pub fn piece(&self, index: usize) -> Option<&Piece> {
        self.pieces.get(index)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.pieces.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pieces.is_empty()
    }

    /// Tallest orientation over all pieces; the board reserves this much
    /// headroom above its logical height.
    #[must_use]
    pub fn max_piece_height(&self) -> usize {
        self.max_piece_height
    }
}

fn parse_number(line: usize, text: &str, what: &str) -> Result<usize, CatalogError> {
    text.parse().map_err(|e| CatalogError::Format {
        line,
        message: format!("invalid {what} `{text}`: {e}"),
    })
}

fn parse_header(line: usize, header: &str) -> Result<[usize; 3], CatalogError> {
    let fields = header.split_whitespace().collect::<Vec<_>>();
    let [orientations, height, width] = fields[..] else {
        return Err(CatalogError::Format {
            line,
            message: format!("expected `<orientations> <height> <width>`, got `{header}`"),
        });
    };
    Ok([
        parse_number(line, orientations, "orientation count")?,
        parse_number(line, height, "height")?,
        parse_number(line, width, "width")?,
    ])
}

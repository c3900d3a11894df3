use serde::{Deserialize, Serialize};

use crate::{
    EpisodeError, StepError,
    core::{
        bit_board::{BitBoard, BitRow, BoardConfig},
        piece_catalog::PieceCatalog,
    },
};

use super::piece_generator::{PieceGenerator, PieceSeed};

/// Built-in piece sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PieceSet {
    #[default]
    Standard,
    Melax,
}

impl PieceSet {
    #[must_use]
    pub fn catalog(self) -> PieceCatalog {
        match self {
            Self::Standard => PieceCatalog::standard(),
            Self::Melax => PieceCatalog::melax(),
        }
    }
}

/// How a step resolves a stack that grows past the board height.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, derive_more::IsVariant)]
#[serde(rename_all = "snake_case")]
pub enum DropMode {
    /// Growing past the height ends the episode.
    #[default]
    Strict,
    /// Excess rows are trimmed from the bottom and returned as a penalty.
    Overflow,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpisodeConfig {
    pub board: BoardConfig,
    pub piece_set: PieceSet,
    pub drop_mode: DropMode,
    /// Episode ends once this many pieces have been dropped; the last
    /// allowed drop is reported as terminal.
    pub max_pieces: Option<usize>,
}

impl Default for EpisodeConfig {
    fn default() -> Self {
        Self::standard()
    }
}

impl EpisodeConfig {
    /// 10×20 board, seven tetrominoes, terminal on overflow.
    #[must_use]
    pub fn standard() -> Self {
        Self {
            board: BoardConfig::default(),
            piece_set: PieceSet::Standard,
            drop_mode: DropMode::Strict,
            max_pieces: None,
        }
    }

    /// 6×2 board with the reduced piece set, trimming overflow for 1000 pieces.
    #[must_use]
    pub fn melax() -> Self {
        Self {
            board: BoardConfig {
                width: 6,
                height: 2,
                allow_lines_after_overflow: true,
            },
            piece_set: PieceSet::Melax,
            drop_mode: DropMode::Overflow,
            max_pieces: Some(1000),
        }
    }
}

/// Placement chosen by an agent.
///
/// Out-of-range values are folded back into range when the action is applied:
/// the orientation modulo the piece's orientation count and the column clamped
/// to the rightmost position the orientation fits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Action {
    pub orientation: usize,
    pub column: usize,
}

impl Action {
    #[must_use]
    pub fn new(orientation: usize, column: usize) -> Self {
        Self {
            orientation,
            column,
        }
    }

    /// Decodes a flat discrete action `orientation * width + column`.
    #[must_use]
    pub fn from_index(index: usize, width: usize) -> Self {
        Self {
            orientation: index / width,
            column: index % width,
        }
    }

    #[must_use]
    pub fn to_index(self, width: usize) -> usize {
        self.orientation * width + self.column
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Observation {
    /// Index of the piece to place next.
    pub piece: usize,
    pub width: usize,
    /// Raw row bitmasks of the whole extended buffer, bottom first, walls
    /// included. Rows at or above the board height are non-empty only after
    /// a strict overflow.
    pub rows: Vec<u16>,
}

impl Observation {
    /// Dense view of `rows`, top row first.
    #[must_use]
    pub fn grid(&self) -> Vec<Vec<bool>> {
        self.rows
            .iter()
            .rev()
            .map(|&bits| BitRow::from_bits(bits).iter_cells(self.width).collect())
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepInfo {
    pub piece_drops: usize,
    pub wall_height: usize,
    pub lines_cleared: usize,
    /// Rows trimmed from the bottom in overflow mode.
    pub rows_exceeded: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StepResult {
    pub observation: Observation,
    pub reward: f64,
    pub terminal: bool,
    pub info: StepInfo,
}

/// Reinforcement-learning style environment around a [`BitBoard`].
///
/// # Example
///
/// ```
/// use mdptetris_engine::{Action, Episode, EpisodeConfig, PieceSeed};
///
/// let mut episode = Episode::new(EpisodeConfig::standard(), PieceSeed::from(1)).unwrap();
/// let observation = episode.reset();
/// assert!(observation.piece < 7);
///
/// let result = episode.step(Action::new(0, 0)).unwrap();
/// assert!(!result.terminal);
/// ```
#[derive(Debug, Clone)]
pub struct Episode {
    config: EpisodeConfig,
    catalog: PieceCatalog,
    board: BitBoard,
    generator: PieceGenerator,
    current_piece: usize,
    piece_drops: usize,
    total_lines: usize,
    terminal: bool,
}

impl Episode {
    /// Creates an episode using the configured built-in piece set.
    pub fn new(config: EpisodeConfig, seed: PieceSeed) -> Result<Self, EpisodeError> {
        Self::with_catalog(config, config.piece_set.catalog(), seed)
    }

    /// Creates an episode with a custom catalog; `config.piece_set` is ignored.
    pub fn with_catalog(
        config: EpisodeConfig,
        catalog: PieceCatalog,
        seed: PieceSeed,
    ) -> Result<Self, EpisodeError> {
        if catalog.is_empty() {
            return Err(EpisodeError::EmptyCatalog);
        }
        let board = BitBoard::for_catalog(config.board, &catalog)
            .map_err(|source| EpisodeError::Board { source })?;
        let mut generator = PieceGenerator::with_seed(catalog.len(), seed);
        let current_piece = generator.next_piece();
        Ok(Self {
            config,
            catalog,
            board,
            generator,
            current_piece,
            piece_drops: 0,
            total_lines: 0,
            terminal: false,
        })
    }

    #[must_use]
    pub fn config(&self) -> &EpisodeConfig {
        &self.config
    }

    #[must_use]
    pub fn catalog(&self) -> &PieceCatalog {
        &self.catalog
    }

    #[must_use]
    pub fn board(&self) -> &BitBoard {
        &self.board
    }

    #[must_use]
    pub fn current_piece(&self) -> usize {
        self.current_piece
    }

    #[must_use]
    pub fn piece_drops(&self) -> usize {
        self.piece_drops
    }

    #[must_use]
    pub fn total_lines(&self) -> usize {
        self.total_lines
    }

    #[must_use]
    pub fn is_terminal(&self) -> bool {
        self.terminal
    }

    /// Size of the flat action space: every orientation slot times every column.
    #[must_use]
    pub fn num_actions(&self) -> usize {
        crate::MAX_ORIENTATIONS * self.board.width()
    }

    /// Replaces the piece generator with one seeded by `seed`.
    ///
    /// The board is left as is; the new sequence starts with the piece drawn
    /// by the next [`reset`](Self::reset).
    pub fn seed(&mut self, seed: PieceSeed) {
        self.generator = PieceGenerator::with_seed(self.catalog.len(), seed);
        tracing::debug!(%seed, "episode reseeded");
    }

    /// Clears the board and draws a new piece.
    ///
    /// The piece sequence continues from where the previous episode stopped
    /// unless [`seed`](Self::seed) was called in between.
    pub fn reset(&mut self) -> Observation {
        self.board.reset();
        self.current_piece = self.generator.next_piece();
        self.piece_drops = 0;
        self.total_lines = 0;
        self.terminal = false;
        tracing::debug!(piece = self.current_piece, "episode reset");
        self.observation()
    }

    #[must_use]
    pub fn observation(&self) -> Observation {
        Observation {
            piece: self.current_piece,
            width: self.board.width(),
            rows: self
                .board
                .rows()
                .iter()
                .map(|row| row.bits())
                .collect(),
        }
    }

    /// Drops the current piece according to `action` and draws the next one.
    pub fn step(&mut self, action: Action) -> Result<StepResult, StepError> {
        if self.terminal {
            return Err(StepError::Terminated);
        }

        let piece = &self.catalog.pieces()[self.current_piece];
        let orientation = &piece.orientations()[action.orientation % piece.num_orientations()];
        let column = usize::min(
            action.column,
            self.board.width().saturating_sub(orientation.width()),
        );

        let (lines_cleared, rows_exceeded) = match self.config.drop_mode {
            DropMode::Strict => {
                let lines = self
                    .board
                    .drop_piece(orientation, column, false)
                    .map_err(|source| StepError::Drop { source })?;
                (lines, 0)
            }
            DropMode::Overflow => {
                let excess = self
                    .board
                    .drop_piece_overflow(orientation, column, false)
                    .map_err(|source| StepError::Drop { source })?;
                let lines = self.board.last_drop().map_or(0, |info| info.cleared_lines);
                (lines, excess)
            }
        };
        self.piece_drops += 1;
        self.total_lines += lines_cleared;

        let reward = self.reward(lines_cleared, rows_exceeded);
        let overflowed = self.config.drop_mode.is_strict() && self.board.state().is_overflowed();
        let exhausted = self
            .config
            .max_pieces
            .is_some_and(|max| self.piece_drops >= max);
        self.terminal = overflowed || exhausted;

        tracing::trace!(
            piece = self.current_piece,
            orientation = action.orientation,
            column,
            lines_cleared,
            rows_exceeded,
            wall_height = self.board.wall_height(),
            "step"
        );
        if self.terminal {
            tracing::debug!(
                piece_drops = self.piece_drops,
                total_lines = self.total_lines,
                overflowed,
                "episode terminated"
            );
        }

        self.current_piece = self.generator.next_piece();
        Ok(StepResult {
            observation: self.observation(),
            reward,
            terminal: self.terminal,
            info: StepInfo {
                piece_drops: self.piece_drops,
                wall_height: self.board.wall_height(),
                lines_cleared,
                rows_exceeded,
            },
        })
    }

    #[expect(clippy::cast_precision_loss)]
    fn reward(&self, lines_cleared: usize, rows_exceeded: usize) -> f64 {
        match self.config.drop_mode {
            DropMode::Strict => lines_cleared as f64,
            DropMode::Overflow => -(rows_exceeded as f64),
        }
    }

    /// Text view of the board with the piece to place next.
    #[must_use]
    pub fn render(&self) -> String {
        let piece = &self.catalog.pieces()[self.current_piece];
        format!(
            "drops: {}  lines: {}\nnext piece {}:\n{}\n{}",
            self.piece_drops,
            self.total_lines,
            self.current_piece,
            piece.orientations()[0],
            self.board
        )
    }
}

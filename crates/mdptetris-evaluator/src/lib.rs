//! Heuristic evaluation and one-ply search for piece-dropping Tetris.
//!
//! The crate is layered the same way a controller uses it:
//!
//! ```text
//! Game loop (play until overflow or a piece limit)
//!     ↓ uses
//! Placement search (try every orientation and column, keep the best)
//!     ↓ uses
//! Placement evaluation (score the board left by one drop)
//!     ↓ uses
//! Board features (Dellacherie heuristics on row bitmasks)
//! ```
//!
//! - [`board_feature`] - Feature functions and the [`board_feature::BoardFeature`] ids
//! - [`placement_evaluator`] - [`placement_evaluator::PlacementEvaluator`] and the linear model
//! - [`placement_search`] - Speculative drop, score, roll back, commit the best
//! - [`game`] - [`game::play_game`] and [`game::GameStats`]
//!
//! # Example
//!
//! ```
//! use mdptetris_engine::{BitBoard, BoardConfig, PieceCatalog, PieceGenerator, PieceSeed};
//! use mdptetris_evaluator::{
//!     game, placement_evaluator::FeatureWeights, placement_search::PlacementSearch,
//! };
//!
//! let catalog = PieceCatalog::standard();
//! let mut board = BitBoard::for_catalog(BoardConfig::default(), &catalog).unwrap();
//! let mut generator = PieceGenerator::with_seed(catalog.len(), PieceSeed::from(0));
//! let search = PlacementSearch::with_weights(&FeatureWeights::dellacherie());
//!
//! let stats = game::play_game(&search, &mut board, &catalog, &mut generator, Some(50)).unwrap();
//! assert_eq!(stats.completed_pieces(), 50);
//! ```

pub mod board_feature;
pub mod game;
pub mod placement_evaluator;
pub mod placement_search;

use std::path::PathBuf;

use anyhow::Context as _;
use chrono::{DateTime, Utc};
use mdptetris_engine::{BitBoard, BoardConfig, PieceCatalog, PieceGenerator, PieceSeed};
use mdptetris_evaluator::{
    game::{self, GameStats},
    placement_evaluator::FeatureWeights,
    placement_search::PlacementSearch,
};
use serde::Serialize;

use crate::util;

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct PlayArg {
    /// Number of games to play
    #[arg(long, default_value_t = 10)]
    games: usize,
    /// Board width
    #[arg(long, default_value_t = 10)]
    width: usize,
    /// Board height
    #[arg(long, default_value_t = 20)]
    height: usize,
    /// Stop a game after this many pieces
    #[arg(long)]
    piece_limit: Option<usize>,
    /// Seed for the piece sequence (random if omitted)
    #[arg(long)]
    seed: Option<u64>,
    /// Feature weights JSON file (Dellacherie weights if omitted)
    #[arg(long)]
    weights: Option<PathBuf>,
    /// Piece file (standard tetrominoes if omitted)
    #[arg(long)]
    pieces: Option<PathBuf>,
    /// Output file path for the JSON report
    #[arg(long)]
    output: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
struct PlayReport {
    created_at: DateTime<Utc>,
    seed: PieceSeed,
    board: BoardConfig,
    weights: FeatureWeights,
    piece_limit: Option<usize>,
    mean_cleared_lines: f64,
    games: Vec<GameStats>,
}

#[expect(clippy::cast_precision_loss)]
fn mean_cleared_lines(games: &[GameStats]) -> f64 {
    if games.is_empty() {
        return 0.0;
    }
    let total = games
        .iter()
        .map(GameStats::total_cleared_lines)
        .sum::<usize>();
    total as f64 / games.len() as f64
}

pub(crate) fn run(arg: &PlayArg) -> anyhow::Result<()> {
    let PlayArg {
        games,
        width,
        height,
        piece_limit,
        seed,
        weights,
        pieces,
        output,
    } = arg;

    let weights = util::read_weights_file(weights.as_deref())?;
    let catalog = util::load_catalog(pieces.as_deref(), PieceCatalog::standard)?;
    let config = BoardConfig {
        width: *width,
        height: *height,
        allow_lines_after_overflow: false,
    };
    let mut board = BitBoard::for_catalog(config, &catalog)
        .with_context(|| format!("Invalid board {width}x{height}"))?;
    let seed = util::piece_seed(*seed);
    let mut generator = PieceGenerator::with_seed(catalog.len(), seed);
    let search = PlacementSearch::with_weights(&weights);

    tracing::info!(%seed, games, "starting games");
    let mut results = Vec::with_capacity(*games);
    for index in 0..*games {
        let stats = game::play_game(&search, &mut board, &catalog, &mut generator, *piece_limit)
            .with_context(|| format!("Game {index} failed"))?;
        tracing::info!(
            game = index,
            pieces = stats.completed_pieces(),
            lines = stats.total_cleared_lines(),
            "game finished"
        );
        results.push(stats);
    }

    let report = PlayReport {
        created_at: Utc::now(),
        seed,
        board: config,
        weights,
        piece_limit: *piece_limit,
        mean_cleared_lines: mean_cleared_lines(&results),
        games: results,
    };
    tracing::info!(mean = report.mean_cleared_lines, "all games finished");
    util::write_json_report(&report, output.as_deref())?;

    Ok(())
}

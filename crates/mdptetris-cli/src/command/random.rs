use std::{
    io::{self, Write as _},
    path::PathBuf,
};

use anyhow::Context as _;
use mdptetris_engine::{Action, Episode, EpisodeConfig};
use rand::{Rng as _, SeedableRng as _};
use rand_pcg::Pcg32;

use crate::util;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub(crate) enum Preset {
    /// 10x20 board with the seven tetrominoes
    #[default]
    Standard,
    /// 6x2 overflow-tolerant board with the reduced piece set
    Melax,
}

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct RandomArg {
    /// Episode configuration
    #[arg(long, value_enum, default_value_t)]
    preset: Preset,
    /// Seed for pieces and actions (random if omitted)
    #[arg(long)]
    seed: Option<u64>,
    /// Stop after this many steps even if the episode is not over
    #[arg(long, default_value_t = 1000)]
    max_steps: usize,
    /// Piece file overriding the preset's piece set
    #[arg(long)]
    pieces: Option<PathBuf>,
    /// Print only the final summary
    #[arg(long)]
    quiet: bool,
}

pub(crate) fn run(arg: &RandomArg) -> anyhow::Result<()> {
    let config = match arg.preset {
        Preset::Standard => EpisodeConfig::standard(),
        Preset::Melax => EpisodeConfig::melax(),
    };
    let catalog = util::load_catalog(arg.pieces.as_deref(), || config.piece_set.catalog())?;
    let seed = util::piece_seed(arg.seed);
    let mut episode =
        Episode::with_catalog(config, catalog, seed).context("Failed to create episode")?;
    let mut rng = Pcg32::seed_from_u64(arg.seed.unwrap_or_else(|| rand::rng().random()));

    tracing::info!(%seed, preset = ?arg.preset, "starting random episode");
    let mut stdout = io::stdout().lock();
    episode.reset();
    let mut total_reward = 0.0;
    let mut steps = 0;
    while steps < arg.max_steps {
        let action = Action::from_index(
            rng.random_range(0..episode.num_actions()),
            episode.board().width(),
        );
        let result = episode.step(action)?;
        steps += 1;
        total_reward += result.reward;
        if !arg.quiet {
            writeln!(
                stdout,
                "step {steps}: action ({}, {}) reward {}\n{}\n",
                action.orientation,
                action.column,
                result.reward,
                episode.render()
            )
            .context("Failed to write to stdout")?;
        }
        if result.terminal {
            break;
        }
    }

    writeln!(
        stdout,
        "steps: {steps}, lines: {}, total reward: {total_reward}, terminal: {}",
        episode.total_lines(),
        episode.is_terminal()
    )
    .context("Failed to write to stdout")?;
    Ok(())
}

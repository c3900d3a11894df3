use clap::{Parser, Subcommand};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::prelude::*;

use self::{pieces::PiecesArg, play::PlayArg, random::RandomArg};

mod pieces;
mod play;
mod random;

#[derive(Debug, Clone, Parser)]
#[command(author, version, about, long_about = None)]
pub struct CommandArgs {
    /// Increase log verbosity (-v: debug, -vv: trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
    /// What mode to run the program in
    #[command(subcommand)]
    mode: Mode,
}

#[derive(Debug, Clone, Subcommand)]
enum Mode {
    /// Play games with the one-ply search controller
    Play(#[clap(flatten)] PlayArg),
    /// Run an episode with uniformly random actions, rendering each step
    Random(#[clap(flatten)] RandomArg),
    /// Print every orientation of a piece set
    Pieces(#[clap(flatten)] PiecesArg),
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::INFO,
        1 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .with(level)
        .init();
}

pub fn run() -> anyhow::Result<()> {
    let args = CommandArgs::parse();
    init_logging(args.verbose);
    match args.mode {
        Mode::Play(arg) => play::run(&arg)?,
        Mode::Random(arg) => random::run(&arg)?,
        Mode::Pieces(arg) => pieces::run(&arg)?,
    }
    Ok(())
}

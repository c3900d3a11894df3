use std::{
    io::{self, Write as _},
    path::PathBuf,
};

use anyhow::Context as _;
use mdptetris_engine::PieceSet;

use crate::util;

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct PiecesArg {
    /// Built-in piece set to print
    #[arg(long, value_enum, default_value_t = Set::Standard)]
    set: Set,
    /// Piece file to print instead of a built-in set
    #[arg(long)]
    file: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
enum Set {
    Standard,
    Melax,
}

impl From<Set> for PieceSet {
    fn from(set: Set) -> Self {
        match set {
            Set::Standard => PieceSet::Standard,
            Set::Melax => PieceSet::Melax,
        }
    }
}

pub(crate) fn run(arg: &PiecesArg) -> anyhow::Result<()> {
    let catalog = util::load_catalog(arg.file.as_deref(), || PieceSet::from(arg.set).catalog())?;

    let mut stdout = io::stdout().lock();
    writeln!(
        stdout,
        "{} pieces, max height {}",
        catalog.len(),
        catalog.max_piece_height()
    )
    .context("Failed to write to stdout")?;
    for (index, piece) in catalog.pieces().iter().enumerate() {
        writeln!(
            stdout,
            "\npiece {index} ({} orientations):\n{piece}",
            piece.num_orientations()
        )
        .context("Failed to write to stdout")?;
    }
    Ok(())
}

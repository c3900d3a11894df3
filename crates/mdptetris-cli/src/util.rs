use std::{
    fs::File,
    io::{self, BufReader, BufWriter, Write},
    path::Path,
};

use anyhow::Context;
use mdptetris_engine::{PieceCatalog, PieceSeed};
use mdptetris_evaluator::placement_evaluator::FeatureWeights;
use rand::Rng as _;

/// Writes `value` as pretty JSON to `path`, or to stdout when no path is given.
pub fn write_json_report<T>(value: &T, path: Option<&Path>) -> anyhow::Result<()>
where
    T: serde::Serialize,
{
    let (mut writer, target): (Box<dyn Write>, String) = match path {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create report file: {}", path.display()))?;
            (Box::new(BufWriter::new(file)), path.display().to_string())
        }
        None => (Box::new(io::stdout().lock()), "stdout".to_owned()),
    };
    serde_json::to_writer_pretty(&mut writer, value)
        .with_context(|| format!("Failed to write report to {target}"))?;
    writeln!(writer)
        .and_then(|()| writer.flush())
        .with_context(|| format!("Failed to finish report on {target}"))?;
    Ok(())
}

fn read_json_file<T>(kind: &str, path: &Path) -> anyhow::Result<T>
where
    T: serde::de::DeserializeOwned,
{
    let file = File::open(path)
        .with_context(|| format!("Failed to open {kind} file: {}", path.display()))?;
    serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("Failed to parse {kind} file: {}", path.display()))
}

/// Reads feature weights, falling back to the Dellacherie weights.
pub fn read_weights_file(path: Option<&Path>) -> anyhow::Result<FeatureWeights> {
    match path {
        Some(path) => read_json_file("weights", path),
        None => Ok(FeatureWeights::dellacherie()),
    }
}

/// Loads a piece file, or `default` when no file is given.
pub fn load_catalog(
    path: Option<&Path>,
    default: impl FnOnce() -> PieceCatalog,
) -> anyhow::Result<PieceCatalog> {
    match path {
        Some(path) => PieceCatalog::load(path)
            .with_context(|| format!("Failed to load piece file: {}", path.display())),
        None => Ok(default()),
    }
}

/// Seed from the command line, or a fresh random one.
pub fn piece_seed(seed: Option<u64>) -> PieceSeed {
    seed.map_or_else(|| rand::rng().random(), PieceSeed::from)
}

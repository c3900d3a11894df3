use std::fmt::{self, Write as _};

use rand::{
    Rng, SeedableRng as _,
    distr::{Distribution, StandardUniform},
};
use rand_pcg::Pcg32;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Seed for deterministic piece selection.
///
/// A 128-bit seed serialized as 32 hex digits. The same seed always yields
/// the same piece sequence for a given catalog size.
///
/// # Example
///
/// ```
/// use mdptetris_engine::{PieceGenerator, PieceSeed};
///
/// let seed = PieceSeed::from(42);
/// let mut a = PieceGenerator::with_seed(7, seed);
/// let mut b = PieceGenerator::with_seed(7, seed);
/// assert_eq!(a.next_piece(), b.next_piece());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PieceSeed([u8; 16]);

impl From<u64> for PieceSeed {
    fn from(value: u64) -> Self {
        let mut seed = [0; 16];
        Pcg32::seed_from_u64(value).fill(&mut seed);
        Self(seed)
    }
}

impl fmt::Display for PieceSeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:032x}", u128::from_be_bytes(self.0))
    }
}

impl Serialize for PieceSeed {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut hex_str = String::with_capacity(2 * self.0.len());
        write!(&mut hex_str, "{self}").map_err(serde::ser::Error::custom)?;
        serializer.serialize_str(&hex_str)
    }
}

impl<'de> Deserialize<'de> for PieceSeed {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let hex_str = String::deserialize(deserializer)?;
        if hex_str.len() != 32 {
            return Err(serde::de::Error::custom(format!(
                "invalid hex: expected 32 characters, got {}",
                hex_str.len()
            )));
        }
        let num = u128::from_str_radix(&hex_str, 16)
            .map_err(|e| serde::de::Error::custom(format!("invalid hex: {hex_str} ({e})")))?;
        Ok(Self(num.to_be_bytes()))
    }
}

impl Distribution<PieceSeed> for StandardUniform {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> PieceSeed {
        let mut seed = [0; 16];
        rng.fill(&mut seed);
        PieceSeed(seed)
    }
}

/// Uniform random choice of the next piece index.
///
/// The generator owns its RNG, so two episodes never share random state.
#[derive(Debug, Clone)]
pub struct PieceGenerator {
    rng: Pcg32,
    num_pieces: usize,
}

impl PieceGenerator {
    /// Creates a generator seeded from the thread-local RNG.
    ///
    /// # Panics
    ///
    /// Panics if `num_pieces` is zero.
    #[must_use]
    pub fn new(num_pieces: usize) -> Self {
        Self::with_seed(num_pieces, rand::rng().random())
    }

    /// Like [`Self::new`], but with a specific seed for a reproducible sequence.
    #[must_use]
    pub fn with_seed(num_pieces: usize, seed: PieceSeed) -> Self {
        assert!(num_pieces > 0, "piece generator needs at least one piece");
        Self {
            rng: Pcg32::from_seed(seed.0),
            num_pieces,
        }
    }

    #[must_use]
    pub fn num_pieces(&self) -> usize {
        self.num_pieces
    }

    /// Index of the next piece, uniform in `0..num_pieces`.
    pub fn next_piece(&mut self) -> usize {
        self.rng.random_range(0..self.num_pieces)
    }
}

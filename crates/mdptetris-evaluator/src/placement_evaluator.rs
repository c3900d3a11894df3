//! Placement evaluation: scoring the board left by a single drop.
//!
//! A placement is scored on the board *after* the piece has been dropped, so
//! features such as landing height and eroded cells can read the drop
//! metadata. The linear model
//!
//! ```text
//! score = w₁·f₁ + w₂·f₂ + ... + wₙ·fₙ
//! ```
//!
//! is implemented by [`FeatureBasedPlacementEvaluator`]; its weights usually
//! come from a [`FeatureWeights`] table, which defaults to the Dellacherie
//! controller weights.

use std::{collections::BTreeMap, fmt, iter};

use mdptetris_engine::BitBoard;
use serde::{Deserialize, Serialize};

use crate::board_feature::BoardFeature;

/// Evaluates piece placements by assigning scores (higher is better).
pub trait PlacementEvaluator: fmt::Debug + Send + Sync {
    /// Scores `board`, which holds the placement being considered as its last drop.
    fn evaluate_placement(&self, board: &BitBoard) -> f64;
}

/// Weight per feature, serialized as a JSON object keyed by feature id.
///
/// ```json
/// { "landing_height": -1.0, "holes": -4.0 }
/// ```
///
/// Features missing from the table have weight zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeatureWeights {
    weights: BTreeMap<BoardFeature, f64>,
}

impl Default for FeatureWeights {
    fn default() -> Self {
        Self::dellacherie()
    }
}

impl FromIterator<(BoardFeature, f64)> for FeatureWeights {
    fn from_iter<T: IntoIterator<Item = (BoardFeature, f64)>>(iter: T) -> Self {
        Self {
            weights: iter.into_iter().collect(),
        }
    }
}

impl FeatureWeights {
    /// Hand-tuned weights of the Dellacherie controller.
    pub const DELLACHERIE_WEIGHTS: [f64; 6] = [-1.0, 1.0, -1.0, -1.0, -4.0, -1.0];

    #[must_use]
    pub fn dellacherie() -> Self {
        Self::from_dellacherie_array(Self::DELLACHERIE_WEIGHTS)
    }

    /// Weights for [`BoardFeature::DELLACHERIE`], in order.
    #[must_use]
    pub fn from_dellacherie_array(weights: [f64; 6]) -> Self {
        iter::zip(BoardFeature::DELLACHERIE, weights).collect()
    }

    #[must_use]
    pub fn weight(&self, feature: BoardFeature) -> f64 {
        self.weights.get(&feature).copied().unwrap_or(0.0)
    }

    pub fn set_weight(&mut self, feature: BoardFeature, weight: f64) {
        self.weights.insert(feature, weight);
    }

    pub fn iter(&self) -> impl Iterator<Item = (BoardFeature, f64)> + '_ {
        self.weights.iter().map(|(&feature, &weight)| (feature, weight))
    }
}

/// Linear placement evaluator: weighted sum of raw feature values.
///
/// # Example
///
/// ```
/// use mdptetris_engine::{BitBoard, BoardConfig, Piece};
/// use mdptetris_evaluator::placement_evaluator::{
///     FeatureBasedPlacementEvaluator, PlacementEvaluator,
/// };
///
/// let evaluator = FeatureBasedPlacementEvaluator::dellacherie();
/// let square = Piece::new(1, 2, 2, "XX\nXX").unwrap();
/// let mut board = BitBoard::new(BoardConfig::default(), 2).unwrap();
/// board.drop_piece(&square.orientations()[0], 0, false).unwrap();
///
/// // landing 0.5, row transitions 40, column transitions 10
/// assert_eq!(evaluator.evaluate_placement(&board), -50.5);
/// ```
#[derive(Debug, Clone)]
pub struct FeatureBasedPlacementEvaluator {
    features: Vec<BoardFeature>,
    weights: Vec<f64>,
}

impl FeatureBasedPlacementEvaluator {
    /// # Panics
    ///
    /// Panics if `features.len() != weights.len()`
    #[must_use]
    pub fn new(features: Vec<BoardFeature>, weights: Vec<f64>) -> Self {
        assert_eq!(features.len(), weights.len());
        Self { features, weights }
    }

    /// Evaluator over the non-zero entries of `weights`.
    #[must_use]
    pub fn from_weights(weights: &FeatureWeights) -> Self {
        let (features, weights): (Vec<_>, Vec<_>) = weights.iter().filter(|(_, w)| *w != 0.0).unzip();
        Self { features, weights }
    }

    #[must_use]
    pub fn dellacherie() -> Self {
        Self::new(
            BoardFeature::DELLACHERIE.to_vec(),
            FeatureWeights::DELLACHERIE_WEIGHTS.to_vec(),
        )
    }

    #[must_use]
    pub fn features(&self) -> &[BoardFeature] {
        &self.features
    }

    #[must_use]
    pub fn weights(&self) -> &[f64] {
        &self.weights
    }
}

impl PlacementEvaluator for FeatureBasedPlacementEvaluator {
    #[inline]
    fn evaluate_placement(&self, board: &BitBoard) -> f64 {
        iter::zip(&self.features, &self.weights)
            .map(|(f, w)| f.extract(board) * w)
            .sum()
    }
}

//! Composite scoring
//!
//! Blends the four dimensions into one composite, then nudges it up or down
//! around a neutral confidence level.

use crate::config::CompositeConfig;
use crate::curves::to_score;
use crate::types::DimensionScores;

/// Composite combiner
pub struct CompositeCombiner;

impl CompositeCombiner {
    /// Weighted average of the dimensions ranked highest to lowest.
    ///
    /// Formula (defaults):
    /// ```text
    /// Composite = 0.50 * first + 0.25 * second + 0.15 * third + 0.10 * fourth
    /// ```
    /// Weights attach to rank rather than to a named dimension, so a specialist
    /// and a generalist of equal strength land in the same range.
    pub fn composite(dimensions: &DimensionScores, config: &CompositeConfig) -> u8 {
        let blended: f64 = dimensions
            .ranked()
            .iter()
            .zip(config.rank_weights.iter())
            .map(|((_, score), weight)| *score as f64 * weight)
            .sum();
        to_score(blended)
    }

    /// Confidence-centered adjustment.
    ///
    /// Formula: `clamp(round(composite + (confidence - neutral) * factor), 0, 100)`
    pub fn adjust(composite: u8, confidence: u8, config: &CompositeConfig) -> u8 {
        let delta = (confidence as f64 - config.neutral_confidence) * config.confidence_factor;
        to_score(composite as f64 + delta)
    }
}

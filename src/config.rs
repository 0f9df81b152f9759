//! Calibration constants
//!
//! Every tunable number in the scoring pipeline lives here. Defaults are the
//! calibrated values; a JSON document can override any subset of them.

use crate::error::ComputeError;
use serde::{Deserialize, Serialize};

const WEIGHT_TOLERANCE: f64 = 1e-6;

/// Building: merged-PR effort, issues closed, commit volume
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildingConfig {
    pub pr_effort_weight: f64,
    pub issues_weight: f64,
    pub commits_weight: f64,
    pub pr_effort_scale: f64,
    pub issues_scale: f64,
    pub commits_scale: f64,
}

impl Default for BuildingConfig {
    fn default() -> Self {
        Self {
            pr_effort_weight: 0.50,
            issues_weight: 0.25,
            commits_weight: 0.25,
            pr_effort_scale: 40.0,
            issues_scale: 20.0,
            commits_scale: 400.0,
        }
    }
}

/// Guarding: review volume and review-to-own-PR ratio
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GuardingConfig {
    pub volume_weight: f64,
    pub ratio_weight: f64,
    pub reviews_scale: f64,
    pub ratio_scale: f64,
}

impl Default for GuardingConfig {
    fn default() -> Self {
        Self {
            volume_weight: 0.60,
            ratio_weight: 0.40,
            reviews_scale: 60.0,
            ratio_scale: 1.0,
        }
    }
}

/// Consistency: active-day ratio, weekly evenness, inverse burst
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsistencyConfig {
    pub active_ratio_weight: f64,
    pub evenness_weight: f64,
    pub burst_weight: f64,
    /// Commits in ten minutes at or above which activity looks batched
    pub burst_threshold: u64,
}

impl Default for ConsistencyConfig {
    fn default() -> Self {
        Self {
            active_ratio_weight: 0.50,
            evenness_weight: 0.35,
            burst_weight: 0.15,
            burst_threshold: 30,
        }
    }
}

/// Breadth: repositories touched, distribution, community reach
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BreadthConfig {
    pub repos_weight: f64,
    pub distribution_weight: f64,
    pub community_weight: f64,
    pub repos_scale: f64,
    pub community_scale: f64,
    pub docs_scale: f64,
    /// Portion of the community signal granted to documentation work
    pub docs_share: f64,
}

impl Default for BreadthConfig {
    fn default() -> Self {
        Self {
            repos_weight: 0.40,
            distribution_weight: 0.25,
            community_weight: 0.35,
            repos_scale: 8.0,
            community_scale: 150.0,
            docs_scale: 5.0,
            docs_share: 0.15,
        }
    }
}

/// Lowest confidence any configuration may report
pub const MIN_CONFIDENCE: u8 = 50;

/// Confidence baseline, bounds and penalty schedule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfidenceConfig {
    pub baseline: u8,
    pub floor: u8,
    pub ceiling: u8,
    pub limited_history_days: u32,
    pub limited_history_penalty: u8,
    pub moderate_history_days: u32,
    pub moderate_history_penalty: u8,
    /// Minimum commits + PRs + reviews + issues for a reliable score
    pub min_total_signals: u64,
    pub insufficient_data_penalty: u8,
    pub narrow_mix_penalty: u8,
    pub short_window_days: u32,
    pub short_window_penalty: u8,
    pub burst_threshold: u64,
    pub burst_penalty: u8,
}

impl Default for ConfidenceConfig {
    fn default() -> Self {
        Self {
            baseline: 100,
            floor: 50,
            ceiling: 100,
            limited_history_days: 14,
            limited_history_penalty: 25,
            moderate_history_days: 60,
            moderate_history_penalty: 10,
            min_total_signals: 10,
            insufficient_data_penalty: 20,
            narrow_mix_penalty: 10,
            short_window_days: 90,
            short_window_penalty: 10,
            burst_threshold: 30,
            burst_penalty: 5,
        }
    }
}

/// Composite blend and confidence adjustment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompositeConfig {
    /// Weights applied to the dimensions ranked highest to lowest
    pub rank_weights: [f64; 4],
    /// Confidence at which the adjustment is zero
    pub neutral_confidence: f64,
    /// Points of adjustment per point of confidence away from neutral
    pub confidence_factor: f64,
}

impl Default for CompositeConfig {
    fn default() -> Self {
        Self {
            rank_weights: [0.50, 0.25, 0.15, 0.10],
            neutral_confidence: 85.0,
            confidence_factor: 0.2,
        }
    }
}

/// Archetype decision-tree thresholds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Activity index below which a profile is Emerging regardless of shape
    pub min_activity_index: u64,
    pub balanced_max_spread: u8,
    pub balanced_min_mean: f64,
    pub dominant_threshold: u8,
    /// Reviews required before a profile counts as collaborative
    pub collaborative_min_reviews: u64,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            min_activity_index: 40,
            balanced_max_spread: 15,
            balanced_min_mean: 60.0,
            dominant_threshold: 70,
            collaborative_min_reviews: 1,
        }
    }
}

/// Temporal smoothing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SmoothingConfig {
    pub alpha: f64,
    /// Days of smoothed history kept per handle by the in-memory store
    pub history_days: usize,
}

impl Default for SmoothingConfig {
    fn default() -> Self {
        Self {
            alpha: crate::smoothing::EMA_ALPHA,
            history_days: crate::snapshot::DEFAULT_HISTORY_DAYS,
        }
    }
}

/// Full pipeline configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub building: BuildingConfig,
    pub guarding: GuardingConfig,
    pub consistency: ConsistencyConfig,
    pub breadth: BreadthConfig,
    pub confidence: ConfidenceConfig,
    pub composite: CompositeConfig,
    pub classifier: ClassifierConfig,
    pub smoothing: SmoothingConfig,
}

impl ScoringConfig {
    /// Load configuration from JSON; omitted fields keep their defaults
    pub fn from_json(json: &str) -> Result<Self, ComputeError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize configuration to pretty JSON
    pub fn to_json(&self) -> Result<String, ComputeError> {
        serde_json::to_string_pretty(self).map_err(ComputeError::JsonError)
    }

    /// Check that weights sum to one and thresholds are in range
    pub fn validate(&self) -> Result<(), ComputeError> {
        check_weights(
            "building",
            &[
                self.building.pr_effort_weight,
                self.building.issues_weight,
                self.building.commits_weight,
            ],
        )?;
        check_weights(
            "guarding",
            &[self.guarding.volume_weight, self.guarding.ratio_weight],
        )?;
        check_weights(
            "consistency",
            &[
                self.consistency.active_ratio_weight,
                self.consistency.evenness_weight,
                self.consistency.burst_weight,
            ],
        )?;
        check_weights(
            "breadth",
            &[
                self.breadth.repos_weight,
                self.breadth.distribution_weight,
                self.breadth.community_weight,
            ],
        )?;
        check_weights("composite.rank_weights", &self.composite.rank_weights)?;

        check_scales(&[
            ("building.pr_effort_scale", self.building.pr_effort_scale),
            ("building.issues_scale", self.building.issues_scale),
            ("building.commits_scale", self.building.commits_scale),
            ("guarding.reviews_scale", self.guarding.reviews_scale),
            ("guarding.ratio_scale", self.guarding.ratio_scale),
            ("breadth.repos_scale", self.breadth.repos_scale),
            ("breadth.community_scale", self.breadth.community_scale),
            ("breadth.docs_scale", self.breadth.docs_scale),
        ])?;

        if !(0.0..=1.0).contains(&self.breadth.docs_share) {
            return Err(ComputeError::InvalidConfig(format!(
                "breadth.docs_share must be within [0, 1], got {}",
                self.breadth.docs_share
            )));
        }

        let confidence = &self.confidence;
        if confidence.floor < MIN_CONFIDENCE
            || confidence.floor > confidence.ceiling
            || confidence.ceiling > 100
        {
            return Err(ComputeError::InvalidConfig(format!(
                "confidence bounds must satisfy {} <= floor <= ceiling <= 100, got {}..{}",
                MIN_CONFIDENCE, confidence.floor, confidence.ceiling
            )));
        }
        if !(confidence.floor..=confidence.ceiling).contains(&confidence.baseline) {
            return Err(ComputeError::InvalidConfig(format!(
                "confidence.baseline must be within {}..={}, got {}",
                confidence.floor, confidence.ceiling, confidence.baseline
            )));
        }

        let classifier = &self.classifier;
        if classifier.dominant_threshold > 100
            || classifier.balanced_max_spread > 100
            || !(0.0..=100.0).contains(&classifier.balanced_min_mean)
        {
            return Err(ComputeError::InvalidConfig(
                "classifier thresholds must be within 0-100".to_string(),
            ));
        }

        let alpha = self.smoothing.alpha;
        if !(alpha > 0.0 && alpha <= 1.0) {
            return Err(ComputeError::InvalidConfig(format!(
                "smoothing.alpha must be within (0, 1], got {alpha}"
            )));
        }
        if self.smoothing.history_days == 0 {
            return Err(ComputeError::InvalidConfig(
                "smoothing.history_days must be at least 1".to_string(),
            ));
        }

        Ok(())
    }
}

fn check_weights(group: &str, weights: &[f64]) -> Result<(), ComputeError> {
    if weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
        return Err(ComputeError::InvalidConfig(format!(
            "{group} weights must be finite and non-negative"
        )));
    }
    let sum: f64 = weights.iter().sum();
    if (sum - 1.0).abs() > WEIGHT_TOLERANCE {
        return Err(ComputeError::InvalidConfig(format!(
            "{group} weights must sum to 1.0, got {sum}"
        )));
    }
    Ok(())
}

fn check_scales(scales: &[(&str, f64)]) -> Result<(), ComputeError> {
    for (name, scale) in scales {
        if !(scale.is_finite() && *scale > 0.0) {
            return Err(ComputeError::InvalidConfig(format!(
                "{name} must be a positive number, got {scale}"
            )));
        }
    }
    Ok(())
}

//! Pipeline orchestration
//!
//! This module provides the public API for devimpact.
//! It runs raw activity stats through every stage to an impact result.

use crate::classifier::{ArchetypeClassifier, ClassifierInput};
use crate::composite::CompositeCombiner;
use crate::config::ScoringConfig;
use crate::confidence::ConfidenceEstimator;
use crate::curves::to_score;
use crate::error::ComputeError;
use crate::normalizer::StatsNormalizer;
use crate::scorers::DimensionScorer;
use crate::smoothing::ema_step;
use crate::snapshot::{InMemorySnapshotStore, SnapshotStore};
use crate::types::{
    ConfidenceAssessment, DimensionScores, ImpactResult, ProfileType, RawActivityStats, Tier,
};
use chrono::{DateTime, NaiveDate, Utc};
use tracing::{debug, info};

/// Compute an impact profile with the default configuration.
///
/// # Example
/// ```ignore
/// let result = compute_impact(&stats);
/// println!("{} ({})", result.archetype, result.tier);
/// ```
pub fn compute_impact(raw: &RawActivityStats) -> ImpactResult {
    compute_impact_at(raw, &ScoringConfig::default(), Utc::now())
}

/// Compute an impact profile with an explicit configuration and timestamp.
///
/// Pipeline stages:
/// 1. StatsNormalizer - Clamp counters, derive heatmap aggregates
/// 2. DimensionScorer - Building, Guarding, Consistency, Breadth
/// 3. ConfidenceEstimator - Confidence and penalty reasons
/// 4. CompositeCombiner - Composite and confidence-adjusted composite
/// 5. ArchetypeClassifier - Decision-tree archetype
/// 6. Tier - Band the adjusted composite
pub fn compute_impact_at(
    raw: &RawActivityStats,
    config: &ScoringConfig,
    computed_at: DateTime<Utc>,
) -> ImpactResult {
    // Stage 1: Normalize
    let stats = StatsNormalizer::normalize(raw);

    // Stage 2: Score dimensions
    let dimensions = DimensionScorer::score_all(&stats, config);
    debug!(
        handle = %stats.handle,
        building = dimensions.building,
        guarding = dimensions.guarding,
        consistency = dimensions.consistency,
        breadth = dimensions.breadth,
        "scored dimensions"
    );

    // Stage 3: Estimate confidence
    let assessment = ConfidenceEstimator::assess(&stats, &config.confidence);

    // Stages 4-6: Combine, classify, band
    let profile_type = ArchetypeClassifier::profile_type(&stats, &config.classifier);
    assemble_result(
        &stats.handle,
        dimensions,
        profile_type,
        stats.activity_index(),
        assessment,
        config,
        computed_at,
    )
}

/// Build a result from already-scored dimensions.
///
/// Runs the composite, classification and tier stages only.
pub fn assemble_result(
    handle: &str,
    dimensions: DimensionScores,
    profile_type: ProfileType,
    activity_index: u64,
    assessment: ConfidenceAssessment,
    config: &ScoringConfig,
    computed_at: DateTime<Utc>,
) -> ImpactResult {
    let composite_score = CompositeCombiner::composite(&dimensions, &config.composite);
    let adjusted_composite =
        CompositeCombiner::adjust(composite_score, assessment.confidence, &config.composite);

    let classification = ArchetypeClassifier::classify(
        &ClassifierInput {
            dimensions,
            profile_type,
            activity_index,
        },
        &config.classifier,
    );
    let tier = Tier::from_score(adjusted_composite);

    debug!(
        handle,
        composite_score,
        confidence = assessment.confidence,
        adjusted_composite,
        archetype = %classification.archetype,
        tier = %tier,
        "assembled impact result"
    );

    ImpactResult {
        handle: handle.to_string(),
        profile_type,
        dimensions,
        archetype: classification.archetype,
        classification_rule: classification.rule,
        composite_score,
        confidence: assessment.confidence,
        confidence_penalties: assessment.reasons(),
        adjusted_composite,
        tier,
        smoothed_score: None,
        computed_at,
    }
}

/// Convert raw stats JSON to impact result JSON (stateless, one-shot).
pub fn impact_to_json(raw_json: &str) -> Result<String, ComputeError> {
    let raw = parse_stats(raw_json)?;
    let result = compute_impact(&raw);
    serde_json::to_string(&result).map_err(ComputeError::JsonError)
}

/// Parse a single raw stats record
pub fn parse_stats(json: &str) -> Result<RawActivityStats, ComputeError> {
    serde_json::from_str(json).map_err(|e| ComputeError::ParseError(e.to_string()))
}

/// Parse a JSON array of raw stats records
pub fn parse_stats_array(json: &str) -> Result<Vec<RawActivityStats>, ComputeError> {
    serde_json::from_str(json).map_err(|e| ComputeError::ParseError(e.to_string()))
}

/// Parse newline-delimited raw stats records, skipping blank lines
pub fn parse_stats_ndjson(input: &str) -> Result<Vec<RawActivityStats>, ComputeError> {
    input
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(index, line)| {
            serde_json::from_str(line)
                .map_err(|e| ComputeError::ParseError(format!("line {}: {}", index + 1, e)))
        })
        .collect()
}

/// Stateful processor that smooths results against stored snapshots.
///
/// Smoothing happens at most once per handle per day: recomputing on a day
/// that already has a snapshot blends against the most recent earlier day
/// and overwrites that day's value.
pub struct ImpactProcessor<S: SnapshotStore = InMemorySnapshotStore> {
    config: ScoringConfig,
    store: S,
}

impl Default for ImpactProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl ImpactProcessor {
    /// Create a processor with default settings and an empty in-memory store
    pub fn new() -> Self {
        let config = ScoringConfig::default();
        let store = InMemorySnapshotStore::new(config.smoothing.history_days);
        Self { config, store }
    }

    /// Create a processor with a specific configuration
    pub fn with_config(config: ScoringConfig) -> Result<Self, ComputeError> {
        config.validate()?;
        let store = InMemorySnapshotStore::new(config.smoothing.history_days);
        Ok(Self { config, store })
    }

    /// Load snapshot state from JSON
    pub fn load_snapshots(&mut self, json: &str) -> Result<(), ComputeError> {
        self.store = InMemorySnapshotStore::from_json(json)
            .map_err(|e| ComputeError::ParseError(e.to_string()))?;
        Ok(())
    }

    /// Save snapshot state to JSON
    pub fn save_snapshots(&self) -> Result<String, ComputeError> {
        self.store
            .to_json()
            .map_err(|e| ComputeError::EncodingError(e.to_string()))
    }
}

impl<S: SnapshotStore> ImpactProcessor<S> {
    /// Create a processor backed by a caller-provided snapshot store
    pub fn with_store(config: ScoringConfig, store: S) -> Result<Self, ComputeError> {
        config.validate()?;
        Ok(Self { config, store })
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    /// Compute, smooth against the stored previous value, and record the result for `date`
    pub fn process(
        &mut self,
        raw: &RawActivityStats,
        date: NaiveDate,
    ) -> Result<ImpactResult, ComputeError> {
        self.process_at(raw, date, Utc::now())
    }

    /// As [`process`](Self::process) with an explicit computation timestamp
    pub fn process_at(
        &mut self,
        raw: &RawActivityStats,
        date: NaiveDate,
        computed_at: DateTime<Utc>,
    ) -> Result<ImpactResult, ComputeError> {
        let mut result = compute_impact_at(raw, &self.config, computed_at);

        // Stage 7: Smooth against the last snapshot before today
        let previous = self.store.smoothed_score_before(&result.handle, date);
        if previous.is_some()
            && self.store.previous_smoothed_score(&result.handle) != previous
        {
            debug!(handle = %result.handle, %date, "recomputing today's snapshot");
        }

        let smoothed = ema_step(
            result.adjusted_composite as f64,
            previous,
            self.config.smoothing.alpha,
        );
        self.store.record_snapshot(&result.handle, smoothed, date)?;
        result.smoothed_score = Some(to_score(smoothed));

        info!(
            handle = %result.handle,
            %date,
            adjusted = result.adjusted_composite,
            smoothed = to_score(smoothed),
            "recorded smoothed snapshot"
        );

        Ok(result)
    }

    /// Process a raw stats JSON record and return result JSON
    pub fn process_json(&mut self, raw_json: &str, date: NaiveDate) -> Result<String, ComputeError> {
        let raw = parse_stats(raw_json)?;
        let result = self.process(&raw, date)?;
        serde_json::to_string(&result).map_err(ComputeError::JsonError)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Archetype, ClassificationRule, Dimension};
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    fn shipper() -> RawActivityStats {
        RawActivityStats {
            handle: "shipper".to_string(),
            commits_total: 1200,
            active_days: 200,
            prs_merged_count: 80,
            prs_merged_weight: 150.0,
            reviews_submitted_count: 5,
            issues_closed_count: 60,
            repos_contributed: 3,
            top_repo_share: 0.8,
            max_commits_in_10_min: 5,
            total_stars: 10,
            total_forks: 2,
            total_watchers: 3,
            ..Default::default()
        }
    }

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap()
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, d).unwrap()
    }

    #[test]
    fn test_shipper_profile() {
        let result = compute_impact_at(&shipper(), &ScoringConfig::default(), at());

        assert_eq!(result.dimensions, DimensionScores::new(96, 7, 42, 20));
        assert_eq!(result.profile_type, ProfileType::Collaborative);
        assert_eq!(result.archetype, Archetype::Builder);
        assert_eq!(
            result.classification_rule,
            ClassificationRule::Dominant(Dimension::Building)
        );
        assert_eq!(result.confidence, 100);
        assert_eq!(result.composite_score, 62);
        assert_eq!(result.adjusted_composite, 65);
        assert_eq!(result.tier, Tier::Solid);
        assert_eq!(result.smoothed_score, None);
    }

    #[test]
    fn test_empty_profile() {
        let raw = RawActivityStats {
            handle: "ghost".to_string(),
            ..Default::default()
        };
        let result = compute_impact_at(&raw, &ScoringConfig::default(), at());

        assert_eq!(result.archetype, Archetype::Emerging);
        assert_eq!(result.classification_rule, ClassificationRule::LowActivity);
        assert_eq!(result.tier, Tier::Emerging);
        assert_eq!(result.confidence, 50);
        assert_eq!(result.adjusted_composite, 0);
        assert!(!result.confidence_penalties.is_empty());
    }

    #[test]
    fn test_impact_to_json() {
        let json = serde_json::to_string(&shipper()).unwrap();
        let output = impact_to_json(&json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();

        assert_eq!(value["handle"], "shipper");
        assert_eq!(value["archetype"], "Builder");
        assert_eq!(value["profileType"], "collaborative");
        assert_eq!(value["dimensions"]["building"], 96);
    }

    #[test]
    fn test_invalid_json() {
        assert!(matches!(
            impact_to_json("not valid json"),
            Err(ComputeError::ParseError(_))
        ));
    }

    #[test]
    fn test_parse_ndjson_skips_blank_lines() {
        let input = "{\"handle\":\"a\"}\n\n{\"handle\":\"b\"}\n";
        let records = parse_stats_ndjson(input).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].handle, "b");

        let err = parse_stats_ndjson("{\"handle\":\"a\"}\nnope").unwrap_err();
        assert!(err.to_string().contains("line 2"));
    }

    #[test]
    fn test_processor_first_day_passes_through() {
        let mut processor = ImpactProcessor::new();
        let result = processor.process_at(&shipper(), day(1), at()).unwrap();
        assert_eq!(result.smoothed_score, Some(result.adjusted_composite));
        assert_eq!(processor.store().previous_smoothed_score("shipper"), Some(65.0));
    }

    #[test]
    fn test_processor_smooths_across_days() {
        let mut processor = ImpactProcessor::new();
        processor
            .store
            .record_snapshot("shipper", 45.0, day(1))
            .unwrap();

        // 0.15 * 65 + 0.85 * 45 = 48
        let result = processor.process_at(&shipper(), day(2), at()).unwrap();
        assert_eq!(result.smoothed_score, Some(48));
    }

    #[test]
    fn test_processor_same_day_does_not_double_smooth() {
        let mut processor = ImpactProcessor::new();
        processor
            .store
            .record_snapshot("shipper", 45.0, day(1))
            .unwrap();

        let first = processor.process_at(&shipper(), day(2), at()).unwrap();
        let retry = processor.process_at(&shipper(), day(2), at()).unwrap();
        assert_eq!(first.smoothed_score, retry.smoothed_score);
        assert_eq!(processor.store().history("shipper").len(), 2);
    }

    #[test]
    fn test_snapshot_persistence() {
        let mut processor = ImpactProcessor::new();
        processor.process_at(&shipper(), day(1), at()).unwrap();
        let saved = processor.save_snapshots().unwrap();

        let mut restored = ImpactProcessor::new();
        restored.load_snapshots(&saved).unwrap();
        assert_eq!(
            restored.store().previous_smoothed_score("shipper"),
            Some(65.0)
        );
    }

    #[test]
    fn test_with_config_validates() {
        let mut config = ScoringConfig::default();
        config.composite.rank_weights = [1.0, 1.0, 0.0, 0.0];
        assert!(ImpactProcessor::with_config(config).is_err());
    }
}

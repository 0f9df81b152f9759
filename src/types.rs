//! Core types for the devimpact pipeline
//!
//! This module defines the data structures that flow through each stage of the
//! pipeline: raw activity stats, normalized stats, dimension scores, confidence,
//! and the final impact result.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of weekly buckets derived from the activity heatmap
pub const WEEKS_PER_YEAR: usize = 52;

/// Default observation window in days when no heatmap is supplied
pub const DEFAULT_WINDOW_DAYS: u32 = 365;

/// A single day of the contribution heatmap
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeatmapDay {
    /// Calendar date (YYYY-MM-DD)
    pub date: NaiveDate,
    /// Contributions recorded on that day
    #[serde(default, deserialize_with = "lenient::count")]
    pub count: i64,
}

/// Twelve months of aggregated activity, as delivered by the stats collector.
///
/// Counters are signed and decoded leniently so that malformed collector
/// output can be clamped by the normalizer instead of rejected at parse time.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawActivityStats {
    pub handle: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    #[serde(deserialize_with = "lenient::count")]
    pub commits_total: i64,
    /// Days with at least one contribution; zero means "derive from heatmap"
    #[serde(deserialize_with = "lenient::count")]
    pub active_days: i64,
    #[serde(deserialize_with = "lenient::count")]
    pub prs_merged_count: i64,
    /// Pre-capped effort metric for merged PRs
    #[serde(deserialize_with = "lenient::float")]
    pub prs_merged_weight: f64,
    #[serde(deserialize_with = "lenient::count")]
    pub reviews_submitted_count: i64,
    #[serde(deserialize_with = "lenient::count")]
    pub issues_closed_count: i64,
    #[serde(deserialize_with = "lenient::count")]
    pub lines_added: i64,
    #[serde(deserialize_with = "lenient::count")]
    pub lines_deleted: i64,
    #[serde(deserialize_with = "lenient::count")]
    pub repos_contributed: i64,
    /// Share of activity in the most active repository (0-1)
    #[serde(deserialize_with = "lenient::float")]
    pub top_repo_share: f64,
    /// Largest number of commits pushed within ten minutes
    #[serde(deserialize_with = "lenient::count")]
    pub max_commits_in_10_min: i64,
    #[serde(deserialize_with = "lenient::count")]
    pub total_stars: i64,
    #[serde(deserialize_with = "lenient::count")]
    pub total_forks: i64,
    #[serde(deserialize_with = "lenient::count")]
    pub total_watchers: i64,
    /// Documentation-only contributions (README, docs sites, wikis)
    #[serde(deserialize_with = "lenient::count")]
    pub docs_contributions: i64,
    /// Ordered daily counts, oldest first
    pub heatmap_data: Vec<HeatmapDay>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fetched_at: Option<DateTime<Utc>>,
}

/// Stats after clamping, with helper aggregates derived
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedStats {
    pub handle: String,
    pub commits_total: u64,
    pub active_days: u32,
    pub prs_merged_count: u64,
    pub prs_merged_weight: f64,
    pub reviews_submitted_count: u64,
    pub issues_closed_count: u64,
    pub lines_added: u64,
    pub lines_deleted: u64,
    pub repos_contributed: u64,
    /// Clamped to [0, 1]
    pub top_repo_share: f64,
    pub max_commits_in_10_min: u64,
    pub total_stars: u64,
    pub total_forks: u64,
    pub total_watchers: u64,
    pub docs_contributions: u64,
    /// Length of the observation window in days
    pub window_days: u32,
    /// Days between the first active heatmap day and the end of the window
    pub observed_span_days: u32,
    /// Weekly contribution sums, oldest first; always `WEEKS_PER_YEAR` long
    pub weekly_sums: Vec<u64>,
    /// Number of raw fields that had to be clamped or coerced
    pub coerced_fields: u32,
}

impl NormalizedStats {
    /// Overall activity index used to short-circuit low-activity profiles.
    ///
    /// Merged PRs and reviews count for more than raw commits because each one
    /// represents a unit of reviewed work.
    pub fn activity_index(&self) -> u64 {
        self.commits_total
            .saturating_add(self.active_days as u64)
            .saturating_add(self.prs_merged_count.saturating_mul(3))
            .saturating_add(self.reviews_submitted_count.saturating_mul(2))
            .saturating_add(self.repos_contributed.saturating_mul(2))
    }

    /// Community reach: stars, forks and watchers combined
    pub fn community_total(&self) -> u64 {
        self.total_stars
            .saturating_add(self.total_forks)
            .saturating_add(self.total_watchers)
    }
}

/// One of the four independent facets of contribution.
///
/// Declaration order is the tie-break priority used by the classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dimension {
    Building,
    Guarding,
    Consistency,
    Breadth,
}

impl Dimension {
    /// All dimensions in tie-break priority order
    pub const ALL: [Dimension; 4] = [
        Dimension::Building,
        Dimension::Guarding,
        Dimension::Consistency,
        Dimension::Breadth,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Dimension::Building => "building",
            Dimension::Guarding => "guarding",
            Dimension::Consistency => "consistency",
            Dimension::Breadth => "breadth",
        }
    }
}

/// The four dimension scores, each an integer in [0, 100]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DimensionScores {
    pub building: u8,
    pub guarding: u8,
    pub consistency: u8,
    pub breadth: u8,
}

impl DimensionScores {
    pub fn new(building: u8, guarding: u8, consistency: u8, breadth: u8) -> Self {
        Self {
            building,
            guarding,
            consistency,
            breadth,
        }
    }

    pub fn get(&self, dimension: Dimension) -> u8 {
        match dimension {
            Dimension::Building => self.building,
            Dimension::Guarding => self.guarding,
            Dimension::Consistency => self.consistency,
            Dimension::Breadth => self.breadth,
        }
    }

    /// Scores paired with their dimension, in priority order
    pub fn entries(&self) -> [(Dimension, u8); 4] {
        Dimension::ALL.map(|d| (d, self.get(d)))
    }

    /// Dimensions ordered by score descending, ties broken by priority
    pub fn ranked(&self) -> [(Dimension, u8); 4] {
        let mut entries = self.entries();
        entries.sort_by(|(da, a), (db, b)| b.cmp(a).then(da.cmp(db)));
        entries
    }

    pub fn max(&self) -> u8 {
        self.entries().iter().map(|(_, s)| *s).max().unwrap_or(0)
    }

    pub fn min(&self) -> u8 {
        self.entries().iter().map(|(_, s)| *s).min().unwrap_or(0)
    }

    /// Difference between the highest and lowest score
    pub fn spread(&self) -> u8 {
        self.max() - self.min()
    }

    pub fn mean(&self) -> f64 {
        self.entries().iter().map(|(_, s)| *s as f64).sum::<f64>() / 4.0
    }
}

/// Whether the profile shows collaborative signals
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProfileType {
    Solo,
    Collaborative,
}

impl ProfileType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProfileType::Solo => "solo",
            ProfileType::Collaborative => "collaborative",
        }
    }
}

/// Reasons confidence was reduced.
///
/// Reasons are informational and never phrased as an accusation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfidencePenalty {
    LimitedHistory,
    ModerateHistory,
    InsufficientData,
    NarrowActivityMix,
    ShortObservationWindow,
    BurstyActivity,
}

impl ConfidencePenalty {
    /// Human-readable reason surfaced to the caller
    pub fn reason(&self) -> &'static str {
        match self {
            ConfidencePenalty::LimitedHistory => "limited contribution history",
            ConfidencePenalty::ModerateHistory => "contribution history still building up",
            ConfidencePenalty::InsufficientData => "insufficient data for reliable scoring",
            ConfidencePenalty::NarrowActivityMix => "activity concentrated in a single contribution type",
            ConfidencePenalty::ShortObservationWindow => "short observation window",
            ConfidencePenalty::BurstyActivity => "large batch commits detected",
        }
    }
}

impl fmt::Display for ConfidencePenalty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.reason())
    }
}

/// Confidence rating with the penalties that produced it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfidenceAssessment {
    /// Confidence in [50, 100]
    pub confidence: u8,
    /// Applied penalties, in evaluation order
    pub penalties: Vec<ConfidencePenalty>,
}

impl ConfidenceAssessment {
    pub fn reasons(&self) -> Vec<String> {
        self.penalties.iter().map(|p| p.reason().to_string()).collect()
    }
}

/// Qualitative label summarizing the shape of a dimension vector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Archetype {
    Builder,
    Guardian,
    Marathoner,
    Polymath,
    Balanced,
    Emerging,
}

impl Archetype {
    pub fn as_str(&self) -> &'static str {
        match self {
            Archetype::Builder => "Builder",
            Archetype::Guardian => "Guardian",
            Archetype::Marathoner => "Marathoner",
            Archetype::Polymath => "Polymath",
            Archetype::Balanced => "Balanced",
            Archetype::Emerging => "Emerging",
        }
    }

    /// Archetype earned by a dominant dimension
    pub fn for_dimension(dimension: Dimension) -> Self {
        match dimension {
            Dimension::Building => Archetype::Builder,
            Dimension::Guarding => Archetype::Guardian,
            Dimension::Consistency => Archetype::Marathoner,
            Dimension::Breadth => Archetype::Polymath,
        }
    }
}

impl fmt::Display for Archetype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Coarse banding of the adjusted composite score
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Tier {
    Emerging,
    Solid,
    High,
    Elite,
}

impl Tier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Emerging => "Emerging",
            Tier::Solid => "Solid",
            Tier::High => "High",
            Tier::Elite => "Elite",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which classifier rule produced the archetype
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "rule", content = "dimension", rename_all = "snake_case")]
pub enum ClassificationRule {
    LowActivity,
    Balanced,
    Dominant(Dimension),
    Fallback,
}

/// Complete developer impact profile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImpactResult {
    pub handle: String,
    pub profile_type: ProfileType,
    pub dimensions: DimensionScores,
    pub archetype: Archetype,
    pub classification_rule: ClassificationRule,
    pub composite_score: u8,
    pub confidence: u8,
    pub confidence_penalties: Vec<String>,
    pub adjusted_composite: u8,
    pub tier: Tier,
    /// Adjusted composite after temporal smoothing, when prior state was consulted
    pub smoothed_score: Option<u8>,
    pub computed_at: DateTime<Utc>,
}

impl ImpactResult {
    /// Score to display: smoothed when available, otherwise the adjusted composite
    pub fn display_score(&self) -> u8 {
        self.smoothed_score.unwrap_or(self.adjusted_composite)
    }
}

/// Lenient decoding for collector numbers.
///
/// Any JSON number is accepted: floats truncate toward zero and out-of-range
/// values saturate. Numeric strings are parsed. `null`, non-finite values and
/// anything else read as zero.
mod lenient {
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    fn finite(value: &Value) -> Option<f64> {
        let parsed: Option<f64> = match value {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        };
        parsed.filter(|f| f.is_finite())
    }

    pub fn count<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
        let value = Value::deserialize(deserializer)?;
        if let Some(exact) = value.as_i64() {
            return Ok(exact);
        }
        // `as` saturates at the i64 bounds
        Ok(finite(&value).map(|f| f.trunc() as i64).unwrap_or(0))
    }

    pub fn float<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Ok(finite(&value).unwrap_or(0.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_ranked_breaks_ties_by_priority() {
        let scores = DimensionScores::new(50, 80, 80, 10);
        let ranked = scores.ranked();
        assert_eq!(ranked[0], (Dimension::Guarding, 80));
        assert_eq!(ranked[1], (Dimension::Consistency, 80));
        assert_eq!(ranked[3], (Dimension::Breadth, 10));
    }

    #[test]
    fn test_spread_and_mean() {
        let scores = DimensionScores::new(72, 68, 74, 66);
        assert_eq!(scores.spread(), 8);
        assert!((scores.mean() - 70.0).abs() < 1e-9);
    }

    #[test]
    fn test_raw_stats_deserialize_camel_case() {
        let json = r#"{
            "handle": "octocat",
            "commitsTotal": 120,
            "prsMergedWeight": 12.5,
            "topRepoShare": 0.4,
            "maxCommitsIn10Min": 3,
            "heatmapData": [{"date": "2024-01-01", "count": 2}]
        }"#;
        let stats: RawActivityStats = serde_json::from_str(json).unwrap();
        assert_eq!(stats.handle, "octocat");
        assert_eq!(stats.commits_total, 120);
        assert_eq!(stats.max_commits_in_10_min, 3);
        assert_eq!(stats.reviews_submitted_count, 0);
        assert_eq!(stats.heatmap_data.len(), 1);
    }

    #[test]
    fn test_raw_stats_accept_malformed_numbers() {
        let json = r#"{
            "handle": "sloppy",
            "commitsTotal": 12.0,
            "totalStars": 1e20,
            "totalForks": -3.7,
            "totalWatchers": "7",
            "reviewsSubmittedCount": null,
            "issuesClosedCount": true,
            "linesAdded": 18446744073709551615,
            "prsMergedWeight": null,
            "topRepoShare": 1.5,
            "heatmapData": [{"date": "2024-01-01", "count": 2.9}]
        }"#;
        let stats: RawActivityStats = serde_json::from_str(json).unwrap();
        assert_eq!(stats.commits_total, 12);
        assert_eq!(stats.total_stars, i64::MAX);
        assert_eq!(stats.total_forks, -3);
        assert_eq!(stats.total_watchers, 7);
        assert_eq!(stats.reviews_submitted_count, 0);
        assert_eq!(stats.issues_closed_count, 0);
        assert_eq!(stats.lines_added, i64::MAX);
        assert_eq!(stats.prs_merged_weight, 0.0);
        assert_eq!(stats.top_repo_share, 1.5);
        assert_eq!(stats.heatmap_data[0].count, 2);
    }

    #[test]
    fn test_result_enums_serialize_as_display_names() {
        let rule = serde_json::to_value(ClassificationRule::Dominant(Dimension::Building)).unwrap();
        assert_eq!(rule["rule"], "dominant");
        assert_eq!(rule["dimension"], "building");
        assert_eq!(serde_json::to_value(Tier::High).unwrap(), "High");
        assert_eq!(serde_json::to_value(ProfileType::Solo).unwrap(), "solo");
    }
}

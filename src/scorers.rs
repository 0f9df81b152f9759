//! Dimension scoring
//!
//! Four independent scorers map normalized stats to a 0-100 score each:
//! - Building: merged-PR effort, issues closed, commit volume
//! - Guarding: review volume and review-to-own-PR ratio
//! - Consistency: active-day ratio, weekly evenness, inverse burst
//! - Breadth: repositories, distribution, community and documentation
//!
//! Every sub-signal passes through a saturating curve or a unit ratio before
//! weighting, so no single counter can push a score past 100.

use crate::config::{
    BreadthConfig, BuildingConfig, ConsistencyConfig, GuardingConfig, ScoringConfig,
};
use crate::curves::{percent, ratio, saturate, to_score};
use crate::types::{DimensionScores, NormalizedStats};

/// Runs all four scorers over one set of stats
pub struct DimensionScorer;

impl DimensionScorer {
    /// Score every dimension. Scorers share no state and may run in any order.
    pub fn score_all(stats: &NormalizedStats, config: &ScoringConfig) -> DimensionScores {
        DimensionScores {
            building: score_building(stats, &config.building),
            guarding: score_guarding(stats, &config.guarding),
            consistency: score_consistency(stats, &config.consistency),
            breadth: score_breadth(stats, &config.breadth),
        }
    }
}

/// Shipping credit.
///
/// Formula:
/// ```text
/// Building = 0.50 * saturate(prs_merged_weight, 40)
///          + 0.25 * saturate(issues_closed, 20)
///          + 0.25 * saturate(commits, 400)
/// ```
/// Commit volume carries the lowest weight: volume alone is not shipping.
pub fn score_building(stats: &NormalizedStats, config: &BuildingConfig) -> u8 {
    let pr_effort = saturate(stats.prs_merged_weight, config.pr_effort_scale);
    let issues = saturate(stats.issues_closed_count as f64, config.issues_scale);
    let commits = saturate(stats.commits_total as f64, config.commits_scale);

    to_score(
        config.pr_effort_weight * pr_effort
            + config.issues_weight * issues
            + config.commits_weight * commits,
    )
}

/// Review credit.
///
/// The ratio divides by `max(prs_merged, 1)`, so reviewers without merged PRs
/// of their own are scored on their review count rather than penalized.
/// Profile type plays no part here; it only gates classification.
pub fn score_guarding(stats: &NormalizedStats, config: &GuardingConfig) -> u8 {
    let reviews = stats.reviews_submitted_count as f64;
    let volume = saturate(reviews, config.reviews_scale);
    let review_ratio = ratio(reviews, stats.prs_merged_count.max(1) as f64);
    let ratio_score = saturate(review_ratio, config.ratio_scale);

    to_score(config.volume_weight * volume + config.ratio_weight * ratio_score)
}

/// Sustained activity over the window
pub fn score_consistency(stats: &NormalizedStats, config: &ConsistencyConfig) -> u8 {
    let active_ratio = ratio(stats.active_days as f64, stats.window_days as f64);
    let evenness = weekly_evenness(&stats.weekly_sums);
    let burst = burst_credit(stats, config.burst_threshold);

    to_score(
        config.active_ratio_weight * percent(active_ratio)
            + config.evenness_weight * percent(evenness)
            + config.burst_weight * percent(burst),
    )
}

/// Spread of contributions across repositories and the community
pub fn score_breadth(stats: &NormalizedStats, config: &BreadthConfig) -> u8 {
    let repos = saturate(stats.repos_contributed as f64, config.repos_scale);

    // Without any repository the share carries no information
    let distribution = if stats.repos_contributed > 0 {
        percent(1.0 - stats.top_repo_share)
    } else {
        0.0
    };

    let reach = saturate(stats.community_total() as f64, config.community_scale);
    let docs = saturate(stats.docs_contributions as f64, config.docs_scale);
    let community = (1.0 - config.docs_share) * reach + config.docs_share * docs;

    to_score(
        config.repos_weight * repos
            + config.distribution_weight * distribution
            + config.community_weight * community,
    )
}

/// Evenness of weekly activity: `1 - coefficient of variation`, in [0, 1].
///
/// A year with no activity has no evenness.
pub fn weekly_evenness(weekly_sums: &[u64]) -> f64 {
    if weekly_sums.is_empty() {
        return 0.0;
    }

    let n = weekly_sums.len() as f64;
    let mean = weekly_sums.iter().map(|w| *w as f64).sum::<f64>() / n;
    if mean <= 0.0 {
        return 0.0;
    }

    let variance = weekly_sums
        .iter()
        .map(|w| (*w as f64 - mean).powi(2))
        .sum::<f64>()
        / n;
    let cv = variance.sqrt() / mean;

    (1.0 - cv).clamp(0.0, 1.0)
}

/// Full credit below the batch threshold, `threshold / max_burst` above it.
///
/// No activity earns no credit.
fn burst_credit(stats: &NormalizedStats, threshold: u64) -> f64 {
    if stats.active_days == 0 && stats.commits_total == 0 {
        return 0.0;
    }
    let burst = stats.max_commits_in_10_min;
    if burst < threshold {
        1.0
    } else {
        ratio(threshold as f64, burst as f64).clamp(0.0, 1.0)
    }
}

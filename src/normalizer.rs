//! Stats normalization
//!
//! This module turns raw collector output into clamped, derived stats.
//! - Negative counters clamped to zero, shares clamped to [0, 1]
//! - Non-finite values coerced to zero
//! - Active-day count and weekly buckets derived from the heatmap
//!
//! Normalization never fails: a degraded score beats a missing one.

use crate::curves::finite_or_zero;
use crate::types::{
    HeatmapDay, NormalizedStats, RawActivityStats, DEFAULT_WINDOW_DAYS, WEEKS_PER_YEAR,
};
use tracing::warn;

/// Days covered by the weekly buckets
const BUCKETED_DAYS: i64 = (WEEKS_PER_YEAR * 7) as i64;

/// Normalizer for converting raw activity stats to normalized stats
pub struct StatsNormalizer;

impl StatsNormalizer {
    /// Normalize raw activity stats
    pub fn normalize(raw: &RawActivityStats) -> NormalizedStats {
        let mut coerced = 0u32;

        let commits_total = clamp_count(raw.commits_total, &mut coerced);
        let prs_merged_count = clamp_count(raw.prs_merged_count, &mut coerced);
        let prs_merged_weight = clamp_non_negative(raw.prs_merged_weight, &mut coerced);
        let reviews_submitted_count = clamp_count(raw.reviews_submitted_count, &mut coerced);
        let issues_closed_count = clamp_count(raw.issues_closed_count, &mut coerced);
        let lines_added = clamp_count(raw.lines_added, &mut coerced);
        let lines_deleted = clamp_count(raw.lines_deleted, &mut coerced);
        let repos_contributed = clamp_count(raw.repos_contributed, &mut coerced);
        let top_repo_share = clamp_share(raw.top_repo_share, &mut coerced);
        let max_commits_in_10_min = clamp_count(raw.max_commits_in_10_min, &mut coerced);
        let total_stars = clamp_count(raw.total_stars, &mut coerced);
        let total_forks = clamp_count(raw.total_forks, &mut coerced);
        let total_watchers = clamp_count(raw.total_watchers, &mut coerced);
        let docs_contributions = clamp_count(raw.docs_contributions, &mut coerced);

        let heatmap = &raw.heatmap_data;
        if heatmap.iter().any(|day| day.count < 0) {
            coerced += 1;
        }

        let window_days = window_length(heatmap);
        let heatmap_active_days = heatmap.iter().filter(|day| day.count > 0).count() as u64;

        // A positive collector count is authoritative; otherwise derive from the heatmap
        let reported_active_days = clamp_count(raw.active_days, &mut coerced);
        let active_days = if reported_active_days > 0 {
            reported_active_days
        } else {
            heatmap_active_days
        };
        let active_days = active_days.min(window_days as u64) as u32;

        let observed_span_days = observed_span(heatmap, active_days, window_days);
        let weekly_sums = weekly_sums(heatmap);

        if coerced > 0 {
            warn!(
                handle = %raw.handle,
                coerced,
                "clamped out-of-range activity fields"
            );
        }

        NormalizedStats {
            handle: raw.handle.clone(),
            commits_total,
            active_days,
            prs_merged_count,
            prs_merged_weight,
            reviews_submitted_count,
            issues_closed_count,
            lines_added,
            lines_deleted,
            repos_contributed,
            top_repo_share,
            max_commits_in_10_min,
            total_stars,
            total_forks,
            total_watchers,
            docs_contributions,
            window_days,
            observed_span_days,
            weekly_sums,
            coerced_fields: coerced,
        }
    }
}

fn clamp_count(value: i64, coerced: &mut u32) -> u64 {
    if value < 0 {
        *coerced += 1;
        0
    } else {
        value as u64
    }
}

fn clamp_non_negative(value: f64, coerced: &mut u32) -> f64 {
    let finite = finite_or_zero(value);
    if finite != value || finite < 0.0 {
        *coerced += 1;
    }
    finite.max(0.0)
}

fn clamp_share(value: f64, coerced: &mut u32) -> f64 {
    let finite = finite_or_zero(value);
    if finite != value || !(0.0..=1.0).contains(&finite) {
        *coerced += 1;
    }
    finite.clamp(0.0, 1.0)
}

/// Calendar days spanned by the heatmap, or a full year without one
fn window_length(heatmap: &[HeatmapDay]) -> u32 {
    let (Some(first), Some(last)) = (
        heatmap.iter().map(|d| d.date).min(),
        heatmap.iter().map(|d| d.date).max(),
    ) else {
        return DEFAULT_WINDOW_DAYS;
    };
    ((last - first).num_days() + 1).max(1) as u32
}

/// Days from the first active heatmap day to the end of the window
fn observed_span(heatmap: &[HeatmapDay], active_days: u32, window_days: u32) -> u32 {
    // Without active heatmap days, trust the collector's active-day count if it has one
    let fallback = if active_days > 0 { window_days } else { 0 };
    let Some(last) = heatmap.iter().map(|d| d.date).max() else {
        return fallback;
    };
    match heatmap.iter().filter(|d| d.count > 0).map(|d| d.date).min() {
        Some(first_active) => ((last - first_active).num_days() + 1) as u32,
        None => fallback,
    }
}

/// Sum daily counts into 52 weekly buckets aligned to the last heatmap day
fn weekly_sums(heatmap: &[HeatmapDay]) -> Vec<u64> {
    let mut sums = vec![0u64; WEEKS_PER_YEAR];
    let Some(end) = heatmap.iter().map(|d| d.date).max() else {
        return sums;
    };

    for day in heatmap.iter().filter(|d| d.count > 0) {
        let offset = (end - day.date).num_days();
        if (0..BUCKETED_DAYS).contains(&offset) {
            let week = WEEKS_PER_YEAR - 1 - (offset / 7) as usize;
            sums[week] = sums[week].saturating_add(day.count as u64);
        }
    }

    sums
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    fn heatmap(days: usize, count_for: impl Fn(usize) -> i64) -> Vec<HeatmapDay> {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        (0..days)
            .map(|i| HeatmapDay {
                date: start + chrono::Duration::days(i as i64),
                count: count_for(i),
            })
            .collect()
    }

    #[test]
    fn test_negative_counters_clamped() {
        let raw = RawActivityStats {
            handle: "neg".to_string(),
            commits_total: -5,
            reviews_submitted_count: -1,
            top_repo_share: 1.7,
            prs_merged_weight: f64::NAN,
            ..Default::default()
        };
        let normalized = StatsNormalizer::normalize(&raw);

        assert_eq!(normalized.commits_total, 0);
        assert_eq!(normalized.reviews_submitted_count, 0);
        assert_eq!(normalized.top_repo_share, 1.0);
        assert_eq!(normalized.prs_merged_weight, 0.0);
        assert_eq!(normalized.coerced_fields, 4);
    }

    #[test]
    fn test_active_days_derived_from_heatmap() {
        let raw = RawActivityStats {
            handle: "derive".to_string(),
            heatmap_data: heatmap(365, |i| if i % 2 == 0 { 1 } else { 0 }),
            ..Default::default()
        };
        let normalized = StatsNormalizer::normalize(&raw);

        assert_eq!(normalized.window_days, 365);
        assert_eq!(normalized.active_days, 183);
        assert_eq!(normalized.observed_span_days, 365);
    }

    #[test]
    fn test_reported_active_days_are_authoritative_but_capped() {
        let raw = RawActivityStats {
            handle: "cap".to_string(),
            active_days: 500,
            heatmap_data: heatmap(100, |_| 1),
            ..Default::default()
        };
        let normalized = StatsNormalizer::normalize(&raw);
        assert_eq!(normalized.active_days, 100);
    }

    #[test]
    fn test_weekly_sums_align_to_last_day() {
        let raw = RawActivityStats {
            handle: "weeks".to_string(),
            heatmap_data: heatmap(371, |_| 1),
            ..Default::default()
        };
        let normalized = StatsNormalizer::normalize(&raw);

        assert_eq!(normalized.weekly_sums.len(), WEEKS_PER_YEAR);
        assert!(normalized.weekly_sums.iter().all(|w| *w == 7));
    }

    #[test]
    fn test_empty_heatmap_defaults() {
        let raw = RawActivityStats {
            handle: "empty".to_string(),
            ..Default::default()
        };
        let normalized = StatsNormalizer::normalize(&raw);

        assert_eq!(normalized.window_days, DEFAULT_WINDOW_DAYS);
        assert_eq!(normalized.active_days, 0);
        assert_eq!(normalized.observed_span_days, 0);
        assert_eq!(normalized.weekly_sums, vec![0; WEEKS_PER_YEAR]);
        assert_eq!(normalized.coerced_fields, 0);
    }

    #[test]
    fn test_zero_filled_heatmap_trusts_reported_active_days() {
        let without_heatmap = StatsNormalizer::normalize(&RawActivityStats {
            handle: "quiet-map".to_string(),
            active_days: 120,
            ..Default::default()
        });
        let zero_heatmap = StatsNormalizer::normalize(&RawActivityStats {
            handle: "quiet-map".to_string(),
            active_days: 120,
            heatmap_data: heatmap(365, |_| 0),
            ..Default::default()
        });

        assert_eq!(zero_heatmap.active_days, 120);
        assert_eq!(zero_heatmap.observed_span_days, 365);
        assert_eq!(
            zero_heatmap.observed_span_days,
            without_heatmap.observed_span_days
        );
    }

    #[test]
    fn test_activity_index() {
        let raw = RawActivityStats {
            handle: "idx".to_string(),
            commits_total: 10,
            active_days: 5,
            prs_merged_count: 2,
            reviews_submitted_count: 3,
            repos_contributed: 1,
            ..Default::default()
        };
        let normalized = StatsNormalizer::normalize(&raw);
        assert_eq!(normalized.activity_index(), 10 + 5 + 6 + 6 + 2);
    }
}

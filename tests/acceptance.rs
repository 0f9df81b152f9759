//! End-to-end behaviour of the scoring engine

use chrono::{NaiveDate, TimeZone, Utc};
use pretty_assertions::assert_eq;

use devimpact::classifier::{ArchetypeClassifier, ClassifierInput};
use devimpact::pipeline::assemble_result;
use devimpact::types::{ConfidenceAssessment, ConfidencePenalty, HeatmapDay};
use devimpact::{
    apply_ema, compute_impact_at, verification_hash, Archetype, DimensionScores, ImpactProcessor,
    ProfileType, RawActivityStats, ScoringConfig, Tier,
};

fn fixed_time() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 9, 30, 0).unwrap()
}

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, d).unwrap()
}

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

fn full_confidence(confidence: u8) -> ConfidenceAssessment {
    ConfidenceAssessment {
        confidence,
        penalties: vec![],
    }
}

fn scenario(dims: DimensionScores, confidence: u8) -> devimpact::ImpactResult {
    assemble_result(
        "scenario",
        dims,
        ProfileType::Collaborative,
        500,
        full_confidence(confidence),
        &ScoringConfig::default(),
        fixed_time(),
    )
}

#[test]
fn test_results_stay_within_bounds() {
    let config = ScoringConfig::default();
    for scale in [0i64, 1, 7, 50, 400, 5_000, 1_000_000] {
        let raw = RawActivityStats {
            handle: format!("dev-{}", scale),
            commits_total: scale,
            active_days: scale.min(365),
            prs_merged_count: scale / 4,
            prs_merged_weight: scale as f64 / 3.0,
            reviews_submitted_count: scale / 2,
            issues_closed_count: scale / 5,
            repos_contributed: scale / 10,
            top_repo_share: 0.5,
            max_commits_in_10_min: scale / 20,
            total_stars: scale,
            total_forks: scale / 3,
            total_watchers: scale / 6,
            docs_contributions: scale / 8,
            ..Default::default()
        };
        let result = compute_impact_at(&raw, &config, fixed_time());

        for (_, score) in result.dimensions.entries() {
            assert!(score <= 100);
        }
        assert!(result.composite_score <= 100);
        assert!(result.adjusted_composite <= 100);
        assert!((50..=100).contains(&result.confidence));
        assert_eq!(result.tier, Tier::from_score(result.adjusted_composite));
    }
}

#[test]
fn test_all_zero_profile() {
    let raw = RawActivityStats {
        handle: "ghost".to_string(),
        ..Default::default()
    };
    let result = compute_impact_at(&raw, &ScoringConfig::default(), fixed_time());

    assert_eq!(result.dimensions, DimensionScores::new(0, 0, 0, 0));
    assert_eq!(result.archetype, Archetype::Emerging);
    assert_eq!(result.confidence, 50);
    assert_eq!(result.tier, Tier::Emerging);
    assert_eq!(result.profile_type, ProfileType::Solo);
    assert!(result
        .confidence_penalties
        .contains(&ConfidencePenalty::InsufficientData.reason().to_string()));
}

#[test]
fn test_huge_and_negative_counters_are_safe() {
    let huge = RawActivityStats {
        handle: "firehose".to_string(),
        commits_total: i64::MAX,
        active_days: i64::MAX,
        prs_merged_count: i64::MAX,
        prs_merged_weight: f64::MAX,
        reviews_submitted_count: i64::MAX,
        issues_closed_count: i64::MAX,
        lines_added: i64::MAX,
        lines_deleted: i64::MAX,
        repos_contributed: i64::MAX,
        top_repo_share: 1.0,
        max_commits_in_10_min: i64::MAX,
        total_stars: i64::MAX,
        total_forks: i64::MAX,
        total_watchers: i64::MAX,
        docs_contributions: i64::MAX,
        ..Default::default()
    };
    let result = compute_impact_at(&huge, &ScoringConfig::default(), fixed_time());
    assert!(result.adjusted_composite <= 100);
    assert!(result.dimensions.building >= 99);

    let negative = RawActivityStats {
        handle: "negative".to_string(),
        commits_total: -10,
        reviews_submitted_count: -3,
        prs_merged_weight: f64::NAN,
        top_repo_share: -2.0,
        ..Default::default()
    };
    let result = compute_impact_at(&negative, &ScoringConfig::default(), fixed_time());
    assert_eq!(result.dimensions, DimensionScores::new(0, 0, 0, 0));
    assert_eq!(result.archetype, Archetype::Emerging);
}

#[test]
fn test_identical_input_gives_identical_output() {
    let config = ScoringConfig::default();
    let a = compute_impact_at(&shipper(), &config, fixed_time());
    let b = compute_impact_at(&shipper(), &config, fixed_time());
    assert_eq!(a, b);
    assert_eq!(
        serde_json::to_string(&a).unwrap(),
        serde_json::to_string(&b).unwrap()
    );
}

#[test]
fn test_solo_profiles_never_become_guardians() {
    let config = ScoringConfig::default();
    let steps = [0u8, 20, 40, 60, 70, 80, 90, 100];
    for &building in &steps {
        for &guarding in &steps {
            for &consistency in &steps {
                for &breadth in &steps {
                    let classification = ArchetypeClassifier::classify(
                        &ClassifierInput {
                            dimensions: DimensionScores::new(
                                building,
                                guarding,
                                consistency,
                                breadth,
                            ),
                            profile_type: ProfileType::Solo,
                            activity_index: 1_000,
                        },
                        &config.classifier,
                    );
                    assert_ne!(classification.archetype, Archetype::Guardian);
                }
            }
        }
    }
}

#[test]
fn test_even_strength_is_balanced() {
    let result = scenario(DimensionScores::new(70, 70, 70, 70), 100);
    assert_eq!(result.archetype, Archetype::Balanced);
}

#[test]
fn test_ties_break_in_dimension_order() {
    let collaborative = scenario(DimensionScores::new(80, 80, 20, 20), 100);
    assert_eq!(collaborative.archetype, Archetype::Builder);

    let guard_and_breadth = scenario(DimensionScores::new(20, 85, 20, 85), 100);
    assert_eq!(guard_and_breadth.archetype, Archetype::Guardian);

    let solo = assemble_result(
        "solo",
        DimensionScores::new(20, 85, 20, 85),
        ProfileType::Solo,
        500,
        full_confidence(100),
        &ScoringConfig::default(),
        fixed_time(),
    );
    assert_eq!(solo.archetype, Archetype::Polymath);
}

#[test]
fn test_builder_scenario() {
    let result = scenario(DimensionScores::new(92, 34, 68, 38), 100);
    assert_eq!(result.archetype, Archetype::Builder);
    assert_eq!(result.composite_score, 72);
    assert_eq!(result.adjusted_composite, 75);
    assert_eq!(result.tier, Tier::High);
}

#[test]
fn test_balanced_scenario() {
    let result = scenario(DimensionScores::new(72, 68, 74, 66), 95);
    assert_eq!(result.archetype, Archetype::Balanced);
    assert_eq!(result.composite_score, 72);
    assert_eq!(result.adjusted_composite, 74);
    assert_eq!(result.tier, Tier::High);
}

#[test]
fn test_low_activity_short_circuits() {
    let result = assemble_result(
        "newcomer",
        DimensionScores::new(95, 95, 95, 95),
        ProfileType::Collaborative,
        10,
        full_confidence(100),
        &ScoringConfig::default(),
        fixed_time(),
    );
    assert_eq!(result.archetype, Archetype::Emerging);
}

#[test]
fn test_ema_fixed_point_and_convergence() {
    assert_eq!(apply_ema(70.0, Some(70.0)), 70);
    assert_eq!(apply_ema(64.0, None), 64);

    let mut processor = ImpactProcessor::new();
    let mut raw = shipper();
    let first = processor.process(&raw, day(1)).unwrap();
    let start = first.smoothed_score.unwrap();
    assert_eq!(start, first.adjusted_composite);

    // A quieter profile on following days pulls the smoothed score down gradually
    raw.commits_total = 0;
    raw.prs_merged_count = 0;
    raw.prs_merged_weight = 0.0;
    raw.issues_closed_count = 0;
    let mut last = start;
    for offset in 1..=60 {
        let date = day(1) + chrono::Duration::days(offset);
        let result = processor.process(&raw, date).unwrap();
        let smoothed = result.smoothed_score.unwrap();
        assert!(smoothed <= last);
        assert!(smoothed >= result.adjusted_composite);
        last = smoothed;
    }
    let target = compute_impact_at(&raw, &ScoringConfig::default(), fixed_time()).adjusted_composite;
    assert!(last.abs_diff(target) <= 1);
}

#[test]
fn test_same_day_recompute_does_not_chain() {
    let mut processor = ImpactProcessor::new();
    let first = processor.process(&shipper(), day(1)).unwrap();
    assert_eq!(first.smoothed_score, Some(65));

    let quiet = RawActivityStats {
        handle: "Shipper".to_string(),
        ..Default::default()
    };
    let once = processor.process(&quiet, day(2)).unwrap();
    let twice = processor.process(&quiet, day(2)).unwrap();
    assert_eq!(once.adjusted_composite, 0);
    assert_eq!(once.smoothed_score, Some(55));
    assert_eq!(twice.smoothed_score, Some(55));
    assert_eq!(twice.display_score(), 55);
}

#[test]
fn test_verification_code_binds_profile_and_day() {
    let raw = shipper();
    let result = compute_impact_at(&raw, &ScoringConfig::default(), fixed_time());

    let code = verification_hash(b"lookup-secret", &raw, &result, day(1)).unwrap();
    assert_eq!(code.len(), 8);
    assert_eq!(
        code,
        verification_hash(b"lookup-secret", &raw, &result, day(1)).unwrap()
    );
    assert_ne!(
        code,
        verification_hash(b"lookup-secret", &raw, &result, day(2)).unwrap()
    );
    assert!(verification_hash(b"", &raw, &result, day(1)).is_err());
}

#[test]
fn test_heatmap_profile_end_to_end() {
    let start = NaiveDate::from_ymd_opt(2023, 6, 2).unwrap();
    let heatmap_data: Vec<HeatmapDay> = (0..365)
        .map(|i| HeatmapDay {
            date: start + chrono::Duration::days(i),
            count: if i % 7 < 5 { 3 } else { 0 },
        })
        .collect();
    let raw = RawActivityStats {
        handle: "steady".to_string(),
        commits_total: 780,
        prs_merged_count: 40,
        prs_merged_weight: 55.0,
        reviews_submitted_count: 90,
        repos_contributed: 5,
        top_repo_share: 0.5,
        max_commits_in_10_min: 3,
        heatmap_data,
        ..Default::default()
    };
    let result = compute_impact_at(&raw, &ScoringConfig::default(), fixed_time());

    assert_eq!(result.profile_type, ProfileType::Collaborative);
    assert_eq!(result.confidence, 100);
    assert!(result.dimensions.consistency >= 70);
    assert_ne!(result.archetype, Archetype::Emerging);
}

#[test]
fn test_malformed_counters_degrade_instead_of_failing() {
    let json = r#"{
        "handle": "sloppy",
        "totalStars": 1e20,
        "commitsTotal": 12.0,
        "reviewsSubmittedCount": null,
        "topRepoShare": null
    }"#;
    let output = devimpact::impact_to_json(json).unwrap();
    let result: devimpact::ImpactResult = serde_json::from_str(&output).unwrap();

    assert_eq!(result.handle, "sloppy");
    assert_eq!(result.profile_type, ProfileType::Solo);
    assert!(result.dimensions.breadth > 0);
    assert!((50..=100).contains(&result.confidence));
}

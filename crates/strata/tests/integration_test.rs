//! Integration tests for strata.

use tempfile::TempDir;

use strata::{
    compare_reports, ColumnType, Engine, EngineConfig, ProfileOptions, Severity, StrataError,
};

fn engine() -> Engine {
    Engine::new()
}

fn options() -> ProfileOptions {
    ProfileOptions::default()
}

// =============================================================================
// Scenario Tests
// =============================================================================

#[test]
fn test_small_numeric_column() {
    let outcome = engine()
        .profile_csv("x\n1\n2\n3\n4\n5\n", &options())
        .expect("profiling failed");

    let stats = &outcome.report.column_stats["x"];
    assert_eq!(stats.column_type, ColumnType::Numeric);
    assert_eq!(stats.total_count, 5);
    assert_eq!(stats.valid_count, 5);
    assert_eq!(stats.missing_count, 0);
    assert_eq!(stats.unique, 5);

    let numeric = stats.numeric.as_ref().unwrap();
    assert!((numeric.mean - 3.0).abs() < 1e-9);
    assert!((numeric.variance - 2.0).abs() < 1e-9);
    assert!((numeric.std_dev - 1.4142135623730951).abs() < 1e-9);
    assert!((numeric.median - 3.0).abs() < 1e-9);
    assert!((numeric.q1 - 2.0).abs() < 1e-9);
    assert!((numeric.q3 - 4.0).abs() < 1e-9);
    assert!((numeric.iqr - 2.0).abs() < 1e-9);
    assert_eq!(numeric.min, 1.0);
    assert_eq!(numeric.max, 5.0);
    assert_eq!(numeric.outliers, 0);
    assert!(numeric.skewness.abs() < 1e-9);
    assert!((numeric.kurtosis - (-1.3)).abs() < 1e-9);
}

#[test]
fn test_categorical_with_clear_mode() {
    let outcome = engine()
        .profile_csv("c\na\na\na\nb\nc\n", &options())
        .expect("profiling failed");

    let stats = &outcome.report.column_stats["c"];
    assert_eq!(stats.column_type, ColumnType::Categorical);
    assert_eq!(stats.unique, 3);
    assert!((stats.unique_percent - 60.0).abs() < 1e-9);

    let cat = stats.categorical.as_ref().unwrap();
    assert_eq!(cat.mode, "a");
    assert_eq!(cat.mode_count, 3);
    assert!((cat.mode_percent - 60.0).abs() < 1e-9);
    assert_eq!(cat.top_values[0].value, "a");
    assert_eq!(cat.top_values[0].count, 3);
    assert!((cat.entropy - 1.3709505944546687).abs() < 1e-6);
}

#[test]
fn test_perfect_positive_correlation() {
    let outcome = engine()
        .profile_csv("a,b\n1,2\n2,4\n3,6\n4,8\n5,10\n", &options())
        .expect("profiling failed");

    let correlations = &outcome.report.correlations;
    assert_eq!(correlations.all.len(), 1);

    let pair = &correlations.all[0];
    assert!((pair.r - 1.0).abs() < 1e-12);
    assert_eq!(pair.sample_size, 5);
    assert_eq!(correlations.strong.len(), 1);
    assert_eq!(correlations.positive[0].r, pair.r);
    assert!(correlations.negative.is_empty());
}

#[test]
fn test_outlier_detection_and_insight() {
    let outcome = engine()
        .profile_csv("y\n1\n1\n2\n2\n3\n3\n4\n4\n100\n", &options())
        .expect("profiling failed");

    let numeric = outcome.report.column_stats["y"].numeric.as_ref().unwrap();
    assert!((numeric.iqr - 2.0).abs() < 1e-9);
    assert_eq!(numeric.outliers, 1);

    let outlier_insight = outcome
        .report
        .insights
        .iter()
        .find(|i| i.category == "Outliers")
        .expect("outlier insight missing");
    assert_eq!(outlier_insight.severity, Severity::Medium);
}

#[test]
fn test_cache_hit_returns_equal_summary() {
    let dir = TempDir::new().unwrap();
    let engine = Engine::with_config(EngineConfig {
        cache_dir: Some(dir.path().to_path_buf()),
        ..EngineConfig::default()
    })
    .unwrap();

    let csv = "a,b\n1,x\n2,y\n3,x\n4,y\n";
    let first = engine.profile_csv(csv, &options()).unwrap();
    assert!(!first.from_cache);

    let second = engine.profile_csv(csv, &options()).unwrap();
    assert!(second.from_cache);
    assert_eq!(second.report.column_stats, first.report.column_stats);
    assert_eq!(second.report.correlations, first.report.correlations);
    assert_eq!(second.report.insights, first.report.insights);
    assert_eq!(
        second.report.summary.total_rows,
        first.report.summary.total_rows
    );
    assert_eq!(
        second.report.summary.total_missing_values,
        first.report.summary.total_missing_values
    );
}

#[test]
fn test_comparison_sign_flip() {
    // v tracks u in the first dataset and mirrors it in the second.
    let up = "u,v\n1,2\n2,3\n3,5\n4,6\n5,8\n";
    let down = "u,v\n1,8\n2,6\n3,5\n4,3\n5,2\n";

    let engine = engine();
    let before = engine.profile_csv(up, &options()).unwrap();
    let after = engine.profile_csv(down, &options()).unwrap();

    let diff = compare_reports(&before.report, &after.report);
    assert_eq!(diff.correlation_changes.changed.len(), 1);

    let shift = &diff.correlation_changes.changed[0];
    assert!(shift.sign_change);
    assert!(shift.r_before > 0.0);
    assert!(shift.r_after < 0.0);

    let relationship = diff
        .insights
        .iter()
        .find(|i| i.category == "Relationships" && i.severity == Severity::High)
        .expect("sign-flip insight missing");
    assert!(relationship.message.contains("flipped"));
}

// =============================================================================
// Boundary Behaviors
// =============================================================================

#[test]
fn test_empty_record_view_rejected() {
    let result = engine().profile_csv("a,b,c,d,e\n", &options());
    assert!(matches!(result, Err(StrataError::EmptyData(_))));
}

#[test]
fn test_single_row_view() {
    let outcome = engine()
        .profile_csv("a,b\n1,x\n", &options())
        .expect("profiling failed");

    let numeric = outcome.report.column_stats["a"].numeric.as_ref().unwrap();
    assert_eq!(numeric.variance, 0.0);
    assert_eq!(numeric.outliers, 0);
    assert!(outcome.report.correlations.all.is_empty());
}

#[test]
fn test_all_null_column() {
    let outcome = engine()
        .profile_csv("a,b\n1,\n2,\n3,\n", &options())
        .expect("profiling failed");

    let stats = &outcome.report.column_stats["b"];
    assert_eq!(stats.column_type, ColumnType::Categorical);
    assert_eq!(stats.valid_count, 0);
    assert_eq!(stats.unique, 0);
    assert_eq!(stats.categorical.as_ref().unwrap().entropy, 0.0);
}

#[test]
fn test_constant_column_insights() {
    let outcome = engine()
        .profile_csv("k\n7\n7\n7\n7\n", &options())
        .expect("profiling failed");

    let numeric = outcome.report.column_stats["k"].numeric.as_ref().unwrap();
    assert_eq!(numeric.std_dev, 0.0);
    assert_eq!(numeric.skewness, 0.0);
    assert_eq!(numeric.kurtosis, 0.0);
    assert_eq!(numeric.outliers, 0);

    assert!(outcome
        .report
        .insights
        .iter()
        .any(|i| i.message.contains("zero variance") && i.severity == Severity::High));
}

#[test]
fn test_sampling_boundary() {
    let mut csv = String::from("v,g\n");
    for i in 0..100 {
        csv.push_str(&format!("{},{}\n", i, i % 4));
    }

    // N == sample_size: untouched.
    let at_limit = ProfileOptions {
        sample_size: 100,
        ..ProfileOptions::default()
    };
    let outcome = engine().profile_csv(&csv, &at_limit).unwrap();
    assert!(outcome.sampling.is_none());
    assert_eq!(outcome.report.summary.total_rows, 100);

    // N > sample_size: reduced, metadata attached.
    let below_limit = ProfileOptions {
        sample_size: 40,
        ..ProfileOptions::default()
    };
    let outcome = engine().profile_csv(&csv, &below_limit).unwrap();
    let sampling = outcome.sampling.unwrap();
    assert!(sampling.is_sampled);
    assert_eq!(sampling.original_size, 100);
    assert!((sampling.sampling_rate - 0.4).abs() < 1e-9);
    assert_eq!(outcome.report.summary.total_rows, sampling.sample_size);
}

// =============================================================================
// Determinism and Round Trips
// =============================================================================

#[test]
fn test_profiling_is_deterministic() {
    let mut csv = String::from("a,b,c\n");
    for i in 0..50 {
        csv.push_str(&format!("{},{},t{}\n", i, i * 3 % 17, i % 5));
    }

    let engine = engine();
    let mut first = engine.profile_csv(&csv, &options()).unwrap().report;
    let mut second = engine.profile_csv(&csv, &options()).unwrap().report;

    // Only the timing section may differ between runs.
    first.summary.processing = Default::default();
    first.summary.throughput = Default::default();
    second.summary.processing = Default::default();
    second.summary.throughput = Default::default();

    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
}

#[test]
fn test_report_json_round_trip() {
    let outcome = engine()
        .profile_csv("a,b\n1,x\n2,y\n3,x\n", &options())
        .unwrap();

    let json = serde_json::to_string(&outcome.report).unwrap();
    let back: strata::ProfileReport = serde_json::from_str(&json).unwrap();
    assert_eq!(back, outcome.report);
}

#[test]
fn test_report_save_and_load() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("report.json");

    let outcome = engine()
        .profile_csv("a,b\n1,x\n2,y\n3,x\n", &options())
        .unwrap();
    outcome.report.save(&path).unwrap();

    let loaded = strata::ProfileReport::load(&path).unwrap();
    assert_eq!(loaded, outcome.report);
}

// =============================================================================
// Universal Invariants on a Messy Input
// =============================================================================

#[test]
fn test_invariants_on_mixed_data() {
    let csv = "id,score,grade,note\n\
               1,95.5,A,good\n\
               2,,B,\n\
               3,88.0,A,fair\n\
               4,not-a-number,C,poor\n\
               5,70.25,B,good\n\
               6,NA,A,\n";

    let outcome = engine().profile_csv(csv, &options()).unwrap();

    for stats in outcome.report.column_stats.values() {
        assert_eq!(stats.missing_count + stats.valid_count, stats.total_count);
        assert!((0.0..=100.0).contains(&stats.missing_percent));
        assert!((0.0..=100.0).contains(&stats.unique_percent));
        assert!(stats.unique <= stats.valid_count);

        if let Some(n) = &stats.numeric {
            assert!(n.min <= n.q1 && n.q1 <= n.median);
            assert!(n.median <= n.q3 && n.q3 <= n.max);
            assert!(n.variance >= 0.0);
            assert!((n.std_dev * n.std_dev - n.variance).abs() < 1e-9);
            assert!(n.outliers <= stats.valid_count);
        }
        if let Some(c) = &stats.categorical {
            let bound = (stats.unique.max(1) as f64).log2();
            assert!(c.entropy >= -1e-9 && c.entropy <= bound + 1e-9);
        }
    }

    let correlations = &outcome.report.correlations;
    assert_eq!(
        correlations.strong.len() + correlations.moderate.len() + correlations.weak.len(),
        correlations.all.len()
    );
    for pair in &correlations.all {
        assert!((-1.0..=1.0).contains(&pair.r));
        assert!((pair.strength - pair.r.abs()).abs() < 1e-12);
        assert!(pair.sample_size >= 3);
        for col in [&pair.column_a, &pair.column_b] {
            assert_eq!(
                outcome.report.column_stats[col.as_str()].column_type,
                ColumnType::Numeric
            );
        }
    }
}

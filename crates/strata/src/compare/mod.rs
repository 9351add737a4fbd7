//! Comparison engine: structured diff of two profile reports.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::profile::{
    sort_by_severity, ColumnStats, ColumnType, CorrelationPair, Insight, InsightKind,
    ProfileReport, Severity,
};

/// Threshold on |percent change| for a significant top-value shift.
const SIGNIFICANT_TOP_VALUE_PCT: f64 = 20.0;
/// Threshold on the absolute coefficient shift for a significant change.
const SIGNIFICANT_CORRELATION_DIFF: f64 = 0.2;

/// Before/after pair with absolute and percent delta (relative to before,
/// zero-safe).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeltaStat {
    pub before: f64,
    pub after: f64,
    pub delta: f64,
    pub percent: f64,
}

impl DeltaStat {
    fn new(before: f64, after: f64) -> Self {
        let delta = after - before;
        let percent = if before == 0.0 {
            0.0
        } else {
            delta / before * 100.0
        };
        Self {
            before,
            after,
            delta,
            percent,
        }
    }
}

/// Row-count movement between the two reports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RowCountChange {
    pub before: usize,
    pub after: usize,
    pub delta: i64,
    pub percent: f64,
}

/// Numeric-specialization deltas for a common column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NumericChange {
    pub mean: DeltaStat,
    pub std_dev: DeltaStat,
    pub min: DeltaStat,
    pub max: DeltaStat,
    pub range: DeltaStat,
    pub outliers: DeltaStat,
}

/// One row of the paired top-values diff.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopValueChange {
    pub value: String,
    pub count_before: usize,
    pub count_after: usize,
    pub diff: i64,
    pub percent_change: f64,
    pub significant: bool,
}

/// Categorical-specialization deltas for a common column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoricalChange {
    pub entropy: DeltaStat,
    pub top_value_changes: Vec<TopValueChange>,
}

/// Changes observed on a column present in both reports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnChange {
    pub type_changed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub type_change: Option<String>,
    pub missing: DeltaStat,
    pub unique: DeltaStat,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub numeric: Option<NumericChange>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub categorical: Option<CategoricalChange>,
}

/// A correlation pair whose coefficient moved between the reports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CorrelationShift {
    pub column_a: String,
    pub column_b: String,
    pub r_before: f64,
    pub r_after: f64,
    pub diff: f64,
    pub significant: bool,
    pub sign_change: bool,
}

/// Added/removed/changed correlation pairs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CorrelationChanges {
    pub added: Vec<CorrelationPair>,
    pub removed: Vec<CorrelationPair>,
    pub changed: Vec<CorrelationShift>,
}

/// Structured diff of two profile reports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonReport {
    pub rows: RowCountChange,
    pub columns_added: Vec<String>,
    pub columns_removed: Vec<String>,
    pub column_changes: IndexMap<String, ColumnChange>,
    pub correlation_changes: CorrelationChanges,
    pub insights: Vec<Insight>,
}

/// Diff two profile reports into a change report with derived insights.
pub fn compare_reports(before: &ProfileReport, after: &ProfileReport) -> ComparisonReport {
    let columns_removed: Vec<String> = before
        .column_stats
        .keys()
        .filter(|c| !after.column_stats.contains_key(*c))
        .cloned()
        .collect();
    let columns_added: Vec<String> = after
        .column_stats
        .keys()
        .filter(|c| !before.column_stats.contains_key(*c))
        .cloned()
        .collect();

    let rows = row_change(before.summary.total_rows, after.summary.total_rows);

    let mut column_changes = IndexMap::new();
    for (name, stats_before) in &before.column_stats {
        if let Some(stats_after) = after.column_stats.get(name) {
            column_changes.insert(name.clone(), column_change(stats_before, stats_after));
        }
    }

    let correlation_changes =
        correlation_changes(&before.correlations.all, &after.correlations.all);

    // Judged on percent points of the missing share, per column stats.
    let missing_regressions = before
        .column_stats
        .iter()
        .filter_map(|(name, b)| after.column_stats.get(name).map(|a| (b, a)))
        .filter(|(b, a)| a.missing_percent - b.missing_percent > 5.0)
        .count();

    let insights = comparison_insights(
        &rows,
        &columns_added,
        &columns_removed,
        &column_changes,
        &correlation_changes,
        missing_regressions,
    );

    ComparisonReport {
        rows,
        columns_added,
        columns_removed,
        column_changes,
        correlation_changes,
        insights,
    }
}

fn row_change(before: usize, after: usize) -> RowCountChange {
    let delta = after as i64 - before as i64;
    let percent = if before == 0 {
        0.0
    } else {
        delta as f64 / before as f64 * 100.0
    };
    RowCountChange {
        before,
        after,
        delta,
        percent,
    }
}

fn type_label(t: ColumnType) -> &'static str {
    match t {
        ColumnType::Numeric => "numeric",
        ColumnType::Categorical => "categorical",
        ColumnType::Unknown => "unknown",
    }
}

fn column_change(before: &ColumnStats, after: &ColumnStats) -> ColumnChange {
    let type_changed = before.column_type != after.column_type;
    let type_change = type_changed.then(|| {
        format!(
            "{} -> {}",
            type_label(before.column_type),
            type_label(after.column_type)
        )
    });

    let numeric = match (&before.numeric, &after.numeric) {
        (Some(b), Some(a)) => Some(NumericChange {
            mean: DeltaStat::new(b.mean, a.mean),
            std_dev: DeltaStat::new(b.std_dev, a.std_dev),
            min: DeltaStat::new(b.min, a.min),
            max: DeltaStat::new(b.max, a.max),
            range: DeltaStat::new(b.max - b.min, a.max - a.min),
            outliers: DeltaStat::new(b.outliers as f64, a.outliers as f64),
        }),
        _ => None,
    };

    let categorical = match (&before.categorical, &after.categorical) {
        (Some(b), Some(a)) => Some(CategoricalChange {
            entropy: DeltaStat::new(b.entropy, a.entropy),
            top_value_changes: top_value_diff(b, a),
        }),
        _ => None,
    };

    ColumnChange {
        type_changed,
        type_change,
        missing: DeltaStat::new(before.missing_count as f64, after.missing_count as f64),
        unique: DeltaStat::new(before.unique as f64, after.unique as f64),
        numeric,
        categorical,
    }
}

/// Paired diff over the union of both top-value sets.
fn top_value_diff(
    before: &crate::profile::CategoricalStats,
    after: &crate::profile::CategoricalStats,
) -> Vec<TopValueChange> {
    let counts_before: IndexMap<&str, usize> = before
        .top_values
        .iter()
        .map(|t| (t.value.as_str(), t.count))
        .collect();
    let counts_after: IndexMap<&str, usize> = after
        .top_values
        .iter()
        .map(|t| (t.value.as_str(), t.count))
        .collect();

    let mut values: Vec<&str> = counts_before.keys().copied().collect();
    for value in counts_after.keys() {
        if !counts_before.contains_key(value) {
            values.push(value);
        }
    }

    values
        .into_iter()
        .map(|value| {
            let count_before = counts_before.get(value).copied().unwrap_or(0);
            let count_after = counts_after.get(value).copied().unwrap_or(0);
            let diff = count_after as i64 - count_before as i64;
            let percent_change = if count_before == 0 {
                0.0
            } else {
                diff as f64 / count_before as f64 * 100.0
            };
            TopValueChange {
                value: value.to_string(),
                count_before,
                count_after,
                diff,
                percent_change,
                significant: percent_change.abs() > SIGNIFICANT_TOP_VALUE_PCT,
            }
        })
        .collect()
}

/// Unordered pair key shared by both reports.
fn pair_key(pair: &CorrelationPair) -> (String, String) {
    if pair.column_a <= pair.column_b {
        (pair.column_a.clone(), pair.column_b.clone())
    } else {
        (pair.column_b.clone(), pair.column_a.clone())
    }
}

fn correlation_changes(
    before: &[CorrelationPair],
    after: &[CorrelationPair],
) -> CorrelationChanges {
    let before_map: IndexMap<(String, String), &CorrelationPair> =
        before.iter().map(|p| (pair_key(p), p)).collect();
    let after_map: IndexMap<(String, String), &CorrelationPair> =
        after.iter().map(|p| (pair_key(p), p)).collect();

    let mut changes = CorrelationChanges::default();

    for (key, pair_before) in &before_map {
        match after_map.get(key) {
            None => changes.removed.push((*pair_before).clone()),
            Some(pair_after) => {
                let diff = pair_after.r - pair_before.r;
                changes.changed.push(CorrelationShift {
                    column_a: key.0.clone(),
                    column_b: key.1.clone(),
                    r_before: pair_before.r,
                    r_after: pair_after.r,
                    diff,
                    significant: diff.abs() > SIGNIFICANT_CORRELATION_DIFF,
                    sign_change: (pair_before.r > 0.0) != (pair_after.r > 0.0),
                });
            }
        }
    }

    for (key, pair_after) in &after_map {
        if !before_map.contains_key(key) {
            changes.added.push((*pair_after).clone());
        }
    }

    changes
}

fn comparison_insights(
    rows: &RowCountChange,
    columns_added: &[String],
    columns_removed: &[String],
    column_changes: &IndexMap<String, ColumnChange>,
    correlations: &CorrelationChanges,
    missing_regressions: usize,
) -> Vec<Insight> {
    let mut insights = Vec::new();

    let row_pct = rows.percent.abs();
    if row_pct > 50.0 {
        insights.push(Insight::new(
            InsightKind::Warning,
            "Volume",
            format!("Row count changed by {:.1}%", rows.percent),
            Severity::High,
        ));
    } else if row_pct > 20.0 {
        insights.push(Insight::new(
            InsightKind::Info,
            "Volume",
            format!("Row count changed by {:.1}%", rows.percent),
            Severity::Medium,
        ));
    }

    if !columns_removed.is_empty() || !columns_added.is_empty() {
        insights.push(Insight::new(
            InsightKind::Warning,
            "Schema",
            format!(
                "Column set changed: {} removed, {} added",
                columns_removed.len(),
                columns_added.len()
            ),
            Severity::High,
        ));
    }

    let type_changes: Vec<&str> = column_changes
        .iter()
        .filter(|(_, c)| c.type_changed)
        .map(|(name, _)| name.as_str())
        .collect();
    if !type_changes.is_empty() {
        insights.push(Insight::new(
            InsightKind::Warning,
            "Schema",
            format!("Column type changed for: {}", type_changes.join(", ")),
            Severity::High,
        ));
    }

    if missing_regressions > 0 {
        insights.push(Insight::new(
            InsightKind::Warning,
            "Data Quality",
            format!(
                "{} column(s) show a missing-value increase above 5%",
                missing_regressions
            ),
            Severity::Medium,
        ));
    }

    let drifted = column_changes
        .values()
        .filter(|c| {
            c.numeric
                .as_ref()
                .is_some_and(|n| n.mean.percent.abs() > 20.0)
        })
        .count();
    if drifted > 0 {
        insights.push(Insight::new(
            InsightKind::Info,
            "Drift",
            format!("{} numeric column(s) show a mean shift above 20%", drifted),
            Severity::Medium,
        ));
    }

    let significant = correlations
        .changed
        .iter()
        .filter(|c| c.significant)
        .count();
    if significant > 0 {
        insights.push(Insight::new(
            InsightKind::Insight,
            "Relationships",
            format!("{} correlation(s) changed significantly", significant),
            Severity::Medium,
        ));
    }

    let flipped = correlations
        .changed
        .iter()
        .filter(|c| c.sign_change)
        .count();
    if flipped > 0 {
        insights.push(Insight::new(
            InsightKind::Warning,
            "Relationships",
            format!("{} correlation(s) flipped sign", flipped),
            Severity::High,
        ));
    }

    sort_by_severity(&mut insights);
    insights
}

//! Rule-derived insights over column statistics and correlations.

use indexmap::IndexMap;

use super::types::{
    ColumnStats, ColumnType, CorrelationSet, Insight, InsightKind, Severity,
    sort_by_severity,
};

/// Derive insights for a full report: per-column rules first, then the
/// dataset-level rules, sorted by severity.
pub fn derive_insights(
    column_stats: &IndexMap<String, ColumnStats>,
    correlations: &CorrelationSet,
) -> Vec<Insight> {
    let mut insights = Vec::new();

    for (column, stats) in column_stats {
        column_insights(column, stats, &mut insights);
    }

    if !correlations.strong.is_empty() {
        insights.push(Insight::new(
            InsightKind::Insight,
            "Multicollinearity",
            format!(
                "{} strongly correlated column pair(s) detected; consider dropping redundant columns",
                correlations.strong.len()
            ),
            Severity::Medium,
        ));
    }

    let numeric_missing: Vec<f64> = column_stats
        .values()
        .filter(|s| s.column_type == ColumnType::Numeric)
        .map(|s| s.missing_percent)
        .collect();
    if !numeric_missing.is_empty() {
        let avg = numeric_missing.iter().sum::<f64>() / numeric_missing.len() as f64;
        if avg > 15.0 {
            insights.push(Insight::new(
                InsightKind::Warning,
                "Data Quality",
                format!(
                    "Numeric columns average {:.1}% missing values; imputation or collection review recommended",
                    avg
                ),
                Severity::High,
            ));
        }
    }

    sort_by_severity(&mut insights);
    insights
}

/// Per-column rules.
fn column_insights(column: &str, stats: &ColumnStats, insights: &mut Vec<Insight>) {
    if stats.missing_percent > 30.0 {
        insights.push(Insight::new(
            InsightKind::Warning,
            "Data Quality",
            format!(
                "Column '{}' is {:.1}% missing",
                column, stats.missing_percent
            ),
            Severity::High,
        ));
    }

    match stats.column_type {
        ColumnType::Numeric => {
            if let Some(numeric) = &stats.numeric {
                if numeric.outliers > 0 {
                    insights.push(Insight::new(
                        InsightKind::Info,
                        "Outliers",
                        format!(
                            "Column '{}' has {} outlier(s) outside the IQR bounds",
                            column, numeric.outliers
                        ),
                        Severity::Medium,
                    ));
                }
                if numeric.std_dev == 0.0 {
                    insights.push(Insight::new(
                        InsightKind::Warning,
                        "Data Quality",
                        format!("Column '{}' has zero variance", column),
                        Severity::High,
                    ));
                }
            }
        }
        ColumnType::Categorical => {
            if stats.unique == 1 {
                insights.push(Insight::new(
                    InsightKind::Warning,
                    "Feature Engineering",
                    format!("Column '{}' is constant", column),
                    Severity::High,
                ));
            }
            if stats.valid_count > 0 && stats.unique == stats.valid_count {
                insights.push(Insight::new(
                    InsightKind::Info,
                    "Feature Engineering",
                    format!("Column '{}' is all-unique; likely an identifier", column),
                    Severity::Low,
                ));
            }
            if stats.unique_percent > 90.0 && stats.unique > 100 {
                insights.push(Insight::new(
                    InsightKind::Info,
                    "Feature Engineering",
                    format!(
                        "Column '{}' has high cardinality ({} distinct values)",
                        column, stats.unique
                    ),
                    Severity::Medium,
                ));
            }
        }
        ColumnType::Unknown => {}
    }
}

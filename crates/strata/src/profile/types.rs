//! Report types produced by the profiling engine.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Inferred column classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnType {
    Numeric,
    Categorical,
    /// Profiling of the column failed; see `ColumnStats::error`.
    Unknown,
}

impl Default for ColumnType {
    fn default() -> Self {
        ColumnType::Unknown
    }
}

/// Statistics for the numeric specialization of a column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NumericStats {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub median: f64,
    /// Most frequent numeric value; ties broken by first appearance.
    pub mode: f64,
    /// Population variance.
    pub variance: f64,
    pub std_dev: f64,
    pub q1: f64,
    pub q3: f64,
    pub iqr: f64,
    /// Values strictly outside `[q1 - 1.5*iqr, q3 + 1.5*iqr]`.
    pub outliers: usize,
    pub skewness: f64,
    /// Excess kurtosis (fourth standardized moment minus 3).
    pub kurtosis: f64,
}

/// One entry of a categorical frequency table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopValue {
    pub value: String,
    pub count: usize,
}

/// Statistics for the categorical specialization of a column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoricalStats {
    /// Top 10 values by count, descending; ties keep first-seen order.
    pub top_values: Vec<TopValue>,
    pub mode: String,
    pub mode_count: usize,
    pub mode_percent: f64,
    /// Shannon entropy, base 2, over observed frequencies.
    pub entropy: f64,
}

/// Per-column profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnStats {
    #[serde(rename = "type")]
    pub column_type: ColumnType,
    pub total_count: usize,
    pub valid_count: usize,
    pub missing_count: usize,
    pub missing_percent: f64,
    pub unique: usize,
    pub unique_percent: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub numeric: Option<NumericStats>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub categorical: Option<CategoricalStats>,
    /// Set when profiling this column failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ColumnStats {
    /// Fallback record for a column whose profiling raised an error.
    pub fn unknown(error: impl Into<String>) -> Self {
        Self {
            column_type: ColumnType::Unknown,
            total_count: 0,
            valid_count: 0,
            missing_count: 0,
            missing_percent: 0.0,
            unique: 0,
            unique_percent: 0.0,
            numeric: None,
            categorical: None,
            error: Some(error.into()),
        }
    }
}

/// Pearson correlation between two numeric columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CorrelationPair {
    pub column_a: String,
    pub column_b: String,
    pub r: f64,
    /// `|r|`.
    pub strength: f64,
    pub sample_size: usize,
}

/// The six published correlation partitions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CorrelationSet {
    /// All accepted pairs, descending by strength.
    pub all: Vec<CorrelationPair>,
    /// strength > 0.7
    pub strong: Vec<CorrelationPair>,
    /// 0.3 < strength <= 0.7
    pub moderate: Vec<CorrelationPair>,
    /// strength <= 0.3
    pub weak: Vec<CorrelationPair>,
    /// Top 5 by strength with r > 0.
    pub positive: Vec<CorrelationPair>,
    /// Top 5 by strength with r < 0.
    pub negative: Vec<CorrelationPair>,
}

impl CorrelationSet {
    /// Build the partitions from a list of pairs. Sorts by descending
    /// strength first; the input order only breaks exact ties.
    pub fn from_pairs(mut pairs: Vec<CorrelationPair>) -> Self {
        pairs.sort_by(|a, b| {
            b.strength
                .partial_cmp(&a.strength)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        let strong = pairs.iter().filter(|p| p.strength > 0.7).cloned().collect();
        let moderate = pairs
            .iter()
            .filter(|p| p.strength > 0.3 && p.strength <= 0.7)
            .cloned()
            .collect();
        let weak = pairs.iter().filter(|p| p.strength <= 0.3).cloned().collect();
        let positive = pairs
            .iter()
            .filter(|p| p.r > 0.0)
            .take(5)
            .cloned()
            .collect();
        let negative = pairs
            .iter()
            .filter(|p| p.r < 0.0)
            .take(5)
            .cloned()
            .collect();

        Self {
            all: pairs,
            strong,
            moderate,
            weak,
            positive,
            negative,
        }
    }
}

/// Kind of a derived insight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InsightKind {
    Warning,
    Info,
    Insight,
}

/// Severity of an insight, ordered low < medium < high.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

/// A rule-derived qualitative annotation on a report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Insight {
    #[serde(rename = "type")]
    pub kind: InsightKind,
    pub category: String,
    pub message: String,
    pub severity: Severity,
}

impl Insight {
    pub fn new(
        kind: InsightKind,
        category: impl Into<String>,
        message: impl Into<String>,
        severity: Severity,
    ) -> Self {
        Self {
            kind,
            category: category.into(),
            message: message.into(),
            severity,
        }
    }
}

/// Sort insights by severity, high first. Stable, so rule emission order
/// breaks ties.
pub fn sort_by_severity(insights: &mut [Insight]) {
    insights.sort_by(|a, b| b.severity.cmp(&a.severity));
}

/// Processing-time breakdown in milliseconds.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessingTime {
    pub total_ms: u64,
    pub parse_ms: u64,
    pub profile_ms: u64,
}

/// Throughput metrics derived from the processing times.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Throughput {
    pub rows_per_second: f64,
    pub columns_per_second: f64,
    /// Qualitative label: "high", "medium", or "low".
    pub efficiency: String,
}

impl Throughput {
    /// Derive throughput from row/column counts and total elapsed time.
    pub fn from_counts(rows: usize, columns: usize, total_ms: u64) -> Self {
        let seconds = (total_ms.max(1)) as f64 / 1000.0;
        let rows_per_second = rows as f64 / seconds;
        let columns_per_second = columns as f64 / seconds;
        let efficiency = if rows_per_second >= 50_000.0 {
            "high"
        } else if rows_per_second >= 5_000.0 {
            "medium"
        } else {
            "low"
        };
        Self {
            rows_per_second,
            columns_per_second,
            efficiency: efficiency.to_string(),
        }
    }
}

/// Dataset-level summary of a profile report.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportSummary {
    pub total_rows: usize,
    pub total_columns: usize,
    pub numeric_columns: usize,
    pub categorical_columns: usize,
    pub total_missing_values: usize,
    pub processing: ProcessingTime,
    pub throughput: Throughput,
}

/// Top-level profiling result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileReport {
    pub summary: ReportSummary,
    pub column_stats: IndexMap<String, ColumnStats>,
    pub correlations: CorrelationSet,
    pub insights: Vec<Insight>,
}

impl ProfileReport {
    /// Save the report as pretty JSON.
    pub fn save(&self, path: impl AsRef<std::path::Path>) -> crate::error::Result<()> {
        use std::io::BufWriter;
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|e| crate::error::StrataError::Io {
                    path: parent.to_path_buf(),
                    source: e,
                })?;
            }
        }
        let file = std::fs::File::create(path).map_err(|e| crate::error::StrataError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        serde_json::to_writer_pretty(BufWriter::new(file), self)?;
        Ok(())
    }

    /// Load a report from a JSON file.
    pub fn load(path: impl AsRef<std::path::Path>) -> crate::error::Result<Self> {
        use std::io::BufReader;
        let path = path.as_ref();
        let file = std::fs::File::open(path).map_err(|e| crate::error::StrataError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        Ok(serde_json::from_reader(BufReader::new(file))?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair(a: &str, b: &str, r: f64) -> CorrelationPair {
        CorrelationPair {
            column_a: a.to_string(),
            column_b: b.to_string(),
            r,
            strength: r.abs(),
            sample_size: 10,
        }
    }

    #[test]
    fn test_partitions_are_disjoint_and_cover_all() {
        let set = CorrelationSet::from_pairs(vec![
            pair("a", "b", 0.9),
            pair("a", "c", -0.5),
            pair("b", "c", 0.1),
            pair("a", "d", 0.7),
        ]);
        assert_eq!(set.all.len(), 4);
        assert_eq!(
            set.strong.len() + set.moderate.len() + set.weak.len(),
            set.all.len()
        );
        // 0.7 is not strong: the band is strictly above the threshold.
        assert_eq!(set.strong.len(), 1);
        assert_eq!(set.moderate.len(), 2);
    }

    #[test]
    fn test_partitions_sorted_by_strength() {
        let set = CorrelationSet::from_pairs(vec![
            pair("a", "b", 0.2),
            pair("a", "c", -0.8),
            pair("b", "c", 0.5),
        ]);
        assert_eq!(set.all[0].column_b, "c");
        assert_eq!(set.negative[0].r, -0.8);
        assert_eq!(set.positive[0].r, 0.5);
    }

    #[test]
    fn test_severity_sort() {
        let mut insights = vec![
            Insight::new(InsightKind::Info, "a", "low", Severity::Low),
            Insight::new(InsightKind::Warning, "b", "high", Severity::High),
            Insight::new(InsightKind::Info, "c", "medium", Severity::Medium),
        ];
        sort_by_severity(&mut insights);
        assert_eq!(insights[0].severity, Severity::High);
        assert_eq!(insights[2].severity, Severity::Low);
    }

    #[test]
    fn test_report_json_roundtrip() {
        let report = ProfileReport {
            summary: ReportSummary {
                total_rows: 3,
                total_columns: 1,
                numeric_columns: 1,
                categorical_columns: 0,
                total_missing_values: 0,
                processing: ProcessingTime::default(),
                throughput: Throughput::default(),
            },
            column_stats: IndexMap::new(),
            correlations: CorrelationSet::default(),
            insights: Vec::new(),
        };
        let json = serde_json::to_string(&report).unwrap();
        assert!(json.contains("totalRows"));
        assert!(json.contains("columnStats"));
        let back: ProfileReport = serde_json::from_str(&json).unwrap();
        assert_eq!(back, report);
    }

    #[test]
    fn test_throughput_labels() {
        assert_eq!(Throughput::from_counts(100_000, 5, 1000).efficiency, "high");
        assert_eq!(Throughput::from_counts(10_000, 5, 1000).efficiency, "medium");
        assert_eq!(Throughput::from_counts(100, 5, 1000).efficiency, "low");
    }
}

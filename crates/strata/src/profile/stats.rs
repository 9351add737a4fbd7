//! Per-column statistical profiling.

use indexmap::IndexMap;

use crate::error::{Result, StrataError};
use crate::input::{CellValue, RecordView};

use super::types::{CategoricalStats, ColumnStats, ColumnType, NumericStats, TopValue};

/// Entries kept in a categorical top-values table.
const TOP_VALUES: usize = 10;

/// Profile a single column of the view.
///
/// Classification is a property of the whole column: numeric when more than
/// half of the non-missing cells carry a finite number, categorical
/// otherwise (including the all-missing case).
pub fn profile_column(view: &RecordView, column: &str) -> Result<ColumnStats> {
    let cells = view
        .column_cells(column)
        .ok_or_else(|| StrataError::Parse(format!("unknown column '{}'", column)))?;

    let mut total = 0usize;
    let mut valid_cells: Vec<&CellValue> = Vec::new();
    let mut numeric_values: Vec<f64> = Vec::new();

    for cell in cells {
        total += 1;
        match cell {
            CellValue::Null => {}
            CellValue::Text(s) if s.is_empty() => {}
            CellValue::Number(n) => {
                valid_cells.push(cell);
                numeric_values.push(*n);
            }
            other => valid_cells.push(other),
        }
    }

    let valid = valid_cells.len();
    let missing = total - valid;

    let column_type = if !numeric_values.is_empty()
        && numeric_values.len() as f64 / valid as f64 > 0.5
    {
        ColumnType::Numeric
    } else {
        ColumnType::Categorical
    };

    let mut seen = std::collections::HashSet::new();
    for cell in &valid_cells {
        seen.insert(cell.canonical());
    }
    let unique = seen.len();

    let missing_percent = percent(missing, total);
    let unique_percent = percent(unique, valid);

    let (numeric, categorical) = match column_type {
        ColumnType::Numeric => (Some(numeric_stats(&numeric_values)), None),
        _ => (None, Some(categorical_stats(&valid_cells, valid))),
    };

    Ok(ColumnStats {
        column_type,
        total_count: total,
        valid_count: valid,
        missing_count: missing,
        missing_percent,
        unique,
        unique_percent,
        numeric,
        categorical,
        error: None,
    })
}

fn percent(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}

/// Descriptive statistics over the column's numeric cells.
fn numeric_stats(values: &[f64]) -> NumericStats {
    let n = values.len();
    if n == 0 {
        return NumericStats {
            min: 0.0,
            max: 0.0,
            mean: 0.0,
            median: 0.0,
            mode: 0.0,
            variance: 0.0,
            std_dev: 0.0,
            q1: 0.0,
            q3: 0.0,
            iqr: 0.0,
            outliers: 0,
            skewness: 0.0,
            kurtosis: 0.0,
        };
    }

    let count = n as f64;
    let mean = values.iter().sum::<f64>() / count;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / count;
    let std_dev = variance.sqrt();

    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).expect("finite values"));

    let min = sorted[0];
    let max = sorted[n - 1];
    let q1 = percentile(&sorted, 25.0);
    let median = percentile(&sorted, 50.0);
    let q3 = percentile(&sorted, 75.0);
    let iqr = q3 - q1;

    let lower = q1 - 1.5 * iqr;
    let upper = q3 + 1.5 * iqr;
    let outliers = values.iter().filter(|&&v| v < lower || v > upper).count();

    // Standardized moments; zero spread pins both to zero by convention.
    let (skewness, kurtosis) = if std_dev == 0.0 {
        (0.0, 0.0)
    } else {
        let skew = values
            .iter()
            .map(|v| ((v - mean) / std_dev).powi(3))
            .sum::<f64>()
            / count;
        let kurt = values
            .iter()
            .map(|v| ((v - mean) / std_dev).powi(4))
            .sum::<f64>()
            / count
            - 3.0;
        (skew, kurt)
    };

    NumericStats {
        min,
        max,
        mean,
        median,
        mode: numeric_mode(values),
        variance,
        std_dev,
        q1,
        q3,
        iqr,
        outliers,
        skewness,
        kurtosis,
    }
}

/// Linear-interpolated percentile over an ascending slice.
fn percentile(sorted: &[f64], p: f64) -> f64 {
    let n = sorted.len();
    if n == 1 {
        return sorted[0];
    }
    let rank = (n - 1) as f64 * p / 100.0;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    if lower == upper {
        sorted[lower]
    } else {
        sorted[lower] + (sorted[upper] - sorted[lower]) * (rank - lower as f64)
    }
}

/// Most frequent value over the numeric multiset, first-seen tie-break.
fn numeric_mode(values: &[f64]) -> f64 {
    let mut counts: IndexMap<u64, (f64, usize)> = IndexMap::new();
    for &v in values {
        counts.entry(v.to_bits()).or_insert((v, 0)).1 += 1;
    }
    let mut best = (0.0, 0usize);
    for &(value, count) in counts.values() {
        if count > best.1 {
            best = (value, count);
        }
    }
    best.0
}

/// Frequency table, mode, and entropy over stringified values.
fn categorical_stats(valid_cells: &[&CellValue], valid: usize) -> CategoricalStats {
    let mut counts: IndexMap<String, usize> = IndexMap::new();
    for cell in valid_cells {
        *counts.entry(cell.canonical()).or_insert(0) += 1;
    }

    let mut table: Vec<TopValue> = counts
        .iter()
        .map(|(value, &count)| TopValue {
            value: value.clone(),
            count,
        })
        .collect();
    // Stable sort: equal counts keep first-seen order.
    table.sort_by(|a, b| b.count.cmp(&a.count));

    let (mode, mode_count) = table
        .first()
        .map(|t| (t.value.clone(), t.count))
        .unwrap_or_default();
    let mode_percent = percent(mode_count, valid);

    let entropy = if valid == 0 {
        0.0
    } else {
        counts
            .values()
            .map(|&c| {
                let p = c as f64 / valid as f64;
                -p * p.log2()
            })
            .sum()
    };

    table.truncate(TOP_VALUES);

    CategoricalStats {
        top_values: table,
        mode,
        mode_count,
        mode_percent,
        entropy,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn view_of(column: &str, cells: Vec<CellValue>) -> RecordView {
        let rows = cells.into_iter().map(|c| vec![c]).collect();
        RecordView::new(vec![column.to_string()], rows).unwrap()
    }

    fn numbers(values: &[f64]) -> Vec<CellValue> {
        values.iter().map(|&v| CellValue::Number(v)).collect()
    }

    fn texts(values: &[&str]) -> Vec<CellValue> {
        values.iter().map(|s| CellValue::Text(s.to_string())).collect()
    }

    #[test]
    fn test_small_numeric_column() {
        let view = view_of("x", numbers(&[1.0, 2.0, 3.0, 4.0, 5.0]));
        let stats = profile_column(&view, "x").unwrap();

        assert_eq!(stats.column_type, ColumnType::Numeric);
        assert_eq!(stats.total_count, 5);
        assert_eq!(stats.valid_count, 5);
        assert_eq!(stats.missing_count, 0);
        assert_eq!(stats.unique, 5);

        let n = stats.numeric.unwrap();
        assert!((n.mean - 3.0).abs() < 1e-9);
        assert!((n.variance - 2.0).abs() < 1e-9);
        assert!((n.std_dev - 2.0f64.sqrt()).abs() < 1e-9);
        assert!((n.median - 3.0).abs() < 1e-9);
        assert!((n.q1 - 2.0).abs() < 1e-9);
        assert!((n.q3 - 4.0).abs() < 1e-9);
        assert!((n.iqr - 2.0).abs() < 1e-9);
        assert_eq!(n.min, 1.0);
        assert_eq!(n.max, 5.0);
        assert_eq!(n.outliers, 0);
        assert!(n.skewness.abs() < 1e-9);
        assert!((n.kurtosis - (-1.3)).abs() < 1e-9);
    }

    #[test]
    fn test_categorical_with_clear_mode() {
        let view = view_of("c", texts(&["a", "a", "a", "b", "c"]));
        let stats = profile_column(&view, "c").unwrap();

        assert_eq!(stats.column_type, ColumnType::Categorical);
        assert_eq!(stats.unique, 3);
        assert!((stats.unique_percent - 60.0).abs() < 1e-9);

        let c = stats.categorical.unwrap();
        assert_eq!(c.mode, "a");
        assert_eq!(c.mode_count, 3);
        assert!((c.mode_percent - 60.0).abs() < 1e-9);
        assert_eq!(c.top_values[0], TopValue { value: "a".to_string(), count: 3 });

        let expected = -(0.6f64 * 0.6f64.log2() + 2.0 * 0.2 * 0.2f64.log2());
        assert!((c.entropy - expected).abs() < 1e-9);
    }

    #[test]
    fn test_outlier_detection() {
        let view = view_of("y", numbers(&[1.0, 1.0, 2.0, 2.0, 3.0, 3.0, 4.0, 4.0, 100.0]));
        let stats = profile_column(&view, "y").unwrap();
        let n = stats.numeric.unwrap();

        assert!((n.iqr - 2.0).abs() < 1e-9);
        assert_eq!(n.outliers, 1);
    }

    #[test]
    fn test_all_null_column_is_categorical() {
        let view = view_of("z", vec![CellValue::Null, CellValue::Null]);
        let stats = profile_column(&view, "z").unwrap();

        assert_eq!(stats.column_type, ColumnType::Categorical);
        assert_eq!(stats.valid_count, 0);
        assert_eq!(stats.unique, 0);
        assert!((stats.missing_percent - 100.0).abs() < 1e-9);
        assert_eq!(stats.categorical.unwrap().entropy, 0.0);
    }

    #[test]
    fn test_constant_numeric_column() {
        let view = view_of("k", numbers(&[7.0, 7.0, 7.0, 7.0]));
        let stats = profile_column(&view, "k").unwrap();
        let n = stats.numeric.unwrap();

        assert_eq!(n.std_dev, 0.0);
        assert_eq!(n.skewness, 0.0);
        assert_eq!(n.kurtosis, 0.0);
        assert_eq!(n.outliers, 0);
        assert_eq!(n.mode, 7.0);
    }

    #[test]
    fn test_mixed_column_majority_wins() {
        // 3 numbers, 2 strings: numeric.
        let view = view_of(
            "m",
            vec![
                CellValue::Number(1.0),
                CellValue::Number(2.0),
                CellValue::Number(3.0),
                CellValue::Text("x".to_string()),
                CellValue::Text("y".to_string()),
            ],
        );
        assert_eq!(
            profile_column(&view, "m").unwrap().column_type,
            ColumnType::Numeric
        );

        // 2 numbers, 2 strings: 0.5 is not a majority.
        let view = view_of(
            "m",
            vec![
                CellValue::Number(1.0),
                CellValue::Number(2.0),
                CellValue::Text("x".to_string()),
                CellValue::Text("y".to_string()),
            ],
        );
        assert_eq!(
            profile_column(&view, "m").unwrap().column_type,
            ColumnType::Categorical
        );
    }

    #[test]
    fn test_empty_text_counts_as_missing() {
        let view = view_of("e", texts(&["a", "", "b"]));
        let stats = profile_column(&view, "e").unwrap();
        assert_eq!(stats.valid_count, 2);
        assert_eq!(stats.missing_count, 1);
    }

    #[test]
    fn test_numeric_mode_first_seen_tie_break() {
        let view = view_of("t", numbers(&[2.0, 1.0, 1.0, 2.0, 3.0]));
        let stats = profile_column(&view, "t").unwrap();
        // 2 and 1 both appear twice; 2 was seen first.
        assert_eq!(stats.numeric.unwrap().mode, 2.0);
    }

    #[test]
    fn test_single_value_column() {
        let view = view_of("s", numbers(&[42.0]));
        let stats = profile_column(&view, "s").unwrap();
        let n = stats.numeric.unwrap();
        assert_eq!(n.variance, 0.0);
        assert_eq!(n.median, 42.0);
        assert_eq!(n.q1, 42.0);
        assert_eq!(n.outliers, 0);
    }

    #[test]
    fn test_top_values_capped_at_ten() {
        let labels: Vec<String> = (0..25).map(|i| format!("v{}", i)).collect();
        let refs: Vec<&str> = labels.iter().map(|s| s.as_str()).collect();
        let view = view_of("w", texts(&refs));
        let stats = profile_column(&view, "w").unwrap();
        assert_eq!(stats.categorical.unwrap().top_values.len(), 10);
    }
}

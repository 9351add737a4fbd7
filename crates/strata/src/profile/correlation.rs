//! Pairwise Pearson correlations between numeric columns.

use crate::input::{CellValue, RecordView};

use super::types::{CorrelationPair, CorrelationSet};

/// Minimum paired observations for a pair to be reported.
const MIN_SAMPLE_SIZE: usize = 3;

/// The null-filtered numeric sequence of a column, in row order.
pub fn numeric_series(view: &RecordView, column: &str) -> Vec<f64> {
    view.column_cells(column)
        .map(|cells| {
            cells
                .filter_map(|cell| match cell {
                    CellValue::Number(n) => Some(*n),
                    _ => None,
                })
                .collect()
        })
        .unwrap_or_default()
}

/// All unordered pairs of the given numeric columns as index pairs.
pub fn column_pairs(columns: &[String]) -> Vec<(usize, usize)> {
    let mut pairs = Vec::new();
    for i in 0..columns.len() {
        for j in (i + 1)..columns.len() {
            pairs.push((i, j));
        }
    }
    pairs
}

/// Correlate one pair of numeric series.
///
/// The two sequences are prefix-aligned: both are truncated to the shorter
/// length before the coefficient is computed. Pairs with fewer than three
/// observations or an undefined coefficient are dropped.
pub fn correlate_pair(
    name_a: &str,
    series_a: &[f64],
    name_b: &str,
    series_b: &[f64],
) -> Option<CorrelationPair> {
    let n = series_a.len().min(series_b.len());
    if n < MIN_SAMPLE_SIZE {
        return None;
    }

    let r = pearson(&series_a[..n], &series_b[..n]);
    if r.is_nan() {
        return None;
    }
    let r = r.clamp(-1.0, 1.0);

    Some(CorrelationPair {
        column_a: name_a.to_string(),
        column_b: name_b.to_string(),
        r,
        strength: r.abs(),
        sample_size: n,
    })
}

/// Pearson product-moment coefficient over equal-length slices.
///
/// Returns NaN when either series has zero spread.
fn pearson(xs: &[f64], ys: &[f64]) -> f64 {
    let n = xs.len() as f64;
    let mean_x = xs.iter().sum::<f64>() / n;
    let mean_y = ys.iter().sum::<f64>() / n;

    let mut cov = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for (&x, &y) in xs.iter().zip(ys) {
        let dx = x - mean_x;
        let dy = y - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }

    cov / (var_x.sqrt() * var_y.sqrt())
}

/// Extract the numeric series of every listed column once, in column order.
pub fn extract_series(view: &RecordView, columns: &[String]) -> Vec<Vec<f64>> {
    columns.iter().map(|c| numeric_series(view, c)).collect()
}

/// Compute correlations over a range of the unordered pair list. Used both
/// sequentially (full range) and as the worker-pool chunk function (pair
/// sub-ranges) against series extracted once up front.
pub fn correlate_range(
    columns: &[String],
    series: &[Vec<f64>],
    pairs: &[(usize, usize)],
) -> Vec<CorrelationPair> {
    pairs
        .iter()
        .filter_map(|&(i, j)| {
            correlate_pair(&columns[i], &series[i], &columns[j], &series[j])
        })
        .collect()
}

/// Combiner for sharded correlation work: concatenate partial pair lists,
/// then rebuild the sorted partitions.
pub fn merge_correlation_chunks(parts: Vec<Vec<CorrelationPair>>) -> CorrelationSet {
    CorrelationSet::from_pairs(parts.into_iter().flatten().collect())
}

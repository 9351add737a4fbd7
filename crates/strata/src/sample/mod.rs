//! Sampling service: representative reduction of oversized record views.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::input::{CellValue, RecordView};
use crate::rng::SeededRng;

/// Rows inspected when choosing a stratification column.
const STRATIFY_SCAN_ROWS: usize = 100;
/// Acceptable unique-count range for a stratification column.
const STRATIFY_UNIQUE_MIN: usize = 2;
const STRATIFY_UNIQUE_MAX: usize = 20;
/// Maximum tolerated null ratio for a stratification column.
const STRATIFY_MAX_NULL_RATIO: f64 = 0.2;
/// Target unique/non-null ratio for the preferred column.
const STRATIFY_TARGET_RATIO: f64 = 0.2;

/// Metadata describing how a sample was produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SampleMetadata {
    pub is_sampled: bool,
    pub original_size: usize,
    pub sample_size: usize,
    pub sampling_rate: f64,
    pub stratified: bool,
    /// Column whose distribution was preserved, when stratified.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preserved_distribution: Option<String>,
}

impl SampleMetadata {
    fn unsampled(size: usize) -> Self {
        Self {
            is_sampled: false,
            original_size: size,
            sample_size: size,
            sampling_rate: if size == 0 { 0.0 } else { 1.0 },
            stratified: false,
            preserved_distribution: None,
        }
    }
}

/// Produce a reduced record view when the input exceeds `max_sample_size`.
///
/// When `stratify` is set and a suitable low-cardinality column exists, rows
/// are drawn per partition of that column's values so the partition
/// distribution survives the reduction; every non-empty partition keeps at
/// least one row. Otherwise each row is included with probability
/// `max_sample_size / N` using the seeded generator.
pub fn create_sample(
    view: &RecordView,
    max_sample_size: usize,
    stratify: bool,
    seed: u32,
) -> (RecordView, SampleMetadata) {
    let n = view.len();

    if n <= max_sample_size {
        return (view.clone(), SampleMetadata::unsampled(n));
    }

    let rate = max_sample_size as f64 / n as f64;
    let mut rng = SeededRng::new(seed);

    let strat_column = if stratify {
        choose_stratification_column(view)
    } else {
        None
    };

    let indices = match &strat_column {
        Some(column) => stratified_indices(view, column, rate, &mut rng),
        None => bernoulli_indices(n, rate, &mut rng),
    };

    let sampled = view.subset(&indices);
    let metadata = SampleMetadata {
        is_sampled: true,
        original_size: n,
        sample_size: sampled.len(),
        sampling_rate: rate,
        stratified: strat_column.is_some(),
        preserved_distribution: strat_column,
    };

    (sampled, metadata)
}

/// Bernoulli inclusion of each row with probability `rate`.
fn bernoulli_indices(n: usize, rate: f64, rng: &mut SeededRng) -> Vec<usize> {
    (0..n).filter(|_| rng.next_f64() < rate).collect()
}

/// Per-partition draws with the same rate, at least one row per partition.
/// Returned indices are ascending so original row order is preserved.
fn stratified_indices(
    view: &RecordView,
    column: &str,
    rate: f64,
    rng: &mut SeededRng,
) -> Vec<usize> {
    let mut partitions: IndexMap<String, Vec<usize>> = IndexMap::new();
    if let Some(cells) = view.column_cells(column) {
        for (i, cell) in cells.enumerate() {
            partitions.entry(cell.canonical()).or_default().push(i);
        }
    }

    let mut selected = Vec::new();
    for indices in partitions.values() {
        let drawn: Vec<usize> = indices
            .iter()
            .copied()
            .filter(|_| rng.next_f64() < rate)
            .collect();
        if drawn.is_empty() {
            selected.push(indices[rng.next_index(indices.len())]);
        } else {
            selected.extend(drawn);
        }
    }

    selected.sort_unstable();
    selected
}

/// Pick the column whose distribution sampling should preserve.
///
/// Scans the first 100 rows for columns with unique count in [2, 20] and a
/// null ratio under 0.2, preferring the candidate whose unique/non-null
/// ratio is closest to 0.2.
pub fn choose_stratification_column(view: &RecordView) -> Option<String> {
    let scan = view.len().min(STRATIFY_SCAN_ROWS);
    if scan == 0 {
        return None;
    }

    let mut best: Option<(String, f64)> = None;

    for column in view.columns() {
        let cells = view.column_cells(column)?;
        let mut seen = std::collections::HashSet::new();
        let mut nulls = 0usize;
        let mut non_null = 0usize;

        for cell in cells.take(scan) {
            match cell {
                CellValue::Null => nulls += 1,
                other => {
                    non_null += 1;
                    seen.insert(other.canonical());
                }
            }
        }

        let unique = seen.len();
        let null_ratio = nulls as f64 / scan as f64;
        if !(STRATIFY_UNIQUE_MIN..=STRATIFY_UNIQUE_MAX).contains(&unique)
            || null_ratio >= STRATIFY_MAX_NULL_RATIO
            || non_null == 0
        {
            continue;
        }

        let unique_ratio = unique as f64 / non_null as f64;
        let distance = (unique_ratio - STRATIFY_TARGET_RATIO).abs();
        match &best {
            Some((_, best_distance)) if *best_distance <= distance => {}
            _ => best = Some((column.clone(), distance)),
        }
    }

    best.map(|(column, _)| column)
}

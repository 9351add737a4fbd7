//! Profiling engine: per-column statistics, correlations, and insights.

mod correlation;
mod insight;
mod stats;
mod types;

pub use correlation::{
    column_pairs, correlate_pair, correlate_range, extract_series, merge_correlation_chunks,
    numeric_series,
};
pub use insight::derive_insights;
pub use stats::profile_column;
pub use types::{
    sort_by_severity, CategoricalStats, ColumnStats, ColumnType, CorrelationPair,
    CorrelationSet, Insight, InsightKind, NumericStats, ProcessingTime, ProfileReport,
    ReportSummary, Severity, Throughput, TopValue,
};

use indexmap::IndexMap;

use crate::error::Result;
use crate::input::RecordView;
use crate::pool::{self, PoolOptions};

/// Column count above which per-column profiling goes through the pool.
const PARALLEL_COLUMN_THRESHOLD: usize = 8;
/// Numeric-pair count above which correlation work is sharded.
const PARALLEL_PAIR_THRESHOLD: usize = 64;

/// Combiner for pooled column profiling: key-union of disjoint chunk maps.
pub fn merge_column_chunks(
    parts: Vec<IndexMap<String, ColumnStats>>,
) -> IndexMap<String, ColumnStats> {
    pool::merge_maps(parts)
}

/// Drives profiling of a record view, optionally fanning per-column work
/// out through the worker pool. Parallel and sequential execution produce
/// identical reports.
#[derive(Debug, Clone)]
pub struct Profiler {
    pool: PoolOptions,
}

impl Profiler {
    pub fn new() -> Self {
        Self {
            pool: PoolOptions::default(),
        }
    }

    pub fn with_pool_options(pool: PoolOptions) -> Self {
        Self { pool }
    }

    /// Profile every column, correlate numeric columns, derive insights.
    ///
    /// The summary's processing/throughput sections are zeroed here; the
    /// orchestrator owns the timers and fills them in.
    pub fn profile(&self, view: &RecordView) -> Result<ProfileReport> {
        let column_stats = self.profile_columns(view)?;
        let correlations = self.correlate(view, &column_stats)?;
        let insights = derive_insights(&column_stats, &correlations);

        let numeric_columns = column_stats
            .values()
            .filter(|s| s.column_type == ColumnType::Numeric)
            .count();
        let categorical_columns = column_stats
            .values()
            .filter(|s| s.column_type == ColumnType::Categorical)
            .count();
        let total_missing_values = column_stats.values().map(|s| s.missing_count).sum();

        Ok(ProfileReport {
            summary: ReportSummary {
                total_rows: view.len(),
                total_columns: view.column_count(),
                numeric_columns,
                categorical_columns,
                total_missing_values,
                processing: ProcessingTime::default(),
                throughput: Throughput::default(),
            },
            column_stats,
            correlations,
            insights,
        })
    }

    fn profile_columns(&self, view: &RecordView) -> Result<IndexMap<String, ColumnStats>> {
        let columns = view.columns();

        let profile_chunk = |chunk: &[String]| -> Result<IndexMap<String, ColumnStats>> {
            let mut map = IndexMap::new();
            for column in chunk {
                // A failing column is recorded, never fatal.
                let stats = profile_column(view, column)
                    .unwrap_or_else(|e| ColumnStats::unknown(e.to_string()));
                map.insert(column.clone(), stats);
            }
            Ok(map)
        };

        if columns.len() > PARALLEL_COLUMN_THRESHOLD {
            let opts = PoolOptions {
                chunk_size: columns.len().div_ceil(self.pool.max_workers).max(1),
                task_name: "profile_columns",
                ..self.pool.clone()
            };
            let owned: Vec<String> = columns.to_vec();
            let merged =
                pool::process_in_parallel(&owned, profile_chunk, merge_column_chunks, &opts)?;
            // Chunk maps come back in chunk order, so column order survives.
            Ok(merged)
        } else {
            profile_chunk(columns)
        }
    }

    fn correlate(
        &self,
        view: &RecordView,
        column_stats: &IndexMap<String, ColumnStats>,
    ) -> Result<CorrelationSet> {
        let numeric_columns: Vec<String> = column_stats
            .iter()
            .filter(|(_, s)| s.column_type == ColumnType::Numeric)
            .map(|(name, _)| name.clone())
            .collect();

        let pairs = column_pairs(&numeric_columns);
        if pairs.is_empty() {
            return Ok(CorrelationSet::default());
        }

        let series = extract_series(view, &numeric_columns);

        if pairs.len() > PARALLEL_PAIR_THRESHOLD {
            let opts = PoolOptions {
                chunk_size: pairs.len().div_ceil(self.pool.max_workers).max(1),
                task_name: "calculate_correlations",
                ..self.pool.clone()
            };
            pool::process_in_parallel(
                &pairs,
                |chunk| Ok(correlate_range(&numeric_columns, &series, chunk)),
                merge_correlation_chunks,
                &opts,
            )
        } else {
            Ok(CorrelationSet::from_pairs(correlate_range(
                &numeric_columns,
                &series,
                &pairs,
            )))
        }
    }
}

impl Default for Profiler {
    fn default() -> Self {
        Self::new()
    }
}

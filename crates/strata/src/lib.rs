//! strata: server-side profiling engine for tabular data.
//!
//! strata ingests a delimited text document, infers a type for every column,
//! computes descriptive statistics, pairwise Pearson correlations, and
//! rule-derived insights, and returns a structured report. Reports can be
//! diffed against each other, cached by content fingerprint, and computed
//! over a representative sample when the input is large.
//!
//! # Basic Example
//!
//! ```
//! use strata::{Engine, ProfileOptions};
//!
//! let engine = Engine::new();
//! let outcome = engine
//!     .profile_csv("x,y\n1,2\n2,4\n3,6\n4,8\n", &ProfileOptions::default())
//!     .unwrap();
//!
//! println!("columns: {}", outcome.report.summary.total_columns);
//! println!("insights: {}", outcome.report.insights.len());
//! ```
//!
//! # With a Result Cache
//!
//! ```no_run
//! use strata::{Engine, EngineConfig, ProfileOptions};
//!
//! let engine = Engine::with_config(EngineConfig {
//!     cache_dir: Some(".strata-cache".into()),
//!     ..EngineConfig::default()
//! })
//! .unwrap();
//!
//! let outcome = engine
//!     .profile_csv("x,y\n1,2\n2,4\n3,6\n", &ProfileOptions::default())
//!     .unwrap();
//! assert_eq!(outcome.stored, Some(true));
//! ```
//!
//! # Comparing Two Datasets
//!
//! ```
//! use strata::{compare_reports, Engine, ProfileOptions};
//!
//! let engine = Engine::new();
//! let options = ProfileOptions::default();
//! let before = engine.profile_csv("v\n1\n2\n3\n4\n", &options).unwrap();
//! let after = engine.profile_csv("v\n1\n2\n90\n91\n", &options).unwrap();
//!
//! let diff = compare_reports(&before.report, &after.report);
//! println!("changed columns: {}", diff.column_changes.len());
//! ```

pub mod cache;
pub mod compare;
pub mod error;
pub mod input;
pub mod pool;
pub mod profile;
pub mod rng;
pub mod sample;

mod engine;

pub use cache::{fingerprint, CacheEntry, CanonicalOptions, ResultCache};
pub use compare::{compare_reports, ComparisonReport};
pub use engine::{Engine, EngineConfig, ProfileOptions, ProfileOutcome, MAX_CSV_BYTES, MIN_CSV_BYTES};
pub use error::{Result, StrataError};
pub use input::{CellValue, CsvParser, ParserConfig, RecordView};
pub use profile::{
    ColumnStats, ColumnType, CorrelationPair, CorrelationSet, Insight, InsightKind,
    ProfileReport, Profiler, Severity,
};
pub use rng::SeededRng;
pub use sample::{create_sample, SampleMetadata};

//! Request orchestrator: wires parsing, sampling, caching, and profiling
//! together for one request.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use crate::cache::{fingerprint, CanonicalOptions, ResultCache};
use crate::error::{Result, StrataError};
use crate::input::{CsvParser, ParserConfig, RecordView};
use crate::pool::PoolOptions;
use crate::profile::{ProcessingTime, ProfileReport, Profiler, Throughput};
use crate::sample::{create_sample, SampleMetadata};

/// Smallest accepted document, in bytes.
pub const MIN_CSV_BYTES: usize = 10;
/// Largest accepted document: 50 MiB.
pub const MAX_CSV_BYTES: usize = 50 * 1024 * 1024;

/// Per-request options, mirroring the profile endpoint's option object.
#[derive(Debug, Clone)]
pub struct ProfileOptions {
    /// Field delimiter; None selects auto-detection.
    pub delimiter: Option<char>,
    pub skip_empty_lines: bool,
    pub enable_sampling: bool,
    /// Row count above which sampling kicks in, and the target sample size.
    pub sample_size: usize,
    /// Disables sampling regardless of input size.
    pub full_analysis: bool,
    pub use_cache: bool,
}

impl Default for ProfileOptions {
    fn default() -> Self {
        Self {
            delimiter: None,
            skip_empty_lines: true,
            enable_sampling: true,
            sample_size: 5000,
            full_analysis: false,
            use_cache: true,
        }
    }
}

impl ProfileOptions {
    /// The result-affecting subset that addresses the cache.
    fn canonical(&self) -> CanonicalOptions {
        CanonicalOptions {
            delimiter: self
                .delimiter
                .map(|d| d.to_string())
                .unwrap_or_else(|| "auto".to_string()),
            skip_empty_lines: self.skip_empty_lines,
        }
    }
}

/// Engine configuration.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Cache directory; None disables caching entirely.
    pub cache_dir: Option<PathBuf>,
    /// Seed for the sampling generator.
    pub sample_seed: u32,
    /// Worker-pool settings used by the profiler.
    pub pool: PoolOptions,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            cache_dir: None,
            sample_seed: 42,
            pool: PoolOptions::default(),
        }
    }
}

/// Result of one profiling request.
#[derive(Debug, Clone)]
pub struct ProfileOutcome {
    pub report: ProfileReport,
    pub from_cache: bool,
    /// Whether the report landed in the cache; None when caching was not
    /// active for this request.
    pub stored: Option<bool>,
    /// Rows the CSV layer rejected and skipped.
    pub parse_errors: usize,
    /// Present when the input was reduced before profiling.
    pub sampling: Option<SampleMetadata>,
}

/// The profiling engine front door.
pub struct Engine {
    config: EngineConfig,
    profiler: Profiler,
    cache: Option<Arc<ResultCache>>,
}

impl Engine {
    /// Engine with default configuration and no cache.
    pub fn new() -> Self {
        Self {
            config: EngineConfig::default(),
            profiler: Profiler::new(),
            cache: None,
        }
    }

    /// Engine from explicit configuration; opens the cache when a directory
    /// is configured.
    pub fn with_config(config: EngineConfig) -> Result<Self> {
        let cache = match &config.cache_dir {
            Some(dir) => Some(Arc::new(ResultCache::open(dir)?)),
            None => None,
        };
        let profiler = Profiler::with_pool_options(config.pool.clone());
        Ok(Self {
            config,
            profiler,
            cache,
        })
    }

    /// The cache handle, when caching is enabled.
    pub fn cache(&self) -> Option<&Arc<ResultCache>> {
        self.cache.as_ref()
    }

    /// Profile a raw delimited document.
    pub fn profile_csv(&self, csv: &str, options: &ProfileOptions) -> Result<ProfileOutcome> {
        validate_payload(csv)?;

        let started = Instant::now();
        let canonical = options.canonical();

        let cache_key = if options.use_cache && self.cache.is_some() {
            Some(fingerprint(csv, &canonical))
        } else {
            None
        };

        if let (Some(key), Some(cache)) = (&cache_key, &self.cache) {
            if let Some(report) = cache.lookup(key) {
                tracing::debug!(fingerprint = %key, "cache hit");
                return Ok(ProfileOutcome {
                    report,
                    from_cache: true,
                    stored: None,
                    parse_errors: 0,
                    sampling: None,
                });
            }
        }

        let parser = CsvParser::with_config(ParserConfig {
            delimiter: match options.delimiter {
                Some(d) if d.is_ascii() => Some(d as u8),
                Some(d) => {
                    return Err(StrataError::InvalidDelimiter(format!(
                        "'{}' is not a single-byte delimiter",
                        d
                    )))
                }
                None => None,
            },
            skip_empty_lines: options.skip_empty_lines,
            ..ParserConfig::default()
        });
        let parsed = parser.parse_str(csv)?;
        let parse_ms = started.elapsed().as_millis() as u64;

        let (view, sampling) = if options.enable_sampling
            && !options.full_analysis
            && parsed.view.len() > options.sample_size
        {
            let (sampled, metadata) = create_sample(
                &parsed.view,
                options.sample_size,
                true,
                self.config.sample_seed,
            );
            (sampled, Some(metadata))
        } else {
            (parsed.view, None)
        };

        let profile_started = Instant::now();
        let mut report = self.profiler.profile(&view)?;
        let profile_ms = profile_started.elapsed().as_millis() as u64;
        let total_ms = started.elapsed().as_millis() as u64;

        report.summary.processing = ProcessingTime {
            total_ms,
            parse_ms,
            profile_ms,
        };
        report.summary.throughput = Throughput::from_counts(
            report.summary.total_rows,
            report.summary.total_columns,
            total_ms,
        );

        // Sampled analyses are semantically different from the full input,
        // so only full results are cacheable.
        let stored = match (&cache_key, &self.cache, &sampling) {
            (Some(key), Some(cache), None) => Some(cache.store(key, &report)),
            _ => None,
        };

        Ok(ProfileOutcome {
            report,
            from_cache: false,
            stored,
            parse_errors: parsed.parse_errors,
            sampling,
        })
    }

    /// Profile an already-parsed record view, with timing filled in. Used
    /// by the comparison flow, which receives record arrays directly.
    pub fn profile_view(&self, view: &RecordView) -> Result<ProfileReport> {
        if view.is_empty() {
            return Err(StrataError::EmptyData("no records to profile".to_string()));
        }
        let started = Instant::now();
        let mut report = self.profiler.profile(view)?;
        let total_ms = started.elapsed().as_millis() as u64;
        report.summary.processing = ProcessingTime {
            total_ms,
            parse_ms: 0,
            profile_ms: total_ms,
        };
        report.summary.throughput = Throughput::from_counts(
            report.summary.total_rows,
            report.summary.total_columns,
            total_ms,
        );
        Ok(report)
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

/// Presence and size bounds for a raw document.
fn validate_payload(csv: &str) -> Result<()> {
    if csv.len() < MIN_CSV_BYTES {
        return Err(StrataError::Validation(format!(
            "CSV data too short: {} bytes (minimum {})",
            csv.len(),
            MIN_CSV_BYTES
        )));
    }
    if csv.len() > MAX_CSV_BYTES {
        return Err(StrataError::Validation(format!(
            "CSV data too large: {} bytes (maximum {})",
            csv.len(),
            MAX_CSV_BYTES
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const SMALL_CSV: &str = "a,b\n1,x\n2,y\n3,x\n4,y\n5,x\n";

    #[test]
    fn test_validation_bounds() {
        let engine = Engine::new();
        let options = ProfileOptions::default();

        assert!(matches!(
            engine.profile_csv("a,b\n1,2", &options),
            Err(StrataError::Validation(_))
        ));

        // At the boundary: exactly MIN_CSV_BYTES passes validation.
        let at_min = "a,b\n1,2\n9,";
        assert_eq!(at_min.len(), MIN_CSV_BYTES);
        assert!(engine.profile_csv(at_min, &options).is_ok());
    }

    #[test]
    fn test_profile_without_cache() {
        let engine = Engine::new();
        let outcome = engine
            .profile_csv(SMALL_CSV, &ProfileOptions::default())
            .unwrap();

        assert!(!outcome.from_cache);
        assert_eq!(outcome.stored, None);
        assert_eq!(outcome.report.summary.total_rows, 5);
        assert_eq!(outcome.report.summary.numeric_columns, 1);
        assert_eq!(outcome.report.summary.categorical_columns, 1);
    }

    #[test]
    fn test_cache_round_trip() {
        let dir = TempDir::new().unwrap();
        let engine = Engine::with_config(EngineConfig {
            cache_dir: Some(dir.path().to_path_buf()),
            ..EngineConfig::default()
        })
        .unwrap();
        let options = ProfileOptions::default();

        let first = engine.profile_csv(SMALL_CSV, &options).unwrap();
        assert!(!first.from_cache);
        assert_eq!(first.stored, Some(true));

        let second = engine.profile_csv(SMALL_CSV, &options).unwrap();
        assert!(second.from_cache);
        assert_eq!(second.report.column_stats, first.report.column_stats);
        assert_eq!(second.report.summary.total_rows, first.report.summary.total_rows);
    }

    #[test]
    fn test_use_cache_false_skips_cache() {
        let dir = TempDir::new().unwrap();
        let engine = Engine::with_config(EngineConfig {
            cache_dir: Some(dir.path().to_path_buf()),
            ..EngineConfig::default()
        })
        .unwrap();
        let options = ProfileOptions {
            use_cache: false,
            ..ProfileOptions::default()
        };

        let outcome = engine.profile_csv(SMALL_CSV, &options).unwrap();
        assert_eq!(outcome.stored, None);
        assert!(engine.cache().unwrap().is_empty());
    }

    #[test]
    fn test_sampled_analysis_not_cached() {
        let dir = TempDir::new().unwrap();
        let engine = Engine::with_config(EngineConfig {
            cache_dir: Some(dir.path().to_path_buf()),
            ..EngineConfig::default()
        })
        .unwrap();

        let mut csv = String::from("a,b\n");
        for i in 0..200 {
            csv.push_str(&format!("{},{}\n", i, i % 3));
        }
        let options = ProfileOptions {
            sample_size: 50,
            ..ProfileOptions::default()
        };

        let outcome = engine.profile_csv(&csv, &options).unwrap();
        let sampling = outcome.sampling.unwrap();
        assert!(sampling.is_sampled);
        assert_eq!(sampling.original_size, 200);
        assert_eq!(outcome.stored, None);
        assert!(engine.cache().unwrap().is_empty());
    }

    #[test]
    fn test_full_analysis_disables_sampling() {
        let engine = Engine::new();
        let mut csv = String::from("a\n");
        for i in 0..200 {
            csv.push_str(&format!("{}\n", i));
        }
        let options = ProfileOptions {
            sample_size: 50,
            full_analysis: true,
            ..ProfileOptions::default()
        };

        let outcome = engine.profile_csv(&csv, &options).unwrap();
        assert!(outcome.sampling.is_none());
        assert_eq!(outcome.report.summary.total_rows, 200);
    }

    #[test]
    fn test_non_ascii_delimiter_rejected() {
        let engine = Engine::new();
        let options = ProfileOptions {
            delimiter: Some('§'),
            ..ProfileOptions::default()
        };
        assert!(matches!(
            engine.profile_csv(SMALL_CSV, &options),
            Err(StrataError::InvalidDelimiter(_))
        ));
    }

    #[test]
    fn test_empty_view_fails_before_profiling() {
        let engine = Engine::new();
        assert!(matches!(
            engine.profile_csv("a,b,c,d,e,f\n", &ProfileOptions::default()),
            Err(StrataError::EmptyData(_))
        ));
    }
}

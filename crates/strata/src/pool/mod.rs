//! Bounded-parallelism worker pool for per-chunk work over a shared input.
//!
//! The pool splits a work list into contiguous chunks, dispatches them FIFO
//! to at most `max_workers` threads, and combines the partial results after
//! all chunks succeed. A single deadline covers the whole operation; the
//! first chunk error or a deadline expiry raises a shared cancellation flag
//! that every worker checks at chunk boundaries. Partial results received
//! before a failure are discarded.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::mpsc;
use std::time::{Duration, Instant};

use indexmap::IndexMap;

use crate::error::{Result, StrataError};

/// Options controlling one parallel operation.
#[derive(Debug, Clone)]
pub struct PoolOptions {
    /// Maximum concurrent workers.
    pub max_workers: usize,
    /// Items per chunk (last chunk may be smaller).
    pub chunk_size: usize,
    /// Deadline for the whole operation.
    pub timeout: Duration,
    /// Label used in error messages and logs.
    pub task_name: &'static str,
}

impl Default for PoolOptions {
    fn default() -> Self {
        Self {
            max_workers: default_worker_count(),
            chunk_size: 32,
            timeout: Duration::from_secs(30),
            task_name: "task",
        }
    }
}

/// One less than the CPU count, at least one.
pub fn default_worker_count() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get().saturating_sub(1))
        .unwrap_or(1)
        .max(1)
}

/// Run `chunk_fn` over contiguous chunks of `items` in parallel and combine
/// the partial results.
///
/// `chunk_fn` must be pure with respect to shared state: partials flow back
/// by value and `combine` is the single merge point. Chunk results are
/// re-ordered by chunk index before combining, so the outcome does not
/// depend on completion order.
pub fn process_in_parallel<T, R, O, F, C>(
    items: &[T],
    chunk_fn: F,
    combine: C,
    options: &PoolOptions,
) -> Result<O>
where
    T: Sync,
    R: Send,
    F: Fn(&[T]) -> Result<R> + Sync,
    C: FnOnce(Vec<R>) -> O,
{
    let chunks: Vec<&[T]> = items.chunks(options.chunk_size.max(1)).collect();
    let total = chunks.len();

    if total == 0 {
        return Ok(combine(Vec::new()));
    }

    // Small inputs skip thread setup entirely; semantics are identical.
    if total == 1 || options.max_workers <= 1 {
        let deadline = Instant::now() + options.timeout;
        let mut partials = Vec::with_capacity(total);
        for &chunk in &chunks {
            if Instant::now() >= deadline {
                return Err(StrataError::Timeout(format!(
                    "{} exceeded {:?}",
                    options.task_name, options.timeout
                )));
            }
            partials.push(chunk_fn(chunk)?);
        }
        return Ok(combine(partials));
    }

    let workers = options.max_workers.min(total);
    let next_chunk = AtomicUsize::new(0);
    let cancelled = AtomicBool::new(false);
    let (tx, rx) = mpsc::channel::<(usize, Result<R>)>();
    let deadline = Instant::now() + options.timeout;

    tracing::debug!(
        task = options.task_name,
        chunks = total,
        workers,
        "dispatching parallel work"
    );

    let outcome = std::thread::scope(|scope| {
        for _ in 0..workers {
            let tx = tx.clone();
            let next_chunk = &next_chunk;
            let cancelled = &cancelled;
            let chunks = &chunks;
            let chunk_fn = &chunk_fn;
            scope.spawn(move || {
                loop {
                    if cancelled.load(Ordering::Relaxed) {
                        break;
                    }
                    let idx = next_chunk.fetch_add(1, Ordering::Relaxed);
                    if idx >= chunks.len() {
                        break;
                    }
                    let result = chunk_fn(chunks[idx]);
                    if result.is_err() {
                        cancelled.store(true, Ordering::Relaxed);
                    }
                    // The receiver hangs up on failure; sends may then fail.
                    if tx.send((idx, result)).is_err() {
                        break;
                    }
                }
            });
        }
        drop(tx);

        let mut slots: Vec<Option<R>> = (0..total).map(|_| None).collect();
        let mut received = 0usize;

        while received < total {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                cancelled.store(true, Ordering::Relaxed);
                return Err(StrataError::Timeout(format!(
                    "{} exceeded {:?}",
                    options.task_name, options.timeout
                )));
            }
            match rx.recv_timeout(remaining) {
                Ok((idx, Ok(partial))) => {
                    slots[idx] = Some(partial);
                    received += 1;
                }
                Ok((_, Err(e))) => {
                    cancelled.store(true, Ordering::Relaxed);
                    return Err(e);
                }
                Err(mpsc::RecvTimeoutError::Timeout) => {
                    cancelled.store(true, Ordering::Relaxed);
                    return Err(StrataError::Timeout(format!(
                        "{} exceeded {:?}",
                        options.task_name, options.timeout
                    )));
                }
                Err(mpsc::RecvTimeoutError::Disconnected) => {
                    return Err(StrataError::Worker(format!(
                        "{} workers exited early",
                        options.task_name
                    )));
                }
            }
        }

        Ok(slots.into_iter().map(|s| s.expect("all chunks received")).collect::<Vec<R>>())
    })?;

    Ok(combine(outcome))
}

/// Default combiner: list concatenation in chunk order.
pub fn concat<T>(parts: Vec<Vec<T>>) -> Vec<T> {
    parts.into_iter().flatten().collect()
}

/// Default combiner: key-union map merge. Chunks covering disjoint keys
/// never collide; on a collision the later chunk wins.
pub fn merge_maps<K, V>(parts: Vec<IndexMap<K, V>>) -> IndexMap<K, V>
where
    K: std::hash::Hash + Eq,
{
    let mut merged = IndexMap::new();
    for part in parts {
        merged.extend(part);
    }
    merged
}

/// Default combiner for scalar partials: keep the last chunk's value.
pub fn last_value<T>(parts: Vec<T>) -> Option<T> {
    parts.into_iter().last()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicU32;

    fn options(chunk_size: usize) -> PoolOptions {
        PoolOptions {
            max_workers: 4,
            chunk_size,
            timeout: Duration::from_secs(5),
            task_name: "test",
        }
    }

    #[test]
    fn test_combines_in_chunk_order() {
        let items: Vec<u32> = (0..100).collect();
        let result = process_in_parallel(
            &items,
            |chunk| Ok(chunk.to_vec()),
            concat,
            &options(7),
        )
        .unwrap();
        assert_eq!(result, items);
    }

    #[test]
    fn test_empty_items() {
        let items: Vec<u32> = Vec::new();
        let result =
            process_in_parallel(&items, |chunk| Ok(chunk.to_vec()), concat, &options(8));
        assert_eq!(result.unwrap(), Vec::<u32>::new());
    }

    #[test]
    fn test_error_short_circuits() {
        let items: Vec<u32> = (0..64).collect();
        let calls = AtomicU32::new(0);
        let result = process_in_parallel(
            &items,
            |chunk| {
                calls.fetch_add(1, Ordering::Relaxed);
                if chunk.contains(&13) {
                    Err(StrataError::Worker("boom".to_string()))
                } else {
                    std::thread::sleep(Duration::from_millis(5));
                    Ok(chunk.to_vec())
                }
            },
            concat,
            &options(4),
        );
        assert!(matches!(result, Err(StrataError::Worker(_))));
        // Cancellation stops remaining chunks from being dispatched.
        assert!(calls.load(Ordering::Relaxed) < 16);
    }

    #[test]
    fn test_timeout() {
        let items: Vec<u32> = (0..16).collect();
        let opts = PoolOptions {
            max_workers: 2,
            chunk_size: 1,
            timeout: Duration::from_millis(40),
            task_name: "slow",
        };
        let result = process_in_parallel(
            &items,
            |chunk| {
                std::thread::sleep(Duration::from_millis(30));
                Ok(chunk.to_vec())
            },
            concat,
            &opts,
        );
        assert!(matches!(result, Err(StrataError::Timeout(_))));
    }

    #[test]
    fn test_last_value() {
        assert_eq!(last_value(vec![1, 2, 3]), Some(3));
        assert_eq!(last_value(Vec::<u32>::new()), None);
    }

    #[test]
    fn test_merge_maps_disjoint() {
        let mut a = IndexMap::new();
        a.insert("x", 1);
        let mut b = IndexMap::new();
        b.insert("y", 2);
        let merged = merge_maps(vec![a, b]);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged["y"], 2);
    }

    #[test]
    fn test_single_chunk_sequential_path() {
        let items: Vec<u32> = (0..10).collect();
        let result: u32 = process_in_parallel(
            &items,
            |chunk| Ok(chunk.iter().sum::<u32>()),
            |parts: Vec<u32>| parts.into_iter().sum(),
            &options(100),
        )
        .unwrap();
        assert_eq!(result, 45);
    }
}

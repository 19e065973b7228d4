//! Parallel execution of pipeline operations over snapshots.
//!
//! This module sits "above" [`crate::processing`] and provides:
//!
//! - Chunked parallel filter/map whose output order equals the sequential order
//! - Parallel reduce, group-by and summary statistics that merge per-chunk partials in chunk
//!   order with an associative combine
//! - Resource limits / throttling (in-flight chunks)
//! - Real-time metrics + observer hooks for monitoring

mod observer;
mod semaphore;

use std::collections::HashMap;
use std::hash::Hash;
use std::ops::Range;
use std::sync::Arc;
use std::time::Instant;

use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};

use crate::error::{QueryError, QueryResult};
use crate::predicate::Predicate;
use crate::processing::{Reducer, SummaryStatistics};

pub use observer::{
    ExecutionEvent, ExecutionMetrics, ExecutionMetricsSnapshot, ExecutionObserver,
    StdErrExecutionObserver,
};

use semaphore::Semaphore;

/// Configuration for the [`ExecutionEngine`].
#[derive(Debug, Clone)]
pub struct ExecutionOptions {
    /// Number of worker threads used by the engine.
    ///
    /// If `None`, uses the platform's available parallelism.
    pub num_threads: Option<usize>,
    /// Number of items per chunk.
    pub chunk_size: usize,
    /// Upper bound on concurrently executing chunks.
    ///
    /// This is an additional throttle on top of `num_threads`.
    pub max_in_flight_chunks: usize,
}

impl Default for ExecutionOptions {
    fn default() -> Self {
        let n = available_threads();
        Self {
            num_threads: Some(n),
            chunk_size: 4_096,
            max_in_flight_chunks: n,
        }
    }
}

fn available_threads() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

/// A configurable parallel engine for snapshot pipelines.
pub struct ExecutionEngine {
    pool: ThreadPool,
    opts: ExecutionOptions,
    observer: Option<Arc<dyn ExecutionObserver>>,
    metrics: Arc<ExecutionMetrics>,
}

impl ExecutionEngine {
    /// Create a new engine with the given options.
    ///
    /// Fails with [`QueryError::InvalidArgument`] if `chunk_size == 0`,
    /// `max_in_flight_chunks == 0`, or `num_threads == Some(0)`.
    pub fn new(opts: ExecutionOptions) -> QueryResult<Self> {
        if opts.chunk_size == 0 {
            return Err(QueryError::invalid("chunk_size must be > 0"));
        }
        if opts.max_in_flight_chunks == 0 {
            return Err(QueryError::invalid("max_in_flight_chunks must be > 0"));
        }
        if opts.num_threads == Some(0) {
            return Err(QueryError::invalid("num_threads must be > 0 when set"));
        }

        let pool = ThreadPoolBuilder::new()
            .num_threads(opts.num_threads.unwrap_or_else(available_threads))
            .build()?;

        Ok(Self {
            pool,
            opts,
            observer: None,
            metrics: Arc::new(ExecutionMetrics::new()),
        })
    }

    /// Attach an observer for execution events (metrics/logging).
    pub fn with_observer(mut self, observer: Arc<dyn ExecutionObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Get a handle to real-time execution metrics.
    pub fn metrics(&self) -> Arc<ExecutionMetrics> {
        Arc::clone(&self.metrics)
    }

    /// Parallel [`crate::processing::filter`]; output order equals input order.
    pub fn filter_parallel<T>(&self, items: &[T], predicate: &Predicate<T>) -> Vec<T>
    where
        T: Clone + Send + Sync + 'static,
    {
        self.run_chunks("filter", items, |chunk| {
            chunk
                .iter()
                .filter(|item| predicate.test(item))
                .cloned()
                .collect::<Vec<_>>()
        })
        .into_iter()
        .flatten()
        .collect()
    }

    /// Parallel [`crate::processing::map`]; output order equals input order.
    pub fn map_parallel<T, U, F>(&self, items: &[T], mapper: F) -> Vec<U>
    where
        T: Sync,
        U: Send,
        F: Fn(&T) -> U + Send + Sync,
    {
        self.run_chunks("map", items, |chunk| chunk.iter().map(&mapper).collect::<Vec<_>>())
            .into_iter()
            .flatten()
            .collect()
    }

    /// Parallel fold. Each chunk folds from the identity; partials are combined left to right
    /// with [`Reducer::combine`], so an associative combine gives the sequential result.
    pub fn reduce_parallel<T, R>(&self, items: &[T], reducer: &Reducer<T, R>) -> R
    where
        T: Sync,
        R: Clone + Send + Sync,
    {
        self.run_chunks("reduce", items, |chunk| {
            chunk
                .iter()
                .fold(reducer.identity(), |acc, item| reducer.accumulate(acc, item))
        })
        .into_iter()
        .fold(reducer.identity(), |acc, partial| reducer.combine(acc, partial))
    }

    /// Parallel [`crate::processing::group_by`]; values inside a group keep input order.
    pub fn group_by_parallel<T, K, F>(&self, items: &[T], key: F) -> HashMap<K, Vec<T>>
    where
        T: Clone + Send + Sync,
        K: Eq + Hash + Send,
        F: Fn(&T) -> K + Send + Sync,
    {
        let partials = self.run_chunks("group_by", items, |chunk| {
            let mut groups: HashMap<K, Vec<T>> = HashMap::new();
            for item in chunk {
                groups.entry(key(item)).or_default().push(item.clone());
            }
            groups
        });

        let mut merged: HashMap<K, Vec<T>> = HashMap::new();
        for partial in partials {
            for (k, values) in partial {
                merged.entry(k).or_default().extend(values);
            }
        }
        merged
    }

    /// Parallel [`crate::processing::summary_statistics`].
    pub fn summary_statistics_parallel<T, F>(&self, items: &[T], numeric: F) -> SummaryStatistics
    where
        T: Sync,
        F: Fn(&T) -> f64 + Send + Sync,
    {
        self.run_chunks("summary_statistics", items, |chunk| {
            chunk.iter().map(&numeric).collect::<SummaryStatistics>()
        })
        .into_iter()
        .fold(SummaryStatistics::new(), SummaryStatistics::combine)
    }

    /// Runs `work` over every chunk on the pool and returns the per-chunk outputs in chunk order.
    fn run_chunks<T, O, F>(&self, operation: &'static str, items: &[T], work: F) -> Vec<O>
    where
        T: Sync,
        O: Send,
        F: Fn(&[T]) -> O + Send + Sync,
    {
        let start = Instant::now();
        self.metrics.begin_run();
        self.emit(ExecutionEvent::RunStarted {
            operation,
            items: items.len(),
        });

        let sem = Semaphore::new(self.opts.max_in_flight_chunks);
        let ranges = chunk_ranges(items.len(), self.opts.chunk_size);

        let per_chunk: Vec<O> = self.pool.install(|| {
            ranges
                .into_par_iter()
                .map(|range| {
                    let (_permit, waited) = sem.acquire();
                    if !waited.is_zero() {
                        self.metrics.on_throttle_wait(waited);
                        self.emit(ExecutionEvent::ThrottleWaited { duration: waited });
                    }

                    let start_index = range.start;
                    let len = range.len();
                    self.metrics.on_chunk_start();
                    self.emit(ExecutionEvent::ChunkStarted { start_index, len });

                    let out = work(&items[range]);

                    self.metrics.on_items_processed(len);
                    self.emit(ExecutionEvent::ChunkFinished { start_index, len });
                    self.metrics.on_chunk_end();
                    out
                })
                .collect()
        });

        self.metrics.end_run(start.elapsed());
        self.emit(ExecutionEvent::RunFinished {
            operation,
            elapsed: start.elapsed(),
            metrics: self.metrics.snapshot(),
        });

        per_chunk
    }

    fn emit(&self, event: ExecutionEvent) {
        if let Some(obs) = &self.observer {
            obs.on_event(&event);
        }
    }
}

fn chunk_ranges(len: usize, chunk_size: usize) -> Vec<Range<usize>> {
    (0..len)
        .step_by(chunk_size)
        .map(|start| start..(start + chunk_size).min(len))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{chunk_ranges, ExecutionEngine, ExecutionOptions};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    use crate::error::QueryError;
    use crate::execution::{ExecutionEvent, ExecutionObserver};
    use crate::predicate::{category_equals, Predicate};
    use crate::processing::{self, Reducer};
    use crate::types::{Category, Product};

    fn engine(threads: usize, chunk_size: usize, in_flight: usize) -> ExecutionEngine {
        ExecutionEngine::new(ExecutionOptions {
            num_threads: Some(threads),
            chunk_size,
            max_in_flight_chunks: in_flight,
        })
        .unwrap()
    }

    fn products(n: i64) -> Vec<Product> {
        (0..n)
            .map(|i| {
                let category = ["Books", "Toys", "Baby"][(i % 3) as usize];
                Product::new(i, format!("p{i}"), category, (i % 17) as f64).unwrap()
            })
            .collect()
    }

    #[test]
    fn chunk_ranges_cover_input() {
        assert!(chunk_ranges(0, 4).is_empty());
        assert_eq!(chunk_ranges(10, 4), vec![0..4, 4..8, 8..10]);
    }

    #[test]
    fn invalid_options_are_rejected() {
        let err = ExecutionEngine::new(ExecutionOptions {
            chunk_size: 0,
            ..Default::default()
        })
        .err()
        .unwrap();
        assert!(matches!(err, QueryError::InvalidArgument { .. }));
        assert!(
            ExecutionEngine::new(ExecutionOptions {
                num_threads: Some(0),
                ..Default::default()
            })
            .is_err()
        );
    }

    #[test]
    fn parallel_results_match_sequential() {
        let items = products(1_000);
        let engine = engine(4, 7, 4);
        let books = category_equals("books");

        let seq: Vec<Product> = processing::filter(items.iter(), &books).cloned().collect();
        assert_eq!(engine.filter_parallel(&items, &books), seq);

        let names: Vec<String> = items.iter().map(|p| p.name().to_string()).collect();
        assert_eq!(engine.map_parallel(&items, |p| p.name().to_string()), names);

        let max = Reducer::max_by(Product::price);
        assert_eq!(
            engine.reduce_parallel(&items, &max).map(|p| p.id()),
            processing::reduce_with(items.iter(), &max).map(|p| p.id())
        );

        let seq_groups = processing::group_by(items.iter().cloned(), |p| p.category().clone());
        let par_groups = engine.group_by_parallel(&items, |p| p.category().clone());
        assert_eq!(par_groups.len(), seq_groups.len());
        for (k, v) in &seq_groups {
            assert_eq!(&par_groups[k], v);
        }
        let books_group = &par_groups[&Category::new("Books").unwrap()];
        assert!(books_group.windows(2).all(|w| w[0].id() < w[1].id()));

        let stats = engine.summary_statistics_parallel(&items, Product::price);
        let seq_stats = processing::summary_statistics(items.iter(), |p| p.price());
        assert_eq!(stats.count, seq_stats.count);
        assert_eq!(stats.sum, seq_stats.sum);
        assert_eq!(stats.min, seq_stats.min);
        assert_eq!(stats.max, seq_stats.max);
    }

    #[test]
    fn empty_input_yields_identity() {
        let engine = engine(2, 4, 2);
        let items: Vec<Product> = Vec::new();
        assert!(engine.filter_parallel(&items, &Predicate::always()).is_empty());
        assert_eq!(engine.reduce_parallel(&items, &Reducer::sum_by(Product::price)), 0.0);
        assert_eq!(engine.summary_statistics_parallel(&items, Product::price).average(), None);
    }

    #[test]
    fn map_parallel_runs_with_concurrency() {
        let items: Vec<i64> = (0..400).collect();
        let engine = engine(4, 1, 4);

        let active = Arc::new(AtomicUsize::new(0));
        let max_active = Arc::new(AtomicUsize::new(0));

        let out = engine.map_parallel(&items, |x| {
            let now = active.fetch_add(1, Ordering::SeqCst) + 1;
            max_active.fetch_max(now, Ordering::SeqCst);
            std::thread::sleep(Duration::from_millis(2));
            active.fetch_sub(1, Ordering::SeqCst);
            x + 1
        });

        assert_eq!(out.len(), items.len());
        assert_eq!(out[0], 1);
        assert_eq!(out[399], 400);
        assert!(max_active.load(Ordering::SeqCst) > 1);
    }

    struct ConcurrencyObserver {
        active_chunks: AtomicUsize,
        max_active_chunks: AtomicUsize,
    }

    impl ExecutionObserver for ConcurrencyObserver {
        fn on_event(&self, event: &ExecutionEvent) {
            match event {
                ExecutionEvent::ChunkStarted { .. } => {
                    let now = self.active_chunks.fetch_add(1, Ordering::SeqCst) + 1;
                    self.max_active_chunks.fetch_max(now, Ordering::SeqCst);
                }
                ExecutionEvent::ChunkFinished { .. } => {
                    self.active_chunks.fetch_sub(1, Ordering::SeqCst);
                }
                _ => {}
            }
        }
    }

    #[test]
    fn max_in_flight_chunks_throttles_chunk_concurrency() {
        let items: Vec<i64> = (0..100).collect();
        let observer = Arc::new(ConcurrencyObserver {
            active_chunks: AtomicUsize::new(0),
            max_active_chunks: AtomicUsize::new(0),
        });
        let obs_trait: Arc<dyn ExecutionObserver> = observer.clone();
        let engine = engine(4, 1, 1).with_observer(obs_trait);

        let out = engine.map_parallel(&items, |_| {
            std::thread::sleep(Duration::from_millis(1));
            1
        });

        assert_eq!(out.len(), items.len());
        assert_eq!(observer.max_active_chunks.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn metrics_are_available_after_run() {
        let items: Vec<i64> = (0..60).collect();
        let engine = engine(4, 1, 1);
        let metrics = engine.metrics();

        let out = engine.map_parallel(&items, |_| {
            std::thread::sleep(Duration::from_millis(2));
            1
        });
        assert_eq!(out.len(), items.len());

        let snap = metrics.snapshot();
        assert_eq!(snap.items_processed, items.len() as u64);
        assert_eq!(snap.chunks_started, items.len() as u64);
        assert_eq!(snap.chunks_finished, items.len() as u64);
        assert_eq!(snap.max_active_chunks, 1);
        assert!(snap.throttle_wait > Duration::ZERO);
        assert!(snap.elapsed.is_some());
    }
}

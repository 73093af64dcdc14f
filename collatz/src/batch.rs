//! Fork-join evaluation of a step function over an integer range.
//!
//! A batch spawns one scoped thread per worker, hands each a statically
//! strided share of the range (see [`Partition`]), and merges the per-worker
//! partials after every thread has joined. Workers never share mutable state.

use std::num::NonZeroUsize;
use std::panic;
use std::thread;
use std::time::Instant;

use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use crate::core::accumulate::{
    DenseResults, Histogram, Merge, RatioSeries, RatioSums, RunningMax,
};
use crate::core::partition::Partition;
use crate::core::types::{OverflowPolicy, ResultTriple, StepField, Variant};
use crate::error::EngineError;

/// What a batch folds its per-input results into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregationMode {
    /// Every triple, in input order.
    Dense,
    /// Maximum of one field.
    RunningMax { field: StepField },
    /// Counts of one field for keys `0..buckets`.
    Histogram { field: StepField, buckets: usize },
    /// Cumulative ratio of the batch variant's field over `denominator`'s,
    /// sampled at every `block_size` inputs.
    Ratio {
        denominator: Variant,
        field: StepField,
        block_size: u64,
    },
}

impl AggregationMode {
    pub fn name(&self) -> &'static str {
        match self {
            AggregationMode::Dense => "dense",
            AggregationMode::RunningMax { .. } => "running_max",
            AggregationMode::Histogram { .. } => "histogram",
            AggregationMode::Ratio { .. } => "ratio",
        }
    }
}

/// Everything a batch needs; there is no other source of configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchConfig {
    pub variant: Variant,
    /// First input, at least 1.
    pub start: u64,
    /// One past the last input.
    pub limit: u64,
    pub mode: AggregationMode,
    /// `None` uses the host's available parallelism.
    pub workers: Option<NonZeroUsize>,
    pub overflow: OverflowPolicy,
}

impl BatchConfig {
    pub fn new(variant: Variant, start: u64, limit: u64, mode: AggregationMode) -> Self {
        Self {
            variant,
            start,
            limit,
            mode,
            workers: None,
            overflow: OverflowPolicy::default(),
        }
    }

    /// Fix the worker count; `0` restores the host default.
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = NonZeroUsize::new(workers);
        self
    }

    pub fn with_overflow(mut self, overflow: OverflowPolicy) -> Self {
        self.overflow = overflow;
        self
    }

    /// Reject parameters that would make the batch meaningless.
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.start == 0 {
            return Err(EngineError::configuration("range start must be >= 1"));
        }
        if self.start >= self.limit {
            return Err(EngineError::configuration(format!(
                "empty range [{}, {})",
                self.start, self.limit
            )));
        }
        let len = self.limit - self.start;
        match self.mode {
            AggregationMode::Dense => {
                usize::try_from(len).map_err(|_| {
                    EngineError::configuration(format!("dense range of {len} inputs is too large"))
                })?;
            }
            AggregationMode::RunningMax { .. } => {}
            AggregationMode::Histogram { buckets, .. } => {
                if buckets == 0 {
                    return Err(EngineError::configuration("histogram buckets must be > 0"));
                }
            }
            AggregationMode::Ratio { block_size, .. } => {
                if block_size == 0 {
                    return Err(EngineError::configuration("ratio block size must be > 0"));
                }
                usize::try_from(len.div_ceil(block_size)).map_err(|_| {
                    EngineError::configuration(format!(
                        "{len} inputs in blocks of {block_size} is too many blocks"
                    ))
                })?;
            }
        }
        Ok(())
    }
}

/// Merged result of a batch.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Aggregate {
    Dense(DenseResults),
    RunningMax(RunningMax),
    Histogram(Histogram),
    Ratio(RatioSeries),
}

impl Aggregate {
    pub fn into_dense(self) -> Option<DenseResults> {
        match self {
            Aggregate::Dense(dense) => Some(dense),
            _ => None,
        }
    }

    pub fn into_running_max(self) -> Option<RunningMax> {
        match self {
            Aggregate::RunningMax(max) => Some(max),
            _ => None,
        }
    }

    pub fn into_histogram(self) -> Option<Histogram> {
        match self {
            Aggregate::Histogram(histogram) => Some(histogram),
            _ => None,
        }
    }

    pub fn into_ratio(self) -> Option<RatioSeries> {
        match self {
            Aggregate::Ratio(series) => Some(series),
            _ => None,
        }
    }
}

/// Evaluate a single input. `n = 0` is outside the domain.
pub fn evaluate_one(
    variant: Variant,
    n: u64,
    overflow: OverflowPolicy,
) -> Result<ResultTriple, EngineError> {
    if n == 0 {
        return Err(EngineError::configuration("n must be >= 1"));
    }
    evaluate(variant, n, overflow)
}

#[inline]
fn evaluate(
    variant: Variant,
    n: u64,
    overflow: OverflowPolicy,
) -> Result<ResultTriple, EngineError> {
    match overflow {
        OverflowPolicy::Wrapping => Ok(variant.evaluate(n)),
        OverflowPolicy::Checked => variant
            .evaluate_checked(n)
            .map_err(|_| EngineError::Overflow { variant, n }),
    }
}

/// Worker count used when a batch does not fix one.
pub fn default_workers() -> NonZeroUsize {
    thread::available_parallelism().unwrap_or(NonZeroUsize::MIN)
}

/// Evaluate `config.variant` over `[config.start, config.limit)` and aggregate.
///
/// Either the whole range is evaluated or an error is returned; there is no
/// partial aggregate. Invalid parameters are rejected before any thread starts.
#[instrument(
    skip_all,
    fields(
        variant = %config.variant,
        start = config.start,
        limit = config.limit,
        mode = config.mode.name(),
    )
)]
pub fn evaluate_batch(config: &BatchConfig) -> Result<Aggregate, EngineError> {
    config.validate()?;
    let workers = config.workers.unwrap_or_else(default_workers);
    let started = Instant::now();
    info!(workers = workers.get(), overflow = ?config.overflow, "batch started");

    let BatchConfig {
        variant,
        start,
        limit,
        overflow,
        ..
    } = *config;
    let partition = Partition::new(start, limit, workers);

    let aggregate = match config.mode {
        AggregationMode::Dense => {
            let buffers = fork_join(workers, |worker| {
                partition
                    .indices(worker)
                    .map(|n| evaluate(variant, n, overflow))
                    .collect::<Result<Vec<_>, _>>()
            })?;
            Aggregate::Dense(DenseResults {
                start,
                values: partition.interleave(buffers),
            })
        }
        AggregationMode::RunningMax { field } => {
            let partials = fork_join(workers, |worker| {
                let mut max = RunningMax::new(field);
                for n in partition.indices(worker) {
                    max.record(n, &evaluate(variant, n, overflow)?);
                }
                Ok(max)
            })?;
            Aggregate::RunningMax(merge_all(partials, RunningMax::new(field)))
        }
        AggregationMode::Histogram { field, buckets } => {
            let partials = fork_join(workers, |worker| {
                let mut histogram = Histogram::new(field, buckets);
                for n in partition.indices(worker) {
                    histogram.record(&evaluate(variant, n, overflow)?);
                }
                Ok(histogram)
            })?;
            let histogram = merge_all(partials, Histogram::new(field, buckets));
            if histogram.overflow() > 0 {
                warn!(
                    field = %field,
                    buckets,
                    overflow = histogram.overflow(),
                    "histogram keys reached the bucket ceiling"
                );
            }
            Aggregate::Histogram(histogram)
        }
        AggregationMode::Ratio {
            denominator,
            field,
            block_size,
        } => {
            let job = RatioJob {
                numerator: variant,
                denominator,
                field,
                overflow,
                start,
                limit,
                block_size,
            };
            // validate() checked that the block count fits in usize.
            let blocks = partition.len().div_ceil(block_size);
            let block_partition = Partition::new(0, blocks, workers);
            let partials = fork_join(workers, |worker| job.owned_sums(&block_partition, worker))?;
            let sums = RatioSums::interleave(&block_partition, partials);
            Aggregate::Ratio(sums.into_series(start, block_size))
        }
    };

    info!(
        workers = workers.get(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "batch finished"
    );
    Ok(aggregate)
}

/// A ratio batch split into blocks of `block_size` inputs from `start`.
#[derive(Debug, Clone, Copy)]
struct RatioJob {
    numerator: Variant,
    denominator: Variant,
    field: StepField,
    overflow: OverflowPolicy,
    start: u64,
    limit: u64,
    block_size: u64,
}

impl RatioJob {
    /// Sums for the blocks `blocks` assigns to `worker`, in owned order.
    fn owned_sums(&self, blocks: &Partition, worker: usize) -> Result<RatioSums, EngineError> {
        let mut sums = RatioSums::with_capacity(blocks.owned_len(worker) as usize);
        for block in blocks.indices(worker) {
            let first = self.start + block * self.block_size;
            let end = first.saturating_add(self.block_size).min(self.limit);
            let (mut top, mut bottom) = (0, 0);
            for n in first..end {
                top += evaluate(self.numerator, n, self.overflow)?.field(self.field);
                bottom += evaluate(self.denominator, n, self.overflow)?.field(self.field);
            }
            sums.push(top, bottom);
        }
        Ok(sums)
    }
}

fn merge_all<T: Merge>(partials: Vec<T>, empty: T) -> T {
    partials.into_iter().reduce(Merge::merge).unwrap_or(empty)
}

/// Run `work(worker)` on `workers` scoped threads and collect results in
/// worker order. The first failing worker (by index) fails the batch.
fn fork_join<T, F>(workers: NonZeroUsize, work: F) -> Result<Vec<T>, EngineError>
where
    T: Send,
    F: Fn(usize) -> Result<T, EngineError> + Sync,
{
    let work = &work;
    thread::scope(|scope| {
        let handles: Vec<_> = (0..workers.get())
            .map(|worker| {
                scope.spawn(move || {
                    let started = Instant::now();
                    let result = work(worker);
                    debug!(
                        worker,
                        ok = result.is_ok(),
                        elapsed_ms = started.elapsed().as_millis() as u64,
                        "worker finished"
                    );
                    result
                })
            })
            .collect();
        let mut results = Vec::with_capacity(handles.len());
        for handle in handles {
            let result = handle
                .join()
                .unwrap_or_else(|payload| panic::resume_unwind(payload));
            results.push(result);
        }
        results.into_iter().collect()
    })
}

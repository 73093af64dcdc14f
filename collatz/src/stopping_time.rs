//! Stopping-time distributions: histogram of step counts and per-input rows.

use anyhow::{Context, Result};
use serde::Serialize;

use crate::batch::{AggregationMode, evaluate_batch};
use crate::core::accumulate::DenseResults;
use crate::core::types::{StepField, Variant};
use crate::io::config::ExplorerConfig;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistogramReport {
    pub variant: Variant,
    pub limit: u64,
    /// Largest reduced step count observed below the bucket ceiling.
    pub max_steps: Option<usize>,
    /// Inputs whose step count did not fit under the ceiling.
    pub overflow: u64,
    /// `(steps, count)` for every non-empty bucket.
    pub buckets: Vec<(usize, u64)>,
}

/// Histogram of reduced step counts over `[1, limit)`.
pub fn step_histogram(
    variant: Variant,
    limit: u64,
    cfg: &ExplorerConfig,
) -> Result<HistogramReport> {
    let mode = AggregationMode::Histogram {
        field: StepField::Reduced,
        buckets: cfg.histogram_buckets,
    };
    let histogram = evaluate_batch(&cfg.batch(variant, limit, mode))
        .with_context(|| format!("evaluate {variant} below {limit}"))?
        .into_histogram()
        .context("histogram batch returned another aggregate")?;
    Ok(HistogramReport {
        variant,
        limit,
        max_steps: histogram.max_key(),
        overflow: histogram.overflow(),
        buckets: histogram.non_empty().collect(),
    })
}

/// Every triple over `[1, limit)`, in input order.
pub fn step_scatter(variant: Variant, limit: u64, cfg: &ExplorerConfig) -> Result<DenseResults> {
    evaluate_batch(&cfg.batch(variant, limit, AggregationMode::Dense))
        .with_context(|| format!("evaluate {variant} below {limit}"))?
        .into_dense()
        .context("dense batch returned another aggregate")
}

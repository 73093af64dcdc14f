//! How much shorter the secondary-transform variant's stopping times are.
//!
//! Both reports use the cumulative ratio `Σ h(x) / Σ d(x)` of reduced step
//! counts, where `d` is the chosen denominator variant.

use anyhow::{Context, Result};
use serde::Serialize;

use crate::batch::{AggregationMode, evaluate_batch};
use crate::core::accumulate::{RatioSeries, check_bin_resolution};
use crate::core::types::{StepField, Variant};
use crate::io::config::ExplorerConfig;

/// The variant every ratio is taken of.
pub const NUMERATOR: Variant = Variant::ReducedOddSecondary;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RatioHistogramReport {
    pub denominator: Variant,
    pub limit: u64,
    pub resolution: usize,
    /// `(ratio bucket lower bound, count)` for every non-empty bucket.
    pub bins: Vec<(f64, u64)>,
}

/// Cumulative ratio sampled every `group` inputs over `[1, limit)`.
pub fn ratio_line(
    denominator: Variant,
    limit: u64,
    group: u64,
    cfg: &ExplorerConfig,
) -> Result<RatioSeries> {
    ratio_series(denominator, limit, group, cfg)
}

/// Distribution of the per-input cumulative ratio, binned at `resolution`.
///
/// `resolution` must be in `1..=MAX_BIN_RESOLUTION`; it is checked before any
/// evaluation runs.
pub fn ratio_histogram(
    denominator: Variant,
    limit: u64,
    resolution: usize,
    cfg: &ExplorerConfig,
) -> Result<RatioHistogramReport> {
    check_bin_resolution(resolution)?;
    let series = ratio_series(denominator, limit, 1, cfg)?;
    let bins = series
        .bin(resolution)?
        .into_iter()
        .enumerate()
        .filter(|(_, count)| *count > 0)
        .map(|(bucket, count)| (bucket as f64 / resolution as f64, count))
        .collect();
    Ok(RatioHistogramReport {
        denominator,
        limit,
        resolution,
        bins,
    })
}

fn ratio_series(
    denominator: Variant,
    limit: u64,
    block_size: u64,
    cfg: &ExplorerConfig,
) -> Result<RatioSeries> {
    let mode = AggregationMode::Ratio {
        denominator,
        field: StepField::Reduced,
        block_size,
    };
    evaluate_batch(&cfg.batch(NUMERATOR, limit, mode))
        .with_context(|| format!("evaluate {NUMERATOR} / {denominator} below {limit}"))?
        .into_ratio()
        .context("ratio batch returned another aggregate")
}

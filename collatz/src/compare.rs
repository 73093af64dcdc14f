//! Empirical check that an accelerated variant agrees with the baseline.

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;

use crate::batch::{AggregationMode, evaluate_batch};
use crate::core::accumulate::DenseResults;
use crate::core::types::{ResultTriple, Variant};
use crate::io::config::ExplorerConfig;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompareReport {
    pub variant: Variant,
    pub limit: u64,
    /// Inputs compared before stopping.
    pub compared: u64,
    pub mismatch: Option<Mismatch>,
}

/// First input whose raw step count or peak differs from the baseline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Mismatch {
    pub n: u64,
    pub baseline: ResultTriple,
    pub variant: ResultTriple,
}

/// Dense-evaluate `variant` and the baseline over `[1, limit)` and report the
/// first disagreement on `raw_steps` or `peak`.
pub fn compare_to_baseline(
    variant: Variant,
    limit: u64,
    cfg: &ExplorerConfig,
) -> Result<CompareReport> {
    let candidate = dense(variant, limit, cfg)?;
    let baseline = dense(Variant::Baseline, limit, cfg)?;
    let report = first_mismatch(variant, limit, &baseline, &candidate);
    info!(
        variant = %variant,
        compared = report.compared,
        mismatch = report.mismatch.is_some(),
        "comparison finished"
    );
    Ok(report)
}

fn dense(variant: Variant, limit: u64, cfg: &ExplorerConfig) -> Result<DenseResults> {
    evaluate_batch(&cfg.batch(variant, limit, AggregationMode::Dense))
        .with_context(|| format!("evaluate {variant} below {limit}"))?
        .into_dense()
        .context("dense batch returned another aggregate")
}

fn first_mismatch(
    variant: Variant,
    limit: u64,
    baseline: &DenseResults,
    candidate: &DenseResults,
) -> CompareReport {
    let mut compared = 0;
    for ((n, expected), (_, actual)) in baseline.iter().zip(candidate.iter()) {
        compared += 1;
        if expected.raw_steps != actual.raw_steps || expected.peak != actual.peak {
            return CompareReport {
                variant,
                limit,
                compared,
                mismatch: Some(Mismatch {
                    n,
                    baseline: *expected,
                    variant: *actual,
                }),
            };
        }
    }
    CompareReport {
        variant,
        limit,
        compared,
        mismatch: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accelerated_variants_match_baseline() {
        let cfg = ExplorerConfig {
            workers: 3,
            ..ExplorerConfig::default()
        };
        for variant in [Variant::ReducedOdd, Variant::ReducedOddSecondary] {
            let report = compare_to_baseline(variant, 100_000, &cfg).expect("compare");
            assert_eq!(report.mismatch, None);
            assert_eq!(report.compared, 99_999);
        }
    }

    #[test]
    fn reports_first_disagreement() {
        let baseline = DenseResults {
            start: 1,
            values: vec![
                ResultTriple::new(0, 0, 1),
                ResultTriple::new(1, 1, 2),
                ResultTriple::new(7, 7, 16),
            ],
        };
        let mut candidate = baseline.clone();
        candidate.values[1].peak = 1;
        candidate.values[2].raw_steps = 6;

        let report = first_mismatch(Variant::ReducedOdd, 4, &baseline, &candidate);
        let mismatch = report.mismatch.expect("mismatch");
        assert_eq!(mismatch.n, 2);
        assert_eq!(report.compared, 2);
    }
}

//! Largest value reached by each variant over a range.

use anyhow::{Context, Result, bail};
use serde::Serialize;

use crate::batch::{AggregationMode, evaluate_batch};
use crate::core::types::{StepField, Variant};
use crate::io::config::ExplorerConfig;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MaxReport {
    pub variant: Variant,
    pub limit: u64,
    pub peak: u64,
    /// Smallest input whose sequence reaches `peak`.
    pub attained_at: u64,
}

/// Running maximum of the peak value over `[1, limit)` for each variant.
pub fn max_peaks(
    variants: &[Variant],
    limit: u64,
    cfg: &ExplorerConfig,
) -> Result<Vec<MaxReport>> {
    let mode = AggregationMode::RunningMax {
        field: StepField::Peak,
    };
    variants
        .iter()
        .map(|&variant| {
            let max = evaluate_batch(&cfg.batch(variant, limit, mode))
                .with_context(|| format!("evaluate {variant} below {limit}"))?
                .into_running_max()
                .context("running max batch returned another aggregate")?;
            let (Some(peak), Some(attained_at)) = (max.value(), max.argument()) else {
                bail!("no inputs below {limit}");
            };
            Ok(MaxReport {
                variant,
                limit,
                peak,
                attained_at,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_variants_report_the_same_peak() {
        let reports =
            max_peaks(&Variant::ALL, 100_000, &ExplorerConfig::default()).expect("max");
        assert_eq!(reports.len(), 3);
        for report in &reports {
            assert_eq!(report.peak, 1_570_824_736, "{}", report.variant);
            assert_eq!(report.attained_at, reports[0].attained_at);
        }
    }
}

//! Worker-local accumulators and their merge rules.
//!
//! Every accumulator is built per worker and combined only after all workers
//! have joined. `merge` is associative and commutative, so any reduction order
//! yields the same value. Ratio sums hold only the worker's own blocks and are
//! interleaved back into domain order instead.

use serde::Serialize;

use crate::core::partition::Partition;
use crate::core::types::{ResultTriple, StepField};
use crate::error::EngineError;

/// Largest resolution [`RatioSeries::bin`] accepts.
pub const MAX_BIN_RESOLUTION: usize = 1_000_000;

/// Associative combination of two partial aggregates.
pub trait Merge: Sized {
    fn merge(self, other: Self) -> Self;
}

/// Per-input results for a contiguous range, `values[i]` belonging to `start + i`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DenseResults {
    pub start: u64,
    pub values: Vec<ResultTriple>,
}

impl DenseResults {
    pub fn get(&self, n: u64) -> Option<&ResultTriple> {
        let offset = usize::try_from(n.checked_sub(self.start)?).ok()?;
        self.values.get(offset)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// `(n, triple)` pairs in increasing `n`.
    pub fn iter(&self) -> impl Iterator<Item = (u64, &ResultTriple)> + '_ {
        (self.start..).zip(&self.values)
    }
}

/// Largest value of one field, with the smallest input attaining it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RunningMax {
    pub field: StepField,
    best: Option<MaxEntry>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
struct MaxEntry {
    value: u64,
    n: u64,
}

impl RunningMax {
    pub fn new(field: StepField) -> Self {
        Self { field, best: None }
    }

    pub fn record(&mut self, n: u64, triple: &ResultTriple) {
        let candidate = MaxEntry {
            value: triple.field(self.field),
            n,
        };
        self.best = Some(match self.best {
            Some(best) => pick(best, candidate),
            None => candidate,
        });
    }

    /// The maximum, or `None` if nothing was recorded.
    pub fn value(&self) -> Option<u64> {
        self.best.map(|best| best.value)
    }

    /// The smallest input whose field equals the maximum.
    pub fn argument(&self) -> Option<u64> {
        self.best.map(|best| best.n)
    }
}

fn pick(a: MaxEntry, b: MaxEntry) -> MaxEntry {
    if (b.value, std::cmp::Reverse(b.n)) > (a.value, std::cmp::Reverse(a.n)) {
        b
    } else {
        a
    }
}

impl Merge for RunningMax {
    fn merge(self, other: Self) -> Self {
        let best = match (self.best, other.best) {
            (Some(a), Some(b)) => Some(pick(a, b)),
            (a, b) => a.or(b),
        };
        Self {
            field: self.field,
            best,
        }
    }
}

/// Occurrence counts keyed by one field, for keys below a fixed ceiling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Histogram {
    pub field: StepField,
    counts: Vec<u64>,
    /// Inputs whose key was at or above the ceiling.
    overflow: u64,
}

impl Histogram {
    /// A histogram with buckets `0..buckets`.
    pub fn new(field: StepField, buckets: usize) -> Self {
        Self {
            field,
            counts: vec![0; buckets],
            overflow: 0,
        }
    }

    pub fn record(&mut self, triple: &ResultTriple) {
        let key = triple.field(self.field);
        match usize::try_from(key)
            .ok()
            .and_then(|key| self.counts.get_mut(key))
        {
            Some(count) => *count += 1,
            None => self.overflow += 1,
        }
    }

    pub fn count(&self, key: usize) -> u64 {
        self.counts.get(key).copied().unwrap_or(0)
    }

    pub fn overflow(&self) -> u64 {
        self.overflow
    }

    /// Every recorded input, bucketed or not.
    pub fn total(&self) -> u64 {
        self.counts.iter().sum::<u64>() + self.overflow
    }

    /// Largest key with a non-zero count.
    pub fn max_key(&self) -> Option<usize> {
        self.counts.iter().rposition(|count| *count > 0)
    }

    /// `(key, count)` for non-empty buckets in key order.
    pub fn non_empty(&self) -> impl Iterator<Item = (usize, u64)> + '_ {
        self.counts
            .iter()
            .enumerate()
            .filter(|(_, count)| **count > 0)
            .map(|(key, count)| (key, *count))
    }
}

impl Merge for Histogram {
    fn merge(mut self, other: Self) -> Self {
        if other.counts.len() > self.counts.len() {
            self.counts.resize(other.counts.len(), 0);
        }
        for (count, extra) in self.counts.iter_mut().zip(&other.counts) {
            *count += extra;
        }
        self.overflow += other.overflow;
        self
    }
}

/// Per-block numerator and denominator sums, in the order blocks were pushed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RatioSums {
    numerator: Vec<u64>,
    denominator: Vec<u64>,
}

impl RatioSums {
    pub fn with_capacity(blocks: usize) -> Self {
        Self {
            numerator: Vec::with_capacity(blocks),
            denominator: Vec::with_capacity(blocks),
        }
    }

    pub fn push(&mut self, numerator: u64, denominator: u64) {
        self.numerator.push(numerator);
        self.denominator.push(denominator);
    }

    #[cfg(test)]
    pub(crate) fn blocks(&self) -> usize {
        self.numerator.len()
    }

    /// Rebuild domain order from per-worker sums, `partials[w]` holding the
    /// blocks `partition` assigns to worker `w`.
    pub fn interleave(partition: &Partition, partials: Vec<RatioSums>) -> Self {
        let (numerators, denominators): (Vec<_>, Vec<_>) = partials
            .into_iter()
            .map(|sums| (sums.numerator, sums.denominator))
            .unzip();
        Self {
            numerator: partition.interleave(numerators),
            denominator: partition.interleave(denominators),
        }
    }

    /// Prefix-sum the blocks in domain order. Block `i` starts at
    /// `start + i * block_size`.
    pub fn into_series(self, start: u64, block_size: u64) -> RatioSeries {
        let mut numerator_sum = 0u64;
        let mut denominator_sum = 0u64;
        let points = self
            .numerator
            .into_iter()
            .zip(self.denominator)
            .enumerate()
            .map(|(block, (numerator, denominator))| {
                numerator_sum += numerator;
                denominator_sum += denominator;
                RatioPoint {
                    block_start: start + block as u64 * block_size,
                    numerator: numerator_sum,
                    denominator: denominator_sum,
                    ratio: ratio(numerator_sum, denominator_sum),
                }
            })
            .collect();
        RatioSeries { block_size, points }
    }
}

fn ratio(numerator: u64, denominator: u64) -> Option<f64> {
    (denominator > 0).then(|| numerator as f64 / denominator as f64)
}

/// Cumulative sums and their ratio at one block boundary.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RatioPoint {
    pub block_start: u64,
    pub numerator: u64,
    pub denominator: u64,
    /// `None` while the cumulative denominator is still zero.
    pub ratio: Option<f64>,
}

/// Cumulative ratio sequence, one point per block in domain order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RatioSeries {
    pub block_size: u64,
    pub points: Vec<RatioPoint>,
}

impl RatioSeries {
    /// Bucket each defined ratio into `floor(ratio * resolution)`, clamped to
    /// `resolution`. Returns `resolution + 1` counts.
    pub fn bin(&self, resolution: usize) -> Result<Vec<u64>, EngineError> {
        check_bin_resolution(resolution)?;
        let mut bins = vec![0u64; resolution + 1];
        for ratio in self.points.iter().filter_map(|point| point.ratio) {
            let bucket = ((ratio * resolution as f64) as usize).min(resolution);
            bins[bucket] += 1;
        }
        Ok(bins)
    }

    pub fn last_ratio(&self) -> Option<f64> {
        self.points.last().and_then(|point| point.ratio)
    }
}

/// Reject resolutions outside `1..=MAX_BIN_RESOLUTION`.
pub fn check_bin_resolution(resolution: usize) -> Result<(), EngineError> {
    if resolution == 0 || resolution > MAX_BIN_RESOLUTION {
        return Err(EngineError::configuration(format!(
            "bin resolution must be in 1..={MAX_BIN_RESOLUTION}: {resolution}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::num::NonZeroUsize;

    use super::*;

    fn triple(reduced: u64, raw: u64, peak: u64) -> ResultTriple {
        ResultTriple::new(reduced, raw, peak)
    }

    #[test]
    fn running_max_prefers_smallest_input_on_ties() {
        let mut left = RunningMax::new(StepField::Peak);
        left.record(9, &triple(0, 0, 52));
        let mut right = RunningMax::new(StepField::Peak);
        right.record(7, &triple(0, 0, 52));

        let merged = left.merge(right);
        assert_eq!(merged.value(), Some(52));
        assert_eq!(merged.argument(), Some(7));
        assert_eq!(right.merge(left), merged);
    }

    #[test]
    fn running_max_merge_with_empty_is_identity() {
        let mut filled = RunningMax::new(StepField::Raw);
        filled.record(27, &triple(41, 111, 9232));
        let empty = RunningMax::new(StepField::Raw);
        assert_eq!(filled.merge(empty), filled);
        assert_eq!(empty.merge(filled), filled);
        assert_eq!(empty.value(), None);
    }

    #[test]
    fn histogram_merge_conserves_counts() {
        let mut a = Histogram::new(StepField::Reduced, 4);
        let mut b = Histogram::new(StepField::Reduced, 4);
        for reduced in [0, 1, 1, 3, 9] {
            a.record(&triple(reduced, reduced, 1));
        }
        for reduced in [2, 3, 3] {
            b.record(&triple(reduced, reduced, 1));
        }

        let merged = a.merge(b);
        assert_eq!(merged.overflow(), 1);
        assert_eq!(merged.total(), 8);
        assert_eq!(merged.max_key(), Some(3));
        assert_eq!(
            merged.non_empty().collect::<Vec<_>>(),
            vec![(0, 1), (1, 2), (2, 1), (3, 3)]
        );
    }

    #[test]
    fn ratio_series_is_cumulative() {
        // Two workers: worker 0 owns blocks 0 and 2, worker 1 owns block 1.
        let partition = Partition::new(0, 3, NonZeroUsize::new(2).expect("non-zero"));
        let mut even = RatioSums::with_capacity(2);
        even.push(0, 0);
        even.push(5, 10);
        let mut odd = RatioSums::with_capacity(1);
        odd.push(3, 6);

        let series = RatioSums::interleave(&partition, vec![even, odd]).into_series(1, 10);
        let starts: Vec<u64> = series.points.iter().map(|p| p.block_start).collect();
        assert_eq!(starts, vec![1, 11, 21]);
        assert_eq!(series.points[0].ratio, None);
        assert_eq!(series.points[1].ratio, Some(0.5));
        assert_eq!(series.points[2].numerator, 8);
        assert_eq!(series.points[2].denominator, 16);
        assert_eq!(series.last_ratio(), Some(0.5));
    }

    #[test]
    fn bin_clamps_to_resolution() {
        let series = RatioSeries {
            block_size: 1,
            points: vec![
                RatioPoint {
                    block_start: 1,
                    numerator: 0,
                    denominator: 0,
                    ratio: None,
                },
                RatioPoint {
                    block_start: 2,
                    numerator: 1,
                    denominator: 4,
                    ratio: Some(0.25),
                },
                RatioPoint {
                    block_start: 3,
                    numerator: 4,
                    denominator: 4,
                    ratio: Some(1.0),
                },
            ],
        };
        assert_eq!(series.bin(4), Ok(vec![0, 1, 0, 0, 1]));
    }

    #[test]
    fn bin_rejects_unbounded_resolution() {
        let series = RatioSeries {
            block_size: 1,
            points: vec![RatioPoint {
                block_start: 1,
                numerator: 1,
                denominator: 4,
                ratio: Some(0.25),
            }],
        };
        for resolution in [0, MAX_BIN_RESOLUTION + 1, usize::MAX] {
            assert!(
                matches!(series.bin(resolution), Err(EngineError::Configuration(_))),
                "resolution {resolution}"
            );
        }
        assert_eq!(
            series.bin(MAX_BIN_RESOLUTION).map(|bins| bins.len()),
            Ok(MAX_BIN_RESOLUTION + 1)
        );
    }

    #[test]
    fn dense_lookup_is_offset_by_start() {
        let dense = DenseResults {
            start: 5,
            values: vec![triple(1, 5, 16), triple(6, 8, 16)],
        };
        assert_eq!(dense.get(6), Some(&triple(6, 8, 16)));
        assert_eq!(dense.get(4), None);
        assert_eq!(dense.get(7), None);
        assert_eq!(dense.iter().map(|(n, _)| n).collect::<Vec<_>>(), vec![5, 6]);
    }
}

//! Static strided partitioning of an index range across workers.
//!
//! Worker `w` of `W` owns `start + w, start + w + W, start + w + 2W, ...`.
//! Ownership depends only on the worker index, so every run assigns the same
//! inputs to the same worker.

use std::iter::StepBy;
use std::num::NonZeroUsize;
use std::ops::Range;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Partition {
    start: u64,
    limit: u64,
    workers: NonZeroUsize,
}

impl Partition {
    /// Partition `[start, limit)`. An inverted range is treated as empty.
    pub fn new(start: u64, limit: u64, workers: NonZeroUsize) -> Self {
        Self {
            start,
            limit: limit.max(start),
            workers,
        }
    }

    /// Number of indices in the range.
    pub(crate) fn len(&self) -> u64 {
        self.limit - self.start
    }

    /// The indices owned by `worker`, in increasing order.
    pub fn indices(&self, worker: usize) -> StepBy<Range<u64>> {
        let first = self.start.saturating_add(worker as u64).min(self.limit);
        (first..self.limit).step_by(self.workers.get())
    }

    /// How many indices `worker` owns.
    pub fn owned_len(&self, worker: usize) -> u64 {
        let offset = worker as u64;
        if offset >= self.len() {
            return 0;
        }
        (self.len() - offset).div_ceil(self.workers.get() as u64)
    }

    /// Interleave per-worker buffers (indexed by worker, in owned order) back
    /// into range order.
    ///
    /// Lower workers never own fewer indices than higher ones, so round-robin
    /// draining reproduces the stride pattern.
    pub fn interleave<T>(&self, buffers: Vec<Vec<T>>) -> Vec<T> {
        let capacity = buffers.iter().map(Vec::len).sum();
        let mut iters: Vec<_> = buffers.into_iter().map(Vec::into_iter).collect();
        let mut merged = Vec::with_capacity(capacity);
        while merged.len() < capacity {
            for iter in &mut iters {
                if let Some(item) = iter.next() {
                    merged.push(item);
                }
            }
        }
        merged
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn workers(count: usize) -> NonZeroUsize {
        NonZeroUsize::new(count).expect("non-zero")
    }

    #[test]
    fn union_covers_range_without_duplicates() {
        for count in [1, 2, 3, 8] {
            for limit in [1u64, 2, 100, 100_000] {
                let partition = Partition::new(1, limit, workers(count));
                let mut seen = vec![false; limit as usize];
                for worker in 0..count {
                    let owned: Vec<u64> = partition.indices(worker).collect();
                    assert_eq!(owned.len() as u64, partition.owned_len(worker));
                    for index in owned {
                        assert!(!seen[index as usize], "{index} assigned twice");
                        seen[index as usize] = true;
                    }
                }
                assert!(!seen[0]);
                assert!(
                    seen[1..].iter().all(|covered| *covered),
                    "gap for workers={count} limit={limit}"
                );
            }
        }
    }

    #[test]
    fn worker_indices_are_strided() {
        let partition = Partition::new(1, 12, workers(3));
        let owned: Vec<u64> = partition.indices(1).collect();
        assert_eq!(owned, vec![2, 5, 8, 11]);
    }

    #[test]
    fn more_workers_than_indices_leaves_some_idle() {
        let partition = Partition::new(5, 7, workers(8));
        assert_eq!(partition.indices(0).collect::<Vec<_>>(), vec![5]);
        assert_eq!(partition.indices(1).collect::<Vec<_>>(), vec![6]);
        assert_eq!(partition.indices(7).count(), 0);
        assert_eq!(partition.owned_len(7), 0);
    }

    #[test]
    fn inverted_range_is_empty() {
        let partition = Partition::new(10, 3, workers(2));
        assert_eq!(partition.len(), 0);
        assert_eq!(partition.indices(0).count(), 0);
    }

    #[test]
    fn interleave_restores_range_order() {
        for count in [1, 2, 3, 8] {
            let partition = Partition::new(1, 100, workers(count));
            let buffers: Vec<Vec<u64>> = (0..count)
                .map(|worker| partition.indices(worker).collect())
                .collect();
            let merged = partition.interleave(buffers);
            assert_eq!(merged, (1..100).collect::<Vec<_>>());
        }
    }
}

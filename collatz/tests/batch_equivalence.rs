//! Batch results must not depend on the worker count, and every variant must
//! agree with the explicit trajectory on sampled inputs.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use collatz::test_support::reference_triple;
use collatz::{
    Aggregate, AggregationMode, BatchConfig, OverflowPolicy, StepField, Variant, evaluate_batch,
    evaluate_one,
};

const LIMIT: u64 = 30_000;

fn run(variant: Variant, mode: AggregationMode, workers: usize) -> Aggregate {
    let config = BatchConfig::new(variant, 1, LIMIT, mode).with_workers(workers);
    evaluate_batch(&config).expect("batch")
}

#[test]
fn every_mode_is_independent_of_worker_count() {
    let modes = [
        AggregationMode::Dense,
        AggregationMode::RunningMax {
            field: StepField::Peak,
        },
        AggregationMode::Histogram {
            field: StepField::Raw,
            buckets: 200,
        },
        AggregationMode::Ratio {
            denominator: Variant::Baseline,
            field: StepField::Reduced,
            block_size: 700,
        },
    ];
    for variant in Variant::ALL {
        for mode in &modes {
            let expected = run(variant, *mode, 1);
            for workers in [2, 3, 7, 16] {
                assert_eq!(
                    run(variant, *mode, workers),
                    expected,
                    "{variant} {} workers={workers}",
                    mode.name()
                );
            }
        }
    }
}

#[test]
fn sampled_inputs_match_the_trajectory() {
    let mut rng = StdRng::seed_from_u64(0x5eed);
    for _ in 0..2_000 {
        let n = rng.gen_range(1..1_000_000_000u64);
        let reference = reference_triple(n);
        for variant in Variant::ALL {
            let triple = evaluate_one(variant, n, OverflowPolicy::Checked).expect("in range");
            assert_eq!(triple.raw_steps, reference.raw_steps, "{variant} n = {n}");
            assert_eq!(triple.peak, reference.peak, "{variant} n = {n}");
        }
        assert_eq!(
            evaluate_one(Variant::Baseline, n, OverflowPolicy::Wrapping).expect("baseline"),
            reference
        );
    }
}

#[test]
fn dense_batch_matches_single_evaluations() {
    let dense = run(Variant::ReducedOddSecondary, AggregationMode::Dense, 5)
        .into_dense()
        .expect("dense");
    assert_eq!(dense.len() as u64, LIMIT - 1);
    for (n, triple) in dense.iter().step_by(97) {
        let single = evaluate_one(Variant::ReducedOddSecondary, n, OverflowPolicy::Wrapping)
            .expect("evaluate");
        assert_eq!(*triple, single, "n = {n}");
    }
}

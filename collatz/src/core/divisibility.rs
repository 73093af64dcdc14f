//! Division-free divisibility test used on every secondary-transform step.

/// Multiplicative inverse of 3 modulo 2^64 (`3 * INVERSE_OF_THREE == 1` wrapping).
pub const INVERSE_OF_THREE: u64 = 0xAAAA_AAAA_AAAA_AAAB;

/// True if `n` is divisible by 6. Exact for every `u64`.
///
/// `n` must be even, and `h = n / 2` must be a multiple of 3. For a multiple
/// of 3 the wrapped product `h * 3⁻¹` is the exact quotient `h / 3`, which never
/// exceeds `h`. For the other two residues the product lands above `h` as long
/// as `h < 2^63`, which halving guarantees.
#[inline]
pub fn is_divisible_by_six(n: u64) -> bool {
    let half = n >> 1;
    n & 1 == 0 && half.wrapping_mul(INVERSE_OF_THREE) <= half
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn reference(n: u64) -> bool {
        n % 6 == 0
    }

    #[test]
    fn inverse_times_three_is_one() {
        assert_eq!(INVERSE_OF_THREE.wrapping_mul(3), 1);
    }

    #[test]
    fn matches_division_for_small_values() {
        for n in 0..100_000u64 {
            assert_eq!(is_divisible_by_six(n), reference(n), "n = {n}");
        }
    }

    #[test]
    fn matches_division_at_top_of_range() {
        for n in (u64::MAX - 100_000)..=u64::MAX {
            assert_eq!(is_divisible_by_six(n), reference(n), "n = {n}");
        }
    }

    #[test]
    fn matches_division_around_powers_of_two() {
        for bit in 1..64 {
            let pivot = 1u64 << bit;
            for n in pivot.saturating_sub(64)..=pivot.saturating_add(64) {
                assert_eq!(is_divisible_by_six(n), reference(n), "n = {n}");
            }
        }
    }

    #[test]
    fn matches_division_for_every_residue_and_parity() {
        let mut rng = StdRng::seed_from_u64(0x5eed);
        for _ in 0..10_000 {
            // Align to a multiple of 6 then walk through all six residues,
            // which covers both parities of each residue class mod 3.
            let base = rng.r#gen::<u64>() / 6 * 6;
            for offset in 0..6 {
                let Some(n) = base.checked_add(offset) else {
                    continue;
                };
                assert_eq!(is_divisible_by_six(n), reference(n), "n = {n}");
            }
        }
    }

    #[test]
    fn broad_random_sample_agrees() {
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..1_000_000 {
            let n: u64 = rng.r#gen();
            assert_eq!(is_divisible_by_six(n), reference(n), "n = {n}");
        }
    }
}

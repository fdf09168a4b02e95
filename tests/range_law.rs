use chainspawn_core::rng::{Prng, RandomArrayOptions, RngConfig};
use proptest::prelude::*;

prop_compose! {
    fn arb_int_range()(
        min in -1_000_000i64..1_000_000,
        span in 1i64..1_000_000
    ) -> (i64, i64) {
        (min, min + span)
    }
}

prop_compose! {
    fn arb_float_range()(
        min in -1.0e6f64..1.0e6,
        span in 1.0e-6f64..1.0e6
    ) -> (f64, f64) {
        (min, min + span)
    }
}

fn algorithm_name(index: usize) -> &'static str {
    ["mulberry32", "xorshift32", "lcg", "mersenne"][index % 4]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn test_random_int_stays_in_range(
        seed in any::<u32>(),
        (min, max) in arb_int_range(),
        algorithm in 0usize..4
    ) {
        let mut rng = Prng::new(RngConfig {
            default_seed: Some(seed),
            algorithm: algorithm_name(algorithm).to_string(),
            ..RngConfig::default()
        });
        for _ in 0..200 {
            let v = rng.random_int(min, max);
            prop_assert!(v >= min && v < max, "{} not in [{}, {})", v, min, max);
        }
    }

    #[test]
    fn test_random_float_stays_in_range(
        seed in any::<u32>(),
        (min, max) in arb_float_range(),
        algorithm in 0usize..4
    ) {
        let mut rng = Prng::new(RngConfig {
            default_seed: Some(seed),
            algorithm: algorithm_name(algorithm).to_string(),
            ..RngConfig::default()
        });
        for _ in 0..200 {
            let v = rng.random_float(min, max);
            prop_assert!(v >= min && v < max, "{} not in [{}, {})", v, min, max);
        }
    }

    #[test]
    fn test_degenerate_range_returns_min(seed in any::<u32>(), min in -1000i64..1000, below in 0i64..1000) {
        let mut rng = Prng::with_seed(seed);
        prop_assert_eq!(rng.random_int(min, min - below), min);
        prop_assert_eq!(rng.random_float(min as f64, (min - below) as f64), min as f64);
        prop_assert_eq!(rng.state().counter, 2);
    }
}

#[test]
fn test_ten_thousand_draws_cover_the_range() {
    let mut rng = Prng::with_seed(800_000);
    let mut buckets = [0usize; 10];
    for _ in 0..10_000 {
        let v = rng.random_int(0, 10);
        assert!((0..10).contains(&v));
        buckets[v as usize] += 1;
    }
    // Expected 1000 per bucket; 800 is more than six sigma away.
    assert!(buckets.iter().all(|&n| n > 800), "{buckets:?}");

    for _ in 0..10_000 {
        let v = rng.random();
        assert!((0.0..1.0).contains(&v));
    }
}

#[test]
fn test_unit_interval_mean() {
    let mut rng = Prng::with_seed(3);
    let values = rng.random_array(&RandomArrayOptions {
        count: 10_000,
        ..RandomArrayOptions::default()
    });
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    assert!((mean - 0.5).abs() < 0.02, "mean {mean}");
}

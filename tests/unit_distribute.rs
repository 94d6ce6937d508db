use assert_matches::assert_matches;
use invoice_reflow::distribute::{DEFAULT_TOLERANCE, DistributionRequest};
use invoice_reflow::{PercentBand, ReflowError, distribute, round_to_precision, validate};

mod support;
use support::seeded;

fn two_decimals(value: f64) -> bool {
    ((value * 100.0).round() - value * 100.0).abs() < 1e-6
}

#[test]
fn values_sum_to_target_across_counts_and_seeds() {
    let band = PercentBand::default();
    for count in [1usize, 2, 7, 30, 35, 120] {
        for seed in 0..20 {
            let values = distribute(1000.0, count, band, &mut seeded(seed));
            assert_eq!(values.len(), count);
            let sum: f64 = values.iter().sum();
            assert!(
                (sum - 1000.0).abs() <= DEFAULT_TOLERANCE,
                "count {count} seed {seed}: sum {sum}"
            );
            assert!(values.iter().copied().all(two_decimals));
        }
    }
}

#[test]
fn values_stay_inside_the_band_apart_from_the_balancing_value() {
    let band = PercentBand::new(-2.0, 2.0).expect("band");
    let count = 40;
    let base = 1000.0 / count as f64;
    let (low, high) = band.bounds(base);

    for seed in 0..20 {
        let values = distribute(1000.0, count, band, &mut seeded(seed));
        let outside = values
            .iter()
            .filter(|v| {
                **v < round_to_precision(low) - 0.01 || **v > round_to_precision(high) + 0.01
            })
            .count();
        assert!(outside <= 1, "seed {seed}: {outside} values outside band");
    }
}

#[test]
fn zero_band_gives_even_split() {
    let band = PercentBand::new(0.0, 0.0).expect("band");
    let values = distribute(100.0, 4, band, &mut seeded(3));
    assert_eq!(values, vec![25.0; 4]);
}

#[test]
fn uneven_split_puts_the_cents_on_one_value() {
    let band = PercentBand::new(0.0, 0.0).expect("band");
    let mut values = distribute(100.0, 3, band, &mut seeded(3));
    values.sort_by(f64::total_cmp);
    assert_eq!(values, vec![33.33, 33.33, 33.34]);
}

#[test]
fn zero_count_yields_nothing_and_negative_is_an_error() {
    assert!(distribute(500.0, 0, PercentBand::default(), &mut seeded(1)).is_empty());
    assert_matches!(
        DistributionRequest::new(500.0, -4, PercentBand::default()),
        Err(ReflowError::NegativeCount(-4))
    );
}

#[test]
fn bounds_outside_percent_range_are_rejected() {
    assert_matches!(
        PercentBand::new(-150.0, 2.0),
        Err(ReflowError::InvalidPercentBounds { .. })
    );
    assert_matches!(
        PercentBand::new(3.0, 2.0),
        Err(ReflowError::InvalidPercentBounds { .. })
    );
    assert_matches!(
        PercentBand::new(f64::NAN, 2.0),
        Err(ReflowError::InvalidPercentBounds { .. })
    );
}

#[test]
fn same_seed_same_values() {
    let request = DistributionRequest::new(2500.0, 25, PercentBand::default()).expect("request");
    assert_eq!(request.run(&mut seeded(9)), request.run(&mut seeded(9)));
}

#[test]
fn validate_respects_tolerance() {
    assert!(validate(&[50.0, 50.0], 100.0, DEFAULT_TOLERANCE));
    assert!(validate(&[50.0, 50.004], 100.0, DEFAULT_TOLERANCE));
    assert!(!validate(&[50.0, 50.02], 100.0, DEFAULT_TOLERANCE));
}

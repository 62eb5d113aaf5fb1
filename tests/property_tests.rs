//! Property-based tests for the alignment engine
//!
//! - Test mathematical invariants of grids, interpolation and statistics
//! - Run with ProptestConfig::with_cases(100)

use std::collections::BTreeMap;

use proptest::prelude::*;
use trueno_report::align::{interp, linspace, Aggregator, ColumnStats, Spread, Statistic};
use trueno_report::experiment::ScalarSeries;

// ============================================================================
// Property Test Generators (Strategies)
// ============================================================================

/// Strictly increasing steps with matching values.
fn arb_series(max_len: usize) -> impl Strategy<Value = (Vec<i64>, Vec<f64>)> {
    proptest::collection::vec((1i64..50, -100.0f64..100.0), 1..max_len).prop_map(|pairs| {
        let mut step = 0;
        pairs
            .into_iter()
            .map(|(gap, value)| {
                step += gap;
                (step, value)
            })
            .unzip()
    })
}

/// A group of 1..5 members that all cover steps 0..=1000.
fn arb_overlapping_group() -> impl Strategy<Value = Vec<(Vec<i64>, Vec<f64>)>> {
    proptest::collection::vec(arb_series(20), 1..5).prop_map(|members| {
        members
            .into_iter()
            .map(|(mut steps, mut values)| {
                steps.insert(0, 0);
                values.insert(0, values[0]);
                steps.push(1000.max(steps[steps.len() - 1] + 1));
                values.push(values[values.len() - 1]);
                (steps, values)
            })
            .collect()
    })
}

fn runs_of(group: &[(Vec<i64>, Vec<f64>)]) -> BTreeMap<String, ScalarSeries> {
    group
        .iter()
        .enumerate()
        .map(|(i, (steps, values))| {
            (format!("exp/seed{i}"), ScalarSeries::from_steps_values(steps, values))
        })
        .collect()
}

// ============================================================================
// Property Tests
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Property: a grid has exactly n points, starts at lo and ends at hi
    #[test]
    fn prop_linspace_endpoints(lo in -1e6f64..1e6, span in 0.0f64..1e6, n in 2usize..500) {
        let hi = lo + span;
        let grid = linspace(lo, hi, n);
        prop_assert_eq!(grid.len(), n);
        prop_assert_eq!(grid[0], lo);
        prop_assert_eq!(grid[n - 1], hi);
        prop_assert!(grid.windows(2).all(|w| w[0] <= w[1]));
    }

    /// Property: interpolating a series at its own steps returns its values
    #[test]
    fn prop_interp_idempotent_on_own_steps((steps, values) in arb_series(40)) {
        let xp: Vec<f64> = steps.iter().map(|&s| s as f64).collect();
        let resampled = interp(&xp, &xp, &values);
        for (a, b) in resampled.iter().zip(&values) {
            prop_assert!((a - b).abs() <= 1e-9 * (1.0 + b.abs()));
        }
    }

    /// Property: interpolated values stay within the sample range
    #[test]
    fn prop_interp_bounded((steps, values) in arb_series(40), x in -100.0f64..3000.0) {
        let xp: Vec<f64> = steps.iter().map(|&s| s as f64).collect();
        let lo = values.iter().copied().fold(f64::INFINITY, f64::min);
        let hi = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let y = interp(&[x], &xp, &values)[0];
        prop_assert!(y >= lo - 1e-9 && y <= hi + 1e-9);
    }

    /// Property: column statistics do not depend on member order
    #[test]
    fn prop_column_stats_order_invariant(
        values in proptest::collection::vec(-1e3f64..1e3, 1..20),
        seed in any::<u64>(),
    ) {
        let mut shuffled = values.clone();
        let len = shuffled.len();
        shuffled.rotate_left((seed as usize) % len);
        shuffled.reverse();
        prop_assert_eq!(ColumnStats::of(&values), ColumnStats::of(&shuffled));
    }

    /// Property: min <= mean <= max and std >= 0
    #[test]
    fn prop_column_stats_ordering(values in proptest::collection::vec(-1e3f64..1e3, 1..20)) {
        let stats = ColumnStats::of(&values);
        prop_assert!(stats.min <= stats.mean + 1e-9);
        prop_assert!(stats.mean <= stats.max + 1e-9);
        prop_assert!(stats.std >= 0.0);
    }

    /// Property: groups are resampled onto N points spanning the common range
    #[test]
    fn prop_group_grid_spans_common_range(group in arb_overlapping_group(), n in 1usize..64) {
        let runs = runs_of(&group);
        let result = Aggregator::new(n).stats_key("/seed").aggregate(&runs).unwrap();
        prop_assert!(result.degenerate.is_empty());
        let exp = &result.series["exp"];

        let lo = group.iter().map(|(s, _)| s[0]).max().unwrap() as f64;
        let hi = group.iter().map(|(s, _)| s[s.len() - 1]).min().unwrap() as f64;
        prop_assert_eq!(exp.len(), n);
        prop_assert_eq!(exp.timestamps().len(), n);
        prop_assert_eq!(exp.steps()[0], lo);
        if n > 1 {
            prop_assert_eq!(exp.steps()[n - 1], hi);
        }
    }

    /// Property: a singleton group has zero spread and min == max == mean
    #[test]
    fn prop_singleton_group_has_no_spread((steps, values) in arb_series(30), n in 1usize..32) {
        let runs = runs_of(&[(steps, values)]);
        let minmax = Aggregator::new(n)
            .stats_key("/seed")
            .statistic(Statistic::MinMax)
            .aggregate(&runs)
            .unwrap();
        let exp = &minmax.series["exp"];
        match exp.spread() {
            Spread::MinMax { min, max } => {
                prop_assert_eq!(min.as_slice(), exp.mean());
                prop_assert_eq!(max.as_slice(), exp.mean());
            }
            Spread::Std(_) => prop_assert!(false, "expected min/max spread"),
        }

        let std = Aggregator::new(n).stats_key("/seed").aggregate(&runs).unwrap();
        match std.series["exp"].spread() {
            Spread::Std(values) => prop_assert!(values.iter().all(|&s| s == 0.0)),
            Spread::MinMax { .. } => prop_assert!(false, "expected std spread"),
        }
    }

    /// Property: renaming members (changing their order) leaves the result unchanged
    #[test]
    fn prop_member_order_invariance(group in arb_overlapping_group(), n in 2usize..32) {
        let forward = runs_of(&group);
        let mut reversed_group = group;
        reversed_group.reverse();
        let backward = runs_of(&reversed_group);

        let a = Aggregator::new(n).stats_key("/seed").statistic(Statistic::MinMax).aggregate(&forward).unwrap();
        let b = Aggregator::new(n).stats_key("/seed").statistic(Statistic::MinMax).aggregate(&backward).unwrap();
        prop_assert_eq!(a.series["exp"].mean(), b.series["exp"].mean());
        prop_assert_eq!(a.series["exp"].spread(), b.series["exp"].spread());
    }

    /// Property: resampling evenly spaced steps onto as many grid points
    /// reproduces the logged values exactly
    #[test]
    fn prop_resample_onto_own_steps_is_exact(
        first in 0i64..1000,
        gap in 1i64..100,
        values in proptest::collection::vec(-1e3f64..1e3, 2..60),
    ) {
        let steps: Vec<i64> = (0..values.len() as i64).map(|k| first + k * gap).collect();
        let runs: BTreeMap<String, ScalarSeries> =
            [("exp".to_string(), ScalarSeries::from_steps_values(&steps, &values))]
                .into_iter()
                .collect();
        let result = Aggregator::new(values.len()).aggregate(&runs).unwrap();
        let exp = &result.series["exp"];
        let expected_steps: Vec<f64> = steps.iter().map(|&s| s as f64).collect();
        prop_assert_eq!(exp.steps(), expected_steps.as_slice());
        prop_assert_eq!(exp.mean(), values.as_slice());
    }

    /// Property: grid points of an aligned group are evenly spaced
    #[test]
    fn prop_group_grid_evenly_spaced(group in arb_overlapping_group(), n in 3usize..64) {
        let runs = runs_of(&group);
        let result = Aggregator::new(n).stats_key("/seed").aggregate(&runs).unwrap();
        let steps = result.series["exp"].steps();
        let first_gap = steps[1] - steps[0];
        let tolerance = 1e-9 * (steps[n - 1] - steps[0]).abs().max(1.0);
        for pair in steps.windows(2) {
            prop_assert!(((pair[1] - pair[0]) - first_gap).abs() <= tolerance);
        }
    }
}

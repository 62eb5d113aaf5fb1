//! Step grids and linear interpolation

/// `n` evenly spaced points from `lo` to `hi`, both inclusive.
///
/// `n == 1` yields `[lo]`; `n == 0` yields an empty grid. The last point
/// is exactly `hi` so that grid bounds survive a second resampling pass
/// unchanged.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn linspace(lo: f64, hi: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![lo],
        _ => {
            let span = hi - lo;
            let step = span / (n - 1) as f64;
            let mut grid: Vec<f64> = (0..n).map(|i| (i as f64).mul_add(step, lo)).collect();
            grid[n - 1] = hi;
            grid
        }
    }
}

/// Linearly interpolate `fp(xp)` at `x`, clamping outside `[xp[0], xp[last]]`.
///
/// `xp` must be non-decreasing and as long as `fp`. With duplicate steps
/// the last sample at that step wins. Returns `NaN` for an empty `xp`.
#[must_use]
pub fn interp_one(x: f64, xp: &[f64], fp: &[f64]) -> f64 {
    let n = xp.len().min(fp.len());
    if n == 0 {
        return f64::NAN;
    }
    let j = xp[..n].partition_point(|&s| s <= x);
    if j == 0 {
        return fp[0];
    }
    if j == n {
        return fp[n - 1];
    }
    let (x0, x1) = (xp[j - 1], xp[j]);
    let (f0, f1) = (fp[j - 1], fp[j]);
    let t = (x - x0) / (x1 - x0);
    t.mul_add(f1 - f0, f0)
}

/// [`interp_one`] at every point of `x`.
#[must_use]
pub fn interp(x: &[f64], xp: &[f64], fp: &[f64]) -> Vec<f64> {
    x.iter().map(|&xi| interp_one(xi, xp, fp)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linspace_endpoints_and_count() {
        let grid = linspace(0.0, 20.0, 3);
        assert_eq!(grid, vec![0.0, 10.0, 20.0]);
        assert_eq!(linspace(5.0, 9.0, 1), vec![5.0]);
        assert!(linspace(0.0, 1.0, 0).is_empty());
    }

    #[test]
    fn test_linspace_hits_integer_steps_exactly() {
        let grid = linspace(0.0, 110.0, 12);
        let expected: Vec<f64> = (0..12i32).map(|i| f64::from(i) * 10.0).collect();
        assert_eq!(grid, expected);
        for n in 2..40u32 {
            let grid = linspace(0.0, f64::from(10 * (n - 1)), n as usize);
            assert!(grid.iter().zip(0u32..).all(|(&g, i)| g == f64::from(i * 10)), "n = {n}");
        }
    }

    #[test]
    fn test_linspace_flat_range() {
        assert_eq!(linspace(7.0, 7.0, 4), vec![7.0; 4]);
    }

    #[test]
    fn test_interp_between_points() {
        let xp = [0.0, 5.0, 15.0, 20.0];
        let fp = [2.0, 2.0, 4.0, 6.0];
        assert_eq!(interp(&[0.0, 10.0, 20.0], &xp, &fp), vec![2.0, 3.0, 6.0]);
    }

    #[test]
    fn test_interp_clamps_outside_range() {
        let xp = [10.0, 20.0];
        let fp = [1.0, 3.0];
        assert_eq!(interp(&[0.0, 25.0], &xp, &fp), vec![1.0, 3.0]);
    }

    #[test]
    fn test_interp_duplicate_steps_take_last_sample() {
        let xp = [0.0, 10.0, 10.0, 20.0];
        let fp = [0.0, 1.0, 5.0, 5.0];
        assert_eq!(interp_one(10.0, &xp, &fp), 5.0);
    }

    #[test]
    fn test_interp_empty_is_nan() {
        assert!(interp_one(1.0, &[], &[]).is_nan());
    }
}

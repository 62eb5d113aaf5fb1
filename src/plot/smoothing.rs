//! Exponential moving average

use crate::{Error, Result};

/// Smooth `values` with `s_0 = x_0`, `s_i = w * s_{i-1} + (1 - w) * x_i`.
///
/// A weight of 0 returns the input unchanged; 1 flattens the curve to its
/// first value.
///
/// # Errors
///
/// Returns `Error::InvalidInput` if `weight` is outside `[0, 1]`.
pub fn smooth(values: &[f64], weight: f64) -> Result<Vec<f64>> {
    if !(0.0..=1.0).contains(&weight) {
        return Err(Error::InvalidInput(format!(
            "Smoothing weight must lie in [0, 1], got {weight}"
        )));
    }
    let Some(&first) = values.first() else {
        return Ok(Vec::new());
    };
    let mut last = first;
    Ok(values
        .iter()
        .map(|&x| {
            last = weight.mul_add(last, (1.0 - weight) * x);
            last
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_weight_is_identity() {
        assert_eq!(smooth(&[1.0, 5.0, 2.0], 0.0).unwrap(), vec![1.0, 5.0, 2.0]);
    }

    #[test]
    fn test_half_weight() {
        assert_eq!(smooth(&[0.0, 4.0, 4.0], 0.5).unwrap(), vec![0.0, 2.0, 3.0]);
    }

    #[test]
    fn test_full_weight_is_constant() {
        assert_eq!(smooth(&[3.0, 9.0, -1.0], 1.0).unwrap(), vec![3.0; 3]);
    }

    #[test]
    fn test_weight_out_of_range() {
        assert!(matches!(smooth(&[1.0], 1.5), Err(Error::InvalidInput(_))));
        assert!(smooth(&[], 0.3).unwrap().is_empty());
    }
}

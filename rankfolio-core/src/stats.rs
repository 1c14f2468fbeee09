//! Small shared numeric helpers.

pub(crate) fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation (n - 1 denominator). 0.0 for fewer than 2 values.
pub(crate) fn sample_std(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    let variance =
        values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    variance.sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mean_basic() {
        assert!((mean(&[1.0, 2.0, 3.0]) - 2.0).abs() < 1e-12);
    }

    #[test]
    fn mean_empty() {
        assert_eq!(mean(&[]), 0.0);
    }

    #[test]
    fn std_constant_series() {
        assert_eq!(sample_std(&[5.0, 5.0, 5.0]), 0.0);
    }

    #[test]
    fn std_known_value() {
        // Sample std of [2, 4, 4, 4, 5, 5, 7, 9] is ~2.138
        let s = sample_std(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]);
        assert!((s - 2.13809).abs() < 1e-4, "got {s}");
    }

    #[test]
    fn std_single_value() {
        assert_eq!(sample_std(&[1.0]), 0.0);
    }
}

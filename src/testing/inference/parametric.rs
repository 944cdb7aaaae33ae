//! Parametric two-sample tests for expression data.
//!
//! The z-test here compares two groups' value distributions under a normal
//! approximation with a pooled variance estimate.

use statrs::distribution::{ContinuousCDF, Normal};

use crate::testing::descriptive::{mean, variance};
use crate::testing::{Alternative, Group, SampleIssue, TestResult};

/// Pooled two-sample z-test of `mean(x) - mean(y) == 0`.
///
/// Group variances are population variances (ddof = 0). They are pooled as
/// `(nx * vx + ny * vy) / (nx + ny - 2)`, the usual pooled sample variance, and
/// scaled by `1/nx + 1/ny` to get the variance of the mean difference. The
/// statistic therefore equals the equal-variance Student t statistic; only the
/// reference distribution differs.
///
/// # Arguments
///
/// * `x` - Observations of the first group
/// * `y` - Observations of the second group
/// * `alternative` - Direction of the alternative hypothesis
///
/// # Returns
///
/// `TestResult` with the z-statistic, p-value, standard error and the mean
/// difference `mean(x) - mean(y)` as effect size.
pub fn z_test(
    x: &[f64],
    y: &[f64],
    alternative: Alternative,
) -> Result<TestResult<f64>, SampleIssue> {
    let (mean_x, var_x) = group_moments(x, Group::First)?;
    let (mean_y, var_y) = group_moments(y, Group::Second)?;

    let nx = x.len() as f64;
    let ny = y.len() as f64;

    // One observation per group leaves no degrees of freedom
    if nx + ny <= 2.0 {
        return Err(SampleIssue::ZeroStandardError);
    }

    let pooled = (nx * var_x + ny * var_y) / (nx + ny - 2.0);
    let std_err = (pooled * (1.0 / nx + 1.0 / ny)).sqrt();

    if std_err.is_nan() || std_err <= 0.0 {
        return Err(SampleIssue::ZeroStandardError);
    }

    let mean_diff = mean_x - mean_y;
    let z_stat = mean_diff / std_err;
    let p_value = z_test_p_value(z_stat, alternative);

    Ok(TestResult::new(z_stat, p_value)
        .with_effect_size(mean_diff)
        .with_standard_error(std_err))
}

fn group_moments(values: &[f64], group: Group) -> Result<(f64, f64), SampleIssue> {
    let too_few = SampleIssue::TooFewObservations {
        group,
        observed: values.len(),
        required: 1,
    };
    let m = mean(values).ok_or(too_few)?;
    let v = variance(values, 0).ok_or(too_few)?;
    Ok((m, v))
}

/// P-value of a z-statistic under the standard normal distribution.
pub fn z_test_p_value(z_stat: f64, alternative: Alternative) -> f64 {
    let normal = Normal::standard();
    let p = match alternative {
        Alternative::TwoSided => 2.0 * normal.sf(z_stat.abs()),
        Alternative::Larger => normal.sf(z_stat),
        Alternative::Smaller => normal.cdf(z_stat),
    };
    p.min(1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::{assert_abs_diff_eq, assert_relative_eq};

    #[test]
    fn test_z_test_reference_values() {
        let x = [1.0, 2.0, 3.0, 4.0, 5.0];
        let y = [2.0, 3.0, 4.0, 5.0, 6.0];
        let result = z_test(&x, &y, Alternative::TwoSided).unwrap();

        assert_relative_eq!(result.statistic, -1.0, epsilon = 1e-12);
        assert_relative_eq!(result.p_value, 0.31731050786291415, epsilon = 1e-9);
        assert_relative_eq!(result.effect_size.unwrap(), -1.0);
        assert_relative_eq!(result.standard_error.unwrap(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_z_test_unequal_sizes() {
        let x = [1.0, 1.5, 2.0];
        let y = [4.0, 4.5, 5.0, 5.5];
        let result = z_test(&x, &y, Alternative::TwoSided).unwrap();

        assert_relative_eq!(result.statistic, -7.192683357242346, epsilon = 1e-10);
        assert!(result.p_value < 1e-12);
    }

    #[test]
    fn test_identical_groups_give_unit_p_value() {
        let x = [0.3, 1.7, 2.2, 0.9];
        let result = z_test(&x, &x, Alternative::TwoSided).unwrap();
        assert_abs_diff_eq!(result.statistic, 0.0);
        assert_relative_eq!(result.p_value, 1.0);
        assert!(!result.is_significant(0.05));
    }

    #[test]
    fn test_one_sided_alternatives() {
        let x = [1.0, 2.0, 3.0, 4.0, 5.0];
        let y = [2.0, 3.0, 4.0, 5.0, 6.0];
        let larger = z_test(&x, &y, Alternative::Larger).unwrap();
        let smaller = z_test(&x, &y, Alternative::Smaller).unwrap();

        assert_relative_eq!(larger.p_value, 0.8413447460685429, epsilon = 1e-9);
        assert_relative_eq!(larger.p_value + smaller.p_value, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_zero_variance_is_degenerate() {
        let x = [2.0, 2.0, 2.0];
        let y = [2.0, 2.0];
        assert_eq!(
            z_test(&x, &y, Alternative::TwoSided).unwrap_err(),
            SampleIssue::ZeroStandardError
        );
    }

    #[test]
    fn test_statistic_matches_pooled_student_t() {
        let x = [2.3, 1.9, 3.1, 2.8, 2.2, 2.6];
        let y = [3.4, 2.9, 3.8, 3.1];
        let result = z_test(&x, &y, Alternative::TwoSided).unwrap();

        let (nx, ny) = (x.len() as f64, y.len() as f64);
        let sp2 = ((nx - 1.0) * variance(&x, 1).unwrap() + (ny - 1.0) * variance(&y, 1).unwrap())
            / (nx + ny - 2.0);
        let t_stat = (mean(&x).unwrap() - mean(&y).unwrap()) / (sp2 * (1.0 / nx + 1.0 / ny)).sqrt();

        assert_relative_eq!(result.statistic, t_stat, epsilon = 1e-12);
    }

    #[test]
    fn test_single_observation_per_group_is_degenerate() {
        assert_eq!(
            z_test(&[1.0], &[3.0], Alternative::TwoSided).unwrap_err(),
            SampleIssue::ZeroStandardError
        );
        assert!(z_test(&[1.0], &[3.0, 4.0], Alternative::TwoSided).is_ok());
    }

    #[test]
    fn test_empty_group_is_rejected() {
        let err = z_test(&[], &[1.0, 2.0], Alternative::TwoSided).unwrap_err();
        assert!(matches!(
            err,
            SampleIssue::TooFewObservations { group: Group::First, observed: 0, .. }
        ));
    }

    #[test]
    fn test_p_value_symmetric() {
        let p1 = z_test_p_value(2.0, Alternative::TwoSided);
        let p2 = z_test_p_value(-2.0, Alternative::TwoSided);
        assert_relative_eq!(p1, p2);
        assert!(p1 > 0.0 && p1 < 0.05);
    }
}

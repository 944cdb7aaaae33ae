//! Descriptive statistics over the observed values of one gene.
//!
//! Missing cells are stored as NaN in the expression matrices; the helpers in
//! this module expect them to have been removed with [`observed_values`].

use ndarray::ArrayView1;
use num_traits::{Float, NumCast};

/// Collect the non-missing values of a gene column.
pub fn observed_values<T: Float>(column: ArrayView1<'_, T>) -> Vec<T> {
    column.iter().copied().filter(|v| !v.is_nan()).collect()
}

/// Arithmetic mean, `None` for an empty slice.
pub fn mean<T: Float>(values: &[T]) -> Option<T> {
    if values.is_empty() {
        return None;
    }
    let n = <T as NumCast>::from(values.len())?;
    let sum = values.iter().fold(T::zero(), |acc, &v| acc + v);
    Some(sum / n)
}

/// Variance with `ddof` delta degrees of freedom (0 = population, 1 = sample).
///
/// Returns `None` when `values.len() <= ddof`.
pub fn variance<T: Float>(values: &[T], ddof: usize) -> Option<T> {
    if values.len() <= ddof {
        return None;
    }
    let m = mean(values)?;
    let denom = <T as NumCast>::from(values.len() - ddof)?;
    let sum_sq = values
        .iter()
        .fold(T::zero(), |acc, &v| acc + (v - m) * (v - m));
    Some(sum_sq / denom)
}

/// Standard error of the mean, using the sample standard deviation (ddof = 1).
pub fn standard_error<T: Float>(values: &[T]) -> Option<T> {
    let var = variance(values, 1)?;
    let n = <T as NumCast>::from(values.len())?;
    Some((var / n).sqrt())
}

/// Signed difference of means, second minus first.
pub fn mean_difference<T: Float>(first: &[T], second: &[T]) -> Option<T> {
    Some(mean(second)? - mean(first)?)
}

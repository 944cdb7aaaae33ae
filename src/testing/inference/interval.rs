//! Confidence-interval overlap test.
//!
//! Each group's mean gets its own t-distribution interval (df = n - 1, scale =
//! standard error of the mean). No pooling is done between the groups. A gene
//! is called significant when the two intervals do not intersect.

use statrs::distribution::{ContinuousCDF, StudentsT};

use crate::testing::descriptive::{mean, standard_error};
use crate::testing::{Group, SampleIssue};

/// Closed interval `[lower, upper]` around a group mean.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConfidenceInterval {
    pub lower: f64,
    pub upper: f64,
}

impl ConfidenceInterval {
    pub fn new(lower: f64, upper: f64) -> Self {
        ConfidenceInterval { lower, upper }
    }
}

/// Outcome of comparing the two groups' intervals for one gene.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IntervalOverlap {
    pub first: ConfidenceInterval,
    pub second: ConfidenceInterval,
    pub intersect: bool,
}

impl IntervalOverlap {
    /// Non-intersecting intervals count as a significant difference.
    pub fn significant(&self) -> bool {
        !self.intersect
    }
}

/// Whether two intervals share at least one point.
///
/// Intervals that only touch at an endpoint intersect, so `[0, 1]` and
/// `[1, 2]` are not a significant difference.
pub fn check_intervals_intersect(first: &ConfidenceInterval, second: &ConfidenceInterval) -> bool {
    first.lower.max(second.lower) <= first.upper.min(second.upper)
}

/// Two-sided t-distribution interval for the mean of `values` at `confidence`.
///
/// Returns `None` with fewer than two observations. A group without dispersion
/// collapses to `[mean, mean]`.
pub fn t_confidence_interval(values: &[f64], confidence: f64) -> Option<ConfidenceInterval> {
    if values.len() < 2 {
        return None;
    }
    let loc = mean(values)?;
    let scale = standard_error(values)?;
    let df = (values.len() - 1) as f64;

    let t_dist = StudentsT::new(0.0, 1.0, df).ok()?;
    let lower_q = t_dist.inverse_cdf((1.0 - confidence) / 2.0);
    let upper_q = t_dist.inverse_cdf((1.0 + confidence) / 2.0);

    Some(ConfidenceInterval::new(
        loc + lower_q * scale,
        loc + upper_q * scale,
    ))
}

/// Compare the confidence intervals of two groups for one gene.
pub fn ci_overlap_test(
    first: &[f64],
    second: &[f64],
    confidence: f64,
) -> Result<IntervalOverlap, SampleIssue> {
    let first_ci = interval_for_group(first, confidence, Group::First)?;
    let second_ci = interval_for_group(second, confidence, Group::Second)?;

    Ok(IntervalOverlap {
        first: first_ci,
        second: second_ci,
        intersect: check_intervals_intersect(&first_ci, &second_ci),
    })
}

fn interval_for_group(
    values: &[f64],
    confidence: f64,
    group: Group,
) -> Result<ConfidenceInterval, SampleIssue> {
    t_confidence_interval(values, confidence).ok_or(SampleIssue::TooFewObservations {
        group,
        observed: values.len(),
        required: 2,
    })
}

//! Per-gene hypothesis tests comparing two groups of samples.
//!
//! - [`interval`]: t-distribution confidence intervals and the interval overlap test
//! - [`parametric`]: the pooled two-sample z-test

pub mod interval;

pub mod parametric;

pub use interval::{check_intervals_intersect, ci_overlap_test, ConfidenceInterval, IntervalOverlap};
pub use parametric::z_test;

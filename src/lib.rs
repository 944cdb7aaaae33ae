//! # single-diffexpr
//!
//! Two-group differential expression analysis for single-cell expression tables, part of the
//! single-rust ecosystem.
//!
//! Given one table per cell group (rows are cells, columns are genes), every gene present in
//! both tables is compared: group means and their difference, an optional confidence-interval
//! overlap test, a pooled two-sample z-test, and an optional multiple testing correction of the
//! z-test p-values across all genes. The outcome is a single results table.
//!
//! ## Core Features
//!
//! - **Confidence-interval overlap**: independent t-distribution intervals per group
//! - **Z-test**: pooled two-sample z-test with two-sided or one-sided alternatives
//! - **Multiple Testing Correction**: Bonferroni, Šidák, Holm, Hochberg, Hommel, BH/BY FDR
//!   and two-stage FDR procedures
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use single_diffexpr::pipeline::{run, AnalysisConfig, AnalysisOptions};
//! use single_diffexpr::testing::correction::CorrectionMethod;
//!
//! let options = AnalysisOptions::default()
//!     .with_ci()
//!     .with_correction(CorrectionMethod::FdrBh, 0.05);
//! let config = AnalysisConfig::new("b_cells.csv", "nk_cells.csv", "b_vs_nk").with_options(options);
//! let results = run(&config).unwrap();
//! println!("{} genes significant", results.num_significant());
//! ```
//!
//! ## Module Organization
//!
//! - **[`io`]**: Expression table loading and result table output
//! - **[`testing`]**: Descriptive statistics, hypothesis tests and multiple testing correction
//! - **[`pipeline`]**: Run configuration and orchestration
//! - **[`cli`]**: Command-line argument surface

pub mod cli;
pub mod error;
pub mod io;
pub mod pipeline;
pub mod testing;

pub use error::{DiffExprError, Result};

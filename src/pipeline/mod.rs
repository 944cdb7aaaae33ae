//! Differential expression pipeline.
//!
//! [`AnalysisConfig`] carries everything a run needs; [`run`] loads both
//! tables, calls [`analyze`] and writes the result table. [`analyze`] itself
//! does no I/O, so it can be driven directly from in-memory tables.

use std::path::PathBuf;

use log::{debug, info, warn};
use ndarray::Array2;
use rayon::prelude::*;

use crate::error::{DiffExprError, Result};
use crate::io::{common_genes, write_results, ExpressionTable};
use crate::testing::correction::{multiple_tests, CorrectionMethod};
use crate::testing::descriptive::{mean, mean_difference, observed_values};
use crate::testing::inference::{ci_overlap_test, z_test};
use crate::testing::{AdjustedPValues, Alternative, DiffExprResults, Group, SampleIssue};

/// Significance threshold of the raw z-test outcome, independent of any correction.
pub const Z_TEST_ALPHA: f64 = 0.05;

/// Confidence level of the per-group intervals.
pub const DEFAULT_CONFIDENCE: f64 = 0.95;

pub const DEFAULT_CORRECTION_ALPHA: f64 = 0.05;

/// What to do with a gene whose samples cannot support a test.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DegeneratePolicy {
    /// Fail the whole run
    #[default]
    Abort,
    /// Drop the gene from the results and log a warning
    Skip,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CorrectionConfig {
    pub method: CorrectionMethod,
    pub alpha: f64,
}

impl Default for CorrectionConfig {
    fn default() -> Self {
        CorrectionConfig {
            method: CorrectionMethod::Bonferroni,
            alpha: DEFAULT_CORRECTION_ALPHA,
        }
    }
}

/// Options of the statistical analysis, independent of file locations.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisOptions {
    /// Run the confidence-interval overlap test
    pub compute_ci: bool,
    pub confidence_level: f64,
    pub alternative: Alternative,
    /// Multiple testing correction, `None` keeps the raw z-test outcome
    pub correction: Option<CorrectionConfig>,
    pub degenerate_policy: DegeneratePolicy,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        AnalysisOptions {
            compute_ci: false,
            confidence_level: DEFAULT_CONFIDENCE,
            alternative: Alternative::TwoSided,
            correction: None,
            degenerate_policy: DegeneratePolicy::Abort,
        }
    }
}

impl AnalysisOptions {
    pub fn with_ci(mut self) -> Self {
        self.compute_ci = true;
        self
    }

    pub fn with_confidence_level(mut self, level: f64) -> Self {
        self.confidence_level = level;
        self
    }

    pub fn with_alternative(mut self, alternative: Alternative) -> Self {
        self.alternative = alternative;
        self
    }

    pub fn with_correction(mut self, method: CorrectionMethod, alpha: f64) -> Self {
        self.correction = Some(CorrectionConfig { method, alpha });
        self
    }

    pub fn with_degenerate_policy(mut self, policy: DegeneratePolicy) -> Self {
        self.degenerate_policy = policy;
        self
    }

    /// Check the numeric parameters before any computation starts.
    pub fn validate(&self) -> Result<()> {
        if !in_open_unit_interval(self.confidence_level) {
            return Err(DiffExprError::InvalidConfig {
                reason: format!(
                    "confidence level must lie strictly between 0 and 1, got {}",
                    self.confidence_level
                ),
            });
        }
        if let Some(correction) = &self.correction {
            if !in_open_unit_interval(correction.alpha) {
                return Err(DiffExprError::InvalidAlpha(correction.alpha));
            }
        }
        Ok(())
    }
}

/// A complete run: two input tables, an output name and the analysis options.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisConfig {
    pub first_input: PathBuf,
    pub second_input: PathBuf,
    /// Output base name, `.csv` is appended
    pub output_name: String,
    pub options: AnalysisOptions,
}

impl AnalysisConfig {
    pub fn new<P, Q>(first_input: P, second_input: Q, output_name: impl Into<String>) -> Self
    where
        P: Into<PathBuf>,
        Q: Into<PathBuf>,
    {
        AnalysisConfig {
            first_input: first_input.into(),
            second_input: second_input.into(),
            output_name: output_name.into(),
            options: AnalysisOptions::default(),
        }
    }

    pub fn with_options(mut self, options: AnalysisOptions) -> Self {
        self.options = options;
        self
    }

    pub fn output_path(&self) -> PathBuf {
        PathBuf::from(format!("{}.csv", self.output_name))
    }

    pub fn validate(&self) -> Result<()> {
        if self.output_name.is_empty() {
            return Err(DiffExprError::InvalidConfig {
                reason: "output name must not be empty".to_string(),
            });
        }
        self.options.validate()
    }
}

/// Validate, load both tables, analyse and write `<output_name>.csv`.
pub fn run(config: &AnalysisConfig) -> Result<DiffExprResults> {
    config.validate()?;

    let first = ExpressionTable::from_path(&config.first_input)?;
    let second = ExpressionTable::from_path(&config.second_input)?;

    let results = analyze(&first, &second, &config.options)?;
    write_results(&results, config.output_path())?;
    Ok(results)
}

/// Per-gene statistics before cross-gene correction.
#[derive(Debug, Clone)]
struct GeneRecord {
    first_mean: f64,
    second_mean: f64,
    mean_difference: f64,
    ci_significant: Option<bool>,
    p_value: f64,
}

/// Compare every gene shared by the two tables.
pub fn analyze(
    first: &ExpressionTable,
    second: &ExpressionTable,
    options: &AnalysisOptions,
) -> Result<DiffExprResults> {
    options.validate()?;

    let genes = common_genes(first, second);
    info!(
        "Comparing {} genes shared by {} and {}",
        genes.len(),
        first.source().display(),
        second.source().display()
    );

    let first_matrix = first.gene_matrix(&genes)?;
    let second_matrix = second.gene_matrix(&genes)?;

    let outcomes: Vec<Result<GeneRecord>> = genes
        .par_iter()
        .enumerate()
        .map(|(j, gene)| analyze_gene(gene, j, &first_matrix, &second_matrix, options))
        .collect();

    let mut results = DiffExprResults::default();
    let mut ci_significant = Vec::new();
    for (gene, outcome) in genes.into_iter().zip(outcomes) {
        let record = match outcome {
            Ok(record) => record,
            Err(e) if e.is_degenerate_gene() && options.degenerate_policy == DegeneratePolicy::Skip => {
                warn!("Skipping gene: {e}");
                continue;
            }
            Err(e) => return Err(e),
        };

        results.gene_names.push(gene);
        results.first_means.push(record.first_mean);
        results.second_means.push(record.second_mean);
        results.mean_differences.push(record.mean_difference);
        ci_significant.extend(record.ci_significant);
        results.p_values.push(record.p_value);
        results.outcome.push(record.p_value < Z_TEST_ALPHA);
    }

    if options.compute_ci {
        results.ci_significant = Some(ci_significant);
    }

    if let Some(correction) = options.correction {
        apply_correction(&mut results, correction)?;
    }

    info!(
        "{} of {} genes differentially expressed",
        results.num_significant(),
        results.len()
    );
    Ok(results)
}

fn analyze_gene(
    gene: &str,
    j: usize,
    first_matrix: &Array2<f64>,
    second_matrix: &Array2<f64>,
    options: &AnalysisOptions,
) -> Result<GeneRecord> {
    let x = observed_values(first_matrix.column(j));
    let y = observed_values(second_matrix.column(j));

    let first_mean = mean(&x).ok_or_else(|| no_observations(gene, Group::First))?;
    let second_mean = mean(&y).ok_or_else(|| no_observations(gene, Group::Second))?;
    let difference = mean_difference(&x, &y).ok_or_else(|| no_observations(gene, Group::First))?;

    let ci_significant = if options.compute_ci {
        let overlap = ci_overlap_test(&x, &y, options.confidence_level)
            .map_err(|issue| sample_issue_error(gene, issue))?;
        Some(overlap.significant())
    } else {
        None
    };

    let z = z_test(&x, &y, options.alternative).map_err(|issue| sample_issue_error(gene, issue))?;

    Ok(GeneRecord {
        first_mean,
        second_mean,
        mean_difference: difference,
        ci_significant,
        p_value: z.p_value,
    })
}

fn apply_correction(results: &mut DiffExprResults, correction: CorrectionConfig) -> Result<()> {
    // The corrector refuses an empty vector
    if results.is_empty() {
        debug!("No genes to correct, skipping {}", correction.method);
        results.adjusted_p_values = Some(AdjustedPValues {
            method: correction.method,
            alpha: correction.alpha,
            values: Vec::new(),
        });
        return Ok(());
    }

    let corrected = multiple_tests(&results.p_values, correction.alpha, correction.method)?;
    debug!(
        "{} correction at alpha {}: {} rejected, per-test thresholds sidak {:.3e}, bonferroni {:.3e}",
        correction.method,
        correction.alpha,
        corrected.num_rejected(),
        corrected.alpha_sidak,
        corrected.alpha_bonferroni
    );

    results.outcome = corrected.reject;
    results.adjusted_p_values = Some(AdjustedPValues {
        method: correction.method,
        alpha: correction.alpha,
        values: corrected.adjusted_p_values,
    });
    Ok(())
}

fn no_observations(gene: &str, group: Group) -> DiffExprError {
    DiffExprError::Numeric {
        gene: gene.to_string(),
        table: group.label().to_string(),
        reason: "no numeric observations".to_string(),
    }
}

fn sample_issue_error(gene: &str, issue: SampleIssue) -> DiffExprError {
    match issue {
        SampleIssue::TooFewObservations { group, observed, .. } => {
            DiffExprError::InsufficientSample {
                gene: gene.to_string(),
                table: group.label().to_string(),
                observed,
            }
        }
        SampleIssue::ZeroStandardError => DiffExprError::DegenerateVariance {
            gene: gene.to_string(),
        },
    }
}

fn in_open_unit_interval(value: f64) -> bool {
    value > 0.0 && value < 1.0
}

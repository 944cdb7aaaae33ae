//! Command-line interface for diffexpr

use std::path::PathBuf;

use clap::Parser;

use crate::error::{DiffExprError, Result};
use crate::pipeline::{AnalysisConfig, AnalysisOptions, DegeneratePolicy};
use crate::testing::correction::CorrectionMethod;

#[derive(Parser, Debug)]
#[command(name = "diffexpr")]
#[command(version)]
#[command(about = "Differential expression analysis")]
#[command(
    long_about = "Differential expression analysis between two groups of cells.\n\n\
        For every gene present in both tables: group means, mean difference,\n\
        an optional confidence-interval overlap test, a two-sample z-test and\n\
        an optional multiple-comparisons correction of the z-test p-values.",
    after_long_help = "\
Examples:
  # Flag style, with CI test and Benjamini-Hochberg correction
  diffexpr --fi b_cells.csv --si nk_cells.csv --out b_vs_nk --ci --adj --adj_method fdr_bh

  # Positional style (CI test always on, no correction)
  diffexpr b_cells.csv nk_cells.csv b_vs_nk"
)]
pub struct Cli {
    /// Path to first (control) .csv file
    #[arg(long = "fi", value_name = "PATH")]
    pub first_input: Option<PathBuf>,

    /// Path to second (experiment) .csv file
    #[arg(long = "si", value_name = "PATH")]
    pub second_input: Option<PathBuf>,

    /// Results table name (.csv is appended)
    #[arg(long = "out", value_name = "NAME")]
    pub out: Option<String>,

    /// Test whether the groups' confidence intervals intersect
    #[arg(long = "ci")]
    pub ci: bool,

    /// Correct p-values for multiple comparisons
    #[arg(long = "adj")]
    pub adj: bool,

    /// P-value correction method for multiple comparisons
    #[arg(
        long = "adj_method",
        default_value = "bonferroni",
        long_help = "P-value correction method for multiple comparisons.\n\
            One of: bonferroni, sidak, holm-sidak, holm, simes-hochberg, hommel,\n\
            fdr_bh, fdr_by, fdr_tsbh, fdr_tsbky"
    )]
    pub adj_method: String,

    /// Alpha for multiple comparisons
    #[arg(long = "adj_alpha", default_value_t = 0.05, allow_negative_numbers = true)]
    pub adj_alpha: f64,

    /// Drop genes with too few samples or zero variance instead of failing
    #[arg(long = "skip_degenerate")]
    pub skip_degenerate: bool,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// First table (positional style)
    #[arg(value_name = "FIRST")]
    pub first: Option<PathBuf>,

    /// Second table (positional style)
    #[arg(value_name = "SECOND")]
    pub second: Option<PathBuf>,

    /// Results table name (positional style)
    #[arg(value_name = "OUTPUT")]
    pub output: Option<String>,
}

impl Cli {
    fn uses_positional(&self) -> bool {
        self.first.is_some() || self.second.is_some() || self.output.is_some()
    }

    /// Turn parsed arguments into a validated run configuration.
    pub fn into_config(self) -> Result<AnalysisConfig> {
        let policy = if self.skip_degenerate {
            DegeneratePolicy::Skip
        } else {
            DegeneratePolicy::Abort
        };

        let config = if self.uses_positional() {
            self.positional_config(policy)?
        } else {
            self.flag_config(policy)?
        };

        config.validate()?;
        Ok(config)
    }

    fn positional_config(self, policy: DegeneratePolicy) -> Result<AnalysisConfig> {
        if self.first_input.is_some() || self.second_input.is_some() || self.out.is_some() {
            return Err(invalid("positional arguments cannot be combined with --fi, --si or --out"));
        }
        if self.adj {
            return Err(invalid("--adj is not available with positional arguments"));
        }

        let (Some(first), Some(second), Some(output)) = (self.first, self.second, self.output)
        else {
            return Err(invalid("positional style needs FIRST SECOND OUTPUT"));
        };

        let options = AnalysisOptions::default()
            .with_ci()
            .with_degenerate_policy(policy);
        Ok(AnalysisConfig::new(first, second, output).with_options(options))
    }

    fn flag_config(self, policy: DegeneratePolicy) -> Result<AnalysisConfig> {
        // Validated even when --adj is absent
        let method: CorrectionMethod = self.adj_method.parse()?;
        if self.adj_alpha.is_nan() || self.adj_alpha <= 0.0 || self.adj_alpha >= 1.0 {
            return Err(DiffExprError::InvalidAlpha(self.adj_alpha));
        }

        let first = self.first_input.ok_or_else(|| invalid("--fi is required"))?;
        let second = self.second_input.ok_or_else(|| invalid("--si is required"))?;
        let out = self.out.ok_or_else(|| invalid("--out is required"))?;

        let mut options = AnalysisOptions::default().with_degenerate_policy(policy);
        if self.ci {
            options = options.with_ci();
        }
        if self.adj {
            options = options.with_correction(method, self.adj_alpha);
        }
        Ok(AnalysisConfig::new(first, second, out).with_options(options))
    }
}

fn invalid(reason: &str) -> DiffExprError {
    DiffExprError::InvalidConfig {
        reason: reason.to_string(),
    }
}

use num_traits::Float;

use crate::testing::correction::CorrectionMethod;

pub mod correction;
pub mod descriptive;
pub mod inference;

/// Alternative hypothesis for the two-sample tests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Alternative {
    #[default]
    TwoSided,
    /// Mean of the first group is larger than the second
    Larger,
    /// Mean of the first group is smaller than the second
    Smaller,
}

/// Which of the two compared groups a value or problem belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Group {
    First,
    Second,
}

impl Group {
    pub fn label(&self) -> &'static str {
        match self {
            Group::First => "first",
            Group::Second => "second",
        }
    }
}

/// Why a per-gene statistic could not be computed from its samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleIssue {
    /// A group holds fewer observations than the statistic needs
    TooFewObservations {
        group: Group,
        observed: usize,
        required: usize,
    },
    /// The standard error of the test statistic is zero
    ZeroStandardError,
}

#[derive(Debug, Clone)]
pub struct TestResult<T> {
    /// The test statistic value (e.g., z-statistic)
    pub statistic: T,
    /// The p-value of the test
    pub p_value: T,
    /// Effect size measurement (difference of group means)
    pub effect_size: Option<T>,
    /// Standard error of the test statistic's numerator
    pub standard_error: Option<T>,
}

impl<T> TestResult<T>
where
    T: Float,
{
    /// Create a new test result with minimal information
    pub fn new(statistic: T, p_value: T) -> Self {
        TestResult {
            statistic,
            p_value,
            effect_size: None,
            standard_error: None,
        }
    }

    /// Add effect size to the result
    pub fn with_effect_size(mut self, effect_size: T) -> Self {
        self.effect_size = Some(effect_size);
        self
    }

    /// Add standard error to the result
    pub fn with_standard_error(mut self, se: T) -> Self {
        self.standard_error = Some(se);
        self
    }

    /// Check if the result is statistically significant at the given threshold
    pub fn is_significant(&self, alpha: T) -> bool {
        self.p_value < alpha
    }
}

/// Adjusted p-values together with the correction that produced them.
#[derive(Debug, Clone)]
pub struct AdjustedPValues {
    pub method: CorrectionMethod,
    pub alpha: f64,
    pub values: Vec<f64>,
}

impl AdjustedPValues {
    /// Output column name, embedding method and alpha.
    pub fn column_name(&self) -> String {
        format!(
            "p_values_adjusted_method_{}_alpha_{}",
            self.method,
            crate::io::format_float(self.alpha)
        )
    }
}

/// Per-gene results of one differential expression run, column by column.
///
/// Every vector is aligned positionally with `gene_names`. Optional analyses
/// that were not requested stay `None` and are left out of the written table.
#[derive(Debug, Clone, Default)]
pub struct DiffExprResults {
    pub gene_names: Vec<String>,
    /// Mean expression in the first group
    pub first_means: Vec<f64>,
    /// Mean expression in the second group
    pub second_means: Vec<f64>,
    /// `second_means - first_means`
    pub mean_differences: Vec<f64>,
    /// `true` where the two confidence intervals do not intersect
    pub ci_significant: Option<Vec<bool>>,
    /// Raw z-test p-values
    pub p_values: Vec<f64>,
    pub adjusted_p_values: Option<AdjustedPValues>,
    /// Final verdict: corrected rejection if a correction ran, else `p < 0.05`
    pub outcome: Vec<bool>,
}

impl DiffExprResults {
    pub fn len(&self) -> usize {
        self.gene_names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.gene_names.is_empty()
    }

    /// Get indices of genes whose final outcome is significant
    pub fn significant_indices(&self) -> Vec<usize> {
        self.outcome
            .iter()
            .enumerate()
            .filter_map(|(i, &sig)| if sig { Some(i) } else { None })
            .collect()
    }

    /// Get the number of genes whose final outcome is significant
    pub fn num_significant(&self) -> usize {
        self.outcome.iter().filter(|&&sig| sig).count()
    }

    /// Names of the genes whose final outcome is significant
    pub fn significant_genes(&self) -> Vec<&str> {
        self.significant_indices()
            .into_iter()
            .map(|i| self.gene_names[i].as_str())
            .collect()
    }
}

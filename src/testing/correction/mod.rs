use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use crate::error::{DiffExprError, Result};

/// Multiple testing correction methods to control for false positives
/// when performing many statistical tests simultaneously.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CorrectionMethod {
    /// One-step family-wise control, `p * n`
    Bonferroni,
    /// One-step family-wise control, `1 - (1 - p)^n`
    Sidak,
    /// Step-down Šidák
    HolmSidak,
    /// Step-down Bonferroni
    Holm,
    /// Step-up Hochberg
    SimesHochberg,
    /// Hommel's closed testing procedure
    Hommel,
    /// Benjamini-Hochberg false discovery rate
    FdrBh,
    /// Benjamini-Yekutieli false discovery rate under arbitrary dependence
    FdrBy,
    /// Two-stage Benjamini-Hochberg
    FdrTsbh,
    /// Two-stage Benjamini-Krieger-Yekutieli
    FdrTsbky,
}

impl CorrectionMethod {
    pub const ALL: [CorrectionMethod; 10] = [
        CorrectionMethod::Bonferroni,
        CorrectionMethod::Sidak,
        CorrectionMethod::HolmSidak,
        CorrectionMethod::Holm,
        CorrectionMethod::SimesHochberg,
        CorrectionMethod::Hommel,
        CorrectionMethod::FdrBh,
        CorrectionMethod::FdrBy,
        CorrectionMethod::FdrTsbh,
        CorrectionMethod::FdrTsbky,
    ];

    /// Name accepted on the command line and embedded in output column names.
    pub fn name(&self) -> &'static str {
        match self {
            CorrectionMethod::Bonferroni => "bonferroni",
            CorrectionMethod::Sidak => "sidak",
            CorrectionMethod::HolmSidak => "holm-sidak",
            CorrectionMethod::Holm => "holm",
            CorrectionMethod::SimesHochberg => "simes-hochberg",
            CorrectionMethod::Hommel => "hommel",
            CorrectionMethod::FdrBh => "fdr_bh",
            CorrectionMethod::FdrBy => "fdr_by",
            CorrectionMethod::FdrTsbh => "fdr_tsbh",
            CorrectionMethod::FdrTsbky => "fdr_tsbky",
        }
    }

    pub fn names() -> Vec<&'static str> {
        Self::ALL.iter().map(|m| m.name()).collect()
    }
}

impl fmt::Display for CorrectionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for CorrectionMethod {
    type Err = DiffExprError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|m| m.name() == s)
            .ok_or_else(|| DiffExprError::InvalidMethod(s.to_string()))
    }
}

/// Output of a multiple testing correction, in the order of the input p-values.
#[derive(Debug, Clone)]
pub struct CorrectionResult {
    /// `true` where the null hypothesis is rejected at the requested alpha
    pub reject: Vec<bool>,
    /// Adjusted p-values, capped at 1
    pub adjusted_p_values: Vec<f64>,
    /// Per-test Šidák threshold `1 - (1 - alpha)^(1/n)`
    pub alpha_sidak: f64,
    /// Per-test Bonferroni threshold `alpha / n`
    pub alpha_bonferroni: f64,
}

impl CorrectionResult {
    pub fn num_rejected(&self) -> usize {
        self.reject.iter().filter(|&&r| r).count()
    }
}

/// Adjust a vector of p-values for multiple comparisons.
///
/// The correction is applied across the whole vector, so the output depends on
/// every input value; outputs are aligned positionally with `p_values`.
///
/// # Arguments
/// * `p_values` - Raw p-values, one per tested feature
/// * `alpha` - Family-wise error rate or false discovery rate to control
/// * `method` - Correction procedure
///
/// # Returns
/// * `Result<CorrectionResult>` - Rejection decisions and adjusted p-values
///
/// # Example
/// ```
/// use single_diffexpr::testing::correction::{multiple_tests, CorrectionMethod};
///
/// let result = multiple_tests(&[0.01, 0.04, 0.03], 0.05, CorrectionMethod::Holm).unwrap();
/// assert_eq!(result.reject, vec![true, false, false]);
/// ```
pub fn multiple_tests(
    p_values: &[f64],
    alpha: f64,
    method: CorrectionMethod,
) -> Result<CorrectionResult> {
    let n = p_values.len();

    if n == 0 {
        return Err(DiffExprError::EmptyInput);
    }

    if alpha.is_nan() || alpha <= 0.0 || alpha >= 1.0 {
        return Err(DiffExprError::InvalidAlpha(alpha));
    }

    // Validate p-values
    for (index, &value) in p_values.iter().enumerate() {
        if !(0.0..=1.0).contains(&value) {
            return Err(DiffExprError::InvalidPValue { index, value });
        }
    }

    // Work on ascending p-values, then scatter back to input order
    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| {
        p_values[a]
            .partial_cmp(&p_values[b])
            .unwrap_or(Ordering::Equal)
    });
    let sorted: Vec<f64> = order.iter().map(|&i| p_values[i]).collect();

    let (sorted_reject, mut sorted_adjusted) = match method {
        CorrectionMethod::Bonferroni => bonferroni(&sorted, alpha),
        CorrectionMethod::Sidak => sidak(&sorted, alpha),
        CorrectionMethod::HolmSidak => holm_sidak(&sorted, alpha),
        CorrectionMethod::Holm => holm(&sorted, alpha),
        CorrectionMethod::SimesHochberg => simes_hochberg(&sorted, alpha),
        CorrectionMethod::Hommel => hommel(&sorted, alpha),
        CorrectionMethod::FdrBh => fdr_correction(&sorted, alpha, false),
        CorrectionMethod::FdrBy => fdr_correction(&sorted, alpha, true),
        CorrectionMethod::FdrTsbh => fdr_two_stage(&sorted, alpha, TwoStage::BenjaminiHochberg),
        CorrectionMethod::FdrTsbky => {
            fdr_two_stage(&sorted, alpha, TwoStage::BenjaminiKriegerYekutieli)
        }
    };

    for p in sorted_adjusted.iter_mut() {
        *p = p.min(1.0);
    }

    let mut reject = vec![false; n];
    let mut adjusted_p_values = vec![0.0; n];
    for (rank, &orig_idx) in order.iter().enumerate() {
        reject[orig_idx] = sorted_reject[rank];
        adjusted_p_values[orig_idx] = sorted_adjusted[rank];
    }

    Ok(CorrectionResult {
        reject,
        adjusted_p_values,
        alpha_sidak: 1.0 - (1.0 - alpha).powf(1.0 / n as f64),
        alpha_bonferroni: alpha / n as f64,
    })
}

// All procedures below take p-values sorted in ascending order.

fn bonferroni(sorted: &[f64], alpha: f64) -> (Vec<bool>, Vec<f64>) {
    let n = sorted.len() as f64;
    let reject = sorted.iter().map(|&p| p <= alpha / n).collect();
    let adjusted = sorted.iter().map(|&p| p * n).collect();
    (reject, adjusted)
}

fn sidak(sorted: &[f64], alpha: f64) -> (Vec<bool>, Vec<f64>) {
    let n = sorted.len() as f64;
    let threshold = 1.0 - (1.0 - alpha).powf(1.0 / n);
    let reject = sorted.iter().map(|&p| p <= threshold).collect();
    let adjusted = sorted.iter().map(|&p| -(n * (-p).ln_1p()).exp_m1()).collect();
    (reject, adjusted)
}

fn holm_sidak(sorted: &[f64], alpha: f64) -> (Vec<bool>, Vec<f64>) {
    let n = sorted.len();
    let thresholds: Vec<f64> = (0..n)
        .map(|i| 1.0 - (1.0 - alpha).powf(1.0 / (n - i) as f64))
        .collect();
    let reject = step_down_reject(sorted, &thresholds);

    let raw = sorted
        .iter()
        .enumerate()
        .map(|(i, &p)| -((n - i) as f64 * (-p).ln_1p()).exp_m1());
    (reject, running_max(raw))
}

fn holm(sorted: &[f64], alpha: f64) -> (Vec<bool>, Vec<f64>) {
    let n = sorted.len();
    let thresholds: Vec<f64> = (0..n).map(|i| alpha / (n - i) as f64).collect();
    let reject = step_down_reject(sorted, &thresholds);

    let raw = sorted.iter().enumerate().map(|(i, &p)| p * (n - i) as f64);
    (reject, running_max(raw))
}

fn simes_hochberg(sorted: &[f64], alpha: f64) -> (Vec<bool>, Vec<f64>) {
    let n = sorted.len();
    let thresholds: Vec<f64> = (0..n).map(|i| alpha / (n - i) as f64).collect();
    let reject = step_up_reject(sorted, &thresholds);

    let raw: Vec<f64> = sorted
        .iter()
        .enumerate()
        .map(|(i, &p)| p * (n - i) as f64)
        .collect();
    (reject, reverse_running_min(raw))
}

fn hommel(sorted: &[f64], alpha: f64) -> (Vec<bool>, Vec<f64>) {
    let n = sorted.len();
    let mut adjusted = sorted.to_vec();

    for m in (2..=n).rev() {
        let mf = m as f64;
        let tail = n - m;
        let cim = (0..m)
            .map(|k| mf * sorted[tail + k] / (k + 1) as f64)
            .fold(f64::INFINITY, f64::min);

        for a in adjusted[tail..].iter_mut() {
            *a = a.max(cim);
        }
        for (a, &p) in adjusted[..tail].iter_mut().zip(&sorted[..tail]) {
            *a = a.max((mf * p).min(cim));
        }
    }

    let reject = adjusted.iter().map(|&a| a <= alpha).collect();
    (reject, adjusted)
}

/// Benjamini-Hochberg (or, with `dependent`, Benjamini-Yekutieli) step-up.
fn fdr_correction(sorted: &[f64], alpha: f64, dependent: bool) -> (Vec<bool>, Vec<f64>) {
    let n = sorted.len();
    let c_n: f64 = if dependent {
        (1..=n).map(|i| 1.0 / i as f64).sum()
    } else {
        1.0
    };
    let ecdf: Vec<f64> = (1..=n).map(|rank| rank as f64 / n as f64 / c_n).collect();

    let thresholds: Vec<f64> = ecdf.iter().map(|&e| e * alpha).collect();
    let reject = step_up_reject(sorted, &thresholds);

    let raw: Vec<f64> = sorted.iter().zip(&ecdf).map(|(&p, &e)| p / e).collect();
    let adjusted = reverse_running_min(raw)
        .into_iter()
        .map(|p| p.min(1.0))
        .collect();
    (reject, adjusted)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TwoStage {
    BenjaminiHochberg,
    BenjaminiKriegerYekutieli,
}

/// Two-stage adaptive FDR: a first BH pass estimates the number of true
/// nulls, a second pass runs at the correspondingly inflated level.
fn fdr_two_stage(sorted: &[f64], alpha: f64, variant: TwoStage) -> (Vec<bool>, Vec<f64>) {
    let n = sorted.len() as f64;
    let fact = match variant {
        TwoStage::BenjaminiHochberg => 1.0,
        TwoStage::BenjaminiKriegerYekutieli => 1.0 + alpha,
    };
    let alpha_prime = alpha / fact;

    let (reject, adjusted) = fdr_correction(sorted, alpha_prime, false);
    let first_rejections = reject.iter().filter(|&&r| r).count();

    if first_rejections == 0 || first_rejections == sorted.len() {
        let adjusted = adjusted.into_iter().map(|p| (p * fact).min(1.0)).collect();
        return (reject, adjusted);
    }

    let n_null = n - first_rejections as f64;
    let alpha_star = alpha_prime * n / n_null;
    let (reject, adjusted) = fdr_correction(sorted, alpha_star, false);

    let adjusted = adjusted
        .into_iter()
        .map(|p| (p * n_null / n * fact).min(1.0))
        .collect();
    (reject, adjusted)
}

/// Reject every hypothesis before the first p-value above its threshold.
fn step_down_reject(sorted: &[f64], thresholds: &[f64]) -> Vec<bool> {
    let first_accept = sorted
        .iter()
        .zip(thresholds)
        .position(|(&p, &t)| p > t)
        .unwrap_or(sorted.len());
    (0..sorted.len()).map(|i| i < first_accept).collect()
}

/// Reject every hypothesis up to the last p-value within its threshold.
fn step_up_reject(sorted: &[f64], thresholds: &[f64]) -> Vec<bool> {
    match sorted
        .iter()
        .zip(thresholds)
        .rposition(|(&p, &t)| p <= t)
    {
        Some(last) => (0..sorted.len()).map(|i| i <= last).collect(),
        None => vec![false; sorted.len()],
    }
}

fn running_max(values: impl Iterator<Item = f64>) -> Vec<f64> {
    let mut current = f64::NEG_INFINITY;
    values
        .map(|v| {
            current = current.max(v);
            current
        })
        .collect()
}

fn reverse_running_min(mut values: Vec<f64>) -> Vec<f64> {
    let mut current = f64::INFINITY;
    for v in values.iter_mut().rev() {
        current = current.min(*v);
        *v = current;
    }
    values
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn assert_vec_relative_eq(a: &[f64], b: &[f64], epsilon: f64) {
        assert_eq!(a.len(), b.len(), "Vectors have different lengths");
        for (i, (x, y)) in a.iter().zip(b.iter()).enumerate() {
            if (x - y).abs() > epsilon {
                panic!("Vectors differ at index {}: {} != {}", i, x, y);
            }
        }
    }

    const P4: [f64; 4] = [0.01, 0.04, 0.03, 0.005];
    const P10: [f64; 10] = [
        0.001, 0.008, 0.039, 0.041, 0.042, 0.06, 0.074, 0.205, 0.212, 0.216,
    ];

    fn run(p: &[f64], method: CorrectionMethod) -> CorrectionResult {
        multiple_tests(p, 0.05, method).unwrap()
    }

    #[test]
    fn test_bonferroni() {
        let p_values = vec![0.01, 0.02, 0.03, 0.1, 0.2];
        let result = run(&p_values, CorrectionMethod::Bonferroni);
        assert_vec_relative_eq(&result.adjusted_p_values, &[0.05, 0.1, 0.15, 0.5, 1.0], 1e-10);
        assert_eq!(result.reject, vec![true, false, false, false, false]);
        assert_relative_eq!(result.alpha_bonferroni, 0.01);
    }

    #[test]
    fn test_bonferroni_never_below_raw() {
        let inputs: [&[f64]; 4] = [&P4, &P10, &[1.0], &[0.0, 0.5, 0.999]];
        for p_values in inputs {
            let result = run(p_values, CorrectionMethod::Bonferroni);
            for (adj, raw) in result.adjusted_p_values.iter().zip(p_values) {
                assert!(adj >= raw);
            }
        }
    }

    #[test]
    fn test_sidak() {
        let result = run(&P4, CorrectionMethod::Sidak);
        assert_vec_relative_eq(
            &result.adjusted_p_values,
            &[0.03940399, 0.15065344, 0.11470719, 0.019850499375],
            1e-10,
        );
        assert_eq!(result.reject, vec![true, false, false, true]);
        assert_relative_eq!(result.alpha_sidak, 1.0 - 0.95f64.powf(0.25), epsilon = 1e-15);
    }

    #[test]
    fn test_holm_sidak() {
        let result = run(&P4, CorrectionMethod::HolmSidak);
        assert_vec_relative_eq(
            &result.adjusted_p_values,
            &[0.029701, 0.0591, 0.0591, 0.019850499375],
            1e-10,
        );
        assert_eq!(result.reject, vec![true, false, false, true]);
    }

    #[test]
    fn test_holm() {
        let result = run(&P4, CorrectionMethod::Holm);
        assert_vec_relative_eq(&result.adjusted_p_values, &[0.03, 0.06, 0.06, 0.02], 1e-10);
        assert_eq!(result.reject, vec![true, false, false, true]);

        let result = run(&[0.01, 0.02, 0.03], CorrectionMethod::Holm);
        assert_vec_relative_eq(&result.adjusted_p_values, &[0.03, 0.04, 0.04], 1e-10);
    }

    #[test]
    fn test_simes_hochberg() {
        let result = run(&P4, CorrectionMethod::SimesHochberg);
        assert_vec_relative_eq(&result.adjusted_p_values, &[0.03, 0.04, 0.04, 0.02], 1e-10);
        assert_eq!(result.reject, vec![true, true, true, true]);
    }

    #[test]
    fn test_hommel() {
        let result = run(&P4, CorrectionMethod::Hommel);
        assert_vec_relative_eq(&result.adjusted_p_values, &[0.03, 0.04, 0.04, 0.02], 1e-10);

        let result = run(&P10, CorrectionMethod::Hommel);
        assert_vec_relative_eq(
            &result.adjusted_p_values,
            &[0.01, 0.072, 0.185, 0.185, 0.185, 0.216, 0.216, 0.216, 0.216, 0.216],
            1e-10,
        );
        assert_eq!(result.num_rejected(), 1);
        assert!(result.reject[0]);
    }

    #[test]
    fn test_benjamini_hochberg_ordered_pvalues() {
        let p_values = vec![0.01, 0.02, 0.03, 0.04, 0.05];
        let result = run(&p_values, CorrectionMethod::FdrBh);
        assert_vec_relative_eq(&result.adjusted_p_values, &[0.05; 5], 1e-10);
        assert!(result.reject.iter().all(|&r| r));
    }

    #[test]
    fn test_benjamini_hochberg_unordered_pvalues() {
        let p_values = vec![0.05, 0.01, 0.1, 0.04, 0.02];
        let result = run(&p_values, CorrectionMethod::FdrBh);
        assert_vec_relative_eq(
            &result.adjusted_p_values,
            &[0.0625, 0.05, 0.1, 0.0625, 0.05],
            1e-10,
        );
        assert_eq!(result.reject, vec![false, true, false, false, true]);
    }

    #[test]
    fn test_benjamini_hochberg_real_example() {
        let pvalues = vec![0.1, 0.2, 0.3, 0.4, 0.1];
        let expected = [0.25, 0.3333333333333333, 0.375, 0.4, 0.25];
        let result = run(&pvalues, CorrectionMethod::FdrBh);
        assert_vec_relative_eq(&result.adjusted_p_values, &expected, 1e-10);
        assert_eq!(result.num_rejected(), 0);
    }

    #[test]
    fn test_benjamini_yekutieli() {
        let result = run(&P4, CorrectionMethod::FdrBy);
        let expected = [
            0.04166666666666666,
            0.08333333333333331,
            0.08333333333333331,
            0.04166666666666666,
        ];
        assert_vec_relative_eq(&result.adjusted_p_values, &expected, 1e-10);
        assert_eq!(result.reject, vec![true, false, false, true]);
    }

    #[test]
    fn test_two_stage_all_rejected_in_first_stage() {
        let result = run(&P4, CorrectionMethod::FdrTsbh);
        assert_vec_relative_eq(&result.adjusted_p_values, &[0.02, 0.04, 0.04, 0.02], 1e-10);

        let result = run(&P4, CorrectionMethod::FdrTsbky);
        assert_vec_relative_eq(
            &result.adjusted_p_values,
            &[0.021, 0.042, 0.042, 0.021],
            1e-10,
        );
        assert_eq!(result.num_rejected(), 4);
    }

    #[test]
    fn test_two_stage_second_pass() {
        let result = run(&P10, CorrectionMethod::FdrTsbh);
        assert_vec_relative_eq(
            &result.adjusted_p_values,
            &[
                0.008, 0.032, 0.0672, 0.0672, 0.0672, 0.08, 0.08457142857142858, 0.1728,
                0.1728, 0.1728,
            ],
            1e-10,
        );
        assert_eq!(result.num_rejected(), 2);

        let result = run(&P10, CorrectionMethod::FdrTsbky);
        assert_vec_relative_eq(
            &result.adjusted_p_values,
            &[
                0.0084, 0.0336, 0.07056, 0.07056, 0.07056, 0.084, 0.0888, 0.18144, 0.18144,
                0.18144,
            ],
            1e-10,
        );
        assert_eq!(result.reject[..3], [true, true, false]);
    }

    #[test]
    fn test_method_names_round_trip() {
        for method in CorrectionMethod::ALL {
            assert_eq!(method.name().parse::<CorrectionMethod>().unwrap(), method);
        }
        assert_eq!(CorrectionMethod::HolmSidak.to_string(), "holm-sidak");
    }

    #[test]
    fn test_unknown_method() {
        let err = "bh".parse::<CorrectionMethod>().unwrap_err();
        assert!(matches!(err, DiffExprError::InvalidMethod(ref name) if name == "bh"));
        assert!(err.to_string().contains("fdr_bh"));
    }

    #[test]
    fn test_invalid_inputs() {
        // Empty array
        let err = multiple_tests(&[], 0.05, CorrectionMethod::Bonferroni).unwrap_err();
        assert_eq!(err.to_string(), "Empty p-value array");

        // Invalid alpha
        assert!(matches!(
            multiple_tests(&[0.5], 1.0, CorrectionMethod::Holm),
            Err(DiffExprError::InvalidAlpha(_))
        ));

        // Invalid p-values
        let err = multiple_tests(&[0.01, 1.5, 0.03], 0.05, CorrectionMethod::FdrBh).unwrap_err();
        assert!(err.to_string().contains("Invalid p-value at index 1"));
        assert!(multiple_tests(&[f64::NAN], 0.05, CorrectionMethod::FdrBh).is_err());
    }

    #[test]
    fn test_single_pvalue_unchanged_by_fdr() {
        let result = run(&[0.025], CorrectionMethod::FdrBh);
        assert_relative_eq!(result.adjusted_p_values[0], 0.025, epsilon = 1e-12);
        assert!(result.reject[0]);
    }
}

//! Monte Carlo Confidence-Interval Coverage
//!
//! Measures how often a nominal (1 − α) interval built from each trial's point
//! estimate and standard error contains the known true parameter, and bounds
//! the uncertainty of that observed rate with a Wald interval.
//!
//! ## Procedure
//! 1. Student-t critical value `q` for the trial's degrees of freedom
//! 2. Per-trial interval `estimate ± q·se`, boundaries inclusive
//! 3. Coverage probability `p` = fraction of intervals containing the truth
//! 4. Wald bounds `p ± z·sqrt(p(1 − p)/N)`, left unclamped

use serde::{Deserialize, Serialize};

use crate::critical::{check_level, t_critical, WaldCritical};
use crate::error::{CoverageError, Result};

pub const DEFAULT_CONFIDENCE_LEVEL: f64 = 0.95;

#[derive(Clone, Debug, PartialEq)]
pub enum DegreesOfFreedom {
    Shared(f64),
    PerTrial(Vec<f64>),
}

impl DegreesOfFreedom {
    fn validate(&self, trials: usize) -> Result<()> {
        let values: &[f64] = match self {
            Self::Shared(df) => std::slice::from_ref(df),
            Self::PerTrial(dfs) => {
                if dfs.len() != trials {
                    return Err(CoverageError::InvalidInput(format!(
                        "{} per-trial degrees of freedom for {} trials",
                        dfs.len(),
                        trials
                    )));
                }
                dfs
            }
        };
        if let Some(bad) = values.iter().find(|df| !(**df > 0.0)) {
            return Err(CoverageError::InvalidInput(format!(
                "degrees of freedom must be positive, got {bad}"
            )));
        }
        Ok(())
    }
}

impl From<f64> for DegreesOfFreedom {
    fn from(df: f64) -> Self {
        Self::Shared(df)
    }
}

impl From<Vec<f64>> for DegreesOfFreedom {
    fn from(dfs: Vec<f64>) -> Self {
        Self::PerTrial(dfs)
    }
}

/// Validated sequence of trials produced by a simulation driver.
#[derive(Clone, Debug, PartialEq)]
pub struct EstimateSample {
    point_estimates: Vec<f64>,
    standard_errors: Vec<f64>,
    degrees_of_freedom: DegreesOfFreedom,
}

impl EstimateSample {
    pub fn new(
        point_estimates: Vec<f64>,
        standard_errors: Vec<f64>,
        degrees_of_freedom: impl Into<DegreesOfFreedom>,
    ) -> Result<Self> {
        let degrees_of_freedom = degrees_of_freedom.into();
        validate_trials(&point_estimates, &standard_errors, &degrees_of_freedom)?;
        Ok(Self {
            point_estimates,
            standard_errors,
            degrees_of_freedom,
        })
    }

    pub fn len(&self) -> usize {
        self.point_estimates.len()
    }

    /// Always false for a constructed sample.
    pub fn is_empty(&self) -> bool {
        self.point_estimates.is_empty()
    }

    pub fn point_estimates(&self) -> &[f64] {
        &self.point_estimates
    }

    pub fn standard_errors(&self) -> &[f64] {
        &self.standard_errors
    }

    pub fn degrees_of_freedom(&self) -> &DegreesOfFreedom {
        &self.degrees_of_freedom
    }

    pub fn mean_estimate(&self) -> f64 {
        self.point_estimates.iter().sum::<f64>() / self.len() as f64
    }

    pub fn mean_standard_error(&self) -> f64 {
        self.standard_errors.iter().sum::<f64>() / self.len() as f64
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrialInterval {
    pub lower: f64,
    pub upper: f64,
}

impl TrialInterval {
    pub fn contains(&self, value: f64) -> bool {
        self.lower <= value && value <= self.upper
    }

    pub fn width(&self) -> f64 {
        self.upper - self.lower
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CoverageResult {
    pub coverage_probability: f64,
    /// Raw Wald bound; may fall below 0.
    pub interval_low: f64,
    /// Raw Wald bound; may exceed 1.
    pub interval_high: f64,
    pub trials: usize,
    pub hits: usize,
}

impl CoverageResult {
    /// Wald bounds clamped to [0, 1]. The raw fields are left untouched.
    pub fn clamped(&self) -> (f64, f64) {
        (
            self.interval_low.clamp(0.0, 1.0),
            self.interval_high.clamp(0.0, 1.0),
        )
    }

    /// Whether `probability` falls inside the raw Wald interval.
    pub fn contains(&self, probability: f64) -> bool {
        self.interval_low <= probability && probability <= self.interval_high
    }

    pub fn print(&self) {
        let (low, high) = self.clamped();
        println!("  Trials:                  {}", self.trials);
        println!("  Intervals covering:      {}", self.hits);
        println!("  Coverage probability:    {:.2}%", self.coverage_probability * 100.0);
        println!(
            "  Wald interval (raw):     [{:.4}, {:.4}]",
            self.interval_low, self.interval_high
        );
        println!("  Wald interval (clamped): [{:.4}, {:.4}]", low, high);
    }
}

/// Coverage estimator with explicit inner and outer confidence settings.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CoverageEstimator {
    pub confidence_level: f64,
    pub wald: WaldCritical,
}

impl Default for CoverageEstimator {
    fn default() -> Self {
        Self {
            confidence_level: DEFAULT_CONFIDENCE_LEVEL,
            wald: WaldCritical::default(),
        }
    }
}

impl CoverageEstimator {
    pub fn with_confidence_level(mut self, confidence_level: f64) -> Self {
        self.confidence_level = confidence_level;
        self
    }

    pub fn with_wald(mut self, wald: WaldCritical) -> Self {
        self.wald = wald;
        self
    }

    pub fn estimate(&self, sample: &EstimateSample, true_value: f64) -> Result<CoverageResult> {
        self.estimate_raw(
            &sample.point_estimates,
            &sample.standard_errors,
            true_value,
            &sample.degrees_of_freedom,
        )
    }

    pub fn estimate_raw(
        &self,
        point_estimates: &[f64],
        standard_errors: &[f64],
        true_value: f64,
        degrees_of_freedom: &DegreesOfFreedom,
    ) -> Result<CoverageResult> {
        let z = self.wald.z(self.confidence_level)?;
        let intervals = trial_intervals(
            point_estimates,
            standard_errors,
            degrees_of_freedom,
            self.confidence_level,
        )?;

        let trials = intervals.len();
        let hits = intervals.iter().filter(|iv| iv.contains(true_value)).count();
        let p = hits as f64 / trials as f64;
        let se = (p * (1.0 - p) / trials as f64).sqrt();

        tracing::debug!(trials, hits, coverage = p, z, "estimated coverage");

        Ok(CoverageResult {
            coverage_probability: p,
            interval_low: p - z * se,
            interval_high: p + z * se,
            trials,
            hits,
        })
    }
}

/// Coverage of `confidence_level` intervals with the default fixed-z Wald bounds.
pub fn estimate_coverage(
    point_estimates: &[f64],
    standard_errors: &[f64],
    true_value: f64,
    degrees_of_freedom: &DegreesOfFreedom,
    confidence_level: f64,
) -> Result<CoverageResult> {
    CoverageEstimator::default()
        .with_confidence_level(confidence_level)
        .estimate_raw(point_estimates, standard_errors, true_value, degrees_of_freedom)
}

/// Per-trial two-sided t intervals `estimate ± q·se`.
pub fn trial_intervals(
    point_estimates: &[f64],
    standard_errors: &[f64],
    degrees_of_freedom: &DegreesOfFreedom,
    confidence_level: f64,
) -> Result<Vec<TrialInterval>> {
    check_level(confidence_level)?;
    validate_trials(point_estimates, standard_errors, degrees_of_freedom)?;

    let build = |est: f64, se: f64, q: f64| TrialInterval {
        lower: est - q * se,
        upper: est + q * se,
    };

    let intervals: Vec<TrialInterval> = match degrees_of_freedom {
        DegreesOfFreedom::Shared(df) => {
            let q = t_critical(confidence_level, *df)?;
            point_estimates
                .iter()
                .zip(standard_errors)
                .map(|(&est, &se)| build(est, se, q))
                .collect()
        }
        DegreesOfFreedom::PerTrial(dfs) => point_estimates
            .iter()
            .zip(standard_errors)
            .zip(dfs)
            .map(|((&est, &se), &df)| -> Result<TrialInterval> {
                Ok(build(est, se, t_critical(confidence_level, df)?))
            })
            .collect::<Result<_>>()?,
    };

    Ok(intervals)
}

fn validate_trials(
    point_estimates: &[f64],
    standard_errors: &[f64],
    degrees_of_freedom: &DegreesOfFreedom,
) -> Result<()> {
    if point_estimates.len() != standard_errors.len() {
        return Err(CoverageError::InvalidInput(format!(
            "{} point estimates but {} standard errors",
            point_estimates.len(),
            standard_errors.len()
        )));
    }
    if point_estimates.is_empty() {
        return Err(CoverageError::InvalidInput("no trials".to_string()));
    }
    if let Some((i, se)) = standard_errors
        .iter()
        .enumerate()
        .find(|(_, se)| !(**se > 0.0))
    {
        return Err(CoverageError::InvalidInput(format!(
            "standard error at trial {i} must be positive, got {se}"
        )));
    }
    degrees_of_freedom.validate(point_estimates.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::prelude::*;
    use rand::rngs::StdRng;
    use rand_distr::{Distribution, Normal};

    fn shared(df: f64) -> DegreesOfFreedom {
        DegreesOfFreedom::Shared(df)
    }

    #[test]
    fn test_worked_example() {
        let estimates = [2.1, 1.9, 2.05, 2.5];
        let ses = [0.1; 4];
        let result = estimate_coverage(&estimates, &ses, 2.0, &shared(498.0), 0.95).unwrap();

        assert_eq!(result.trials, 4);
        assert_eq!(result.hits, 3);
        assert_eq!(result.coverage_probability, 0.75);
        assert!((result.interval_low - 0.3256).abs() < 1e-3);
        assert!((result.interval_high - 1.1744).abs() < 1e-3);

        let intervals = trial_intervals(&estimates, &ses, &shared(498.0), 0.95).unwrap();
        assert!((intervals[0].lower - 1.9035).abs() < 1e-3);
        assert!((intervals[0].upper - 2.2965).abs() < 1e-3);
        assert!(!intervals[3].contains(2.0));
    }

    #[test]
    fn test_raw_bounds_not_clamped() {
        let estimates = [2.1, 1.9, 2.05, 2.5];
        let result = estimate_coverage(&estimates, &[0.1; 4], 2.0, &shared(498.0), 0.95).unwrap();
        assert!(result.interval_high > 1.0);

        let (low, high) = result.clamped();
        assert_eq!(high, 1.0);
        assert_eq!(low, result.interval_low);
        assert!(result.interval_high > 1.0);
    }

    #[test]
    fn test_large_sample_coverage_near_nominal() {
        let mut rng = StdRng::seed_from_u64(7);
        let true_value = 3.0;
        let se = 0.5;
        let normal = Normal::new(true_value, se).unwrap();

        let estimates: Vec<f64> = (0..100_000).map(|_| normal.sample(&mut rng)).collect();
        let ses = vec![se; estimates.len()];
        let result =
            estimate_coverage(&estimates, &ses, true_value, &shared(5000.0), 0.95).unwrap();

        assert!(
            result.coverage_probability >= 0.94 && result.coverage_probability <= 0.96,
            "coverage = {}",
            result.coverage_probability
        );
        assert!(result.contains(0.95));
    }

    #[test]
    fn test_perfect_coverage() {
        let estimates = [0.3, -1.2, 4.0, 0.0, 2.5];
        let result = estimate_coverage(&estimates, &[1e9; 5], 0.0, &shared(20.0), 0.95).unwrap();

        assert_eq!(result.coverage_probability, 1.0);
        assert_eq!(result.interval_low, 1.0);
        assert_eq!(result.interval_high, 1.0);
    }

    #[test]
    fn test_zero_coverage() {
        let true_value = 1.5;
        let ses = [0.2, 0.5, 1.0, 3.0];
        let estimates: Vec<f64> = ses.iter().map(|se| true_value + 100.0 * se).collect();
        let result = estimate_coverage(&estimates, &ses, true_value, &shared(30.0), 0.95).unwrap();

        assert_eq!(result.coverage_probability, 0.0);
        assert_eq!(result.hits, 0);
    }

    #[test]
    fn test_boundary_is_inclusive() {
        let q = t_critical(0.95, 12.0).unwrap();
        let result = estimate_coverage(&[q], &[1.0], 0.0, &shared(12.0), 0.95).unwrap();
        assert_eq!(result.coverage_probability, 1.0);
    }

    #[test]
    fn test_higher_level_widens_intervals() {
        let mut rng = StdRng::seed_from_u64(11);
        let normal = Normal::new(0.0, 1.0).unwrap();
        let estimates: Vec<f64> = (0..500).map(|_| normal.sample(&mut rng)).collect();
        let ses: Vec<f64> = (0..500).map(|_| 0.5 + rng.gen::<f64>()).collect();
        let df = shared(15.0);

        let levels = [0.5, 0.8, 0.9, 0.95, 0.99];
        let mut last_intervals: Option<Vec<TrialInterval>> = None;
        let mut last_coverage = 0.0;

        for level in levels {
            let intervals = trial_intervals(&estimates, &ses, &df, level).unwrap();
            if let Some(prev) = &last_intervals {
                for (narrow, wide) in prev.iter().zip(&intervals) {
                    assert!(wide.lower < narrow.lower && wide.upper > narrow.upper);
                    assert!(wide.width() > narrow.width());
                }
            }
            let coverage = estimate_coverage(&estimates, &ses, 0.0, &df, level)
                .unwrap()
                .coverage_probability;
            assert!(coverage >= last_coverage);

            last_intervals = Some(intervals);
            last_coverage = coverage;
        }
    }

    #[test]
    fn test_shift_invariance() {
        let estimates = [0.9, 1.4, 0.2, 1.05, 2.2, 0.7];
        let ses = [0.3, 0.2, 0.25, 0.1, 0.4, 0.15];
        let df = shared(40.0);
        let base = estimate_coverage(&estimates, &ses, 1.0, &df, 0.9).unwrap();

        let c = 250.0;
        let shifted: Vec<f64> = estimates.iter().map(|e| e + c).collect();
        let moved = estimate_coverage(&shifted, &ses, 1.0 + c, &df, 0.9).unwrap();

        assert_eq!(base.coverage_probability, moved.coverage_probability);
    }

    #[test]
    fn test_length_mismatch() {
        let err = estimate_coverage(&[1.0; 5], &[0.1; 4], 1.0, &shared(10.0), 0.95).unwrap_err();
        assert!(matches!(err, CoverageError::InvalidInput(_)));
    }

    #[test]
    fn test_zero_standard_error() {
        let err = estimate_coverage(&[1.0, 2.0], &[0.1, 0.0], 1.0, &shared(10.0), 0.95)
            .unwrap_err();
        assert!(matches!(err, CoverageError::InvalidInput(_)));

        let err = estimate_coverage(&[1.0], &[-0.5], 1.0, &shared(10.0), 0.95).unwrap_err();
        assert!(matches!(err, CoverageError::InvalidInput(_)));
    }

    #[test]
    fn test_other_invalid_inputs() {
        let empty: [f64; 0] = [];
        assert!(estimate_coverage(&empty, &empty, 0.0, &shared(10.0), 0.95).is_err());
        assert!(estimate_coverage(&[1.0], &[0.1], 0.0, &shared(0.0), 0.95).is_err());
        assert!(estimate_coverage(&[1.0], &[0.1], 0.0, &shared(10.0), 1.0).is_err());
        assert!(estimate_coverage(&[1.0], &[0.1], 0.0, &shared(10.0), 0.0).is_err());
        assert!(estimate_coverage(&[1.0], &[f64::NAN], 0.0, &shared(10.0), 0.95).is_err());

        let per_trial = DegreesOfFreedom::PerTrial(vec![10.0, 12.0]);
        assert!(estimate_coverage(&[1.0], &[0.1], 0.0, &per_trial, 0.95).is_err());
        let per_trial = DegreesOfFreedom::PerTrial(vec![10.0, -1.0]);
        assert!(estimate_coverage(&[1.0, 1.0], &[0.1, 0.1], 0.0, &per_trial, 0.95).is_err());
    }

    #[test]
    fn test_huge_degrees_of_freedom() {
        // Normal limit: intervals are est ± 1.95996·se.
        let ses = [0.5, 1.0, 2.0, 4.0];
        let inside: Vec<f64> = ses
            .iter()
            .enumerate()
            .map(|(i, se)| if i % 2 == 0 { 1.955 * se } else { -1.955 * se })
            .collect();
        let outside: Vec<f64> = ses.iter().map(|se| 1.965 * se).collect();

        for df in [1e7, 1e9, f64::INFINITY] {
            let hit = estimate_coverage(&inside, &ses, 0.0, &shared(df), 0.95).unwrap();
            assert_eq!(hit.coverage_probability, 1.0, "df = {df}");

            let miss = estimate_coverage(&outside, &ses, 0.0, &shared(df), 0.95).unwrap();
            assert_eq!(miss.coverage_probability, 0.0, "df = {df}");
        }

        // Any q below 1.9 would reject this trial.
        let result = estimate_coverage(&[1.9], &[1.0], 0.0, &shared(1e7), 0.95).unwrap();
        assert_eq!(result.hits, 1);
    }

    #[test]
    fn test_per_trial_degrees_of_freedom() {
        // With 2 df, q ≈ 4.303; with 1000 df, q ≈ 1.962.
        let estimates = [3.0, 3.0];
        let ses = [1.0, 1.0];
        let df = DegreesOfFreedom::PerTrial(vec![2.0, 1000.0]);
        let result = estimate_coverage(&estimates, &ses, 0.0, &df, 0.95).unwrap();

        assert_eq!(result.hits, 1);
        assert_eq!(result.coverage_probability, 0.5);
    }

    #[test]
    fn test_outer_level_is_independent() {
        let estimates = [2.1, 1.9, 2.05, 2.5];
        let ses = [0.1; 4];
        let sample = EstimateSample::new(estimates.to_vec(), ses.to_vec(), 498.0).unwrap();

        let fixed = CoverageEstimator::default()
            .with_confidence_level(0.8)
            .estimate(&sample, 2.0)
            .unwrap();
        let matched = CoverageEstimator::default()
            .with_confidence_level(0.8)
            .with_wald(WaldCritical::MatchInner)
            .estimate(&sample, 2.0)
            .unwrap();

        assert_eq!(fixed.coverage_probability, matched.coverage_probability);
        let se = (0.75_f64 * 0.25 / 4.0).sqrt();
        assert!((fixed.interval_high - (0.75 + 1.96 * se)).abs() < 1e-12);
        assert!(
            matched.interval_high - matched.interval_low
                < fixed.interval_high - fixed.interval_low
        );
    }

    #[test]
    fn test_sample_construction() {
        let sample = EstimateSample::new(vec![1.0, 3.0], vec![0.5, 1.5], 10.0).unwrap();
        assert_eq!(sample.len(), 2);
        assert!(!sample.is_empty());
        assert_eq!(sample.mean_estimate(), 2.0);
        assert_eq!(sample.mean_standard_error(), 1.0);
        assert_eq!(sample.point_estimates(), &[1.0, 3.0]);
        assert_eq!(sample.standard_errors(), &[0.5, 1.5]);
        assert_eq!(sample.degrees_of_freedom(), &DegreesOfFreedom::Shared(10.0));

        assert!(EstimateSample::new(vec![], vec![], 10.0).is_err());
        assert!(EstimateSample::new(vec![1.0], vec![0.0], 10.0).is_err());
        assert!(EstimateSample::new(vec![1.0], vec![1.0], vec![1.0, 2.0]).is_err());
    }
}

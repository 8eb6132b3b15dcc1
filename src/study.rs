//! Coverage Simulation Studies
//!
//! Repeatedly draws synthetic datasets from a known data-generating process,
//! fits them, and hands the resulting estimates to the coverage estimator.
//!
//! ## Data-Generating Processes
//! - Regression with normal errors (baseline)
//! - Regression with heteroskedastic errors (sd grows with x²)
//! - Regression with heavy-tailed errors (scaled Student-t, 3 df)
//! - Two groups with unequal variances (Welch difference in means)
//!
//! Every trial owns an RNG seeded from `(seed, trial index)`, so trials are
//! independent of one another and of generation order. Generation maps over
//! trial indices; the estimator then reduces the collected sample.

use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::{Distribution, Normal, StudentT, Uniform};
use tracing::debug;

use crate::coverage::{CoverageEstimator, CoverageResult, DegreesOfFreedom, EstimateSample};
use crate::error::{CoverageError, Result};
use crate::fit::{fit_ols, welch_difference};

const X_MIN: f64 = 0.0;
const X_MAX: f64 = 10.0;
const HEAVY_TAIL_DF: f64 = 3.0;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ErrorModel {
    Normal,
    Heteroskedastic,
    HeavyTailed,
}

impl ErrorModel {
    pub fn all() -> Vec<Self> {
        vec![Self::Normal, Self::Heteroskedastic, Self::HeavyTailed]
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Normal => "Normal (baseline)",
            Self::Heteroskedastic => "Heteroskedastic",
            Self::HeavyTailed => "Heavy-tailed (t, 3 df)",
        }
    }
}

/// Independent RNG for one trial.
pub fn trial_rng(seed: u64, trial: usize) -> StdRng {
    StdRng::seed_from_u64(seed ^ (trial as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15))
}

#[derive(Clone, Debug)]
pub struct RegressionStudy {
    pub runs: usize,
    pub observations: usize,
    pub intercept: f64,
    pub slope: f64,
    pub sigma: f64,
    pub error_model: ErrorModel,
    pub seed: u64,
}

impl Default for RegressionStudy {
    fn default() -> Self {
        Self {
            runs: 1000,
            observations: 500,
            intercept: 2.0,
            slope: 0.5,
            sigma: 1.0,
            error_model: ErrorModel::Normal,
            seed: 42,
        }
    }
}

#[derive(Clone, Debug)]
pub struct RegressionTrials {
    pub intercept: EstimateSample,
    pub slope: EstimateSample,
}

#[derive(Clone, Copy, Debug)]
pub struct RegressionCoverage {
    pub error_model: ErrorModel,
    pub mean_intercept: f64,
    pub mean_slope: f64,
    pub intercept: CoverageResult,
    pub slope: CoverageResult,
}

impl RegressionStudy {
    fn validate(&self) -> Result<()> {
        if self.runs == 0 {
            return Err(CoverageError::InvalidInput("runs must be positive".to_string()));
        }
        if self.observations < 3 {
            return Err(CoverageError::InvalidInput(format!(
                "need at least 3 observations per dataset, got {}",
                self.observations
            )));
        }
        if !(self.sigma > 0.0) {
            return Err(CoverageError::InvalidInput(format!(
                "error scale must be positive, got {}",
                self.sigma
            )));
        }
        Ok(())
    }

    /// Draw one dataset `(x, y)` from the configured process.
    pub fn generate_dataset(&self, rng: &mut impl Rng) -> Result<(Vec<f64>, Vec<f64>)> {
        let xs = Uniform::new(X_MIN, X_MAX);
        let x: Vec<f64> = (0..self.observations).map(|_| xs.sample(rng)).collect();

        let noise: Vec<f64> = match self.error_model {
            ErrorModel::Normal => {
                let normal = Normal::new(0.0, self.sigma)?;
                (0..self.observations).map(|_| normal.sample(rng)).collect()
            }
            ErrorModel::Heteroskedastic => {
                // sd proportional to x², averaging sigma over the design range
                let normal = Normal::new(0.0, 1.0)?;
                let mean_sq = (X_MAX.powi(3) - X_MIN.powi(3)) / (3.0 * (X_MAX - X_MIN));
                let scale = self.sigma / mean_sq;
                x.iter()
                    .map(|xi| normal.sample(rng) * scale * xi * xi)
                    .collect()
            }
            ErrorModel::HeavyTailed => {
                let t = StudentT::new(HEAVY_TAIL_DF)
                    .map_err(|e| CoverageError::InvalidInput(e.to_string()))?;
                let scale = self.sigma / (HEAVY_TAIL_DF / (HEAVY_TAIL_DF - 2.0)).sqrt();
                (0..self.observations).map(|_| t.sample(rng) * scale).collect()
            }
        };

        let y = x
            .iter()
            .zip(&noise)
            .map(|(xi, e)| self.intercept + self.slope * xi + e)
            .collect();

        Ok((x, y))
    }

    pub fn run(&self) -> Result<RegressionTrials> {
        self.validate()?;
        debug!(
            runs = self.runs,
            observations = self.observations,
            model = self.error_model.name(),
            "running regression coverage study"
        );

        let fits = (0..self.runs)
            .map(|trial| {
                let mut rng = trial_rng(self.seed, trial);
                let (x, y) = self.generate_dataset(&mut rng)?;
                fit_ols(&x, &y)
            })
            .collect::<Result<Vec<_>>>()?;

        let residual_df = (self.observations - 2) as f64;
        let intercept = EstimateSample::new(
            fits.iter().map(|f| f.intercept).collect(),
            fits.iter().map(|f| f.intercept_se).collect(),
            residual_df,
        )?;
        let slope = EstimateSample::new(
            fits.iter().map(|f| f.slope).collect(),
            fits.iter().map(|f| f.slope_se).collect(),
            residual_df,
        )?;

        Ok(RegressionTrials { intercept, slope })
    }

    pub fn coverage(&self, estimator: &CoverageEstimator) -> Result<RegressionCoverage> {
        let trials = self.run()?;
        let intercept = estimator.estimate(&trials.intercept, self.intercept)?;
        let slope = estimator.estimate(&trials.slope, self.slope)?;

        debug!(
            intercept_coverage = intercept.coverage_probability,
            slope_coverage = slope.coverage_probability,
            "regression study finished"
        );

        Ok(RegressionCoverage {
            error_model: self.error_model,
            mean_intercept: trials.intercept.mean_estimate(),
            mean_slope: trials.slope.mean_estimate(),
            intercept,
            slope,
        })
    }
}

/// Run the same study under every error model.
pub fn compare_error_models(
    base: &RegressionStudy,
    estimator: &CoverageEstimator,
) -> Result<Vec<RegressionCoverage>> {
    ErrorModel::all()
        .into_iter()
        .map(|error_model| {
            RegressionStudy {
                error_model,
                ..base.clone()
            }
            .coverage(estimator)
        })
        .collect()
}

#[derive(Clone, Debug)]
pub struct WelchStudy {
    pub runs: usize,
    pub n_a: usize,
    pub n_b: usize,
    pub mean_a: f64,
    pub mean_b: f64,
    pub sd_a: f64,
    pub sd_b: f64,
    pub seed: u64,
}

impl Default for WelchStudy {
    fn default() -> Self {
        Self {
            runs: 1000,
            n_a: 12,
            n_b: 30,
            mean_a: 5.0,
            mean_b: 4.0,
            sd_a: 3.0,
            sd_b: 1.0,
            seed: 42,
        }
    }
}

impl WelchStudy {
    pub fn true_difference(&self) -> f64 {
        self.mean_a - self.mean_b
    }

    pub fn run(&self) -> Result<EstimateSample> {
        if self.runs == 0 {
            return Err(CoverageError::InvalidInput("runs must be positive".to_string()));
        }
        debug!(
            runs = self.runs,
            n_a = self.n_a,
            n_b = self.n_b,
            "running Welch coverage study"
        );

        let group_a = Normal::new(self.mean_a, self.sd_a)?;
        let group_b = Normal::new(self.mean_b, self.sd_b)?;

        let fits = (0..self.runs)
            .map(|trial| {
                let mut rng = trial_rng(self.seed, trial);
                let a: Vec<f64> = (0..self.n_a).map(|_| group_a.sample(&mut rng)).collect();
                let b: Vec<f64> = (0..self.n_b).map(|_| group_b.sample(&mut rng)).collect();
                welch_difference(&a, &b)
            })
            .collect::<Result<Vec<_>>>()?;

        EstimateSample::new(
            fits.iter().map(|f| f.difference).collect(),
            fits.iter().map(|f| f.standard_error).collect(),
            DegreesOfFreedom::PerTrial(fits.iter().map(|f| f.degrees_of_freedom).collect()),
        )
    }

    pub fn coverage(&self, estimator: &CoverageEstimator) -> Result<CoverageResult> {
        let sample = self.run()?;
        estimator.estimate(&sample, self.true_difference())
    }
}

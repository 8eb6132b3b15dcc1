//! Coverage Simulation Library
//!
//! Monte Carlo evaluation of confidence-interval coverage: simulate many
//! datasets with a known parameter, fit each one, and measure how often the
//! nominal interval captures the truth.
//!
//! ## Modules
//!
//! - `coverage`: the coverage estimator and its sample/result types
//! - `critical`: Student-t and normal critical values
//! - `fit`: closed-form OLS and Welch fits
//! - `study`: data-generating processes and the trial driver
//! - `error`: error taxonomy
//!
//! ## Usage
//!
//! ```bash
//! # Regression study under every error model
//! cargo run --bin coverage_study --release
//!
//! # Welch two-sample study, JSON output
//! cargo run --bin coverage_study --release -- --study welch --json
//! ```

pub mod coverage;
pub mod critical;
pub mod error;
pub mod fit;
pub mod study;

pub use coverage::{
    estimate_coverage, trial_intervals, CoverageEstimator, CoverageResult, DegreesOfFreedom,
    EstimateSample, TrialInterval, DEFAULT_CONFIDENCE_LEVEL,
};
pub use critical::{normal_critical, t_critical, WaldCritical, DEFAULT_WALD_Z};
pub use error::{CoverageError, Result};

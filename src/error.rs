//! Error types for coverage simulation

use thiserror::Error;

/// Errors raised by the estimator, the closed-form fits and the study driver
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoverageError {
    /// Arguments that violate the estimator or fit contract
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Simulated data the closed-form fit cannot estimate from
    #[error("Degenerate fit: {0}")]
    DegenerateFit(String),
}

impl From<statrs::StatsError> for CoverageError {
    fn from(err: statrs::StatsError) -> Self {
        CoverageError::InvalidInput(err.to_string())
    }
}

impl From<rand_distr::NormalError> for CoverageError {
    fn from(err: rand_distr::NormalError) -> Self {
        CoverageError::InvalidInput(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, CoverageError>;

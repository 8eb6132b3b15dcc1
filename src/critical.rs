//! Critical values for two-sided intervals
//!
//! The per-trial intervals use Student-t quantiles; the interval around the
//! observed coverage rate uses a standard-normal critical value selected by
//! [`WaldCritical`].

use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, Normal, StudentsT};

use crate::error::{CoverageError, Result};

/// z used for the coverage-rate interval unless configured otherwise.
pub const DEFAULT_WALD_Z: f64 = 1.96;

/// Above this many degrees of freedom the t quantile comes from the
/// normal-quantile expansion instead of `statrs`, whose search loses accuracy
/// and eventually stalls as df grows.
pub const LARGE_DF: f64 = 1000.0;

/// How the Wald interval around the coverage rate picks its critical value.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum WaldCritical {
    /// A literal z, independent of the per-trial confidence level.
    Fixed(f64),
    /// Normal critical value for its own two-sided confidence level.
    Level(f64),
    /// Normal critical value at the per-trial confidence level.
    MatchInner,
}

impl Default for WaldCritical {
    fn default() -> Self {
        Self::Fixed(DEFAULT_WALD_Z)
    }
}

impl WaldCritical {
    /// Resolve to a z value given the per-trial confidence level.
    pub fn z(&self, inner_level: f64) -> Result<f64> {
        match *self {
            Self::Fixed(z) => {
                if !(z > 0.0) || !z.is_finite() {
                    return Err(CoverageError::InvalidInput(format!(
                        "Wald critical value must be positive and finite, got {z}"
                    )));
                }
                Ok(z)
            }
            Self::Level(level) => normal_critical(level),
            Self::MatchInner => normal_critical(inner_level),
        }
    }
}

pub(crate) fn check_level(confidence_level: f64) -> Result<()> {
    if confidence_level > 0.0 && confidence_level < 1.0 {
        Ok(())
    } else {
        Err(CoverageError::InvalidInput(format!(
            "confidence level must lie in (0, 1), got {confidence_level}"
        )))
    }
}

fn upper_tail_probability(confidence_level: f64) -> f64 {
    1.0 - (1.0 - confidence_level) / 2.0
}

/// Two-sided Student-t critical value `F⁻¹(1 − (1 − level)/2)`.
///
/// Fractional degrees of freedom are accepted, as is `f64::INFINITY`, which
/// yields the normal critical value.
///
/// # Algorithm
/// For df ≤ [`LARGE_DF`], the `statrs` Student-t inverse CDF. Beyond that,
/// the Cornish–Fisher expansion of the t quantile around the normal quantile
/// (Abramowitz & Stegun 26.7.5), truncated after the ν⁻⁴ term. At ν = 1000 the
/// truncation error is below 1e-12.
pub fn t_critical(confidence_level: f64, degrees_of_freedom: f64) -> Result<f64> {
    check_level(confidence_level)?;
    if !(degrees_of_freedom > 0.0) {
        return Err(CoverageError::InvalidInput(format!(
            "degrees of freedom must be positive, got {degrees_of_freedom}"
        )));
    }
    if degrees_of_freedom > LARGE_DF {
        let z = normal_critical(confidence_level)?;
        return Ok(t_from_normal(z, degrees_of_freedom));
    }
    let dist = StudentsT::new(0.0, 1.0, degrees_of_freedom)?;
    Ok(dist.inverse_cdf(upper_tail_probability(confidence_level)))
}

fn t_from_normal(z: f64, nu: f64) -> f64 {
    if nu.is_infinite() {
        return z;
    }
    let z2 = z * z;
    let g1 = z * (z2 + 1.0) / 4.0;
    let g2 = z * ((5.0 * z2 + 16.0) * z2 + 3.0) / 96.0;
    let g3 = z * (((3.0 * z2 + 19.0) * z2 + 17.0) * z2 - 15.0) / 384.0;
    let g4 = z * ((((79.0 * z2 + 776.0) * z2 + 1482.0) * z2 - 1920.0) * z2 - 945.0) / 92160.0;
    z + (g1 + (g2 + (g3 + g4 / nu) / nu) / nu) / nu
}

/// Two-sided standard-normal critical value.
pub fn normal_critical(confidence_level: f64) -> Result<f64> {
    check_level(confidence_level)?;
    let dist = Normal::new(0.0, 1.0)?;
    Ok(dist.inverse_cdf(upper_tail_probability(confidence_level)))
}

//! Closed-form fits used by the simulation driver
//!
//! Each fit turns one simulated dataset into point estimates, standard errors
//! and the degrees of freedom their t intervals should use.

use crate::error::{CoverageError, Result};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OlsFit {
    pub intercept: f64,
    pub slope: f64,
    pub intercept_se: f64,
    pub slope_se: f64,
    pub residual_df: f64,
}

/// Simple linear regression `y = b0 + b1·x` by ordinary least squares.
pub fn fit_ols(x: &[f64], y: &[f64]) -> Result<OlsFit> {
    if x.len() != y.len() {
        return Err(CoverageError::InvalidInput(format!(
            "{} predictor values but {} responses",
            x.len(),
            y.len()
        )));
    }
    let n = x.len();
    if n < 3 {
        return Err(CoverageError::InvalidInput(format!(
            "need at least 3 observations, got {n}"
        )));
    }

    let nf = n as f64;
    let x_mean = x.iter().sum::<f64>() / nf;
    let y_mean = y.iter().sum::<f64>() / nf;

    let (sxx, sxy) = x.iter().zip(y).fold((0.0, 0.0), |(sxx, sxy), (&xi, &yi)| {
        let dx = xi - x_mean;
        (sxx + dx * dx, sxy + dx * (yi - y_mean))
    });
    if sxx <= 0.0 {
        return Err(CoverageError::DegenerateFit(
            "predictor has zero variance".to_string(),
        ));
    }

    let slope = sxy / sxx;
    let intercept = y_mean - slope * x_mean;

    let ssr: f64 = x
        .iter()
        .zip(y)
        .map(|(&xi, &yi)| (yi - intercept - slope * xi).powi(2))
        .sum();
    let residual_df = nf - 2.0;
    let sigma2 = ssr / residual_df;
    if sigma2 <= 0.0 {
        return Err(CoverageError::DegenerateFit(
            "residual variance is zero".to_string(),
        ));
    }

    Ok(OlsFit {
        intercept,
        slope,
        intercept_se: (sigma2 * (1.0 / nf + x_mean * x_mean / sxx)).sqrt(),
        slope_se: (sigma2 / sxx).sqrt(),
        residual_df,
    })
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WelchFit {
    pub difference: f64,
    pub standard_error: f64,
    /// Welch–Satterthwaite degrees of freedom, generally fractional.
    pub degrees_of_freedom: f64,
}

fn mean_and_variance(values: &[f64]) -> (f64, f64) {
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
    (mean, var)
}

/// Difference in means `mean(a) − mean(b)` with unequal-variance standard error.
pub fn welch_difference(a: &[f64], b: &[f64]) -> Result<WelchFit> {
    if a.len() < 2 || b.len() < 2 {
        return Err(CoverageError::InvalidInput(format!(
            "each group needs at least 2 observations, got {} and {}",
            a.len(),
            b.len()
        )));
    }

    let (mean_a, var_a) = mean_and_variance(a);
    let (mean_b, var_b) = mean_and_variance(b);
    let na = a.len() as f64;
    let nb = b.len() as f64;

    let va = var_a / na;
    let vb = var_b / nb;
    if va + vb <= 0.0 {
        return Err(CoverageError::DegenerateFit(
            "both groups have zero variance".to_string(),
        ));
    }

    let degrees_of_freedom =
        (va + vb).powi(2) / (va.powi(2) / (na - 1.0) + vb.powi(2) / (nb - 1.0));

    Ok(WelchFit {
        difference: mean_a - mean_b,
        standard_error: (va + vb).sqrt(),
        degrees_of_freedom,
    })
}

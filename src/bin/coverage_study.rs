//! Coverage Study Binary
//!
//! Runs Monte Carlo coverage studies and reports how often nominal intervals
//! capture the true parameter.
//!
//! ## Usage
//! ```bash
//! cargo run --bin coverage_study --release
//! cargo run --bin coverage_study --release -- --study welch --runs 5000
//! ```

use anyhow::Result;
use clap::{Parser, ValueEnum};
use serde_json::json;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use coverage_simulation::study::{compare_error_models, RegressionStudy, WelchStudy};
use coverage_simulation::{CoverageEstimator, WaldCritical};

#[derive(Clone, Copy, Debug, ValueEnum)]
enum StudyKind {
    Regression,
    Welch,
}

#[derive(Parser, Debug)]
#[command(name = "coverage_study", about = "Monte Carlo confidence-interval coverage")]
struct Args {
    #[arg(long, value_enum, default_value = "regression")]
    study: StudyKind,

    /// Simulated datasets per study
    #[arg(long, env = "COVERAGE_RUNS", default_value_t = 1000)]
    runs: usize,

    /// Observations per regression dataset
    #[arg(long, env = "COVERAGE_OBSERVATIONS", default_value_t = 500)]
    observations: usize,

    #[arg(long, env = "COVERAGE_SEED", default_value_t = 42)]
    seed: u64,

    /// Level of the per-trial t intervals
    #[arg(long, env = "COVERAGE_CONFIDENCE_LEVEL", default_value_t = 0.95)]
    confidence_level: f64,

    /// Level of the Wald interval on the coverage rate (default: z = 1.96)
    #[arg(long, conflicts_with = "wald_match_inner")]
    wald_level: Option<f64>,

    /// Use the per-trial level for the Wald interval too
    #[arg(long)]
    wald_match_inner: bool,

    /// Emit JSON instead of the text report
    #[arg(long)]
    json: bool,

    #[arg(long, env = "COVERAGE_LOG_LEVEL", default_value = "info")]
    log_level: Level,
}

impl Args {
    fn estimator(&self) -> CoverageEstimator {
        let wald = match (self.wald_level, self.wald_match_inner) {
            (Some(level), _) => WaldCritical::Level(level),
            (None, true) => WaldCritical::MatchInner,
            (None, false) => WaldCritical::default(),
        };
        CoverageEstimator::default()
            .with_confidence_level(self.confidence_level)
            .with_wald(wald)
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(args.log_level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let estimator = args.estimator();
    match args.study {
        StudyKind::Regression => run_regression(&args, &estimator),
        StudyKind::Welch => run_welch(&args, &estimator),
    }
}

fn run_regression(args: &Args, estimator: &CoverageEstimator) -> Result<()> {
    let base = RegressionStudy {
        runs: args.runs,
        observations: args.observations,
        seed: args.seed,
        ..RegressionStudy::default()
    };
    let reports = compare_error_models(&base, estimator)?;

    if args.json {
        let rows: Vec<_> = reports
            .iter()
            .map(|r| {
                json!({
                    "error_model": r.error_model.name(),
                    "mean_intercept": r.mean_intercept,
                    "mean_slope": r.mean_slope,
                    "intercept": r.intercept,
                    "slope": r.slope,
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    println!("=======================================================");
    println!("  Regression Coverage Study");
    println!("=======================================================");
    println!();
    println!("Parameters:");
    println!("  Runs: {}, Observations: {}", base.runs, base.observations);
    println!(
        "  True intercept: {}, True slope: {}, Error scale: {}",
        base.intercept, base.slope, base.sigma
    );
    println!("  Confidence level: {}", estimator.confidence_level);
    println!();

    for report in &reports {
        println!("=======================================================");
        println!("Error Model: {}", report.error_model.name());
        println!("=======================================================");
        println!();

        println!("Intercept (mean estimate {:.4})", report.mean_intercept);
        println!("{}", "-".repeat(50));
        report.intercept.print();
        println!();

        println!("Slope (mean estimate {:.4})", report.mean_slope);
        println!("{}", "-".repeat(50));
        report.slope.print();
        println!();
    }

    println!("| Error Model            | Coefficient | Coverage | Wald Low | Wald High |");
    println!("|------------------------|-------------|----------|----------|-----------|");
    for report in &reports {
        for (name, result) in [("Intercept", report.intercept), ("Slope", report.slope)] {
            println!(
                "| {:22} | {:11} | {:7.2}% | {:8.4} | {:9.4} |",
                report.error_model.name(),
                name,
                result.coverage_probability * 100.0,
                result.interval_low,
                result.interval_high,
            );
        }
    }

    Ok(())
}

fn run_welch(args: &Args, estimator: &CoverageEstimator) -> Result<()> {
    let study = WelchStudy {
        runs: args.runs,
        seed: args.seed,
        ..WelchStudy::default()
    };
    let result = study.coverage(estimator)?;

    if args.json {
        let out = json!({
            "true_difference": study.true_difference(),
            "coverage": result,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    println!("=======================================================");
    println!("  Welch Two-Sample Coverage Study");
    println!("=======================================================");
    println!();
    println!("Parameters:");
    println!(
        "  Group A: n={}, mean={}, sd={}",
        study.n_a, study.mean_a, study.sd_a
    );
    println!(
        "  Group B: n={}, mean={}, sd={}",
        study.n_b, study.mean_b, study.sd_b
    );
    println!("  Confidence level: {}", estimator.confidence_level);
    println!();
    result.print();

    Ok(())
}

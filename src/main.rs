// Evaluates the softmax loss on a synthetic problem with both strategies,
// compares them, and gradient-checks each one.
//
//   cargo run -- [config.json]
//
// Set RUST_LOG=debug to see per-sample gradient check records.
use std::error::Error;
use std::time::Instant;

use log::{info, warn};
use rand::{rngs::StdRng, SeedableRng};
use serde::Serialize;

use softmax_linear::{
    config::SyntheticProblem, grad_check_sparse, DemoConfig, GradCheckReport, Strategy,
};

#[derive(Serialize)]
struct StrategyRun {
    strategy: Strategy,
    loss: f64,
    elapsed_ms: f64,
    grad_check: GradCheckReport,
    grad_check_regularized: GradCheckReport,
}

#[derive(Serialize)]
struct Summary {
    config: DemoConfig,
    runs: Vec<StrategyRun>,
    loss_difference: f64,
    gradient_difference: f64,
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();

    let config = match std::env::args().nth(1) {
        Some(path) => {
            info!("loading config from {path}");
            DemoConfig::load_json(&path)?
        }
        None => DemoConfig::default(),
    };

    let mut rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let problem = config.sample_problem(&mut rng)?;
    info!(
        "problem: {} examples, {} features, {} classes",
        config.num_train, config.num_features, config.num_classes
    );

    let mut runs = Vec::with_capacity(Strategy::ALL.len());
    let mut grads = Vec::with_capacity(Strategy::ALL.len());
    for strategy in Strategy::ALL {
        let t_start = Instant::now();
        let (loss, grad) = strategy
            .evaluate(&problem.weights, &problem.data, &problem.labels, config.reg)?
            .into_parts();
        let elapsed_ms = t_start.elapsed().as_secs_f64() * 1e3;
        info!("{} loss: {loss:.6e} computed in {elapsed_ms:.3} ms", strategy.name());

        let grad_check = check_strategy(strategy, &problem, 0.0, &config, &mut rng)?;
        let grad_check_regularized = check_strategy(strategy, &problem, config.reg, &config, &mut rng)?;

        runs.push(StrategyRun { strategy, loss, elapsed_ms, grad_check, grad_check_regularized });
        grads.push(grad);
    }

    let loss_difference = (runs[0].loss - runs[1].loss).abs();
    let gradient_difference = grads[0].sub(&grads[1])?.sum_squares().sqrt();
    info!("loss difference: {loss_difference:.3e}, gradient difference (Frobenius): {gradient_difference:.3e}");

    let summary = Summary { config, runs, loss_difference, gradient_difference };
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

fn check_strategy(
    strategy: Strategy,
    problem: &SyntheticProblem,
    reg: f64,
    config: &DemoConfig,
    rng: &mut StdRng,
) -> Result<GradCheckReport, Box<dyn Error>> {
    let analytic = strategy
        .evaluate(&problem.weights, &problem.data, &problem.labels, reg)?
        .grad;
    let report = grad_check_sparse(
        |w| Ok(strategy.evaluate(w, &problem.data, &problem.labels, reg)?.loss),
        &problem.weights,
        &analytic,
        &config.grad_check,
        rng,
    )?;

    if report.passed() {
        info!(
            "{} gradient check (reg = {reg}) passed: max relative error {:.3e}",
            strategy.name(),
            report.max_rel_error
        );
    } else {
        warn!(
            "{} gradient check (reg = {reg}) exceeded tolerance {:.1e}: max relative error {:.3e}",
            strategy.name(),
            report.tolerance,
            report.max_rel_error
        );
    }
    Ok(report)
}

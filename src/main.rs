//! boostbench - Main Entry Point
//!
//! Benchmarks gradient-boosting regressors against hyperparameter-search
//! strategies over a directory of tabular datasets.

use boostbench::cli::{cmd_evaluate, cmd_info, Cli, Commands};
use clap::Parser;

fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "boostbench=info".into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Evaluate {
            data,
            target,
            output,
            folds,
            grid_steps,
            tpe_evals,
            gp_evals,
            limit,
        }) => {
            cmd_evaluate(
                &data, &target, &output, folds, grid_steps, tpe_evals, gp_evals, limit,
            )?;
        }
        Some(Commands::Info { data }) => {
            cmd_info(&data)?;
        }
        None => {
            // Default: evaluate the default dataset directory
            let defaults = boostbench::bench::EvalConfig::default();
            cmd_evaluate(
                &defaults.dataset_dir,
                &defaults.target_column,
                &defaults.output_dir,
                defaults.folds,
                defaults.grid_steps,
                defaults.tpe_evals,
                defaults.gp_evals,
                defaults.max_datasets,
            )?;
        }
    }

    Ok(())
}

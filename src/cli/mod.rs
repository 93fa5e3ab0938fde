//! boostbench CLI Module
//!
//! Command-line interface for running the benchmark and inspecting datasets.

use clap::{Parser, Subcommand};
use colored::*;
use std::path::PathBuf;
use std::time::Instant;

use crate::bench::{evaluate, EvalConfig};
use crate::utils::DataLoader;

// ─── Styling helpers ───────────────────────────────────────────────────────────

fn dim(s: &str) -> ColoredString {
    s.truecolor(100, 100, 100)
}
fn accent(s: &str) -> ColoredString {
    s.truecolor(120, 170, 255)
}
fn muted(s: &str) -> ColoredString {
    s.truecolor(140, 140, 140)
}
fn ok(s: &str) -> ColoredString {
    s.truecolor(100, 210, 120)
}

fn step_run(msg: &str) {
    print!("  {} {}... ", accent("›"), msg);
}

fn step_done(detail: &str) {
    println!("{} {}", ok("done"), dim(detail));
}

fn section(title: &str) {
    println!();
    println!("  {}", title.white().bold());
    println!("  {}", dim(&"─".repeat(56)));
}

// ─── CLI definition ────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "boostbench")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Benchmark gradient-boosting regressors against hyperparameter-search strategies")]
#[command(long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Evaluate every dataset in a directory and write the JSON report
    Evaluate {
        /// Directory of dataset files (CSV or TSV)
        #[arg(short, long, default_value = "datasets")]
        data: PathBuf,

        /// Target column name
        #[arg(short, long, default_value = "class")]
        target: String,

        /// Output directory for the report
        #[arg(short, long, default_value = ".")]
        output: PathBuf,

        /// Cross-validation folds inside the selectors
        #[arg(long, default_value = "3")]
        folds: usize,

        /// Grid stages to walk per family
        #[arg(long, default_value = "6")]
        grid_steps: usize,

        /// TPE trial budget
        #[arg(long, default_value = "10")]
        tpe_evals: usize,

        /// GP trial budget per family
        #[arg(long, default_value = "50")]
        gp_evals: usize,

        /// Evaluate at most this many datasets
        #[arg(long, default_value = "20")]
        limit: usize,
    },

    /// Show dataset information
    Info {
        /// Input data file
        #[arg(short, long)]
        data: PathBuf,
    },
}

// ─── Commands ──────────────────────────────────────────────────────────────────

#[allow(clippy::too_many_arguments)]
pub fn cmd_evaluate(
    data: &PathBuf,
    target: &str,
    output: &PathBuf,
    folds: usize,
    grid_steps: usize,
    tpe_evals: usize,
    gp_evals: usize,
    limit: usize,
) -> anyhow::Result<()> {
    section("Evaluate");

    let config = EvalConfig::new(data.clone())
        .with_target_column(target)
        .with_folds(folds)
        .with_budgets(grid_steps, tpe_evals, gp_evals)
        .with_max_datasets(limit)
        .with_output_dir(output.clone());

    step_run(&format!("Benchmarking {}", data.display().to_string().cyan()));
    let start = Instant::now();
    let report = evaluate(&config)?;
    step_done(&format!("{:?}", start.elapsed()));

    println!();
    println!(
        "  {:<16} {}",
        muted("Scored"),
        report.scores.len().to_string().white().bold()
    );
    println!(
        "  {:<16} {}",
        muted("Failed"),
        report.failed.len().to_string().white()
    );
    for name in &report.failed {
        println!("  {:<16} {}", "", name.yellow());
    }
    println!(
        "  {:<16} {}",
        muted("Report"),
        report.output_path.display().to_string().white()
    );
    println!();

    for record in &report.scores {
        println!("  {}", record.name.white().bold());
        println!(
            "    {:<14} {:>8.4}   {:<14} {:>8.4}",
            muted("lgbm"),
            record.lgbm,
            muted("bayes_hyperopt"),
            record.bayes_hyperopt
        );
        println!(
            "    {:<14} {:>8.4}   {:<14} {:>8.4}",
            muted("xgb"),
            record.xgb,
            muted("bayes_scikit"),
            record.bayes_scikit
        );
        println!(
            "    {:<14} {:>8.4}   {:<14} {:>8.4}",
            muted("cat"),
            record.cat,
            muted("grid"),
            record.grid
        );
    }
    println!();

    Ok(())
}

pub fn cmd_info(data: &PathBuf) -> anyhow::Result<()> {
    section("Info");

    step_run("Loading data");
    let start = Instant::now();
    let df = DataLoader::new().load_auto(data)?;
    step_done(&format!(
        "{} rows × {} cols in {:?}",
        df.height(),
        df.width(),
        start.elapsed()
    ));

    println!();
    for col in df.get_columns() {
        println!(
            "  {:<24} {:<12} {} nulls",
            col.name().to_string().white(),
            format!("{:?}", col.dtype()).cyan(),
            col.null_count()
        );
    }
    println!();

    Ok(())
}

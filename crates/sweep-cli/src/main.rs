use anyhow::Result;
use clap::{Parser, Subcommand};
use serde_json::{json, Value};
use std::path::PathBuf;

use sweep_analysis::{aggregate, write_summary};
use sweep_core::config::CONFIG_TEMPLATE;
use sweep_core::{ExperimentConfig, TrialLog};
use sweep_runner::{discover_corpus, ExperimentDriver, SolverProcess};

#[derive(Parser)]
#[command(
    name = "sweep",
    version,
    about = "Benchmark-verification harness for a parallel solver"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full experiment: verify the corpus, aggregate, summarize, chart.
    Run {
        config: PathBuf,
        #[arg(long)]
        json: bool,
    },
    /// Re-aggregate an existing experiment log (also the postmortem path for
    /// aborted runs).
    Aggregate {
        #[arg(long)]
        log: PathBuf,
        #[arg(long, default_value = "res")]
        out: PathBuf,
        #[arg(long)]
        json: bool,
    },
    /// Print the experiment plan without running anything.
    Describe {
        config: PathBuf,
        #[arg(long)]
        json: bool,
    },
    /// Write a starter experiment.yaml.
    Init {
        #[arg(long, default_value = "experiment.yaml")]
        path: PathBuf,
        #[arg(long)]
        force: bool,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let json_mode = command_json_mode(&cli.command);
    match run_command(cli.command) {
        Ok(Some(payload)) => {
            emit_json(&payload);
            Ok(())
        }
        Ok(None) => Ok(()),
        Err(err) => {
            if json_mode {
                emit_json(&json_error("command_failed", err.to_string()));
                std::process::exit(1);
            }
            Err(err)
        }
    }
}

fn run_command(command: Commands) -> Result<Option<Value>> {
    match command {
        Commands::Run { config, json } => {
            let config = ExperimentConfig::load(&config)?;
            let runner = SolverProcess::new(config.solver.clone());
            let log = ExperimentDriver::new(&config, &runner).run()?;

            let records = log.read()?;
            let report = aggregate(&records);
            let summary_path = config.out_dir.join("average.csv");
            write_summary(&report, &summary_path)?;
            let charts = sweep_report::render_all(&report, &config.out_dir);

            if json {
                return Ok(Some(json!({
                    "ok": true,
                    "command": "run",
                    "log": log.path().display().to_string(),
                    "rows": records.len(),
                    "summary": summary_path.display().to_string(),
                    "charts": charts.iter().map(|p| p.display().to_string()).collect::<Vec<_>>(),
                })));
            }
            println!("log: {}", log.path().display());
            println!("rows: {}", records.len());
            println!("summary: {}", summary_path.display());
            for chart in &charts {
                println!("chart: {}", chart.display());
            }
        }
        Commands::Aggregate { log, out, json } => {
            let records = TrialLog::open(&log).read()?;
            let report = aggregate(&records);
            let summary_path = out.join("average.csv");
            write_summary(&report, &summary_path)?;
            let charts = sweep_report::render_all(&report, &out);

            if json {
                return Ok(Some(json!({
                    "ok": true,
                    "command": "aggregate",
                    "log": log.display().to_string(),
                    "rows": records.len(),
                    "aborted": report.aborted,
                    "summary": summary_path.display().to_string(),
                    "charts": charts.iter().map(|p| p.display().to_string()).collect::<Vec<_>>(),
                })));
            }
            println!("log: {}", log.display());
            println!("rows: {}", records.len());
            println!("aborted: {}", report.aborted);
            println!("summary: {}", summary_path.display());
            for chart in &charts {
                println!("chart: {}", chart.display());
            }
        }
        Commands::Describe { config, json } => {
            let config = ExperimentConfig::load(&config)?;
            let inputs = discover_corpus(&config.input_corpus)?;
            let total_trials = inputs.len() * config.trials_per_input();
            if json {
                return Ok(Some(json!({
                    "ok": true,
                    "command": "describe",
                    "solver": config.solver.display().to_string(),
                    "concurrency_grid": config.concurrency_grid,
                    "baseline_level": config.baseline_level(),
                    "verification_epochs": config.verification_epochs,
                    "inputs": inputs.len(),
                    "total_trials": total_trials,
                })));
            }
            println!("solver: {}", config.solver.display());
            println!("concurrency_grid: {:?}", config.concurrency_grid);
            println!("baseline_level: {}", config.baseline_level());
            println!("verification_epochs: {}", config.verification_epochs);
            println!("inputs: {}", inputs.len());
            println!("total_trials: {}", total_trials);
        }
        Commands::Init { path, force } => {
            if !force && path.exists() {
                return Err(anyhow::anyhow!(
                    "config already exists (use --force): {}",
                    path.display()
                ));
            }
            std::fs::write(&path, CONFIG_TEMPLATE)?;
            println!("wrote: {}", path.display());
            println!("next: edit {} then `sweep describe {}`", path.display(), path.display());
        }
    }
    Ok(None)
}

fn command_json_mode(command: &Commands) -> bool {
    match command {
        Commands::Run { json, .. }
        | Commands::Aggregate { json, .. }
        | Commands::Describe { json, .. } => *json,
        Commands::Init { .. } => false,
    }
}

fn emit_json(value: &Value) {
    match serde_json::to_string(value) {
        Ok(s) => println!("{}", s),
        Err(_) => println!(
            "{{\"ok\":false,\"error\":{{\"code\":\"serialization_error\",\"message\":\"failed to serialize JSON payload\"}}}}"
        ),
    }
}

fn json_error(code: &str, message: String) -> Value {
    json!({
        "ok": false,
        "error": {
            "code": code,
            "message": message
        }
    })
}

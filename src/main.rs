//! costlens - Cloud cost insight from the command line.
//!
//! Imports normalized billing records, forecasts end-of-month spend against
//! a monthly budget, and maintains a reviewed set of cost-optimization
//! recommendations.
//!
//! ## Usage
//!
//! ```bash
//! # Month-to-date spend and forecast
//! costlens forecast
//!
//! # Import a JSONL billing export
//! costlens import billing.jsonl
//!
//! # Generate and review recommendations
//! costlens generate
//! costlens optimizations
//! costlens apply 3
//!
//! # Keep recommendations fresh in the background
//! costlens watch --interval-secs 3600
//! ```

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use chrono::Utc;
use clap::{Parser, Subcommand};
use costlens_core::{Config, init_logging};
use costlens_insight::{
    BudgetReport, CostStore, GenerationOutcome, GenerationScheduler, InsightQuery,
    OptimizationReport, RecordImporter, seed_demo_data,
};
use tracing::{error, info};

/// Cloud cost insight: budget forecasting and optimization recommendations.
#[derive(Parser, Debug)]
#[command(name = "costlens")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Raise log verbosity to debug level
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Directory for log files (defaults to ~/.costlens/logs/)
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    /// Path to the cost database (defaults to ~/.costlens/costs.db)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Print reports as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Month-to-date spend, forecast, and per-service projections
    Forecast,

    /// List recommendations with summary statistics
    Optimizations,

    /// Generate a new recommendation batch (no-op while one is pending)
    Generate,

    /// Mark a recommendation as applied
    Apply {
        /// Recommendation id
        id: i64,
    },

    /// Mark a recommendation as ignored
    Ignore {
        /// Recommendation id
        id: i64,
    },

    /// Show or set the monthly budget
    Budget {
        /// New budget amount; omit to show the current one
        amount: Option<f64>,
    },

    /// Show or set the spend alert threshold
    Threshold {
        /// New threshold amount; omit to show the current one
        amount: Option<f64>,
    },

    /// List recorded costs, newest first
    Records {
        /// Maximum number of records to print
        #[arg(long)]
        limit: Option<i64>,
    },

    /// Import cost records from a JSONL billing export
    Import {
        /// Path to the JSONL file
        file: PathBuf,
    },

    /// Seed an empty store with a month of demo data
    Seed,

    /// Run generation on an interval until interrupted
    Watch {
        /// Seconds between generation runs
        #[arg(long)]
        interval_secs: Option<u64>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            return ExitCode::from(1);
        }
    };

    let _guard = match init_logging(Some(config.log_dir.clone()), cli.verbose > 0) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Could not set up logging: {}", e);
            return ExitCode::from(1);
        }
    };

    match run(&cli, &config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Command failed: {:#}", e);
            eprintln!("Error: {:#}", e);
            ExitCode::from(1)
        }
    }
}

/// Load configuration and apply CLI overrides.
fn load_config(cli: &Cli) -> costlens_core::Result<Config> {
    let mut config = Config::load()?;
    if let Some(db) = &cli.db {
        config = config.with_db_path(db.clone());
    }
    if let Some(log_dir) = &cli.log_dir {
        config = config.with_log_dir(log_dir.clone());
    }
    Ok(config)
}

fn run(cli: &Cli, config: &Config) -> anyhow::Result<()> {
    if let Some(parent) = config.db_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating {}", parent.display()))?;
    }
    let store = CostStore::open(&config.db_path)
        .with_context(|| format!("opening cost store at {}", config.db_path.display()))?;
    let today = Utc::now().date_naive();

    match &cli.command {
        Commands::Forecast => {
            let report = InsightQuery::new(&store).budget_report(today)?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print_budget_report(&report);
            }
        }

        Commands::Optimizations => {
            let report = InsightQuery::new(&store).optimization_report(today)?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print_optimization_report(&report);
            }
        }

        Commands::Generate => match InsightQuery::new(&store).generate(today)? {
            GenerationOutcome::Generated { count } => {
                println!("Generated {} recommendations.", count);
            }
            GenerationOutcome::PendingBatchExists { pending } => {
                println!(
                    "{} recommendations still pending review; nothing generated.",
                    pending
                );
            }
        },

        Commands::Apply { id } => {
            InsightQuery::new(&store).apply_recommendation(*id)?;
            println!("Recommendation #{} marked as applied.", id);
        }

        Commands::Ignore { id } => {
            InsightQuery::new(&store).ignore_recommendation(*id)?;
            println!("Recommendation #{} marked as ignored.", id);
        }

        Commands::Budget { amount } => match amount {
            Some(amount) => {
                let budget = store.set_budget(*amount)?;
                println!("Monthly budget set to ${:.2}.", budget.amount);
            }
            None => match store.budget()? {
                Some(budget) => println!("Monthly budget: ${:.2}", budget.amount),
                None => println!("No budget set."),
            },
        },

        Commands::Threshold { amount } => match amount {
            Some(amount) => {
                let threshold = store.set_alert_threshold(*amount)?;
                println!("Alert threshold set to ${:.2}.", threshold.amount);
            }
            None => match store.alert_threshold()? {
                Some(threshold) => println!("Alert threshold: ${:.2}", threshold.amount),
                None => println!("No alert threshold set."),
            },
        },

        Commands::Records { limit } => {
            let records = store.list_records(*limit)?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&records)?);
            } else if records.is_empty() {
                println!("No cost records.");
            } else {
                for record in &records {
                    println!(
                        "{}  {:<22} {:<8} ${:>8.2}  {} / {}",
                        record.date,
                        record.service,
                        record.provider,
                        record.amount,
                        record.project,
                        record.environment
                    );
                }
            }
        }

        Commands::Import { file } => {
            let batch = RecordImporter::new()
                .parse_file(file)
                .with_context(|| format!("importing {}", file.display()))?;
            let inserted = store.insert_records(&batch.records)?;
            println!("Imported {} records ({} skipped).", inserted, batch.skipped);
        }

        Commands::Seed => {
            let summary = seed_demo_data(&store, today)?;
            if summary.skipped() {
                println!("Store already holds records; nothing seeded.");
            } else {
                println!("Seeded {} demo records.", summary.records_written);
                if let Some(GenerationOutcome::Generated { count }) = summary.generation {
                    println!("Generated {} recommendations.", count);
                }
            }
        }

        Commands::Watch { interval_secs } => {
            let mut settings = config.generation.clone();
            if let Some(secs) = interval_secs {
                settings.interval_secs = *secs;
            }

            let store = Arc::new(store);
            let runtime = tokio::runtime::Runtime::new().context("starting async runtime")?;
            runtime.block_on(async move {
                info!(
                    interval_secs = settings.interval_secs,
                    "Watching for review completions"
                );
                let scheduler = GenerationScheduler::from_settings(store, &settings);
                let handle = scheduler.start();

                tokio::signal::ctrl_c().await.context("waiting for interrupt")?;
                handle.abort();
                anyhow::Ok(())
            })?;
            println!("Watch stopped.");
        }
    }

    Ok(())
}

fn print_budget_report(report: &BudgetReport) {
    match report.budget {
        Some(budget) => println!("Budget:           ${:.2}", budget),
        None => println!("Budget:           not set"),
    }
    println!("Current spend:    ${:.2}", report.current_spend);
    println!("Forecasted spend: ${:.2}", report.forecasted_spend);
    println!("Remaining:        ${:.2}", report.remaining);
    println!("Used:             {:.2}%", report.percentage_used);

    if !report.services.is_empty() {
        println!();
        println!("Per-service projections:");
        for projection in &report.services {
            println!(
                "  {:<22} ${:>8.2}/day  ${:>10.2}/month  [{}]",
                projection.service,
                projection.daily_spend,
                projection.monthly_projection,
                projection.status
            );
        }
    }
}

fn print_optimization_report(report: &OptimizationReport) {
    if report.optimizations.is_empty() {
        println!("No recommendations. Run `costlens generate` first.");
        return;
    }

    for opt in &report.optimizations {
        println!(
            "#{:<4} [{:<7}] {:<42} ${:>9.2}",
            opt.id.unwrap_or(0),
            opt.status,
            opt.title,
            opt.estimated_savings
        );
    }

    println!();
    println!(
        "Estimated savings: ${:.2}  (${:.2} applied)",
        report.total_estimated_savings, report.total_applied_savings
    );
    println!(
        "Pending: {}  Applied: {}  Ignored: {}",
        report.pending_count, report.applied_count, report.ignored_count
    );
    println!(
        "Savings vs month-to-date spend: {:.2}%",
        report.savings_percentage
    );
}

mod config;
mod report;

use clap::{Parser, Subcommand, ValueEnum};
use prodplan_core::{Planner, Scenario, SensitivityAnalyzer, build};
use std::path::PathBuf;
use tracing::Level;

#[derive(Parser)]
#[command(name = "prodplan")]
#[command(about = "Profit-maximizing production planning", long_about = None)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Solve the planning problem and show the optimal plan
    Solve {
        /// JSON problem data (defaults to the built-in reference data)
        #[arg(short, long)]
        data: Option<PathBuf>,
        /// Output format
        #[arg(short, long, value_enum, default_value_t = Format::Pretty)]
        format: Format,
        /// Print the business report
        #[arg(short, long)]
        report: bool,
        /// Write the business report to this file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Re-solve with each product's profit scaled and compare
    Sensitivity {
        /// JSON problem data (defaults to the built-in reference data)
        #[arg(short, long)]
        data: Option<PathBuf>,
        /// Profit multiplier applied to one product per scenario
        #[arg(short, long, default_value_t = 1.5)]
        multiplier: f64,
        /// Solve scenarios in parallel
        #[arg(short, long)]
        parallel: bool,
        /// Output format
        #[arg(short, long, value_enum, default_value_t = Format::Pretty)]
        format: Format,
    },
    /// Check problem data for errors
    Check {
        /// JSON problem data (defaults to the built-in reference data)
        #[arg(short, long)]
        data: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Pretty,
    Json,
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn load_or_exit(data: Option<PathBuf>) -> prodplan_core::ProblemData {
    match config::load(data.as_deref()) {
        Ok(d) => d,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

fn print_json<T: serde::Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            eprintln!("Error serializing output: {}", e);
            std::process::exit(1);
        }
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Solve {
            data,
            format,
            report,
            output,
        } => {
            let data = load_or_exit(data);

            let result = match Planner::new().plan(&data) {
                Ok(r) => r,
                Err(e) => {
                    eprintln!("Model error: {}", e);
                    std::process::exit(1);
                }
            };

            match format {
                Format::Json => print_json(&result),
                Format::Pretty => {
                    println!("{}", report::Setup(&data));
                    println!("{}", report::Results(&result));
                }
            }

            let business_report = report::BusinessReport(&result).to_string();
            if report {
                println!("{}", business_report);
            }
            if let Some(path) = output {
                if let Err(e) = std::fs::write(&path, &business_report) {
                    eprintln!("Error writing {}: {}", path.display(), e);
                    std::process::exit(1);
                }
                eprintln!("Report saved to {}", path.display());
            }

            if !result.is_optimal() {
                std::process::exit(1);
            }
        }
        Commands::Sensitivity {
            data,
            multiplier,
            parallel,
            format,
        } => {
            let data = load_or_exit(data);
            let scenarios = Scenario::profit_scenarios(&data, multiplier);

            let results = match SensitivityAnalyzer::new().parallel(parallel).analyze(&data, &scenarios) {
                Ok(r) => r,
                Err(e) => {
                    eprintln!("Model error: {}", e);
                    std::process::exit(1);
                }
            };

            match format {
                Format::Json => print_json(&results),
                Format::Pretty => print!("{}", report::Sensitivity(&results)),
            }
        }
        Commands::Check { data } => {
            let source = data.as_ref().map(|p| p.display().to_string());
            let source = source.as_deref().unwrap_or("reference data");
            let data = load_or_exit(data);

            match build(&data) {
                Ok(model) => {
                    println!("✓ {} is valid", source);
                    println!("  {} products", data.products.len());
                    println!("  {} resources", data.resources.len());
                    println!("  {} constraints", model.problem().num_constraints());
                }
                Err(e) => {
                    eprintln!("✗ {} has errors:", source);
                    eprintln!("  {}", e);
                    std::process::exit(1);
                }
            }
        }
    }
}

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Serialize;

use debitrun::{commands, init_logging, RunConfig, Session};
use debitrun_import::{load_billing_csv, load_eft_file, BillingImportProfile, ParseOptions};

#[derive(Parser)]
#[command(name = "debitrun")]
#[command(about = "Reconcile a bill run against last month's EFT debit-order file")]
#[command(version)]
struct Cli {
    /// TOML run configuration; flags override its values
    #[arg(long, global = true, env = "DEBITRUN_CONFIG")]
    config: Option<PathBuf>,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Log level when RUST_LOG is unset
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Also write a timestamped debug log into this directory
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Load both inputs, update amounts, and write the configured outputs
    #[command(after_help = "\
Examples:
  debitrun run --billing billrun.csv --eft april.eft --out-eft may.eft
  debitrun run --config run.toml --report may.xlsx --json")]
    Run {
        /// Bill-run CSV export
        #[arg(long)]
        billing: Option<PathBuf>,

        /// Previous EFT file
        #[arg(long)]
        eft: Option<PathBuf>,

        /// Where to write the new EFT file
        #[arg(long)]
        out_eft: Option<PathBuf>,

        /// Where to write the reconciliation spreadsheet
        #[arg(long)]
        report: Option<PathBuf>,

        /// Skip header alignment and width checks
        #[arg(long)]
        no_diagnostics: bool,
    },

    /// Parse an EFT file and print its column and alignment report
    InspectEft {
        eft: PathBuf,

        #[arg(long)]
        no_diagnostics: bool,
    },

    /// Aggregate a bill-run CSV and print one debit amount per customer
    Aggregate { csv: PathBuf },
}

#[derive(Serialize)]
struct CustomerLine {
    customer_code: String,
    total_due: String,
    source_rows: usize,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match execute(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e:#}");
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn execute(cli: Cli) -> anyhow::Result<()> {
    let mut config = match &cli.config {
        Some(path) => RunConfig::load(path)?,
        None => RunConfig::default(),
    };
    if let Some(level) = cli.log_level {
        config.logging.level = level;
    }
    if cli.log_dir.is_some() {
        config.logging.log_dir = cli.log_dir;
    }
    init_logging(&config.logging).context("failed to open debug log")?;

    match cli.command {
        Command::Run { billing, eft, out_eft, report, no_diagnostics } => {
            config.input.billing_csv = billing.or(config.input.billing_csv);
            config.input.eft_file = eft.or(config.input.eft_file);
            config.output.eft_file = out_eft.or(config.output.eft_file);
            config.output.report_file = report.or(config.output.report_file);
            if no_diagnostics {
                config.diagnostics.alignment = false;
            }
            let outcome = commands::run(&config).context("reconciliation run failed")?;
            print(&outcome, cli.json)
        }
        Command::InspectEft { eft, no_diagnostics } => {
            let options = ParseOptions {
                diagnostics: config.diagnostics.alignment && !no_diagnostics,
            };
            if cli.json {
                let parsed = load_eft_file(&eft, options)?;
                println!("{}", serde_json::to_string_pretty(&parsed.report)?);
                return Ok(());
            }
            let mut session = Session::new(options);
            let loaded = commands::load_eft(&mut session, &eft)?;
            println!("{loaded}");
            Ok(())
        }
        Command::Aggregate { csv } => {
            let import = load_billing_csv(&csv, &BillingImportProfile::default())
                .with_context(|| format!("could not aggregate {}", csv.display()))?;
            let lines: Vec<CustomerLine> = import
                .table
                .records()
                .iter()
                .map(|r| CustomerLine {
                    customer_code: r.customer_code.to_string(),
                    total_due: r.total_due.to_fixed_width(),
                    source_rows: r.source_rows,
                })
                .collect();
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&lines)?);
            } else {
                for line in &lines {
                    println!("{}  {}  ({} rows)", line.customer_code, line.total_due, line.source_rows);
                }
                let total = import.table.total().context("bill-run total is too large")?;
                println!("{} customers, total {}", lines.len(), total);
            }
            Ok(())
        }
    }
}

fn print<T: Serialize + std::fmt::Display>(value: &T, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(value)?);
    } else {
        println!("{value}");
    }
    Ok(())
}

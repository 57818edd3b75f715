//! `papi` command-line driver.
//!
//! # Responsibility
//! - Map subcommands onto `PaymentService` calls over a SQLite file.
//! - Read payment documents from JSON files and print results as JSON.

use clap::{Parser, Subcommand};
use log::info;
use papi_core::{
    default_log_level, init_logging, Payment, PaymentId, PaymentService, StorageConfig,
};
use std::error::Error;
use std::fs::File;
use std::io::{self, BufReader, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

type CliResult<T> = Result<T, Box<dyn Error>>;

#[derive(Parser)]
#[command(name = "papi")]
#[command(about = "Create, read, update, delete and list payment records")]
struct Cli {
    /// SQLite database file, created on first use
    #[arg(long, default_value = "papi.db")]
    db: PathBuf,

    /// Absolute directory for rolling log files (logging is off without it)
    #[arg(long)]
    log_dir: Option<String>,

    /// Log level (trace|debug|info|warn|error)
    #[arg(long)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Store a new payment read from a JSON file
    Add { file: PathBuf },

    /// Print one payment
    Get { id: PaymentId },

    /// Replace a payment with the document read from a JSON file
    Update { id: PaymentId, file: PathBuf },

    /// Delete one payment
    Delete { id: PaymentId },

    /// Print one page of payments ordered by id
    List {
        #[arg(long, default_value_t = 0)]
        page_number: i64,

        #[arg(long, default_value_t = 10)]
        page_size: i64,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli, &mut io::stdout().lock()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("papi: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli, out: &mut dyn Write) -> CliResult<()> {
    if let Some(log_dir) = cli.log_dir.as_deref() {
        let level = cli.log_level.as_deref().unwrap_or(default_log_level());
        init_logging(level, log_dir)?;
    }

    let config = StorageConfig::Sqlite { path: cli.db };
    let service = PaymentService::new(config.open_repository()?);

    match cli.command {
        Command::Add { file } => {
            let stored = service.create_payment(&read_payment(&file)?)?;
            print_json(out, &stored)
        }
        Command::Get { id } => print_json(out, &service.get_payment(id)?),
        Command::Update { id, file } => {
            let updated = service.update_payment(id, &read_payment(&file)?)?;
            print_json(out, &updated)
        }
        Command::Delete { id } => {
            service.delete_payment(id)?;
            info!("event=cli_delete module=cli status=ok id={id}");
            Ok(())
        }
        Command::List {
            page_number,
            page_size,
        } => print_json(out, &service.list_page(page_number, page_size)?),
    }
}

fn read_payment(path: &Path) -> CliResult<Payment> {
    let file = File::open(path)
        .map_err(|err| format!("cannot open `{}`: {err}", path.display()))?;
    let payment = serde_json::from_reader(BufReader::new(file))
        .map_err(|err| format!("cannot parse `{}`: {err}", path.display()))?;
    Ok(payment)
}

fn print_json<T: serde::Serialize>(out: &mut dyn Write, value: &T) -> CliResult<()> {
    serde_json::to_writer_pretty(&mut *out, value)?;
    writeln!(out)?;
    Ok(())
}

//! `cynthia` binary: a thin CLI front-end over the library (§6).
//!
//! Reads an LTLf formula (from a file or given inline) and a partition
//! file, runs the forward search, and prints `REALIZABLE`/`UNREALIZABLE`
//! to standard output with the exit code of §6 (`0`/`1`/`2`/`3`).

use std::io::{self, BufReader, Write};

use clap::Clap;
use fs_err as fs;

use cynthia::error::Result;
use cynthia::formula::Context;
use cynthia::options::CliOptions;
use cynthia::partition::Partition;
use cynthia::search::{Cancellation, CycleVerdict, SearchConfig};
use cynthia::{check, Status};

fn main() {
    let options = CliOptions::parse();
    if let Err(e) = initialize_logging(options.trace_level) {
        let _ = writeln!(io::stderr(), "Error: {}", e);
    }

    match cynthia_main(&options) {
        Ok(status) => {
            println!("{}", status);
            std::process::exit(status.exit_code());
        }
        Err(error) => {
            let _ = writeln!(io::stderr(), "Error: {}", error);
            std::process::exit(error.exit_code());
        }
    }
}

/// Initializes the logging framework at the given trace level.
///
/// # Errors
///
/// Returns an error if the logging framework has already been initialized.
fn initialize_logging(level: cynthia::options::TraceLevel) -> io::Result<()> {
    env_logger::builder()
        .filter(None, level.into())
        .format_timestamp_millis()
        .try_init()
        .map_err(|e| io::Error::new(io::ErrorKind::AlreadyExists, e))
}

/// Reads the formula and partition, runs the search, and returns the
/// realizability verdict.
fn cynthia_main(options: &CliOptions) -> Result<Status> {
    let ltl = if let Some(formula) = &options.formula {
        formula.clone()
    } else if let Some(path) = &options.formula_path {
        fs::read_to_string(path)?
    } else {
        unreachable!("clap enforces the formula-source argument group")
    };

    let partition_file = fs::File::open(&options.partition_path)?;
    let partition = Partition::read(BufReader::new(partition_file))?;

    let mut ctx = Context::new();
    let phi = cynthia::syntax::parse(&mut ctx, &ltl)?;

    let config = SearchConfig {
        cycle: if options.cycle_wins_controller {
            CycleVerdict::Win
        } else {
            CycleVerdict::Lose
        },
        cancellation: Cancellation::new(),
    };
    check(&mut ctx, phi, &partition, config)
}

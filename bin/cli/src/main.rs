// Copyright (c) reifydb.com 2025
// This file is licensed under the AGPL-3.0-or-later, see license.md file

//! Run a plan document and print its results.
//!
//! Usage: quiver <plan-file> [--binary] [--rows | --arrow] [--explain]
//!
//! Files ending in `.json` are read as text plans, everything else as
//! binary; `--binary` forces the binary format. By default each batch is
//! printed as a table; `--rows` prints one line per row and `--arrow`
//! exports every batch into Arrow before pretty-printing it.

use std::path::PathBuf;
use std::process::ExitCode;

use quiver_bridge::{ResultStream, execute_document};
use quiver_plan::PlanDocument;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Output {
    Batches,
    Rows,
    Arrow,
}

struct Args {
    plan: PathBuf,
    binary: bool,
    output: Output,
    explain: bool,
}

const USAGE: &str = "usage: quiver <plan-file> [--binary] [--rows | --arrow] [--explain]";

fn parse_args() -> Result<Args, String> {
    let mut plan = None;
    let mut binary = false;
    let mut output = Output::Batches;
    let mut explain = false;

    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "--binary" => binary = true,
            "--rows" => output = Output::Rows,
            "--arrow" => output = Output::Arrow,
            "--explain" => explain = true,
            "--help" | "-h" => return Err(USAGE.to_string()),
            flag if flag.starts_with("--") => return Err(format!("unknown flag '{}'", flag)),
            path => {
                if plan.replace(PathBuf::from(path)).is_some() {
                    return Err("expected exactly one plan file".to_string());
                }
            }
        }
    }

    let plan = plan.ok_or_else(|| USAGE.to_string())?;
    Ok(Args { plan, binary, output, explain })
}

fn load_document(args: &Args) -> Result<PlanDocument, String> {
    let is_json =
        !args.binary && args.plan.extension().and_then(|ext| ext.to_str()) == Some("json");
    debug!(path = %args.plan.display(), json = is_json, "loading plan");

    if is_json {
        let text = std::fs::read_to_string(&args.plan)
            .map_err(|err| format!("cannot read '{}': {}", args.plan.display(), err))?;
        quiver_plan::from_json_text(&text).map_err(|err| err.to_string())
    } else {
        let bytes = std::fs::read(&args.plan)
            .map_err(|err| format!("cannot read '{}': {}", args.plan.display(), err))?;
        quiver_plan::from_binary(&bytes).map_err(|err| err.to_string())
    }
}

fn drain(mut stream: ResultStream, output: Output) -> Result<(), String> {
    let mut batches = 0usize;
    let mut rows = 0usize;
    while let Some(batch) = stream.advance().map_err(|err| err.to_string())? {
        batches += 1;
        rows += batch.row_count().map_err(|err| err.to_string())?;
        match output {
            Output::Batches => print!("{}", batch.to_text().map_err(|err| err.to_string())?),
            Output::Rows => {
                for row in batch.rows().map_err(|err| err.to_string())? {
                    println!("{}", row.to_text().map_err(|err| err.to_string())?);
                }
            }
            Output::Arrow => {
                let record = batch.export_columnar().map_err(|err| err.to_string())?;
                arrow::util::pretty::print_batches(&[record]).map_err(|err| err.to_string())?;
            }
        }
    }
    eprintln!("{} batches, {} rows", batches, rows);
    Ok(())
}

fn run() -> Result<(), String> {
    let args = parse_args()?;
    let doc = load_document(&args)?;

    if args.explain {
        let plan = quiver_plan::convert(&doc).map_err(|err| err.to_string())?;
        print!("{}", plan.explain());
        return Ok(());
    }

    let stream = execute_document(&doc).map_err(|err| err.to_string())?;
    drain(stream, args.output)
}

fn main() -> ExitCode {
    tracing_subscriber::fmt().with_env_filter(EnvFilter::from_default_env()).init();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("{}", message);
            ExitCode::FAILURE
        }
    }
}

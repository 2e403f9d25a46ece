use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use log::warn;
use uniqip::{CountReport, Counter, UniqIpError};

/// Count the distinct IPv4 addresses in a newline-delimited file.
#[derive(Parser)]
#[command(name = "uniqip")]
#[command(version)]
struct Cli {
    /// File with one dotted-decimal IPv4 address per line
    file: PathBuf,

    /// Number of worker threads (defaults to twice the available parallelism)
    #[arg(short, long, value_parser = clap::value_parser!(u64).range(1..))]
    workers: Option<u64>,

    /// Fail instead of printing a partial count when a read error cuts a span short
    #[arg(long)]
    strict: bool,

    /// Read the file through a memory map
    #[cfg(feature = "mmap")]
    #[arg(long)]
    mmap: bool,

    /// Print the full run report as JSON
    #[arg(long)]
    json: bool,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();

    match run(&cli) {
        Ok(report) => {
            if cli.json {
                match serde_json::to_string_pretty(&report) {
                    Ok(json) => println!("{json}"),
                    Err(err) => {
                        eprintln!("error: {err}");
                        return ExitCode::FAILURE;
                    }
                }
            } else {
                println!("Number of unique addresses: {}", report.unique);
            }
            if report.truncated_spans > 0 {
                warn!("count may be incomplete, rerun with --strict to treat this as an error");
            }
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<CountReport, UniqIpError> {
    let counter = cli
        .workers
        .map_or_else(Counter::default, Counter::new)
        .strict(cli.strict);

    #[cfg(feature = "mmap")]
    {
        if cli.mmap {
            return counter.count_mmap(&cli.file);
        }
    }
    counter.count_file(&cli.file)
}

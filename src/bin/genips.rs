use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use log::debug;
use fake::faker::internet::raw::IPv4;
use fake::locales::EN;
use fake::Fake;
use uniqip::{parse_line, PresenceSet};

/// Write random IPv4 addresses to a file, one per line.
#[derive(Parser)]
#[command(name = "genips")]
#[command(version)]
struct Cli {
    /// Output file to write
    #[arg(long, default_value = "IPs.txt")]
    out: PathBuf,

    /// Number of addresses to generate
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    count: u64,

    /// Also report how many of the generated addresses are distinct
    #[arg(long)]
    unique: bool,
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    match generate(&cli.out, cli.count, cli.unique) {
        Ok(unique) => {
            println!("Generated {} IPv4 addresses in {}", cli.count, cli.out.display());
            if let Some(unique) = unique {
                println!("Unique IPv4 addresses: {unique}");
            }
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("error writing {}: {err}", cli.out.display());
            ExitCode::FAILURE
        }
    }
}

fn generate(out: &Path, count: u64, track_unique: bool) -> io::Result<Option<u64>> {
    if let Some(dir) = out.parent().filter(|d| !d.as_os_str().is_empty()) {
        debug!("creating output directory {}", dir.display());
        fs::create_dir_all(dir)?;
    }
    debug!("writing {} addresses to {}", count, out.display());
    let mut writer = BufWriter::with_capacity(1 << 20, File::create(out)?);
    let seen = track_unique.then(PresenceSet::new);

    for _ in 0..count {
        let address: String = IPv4(EN).fake();
        if let (Some(seen), Some(value)) = (&seen, parse_line(address.as_bytes())) {
            seen.add(value);
        }
        writeln!(writer, "{address}")?;
    }
    writer.flush()?;
    Ok(seen.map(|seen| seen.count()))
}

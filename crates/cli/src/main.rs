//! Multicore MSI cache simulator CLI.
//!
//! This binary replays a memory trace through one private cache per core. It performs:
//! 1. **Configuration:** Built-in defaults, optionally overlaid by a JSON file, then by flags.
//! 2. **Validation:** Each invalid parameter exits with its own status code before any
//!    cache is built.
//! 3. **Replay:** Every trace line is applied in order; the per-cache report is printed
//!    as text or JSON.

use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use std::process;
use std::str::FromStr;

use clap::Parser;
use clap::error::ErrorKind;
use tracing::{debug, error};
use tracing_subscriber::EnvFilter;

use msisim_core::Simulator;
use msisim_core::common::error::{ConfigError, SimError};
use msisim_core::config::{Config, WritePolicy};
use msisim_core::stats::write_geometry;

/// Exit status when the trace (or configuration) file cannot be read.
const EXIT_IO: i32 = 2;

/// Exit status for an internal coherence failure.
const EXIT_INTERNAL: i32 = 1;

/// Exit status for an unknown flag or a flag with an unparsable value.
const EXIT_USAGE: i32 = 12;

#[derive(Parser, Debug)]
#[command(
    name = "msisim",
    author,
    version,
    about = "Multicore set-associative cache simulator with MSI snooping coherence",
    long_about = "Replay a trace of `<core> <hex address> <R|W>` lines through one private cache per core.\n\nFlags override values read from --config; unspecified values use built-in defaults.\n\nExamples:\n  msisim trace.txt\n  msisim -a 4 -w B -c 4 trace.txt\n  msisim --config cache.json --json trace.txt"
)]
struct Cli {
    /// Words per block (power of two).
    #[arg(short = 'b', value_name = "WORDS")]
    block_words: Option<u32>,

    /// Data words per cache (power of two).
    #[arg(short = 'n', value_name = "WORDS")]
    data_words: Option<u32>,

    /// Cycles charged per miss (positive).
    #[arg(short = 'm', value_name = "CYCLES", allow_negative_numbers = true)]
    miss_penalty: Option<i64>,

    /// Lines per set (power of two).
    #[arg(short = 'a', value_name = "WAYS")]
    associativity: Option<u32>,

    /// Write policy: T (write-through) or B (write-back).
    #[arg(short = 'w', value_name = "T|B")]
    write_policy: Option<String>,

    /// Number of cores, one cache each (power of two).
    #[arg(short = 'c', value_name = "CORES")]
    cores: Option<u32>,

    /// JSON configuration file; flags take precedence over its values.
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Log every access, hit, miss and snoop to stderr.
    #[arg(long)]
    debug: bool,

    /// Print the report as JSON instead of text.
    #[arg(long)]
    json: bool,

    /// Trace file to replay.
    trace: PathBuf,
}

fn main() {
    let cli = Cli::try_parse().unwrap_or_else(|e| match usage_status(&e) {
        Some(code) => {
            let _ = e.print();
            process::exit(code);
        }
        None => e.exit(),
    });
    init_tracing(cli.debug);

    let config = resolve_config(&cli).unwrap_or_else(|e| exit_config(&e));
    let mut sim = Simulator::new(&config).unwrap_or_else(|e| exit_config(&e));

    if !cli.json {
        let mut banner = String::new();
        if write_geometry(&mut banner, sim.domain().geometry(), config.write_policy).is_ok() {
            println!("{banner}");
        }
    }

    let file = File::open(&cli.trace).unwrap_or_else(|e| {
        eprintln!("Error: cannot read trace file {}: {e}", cli.trace.display());
        process::exit(EXIT_IO);
    });

    let report = match sim.run(BufReader::new(file)) {
        Ok(report) => report,
        Err(SimError::Io(e)) => {
            eprintln!("Error: reading trace file {}: {e}", cli.trace.display());
            process::exit(EXIT_IO);
        }
        Err(SimError::Config(e)) => exit_config(&e),
        Err(e) => {
            error!(%e, "simulation aborted");
            eprintln!("Error: {e}");
            process::exit(EXIT_INTERNAL);
        }
    };

    if cli.json {
        match report.to_json() {
            Ok(json) => println!("{json}"),
            Err(e) => {
                eprintln!("Error: cannot render report: {e}");
                process::exit(EXIT_INTERNAL);
            }
        }
    } else {
        report.print();
    }
}

/// Exit status for a command-line parse failure, or `None` for `--help` and `--version`.
fn usage_status(e: &clap::Error) -> Option<i32> {
    match e.kind() {
        ErrorKind::DisplayHelp
        | ErrorKind::DisplayVersion
        | ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => None,
        _ => Some(EXIT_USAGE),
    }
}

/// Installs the stderr subscriber: `debug` with `--debug`, otherwise `RUST_LOG` or `warn`.
fn init_tracing(debug: bool) {
    let filter = if debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Builds the configuration: defaults, then `--config`, then individual flags.
fn resolve_config(cli: &Cli) -> Result<Config, ConfigError> {
    let mut config = match &cli.config {
        Some(path) => {
            let text = std::fs::read_to_string(path).unwrap_or_else(|e| {
                eprintln!("Error: cannot read config file {}: {e}", path.display());
                process::exit(EXIT_IO);
            });
            Config::from_json(&text)?
        }
        None => Config::default(),
    };

    if let Some(block_words) = cli.block_words {
        config.block_words = block_words;
    }
    if let Some(data_words) = cli.data_words {
        config.data_words = data_words;
    }
    if let Some(penalty) = cli.miss_penalty {
        config.miss_penalty = u64::try_from(penalty)
            .ok()
            .filter(|&p| p > 0)
            .ok_or(ConfigError::NonPositiveMissPenalty(penalty))?;
    }
    if let Some(associativity) = cli.associativity {
        config.associativity = associativity;
    }
    if let Some(policy) = &cli.write_policy {
        config.write_policy = WritePolicy::from_str(policy)?;
    }
    if let Some(cores) = cli.cores {
        config.cores = cores;
    }

    config.validate()?;
    debug!(?config, "configuration resolved");
    Ok(config)
}

/// Reports a rejected configuration and exits with its status code.
fn exit_config(e: &ConfigError) -> ! {
    eprintln!("Error: {e}");
    process::exit(e.exit_code());
}

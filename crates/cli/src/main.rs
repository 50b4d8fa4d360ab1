use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use dumpoffsets::commands::{check_command, dump_command, identify_command, show_command};
use dumpoffsets::config::{load_config, DumpConfig};
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// Dump resolved memory offsets for every known build of a target program.
///
/// This CLI is a thin wrapper around `memlayout-core`. All parsing, inheritance
/// resolution, and formatting lives in the library so it can be tested and
/// reused from other frontends.
#[derive(Parser, Debug)]
#[command(name = "dumpoffsets", version, about = "Dump resolved memory offsets per build", long_about = None)]
struct Cli {
    /// JSON config file. Defaults to `dumpoffsets.json` in the working directory, if present.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Layout definitions file. Overrides the config; defaults to `Memory.xml`.
    #[arg(long, global = true)]
    file: Option<String>,

    /// Increase log verbosity (-v info, -vv debug). `RUST_LOG` takes precedence.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Wait for Enter before exiting.
    #[arg(long, default_value_t = false, global = true)]
    pause: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Dump every version in document order (the default).
    Dump(DumpArgs),

    /// Dump a single version.
    Show {
        #[arg(long)]
        platform: String,

        /// Version label, e.g. `v0.31.25`.
        #[arg(long)]
        version: String,

        /// Emit JSON instead of the text dump.
        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// Identify an executable by its SHA-256 fingerprint.
    Identify {
        /// Path to the executable to hash.
        #[arg(long)]
        binary: PathBuf,
    },

    /// Load and resolve the definitions, reporting errors without dumping.
    Check {
        /// Emit JSON instead of human-readable text.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
}

#[derive(Args, Debug, Default)]
struct DumpArgs {
    /// Only dump versions for this platform.
    #[arg(long)]
    platform: Option<String>,

    /// Emit a JSON array instead of the text dump.
    #[arg(long, default_value_t = false)]
    json: bool,

    /// Write the dump to this file instead of stdout.
    #[arg(long)]
    output: Option<PathBuf>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = load_config(cli.config.as_deref());
    let pause = cli.pause || config.as_ref().is_ok_and(|config| config.pause_on_exit);
    let result = config.and_then(|config| run(&cli, &config));

    if pause {
        wait_for_enter();
    }
    result
}

fn run(cli: &Cli, config: &DumpConfig) -> Result<()> {
    let file = cli.file.as_deref();
    let default_dump = DumpArgs::default();

    // Default to a full dump if no subcommand is given.
    match cli.command.as_ref() {
        None => run_dump(config, file, &default_dump),
        Some(Command::Dump(args)) => run_dump(config, file, args),
        Some(Command::Show { platform, version, json }) => {
            show_command(config, file, platform, version, *json)
        }
        Some(Command::Identify { binary }) => identify_command(config, file, binary),
        Some(Command::Check { json }) => check_command(config, file, *json),
    }
}

fn run_dump(config: &DumpConfig, file: Option<&str>, args: &DumpArgs) -> Result<()> {
    dump_command(config, file, args.platform.as_deref(), args.json, args.output.as_deref())
}

/// Logs go to stderr so dumps on stdout stay clean.
fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(io::stderr).init();
    debug!(verbose, "logging initialised");
}

fn wait_for_enter() {
    eprint!("Press Enter to exit...");
    let _ = io::stderr().flush();
    let mut line = String::new();
    let _ = io::stdin().lock().read_line(&mut line);
}

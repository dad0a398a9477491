//! Run scripts or programs in a directory.
//!
//! Every file in DIRECTORY that passes the naming policy and is executable is
//! run in lexicographic order of its name. The exit code is that of the last
//! script executed.

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use run_parts::config::{Configuration, DEFAULT_UMASK};
use run_parts::exit_codes;
use run_parts::io::log::{LOG_PREFIX, StderrLog};
use run_parts::io::process::{Inherited, ProcessRunner};
use run_parts::logging;
use run_parts::run::Orchestrator;

#[derive(Parser, Debug)]
#[command(
    name = "run-parts",
    version,
    about = "Run scripts or programs in a directory"
)]
struct Cli {
    /// Directory containing the scripts.
    #[arg(value_name = "DIRECTORY", default_value = ".")]
    directory: PathBuf,

    /// Pass argument to the scripts. Use --arg once for each argument you want passed.
    #[arg(short, long = "arg", value_name = "ARG", allow_hyphen_values = true)]
    arg: Vec<String>,

    /// Exit as soon as a script returns with a non-zero exit code.
    #[arg(long)]
    exit_on_error: bool,

    /// Print the names of all matching files (not limited to executables), but don't
    /// actually run them.
    #[arg(long, conflicts_with = "test")]
    list: bool,

    /// Filename must be in one or more of either the LANANA-assigned namespace, the LSB
    /// namespaces - either hierarchical or reserved - or the Debian cron script namespace.
    #[arg(long, conflicts_with = "regex")]
    lsbsysinit: bool,

    /// Validate filenames against custom extended regular expression REGEX.
    #[arg(long, value_name = "REGEX")]
    regex: Option<String>,

    /// Similar to --verbose, but only prints the name of scripts which produce output.
    /// The name is printed to whichever of stdout or stderr the script produces output
    /// on, and not to stderr if --verbose is also given.
    #[arg(long)]
    report: bool,

    /// Reverse the scripts' execution order.
    #[arg(long)]
    reverse: bool,

    /// Print the names of the scripts which would be run, but don't actually run them.
    #[arg(long)]
    test: bool,

    /// Set the umask (octal) before running the scripts.
    #[arg(long, value_name = "UMASK", default_value = DEFAULT_UMASK)]
    umask: String,

    /// Print the name of each script to stderr before running.
    #[arg(short, long)]
    verbose: bool,
}

impl From<Cli> for Configuration {
    fn from(cli: Cli) -> Self {
        Configuration {
            directory: cli.directory,
            args: cli.arg,
            list: cli.list,
            test: cli.test,
            verbose: cli.verbose,
            report: cli.report,
            reverse: cli.reverse,
            exit_on_error: cli.exit_on_error,
            lsb_sysinit: cli.lsbsysinit,
            regex: cli.regex,
            umask: cli.umask,
        }
    }
}

fn main() {
    logging::init();
    match run() {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("{LOG_PREFIX}{err:#}");
            std::process::exit(exit_codes::INVALID);
        }
    }
}

fn run() -> Result<i32> {
    let config = Configuration::from(Cli::parse());
    let orchestrator = Orchestrator::new(config, ProcessRunner::new(Inherited), StderrLog)?;
    let status = orchestrator.run()?;
    Ok(status.exit_code)
}

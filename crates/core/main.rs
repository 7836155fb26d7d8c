#![deny(
    clippy::all,
    clippy::pedantic,
    clippy::perf,
    clippy::style,
    clippy::missing_safety_doc,
    clippy::missing_const_for_fn
)]
#![allow(clippy::as_conversions, clippy::mod_module_files)]

use std::{process, time::Duration};

mod commands;
mod output;

use commands::Commands;
use output::{OutputFormat, Processor};

use unpaywall::{Config, Unpaywall, DEFAULT_BASE_URL};

use clap::{Args, Parser};
use log::{error, trace};

fn main() {
    if let Err(err) = try_main() {
        error!("{:#}", err);
        process::exit(2);
    }
}

fn try_main() -> eyre::Result<()> {
    let Cli {
        command,
        global_opts:
            GlobalOpts {
                email,
                base_url,
                timeout,
                output,
                fields,
                verbosity,
                quiet,
            },
    } = Cli::parse();

    setup_errlog(verbosity as usize, quiet)?;

    let mut config = Config::default().base_url(base_url);
    if let Some(email) = email {
        config = config.email(email);
    }
    if let Some(secs) = timeout {
        trace!("Requests time out after {secs} seconds");
        config = config.timeout(Duration::from_secs(secs));
    }
    let api = Unpaywall::new(config)?;

    let mut processor = Processor::new(output, fields.as_deref());
    command.execute(&api, &mut processor)?;

    print!("{}", processor.output()?);
    Ok(())
}

fn setup_errlog(verbosity: usize, quiet: bool) -> eyre::Result<()> {
    // if quiet then ignore verbosity but still show errors
    let verbosity = if quiet { 0 } else { verbosity + 1 };

    stderrlog::new()
        .module(module_path!())
        .verbosity(verbosity)
        .init()?;
    Ok(())
}

#[derive(Parser)]
#[clap(name = "unpaywall")]
#[clap(about = "Look up and search the open access status of bibliographic entries")]
#[clap(version, author)]
struct Cli {
    #[clap(subcommand)]
    command: Commands,

    #[clap(flatten)]
    global_opts: GlobalOpts,
}

#[derive(Debug, Args)]
struct GlobalOpts {
    /// Email address to use for API requests (required)
    ///
    /// The Unpaywall API identifies callers by email, requests without one are refused.
    #[clap(long, env = "UNPAYWALL_EMAIL", hide_env_values = true, global = true)]
    email: Option<String>,

    /// Base URL for API requests
    #[clap(long, default_value = DEFAULT_BASE_URL, global = true)]
    base_url: String,

    /// Seconds to wait for each request before giving up
    #[clap(long, global = true)]
    timeout: Option<u64>,

    /// How results are printed: table, csv or json
    #[clap(short, long, default_value = "table", global = true)]
    output: OutputFormat,

    /// Comma separated list of the fields to print, in that order
    #[clap(long, global = true)]
    fields: Option<String>,

    /// How chatty the program is when performing commands
    ///
    /// The number of times this flag is used will increase how chatty
    /// the program is.
    #[clap(short, long, parse(from_occurrences), global = true)]
    verbosity: u8,

    /// Only errors are written to stderr.
    #[clap(short, long, global = true)]
    quiet: bool,
}

use anyhow::Result;
use clap::{ArgAction, Parser};
use std::path::PathBuf;

use crate::commands::rotate::{self, RotateOptions};
use crate::env_loader;
use crate::logging::{self, TracingLog};
use crate::rotation::config::load_config;

/// Archive stale files and directories into a history tree grouped by
/// date, so old work stays observable and searchable instead of deleted.
#[derive(Debug, Parser)]
#[command(name = "rotatedir", version, disable_help_flag = true)]
struct Cli {
    /// Directory whose top-level entries are rotated.
    #[arg(value_name = "BASE")]
    base: PathBuf,

    /// Directory to save history in. Default: <BASE>/HISTORY
    #[arg(short = 'h', long = "history-base", value_name = "DIR")]
    history_base: Option<PathBuf>,

    /// How many days an entry may stay untouched before it is rotated.
    /// Default: 7
    #[arg(short = 'e', long = "expire", value_name = "N")]
    expire: Option<u32>,

    /// Log every decision, including skipped entries.
    #[arg(short = 'v', long)]
    verbose: bool,

    /// Do not move anything, only log what would happen.
    #[arg(short = 'd', long = "dry")]
    dry: bool,

    /// Leave a top-level entry alone. Repeatable.
    #[arg(short = 'i', long = "ignore", value_name = "NAME")]
    ignore: Vec<String>,

    /// IANA time zone used to date entries. Default: local time
    #[arg(long, value_name = "TZ")]
    timezone: Option<String>,

    /// Print a JSON run report after the run.
    #[arg(long)]
    json: bool,

    /// Print help.
    #[arg(long, action = ArgAction::Help)]
    help: Option<bool>,
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose)?;
    env_loader::load_dotenv(&TracingLog);
    let cfg = load_config()?;

    let opts = RotateOptions {
        base: cli.base,
        history_base: cli.history_base,
        expire_days: cli.expire,
        dry_run: cli.dry,
        ignore: cli.ignore,
        timezone: cli.timezone,
    };
    let report = rotate::run(&opts, &cfg, &TracingLog)?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    }
    Ok(())
}

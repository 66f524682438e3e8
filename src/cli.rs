// src/cli.rs
use std::path::PathBuf;

use crate::config::Config;
use crate::dispatch::{Dispatcher, DryRunDispatcher, OneSignalDispatcher};
use crate::error::ConfigError;
use crate::fetch::HttpSource;
use crate::progress::Progress;
use crate::runner::{self, EntityReport, RunReport};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Args {
    pub config: Option<PathBuf>,
    pub state: Option<PathBuf>,
    pub log_file: Option<PathBuf>,
    pub dry_run: bool,
    pub verbose: bool,
    pub help: bool,
}

pub const HELP: &str = "\
Usage: carnabot-poller [options]

Runs one poll cycle: fetch the sheet, alert on changed blocks, save state.

Options:
  -c, --config <path>   TOML config (default: ./carnabot.toml if present)
  -s, --state <path>    Snapshot file (overrides config/env)
      --log <path>      Append log lines to a file instead of stderr
  -n, --dry-run         Log alerts instead of sending them
  -v, --verbose         Debug logging (RUST_LOG takes precedence)
  -h, --help            Show this help

Environment:
  CARNABOT_CSV_URL, CARNABOT_STATE_FILE,
  CARNABOT_ONESIGNAL_APP_ID, CARNABOT_ONESIGNAL_REST_KEY
  RUST_LOG   log filter, e.g. carnabot_poller=debug,reqwest=info
";

pub fn parse_args<I>(args: I) -> Result<Args, Box<dyn std::error::Error + Send + Sync>>
where
    I: IntoIterator<Item = String>,
{
    let mut out = Args::default();
    let mut args = args.into_iter();
    while let Some(a) = args.next() {
        match a.as_str() {
            "-c" | "--config" => out.config = Some(PathBuf::from(args.next().ok_or("Missing value for --config")?)),
            "-s" | "--state" => out.state = Some(PathBuf::from(args.next().ok_or("Missing value for --state")?)),
            "--log" => out.log_file = Some(PathBuf::from(args.next().ok_or("Missing value for --log")?)),
            "-n" | "--dry-run" => out.dry_run = true,
            "-v" | "--verbose" => out.verbose = true,
            "-h" | "--help" => out.help = true,
            _ => return Err(format!("Unknown arg: {}", a).into()),
        }
    }
    Ok(out)
}

/// Resolve the full run configuration for these arguments.
pub fn resolve_config(args: &Args) -> Result<Config, ConfigError> {
    let mut cfg = Config::load(args.config.as_deref())?;
    if let Some(state) = &args.state {
        cfg.store.path = state.clone();
    }
    cfg.run.dry_run = args.dry_run;
    cfg.validate()?;
    Ok(cfg)
}

/// Prints one line per alert, like the old cron output.
struct CliProgress;

impl Progress for CliProgress {
    fn begin(&mut self, total: usize) {
        if total > 0 {
            println!("{total} alert(s) to send");
        }
    }

    fn log(&mut self, msg: &str) {
        println!("{msg}");
    }

    fn item_done(&mut self, item: &EntityReport) {
        println!("{}: {}", item.name, item.outcome);
    }

    fn finish(&mut self, report: &RunReport) {
        println!("Done: {report}");
    }
}

/// Entry point for the binary: one fetch → diff → notify → persist cycle.
pub fn run(args: &Args) -> Result<RunReport, Box<dyn std::error::Error + Send + Sync>> {
    let cfg = resolve_config(args)?;

    let source = HttpSource::new(&cfg.source)?;
    let dispatcher: Box<dyn Dispatcher> = if cfg.run.dry_run {
        Box::new(DryRunDispatcher)
    } else {
        Box::new(OneSignalDispatcher::new(cfg.push.clone())?)
    };

    let mut progress = CliProgress;
    let report = runner::run(&cfg, &source, dispatcher.as_ref(), Some(&mut progress))?;
    Ok(report)
}

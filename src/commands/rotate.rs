use anyhow::{Context, Result};
use std::collections::BTreeSet;
use std::ffi::OsString;
use std::path::PathBuf;

use crate::commands::CommandReport;
use crate::logging::Log;
use crate::rotation::clock::{DateZone, RunClock};
use crate::rotation::config::RotateConfig;
use crate::rotation::paths::resolve_paths;
use crate::rotation::scan::{self, ScanOptions};

#[derive(Debug, Clone, Default)]
pub struct RotateOptions {
    pub base: PathBuf,
    pub history_base: Option<PathBuf>,
    pub expire_days: Option<u32>,
    pub dry_run: bool,
    pub ignore: Vec<String>,
    pub timezone: Option<String>,
}

fn scan_options(opts: &RotateOptions, cfg: &RotateConfig) -> ScanOptions {
    let paths = resolve_paths(
        &opts.base,
        opts.history_base.as_deref(),
        &cfg.history_dir_name,
    );
    let ignore = cfg
        .ignore
        .iter()
        .chain(opts.ignore.iter())
        .map(OsString::from)
        .collect::<BTreeSet<_>>();

    ScanOptions {
        base: paths.base,
        history_root: paths.history_root,
        expire_days: opts.expire_days.unwrap_or(cfg.expire_days),
        dry_run: opts.dry_run,
        ignore,
    }
}

pub fn run(opts: &RotateOptions, cfg: &RotateConfig, log: &dyn Log) -> Result<CommandReport> {
    let zone = DateZone::parse(opts.timezone.as_deref().or(cfg.timezone.as_deref()))?;
    let clock = RunClock::start(zone)?;
    let scan_opts = scan_options(opts, cfg);
    let mut report = CommandReport::new("rotate", scan_opts.dry_run);

    report.detail(format!("base={}", scan_opts.base.display()));
    report.detail(format!("history_root={}", scan_opts.history_root.display()));
    report.detail(format!("expire_days={}", scan_opts.expire_days));
    report.detail(format!("today={}", clock.today()));

    let outcome = scan::run(&scan_opts, &clock, log)
        .with_context(|| format!("rotation of {} aborted", scan_opts.base.display()))?;

    report.detail(format!("scanned={}", outcome.scanned));
    report.detail(format!("ignored={}", outcome.ignored));
    report.detail(format!("skipped={}", outcome.skipped));
    report.detail(format!("archived={}", outcome.archived.len()));
    for archived in &outcome.archived {
        report.detail(format!(
            "archived.entry={} modified={} target={}",
            archived.source.display(),
            archived.effective_date,
            archived.target.display()
        ));
    }

    Ok(report)
}

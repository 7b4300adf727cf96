use crate::error::ArchiveError;
use crate::logging::Log;
use crate::rotation::clock::RunClock;
use crate::rotation::entry::Entry;
use crate::rotation::expiry::should_archive;
use crate::rotation::history::HistoryDir;
use crate::rotation::mtime::is_self_or_parent;
use crate::rotation::paths::identity;
use chrono::NaiveDate;
use std::collections::BTreeSet;
use std::ffi::OsString;
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct ScanOptions {
    pub base: PathBuf,
    pub history_root: PathBuf,
    pub expire_days: u32,
    pub dry_run: bool,
    pub ignore: BTreeSet<OsString>,
}

#[derive(Debug, Clone)]
pub struct ArchivedEntry {
    pub source: PathBuf,
    pub target: PathBuf,
    pub effective_date: NaiveDate,
}

#[derive(Debug, Clone, Default)]
pub struct ScanOutcome {
    pub scanned: usize,
    pub ignored: usize,
    pub skipped: usize,
    pub archived: Vec<ArchivedEntry>,
}

/// Names of the base directory's immediate children, hidden ones included,
/// in a stable order.
fn list_children(opts: &ScanOptions) -> Result<Vec<OsString>, ArchiveError> {
    let entries = fs::read_dir(&opts.base).map_err(|source| ArchiveError::BaseUnreadable {
        path: opts.base.clone(),
        source,
    })?;

    let mut names = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| ArchiveError::BaseUnreadable {
            path: opts.base.clone(),
            source,
        })?;
        names.push(entry.file_name());
    }
    names.sort();
    Ok(names)
}

/// One pass over the base directory: every expired top-level entry is moved
/// into its date bucket, everything else is left in place.
///
/// Stops at the first structural or move failure; entries archived before
/// that point stay archived.
pub fn run(
    opts: &ScanOptions,
    clock: &RunClock,
    log: &dyn Log,
) -> Result<ScanOutcome, ArchiveError> {
    if !opts.base.is_dir() {
        return Err(ArchiveError::BaseMissing(opts.base.clone()));
    }

    let mut history = HistoryDir::open(&opts.history_root, opts.dry_run, log)?;
    let history_id = identity(history.root());
    let today = clock.today();
    let mut out = ScanOutcome::default();

    for name in list_children(opts)? {
        if is_self_or_parent(&name) {
            continue;
        }
        let path = opts.base.join(&name);
        if identity(&path) == history_id {
            continue;
        }
        if opts.ignore.contains(&name) {
            out.ignored += 1;
            log.debug(&format!("ignore {}", path.display()));
            continue;
        }

        out.scanned += 1;
        let entry = Entry::new(path);
        let date = entry.effective_date(clock, log);
        if should_archive(date, opts.expire_days, today) {
            let target = history.archive(&entry, date)?;
            out.archived.push(ArchivedEntry {
                source: entry.path().to_path_buf(),
                target,
                effective_date: date,
            });
        } else {
            out.skipped += 1;
            log.debug(&format!(
                "skip {} (modified {date}), too fresh",
                entry.path().display()
            ));
        }
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::{LogLine, MemoryLog};
    use crate::rotation::clock::DateZone;
    use crate::rotation::testutil::{days_before, scratch_dir, set_far_future_mtime, set_mtime};
    use std::path::Path;
    use std::time::SystemTime;
    use tempfile::{TempDir, tempdir};

    fn clock() -> RunClock {
        RunClock::start(DateZone::parse(Some("UTC")).expect("utc")).expect("clock")
    }

    fn options(base: &Path) -> ScanOptions {
        ScanOptions {
            base: base.to_path_buf(),
            history_root: base.join("HISTORY"),
            expire_days: 7,
            dry_run: false,
            ignore: BTreeSet::new(),
        }
    }

    /// `a.txt` is 10 days old, `b/` is old itself but holds a 1-day-old file.
    fn scenario(now: SystemTime) -> TempDir {
        let tmp = tempdir().expect("tempdir");
        let base = tmp.path();
        fs::write(base.join("a.txt"), "a").expect("write a");
        fs::create_dir(base.join("b")).expect("mkdir b");
        fs::write(base.join("b/inner.txt"), "inner").expect("write inner");

        set_mtime(&base.join("a.txt"), days_before(now, 10));
        set_mtime(&base.join("b/inner.txt"), days_before(now, 1));
        set_mtime(&base.join("b"), days_before(now, 20));
        tmp
    }

    fn snapshot(root: &Path) -> Vec<PathBuf> {
        fn walk(dir: &Path, root: &Path, out: &mut Vec<PathBuf>) {
            for entry in fs::read_dir(dir).expect("read_dir") {
                let path = entry.expect("entry").path();
                out.push(path.strip_prefix(root).expect("prefix").to_path_buf());
                let meta = fs::symlink_metadata(&path).expect("meta");
                if meta.is_dir() {
                    walk(&path, root, out);
                }
            }
        }
        let mut out = Vec::new();
        walk(root, root, &mut out);
        out.sort();
        out
    }

    #[test]
    fn stale_file_moves_and_fresh_directory_stays() {
        let clock = clock();
        let tmp = scenario(clock.now());
        let base = tmp.path();
        let log = MemoryLog::default();

        let out = run(&options(base), &clock, &log).expect("scan");

        let bucket = clock
            .date_of(days_before(clock.now(), 10))
            .expect("date")
            .to_string();
        assert!(base.join("HISTORY").join(&bucket).join("a.txt").is_file());
        assert!(!base.join("a.txt").exists());
        assert!(base.join("b/inner.txt").is_file());
        assert_eq!(out.archived.len(), 1);
        assert_eq!(out.skipped, 1);
        assert_eq!(out.scanned, 2);
    }

    #[test]
    fn second_run_finds_nothing_left() {
        let clock = clock();
        let tmp = scenario(clock.now());
        let log = MemoryLog::default();

        let first = run(&options(tmp.path()), &clock, &log).expect("first");
        let second = run(&options(tmp.path()), &clock, &log).expect("second");

        assert_eq!(first.archived.len(), 1);
        assert!(second.archived.is_empty());
        assert_eq!(second.scanned, 1);
    }

    #[test]
    fn dry_run_matches_real_run_transcript() {
        let clock = clock();
        let tmp = scenario(clock.now());
        let base = tmp.path();
        fs::write(base.join(".old-dotfile"), "x").expect("write dotfile");
        set_mtime(&base.join(".old-dotfile"), days_before(clock.now(), 40));
        let before = snapshot(base);

        let dry_log = MemoryLog::default();
        let dry = run(
            &ScanOptions {
                dry_run: true,
                ..options(base)
            },
            &clock,
            &dry_log,
        )
        .expect("dry run");
        assert_eq!(snapshot(base), before);

        let real_log = MemoryLog::default();
        let real = run(&options(base), &clock, &real_log).expect("real run");

        assert_eq!(dry_log.lines(), real_log.lines());
        assert_eq!(dry.archived.len(), 2);
        assert_eq!(
            dry.archived.iter().map(|a| &a.target).collect::<Vec<_>>(),
            real.archived.iter().map(|a| &a.target).collect::<Vec<_>>()
        );
        assert_ne!(snapshot(base), before);
    }

    #[test]
    fn history_root_and_ignored_names_are_never_candidates() {
        let clock = clock();
        let tmp = tempdir().expect("tempdir");
        let base = tmp.path();
        fs::create_dir_all(base.join("HISTORY/2000-01-01")).expect("mkdir history");
        fs::write(base.join("keep.log"), "k").expect("write keep");
        set_mtime(&base.join("keep.log"), days_before(clock.now(), 100));
        set_mtime(&base.join("HISTORY"), days_before(clock.now(), 100));

        let log = MemoryLog::default();
        let out = run(
            &ScanOptions {
                ignore: BTreeSet::from([OsString::from("keep.log")]),
                ..options(base)
            },
            &clock,
            &log,
        )
        .expect("scan");

        assert_eq!(out.scanned, 0);
        assert_eq!(out.ignored, 1);
        assert!(out.archived.is_empty());
        assert!(base.join("keep.log").exists());
        assert!(base.join("HISTORY/2000-01-01").is_dir());
        assert!(log.infos().is_empty());
    }

    #[test]
    fn history_root_spelled_differently_is_still_excluded() {
        let clock = clock();
        let tmp = tempdir().expect("tempdir");
        let base = tmp.path().join("base");
        fs::create_dir_all(base.join("HISTORY")).expect("mkdir");
        fs::create_dir(base.join("sub")).expect("mkdir sub");
        set_mtime(&base.join("sub"), days_before(clock.now(), 1));
        set_mtime(&base.join("HISTORY"), days_before(clock.now(), 100));

        let log = MemoryLog::default();
        let out = run(
            &ScanOptions {
                history_root: base.join("sub/../HISTORY"),
                ..options(&base)
            },
            &clock,
            &log,
        )
        .expect("scan");

        assert!(out.archived.is_empty());
        assert!(base.join("HISTORY").is_dir());
    }

    #[cfg(unix)]
    #[test]
    fn symlink_is_archived_without_touching_target() {
        let clock = clock();
        let tmp = tempdir().expect("tempdir");
        let elsewhere = tmp.path().join("elsewhere");
        fs::create_dir(&elsewhere).expect("mkdir elsewhere");
        fs::write(elsewhere.join("fresh.txt"), "fresh").expect("write");
        let base = tmp.path().join("base");
        fs::create_dir(&base).expect("mkdir base");
        std::os::unix::fs::symlink(&elsewhere, base.join("link")).expect("symlink");

        let log = MemoryLog::default();
        let out = run(&options(&base), &clock, &log).expect("scan");

        let moved = base.join("HISTORY").join("1970-01-01").join("link");
        assert_eq!(out.archived.len(), 1);
        assert_eq!(out.archived[0].target, moved);
        assert!(fs::symlink_metadata(&moved).expect("moved link").is_symlink());
        assert!(elsewhere.join("fresh.txt").is_file());
    }

    #[test]
    fn fresh_entries_log_skip_at_debug() {
        let clock = clock();
        let tmp = tempdir().expect("tempdir");
        fs::write(tmp.path().join("new.txt"), "n").expect("write");

        let log = MemoryLog::default();
        run(&options(tmp.path()), &clock, &log).expect("scan");

        let today = clock.today();
        let expected = format!(
            "skip {} (modified {today}), too fresh",
            tmp.path().join("new.txt").display()
        );
        assert!(log.lines().contains(&LogLine::Debug(expected)));
    }

    #[test]
    fn nested_resolution_failure_keeps_entry_and_warns_once() {
        let clock = clock();
        let tmp = scratch_dir();
        let base = tmp.path();
        let proj = base.join("proj");
        fs::create_dir_all(proj.join("deep")).expect("mkdir");
        let future = proj.join("deep/future.txt");
        fs::write(&future, "f").expect("write future");
        if !set_far_future_mtime(&future) {
            return;
        }
        let old = days_before(clock.now(), 30);
        set_mtime(&proj.join("deep"), old);
        set_mtime(&proj, old);
        fs::write(base.join("old.txt"), "o").expect("write old");
        set_mtime(&base.join("old.txt"), old);

        let log = MemoryLog::default();
        let out = run(&options(base), &clock, &log).expect("scan");

        assert_eq!(out.scanned, 2);
        assert_eq!(out.skipped, 1);
        assert_eq!(out.archived.len(), 1);
        assert_eq!(out.archived[0].source, base.join("old.txt"));
        assert!(future.is_file());

        let warnings = log.warnings();
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("future.txt"));
        assert!(log.lines().contains(&LogLine::Debug(format!(
            "skip {} (modified {}), too fresh",
            proj.display(),
            clock.today()
        ))));
    }

    #[test]
    fn missing_base_is_fatal() {
        let clock = clock();
        let tmp = tempdir().expect("tempdir");
        let log = MemoryLog::default();

        let err = run(&options(&tmp.path().join("absent")), &clock, &log).expect_err("missing");
        assert!(matches!(err, ArchiveError::BaseMissing(_)));
        assert!(!tmp.path().join("absent").exists());
    }

    #[test]
    fn collision_aborts_the_run() {
        let clock = clock();
        let tmp = tempdir().expect("tempdir");
        let base = tmp.path();
        let old = days_before(clock.now(), 30);
        let bucket = base.join("HISTORY").join(clock.date_of(old).expect("date").to_string());
        fs::create_dir_all(&bucket).expect("mkdir bucket");
        fs::write(bucket.join("dup.txt"), "archived earlier").expect("write old");
        fs::write(base.join("dup.txt"), "again").expect("write new");
        set_mtime(&base.join("dup.txt"), old);

        let log = MemoryLog::default();
        let err = run(&options(base), &clock, &log).expect_err("collision");

        assert!(matches!(err, ArchiveError::Collision { .. }));
        assert_eq!(
            fs::read_to_string(base.join("dup.txt")).expect("read"),
            "again"
        );
    }
}

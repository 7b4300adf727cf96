use crate::error::ArchiveError;
use crate::logging::Log;
use crate::rotation::clock::RunClock;
use crate::rotation::mtime;
use chrono::NaiveDate;
use std::cell::OnceCell;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};

/// One top-level child of the base directory under consideration.
#[derive(Debug)]
pub struct Entry {
    path: PathBuf,
    effective_date: OnceCell<NaiveDate>,
}

impl Entry {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            effective_date: OnceCell::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn name(&self) -> Result<&OsStr, ArchiveError> {
        self.path
            .file_name()
            .ok_or_else(|| ArchiveError::Unnamed(self.path.clone()))
    }

    /// Calendar date of the entry's effective modification time. Computed on
    /// first call and memoized; later calls ignore their arguments.
    pub fn effective_date(&self, clock: &RunClock, log: &dyn Log) -> NaiveDate {
        *self.effective_date.get_or_init(|| {
            let at = mtime::resolve(&self.path).or_now(clock.now(), log);
            clock.date_of(at).unwrap_or_else(|| clock.today())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::MemoryLog;
    use crate::rotation::clock::DateZone;
    use crate::rotation::testutil::{days_before, scratch_dir, set_far_future_mtime, set_mtime};
    use std::fs;
    use std::time::SystemTime;
    use tempfile::tempdir;

    fn utc_clock() -> RunClock {
        RunClock::start(DateZone::parse(Some("UTC")).expect("utc")).expect("clock")
    }

    #[test]
    fn effective_date_is_memoized() {
        let tmp = tempdir().expect("tempdir");
        let clock = utc_clock();
        let file = tmp.path().join("a.txt");
        fs::write(&file, "a").expect("write");
        let ten_days = days_before(clock.now(), 10);
        set_mtime(&file, ten_days);

        let log = MemoryLog::default();
        let entry = Entry::new(&file);
        let first = entry.effective_date(&clock, &log);
        assert_eq!(Some(first), clock.date_of(ten_days));

        set_mtime(&file, SystemTime::now());
        assert_eq!(entry.effective_date(&clock, &log), first);
    }

    #[test]
    fn unresolvable_entry_is_dated_today() {
        let tmp = tempdir().expect("tempdir");
        let clock = utc_clock();
        let log = MemoryLog::default();
        let entry = Entry::new(tmp.path().join("vanished"));

        assert_eq!(entry.effective_date(&clock, &log), clock.today());
        assert_eq!(log.warnings().len(), 1);
    }

    #[test]
    fn far_future_mtime_is_dated_today() {
        let tmp = scratch_dir();
        let clock = utc_clock();
        let file = tmp.path().join("future.txt");
        fs::write(&file, "f").expect("write");
        if !set_far_future_mtime(&file) {
            return;
        }

        let log = MemoryLog::default();
        let entry = Entry::new(&file);
        assert_eq!(entry.effective_date(&clock, &log), clock.today());
        assert_eq!(log.warnings().len(), 1);
    }

    #[test]
    fn name_is_last_component() {
        let entry = Entry::new("/data/report.csv");
        assert_eq!(entry.name().expect("name"), OsStr::new("report.csv"));
        assert!(matches!(
            Entry::new("/").name(),
            Err(ArchiveError::Unnamed(_))
        ));
    }
}

use crate::error::ArchiveError;
use crate::logging::Log;
use crate::rotation::entry::Entry;
use crate::rotation::fsops::move_entry;
use chrono::NaiveDate;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

/// The history root and its `YYYY-MM-DD` buckets.
///
/// Under dry-run nothing is created or moved. Directories that a real run
/// would have created are remembered instead, so both modes log the same
/// lines.
pub struct HistoryDir<'a> {
    root: PathBuf,
    dry_run: bool,
    planned: BTreeSet<PathBuf>,
    log: &'a dyn Log,
}

impl<'a> HistoryDir<'a> {
    pub fn open(
        root: impl Into<PathBuf>,
        dry_run: bool,
        log: &'a dyn Log,
    ) -> Result<Self, ArchiveError> {
        let mut history = Self {
            root: root.into(),
            dry_run,
            planned: BTreeSet::new(),
            log,
        };
        let root = history.root.clone();
        history.ensure_exists(&root)?;
        Ok(history)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn bucket_path(&self, date: NaiveDate) -> PathBuf {
        self.root.join(date.to_string())
    }

    /// Move `entry` into the bucket for `date` and return its new path.
    ///
    /// A bucket that already holds an entry with the same name is a
    /// collision and fails without touching either side.
    pub fn archive(&mut self, entry: &Entry, date: NaiveDate) -> Result<PathBuf, ArchiveError> {
        let bucket = self.bucket_path(date);
        self.log.info(&format!(
            "archive {} (modified {date}) to {}",
            entry.path().display(),
            bucket.display()
        ));

        self.ensure_exists(&bucket)?;

        let target = bucket.join(entry.name()?);
        if fs::symlink_metadata(&target).is_ok() {
            return Err(ArchiveError::Collision {
                from: entry.path().to_path_buf(),
                to: target,
            });
        }

        if !self.dry_run {
            move_entry(entry.path(), &target).map_err(|source| ArchiveError::Move {
                from: entry.path().to_path_buf(),
                to: target.clone(),
                source,
            })?;
        }

        Ok(target)
    }

    fn ensure_exists(&mut self, path: &Path) -> Result<(), ArchiveError> {
        if path.is_dir() || self.planned.contains(path) {
            return Ok(());
        }
        if fs::symlink_metadata(path).is_ok() {
            return Err(ArchiveError::NotADirectory(path.to_path_buf()));
        }

        self.log
            .info(&format!("create missing directory {}", path.display()));
        if self.dry_run {
            self.planned.insert(path.to_path_buf());
            return Ok(());
        }

        match fs::create_dir_all(path) {
            Ok(()) => Ok(()),
            Err(_) if path.is_dir() => Ok(()),
            Err(source) => Err(ArchiveError::CreateDir {
                path: path.to_path_buf(),
                source,
            }),
        }
    }
}

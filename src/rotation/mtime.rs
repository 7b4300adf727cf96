use crate::error::ResolveError;
use crate::logging::Log;
use crate::rotation::clock;
use std::ffi::OsStr;
use std::fs;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

/// Outcome of resolving an entry's effective modification time.
#[derive(Debug)]
pub enum Resolution {
    Resolved(SystemTime),
    Failed(ResolveError),
}

impl Resolution {
    /// Apply the fallback policy: a failed resolution counts as modified
    /// `now`, so the entry is kept for this run.
    pub fn or_now(self, now: SystemTime, log: &dyn Log) -> SystemTime {
        match self {
            Self::Resolved(at) => at,
            Self::Failed(err) => {
                log.warn(&format!("failed to resolve modification time: {err}"));
                now
            }
        }
    }
}

pub fn is_self_or_parent(name: &OsStr) -> bool {
    name == "." || name == ".."
}

/// Effective modification time of `path`.
///
/// Symlinks resolve to the Unix epoch and are never followed. Directories
/// resolve to the newest of their own mtime and every child's effective
/// time, hidden entries included.
pub fn resolve(path: &Path) -> Resolution {
    match latest_modification(path) {
        Ok(at) => Resolution::Resolved(at),
        Err(err) => Resolution::Failed(err),
    }
}

fn latest_modification(path: &Path) -> Result<SystemTime, ResolveError> {
    let meta = fs::symlink_metadata(path).map_err(|source| ResolveError::Metadata {
        path: path.to_path_buf(),
        source,
    })?;

    if meta.file_type().is_symlink() {
        return Ok(UNIX_EPOCH);
    }

    let own = meta.modified().map_err(|source| ResolveError::Mtime {
        path: path.to_path_buf(),
        source,
    })?;
    let own = in_range(path, own)?;
    if !meta.is_dir() {
        return Ok(own);
    }

    let entries = fs::read_dir(path).map_err(|source| ResolveError::ReadDir {
        path: path.to_path_buf(),
        source,
    })?;

    let mut latest = own;
    for entry in entries {
        let entry = entry.map_err(|source| ResolveError::ReadDir {
            path: path.to_path_buf(),
            source,
        })?;
        if is_self_or_parent(&entry.file_name()) {
            continue;
        }
        latest = latest.max(latest_modification(&entry.path())?);
    }

    Ok(latest)
}

fn in_range(path: &Path, at: SystemTime) -> Result<SystemTime, ResolveError> {
    match clock::utc_of(at) {
        Some(_) => Ok(at),
        None => Err(ResolveError::OutOfRange {
            path: path.to_path_buf(),
        }),
    }
}

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Failure while computing an entry's modification time. Never fatal: the
/// caller substitutes the run's "now" and the entry survives the run.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("failed to stat {}: {source}", .path.display())]
    Metadata { path: PathBuf, source: io::Error },
    #[error("failed to list {}: {source}", .path.display())]
    ReadDir { path: PathBuf, source: io::Error },
    #[error("modification time unavailable for {}: {source}", .path.display())]
    Mtime { path: PathBuf, source: io::Error },
    #[error("modification time of {} is outside the supported date range", .path.display())]
    OutOfRange { path: PathBuf },
}

/// Failure that leaves the history tree unusable or an entry unmovable.
/// These abort the run.
#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("base directory {} is missing or not a directory", .0.display())]
    BaseMissing(PathBuf),
    #[error("failed to list base directory {}", .path.display())]
    BaseUnreadable { path: PathBuf, source: io::Error },
    #[error("{} exists but is not a directory", .0.display())]
    NotADirectory(PathBuf),
    #[error("failed to create {}", .path.display())]
    CreateDir { path: PathBuf, source: io::Error },
    #[error("entry {} has no file name", .0.display())]
    Unnamed(PathBuf),
    #[error("refusing to archive {}: {} already exists", .from.display(), .to.display())]
    Collision { from: PathBuf, to: PathBuf },
    #[error("failed to move {} to {}", .from.display(), .to.display())]
    Move {
        from: PathBuf,
        to: PathBuf,
        source: io::Error,
    },
}

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct RotatePaths {
    pub base: PathBuf,
    pub history_root: PathBuf,
}

fn env_or_default_path(var: &str, fallback: PathBuf) -> PathBuf {
    match env::var(var) {
        Ok(v) if !v.trim().is_empty() => PathBuf::from(v.trim()),
        _ => fallback,
    }
}

/// History root precedence: `--history-base`, then `ROTATEDIR_HISTORY_BASE`,
/// then `<base>/<history_dir_name>`.
pub fn resolve_paths(
    base: &Path,
    history_override: Option<&Path>,
    history_dir_name: &str,
) -> RotatePaths {
    let history_root = match history_override {
        Some(path) => path.to_path_buf(),
        None => env_or_default_path("ROTATEDIR_HISTORY_BASE", base.join(history_dir_name)),
    };

    RotatePaths {
        base: base.to_path_buf(),
        history_root,
    }
}

/// Absolute form of `path` used to recognise the history root among the
/// base directory's children. Symlinks in the parent chain are resolved;
/// the final component is kept as-is so it also works before the history
/// root exists.
pub fn identity(path: &Path) -> PathBuf {
    let absolute = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
    let (Some(parent), Some(name)) = (absolute.parent(), absolute.file_name()) else {
        return absolute;
    };
    match fs::canonicalize(parent) {
        Ok(parent) => parent.join(name),
        Err(_) => absolute,
    }
}

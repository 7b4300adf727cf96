use std::path::{Path, PathBuf};

use crate::logging::Log;

fn fallback_dotenv_path(config_dir: Option<PathBuf>) -> Option<PathBuf> {
    let base = config_dir?;
    Some(base.join("rotatedir/.env"))
}

/// Load `.env` from the working directory, or `<config dir>/rotatedir/.env`
/// when the working directory has none. A file that fails to parse is
/// reported and otherwise ignored.
pub fn load_dotenv(log: &dyn Log) {
    match dotenvy::dotenv() {
        Ok(path) => {
            log.debug(&format!("loaded environment from {}", path.display()));
            return;
        }
        Err(err) if err.not_found() => {}
        Err(err) => {
            log.warn(&format!("failed to load .env: {err}"));
            return;
        }
    }

    if let Some(path) = fallback_dotenv_path(dirs::config_dir()) {
        load_file(&path, log);
    }
}

fn load_file(path: &Path, log: &dyn Log) {
    if !path.is_file() {
        return;
    }
    match dotenvy::from_path(path) {
        Ok(()) => log.debug(&format!("loaded environment from {}", path.display())),
        Err(err) => log.warn(&format!("failed to load {}: {err}", path.display())),
    }
}

use anyhow::{Result, anyhow};
use serde::Deserialize;
use std::env;
use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};

use crate::rotation::clock::DateZone;

#[derive(Debug, Clone)]
pub struct RotateConfig {
    pub expire_days: u32,
    pub history_dir_name: String,
    pub ignore: Vec<String>,
    pub timezone: Option<String>,
}

impl Default for RotateConfig {
    fn default() -> Self {
        Self {
            expire_days: 7,
            history_dir_name: "HISTORY".to_string(),
            ignore: Vec::new(),
            timezone: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
struct PartialRotateConfig {
    expire_days: Option<u32>,
    history_dir_name: Option<String>,
    ignore: Option<Vec<String>>,
    timezone: Option<String>,
}

fn env_or_u32(var: &str, fallback: u32) -> Result<u32> {
    match env::var(var) {
        Ok(v) if !v.trim().is_empty() => v
            .trim()
            .parse::<u32>()
            .map_err(|err| anyhow!("invalid {var}={v}: {err}")),
        _ => Ok(fallback),
    }
}

fn env_or_string(var: &str, fallback: &str) -> String {
    match env::var(var) {
        Ok(v) if !v.trim().is_empty() => v.trim().to_string(),
        _ => fallback.to_string(),
    }
}

fn env_or_optional_string(var: &str, fallback: Option<String>) -> Option<String> {
    match env::var(var) {
        Ok(v) if !v.trim().is_empty() => Some(v.trim().to_string()),
        _ => fallback,
    }
}

fn env_or_csv(var: &str, fallback: &[String]) -> Vec<String> {
    match env::var(var) {
        Ok(v) => {
            let out = v
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(ToOwned::to_owned)
                .collect::<Vec<_>>();
            if out.is_empty() { fallback.to_vec() } else { out }
        }
        Err(_) => fallback.to_vec(),
    }
}

fn validate(cfg: &RotateConfig) -> Result<()> {
    let name = cfg.history_dir_name.as_str();
    if name.trim().is_empty() {
        return Err(anyhow!("invalid history dir name: cannot be empty"));
    }
    if Path::new(name).file_name() != Some(OsStr::new(name)) {
        return Err(anyhow!(
            "invalid history dir name `{name}`: must be a single directory name"
        ));
    }
    if cfg.ignore.iter().any(|n| n.contains('/')) {
        return Err(anyhow!(
            "invalid ignore list: entries are top-level names, not paths"
        ));
    }
    DateZone::parse(cfg.timezone.as_deref())?;
    Ok(())
}

fn resolve_config_path() -> Option<PathBuf> {
    if let Ok(custom) = env::var("ROTATEDIR_CONFIG_PATH") {
        let trimmed = custom.trim();
        if !trimmed.is_empty() {
            return Some(PathBuf::from(trimmed));
        }
    }

    let config_dir = dirs::config_dir()?;
    Some(config_dir.join("rotatedir").join("config.toml"))
}

fn merge_file_config(base: &mut RotateConfig, path: &Path) -> Result<()> {
    if !path.exists() {
        return Ok(());
    }

    let raw = fs::read_to_string(path)
        .map_err(|err| anyhow!("failed to read config {}: {err}", path.display()))?;
    let parsed: PartialRotateConfig = toml::from_str(&raw)
        .map_err(|err| anyhow!("failed to parse config {}: {err}", path.display()))?;
    if let Some(expire_days) = parsed.expire_days {
        base.expire_days = expire_days;
    }
    if let Some(history_dir_name) = parsed.history_dir_name {
        base.history_dir_name = history_dir_name;
    }
    if let Some(ignore) = parsed.ignore {
        base.ignore = ignore;
    }
    if parsed.timezone.is_some() {
        base.timezone = parsed.timezone;
    }
    Ok(())
}

/// Defaults, then the TOML file, then `ROTATEDIR_*` environment overrides.
/// Command-line flags are applied on top by the caller.
pub fn load_config() -> Result<RotateConfig> {
    let mut cfg = RotateConfig::default();
    if let Some(path) = resolve_config_path() {
        merge_file_config(&mut cfg, &path)?;
    }

    cfg.expire_days = env_or_u32("ROTATEDIR_EXPIRE_DAYS", cfg.expire_days)?;
    cfg.history_dir_name = env_or_string("ROTATEDIR_HISTORY_DIR_NAME", &cfg.history_dir_name);
    cfg.ignore = env_or_csv("ROTATEDIR_IGNORE", &cfg.ignore);
    cfg.timezone = env_or_optional_string("ROTATEDIR_TIMEZONE", cfg.timezone.take());

    validate(&cfg)?;
    Ok(cfg)
}

use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;

pub const DEFAULT_TIMEZONE: &str = "Africa/Nairobi";

pub fn neurosync_home() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var("NEUROSYNC_HOME") {
        return Ok(PathBuf::from(dir));
    }
    let home = std::env::var("HOME").context("HOME is not set")?;
    Ok(PathBuf::from(home).join(".neurosync"))
}

pub fn ensure_neurosync_home() -> Result<PathBuf> {
    let dir = neurosync_home()?;
    fs::create_dir_all(&dir).with_context(|| format!("create {}", dir.display()))?;
    Ok(dir)
}
